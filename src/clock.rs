use std::sync::{Arc, Mutex};

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use mockable::Clock;

/// Formats a write time the way it is persisted: RFC 3339, milliseconds, `Z` suffix.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Hands out write timestamps that strictly increase for the life of the process,
/// even if the wall clock stalls or steps backwards.
pub struct Stamper {
    clock: Arc<dyn Clock>,
    last: Mutex<Option<DateTime<Utc>>>,
}

impl Stamper {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            last: Mutex::new(None),
        }
    }

    pub fn next(&self) -> String {
        let now = truncate_to_millis(self.clock.utc());
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let stamp = match *last {
            Some(previous) if now <= previous => previous + TimeDelta::milliseconds(1),
            _ => now,
        };
        *last = Some(stamp);
        format_timestamp(stamp)
    }
}

fn truncate_to_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(at.timestamp_millis()).unwrap_or(at)
}
