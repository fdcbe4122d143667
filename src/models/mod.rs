pub mod envelope;
pub mod snapshot;
