use crate::{config::AppConfig, services::backup::BackupService};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub backup: BackupService,
}

impl AppState {
    pub fn new(config: AppConfig, backup: BackupService) -> Self {
        Self { config, backup }
    }
}
