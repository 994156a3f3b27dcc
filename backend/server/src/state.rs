use std::sync::Arc;

use sheets::{RowSource, ServiceAccount, SheetsClient};

use super::config::Config;

pub struct AppState {
    pub config: Config,
    pub source: Arc<dyn RowSource>,
}

impl AppState {
    pub fn new() -> Arc<Self> {
        let config = Config::load();

        let account = ServiceAccount::new(
            config.service_account_email.clone(),
            &config.private_key,
        );
        let source = Arc::new(SheetsClient::new(account, config.sheet_id.clone()));

        Self::with_source(config, source)
    }

    pub fn with_source(config: Config, source: Arc<dyn RowSource>) -> Arc<Self> {
        Arc::new(Self { config, source })
    }
}
