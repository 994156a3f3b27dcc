use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    pub service_account_email: String,
    pub private_key: String,
    pub sheet_id: String,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("RUST_PORT", "1111"),
            service_account_email: load_secret("GOOGLE_SERVICE_ACCOUNT_EMAIL"),
            private_key: load_secret("GOOGLE_PRIVATE_KEY"),
            sheet_id: load_secret("GOOGLE_SHEET_ID"),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

/// Environment first, then the docker secret file. Missing values stay empty so the
/// lookup fails per request instead of at boot.
fn load_secret(key: &str) -> String {
    env::var(key)
        .ok()
        .filter(|value| !value.is_empty())
        .or_else(|| read_secret(key))
        .unwrap_or_else(|| {
            warn!("{key} is not configured, lookups will fail");
            String::new()
        })
}

fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            info!("No secret file for {secret_name}: {e}");
        })
        .ok()
}
