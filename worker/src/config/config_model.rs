use std::time::Duration;

use backend::config::config_model::TikTok;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub database: Database,
    /// Public origin of the backend; TikTok redirect URIs are built from it.
    pub domain: String,
    pub tiktok: TikTok,
    pub schedule: Schedule,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Schedule {
    pub token_refresh_interval: Duration,
    pub job_poll_interval: Duration,
}
