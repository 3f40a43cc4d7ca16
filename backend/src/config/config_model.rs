use url::Url;

use super::stage::Stage;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub backend_server: BackendServer,
    pub database: Database,
    pub auth: AuthSecret,
    pub domains: Domains,
    pub is_prod: bool,
    pub stripe: Stripe,
    pub tiktok: TikTok,
    pub elevenlabs: ElevenLabs,
    pub glitchtip: Glitchtip,
    pub stage: Stage,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    /// MiB.
    pub body_limit: u64,
    /// Seconds.
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct AuthSecret {
    pub jwt_secret: String,
}

#[derive(Debug, Clone)]
pub struct Domains {
    pub domain: Url,
    pub frontend_domain: Url,
}

impl Domains {
    /// Origin without a trailing slash, fit for appending paths.
    pub fn domain_origin(&self) -> String {
        self.domain.as_str().trim_end_matches('/').to_string()
    }

    pub fn frontend_origin(&self) -> String {
        self.frontend_domain.as_str().trim_end_matches('/').to_string()
    }
}

#[derive(Debug, Clone)]
pub struct Stripe {
    pub public_key: String,
    pub private_key: String,
    pub webhook_key: String,
}

#[derive(Debug, Clone)]
pub struct TikTok {
    pub client_key: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
pub struct ElevenLabs {
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct Glitchtip {
    pub dsn: String,
}
