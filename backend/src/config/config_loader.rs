use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use crates::observability::GlitchtipDsn;
use url::Url;

use super::{
    config_model::{
        AuthSecret, BackendServer, Database, Domains, DotEnvyConfig, ElevenLabs, Glitchtip,
        Stripe, TikTok,
    },
    stage::Stage,
};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();
    load_from(|key| std::env::var(key).ok())
}

/// Builds the config from any key lookup; `load` uses the process environment.
pub fn load_from<F>(lookup: F) -> Result<DotEnvyConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let backend_server = BackendServer {
        port: parse_required(&lookup, "SERVER_PORT_BACKEND")?,
        body_limit: parse_required(&lookup, "SERVER_BODY_LIMIT")?,
        timeout: parse_required(&lookup, "SERVER_TIMEOUT")?,
    };

    let database = Database {
        url: required(&lookup, "DATABASE_URL")?,
    };

    let auth = AuthSecret {
        jwt_secret: required(&lookup, "AUTH_JWT_SECRET")?,
    };

    let domains = Domains {
        domain: url_required(&lookup, "DOMAIN")?,
        frontend_domain: url_required(&lookup, "FRONTEND_DOMAIN")?,
    };

    let is_prod = parse_strict_bool(&required(&lookup, "IS_PROD")?).context("IS_PROD is invalid")?;

    let stripe = Stripe {
        public_key: required(&lookup, "STRIPE_PUBLIC_KEY")?,
        private_key: required(&lookup, "STRIPE_PRIVATE_KEY")?,
        webhook_key: required(&lookup, "STRIPE_WEBHOOK_KEY")?,
    };

    let tiktok = TikTok {
        client_key: required(&lookup, "TIKTOK_CLIENT_KEY")?,
        client_secret: required(&lookup, "TIKTOK_CLIENT_SECRET")?,
    };

    let elevenlabs = ElevenLabs {
        api_key: required(&lookup, "ELEVENLABS_API_KEY")?,
    };

    let dsn = required(&lookup, "GLITCHTIP_DSN")?;
    GlitchtipDsn::parse(&dsn).context("GLITCHTIP_DSN is invalid")?;
    let glitchtip = Glitchtip { dsn };

    let stage = match lookup("STAGE").filter(|v| !v.trim().is_empty()) {
        Some(raw) => Stage::try_from(&raw).context("STAGE is invalid")?,
        None => Stage::default(),
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        auth,
        domains,
        is_prod,
        stripe,
        tiktok,
        elevenlabs,
        glitchtip,
        stage,
    })
}

/// Secret used to verify access tokens issued by the auth provider.
pub fn get_auth_secret() -> Result<String> {
    dotenvy::dotenv().ok();

    std::env::var("AUTH_JWT_SECRET").context("AUTH_JWT_SECRET is invalid")
}

pub fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow!("{} is invalid", key))
}

pub fn parse_required<F, T>(lookup: &F, key: &str) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    required(lookup, key)?
        .parse::<T>()
        .with_context(|| format!("{} is invalid", key))
}

pub fn url_required<F>(lookup: &F, key: &str) -> Result<Url>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = required(lookup, key)?;
    let url = Url::parse(&raw).with_context(|| format!("{} is not a valid url", key))?;
    if url.host_str().is_none() {
        bail!("{} has no host", key);
    }
    Ok(url)
}

/// Only the exact strings `true` and `false` are accepted.
pub fn parse_strict_bool(raw: &str) -> Result<bool> {
    match raw.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => bail!("expected true or false, got {:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, String> {
        HashMap::from([
            ("SERVER_PORT_BACKEND", "8080".to_string()),
            ("SERVER_BODY_LIMIT", "10".to_string()),
            ("SERVER_TIMEOUT", "30".to_string()),
            ("DATABASE_URL", "postgres://localhost:5432/db".to_string()),
            ("AUTH_JWT_SECRET", "supersecretjwtsecretforunittesting123".to_string()),
            ("DOMAIN", "https://api.example.com".to_string()),
            ("FRONTEND_DOMAIN", "https://app.example.com".to_string()),
            ("IS_PROD", "false".to_string()),
            ("STRIPE_PUBLIC_KEY", "pk_test".to_string()),
            ("STRIPE_PRIVATE_KEY", "sk_test".to_string()),
            ("STRIPE_WEBHOOK_KEY", "whsec_test".to_string()),
            ("TIKTOK_CLIENT_KEY", "ck_test".to_string()),
            ("TIKTOK_CLIENT_SECRET", "cs_test".to_string()),
            ("ELEVENLABS_API_KEY", "xi_test".to_string()),
            ("GLITCHTIP_DSN", "https://key@glitchtip.example.com/1".to_string()),
        ])
    }

    fn load_map(env: &HashMap<&'static str, String>) -> Result<DotEnvyConfig> {
        load_from(|key| env.get(key).cloned())
    }

    #[test]
    fn loads_complete_environment() {
        let config = load_map(&base_env()).unwrap();

        assert_eq!(config.backend_server.port, 8080);
        assert_eq!(config.backend_server.body_limit, 10);
        assert!(!config.is_prod);
        assert_eq!(config.domains.domain_origin(), "https://api.example.com");
        assert_eq!(config.stage, Stage::Local);
    }

    #[test]
    fn is_prod_accepts_only_true_or_false() {
        let mut env = base_env();
        env.insert("IS_PROD", "true".to_string());
        assert!(load_map(&env).unwrap().is_prod);

        for bad in ["1", "yes", "TRUE", ""] {
            env.insert("IS_PROD", bad.to_string());
            assert!(load_map(&env).is_err(), "{bad}");
        }
    }

    #[test]
    fn domains_must_be_urls() {
        let mut env = base_env();
        env.insert("FRONTEND_DOMAIN", "app.example.com".to_string());
        assert!(load_map(&env).is_err());
    }

    #[test]
    fn missing_provider_key_fails() {
        let mut env = base_env();
        env.remove("TIKTOK_CLIENT_SECRET");
        let err = load_map(&env).unwrap_err();
        assert!(err.to_string().contains("TIKTOK_CLIENT_SECRET"));
    }

    #[test]
    fn glitchtip_dsn_is_validated() {
        let mut env = base_env();
        env.insert("GLITCHTIP_DSN", "https://glitchtip.example.com".to_string());
        assert!(load_map(&env).is_err());
    }

    #[test]
    fn stage_is_parsed_when_present() {
        let mut env = base_env();
        env.insert("STAGE", "Production".to_string());
        assert_eq!(load_map(&env).unwrap().stage, Stage::Production);

        env.insert("STAGE", "moon".to_string());
        assert!(load_map(&env).is_err());
    }
}
