use anyhow::{Context, Result, anyhow, bail};
use std::env;
use tracing::Level;
use url::Url;

#[derive(Clone)]
pub(crate) struct ServiceContext {
    pub(crate) service_name: String,
    pub(crate) environment: String,
    pub(crate) component: String,
    pub(crate) server_name: String,
}

/// A Sentry-style DSN (`https://<key>@<host>/<project>`) resolved to its store endpoint.
#[derive(Clone, Debug, PartialEq)]
pub struct GlitchtipDsn {
    pub public_key: String,
    pub project_id: String,
    pub store_url: Url,
}

impl GlitchtipDsn {
    pub fn parse(raw: &str) -> Result<Self> {
        let dsn = Url::parse(raw.trim()).context("dsn is not a valid url")?;

        let public_key = dsn.username().to_string();
        if public_key.is_empty() {
            bail!("dsn has no public key");
        }

        let host = dsn.host_str().ok_or_else(|| anyhow!("dsn has no host"))?;

        let path = dsn.path().trim_matches('/');
        let (prefix, project_id) = match path.rsplit_once('/') {
            Some((prefix, project)) => (format!("/{}", prefix), project.to_string()),
            None => (String::new(), path.to_string()),
        };
        if project_id.is_empty() {
            bail!("dsn has no project id");
        }

        let port = dsn.port().map(|p| format!(":{}", p)).unwrap_or_default();
        let store_url = Url::parse(&format!(
            "{}://{}{}{}/api/{}/store/",
            dsn.scheme(),
            host,
            port,
            prefix,
            project_id
        ))
        .context("dsn does not produce a valid store url")?;

        Ok(Self {
            public_key,
            project_id,
            store_url,
        })
    }
}

#[derive(Clone)]
pub(crate) struct GlitchtipConfig {
    pub(crate) dsn: GlitchtipDsn,
    pub(crate) min_level: Level,
}

#[derive(Clone)]
pub(crate) struct ObservabilityConfig {
    pub(crate) service_context: ServiceContext,
    pub(crate) glitchtip: Option<GlitchtipConfig>,
    /// Captured during parsing and logged once tracing is up.
    pub(crate) warnings: Vec<String>,
}

impl ObservabilityConfig {
    pub(crate) fn from_env(component: &str) -> Self {
        let component = component.trim().to_string();

        let service_name = env_string("SERVICE_NAME").unwrap_or_else(|| component.clone());
        let environment = env_string("STAGE").unwrap_or_else(|| "local".to_string());
        let server_name = env_string("HOSTNAME").unwrap_or_else(|| service_name.clone());

        let (glitchtip, warnings) = glitchtip_from_env();

        Self {
            service_context: ServiceContext {
                service_name,
                environment,
                component,
                server_name,
            },
            glitchtip,
            warnings,
        }
    }
}

fn glitchtip_from_env() -> (Option<GlitchtipConfig>, Vec<String>) {
    let mut warnings = Vec::new();

    let Some(raw) = env_string("GLITCHTIP_DSN") else {
        return (None, warnings);
    };

    let dsn = match GlitchtipDsn::parse(&raw) {
        Ok(dsn) => dsn,
        Err(err) => {
            // The raw DSN carries the project key; keep it out of logs.
            warnings.push(format!(
                "GLITCHTIP_DSN is set but invalid; error tracking disabled ({err})"
            ));
            return (None, warnings);
        }
    };

    let min_level = match env_string("GLITCHTIP_LEVEL") {
        Some(raw) => parse_level(&raw).unwrap_or_else(|| {
            warnings.push(format!(
                "GLITCHTIP_LEVEL is invalid (value: {raw}); defaulting to ERROR"
            ));
            Level::ERROR
        }),
        None => Level::ERROR,
    };

    (Some(GlitchtipConfig { dsn, min_level }), warnings)
}

fn parse_level(input: &str) -> Option<Level> {
    match input.trim().to_ascii_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        _ => None,
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dsn_resolves_store_endpoint() {
        let dsn = GlitchtipDsn::parse("https://abc123@glitchtip.example.com/7").unwrap();
        assert_eq!(dsn.public_key, "abc123");
        assert_eq!(dsn.project_id, "7");
        assert_eq!(
            dsn.store_url.as_str(),
            "https://glitchtip.example.com/api/7/store/"
        );
    }

    #[test]
    fn dsn_keeps_port_and_path_prefix() {
        let dsn = GlitchtipDsn::parse("http://key@localhost:8000/errors/12").unwrap();
        assert_eq!(
            dsn.store_url.as_str(),
            "http://localhost:8000/errors/api/12/store/"
        );
    }

    #[test]
    fn dsn_without_key_or_project_is_rejected() {
        assert!(GlitchtipDsn::parse("https://glitchtip.example.com/7").is_err());
        assert!(GlitchtipDsn::parse("https://key@glitchtip.example.com/").is_err());
        assert!(GlitchtipDsn::parse("not a url").is_err());
    }

    #[test]
    fn level_names_are_case_insensitive() {
        assert_eq!(parse_level("WARN"), Some(Level::WARN));
        assert_eq!(parse_level(" error "), Some(Level::ERROR));
        assert_eq!(parse_level("loud"), None);
    }
}
