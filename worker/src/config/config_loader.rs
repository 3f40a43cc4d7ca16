use std::{str::FromStr, time::Duration};

use anyhow::{Context, Result, bail};
use backend::config::{config_loader::{required, url_required}, config_model::TikTok};

use super::config_model::{Database, DotEnvyConfig, Schedule};

const DEFAULT_TOKEN_REFRESH_INTERVAL_HOURS: u64 = 20;
const DEFAULT_JOB_POLL_INTERVAL_SECS: u64 = 5;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();
    load_from(|key| std::env::var(key).ok())
}

pub fn load_from<F>(lookup: F) -> Result<DotEnvyConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let database = Database {
        url: required(&lookup, "DATABASE_URL")?,
    };

    let domain = url_required(&lookup, "DOMAIN")?
        .as_str()
        .trim_end_matches('/')
        .to_string();

    let tiktok = TikTok {
        client_key: required(&lookup, "TIKTOK_CLIENT_KEY")?,
        client_secret: required(&lookup, "TIKTOK_CLIENT_SECRET")?,
    };

    let refresh_hours: u64 = optional_positive(
        &lookup,
        "TOKEN_REFRESH_INTERVAL_HOURS",
        DEFAULT_TOKEN_REFRESH_INTERVAL_HOURS,
    )?;
    let poll_secs: u64 = optional_positive(
        &lookup,
        "JOB_POLL_INTERVAL_SECS",
        DEFAULT_JOB_POLL_INTERVAL_SECS,
    )?;

    let schedule = Schedule {
        token_refresh_interval: Duration::from_secs(refresh_hours * 60 * 60),
        job_poll_interval: Duration::from_secs(poll_secs),
    };

    Ok(DotEnvyConfig {
        database,
        domain,
        tiktok,
        schedule,
    })
}

fn optional_positive<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialEq + Default,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let Some(raw) = lookup(key).filter(|v| !v.trim().is_empty()) else {
        return Ok(default);
    };

    let value = raw
        .trim()
        .parse::<T>()
        .with_context(|| format!("{} is invalid", key))?;
    if value == T::default() {
        bail!("{} must be greater than zero", key);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, String> {
        HashMap::from([
            ("DATABASE_URL", "postgres://localhost:5432/db".to_string()),
            ("DOMAIN", "https://api.example.com/".to_string()),
            ("TIKTOK_CLIENT_KEY", "ck_test".to_string()),
            ("TIKTOK_CLIENT_SECRET", "cs_test".to_string()),
        ])
    }

    fn load_map(env: &HashMap<&'static str, String>) -> Result<DotEnvyConfig> {
        load_from(|key| env.get(key).cloned())
    }

    #[test]
    fn schedule_defaults_apply() {
        let config = load_map(&base_env()).unwrap();

        assert_eq!(config.domain, "https://api.example.com");
        assert_eq!(
            config.schedule.token_refresh_interval,
            Duration::from_secs(20 * 60 * 60)
        );
        assert_eq!(config.schedule.job_poll_interval, Duration::from_secs(5));
    }

    #[test]
    fn schedule_overrides_are_parsed() {
        let mut env = base_env();
        env.insert("TOKEN_REFRESH_INTERVAL_HOURS", "6".to_string());
        env.insert("JOB_POLL_INTERVAL_SECS", "1".to_string());

        let config = load_map(&env).unwrap();
        assert_eq!(
            config.schedule.token_refresh_interval,
            Duration::from_secs(6 * 60 * 60)
        );
        assert_eq!(config.schedule.job_poll_interval, Duration::from_secs(1));
    }

    #[test]
    fn zero_or_garbage_intervals_fail() {
        let mut env = base_env();
        env.insert("JOB_POLL_INTERVAL_SECS", "0".to_string());
        assert!(load_map(&env).is_err());

        env.insert("JOB_POLL_INTERVAL_SECS", "soon".to_string());
        assert!(load_map(&env).is_err());
    }

    #[test]
    fn tiktok_keys_are_required() {
        let mut env = base_env();
        env.remove("TIKTOK_CLIENT_KEY");
        assert!(load_map(&env).is_err());
    }
}
