use super::config::GlitchtipDsn;
use super::notifier::{NotificationEvent, NotificationProvider};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::Client;
use serde_json::{Map, Value, json};
use tracing::Level;

const CLIENT_NAME: &str = concat!("creator-backend/", env!("CARGO_PKG_VERSION"));

/// Ships events to a Sentry-compatible store endpoint (GlitchTip).
pub(crate) struct GlitchtipProvider {
    dsn: GlitchtipDsn,
    client: Client,
}

impl GlitchtipProvider {
    pub(crate) fn new(dsn: GlitchtipDsn) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(3))
            .build()?;

        Ok(Self { dsn, client })
    }

    fn auth_header(&self) -> String {
        format!(
            "Sentry sentry_version=7, sentry_key={}, sentry_client={}",
            self.dsn.public_key, CLIENT_NAME
        )
    }
}

fn sentry_level(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "error",
        Level::WARN => "warning",
        Level::INFO => "info",
        _ => "debug",
    }
}

pub(crate) fn build_payload(event: &NotificationEvent) -> Value {
    let mut extra = Map::new();
    for (k, v) in &event.fields {
        extra.insert(k.clone(), Value::String(v.clone()));
    }
    for span in &event.spans {
        for (k, v) in &span.fields {
            extra.insert(format!("{}.{}", span.name, k), Value::String(v.clone()));
        }
    }
    if let (Some(file), Some(line)) = (&event.file, event.line) {
        extra.insert("location".to_string(), json!(format!("{}:{}", file, line)));
    }

    json!({
        "event_id": event.event_id,
        "timestamp": event.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        "level": sentry_level(&event.level),
        "logger": event.target,
        "platform": "other",
        "message": { "formatted": event.message.clone().unwrap_or_default() },
        "environment": event.environment,
        "server_name": event.server_name,
        "tags": {
            "service": event.service_name,
            "component": event.component,
        },
        "extra": extra,
    })
}

#[async_trait]
impl NotificationProvider for GlitchtipProvider {
    async fn send(&self, event: &NotificationEvent) -> Result<()> {
        let response = self
            .client
            .post(self.dsn.store_url.clone())
            .header("X-Sentry-Auth", self.auth_header())
            .json(&build_payload(event))
            .send()
            .await
            .map_err(sanitize_reqwest_error)?;

        if response.status().is_success() {
            return Ok(());
        }

        Err(anyhow!(
            "glitchtip store returned non-success status: {}",
            response.status()
        ))
    }

    fn provider_name(&self) -> &'static str {
        "glitchtip"
    }
}

// reqwest errors embed the request url, which carries the project id.
fn sanitize_reqwest_error(error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!("glitchtip request timed out");
    }
    if error.is_connect() {
        return anyhow!("glitchtip connection failed");
    }
    anyhow!("glitchtip request failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::notifier::{SpanSummary, sample_event};
    use std::collections::BTreeMap;

    #[test]
    fn payload_carries_event_id_and_context() {
        let event = sample_event();
        let payload = build_payload(&event);

        assert_eq!(payload["event_id"], "0f8fad5bd9cb469fa16570867728950e");
        assert_eq!(payload["level"], "error");
        assert_eq!(payload["environment"], "local");
        assert_eq!(payload["server_name"], "host-1");
        assert_eq!(
            payload["message"]["formatted"],
            "tiktok_oauth: token exchange failed"
        );
        assert_eq!(payload["extra"]["user_id"], "u-1");
        assert_eq!(
            payload["extra"]["location"],
            "backend/src/usecases/tiktok_oauth.rs:42"
        );
    }

    #[test]
    fn span_fields_are_prefixed_with_span_name() {
        let mut event = sample_event();
        event.spans.push(SpanSummary {
            name: "request".to_string(),
            fields: BTreeMap::from([("uri".to_string(), "/webhooks/stripe".to_string())]),
        });

        let payload = build_payload(&event);
        assert_eq!(payload["extra"]["request.uri"], "/webhooks/stripe");
    }

    #[test]
    fn auth_header_uses_public_key() {
        let dsn = GlitchtipDsn::parse("https://pubkey@glitchtip.example.com/3").unwrap();
        let provider = GlitchtipProvider::new(dsn).unwrap();

        let header = provider.auth_header();
        assert!(header.starts_with("Sentry sentry_version=7, sentry_key=pubkey"));
    }
}
