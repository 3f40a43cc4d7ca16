use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use mockall::automock;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::error;
use url::Url;

use crate::domain::value_objects::tiktok::TokenGrant;

const AUTHORIZE_URL: &str = "https://www.tiktok.com/v2/auth/authorize/";
const TOKEN_URL: &str = "https://open.tiktokapis.com/v2/oauth/token/";
const REVOKE_URL: &str = "https://open.tiktokapis.com/v2/oauth/revoke/";

pub const TIKTOK_SCOPES: &str =
    "user.info.basic,user.info.profile,user.info.stats,video.list,video.publish,video.upload";

#[async_trait]
#[automock]
pub trait TikTokGateway {
    fn authorize_url(&self, state: &str) -> Result<Url>;

    async fn exchange_code(&self, code: &str) -> Result<TokenGrant>;

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenGrant>;

    async fn revoke_token(&self, access_token: &str) -> Result<()>;
}

pub struct TikTokClient {
    http: reqwest::Client,
    client_key: String,
    client_secret: String,
    redirect_uri: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    open_id: Option<String>,
    scope: Option<String>,
    access_token: Option<String>,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
    refresh_expires_in: Option<i64>,
    error: Option<String>,
    error_description: Option<String>,
    log_id: Option<String>,
}

/// Decodes a token endpoint body, turning relative expiries into timestamps at `now`.
fn parse_token_response(body: &str, now: DateTime<Utc>) -> Result<TokenGrant> {
    let resp: TokenResponse =
        serde_json::from_str(body).context("tiktok token response is not valid json")?;

    if let Some(err) = resp.error.as_deref().filter(|err| !err.is_empty()) {
        bail!(
            "tiktok token request failed: {} | {} (log_id={:?})",
            err,
            resp.error_description.as_deref().unwrap_or_default(),
            resp.log_id
        );
    }

    let field = |value: Option<String>, name: &str| {
        value.ok_or_else(|| anyhow!("tiktok token response is missing {}", name))
    };
    let expires_in = resp
        .expires_in
        .ok_or_else(|| anyhow!("tiktok token response is missing expires_in"))?;
    let refresh_expires_in = resp
        .refresh_expires_in
        .ok_or_else(|| anyhow!("tiktok token response is missing refresh_expires_in"))?;

    Ok(TokenGrant {
        open_id: field(resp.open_id, "open_id")?,
        scope: resp.scope.unwrap_or_default(),
        access_token: field(resp.access_token, "access_token")?,
        access_token_expires_at: expiry_at(now, expires_in, "expires_in")?,
        refresh_token: field(resp.refresh_token, "refresh_token")?,
        refresh_token_expires_at: expiry_at(now, refresh_expires_in, "refresh_expires_in")?,
    })
}

fn expiry_at(now: DateTime<Utc>, seconds: i64, name: &str) -> Result<DateTime<Utc>> {
    if seconds < 0 {
        bail!("tiktok token response has negative {}: {}", name, seconds);
    }
    Duration::try_seconds(seconds)
        .and_then(|delta| now.checked_add_signed(delta))
        .ok_or_else(|| anyhow!("tiktok token response has out of range {}: {}", name, seconds))
}

impl TikTokClient {
    /// `domain` is the public origin of this service; TikTok redirects back to it.
    pub fn new(client_key: String, client_secret: String, domain: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_key,
            client_secret,
            redirect_uri: format!(
                "{}/platforms/tiktok/oauth-success",
                domain.trim_end_matches('/')
            ),
        }
    }

    async fn request_token(&self, form: &[(&str, &str)], context: &str) -> Result<TokenGrant> {
        let resp = self.http.post(TOKEN_URL).form(form).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            error!(
                status = %status,
                response_body = %body,
                context = %context,
                "tiktok_client: token request failed"
            );
            bail!("TikTok token request failed: {} (status {})", context, status);
        }

        parse_token_response(&body, Utc::now())
    }
}

#[async_trait]
impl TikTokGateway for TikTokClient {
    fn authorize_url(&self, state: &str) -> Result<Url> {
        let url = Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("client_key", self.client_key.as_str()),
                ("scope", TIKTOK_SCOPES),
                ("response_type", "code"),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("state", state),
            ],
        )?;
        Ok(url)
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenGrant> {
        let form = [
            ("client_key", self.client_key.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];
        self.request_token(&form, "exchange code").await
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenGrant> {
        let form = [
            ("client_key", self.client_key.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];
        self.request_token(&form, "refresh token").await
    }

    async fn revoke_token(&self, access_token: &str) -> Result<()> {
        let form = [
            ("client_key", self.client_key.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("token", access_token),
        ];
        let resp = self.http.post(REVOKE_URL).form(&form).send().await?;
        let status = resp.status();

        if status != StatusCode::OK && status != StatusCode::ACCEPTED {
            let body = resp.text().await.unwrap_or_default();
            error!(
                status = %status,
                response_body = %body,
                "tiktok_client: revoke request failed"
            );
            bail!("TikTok revoke request failed (status {})", status);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> TikTokClient {
        TikTokClient::new(
            "ck_test".to_string(),
            "cs_test".to_string(),
            "https://api.example.com/",
        )
    }

    #[test]
    fn authorize_url_carries_client_scope_and_state() {
        let url = client().authorize_url("abc123").unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert_eq!(url.host_str(), Some("www.tiktok.com"));
        assert!(pairs.contains(&("client_key".to_string(), "ck_test".to_string())));
        assert!(pairs.contains(&("scope".to_string(), TIKTOK_SCOPES.to_string())));
        assert!(pairs.contains(&("response_type".to_string(), "code".to_string())));
        assert!(pairs.contains(&("state".to_string(), "abc123".to_string())));
        assert!(pairs.contains(&(
            "redirect_uri".to_string(),
            "https://api.example.com/platforms/tiktok/oauth-success".to_string()
        )));
    }

    #[test]
    fn token_response_expiries_become_absolute() {
        let now = Utc::now();
        let body = r#"{
            "open_id": "open-1",
            "scope": "user.info.basic,video.list",
            "access_token": "act.1",
            "expires_in": 86400,
            "refresh_token": "rft.1",
            "refresh_expires_in": 31536000,
            "token_type": "Bearer"
        }"#;

        let grant = parse_token_response(body, now).unwrap();
        assert_eq!(grant.open_id, "open-1");
        assert_eq!(grant.access_token_expires_at, now + Duration::seconds(86400));
        assert_eq!(
            grant.refresh_token_expires_at,
            now + Duration::seconds(31_536_000)
        );
    }

    #[test]
    fn token_response_with_error_field_fails() {
        let body = r#"{"error":"invalid_grant","error_description":"code expired","log_id":"x"}"#;
        let err = parse_token_response(body, Utc::now()).unwrap_err();
        assert!(err.to_string().contains("invalid_grant"));
    }

    #[test]
    fn token_response_missing_tokens_fails() {
        let body = r#"{"open_id":"open-1","expires_in":10,"refresh_expires_in":10}"#;
        assert!(parse_token_response(body, Utc::now()).is_err());
    }

    #[test]
    fn token_response_with_overflowing_expiry_fails() {
        let body = r#"{
            "open_id": "open-1",
            "access_token": "act.1",
            "expires_in": 9223372036854775807,
            "refresh_token": "rft.1",
            "refresh_expires_in": 10
        }"#;

        let err = parse_token_response(body, Utc::now()).unwrap_err();
        assert!(err.to_string().contains("out of range expires_in"));
    }

    #[test]
    fn token_response_with_negative_expiry_fails() {
        let body = r#"{
            "open_id": "open-1",
            "access_token": "act.1",
            "expires_in": 10,
            "refresh_token": "rft.1",
            "refresh_expires_in": -1
        }"#;

        let err = parse_token_response(body, Utc::now()).unwrap_err();
        assert!(err.to_string().contains("negative refresh_expires_in"));
    }
}
