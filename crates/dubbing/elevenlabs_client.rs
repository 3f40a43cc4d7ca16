use anyhow::Result;
use reqwest::multipart::Form;
use tracing::error;

use crate::domain::value_objects::dubbing::DubbingTicket;

const DUBBING_URL: &str = "https://api.elevenlabs.io/v1/dubbing";

/// Minimal ElevenLabs dubbing client built on reqwest.
pub struct ElevenLabsClient {
    http: reqwest::Client,
    api_key: String,
}

impl ElevenLabsClient {
    pub fn new(api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
        }
    }

    /// Starts an automatic dub of `source_url` into `target_lang`.
    pub async fn create_dubbing(&self, source_url: &str, target_lang: &str) -> Result<DubbingTicket> {
        let form = Form::new()
            .text("mode", "automatic")
            .text("source_url", source_url.to_string())
            .text("target_lang", target_lang.to_string());

        let resp = self
            .http
            .post(DUBBING_URL)
            .header("xi-api-key", &self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!(
                status = %status,
                response_body = %body,
                "elevenlabs_client: dubbing request failed"
            );
            anyhow::bail!("ElevenLabs dubbing request failed (status {})", status);
        }

        let ticket: DubbingTicket = resp.json().await?;
        Ok(ticket)
    }
}
