use std::sync::Arc;

use anyhow::{Result as AnyResult, anyhow};
use crates::{
    domain::{
        entities::channels::ChannelEntity,
        repositories::{channels::ChannelRepository, job::JobRepository, oauths::OAuthRepository},
        value_objects::{
            enums::platforms::PlatformName, jobs::TokenExchangePayload,
            tiktok::ChannelUpsertOutcome,
        },
    },
    platforms::tiktok_client::TikTokGateway,
};
use rand::RngCore;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, warn};
use url::Url;
use uuid::Uuid;

use crate::axum_http::error_responses::AppError;

const CSRF_STATE_BYTES: usize = 16;

/// Query or form fields TikTok sends back to the redirect URI.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthCallback {
    pub code: Option<String>,
    pub scopes: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OAuthRedirect {
    pub location: Url,
    pub csrf_state: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub refreshed: usize,
    pub failed: usize,
}

#[derive(Debug, Error)]
pub enum TikTokOAuthError {
    #[error("error: {error} | {description}")]
    ProviderDenied { error: String, description: String },
    #[error("authorization code is missing")]
    MissingCode,
    #[error("oauth state does not match")]
    StateMismatch,
    #[error("no oauth token for this channel")]
    OAuthNotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl TikTokOAuthError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            TikTokOAuthError::MissingCode | TikTokOAuthError::StateMismatch => {
                StatusCode::BAD_REQUEST
            }
            TikTokOAuthError::OAuthNotFound => StatusCode::NOT_FOUND,
            TikTokOAuthError::ProviderDenied { .. } | TikTokOAuthError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<TikTokOAuthError> for AppError {
    fn from(err: TikTokOAuthError) -> Self {
        match err {
            TikTokOAuthError::ProviderDenied { .. } => AppError::Upstream {
                message: err.to_string(),
            },
            TikTokOAuthError::MissingCode | TikTokOAuthError::StateMismatch => {
                AppError::BadRequest(err.to_string())
            }
            TikTokOAuthError::OAuthNotFound => AppError::NotFound,
            TikTokOAuthError::Internal(cause) => AppError::Internal(cause),
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, TikTokOAuthError>;

pub fn generate_csrf_state() -> String {
    let mut bytes = [0u8; CSRF_STATE_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub struct TikTokOAuthUseCase<J, C, O, T>
where
    J: JobRepository + Send + Sync + 'static,
    C: ChannelRepository + Send + Sync + 'static,
    O: OAuthRepository + Send + Sync + 'static,
    T: TikTokGateway + Send + Sync + 'static,
{
    job_repo: Arc<J>,
    channel_repo: Arc<C>,
    oauth_repo: Arc<O>,
    tiktok: Arc<T>,
}

impl<J, C, O, T> TikTokOAuthUseCase<J, C, O, T>
where
    J: JobRepository + Send + Sync + 'static,
    C: ChannelRepository + Send + Sync + 'static,
    O: OAuthRepository + Send + Sync + 'static,
    T: TikTokGateway + Send + Sync + 'static,
{
    pub fn new(job_repo: Arc<J>, channel_repo: Arc<C>, oauth_repo: Arc<O>, tiktok: Arc<T>) -> Self {
        Self {
            job_repo,
            channel_repo,
            oauth_repo,
            tiktok,
        }
    }

    /// Builds the authorize redirect. The returned state must be echoed in the cookie.
    pub fn initiate(&self, user_id: Uuid) -> UseCaseResult<OAuthRedirect> {
        let csrf_state = generate_csrf_state();
        let location = self.tiktok.authorize_url(&csrf_state).map_err(|err| {
            error!(%user_id, error = ?err, "tiktok_oauth: failed to build authorize url");
            TikTokOAuthError::Internal(err)
        })?;

        info!(%user_id, "tiktok_oauth: authorization started");
        Ok(OAuthRedirect {
            location,
            csrf_state,
        })
    }

    /// Validates the callback and queues the code exchange. Returns the job id.
    pub async fn complete(
        &self,
        user_id: Uuid,
        callback: OAuthCallback,
        cookie_state: Option<&str>,
    ) -> UseCaseResult<Uuid> {
        if let Some(provider_error) = callback.error.filter(|e| !e.is_empty()) {
            let description = callback.error_description.unwrap_or_default();
            warn!(
                %user_id,
                provider_error = %provider_error,
                description = %description,
                "tiktok_oauth: provider denied authorization"
            );
            return Err(TikTokOAuthError::ProviderDenied {
                error: provider_error,
                description,
            });
        }

        match (callback.state.as_deref(), cookie_state) {
            (Some(state), Some(expected)) if !state.is_empty() && state == expected => {}
            _ => {
                warn!(%user_id, "tiktok_oauth: state does not match cookie");
                return Err(TikTokOAuthError::StateMismatch);
            }
        }

        let code = callback
            .code
            .filter(|c| !c.is_empty())
            .ok_or(TikTokOAuthError::MissingCode)?;

        let job_id = self
            .job_repo
            .enqueue_token_exchange_job(TokenExchangePayload { user_id, code })
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "tiktok_oauth: failed to enqueue token exchange");
                TikTokOAuthError::Internal(err)
            })?;

        info!(
            %user_id,
            %job_id,
            scopes = callback.scopes.as_deref().unwrap_or_default(),
            "tiktok_oauth: token exchange queued"
        );
        Ok(job_id)
    }

    /// Exchanges an authorization code and upserts the channel it grants.
    pub async fn exchange_and_store(
        &self,
        user_id: Uuid,
        code: &str,
    ) -> AnyResult<ChannelUpsertOutcome> {
        let grant = self.tiktok.exchange_code(code).await.map_err(|err| {
            error!(%user_id, error = ?err, "tiktok_oauth: code exchange failed");
            err
        })?;

        let outcome = self
            .channel_repo
            .apply_token_grant(user_id, grant)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "tiktok_oauth: failed to store token grant");
                err
            })?;

        info!(
            %user_id,
            channel_id = %outcome.channel().id,
            created = matches!(outcome, ChannelUpsertOutcome::Created(_)),
            "tiktok_oauth: channel linked"
        );
        Ok(outcome)
    }

    /// Refreshes one channel's tokens on behalf of the channel's owner.
    pub async fn refresh_channel(&self, channel: &ChannelEntity) -> AnyResult<ChannelUpsertOutcome> {
        let oauth = self
            .oauth_repo
            .find_by_channel(channel.id)
            .await?
            .ok_or_else(|| anyhow!("channel {} has no oauth row", channel.id))?;

        let grant = self.tiktok.refresh_token(&oauth.refresh_token).await?;
        let outcome = self
            .channel_repo
            .apply_token_grant(channel.user_id, grant)
            .await?;

        info!(
            user_id = %channel.user_id,
            channel_id = %channel.id,
            "tiktok_oauth: channel tokens refreshed"
        );
        Ok(outcome)
    }

    pub async fn refresh_all(&self) -> AnyResult<RefreshSummary> {
        let channels = self
            .channel_repo
            .list_by_platform(PlatformName::TikTok.as_str())
            .await
            .map_err(|err| {
                error!(db_error = ?err, "tiktok_oauth: failed to list channels for refresh");
                err
            })?;

        let mut summary = RefreshSummary::default();
        for channel in &channels {
            match self.refresh_channel(channel).await {
                Ok(_) => summary.refreshed += 1,
                Err(err) => {
                    summary.failed += 1;
                    error!(
                        user_id = %channel.user_id,
                        channel_id = %channel.id,
                        error = ?err,
                        "tiktok_oauth: channel refresh failed"
                    );
                }
            }
        }

        info!(
            refreshed = summary.refreshed,
            failed = summary.failed,
            "tiktok_oauth: refresh pass finished"
        );
        Ok(summary)
    }

    /// Revokes the provider token. Local rows are kept.
    pub async fn revoke(&self, user_id: Uuid, channel_id: Uuid) -> UseCaseResult<()> {
        let oauth = self
            .oauth_repo
            .find_by_user_and_channel(user_id, channel_id)
            .await
            .map_err(|err| {
                error!(%user_id, %channel_id, db_error = ?err, "tiktok_oauth: failed to load oauth row");
                TikTokOAuthError::Internal(err)
            })?
            .ok_or(TikTokOAuthError::OAuthNotFound)?;

        self.tiktok
            .revoke_token(&oauth.access_token)
            .await
            .map_err(|err| {
                error!(%user_id, %channel_id, error = ?err, "tiktok_oauth: revoke failed");
                TikTokOAuthError::Internal(err)
            })?;

        info!(%user_id, %channel_id, "tiktok_oauth: token revoked");
        Ok(())
    }
}
