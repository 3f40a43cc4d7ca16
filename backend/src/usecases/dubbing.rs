use std::sync::Arc;

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use chrono::Utc;
use crates::{
    domain::{
        entities::dubjobs::DubjobEntity,
        repositories::{channels::ChannelRepository, dubjobs::DubjobRepository},
        value_objects::dubbing::{DubbingTicket, SubmitDubjobModel},
    },
    dubbing::elevenlabs_client::ElevenLabsClient,
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::axum_http::error_responses::AppError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DubbingGateway: Send + Sync {
    async fn create_dubbing(&self, source_url: &str, target_lang: &str)
    -> AnyResult<DubbingTicket>;
}

#[async_trait]
impl DubbingGateway for ElevenLabsClient {
    async fn create_dubbing(
        &self,
        source_url: &str,
        target_lang: &str,
    ) -> AnyResult<DubbingTicket> {
        self.create_dubbing(source_url, target_lang).await
    }
}

#[derive(Debug, Error)]
pub enum DubbingError {
    #[error("channel not found")]
    ChannelNotFound,
    #[error("source url and target language are required")]
    InvalidRequest,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl DubbingError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            DubbingError::ChannelNotFound => StatusCode::NOT_FOUND,
            DubbingError::InvalidRequest => StatusCode::BAD_REQUEST,
            DubbingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DubbingError> for AppError {
    fn from(err: DubbingError) -> Self {
        match err {
            DubbingError::ChannelNotFound => AppError::NotFound,
            DubbingError::InvalidRequest => AppError::BadRequest(err.to_string()),
            DubbingError::Internal(cause) => AppError::Internal(cause),
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, DubbingError>;

pub struct DubbingUseCase<C, D, G>
where
    C: ChannelRepository + Send + Sync + 'static,
    D: DubjobRepository + Send + Sync + 'static,
    G: DubbingGateway + 'static,
{
    channel_repo: Arc<C>,
    dubjob_repo: Arc<D>,
    dubbing_client: Arc<G>,
}

impl<C, D, G> DubbingUseCase<C, D, G>
where
    C: ChannelRepository + Send + Sync + 'static,
    D: DubjobRepository + Send + Sync + 'static,
    G: DubbingGateway + 'static,
{
    pub fn new(channel_repo: Arc<C>, dubjob_repo: Arc<D>, dubbing_client: Arc<G>) -> Self {
        Self {
            channel_repo,
            dubjob_repo,
            dubbing_client,
        }
    }

    pub async fn submit(
        &self,
        user_id: Uuid,
        submit_model: SubmitDubjobModel,
    ) -> UseCaseResult<DubjobEntity> {
        if submit_model.source_url.trim().is_empty()
            || submit_model.target_language.trim().is_empty()
        {
            return Err(DubbingError::InvalidRequest);
        }

        let channel_id = submit_model.channel_id;
        self.channel_repo
            .find_by_id_for_user(channel_id, user_id)
            .await
            .map_err(|err| {
                error!(%user_id, %channel_id, db_error = ?err, "dubbing: failed to load channel");
                DubbingError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(%user_id, %channel_id, "dubbing: channel not owned by caller");
                DubbingError::ChannelNotFound
            })?;

        let ticket = self
            .dubbing_client
            .create_dubbing(&submit_model.source_url, &submit_model.target_language)
            .await
            .map_err(|err| {
                error!(%user_id, %channel_id, error = ?err, "dubbing: provider submission failed");
                DubbingError::Internal(err)
            })?;

        let insert = submit_model
            .to_entity(user_id, &ticket, Utc::now())
            .map_err(|err| {
                error!(
                    %user_id,
                    %channel_id,
                    dubbing_id = %ticket.dubbing_id,
                    error = ?err,
                    "dubbing: provider returned a malformed ticket"
                );
                DubbingError::Internal(err)
            })?;

        let dubjob = self
            .dubjob_repo
            .insert(insert)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    %channel_id,
                    dubbing_id = %ticket.dubbing_id,
                    db_error = ?err,
                    "dubbing: failed to store dubjob"
                );
                DubbingError::Internal(err)
            })?;

        info!(
            %user_id,
            %channel_id,
            dubjob_id = %dubjob.id,
            dubbing_id = %dubjob.external_id,
            expected_ready_at = %dubjob.expected_ready_at,
            "dubbing: dubjob submitted"
        );
        Ok(dubjob)
    }

    pub async fn list(&self, user_id: Uuid) -> UseCaseResult<Vec<DubjobEntity>> {
        self.dubjob_repo.list_by_user(user_id).await.map_err(|err| {
            error!(%user_id, db_error = ?err, "dubbing: failed to list dubjobs");
            DubbingError::Internal(err)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};
    use crates::domain::{
        entities::{channels::ChannelEntity, dubjobs::InsertDubjobEntity},
        repositories::{channels::MockChannelRepository, dubjobs::MockDubjobRepository},
    };
    use mockall::predicate::eq;

    fn to_dubjob(insert: InsertDubjobEntity) -> DubjobEntity {
        DubjobEntity {
            id: Uuid::new_v4(),
            user_id: insert.user_id,
            channel_id: insert.channel_id,
            source_url: insert.source_url,
            target_language: insert.target_language,
            external_id: insert.external_id,
            expected_ready_at: insert.expected_ready_at,
            output_url: None,
            finished_at: None,
            created_at: insert.created_at,
        }
    }

    fn owned_channel(user_id: Uuid, channel_id: Uuid) -> ChannelEntity {
        let now = Utc::now();
        ChannelEntity {
            id: channel_id,
            user_id,
            platform_name: "tiktok".to_string(),
            external_id: "open-1".to_string(),
            access_expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn submission(channel_id: Uuid) -> SubmitDubjobModel {
        SubmitDubjobModel {
            channel_id,
            source_url: "https://cdn.example.com/video.mp4".to_string(),
            target_language: "es".to_string(),
        }
    }

    #[tokio::test]
    async fn submit_stores_provider_id_and_ready_time() {
        let user_id = Uuid::new_v4();
        let channel_id = Uuid::new_v4();

        let mut channel_repo = MockChannelRepository::new();
        channel_repo
            .expect_find_by_id_for_user()
            .with(eq(channel_id), eq(user_id))
            .returning(move |channel_id, user_id| {
                let channel = owned_channel(user_id, channel_id);
                Box::pin(async move { Ok(Some(channel)) })
            });

        let mut dubbing_client = MockDubbingGateway::new();
        dubbing_client
            .expect_create_dubbing()
            .withf(|source, lang| source == "https://cdn.example.com/video.mp4" && lang == "es")
            .times(1)
            .returning(|_, _| {
                Ok(DubbingTicket {
                    dubbing_id: "dub_123".to_string(),
                    expected_duration_sec: 120.0,
                })
            });

        let mut dubjob_repo = MockDubjobRepository::new();
        dubjob_repo
            .expect_insert()
            .withf(|insert: &InsertDubjobEntity| {
                insert.expected_ready_at - insert.created_at == Duration::seconds(120)
            })
            .times(1)
            .returning(|insert| {
                let dubjob = to_dubjob(insert);
                Box::pin(async move { Ok(dubjob) })
            });

        let usecase = DubbingUseCase::new(
            Arc::new(channel_repo),
            Arc::new(dubjob_repo),
            Arc::new(dubbing_client),
        );

        let dubjob = usecase.submit(user_id, submission(channel_id)).await.unwrap();
        assert_eq!(dubjob.external_id, "dub_123");
        assert_eq!(dubjob.user_id, user_id);
        assert_eq!(
            dubjob.expected_ready_at,
            dubjob.created_at + Duration::seconds(120)
        );
    }

    #[test]
    fn ready_time_is_submission_time_plus_duration() {
        let submitted_at: DateTime<Utc> = "2024-05-01T12:00:00Z".parse().unwrap();
        let ticket = DubbingTicket {
            dubbing_id: "dub_123".to_string(),
            expected_duration_sec: 120.0,
        };

        let insert = submission(Uuid::new_v4()).to_entity(Uuid::new_v4(), &ticket, submitted_at)
            .unwrap();
        assert_eq!(
            insert.expected_ready_at,
            "2024-05-01T12:02:00Z".parse::<DateTime<Utc>>().unwrap()
        );
        assert_eq!(insert.external_id, "dub_123");
    }

    #[tokio::test]
    async fn submit_to_foreign_channel_is_not_found() {
        let mut channel_repo = MockChannelRepository::new();
        channel_repo
            .expect_find_by_id_for_user()
            .returning(|_, _| Box::pin(async move { Ok(None) }));
        let mut dubbing_client = MockDubbingGateway::new();
        dubbing_client.expect_create_dubbing().never();
        let mut dubjob_repo = MockDubjobRepository::new();
        dubjob_repo.expect_insert().never();

        let usecase = DubbingUseCase::new(
            Arc::new(channel_repo),
            Arc::new(dubjob_repo),
            Arc::new(dubbing_client),
        );

        let err = usecase
            .submit(Uuid::new_v4(), submission(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert_eq!(err.status_code().as_u16(), 404);
    }

    #[tokio::test]
    async fn provider_failure_stores_nothing() {
        let mut channel_repo = MockChannelRepository::new();
        channel_repo
            .expect_find_by_id_for_user()
            .returning(|channel_id, user_id| {
                let channel = owned_channel(user_id, channel_id);
                Box::pin(async move { Ok(Some(channel)) })
            });
        let mut dubbing_client = MockDubbingGateway::new();
        dubbing_client
            .expect_create_dubbing()
            .returning(|_, _| Err(anyhow::anyhow!("status 422")));
        let mut dubjob_repo = MockDubjobRepository::new();
        dubjob_repo.expect_insert().never();

        let usecase = DubbingUseCase::new(
            Arc::new(channel_repo),
            Arc::new(dubjob_repo),
            Arc::new(dubbing_client),
        );

        let err = usecase
            .submit(Uuid::new_v4(), submission(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, DubbingError::Internal(_)));
    }

    #[tokio::test]
    async fn negative_provider_duration_stores_nothing() {
        let mut channel_repo = MockChannelRepository::new();
        channel_repo
            .expect_find_by_id_for_user()
            .returning(|channel_id, user_id| {
                let channel = owned_channel(user_id, channel_id);
                Box::pin(async move { Ok(Some(channel)) })
            });
        let mut dubbing_client = MockDubbingGateway::new();
        dubbing_client.expect_create_dubbing().returning(|_, _| {
            Ok(DubbingTicket {
                dubbing_id: "dub_bad".to_string(),
                expected_duration_sec: -120.0,
            })
        });
        let mut dubjob_repo = MockDubjobRepository::new();
        dubjob_repo.expect_insert().never();

        let usecase = DubbingUseCase::new(
            Arc::new(channel_repo),
            Arc::new(dubjob_repo),
            Arc::new(dubbing_client),
        );

        let err = usecase
            .submit(Uuid::new_v4(), submission(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert_eq!(err.status_code().as_u16(), 500);
    }
}
