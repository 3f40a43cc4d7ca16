use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    entities::{
        activities::InsertActivityEntity,
        channels::{ChannelEntity, InsertChannelEntity},
        oauths::{InsertOAuthEntity, UpdateOAuthEntity},
    },
    value_objects::enums::{activity_statuses::ActivityStatus, platforms::PlatformName},
};

/// Tokens returned by TikTok for one account, with expiries already made absolute.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenGrant {
    pub open_id: String,
    pub scope: String,
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_token_expires_at: DateTime<Utc>,
}

impl TokenGrant {
    pub fn to_channel_entity(&self, user_id: Uuid, now: DateTime<Utc>) -> InsertChannelEntity {
        InsertChannelEntity {
            user_id,
            platform_name: PlatformName::TikTok.to_string(),
            external_id: self.open_id.clone(),
            access_expires_at: Some(self.access_token_expires_at),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn to_oauth_entity(
        &self,
        user_id: Uuid,
        channel_id: Uuid,
        now: DateTime<Utc>,
    ) -> InsertOAuthEntity {
        InsertOAuthEntity {
            user_id,
            channel_id,
            scope: self.scope.clone(),
            access_token: self.access_token.clone(),
            access_token_expires_at: self.access_token_expires_at,
            refresh_token: self.refresh_token.clone(),
            refresh_token_expires_at: self.refresh_token_expires_at,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn to_oauth_changes(&self, now: DateTime<Utc>) -> UpdateOAuthEntity {
        UpdateOAuthEntity {
            scope: self.scope.clone(),
            access_token: self.access_token.clone(),
            access_token_expires_at: self.access_token_expires_at,
            refresh_token: self.refresh_token.clone(),
            refresh_token_expires_at: self.refresh_token_expires_at,
            updated_at: now,
        }
    }
}

/// Which write the upsert performs for a grant. Exactly one branch runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelUpsertPlan {
    Update { channel_id: Uuid },
    Insert,
}

impl ChannelUpsertPlan {
    /// `existing` is the channel currently holding the grant's `open_id`, if any.
    pub fn resolve(user_id: Uuid, existing: Option<&ChannelEntity>) -> Result<Self> {
        match existing {
            None => Ok(Self::Insert),
            Some(channel) if channel.user_id == user_id => Ok(Self::Update {
                channel_id: channel.id,
            }),
            Some(channel) => bail!(
                "channel {} with external id {} belongs to another user",
                channel.id,
                channel.external_id
            ),
        }
    }

    pub fn activity(
        &self,
        user_id: Uuid,
        channel_id: Uuid,
        scope: &str,
        now: DateTime<Utc>,
    ) -> InsertActivityEntity {
        let title = match self {
            Self::Update { .. } => "TikTok Permission Updated",
            Self::Insert => "TikTok Account Connected",
        };

        InsertActivityEntity {
            user_id,
            channel_id,
            title: title.to_string(),
            message: format!("granted scopes: {}", scope),
            status: ActivityStatus::Success.to_string(),
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelUpsertOutcome {
    Created(ChannelEntity),
    Updated(ChannelEntity),
}

impl ChannelUpsertOutcome {
    pub fn channel(&self) -> &ChannelEntity {
        match self {
            Self::Created(channel) | Self::Updated(channel) => channel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_channel(user_id: Uuid) -> ChannelEntity {
        let now = Utc::now();
        ChannelEntity {
            id: Uuid::new_v4(),
            user_id,
            platform_name: "tiktok".to_string(),
            external_id: "open-123".to_string(),
            access_expires_at: Some(now + Duration::hours(24)),
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_grant() -> TokenGrant {
        let now = Utc::now();
        TokenGrant {
            open_id: "open-123".to_string(),
            scope: "user.info.basic,video.list".to_string(),
            access_token: "act.abc".to_string(),
            access_token_expires_at: now + Duration::hours(24),
            refresh_token: "rft.def".to_string(),
            refresh_token_expires_at: now + Duration::days(365),
        }
    }

    #[test]
    fn resolve_inserts_when_no_channel_exists() {
        let plan = ChannelUpsertPlan::resolve(Uuid::new_v4(), None).unwrap();
        assert_eq!(plan, ChannelUpsertPlan::Insert);
    }

    #[test]
    fn resolve_updates_channel_owned_by_same_user() {
        let user_id = Uuid::new_v4();
        let channel = sample_channel(user_id);

        let plan = ChannelUpsertPlan::resolve(user_id, Some(&channel)).unwrap();
        assert_eq!(
            plan,
            ChannelUpsertPlan::Update {
                channel_id: channel.id
            }
        );
    }

    #[test]
    fn resolve_rejects_channel_owned_by_other_user() {
        let channel = sample_channel(Uuid::new_v4());
        let result = ChannelUpsertPlan::resolve(Uuid::new_v4(), Some(&channel));
        assert!(result.is_err());
    }

    #[test]
    fn grant_maps_onto_channel_and_oauth_rows() {
        let user_id = Uuid::new_v4();
        let channel_id = Uuid::new_v4();
        let now = Utc::now();
        let grant = sample_grant();

        let channel = grant.to_channel_entity(user_id, now);
        assert_eq!(channel.external_id, "open-123");
        assert_eq!(channel.platform_name, "tiktok");
        assert_eq!(channel.access_expires_at, Some(grant.access_token_expires_at));

        let oauth = grant.to_oauth_entity(user_id, channel_id, now);
        assert_eq!(oauth.channel_id, channel_id);
        assert_eq!(oauth.refresh_token, "rft.def");

        let changes = grant.to_oauth_changes(now);
        assert_eq!(changes.access_token, "act.abc");
        assert_eq!(changes.updated_at, now);
    }

    #[test]
    fn activity_is_success_for_both_branches() {
        let user_id = Uuid::new_v4();
        let channel_id = Uuid::new_v4();
        let now = Utc::now();

        let created = ChannelUpsertPlan::Insert.activity(user_id, channel_id, "video.list", now);
        let updated =
            ChannelUpsertPlan::Update { channel_id }.activity(user_id, channel_id, "video.list", now);

        assert_eq!(created.status, "success");
        assert_eq!(updated.status, "success");
        assert_ne!(created.title, updated.title);
    }
}
