use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::dubjobs::InsertDubjobEntity;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmitDubjobModel {
    pub channel_id: Uuid,
    pub source_url: String,
    pub target_language: String,
}

/// What ElevenLabs answers to a dubbing submission.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DubbingTicket {
    pub dubbing_id: String,
    pub expected_duration_sec: f64,
}

impl DubbingTicket {
    /// Fails on a negative, non-finite or unrepresentable duration.
    pub fn expected_ready_at(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let secs = self.expected_duration_sec;
        if !secs.is_finite() || secs < 0.0 {
            bail!("dubbing ticket has invalid expected_duration_sec: {}", secs);
        }

        let millis = (secs * 1000.0).round();
        if millis > i64::MAX as f64 {
            bail!("dubbing ticket expected_duration_sec is out of range: {}", secs);
        }

        Duration::try_milliseconds(millis as i64)
            .and_then(|delta| now.checked_add_signed(delta))
            .ok_or_else(|| anyhow!("dubbing ticket expected_duration_sec is out of range: {}", secs))
    }
}

impl SubmitDubjobModel {
    pub fn to_entity(
        &self,
        user_id: Uuid,
        ticket: &DubbingTicket,
        now: DateTime<Utc>,
    ) -> Result<InsertDubjobEntity> {
        Ok(InsertDubjobEntity {
            user_id,
            channel_id: self.channel_id,
            source_url: self.source_url.clone(),
            target_language: self.target_language.clone(),
            external_id: ticket.dubbing_id.clone(),
            expected_ready_at: ticket.expected_ready_at(now)?,
            created_at: now,
        })
    }
}
