use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payload of a `TikTokTokenExchange` job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenExchangePayload {
    pub user_id: Uuid,
    pub code: String,
}
