use std::collections::HashMap;

use anyhow::{Context, Result, anyhow, bail};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Largest webhook body accepted before signature verification is attempted.
pub const MAX_WEBHOOK_BODY_BYTES: usize = 65_536;

/// Maximum age of a signed webhook, in seconds.
pub const SIGNATURE_TOLERANCE_SECS: u64 = 300;

/// Stripe webhook verifier. No Stripe API calls are made by this service.
pub struct StripeClient {
    webhook_secret: String,
}

#[derive(Debug, Deserialize)]
pub struct StripeEvent {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub type_: String,
    pub created: Option<i64>,
    pub livemode: Option<bool>,
    pub data: StripeEventData,
}

#[derive(Debug, Deserialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StripeCustomer {
    pub id: String,
    pub email: Option<String>,
}

/// `customer` on a subscription is an id unless the event was sent expanded.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum StripeCustomerRef {
    Id(String),
    Expanded { id: String },
}

impl StripeCustomerRef {
    pub fn id(&self) -> &str {
        match self {
            StripeCustomerRef::Id(id) | StripeCustomerRef::Expanded { id } => id,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StripeSubscription {
    pub id: String,
    pub customer: StripeCustomerRef,
    pub status: Option<String>,
    pub items: Option<StripeSubscriptionItems>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
pub struct StripeSubscriptionItems {
    #[serde(default)]
    pub data: Vec<StripeSubscriptionItem>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StripeSubscriptionItem {
    pub price: Option<StripePrice>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StripePrice {
    pub id: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl StripeSubscription {
    /// Reads `items.data[0].price.metadata.tier`.
    pub fn tier(&self) -> Result<i32> {
        let item = self
            .items
            .as_ref()
            .and_then(|items| items.data.first())
            .ok_or_else(|| anyhow!("subscription {} has no items", self.id))?;
        let price = item
            .price
            .as_ref()
            .ok_or_else(|| anyhow!("subscription {} item has no price", self.id))?;
        let raw = price
            .metadata
            .get("tier")
            .ok_or_else(|| anyhow!("subscription {} price has no tier metadata", self.id))?;

        raw.trim()
            .parse::<i32>()
            .with_context(|| format!("subscription {} tier {:?} is not a number", self.id, raw))
    }
}

/// Tier granted by an optional subscription; no subscription means no tier.
pub fn resolve_tier(subscription: Option<&StripeSubscription>) -> Result<i32> {
    match subscription {
        Some(subscription) => subscription.tier(),
        None => Ok(0),
    }
}

impl StripeClient {
    pub fn new(webhook_secret: String) -> Self {
        Self { webhook_secret }
    }

    /// Verifies the webhook signature. https://stripe.com/docs/webhooks/signatures
    pub fn verify_webhook_signature(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<StripeEvent> {
        self.verify_webhook_signature_at(payload, signature_header, Utc::now().timestamp())
    }

    pub fn verify_webhook_signature_at(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: i64,
    ) -> Result<StripeEvent> {
        let mut timestamp: Option<&str> = None;
        let mut signatures: Vec<&str> = Vec::new();

        for part in signature_header.split(',') {
            let part = part.trim();
            if let Some(rest) = part.strip_prefix("t=") {
                timestamp = Some(rest);
            } else if let Some(rest) = part.strip_prefix("v1=") {
                signatures.push(rest);
            }
        }

        let timestamp =
            timestamp.ok_or_else(|| anyhow!("missing timestamp in stripe-signature"))?;
        if signatures.is_empty() {
            bail!("missing v1 in stripe-signature");
        }

        let signed_at: i64 = timestamp
            .parse()
            .context("invalid timestamp in stripe-signature")?;
        if now.abs_diff(signed_at) > SIGNATURE_TOLERANCE_SECS {
            bail!("stripe-signature timestamp outside tolerance");
        }

        let mut mac = HmacSha256::new_from_slice(self.webhook_secret.as_bytes())?;
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);

        let matched = signatures.iter().any(|signature| {
            hex::decode(signature)
                .map(|provided| mac.clone().verify_slice(&provided).is_ok())
                .unwrap_or(false)
        });
        if !matched {
            bail!("invalid webhook signature");
        }

        let event: StripeEvent = serde_json::from_slice(payload)?;
        Ok(event)
    }

    pub fn extract_customer(event: &StripeEvent) -> Result<StripeCustomer> {
        serde_json::from_value(event.data.object.clone())
            .context("stripe event does not carry a customer object")
    }

    pub fn extract_subscription(event: &StripeEvent) -> Result<StripeSubscription> {
        serde_json::from_value(event.data.object.clone())
            .context("stripe event does not carry a subscription object")
    }
}
