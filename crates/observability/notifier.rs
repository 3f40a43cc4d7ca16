use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::Level;
use tracing::warn;

const QUEUE_CAPACITY: usize = 256;

#[derive(Clone, Debug)]
pub(crate) struct SpanSummary {
    pub(crate) name: String,
    pub(crate) fields: BTreeMap<String, String>,
}

#[derive(Clone, Debug)]
pub(crate) struct NotificationEvent {
    /// Simple-format UUID; reused from the event's `event_id` field when present.
    pub(crate) event_id: String,
    pub(crate) level: Level,
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) service_name: String,
    pub(crate) environment: String,
    pub(crate) component: String,
    pub(crate) server_name: String,
    pub(crate) target: String,
    pub(crate) file: Option<String>,
    pub(crate) line: Option<u32>,
    pub(crate) message: Option<String>,
    pub(crate) fields: BTreeMap<String, String>,
    pub(crate) spans: Vec<SpanSummary>,
}

#[async_trait]
pub(crate) trait NotificationProvider: Send + Sync {
    async fn send(&self, event: &NotificationEvent) -> Result<()>;
    fn provider_name(&self) -> &'static str;
}

/// Hands events to a background task so the logging call site never waits on the network.
#[derive(Clone)]
pub(crate) struct Notifier {
    tx: mpsc::Sender<NotificationEvent>,
}

impl Notifier {
    pub(crate) fn new(providers: Vec<Arc<dyn NotificationProvider>>) -> Self {
        let (tx, rx) = mpsc::channel::<NotificationEvent>(QUEUE_CAPACITY);
        tokio::spawn(deliver(rx, providers));
        Self { tx }
    }

    /// Returns `false` when the event was dropped.
    pub(crate) fn try_notify(&self, event: NotificationEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("notifier: queue full; dropping event");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("notifier: queue closed; dropping event");
                false
            }
        }
    }
}

async fn deliver(
    mut rx: mpsc::Receiver<NotificationEvent>,
    providers: Vec<Arc<dyn NotificationProvider>>,
) {
    while let Some(event) = rx.recv().await {
        for provider in &providers {
            if let Err(error) = provider.send(&event).await {
                warn!(
                    provider = provider.provider_name(),
                    event_id = %event.event_id,
                    error = %error,
                    "notifier: provider failed"
                );
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_event() -> NotificationEvent {
    NotificationEvent {
        event_id: "0f8fad5bd9cb469fa16570867728950e".to_string(),
        level: Level::ERROR,
        timestamp: Utc::now(),
        service_name: "backend".to_string(),
        environment: "local".to_string(),
        component: "backend".to_string(),
        server_name: "host-1".to_string(),
        target: "backend::usecases::tiktok_oauth".to_string(),
        file: Some("backend/src/usecases/tiktok_oauth.rs".to_string()),
        line: Some(42),
        message: Some("tiktok_oauth: token exchange failed".to_string()),
        fields: BTreeMap::from([("user_id".to_string(), "u-1".to_string())]),
        spans: Vec::new(),
    }
}
