mod config;
mod glitchtip;
mod layer;
mod notifier;

pub use config::GlitchtipDsn;

use anyhow::Result;
use config::ObservabilityConfig;
use glitchtip::GlitchtipProvider;
use layer::ErrorNotifyLayer;
use notifier::Notifier;
use std::sync::Arc;
use tracing::info;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Installs the global subscriber. Must run inside a tokio runtime.
pub fn init_observability(component: &str) -> Result<()> {
    let config = ObservabilityConfig::from_env(component);
    let mut warnings = config.warnings.clone();

    let notify_layer = match config.glitchtip.as_ref() {
        Some(glitchtip) => match GlitchtipProvider::new(glitchtip.dsn.clone()) {
            Ok(provider) => {
                let notifier = Notifier::new(vec![Arc::new(provider)]);
                Some(
                    ErrorNotifyLayer::new(
                        notifier,
                        config.service_context.clone(),
                        glitchtip.min_level,
                    )
                    .with_filter(tracing_subscriber::filter::LevelFilter::from_level(
                        glitchtip.min_level,
                    )),
                )
            }
            Err(err) => {
                warnings.push(format!("glitchtip provider could not be built: {err}"));
                None
            }
        },
        None => None,
    };

    let error_tracking = notify_layer.is_some();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Local time so `TZ=...` shows the offset in logs.
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339());

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(notify_layer)
        .with(env_filter)
        .try_init()?;

    let context = &config.service_context;
    for warning in &warnings {
        warn!(
            service = %context.service_name,
            environment = %context.environment,
            component = %context.component,
            warning = %warning,
            "observability: config warning"
        );
    }

    info!(
        service = %context.service_name,
        environment = %context.environment,
        component = %context.component,
        error_tracking,
        "observability: initialized"
    );

    Ok(())
}
