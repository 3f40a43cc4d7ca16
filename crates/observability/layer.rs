use super::config::ServiceContext;
use super::notifier::{NotificationEvent, Notifier, SpanSummary};
use chrono::Utc;
use std::collections::BTreeMap;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use uuid::Uuid;

const REDACTED: &str = "[REDACTED]";

/// Forwards events at or above `min_level` to the notifier.
#[derive(Clone)]
pub(crate) struct ErrorNotifyLayer {
    notifier: Notifier,
    service_context: ServiceContext,
    min_level: Level,
}

impl ErrorNotifyLayer {
    pub(crate) fn new(
        notifier: Notifier,
        service_context: ServiceContext,
        min_level: Level,
    ) -> Self {
        Self {
            notifier,
            service_context,
            min_level,
        }
    }
}

#[derive(Default)]
struct FieldMapVisitor {
    values: BTreeMap<String, String>,
}

impl FieldMapVisitor {
    fn insert(&mut self, field: &Field, value: String) {
        let name = field.name();
        self.values.insert(name.to_string(), redact(name, value));
    }
}

impl Visit for FieldMapVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.insert(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, value.to_string());
    }
}

#[derive(Default)]
struct SpanFieldMap {
    values: BTreeMap<String, String>,
}

impl<S> Layer<S> for ErrorNotifyLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        ctx: Context<'_, S>,
    ) {
        let mut visitor = FieldMapVisitor::default();
        attrs.record(&mut visitor);

        if visitor.values.is_empty() {
            return;
        }

        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(SpanFieldMap {
                values: visitor.values,
            });
        }
    }

    fn on_record(
        &self,
        id: &tracing::span::Id,
        values: &tracing::span::Record<'_>,
        ctx: Context<'_, S>,
    ) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        let mut visitor = FieldMapVisitor::default();
        values.record(&mut visitor);

        if visitor.values.is_empty() {
            return;
        }

        let mut extensions = span.extensions_mut();
        match extensions.get_mut::<SpanFieldMap>() {
            Some(existing) => existing.values.extend(visitor.values),
            None => extensions.insert(SpanFieldMap {
                values: visitor.values,
            }),
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        if *event.metadata().level() > self.min_level {
            return;
        }

        let mut visitor = FieldMapVisitor::default();
        event.record(&mut visitor);

        let message = visitor
            .values
            .remove("message")
            .map(|raw| unquote_debug_string(&raw));
        let event_id = visitor
            .values
            .remove("event_id")
            .map(|raw| unquote_debug_string(&raw))
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());

        let spans = ctx
            .event_span(event)
            .map(|span| {
                span.scope()
                    .from_root()
                    .map(|s| SpanSummary {
                        name: s.metadata().name().to_string(),
                        fields: s
                            .extensions()
                            .get::<SpanFieldMap>()
                            .map(|m| m.values.clone())
                            .unwrap_or_default(),
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let context = &self.service_context;
        let notification = NotificationEvent {
            event_id,
            level: *event.metadata().level(),
            timestamp: Utc::now(),
            service_name: context.service_name.clone(),
            environment: context.environment.clone(),
            component: context.component.clone(),
            server_name: context.server_name.clone(),
            target: event.metadata().target().to_string(),
            file: event.metadata().file().map(|f| f.to_string()),
            line: event.metadata().line(),
            message,
            fields: visitor.values,
            spans,
        };

        self.notifier.try_notify(notification);
    }
}

fn unquote_debug_string(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        return trimmed[1..trimmed.len() - 1].to_string();
    }
    trimmed.to_string()
}

fn redact(field_name: &str, value: String) -> String {
    if is_sensitive_key(field_name) {
        return REDACTED.to_string();
    }
    value
}

pub(crate) fn is_sensitive_key(field_name: &str) -> bool {
    let field = field_name.to_ascii_lowercase();
    // `code` alone is an OAuth authorization code; `status_code` and friends are fine.
    field == "code"
        || (field.ends_with("_code") && field.contains("auth"))
        || field.contains("secret")
        || field.contains("password")
        || field.contains("token")
        || field.contains("authorization")
        || field.contains("api_key")
        || field.contains("dsn")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_are_redacted() {
        for key in [
            "code",
            "auth_code",
            "access_token",
            "refresh_token",
            "client_secret",
            "Authorization",
            "api_key",
            "glitchtip_dsn",
            "password",
        ] {
            assert_eq!(redact(key, "value".to_string()), REDACTED, "{key}");
        }
    }

    #[test]
    fn diagnostics_are_kept() {
        for key in ["status_code", "user_id", "event_id", "db_error", "status"] {
            assert_eq!(redact(key, "value".to_string()), "value", "{key}");
        }
    }

    #[test]
    fn debug_strings_are_unquoted() {
        assert_eq!(unquote_debug_string("\"hello\""), "hello");
        assert_eq!(unquote_debug_string("42"), "42");
        assert_eq!(unquote_debug_string("\""), "\"");
    }
}
