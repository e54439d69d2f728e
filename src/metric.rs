use opentelemetry::{KeyValue, metrics::UpDownCounter};
use std::sync::LazyLock;

static STATDS: LazyLock<UpDownCounter<i64>> = LazyLock::new(|| {
    logfire::i64_up_down_counter("wa_relay_statds")
        .with_description("WhatsApp relay statistics")
        .with_unit("event")
        .build()
});

fn incr_statds(metric: String, value: String) {
    STATDS.add(1, &[KeyValue::new(metric, value)]);
}

/// Counts webhook events, e.g. `("verification", "invalid_token")`
pub fn incr_webhook_statds(event: &str, outcome: &str) {
    incr_statds(format!("webhook_{event}"), outcome.into())
}

pub fn incr_send_statds(kind: &str, outcome: &str) {
    incr_statds(format!("send_{kind}"), outcome.into())
}
