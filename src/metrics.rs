use serde::Serialize;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationKind {
    Initiation,
    CallbackUpdate,
    StatusQuery,
    Refund,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentEvent {
    pub operation: OperationKind,
    pub transaction_id: Option<Uuid>,
    pub external_ref: Option<String>,
    pub order_id: Option<String>,
    pub success: bool,
    pub duration_ms: i64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

pub trait MetricsSink: Send + Sync {
    fn record(&self, event: PaymentEvent);
}

pub struct TracingMetricsSink;

impl MetricsSink for TracingMetricsSink {
    fn record(&self, event: PaymentEvent) {
        match serde_json::to_string(&event) {
            Ok(json) => tracing::info!(target: "payment_metrics", "{json}"),
            Err(e) => tracing::warn!("failed to serialize payment event: {e}"),
        }
    }
}

#[derive(Default)]
pub struct RecordingMetricsSink {
    events: Mutex<Vec<PaymentEvent>>,
}

impl RecordingMetricsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PaymentEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl MetricsSink for RecordingMetricsSink {
    fn record(&self, event: PaymentEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
