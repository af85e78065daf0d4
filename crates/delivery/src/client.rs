//! Segment delivery — fire-and-forget POST of submitted segments to the
//! collector endpoint.
//!
//! A dispatch never blocks the caller and is never retried: the request is
//! handed to a background task, the form has already been reset, and the
//! only feedback is a [`Notice`] once the transport settles. The collector
//! response body and status are deliberately ignored.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use url::Url;
use uuid::Uuid;

use segment_core::error::{StudioError, StudioResult};
use segment_core::notice::{Notice, NoticeSink};
use segment_core::segment::SegmentPayload;

/// Transport state of one dispatched submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Failed,
}

/// Record of one dispatch, kept in memory for the operational endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryRecord {
    pub id: Uuid,
    pub endpoint: String,
    pub payload: serde_json::Value,
    pub status: DeliveryStatus,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

/// Client that ships submitted segments to the collector.
///
/// Cheap to clone; clones share the delivery history and notice sink.
#[derive(Clone)]
pub struct DeliveryClient {
    endpoint: Url,
    client: reqwest::Client,
    sink: Arc<dyn NoticeSink>,
    history: Arc<DashMap<Uuid, DeliveryRecord>>,
}

impl DeliveryClient {
    /// Build a client for the given collector endpoint. The underlying
    /// HTTP client carries no request timeout; settlement is left to the
    /// network stack.
    pub fn new(endpoint_url: &str, sink: Arc<dyn NoticeSink>) -> StudioResult<Self> {
        let endpoint = Url::parse(endpoint_url)
            .map_err(|e| StudioError::Config(format!("invalid endpoint URL '{endpoint_url}': {e}")))?;
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| StudioError::Delivery(e.to_string()))?;

        Ok(Self {
            endpoint,
            client,
            sink,
            history: Arc::new(DashMap::new()),
        })
    }

    /// Dispatch a payload to the collector and return immediately with the
    /// delivery id. The POST runs on a background task; a [`Notice`] is
    /// emitted when it settles.
    pub fn dispatch(&self, payload: &SegmentPayload) -> StudioResult<Uuid> {
        let body = serde_json::to_value(payload)?;
        let id = Uuid::new_v4();

        self.history.insert(
            id,
            DeliveryRecord {
                id,
                endpoint: self.endpoint.to_string(),
                payload: body.clone(),
                status: DeliveryStatus::Pending,
                error: None,
                created_at: Utc::now(),
                settled_at: None,
            },
        );

        info!(
            delivery_id = %id,
            endpoint = %self.endpoint,
            segment_name = %payload.segment_name,
            "Dispatching segment to collector"
        );

        let this = self.clone();
        tokio::spawn(async move {
            this.send(id, body).await;
        });

        Ok(id)
    }

    async fn send(self, id: Uuid, body: serde_json::Value) {
        let result = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await;

        match result {
            Ok(_response) => {
                // Opaque by design: any settled response counts as sent.
                self.settle(id, DeliveryStatus::Sent, None);
                info!(delivery_id = %id, "Segment delivery settled");
                self.sink.notify(Notice::SegmentSent { delivery_id: id });
            }
            Err(e) => {
                let reason = e.to_string();
                self.settle(id, DeliveryStatus::Failed, Some(reason.clone()));
                error!(delivery_id = %id, error = %reason, "Segment delivery failed");
                self.sink.notify(Notice::SegmentFailed {
                    delivery_id: id,
                    reason,
                });
            }
        }
    }

    fn settle(&self, id: Uuid, status: DeliveryStatus, error: Option<String>) {
        if let Some(mut record) = self.history.get_mut(&id) {
            record.status = status;
            record.error = error;
            record.settled_at = Some(Utc::now());
        }
    }

    /// All recorded deliveries, most recent first.
    pub fn deliveries(&self) -> Vec<DeliveryRecord> {
        let mut records: Vec<DeliveryRecord> =
            self.history.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }

    pub fn get_delivery(&self, id: Uuid) -> Option<DeliveryRecord> {
        self.history.get(&id).map(|r| r.value().clone())
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }
}
