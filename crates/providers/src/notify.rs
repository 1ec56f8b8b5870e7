//! Fire-and-forget webhook notification of completed bookings.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::WebhookConfig;

/// Summary of a completed booking, delivered to the webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSummary {
    pub guest_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub property_description: String,
    pub total_fee: f64,
    pub currency: String,
    pub booking_reference: String,
    pub payment_reference: String,
}

/// Delivery outcome. Never an error: the saga only flips a flag on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    Delivered,
    Failed { reason: String },
}

impl NotifyOutcome {
    pub fn delivered(&self) -> bool {
        matches!(self, NotifyOutcome::Delivered)
    }
}

/// Sink for completed-booking notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, summary: &BookingSummary) -> NotifyOutcome;
}

/// POSTs the summary to a preconfigured webhook URL with a bounded
/// timeout. Construction fails only on an invalid TLS/client setup.
pub struct WebhookNotifier {
    http: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(config: WebhookConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            http,
            url: config.url,
        })
    }
}

#[async_trait]
impl NotificationSink for WebhookNotifier {
    #[tracing::instrument(skip(self, summary), fields(booking = %summary.booking_reference))]
    async fn notify(&self, summary: &BookingSummary) -> NotifyOutcome {
        let result = self.http.post(&self.url).json(summary).send().await;
        match result {
            Ok(response) if response.status().is_success() => NotifyOutcome::Delivered,
            Ok(response) => {
                let reason = format!("webhook returned {}", response.status());
                tracing::warn!(%reason, "booking notification not delivered");
                NotifyOutcome::Failed { reason }
            }
            Err(e) => {
                tracing::warn!(error = %e, "booking notification failed");
                NotifyOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Sink used when no webhook URL is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledNotifier;

#[async_trait]
impl NotificationSink for DisabledNotifier {
    async fn notify(&self, _summary: &BookingSummary) -> NotifyOutcome {
        NotifyOutcome::Failed {
            reason: "no webhook configured".to_string(),
        }
    }
}

/// Test sink that records every summary and can be told to fail.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    state: Arc<RwLock<RecordingState>>,
}

#[derive(Debug, Default)]
struct RecordingState {
    delivered: Vec<BookingSummary>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail(&self, fail: bool) {
        self.state.write().unwrap().fail = fail;
    }

    pub fn delivered(&self) -> Vec<BookingSummary> {
        self.state.read().unwrap().delivered.clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotifier {
    async fn notify(&self, summary: &BookingSummary) -> NotifyOutcome {
        let mut state = self.state.write().unwrap();
        if state.fail {
            return NotifyOutcome::Failed {
                reason: "sink offline".to_string(),
            };
        }
        state.delivered.push(summary.clone());
        NotifyOutcome::Delivered
    }
}
