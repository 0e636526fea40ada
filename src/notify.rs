// Best-effort booking notifications to an external webhook

use crate::config::NotifierConfig;
use crate::models::{Booking, Category, Unit};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NotificationError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Notification timed out after {0}ms")]
    Timeout(u64),

    #[error("Dispatcher responded with status {0}")]
    Status(u16),

    #[error("Client error: {0}")]
    Client(String),
}

// Public booking fields sent to the dispatcher
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BookingNotification {
    pub booking_id: String,
    pub tent_name: String,
    pub tent_category: Category,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: u32,
    pub guests: u32,
    pub total_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
    pub created_at: String,
}

impl BookingNotification {
    pub fn new(booking: &Booking, unit: &Unit) -> Self {
        Self {
            booking_id: booking.id.clone(),
            tent_name: unit.name.en.clone(),
            tent_category: unit.category,
            guest_name: booking.guest_name.clone(),
            guest_email: booking.guest_email.clone(),
            guest_phone: booking.guest_phone.clone(),
            check_in: booking.check_in,
            check_out: booking.check_out,
            nights: booking.nights,
            guests: booking.guests,
            total_price: booking.total_price,
            special_requests: booking.special_requests.clone(),
            created_at: iso_timestamp(booking.created_at),
        }
    }
}

fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[async_trait]
pub trait BookingNotifier: Send + Sync + 'static {
    async fn notify(&self, notification: &BookingNotification) -> Result<(), NotificationError>;
}

// Used when no webhook is configured
pub struct NoopNotifier;

#[async_trait]
impl BookingNotifier for NoopNotifier {
    async fn notify(&self, notification: &BookingNotification) -> Result<(), NotificationError> {
        debug!(booking_id = %notification.booking_id, "notifications disabled, skipping");
        Ok(())
    }
}

pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    timeout_ms: u64,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotificationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotificationError::Client(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
            timeout_ms: timeout.as_millis() as u64,
        })
    }

    /// Webhook notifier when a URL is configured, otherwise the no-op one.
    pub fn from_config(
        config: &NotifierConfig,
    ) -> Result<Arc<dyn BookingNotifier>, NotificationError> {
        match &config.webhook_url {
            Some(url) => Ok(Arc::new(Self::new(url.clone(), config.timeout())?)),
            None => Ok(Arc::new(NoopNotifier)),
        }
    }
}

#[async_trait]
impl BookingNotifier for WebhookNotifier {
    async fn notify(&self, notification: &BookingNotification) -> Result<(), NotificationError> {
        let response = self
            .client
            .post(&self.url)
            .json(notification)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotificationError::Timeout(self.timeout_ms)
                } else {
                    NotificationError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotificationError::Status(status.as_u16()));
        }
        Ok(())
    }
}

/// Fires the notification on its own task. The caller never awaits the result;
/// `on_outcome` sees whether delivery succeeded, after which the outcome is dropped.
pub fn dispatch_detached<F>(
    notifier: Arc<dyn BookingNotifier>,
    notification: BookingNotification,
    timeout: Duration,
    on_outcome: F,
) -> JoinHandle<()>
where
    F: FnOnce(&Result<(), NotificationError>) + Send + 'static,
{
    tokio::spawn(async move {
        let started = Instant::now();
        let outcome = match tokio::time::timeout(timeout, notifier.notify(&notification)).await {
            Ok(result) => result,
            Err(_) => Err(NotificationError::Timeout(timeout.as_millis() as u64)),
        };

        match &outcome {
            Ok(()) => debug!(
                booking_id = %notification.booking_id,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "booking notification delivered"
            ),
            Err(e) => warn!(
                booking_id = %notification.booking_id,
                error = %e,
                "booking notification failed, booking kept"
            ),
        }
        on_outcome(&outcome);
    })
}

#[cfg(test)]
pub(crate) mod mock_notifier {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

    #[derive(Debug, Clone, Copy)]
    pub enum NotifierMode {
        Accepting,
        Hanging,
        Rejecting,
    }

    pub struct MockNotifier {
        mode: AtomicU8,
        pub calls: AtomicUsize,
        pub received: Mutex<Vec<BookingNotification>>,
    }

    impl MockNotifier {
        pub fn new(mode: NotifierMode) -> Self {
            let notifier = Self {
                mode: AtomicU8::new(0),
                calls: AtomicUsize::new(0),
                received: Mutex::new(Vec::new()),
            };
            notifier.set_mode(mode);
            notifier
        }

        pub fn set_mode(&self, mode: NotifierMode) {
            let value = match mode {
                NotifierMode::Accepting => 0,
                NotifierMode::Hanging => 1,
                NotifierMode::Rejecting => 2,
            };
            self.mode.store(value, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl BookingNotifier for MockNotifier {
        async fn notify(&self, notification: &BookingNotification) -> Result<(), NotificationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.mode.load(Ordering::SeqCst) {
                1 => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(())
                }
                2 => Err(NotificationError::Status(502)),
                _ => {
                    self.received.lock().push(notification.clone());
                    Ok(())
                }
            }
        }
    }
}
