use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use vitals_core::{Alert, AlertSink};

use crate::format::json_payload;
use crate::DispatchError;

/// Concurrent POSTs allowed per sink; further alerts queue for a permit.
const DEFAULT_MAX_IN_FLIGHT: usize = 8;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// POSTs each alert as JSON to a webhook URL.
///
/// Delivery is fire-and-forget on the tokio runtime the sink was created
/// in; failures are logged and dropped. At most `max_in_flight` requests
/// are open at once. Call [`WebhookSink::flush`] before shutting down to
/// wait for requests still pending.
pub struct WebhookSink {
    url: reqwest::Url,
    client: reqwest::Client,
    runtime: Handle,
    max_in_flight: usize,
    permits: Arc<Semaphore>,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
}

impl WebhookSink {
    /// Must be called from within a tokio runtime.
    pub fn new(url: &str) -> Result<Self, DispatchError> {
        Self::with_max_in_flight(url, DEFAULT_MAX_IN_FLIGHT)
    }

    pub fn with_max_in_flight(url: &str, max_in_flight: usize) -> Result<Self, DispatchError> {
        let url = reqwest::Url::parse(url)
            .map_err(|e| DispatchError::Config(format!("Invalid webhook URL {}: {}", url, e)))?;
        if max_in_flight == 0 {
            return Err(DispatchError::Config(
                "Webhook needs at least one request in flight".to_string(),
            ));
        }
        let runtime = Handle::try_current().map_err(|e| {
            DispatchError::Config(format!("Webhook delivery needs a tokio runtime: {}", e))
        })?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DispatchError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url,
            client,
            runtime,
            max_in_flight,
            permits: Arc::new(Semaphore::new(max_in_flight)),
            in_flight: Mutex::new(Vec::new()),
        })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Requests currently holding a delivery permit
    pub fn active_requests(&self) -> usize {
        self.max_in_flight - self.permits.available_permits()
    }

    /// Wait for every delivery started so far.
    pub async fn flush(&self) {
        let pending: Vec<JoinHandle<()>> = {
            let mut in_flight = self
                .in_flight
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            std::mem::take(&mut *in_flight)
        };
        for handle in pending {
            if let Err(e) = handle.await {
                tracing::warn!("Webhook delivery task failed: {}", e);
            }
        }
    }
}

impl AlertSink for WebhookSink {
    fn deliver(&self, alert: Alert) {
        let client = self.client.clone();
        let url = self.url.clone();
        let payload = json_payload(&alert);
        let permits = Arc::clone(&self.permits);

        let handle = self.runtime.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                tracing::warn!("Webhook closed; dropping {}", alert.condition);
                return;
            };
            let result = client
                .post(url)
                .json(&payload)
                .send()
                .await
                .and_then(|response| response.error_for_status());
            match result {
                Ok(_) => tracing::debug!(
                    "Delivered {} for patient {} to webhook",
                    alert.condition,
                    alert.patient_id
                ),
                Err(e) => tracing::warn!(
                    "Failed to deliver {} for patient {} to webhook: {}",
                    alert.condition,
                    alert.patient_id,
                    e
                ),
            }
        });

        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        in_flight.retain(|h| !h.is_finished());
        in_flight.push(handle);
    }
}
