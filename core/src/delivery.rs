//! Fire-and-forget delivery to the remote sink.
//!
//! `submit` spawns a detached task per envelope and returns immediately; the
//! caller never waits on the outcome. Exactly one outcome is logged per
//! attempt: success with status, error status with body, or transport
//! failure. There is no retry, backoff, or queue — a failed submission is
//! permanently lost unless the record also passed through the durable sample
//! log. Submissions are independent and complete in no guaranteed order.

use guardiantrack_protocol::Envelope;
use tokio::task::JoinHandle;

/// Asynchronous client for the single configured sink URL.
#[derive(Debug, Clone)]
pub struct DeliveryClient {
    http: reqwest::Client,
    sink_url: String,
}

impl DeliveryClient {
    pub fn new(sink_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            sink_url: sink_url.into(),
        }
    }

    pub fn sink_url(&self) -> &str {
        &self.sink_url
    }

    /// Submit one envelope without waiting on the outcome.
    ///
    /// The returned handle lets tests await completion; production callers
    /// drop it. In-flight submissions are never cancelled by agent shutdown.
    pub fn submit(&self, envelope: Envelope) -> JoinHandle<()> {
        let http = self.http.clone();
        let sink_url = self.sink_url.clone();
        tokio::spawn(async move {
            dispatch(http, sink_url, envelope).await;
        })
    }
}

/// One POST attempt, converted to exactly one log entry.
async fn dispatch(http: reqwest::Client, sink_url: String, envelope: Envelope) {
    let kind = envelope.kind().as_str();
    match http.post(&sink_url).form(envelope.fields()).send().await {
        Ok(response) => {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            if status.is_success() {
                tracing::debug!(kind, %status, body, "delivered record to sink");
            } else {
                tracing::error!(kind, %status, body, "sink rejected record");
            }
        }
        Err(error) => {
            tracing::error!(kind, "sink request failed: {error}");
        }
    }
}
