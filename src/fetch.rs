//! Background forecast fetching
//!
//! Forecast requests issued by the navigation state machine are handed to a
//! single tokio task, which runs them one at a time and sends each outcome
//! back over a channel. The event loop drains that channel between input
//! events, so only the event loop ever mutates application state.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::data::{FetchError, ForecastSource, Resolution, SiteForecast};

/// A forecast fetch requested by the navigation state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Identifier used to match the outcome with the pending transition
    pub id: u64,
    pub location_id: String,
    pub resolution: Resolution,
}

/// Result of a [`FetchRequest`], sent back to the event loop
#[derive(Debug)]
pub struct FetchOutcome {
    pub request: FetchRequest,
    pub result: Result<SiteForecast, FetchError>,
}

/// Handle for talking to the background fetch task
pub struct FetchHandle {
    /// Channel for receiving completed fetches
    pub receiver: mpsc::Receiver<FetchOutcome>,
    requests: mpsc::Sender<FetchRequest>,
    shutdown_tx: mpsc::Sender<()>,
}

impl FetchHandle {
    /// Spawns the fetch task on the current tokio runtime
    ///
    /// # Arguments
    /// * `source` - Where forecasts are fetched from
    ///
    /// # Returns
    /// A FetchHandle whose `receiver` yields one outcome per request, in
    /// request order
    pub fn spawn(source: Arc<dyn ForecastSource>) -> Self {
        let (request_tx, mut request_rx) = mpsc::channel::<FetchRequest>(8);
        let (outcome_tx, outcome_rx) = mpsc::channel(8);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(request) = request_rx.recv() => {
                        debug!(id = request.id, location_id = %request.location_id, "fetching forecast");
                        let result = source
                            .fetch_forecast(&request.location_id, request.resolution)
                            .await;
                        if let Err(e) = &result {
                            warn!(id = request.id, error = %e, "forecast fetch failed");
                        }
                        if outcome_tx.send(FetchOutcome { request, result }).await.is_err() {
                            break;
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                    else => break,
                }
            }
        });

        Self {
            receiver: outcome_rx,
            requests: request_tx,
            shutdown_tx,
        }
    }

    /// Queues a request for the fetch task
    pub async fn request(
        &self,
        request: FetchRequest,
    ) -> Result<(), mpsc::error::SendError<FetchRequest>> {
        self.requests.send(request).await
    }

    /// Waits for the next completed fetch
    pub async fn recv(&mut self) -> Option<FetchOutcome> {
        self.receiver.recv().await
    }

    /// Shuts down the fetch task
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

/// Checks for a completed fetch without blocking
///
/// # Returns
/// * `Some(FetchOutcome)` if a fetch has finished
/// * `None` if nothing is pending
pub fn try_recv(handle: &mut FetchHandle) -> Option<FetchOutcome> {
    handle.receiver.try_recv().ok()
}
