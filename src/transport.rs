// Upload gateway.
// One blocking POST per request, run on its own thread so drawing never waits on the network.
// Outcomes come back through a channel the window loop polls once per frame.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;

use crate::error::{Result, SketchError, TRANSPORT_FAILURE_MESSAGE};

/// Anything that can take an encoded image somewhere.
pub trait Gateway: Send + Sync + 'static {
    fn upload(&self, payload: &str) -> Result<()>;
}

/// POSTs the payload as a JSON string to a fixed endpoint.
pub struct HttpGateway {
    client: Client,
    endpoint: String,
}

impl HttpGateway {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SketchError::Transport(e.to_string()))?;
        Ok(Self { client, endpoint: endpoint.into() })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Gateway for HttpGateway {
    fn upload(&self, payload: &str) -> Result<()> {
        let body = serde_json::to_string(payload)
            .map_err(|e| SketchError::Transport(e.to_string()))?;

        let response = match self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
        {
            Ok(r) => r,
            Err(e) => {
                log::error!("An error occurred: {e}");
                return Err(SketchError::Transport(TRANSPORT_FAILURE_MESSAGE.to_string()));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            log::error!("Backend returned code {}, body was: {}", status.as_u16(), text);
            return Err(SketchError::Transport(TRANSPORT_FAILURE_MESSAGE.to_string()));
        }

        log::info!("uploaded {} bytes to {}", payload.len(), self.endpoint);
        Ok(())
    }
}

/// Fire-and-forget front for a `Gateway`.
pub struct Uploader {
    gateway: Arc<dyn Gateway>,
    tx: Sender<Result<()>>,
    rx: Receiver<Result<()>>,
    in_flight: usize,
}

impl Uploader {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { gateway, tx, rx, in_flight: 0 }
    }

    /// Start an upload in the background. No retries.
    pub fn submit(&mut self, payload: String) {
        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        self.in_flight += 1;
        thread::spawn(move || {
            let outcome = gateway.upload(&payload);
            // receiver gone means the window closed; nothing to report to
            let _ = tx.send(outcome);
        });
    }

    /// Next finished upload, if any. Never blocks.
    pub fn poll(&mut self) -> Option<Result<()>> {
        match self.rx.try_recv() {
            Ok(outcome) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(outcome)
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}
