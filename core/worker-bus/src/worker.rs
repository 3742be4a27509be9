//! Worker-side service: decodes requests, runs the estimator, posts replies
//!
//! This is the remote end of the message channel. It owns its port and an
//! estimator, and services one request at a time; the wire format has no
//! correlation ids, so requests are not interleaved.

use crate::estimator::SeriesEstimator;
use crate::link::MessagePort;
use crate::protocol::{ProtocolError, Reply, Request};
use tracing::{debug, warn};

/// Runs inside the worker context and services estimation requests
pub struct EstimatorWorker {
    port: MessagePort,
    estimator: SeriesEstimator,
}

impl EstimatorWorker {
    /// Create a worker with default estimator tuning
    pub fn new(port: MessagePort) -> Self {
        Self::with_estimator(port, SeriesEstimator::new())
    }

    /// Create a worker around an explicitly tuned estimator
    pub fn with_estimator(port: MessagePort, estimator: SeriesEstimator) -> Self {
        Self { port, estimator }
    }

    /// Service requests until the peer hangs up
    pub async fn run(self) {
        while let Some(raw) = self.port.recv().await {
            if let Err(err) = self.handle_message(&raw).await {
                warn!("request rejected: {err}");
            }
        }
        debug!("worker port closed, stopping");
    }

    /// Handle one raw request string
    ///
    /// Unknown commands and malformed frames produce no outbound traffic;
    /// the typed error is returned for the caller to log. A bad argument on
    /// a recognized command additionally posts an error reply, so the caller
    /// side is not left waiting forever.
    pub async fn handle_message(&self, raw: &str) -> Result<(), ProtocolError> {
        let request = match Request::parse(raw) {
            Ok(request) => request,
            Err(err @ ProtocolError::BadArgument { .. }) => {
                let _ = self.port.post(Reply::Error { reason: err.to_string() }.encode());
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        match request {
            Request::EstimatePi { iterations } => {
                debug!(iterations, "starting estimation");
                let progress_port = self.port.clone();
                let value = self
                    .estimator
                    .estimate(iterations, |index| {
                        let _ = progress_port.post(Reply::Progress { index }.encode());
                    })
                    .await;
                if self.port.post(Reply::Result { value }.encode()).is_err() {
                    warn!("result dropped, peer disconnected");
                }
            }
        }
        Ok(())
    }
}
