//! Caller-side channel: encodes requests, fans replies out on the event bus
//!
//! The client owns the UI end of the message port. Incoming reply strings
//! are decoded and republished as typed bus messages, so components observe
//! progress and results through their ordinary subscriptions.

use crate::bus::EventBus;
use crate::link::{MessagePort, PostError};
use crate::messages::{EstimateFailed, PiEstimate, PiProgress};
use crate::protocol::{Reply, Request};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

/// State of the single modeled outstanding call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Idle,
    Sent,
    Completed,
}

/// Caller-side endpoint of the estimation channel
pub struct EstimatorClient {
    port: MessagePort,
    bus: Arc<EventBus>,
    state: CallState,
    sent_at: Option<DateTime<Utc>>,
}

impl EstimatorClient {
    /// Create a client over `port`, publishing replies on `bus`
    pub fn new(port: MessagePort, bus: Arc<EventBus>) -> Self {
        Self {
            port,
            bus,
            state: CallState::Idle,
            sent_at: None,
        }
    }

    /// Current call state
    pub fn state(&self) -> CallState {
        self.state
    }

    /// Send an estimation request
    ///
    /// The argument is not validated here; the worker side rejects bad
    /// input. The wire format carries no correlation id, so a request
    /// issued while another is outstanding produces indistinguishable
    /// replies.
    pub fn request_estimate(&mut self, iterations: u32) -> Result<(), PostError> {
        if self.state == CallState::Sent {
            warn!("estimate requested while a call is outstanding");
        }
        self.port.post(Request::EstimatePi { iterations }.encode())?;
        self.state = CallState::Sent;
        self.sent_at = Some(Utc::now());
        Ok(())
    }

    /// Decode one raw reply and publish it on the bus
    ///
    /// Messages with an unrecognized topic are ignored.
    pub fn handle_message(&mut self, raw: &str) {
        match Reply::parse(raw) {
            Ok(Reply::Progress { index }) => {
                self.bus.publish(&PiProgress { index });
            }
            Ok(Reply::Result { value }) => {
                if let Some(sent_at) = self.sent_at.take() {
                    let elapsed_ms = (Utc::now() - sent_at).num_milliseconds();
                    debug!(elapsed_ms, "estimate completed");
                }
                self.state = CallState::Completed;
                self.bus.publish(&PiEstimate { value });
            }
            Ok(Reply::Error { reason }) => {
                self.sent_at = None;
                self.state = CallState::Completed;
                self.bus.publish(&EstimateFailed { reason });
            }
            Err(err) => {
                debug!("ignoring unrecognized message: {err}");
            }
        }
    }

    /// Drain replies already delivered to the port, without blocking
    pub fn process_pending(&mut self) {
        while let Some(raw) = self.port.try_recv() {
            self.handle_message(&raw);
        }
    }

    /// Wait for the next reply and handle it
    ///
    /// Returns `false` once the channel has closed.
    pub async fn process_next(&mut self) -> bool {
        match self.port.recv().await {
            Some(raw) => {
                self.handle_message(&raw);
                true
            }
            None => false,
        }
    }
}
