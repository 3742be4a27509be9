//! # Worker Bus
//!
//! Typed publish/subscribe event bus and a string-framed message channel for
//! offloading π estimation to a background worker task.
//!
//! ## Features
//!
//! - **Type Safety**: bus dispatch keyed by message type, not topic strings
//! - **Snapshot Dispatch**: handlers may subscribe/unsubscribe mid-publish
//! - **Isolated Handlers**: a panicking subscriber cannot block the rest
//! - **Strict Wire Parsing**: `"Command(arg)"` requests, `"Topic:payload"` replies
//! - **Error Replies**: bad arguments are reported back instead of vanishing
//! - **Throttled Progress**: bounded notification count regardless of series length
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use worker_bus::{duplex, CallState, EstimatorClient, EstimatorWorker, EventBus, PiEstimate};
//!
//! #[tokio::main]
//! async fn main() {
//!     // The two ends of the postMessage-style channel
//!     let (ui_port, worker_port) = duplex();
//!     tokio::spawn(EstimatorWorker::new(worker_port).run());
//!
//!     // Components observe results through ordinary bus subscriptions
//!     let bus = Arc::new(EventBus::new());
//!     let subscription = bus.subscribe(|estimate: &PiEstimate| {
//!         println!("pi is approximately {}", estimate.value);
//!     });
//!
//!     let mut client = EstimatorClient::new(ui_port, bus.clone());
//!     client.request_estimate(10_000).unwrap();
//!     while client.state() != CallState::Completed {
//!         client.process_next().await;
//!     }
//!
//!     bus.unsubscribe(&subscription);
//! }
//! ```

pub mod bus;
pub mod client;
pub mod estimator;
pub mod link;
pub mod messages;
pub mod protocol;
pub mod worker;

// Re-exports
pub use bus::{BusStats, EventBus, Subscription};
pub use client::{CallState, EstimatorClient};
pub use estimator::{sequence, term, EstimatorConfig, SeriesEstimator};
pub use link::{duplex, MessagePort, PostError};
pub use messages::{EstimateFailed, Message, NavigationChanged, PiEstimate, PiProgress};
pub use protocol::{ProtocolError, Reply, Request};
pub use worker::EstimatorWorker;
