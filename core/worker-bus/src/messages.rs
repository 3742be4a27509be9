//! Message type definitions for the event bus

use serde::{Deserialize, Serialize};

// ============================================================================
// Trait Definition for the Message System
// ============================================================================

/// Base trait for all messages dispatched through the bus
///
/// Dispatch itself is keyed by the concrete type, not by this identifier;
/// the identifier feeds statistics and log output.
pub trait Message: Send + Sync + std::fmt::Debug + 'static {
    /// Get message type identifier
    fn message_type(&self) -> &'static str;
}

// ============================================================================
// Estimation Messages
// ============================================================================

/// Incremental progress from an in-flight estimation
///
/// Carries the 0-based index of the series term most recently summed.
/// Created transiently per notification; subscribers should not retain it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiProgress {
    pub index: u32,
}

/// Final value of a completed estimation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PiEstimate {
    pub value: f64,
}

/// Estimation rejected or failed on the worker side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateFailed {
    pub reason: String,
}

// ============================================================================
// UI Messages
// ============================================================================

/// Navigation change notification for interested components
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationChanged {
    pub path: String,
}

// ============================================================================
// Message Trait Implementations
// ============================================================================

impl Message for PiProgress {
    fn message_type(&self) -> &'static str { "pi_progress" }
}

impl Message for PiEstimate {
    fn message_type(&self) -> &'static str { "pi_estimate" }
}

impl Message for EstimateFailed {
    fn message_type(&self) -> &'static str { "estimate_failed" }
}

impl Message for NavigationChanged {
    fn message_type(&self) -> &'static str { "navigation_changed" }
}
