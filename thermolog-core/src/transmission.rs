//! Delivery state machine gating local persistence
//!
//! ```text
//!            begin            finish(ok)
//!   Idle ───────────▶ Sending ───────────▶ Succeeded ──settle──▶ Idle
//!     ▲                  │                     │
//!     │                  │ finish(err)         │ begin
//!     │                  ▼                     ▼
//!     │               Failed ───── begin ──▶ Sending
//! ```
//!
//! The durable log may only be rewritten while the state is `Idle` or
//! `Succeeded`. `Failed` stays latched until the next delivery attempt
//! completes, so a flush issued after a failed send is a no-op and the
//! pending points remain the single copy to retry from. `Sending` also
//! blocks persistence: the outcome of the in-flight attempt is unknown.

/// Outcome of the most recent delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransmissionState {
    /// No attempt since start or since the last successful flush
    #[default]
    Idle,
    /// An attempt is in flight
    Sending,
    /// Last attempt was accepted by the collector
    Succeeded,
    /// Last attempt failed (network error or non-200 answer)
    Failed,
}

impl TransmissionState {
    /// Enter `Sending`
    pub fn begin(self) -> Self {
        TransmissionState::Sending
    }

    /// Record the outcome of an attempt
    ///
    /// Ignored unless an attempt is in flight.
    pub fn finish(self, delivered: bool) -> Self {
        match (self, delivered) {
            (TransmissionState::Sending, true) => TransmissionState::Succeeded,
            (TransmissionState::Sending, false) => TransmissionState::Failed,
            (other, _) => other,
        }
    }

    /// Acknowledge a successful attempt once its points are persisted
    pub fn settle(self) -> Self {
        match self {
            TransmissionState::Succeeded => TransmissionState::Idle,
            other => other,
        }
    }

    /// Whether the durable log may be rewritten
    pub fn permits_flush(self) -> bool {
        matches!(self, TransmissionState::Idle | TransmissionState::Succeeded)
    }

    /// True when the last attempt failed
    pub fn is_failed(self) -> bool {
        self == TransmissionState::Failed
    }
}
