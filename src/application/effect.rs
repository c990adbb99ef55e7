//! Outcome of best-effort side effects.
//!
//! Hooks, the revalidation trigger, and the CDN purge run after the primary
//! write has already succeeded. Their outcome is logged and reported to the
//! caller but never turned into a failure of the write.

use std::fmt;

use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub enum EffectOutcome<E> {
    /// The effect was not attempted, usually because it is not configured.
    Skipped { reason: &'static str },
    Succeeded,
    Failed(E),
}

impl<E> EffectOutcome<E> {
    pub fn skipped(reason: &'static str) -> Self {
        Self::Skipped { reason }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Short label used for metrics and structured logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Skipped { .. } => "skipped",
            Self::Succeeded => "succeeded",
            Self::Failed(_) => "failed",
        }
    }

    pub fn map_err<F, O: FnOnce(E) -> F>(self, op: O) -> EffectOutcome<F> {
        match self {
            Self::Skipped { reason } => EffectOutcome::Skipped { reason },
            Self::Succeeded => EffectOutcome::Succeeded,
            Self::Failed(err) => EffectOutcome::Failed(op(err)),
        }
    }
}

impl<E: fmt::Display> EffectOutcome<E> {
    /// Emit one log line describing the outcome of `effect`.
    pub fn log(&self, effect: &'static str) {
        match self {
            Self::Skipped { reason } => debug!(
                target = "unevent::effect",
                effect,
                outcome = "skipped",
                reason,
                "side effect skipped"
            ),
            Self::Succeeded => info!(
                target = "unevent::effect",
                effect,
                outcome = "succeeded",
                "side effect applied"
            ),
            Self::Failed(err) => warn!(
                target = "unevent::effect",
                effect,
                outcome = "failed",
                error = %err,
                "side effect failed; primary write kept"
            ),
        }
    }
}

/// Failure of an outbound notification (revalidation or CDN purge).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("peer answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid request: {0}")]
    Request(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels() {
        let skipped: EffectOutcome<DeliveryError> = EffectOutcome::skipped("not configured");
        assert!(skipped.is_skipped());
        assert_eq!(skipped.label(), "skipped");

        let failed: EffectOutcome<DeliveryError> =
            EffectOutcome::Failed(DeliveryError::Transport("refused".to_string()));
        assert!(failed.is_failed());
        assert_eq!(failed.label(), "failed");
    }

    #[test]
    fn map_err_preserves_variant() {
        let failed: EffectOutcome<u16> = EffectOutcome::Failed(502);
        let mapped = failed.map_err(|status| format!("status {status}"));
        assert!(matches!(mapped, EffectOutcome::Failed(ref msg) if msg == "status 502"));

        let skipped: EffectOutcome<u16> = EffectOutcome::skipped("empty");
        assert!(matches!(
            skipped.map_err(|s| s.to_string()),
            EffectOutcome::Skipped { reason: "empty" }
        ));
    }

    #[test]
    fn delivery_error_display() {
        let err = DeliveryError::Status {
            status: 503,
            body: "busy".to_string(),
        };
        assert_eq!(err.to_string(), "peer answered 503: busy");
    }
}
