//! Outcome model: terminal state of one execute call.
//!
//! Parsing → Lookup → Decoding → Dispatched → { Completed | HandlerFailed | Canceled | DeadlineExceeded }
//!
//! Failures before dispatch are `Rejected`. The variants are mutually
//! exclusive; exactly one is recorded per call.

use serde::{Deserialize, Serialize};

use super::errors::{ExecuteError, PasserError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// Handler returned `Ok`.
    Completed,

    /// Handler returned its own error.
    HandlerFailed,

    /// Context was canceled before the handler finished.
    Canceled,

    /// Context deadline passed before the handler finished.
    DeadlineExceeded,

    /// Envelope never reached a handler (malformed, unknown type, decode failure).
    Rejected,

    /// Handler task ended without delivering a result.
    Panicked,
}

impl Outcome {
    pub fn of<R, E>(result: &Result<R, ExecuteError<E>>) -> Self {
        match result {
            Ok(_) => Outcome::Completed,
            Err(ExecuteError::Handler(_)) => Outcome::HandlerFailed,
            Err(ExecuteError::Passer(err)) => match err {
                PasserError::Canceled => Outcome::Canceled,
                PasserError::DeadlineExceeded => Outcome::DeadlineExceeded,
                PasserError::HandlerPanicked(_) => Outcome::Panicked,
                _ => Outcome::Rejected,
            },
        }
    }

    /// The handler may still be running after the caller got this outcome.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Outcome::Canceled | Outcome::DeadlineExceeded)
    }
}
