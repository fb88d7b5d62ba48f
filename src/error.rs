//! Error types used by the bus, the registry, the runtime and leaf workers.
//!
//! - [`BusError`]: an envelope could not be enqueued.
//! - [`LoadError`]: the component table could not be read or parsed.
//! - [`RuntimeError`]: errors raised by the runtime itself.
//! - [`WorkerError`]: errors raised by one pass of a leaf worker loop.
//!
//! All types provide `as_label` (stable snake_case label for logs) and
//! `as_message`. None of them is ever allowed to stop the dispatcher loop.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::envelope::Envelope;

/// # Enqueue failures.
///
/// The rejected envelope is handed back so the caller decides what happens
/// to it; nothing is retried automatically.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BusError {
    /// Every slot of the bounded queue is taken.
    #[error("bus full ({capacity} slots); dropped {envelope}")]
    Full {
        /// Configured queue capacity.
        capacity: usize,
        /// The envelope that was not enqueued.
        envelope: Envelope,
    },

    /// The consuming side is gone (the dispatcher has exited).
    #[error("bus closed; dropped {envelope}")]
    Closed {
        /// The envelope that was not enqueued.
        envelope: Envelope,
    },
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use actionbus::{Address, BusError, Envelope};
    ///
    /// let env = Envelope::new(Address::new(1), Address::new(0), "PRINT hi");
    /// let err = BusError::Closed { envelope: env };
    /// assert_eq!(err.as_label(), "bus_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::Full { .. } => "bus_full",
            BusError::Closed { .. } => "bus_closed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            BusError::Full { capacity, envelope } => {
                format!("queue at capacity {capacity}; target={}", envelope.target)
            }
            BusError::Closed { envelope } => {
                format!("queue closed; target={}", envelope.target)
            }
        }
    }

    /// Borrows the rejected envelope.
    pub fn envelope(&self) -> &Envelope {
        match self {
            BusError::Full { envelope, .. } | BusError::Closed { envelope } => envelope,
        }
    }

    /// Takes the rejected envelope back.
    pub fn into_envelope(self) -> Envelope {
        match self {
            BusError::Full { envelope, .. } | BusError::Closed { envelope } => envelope,
        }
    }
}

/// # Component table failures.
///
/// A failed load never leaves a partial table behind: the registry falls back
/// to an empty one.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LoadError {
    /// The table file could not be read.
    #[error("cannot read component table {path:?}: {source}")]
    Io {
        /// Path that was opened.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A line is not `<address> <name>`, or repeats an address or name.
    #[error("malformed component table line {line}: {reason} ({content:?})")]
    Malformed {
        /// 1-based line number.
        line: usize,
        /// The offending line, trimmed.
        content: String,
        /// What is wrong with it.
        reason: &'static str,
    },
}

impl LoadError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            LoadError::Io { .. } => "load_io",
            LoadError::Malformed { .. } => "load_malformed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            LoadError::Io { path, source } => format!("io: {} ({source})", path.display()),
            LoadError::Malformed { line, reason, .. } => format!("line {line}: {reason}"),
        }
    }
}

/// # Errors produced by the runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Workers were still running when the grace period ran out.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}; forcing termination")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of the workers that did not stop in time.
        stuck: Vec<String>,
    },

    /// The component table could not be read at boot.
    #[error("boot failed: {0}")]
    Load(#[from] LoadError),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use actionbus::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::Load(_) => "runtime_load",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck workers={stuck:?}")
            }
            RuntimeError::Load(e) => e.as_message(),
        }
    }
}

/// # Errors produced by one pass of a worker loop.
///
/// These stay local to the worker (see [`crate::workers::supervise`]): a
/// retryable error re-enters the loop, a fatal one ends the worker, and none
/// reaches the dispatcher.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Non-recoverable error (the loop is not re-entered).
    #[error("fatal error (no retry): {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// The loop failed but may succeed if re-entered.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The worker observed cancellation.
    #[error("context cancelled")]
    Canceled,
}

impl WorkerError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkerError::Fatal { .. } => "worker_fatal",
            WorkerError::Fail { .. } => "worker_failed",
            WorkerError::Canceled => "worker_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            WorkerError::Fatal { error } => format!("fatal: {error}"),
            WorkerError::Fail { error } => format!("error: {error}"),
            WorkerError::Canceled => "context cancelled".to_string(),
        }
    }

    /// Indicates whether the loop may be re-entered after this error.
    ///
    /// # Example
    /// ```
    /// use actionbus::WorkerError;
    ///
    /// assert!(WorkerError::Fail { error: "eof".into() }.is_retryable());
    /// assert!(!WorkerError::Fatal { error: "nope".into() }.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(self, WorkerError::Fail { .. })
    }
}

impl From<std::io::Error> for WorkerError {
    fn from(e: std::io::Error) -> Self {
        WorkerError::Fail {
            error: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;

    #[test]
    fn test_bus_error_hands_envelope_back() {
        let env = Envelope::new(Address::new(3), Address::new(1), "PLAY_SOUND auto hi");
        let err = BusError::Full {
            capacity: 1,
            envelope: env.clone(),
        };
        assert_eq!(err.as_label(), "bus_full");
        assert_eq!(err.envelope(), &env);
        assert_eq!(err.into_envelope(), env);
    }

    #[test]
    fn test_load_error_labels() {
        let err = LoadError::Malformed {
            line: 3,
            content: "abc".into(),
            reason: "address is not an integer",
        };
        assert_eq!(err.as_label(), "load_malformed");
        assert_eq!(err.as_message(), "line 3: address is not an integer");

        let rt: RuntimeError = err.into();
        assert_eq!(rt.as_label(), "runtime_load");
    }

    #[test]
    fn test_worker_error_retryable() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        let e: WorkerError = io.into();
        assert!(e.is_retryable());
        assert!(!WorkerError::Canceled.is_retryable());
        assert_eq!(WorkerError::Canceled.as_label(), "worker_canceled");
    }
}
