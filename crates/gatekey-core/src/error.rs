//! Error types for the orchestration core.
//!
//! Every remote failure carries the name of the failing operation. Non-zero
//! application codes outside an operation's accepted set become
//! [`Error::Api`] with the remote message and code preserved.

use crate::client::RemoteError;
use gatekey_relay::RelayError;
use thiserror::Error;

/// Orchestration errors
#[derive(Debug, Error)]
pub enum Error {
    /// Network/IO failure calling the remote backend
    #[error("{op}: {source}")]
    Transport {
        /// Failing operation
        op: &'static str,
        /// Underlying client failure
        #[source]
        source: RemoteError,
    },

    /// Non-zero application status from the remote backend
    #[error("{op}: {message} (code {code})")]
    Api {
        /// Failing operation
        op: &'static str,
        /// Remote status code
        code: i32,
        /// Remote message
        message: String,
    },

    /// A search returned zero results
    #[error("{what} not found")]
    NotFound {
        /// What was searched for
        what: &'static str,
    },

    /// Caller-side invariant violated before any remote call
    #[error("precondition: {0}")]
    Precondition(String),

    /// Relay selection or key derivation failure
    #[error(transparent)]
    Relay(#[from] RelayError),

    /// PC re-authentication stayed rate limited through the attempt budget
    #[error("re-authentication still rate limited after {attempts} attempts")]
    ReauthExhausted {
        /// Attempts made before giving up
        attempts: u32,
    },
}

impl Error {
    /// Wrap a client failure with the name of the failing operation.
    pub(crate) fn transport(op: &'static str, source: RemoteError) -> Self {
        Self::Transport { op, source }
    }
}
