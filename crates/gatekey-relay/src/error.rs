//! Relay error types.

use thiserror::Error;

/// Errors from relay selection and key derivation
#[derive(Debug, Error)]
pub enum RelayError {
    /// No relay server in the pool passed the eligibility filter
    #[error("no available relay server")]
    NoAvailableServer,

    /// The OS CSPRNG failed to produce random bytes
    #[error("random number generation failed")]
    RandomFailed,

    /// Block cipher initialization failed
    #[error("cipher initialization failed")]
    Cipher,
}
