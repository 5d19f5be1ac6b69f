//! Panelwarden error types.

use thiserror::Error;

/// Errors that can occur while verifying a billing-panel license.
///
/// Callers of [`crate::DomainChecker::check`] never see these: every variant
/// collapses into [`crate::CheckResult::Error`]. They exist so the verifier
/// can propagate with `?` and log what actually went wrong.
#[derive(Debug, Error)]
pub enum PanelwardenError {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// HTTP transport error talking to a vendor (connect, timeout, body read).
    #[error("Vendor transport error: {0}")]
    Transport(String),

    /// An expected cookie was not set by the vendor.
    #[error("Vendor response missing cookie: {name}")]
    MissingCookie {
        /// Name of the cookie that was expected.
        name: &'static str,
    },

    /// An expected form field was not present in the vendor's markup.
    #[error("Vendor page missing form field: {name}")]
    MissingFormField {
        /// Name of the `<input>` that was expected.
        name: &'static str,
    },

    /// Failed to serialize a reply.
    #[error("Serialization error: {0}")]
    Serialization(String),
}
