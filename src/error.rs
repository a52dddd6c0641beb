//! Error taxonomy for the admin console client.
//!
//! Transient server failures are retried before they surface; conflicts are
//! warnings the operator resolves manually; business errors carry the server
//! message verbatim; a failed record transfer aborts the offer workflow.

use thiserror::Error;

/// Errors produced by the admin client and its workflows.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Transport-level failure (connection refused, timeout, TLS).
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server-side failure (5xx) that survived retry.
    #[error("server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// Duplicate-key conflict (HTTP 409). Non-fatal; the operator must
    /// resolve the duplicate manually.
    #[error("duplicate record: {0}")]
    Conflict(String),

    /// Validation or business error reported by the server, verbatim.
    #[error("{0}")]
    Rejected(String),

    /// The record transfer into the selected store failed. Fatal to the
    /// offer confirmation; the draft is discarded.
    #[error("record transfer failed: {0} (the candidate was NOT moved to selected; re-run the confirmation)")]
    TransferFailed(String),

    /// A previous offer letter draft is still pending confirmation.
    #[error("an offer letter is already in progress; confirm or cancel it first")]
    DraftPending,

    /// Confirm was requested with no draft awaiting review.
    #[error("no offer letter is awaiting confirmation")]
    NoDraft,

    /// Response body did not match the documented shape.
    #[error("malformed response: {0}")]
    Decode(String),

    /// Local filesystem failure (preview resources, downloads).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AdminError {
    /// True for the non-fatal duplicate-key case.
    pub fn is_conflict(&self) -> bool {
        matches!(self, AdminError::Conflict(_))
    }

    /// True when the error aborts an offer confirmation.
    pub fn is_fatal_transfer(&self) -> bool {
        matches!(self, AdminError::TransferFailed(_))
    }
}
