//! Typed HTTP boundary to the admin backend.
//!
//! Every response envelope is converted into a `Result` here, at the edge;
//! nothing downstream ever inspects a raw `success` flag.

pub mod client;
pub mod files;
pub mod retry;

pub use client::{AcceptOutcome, AdminApi};
pub use files::{FilePayload, FileDescriptor};
pub use retry::{RetryFetcher, RetryPolicy};

use serde::Deserialize;

use crate::error::AdminError;

/// The `{success, data, error?}` envelope used by listing-style endpoints.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    /// Discriminate the envelope: payload on success, the server's message
    /// verbatim otherwise.
    pub fn into_data(self) -> Result<T, AdminError> {
        if !self.success {
            return Err(AdminError::Rejected(
                self.error
                    .or(self.message)
                    .unwrap_or_else(|| "unspecified server error".to_string()),
            ));
        }
        self.data
            .ok_or_else(|| AdminError::Decode("success response without data".to_string()))
    }
}

/// The `{success, message|error}` envelope used by mutation endpoints.
#[derive(Debug, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl Ack {
    /// Server message on success, server error verbatim otherwise.
    pub fn into_message(self, fallback: &str) -> Result<String, AdminError> {
        if self.success {
            Ok(self.message.unwrap_or_else(|| fallback.to_string()))
        } else {
            Err(AdminError::Rejected(
                self.error
                    .or(self.message)
                    .unwrap_or_else(|| "unspecified server error".to_string()),
            ))
        }
    }
}
