//! Normalization of the three file-retrieval response shapes.
//!
//! Depending on the endpoint and storage backend, the server answers a file
//! request with raw bytes, a base64-embedded JSON payload, or a descriptor
//! pointing at a URL. All three collapse into [`FilePayload`] so the viewer
//! has a single input shape.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;

use crate::error::AdminError;

/// A retrieved file, ready for preview planning.
#[derive(Debug, Clone)]
pub enum FilePayload {
    /// Decoded content held transiently for preview.
    Bytes {
        data: Vec<u8>,
        file_name: Option<String>,
    },
    /// Server-hosted content; only the URL travels to the viewer.
    Remote {
        url: String,
        file_name: Option<String>,
    },
}

impl FilePayload {
    pub fn file_name(&self) -> Option<&str> {
        match self {
            FilePayload::Bytes { file_name, .. } | FilePayload::Remote { file_name, .. } => {
                file_name.as_deref()
            }
        }
    }
}

/// JSON descriptor returned by file endpoints that do not stream bytes.
#[derive(Debug, Deserialize)]
pub struct FileDescriptor {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub file_data: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub inplace_url: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl FileDescriptor {
    /// Resolve the descriptor into a payload, decoding embedded base64.
    pub fn into_payload(self) -> Result<FilePayload, AdminError> {
        if !self.success {
            return Err(AdminError::Rejected(
                self.error.unwrap_or_else(|| "file not found".to_string()),
            ));
        }
        if let Some(encoded) = self.file_data {
            let data = BASE64
                .decode(encoded.trim())
                .map_err(|e| AdminError::Decode(format!("embedded file payload: {e}")))?;
            return Ok(FilePayload::Bytes {
                data,
                file_name: self.file_name,
            });
        }
        if let Some(url) = self.inplace_url.or(self.file_url) {
            return Ok(FilePayload::Remote {
                url,
                file_name: self.file_name,
            });
        }
        Err(AdminError::Decode(
            "file descriptor carried neither content nor a URL".to_string(),
        ))
    }
}

/// Parse a filename out of a `Content-Disposition` header value.
/// Handles both `filename="name.pdf"` and RFC 5987 `filename*=UTF-8''name.pdf`.
pub fn content_disposition_filename(header: &str) -> Option<String> {
    // RFC 5987 form takes precedence
    if let Some(start) = header.find("filename*=") {
        let rest = &header[start + 10..];
        if let Some(quote_start) = rest.find("''") {
            let encoded = rest[quote_start + 2..].split([';', ' ']).next()?;
            if let Ok(decoded) = urlencoding::decode(encoded) {
                let name = decoded.trim().to_string();
                if !name.is_empty() {
                    return Some(name);
                }
            }
        }
    }

    if let Some(start) = header.find("filename=") {
        let rest = &header[start + 9..];
        let name = if let Some(quoted) = rest.strip_prefix('"') {
            quoted.split('"').next()
        } else {
            rest.split([';', ' ']).next()
        };
        if let Some(name) = name {
            let name = name.trim();
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
    }

    None
}
