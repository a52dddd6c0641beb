//! Typed client for the admin backend endpoints.
//!
//! Owns a single `reqwest` client plus the retry fetcher, and converts every
//! documented envelope shape into `Result` values at this boundary.

use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use super::files::{content_disposition_filename, FileDescriptor, FilePayload};
use super::retry::RetryFetcher;
use super::{Ack, Envelope};
use crate::config::Settings;
use crate::error::AdminError;
use crate::models::{ApplicationRecord, CandidateSnapshot, FileReference, InternshipKind};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

/// Result of an accept call.
#[derive(Debug, Clone)]
pub struct AcceptOutcome {
    /// Server acknowledgement, verbatim.
    pub message: String,
    /// Set when the paid track reported the candidate could not be copied
    /// into the selected store (usually a duplicate USN). Non-fatal.
    pub duplicate_note: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AcceptResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    selected_inserted: Option<bool>,
    #[serde(default)]
    selected_insert_error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReasonsResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    reasons: Vec<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OfferPreviewResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    pdf_data: Option<String>,
    #[serde(default)]
    reference_number: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Candidate snapshot plus reference number, sent to the email and
/// transfer endpoints during confirmation.
#[derive(Debug, Serialize)]
pub struct OfferDispatch<'a> {
    #[serde(flatten)]
    pub candidate: &'a CandidateSnapshot,
    pub reference_number: &'a str,
}

/// HTTP client for the admin backend.
#[derive(Clone)]
pub struct AdminApi {
    client: Client,
    base: String,
    fetcher: RetryFetcher,
}

impl AdminApi {
    /// Build a client from settings. Validates the base URL up front.
    pub fn new(settings: &Settings) -> Result<Self, AdminError> {
        Url::parse(&settings.base_url)
            .map_err(|e| AdminError::Decode(format!("invalid base URL {:?}: {e}", settings.base_url)))?;

        let client = Client::builder()
            .user_agent(&settings.user_agent)
            .timeout(settings.timeout())
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            base: settings.base_url.trim_end_matches('/').to_string(),
            fetcher: RetryFetcher::new(settings.retry_policy()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    /// List applications for a track.
    pub async fn list_applications(
        &self,
        kind: InternshipKind,
    ) -> Result<Vec<ApplicationRecord>, AdminError> {
        let url = self.url("api/get-internships");
        let response = self
            .fetcher
            .execute(|| self.client.get(&url).query(&[("type", kind.as_str())]).send())
            .await?;
        let response = Self::fail_on_error_status(response).await?;
        let envelope: Envelope<Vec<ApplicationRecord>> = Self::parse(response).await?;
        envelope.into_data()
    }

    /// Accept a pending application. A 409 surfaces as [`AdminError::Conflict`].
    pub async fn accept(
        &self,
        id: i64,
        kind: InternshipKind,
    ) -> Result<AcceptOutcome, AdminError> {
        let url = self.url(&format!("accept/{id}"));
        debug!(id, kind = %kind, "issuing accept");
        let response = self
            .fetcher
            .execute(|| self.client.post(&url).query(&[("type", kind.as_str())]).send())
            .await?;
        let response = Self::fail_on_error_status(response).await?;
        let body: AcceptResponse = Self::parse(response).await?;

        if !body.success {
            return Err(AdminError::Rejected(
                body.error
                    .or(body.message)
                    .unwrap_or_else(|| "unspecified server error".to_string()),
            ));
        }

        let duplicate_note = if body.selected_inserted == Some(false) {
            Some(body.selected_insert_error.unwrap_or_else(|| {
                "Candidate not inserted into Selected (possible duplicate USN)".to_string()
            }))
        } else {
            None
        };

        Ok(AcceptOutcome {
            message: body
                .message
                .unwrap_or_else(|| "Application accepted!".to_string()),
            duplicate_note,
        })
    }

    /// Reject an application with a reason from the server-supplied list.
    /// The reason travels in the form body.
    pub async fn reject(
        &self,
        id: i64,
        kind: InternshipKind,
        reason: &str,
    ) -> Result<String, AdminError> {
        let url = self.url(&format!("reject/{id}"));
        debug!(id, kind = %kind, reason, "issuing reject");
        let response = self
            .fetcher
            .execute(|| {
                self.client
                    .post(&url)
                    .query(&[("type", kind.as_str())])
                    .form(&[("reason", reason)])
                    .send()
            })
            .await?;
        let response = Self::fail_on_error_status(response).await?;
        let ack: Ack = Self::parse(response).await?;
        ack.into_message("Application rejected!")
    }

    /// Full profile field map for one record.
    pub async fn get_profile(
        &self,
        id: i64,
        kind: InternshipKind,
    ) -> Result<Map<String, Value>, AdminError> {
        let url = self.url(&format!("api/get-profile/{id}"));
        let response = self
            .fetcher
            .execute(|| self.client.get(&url).query(&[("type", kind.as_str())]).send())
            .await?;
        let response = Self::fail_on_error_status(response).await?;
        let envelope: Envelope<Map<String, Value>> = Self::parse(response).await?;
        envelope.into_data()
    }

    /// Update changed profile fields.
    pub async fn edit_profile(
        &self,
        id: i64,
        kind: InternshipKind,
        changes: &Map<String, Value>,
    ) -> Result<String, AdminError> {
        let url = self.url(&format!("api/edit-profile/{id}"));
        let response = self
            .fetcher
            .execute(|| {
                self.client
                    .put(&url)
                    .query(&[("type", kind.as_str())])
                    .json(changes)
                    .send()
            })
            .await?;
        let response = Self::fail_on_error_status(response).await?;
        let ack: Ack = Self::parse(response).await?;
        ack.into_message("Profile updated successfully!")
    }

    /// Rejection reasons the operator picks from.
    pub async fn rejection_reasons(&self) -> Result<Vec<String>, AdminError> {
        let url = self.url("api/get-rejection-reasons");
        let response = self.fetcher.execute(|| self.client.get(&url).send()).await?;
        let response = Self::fail_on_error_status(response).await?;
        let body: ReasonsResponse = Self::parse(response).await?;
        if !body.success {
            return Err(AdminError::Rejected(
                body.error
                    .unwrap_or_else(|| "could not load rejection reasons".to_string()),
            ));
        }
        Ok(body.reasons)
    }

    /// Generate an offer-letter preview. Returns the decoded PDF bytes and
    /// the server-assigned reference number.
    pub async fn generate_offer_preview(
        &self,
        candidate: &CandidateSnapshot,
    ) -> Result<(Vec<u8>, String), AdminError> {
        let url = self.url("api/generate-offer-letter-preview");
        debug!(usn = %candidate.usn, "requesting offer letter preview");
        let response = self
            .fetcher
            .execute(|| self.client.post(&url).json(candidate).send())
            .await?;
        let response = Self::fail_on_error_status(response).await?;
        let body: OfferPreviewResponse = Self::parse(response).await?;

        if !body.success {
            return Err(AdminError::Rejected(
                body.error
                    .unwrap_or_else(|| "offer letter generation failed".to_string()),
            ));
        }
        let encoded = body
            .pdf_data
            .ok_or_else(|| AdminError::Decode("preview response without pdf_data".to_string()))?;
        let pdf = BASE64
            .decode(encoded.trim())
            .map_err(|e| AdminError::Decode(format!("pdf_data: {e}")))?;
        let reference = body
            .reference_number
            .ok_or_else(|| AdminError::Decode("preview response without reference_number".to_string()))?;
        Ok((pdf, reference))
    }

    /// Dispatch the offer-letter email. Best-effort from the workflow's
    /// point of view; this call itself reports failures normally.
    pub async fn send_offer_email(
        &self,
        dispatch: &OfferDispatch<'_>,
    ) -> Result<String, AdminError> {
        let url = self.url("api/send-paid-offer-email");
        let response = self
            .fetcher
            .execute(|| self.client.post(&url).json(dispatch).send())
            .await?;
        let response = Self::fail_on_error_status(response).await?;
        let ack: Ack = Self::parse(response).await?;
        ack.into_message("Offer email sent")
    }

    /// Move the candidate record into the selected store. This is the
    /// record-of-truth mutation of the confirmation.
    pub async fn transfer_to_selected(
        &self,
        dispatch: &OfferDispatch<'_>,
    ) -> Result<String, AdminError> {
        let url = self.url("api/transfer-paid-to-selected");
        let response = self
            .fetcher
            .execute(|| self.client.post(&url).json(dispatch).send())
            .await?;
        let response = Self::fail_on_error_status(response).await?;
        let ack: Ack = Self::parse(response).await?;
        ack.into_message("Candidate transferred to selected")
    }

    /// Server-side bookkeeping after a confirmed offer.
    pub async fn confirm_offer_letter(&self, reference: &str) -> Result<String, AdminError> {
        let url = self.url("api/confirm-offer-letter");
        let body = serde_json::json!({ "reference_number": reference });
        let response = self
            .fetcher
            .execute(|| self.client.post(&url).json(&body).send())
            .await?;
        let response = Self::fail_on_error_status(response).await?;
        let ack: Ack = Self::parse(response).await?;
        ack.into_message("Offer letter confirmed")
    }

    /// Retrieve an uploaded document, normalizing the three response shapes
    /// (raw bytes, embedded base64, URL descriptor).
    pub async fn fetch_file(
        &self,
        reference: &FileReference,
        kind: InternshipKind,
    ) -> Result<FilePayload, AdminError> {
        let url = self.url(&format!(
            "api/get-file/{}/{}",
            reference.record_id,
            reference.slot.as_str()
        ));
        let response = self
            .fetcher
            .execute(|| self.client.get(&url).query(&[("type", kind.as_str())]).send())
            .await?;
        let response = Self::fail_on_error_status(response).await?;

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        if is_json {
            let descriptor: FileDescriptor = Self::parse(response).await?;
            return descriptor.into_payload();
        }

        let header_name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(content_disposition_filename);
        let data = response.bytes().await?.to_vec();
        Ok(FilePayload::Bytes {
            data,
            file_name: header_name.or_else(|| reference.file_name.clone()),
        })
    }

    /// Fetch original bytes for a download URL (the viewer's download
    /// control points here, never at the preview rendition).
    pub async fn download_bytes(&self, url: &str) -> Result<Vec<u8>, AdminError> {
        let owned = url.to_string();
        let response = self
            .fetcher
            .execute(|| self.client.get(&owned).send())
            .await?;
        let response = Self::fail_on_error_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Map 409 to a conflict and other 4xx to a business error, carrying
    /// the server message verbatim when one is present.
    async fn fail_on_error_status(response: Response) -> Result<Response, AdminError> {
        let status = response.status();
        if status == StatusCode::CONFLICT {
            return Err(AdminError::Conflict(Self::error_message(response).await));
        }
        if status.is_client_error() {
            return Err(AdminError::Rejected(Self::error_message(response).await));
        }
        Ok(response)
    }

    async fn error_message(response: Response) -> String {
        let status = response.status();
        match response.json::<Ack>().await {
            Ok(ack) => ack
                .error
                .or(ack.message)
                .unwrap_or_else(|| format!("HTTP {status}")),
            Err(_) => format!("HTTP {status}"),
        }
    }

    async fn parse<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, AdminError> {
        response
            .json::<T>()
            .await
            .map_err(|e| AdminError::Decode(e.to_string()))
    }
}
