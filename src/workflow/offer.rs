//! Offer-letter confirmation workflow.
//!
//! A linear state machine: Idle → Generating → Previewing → Confirming →
//! Idle. The draft has a single owner (this value); it is cleared before a
//! new one can be created, on cancel, and on every confirmation outcome.
//! Email dispatch is best-effort; the record transfer is the record-of-truth
//! mutation and its failure aborts the confirmation.

use regex::Regex;
use tracing::{debug, info, warn};

use crate::api::client::OfferDispatch;
use crate::api::AdminApi;
use crate::error::AdminError;
use crate::models::{CandidateSnapshot, OfferLetterDraft};

/// Reference numbers follow `SZS/OFFR/<year>/<month>/<serial>`; deviations
/// are logged, not rejected.
const REFERENCE_PATTERN: &str = r"^[A-Z]{2,6}/OFFR/\d{4}/[A-Z]{3}/\d{3}$";

/// Observable workflow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferState {
    /// No draft.
    Idle,
    /// Preview requested; the triggering control should stay disabled.
    Generating,
    /// Draft rendered for review; confirm is only valid here.
    Previewing,
    /// Downstream actions in flight.
    Confirming,
}

/// Terminal result of a confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// Email sent and record transferred.
    Completed {
        reference_number: String,
        message: String,
    },
    /// Record transferred, but the email dispatch failed. The transfer is
    /// authoritative, so this still counts as a confirmation.
    EmailFailed {
        reference_number: String,
        email_error: String,
    },
}

impl ConfirmOutcome {
    pub fn reference_number(&self) -> &str {
        match self {
            ConfirmOutcome::Completed {
                reference_number, ..
            }
            | ConfirmOutcome::EmailFailed {
                reference_number, ..
            } => reference_number,
        }
    }

    /// Operator-facing summary distinguishing full success from
    /// transferred-but-email-failed.
    pub fn summary(&self) -> String {
        match self {
            ConfirmOutcome::Completed {
                reference_number,
                message,
            } => format!("Offer {reference_number} confirmed: {message}"),
            ConfirmOutcome::EmailFailed {
                reference_number,
                email_error,
            } => format!(
                "Offer {reference_number} confirmed: candidate transferred, but the offer email failed: {email_error}. Send it manually."
            ),
        }
    }
}

/// The offer-letter state machine.
pub struct OfferLetterWorkflow {
    api: AdminApi,
    state: OfferState,
    draft: Option<OfferLetterDraft>,
    reference_pattern: Option<Regex>,
}

impl OfferLetterWorkflow {
    pub fn new(api: AdminApi) -> Self {
        Self {
            api,
            state: OfferState::Idle,
            draft: None,
            reference_pattern: Regex::new(REFERENCE_PATTERN).ok(),
        }
    }

    pub fn state(&self) -> OfferState {
        self.state
    }

    /// The draft pending confirmation, if any.
    pub fn draft(&self) -> Option<&OfferLetterDraft> {
        self.draft.as_ref()
    }

    /// Request a preview for a candidate.
    ///
    /// Only valid from Idle: a draft already in flight is a
    /// [`AdminError::DraftPending`] error, which serializes double-clicks
    /// on the triggering control. On failure the state returns to Idle so
    /// the caller's loading indicator can never stick.
    pub async fn generate(
        &mut self,
        candidate: CandidateSnapshot,
    ) -> Result<&OfferLetterDraft, AdminError> {
        if self.state != OfferState::Idle || self.draft.is_some() {
            return Err(AdminError::DraftPending);
        }

        self.state = OfferState::Generating;
        debug!(usn = %candidate.usn, "generating offer letter preview");

        match self.api.generate_offer_preview(&candidate).await {
            Ok((pdf, reference_number)) => {
                if let Some(pattern) = &self.reference_pattern {
                    if !pattern.is_match(&reference_number) {
                        warn!(%reference_number, "unexpected reference number format");
                    }
                }
                info!(%reference_number, bytes = pdf.len(), "offer letter preview ready");
                self.draft = Some(OfferLetterDraft::new(candidate, pdf, reference_number));
                self.state = OfferState::Previewing;
                // draft was just stored
                self.draft
                    .as_ref()
                    .ok_or(AdminError::NoDraft)
            }
            Err(err) => {
                self.state = OfferState::Idle;
                Err(err)
            }
        }
    }

    /// Confirm the previewed draft.
    ///
    /// Dispatches the offer email first (best-effort), then transfers the
    /// record regardless of the email result. Transfer failure aborts the
    /// confirmation fatally and discards the draft. Whatever happens, the
    /// workflow ends Idle with no draft held.
    pub async fn confirm(&mut self) -> Result<ConfirmOutcome, AdminError> {
        if self.state != OfferState::Previewing {
            return Err(AdminError::NoDraft);
        }
        let draft = self.draft.take().ok_or(AdminError::NoDraft)?;
        self.state = OfferState::Confirming;

        let dispatch = OfferDispatch {
            candidate: &draft.candidate,
            reference_number: &draft.reference_number,
        };

        let email_result = self.api.send_offer_email(&dispatch).await;
        if let Err(err) = &email_result {
            warn!(reference = %draft.reference_number, error = %err, "offer email dispatch failed; continuing with transfer");
        }

        let transfer_result = self.api.transfer_to_selected(&dispatch).await;
        let message = match transfer_result {
            Ok(message) => message,
            Err(err) => {
                self.state = OfferState::Idle;
                return Err(AdminError::TransferFailed(err.to_string()));
            }
        };

        // post-transfer bookkeeping; never fatal
        if let Err(err) = self.api.confirm_offer_letter(&draft.reference_number).await {
            warn!(reference = %draft.reference_number, error = %err, "confirm-offer-letter bookkeeping failed");
        }

        self.state = OfferState::Idle;
        info!(reference = %draft.reference_number, "offer confirmation complete");

        Ok(match email_result {
            Ok(_) => ConfirmOutcome::Completed {
                reference_number: draft.reference_number,
                message,
            },
            Err(email_err) => ConfirmOutcome::EmailFailed {
                reference_number: draft.reference_number,
                email_error: email_err.to_string(),
            },
        })
    }

    /// Discard the draft without any downstream action. Safe from any
    /// state; closing the preview without confirming lands here.
    pub fn cancel(&mut self) {
        if self.draft.is_some() {
            debug!("discarding offer letter draft");
        }
        self.draft = None;
        self.state = OfferState::Idle;
    }
}
