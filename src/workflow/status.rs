//! Accept/reject transitions and the listing they act on.
//!
//! `PENDING → ACCEPTED` and `PENDING → REJECTED` are the only transitions,
//! both terminal. The controller owns the visible listing (records plus the
//! current track) explicitly; there is no module-level state.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::api::{AdminApi, FilePayload};
use crate::error::AdminError;
use crate::models::{ApplicationRecord, ApplicationStatus, FileSlot, InternshipKind};
use crate::prompt::Prompt;
use crate::viewer::PreviewSession;

/// Columns the profile editor must not touch: identity, file payloads,
/// server-managed bookkeeping.
const NON_EDITABLE_COLUMNS: [&str; 15] = [
    "id",
    "id_proof",
    "resume",
    "project_document",
    "payment_screenshot",
    "id_proof_content",
    "resume_content",
    "project_document_content",
    "created_at",
    "updated_at",
    "reason",
    "applicationid",
    "application_id",
    "status",
    "domain",
];

/// How a user-driven action ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The state change landed; carries the server message.
    Done(String),
    /// Non-fatal conflict; the record is unchanged and the operator must
    /// resolve the duplicate manually.
    Warned(String),
    /// The operator backed out; nothing was sent.
    Cancelled,
}

/// Drives status transitions for one internship track.
pub struct StatusController<P: Prompt> {
    api: AdminApi,
    prompt: P,
    kind: InternshipKind,
    records: Vec<ApplicationRecord>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl<P: Prompt> StatusController<P> {
    pub fn new(api: AdminApi, prompt: P, kind: InternshipKind) -> Self {
        Self {
            api,
            prompt,
            kind,
            records: Vec::new(),
            refreshed_at: None,
        }
    }

    pub fn kind(&self) -> InternshipKind {
        self.kind
    }

    pub fn records(&self) -> &[ApplicationRecord] {
        &self.records
    }

    pub fn record(&self, id: i64) -> Option<&ApplicationRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// When the listing was last fetched.
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    /// Reload the listing from the server.
    pub async fn refresh(&mut self) -> Result<&[ApplicationRecord], AdminError> {
        self.records = self.api.list_applications(self.kind).await?;
        self.refreshed_at = Some(Utc::now());
        Ok(&self.records)
    }

    /// Accept a pending application.
    ///
    /// A 409 duplicate-key response is surfaced as a warning, not a
    /// failure: the record stays `PENDING` and the listing is untouched.
    /// Any other error is propagated with the listing unchanged so the
    /// operator can retry.
    pub async fn accept(&mut self, id: i64) -> Result<ActionOutcome, AdminError> {
        let confirmed = self
            .prompt
            .confirm("Are you sure you want to mark this application as ACCEPTED?")
            .await?;
        if !confirmed {
            return Ok(ActionOutcome::Cancelled);
        }

        match self.api.accept(id, self.kind).await {
            Ok(outcome) => {
                info!(id, "application accepted");
                self.prompt.info(&outcome.message);
                if let Some(note) = &outcome.duplicate_note {
                    self.prompt.warn(note);
                }
                self.mark_local(id, ApplicationStatus::Accepted);
                self.refresh_after_transition(id).await;
                Ok(ActionOutcome::Done(outcome.message))
            }
            Err(AdminError::Conflict(message)) => {
                warn!(id, %message, "accept hit a duplicate-key conflict");
                self.prompt.warn(&message);
                Ok(ActionOutcome::Warned(message))
            }
            Err(err) => Err(err),
        }
    }

    /// Reject a pending application. The operator picks a reason from the
    /// server-supplied list; rejection deletes the applicant's stored data,
    /// so the confirmation says so.
    pub async fn reject(&mut self, id: i64) -> Result<ActionOutcome, AdminError> {
        let reasons = self.api.rejection_reasons().await?;
        let Some(choice) = self
            .prompt
            .choose("Select a rejection reason", &reasons)
            .await?
        else {
            return Ok(ActionOutcome::Cancelled);
        };
        let reason = reasons[choice].clone();

        let confirmed = self
            .prompt
            .confirm("Are you sure? This will delete all applicant data and send a rejection email.")
            .await?;
        if !confirmed {
            return Ok(ActionOutcome::Cancelled);
        }

        let message = self.api.reject(id, self.kind, &reason).await?;
        info!(id, %reason, "application rejected");
        self.prompt.info(&message);
        self.mark_local(id, ApplicationStatus::Rejected);
        self.refresh_after_transition(id).await;
        Ok(ActionOutcome::Done(message))
    }

    /// Apply profile edits after filtering out non-editable columns.
    pub async fn edit(
        &mut self,
        id: i64,
        changes: Map<String, Value>,
    ) -> Result<ActionOutcome, AdminError> {
        let mut allowed = Map::new();
        for (key, value) in changes {
            if NON_EDITABLE_COLUMNS.contains(&key.to_ascii_lowercase().as_str()) {
                self.prompt
                    .warn(&format!("'{key}' is not editable; ignoring"));
                continue;
            }
            allowed.insert(key, value);
        }
        if allowed.is_empty() {
            return Ok(ActionOutcome::Cancelled);
        }

        // fetch first so a bad id fails before the PUT
        let profile = self.api.get_profile(id, self.kind).await?;
        for key in allowed.keys() {
            if !profile.contains_key(key) {
                return Err(AdminError::Rejected(format!(
                    "profile has no field named '{key}'"
                )));
            }
        }

        let message = self.api.edit_profile(id, self.kind, &allowed).await?;
        self.prompt.info(&message);
        self.refresh_after_transition(id).await;
        Ok(ActionOutcome::Done(message))
    }

    /// Open a preview for one of a record's uploaded documents.
    pub async fn view(&self, id: i64, slot: FileSlot) -> Result<PreviewSession, AdminError> {
        let reference = match self.record(id) {
            Some(record) => record.file_reference(slot),
            None => crate::models::FileReference {
                record_id: id,
                slot,
                file_name: None,
            },
        };

        let payload: FilePayload = self.api.fetch_file(&reference, self.kind).await?;
        PreviewSession::open(slot.label(), payload)
    }

    /// Optimistic local update; the authoritative listing refresh follows.
    fn mark_local(&mut self, id: i64, status: ApplicationStatus) {
        if let Some(record) = self.records.iter_mut().find(|r| r.id == id) {
            record.status = status;
        }
    }

    /// Refresh after a successful transition. A refresh failure does not
    /// undo the transition; it is reported and the optimistic state stands.
    async fn refresh_after_transition(&mut self, id: i64) {
        let refresh_err = self.refresh().await.err();
        if let Some(err) = refresh_err {
            warn!(id, error = %err, "listing refresh failed after transition");
            self.prompt
                .warn(&format!("could not refresh the listing: {err}"));
        }
    }
}
