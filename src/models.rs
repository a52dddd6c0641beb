//! Wire and workflow data models.
//!
//! Records are created server-side on submission and mutated only through
//! status-transition or edit calls; the client never mutates them beyond
//! refreshing its own listing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Lifecycle status of an application. `Accepted` and `Rejected` are
/// terminal; there is no transition out of either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ApplicationStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "PENDING",
            ApplicationStatus::Accepted => "ACCEPTED",
            ApplicationStatus::Rejected => "REJECTED",
        }
    }
}

/// Which internship track a record belongs to. Sent as the `type` query
/// parameter on every endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InternshipKind {
    Free,
    Paid,
}

impl InternshipKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InternshipKind::Free => "free",
            InternshipKind::Paid => "paid",
        }
    }
}

impl std::fmt::Display for InternshipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four uploaded-document slots a record can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSlot {
    Resume,
    IdProof,
    Project,
    Payment,
}

impl FileSlot {
    /// Path segment used by the file endpoints.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileSlot::Resume => "resume",
            FileSlot::IdProof => "id_proof",
            FileSlot::Project => "project",
            FileSlot::Payment => "payment",
        }
    }

    /// Column on the listing row holding the stored filename.
    pub fn column(&self) -> &'static str {
        match self {
            FileSlot::Resume => "resume",
            FileSlot::IdProof => "id_proof",
            FileSlot::Project => "project_document",
            FileSlot::Payment => "payment_screenshot",
        }
    }

    /// Human label for titles and prompts.
    pub fn label(&self) -> &'static str {
        match self {
            FileSlot::Resume => "Resume",
            FileSlot::IdProof => "ID Proof",
            FileSlot::Project => "Project Document",
            FileSlot::Payment => "Payment Screenshot",
        }
    }
}

impl std::str::FromStr for FileSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "resume" => Ok(FileSlot::Resume),
            "id_proof" | "id-proof" | "id" => Ok(FileSlot::IdProof),
            "project" => Ok(FileSlot::Project),
            "payment" => Ok(FileSlot::Payment),
            other => Err(format!("unknown file slot: {other}")),
        }
    }
}

/// One applicant row from the listing endpoint.
///
/// The server schema varies between tracks, so only the columns the console
/// relies on are typed; everything else rides in `extra` and round-trips
/// through the profile editor untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub usn: Option<String>,
    #[serde(default)]
    pub status: ApplicationStatus,
    #[serde(default)]
    pub resume: Option<String>,
    #[serde(default)]
    pub id_proof: Option<String>,
    #[serde(default)]
    pub project_document: Option<String>,
    #[serde(default)]
    pub payment_screenshot: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApplicationRecord {
    /// Stored filename for a slot, if the server reported one.
    pub fn file_name(&self, slot: FileSlot) -> Option<&str> {
        match slot {
            FileSlot::Resume => self.resume.as_deref(),
            FileSlot::IdProof => self.id_proof.as_deref(),
            FileSlot::Project => self.project_document.as_deref(),
            FileSlot::Payment => self.payment_screenshot.as_deref(),
        }
    }

    /// Reference to one of this record's uploaded documents.
    pub fn file_reference(&self, slot: FileSlot) -> FileReference {
        FileReference {
            record_id: self.id,
            slot,
            file_name: self.file_name(slot).map(str::to_string),
        }
    }

    /// Loose string lookup over the untyped columns.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }
}

/// Pointer to an uploaded document. Binary content is never held here;
/// bytes exist client-side only transiently during preview.
#[derive(Debug, Clone)]
pub struct FileReference {
    pub record_id: i64,
    pub slot: FileSlot,
    pub file_name: Option<String>,
}

impl FileReference {
    /// Whether the server knows a filename for this slot.
    pub fn present(&self) -> bool {
        self.file_name.as_deref().is_some_and(|n| !n.is_empty())
    }
}

/// Candidate fields sent to the offer-letter generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSnapshot {
    pub name: String,
    pub usn: String,
    pub email: String,
    pub college: String,
    /// Internship domain, used as the offered role.
    pub role: String,
    pub mode: String,
    pub duration: String,
}

/// A generated offer letter awaiting operator review.
///
/// Held only in workflow state: created by generate-preview, discarded on
/// confirm or cancel, never persisted by the client. At most one draft is
/// pending confirmation at a time.
#[derive(Debug, Clone)]
pub struct OfferLetterDraft {
    pub id: Uuid,
    pub candidate: CandidateSnapshot,
    pub pdf: Vec<u8>,
    pub reference_number: String,
}

impl OfferLetterDraft {
    pub fn new(candidate: CandidateSnapshot, pdf: Vec<u8>, reference_number: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            candidate,
            pdf,
            reference_number,
        }
    }

    /// Filesystem-safe name for saving the preview PDF.
    pub fn file_stem(&self) -> String {
        self.reference_number.replace(['/', '\\'], "_")
    }
}
