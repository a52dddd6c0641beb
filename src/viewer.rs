//! Preview planning and transient preview-resource lifecycle.
//!
//! A [`PreviewSession`] turns a retrieved file into exactly one rendering
//! strategy and owns whatever client-side resource the preview needed (a
//! synthesized temp file addressed by a `file://` URL). The
//! download control is populated immediately but revealed only once the
//! preview content signals it is done loading; third-party office frames
//! have no load signal and fall back to a worst-case timeout.

use std::io::Write as _;
use std::path::Path;
use std::time::Duration;

use tempfile::NamedTempFile;
use tracing::debug;
use url::Url;

use crate::api::FilePayload;
use crate::error::AdminError;
use crate::sniff::{self, FileKind};

/// Worst-case wait before revealing the download control under an office
/// frame, which never reports a load event.
pub const OFFICE_REVEAL_TIMEOUT: Duration = Duration::from_secs(3);

/// The single rendering strategy chosen for a classified file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewContent {
    /// Embedded document frame.
    PdfEmbed { url: String },
    /// Plain image element.
    Image { url: String },
    /// Iframe pointed at a third-party document-preview service.
    OfficeFrame { viewer_url: String },
    /// No preview; the operator uses the download control.
    DownloadOnly,
}

/// Completion signal from the embedded preview content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoneSignal {
    Loaded,
    Errored,
    TimedOut,
}

/// One open preview. Closing releases the preview resource; closing twice
/// is a no-op.
#[derive(Debug)]
pub struct PreviewSession {
    title: String,
    file_name: Option<String>,
    kind: FileKind,
    content: PreviewContent,
    download_url: String,
    download_visible: bool,
    resource: Option<NamedTempFile>,
    closed: bool,
}

impl PreviewSession {
    /// Open a session for a normalized file payload.
    pub fn open(title: &str, payload: FilePayload) -> Result<Self, AdminError> {
        match payload {
            FilePayload::Bytes { data, file_name } => {
                Self::from_bytes(title, file_name.as_deref(), &data)
            }
            FilePayload::Remote { url, file_name } => {
                Ok(Self::from_url(title, file_name.as_deref(), &url))
            }
        }
    }

    /// Preview decoded bytes. The bytes are spilled into a temp file whose
    /// `file://` URL serves as the synthesized display URL; deleting it on
    /// close is the revoke step.
    pub fn from_bytes(
        title: &str,
        file_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<Self, AdminError> {
        let kind = sniff::sniff_bytes(bytes);
        let detected = infer::get(bytes);
        let extension = detected
            .map(|t| t.extension().to_string())
            .or_else(|| {
                file_name
                    .and_then(|n| Path::new(n).extension())
                    .and_then(|e| e.to_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| kind.fallback_extension().to_string());
        let mime = detected
            .map(|t| t.mime_type().to_string())
            .or_else(|| {
                file_name.and_then(|n| mime_guess::from_path(n).first_raw().map(str::to_string))
            })
            .unwrap_or_else(|| kind.fallback_mime().to_string());

        let mut resource = tempfile::Builder::new()
            .prefix("internadmin-preview-")
            .suffix(&format!(".{extension}"))
            .tempfile()?;
        resource.write_all(bytes)?;

        let display_url = Url::from_file_path(resource.path())
            .map_err(|_| AdminError::Decode("preview path is not representable as a URL".to_string()))?
            .to_string();
        debug!(%kind, %mime, bytes = bytes.len(), "synthesized preview resource");

        let content = Self::plan(kind, &display_url);
        let download_visible = matches!(content, PreviewContent::DownloadOnly);
        Ok(Self {
            title: title.to_string(),
            file_name: file_name.map(str::to_string),
            kind,
            content,
            // the download control fetches the original bytes, not a rendition
            download_url: display_url,
            download_visible,
            resource: Some(resource),
            closed: false,
        })
    }

    /// Preview a server-hosted file by URL. Classification falls back from
    /// the filename to the URL itself, matching the endpoints that only
    /// return a location.
    pub fn from_url(title: &str, file_name: Option<&str>, url: &str) -> Self {
        let kind = match file_name {
            Some(name) if !name.is_empty() => sniff::sniff_filename(name),
            _ => sniff::sniff_filename(url),
        };
        let download_url = if url.contains('?') {
            format!("{url}&download=1")
        } else {
            format!("{url}?download=1")
        };
        let content = Self::plan(kind, url);
        let download_visible = matches!(content, PreviewContent::DownloadOnly);
        Self {
            title: title.to_string(),
            file_name: file_name.map(str::to_string),
            kind,
            content,
            download_url,
            download_visible,
            resource: None,
            closed: false,
        }
    }

    fn plan(kind: FileKind, display_url: &str) -> PreviewContent {
        match kind {
            FileKind::Pdf => PreviewContent::PdfEmbed {
                url: display_url.to_string(),
            },
            FileKind::Image => PreviewContent::Image {
                url: display_url.to_string(),
            },
            FileKind::Office => PreviewContent::OfficeFrame {
                viewer_url: office_viewer_url(display_url),
            },
            FileKind::Unknown => PreviewContent::DownloadOnly,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn content(&self) -> &PreviewContent {
        &self.content
    }

    /// URL the download control points at. Always populated; visibility is
    /// gated separately.
    pub fn download_url(&self) -> &str {
        &self.download_url
    }

    /// The download control, once revealed. `None` until the preview's
    /// done-signal arrives or after close.
    pub fn download_control(&self) -> Option<&str> {
        (self.download_visible && !self.closed).then_some(self.download_url.as_str())
    }

    pub fn download_visible(&self) -> bool {
        self.download_visible && !self.closed
    }

    /// For office frames, the worst-case wait before the caller should
    /// deliver a [`DoneSignal::TimedOut`].
    pub fn pending_reveal_timeout(&self) -> Option<Duration> {
        match self.content {
            PreviewContent::OfficeFrame { .. } if !self.download_visible && !self.closed => {
                Some(OFFICE_REVEAL_TIMEOUT)
            }
            _ => None,
        }
    }

    /// Deliver the preview's done-signal. Load and error both reveal the
    /// download control; a failed embed still lets the operator download.
    pub fn signal(&mut self, signal: DoneSignal) {
        if self.closed {
            return;
        }
        debug!(?signal, title = %self.title, "preview done-signal");
        self.download_visible = true;
    }

    /// Filesystem path of the synthesized preview resource, when one exists.
    pub fn display_path(&self) -> Option<&Path> {
        self.resource.as_ref().map(|r| r.path())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Close the preview, releasing the synthesized resource. Idempotent.
    pub fn close(&mut self) -> Result<(), AdminError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.download_visible = false;
        if let Some(resource) = self.resource.take() {
            resource.close()?;
        }
        Ok(())
    }
}

/// Third-party viewer URL for office documents.
pub fn office_viewer_url(url: &str) -> String {
    format!(
        "https://docs.google.com/gview?url={}&embedded=true",
        urlencoding::encode(url)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_bytes_embed_and_release_on_close() {
        let mut session =
            PreviewSession::from_bytes("Resume", Some("resume.pdf"), b"%PDF-1.4 content").unwrap();
        assert!(matches!(session.content(), PreviewContent::PdfEmbed { url } if url.starts_with("file://")));
        assert!(!session.download_visible());

        let path = session.display_path().expect("resource path").to_path_buf();
        assert!(path.exists());

        session.signal(DoneSignal::Loaded);
        assert!(session.download_control().is_some());

        session.close().unwrap();
        assert!(!path.exists());
        assert!(session.download_control().is_none());
    }

    #[test]
    fn closing_twice_is_a_noop() {
        let mut session = PreviewSession::from_bytes("Scan", None, &[0xFF, 0xD8, 0xFF]).unwrap();
        session.close().unwrap();
        session.close().unwrap();
        assert!(session.is_closed());
        assert!(session.display_path().is_none());
    }

    #[test]
    fn unknown_files_are_download_only_and_visible_immediately() {
        let session = PreviewSession::from_bytes("Notes", Some("notes.txt"), b"plain text").unwrap();
        assert_eq!(session.content(), &PreviewContent::DownloadOnly);
        assert!(session.download_visible());
    }

    #[test]
    fn office_urls_route_through_the_viewer_service() {
        let session = PreviewSession::from_url(
            "Project",
            Some("report.docx"),
            "https://host/uploads/report.docx",
        );
        match session.content() {
            PreviewContent::OfficeFrame { viewer_url } => {
                assert!(viewer_url.starts_with("https://docs.google.com/gview?url="));
                assert!(viewer_url.contains("https%3A%2F%2Fhost%2Fuploads%2Freport.docx"));
                assert!(viewer_url.ends_with("&embedded=true"));
            }
            other => panic!("expected office frame, got {other:?}"),
        }
        assert_eq!(session.pending_reveal_timeout(), Some(OFFICE_REVEAL_TIMEOUT));
        assert_eq!(
            session.download_url(),
            "https://host/uploads/report.docx?download=1"
        );
    }

    #[test]
    fn download_parameter_appends_to_existing_query() {
        let session = PreviewSession::from_url(
            "Payment",
            None,
            "https://host/files/shot.png?token=abc",
        );
        assert_eq!(
            session.download_url(),
            "https://host/files/shot.png?token=abc&download=1"
        );
        assert!(matches!(session.content(), PreviewContent::Image { .. }));
    }

    #[test]
    fn error_signal_still_reveals_the_download() {
        let mut session = PreviewSession::from_url("Resume", Some("cv.pdf"), "https://host/cv.pdf");
        assert!(!session.download_visible());
        session.signal(DoneSignal::Errored);
        assert!(session.download_visible());
    }
}
