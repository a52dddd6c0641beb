//! File classification by leading bytes or filename extension.
//!
//! Both classifiers return the same four categories so the viewer can
//! dispatch uniformly whether it received decoded bytes or only a URL.

/// Classification used to pick a preview strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Pdf,
    Office,
    Unknown,
}

impl FileKind {
    /// MIME type to fall back on when content inspection is unavailable.
    pub fn fallback_mime(&self) -> &'static str {
        match self {
            FileKind::Pdf => "application/pdf",
            FileKind::Image => "image/jpeg",
            FileKind::Office => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            FileKind::Unknown => "application/octet-stream",
        }
    }

    /// Extension used when synthesizing a preview file for raw bytes.
    pub fn fallback_extension(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Image => "jpg",
            FileKind::Office => "docx",
            FileKind::Unknown => "bin",
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FileKind::Image => "image",
            FileKind::Pdf => "pdf",
            FileKind::Office => "office",
            FileKind::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Classify decoded content by its magic-number prefix.
///
/// JPEG `FF D8`, PNG `89 50 4E`, PDF `25 50 44`, ZIP-based office documents
/// `50 4B 03 04`. Anything else is `Unknown`.
pub fn sniff_bytes(bytes: &[u8]) -> FileKind {
    if bytes.starts_with(&[0xFF, 0xD8]) {
        return FileKind::Image;
    }
    if bytes.starts_with(&[0x89, 0x50, 0x4E]) {
        return FileKind::Image;
    }
    if bytes.starts_with(&[0x25, 0x50, 0x44]) {
        return FileKind::Pdf;
    }
    if bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
        return FileKind::Office;
    }
    FileKind::Unknown
}

/// Classify by filename extension, for endpoints that provide only a URL.
/// Case-insensitive; query strings are not stripped by callers, so the
/// suffix match runs against the path portion only.
pub fn sniff_filename(name: &str) -> FileKind {
    let path = name.split(['?', '#']).next().unwrap_or(name);
    let lower = path.to_ascii_lowercase();

    if lower.ends_with(".pdf") {
        return FileKind::Pdf;
    }
    const IMAGE_EXTS: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".bmp"];
    if IMAGE_EXTS.iter().any(|ext| lower.ends_with(ext)) {
        return FileKind::Image;
    }
    const OFFICE_EXTS: [&str; 6] = [".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx"];
    if OFFICE_EXTS.iter().any(|ext| lower.ends_with(ext)) {
        return FileKind::Office;
    }
    FileKind::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_jpeg_and_png_as_image() {
        assert_eq!(sniff_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]), FileKind::Image);
        assert_eq!(sniff_bytes(&[0x89, 0x50, 0x4E, 0x47]), FileKind::Image);
    }

    #[test]
    fn sniffs_pdf_and_office() {
        assert_eq!(sniff_bytes(b"%PDF-1.7"), FileKind::Pdf);
        assert_eq!(sniff_bytes(&[0x50, 0x4B, 0x03, 0x04, 0x14]), FileKind::Office);
    }

    #[test]
    fn arbitrary_bytes_are_unknown() {
        assert_eq!(sniff_bytes(b"hello world"), FileKind::Unknown);
        assert_eq!(sniff_bytes(&[]), FileKind::Unknown);
        // ZIP local-header prefix must match all four bytes
        assert_eq!(sniff_bytes(&[0x50, 0x4B, 0x05, 0x06]), FileKind::Unknown);
    }

    #[test]
    fn extension_matching_is_case_insensitive() {
        assert_eq!(sniff_filename("report.PDF"), FileKind::Pdf);
        assert_eq!(sniff_filename("photo.JPG"), FileKind::Image);
        assert_eq!(sniff_filename("slides.PpTx"), FileKind::Office);
        assert_eq!(sniff_filename("notes.txt"), FileKind::Unknown);
    }

    #[test]
    fn query_strings_do_not_confuse_the_match() {
        assert_eq!(
            sniff_filename("https://host/uploads/resume.pdf?download=1"),
            FileKind::Pdf
        );
        assert_eq!(sniff_filename("scan.png#page=2"), FileKind::Image);
    }
}
