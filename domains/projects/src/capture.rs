//! Image capture
//!
//! Turns a picked file into a bare base64 payload, and derives field hints
//! from the picked file names.

use std::path::Path;

use regex::Regex;

use hyuga_common::{data_url_mime, encode_payload, strip_data_url_prefix};

use crate::error::CaptureError;

lazy_static::lazy_static! {
    /// `p12`, `pag_12`, `page-12`; the `p` must not follow a letter (so `.jpg` never matches)
    static ref PAGE_HINT: Regex =
        Regex::new(r"(?i)(?:^|[^a-z])p(?:ag|age)?[_\-\s]?(\d{1,4})").unwrap();

    /// `sec_a`, `section-B`, up to four letters
    static ref SECTION_HINT: Regex =
        Regex::new(r"(?i)(?:^|[^a-z])sec(?:tion)?[_\-\s]?([a-z]{1,4})(?:[^a-z]|$)").unwrap();
}

/// Read the picked file and encode it. `None` means the picker was cancelled.
pub async fn capture_file(path: Option<&Path>) -> Result<String, CaptureError> {
    let path = path.ok_or(CaptureError::NoFileSelected)?;
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| CaptureError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "Captured image file");
    capture_bytes(&bytes)
}

/// Encode already-read image bytes
pub fn capture_bytes(bytes: &[u8]) -> Result<String, CaptureError> {
    if bytes.is_empty() {
        return Err(CaptureError::EmptyPayload);
    }
    Ok(encode_payload(bytes))
}

/// Accept a `data:<mime>;base64,` string (or a bare payload) and return the bare payload
pub fn capture_data_url(value: &str) -> Result<String, CaptureError> {
    if let Some(mime) = data_url_mime(value) {
        if !mime.starts_with("image/") {
            return Err(CaptureError::NotAnImage(mime.to_string()));
        }
    }
    let payload = strip_data_url_prefix(value);
    if payload.is_empty() {
        return Err(CaptureError::EmptyPayload);
    }
    Ok(payload.to_string())
}

/// Page number and section guessed from file names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldHints {
    pub page_number: Option<String>,
    pub section: Option<String>,
}

/// Guess page number and section from file names; first match wins per field
pub fn guess_page_and_section<S: AsRef<str>>(names: &[S]) -> FieldHints {
    let mut hints = FieldHints::default();
    for name in names {
        let name = name.as_ref();
        let stem = Path::new(name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(name);

        if hints.page_number.is_none() {
            hints.page_number = PAGE_HINT
                .captures(stem)
                .map(|caps| caps[1].trim_start_matches('0').to_string())
                .filter(|page| !page.is_empty());
        }
        if hints.section.is_none() {
            hints.section = SECTION_HINT
                .captures(stem)
                .map(|caps| caps[1].to_uppercase());
        }
    }
    hints
}
