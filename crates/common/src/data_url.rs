//! Base64 payload helpers
//!
//! Image payloads cross the backend boundary as bare base64. The
//! `data:<mime>;base64,` prefix exists only for local rendering.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use regex::Regex;

lazy_static::lazy_static! {
    /// Matches a data-URL header such as `data:image/png;base64,`
    /// or `data:image/jpeg;charset=utf-8;base64,`
    pub static ref DATA_URL_PREFIX: Regex =
        Regex::new(r"^data:(?P<mime>[-\w.+/]+)?(?:;charset=[\w-]+)?;base64,").unwrap();
}

/// Mime type assumed when rendering a payload whose format is unknown
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Remove a leading data-URL header, if any, and surrounding whitespace.
pub fn strip_data_url_prefix(value: &str) -> &str {
    let trimmed = value.trim();
    match DATA_URL_PREFIX.find(trimmed) {
        Some(m) => &trimmed[m.end()..],
        None => trimmed,
    }
}

/// Mime type declared by a data-URL header, if present.
pub fn data_url_mime(value: &str) -> Option<&str> {
    DATA_URL_PREFIX
        .captures(value.trim_start())
        .and_then(|caps| caps.name("mime"))
        .map(|m| m.as_str())
}

/// Build a data URL for local rendering.
pub fn to_data_url(payload: &str, mime: &str) -> String {
    format!("data:{};base64,{}", mime, strip_data_url_prefix(payload))
}

/// Encode raw bytes as a bare base64 payload.
pub fn encode_payload(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode a payload, tolerating a data-URL header.
pub fn decode_payload(value: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(strip_data_url_prefix(value))
}
