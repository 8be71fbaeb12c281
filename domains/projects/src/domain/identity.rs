//! Content-derived asset identity
//!
//! A committed asset's id is the SHA-256 of `cutout|sheet|pageNumber|section`.
//! Identical content always yields the same id, which makes re-submitting an
//! asset a no-op at the backend.

use hyuga_common::joined_digest;

use crate::error::IdentityError;

/// The four fields an identity is derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContentFields<'a> {
    pub sheet_image: Option<&'a str>,
    pub cutout_image: Option<&'a str>,
    pub page_number: Option<&'a str>,
    pub section: Option<&'a str>,
}

/// Derive the content identifier. Every field must be present and non-empty.
pub fn content_id(fields: &ContentFields<'_>) -> Result<String, IdentityError> {
    let cutout = require(fields.cutout_image, "cutoutImage")?;
    let sheet = require(fields.sheet_image, "sheetImage")?;
    let page_number = require(fields.page_number, "pageNumber")?;
    let section = require(fields.section, "section")?;

    Ok(joined_digest(&[cutout, sheet, page_number, section]))
}

fn require<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, IdentityError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(IdentityError::MissingField(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyuga_common::crypto::DIGEST_HEX_LEN;

    fn complete() -> ContentFields<'static> {
        ContentFields {
            sheet_image: Some("AAAA"),
            cutout_image: Some("BBBB"),
            page_number: Some("12"),
            section: Some("X"),
        }
    }

    #[test]
    fn test_content_id_uses_fixed_field_order() {
        assert_eq!(
            content_id(&complete()).unwrap(),
            joined_digest(&["BBBB", "AAAA", "12", "X"])
        );
    }

    #[test]
    fn test_content_id_is_deterministic() {
        let first = content_id(&complete()).unwrap();
        let second = content_id(&complete()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), DIGEST_HEX_LEN);
    }

    #[test]
    fn test_content_id_changes_with_any_field() {
        let base = content_id(&complete()).unwrap();
        let mut changed = complete();
        changed.section = Some("Y");
        assert_ne!(content_id(&changed).unwrap(), base);

        let mut swapped = complete();
        swapped.sheet_image = Some("BBBB");
        swapped.cutout_image = Some("AAAA");
        assert_ne!(content_id(&swapped).unwrap(), base);
    }

    #[test]
    fn test_content_id_requires_every_field() {
        let mut missing = complete();
        missing.cutout_image = None;
        assert_eq!(
            content_id(&missing),
            Err(IdentityError::MissingField("cutoutImage"))
        );

        let mut empty = complete();
        empty.section = Some("");
        assert_eq!(
            content_id(&empty),
            Err(IdentityError::MissingField("section"))
        );

        assert!(content_id(&ContentFields::default()).is_err());
    }
}
