//! Domain entities for the Projects domain
//!
//! An `Asset` is either a local draft (`saved = false`, placeholder id) or a
//! committed asset (`saved = true`, content-derived id). Committed assets never
//! change their four content fields.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hyuga_backend::AssetRecord;
use hyuga_common::{to_data_url, DEFAULT_IMAGE_MIME};

use crate::domain::identity::{content_id, ContentFields};
use crate::domain::state::{StagingEvent, StagingState, StagingStateMachine};
use crate::error::{IdentityError, Result, StagingError};

/// Prefix of client-generated ids; content ids are pure hex and never carry it
pub const PLACEHOLDER_PREFIX: &str = "draft-";

/// Which image of an asset an upload targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSlot {
    Sheet,
    Cutout,
}

impl std::fmt::Display for ImageSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sheet => write!(f, "sheet"),
            Self::Cutout => write!(f, "cutout"),
        }
    }
}

/// Partial update of a draft. `None` leaves a field alone; an empty string clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetPatch {
    pub sheet_image: Option<String>,
    pub cutout_image: Option<String>,
    pub page_number: Option<String>,
    pub section: Option<String>,
}

impl AssetPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_number(mut self, value: impl Into<String>) -> Self {
        self.page_number = Some(value.into());
        self
    }

    pub fn section(mut self, value: impl Into<String>) -> Self {
        self.section = Some(value.into());
        self
    }

    pub fn image(mut self, slot: ImageSlot, payload: impl Into<String>) -> Self {
        match slot {
            ImageSlot::Sheet => self.sheet_image = Some(payload.into()),
            ImageSlot::Cutout => self.cutout_image = Some(payload.into()),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sheet_image.is_none()
            && self.cutout_image.is_none()
            && self.page_number.is_none()
            && self.section.is_none()
    }

    /// Reject values that can never become valid
    pub fn validate(&self) -> Result<()> {
        if let Some(page) = &self.page_number {
            validate_page_digits(page)?;
        }
        Ok(())
    }
}

/// Asset entity, draft or committed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub sheet_image: Option<String>,
    pub cutout_image: Option<String>,
    pub page_number: String,
    pub section: String,
    pub saved: bool,
    pub state: StagingState,
    /// Transient error from the last failed commit or delete
    pub error: Option<String>,
}

impl Asset {
    /// Create an empty draft with a fresh placeholder id
    pub fn new_draft() -> Self {
        Asset {
            id: format!("{}{}", PLACEHOLDER_PREFIX, Uuid::new_v4()),
            sheet_image: None,
            cutout_image: None,
            page_number: String::new(),
            section: String::new(),
            saved: false,
            state: StagingState::Empty,
            error: None,
        }
    }

    /// Map a backend record into a committed asset
    pub fn from_record(record: AssetRecord) -> Self {
        Asset {
            id: record.id,
            sheet_image: non_empty(record.sheet),
            cutout_image: non_empty(record.cutout),
            page_number: record.page_number,
            section: record.section,
            saved: true,
            state: StagingState::Committed,
            error: None,
        }
    }

    /// True while the asset is a local draft
    pub fn is_draft(&self) -> bool {
        !self.saved
    }

    /// True if the id was generated locally rather than derived from content
    pub fn has_placeholder_id(&self) -> bool {
        self.id.starts_with(PLACEHOLDER_PREFIX)
    }

    pub fn image(&self, slot: ImageSlot) -> Option<&str> {
        match slot {
            ImageSlot::Sheet => self.sheet_image.as_deref(),
            ImageSlot::Cutout => self.cutout_image.as_deref(),
        }
    }

    /// Data URL for displaying the image in `slot`
    pub fn preview(&self, slot: ImageSlot) -> Option<String> {
        self.image(slot)
            .map(|payload| to_data_url(payload, DEFAULT_IMAGE_MIME))
    }

    /// The fields the content identity is derived from
    pub fn content_fields(&self) -> ContentFields<'_> {
        ContentFields {
            sheet_image: self.sheet_image.as_deref(),
            cutout_image: self.cutout_image.as_deref(),
            page_number: Some(self.page_number.as_str()),
            section: Some(self.section.as_str()),
        }
    }

    /// Content-derived identifier of this asset's current fields
    pub fn content_id(&self) -> std::result::Result<String, IdentityError> {
        content_id(&self.content_fields())
    }

    /// Build the wire record under the content-derived id
    pub fn to_record(&self) -> std::result::Result<AssetRecord, IdentityError> {
        let id = self.content_id()?;
        Ok(AssetRecord {
            id,
            sheet: self.sheet_image.clone().unwrap_or_default(),
            cutout: self.cutout_image.clone().unwrap_or_default(),
            page_number: self.page_number.clone(),
            section: self.section.clone(),
        })
    }

    /// Check the field values a commit requires
    pub fn validate_for_commit(&self) -> Result<()> {
        validate_page_digits(&self.page_number)?;
        match self.page_number.parse::<u32>() {
            Ok(n) if n > 0 => {}
            _ => {
                return Err(StagingError::Validation(format!(
                    "Page number must be a positive integer, got '{}'",
                    self.page_number
                )))
            }
        }
        if self.section.trim().is_empty() {
            return Err(StagingError::Validation(
                "Section must not be blank".to_string(),
            ));
        }
        Ok(())
    }

    /// Merge a patch into a copy of this draft and re-evaluate readiness.
    ///
    /// `self` is left untouched; the caller swaps the returned asset in.
    pub fn patched(&self, patch: &AssetPatch) -> Result<Asset> {
        if self.saved {
            return Err(StagingError::ImmutableAsset(self.id.clone()));
        }
        patch.validate()?;

        let mut next = self.clone();
        if let Some(sheet) = &patch.sheet_image {
            next.sheet_image = non_empty(sheet.clone());
        }
        if let Some(cutout) = &patch.cutout_image {
            next.cutout_image = non_empty(cutout.clone());
        }
        if let Some(page) = &patch.page_number {
            next.page_number = page.trim().to_string();
        }
        if let Some(section) = &patch.section {
            next.section = section.clone();
        }

        next.state = StagingStateMachine::transition(
            self.state,
            StagingEvent::Edit {
                ready: readiness_of(&next),
            },
        )?;
        Ok(next)
    }
}

/// True iff all four content fields are non-empty
pub fn readiness_of(asset: &Asset) -> bool {
    asset.sheet_image.as_deref().is_some_and(|s| !s.is_empty())
        && asset.cutout_image.as_deref().is_some_and(|s| !s.is_empty())
        && !asset.page_number.is_empty()
        && !asset.section.is_empty()
}

/// Page numbers are digit strings; empty means "not filled yet"
fn validate_page_digits(value: &str) -> Result<()> {
    let trimmed = value.trim();
    if trimmed.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(StagingError::Validation(format!(
            "Page number must be numeric, got '{}'",
            value
        )))
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
