//! A4 export layout
//!
//! One cutout per page, scaled to fit inside a half-inch margin and centred.
//! Pages follow the order of the project's assets.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use crate::{BackendError, PdfPage, PdfRenderer, Project};

/// A4 width in PDF points
pub const A4_WIDTH: f32 = 595.28;
/// A4 height in PDF points
pub const A4_HEIGHT: f32 = 841.89;
pub const PAGE_MARGIN: f32 = 36.0;

const IMAGE_NAME: &str = "Im0";

/// Where an image lands on the page, in points from the bottom-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Largest centred rectangle with the image's aspect ratio that fits inside the margins.
///
/// A zero-sized image gets the whole printable area.
pub fn fit_within_a4(width_px: u32, height_px: u32) -> Placement {
    let max_width = A4_WIDTH - 2.0 * PAGE_MARGIN;
    let max_height = A4_HEIGHT - 2.0 * PAGE_MARGIN;

    if width_px == 0 || height_px == 0 {
        return Placement {
            x: PAGE_MARGIN,
            y: PAGE_MARGIN,
            width: max_width,
            height: max_height,
        };
    }

    let (width, height) = (width_px as f32, height_px as f32);
    let scale = (max_width / width).min(max_height / height);
    let (width, height) = (width * scale, height * scale);
    Placement {
        x: (A4_WIDTH - width) / 2.0,
        y: (A4_HEIGHT - height) / 2.0,
        width,
        height,
    }
}

/// Default renderer for the local backend
#[derive(Debug, Default, Clone, Copy)]
pub struct A4PdfRenderer;

impl A4PdfRenderer {
    fn add_page(
        doc: &mut Document,
        pages_id: lopdf::ObjectId,
        page: &PdfPage,
    ) -> Result<lopdf::ObjectId, BackendError> {
        let decoded = image::load_from_memory(&page.image).map_err(|e| {
            BackendError::Render(format!(
                "cutout of asset {} is not a readable image: {}",
                page.asset_id, e
            ))
        })?;
        let rgb = decoded.to_rgb8();
        let (width, height) = rgb.dimensions();
        let placement = fit_within_a4(width, height);

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(width),
                "Height" => i64::from(height),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8_i64,
            },
            rgb.into_raw(),
        ));

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        placement.width.into(),
                        0.0_f32.into(),
                        0.0_f32.into(),
                        placement.height.into(),
                        placement.x.into(),
                        placement.y.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content
            .encode()
            .map_err(|e| BackendError::Render(format!("failed to encode page content: {}", e)))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

        let media_box: Vec<Object> = vec![
            0.0_f32.into(),
            0.0_f32.into(),
            A4_WIDTH.into(),
            A4_HEIGHT.into(),
        ];
        Ok(doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => media_box,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { IMAGE_NAME => image_id },
            },
        }))
    }
}

impl PdfRenderer for A4PdfRenderer {
    fn render(&self, project: &Project, pages: &[PdfPage]) -> Result<Vec<u8>, BackendError> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
        for page in pages {
            kids.push(Self::add_page(&mut doc, pages_id, page)?.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(project.name.as_str()),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);
        doc.compress();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|e| BackendError::Render(format!("failed to write PDF: {}", e)))?;

        tracing::debug!(
            project_id = %project.id,
            pages = pages.len(),
            bytes = bytes.len(),
            "Rendered A4 PDF"
        );
        Ok(bytes)
    }
}
