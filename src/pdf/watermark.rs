//! Stamp an image underneath every page of a PDF

use std::path::{Path, PathBuf};
use lopdf::{Dictionary, Stream};
use tracing::{debug, info, instrument};
use crate::error::{Error, Result};
use crate::layout::{PdfRect, Rect, TransformMatrix};
use crate::naming;
use super::document::{media_box, open};
use super::xobject::{add_image_xobject, add_xobject_to_page_resources, draw_xobject_content, prepend_content_to_page};

/// Where the watermark is drawn, in top-left-origin page units
pub const WATERMARK_RECT: Rect = Rect { x0: 220.0, y0: 220.0, x1: 400.0, y1: 400.0 };

/// Counter-clockwise rotation applied to the watermark image
pub const WATERMARK_ROTATION: i64 = 90;

/// Resource name prefix for the embedded image
const XOBJECT_PREFIX: &str = "Wm";

/// Options for watermarking a PDF
#[derive(Debug, Clone)]
pub struct WatermarkOptions {
    /// Image to stamp on each page
    pub image_path: PathBuf,
    /// Output PDF file path
    pub output_path: PathBuf,
    /// Target rectangle (top-left origin)
    pub rect: Rect,
    /// Counter-clockwise rotation in degrees, quarter turns only
    pub rotation: i64,
}

impl WatermarkOptions {
    pub fn new(image_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            image_path: image_path.into(),
            output_path: output_path.into(),
            rect: WATERMARK_RECT,
            rotation: WATERMARK_ROTATION,
        }
    }
}

/// Watermark every page of `path` into `{stem}_watermarked.pdf`
pub fn watermark(path: &Path, image_path: &Path) -> Result<PathBuf> {
    let output_path = naming::watermarked(path);
    watermark_to(path, &WatermarkOptions::new(image_path, &output_path))?;
    Ok(output_path)
}

/// Watermark every page of `path` as described by `options`
///
/// The image is embedded once and shared by all pages. It is drawn before
/// the page's own content, so opaque page content covers it. The page's
/// `/Rotate` is not taken into account.
#[instrument(skip_all, fields(path = %path.display(), image = %options.image_path.display()))]
pub fn watermark_to(path: &Path, options: &WatermarkOptions) -> Result<()> {
    for input in [path, options.image_path.as_path()] {
        if !input.exists() {
            return Err(Error::FileNotFound(input.to_path_buf()));
        }
    }

    let mut doc = open(path)?;
    let image = image::open(&options.image_path)?;
    let xobject_id = add_image_xobject(&mut doc, &image, true)?;

    let page_ids: Vec<_> = doc.get_pages().into_values().collect();
    for page_id in &page_ids {
        let target: PdfRect = options.rect.to_pdf_space(media_box(&doc, *page_id));
        let placed = target.fit(image.width(), image.height(), options.rotation);
        let matrix = TransformMatrix::image_placement(&placed, options.rotation);

        let name = add_xobject_to_page_resources(&mut doc, *page_id, XOBJECT_PREFIX, xobject_id)?;
        let content = draw_xobject_content(&name, &matrix);
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content));
        prepend_content_to_page(&mut doc, *page_id, content_id)?;

        debug!(page = ?page_id, matrix = %matrix.to_cm(), "Watermark placed");
    }

    doc.compress();
    doc.save(&options.output_path)?;

    info!(output = %options.output_path.display(), pages = page_ids.len(), "Wrote watermarked PDF");
    Ok(())
}
