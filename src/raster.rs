//! Conversion between PDF pages and raster images
//!
//! Rendering goes through PDFium via `pdfium-render`; building a PDF from an
//! image only needs lopdf.

use std::path::{Path, PathBuf};
use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use lopdf::{dictionary, Document, Object, Stream};
use pdfium_render::prelude::{PdfDocument, PdfRenderConfig, Pdfium};
use tracing::{debug, info, instrument};
use crate::error::{Error, Result};
use crate::layout::{PdfRect, TransformMatrix};
use crate::naming;
use crate::pdf::xobject::{add_image_xobject, draw_xobject_content};

/// Pixels per PDF unit when rendering, i.e. 72 dpi
pub const RENDER_SCALE: f32 = 1.0;

/// A bound PDFium library
///
/// The binding lives as long as the renderer; documents loaded through it are
/// closed when the call that opened them returns.
pub struct Renderer {
    pdfium: Pdfium,
}

impl Renderer {
    /// Bind to PDFium
    ///
    /// Search order:
    /// 1. Executable's directory
    /// 2. Current working directory
    /// 3. System library paths
    pub fn bind() -> Result<Self> {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()));

        if let Some(ref dir) = exe_dir {
            if let Ok(bindings) = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir)) {
                return Ok(Self { pdfium: Pdfium::new(bindings) });
            }
        }

        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| Error::Render(format!("unable to bind PDFium: {}", e)))?;

        debug!("PDFium bound");
        Ok(Self { pdfium: Pdfium::new(bindings) })
    }

    fn load<'a>(&'a self, path: &Path) -> Result<PdfDocument<'a>> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        self.pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| Error::Render(format!("unable to load {}: {}", path.display(), e)))
    }

    /// Render one page (1-indexed) at 72 dpi
    pub fn render_page(&self, path: &Path, page: u32) -> Result<RgbImage> {
        let document = self.load(path)?;
        render_document_page(&document, page)
    }

    /// Render pages `start..=stop` to `{stem}_{page}.jpg`
    ///
    /// Pages are rendered in ascending order; `start > stop` renders nothing.
    #[instrument(skip_all, fields(path = %path.display(), start = start, stop = stop))]
    pub fn pdf_to_images(&self, path: &Path, start: u32, stop: u32) -> Result<Vec<PathBuf>> {
        let document = self.load(path)?;

        let mut outputs = Vec::new();
        for page in start..=stop {
            let image = render_document_page(&document, page)?;
            let output = naming::rendered_page(path, page);
            image.save_with_format(&output, ImageFormat::Jpeg)?;
            info!(output = %output.display(), "Wrote page image");
            outputs.push(output);
        }

        Ok(outputs)
    }
}

fn render_document_page(document: &PdfDocument, page: u32) -> Result<RgbImage> {
    let page_count = document.pages().len() as usize;
    let out_of_range = || Error::PageOutOfRange { page, page_count };

    if page == 0 || page as usize > page_count {
        return Err(out_of_range());
    }
    let index = u16::try_from(page - 1).map_err(|_| out_of_range())?;

    let pdf_page = document
        .pages()
        .get(index)
        .map_err(|e| Error::Render(format!("unable to read page {}: {}", page, e)))?;

    let bitmap = pdf_page
        .render_with_config(&PdfRenderConfig::new().scale_page_by_factor(RENDER_SCALE))
        .map_err(|e| Error::Render(format!("unable to render page {}: {}", page, e)))?;

    let (width, height) = (bitmap.width() as u32, bitmap.height() as u32);
    let rgba = RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes())
        .ok_or_else(|| Error::Render(format!("page {} bitmap has an unexpected size", page)))?;

    debug!(page, width, height, "Page rendered");
    Ok(DynamicImage::ImageRgba8(rgba).to_rgb8())
}

/// Render pages `start..=stop` of a PDF to `{stem}_{page}.jpg` files
///
/// An empty range returns no images without binding PDFium.
pub fn pdf_to_images(path: &Path, start: u32, stop: u32) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    if start > stop {
        return Ok(Vec::new());
    }
    Renderer::bind()?.pdf_to_images(path, start, stop)
}

/// Render one page (1-indexed) of a PDF at 72 dpi
pub fn render_page(path: &Path, page: u32) -> Result<RgbImage> {
    Renderer::bind()?.render_page(path, page)
}

/// Wrap an image in a single-page PDF, written to `{stem}.pdf`
pub fn image_to_pdf(path: &Path) -> Result<PathBuf> {
    let output_path = naming::image_document(path);
    image_to_pdf_to(path, &output_path)?;
    Ok(output_path)
}

/// Wrap an image in a single-page PDF at `output`
///
/// The page is the image's pixel size in PDF units, so the image keeps its
/// size at 72 dpi. Alpha is dropped.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn image_to_pdf_to(path: &Path, output: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    let image = image::open(path)?;
    let (width, height) = (image.width(), image.height());

    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let xobject_id = add_image_xobject(&mut doc, &image, false)?;

    let rect = PdfRect { x: 0.0, y: 0.0, width: width as f32, height: height as f32 };
    let content = draw_xobject_content(b"Im0", &TransformMatrix::image_placement(&rect, 0));
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), (width as i64).into(), (height as i64).into()],
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => xobject_id },
        },
        "Contents" => content_id,
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc.compress();
    doc.save(output)?;

    info!(output = %output.display(), width, height, "Wrote image PDF");
    Ok(())
}
