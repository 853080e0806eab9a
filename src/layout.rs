//! Placement geometry for stamping images onto pages
//!
//! Callers describe rectangles with a top-left origin (y grows downwards),
//! while PDF user space has a bottom-left origin. This module converts
//! between the two and builds the `cm` matrix that maps an image's unit
//! square into its target rectangle.

/// Rectangle in top-left-origin page units: `(x0, y0)` is the top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        (self.x1 - self.x0).abs()
    }

    pub fn height(&self) -> f32 {
        (self.y1 - self.y0).abs()
    }

    /// Convert to PDF user space for a page with the given MediaBox
    pub fn to_pdf_space(&self, media_box: [f32; 4]) -> PdfRect {
        let [left, _bottom, _right, top] = media_box;
        PdfRect {
            x: left + self.x0.min(self.x1),
            y: top - self.y0.max(self.y1),
            width: self.width(),
            height: self.height(),
        }
    }
}

/// Rectangle in PDF user space: `(x, y)` is the bottom-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PdfRect {
    /// Largest rectangle with the image's aspect ratio centred inside this one
    ///
    /// `rotation` is taken into account: a quarter turn swaps the image's
    /// width and height.
    pub fn fit(&self, image_width: u32, image_height: u32, rotation: i64) -> PdfRect {
        let (w, h) = if rotation.rem_euclid(180) == 90 {
            (image_height as f32, image_width as f32)
        } else {
            (image_width as f32, image_height as f32)
        };

        if w <= 0.0 || h <= 0.0 {
            return *self;
        }

        let scale = (self.width / w).min(self.height / h);
        let width = w * scale;
        let height = h * scale;

        PdfRect {
            x: self.x + (self.width - width) / 2.0,
            y: self.y + (self.height - height) / 2.0,
            width,
            height,
        }
    }
}

/// Represents a PDF transformation matrix [a b c d e f]
/// where: x' = a*x + c*y + e, y' = b*x + d*y + f
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformMatrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl TransformMatrix {
    /// Map the unit square onto `rect`, rotated counter-clockwise by `rotation`
    ///
    /// Only quarter turns are meaningful; other angles are snapped down to the
    /// previous multiple of 90.
    pub fn image_placement(rect: &PdfRect, rotation: i64) -> Self {
        let PdfRect { x, y, width: w, height: h } = *rect;

        match rotation.rem_euclid(360) / 90 {
            1 => Self { a: 0.0, b: h, c: -w, d: 0.0, e: x + w, f: y },
            2 => Self { a: -w, b: 0.0, c: 0.0, d: -h, e: x + w, f: y + h },
            3 => Self { a: 0.0, b: -h, c: w, d: 0.0, e: x, f: y + h },
            _ => Self { a: w, b: 0.0, c: 0.0, d: h, e: x, f: y },
        }
    }

    /// Apply the matrix to a point
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (self.a * x + self.c * y + self.e, self.b * x + self.d * y + self.f)
    }

    /// Operands for the `cm` content stream operator
    pub fn to_cm(&self) -> String {
        format!(
            "{} {} {} {} {} {} cm",
            self.a, self.b, self.c, self.d, self.e, self.f
        )
    }
}
