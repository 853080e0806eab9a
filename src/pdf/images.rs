//! Extract embedded raster images as PNG files

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, Stream};
use tracing::{info, instrument, warn};
use crate::error::{Error, Result};
use crate::naming;
use super::document::{inherited_attribute, open, resolve, resolve_dict};

/// An image XObject found on a page
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedImage {
    /// Page the image is referenced from (1-indexed)
    pub page: u32,
    /// Object number of the image stream
    pub object_number: u32,
    /// Resource name the page uses for the image
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Where the PNG was written, `None` if the encoding is not supported
    pub path: Option<PathBuf>,
}

/// Color spaces that can be turned into 8-bit RGB or gray samples
#[derive(Debug, Clone, PartialEq)]
enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
    /// Palette of `base` colors, `lookup` holds `hival + 1` entries
    Indexed { base: Box<ColorSpace>, lookup: Vec<u8> },
}

impl ColorSpace {
    fn components(&self) -> usize {
        match self {
            ColorSpace::Gray => 1,
            ColorSpace::Rgb => 3,
            ColorSpace::Cmyk => 4,
            ColorSpace::Indexed { .. } => 1,
        }
    }
}

/// Extract every image into the current directory as `{object_number}.png`
pub fn extract_images(path: &Path) -> Result<Vec<ExtractedImage>> {
    extract_images_to(path, Path::new("."))
}

/// Extract every image into `dir` as `{object_number}.png`
///
/// Images are reported once per page that references them but decoded and
/// written only once. Encodings that cannot be decoded are reported with
/// `path: None` and a warning.
#[instrument(skip_all, fields(path = %path.display(), dir = %dir.display()))]
pub fn extract_images_to(path: &Path, dir: &Path) -> Result<Vec<ExtractedImage>> {
    let doc = open(path)?;
    let mut written: HashSet<u32> = HashSet::new();
    let mut extracted = Vec::new();

    for (page_number, page_id) in doc.get_pages() {
        let xobjects = inherited_attribute(&doc, page_id, b"Resources")
            .and_then(|resources| resolve_dict(&doc, resources))
            .and_then(|resources| resources.get(b"XObject").ok())
            .and_then(|xobjects| resolve_dict(&doc, xobjects));

        let Some(xobjects) = xobjects else {
            continue;
        };

        for (name, object) in xobjects.iter() {
            let Ok(id) = object.as_reference() else {
                continue;
            };
            let Ok(stream) = doc.get_object(id).and_then(Object::as_stream) else {
                continue;
            };
            if !is_image(&stream.dict) {
                continue;
            }

            let name = String::from_utf8_lossy(name).into_owned();
            let width = dimension(&doc, &stream.dict, b"Width");
            let height = dimension(&doc, &stream.dict, b"Height");
            info!("Width: {}, Height: {}, Name: {}", width, height, name);

            let output = naming::extracted_image(dir, id.0);
            let path = if written.contains(&id.0) {
                Some(output)
            } else {
                match decode_image(&doc, stream, width, height) {
                    Ok(image) => {
                        image.save_with_format(&output, ImageFormat::Png)?;
                        written.insert(id.0);
                        info!(output = %output.display(), "Wrote image");
                        Some(output)
                    }
                    Err(e) => {
                        warn!(object = id.0, name = %name, error = %e, "Skipping image");
                        None
                    }
                }
            };

            extracted.push(ExtractedImage {
                page: page_number,
                object_number: id.0,
                name,
                width,
                height,
                path,
            });
        }
    }

    Ok(extracted)
}

fn is_image(dict: &Dictionary) -> bool {
    dict.get(b"Subtype")
        .and_then(Object::as_name)
        .map(|subtype| subtype == b"Image")
        .unwrap_or(false)
}

fn dimension(doc: &Document, dict: &Dictionary, key: &[u8]) -> u32 {
    dict.get(key)
        .ok()
        .and_then(|value| resolve(doc, value))
        .and_then(|value| value.as_i64().ok())
        .and_then(|value| u32::try_from(value).ok())
        .unwrap_or(0)
}

/// Filter names applied to a stream, outermost first
fn filters(doc: &Document, dict: &Dictionary) -> Vec<Vec<u8>> {
    let Some(filter) = dict.get(b"Filter").ok().and_then(|f| resolve(doc, f)) else {
        return Vec::new();
    };
    match filter {
        Object::Name(name) => vec![name.clone()],
        Object::Array(names) => names
            .iter()
            .filter_map(|name| name.as_name().ok().map(<[u8]>::to_vec))
            .collect(),
        _ => Vec::new(),
    }
}

fn decode_image(doc: &Document, stream: &Stream, width: u32, height: u32) -> Result<DynamicImage> {
    let applied = filters(doc, &stream.dict);
    let filter_names: Vec<&[u8]> = applied.iter().map(Vec::as_slice).collect();

    let samples = match filter_names.as_slice() {
        [b"DCTDecode"] => {
            return Ok(image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)?);
        }
        [] => stream.content.clone(),
        [b"FlateDecode"] => stream.decompressed_content()?,
        other => {
            let names: Vec<String> = other.iter().map(|n| String::from_utf8_lossy(n).into_owned()).collect();
            return Err(Error::UnsupportedImage(format!("filter {}", names.join(", "))));
        }
    };

    let bits = stream
        .dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|bits| resolve(doc, bits))
        .and_then(|bits| bits.as_i64().ok())
        .unwrap_or(8);
    if bits != 8 {
        return Err(Error::UnsupportedImage(format!("{} bits per component", bits)));
    }

    let space = match stream.dict.get(b"ColorSpace") {
        Ok(cs) => color_space(doc, cs, 0)?,
        Err(_) => return Err(Error::UnsupportedImage("missing color space".to_string())),
    };

    samples_to_image(&samples, width, height, &space)
}

/// Interpret a /ColorSpace entry
fn color_space(doc: &Document, object: &Object, depth: usize) -> Result<ColorSpace> {
    let unsupported = |what: &str| Error::UnsupportedImage(format!("color space {}", what));

    if depth > 4 {
        return Err(unsupported("nested too deeply"));
    }

    let object = resolve(doc, object).ok_or_else(|| unsupported("reference"))?;
    match object {
        Object::Name(name) => match name.as_slice() {
            b"DeviceGray" | b"CalGray" | b"G" => Ok(ColorSpace::Gray),
            b"DeviceRGB" | b"CalRGB" | b"RGB" => Ok(ColorSpace::Rgb),
            b"DeviceCMYK" | b"CMYK" => Ok(ColorSpace::Cmyk),
            other => Err(unsupported(&String::from_utf8_lossy(other))),
        },
        Object::Array(items) => {
            let family = items.first().and_then(|f| f.as_name().ok()).unwrap_or_default();
            match family {
                b"ICCBased" => {
                    let profile = items
                        .get(1)
                        .and_then(|p| resolve_dict(doc, p))
                        .ok_or_else(|| unsupported("ICCBased without profile"))?;
                    let n = profile.get(b"N").ok().and_then(|n| n.as_i64().ok()).unwrap_or(0);
                    match n {
                        1 => Ok(ColorSpace::Gray),
                        3 => Ok(ColorSpace::Rgb),
                        4 => Ok(ColorSpace::Cmyk),
                        _ => Err(unsupported(&format!("ICCBased with {} components", n))),
                    }
                }
                b"Indexed" | b"I" => {
                    let base = items
                        .get(1)
                        .ok_or_else(|| unsupported("Indexed without base"))
                        .and_then(|base| color_space(doc, base, depth + 1))?;
                    let lookup = match items.get(3).and_then(|l| resolve(doc, l)) {
                        Some(Object::String(bytes, _)) => bytes.clone(),
                        Some(Object::Stream(stream)) => stream
                            .decompressed_content()
                            .unwrap_or_else(|_| stream.content.clone()),
                        _ => return Err(unsupported("Indexed without lookup table")),
                    };
                    Ok(ColorSpace::Indexed { base: Box::new(base), lookup })
                }
                b"CalGray" => Ok(ColorSpace::Gray),
                b"CalRGB" => Ok(ColorSpace::Rgb),
                other => Err(unsupported(&String::from_utf8_lossy(other))),
            }
        }
        _ => Err(unsupported("of unexpected type")),
    }
}

fn cmyk_to_rgb(cmyk: &[u8]) -> [u8; 3] {
    let k = 255 - cmyk[3] as u16;
    let channel = |c: u8| ((255 - c as u16) * k / 255) as u8;
    [channel(cmyk[0]), channel(cmyk[1]), channel(cmyk[2])]
}

fn oversized(width: u32, height: u32) -> Error {
    Error::UnsupportedImage(format!("dimensions {}x{} are too large", width, height))
}

/// Build an image from raw 8-bit samples
fn samples_to_image(samples: &[u8], width: u32, height: u32, color_space: &ColorSpace) -> Result<DynamicImage> {
    let (pixels, needed) = match (width as usize).checked_mul(height as usize) {
        Some(pixels) => match pixels.checked_mul(color_space.components()) {
            Some(needed) => (pixels, needed),
            None => return Err(oversized(width, height)),
        },
        None => return Err(oversized(width, height)),
    };
    if pixels == 0 || samples.len() < needed {
        return Err(Error::UnsupportedImage(format!(
            "expected {} bytes of samples, found {}",
            needed,
            samples.len()
        )));
    }
    let samples = &samples[..needed];
    let too_short = || Error::UnsupportedImage("sample buffer too short".to_string());

    let image = match color_space {
        ColorSpace::Gray => {
            DynamicImage::ImageLuma8(GrayImage::from_raw(width, height, samples.to_vec()).ok_or_else(too_short)?)
        }
        ColorSpace::Rgb => {
            DynamicImage::ImageRgb8(RgbImage::from_raw(width, height, samples.to_vec()).ok_or_else(too_short)?)
        }
        ColorSpace::Cmyk => {
            let rgb: Vec<u8> = samples.chunks_exact(4).flat_map(cmyk_to_rgb).collect();
            DynamicImage::ImageRgb8(RgbImage::from_raw(width, height, rgb).ok_or_else(too_short)?)
        }
        ColorSpace::Indexed { base, lookup } => {
            let n = base.components();
            let expanded: Vec<u8> = samples
                .iter()
                .flat_map(|&index| {
                    let start = index as usize * n;
                    match lookup.get(start..start + n) {
                        Some(entry) => entry.to_vec(),
                        None => vec![0; n],
                    }
                })
                .collect();
            return samples_to_image(&expanded, width, height, base);
        }
    };

    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, StringFormat};

    #[test]
    fn test_extract_images_nonexistent_file() {
        let result = extract_images(Path::new("nonexistent.pdf"));
        assert!(matches!(result.unwrap_err(), Error::FileNotFound(_)));
    }

    #[test]
    fn test_cmyk_to_rgb() {
        assert_eq!(cmyk_to_rgb(&[0, 0, 0, 0]), [255, 255, 255]);
        assert_eq!(cmyk_to_rgb(&[0, 0, 0, 255]), [0, 0, 0]);
        assert_eq!(cmyk_to_rgb(&[255, 0, 0, 0]), [0, 255, 255]);
    }

    #[test]
    fn test_indexed_samples_expand_through_palette() {
        let color_space = ColorSpace::Indexed {
            base: Box::new(ColorSpace::Rgb),
            lookup: vec![255, 0, 0, 0, 0, 255],
        };
        let image = samples_to_image(&[0, 1], 2, 1, &color_space).unwrap().to_rgb8();
        assert_eq!(image.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(image.get_pixel(1, 0).0, [0, 0, 255]);
    }

    #[test]
    fn test_short_sample_buffer_is_unsupported() {
        let result = samples_to_image(&[0, 0], 2, 2, &ColorSpace::Gray);
        assert!(matches!(result.unwrap_err(), Error::UnsupportedImage(_)));
    }

    #[test]
    fn test_oversized_dimensions_are_unsupported() {
        let result = samples_to_image(&[0; 16], u32::MAX, u32::MAX, &ColorSpace::Cmyk);
        assert!(matches!(result.unwrap_err(), Error::UnsupportedImage(_)));

        let doc = Document::with_version("1.5");
        let stream = Stream::new(
            dictionary! {
                "Subtype" => "Image",
                "Width" => u32::MAX as i64,
                "Height" => u32::MAX as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            vec![0; 12],
        );
        let result = decode_image(&doc, &stream, u32::MAX, u32::MAX);
        assert!(matches!(result.unwrap_err(), Error::UnsupportedImage(_)));
    }

    #[test]
    fn test_color_space_from_icc_and_indexed_arrays() {
        let mut doc = Document::with_version("1.5");
        let profile = doc.add_object(Stream::new(dictionary! { "N" => 4 }, Vec::new()));

        let icc = Object::Array(vec![Object::Name(b"ICCBased".to_vec()), profile.into()]);
        assert_eq!(color_space(&doc, &icc, 0).unwrap(), ColorSpace::Cmyk);

        let indexed = Object::Array(vec![
            Object::Name(b"Indexed".to_vec()),
            Object::Name(b"DeviceGray".to_vec()),
            1.into(),
            Object::String(vec![0, 255], StringFormat::Hexadecimal),
        ]);
        assert_eq!(
            color_space(&doc, &indexed, 0).unwrap(),
            ColorSpace::Indexed { base: Box::new(ColorSpace::Gray), lookup: vec![0, 255] }
        );
    }

    #[test]
    fn test_unsupported_filter() {
        let doc = Document::with_version("1.5");
        let stream = Stream::new(
            dictionary! {
                "Subtype" => "Image",
                "Filter" => "JBIG2Decode",
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 1,
            },
            vec![0; 4],
        );
        let result = decode_image(&doc, &stream, 2, 2);
        assert!(matches!(result.unwrap_err(), Error::UnsupportedImage(_)));
    }
}
