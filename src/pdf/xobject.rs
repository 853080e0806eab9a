//! Image XObjects and the page plumbing needed to draw them
//!
//! Shared by the watermarking and image-to-PDF paths: both embed a decoded
//! raster as an `/Image` XObject, register it in a page's resources and draw
//! it from a small content stream.

use image::DynamicImage;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;
use crate::error::Result;
use crate::layout::TransformMatrix;
use super::document::{inherited_attribute, resolve_dict};

/// Embed `image` as an 8-bit DeviceRGB Image XObject
///
/// With `keep_alpha`, images that carry an alpha channel get a DeviceGray
/// soft mask; otherwise alpha is discarded.
pub(crate) fn add_image_xobject(doc: &mut Document, image: &DynamicImage, keep_alpha: bool) -> Result<ObjectId> {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
    };

    if keep_alpha && image.color().has_alpha() {
        let alpha: Vec<u8> = image.to_rgba8().pixels().map(|p| p.0[3]).collect();
        let mut mask = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            alpha,
        );
        mask.compress()?;
        let mask_id = doc.add_object(mask);
        dict.set("SMask", mask_id);
    }

    let mut stream = Stream::new(dict, rgb.into_raw());
    stream.compress()?;
    let xobject_id = doc.add_object(stream);

    debug!(width, height, id = ?xobject_id, "Image XObject embedded");
    Ok(xobject_id)
}

/// Content stream drawing XObject `name` through `matrix`, isolated in `q`/`Q`
pub(crate) fn draw_xobject_content(name: &[u8], matrix: &TransformMatrix) -> Vec<u8> {
    format!("q\n{}\n/{} Do\nQ\n", matrix.to_cm(), String::from_utf8_lossy(name)).into_bytes()
}

/// Copy of the page's (possibly inherited) Resources dictionary, dereferenced
fn page_resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    inherited_attribute(doc, page_id, b"Resources")
        .and_then(|resources| resolve_dict(doc, resources))
        .cloned()
        .unwrap_or_default()
}

/// Register `xobject_id` in the page's `/XObject` resources under a fresh name
///
/// The name is `{prefix}{n}` with the smallest `n` not already used on the
/// page. The page receives its own Resources dictionary, so pages that shared
/// one are not affected. Returns the name chosen.
pub(crate) fn add_xobject_to_page_resources(
    doc: &mut Document,
    page_id: ObjectId,
    prefix: &str,
    xobject_id: ObjectId,
) -> Result<Vec<u8>> {
    let mut resources = page_resources(doc, page_id);

    let mut xobjects = match resources.get(b"XObject") {
        Ok(Object::Dictionary(dict)) => dict.clone(),
        Ok(Object::Reference(id)) => doc.get_dictionary(*id).cloned().unwrap_or_default(),
        _ => Dictionary::new(),
    };

    let name = (0u32..)
        .map(|n| format!("{}{}", prefix, n).into_bytes())
        .find(|candidate| !xobjects.has(candidate))
        .unwrap_or_else(|| prefix.as_bytes().to_vec());

    xobjects.set(name.clone(), Object::Reference(xobject_id));
    resources.set("XObject", Object::Dictionary(xobjects));

    let page = doc.get_dictionary_mut(page_id)?;
    page.set("Resources", Object::Dictionary(resources));

    Ok(name)
}

/// Prepend a content stream to a page's Contents
///
/// Prepended content is painted first, underneath the page's own drawing.
pub(crate) fn prepend_content_to_page(doc: &mut Document, page_id: ObjectId, new_content_id: ObjectId) -> Result<()> {
    let existing_content = doc.get_dictionary(page_id)?.get(b"Contents").ok().cloned();

    let mut contents = match existing_content {
        Some(Object::Reference(content_id)) => match doc.get_object(content_id) {
            // Contents may point at an array of streams
            Ok(Object::Array(array)) => array.clone(),
            _ => vec![Object::Reference(content_id)],
        },
        Some(Object::Array(array)) => array,
        _ => Vec::new(),
    };
    contents.insert(0, Object::Reference(new_content_id));

    let page = doc.get_dictionary_mut(page_id)?;
    page.set("Contents", Object::Array(contents));

    Ok(())
}
