// ABOUTME: Pdf strategy: pulls embedded image XObjects out of every page with lopdf.
// ABOUTME: Names artifacts page{p}_{i}.{ext}; one bad image reference never aborts the page loop.

use std::collections::HashSet;
use std::io::Cursor;

use bytes::Bytes;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, warn};

use crate::error::ExtractError;
use crate::request::SourceKind;
use crate::result::{Artifact, ExtractionResult, ItemFailure};

/// Page-tree depth limit when looking up inherited resources.
const MAX_PARENT_DEPTH: usize = 32;

/// Run the Pdf strategy.
///
/// Bytes that do not open as a PDF are a
/// [`crate::ErrorCode::MalformedContainer`] error, so an unreadable document
/// is never mistaken for one without images.
pub fn extract(bytes: &[u8], label: &str) -> Result<ExtractionResult, ExtractError> {
    let doc = Document::load_mem(bytes).map_err(|e| {
        ExtractError::malformed(label, "Pdf", Some(anyhow::anyhow!("cannot open PDF: {}", e)))
    })?;

    let mut artifacts = Vec::new();
    let mut failures = Vec::new();

    for (page_number, page_id) in doc.get_pages() {
        let image_ids = page_image_refs(&doc, page_id);
        debug!(label, page = page_number, images = image_ids.len(), "found images on page");

        for (index, image_id) in image_ids.into_iter().enumerate() {
            match extract_image(&doc, image_id) {
                Ok((data, ext)) => artifacts.push(Artifact {
                    filename: format!("page{}_{}.{}", page_number, index, ext),
                    bytes: Bytes::from(data),
                    origin_index: index,
                    page: Some(page_number),
                }),
                Err(reason) => {
                    warn!(label, page = page_number, index, %reason, "skipping PDF image");
                    failures.push(ItemFailure::new(
                        format!("page {} image {} (object {} {})", page_number, index, image_id.0, image_id.1),
                        reason,
                    ));
                }
            }
        }
    }

    Ok(ExtractionResult::from_batch(SourceKind::Pdf, artifacts, failures))
}

/// Image XObject references used by a page, in resource-dictionary order.
///
/// Images drawn through Form XObjects are included after the form's position.
/// References that cannot be loaded are kept so they surface as failures.
fn page_image_refs(doc: &Document, page_id: ObjectId) -> Vec<ObjectId> {
    let mut refs = Vec::new();
    if let Some(resources) = page_resources(doc, page_id) {
        let mut visited_forms = HashSet::new();
        collect_image_refs(doc, resources, &mut refs, &mut visited_forms);
    }
    refs
}

/// Resources of a page, inherited from the nearest ancestor when absent.
fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = doc.get_dictionary(page_id).ok();
    for _ in 0..MAX_PARENT_DEPTH {
        let dict = node?;
        if let Ok(resources) = dict.get(b"Resources") {
            return as_dictionary(doc, resources);
        }
        node = dict
            .get(b"Parent")
            .and_then(Object::as_reference)
            .and_then(|parent| doc.get_dictionary(parent))
            .ok();
    }
    None
}

fn collect_image_refs(
    doc: &Document,
    resources: &Dictionary,
    refs: &mut Vec<ObjectId>,
    visited_forms: &mut HashSet<ObjectId>,
) {
    let xobjects = match resources.get(b"XObject").ok().and_then(|o| as_dictionary(doc, o)) {
        Some(x) => x,
        None => return,
    };

    for (_, value) in xobjects.iter() {
        let id = match value.as_reference() {
            Ok(id) => id,
            Err(_) => continue,
        };
        let stream = match doc.get_object(id).and_then(Object::as_stream) {
            Ok(stream) => stream,
            Err(_) => {
                refs.push(id);
                continue;
            }
        };
        match stream.dict.get(b"Subtype").and_then(Object::as_name) {
            Ok(b"Image") => refs.push(id),
            Ok(b"Form") if visited_forms.insert(id) => {
                if let Some(form_resources) = stream
                    .dict
                    .get(b"Resources")
                    .ok()
                    .and_then(|o| as_dictionary(doc, o))
                {
                    collect_image_refs(doc, form_resources, refs, visited_forms);
                }
            }
            _ => {}
        }
    }
}

fn as_dictionary<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match obj {
        Object::Dictionary(dict) => Some(dict),
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        _ => None,
    }
}

/// Image bytes and native extension for one image XObject.
fn extract_image(doc: &Document, id: ObjectId) -> Result<(Vec<u8>, &'static str), String> {
    let stream = doc
        .get_object(id)
        .and_then(Object::as_stream)
        .map_err(|e| format!("cannot load image stream: {}", e))?;

    let filters = stream_filters(&stream.dict);
    match filters.as_slice() {
        [f] if f == "DCTDecode" => Ok((stream.content.clone(), "jpeg")),
        [f] if f == "JPXDecode" => Ok((stream.content.clone(), "jpx")),
        [f] if f == "JBIG2Decode" => Ok((stream.content.clone(), "jb2")),
        [] => encode_png(doc, stream, stream.content.clone()),
        [f] if f == "FlateDecode" => {
            let raw = stream
                .decompressed_content()
                .map_err(|e| format!("corrupt image stream: {}", e))?;
            encode_png(doc, stream, raw)
        }
        other => Err(format!("unsupported image filter {:?}", other)),
    }
}

fn stream_filters(dict: &Dictionary) -> Vec<String> {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![String::from_utf8_lossy(name).into_owned()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_name().ok())
            .map(|name| String::from_utf8_lossy(name).into_owned())
            .collect(),
        _ => Vec::new(),
    }
}

/// Number of colour components for a PDF colour space.
fn color_components(doc: &Document, color_space: &Object) -> Result<usize, String> {
    let resolved = match color_space {
        Object::Reference(id) => doc
            .get_object(*id)
            .map_err(|e| format!("cannot resolve colour space: {}", e))?,
        other => other,
    };

    match resolved {
        Object::Name(name) => match name.as_slice() {
            b"DeviceGray" | b"CalGray" | b"G" => Ok(1),
            b"DeviceRGB" | b"CalRGB" | b"RGB" => Ok(3),
            b"DeviceCMYK" | b"CMYK" => Ok(4),
            other => Err(format!(
                "unsupported colour space {}",
                String::from_utf8_lossy(other)
            )),
        },
        Object::Array(items) => match items.first().and_then(|o| o.as_name().ok()) {
            Some(b"ICCBased") => {
                let n = items
                    .get(1)
                    .and_then(|o| o.as_reference().ok())
                    .and_then(|id| doc.get_object(id).ok())
                    .and_then(|o| o.as_stream().ok())
                    .and_then(|s| s.dict.get(b"N").ok())
                    .and_then(|n| n.as_i64().ok())
                    .unwrap_or(3);
                match usize::try_from(n) {
                    Ok(n @ 1..=4) => Ok(n),
                    _ => Err(format!("unsupported ICC component count {}", n)),
                }
            }
            Some(b"CalGray") => Ok(1),
            Some(b"CalRGB") | Some(b"Lab") => Ok(3),
            Some(other) => Err(format!(
                "unsupported colour space {}",
                String::from_utf8_lossy(other)
            )),
            None => Err("empty colour space array".to_string()),
        },
        _ => Err("missing colour space".to_string()),
    }
}

/// Re-encode decoded 8-bit samples as PNG.
fn encode_png(doc: &Document, stream: &Stream, samples: Vec<u8>) -> Result<(Vec<u8>, &'static str), String> {
    let dict = &stream.dict;
    let dimension = |key: &[u8]| -> Result<u32, String> {
        dict.get(key)
            .and_then(Object::as_i64)
            .ok()
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v > 0)
            .ok_or_else(|| format!("missing or invalid {}", String::from_utf8_lossy(key)))
    };
    let width = dimension(b"Width")?;
    let height = dimension(b"Height")?;

    let bits = dict
        .get(b"BitsPerComponent")
        .and_then(Object::as_i64)
        .unwrap_or(8);
    if bits != 8 {
        return Err(format!("unsupported bits per component {}", bits));
    }

    let components = match dict.get(b"ColorSpace") {
        Ok(cs) => color_components(doc, cs)?,
        Err(_) => return Err("missing colour space".to_string()),
    };

    let needed = (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(components))
        .ok_or_else(|| "image dimensions overflow".to_string())?;
    if samples.len() < needed {
        return Err(format!(
            "image data too short: {} bytes for {}x{}x{}",
            samples.len(),
            width,
            height,
            components
        ));
    }
    let mut samples = samples;
    samples.truncate(needed);

    let image = match components {
        1 => image::GrayImage::from_raw(width, height, samples).map(image::DynamicImage::ImageLuma8),
        3 => image::RgbImage::from_raw(width, height, samples).map(image::DynamicImage::ImageRgb8),
        4 => image::RgbImage::from_raw(width, height, cmyk_to_rgb(&samples))
            .map(image::DynamicImage::ImageRgb8),
        n => return Err(format!("unsupported component count {}", n)),
    }
    .ok_or_else(|| "image buffer does not match dimensions".to_string())?;

    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| format!("PNG encoding failed: {}", e))?;
    Ok((png, "png"))
}

fn cmyk_to_rgb(cmyk: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(cmyk.len() / 4 * 3);
    for px in cmyk.chunks_exact(4) {
        let k = 255 - u16::from(px[3]);
        for &c in &px[..3] {
            rgb.push(((255 - u16::from(c)) * k / 255) as u8);
        }
    }
    rgb
}
