//! Turns files and uploads into raw pages
//!
//! Images become a single page. PDFs contribute one page per embedded image
//! XObject, walked page by page; flyer PDFs are scans, so there is no text
//! layer worth reading. Only a document that cannot be opened at all is an
//! error here; a single undecodable image becomes a failed page.

use std::fs;
use std::path::Path;

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Document, Object, Stream};

use crate::error::FlyerError;
use crate::orchestrator::RawPage;

/// Formats accepted by the loader
pub const SUPPORTED_FORMATS: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/bmp",
    "image/tiff",
    "image/webp",
    "image/gif",
    "application/pdf",
];

/// Load all pages of the file at `path`.
pub fn load_path(path: &Path) -> Result<Vec<RawPage>, FlyerError> {
    let bytes = fs::read(path)?;
    let pages = load_bytes(&bytes)?;
    tracing::debug!("Loaded {} page(s) from {}", pages.len(), path.display());
    Ok(pages)
}

/// Load all pages from an in-memory file.
pub fn load_bytes(bytes: &[u8]) -> Result<Vec<RawPage>, FlyerError> {
    if is_pdf(bytes) {
        return load_pdf(bytes);
    }
    Ok(vec![image::load_from_memory(bytes).map_err(FlyerError::from)])
}

/// Several files treated as one document, pages in argument order.
pub fn load_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<RawPage>, FlyerError> {
    let mut pages = Vec::new();
    for path in paths {
        pages.extend(load_path(path.as_ref())?);
    }
    Ok(pages)
}

fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF-")
}

fn load_pdf(bytes: &[u8]) -> Result<Vec<RawPage>, FlyerError> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| FlyerError::Pdf(format!("Failed to load PDF: {}", e)))?;

    let mut streams: Vec<&Stream> = Vec::new();
    for (_, page_id) in doc.get_pages() {
        streams.extend(page_images(&doc, page_id));
    }

    // resources inherited from the page tree are not followed; scan everything instead
    if streams.is_empty() {
        streams = doc
            .objects
            .values()
            .filter_map(|o| o.as_stream().ok())
            .filter(|s| is_image(s))
            .collect();
    }

    if streams.is_empty() {
        tracing::warn!("PDF contains no embedded images");
    }

    Ok(streams
        .into_iter()
        .map(|stream| decode_image_stream(&doc, stream))
        .collect())
}

fn page_images(doc: &Document, page_id: lopdf::ObjectId) -> Vec<&Stream> {
    let xobjects = doc
        .get_dictionary(page_id)
        .ok()
        .and_then(|page| page.get(b"Resources").ok())
        .and_then(|r| resolve(doc, r).as_dict().ok())
        .and_then(|res| res.get(b"XObject").ok())
        .and_then(|x| resolve(doc, x).as_dict().ok());

    let Some(xobjects) = xobjects else {
        return Vec::new();
    };

    xobjects
        .iter()
        .filter_map(|(_, obj)| resolve(doc, obj).as_stream().ok())
        .filter(|s| is_image(s))
        .collect()
}

fn resolve<'d>(doc: &'d Document, obj: &'d Object) -> &'d Object {
    obj.as_reference()
        .ok()
        .and_then(|id| doc.get_object(id).ok())
        .unwrap_or(obj)
}

fn is_image(stream: &Stream) -> bool {
    stream
        .dict
        .get(b"Subtype")
        .and_then(|s| s.as_name())
        .map(|name| name == b"Image")
        .unwrap_or(false)
}

fn filters(stream: &Stream) -> Vec<Vec<u8>> {
    match stream.dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|o| o.as_name().ok().map(|n| n.to_vec()))
            .collect(),
        _ => Vec::new(),
    }
}

/// Decode one image XObject into a page.
fn decode_image_stream(doc: &Document, stream: &Stream) -> RawPage {
    let filters = filters(stream);

    if filters.iter().any(|f| f == b"DCTDecode") {
        return image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)
            .map_err(FlyerError::from);
    }
    if filters.iter().any(|f| f == b"JPXDecode" || f == b"JBIG2Decode" || f == b"CCITTFaxDecode") {
        return Err(FlyerError::Pdf(format!(
            "Unsupported image filter {}",
            String::from_utf8_lossy(&filters[0])
        )));
    }

    let width = dimension(stream, b"Width")?;
    let height = dimension(stream, b"Height")?;
    let bits = stream
        .dict
        .get(b"BitsPerComponent")
        .and_then(|b| b.as_i64())
        .unwrap_or(8);
    if bits != 8 {
        return Err(FlyerError::Pdf(format!("Unsupported bit depth: {}", bits)));
    }

    let data = if filters.is_empty() {
        stream.content.clone()
    } else {
        stream
            .decompressed_content()
            .map_err(|e| FlyerError::Pdf(format!("Failed to decompress image: {}", e)))?
    };

    let pixels = (width as usize) * (height as usize);
    match color_space(doc, stream).as_str() {
        "DeviceGray" | "CalGray" => {
            let raw = data.get(..pixels).map(<[u8]>::to_vec);
            raw.and_then(|raw| GrayImage::from_raw(width, height, raw))
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(|| FlyerError::Pdf("Truncated grayscale image data".to_string()))
        }
        "DeviceRGB" | "CalRGB" | "ICCBased" => {
            let raw = data.get(..pixels * 3).map(<[u8]>::to_vec);
            raw.and_then(|raw| RgbImage::from_raw(width, height, raw))
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| FlyerError::Pdf("Truncated RGB image data".to_string()))
        }
        "DeviceCMYK" => {
            let raw = data
                .get(..pixels * 4)
                .ok_or_else(|| FlyerError::Pdf("Truncated CMYK image data".to_string()))?;
            let rgb: Vec<u8> = raw.chunks_exact(4).flat_map(cmyk_to_rgb).collect();
            RgbImage::from_raw(width, height, rgb)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| FlyerError::Pdf("Invalid CMYK image data".to_string()))
        }
        other => Err(FlyerError::Pdf(format!("Unsupported color space: {}", other))),
    }
}

fn dimension(stream: &Stream, key: &[u8]) -> Result<u32, FlyerError> {
    stream
        .dict
        .get(key)
        .and_then(|v| v.as_i64())
        .ok()
        .and_then(|v| u32::try_from(v).ok())
        .filter(|v| *v > 0)
        .ok_or_else(|| {
            FlyerError::Pdf(format!(
                "Missing image {}",
                String::from_utf8_lossy(key).to_lowercase()
            ))
        })
}

fn cmyk_to_rgb(px: &[u8]) -> [u8; 3] {
    let k = 1.0 - px[3] as f32 / 255.0;
    let channel = |v: u8| ((1.0 - v as f32 / 255.0) * k * 255.0).round() as u8;
    [channel(px[0]), channel(px[1]), channel(px[2])]
}

/// Name of the image color space; indirect and array forms use their family name.
fn color_space(doc: &Document, stream: &Stream) -> String {
    let Ok(cs) = stream.dict.get(b"ColorSpace") else {
        return "DeviceRGB".to_string();
    };

    let cs = resolve(doc, cs);
    let name = match cs {
        Object::Array(items) => items.first().and_then(|o| o.as_name().ok()),
        other => other.as_name().ok(),
    };

    name.map(|n| String::from_utf8_lossy(n).into_owned())
        .unwrap_or_else(|| "DeviceRGB".to_string())
}
