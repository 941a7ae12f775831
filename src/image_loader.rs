//! # Image Loading and Decoding
//!
//! Two jobs:
//! - Resolving panel image sources (file paths, data URIs, raw base64) into
//!   decoded images for the layout engine.
//! - Loading rendered page files for PDF embedding, converted to one common
//!   RGB color mode. Baseline RGB JPEGs pass through without re-encoding
//!   (PDF supports DCTDecode natively). Everything else is decoded to 8-bit
//!   RGB with any alpha channel discarded.

use std::io::Cursor;
use std::path::Path;

use image::DynamicImage;

use crate::error::{Result, StoryformeError};

/// A page image ready for PDF embedding.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub pixel_data: ImagePixelData,
    pub width_px: u32,
    pub height_px: u32,
}

/// The pixel data in a format the PDF serializer can consume directly.
#[derive(Debug, Clone)]
pub enum ImagePixelData {
    /// Raw three-component JPEG bytes. Embed directly with DCTDecode.
    Jpeg(Vec<u8>),
    /// width * height * 3 bytes of RGB.
    Rgb(Vec<u8>),
}

/// Resolve a panel image source string to a decoded image.
///
/// Supported `src` formats:
/// - `data:image/...;base64,...` data URI
/// - Path to an existing file
/// - Raw base64-encoded image data
pub fn load_image(src: &str) -> Result<DynamicImage> {
    let raw_bytes = read_source_bytes(src)?;
    Ok(image::load_from_memory(&raw_bytes)?)
}

/// Resolve the source string to raw image bytes.
fn read_source_bytes(src: &str) -> Result<Vec<u8>> {
    // Data URI: data:image/png;base64,iVBOR...
    if src.starts_with("data:image/") {
        let comma_pos = src.find(',').ok_or_else(|| {
            StoryformeError::ImageSource("Invalid data URI: missing comma".to_string())
        })?;
        return base64_decode(&src[comma_pos + 1..]);
    }

    let path = Path::new(src);
    if path.is_file() {
        return Ok(std::fs::read(path)?);
    }

    base64_decode(src).map_err(|_| {
        StoryformeError::ImageSource(format!(
            "'{}' is not an existing file, a data URI, or base64 image data",
            truncate_for_message(src)
        ))
    })
}

fn base64_decode(input: &str) -> Result<Vec<u8>> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(input.trim())
        .map_err(|e| StoryformeError::ImageSource(format!("Base64 decode error: {}", e)))
}

fn truncate_for_message(src: &str) -> String {
    const LIMIT: usize = 60;
    if src.chars().count() <= LIMIT {
        src.to_string()
    } else {
        let head: String = src.chars().take(LIMIT).collect();
        format!("{}...", head)
    }
}

/// Load a rendered page from disk for PDF embedding.
///
/// Read and decode failures are returned as-is.
pub fn load_page(path: &Path) -> Result<LoadedImage> {
    let data = std::fs::read(path)?;
    decode_page_bytes(data)
}

/// Convert page bytes to RGB, keeping three-component JPEGs untouched.
fn decode_page_bytes(data: Vec<u8>) -> Result<LoadedImage> {
    if is_jpeg(&data) && jpeg_component_count(&data) == Some(3) {
        let (width, height) = image::io::Reader::new(Cursor::new(&data))
            .with_guessed_format()?
            .into_dimensions()?;
        return Ok(LoadedImage {
            pixel_data: ImagePixelData::Jpeg(data),
            width_px: width,
            height_px: height,
        });
    }

    let rgb = image::load_from_memory(&data)?.to_rgb8();
    Ok(LoadedImage {
        width_px: rgb.width(),
        height_px: rgb.height(),
        pixel_data: ImagePixelData::Rgb(rgb.into_raw()),
    })
}

fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8
}

/// Scan JPEG markers for the SOF (Start of Frame) segment and read its
/// component count: 1 = gray, 3 = YCbCr/RGB, 4 = CMYK.
fn jpeg_component_count(data: &[u8]) -> Option<u8> {
    let mut i = 2; // skip SOI marker (FF D8)
    while i + 1 < data.len() {
        if data[i] != 0xFF {
            return None;
        }
        let marker = data[i + 1];
        // SOF markers: C0-C3, C5-C7, C9-CB, CD-CF
        let is_sof = matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF);
        if is_sof {
            // SOF segment: length(2) + precision(1) + height(2) + width(2) + num_components(1)
            return data.get(i + 9).copied();
        }
        if i + 3 >= data.len() {
            return None;
        }
        let seg_len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        i += 2 + seg_len;
    }
    None
}
