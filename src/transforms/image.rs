// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 assetflow contributors

//! Image compression
//!
//! PNGs are recompressed losslessly with oxipng, JPEGs are re-encoded as
//! progressive JPEGs with optimised Huffman tables and SVGs lose comments
//! and inter-tag whitespace. Other formats are copied unchanged. A result
//! is only used when it is smaller than the input.

use std::path::Path;

use jpeg_decoder::PixelFormat;
use jpeg_encoder::{ColorType, Encoder};
use quick_xml::events::Event;
use quick_xml::{Reader, Writer};

use crate::errors::AssetflowError;

const STEP: &str = "imagemin";

/// oxipng preset; 2 is its own default trade-off
const PNG_PRESET: u8 = 2;

const JPEG_QUALITY: u8 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Png,
    Jpeg,
    Svg,
    Other,
}

impl Format {
    fn of(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("png") => Self::Png,
            Some("jpg") | Some("jpeg") => Self::Jpeg,
            Some("svg") => Self::Svg,
            _ => Self::Other,
        }
    }
}

/// Tag mixed into cache keys so a settings change invalidates old entries.
///
/// Each format has its own tag.
pub fn compression_tag(path: &Path) -> &'static str {
    match Format::of(path) {
        Format::Png => "png:oxipng-preset-2",
        Format::Jpeg => "jpeg:progressive-q90-optimized",
        Format::Svg => "svg:strip-comments-whitespace",
        Format::Other => "copy",
    }
}

/// Compress image bytes according to the file's extension
pub fn compress_image(path: &Path, data: &[u8]) -> Result<Vec<u8>, AssetflowError> {
    let fail = |message: String| AssetflowError::transform_failed(STEP, path, message);

    let compressed = match Format::of(path) {
        Format::Png => {
            let options = oxipng::Options::from_preset(PNG_PRESET);
            oxipng::optimize_from_memory(data, &options).map_err(|e| fail(e.to_string()))?
        }
        Format::Jpeg => match compress_jpeg(data).map_err(fail)? {
            Some(out) => out,
            None => return Ok(data.to_vec()),
        },
        Format::Svg => compress_svg(data).map_err(fail)?,
        Format::Other => return Ok(data.to_vec()),
    };

    // Never hand back something larger than the input
    if compressed.len() < data.len() {
        Ok(compressed)
    } else {
        Ok(data.to_vec())
    }
}

/// `None` for pixel formats that would not survive a round trip
fn compress_jpeg(data: &[u8]) -> Result<Option<Vec<u8>>, String> {
    let mut decoder = jpeg_decoder::Decoder::new(data);
    let pixels = decoder.decode().map_err(|e| e.to_string())?;
    let info = decoder
        .info()
        .ok_or_else(|| "JPEG has no frame header".to_string())?;

    let color = match info.pixel_format {
        PixelFormat::RGB24 => ColorType::Rgb,
        PixelFormat::L8 => ColorType::Luma,
        _ => return Ok(None),
    };

    let mut out = Vec::with_capacity(data.len());
    let mut encoder = Encoder::new(&mut out, JPEG_QUALITY);
    encoder.set_progressive(true);
    encoder.set_optimized_huffman_tables(true);
    encoder
        .encode(&pixels, info.width, info.height, color)
        .map_err(|e| e.to_string())?;

    Ok(Some(out))
}

/// Re-serialize without comments or whitespace-only text between tags
fn compress_svg(data: &[u8]) -> Result<Vec<u8>, String> {
    let text = std::str::from_utf8(data).map_err(|e| format!("not valid UTF-8: {e}"))?;
    let mut reader = Reader::from_str(text);
    let mut writer = Writer::new(Vec::with_capacity(data.len()));

    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(Event::Comment(_)) => {}
            Ok(Event::Text(t)) if t.iter().all(u8::is_ascii_whitespace) => {}
            Ok(event) => writer.write_event(event).map_err(|e| e.to_string())?,
            Err(e) => {
                return Err(format!(
                    "invalid SVG at byte {}: {e}",
                    reader.error_position()
                ))
            }
        }
    }

    Ok(writer.into_inner())
}
