//! JPEG chunk handling for TIFF compression 7.
//!
//! A JPEG-compressed TIFF page stores each strip or tile as its own JPEG
//! stream. Writers often emit *abbreviated* streams: the quantization (DQT)
//! and Huffman (DHT) tables are stored once in the page's `JPEGTables` tag
//! and left out of every chunk. Such a chunk has to be spliced together with
//! the tables before any JPEG decoder will accept it:
//!
//! ```text
//! tables: SOI DQT DHT EOI        chunk: SOI SOF SOS ... EOI
//! merged: SOI DQT DHT SOF SOS ... EOI
//! ```

use std::io::Cursor;

use bytes::{Bytes, BytesMut};
use image::{ImageFormat, ImageReader};

use crate::error::DecodeError;

// =============================================================================
// JPEG Markers
// =============================================================================

/// Start Of Image marker
pub const SOI: [u8; 2] = [0xFF, 0xD8];

/// End Of Image marker
pub const EOI: [u8; 2] = [0xFF, 0xD9];

/// Define Huffman Table marker
pub const DHT: [u8; 2] = [0xFF, 0xC4];

/// Define Quantization Table marker
pub const DQT: [u8; 2] = [0xFF, 0xDB];

/// Start Of Scan marker
pub const SOS: [u8; 2] = [0xFF, 0xDA];

// =============================================================================
// Stream analysis
// =============================================================================

/// Check if JPEG data is an abbreviated stream (missing tables).
///
/// An abbreviated stream reaches SOS without passing any DQT or DHT segment.
/// Data that does not start with SOI, or never reaches SOS, is not
/// considered abbreviated.
pub fn is_abbreviated_stream(data: &[u8]) -> bool {
    if data.len() < 4 || data[0..2] != SOI {
        return false;
    }

    let mut pos = 2;
    while pos + 1 < data.len() {
        if data[pos] != 0xFF {
            pos += 1;
            continue;
        }

        let marker = [data[pos], data[pos + 1]];
        if marker == DQT || marker == DHT {
            return false;
        }
        if marker == SOS {
            return true;
        }

        // Standalone markers (fill bytes, SOI, EOI) carry no length field
        let standalone = matches!(marker[1], 0x00 | 0xD8 | 0xD9 | 0xFF);
        if !standalone && pos + 3 < data.len() {
            let length = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
            pos += 2 + length;
        } else {
            pos += 2;
        }
    }

    false
}

/// Check if JPEG data carries its own quantization tables.
pub fn is_complete_stream(data: &[u8]) -> bool {
    if data.len() < 4 || data[0..2] != SOI {
        return false;
    }
    data[2..].windows(2).any(|w| w == DQT)
}

// =============================================================================
// Table merging
// =============================================================================

/// Splice shared JPEGTables into an abbreviated chunk.
///
/// The tables' trailing EOI and the chunk's leading SOI are dropped, so the
/// result is `SOI + tables + frame/scan + EOI`.
pub fn merge_jpeg_tables(tables: &[u8], chunk: &[u8]) -> Bytes {
    if tables.is_empty() {
        return Bytes::copy_from_slice(chunk);
    }
    if chunk.is_empty() {
        return Bytes::new();
    }

    let tables_end = if tables.ends_with(&EOI) {
        tables.len() - 2
    } else {
        tables.len()
    };
    let chunk_start = if chunk.starts_with(&SOI) { 2 } else { 0 };

    let mut merged = BytesMut::with_capacity(tables_end + chunk.len() - chunk_start);
    merged.extend_from_slice(&tables[..tables_end]);
    merged.extend_from_slice(&chunk[chunk_start..]);
    merged.freeze()
}

/// Make a chunk decodable, merging the page's tables only when needed.
pub fn prepare_chunk(tables: Option<&[u8]>, chunk: &[u8]) -> Bytes {
    if is_complete_stream(chunk) {
        return Bytes::copy_from_slice(chunk);
    }
    match tables {
        Some(tables) if is_abbreviated_stream(chunk) => merge_jpeg_tables(tables, chunk),
        _ => Bytes::copy_from_slice(chunk),
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode one JPEG chunk to interleaved 8-bit samples.
///
/// `samples` selects the output layout: 1 gives grayscale, 3 gives RGB.
/// YCbCr chunks are converted to RGB by the decoder.
pub fn decode_chunk(
    tables: Option<&[u8]>,
    chunk: &[u8],
    samples: usize,
) -> Result<Vec<u8>, DecodeError> {
    let data = prepare_chunk(tables, chunk);
    let reader = ImageReader::with_format(Cursor::new(&data[..]), ImageFormat::Jpeg);
    let image = reader.decode().map_err(|e| DecodeError::Jpeg {
        message: e.to_string(),
    })?;

    match samples {
        1 => Ok(image.to_luma8().into_raw()),
        3 => Ok(image.to_rgb8().into_raw()),
        4 => Ok(image.to_rgba8().into_raw()),
        other => Err(DecodeError::Jpeg {
            message: format!("cannot decode JPEG to {other} samples per pixel"),
        }),
    }
}

// =============================================================================
// Tests
// =============================================================================
