//! Lossless TIFF chunk codecs and the horizontal predictor.
//!
//! JPEG lives in [`super::jpeg`]; everything here works on raw byte buffers
//! and knows nothing about page geometry beyond what the predictor needs.

use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::error::DecodeError;
use crate::format::tiff::ByteOrder;

// =============================================================================
// PackBits
// =============================================================================

/// Decode a PackBits (Apple run-length) stream.
///
/// Each header byte `n` is followed by `n + 1` literal bytes when `n` is in
/// `0..=127`, or by one byte repeated `1 - n` times when `n` is in
/// `-127..=-1`. `-128` is a no-op. Decoding stops once `expected` bytes are
/// produced, so padding after the last run is ignored.
pub fn unpack_bits(data: &[u8], expected: usize) -> Result<Vec<u8>, String> {
    let mut out = Vec::with_capacity(expected);
    let mut pos = 0;

    while pos < data.len() && out.len() < expected {
        let n = data[pos] as i8;
        pos += 1;

        match n {
            0..=127 => {
                let len = n as usize + 1;
                let literal = data
                    .get(pos..pos + len)
                    .ok_or_else(|| format!("literal run of {len} bytes past end of data"))?;
                out.extend_from_slice(literal);
                pos += len;
            }
            -128 => {}
            _ => {
                let value = *data
                    .get(pos)
                    .ok_or_else(|| "repeat run past end of data".to_string())?;
                let len = 1 - n as isize;
                out.extend(std::iter::repeat(value).take(len as usize));
                pos += 1;
            }
        }
    }

    out.truncate(expected);
    Ok(out)
}

// =============================================================================
// LZW
// =============================================================================

const LZW_CLEAR: u16 = 256;
const LZW_EOI: u16 = 257;
const LZW_MAX_BITS: u32 = 12;

/// MSB-first bit reader over an LZW stream.
struct BitReader<'a> {
    data: &'a [u8],
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, bit_pos: 0 }
    }

    fn read(&mut self, width: u32) -> Option<u16> {
        let mut code: u32 = 0;
        for _ in 0..width {
            let byte = *self.data.get(self.bit_pos / 8)?;
            let bit = (byte >> (7 - (self.bit_pos % 8))) & 1;
            code = (code << 1) | bit as u32;
            self.bit_pos += 1;
        }
        Some(code as u16)
    }
}

/// Decode a TIFF LZW stream.
///
/// TIFF LZW codes are written MSB-first starting at 9 bits, and the code
/// width grows one code *early*: the decoder widens as soon as the next free
/// code plus one reaches the current limit. A stream that ends without an
/// EOI code is accepted.
pub fn lzw_decode(data: &[u8], expected: usize) -> Result<Vec<u8>, String> {
    // Each entry is (prefix code, last byte); single bytes have no prefix
    let mut table: Vec<(Option<u16>, u8)> = Vec::with_capacity(1 << LZW_MAX_BITS);
    let reset = |table: &mut Vec<(Option<u16>, u8)>| {
        table.clear();
        table.extend((0..=255u8).map(|b| (None, b)));
        // Clear and EOI occupy 256 and 257
        table.push((None, 0));
        table.push((None, 0));
    };
    reset(&mut table);

    let mut out = Vec::with_capacity(expected);
    let mut reader = BitReader::new(data);
    let mut width = 9;
    let mut prev: Option<u16> = None;
    let mut scratch = Vec::new();

    while let Some(code) = reader.read(width) {
        if code == LZW_EOI {
            break;
        }
        if code == LZW_CLEAR {
            reset(&mut table);
            width = 9;
            prev = None;
            continue;
        }

        let next_free = table.len() as u16;
        let Some(prev_code) = prev else {
            if code > 255 {
                return Err(format!("first code after clear is {code}"));
            }
            out.push(code as u8);
            prev = Some(code);
            continue;
        };

        if code < next_free {
            expand(&table, code, &mut scratch);
            out.extend_from_slice(&scratch);
            push_entry(&mut table, prev_code, scratch[0]);
        } else if code == next_free {
            // KwKwK: the code being defined is used immediately
            expand(&table, prev_code, &mut scratch);
            let first = scratch[0];
            out.extend_from_slice(&scratch);
            out.push(first);
            push_entry(&mut table, prev_code, first);
        } else {
            return Err(format!("code {code} beyond table size {next_free}"));
        }
        prev = Some(code);

        if table.len() as u32 + 1 >= (1 << width) && width < LZW_MAX_BITS {
            width += 1;
        }
        if out.len() >= expected {
            break;
        }
    }

    out.truncate(expected);
    Ok(out)
}

fn push_entry(table: &mut Vec<(Option<u16>, u8)>, prefix: u16, byte: u8) {
    if table.len() < 1 << LZW_MAX_BITS {
        table.push((Some(prefix), byte));
    }
}

/// Write the string for `code` into `buf`, first byte first.
fn expand(table: &[(Option<u16>, u8)], code: u16, buf: &mut Vec<u8>) {
    buf.clear();
    let mut current = Some(code);
    while let Some(c) = current {
        let (prefix, byte) = table[c as usize];
        buf.push(byte);
        current = prefix;
    }
    buf.reverse();
}

// =============================================================================
// Deflate
// =============================================================================

/// Inflate a zlib stream (compression 8 and 32946).
pub fn inflate(data: &[u8], expected: usize) -> Result<Vec<u8>, String> {
    let mut out = Vec::with_capacity(expected);
    ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| e.to_string())?;
    Ok(out)
}

// =============================================================================
// Predictor
// =============================================================================

/// Undo horizontal differencing (predictor 2) in place.
///
/// `row_len` is the number of pixels per row and `samples` the interleaved
/// samples per pixel in `data`. Each sample becomes the wrapping sum of
/// itself and the same sample of the previous pixel. Multi-byte samples are
/// read and written in the file's byte order.
pub fn undo_horizontal_predictor(
    data: &mut [u8],
    row_len: usize,
    samples: usize,
    bytes_per_sample: usize,
    byte_order: ByteOrder,
) -> Result<(), DecodeError> {
    let row_bytes = row_len * samples * bytes_per_sample;
    if row_bytes == 0 {
        return Ok(());
    }
    let stride = samples * bytes_per_sample;

    for row in data.chunks_exact_mut(row_bytes) {
        match bytes_per_sample {
            1 => {
                for i in stride..row.len() {
                    row[i] = row[i].wrapping_add(row[i - stride]);
                }
            }
            2 => {
                for i in (stride..row.len()).step_by(2) {
                    let prev = byte_order.read_u16(&row[i - stride..]);
                    let cur = byte_order.read_u16(&row[i..]);
                    let sum = cur.wrapping_add(prev);
                    let bytes = if byte_order.is_little_endian() {
                        sum.to_le_bytes()
                    } else {
                        sum.to_be_bytes()
                    };
                    row[i..i + 2].copy_from_slice(&bytes);
                }
            }
            4 => {
                for i in (stride..row.len()).step_by(4) {
                    let prev = byte_order.read_u32(&row[i - stride..]);
                    let cur = byte_order.read_u32(&row[i..]);
                    let sum = cur.wrapping_add(prev);
                    let bytes = if byte_order.is_little_endian() {
                        sum.to_le_bytes()
                    } else {
                        sum.to_be_bytes()
                    };
                    row[i..i + 4].copy_from_slice(&bytes);
                }
            }
            _ => {
                return Err(DecodeError::UnsupportedPredictor {
                    predictor: 2,
                    bits: (bytes_per_sample * 8) as u16,
                })
            }
        }
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
