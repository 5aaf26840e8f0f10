//! TIFF tag value reading.
//!
//! Values are stored either inline in the IFD entry (small values) or at an
//! offset in the file (arrays, strings, rationals). Array values such as
//! StripOffsets are fetched with a single range read.

use bytes::Bytes;

use crate::error::TiffError;
use crate::io::RangeReader;

use super::parser::{ByteOrder, IfdEntry, TiffHeader};
use super::tags::{FieldType, TiffTag};

// =============================================================================
// ValueReader
// =============================================================================

/// Reads tag values respecting the file's byte order and format.
pub struct ValueReader<'a, R: RangeReader + ?Sized> {
    reader: &'a R,
    header: &'a TiffHeader,
}

impl<'a, R: RangeReader + ?Sized> ValueReader<'a, R> {
    pub fn new(reader: &'a R, header: &'a TiffHeader) -> Self {
        Self { reader, header }
    }

    #[inline]
    pub fn byte_order(&self) -> ByteOrder {
        self.header.byte_order
    }

    /// Read raw bytes for an IFD entry's value.
    ///
    /// For inline values, returns the bytes from the entry.
    /// For offset values, fetches the bytes from the file.
    pub fn read_bytes(&self, entry: &IfdEntry) -> Result<Bytes, TiffError> {
        let size = entry
            .value_byte_size()
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;

        if entry.is_inline {
            Ok(Bytes::copy_from_slice(
                &entry.value_offset_bytes[..size as usize],
            ))
        } else {
            let offset = entry.value_offset(self.header.byte_order);
            let len = usize::try_from(size).map_err(|_| invalid(entry, "value too large"))?;
            Ok(self.reader.read_exact_at(offset, len)?)
        }
    }

    /// Read a single unsigned integer value (Byte, Short, Long or Long8).
    pub fn read_u64(&self, entry: &IfdEntry) -> Result<u64, TiffError> {
        if let Some(value) = entry.inline_u64(self.header.byte_order) {
            return Ok(value);
        }
        if entry.count != 1 {
            return Err(invalid(
                entry,
                &format!("expected count 1, got {}", entry.count),
            ));
        }
        self.read_u64_array(entry)?
            .first()
            .copied()
            .ok_or_else(|| invalid(entry, "empty value"))
    }

    /// Read a single value that must fit in 32 bits.
    pub fn read_u32(&self, entry: &IfdEntry) -> Result<u32, TiffError> {
        let value = self.read_u64(entry)?;
        u32::try_from(value).map_err(|_| invalid(entry, &format!("{value} exceeds 32 bits")))
    }

    /// Read an array of unsigned integers, widening every element to u64.
    ///
    /// This is the method for StripOffsets, StripByteCounts, TileOffsets and
    /// TileByteCounts; the whole array is fetched in one read.
    pub fn read_u64_array(&self, entry: &IfdEntry) -> Result<Vec<u64>, TiffError> {
        let field_type = entry
            .field_type
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;

        if !field_type.is_unsigned_integer() {
            return Err(invalid(
                entry,
                &format!("expected an unsigned integer type, got {:?}", field_type),
            ));
        }
        if entry.count == 0 {
            return Ok(Vec::new());
        }

        let bytes = self.read_bytes(entry)?;
        Ok(parse_u64_array(
            &bytes,
            entry.count as usize,
            field_type,
            self.header.byte_order,
        ))
    }

    /// Read an array of Short values (BitsPerSample, SampleFormat).
    pub fn read_u16_array(&self, entry: &IfdEntry) -> Result<Vec<u16>, TiffError> {
        self.read_u64_array(entry)?
            .into_iter()
            .map(|v| u16::try_from(v).map_err(|_| invalid(entry, &format!("{v} exceeds 16 bits"))))
            .collect()
    }

    /// Read the first Rational (or integer) value as a float.
    ///
    /// Used for XResolution and YResolution.
    pub fn read_rational(&self, entry: &IfdEntry) -> Result<f64, TiffError> {
        let field_type = entry
            .field_type
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;

        match field_type {
            FieldType::Rational | FieldType::SRational => {
                let bytes = self.read_bytes(entry)?;
                if bytes.len() < 8 {
                    return Err(invalid(entry, "empty rational"));
                }
                let byte_order = self.header.byte_order;
                let (num, den) = if field_type == FieldType::Rational {
                    (
                        byte_order.read_u32(&bytes[0..4]) as f64,
                        byte_order.read_u32(&bytes[4..8]) as f64,
                    )
                } else {
                    (
                        byte_order.read_u32(&bytes[0..4]) as i32 as f64,
                        byte_order.read_u32(&bytes[4..8]) as i32 as f64,
                    )
                };
                if den == 0.0 {
                    return Err(invalid(entry, "zero denominator"));
                }
                Ok(num / den)
            }
            _ => self.read_u64(entry).map(|v| v as f64),
        }
    }

    /// Read an ASCII string value.
    ///
    /// The string ends at the first NUL; invalid UTF-8 is replaced.
    pub fn read_string(&self, entry: &IfdEntry) -> Result<String, TiffError> {
        let field_type = entry
            .field_type
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;

        if !matches!(
            field_type,
            FieldType::Ascii | FieldType::Byte | FieldType::Undefined
        ) {
            return Err(invalid(
                entry,
                &format!("expected Ascii type for string, got {:?}", field_type),
            ));
        }

        let bytes = self.read_bytes(entry)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    /// Read raw bytes from an entry (JPEGTables and other opaque data).
    pub fn read_raw_bytes(&self, entry: &IfdEntry) -> Result<Bytes, TiffError> {
        self.read_bytes(entry)
    }
}

fn invalid(entry: &IfdEntry, message: &str) -> TiffError {
    TiffError::InvalidTagValue {
        tag: TiffTag::from_u16(entry.tag_id)
            .map(TiffTag::name)
            .unwrap_or("unknown"),
        message: message.to_string(),
    }
}

// =============================================================================
// Parsing from bytes directly
// =============================================================================

/// Parse an array of unsigned integers from raw bytes.
///
/// Elements that would run past the end of `bytes` are dropped.
pub fn parse_u64_array(
    bytes: &[u8],
    count: usize,
    field_type: FieldType,
    byte_order: ByteOrder,
) -> Vec<u64> {
    let width = field_type.size_in_bytes();
    bytes
        .chunks_exact(width)
        .take(count)
        .map(|chunk| match width {
            1 => chunk[0] as u64,
            2 => byte_order.read_u16(chunk) as u64,
            4 => byte_order.read_u32(chunk) as u64,
            _ => byte_order.read_u64(chunk),
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
