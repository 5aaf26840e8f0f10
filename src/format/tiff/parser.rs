//! Header and directory parsing for classic TIFF and BigTIFF.
//!
//! A file opens with a byte order mark (`II` or `MM`) and a version: 42 for
//! classic TIFF with 32-bit offsets, 43 for BigTIFF with 64-bit offsets.
//! BigTIFF adds an offset-size field (always 8) and a reserved word before
//! the first IFD offset. Everything after the header is a chain of IFDs
//! whose field widths follow from the version.

use crate::error::TiffError;

use super::tags::{FieldType, TiffTag};

/// Classic header: mark, version, 32-bit first IFD offset.
pub const TIFF_HEADER_SIZE: usize = 8;

/// BigTIFF header: mark, version, offset size, reserved, 64-bit offset.
pub const BIGTIFF_HEADER_SIZE: usize = 16;

const MARK_II: [u8; 2] = *b"II";
const MARK_MM: [u8; 2] = *b"MM";
const CLASSIC_VERSION: u16 = 42;
const BIG_VERSION: u16 = 43;

// =============================================================================
// ByteOrder
// =============================================================================

/// Endianness declared by the header; applies to every multi-byte value in
/// the file, sample data included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    fn from_mark(mark: [u8; 2]) -> Result<Self, TiffError> {
        match mark {
            MARK_II => Ok(ByteOrder::LittleEndian),
            MARK_MM => Ok(ByteOrder::BigEndian),
            _ => Err(TiffError::InvalidMagic(u16::from_le_bytes(mark))),
        }
    }

    /// Read a u16 from the first two bytes of a slice.
    #[inline]
    pub fn read_u16(self, bytes: &[u8]) -> u16 {
        let raw = [bytes[0], bytes[1]];
        match self {
            ByteOrder::LittleEndian => u16::from_le_bytes(raw),
            ByteOrder::BigEndian => u16::from_be_bytes(raw),
        }
    }

    /// Read a u32 from the first four bytes of a slice.
    #[inline]
    pub fn read_u32(self, bytes: &[u8]) -> u32 {
        let raw = [bytes[0], bytes[1], bytes[2], bytes[3]];
        match self {
            ByteOrder::LittleEndian => u32::from_le_bytes(raw),
            ByteOrder::BigEndian => u32::from_be_bytes(raw),
        }
    }

    /// Read a u64 from the first eight bytes of a slice.
    #[inline]
    pub fn read_u64(self, bytes: &[u8]) -> u64 {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&bytes[..8]);
        match self {
            ByteOrder::LittleEndian => u64::from_le_bytes(raw),
            ByteOrder::BigEndian => u64::from_be_bytes(raw),
        }
    }

    /// Whether values are stored least significant byte first.
    #[inline]
    pub const fn is_little_endian(self) -> bool {
        matches!(self, ByteOrder::LittleEndian)
    }
}

// =============================================================================
// TiffHeader
// =============================================================================

/// What the header tells us: how to read values, how wide offsets are, and
/// where the IFD chain starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffHeader {
    pub byte_order: ByteOrder,
    /// 64-bit offsets and counts
    pub is_bigtiff: bool,
    pub first_ifd_offset: u64,
}

fn require(bytes: &[u8], len: usize) -> Result<(), TiffError> {
    if bytes.len() < len {
        return Err(TiffError::FileTooSmall {
            required: len as u64,
            actual: bytes.len() as u64,
        });
    }
    Ok(())
}

impl TiffHeader {
    /// Parse the header at the start of a file of `file_size` bytes.
    ///
    /// `bytes` needs 8 bytes for classic TIFF and 16 for BigTIFF. The first
    /// IFD offset must point inside the file.
    ///
    /// # Errors
    ///
    /// `FileTooSmall`, `InvalidMagic`, `InvalidVersion`,
    /// `InvalidBigTiffOffsetSize` or `InvalidIfdOffset`.
    pub fn parse(bytes: &[u8], file_size: u64) -> Result<Self, TiffError> {
        require(bytes, TIFF_HEADER_SIZE)?;
        let byte_order = ByteOrder::from_mark([bytes[0], bytes[1]])?;

        let (is_bigtiff, first_ifd_offset) = match byte_order.read_u16(&bytes[2..]) {
            CLASSIC_VERSION => (false, u64::from(byte_order.read_u32(&bytes[4..]))),
            BIG_VERSION => {
                require(bytes, BIGTIFF_HEADER_SIZE)?;
                // The reserved word at 6..8 is not checked
                let offset_size = byte_order.read_u16(&bytes[4..]);
                if offset_size != 8 {
                    return Err(TiffError::InvalidBigTiffOffsetSize(offset_size));
                }
                (true, byte_order.read_u64(&bytes[8..]))
            }
            other => return Err(TiffError::InvalidVersion(other)),
        };

        if first_ifd_offset >= file_size {
            return Err(TiffError::InvalidIfdOffset(first_ifd_offset));
        }
        Ok(Self {
            byte_order,
            is_bigtiff,
            first_ifd_offset,
        })
    }

    /// Width of offsets, counts and the value field: 4 or 8 bytes.
    #[inline]
    pub const fn value_offset_size(&self) -> usize {
        if self.is_bigtiff {
            8
        } else {
            4
        }
    }

    /// Tag and type (2 bytes each) plus count and value fields.
    #[inline]
    pub const fn ifd_entry_size(&self) -> usize {
        4 + 2 * self.value_offset_size()
    }

    /// Entry count at the start of an IFD: u16 classic, u64 BigTIFF.
    #[inline]
    pub const fn ifd_count_size(&self) -> usize {
        if self.is_bigtiff {
            8
        } else {
            2
        }
    }

    #[inline]
    pub const fn ifd_next_offset_size(&self) -> usize {
        self.value_offset_size()
    }
}

// =============================================================================
// IfdEntry
// =============================================================================

/// One 12-byte (TIFF) or 20-byte (BigTIFF) directory entry.
///
/// The value field is kept raw. When the value fits in it, it holds the value
/// itself; otherwise it holds the file offset of the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfdEntry {
    /// Numeric tag ID
    pub tag_id: u16,
    /// Decoded field type, `None` for types this parser does not know
    pub field_type: Option<FieldType>,
    /// Field type as stored in the file
    pub field_type_raw: u16,
    /// Number of values
    pub count: u64,
    /// Raw value/offset field (4 or 8 bytes)
    pub value_offset_bytes: Vec<u8>,
    /// Whether the value is stored in `value_offset_bytes`
    pub is_inline: bool,
}

impl IfdEntry {
    /// Total size of the value in bytes, `None` for unknown field types or overflow.
    pub fn value_byte_size(&self) -> Option<u64> {
        let field_type = self.field_type?;
        (field_type.size_in_bytes() as u64).checked_mul(self.count)
    }

    /// Interpret the value field as a file offset.
    pub fn value_offset(&self, byte_order: ByteOrder) -> u64 {
        if self.value_offset_bytes.len() == 8 {
            byte_order.read_u64(&self.value_offset_bytes)
        } else {
            byte_order.read_u32(&self.value_offset_bytes) as u64
        }
    }

    /// Single inline Short or Long value.
    pub fn inline_u32(&self, byte_order: ByteOrder) -> Option<u32> {
        if !self.is_inline || self.count != 1 {
            return None;
        }
        match self.field_type? {
            FieldType::Byte => Some(self.value_offset_bytes[0] as u32),
            FieldType::Short => Some(byte_order.read_u16(&self.value_offset_bytes) as u32),
            FieldType::Long | FieldType::Ifd => Some(byte_order.read_u32(&self.value_offset_bytes)),
            _ => None,
        }
    }

    /// Single inline Short, Long or Long8 value.
    pub fn inline_u64(&self, byte_order: ByteOrder) -> Option<u64> {
        if !self.is_inline || self.count != 1 {
            return None;
        }
        match self.field_type? {
            FieldType::Long8 | FieldType::Ifd8 => Some(byte_order.read_u64(&self.value_offset_bytes)),
            _ => self.inline_u32(byte_order).map(u64::from),
        }
    }

    fn parse(bytes: &[u8], header: &TiffHeader) -> Self {
        let byte_order = header.byte_order;
        let tag_id = byte_order.read_u16(&bytes[0..2]);
        let field_type_raw = byte_order.read_u16(&bytes[2..4]);
        let field_type = FieldType::from_u16(field_type_raw);

        let (count, value_offset_bytes) = if header.is_bigtiff {
            (byte_order.read_u64(&bytes[4..12]), bytes[12..20].to_vec())
        } else {
            (byte_order.read_u32(&bytes[4..8]) as u64, bytes[8..12].to_vec())
        };

        let is_inline = field_type
            .map(|ft| ft.fits_inline(count, header.is_bigtiff))
            .unwrap_or(false);

        Self {
            tag_id,
            field_type,
            field_type_raw,
            count,
            value_offset_bytes,
            is_inline,
        }
    }
}

// =============================================================================
// Ifd
// =============================================================================

/// A parsed Image File Directory: its entries and the link to the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ifd {
    /// Entries in file order
    pub entries: Vec<IfdEntry>,
    /// Offset of the next IFD, 0 at the end of the chain
    pub next_ifd_offset: u64,
}

impl Ifd {
    /// An IFD with no entries that ends the chain.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            next_ifd_offset: 0,
        }
    }

    /// Bytes occupied by an IFD with `entry_count` entries, count and next
    /// offset fields included.
    ///
    /// Saturates instead of overflowing so that absurd counts fail the
    /// subsequent bounds check.
    pub fn calculate_size(entry_count: u64, header: &TiffHeader) -> usize {
        let entries = (entry_count as usize).saturating_mul(header.ifd_entry_size());
        header
            .ifd_count_size()
            .saturating_add(entries)
            .saturating_add(header.ifd_next_offset_size())
    }

    /// Parse an IFD from bytes starting at its entry count field.
    ///
    /// # Errors
    /// `FileTooSmall` if `bytes` is shorter than the entry count requires.
    pub fn parse(bytes: &[u8], header: &TiffHeader) -> Result<Self, TiffError> {
        let count_size = header.ifd_count_size();
        if bytes.len() < count_size {
            return Err(TiffError::FileTooSmall {
                required: count_size as u64,
                actual: bytes.len() as u64,
            });
        }

        let byte_order = header.byte_order;
        let entry_count = if header.is_bigtiff {
            byte_order.read_u64(bytes)
        } else {
            byte_order.read_u16(bytes) as u64
        };

        let required = Self::calculate_size(entry_count, header);
        if bytes.len() < required {
            return Err(TiffError::FileTooSmall {
                required: required as u64,
                actual: bytes.len() as u64,
            });
        }

        let entry_size = header.ifd_entry_size();
        let entries = (0..entry_count as usize)
            .map(|i| {
                let start = count_size + i * entry_size;
                IfdEntry::parse(&bytes[start..start + entry_size], header)
            })
            .collect();

        let next_start = count_size + entry_count as usize * entry_size;
        let next_bytes = &bytes[next_start..];
        let next_ifd_offset = if header.is_bigtiff {
            byte_order.read_u64(next_bytes)
        } else {
            byte_order.read_u32(next_bytes) as u64
        };

        Ok(Self {
            entries,
            next_ifd_offset,
        })
    }

    /// Find an entry by tag.
    pub fn get_entry_by_tag(&self, tag: TiffTag) -> Option<&IfdEntry> {
        self.get_entry(tag.as_u16())
    }

    /// Find an entry by numeric tag ID.
    pub fn get_entry(&self, tag_id: u16) -> Option<&IfdEntry> {
        self.entries.iter().find(|e| e.tag_id == tag_id)
    }

    /// Number of entries in the directory.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

// =============================================================================
// Tests
// =============================================================================
