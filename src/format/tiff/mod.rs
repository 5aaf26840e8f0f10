//! TIFF backend.
//!
//! # Key Concepts
//!
//! - **Byte order**: TIFF files declare their endianness (II = little-endian, MM = big-endian)
//!   in the header. All multi-byte values, pixel samples included, respect this order.
//!
//! - **Classic TIFF vs BigTIFF**: Classic TIFF uses 32-bit offsets (max 4GB files),
//!   while BigTIFF uses 64-bit offsets. The parser handles both transparently.
//!
//! - **IFD (Image File Directory)**: one per page, chained through next-IFD offsets.
//!   Each IFD becomes a [`PageLayout`]; consecutive compatible pages form a series.
//!
//! - **Inline vs offset values**: Small values are stored inline in the IFD entry,
//!   larger values are stored at an offset pointed to by the entry.

mod container;
mod metadata;
mod page;
mod parser;
mod series;
mod tags;
mod values;

pub use container::{TiffContainer, DEFAULT_MAX_PAGES};
pub use metadata::page_metadata;
pub use page::{ChunkLayout, PageLayout};
pub use parser::{ByteOrder, Ifd, IfdEntry, TiffHeader, BIGTIFF_HEADER_SIZE, TIFF_HEADER_SIZE};
pub use series::group_series;
pub use tags::{
    Compression, FieldType, TiffTag, SAMPLE_FORMAT_FLOAT, SAMPLE_FORMAT_INT, SAMPLE_FORMAT_UINT,
    SAMPLE_FORMAT_VOID,
};
pub use values::{parse_u64_array, ValueReader};
