//! Test utilities for integration tests.
//!
//! This module provides a TIFF file builder covering the layouts the reader
//! supports, plus helpers for writing fixtures to disk.

use flate2::write::ZlibEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use std::io::Write;
use std::path::{Path, PathBuf};

// =============================================================================
// Tag and Type Codes
// =============================================================================

pub const TAG_NEW_SUBFILE_TYPE: u16 = 254;
pub const TAG_IMAGE_WIDTH: u16 = 256;
pub const TAG_IMAGE_LENGTH: u16 = 257;
pub const TAG_BITS_PER_SAMPLE: u16 = 258;
pub const TAG_COMPRESSION: u16 = 259;
pub const TAG_PHOTOMETRIC: u16 = 262;
pub const TAG_IMAGE_DESCRIPTION: u16 = 270;
pub const TAG_STRIP_OFFSETS: u16 = 273;
pub const TAG_SAMPLES_PER_PIXEL: u16 = 277;
pub const TAG_ROWS_PER_STRIP: u16 = 278;
pub const TAG_STRIP_BYTE_COUNTS: u16 = 279;
pub const TAG_PLANAR_CONFIGURATION: u16 = 284;
pub const TAG_SOFTWARE: u16 = 305;
pub const TAG_PREDICTOR: u16 = 317;
pub const TAG_TILE_WIDTH: u16 = 322;
pub const TAG_TILE_LENGTH: u16 = 323;
pub const TAG_TILE_OFFSETS: u16 = 324;
pub const TAG_TILE_BYTE_COUNTS: u16 = 325;
pub const TAG_SAMPLE_FORMAT: u16 = 339;

const TYPE_ASCII: u16 = 2;
const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;
const TYPE_LONG8: u16 = 16;

pub const COMPRESSION_NONE: u16 = 1;
pub const COMPRESSION_JPEG: u16 = 7;
pub const COMPRESSION_DEFLATE: u16 = 8;
pub const COMPRESSION_PACKBITS: u16 = 32773;

// =============================================================================
// Page Builder
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ByteOrderType {
    LittleEndian,
    BigEndian,
}

#[derive(Clone, Copy, Debug)]
enum ChunkShape {
    Strips { rows_per_strip: u32 },
    Tiles { width: u32, height: u32 },
}

/// One page of a test TIFF.
///
/// Sample values are kept as integers (float samples as their bit
/// patterns) in chunky `[row][column][sample]` order and serialized in the
/// file's byte order at build time.
#[derive(Clone, Debug)]
pub struct PageBuilder {
    width: u32,
    height: u32,
    samples: u16,
    bits: u16,
    sample_format: u16,
    values: Vec<u64>,
    planar: bool,
    compression: u16,
    predictor: u16,
    chunks: ChunkShape,
    description: Option<String>,
    software: Option<String>,
    reduced: bool,
}

impl PageBuilder {
    fn from_values(width: u32, height: u32, samples: u16, bits: u16, format: u16, values: Vec<u64>) -> Self {
        assert_eq!(values.len(), (width * height) as usize * samples as usize);
        Self {
            width,
            height,
            samples,
            bits,
            sample_format: format,
            values,
            planar: false,
            compression: COMPRESSION_NONE,
            predictor: 1,
            chunks: ChunkShape::Strips {
                rows_per_strip: height,
            },
            description: None,
            software: None,
            reduced: false,
        }
    }

    /// Single-sample 8-bit page.
    pub fn gray8(width: u32, height: u32, fill: impl Fn(u32, u32) -> u8) -> Self {
        let values = pixels(width, height)
            .map(|(x, y)| fill(x, y) as u64)
            .collect();
        Self::from_values(width, height, 1, 8, 1, values)
    }

    /// Three-sample 8-bit page.
    pub fn rgb8(width: u32, height: u32, fill: impl Fn(u32, u32) -> [u8; 3]) -> Self {
        let values = pixels(width, height)
            .flat_map(|(x, y)| fill(x, y).map(u64::from))
            .collect();
        Self::from_values(width, height, 3, 8, 1, values)
    }

    /// Single-sample 16-bit page.
    pub fn gray16(width: u32, height: u32, fill: impl Fn(u32, u32) -> u16) -> Self {
        let values = pixels(width, height)
            .map(|(x, y)| fill(x, y) as u64)
            .collect();
        Self::from_values(width, height, 1, 16, 1, values)
    }

    /// Single-sample 32-bit float page.
    pub fn float32(width: u32, height: u32, fill: impl Fn(u32, u32) -> f32) -> Self {
        let values = pixels(width, height)
            .map(|(x, y)| fill(x, y).to_bits() as u64)
            .collect();
        Self::from_values(width, height, 1, 32, 3, values)
    }

    pub fn with_strips(mut self, rows_per_strip: u32) -> Self {
        self.chunks = ChunkShape::Strips { rows_per_strip };
        self
    }

    pub fn with_tiles(mut self, width: u32, height: u32) -> Self {
        self.chunks = ChunkShape::Tiles { width, height };
        self
    }

    pub fn with_compression(mut self, compression: u16) -> Self {
        self.compression = compression;
        self
    }

    /// Horizontal differencing before compression.
    pub fn with_predictor(mut self) -> Self {
        self.predictor = 2;
        self
    }

    /// Store each sample in its own plane.
    pub fn planar(mut self) -> Self {
        self.planar = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_software(mut self, software: impl Into<String>) -> Self {
        self.software = Some(software.into());
        self
    }

    /// Flag the page as a reduced-resolution copy.
    pub fn reduced(mut self) -> Self {
        self.reduced = true;
        self
    }

    fn value(&self, x: u32, y: u32, s: u16) -> u64 {
        let index = ((y * self.width + x) as usize) * self.samples as usize + s as usize;
        self.values[index]
    }

    fn planes(&self) -> u16 {
        if self.planar {
            self.samples
        } else {
            1
        }
    }

    fn samples_per_chunk(&self) -> u16 {
        if self.planar {
            1
        } else {
            self.samples
        }
    }

    /// Chunk rectangles `(x, y, width, height)` in file order within a plane.
    fn rects(&self) -> Vec<(u32, u32, u32, u32)> {
        match self.chunks {
            ChunkShape::Strips { rows_per_strip } => (0..self.height)
                .step_by(rows_per_strip as usize)
                .map(|y| (0, y, self.width, rows_per_strip.min(self.height - y)))
                .collect(),
            ChunkShape::Tiles { width, height } => {
                let mut rects = Vec::new();
                for y in (0..self.height).step_by(height as usize) {
                    for x in (0..self.width).step_by(width as usize) {
                        rects.push((x, y, width, height));
                    }
                }
                rects
            }
        }
    }

    /// Encoded chunks in file order: plane-major, then row-major.
    fn encode_chunks(&self, order: ByteOrderType) -> Vec<Vec<u8>> {
        let mut chunks = Vec::new();
        for plane in 0..self.planes() {
            for (x0, y0, w, h) in self.rects() {
                let spc = self.samples_per_chunk();
                let mut values = Vec::with_capacity((w * h) as usize * spc as usize);
                for y in y0..y0 + h {
                    for x in x0..x0 + w {
                        for s in 0..spc {
                            let sample = if self.planar { plane } else { s };
                            let inside = x < self.width && y < self.height;
                            values.push(if inside { self.value(x, y, sample) } else { 0 });
                        }
                    }
                }

                if self.predictor == 2 {
                    apply_predictor(&mut values, w as usize, spc as usize, self.bits);
                }
                let raw = serialize(&values, self.bits, order);
                chunks.push(self.compress(raw, w, h));
            }
        }
        chunks
    }

    fn compress(&self, raw: Vec<u8>, width: u32, height: u32) -> Vec<u8> {
        match self.compression {
            COMPRESSION_NONE => raw,
            COMPRESSION_PACKBITS => pack_bits(&raw),
            COMPRESSION_DEFLATE => deflate(&raw),
            COMPRESSION_JPEG => {
                let color = match self.samples_per_chunk() {
                    1 => ExtendedColorType::L8,
                    3 => ExtendedColorType::Rgb8,
                    n => panic!("no JPEG fixture for {n} samples"),
                };
                let mut buf = Vec::new();
                JpegEncoder::new_with_quality(&mut buf, 100)
                    .write_image(&raw, width, height, color)
                    .unwrap();
                buf
            }
            // Unknown codes store raw bytes; decoding them must fail
            _ => raw,
        }
    }

    fn entries(&self, offsets: &[u64], counts: &[u64], bigtiff: bool, order: ByteOrderType) -> Vec<Entry> {
        let mut entries = vec![
            Entry::long(TAG_IMAGE_WIDTH, &[self.width], order),
            Entry::long(TAG_IMAGE_LENGTH, &[self.height], order),
            Entry::short(TAG_BITS_PER_SAMPLE, &vec![self.bits; self.samples as usize], order),
            Entry::short(TAG_COMPRESSION, &[self.compression], order),
            Entry::short(
                TAG_PHOTOMETRIC,
                &[if self.samples == 3 { 2 } else { 1 }],
                order,
            ),
            Entry::short(TAG_SAMPLES_PER_PIXEL, &[self.samples], order),
        ];
        if self.reduced {
            entries.push(Entry::long(TAG_NEW_SUBFILE_TYPE, &[1], order));
        }
        if self.samples > 1 {
            entries.push(Entry::short(
                TAG_PLANAR_CONFIGURATION,
                &[if self.planar { 2 } else { 1 }],
                order,
            ));
        }
        if self.predictor != 1 {
            entries.push(Entry::short(TAG_PREDICTOR, &[self.predictor], order));
        }
        if self.sample_format != 1 {
            entries.push(Entry::short(
                TAG_SAMPLE_FORMAT,
                &vec![self.sample_format; self.samples as usize],
                order,
            ));
        }
        if let Some(description) = &self.description {
            entries.push(Entry::ascii(TAG_IMAGE_DESCRIPTION, description));
        }
        if let Some(software) = &self.software {
            entries.push(Entry::ascii(TAG_SOFTWARE, software));
        }

        let (offsets_tag, counts_tag) = match self.chunks {
            ChunkShape::Strips { rows_per_strip } => {
                entries.push(Entry::long(TAG_ROWS_PER_STRIP, &[rows_per_strip], order));
                (TAG_STRIP_OFFSETS, TAG_STRIP_BYTE_COUNTS)
            }
            ChunkShape::Tiles { width, height } => {
                entries.push(Entry::long(TAG_TILE_WIDTH, &[width], order));
                entries.push(Entry::long(TAG_TILE_LENGTH, &[height], order));
                (TAG_TILE_OFFSETS, TAG_TILE_BYTE_COUNTS)
            }
        };
        entries.push(Entry::offsets(offsets_tag, offsets, bigtiff, order));
        entries.push(Entry::offsets(counts_tag, counts, bigtiff, order));

        entries.sort_by_key(|e| e.tag);
        entries
    }
}

fn pixels(width: u32, height: u32) -> impl Iterator<Item = (u32, u32)> {
    (0..height).flat_map(move |y| (0..width).map(move |x| (x, y)))
}

fn apply_predictor(values: &mut [u64], width: usize, samples: usize, bits: u16) {
    let mask = if bits >= 64 { u64::MAX } else { (1u64 << bits) - 1 };
    let row_len = width * samples;
    for row in values.chunks_mut(row_len) {
        for i in (samples..row.len()).rev() {
            row[i] = row[i].wrapping_sub(row[i - samples]) & mask;
        }
    }
}

fn serialize(values: &[u64], bits: u16, order: ByteOrderType) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * (bits as usize / 8));
    for &value in values {
        write_value(&mut out, order, value, bits as usize / 8);
    }
    out
}

/// PackBits with literal runs only.
pub fn pack_bits(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    for run in data.chunks(128) {
        out.push((run.len() - 1) as u8);
        out.extend_from_slice(run);
    }
    out
}

pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

// =============================================================================
// IFD Entries
// =============================================================================

struct Entry {
    tag: u16,
    field_type: u16,
    count: u64,
    payload: Vec<u8>,
}

impl Entry {
    fn short(tag: u16, values: &[u16], order: ByteOrderType) -> Self {
        let mut payload = Vec::new();
        for &v in values {
            write_value(&mut payload, order, v as u64, 2);
        }
        Self {
            tag,
            field_type: TYPE_SHORT,
            count: values.len() as u64,
            payload,
        }
    }

    fn long(tag: u16, values: &[u32], order: ByteOrderType) -> Self {
        let mut payload = Vec::new();
        for &v in values {
            write_value(&mut payload, order, v as u64, 4);
        }
        Self {
            tag,
            field_type: TYPE_LONG,
            count: values.len() as u64,
            payload,
        }
    }

    fn offsets(tag: u16, values: &[u64], bigtiff: bool, order: ByteOrderType) -> Self {
        let size = if bigtiff { 8 } else { 4 };
        let mut payload = Vec::new();
        for &v in values {
            write_value(&mut payload, order, v, size);
        }
        Self {
            tag,
            field_type: if bigtiff { TYPE_LONG8 } else { TYPE_LONG },
            count: values.len() as u64,
            payload,
        }
    }

    fn ascii(tag: u16, text: &str) -> Self {
        let mut payload = text.as_bytes().to_vec();
        payload.push(0);
        Self {
            tag,
            field_type: TYPE_ASCII,
            count: payload.len() as u64,
            payload,
        }
    }
}

// =============================================================================
// TIFF File Builder
// =============================================================================

/// Where the last IFD's next-offset field points.
#[derive(Clone, Copy, Debug)]
enum LastNext {
    End,
    FirstIfd,
    Offset(u64),
}

/// Builder for creating test TIFF files.
pub struct TiffBuilder {
    byte_order: ByteOrderType,
    is_bigtiff: bool,
    pages: Vec<PageBuilder>,
    last_next: LastNext,
}

impl TiffBuilder {
    pub fn new() -> Self {
        Self {
            byte_order: ByteOrderType::LittleEndian,
            is_bigtiff: false,
            pages: Vec::new(),
            last_next: LastNext::End,
        }
    }

    pub fn with_byte_order(mut self, order: ByteOrderType) -> Self {
        self.byte_order = order;
        self
    }

    pub fn with_bigtiff(mut self, is_bigtiff: bool) -> Self {
        self.is_bigtiff = is_bigtiff;
        self
    }

    pub fn add_page(mut self, page: PageBuilder) -> Self {
        self.pages.push(page);
        self
    }

    pub fn add_pages(mut self, pages: impl IntoIterator<Item = PageBuilder>) -> Self {
        self.pages.extend(pages);
        self
    }

    /// Point the last IFD back at the first one.
    pub fn with_cycle(mut self) -> Self {
        self.last_next = LastNext::FirstIfd;
        self
    }

    /// Point the last IFD at an arbitrary offset.
    pub fn with_dangling_next(mut self, offset: u64) -> Self {
        self.last_next = LastNext::Offset(offset);
        self
    }

    fn offset_size(&self) -> usize {
        if self.is_bigtiff {
            8
        } else {
            4
        }
    }

    /// Build the TIFF file data.
    ///
    /// Each page is written as its chunk data, then any out-of-line tag
    /// values, then its IFD.
    pub fn build(self) -> Vec<u8> {
        let order = self.byte_order;
        let offset_size = self.offset_size();
        let mut data = Vec::new();

        match order {
            ByteOrderType::LittleEndian => data.extend_from_slice(b"II"),
            ByteOrderType::BigEndian => data.extend_from_slice(b"MM"),
        }
        if self.is_bigtiff {
            write_value(&mut data, order, 43, 2);
            write_value(&mut data, order, 8, 2);
            write_value(&mut data, order, 0, 2);
        } else {
            write_value(&mut data, order, 42, 2);
        }

        let mut next_field = data.len();
        write_value(&mut data, order, 0, offset_size);
        let mut first_ifd = 0u64;

        for page in &self.pages {
            let mut offsets = Vec::new();
            let mut counts = Vec::new();
            for chunk in page.encode_chunks(order) {
                offsets.push(data.len() as u64);
                counts.push(chunk.len() as u64);
                data.extend_from_slice(&chunk);
            }

            let entries = page.entries(&offsets, &counts, self.is_bigtiff, order);
            let mut fields = Vec::with_capacity(entries.len());
            for entry in &entries {
                if entry.payload.len() > offset_size {
                    pad_to_even(&mut data);
                    let at = data.len() as u64;
                    data.extend_from_slice(&entry.payload);
                    let mut field = Vec::new();
                    write_value(&mut field, order, at, offset_size);
                    fields.push(field);
                } else {
                    let mut field = entry.payload.clone();
                    field.resize(offset_size, 0);
                    fields.push(field);
                }
            }

            pad_to_even(&mut data);
            let ifd_offset = data.len() as u64;
            if first_ifd == 0 {
                first_ifd = ifd_offset;
            }
            write_at(&mut data, next_field, order, ifd_offset, offset_size);

            let count_size = if self.is_bigtiff { 8 } else { 2 };
            write_value(&mut data, order, entries.len() as u64, count_size);
            for (entry, field) in entries.iter().zip(fields) {
                write_value(&mut data, order, entry.tag as u64, 2);
                write_value(&mut data, order, entry.field_type as u64, 2);
                write_value(&mut data, order, entry.count, offset_size);
                data.extend_from_slice(&field);
            }
            next_field = data.len();
            write_value(&mut data, order, 0, offset_size);
        }

        let last = match self.last_next {
            LastNext::End => 0,
            LastNext::FirstIfd => first_ifd,
            LastNext::Offset(offset) => offset,
        };
        write_at(&mut data, next_field, order, last, offset_size);
        data
    }
}

impl Default for TiffBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn pad_to_even(data: &mut Vec<u8>) {
    if data.len() % 2 == 1 {
        data.push(0);
    }
}

fn write_value(data: &mut Vec<u8>, byte_order: ByteOrderType, value: u64, size: usize) {
    match byte_order {
        ByteOrderType::LittleEndian => match size {
            1 => data.push(value as u8),
            2 => data.extend(&(value as u16).to_le_bytes()),
            4 => data.extend(&(value as u32).to_le_bytes()),
            8 => data.extend(&value.to_le_bytes()),
            _ => panic!("unsupported value size {size}"),
        },
        ByteOrderType::BigEndian => match size {
            1 => data.push(value as u8),
            2 => data.extend(&(value as u16).to_be_bytes()),
            4 => data.extend(&(value as u32).to_be_bytes()),
            8 => data.extend(&value.to_be_bytes()),
            _ => panic!("unsupported value size {size}"),
        },
    }
}

fn write_at(data: &mut [u8], pos: usize, byte_order: ByteOrderType, value: u64, size: usize) {
    let mut field = Vec::with_capacity(size);
    write_value(&mut field, byte_order, value, size);
    data[pos..pos + size].copy_from_slice(&field);
}

// =============================================================================
// Fixtures
// =============================================================================

/// Deterministic gray value for pixel `(x, y)` of page `page`.
pub fn gray_at(page: u32, x: u32, y: u32) -> u8 {
    ((x * 3 + y * 7 + page * 11) % 251) as u8
}

/// An 8-bit gray page filled by [`gray_at`].
pub fn gray_page(page: u32, width: u32, height: u32) -> PageBuilder {
    PageBuilder::gray8(width, height, move |x, y| gray_at(page, x, y))
}

/// A little-endian file with `pages` gray pages of the given size.
pub fn multipage_tiff(pages: u32, width: u32, height: u32) -> Vec<u8> {
    TiffBuilder::new()
        .add_pages((0..pages).map(|p| gray_page(p, width, height)))
        .build()
}

/// Write `data` to `dir/name` and return the path.
pub fn write_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, data).unwrap();
    path
}
