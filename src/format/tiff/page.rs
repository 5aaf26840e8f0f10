//! Per-IFD page layout.
//!
//! A [`PageLayout`] holds everything needed to decode one page without
//! touching the IFD again: geometry, sample layout, codec parameters and the
//! byte ranges of every strip or tile.

use bytes::Bytes;

use crate::error::TiffError;
use crate::io::RangeReader;
use crate::stack::DType;

use super::parser::Ifd;
use super::tags::{TiffTag, PLANAR_CHUNKY, PLANAR_SEPARATE, PREDICTOR_NONE, SAMPLE_FORMAT_UINT};
use super::values::ValueReader;

/// Where the compressed chunks of a page live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkLayout {
    Strips {
        rows_per_strip: u32,
        offsets: Vec<u64>,
        byte_counts: Vec<u64>,
    },
    Tiles {
        tile_width: u32,
        tile_height: u32,
        offsets: Vec<u64>,
        byte_counts: Vec<u64>,
    },
}

impl ChunkLayout {
    pub fn offsets(&self) -> &[u64] {
        match self {
            ChunkLayout::Strips { offsets, .. } | ChunkLayout::Tiles { offsets, .. } => offsets,
        }
    }

    pub fn byte_counts(&self) -> &[u64] {
        match self {
            ChunkLayout::Strips { byte_counts, .. } | ChunkLayout::Tiles { byte_counts, .. } => {
                byte_counts
            }
        }
    }
}

/// Decoding parameters of one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    /// Position of the IFD in the chain
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub samples_per_pixel: u16,
    pub bits_per_sample: u16,
    pub sample_format: u16,
    /// 1 = chunky, 2 = planar
    pub planar_configuration: u16,
    /// Raw compression code; checked when the page is decoded
    pub compression: u16,
    pub predictor: u16,
    pub photometric: Option<u16>,
    pub chunks: ChunkLayout,
    pub jpeg_tables: Option<Bytes>,
    /// NewSubfileType bits
    pub subfile_type: u32,
    pub dtype: DType,
}

impl PageLayout {
    /// Read the layout of one IFD.
    ///
    /// # Errors
    /// - `MissingTag` when dimensions or chunk tables are absent
    /// - `MixedBitsPerSample` when samples differ in bit depth
    /// - `UnsupportedSampleFormat` when no array element type fits
    /// - `InvalidTagValue` when the chunk tables are shorter than the page needs
    pub fn from_ifd<R: RangeReader + ?Sized>(
        ifd: &Ifd,
        index: usize,
        values: &ValueReader<'_, R>,
    ) -> Result<Self, TiffError> {
        let required = |tag: TiffTag| ifd.get_entry_by_tag(tag).ok_or(TiffError::MissingTag(tag.name()));
        let optional_u32 = |tag: TiffTag| -> Result<Option<u32>, TiffError> {
            ifd.get_entry_by_tag(tag)
                .map(|e| values.read_u32(e))
                .transpose()
        };

        let width = values.read_u32(required(TiffTag::ImageWidth)?)?;
        let height = values.read_u32(required(TiffTag::ImageLength)?)?;
        let samples_per_pixel = optional_u32(TiffTag::SamplesPerPixel)?.unwrap_or(1).max(1) as u16;

        let bits = match ifd.get_entry_by_tag(TiffTag::BitsPerSample) {
            Some(entry) => values.read_u16_array(entry)?,
            None => vec![1],
        };
        let bits_per_sample = bits.first().copied().unwrap_or(1);
        if bits.iter().any(|&b| b != bits_per_sample) {
            return Err(TiffError::MixedBitsPerSample(bits));
        }

        let sample_format = match ifd.get_entry_by_tag(TiffTag::SampleFormat) {
            Some(entry) => values
                .read_u16_array(entry)?
                .first()
                .copied()
                .unwrap_or(SAMPLE_FORMAT_UINT),
            None => SAMPLE_FORMAT_UINT,
        };
        let dtype = DType::from_tiff(bits_per_sample, sample_format).ok_or(
            TiffError::UnsupportedSampleFormat {
                bits: bits_per_sample,
                format: sample_format,
            },
        )?;

        let planar_configuration = match optional_u32(TiffTag::PlanarConfiguration)? {
            Some(2) if samples_per_pixel > 1 => PLANAR_SEPARATE,
            _ => PLANAR_CHUNKY,
        };
        let compression = optional_u32(TiffTag::Compression)?.unwrap_or(1) as u16;
        let predictor = optional_u32(TiffTag::Predictor)?.unwrap_or(PREDICTOR_NONE as u32) as u16;
        let photometric = optional_u32(TiffTag::PhotometricInterpretation)?.map(|v| v as u16);
        let subfile_type = optional_u32(TiffTag::NewSubfileType)?.unwrap_or(0);

        let jpeg_tables = ifd
            .get_entry_by_tag(TiffTag::JpegTables)
            .map(|e| values.read_raw_bytes(e))
            .transpose()?;

        let chunks = if ifd.get_entry_by_tag(TiffTag::TileOffsets).is_some() {
            let tile_width = values.read_u32(required(TiffTag::TileWidth)?)?;
            let tile_height = values.read_u32(required(TiffTag::TileLength)?)?;
            if tile_width == 0 || tile_height == 0 {
                return Err(TiffError::InvalidTagValue {
                    tag: TiffTag::TileWidth.name(),
                    message: format!("tile size {tile_width}x{tile_height}"),
                });
            }
            ChunkLayout::Tiles {
                tile_width,
                tile_height,
                offsets: values.read_u64_array(required(TiffTag::TileOffsets)?)?,
                byte_counts: values.read_u64_array(required(TiffTag::TileByteCounts)?)?,
            }
        } else {
            let rows_per_strip = optional_u32(TiffTag::RowsPerStrip)?
                .unwrap_or(u32::MAX)
                .clamp(1, height.max(1));
            ChunkLayout::Strips {
                rows_per_strip,
                offsets: values.read_u64_array(required(TiffTag::StripOffsets)?)?,
                byte_counts: values.read_u64_array(required(TiffTag::StripByteCounts)?)?,
            }
        };

        let layout = Self {
            index,
            width,
            height,
            samples_per_pixel,
            bits_per_sample,
            sample_format,
            planar_configuration,
            compression,
            predictor,
            photometric,
            chunks,
            jpeg_tables,
            subfile_type,
            dtype,
        };
        layout.check_chunk_tables()?;
        Ok(layout)
    }

    fn check_chunk_tables(&self) -> Result<(), TiffError> {
        let needed = self.chunks_per_plane() * self.planes();
        let (tag, found) = match &self.chunks {
            ChunkLayout::Strips {
                offsets,
                byte_counts,
                ..
            } => (
                TiffTag::StripOffsets,
                offsets.len().min(byte_counts.len()),
            ),
            ChunkLayout::Tiles {
                offsets,
                byte_counts,
                ..
            } => (TiffTag::TileOffsets, offsets.len().min(byte_counts.len())),
        };
        if found < needed {
            return Err(TiffError::InvalidTagValue {
                tag: tag.name(),
                message: format!("page needs {needed} chunks, found {found}"),
            });
        }
        Ok(())
    }

    /// Array shape of the decoded page.
    ///
    /// `(H, W)` for one sample per pixel, `(H, W, S)` for chunky data and
    /// `(S, H, W)` for planar data.
    pub fn shape(&self) -> Vec<usize> {
        let (h, w, s) = (
            self.height as usize,
            self.width as usize,
            self.samples_per_pixel as usize,
        );
        if s == 1 {
            vec![h, w]
        } else if self.is_planar() {
            vec![s, h, w]
        } else {
            vec![h, w, s]
        }
    }

    pub fn is_planar(&self) -> bool {
        self.planar_configuration == PLANAR_SEPARATE
    }

    pub fn is_tiled(&self) -> bool {
        matches!(self.chunks, ChunkLayout::Tiles { .. })
    }

    /// Whether NewSubfileType marks this page as a reduced-resolution copy.
    pub fn is_reduced_resolution(&self) -> bool {
        self.subfile_type & 1 != 0
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.dtype.size_in_bytes()
    }

    /// Number of separately stored sample planes (1 unless planar).
    pub fn planes(&self) -> usize {
        if self.is_planar() {
            self.samples_per_pixel as usize
        } else {
            1
        }
    }

    /// Samples interleaved within one chunk.
    pub fn samples_per_chunk(&self) -> usize {
        if self.is_planar() {
            1
        } else {
            self.samples_per_pixel as usize
        }
    }

    /// Strips or tiles needed to cover one sample plane.
    pub fn chunks_per_plane(&self) -> usize {
        match &self.chunks {
            ChunkLayout::Strips { rows_per_strip, .. } => {
                (self.height as usize).div_ceil(*rows_per_strip as usize)
            }
            ChunkLayout::Tiles {
                tile_width,
                tile_height,
                ..
            } => {
                (self.width as usize).div_ceil(*tile_width as usize)
                    * (self.height as usize).div_ceil(*tile_height as usize)
            }
        }
    }
}
