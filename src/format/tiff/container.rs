//! An opened TIFF file as a lazily decodable [`Container`].
//!
//! Opening walks the IFD chain and records a [`PageLayout`] per page. No
//! strip or tile is read until [`Container::decode`] is called for its page.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::error::{DecodeError, TiffError};
use crate::format::compression::{inflate, lzw_decode, undo_horizontal_predictor, unpack_bits};
use crate::format::jpeg;
use crate::io::RangeReader;
use crate::stack::{Container, DType, Plane, Series};

use super::metadata::page_metadata;
use super::page::{ChunkLayout, PageLayout};
use super::parser::{Ifd, TiffHeader, BIGTIFF_HEADER_SIZE};
use super::series::group_series;
use super::tags::{Compression, PREDICTOR_HORIZONTAL, PREDICTOR_NONE};
use super::values::ValueReader;

/// Default upper bound on the number of pages read from one file.
pub const DEFAULT_MAX_PAGES: usize = 65_536;

/// A TIFF or BigTIFF file opened for lazy page decoding.
pub struct TiffContainer {
    reader: Arc<dyn RangeReader>,
    header: TiffHeader,
    pages: Vec<PageLayout>,
    series: Vec<Series>,
    metadata: Map<String, Value>,
}

impl TiffContainer {
    /// Parse the header and every IFD of the file.
    ///
    /// # Errors
    /// - header errors (`InvalidMagic`, `InvalidVersion`, ...)
    /// - `TooManyPages` when the chain is longer than `max_pages`
    /// - `IfdCycle` when an IFD offset repeats
    /// - any error building a page layout
    pub fn open(reader: Arc<dyn RangeReader>, max_pages: usize) -> Result<Self, TiffError> {
        let size = reader.size();
        let header_len = size.min(BIGTIFF_HEADER_SIZE as u64) as usize;
        let header_bytes = reader.read_exact_at(0, header_len)?;
        let header = TiffHeader::parse(&header_bytes, size)?;

        let values = ValueReader::new(reader.as_ref(), &header);
        let mut pages = Vec::new();
        let mut metadata = Map::new();
        let mut seen = HashSet::new();
        let mut offset = header.first_ifd_offset;

        while offset != 0 {
            if pages.len() >= max_pages {
                return Err(TiffError::TooManyPages(max_pages));
            }
            if !seen.insert(offset) {
                return Err(TiffError::IfdCycle(offset));
            }
            if offset >= size {
                return Err(TiffError::InvalidIfdOffset(offset));
            }

            let ifd = read_ifd(reader.as_ref(), &header, offset)?;
            if pages.is_empty() {
                metadata = page_metadata(&ifd, &values);
            }
            let page = PageLayout::from_ifd(&ifd, pages.len(), &values)?;
            trace!(
                source = reader.identifier(),
                page = page.index,
                width = page.width,
                height = page.height,
                compression = page.compression,
                "parsed page"
            );
            pages.push(page);
            offset = ifd.next_ifd_offset;
        }

        let series = group_series(&pages);
        debug!(
            source = reader.identifier(),
            bigtiff = header.is_bigtiff,
            pages = pages.len(),
            series = series.len(),
            "opened TIFF container"
        );

        Ok(Self {
            reader,
            header,
            pages,
            series,
            metadata,
        })
    }

    pub fn header(&self) -> &TiffHeader {
        &self.header
    }

    /// Layout of every page in IFD order.
    pub fn pages(&self) -> &[PageLayout] {
        &self.pages
    }

    /// Descriptive tags of the first page.
    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    fn corrupt(&self, message: impl Into<String>) -> DecodeError {
        DecodeError::Corrupt {
            identifier: self.reader.identifier().to_string(),
            message: message.into(),
        }
    }

    fn check_codec(&self, layout: &PageLayout) -> Result<Compression, DecodeError> {
        let compression = Compression::from_u16(layout.compression)
            .filter(|c| c.is_supported())
            .ok_or(DecodeError::UnsupportedCompression(layout.compression))?;

        let predictor_ok = match layout.predictor {
            PREDICTOR_NONE => true,
            PREDICTOR_HORIZONTAL => {
                !layout.dtype.is_float() && layout.bytes_per_sample() <= 4
            }
            _ => false,
        };
        if !predictor_ok {
            return Err(DecodeError::UnsupportedPredictor {
                predictor: layout.predictor,
                bits: layout.bits_per_sample,
            });
        }

        if compression == Compression::Jpeg && layout.dtype != DType::Uint8 {
            return Err(DecodeError::Jpeg {
                message: format!("JPEG pages must be 8-bit, found {}", layout.dtype),
            });
        }
        Ok(compression)
    }

    /// Read and decompress one chunk to at least `expected` bytes.
    ///
    /// `row_len` is the chunk width in pixels, used to undo the predictor.
    fn read_chunk(
        &self,
        layout: &PageLayout,
        compression: Compression,
        chunk: usize,
        expected: usize,
        row_len: usize,
    ) -> Result<Vec<u8>, DecodeError> {
        let offset = layout.chunks.offsets()[chunk];
        let byte_count = layout.chunks.byte_counts()[chunk];
        if byte_count == 0 {
            // Sparse chunk
            return Ok(vec![0; expected]);
        }
        let len = usize::try_from(byte_count)
            .map_err(|_| self.corrupt(format!("chunk {chunk} is {byte_count} bytes")))?;
        let raw = self.reader.read_exact_at(offset, len)?;

        let mut data = match compression {
            Compression::None => raw.to_vec(),
            Compression::PackBits => unpack_bits(&raw, expected).map_err(|m| self.corrupt(m))?,
            Compression::Lzw => lzw_decode(&raw, expected).map_err(|m| self.corrupt(m))?,
            Compression::Deflate | Compression::AdobeDeflate => {
                inflate(&raw, expected).map_err(|m| self.corrupt(m))?
            }
            Compression::Jpeg => jpeg::decode_chunk(
                layout.jpeg_tables.as_deref(),
                &raw,
                layout.samples_per_chunk(),
            )?,
            Compression::OldJpeg | Compression::Jpeg2000 => {
                return Err(DecodeError::UnsupportedCompression(layout.compression))
            }
        };

        if data.len() < expected {
            return Err(self.corrupt(format!(
                "chunk {chunk} decoded to {} bytes, expected {expected}",
                data.len()
            )));
        }

        if layout.predictor == PREDICTOR_HORIZONTAL && compression != Compression::Jpeg {
            undo_horizontal_predictor(
                &mut data[..expected],
                row_len,
                layout.samples_per_chunk(),
                layout.bytes_per_sample(),
                self.header.byte_order,
            )?;
        }

        Ok(data)
    }

    /// Decode a page into one buffer laid out as `[plane][row][column][sample]`.
    fn decode_samples(&self, layout: &PageLayout) -> Result<Vec<u8>, DecodeError> {
        let compression = self.check_codec(layout)?;

        let width = layout.width as usize;
        let height = layout.height as usize;
        let pixel_bytes = layout.samples_per_chunk() * layout.bytes_per_sample();
        let plane_bytes = width * height * pixel_bytes;
        let per_plane = layout.chunks_per_plane();
        let mut out = vec![0u8; plane_bytes * layout.planes()];

        match &layout.chunks {
            ChunkLayout::Strips { rows_per_strip, .. } => {
                let rows_per_strip = *rows_per_strip as usize;
                for plane in 0..layout.planes() {
                    for strip in 0..per_plane {
                        let first_row = strip * rows_per_strip;
                        let rows = rows_per_strip.min(height - first_row);
                        let expected = rows * width * pixel_bytes;
                        let data = self.read_chunk(
                            layout,
                            compression,
                            plane * per_plane + strip,
                            expected,
                            width,
                        )?;

                        let start = plane * plane_bytes + first_row * width * pixel_bytes;
                        out[start..start + expected].copy_from_slice(&data[..expected]);
                    }
                }
            }
            ChunkLayout::Tiles {
                tile_width,
                tile_height,
                ..
            } => {
                let (tile_width, tile_height) = (*tile_width as usize, *tile_height as usize);
                let across = width.div_ceil(tile_width);
                let tile_row_bytes = tile_width * pixel_bytes;
                let expected = tile_row_bytes * tile_height;

                for plane in 0..layout.planes() {
                    for tile in 0..per_plane {
                        let (tile_y, tile_x) = (tile / across, tile % across);
                        let data = self.read_chunk(
                            layout,
                            compression,
                            plane * per_plane + tile,
                            expected,
                            tile_width,
                        )?;

                        // Edge tiles are padded; copy only the part inside the page
                        let rows = tile_height.min(height - tile_y * tile_height);
                        let row_bytes = tile_width.min(width - tile_x * tile_width) * pixel_bytes;
                        for r in 0..rows {
                            let src = r * tile_row_bytes;
                            let dst = plane * plane_bytes
                                + ((tile_y * tile_height + r) * width + tile_x * tile_width)
                                    * pixel_bytes;
                            out[dst..dst + row_bytes].copy_from_slice(&data[src..src + row_bytes]);
                        }
                    }
                }
            }
        }

        Ok(out)
    }
}

fn read_ifd(reader: &dyn RangeReader, header: &TiffHeader, offset: u64) -> Result<Ifd, TiffError> {
    let count_bytes = reader.read_exact_at(offset, header.ifd_count_size())?;
    let entry_count = if header.is_bigtiff {
        header.byte_order.read_u64(&count_bytes)
    } else {
        header.byte_order.read_u16(&count_bytes) as u64
    };

    let ifd_size = Ifd::calculate_size(entry_count, header);
    let ifd_bytes = reader.read_exact_at(offset, ifd_size)?;
    Ifd::parse(&ifd_bytes, header)
}

impl Container for TiffContainer {
    fn identifier(&self) -> &str {
        self.reader.identifier()
    }

    fn series(&self) -> &[Series] {
        &self.series
    }

    fn decode(&self, page: usize) -> Result<Plane, DecodeError> {
        let layout = self.pages.get(page).ok_or(DecodeError::IndexOutOfRange {
            index: page,
            len: self.pages.len(),
        })?;

        let samples = self.decode_samples(layout)?;
        Plane::from_bytes(
            layout.dtype,
            &layout.shape(),
            &samples,
            self.header.byte_order,
        )
    }
}

impl std::fmt::Debug for TiffContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TiffContainer")
            .field("identifier", &self.reader.identifier())
            .field("bigtiff", &self.header.is_bigtiff)
            .field("pages", &self.pages.len())
            .field("series", &self.series.len())
            .finish()
    }
}
