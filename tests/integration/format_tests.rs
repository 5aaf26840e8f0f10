//! TIFF container tests: byte orders, BigTIFF, chunk layouts, codecs and
//! structural faults.

use std::sync::Arc;

use ndarray::{ArrayD, IxDyn};
use pims::format::tiff::{TiffContainer, DEFAULT_MAX_PAGES};
use pims::io::MemoryReader;
use pims::{Container, DType, DecodeError, Plane, TiffError};

use super::test_utils::*;

fn open(data: Vec<u8>) -> Result<TiffContainer, TiffError> {
    TiffContainer::open(Arc::new(MemoryReader::new(data, "mem://test.tif")), DEFAULT_MAX_PAGES)
}

fn expected_gray(page: u32, width: u32, height: u32) -> ArrayD<u8> {
    ArrayD::from_shape_fn(IxDyn(&[height as usize, width as usize]), |ix| {
        gray_at(page, ix[1] as u32, ix[0] as u32)
    })
}

fn decode_u8(container: &TiffContainer, page: usize) -> ArrayD<u8> {
    container
        .decode(page)
        .unwrap()
        .as_u8()
        .expect("u8 plane")
        .clone()
}

// =============================================================================
// Byte Order and BigTIFF
// =============================================================================

#[test]
fn test_little_and_big_endian_decode_identically() {
    for order in [ByteOrderType::LittleEndian, ByteOrderType::BigEndian] {
        let data = TiffBuilder::new()
            .with_byte_order(order)
            .add_page(gray_page(0, 20, 12).with_strips(5))
            .build();
        let container = open(data).unwrap();

        assert_eq!(container.pages().len(), 1);
        assert_eq!(decode_u8(&container, 0), expected_gray(0, 20, 12), "{order:?}");
    }
}

#[test]
fn test_bigtiff_decodes_like_classic() {
    for order in [ByteOrderType::LittleEndian, ByteOrderType::BigEndian] {
        let data = TiffBuilder::new()
            .with_byte_order(order)
            .with_bigtiff(true)
            .add_pages((0..3).map(|p| gray_page(p, 16, 9)))
            .build();
        let container = open(data).unwrap();

        assert!(container.header().is_bigtiff);
        assert_eq!(container.pages().len(), 3);
        for page in 0..3 {
            assert_eq!(decode_u8(&container, page), expected_gray(page as u32, 16, 9));
        }
    }
}

#[test]
fn test_sixteen_bit_big_endian_samples() {
    let fill = |x: u32, y: u32| (x * 1000 + y) as u16;
    let data = TiffBuilder::new()
        .with_byte_order(ByteOrderType::BigEndian)
        .add_page(PageBuilder::gray16(7, 5, fill))
        .build();
    let container = open(data).unwrap();

    let plane = container.decode(0).unwrap();
    assert_eq!(plane.dtype(), DType::Uint16);
    let array = plane.as_u16().unwrap();
    assert_eq!(array[[4, 6]], fill(6, 4));
    assert_eq!(array[[0, 1]], 1000);
}

#[test]
fn test_float_samples() {
    let fill = |x: u32, y: u32| x as f32 * 0.5 - y as f32;
    let data = TiffBuilder::new()
        .with_byte_order(ByteOrderType::BigEndian)
        .add_page(PageBuilder::float32(4, 3, fill))
        .build();
    let container = open(data).unwrap();

    let plane = container.decode(0).unwrap();
    assert_eq!(plane.dtype(), DType::Float32);
    assert_eq!(plane.as_f32().unwrap()[[2, 3]], 1.5 - 2.0);
}

// =============================================================================
// Chunk Layouts
// =============================================================================

#[test]
fn test_partial_last_strip() {
    let data = TiffBuilder::new()
        .add_page(gray_page(2, 9, 10).with_strips(3))
        .build();
    let container = open(data).unwrap();
    assert_eq!(decode_u8(&container, 0), expected_gray(2, 9, 10));
}

#[test]
fn test_tiles_with_clipped_edges() {
    let data = TiffBuilder::new()
        .add_page(gray_page(1, 37, 23).with_tiles(16, 16))
        .build();
    let container = open(data).unwrap();

    assert!(container.pages()[0].is_tiled());
    assert_eq!(decode_u8(&container, 0), expected_gray(1, 37, 23));
}

#[test]
fn test_chunky_rgb_shape() {
    let fill = |x: u32, y: u32| [x as u8, y as u8, (x + y) as u8];
    let data = TiffBuilder::new()
        .add_page(PageBuilder::rgb8(6, 4, fill).with_strips(2))
        .build();
    let container = open(data).unwrap();

    let plane = container.decode(0).unwrap();
    assert_eq!(plane.shape(), &[4, 6, 3]);
    let array = plane.as_u8().unwrap();
    assert_eq!(array[[3, 5, 0]], 5);
    assert_eq!(array[[3, 5, 1]], 3);
    assert_eq!(array[[3, 5, 2]], 8);
}

#[test]
fn test_planar_rgb_shape() {
    let fill = |x: u32, y: u32| [x as u8, y as u8, 200];
    let data = TiffBuilder::new()
        .add_page(PageBuilder::rgb8(6, 4, fill).planar().with_tiles(16, 16))
        .build();
    let container = open(data).unwrap();

    let plane = container.decode(0).unwrap();
    assert_eq!(plane.shape(), &[3, 4, 6]);
    let array = plane.as_u8().unwrap();
    assert_eq!(array[[0, 2, 5]], 5);
    assert_eq!(array[[1, 2, 5]], 2);
    assert_eq!(array[[2, 2, 5]], 200);
}

// =============================================================================
// Compression and Predictor
// =============================================================================

#[test]
fn test_packbits_and_deflate() {
    for compression in [COMPRESSION_PACKBITS, COMPRESSION_DEFLATE] {
        let data = TiffBuilder::new()
            .add_page(
                gray_page(3, 300, 7)
                    .with_strips(2)
                    .with_compression(compression),
            )
            .build();
        let container = open(data).unwrap();
        assert_eq!(
            decode_u8(&container, 0),
            expected_gray(3, 300, 7),
            "compression {compression}"
        );
    }
}

#[test]
fn test_deflate_tiles_with_predictor() {
    let data = TiffBuilder::new()
        .with_byte_order(ByteOrderType::BigEndian)
        .add_page(
            gray_page(4, 40, 30)
                .with_tiles(16, 16)
                .with_compression(COMPRESSION_DEFLATE)
                .with_predictor(),
        )
        .build();
    let container = open(data).unwrap();
    assert_eq!(decode_u8(&container, 0), expected_gray(4, 40, 30));
}

#[test]
fn test_predictor_on_rgb_and_sixteen_bit() {
    let data = TiffBuilder::new()
        .add_page(
            PageBuilder::rgb8(5, 3, |x, y| [x as u8 * 40, 255 - y as u8, 7])
                .with_compression(COMPRESSION_DEFLATE)
                .with_predictor(),
        )
        .add_page(
            PageBuilder::gray16(5, 3, |x, y| 60_000 - (x * 700 + y) as u16)
                .with_compression(COMPRESSION_DEFLATE)
                .with_predictor(),
        )
        .build();
    let container = open(data).unwrap();

    let rgb = container.decode(0).unwrap();
    assert_eq!(rgb.as_u8().unwrap()[[2, 4, 0]], 160);
    assert_eq!(rgb.as_u8().unwrap()[[2, 4, 1]], 253);

    let gray = container.decode(1).unwrap();
    assert_eq!(gray.as_u16().unwrap()[[2, 4]], 60_000 - 2802);
}

#[test]
fn test_jpeg_tiles() {
    let smooth = |x: u32, y: u32| (x + y) as u8 * 2;
    let data = TiffBuilder::new()
        .add_page(
            PageBuilder::gray8(64, 32, smooth)
                .with_tiles(32, 32)
                .with_compression(COMPRESSION_JPEG),
        )
        .build();
    let container = open(data).unwrap();

    let plane = container.decode(0).unwrap();
    assert_eq!(plane.shape(), &[32, 64]);
    let array = plane.as_u8().unwrap();
    for (y, x) in [(0u32, 0u32), (20, 30), (31, 63)] {
        let actual = array[[y as usize, x as usize]];
        let expected = smooth(x, y);
        assert!(
            actual.abs_diff(expected) <= 4,
            "pixel ({x}, {y}): {actual} vs {expected}"
        );
    }
}

#[test]
fn test_unsupported_compression_fails_only_at_decode() {
    let data = TiffBuilder::new()
        .add_page(gray_page(0, 8, 8).with_compression(34712))
        .build();

    let container = open(data).expect("structure parses without touching pixel data");
    assert!(matches!(
        container.decode(0),
        Err(DecodeError::UnsupportedCompression(34712))
    ));
}

#[test]
fn test_decode_page_out_of_range() {
    let container = open(multipage_tiff(2, 4, 4)).unwrap();
    assert!(matches!(
        container.decode(2),
        Err(DecodeError::IndexOutOfRange { index: 2, len: 2 })
    ));
}

// =============================================================================
// IFD Chain
// =============================================================================

#[test]
fn test_ifd_cycle_is_rejected() {
    let data = TiffBuilder::new()
        .add_pages((0..2).map(|p| gray_page(p, 4, 4)))
        .with_cycle()
        .build();
    assert!(matches!(open(data), Err(TiffError::IfdCycle(_))));
}

#[test]
fn test_dangling_next_offset_is_rejected() {
    let data = TiffBuilder::new()
        .add_page(gray_page(0, 4, 4))
        .with_dangling_next(1 << 30)
        .build();
    assert!(matches!(open(data), Err(TiffError::InvalidIfdOffset(_))));
}

#[test]
fn test_page_limit() {
    let data = multipage_tiff(5, 4, 4);
    let result = TiffContainer::open(Arc::new(MemoryReader::new(data, "mem://five.tif")), 3);
    assert!(matches!(result, Err(TiffError::TooManyPages(3))));
}

#[test]
fn test_not_a_tiff() {
    let result = open(b"GIF89a-not-a-tiff".to_vec());
    assert!(matches!(result, Err(TiffError::InvalidMagic(_))));
}

// =============================================================================
// Series and Metadata
// =============================================================================

#[test]
fn test_uniform_pages_form_one_series() {
    let container = open(multipage_tiff(4, 6, 5)).unwrap();
    let series = container.series();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].len(), 4);
    assert_eq!(series[0].dtype, DType::Uint8);
    assert_eq!(series[0].pages[3].shape, vec![5, 6]);
}

#[test]
fn test_reduced_resolution_page_starts_new_series() {
    let data = TiffBuilder::new()
        .add_pages((0..3).map(|p| gray_page(p, 8, 8)))
        .add_page(gray_page(3, 4, 4).reduced())
        .build();
    let container = open(data).unwrap();
    assert_eq!(container.series().len(), 2);
    assert_eq!(container.series()[1].pages[0].index, 3);
}

#[test]
fn test_metadata_from_first_page() {
    let data = TiffBuilder::new()
        .add_page(
            gray_page(0, 4, 4)
                .with_description("ImageJ=1.54f\nimages=2")
                .with_software("pims-tests"),
        )
        .add_page(gray_page(1, 4, 4).with_description("second page"))
        .build();
    let container = open(data).unwrap();

    let metadata = container.metadata();
    assert_eq!(metadata["ImageDescription"], "ImageJ=1.54f\nimages=2");
    assert_eq!(metadata["Software"], "pims-tests");
}

#[test]
fn test_decoded_plane_type() {
    let container = open(multipage_tiff(1, 3, 2)).unwrap();
    assert!(matches!(container.decode(0).unwrap(), Plane::Uint8(_)));
}
