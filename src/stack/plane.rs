//! Decoded planes and their element types.

use std::fmt;

use ndarray::{ArrayD, Axis, IxDyn};
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::format::tiff::{
    ByteOrder, SAMPLE_FORMAT_FLOAT, SAMPLE_FORMAT_INT, SAMPLE_FORMAT_UINT, SAMPLE_FORMAT_VOID,
};

// =============================================================================
// DType
// =============================================================================

/// Element type shared by every page of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Uint8,
    Int8,
    Uint16,
    Int16,
    Uint32,
    Int32,
    Float32,
    Float64,
}

impl DType {
    /// Map TIFF BitsPerSample and SampleFormat to an element type.
    ///
    /// SampleFormat 4 (undefined) is read as unsigned. Returns `None` for
    /// combinations with no array element type, such as 1-bit or 12-bit data.
    pub fn from_tiff(bits_per_sample: u16, sample_format: u16) -> Option<Self> {
        match (bits_per_sample, sample_format) {
            (8, SAMPLE_FORMAT_UINT | SAMPLE_FORMAT_VOID) => Some(DType::Uint8),
            (8, SAMPLE_FORMAT_INT) => Some(DType::Int8),
            (16, SAMPLE_FORMAT_UINT | SAMPLE_FORMAT_VOID) => Some(DType::Uint16),
            (16, SAMPLE_FORMAT_INT) => Some(DType::Int16),
            (32, SAMPLE_FORMAT_UINT | SAMPLE_FORMAT_VOID) => Some(DType::Uint32),
            (32, SAMPLE_FORMAT_INT) => Some(DType::Int32),
            (32, SAMPLE_FORMAT_FLOAT) => Some(DType::Float32),
            (64, SAMPLE_FORMAT_FLOAT) => Some(DType::Float64),
            _ => None,
        }
    }

    /// Size of one element in bytes.
    pub const fn size_in_bytes(self) -> usize {
        match self {
            DType::Uint8 | DType::Int8 => 1,
            DType::Uint16 | DType::Int16 => 2,
            DType::Uint32 | DType::Int32 | DType::Float32 => 4,
            DType::Float64 => 8,
        }
    }

    /// Whether the type is a floating point type.
    pub const fn is_float(self) -> bool {
        matches!(self, DType::Float32 | DType::Float64)
    }

    pub const fn name(self) -> &'static str {
        match self {
            DType::Uint8 => "uint8",
            DType::Int8 => "int8",
            DType::Uint16 => "uint16",
            DType::Int16 => "int16",
            DType::Uint32 => "uint32",
            DType::Int32 => "int32",
            DType::Float32 => "float32",
            DType::Float64 => "float64",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Plane
// =============================================================================

/// A decoded page, or several decoded pages stacked along a new leading axis.
#[derive(Debug, Clone, PartialEq)]
pub enum Plane {
    Uint8(ArrayD<u8>),
    Int8(ArrayD<i8>),
    Uint16(ArrayD<u16>),
    Int16(ArrayD<i16>),
    Uint32(ArrayD<u32>),
    Int32(ArrayD<i32>),
    Float32(ArrayD<f32>),
    Float64(ArrayD<f64>),
}

/// Apply the same expression to the array inside any variant.
macro_rules! each_variant {
    ($plane:expr, $array:ident => $body:expr) => {
        match $plane {
            Plane::Uint8($array) => $body,
            Plane::Int8($array) => $body,
            Plane::Uint16($array) => $body,
            Plane::Int16($array) => $body,
            Plane::Uint32($array) => $body,
            Plane::Int32($array) => $body,
            Plane::Float32($array) => $body,
            Plane::Float64($array) => $body,
        }
    };
}

fn shape_error(err: ndarray::ShapeError) -> DecodeError {
    DecodeError::Shape {
        message: err.to_string(),
    }
}

/// Convert raw bytes into elements of a fixed width.
fn elements<T, const N: usize>(bytes: &[u8], convert: impl Fn([u8; N]) -> T) -> Vec<T> {
    bytes
        .chunks_exact(N)
        .map(|chunk| {
            let mut raw = [0u8; N];
            raw.copy_from_slice(chunk);
            convert(raw)
        })
        .collect()
}

macro_rules! from_raw {
    ($bytes:expr, $order:expr, $ty:ty, $n:literal) => {
        if $order.is_little_endian() {
            elements::<$ty, $n>($bytes, <$ty>::from_le_bytes)
        } else {
            elements::<$ty, $n>($bytes, <$ty>::from_be_bytes)
        }
    };
}

impl Plane {
    /// Build a plane from raw sample bytes in the given byte order.
    ///
    /// # Errors
    /// `DecodeError::Shape` if the byte count does not match `shape` and `dtype`.
    pub fn from_bytes(
        dtype: DType,
        shape: &[usize],
        bytes: &[u8],
        byte_order: ByteOrder,
    ) -> Result<Self, DecodeError> {
        let expected = shape.iter().product::<usize>() * dtype.size_in_bytes();
        if bytes.len() != expected {
            return Err(DecodeError::Shape {
                message: format!(
                    "{} bytes cannot fill a {} array of shape {:?}",
                    bytes.len(),
                    dtype,
                    shape
                ),
            });
        }

        let dim = IxDyn(shape);
        let plane = match dtype {
            DType::Uint8 => Plane::Uint8(ArrayD::from_shape_vec(dim, bytes.to_vec()).map_err(shape_error)?),
            DType::Int8 => Plane::Int8(
                ArrayD::from_shape_vec(dim, bytes.iter().map(|&b| b as i8).collect())
                    .map_err(shape_error)?,
            ),
            DType::Uint16 => Plane::Uint16(
                ArrayD::from_shape_vec(dim, from_raw!(bytes, byte_order, u16, 2)).map_err(shape_error)?,
            ),
            DType::Int16 => Plane::Int16(
                ArrayD::from_shape_vec(dim, from_raw!(bytes, byte_order, i16, 2)).map_err(shape_error)?,
            ),
            DType::Uint32 => Plane::Uint32(
                ArrayD::from_shape_vec(dim, from_raw!(bytes, byte_order, u32, 4)).map_err(shape_error)?,
            ),
            DType::Int32 => Plane::Int32(
                ArrayD::from_shape_vec(dim, from_raw!(bytes, byte_order, i32, 4)).map_err(shape_error)?,
            ),
            DType::Float32 => Plane::Float32(
                ArrayD::from_shape_vec(dim, from_raw!(bytes, byte_order, f32, 4)).map_err(shape_error)?,
            ),
            DType::Float64 => Plane::Float64(
                ArrayD::from_shape_vec(dim, from_raw!(bytes, byte_order, f64, 8)).map_err(shape_error)?,
            ),
        };
        Ok(plane)
    }

    pub fn dtype(&self) -> DType {
        match self {
            Plane::Uint8(_) => DType::Uint8,
            Plane::Int8(_) => DType::Int8,
            Plane::Uint16(_) => DType::Uint16,
            Plane::Int16(_) => DType::Int16,
            Plane::Uint32(_) => DType::Uint32,
            Plane::Int32(_) => DType::Int32,
            Plane::Float32(_) => DType::Float32,
            Plane::Float64(_) => DType::Float64,
        }
    }

    pub fn shape(&self) -> &[usize] {
        each_variant!(self, a => a.shape())
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        each_variant!(self, a => a.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy every element into a float array.
    pub fn to_f64(&self) -> ArrayD<f64> {
        each_variant!(self, a => a.mapv(|v| v as f64))
    }

    /// Borrow the array when the plane holds `u8` samples.
    pub fn as_u8(&self) -> Option<&ArrayD<u8>> {
        match self {
            Plane::Uint8(a) => Some(a),
            _ => None,
        }
    }

    /// Borrow the array when the plane holds `u16` samples.
    pub fn as_u16(&self) -> Option<&ArrayD<u16>> {
        match self {
            Plane::Uint16(a) => Some(a),
            _ => None,
        }
    }

    /// Borrow the array when the plane holds `f32` samples.
    pub fn as_f32(&self) -> Option<&ArrayD<f32>> {
        match self {
            Plane::Float32(a) => Some(a),
            _ => None,
        }
    }

    /// Stack planes along a new leading axis.
    ///
    /// # Errors
    /// `DecodeError::Shape` when the planes differ in dtype or shape, or
    /// when `planes` is empty.
    pub fn stack(planes: &[Plane]) -> Result<Plane, DecodeError> {
        let first = planes.first().ok_or_else(|| DecodeError::Shape {
            message: "cannot stack zero planes".to_string(),
        })?;

        macro_rules! stack_as {
            ($variant:ident) => {{
                let views = planes
                    .iter()
                    .map(|p| match p {
                        Plane::$variant(a) => Ok(a.view()),
                        other => Err(DecodeError::Shape {
                            message: format!(
                                "cannot stack {} plane onto {} planes",
                                other.dtype(),
                                first.dtype()
                            ),
                        }),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Plane::$variant(ndarray::stack(Axis(0), &views).map_err(shape_error)?)
            }};
        }

        Ok(match first {
            Plane::Uint8(_) => stack_as!(Uint8),
            Plane::Int8(_) => stack_as!(Int8),
            Plane::Uint16(_) => stack_as!(Uint16),
            Plane::Int16(_) => stack_as!(Int16),
            Plane::Uint32(_) => stack_as!(Uint32),
            Plane::Int32(_) => stack_as!(Int32),
            Plane::Float32(_) => stack_as!(Float32),
            Plane::Float64(_) => stack_as!(Float64),
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
