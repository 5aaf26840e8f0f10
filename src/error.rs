use thiserror::Error;

/// I/O errors that can occur when reading from a local file or stream
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Error reported by the operating system
    #[error("I/O error on {identifier}: {message}")]
    Os { identifier: String, message: String },

    /// Requested range exceeds resource bounds
    #[error("Range out of bounds: requested {requested} bytes at offset {offset}, size is {size}")]
    RangeOutOfBounds {
        offset: u64,
        requested: u64,
        size: u64,
    },

    /// File not found
    #[error("File not found: {0}")]
    NotFound(String),
}

impl IoError {
    pub(crate) fn os(identifier: &str, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            return IoError::NotFound(identifier.to_string());
        }
        IoError::Os {
            identifier: identifier.to_string(),
            message: err.to_string(),
        }
    }
}

/// Errors that can occur when parsing TIFF files
#[derive(Debug, Clone, Error)]
pub enum TiffError {
    /// I/O error while reading the file
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Invalid TIFF magic bytes (not II or MM)
    #[error("Invalid TIFF magic bytes: expected 0x4949 (II) or 0x4D4D (MM), got 0x{0:04X}")]
    InvalidMagic(u16),

    /// Invalid TIFF version number
    #[error("Invalid TIFF version: expected 42 (TIFF) or 43 (BigTIFF), got {0}")]
    InvalidVersion(u16),

    /// Invalid BigTIFF offset byte size (must be 8)
    #[error("Invalid BigTIFF offset byte size: expected 8, got {0}")]
    InvalidBigTiffOffsetSize(u16),

    /// File is too small to contain a valid TIFF header
    #[error("File too small: need at least {required} bytes, got {actual}")]
    FileTooSmall { required: u64, actual: u64 },

    /// Invalid IFD offset (points outside file or to invalid location)
    #[error("Invalid IFD offset: {0}")]
    InvalidIfdOffset(u64),

    /// The IFD chain points back to an IFD that was already read
    #[error("IFD chain loops back to offset {0}")]
    IfdCycle(u64),

    /// The IFD chain is longer than the configured page limit
    #[error("Too many pages: limit is {0}")]
    TooManyPages(usize),

    /// Required tag is missing from IFD
    #[error("Missing required tag: {0}")]
    MissingTag(&'static str),

    /// Tag has unexpected type or count
    #[error("Invalid tag value for {tag}: {message}")]
    InvalidTagValue { tag: &'static str, message: String },

    /// Bit depth / sample format combination with no array element type
    #[error("Unsupported sample format: {bits} bits per sample, format {format}")]
    UnsupportedSampleFormat { bits: u16, format: u16 },

    /// Samples of one pixel do not share a bit depth
    #[error("Mixed bits per sample are not supported: {0:?}")]
    MixedBitsPerSample(Vec<u16>),

    /// Unknown field type in IFD entry
    #[error("Unknown field type: {0}")]
    UnknownFieldType(u16),
}

/// The content type of an input could not be derived from its name
#[derive(Debug, Clone, Error)]
pub enum ClassificationError {
    /// Handle input without an associated name
    #[error("Expected a file path, glob pattern, or handle with a name; no name available to infer type")]
    NoName,

    /// The MIME registry has no type for the name
    #[error("Could not detect content type of {input}")]
    Undeterminable { input: String },
}

/// A content type was derived but no single reader is registered for it
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// Nothing registered for the content type
    #[error("No reader registered for content type {content_type}")]
    NoReader { content_type: String },

    /// More than one reader registered for the content type
    #[error("Ambiguous readers for content type {content_type}: {}", readers.join(", "))]
    Ambiguous {
        content_type: String,
        readers: Vec<String>,
    },
}

/// Errors raised while resolving an input and opening its containers
#[derive(Debug, Clone, Error)]
pub enum OpenError {
    /// I/O error while opening a source
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// A source is not a valid container
    #[error("TIFF error: {0}")]
    Tiff(#[from] TiffError),

    /// A glob pattern matched no files
    #[error("No files match {pattern}")]
    NoMatches { pattern: String },

    /// A glob pattern could not be interpreted
    #[error("Invalid glob pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A container exposes more than one page series
    #[error("Malformed container {identifier}: expected exactly one series, found {series_count}")]
    MalformedContainer {
        identifier: String,
        series_count: usize,
    },

    /// The opened containers hold no pages at all
    #[error("Nothing to stack: the opened containers hold no pages")]
    Empty,
}

/// Errors raised when a lazy plane is forced
#[derive(Debug, Clone, Error)]
pub enum DecodeError {
    /// I/O error while reading page data
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Compression scheme with no decoder
    #[error("Unsupported compression: {0}")]
    UnsupportedCompression(u16),

    /// Predictor with no decoder
    #[error("Unsupported predictor {predictor} for {bits}-bit samples")]
    UnsupportedPredictor { predictor: u16, bits: u16 },

    /// Compressed data is inconsistent with the page layout
    #[error("Corrupt page data in {identifier}: {message}")]
    Corrupt { identifier: String, message: String },

    /// The JPEG decoder rejected a chunk
    #[error("JPEG decode error: {message}")]
    Jpeg { message: String },

    /// Decoded samples do not fit the declared shape, or planes cannot be stacked
    #[error("Shape error: {message}")]
    Shape { message: String },

    /// Plane index beyond the stack
    #[error("Plane index {index} out of range for stack of {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Crate-level error returned by [`crate::open`] and the dispatcher
#[derive(Debug, Clone, Error)]
pub enum PimsError {
    #[error(transparent)]
    Classification(#[from] ClassificationError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Open(#[from] OpenError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<TiffError> for PimsError {
    fn from(err: TiffError) -> Self {
        PimsError::Open(OpenError::Tiff(err))
    }
}

impl From<IoError> for PimsError {
    fn from(err: IoError) -> Self {
        PimsError::Open(OpenError::Io(err))
    }
}
