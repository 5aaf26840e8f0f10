//! # pims
//!
//! Open image files, glob patterns and byte streams as lazy N-dimensional
//! stacks.
//!
//! An input is classified by the content type its name implies, handed to
//! the reader backend registered for that type, and exposed as a [`Stack`]
//! whose planes are decoded only when forced. A directory of single-page
//! files, one multi-page file, or a mix of both all become one stack with
//! the plane index as its leading axis.
//!
//! ## Architecture
//!
//! - [`mime`] - content type lookup by file name
//! - [`dispatch`] - input classification, reader registry and dispatcher
//! - [`reader`] - reader backends and source resolution (paths, globs, handles)
//! - [`stack`] - containers, lazy planes and stack assembly
//! - [`mod@format`] - TIFF parsing and chunk codecs
//! - [`io`] - byte-range readers with block caching
//! - [`config`] - reader options and CLI types
//!
//! ## Example
//!
//! ```rust,no_run
//! use pims::Stack;
//!
//! let stack = pims::open("timelapse/*.tif")?;
//! println!("shape {:?}, dtype {}", stack.shape(), stack.dtype());
//!
//! if let Stack::Stacked(frames) = &stack {
//!     let fifth = frames.force(4)?;
//!     println!("frame 4 has {} samples", fifth.len());
//! }
//! # Ok::<(), pims::PimsError>(())
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod io;
pub mod mime;
pub mod reader;
pub mod stack;

// Re-export commonly used types
pub use config::{GlobOrder, ReaderConfig};
pub use dispatch::{classify, Dispatcher, Handle, Input, ReaderRegistry};
pub use error::{
    ClassificationError, DecodeError, DispatchError, IoError, OpenError, PimsError, TiffError,
};
pub use reader::{Reader, ReaderFactory, TiffReader, TiffReaderFactory};
pub use stack::{assemble, Container, DType, LazyPlane, LazyStack, Page, Plane, Series, Stack};

/// Open an input with the default configuration.
///
/// Accepts anything convertible to an [`Input`]: a path, a glob pattern
/// string, or an `Input::Handle`.
///
/// # Errors
///
/// Returns the classification, dispatch or open error that stopped it.
/// Decode errors only surface when planes are forced.
pub fn open(input: impl Into<Input>) -> Result<Stack, PimsError> {
    open_with(input, &ReaderConfig::default())
}

/// Open an input with explicit reader options.
pub fn open_with(input: impl Into<Input>, config: &ReaderConfig) -> Result<Stack, PimsError> {
    config.validate().map_err(PimsError::Config)?;
    Dispatcher::global().open(input.into(), config)
}
