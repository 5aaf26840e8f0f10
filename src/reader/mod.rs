//! Reader backends.
//!
//! A backend is registered with the dispatcher as a [`ReaderFactory`] under a
//! content type. Constructing a reader opens every source of the input as a
//! container; [`Reader::read`] then assembles the lazy stack. Pixel data is
//! only decoded when a plane of that stack is forced.
//!
//! [`opener`] holds the source resolution shared by backends: file paths,
//! glob expansion, open handles, and the one-series-per-container check.

pub mod glob;
pub mod opener;
mod tiff;

pub use glob::expand;
pub use opener::{check_single_series, open_source, resolve_sources, Source};
pub use tiff::{TiffReader, TiffReaderFactory};

use std::fmt;

use serde_json::{Map, Value};

use crate::config::ReaderConfig;
use crate::dispatch::Input;
use crate::error::PimsError;
use crate::stack::Stack;

/// Constructs readers for one family of content types.
pub trait ReaderFactory: Send + Sync {
    /// Short name reported when a content type has several registrations.
    fn name(&self) -> &str;

    /// Open `input` and return a reader over it.
    ///
    /// # Errors
    ///
    /// Fails when the input cannot be resolved to sources or a source cannot
    /// be opened as a container.
    fn construct(&self, input: Input, config: &ReaderConfig) -> Result<Box<dyn Reader>, PimsError>;
}

/// An opened input.
pub trait Reader: fmt::Display + Send + Sync {
    /// Assemble the lazy stack. Nothing is decoded.
    fn read(&self) -> Result<Stack, PimsError>;

    /// Descriptive metadata of the input as a JSON object.
    fn metadata(&self) -> &Map<String, Value>;

    /// Human-readable description, e.g. `TiffReader("coffee.tif")`.
    fn describe(&self) -> String {
        self.to_string()
    }
}

impl fmt::Debug for dyn Reader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}
