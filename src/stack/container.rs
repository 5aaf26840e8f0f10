//! The decoder capability a reader backend exposes to the stack assembler.

use super::plane::{DType, Plane};
use crate::error::DecodeError;

/// One addressable page of a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Index accepted by [`Container::decode`]
    pub index: usize,
    /// Shape of the decoded page
    pub shape: Vec<usize>,
}

/// An ordered run of pages sharing one dtype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    pub dtype: DType,
    pub pages: Vec<Page>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// An opened, decodable unit backed by exactly one source.
///
/// Opening a container reads its structure only. Pixel data is read and
/// decoded by [`Container::decode`], which may be called any number of times
/// and from several threads at once.
pub trait Container: Send + Sync {
    /// Name of the backing source, for logging and error messages.
    fn identifier(&self) -> &str;

    /// Page series found in the container.
    fn series(&self) -> &[Series];

    /// Decode one page.
    fn decode(&self, page: usize) -> Result<Plane, DecodeError>;
}
