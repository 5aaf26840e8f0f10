//! Lazily decoded planes and stacks.
//!
//! Nothing in this module decodes pixel data until one of the `force`
//! methods is called. Forcing never caches: each call decodes again from the
//! container, so repeated forcing returns identical arrays and leaves the
//! container untouched.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::container::Container;
use super::plane::{DType, Plane};
use crate::error::{DecodeError, OpenError};

// =============================================================================
// LazyPlane
// =============================================================================

/// A deferred decode of one page, with its shape and dtype already known.
#[derive(Clone)]
pub struct LazyPlane {
    container: Arc<dyn Container>,
    page: usize,
    shape: Vec<usize>,
    dtype: DType,
}

impl LazyPlane {
    pub fn new(container: Arc<dyn Container>, page: usize, shape: Vec<usize>, dtype: DType) -> Self {
        Self {
            container,
            page,
            shape,
            dtype,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Page index within the backing container.
    pub fn page(&self) -> usize {
        self.page
    }

    /// Identifier of the backing container.
    pub fn source(&self) -> &str {
        self.container.identifier()
    }

    /// Decode the page now.
    pub fn force(&self) -> Result<Plane, DecodeError> {
        debug!(
            source = self.container.identifier(),
            page = self.page,
            "decoding page"
        );
        self.container.decode(self.page)
    }
}

impl fmt::Debug for LazyPlane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyPlane")
            .field("source", &self.container.identifier())
            .field("page", &self.page)
            .field("shape", &self.shape)
            .field("dtype", &self.dtype)
            .finish()
    }
}

// =============================================================================
// LazyStack
// =============================================================================

/// Ordered lazy planes along a new leading axis.
///
/// Shape and dtype are reported from the first plane; the planes are assumed
/// to agree.
#[derive(Debug, Clone)]
pub struct LazyStack {
    planes: Vec<LazyPlane>,
}

impl LazyStack {
    /// Build a stack from at least one plane.
    pub fn new(planes: Vec<LazyPlane>) -> Result<Self, OpenError> {
        if planes.is_empty() {
            return Err(OpenError::Empty);
        }
        Ok(Self { planes })
    }

    /// Length of the leading axis.
    pub fn len(&self) -> usize {
        self.planes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    /// `[len, ..page shape]`
    pub fn shape(&self) -> Vec<usize> {
        let mut shape = Vec::with_capacity(self.frame_shape().len() + 1);
        shape.push(self.planes.len());
        shape.extend_from_slice(self.frame_shape());
        shape
    }

    /// Shape of one plane.
    pub fn frame_shape(&self) -> &[usize] {
        self.planes.first().map(|p| p.shape()).unwrap_or(&[])
    }

    pub fn dtype(&self) -> DType {
        self.planes.first().map(|p| p.dtype()).unwrap_or(DType::Uint8)
    }

    pub fn get(&self, index: usize) -> Option<&LazyPlane> {
        self.planes.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LazyPlane> {
        self.planes.iter()
    }

    /// Decode plane `index` and nothing else.
    pub fn force(&self, index: usize) -> Result<Plane, DecodeError> {
        self.planes
            .get(index)
            .ok_or(DecodeError::IndexOutOfRange {
                index,
                len: self.planes.len(),
            })?
            .force()
    }

    /// Decode every plane once and stack the results.
    ///
    /// # Errors
    /// The first decode error, or `DecodeError::Shape` when the decoded
    /// planes disagree in shape or dtype.
    pub fn force_all(&self) -> Result<Plane, DecodeError> {
        let planes = self
            .planes
            .iter()
            .map(LazyPlane::force)
            .collect::<Result<Vec<_>, _>>()?;
        Plane::stack(&planes)
    }
}

impl<'a> IntoIterator for &'a LazyStack {
    type Item = &'a LazyPlane;
    type IntoIter = std::slice::Iter<'a, LazyPlane>;

    fn into_iter(self) -> Self::IntoIter {
        self.planes.iter()
    }
}

// =============================================================================
// Stack
// =============================================================================

/// What opening an input returns: one bare plane, or a stack of planes.
///
/// A single page yields [`Stack::Single`] with no leading axis. The methods
/// on `Stack` treat both cases the same way, so callers that do not care can
/// ignore the distinction.
#[derive(Debug, Clone)]
pub enum Stack {
    Single(LazyPlane),
    Stacked(LazyStack),
}

impl Stack {
    pub fn shape(&self) -> Vec<usize> {
        match self {
            Stack::Single(plane) => plane.shape().to_vec(),
            Stack::Stacked(stack) => stack.shape(),
        }
    }

    pub fn dtype(&self) -> DType {
        match self {
            Stack::Single(plane) => plane.dtype(),
            Stack::Stacked(stack) => stack.dtype(),
        }
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Number of planes behind the stack.
    pub fn plane_count(&self) -> usize {
        match self {
            Stack::Single(_) => 1,
            Stack::Stacked(stack) => stack.len(),
        }
    }

    pub fn is_stacked(&self) -> bool {
        matches!(self, Stack::Stacked(_))
    }

    /// Lazy plane `index`; a single-plane result only has index 0.
    pub fn plane(&self, index: usize) -> Option<&LazyPlane> {
        match self {
            Stack::Single(plane) if index == 0 => Some(plane),
            Stack::Single(_) => None,
            Stack::Stacked(stack) => stack.get(index),
        }
    }

    /// Decode plane `index` alone.
    pub fn force(&self, index: usize) -> Result<Plane, DecodeError> {
        self.plane(index)
            .ok_or(DecodeError::IndexOutOfRange {
                index,
                len: self.plane_count(),
            })?
            .force()
    }

    /// Decode everything: the bare plane, or every plane stacked.
    pub fn force_all(&self) -> Result<Plane, DecodeError> {
        match self {
            Stack::Single(plane) => plane.force(),
            Stack::Stacked(stack) => stack.force_all(),
        }
    }

    /// Serializable summary.
    pub fn info(&self) -> StackInfo {
        StackInfo {
            shape: self.shape(),
            dtype: self.dtype(),
            planes: self.plane_count(),
            stacked: self.is_stacked(),
        }
    }
}

/// Shape summary of a [`Stack`], as printed by `pims info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackInfo {
    pub shape: Vec<usize>,
    pub dtype: DType,
    pub planes: usize,
    pub stacked: bool,
}

// =============================================================================
// Tests
// =============================================================================
