//! Lazy N-dimensional stacks of decoded pages.
//!
//! A reader backend opens its sources as [`Container`]s. [`assemble`] turns
//! the pages of those containers into a [`Stack`]: a single [`LazyPlane`]
//! when there is exactly one page, otherwise a [`LazyStack`] whose leading
//! axis enumerates pages. Decoding happens only when a plane is forced.

mod assemble;
mod container;
mod lazy;
mod plane;

pub use assemble::assemble;
pub use container::{Container, Page, Series};
pub use lazy::{LazyPlane, LazyStack, Stack, StackInfo};
pub use plane::{DType, Plane};
