//! Capability dispatch: from an input to the reader that can open it.
//!
//! An [`Input`] is classified to a content-type key by name alone, the key
//! is looked up in a [`ReaderRegistry`], and the registered factory is asked
//! to construct a reader for the original input.

mod classify;
mod dispatcher;
mod input;
mod registry;

pub use classify::classify;
pub use dispatcher::Dispatcher;
pub use input::{Handle, Input};
pub use registry::ReaderRegistry;
