//! Image formats.
//!
//! TIFF is the one container format implemented here. [`compression`] and
//! [`jpeg`] hold the chunk codecs its pages use.

pub mod compression;
pub mod jpeg;
pub mod tiff;
