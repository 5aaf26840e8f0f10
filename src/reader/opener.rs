//! Resolving an input to the sources a backend opens.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use super::glob::expand;
use crate::config::ReaderConfig;
use crate::dispatch::{Handle, Input};
use crate::error::OpenError;
use crate::io::{BlockCache, LocalReader, RangeReader};
use crate::stack::Container;

/// Identifier given to a handle opened without a name.
const UNNAMED_HANDLE: &str = "<stream>";

/// One concrete byte source: a file on disk or an open stream.
pub enum Source {
    File(PathBuf),
    Handle(Handle),
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::File(path) => f.debug_tuple("File").field(path).finish(),
            Source::Handle(handle) => f.debug_tuple("Handle").field(handle).finish(),
        }
    }
}

/// Resolve an input to its sources, in stacking order.
///
/// - a path naming an existing file is one source;
/// - any other path, and every glob pattern, is expanded; each match is one
///   source, ordered by `config.glob_order`;
/// - a handle is one source.
///
/// # Errors
///
/// Returns `NoMatches` when expansion finds no files and `InvalidPattern`
/// when the pattern cannot be interpreted.
pub fn resolve_sources(input: Input, config: &ReaderConfig) -> Result<Vec<Source>, OpenError> {
    let pattern = match input {
        Input::Handle(handle) => return Ok(vec![Source::Handle(handle)]),
        Input::Path(path) if path.is_file() => return Ok(vec![Source::File(path)]),
        Input::Path(path) => path.to_string_lossy().into_owned(),
        Input::Glob(pattern) => pattern,
    };

    let matches = expand(&pattern, config.glob_order)?;
    if matches.is_empty() {
        return Err(OpenError::NoMatches { pattern });
    }
    debug!(pattern = %pattern, sources = matches.len(), "resolved sources");
    Ok(matches.into_iter().map(Source::File).collect())
}

/// Open one source as a cached range reader.
pub fn open_source(source: Source, config: &ReaderConfig) -> Result<Arc<dyn RangeReader>, OpenError> {
    let reader = match source {
        Source::File(path) => LocalReader::open(&path)?,
        Source::Handle(handle) => {
            let identifier = handle.name.unwrap_or_else(|| UNNAMED_HANDLE.to_string());
            LocalReader::from_stream(handle.stream, identifier)?
        }
    };
    Ok(Arc::new(BlockCache::with_capacity(
        reader,
        config.block_size,
        config.cache_blocks,
    )))
}

/// Check that a container exposes exactly one page series.
///
/// # Errors
///
/// Returns `MalformedContainer` with the number of series found otherwise.
pub fn check_single_series(container: &dyn Container) -> Result<(), OpenError> {
    let series_count = container.series().len();
    if series_count != 1 {
        return Err(OpenError::MalformedContainer {
            identifier: container.identifier().to_string(),
            series_count,
        });
    }
    Ok(())
}
