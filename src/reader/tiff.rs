//! The TIFF reader backend, registered for `image/tiff`.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info};

use super::opener::{check_single_series, open_source, resolve_sources};
use super::{Reader, ReaderFactory};
use crate::config::ReaderConfig;
use crate::dispatch::Input;
use crate::error::PimsError;
use crate::format::tiff::TiffContainer;
use crate::stack::{assemble, Container, Stack};

/// Reader over one or more TIFF files, or one TIFF stream.
pub struct TiffReader {
    containers: Vec<Arc<TiffContainer>>,
    metadata: Map<String, Value>,
    description: String,
}

impl TiffReader {
    /// Open every source of `input` as a TIFF container.
    ///
    /// # Errors
    ///
    /// - `NoMatches` / `InvalidPattern` from source resolution
    /// - any `IoError` or `TiffError` raised opening a file
    /// - `MalformedContainer` when a file holds other than one page series
    pub fn open(input: Input, config: &ReaderConfig) -> Result<Self, PimsError> {
        let description = input.to_string();
        let sources = resolve_sources(input, config)?;

        let mut containers = Vec::with_capacity(sources.len());
        for source in sources {
            let reader = open_source(source, config)?;
            let container = TiffContainer::open(reader, config.max_pages)?;
            check_single_series(&container)?;
            containers.push(Arc::new(container));
        }

        let metadata = build_metadata(&containers);
        info!(
            input = %description,
            containers = containers.len(),
            "opened TIFF input"
        );

        Ok(Self {
            containers,
            metadata,
            description,
        })
    }

    /// The opened containers, in stacking order.
    pub fn containers(&self) -> &[Arc<TiffContainer>] {
        &self.containers
    }
}

/// First container's tags plus counts over all containers.
fn build_metadata(containers: &[Arc<TiffContainer>]) -> Map<String, Value> {
    let mut metadata = containers
        .first()
        .map(|c| c.metadata().clone())
        .unwrap_or_default();

    let pages: usize = containers.iter().map(|c| c.pages().len()).sum();
    metadata.insert("pages".into(), pages.into());
    metadata.insert("containers".into(), containers.len().into());

    if let Some(first) = containers.first() {
        let header = first.header();
        let byte_order = if header.byte_order.is_little_endian() {
            "little"
        } else {
            "big"
        };
        metadata.insert("byte_order".into(), byte_order.into());
        metadata.insert("bigtiff".into(), header.is_bigtiff.into());
    }
    metadata
}

impl Reader for TiffReader {
    fn read(&self) -> Result<Stack, PimsError> {
        let containers: Vec<Arc<dyn Container>> = self
            .containers
            .iter()
            .map(|c| Arc::clone(c) as Arc<dyn Container>)
            .collect();
        let stack = assemble(&containers)?;
        debug!(reader = %self, shape = ?stack.shape(), "assembled stack");
        Ok(stack)
    }

    fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }
}

impl fmt::Display for TiffReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TiffReader({:?})", self.description)
    }
}

/// Factory registered for `image/tiff`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TiffReaderFactory;

impl ReaderFactory for TiffReaderFactory {
    fn name(&self) -> &str {
        "tiff"
    }

    fn construct(&self, input: Input, config: &ReaderConfig) -> Result<Box<dyn Reader>, PimsError> {
        Ok(Box::new(TiffReader::open(input, config)?))
    }
}
