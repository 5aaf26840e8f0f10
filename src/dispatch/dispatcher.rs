//! Input to reader dispatch.

use std::sync::Arc;

use tracing::{debug, info};

use super::classify::classify;
use super::input::Input;
use super::registry::ReaderRegistry;
use crate::config::ReaderConfig;
use crate::error::PimsError;
use crate::mime::{self, MimeRegistry};
use crate::reader::Reader;
use crate::stack::Stack;

/// Picks the reader for an input and constructs it.
///
/// Holds its registries behind `Arc`s, so cloning is cheap and a dispatcher
/// can be shared between threads.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ReaderRegistry>,
    mime: Arc<MimeRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ReaderRegistry>, mime: Arc<MimeRegistry>) -> Self {
        Self { registry, mime }
    }

    /// Dispatcher over the process-wide registries.
    pub fn global() -> Self {
        Self::new(ReaderRegistry::global(), mime::init())
    }

    pub fn registry(&self) -> &ReaderRegistry {
        &self.registry
    }

    /// Content type the input classifies as.
    pub fn classify(&self, input: &Input) -> Result<String, PimsError> {
        Ok(classify(input, &self.mime)?)
    }

    /// Classify `input`, resolve its reader and construct it.
    ///
    /// `config` is passed through to the reader unchanged.
    ///
    /// # Errors
    ///
    /// Classification and dispatch errors are returned unchanged; so is any
    /// error the reader raises while opening.
    pub fn open_reader(&self, input: Input, config: &ReaderConfig) -> Result<Box<dyn Reader>, PimsError> {
        let content_type = classify(&input, &self.mime)?;
        let factory = self.registry.resolve(&content_type)?;
        debug!(
            input = %input,
            content_type = %content_type,
            reader = factory.name(),
            "dispatching"
        );

        let reader = factory.construct(input, config)?;
        info!(reader = %reader, "opened reader");
        Ok(reader)
    }

    /// Open `input` and assemble its lazy stack.
    pub fn open(&self, input: Input, config: &ReaderConfig) -> Result<Stack, PimsError> {
        self.open_reader(input, config)?.read()
    }
}
