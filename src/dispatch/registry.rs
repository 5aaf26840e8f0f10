//! Content type to reader backend registrations.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::error::DispatchError;
use crate::reader::{ReaderFactory, TiffReaderFactory};

static GLOBAL: OnceLock<Arc<ReaderRegistry>> = OnceLock::new();

/// Table of reader factories keyed by content type.
///
/// Built mutably with [`register`](Self::register), then shared read-only.
/// Registering a second factory for a key does not replace the first: both
/// are kept and lookup reports the key as ambiguous.
#[derive(Default, Clone)]
pub struct ReaderRegistry {
    readers: HashMap<String, Vec<Arc<dyn ReaderFactory>>>,
}

impl ReaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every backend this crate ships.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("image/tiff", Arc::new(TiffReaderFactory));
        registry
    }

    /// The process-wide builtin registry.
    pub fn global() -> Arc<ReaderRegistry> {
        GLOBAL
            .get_or_init(|| Arc::new(ReaderRegistry::builtin()))
            .clone()
    }

    /// Add a factory for a content type. Keys are trimmed and lowercased.
    pub fn register(&mut self, content_type: &str, factory: Arc<dyn ReaderFactory>) -> &mut Self {
        let key = normalize(content_type);
        debug!(content_type = %key, reader = factory.name(), "registered reader");
        self.readers.entry(key).or_default().push(factory);
        self
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, content_type: &str, factory: Arc<dyn ReaderFactory>) -> Self {
        self.register(content_type, factory);
        self
    }

    /// The single factory registered for a content type.
    ///
    /// # Errors
    ///
    /// - `NoReader` when nothing is registered for the key
    /// - `Ambiguous` when more than one factory is, naming them all
    pub fn resolve(&self, content_type: &str) -> Result<Arc<dyn ReaderFactory>, DispatchError> {
        let key = normalize(content_type);
        match self.readers.get(&key).map(Vec::as_slice) {
            Some([factory]) => Ok(Arc::clone(factory)),
            Some(factories) if factories.len() > 1 => Err(DispatchError::Ambiguous {
                content_type: key,
                readers: factories.iter().map(|f| f.name().to_string()).collect(),
            }),
            _ => Err(DispatchError::NoReader { content_type: key }),
        }
    }

    /// Registered content types, sorted.
    pub fn content_types(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.readers.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

fn normalize(content_type: &str) -> String {
    content_type.trim().to_ascii_lowercase()
}

impl fmt::Debug for ReaderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for key in self.content_types() {
            let names: Vec<&str> = self.readers[key].iter().map(|r| r.name()).collect();
            map.entry(&key, &names);
        }
        map.finish()
    }
}
