//! Content-type lookup by file name.
//!
//! The process-wide registry is built once, on first use, from the system
//! `mime.types` files; extensions they do not list fall back to the
//! `mime_guess` table. After initialization the registry is read-only.
//!
//! Only the name is consulted. File contents are never sniffed.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use tracing::debug;

/// `mime.types` files consulted by [`MimeRegistry::system`], in load order.
/// Later files override earlier ones.
pub const SYSTEM_MIME_FILES: [&str; 4] = [
    "/etc/mime.types",
    "/etc/httpd/mime.types",
    "/etc/apache2/mime.types",
    "/usr/local/etc/mime.types",
];

static GLOBAL: OnceLock<Arc<MimeRegistry>> = OnceLock::new();

/// Extension to content-type table.
#[derive(Debug, Clone, Default)]
pub struct MimeRegistry {
    types: HashMap<String, String>,
    use_fallback: bool,
}

impl MimeRegistry {
    /// A registry that knows nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry backed only by the `mime_guess` table.
    pub fn builtin() -> Self {
        Self {
            types: HashMap::new(),
            use_fallback: true,
        }
    }

    /// The `mime_guess` table overlaid with every readable system `mime.types` file.
    pub fn system() -> Self {
        let mut registry = Self::builtin();
        for path in SYSTEM_MIME_FILES {
            match std::fs::read_to_string(path) {
                Ok(text) => {
                    let added = registry.load_mime_types(&text);
                    debug!(path, extensions = added, "loaded mime.types");
                }
                Err(_) => continue,
            }
        }
        registry
    }

    /// Map an extension (with or without leading dot) to a content type.
    pub fn with_type(mut self, extension: &str, content_type: &str) -> Self {
        self.insert(extension, content_type);
        self
    }

    fn insert(&mut self, extension: &str, content_type: &str) {
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        if !extension.is_empty() {
            self.types
                .insert(extension, content_type.trim().to_ascii_lowercase());
        }
    }

    /// Add the entries of a `mime.types` file.
    ///
    /// Each non-comment line is a content type followed by its extensions.
    /// Returns the number of extensions added.
    pub fn load_mime_types(&mut self, text: &str) -> usize {
        let mut added = 0;
        for line in text.lines() {
            let line = line.split('#').next().unwrap_or("");
            let mut fields = line.split_whitespace();
            let Some(content_type) = fields.next() else {
                continue;
            };
            for extension in fields {
                self.insert(extension, content_type);
                added += 1;
            }
        }
        added
    }

    /// Content type for a path, glob pattern or handle name.
    ///
    /// The extension of the last path component decides; matching is
    /// case-insensitive. Returns `None` for names without an extension or
    /// with an unknown one.
    pub fn guess_type(&self, name: &str) -> Option<String> {
        let extension = Path::new(name)
            .extension()?
            .to_str()?
            .to_ascii_lowercase();

        if let Some(content_type) = self.types.get(&extension) {
            return Some(content_type.clone());
        }
        if self.use_fallback {
            return mime_guess::from_ext(&extension)
                .first()
                .map(|m| m.essence_str().to_string());
        }
        None
    }
}

/// The process-wide registry, built on first call.
///
/// Safe to call any number of times from any thread; initialization runs once.
pub fn init() -> Arc<MimeRegistry> {
    GLOBAL
        .get_or_init(|| Arc::new(MimeRegistry::system()))
        .clone()
}

/// Look a name up in the process-wide registry.
pub fn guess_type(name: &str) -> Option<String> {
    init().guess_type(name)
}
