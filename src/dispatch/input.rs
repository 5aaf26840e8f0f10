//! The inputs a caller can open.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::io::ReadSeek;
use crate::reader::glob::has_wildcards;

/// What to open: a file path, a glob pattern, or an already-open stream.
pub enum Input {
    /// A single file location. A path that does not exist is expanded as a
    /// glob pattern when opened.
    Path(PathBuf),
    /// A pattern expanding to zero or more files.
    Glob(String),
    /// An open stream.
    Handle(Handle),
}

impl Input {
    /// Open stream with an associated name.
    pub fn handle(stream: impl ReadSeek + 'static, name: impl Into<String>) -> Self {
        Input::Handle(Handle::new(Box::new(stream), Some(name.into())))
    }

    /// Open stream with no name. Such an input cannot be classified.
    pub fn anonymous(stream: impl ReadSeek + 'static) -> Self {
        Input::Handle(Handle::new(Box::new(stream), None))
    }

    /// Textual name used for classification, if the input has one.
    pub fn name(&self) -> Option<String> {
        match self {
            Input::Path(path) => Some(path.to_string_lossy().into_owned()),
            Input::Glob(pattern) => Some(pattern.clone()),
            Input::Handle(handle) => handle.name.clone(),
        }
    }
}

impl From<&str> for Input {
    /// Text with `*`, `?` or `[` that does not name an existing file is a
    /// glob pattern; anything else is a path.
    fn from(text: &str) -> Self {
        if has_wildcards(text) && !Path::new(text).is_file() {
            Input::Glob(text.to_string())
        } else {
            Input::Path(PathBuf::from(text))
        }
    }
}

impl From<String> for Input {
    fn from(text: String) -> Self {
        Input::from(text.as_str())
    }
}

impl From<&Path> for Input {
    fn from(path: &Path) -> Self {
        Input::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for Input {
    fn from(path: PathBuf) -> Self {
        Input::Path(path)
    }
}

impl From<Handle> for Input {
    fn from(handle: Handle) -> Self {
        Input::Handle(handle)
    }
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Input::Glob(pattern) => f.debug_tuple("Glob").field(pattern).finish(),
            Input::Handle(handle) => f.debug_tuple("Handle").field(handle).finish(),
        }
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::Path(path) => write!(f, "{}", path.display()),
            Input::Glob(pattern) => f.write_str(pattern),
            Input::Handle(handle) => match &handle.name {
                Some(name) => f.write_str(name),
                None => f.write_str("<unnamed handle>"),
            },
        }
    }
}

/// An open byte stream with an optional name.
///
/// The name is only used to pick a reader; it need not be a real path.
pub struct Handle {
    pub name: Option<String>,
    pub stream: Box<dyn ReadSeek>,
}

impl Handle {
    pub fn new(stream: Box<dyn ReadSeek>, name: Option<String>) -> Self {
        Self { name, stream }
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle").field("name", &self.name).finish()
    }
}
