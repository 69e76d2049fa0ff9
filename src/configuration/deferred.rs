//! File-backed text fields that are read on first use and cached afterwards.
//!
//! Query text, reply templates and password files are referenced from the
//! configuration by path only. Loading the configuration never touches those
//! files; [`DeferredFileText::resolve`] reads the file the first time
//! someone actually needs its contents.

use std::{
    fmt,
    fs,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use parking_lot::Mutex;
use tracing::debug;

use super::ConfigurationError;


/// Where deferred text is read from. The file system in production,
/// anything else in tests.
pub trait TextSource: Send + Sync {
    fn read_text(&self, path: &Path) -> std::io::Result<String>;
}

/// Reads the whole file as UTF-8, exactly as stored.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemTextSource;

impl TextSource for FileSystemTextSource {
    fn read_text(&self, path: &Path) -> std::io::Result<String> {
        fs::read_to_string(path)
    }
}


/// A configured file path whose text contents are read once, on demand.
///
/// Concurrent first accesses are serialized on an internal lock, so the file
/// is read at most once per successful resolution. A failed read is not
/// cached; the next call tries again.
pub struct DeferredFileText {
    /// Fully qualified field name, used in error messages.
    field_name: String,

    /// Path with placeholders already replaced.
    path: Option<PathBuf>,

    /// Path exactly as written in the document, placeholders included.
    configured_path: Option<String>,

    contents: OnceLock<String>,

    initialization_lock: Mutex<()>,
}

impl DeferredFileText {
    pub fn new<S: Into<String>>(field_name: S, path: Option<PathBuf>) -> Self {
        let configured_path = path
            .as_deref()
            .map(|path| path.to_string_lossy().to_string());

        Self {
            field_name: field_name.into(),
            path,
            configured_path,
            contents: OnceLock::new(),
            initialization_lock: Mutex::new(()),
        }
    }

    /// Remembers the path as written in the document, before placeholders
    /// were replaced, so the field can be serialized back unchanged.
    pub fn with_configured_path(mut self, configured_path: Option<String>) -> Self {
        self.configured_path = configured_path;
        self
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// The path files are read from, with placeholders replaced.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The path as written in the document.
    pub fn configured_path(&self) -> Option<&str> {
        self.configured_path.as_deref()
    }

    /// Whether a non-empty path has been configured.
    pub fn is_configured(&self) -> bool {
        self.path
            .as_deref()
            .is_some_and(|path| !path.as_os_str().is_empty())
    }

    /// Whether the contents have already been read and cached.
    pub fn is_resolved(&self) -> bool {
        self.contents.get().is_some()
    }

    /// Returns the file contents, reading the file from disk on first access.
    pub fn resolve(&self) -> Result<&str, ConfigurationError> {
        self.resolve_with(&FileSystemTextSource)
    }

    /// Same as [`Self::resolve`], but reads through a custom [`TextSource`].
    pub fn resolve_with<T>(&self, source: &T) -> Result<&str, ConfigurationError>
    where
        T: TextSource + ?Sized,
    {
        if let Some(contents) = self.contents.get() {
            return Ok(contents.as_str());
        }

        let path = match self.path.as_deref() {
            Some(path) if !path.as_os_str().is_empty() => path,
            _ => {
                return Err(ConfigurationError::Argument {
                    field: self.field_name.clone(),
                })
            }
        };


        let _initialization_guard = self.initialization_lock.lock();

        // Another thread may have finished reading while we waited for the lock.
        if let Some(contents) = self.contents.get() {
            return Ok(contents.as_str());
        }

        debug!(
            field = %self.field_name,
            path = %path.display(),
            "Reading deferred file text."
        );

        let contents = source
            .read_text(path)
            .map_err(|error| ConfigurationError::Io {
                path: path.to_path_buf(),
                source: error,
            })?;

        Ok(self.contents.get_or_init(|| contents).as_str())
    }
}

impl Clone for DeferredFileText {
    fn clone(&self) -> Self {
        let contents = OnceLock::new();
        if let Some(cached) = self.contents.get() {
            let _ = contents.set(cached.clone());
        }

        Self {
            field_name: self.field_name.clone(),
            path: self.path.clone(),
            configured_path: self.configured_path.clone(),
            contents,
            initialization_lock: Mutex::new(()),
        }
    }
}

/// Two deferred fields are equal when they are configured the same way;
/// the cache state is irrelevant.
impl PartialEq for DeferredFileText {
    fn eq(&self, other: &Self) -> bool {
        self.field_name == other.field_name
            && self.path == other.path
            && self.configured_path == other.configured_path
    }
}

impl Eq for DeferredFileText {}

// Never print contents: these fields may hold passwords.
impl fmt::Debug for DeferredFileText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredFileText")
            .field("field_name", &self.field_name)
            .field("path", &self.path)
            .field("configured_path", &self.configured_path)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}
