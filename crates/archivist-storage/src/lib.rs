/// Storage backends for archive exports.
///
/// A backend addresses files by slash-separated relative paths. The export
/// engine reads attachments from one backend and writes the archive into
/// another; both sides go through the [`FileBackend`] trait.

pub mod local;
pub mod memory;

use std::io::Read;

use thiserror::Error;

pub use local::LocalBackend;
pub use memory::MemoryBackend;

pub type Result<T> = std::result::Result<T, BackendError>;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("invalid storage path: {0}")]
    InvalidPath(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl BackendError {
    pub fn io(path: &str, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(path.to_string())
        } else {
            Self::Io {
                path: path.to_string(),
                source,
            }
        }
    }
}

pub trait FileBackend: Send + Sync {
    /// Open a file for reading. Missing files yield [`BackendError::NotFound`].
    fn reader(&self, path: &str) -> Result<Box<dyn Read + Send>>;

    /// Write everything `src` yields to `path`, replacing any existing file.
    /// Returns the number of bytes written.
    fn write_file(&self, src: &mut dyn Read, path: &str) -> Result<u64>;

    /// Backends that enforce a per-write deadline return a handle that can
    /// write without one.
    fn as_deadline_free(&self) -> Option<&dyn DeadlineFreeWrite> {
        None
    }
}

pub trait DeadlineFreeWrite {
    fn write_file_without_deadline(&self, src: &mut dyn Read, path: &str) -> Result<u64>;
}

/// Write through the deadline-free path when the backend offers one.
pub fn try_write_file_without_deadline(
    backend: &dyn FileBackend,
    src: &mut dyn Read,
    path: &str,
) -> Result<u64> {
    match backend.as_deadline_free() {
        Some(writer) => writer.write_file_without_deadline(src, path),
        None => backend.write_file(src, path),
    }
}

/// Join a directory and a relative file path with a single `/`.
pub fn join_path(dir: &str, file: &str) -> String {
    let dir = dir.trim_end_matches('/');
    let file = file.trim_start_matches('/');
    if dir.is_empty() {
        file.to_string()
    } else {
        format!("{}/{}", dir, file)
    }
}

/// Reject absolute paths and parent-directory components.
pub fn validate_path(path: &str) -> Result<()> {
    if path.is_empty()
        || path.starts_with('/')
        || path.contains('\\')
        || path.split('/').any(|part| part == "..")
    {
        return Err(BackendError::InvalidPath(path.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("exports/2024", "data/a.txt"), "exports/2024/data/a.txt");
        assert_eq!(join_path("exports/", "/a.txt"), "exports/a.txt");
        assert_eq!(join_path("", "a.txt"), "a.txt");
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path("data/2024/a.txt").is_ok());
        assert!(validate_path("/etc/passwd").is_err());
        assert!(validate_path("data/../../secret").is_err());
        assert!(validate_path("").is_err());
    }

    #[test]
    fn test_io_not_found_maps_to_not_found() {
        let err = BackendError::io("a.txt", std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(matches!(err, BackendError::NotFound(p) if p == "a.txt"));
        let err = BackendError::io("a.txt", std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert!(matches!(err, BackendError::Io { .. }));
    }
}
