use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use tracing::{debug, info};

use crate::{BackendError, FileBackend, Result, validate_path};

/// Backend rooted at a directory on local disk.
///
/// Each relative path maps to `{root}/{path}`; parent directories are created
/// on write.
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    pub fn new(root: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root).map_err(|e| BackendError::io(&root.display().to_string(), e))?;
        info!("Storage root: {}", root.display());
        Ok(Self { root })
    }

    /// On-disk location of a relative path.
    pub fn file_path(&self, path: &str) -> Result<PathBuf> {
        validate_path(path)?;
        Ok(self.root.join(path))
    }
}

impl FileBackend for LocalBackend {
    fn reader(&self, path: &str) -> Result<Box<dyn Read + Send>> {
        let full = self.file_path(path)?;
        let file = fs::File::open(&full).map_err(|e| BackendError::io(path, e))?;
        Ok(Box::new(io::BufReader::new(file)))
    }

    fn write_file(&self, src: &mut dyn Read, path: &str) -> Result<u64> {
        let full = self.file_path(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| BackendError::io(path, e))?;
        }
        let mut file = fs::File::create(&full).map_err(|e| BackendError::io(path, e))?;
        let written = io::copy(src, &mut file).map_err(|e| BackendError::io(path, e))?;
        file.sync_all().map_err(|e| BackendError::io(path, e))?;
        debug!(path, bytes = written, "wrote file");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(dir.path().to_path_buf()).unwrap();

        let written = backend
            .write_file(&mut "hello".as_bytes(), "exports/day1/a.txt")
            .unwrap();
        assert_eq!(written, 5);
        assert!(dir.path().join("exports/day1/a.txt").is_file());

        let mut out = String::new();
        backend
            .reader("exports/day1/a.txt")
            .unwrap()
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, "hello");
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(dir.path().to_path_buf()).unwrap();
        assert!(matches!(backend.reader("nope.txt"), Err(BackendError::NotFound(_))));
    }

    #[test]
    fn test_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(dir.path().to_path_buf()).unwrap();
        assert!(matches!(
            backend.write_file(&mut "x".as_bytes(), "../outside.txt"),
            Err(BackendError::InvalidPath(_))
        ));
    }
}
