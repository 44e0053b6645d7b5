use std::collections::{BTreeMap, HashSet};
use std::io::{Cursor, Read};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{BackendError, DeadlineFreeWrite, FileBackend, Result, validate_path};

/// Backend holding files in memory. Writes to paths registered with
/// [`MemoryBackend::fail_writes_to`] fail with an I/O error.
#[derive(Default)]
pub struct MemoryBackend {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    failing: Mutex<HashSet<String>>,
    deadline_free_writes: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: &str, data: impl Into<Vec<u8>>) {
        self.lock_files().insert(path.to_string(), data.into());
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.lock_files().get(path).cloned()
    }

    pub fn get_string(&self, path: &str) -> Option<String> {
        self.get(path).map(|data| String::from_utf8_lossy(&data).into_owned())
    }

    /// All stored paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.lock_files().keys().cloned().collect()
    }

    pub fn fail_writes_to(&self, path: &str) {
        self.failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path.to_string());
    }

    /// Number of writes that went through the deadline-free path.
    pub fn deadline_free_writes(&self) -> usize {
        self.deadline_free_writes.load(Ordering::Relaxed)
    }

    fn lock_files(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.files.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn store(&self, src: &mut dyn Read, path: &str) -> Result<u64> {
        validate_path(path)?;
        let failing = self
            .failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(path);
        if failing {
            return Err(BackendError::Io {
                path: path.to_string(),
                source: std::io::Error::other("injected write failure"),
            });
        }
        let mut data = Vec::new();
        src.read_to_end(&mut data)
            .map_err(|e| BackendError::io(path, e))?;
        let len = data.len() as u64;
        self.lock_files().insert(path.to_string(), data);
        Ok(len)
    }
}

impl FileBackend for MemoryBackend {
    fn reader(&self, path: &str) -> Result<Box<dyn Read + Send>> {
        validate_path(path)?;
        let data = self
            .get(path)
            .ok_or_else(|| BackendError::NotFound(path.to_string()))?;
        Ok(Box::new(Cursor::new(data)))
    }

    fn write_file(&self, src: &mut dyn Read, path: &str) -> Result<u64> {
        self.store(src, path)
    }

    fn as_deadline_free(&self) -> Option<&dyn DeadlineFreeWrite> {
        Some(self)
    }
}

impl DeadlineFreeWrite for MemoryBackend {
    fn write_file_without_deadline(&self, src: &mut dyn Read, path: &str) -> Result<u64> {
        self.deadline_free_writes.fetch_add(1, Ordering::Relaxed);
        self.store(src, path)
    }
}
