//! Durable blob storage for uploaded files
//!
//! Files land under the configured uploads directory with generated
//! collision-free names; the original extension is preserved so metadata
//! estimation and playback keep working from the stored path.

use scriba_common::Result;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Filesystem-backed blob store
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Write bytes under a generated unique name, preserving the declared
    /// filename's extension. Returns the stored path.
    pub fn store(&self, declared_filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.root)?;

        let extension = Path::new(declared_filename)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let stored_name = format!("{}{}", Uuid::new_v4(), extension);
        let path = self.root.join(stored_name);

        std::fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Read stored bytes back by path
    pub fn read(&self, path: &Path) -> Result<Vec<u8>> {
        Ok(std::fs::read(path)?)
    }

    pub fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_store_preserves_extension_and_content() {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::new(dir.path().to_path_buf());

        let path = store.store("interview.mp3", b"audio-bytes").unwrap();
        assert_eq!(path.extension().unwrap(), "mp3");
        assert!(store.exists(&path));
        assert_eq!(store.read(&path).unwrap(), b"audio-bytes");
    }

    #[test]
    fn test_store_generates_unique_names() {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::new(dir.path().to_path_buf());

        let a = store.store("same.wav", b"a").unwrap();
        let b = store.store("same.wav", b"b").unwrap();
        assert_ne!(a, b);
        assert_eq!(store.read(&a).unwrap(), b"a");
        assert_eq!(store.read(&b).unwrap(), b"b");
    }

    #[test]
    fn test_store_without_extension() {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::new(dir.path().to_path_buf());

        let path = store.store("README", b"text").unwrap();
        assert!(path.extension().is_none());
    }
}
