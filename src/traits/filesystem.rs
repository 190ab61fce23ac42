use crate::artifact::archive::{self, Compression};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Outcome of a tolerant directory creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirStatus {
    Created,
    AlreadyExisted,
}

/// Trait for filesystem operations to enable testing with mocks
pub trait FileSystem: Send + Sync {
    /// Write bytes to a file, replacing any previous contents
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Create directory and all parent directories; an existing directory is not an error
    fn create_dir_all(&self, path: &Path) -> Result<DirStatus>;

    /// Remove a file
    fn remove_file(&self, path: &Path) -> Result<()>;

    /// Check if path exists
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Unpack a compressed tar archive into `dest`, returning the number of entries
    fn unpack_tarball(&self, archive: &Path, compression: Compression, dest: &Path)
    -> Result<usize>;
}

/// Real filesystem implementation using std::fs
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        std::fs::write(path, contents).with_context(|| format!("Failed to write file: {:?}", path))
    }

    fn create_dir_all(&self, path: &Path) -> Result<DirStatus> {
        if path.is_dir() {
            return Ok(DirStatus::AlreadyExisted);
        }

        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {:?}", path))?;
        Ok(DirStatus::Created)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        std::fs::remove_file(path).with_context(|| format!("Failed to remove file: {:?}", path))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn unpack_tarball(
        &self,
        archive_path: &Path,
        compression: Compression,
        dest: &Path,
    ) -> Result<usize> {
        let file = std::fs::File::open(archive_path)
            .with_context(|| format!("Failed to open archive: {:?}", archive_path))?;
        archive::unpack(compression, file, dest)
    }
}

/// Mock filesystem implementation for testing (in-memory)
#[allow(dead_code)]
pub struct MockFileSystem {
    files: Arc<RwLock<HashMap<PathBuf, Vec<u8>>>>,
    directories: Arc<RwLock<HashMap<PathBuf, ()>>>,
    failing_dirs: Arc<RwLock<Vec<PathBuf>>>,
}

#[allow(dead_code)]
impl MockFileSystem {
    /// Create new empty mock filesystem
    pub fn new() -> Self {
        Self {
            files: Arc::new(RwLock::new(HashMap::new())),
            directories: Arc::new(RwLock::new(HashMap::new())),
            failing_dirs: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Get captured file contents for testing assertions
    pub fn get_file_contents(&self, path: &Path) -> Option<String> {
        self.files
            .read()
            .unwrap()
            .get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Check if file was written
    pub fn has_file(&self, path: &Path) -> bool {
        self.files.read().unwrap().contains_key(path)
    }

    /// List all files in mock filesystem
    pub fn list_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = self.files.read().unwrap().keys().cloned().collect();
        files.sort();
        files
    }

    /// Make directory creation at `path` fail with a permission error
    pub fn fail_create_dir(&self, path: &Path) {
        self.failing_dirs.write().unwrap().push(path.to_path_buf());
    }
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for MockFileSystem {
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !self.is_dir(parent) {
                anyhow::bail!("Failed to write file: {:?} (no such directory)", path);
            }
        }

        self.files
            .write()
            .unwrap()
            .insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<DirStatus> {
        if self.failing_dirs.read().unwrap().iter().any(|p| p == path) {
            anyhow::bail!("Failed to create directory: {:?} (permission denied)", path);
        }

        if self.is_dir(path) {
            return Ok(DirStatus::AlreadyExisted);
        }

        // Also add parent directories
        let mut directories = self.directories.write().unwrap();
        let mut current = Some(path);
        while let Some(dir) = current {
            if dir.as_os_str().is_empty() {
                break;
            }
            directories.insert(dir.to_path_buf(), ());
            current = dir.parent();
        }

        Ok(DirStatus::Created)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.files
            .write()
            .unwrap()
            .remove(path)
            .with_context(|| format!("File not found in mock filesystem: {:?}", path))?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.read().unwrap().contains_key(path)
            || self.directories.read().unwrap().contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.directories.read().unwrap().contains_key(path)
    }

    fn unpack_tarball(
        &self,
        archive_path: &Path,
        compression: Compression,
        dest: &Path,
    ) -> Result<usize> {
        let bytes = self
            .files
            .read()
            .unwrap()
            .get(archive_path)
            .cloned()
            .with_context(|| format!("File not found in mock filesystem: {:?}", archive_path))?;

        let entries = archive::read_entries(compression, Cursor::new(bytes))?;
        let count = entries.len();
        for (relative, contents) in entries {
            let target = dest.join(relative);
            match contents {
                Some(data) => {
                    if let Some(parent) = target.parent() {
                        self.create_dir_all(parent)?;
                    }
                    self.write(&target, &data)?;
                }
                None => {
                    self.create_dir_all(&target)?;
                }
            }
        }

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_real_create_dir_all_is_idempotent() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("nginx");

        let fs = RealFileSystem;
        assert_eq!(fs.create_dir_all(&dir).unwrap(), DirStatus::Created);
        assert_eq!(fs.create_dir_all(&dir).unwrap(), DirStatus::AlreadyExisted);
        assert!(fs.is_dir(&dir));
    }

    #[test]
    fn test_real_create_dir_over_file_fails() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("data");
        std::fs::write(&file, "x").unwrap();

        assert!(RealFileSystem.create_dir_all(&file).is_err());
    }

    #[test]
    fn test_mock_write_requires_parent() {
        let fs = MockFileSystem::new();
        assert!(fs.write(Path::new("/home/u/nginx/nginx.conf"), b"x").is_err());

        fs.create_dir_all(Path::new("/home/u/nginx")).unwrap();
        fs.write(Path::new("/home/u/nginx/nginx.conf"), b"x").unwrap();
        assert_eq!(
            fs.get_file_contents(Path::new("/home/u/nginx/nginx.conf")),
            Some("x".to_string())
        );
    }

    #[test]
    fn test_mock_failing_dir() {
        let fs = MockFileSystem::new();
        fs.fail_create_dir(Path::new("/home/u/nginx/data"));
        assert!(fs.create_dir_all(Path::new("/home/u/nginx/data")).is_err());
    }
}
