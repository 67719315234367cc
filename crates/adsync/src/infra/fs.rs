//! Rooted directory capabilities used by the scanner and the pipelines.
//!
//! A [`DirHandle`] stands in for a platform directory handle: every
//! operation resolves against its root and relative paths may not escape it.
//! Handles are plain owned values; dropping one releases everything it
//! acquired.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::errors::AdsyncError;

/// A capability rooted at one directory.
#[derive(Debug, Clone)]
pub struct DirHandle {
    root: PathBuf,
}

/// One direct child of a directory, as reported by [`DirHandle::enumerate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

impl DirHandle {
    /// Open a capability over an existing directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, AdsyncError> {
        let root = root.into();
        match fs::metadata(&root) {
            Ok(meta) if meta.is_dir() => Ok(Self { root }),
            Ok(_) => Err(AdsyncError::Validation(format!(
                "{} is not a directory",
                root.display()
            ))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(AdsyncError::NotFound(format!("directory {}", root.display())))
            }
            Err(err) => Err(AdsyncError::io(root, err)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Open a capability over a direct or nested subdirectory.
    pub fn subdir(&self, relative: &str) -> Result<Self, AdsyncError> {
        Self::open(self.resolve(relative)?)
    }

    /// Resolve a relative path against the root, rejecting escapes.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, AdsyncError> {
        let rel = Path::new(relative);
        if rel.is_absolute() {
            return Err(AdsyncError::Validation(format!(
                "path {relative} must be relative"
            )));
        }
        if rel
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(AdsyncError::Validation(format!(
                "path {relative} escapes its root"
            )));
        }
        Ok(self.root.join(rel))
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.resolve(relative)
            .map(|path| path.exists())
            .unwrap_or(false)
    }

    /// List the direct children of the root.
    pub fn enumerate(&self) -> Result<Vec<DirEntryInfo>, AdsyncError> {
        let mut entries = Vec::new();
        let read = fs::read_dir(&self.root).map_err(|err| AdsyncError::io(&self.root, err))?;
        for entry in read {
            let entry = entry.map_err(|err| AdsyncError::io(&self.root, err))?;
            let file_type = entry
                .file_type()
                .map_err(|err| AdsyncError::io(entry.path(), err))?;
            entries.push(DirEntryInfo {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: entry.path(),
                is_dir: file_type.is_dir(),
            });
        }
        Ok(entries)
    }

    pub fn read(&self, relative: &str) -> Result<Vec<u8>, AdsyncError> {
        let path = self.resolve(relative)?;
        fs::read(&path).map_err(|err| AdsyncError::io(path, err))
    }

    pub fn read_to_string(&self, relative: &str) -> Result<String, AdsyncError> {
        let path = self.resolve(relative)?;
        fs::read_to_string(&path).map_err(|err| AdsyncError::io(path, err))
    }

    /// Write a file, creating intermediate directories and overwriting any
    /// existing content.
    pub fn write(&self, relative: &str, contents: &[u8]) -> Result<(), AdsyncError> {
        let path = self.resolve(relative)?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|err| AdsyncError::io(parent, err))?;
        }
        fs::write(&path, contents).map_err(|err| AdsyncError::io(path, err))
    }

    /// Remove a file, or a directory together with its contents.
    pub fn remove(&self, relative: &str) -> Result<(), AdsyncError> {
        let path = self.resolve(relative)?;
        let meta = fs::metadata(&path).map_err(|err| AdsyncError::io(&path, err))?;
        let result = if meta.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        result.map_err(|err| AdsyncError::io(path, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_missing_root_is_not_found() {
        let temp = tempfile::tempdir().unwrap();
        let err = DirHandle::open(temp.path().join("absent")).unwrap_err();
        assert!(matches!(err, AdsyncError::NotFound(_)));
    }

    #[test]
    fn resolve_rejects_escapes() {
        let temp = tempfile::tempdir().unwrap();
        let handle = DirHandle::open(temp.path()).unwrap();
        assert!(matches!(
            handle.resolve("../outside.txt"),
            Err(AdsyncError::Validation(_))
        ));
        assert!(matches!(
            handle.resolve("a/../../outside.txt"),
            Err(AdsyncError::Validation(_))
        ));
    }

    #[test]
    fn write_creates_intermediate_directories_and_overwrites() {
        let temp = tempfile::tempdir().unwrap();
        let handle = DirHandle::open(temp.path()).unwrap();

        handle.write("nested/deep/file.txt", b"first").unwrap();
        assert_eq!(handle.read("nested/deep/file.txt").unwrap(), b"first");

        handle.write("nested/deep/file.txt", b"second").unwrap();
        assert_eq!(handle.read("nested/deep/file.txt").unwrap(), b"second");
    }

    #[test]
    fn enumerate_lists_direct_children() {
        let temp = tempfile::tempdir().unwrap();
        let handle = DirHandle::open(temp.path()).unwrap();
        handle.write("one.txt", b"1").unwrap();
        std::fs::create_dir(temp.path().join("sub")).unwrap();

        let mut entries = handle.enumerate().unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "one.txt");
        assert!(!entries[0].is_dir);
        assert_eq!(entries[1].name, "sub");
        assert!(entries[1].is_dir);
    }

    #[test]
    fn remove_handles_files_and_directories() {
        let temp = tempfile::tempdir().unwrap();
        let handle = DirHandle::open(temp.path()).unwrap();
        handle.write("file.txt", b"x").unwrap();
        handle.write("dir/inner.txt", b"y").unwrap();

        handle.remove("file.txt").unwrap();
        handle.remove("dir").unwrap();
        assert!(!handle.exists("file.txt"));
        assert!(!handle.exists("dir"));
    }
}
