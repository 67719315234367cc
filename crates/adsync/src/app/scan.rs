//! Recursive asset scanning over a directory capability.

use std::path::Path;
use std::sync::{Arc, Mutex};

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::{DirEntry, WalkBuilder, WalkState};
use time::OffsetDateTime;

use crate::domain::errors::AdsyncError;
use crate::domain::model::{AssetCategory, AssetFile};
use crate::infra::config::Config;
use crate::infra::fs::DirHandle;

/// Scanner walking an asset root and producing flat file descriptors.
///
/// Sibling entries may be visited concurrently; results are sorted by
/// relative path before returning, so callers never observe walk order.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    ignore: Vec<String>,
}

impl Scanner {
    pub fn new(config: &Config) -> Self {
        Self {
            ignore: config.scan.ignore.clone(),
        }
    }

    /// Enumerate every file under the capability's root.
    ///
    /// The whole scan fails on a walk error; there is no partial result.
    pub fn scan(&self, dir: &DirHandle) -> Result<Vec<AssetFile>, AdsyncError> {
        let matcher = Arc::new(build_ignore_matcher(&self.ignore)?);
        let root = dir.root().to_path_buf();

        let mut builder = WalkBuilder::new(&root);
        builder.git_ignore(true).hidden(true);
        builder.filter_entry({
            let matcher = matcher.clone();
            let root = root.clone();
            move |entry| {
                if entry.depth() == 0 {
                    return true;
                }
                let rel = entry.path().strip_prefix(&root).unwrap_or(entry.path());
                !matcher.is_match(rel)
            }
        });

        let files = Mutex::new(Vec::new());
        let failure: Mutex<Option<ignore::Error>> = Mutex::new(None);

        builder.build_parallel().run(|| {
            let files = &files;
            let failure = &failure;
            let root = root.clone();
            Box::new(move |result| match result {
                Ok(entry) => {
                    if let Some(file) = process_entry(&entry, &root)
                        && let Ok(mut guard) = files.lock()
                    {
                        guard.push(file);
                    }
                    WalkState::Continue
                }
                Err(err) => {
                    if let Ok(mut guard) = failure.lock() {
                        guard.get_or_insert(err);
                    }
                    WalkState::Quit
                }
            })
        });

        if let Some(err) = failure.into_inner().unwrap_or(None) {
            return Err(AdsyncError::io(
                root,
                std::io::Error::other(err.to_string()),
            ));
        }

        let mut files = files.into_inner().unwrap_or_default();
        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(files)
    }
}

fn process_entry(entry: &DirEntry, root: &Path) -> Option<AssetFile> {
    let path = entry.path();
    if path == root {
        return None;
    }

    let metadata = match entry.metadata() {
        Ok(metadata) => metadata,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "skipping unreadable entry");
            return None;
        }
    };
    if !metadata.is_file() {
        return None;
    }

    let name = path.file_name()?.to_string_lossy().into_owned();
    Some(AssetFile {
        category: AssetCategory::from_name(&name),
        name,
        relative_path: to_relative_path(root, path),
        modified: metadata.modified().ok().map(OffsetDateTime::from),
    })
}

fn to_relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let display = rel.display().to_string();
    if std::path::MAIN_SEPARATOR == '/' {
        display
    } else {
        display.replace(std::path::MAIN_SEPARATOR, "/")
    }
}

fn build_ignore_matcher(patterns: &[String]) -> Result<GlobSet, AdsyncError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        for expanded in [pattern.clone(), format!("**/{pattern}")] {
            let glob = Glob::new(&expanded).map_err(|err| {
                AdsyncError::Validation(format!("invalid ignore glob {pattern}: {err}"))
            })?;
            builder.add(glob);
        }
    }
    builder
        .build()
        .map_err(|err| AdsyncError::Validation(format!("failed to build ignore set: {err}")))
}
