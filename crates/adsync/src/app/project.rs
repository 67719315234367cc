//! Project layout validation and one-call dependency resolution.

use std::path::PathBuf;

use crate::app::imports;
use crate::app::replace::{self, ReplacementOutcome};
use crate::app::resolve;
use crate::app::scan::Scanner;
use crate::domain::errors::AdsyncError;
use crate::domain::model::AssetRecord;
use crate::infra::fs::DirHandle;

/// Original asset root, relative to the project root.
pub const ASSETS_DIR: &str = "public/assets";
/// Generated base64-module root.
pub const MEDIA_DIR: &str = "media";
/// The preload routine the import analysis reads.
pub const PRELOADER_PATH: &str = "src/scenes/preloader.js";

/// An opened playable-ad project with the conventional layout validated.
///
/// Validation only: the directories are expected to exist already; this
/// never creates them.
#[derive(Debug, Clone)]
pub struct Project {
    root: DirHandle,
    assets: DirHandle,
    media: DirHandle,
}

impl Project {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, AdsyncError> {
        let root = DirHandle::open(root)?;
        let assets = root
            .subdir(ASSETS_DIR)
            .map_err(|_| AdsyncError::NotFound(format!("asset directory {ASSETS_DIR}")))?;
        let media = root
            .subdir(MEDIA_DIR)
            .map_err(|_| AdsyncError::NotFound(format!("media directory {MEDIA_DIR}")))?;
        if !root.exists(PRELOADER_PATH) {
            return Err(AdsyncError::NotFound(format!("preloader {PRELOADER_PATH}")));
        }
        Ok(Self { root, assets, media })
    }

    pub fn root(&self) -> &DirHandle {
        &self.root
    }

    /// Scan assets and generated modules, analyze the preloader, and join
    /// everything into fresh records. Each call is a full snapshot; callers
    /// re-run it after any mutation to observe the new state.
    pub fn scan(&self, scanner: &Scanner) -> Result<Vec<AssetRecord>, AdsyncError> {
        let assets = scanner.scan(&self.assets)?;
        let modules = scanner.scan(&self.media)?;
        let preloader = self.root.read_to_string(PRELOADER_PATH)?;
        let bindings = imports::analyze(&preloader);
        Ok(resolve::resolve(&assets, &modules, &bindings))
    }

    /// Replace one asset's content and regenerate its base64 module.
    pub fn replace_asset(
        &self,
        record: &AssetRecord,
        new_bytes: &[u8],
        new_file_name: &str,
    ) -> Result<ReplacementOutcome, AdsyncError> {
        replace::replace_asset(record, new_bytes, new_file_name, &self.media, &self.assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn write(root: &Path, relative: &str, contents: &[u8]) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn sample_project(root: &Path) {
        write(root, "public/assets/ui/button.png", b"png bytes");
        write(root, "public/assets/audio/theme.mp3", b"mp3 bytes");
        write(root, "media/ui_button.png.js", b"export const buttonPNG = \"data:image/png;base64,cG5n\";");
        write(
            root,
            "src/scenes/preloader.js",
            concat!(
                "import { buttonPNG } from \"../../media/ui_button.png.js\";\n",
                "import { themeMP3 } from \"../../media/audio_theme.mp3.js\";\n",
                "export class Preloader {\n",
                "  preload() {\n",
                "    this.load.image(\"btn\", buttonPNG);\n",
                "  }\n",
                "}\n"
            )
            .as_bytes(),
        );
    }

    #[test]
    fn open_requires_the_conventional_layout() {
        let temp = tempfile::tempdir().unwrap();
        let err = Project::open(temp.path()).unwrap_err();
        assert!(matches!(err, AdsyncError::NotFound(_)));

        sample_project(temp.path());
        assert!(Project::open(temp.path()).is_ok());
    }

    #[test]
    fn missing_preloader_is_reported_by_name() {
        let temp = tempfile::tempdir().unwrap();
        sample_project(temp.path());
        fs::remove_file(temp.path().join(PRELOADER_PATH)).unwrap();

        let err = Project::open(temp.path()).unwrap_err();
        assert_eq!(err.to_string(), "preloader src/scenes/preloader.js not found");
    }

    #[test]
    fn scan_joins_assets_modules_and_usage() {
        let temp = tempfile::tempdir().unwrap();
        sample_project(temp.path());
        let project = Project::open(temp.path()).unwrap();

        let records = project.scan(&Scanner::default()).unwrap();
        assert_eq!(records.len(), 2);

        let button = records
            .iter()
            .find(|r| r.file.name == "button.png")
            .unwrap();
        assert!(button.has_base64);
        assert!(button.in_use);

        // Imported but never passed to a loader call, and no module on disk.
        let theme = records.iter().find(|r| r.file.name == "theme.mp3").unwrap();
        assert!(!theme.has_base64);
        assert!(!theme.in_use);
    }

    #[test]
    fn replace_is_observed_by_the_next_scan() {
        let temp = tempfile::tempdir().unwrap();
        sample_project(temp.path());
        let project = Project::open(temp.path()).unwrap();
        let scanner = Scanner::default();

        let records = project.scan(&scanner).unwrap();
        let theme = records.iter().find(|r| r.file.name == "theme.mp3").unwrap();
        assert!(!theme.has_base64);

        project
            .replace_asset(theme, b"new audio", "swap.mp3")
            .unwrap();

        let records = project.scan(&scanner).unwrap();
        let theme = records.iter().find(|r| r.file.name == "theme.mp3").unwrap();
        assert!(theme.has_base64);
    }
}
