//! Domain models for scanned assets, generated modules, and loader bindings.

use std::fmt;

use serde::Serialize;
use time::OffsetDateTime;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg"];

/// Semantic category of a project file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetCategory {
    Image,
    Audio,
    Other,
}

impl AssetCategory {
    /// Classify a file name by its final dot-segment, case-insensitively.
    ///
    /// Total: names without a recognized extension (or without any dot)
    /// classify as [`AssetCategory::Other`].
    pub fn from_name(file_name: &str) -> Self {
        let ext = match file_name.rsplit_once('.') {
            Some((_, ext)) => ext.to_ascii_lowercase(),
            None => return AssetCategory::Other,
        };
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            AssetCategory::Image
        } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            AssetCategory::Audio
        } else {
            AssetCategory::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetCategory::Image => "image",
            AssetCategory::Audio => "audio",
            AssetCategory::Other => "other",
        }
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file discovered under one of the project roots.
///
/// Produced fresh by every scan and never mutated afterwards; a new scan
/// replaces the whole list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetFile {
    /// File name including extension.
    pub name: String,
    /// Forward-slash path relative to the scanned root.
    pub relative_path: String,
    pub category: AssetCategory,
    #[serde(skip)]
    pub modified: Option<OffsetDateTime>,
}

/// A generated base64 module discovered under the media root.
///
/// Same shape as [`AssetFile`]; it describes a derived artifact, not
/// source-of-truth content.
pub type ModuleFile = AssetFile;

/// One named import in the preloader, plus the usage evidence gathered for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    pub export_identifier: String,
    pub module_path: String,
    pub category: AssetCategory,
    /// True once a loader call referencing the identifier has been seen.
    pub used: bool,
}

/// The externally visible join of an asset with its generated module and
/// loader usage. Snapshots only; replacement goes through the pipeline and a
/// fresh scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetRecord {
    #[serde(flatten)]
    pub file: AssetFile,
    /// Where the generated module must live, recomputed every scan.
    pub expected_module_path: String,
    /// The identifier the generated module must export, recomputed every scan.
    pub expected_export_identifier: String,
    pub has_base64: bool,
    pub in_use: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_extension_case_insensitively() {
        assert_eq!(AssetCategory::from_name("button.png"), AssetCategory::Image);
        assert_eq!(AssetCategory::from_name("BANNER.JPEG"), AssetCategory::Image);
        assert_eq!(AssetCategory::from_name("theme.mp3"), AssetCategory::Audio);
        assert_eq!(AssetCategory::from_name("jingle.OGG"), AssetCategory::Audio);
        assert_eq!(AssetCategory::from_name("font.ttf"), AssetCategory::Other);
        assert_eq!(AssetCategory::from_name("README"), AssetCategory::Other);
    }

    #[test]
    fn classifies_by_final_dot_segment_only() {
        assert_eq!(
            AssetCategory::from_name("sprite.atlas.png"),
            AssetCategory::Image
        );
        assert_eq!(AssetCategory::from_name("button.png.js"), AssetCategory::Other);
    }
}
