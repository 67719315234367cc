//! Replacing an asset's binary content and regenerating its embedded module.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::domain::errors::AdsyncError;
use crate::domain::model::{AssetCategory, AssetRecord};
use crate::infra::fs::DirHandle;

/// Extension → MIME table for generated data URIs. Anything missing here
/// (including `ogg`, which the classifier accepts as audio) falls back to
/// the generic binary type; existing generated modules carry the same
/// fallback, so it stays.
const MIME_TYPES: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
];

const FALLBACK_MIME: &str = "application/octet-stream";

/// Identifiers produced by a completed replacement. The caller re-runs the
/// dependency resolution to observe the new state; nothing is cached here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementOutcome {
    pub module_path: String,
    pub export_identifier: String,
}

/// MIME type for a file name, from its final dot-segment.
pub fn mime_type_for(file_name: &str) -> &'static str {
    let Some((_, ext)) = file_name.rsplit_once('.') else {
        return FALLBACK_MIME;
    };
    let ext = ext.to_ascii_lowercase();
    MIME_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
        .unwrap_or(FALLBACK_MIME)
}

/// The exact source text of a generated module. No trailing newline; the
/// existing modules have none and the format must match byte-for-byte.
pub fn generated_module_source(export_identifier: &str, mime_type: &str, bytes: &[u8]) -> String {
    format!(
        "export const {export_identifier} = \"data:{mime_type};base64,{data}\";",
        data = STANDARD.encode(bytes)
    )
}

/// Replace an asset's binary content and regenerate its base64 module.
///
/// The category precondition is checked before any write. The module write
/// and the asset overwrite are then independent: a failure between them
/// leaves the pair inconsistent until the operation is retried, which is
/// safe because both writes are deterministic overwrites of the same target
/// paths. That retry is the entire consistency contract; there is no
/// rollback.
pub fn replace_asset(
    record: &AssetRecord,
    new_bytes: &[u8],
    new_file_name: &str,
    media: &DirHandle,
    assets: &DirHandle,
) -> Result<ReplacementOutcome, AdsyncError> {
    let expected = record.file.category;
    let found = AssetCategory::from_name(new_file_name);
    if expected != found {
        return Err(AdsyncError::CategoryMismatch { expected, found });
    }

    let mime_type = mime_type_for(new_file_name);
    let module_source =
        generated_module_source(&record.expected_export_identifier, mime_type, new_bytes);

    media.write(&record.expected_module_path, module_source.as_bytes())?;
    tracing::debug!(module = %record.expected_module_path, "wrote generated module");

    assets.write(&record.file.relative_path, new_bytes)?;
    tracing::debug!(asset = %record.file.relative_path, "overwrote original asset");

    Ok(ReplacementOutcome {
        module_path: record.expected_module_path.clone(),
        export_identifier: record.expected_export_identifier.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::AssetFile;

    fn record(name: &str, relative_path: &str) -> AssetRecord {
        AssetRecord {
            file: AssetFile {
                name: name.to_owned(),
                relative_path: relative_path.to_owned(),
                category: AssetCategory::from_name(name),
                modified: None,
            },
            expected_module_path: crate::app::naming::derived_module_path(relative_path),
            expected_export_identifier: crate::app::naming::derived_export_identifier(name),
            has_base64: false,
            in_use: false,
        }
    }

    fn handles() -> (tempfile::TempDir, DirHandle, DirHandle) {
        let temp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("media")).unwrap();
        std::fs::create_dir_all(temp.path().join("assets")).unwrap();
        let media = DirHandle::open(temp.path().join("media")).unwrap();
        let assets = DirHandle::open(temp.path().join("assets")).unwrap();
        (temp, media, assets)
    }

    #[test]
    fn generated_module_matches_fixed_shape() {
        let source = generated_module_source("buttonPNG", "image/png", b"hello world");
        assert_eq!(
            source,
            "export const buttonPNG = \"data:image/png;base64,aGVsbG8gd29ybGQ=\";"
        );
    }

    #[test]
    fn mime_lookup_falls_back_to_octet_stream() {
        assert_eq!(mime_type_for("a.png"), "image/png");
        assert_eq!(mime_type_for("a.JPG"), "image/jpeg");
        // ogg is audio to the classifier but absent from the MIME table.
        assert_eq!(mime_type_for("a.ogg"), "application/octet-stream");
        assert_eq!(mime_type_for("noext"), "application/octet-stream");
    }

    #[test]
    fn writes_module_and_overwrites_asset() {
        let (_temp, media, assets) = handles();
        assets.write("ui/button.png", b"old").unwrap();
        let record = record("button.png", "ui/button.png");

        let outcome = replace_asset(&record, b"new bytes", "swap.png", &media, &assets).unwrap();
        assert_eq!(outcome.module_path, "ui_button.png.js");
        assert_eq!(outcome.export_identifier, "buttonPNG");

        let module = media.read_to_string("ui_button.png.js").unwrap();
        assert!(module.starts_with("export const buttonPNG = \"data:image/png;base64,"));
        assert_eq!(assets.read("ui/button.png").unwrap(), b"new bytes");
    }

    #[test]
    fn category_mismatch_writes_nothing() {
        let (_temp, media, assets) = handles();
        assets.write("ui/button.png", b"old").unwrap();
        let record = record("button.png", "ui/button.png");

        let err = replace_asset(&record, b"sound", "swap.mp3", &media, &assets).unwrap_err();
        assert!(matches!(
            err,
            AdsyncError::CategoryMismatch {
                expected: AssetCategory::Image,
                found: AssetCategory::Audio,
            }
        ));
        assert!(!media.exists("ui_button.png.js"));
        assert_eq!(assets.read("ui/button.png").unwrap(), b"old");
    }

    #[test]
    fn retry_with_identical_inputs_is_byte_identical() {
        let (_temp, media, assets) = handles();
        assets.write("ui/button.png", b"old").unwrap();
        let record = record("button.png", "ui/button.png");

        replace_asset(&record, b"new bytes", "swap.png", &media, &assets).unwrap();
        let first_module = media.read("ui_button.png.js").unwrap();
        let first_asset = assets.read("ui/button.png").unwrap();

        replace_asset(&record, b"new bytes", "swap.png", &media, &assets).unwrap();
        assert_eq!(media.read("ui_button.png.js").unwrap(), first_module);
        assert_eq!(assets.read("ui/button.png").unwrap(), first_asset);
    }
}
