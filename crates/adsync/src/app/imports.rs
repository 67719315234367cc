//! Import and loader-call analysis for the game's preload routine.
//!
//! The analyzer is a constrained text scan, not a JavaScript parser: it
//! recognizes the import and loader shapes the template actually uses.
//! Anything it fails to match counts as "no evidence of use", a false
//! negative rather than an error. Closing that gap would take a real AST
//! parse, which is out of scope.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::model::{AssetCategory, ImportBinding};

static IMPORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"import\s*\{\s*([^}]+?)\s*\}\s*from\s*['"]([^'"]+)['"]"#).unwrap()
});

static LOADER_CALL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.load\s*\.\s*(image|atlas)\s*\(").unwrap());

static AUDIO_CALL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"LoadBase64Audio\s*\(").unwrap());

static AUDIO_ENTRY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\{\s*key\s*:\s*['"]([^'"]+)['"]\s*,\s*data\s*:\s*([A-Za-z_$][A-Za-z0-9_$]*)\s*,?\s*\}"#)
        .unwrap()
});

/// Scan one source file's text into a binding table with usage flags.
pub fn analyze(source: &str) -> Vec<ImportBinding> {
    let mut bindings = collect_bindings(source);
    mark_loader_usages(source, &mut bindings);
    mark_audio_usages(source, &mut bindings);
    bindings
}

/// Named import bindings, one per identifier, `used` initially false.
///
/// Category is a path heuristic only: modules under an `audio_`-prefixed
/// name are audio, everything else is other. Audio usage evidence later
/// overrides this, since audio modules do not always carry the marker.
fn collect_bindings(source: &str) -> Vec<ImportBinding> {
    let mut bindings = Vec::new();
    for captures in IMPORT_RE.captures_iter(source) {
        let names = &captures[1];
        let module_path = &captures[2];
        let category = category_from_module_path(module_path);
        for name in names.split(',') {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            bindings.push(ImportBinding {
                export_identifier: name.to_owned(),
                module_path: module_path.to_owned(),
                category,
                used: false,
            });
        }
    }
    bindings
}

fn category_from_module_path(module_path: &str) -> AssetCategory {
    let is_audio = module_path
        .split('/')
        .any(|segment| segment.starts_with("audio_"));
    if is_audio {
        AssetCategory::Audio
    } else {
        AssetCategory::Other
    }
}

/// Mark bindings referenced from `.load.image(...)` / `.load.atlas(...)`.
fn mark_loader_usages(source: &str, bindings: &mut [ImportBinding]) {
    for call in LOADER_CALL_RE.find_iter(source) {
        let Some(arguments) = call_arguments(source, call.end() - 1) else {
            continue;
        };
        for identifier in identifiers_outside_strings(arguments) {
            for binding in bindings.iter_mut() {
                if binding.export_identifier == identifier {
                    binding.used = true;
                }
            }
        }
    }
}

/// Mark bindings referenced from a batched `LoadBase64Audio([...])` call.
///
/// Every `{ key: "...", data: <identifier> }` entry marks its identifier
/// used and forces the binding's category to audio, overriding the import
/// path heuristic.
fn mark_audio_usages(source: &str, bindings: &mut [ImportBinding]) {
    for call in AUDIO_CALL_RE.find_iter(source) {
        let Some(arguments) = call_arguments(source, call.end() - 1) else {
            continue;
        };
        for entry in AUDIO_ENTRY_RE.captures_iter(arguments) {
            let identifier = &entry[2];
            for binding in bindings.iter_mut() {
                if binding.export_identifier == identifier {
                    binding.used = true;
                    binding.category = AssetCategory::Audio;
                }
            }
        }
    }
}

/// The argument text of a call, given the byte offset of its opening paren.
///
/// Balances nested parentheses and skips string literals so quoted keys
/// never unbalance the scan. Returns `None` when the call never closes.
fn call_arguments(source: &str, open_paren: usize) -> Option<&str> {
    let bytes = source.as_bytes();
    debug_assert_eq!(bytes.get(open_paren), Some(&b'('));

    let mut depth = 0usize;
    let mut index = open_paren;
    while index < bytes.len() {
        match bytes[index] {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&source[open_paren + 1..index]);
                }
            }
            quote @ (b'"' | b'\'' | b'`') => {
                index = skip_string(bytes, index, quote)?;
            }
            _ => {}
        }
        index += 1;
    }
    None
}

/// Byte offset of the closing quote for a string starting at `start`.
fn skip_string(bytes: &[u8], start: usize, quote: u8) -> Option<usize> {
    let mut index = start + 1;
    while index < bytes.len() {
        match bytes[index] {
            b'\\' => index += 1,
            byte if byte == quote => return Some(index),
            _ => {}
        }
        index += 1;
    }
    None
}

/// Identifier tokens in `text`, ignoring anything inside string literals.
fn identifiers_outside_strings(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut identifiers = Vec::new();
    let mut index = 0;
    while index < bytes.len() {
        match bytes[index] {
            quote @ (b'"' | b'\'' | b'`') => {
                match skip_string(bytes, index, quote) {
                    Some(end) => index = end + 1,
                    None => break,
                }
            }
            byte if byte == b'_' || byte == b'$' || byte.is_ascii_alphabetic() => {
                let start = index;
                while index < bytes.len()
                    && (bytes[index] == b'_'
                        || bytes[index] == b'$'
                        || bytes[index].is_ascii_alphanumeric())
                {
                    index += 1;
                }
                identifiers.push(&text[start..index]);
            }
            _ => index += 1,
        }
    }
    identifiers
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRELOADER: &str = r#"
import { buttonPNG } from "../../media/ui_button.png.js";
import { logoPNG, splashJPG } from "../../media/branding.js";
import { themeMP3 } from "../../media/audio_theme.mp3.js";
import { clickWAV } from "../../media/sfx.js";
import { LoadBase64Audio } from "./LoadBase64Audio";

export class Preloader {
  preload() {
    this.load.image("btn", buttonPNG);
    this.load.atlas("logo", logoPNG, logoAtlasJSON);
    LoadBase64Audio(this, [
      { key: "theme", data: themeMP3 },
      { key: "click", data: clickWAV },
    ]);
  }
}
"#;

    fn binding<'a>(bindings: &'a [ImportBinding], identifier: &str) -> &'a ImportBinding {
        bindings
            .iter()
            .find(|b| b.export_identifier == identifier)
            .unwrap_or_else(|| panic!("binding {identifier} missing"))
    }

    #[test]
    fn collects_one_binding_per_named_import() {
        let bindings = analyze(PRELOADER);
        let names: Vec<_> = bindings.iter().map(|b| b.export_identifier.as_str()).collect();
        assert!(names.contains(&"buttonPNG"));
        assert!(names.contains(&"logoPNG"));
        assert!(names.contains(&"splashJPG"));
        assert!(names.contains(&"themeMP3"));
        assert!(names.contains(&"clickWAV"));
    }

    #[test]
    fn image_and_atlas_calls_mark_usage() {
        let bindings = analyze(PRELOADER);
        assert!(binding(&bindings, "buttonPNG").used);
        assert!(binding(&bindings, "logoPNG").used);
        // Imported but never passed to a loader call.
        assert!(!binding(&bindings, "splashJPG").used);
    }

    #[test]
    fn quoted_loader_keys_never_count_as_identifiers() {
        let source = r#"
import { btn } from "../../media/btn.png.js";
this.load.image("btn", other);
"#;
        let bindings = analyze(source);
        assert!(!binding(&bindings, "btn").used);
    }

    #[test]
    fn audio_entries_mark_usage_and_force_category() {
        let bindings = analyze(PRELOADER);

        let theme = binding(&bindings, "themeMP3");
        assert!(theme.used);
        assert_eq!(theme.category, AssetCategory::Audio);

        // No audio_ path marker, so the import heuristic said other; the
        // batched-loader evidence overrides it.
        let click = binding(&bindings, "clickWAV");
        assert!(click.used);
        assert_eq!(click.category, AssetCategory::Audio);
    }

    #[test]
    fn category_heuristic_reads_audio_path_segments() {
        let bindings = analyze(r#"import { themeMP3 } from "../../media/audio_theme.mp3.js";"#);
        assert_eq!(binding(&bindings, "themeMP3").category, AssetCategory::Audio);

        let bindings = analyze(r#"import { logoPNG } from "../../media/ui_logo.png.js";"#);
        assert_eq!(binding(&bindings, "logoPNG").category, AssetCategory::Other);
    }

    #[test]
    fn malformed_loader_syntax_is_only_missing_evidence() {
        let source = r#"
import { buttonPNG } from "../../media/ui_button.png.js";
this.load.image("btn", buttonPNG
"#;
        let bindings = analyze(source);
        assert!(!binding(&bindings, "buttonPNG").used);
    }

    #[test]
    fn unclosed_string_in_arguments_is_tolerated() {
        let source = "import { a } from \"m.js\";\nthis.load.image(\"k, a)";
        let bindings = analyze(source);
        assert_eq!(bindings.len(), 1);
        assert!(!binding(&bindings, "a").used);
    }
}
