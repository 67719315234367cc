//! Derived-name formulas linking an asset to its generated module.
//!
//! Both formulas are deterministic and intentionally lossy: directory
//! structure collapses to a single underscore join, so two assets sharing a
//! base name in different folders collide on the same module path and export
//! identifier. That ambiguity is part of the on-disk naming convention the
//! existing generated modules already follow, and is kept as-is.

/// Prefix stripped from asset paths before deriving a module name.
pub const ASSET_ROOT_PREFIX: &str = "public/assets/";

/// Suffix of every generated module file.
pub const MODULE_SUFFIX: &str = ".js";

/// Expected generated-module file name for an asset's relative path.
///
/// `public/assets/ui/button.png` and `ui/button.png` both map to
/// `ui_button.png.js`; the separator positions are not recoverable.
pub fn derived_module_path(asset_relative_path: &str) -> String {
    let stripped = asset_relative_path
        .strip_prefix(ASSET_ROOT_PREFIX)
        .unwrap_or(asset_relative_path);
    let mut path: String = stripped
        .chars()
        .map(|ch| if ch == '/' || ch == '\\' { '_' } else { ch })
        .collect();
    path.push_str(MODULE_SUFFIX);
    path
}

/// Expected export identifier for a file name.
///
/// The base (text before the first `.`) is camel-cased on `-`/`_`/whitespace
/// boundaries and stripped to `[A-Za-z0-9_]`; the text after the last `.` is
/// upper-cased and appended. A name with no dot therefore appends itself
/// (`README` → `READMEREADME`), matching the convention the generated
/// modules were produced with.
pub fn derived_export_identifier(file_name: &str) -> String {
    let base = file_name.split('.').next().unwrap_or(file_name);
    let ext = file_name.rsplit('.').next().unwrap_or(file_name);

    let mut ident = String::with_capacity(file_name.len());
    let mut upper_next = false;
    for ch in base.chars() {
        if ch == '-' || ch == '_' || ch.is_whitespace() {
            upper_next = true;
        } else if upper_next {
            ident.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            ident.push(ch);
        }
    }
    ident.retain(|ch| ch.is_ascii_alphanumeric() || ch == '_');

    ident.push_str(&ext.to_uppercase());
    ident
}
