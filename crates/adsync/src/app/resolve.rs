//! Joining scanned assets, generated modules, and loader bindings.

use std::collections::HashSet;

use crate::app::naming::{derived_export_identifier, derived_module_path};
use crate::domain::model::{AssetFile, AssetRecord, ImportBinding, ModuleFile};

/// Join every asset with its expected module and usage evidence.
///
/// A pure, stateless join recomputed on every call; project trees are small
/// enough that recomputing beats carrying cache-invalidation state.
pub fn resolve(
    assets: &[AssetFile],
    modules: &[ModuleFile],
    bindings: &[ImportBinding],
) -> Vec<AssetRecord> {
    let module_paths: HashSet<&str> = modules
        .iter()
        .map(|module| module.relative_path.as_str())
        .collect();

    assets
        .iter()
        .map(|asset| {
            let expected_module_path = derived_module_path(&asset.relative_path);
            let expected_export_identifier = derived_export_identifier(&asset.name);
            let has_base64 = module_paths.contains(expected_module_path.as_str());
            let in_use = bindings
                .iter()
                .any(|binding| binding.export_identifier == expected_export_identifier && binding.used);
            AssetRecord {
                file: asset.clone(),
                expected_module_path,
                expected_export_identifier,
                has_base64,
                in_use,
            }
        })
        .collect()
}
