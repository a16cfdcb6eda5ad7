//! Permission state -> sparse grant list

use crate::catalog::Catalog;
use crate::grant::GrantEntry;
use crate::state::PermissionState;

/// Emit one entry per module with at least one true leaf, in catalog order.
/// Actions follow catalog declaration order.
pub fn flatten(catalog: &Catalog, state: &PermissionState) -> Vec<GrantEntry> {
    catalog
        .modules()
        .iter()
        .filter_map(|m| {
            let actions: Vec<String> = m
                .leaf_keys()
                .into_iter()
                .filter(|k| state.is_granted(&m.name, k))
                .collect();
            (!actions.is_empty()).then(|| GrantEntry { module: m.name.clone(), actions })
        })
        .collect()
}
