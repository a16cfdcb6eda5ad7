//! Grant list -> permission state

use serde::Serialize;
use tracing::debug;

use crate::catalog::Catalog;
use crate::grant::GrantEntry;
use crate::state::PermissionState;

/// A persisted grant the current catalog no longer recognises
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StaleGrant {
    Module { module: String },
    Leaf { module: String, leaf: String },
}

/// Build a full state from a sparse grant list, dropping stale grants
pub fn hydrate(catalog: &Catalog, grants: &[GrantEntry]) -> PermissionState {
    hydrate_with_report(catalog, grants).0
}

/// Like `hydrate`, also returning every grant that was dropped
pub fn hydrate_with_report(catalog: &Catalog, grants: &[GrantEntry]) -> (PermissionState, Vec<StaleGrant>) {
    let mut state = PermissionState::empty(catalog);
    let mut stale = Vec::new();
    for g in grants {
        if catalog.module(&g.module).is_none() {
            debug!(module = %g.module, "dropping grant for unknown module");
            stale.push(StaleGrant::Module { module: g.module.clone() });
            continue;
        }
        for a in &g.actions {
            match state.cell(&g.module, a) {
                Ok(cell) => *cell = true,
                Err(_) => {
                    debug!(module = %g.module, leaf = %a, "dropping grant for unknown leaf");
                    stale.push(StaleGrant::Leaf { module: g.module.clone(), leaf: a.clone() });
                }
            }
        }
    }
    (state, stale)
}
