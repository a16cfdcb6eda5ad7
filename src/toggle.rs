//! Toggle engine - the only way leaf values change
//!
//! Every operation validates against the catalog first; a rejected toggle
//! leaves the state untouched.

use tracing::warn;

use crate::catalog::{Catalog, Shape};
use crate::constants::verb_index;
use crate::error::{PermError, Result};
use crate::state::{lookup_sub, PermissionState};

/// Reject keys the catalog does not define, logging them as defects.
/// A pair under an unknown module is an unknown leaf too.
fn require_leaf(catalog: &Catalog, module: &str, key: &str) -> Result<()> {
    if catalog.is_leaf(module, key) {
        Ok(())
    } else {
        warn!(module, leaf = key, "rejected toggle of unknown leaf");
        Err(PermError::UnknownLeaf { module: module.into(), leaf: key.into() })
    }
}

/// Log a rejected header or verb toggle and pass the error through
fn rejected(e: PermError) -> PermError {
    warn!(error = %e, "rejected toggle");
    e
}

impl PermissionState {
    /// Flip exactly one leaf. Returns the new value.
    pub fn toggle_leaf(&mut self, catalog: &Catalog, module: &str, key: &str) -> Result<bool> {
        require_leaf(catalog, module, key)?;
        let cell = self.cell(module, key)?;
        *cell = !*cell;
        Ok(*cell)
    }

    /// Set one leaf to `value` (idempotent)
    pub fn set_leaf(&mut self, catalog: &Catalog, module: &str, key: &str, value: bool) -> Result<()> {
        require_leaf(catalog, module, key)?;
        *self.cell(module, key)? = value;
        Ok(())
    }

    /// Cascade a header click to every leaf under a sub-module.
    ///
    /// Any leaf true (including a mixed sub-module) clears all of them;
    /// all false sets all of them. Returns the new header state.
    pub fn toggle_sub_module(&mut self, catalog: &Catalog, module: &str, sub_module: &str) -> Result<bool> {
        let sub = lookup_sub(catalog, module, sub_module).map_err(rejected)?;
        let keys = sub.leaf_keys();
        let next = !keys.iter().any(|k| self.is_granted(module, k));
        self.set_all(module, &keys, next)?;
        Ok(next)
    }

    /// Flip one of the four verbs of a fixed-verb module
    pub fn toggle_fixed_verb(&mut self, catalog: &Catalog, module: &str, verb: &str) -> Result<bool> {
        let m = catalog.require_module(module).map_err(rejected)?;
        if m.shape != Shape::Verbs {
            return Err(rejected(PermError::WrongShape {
                module: module.into(),
                expected: "verbs",
                actual: m.shape.kind(),
            }));
        }
        if verb_index(verb).is_none() {
            warn!(module, verb, "rejected toggle of unknown verb");
            return Err(PermError::UnknownLeaf { module: module.into(), leaf: verb.into() });
        }
        self.toggle_leaf(catalog, module, verb)
    }

    /// Module-wide cascade with the same any-true rule as sub-modules
    pub fn toggle_module(&mut self, catalog: &Catalog, module: &str) -> Result<bool> {
        let keys = catalog.leaf_keys(module).map_err(rejected)?;
        let next = !keys.iter().any(|k| self.is_granted(module, k));
        self.set_all(module, &keys, next)?;
        Ok(next)
    }

    fn set_all(&mut self, module: &str, keys: &[String], value: bool) -> Result<()> {
        // Resolve every cell before writing so a mismatched state is rejected whole
        for k in keys {
            self.cell(module, k)?;
        }
        for k in keys {
            *self.cell(module, k)? = value;
        }
        Ok(())
    }

    /// Reset every leaf to false
    pub fn clear(&mut self) {
        self.cells_mut().for_each(|v| *v = false);
    }
}
