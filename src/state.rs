//! In-memory permission state for one role
//!
//! Leaves live in a single flat map keyed by `(module, leaf key)`. Sub-module
//! and module check-states are never stored; they are computed from leaves
//! on every read.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::catalog::{Catalog, Shape, SubModule};
use crate::error::{PermError, Result};

/// Display state of a sub-module header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubModuleState {
    Unchecked,
    Partial,
    Checked,
}

impl SubModuleState {
    /// Header state from the number of true leaves out of `total`
    pub fn from_counts(on: usize, total: usize) -> Self {
        match on {
            0 => SubModuleState::Unchecked,
            n if n == total => SubModuleState::Checked,
            _ => SubModuleState::Partial,
        }
    }

    /// Any-true reading used for the header checkbox and the cascade direction
    #[inline]
    pub fn is_checked(self) -> bool {
        self != SubModuleState::Unchecked
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PermissionState {
    leaves: BTreeMap<(String, String), bool>,
}

impl PermissionState {
    /// Every catalog leaf present and false
    pub fn empty(catalog: &Catalog) -> Self {
        let mut leaves = BTreeMap::new();
        for m in catalog.modules() {
            for k in m.leaf_keys() {
                leaves.insert((m.name.clone(), k), false);
            }
        }
        PermissionState { leaves }
    }

    /// Leaf value, or None if the leaf does not exist
    pub fn get(&self, module: &str, key: &str) -> Option<bool> {
        self.leaves.get(&(module.to_string(), key.to_string())).copied()
    }

    #[inline]
    pub fn is_granted(&self, module: &str, key: &str) -> bool {
        self.get(module, key).unwrap_or(false)
    }

    pub(crate) fn cell(&mut self, module: &str, key: &str) -> Result<&mut bool> {
        self.leaves
            .get_mut(&(module.to_string(), key.to_string()))
            .ok_or_else(|| PermError::UnknownLeaf { module: module.into(), leaf: key.into() })
    }

    pub(crate) fn cells_mut(&mut self) -> impl Iterator<Item = &mut bool> {
        self.leaves.values_mut()
    }

    /// Number of leaves (granted or not)
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn granted_count(&self) -> usize {
        self.leaves.values().filter(|v| **v).count()
    }

    /// Granted `(module, leaf key)` pairs in key order
    pub fn granted(&self) -> impl Iterator<Item = (&str, &str)> {
        self.leaves
            .iter()
            .filter(|(_, v)| **v)
            .map(|((m, k), _)| (m.as_str(), k.as_str()))
    }

    /// Tri-state of a sub-module computed from its leaves
    pub fn sub_module_state(&self, catalog: &Catalog, module: &str, sub_module: &str) -> Result<SubModuleState> {
        let sub = lookup_sub(catalog, module, sub_module)?;
        let keys = sub.leaf_keys();
        let on = keys.iter().filter(|k| self.is_granted(module, k)).count();
        Ok(SubModuleState::from_counts(on, keys.len()))
    }

    /// Header check-state: true if any leaf under the sub-module is true
    pub fn sub_module_checked(&self, catalog: &Catalog, module: &str, sub_module: &str) -> Result<bool> {
        Ok(self.sub_module_state(catalog, module, sub_module)?.is_checked())
    }

    /// True if any leaf in the module is true
    pub fn module_checked(&self, catalog: &Catalog, module: &str) -> Result<bool> {
        let m = catalog.require_module(module)?;
        Ok(m.leaf_keys().iter().any(|k| self.is_granted(module, k)))
    }
}

/// Resolve a sub-module, distinguishing a missing module from a wrong shape
pub(crate) fn lookup_sub<'c>(catalog: &'c Catalog, module: &str, sub_module: &str) -> Result<&'c SubModule> {
    let m = catalog.require_module(module)?;
    if !matches!(m.shape, Shape::Tree { .. }) {
        return Err(PermError::WrongShape { module: module.into(), expected: "tree", actual: m.shape.kind() });
    }
    m.sub_module(sub_module).ok_or_else(|| PermError::UnknownSubModule {
        module: module.into(),
        sub_module: sub_module.into(),
    })
}
