//! Render model for an editor: the catalog tree annotated with leaf values
//! and derived header states.

use serde::Serialize;

use crate::catalog::{Catalog, Module, Shape, SubModule};
use crate::constants::leaf_key;
use crate::state::{PermissionState, SubModuleState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeafNode {
    pub key: String,
    pub label: String,
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubModuleNode {
    pub name: String,
    /// Leaf key when the sub-module has no actions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub checked: bool,
    pub state: SubModuleState,
    pub actions: Vec<LeafNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleNode {
    pub name: String,
    pub title: String,
    pub kind: &'static str,
    pub checked: bool,
    /// Flat toggles or fixed verbs
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub leaves: Vec<LeafNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sub_modules: Vec<SubModuleNode>,
}

/// Build the full tree for every module in catalog order
pub fn tree(catalog: &Catalog, state: &PermissionState) -> Vec<ModuleNode> {
    catalog.modules().iter().map(|m| module_node(m, state)).collect()
}

fn module_node(m: &Module, state: &PermissionState) -> ModuleNode {
    let leaf = |key: String| LeafNode {
        checked: state.is_granted(&m.name, &key),
        label: key.clone(),
        key,
    };
    let (leaves, sub_modules): (Vec<LeafNode>, Vec<SubModuleNode>) = match &m.shape {
        Shape::Flat { .. } | Shape::Verbs => (m.leaf_keys().into_iter().map(leaf).collect(), Vec::new()),
        Shape::Tree { sub_modules } => (Vec::new(), sub_modules.iter().map(|s| sub_node(&m.name, s, state)).collect()),
    };
    let checked = leaves.iter().any(|l| l.checked) || sub_modules.iter().any(|s| s.checked);
    ModuleNode {
        name: m.name.clone(),
        title: m.label().to_string(),
        kind: m.shape.kind(),
        checked,
        leaves,
        sub_modules,
    }
}

fn sub_node(module: &str, s: &SubModule, state: &PermissionState) -> SubModuleNode {
    let actions: Vec<LeafNode> = s
        .actions()
        .iter()
        .map(|a| {
            let key = leaf_key(s.name(), a);
            LeafNode { checked: state.is_granted(module, &key), label: a.clone(), key }
        })
        .collect();
    let (key, on, total) = match s {
        SubModule::Leaf { name } => (Some(name.clone()), usize::from(state.is_granted(module, name)), 1),
        SubModule::Actions { .. } => (None, actions.iter().filter(|a| a.checked).count(), actions.len()),
    };
    let st = SubModuleState::from_counts(on, total);
    SubModuleNode {
        name: s.name().to_string(),
        key,
        checked: st.is_checked(),
        state: st,
        actions,
    }
}
