//! Permission catalog: the static description of every module and its leaves
//!
//! A module has exactly one shape:
//! - `Flat`: independent named toggles
//! - `Tree`: sub-modules, each either a bare leaf or a list of actions
//! - `Verbs`: the fixed view/add/edit/delete set
//!
//! The catalog is the only source of legal `(module, leaf key)` pairs.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{leaf_key, split_leaf_key, verb_index, LEAF_SEPARATOR, VERBS};
use crate::error::{err, PermError, Result};

/// A sub-module inside a tree module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSubModule", into = "RawSubModule")]
pub enum SubModule {
    /// No actions: the sub-module name is itself the leaf key
    Leaf { name: String },
    /// One or more actions, keyed `"<name>:<action>"`
    Actions { name: String, actions: Vec<String> },
}

#[derive(Serialize, Deserialize)]
struct RawSubModule {
    name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    actions: Vec<String>,
}

impl From<RawSubModule> for SubModule {
    fn from(r: RawSubModule) -> Self {
        if r.actions.is_empty() {
            SubModule::Leaf { name: r.name }
        } else {
            SubModule::Actions { name: r.name, actions: r.actions }
        }
    }
}

impl From<SubModule> for RawSubModule {
    fn from(s: SubModule) -> Self {
        match s {
            SubModule::Leaf { name } => RawSubModule { name, actions: Vec::new() },
            SubModule::Actions { name, actions } => RawSubModule { name, actions },
        }
    }
}

impl SubModule {
    pub fn leaf(name: impl Into<String>) -> Self {
        SubModule::Leaf { name: name.into() }
    }

    /// Build a sub-module; an empty action list yields a `Leaf`
    pub fn with_actions<I, S>(name: impl Into<String>, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RawSubModule {
            name: name.into(),
            actions: actions.into_iter().map(Into::into).collect(),
        }
        .into()
    }

    pub fn name(&self) -> &str {
        match self {
            SubModule::Leaf { name } | SubModule::Actions { name, .. } => name,
        }
    }

    pub fn actions(&self) -> &[String] {
        match self {
            SubModule::Leaf { .. } => &[],
            SubModule::Actions { actions, .. } => actions,
        }
    }

    /// Leaf keys under this sub-module, in declaration order
    pub fn leaf_keys(&self) -> Vec<String> {
        match self {
            SubModule::Leaf { name } => vec![name.clone()],
            SubModule::Actions { name, actions } => actions.iter().map(|a| leaf_key(name, a)).collect(),
        }
    }
}

/// Shape of a module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Shape {
    Flat { toggles: Vec<String> },
    Tree { sub_modules: Vec<SubModule> },
    Verbs,
}

impl Shape {
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Flat { .. } => "flat",
            Shape::Tree { .. } => "tree",
            Shape::Verbs => "verbs",
        }
    }
}

/// A top-level permission unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub shape: Shape,
}

impl Module {
    pub fn flat<I, S>(name: impl Into<String>, toggles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Module {
            name: name.into(),
            title: None,
            shape: Shape::Flat { toggles: toggles.into_iter().map(Into::into).collect() },
        }
    }

    pub fn tree(name: impl Into<String>, sub_modules: Vec<SubModule>) -> Self {
        Module { name: name.into(), title: None, shape: Shape::Tree { sub_modules } }
    }

    pub fn verbs(name: impl Into<String>) -> Self {
        Module { name: name.into(), title: None, shape: Shape::Verbs }
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Display title, falling back to the module name
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }

    /// Every leaf key of this module, in declaration order
    pub fn leaf_keys(&self) -> Vec<String> {
        match &self.shape {
            Shape::Flat { toggles } => toggles.clone(),
            Shape::Tree { sub_modules } => sub_modules.iter().flat_map(SubModule::leaf_keys).collect(),
            Shape::Verbs => VERBS.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn leaf_count(&self) -> usize {
        match &self.shape {
            Shape::Flat { toggles } => toggles.len(),
            Shape::Tree { sub_modules } => sub_modules.iter().map(|s| s.actions().len().max(1)).sum(),
            Shape::Verbs => VERBS.len(),
        }
    }

    /// Check whether `key` is a legal leaf of this module (no allocation)
    pub fn has_leaf(&self, key: &str) -> bool {
        match &self.shape {
            Shape::Flat { toggles } => toggles.iter().any(|t| t == key),
            Shape::Verbs => verb_index(key).is_some(),
            Shape::Tree { sub_modules } => {
                let (sub, action) = split_leaf_key(key);
                match (self.find_sub(sub, sub_modules), action) {
                    (Some(SubModule::Leaf { .. }), None) => true,
                    (Some(SubModule::Actions { actions, .. }), Some(a)) => actions.iter().any(|x| x == a),
                    _ => false,
                }
            }
        }
    }

    pub fn sub_module(&self, name: &str) -> Option<&SubModule> {
        match &self.shape {
            Shape::Tree { sub_modules } => self.find_sub(name, sub_modules),
            _ => None,
        }
    }

    pub fn sub_modules(&self) -> &[SubModule] {
        match &self.shape {
            Shape::Tree { sub_modules } => sub_modules,
            _ => &[],
        }
    }

    fn find_sub<'a>(&self, name: &str, subs: &'a [SubModule]) -> Option<&'a SubModule> {
        subs.iter().find(|s| s.name() == name)
    }

    fn validate(&self) -> Result<()> {
        let bad = |msg: String| Err(PermError::InvalidCatalog(format!("module {:?}: {}", self.name, msg)));
        if self.name.trim().is_empty() {
            return Err(PermError::InvalidCatalog("empty module name".into()));
        }
        match &self.shape {
            Shape::Flat { toggles } if toggles.is_empty() => return bad("flat module has no toggles".into()),
            Shape::Flat { toggles } => {
                if let Some(t) = toggles.iter().find(|t| t.contains(LEAF_SEPARATOR)) {
                    return bad(format!("toggle {:?} contains {:?}", t, LEAF_SEPARATOR));
                }
            }
            Shape::Tree { sub_modules } if sub_modules.is_empty() => return bad("tree module has no sub-modules".into()),
            Shape::Tree { sub_modules } => {
                for s in sub_modules {
                    if s.name().trim().is_empty() {
                        return bad("empty sub-module name".into());
                    }
                    if s.name().contains(LEAF_SEPARATOR) {
                        return bad(format!("sub-module {:?} contains {:?}", s.name(), LEAF_SEPARATOR));
                    }
                    if s.actions().iter().any(|a| a.trim().is_empty()) {
                        return bad(format!("empty action in sub-module {:?}", s.name()));
                    }
                }
                let mut names = HashSet::new();
                if let Some(dup) = sub_modules.iter().find(|s| !names.insert(s.name())) {
                    return bad(format!("duplicate sub-module {:?}", dup.name()));
                }
            }
            _ => {}
        }
        let keys = self.leaf_keys();
        if let Some(k) = keys.iter().find(|k| k.trim().is_empty()) {
            return bad(format!("empty leaf key {:?}", k));
        }
        let mut seen = HashSet::with_capacity(keys.len());
        if let Some(dup) = keys.iter().find(|k| !seen.insert(k.as_str())) {
            return bad(format!("duplicate leaf key {:?}", dup));
        }
        Ok(())
    }
}

/// Ordered, versioned list of modules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub version: String,
    modules: Vec<Module>,
}

impl Catalog {
    /// Build and validate a catalog
    pub fn new(version: impl Into<String>, modules: Vec<Module>) -> Result<Self> {
        let c = Catalog { version: version.into(), modules };
        c.validate()?;
        Ok(c)
    }

    pub(crate) fn new_unchecked(version: impl Into<String>, modules: Vec<Module>) -> Self {
        Catalog { version: version.into(), modules }
    }

    /// The compiled-in school catalog, built once per process
    pub fn builtin() -> &'static Catalog {
        crate::builtin::catalog()
    }

    pub fn from_json(s: &str) -> Result<Self> {
        let c: Catalog = serde_json::from_str(s).map_err(|e| PermError::InvalidCatalog(e.to_string()))?;
        c.validate()?;
        Ok(c)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path.as_ref()).map_err(err)?;
        Self::from_json(&s)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(err)
    }

    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::with_capacity(self.modules.len());
        for m in &self.modules {
            m.validate()?;
            if !names.insert(m.name.as_str()) {
                return Err(PermError::InvalidCatalog(format!("duplicate module {:?}", m.name)));
            }
        }
        Ok(())
    }

    /// All modules in declaration order
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub fn require_module(&self, name: &str) -> Result<&Module> {
        self.module(name).ok_or_else(|| PermError::UnknownModule(name.into()))
    }

    pub fn leaf_keys(&self, module: &str) -> Result<Vec<String>> {
        Ok(self.require_module(module)?.leaf_keys())
    }

    pub fn is_leaf(&self, module: &str, key: &str) -> bool {
        self.module(module).map(|m| m.has_leaf(key)).unwrap_or(false)
    }

    /// Total number of leaves across every module
    pub fn leaf_count(&self) -> usize {
        self.modules.iter().map(Module::leaf_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_action_list_collapses_to_leaf() {
        assert_eq!(SubModule::with_actions("Send SMS", Vec::<String>::new()), SubModule::leaf("Send SMS"));
        let s: SubModule = serde_json::from_str(r#"{"name":"Send SMS","actions":[]}"#).unwrap();
        assert_eq!(s, SubModule::leaf("Send SMS"));
    }

    #[test]
    fn leaf_count_matches_keys() {
        let m = Module::tree("fees", vec![
            SubModule::with_actions("Fees Invoice", ["Add", "Edit", "Delete"]),
            SubModule::leaf("Search Due Fees"),
        ]);
        assert_eq!(m.leaf_count(), m.leaf_keys().len());
        assert_eq!(m.leaf_count(), 4);
    }
}
