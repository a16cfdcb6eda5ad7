//! Catalog constants and storage limits

/// The four actions every fixed-verb module carries, in declaration order
pub const VERBS: [&str; 4] = ["view", "add", "edit", "delete"];

/// Separator between a sub-module name and an action name in a leaf key
pub const LEAF_SEPARATOR: char = ':';

/// Version of the compiled-in catalog
pub const BUILTIN_CATALOG_VERSION: &str = "2024.1";

// LMDB sizing
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;
pub const MAX_DBS: u32 = 3;

// Keys in the meta database
pub const META_NEXT_ID: &str = "next_id";
pub const META_CATALOG_VERSION: &str = "catalog_version";

/// Build the leaf key for an action under a sub-module
#[inline]
pub fn leaf_key(sub_module: &str, action: &str) -> String {
    let mut k = String::with_capacity(sub_module.len() + 1 + action.len());
    k.push_str(sub_module);
    k.push(LEAF_SEPARATOR);
    k.push_str(action);
    k
}

/// Split a leaf key into (sub_module, Some(action)) or (sub_module, None)
#[inline]
pub fn split_leaf_key(key: &str) -> (&str, Option<&str>) {
    match key.split_once(LEAF_SEPARATOR) {
        Some((s, a)) => (s, Some(a)),
        None => (key, None),
    }
}

/// Position of a verb in declaration order
pub fn verb_index(verb: &str) -> Option<usize> {
    VERBS.iter().position(|v| *v == verb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_key_joins_with_separator() {
        assert_eq!(leaf_key("Fees Invoice", "Add"), "Fees Invoice:Add");
    }

    #[test]
    fn split_handles_bare_and_action_keys() {
        assert_eq!(split_leaf_key("Fees Invoice:Add"), ("Fees Invoice", Some("Add")));
        assert_eq!(split_leaf_key("Send SMS"), ("Send SMS", None));
        // Only the first separator splits
        assert_eq!(split_leaf_key("A:b:c"), ("A", Some("b:c")));
    }

    #[test]
    fn verb_order() {
        assert_eq!(verb_index("view"), Some(0));
        assert_eq!(verb_index("delete"), Some(3));
        assert_eq!(verb_index("View"), None);
    }
}
