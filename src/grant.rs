//! Persisted grant shapes

use serde::{Deserialize, Deserializer, Serialize};

/// One module's granted leaf keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantEntry {
    pub module: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub actions: Vec<String>,
}

impl GrantEntry {
    pub fn new<I, S>(module: impl Into<String>, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        GrantEntry {
            module: module.into(),
            actions: actions.into_iter().map(Into::into).collect(),
        }
    }
}

/// A role as stored: `permissions` absent or null reads as no grants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub id: u64,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub permissions: Vec<GrantEntry>,
}

impl RoleRecord {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        RoleRecord { id, name: name.into(), permissions: Vec::new() }
    }
}

fn null_as_empty<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(d)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_and_null_permissions_are_empty() {
        let a: RoleRecord = serde_json::from_str(r#"{"id":1,"name":"instructor"}"#).unwrap();
        let b: RoleRecord = serde_json::from_str(r#"{"id":1,"name":"instructor","permissions":null}"#).unwrap();
        assert!(a.permissions.is_empty());
        assert_eq!(a, b);
    }

    #[test]
    fn wire_shape() {
        let r = RoleRecord {
            id: 7,
            name: "accountant".into(),
            permissions: vec![GrantEntry::new("fees", ["Fees Invoice:Add"])],
        };
        assert_eq!(
            serde_json::to_string(&r).unwrap(),
            r#"{"id":7,"name":"accountant","permissions":[{"module":"fees","actions":["Fees Invoice:Add"]}]}"#
        );
    }
}
