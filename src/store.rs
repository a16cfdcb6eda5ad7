//! Grant store boundary: load and save one role's permission list

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tracing::{debug, info};

use crate::db::{decode, key, LmdbStore};
use crate::error::{err, PermError, Result};
use crate::grant::{GrantEntry, RoleRecord};

/// Persistence for role permission records
pub trait GrantStore {
    /// Fetch a role's record. Absent permissions read as an empty list.
    fn load(&self, role: u64) -> Result<RoleRecord>;

    /// Replace a role's permission list in one atomic write
    fn save(&self, role: u64, permissions: &[GrantEntry]) -> Result<()>;
}

impl GrantStore for LmdbStore {
    fn load(&self, role: u64) -> Result<RoleRecord> {
        debug!(role, "loading role");
        self.role(role)?.ok_or_else(|| PermError::RoleNotFound(role.to_string()))
    }

    fn save(&self, role: u64, permissions: &[GrantEntry]) -> Result<()> {
        self.transact(|tx| tx.set_permissions(role, permissions))?;
        info!(role, modules = permissions.len(), "saved permissions");
        Ok(())
    }
}

impl LmdbStore {
    pub fn role(&self, id: u64) -> Result<Option<RoleRecord>> {
        self.read(|d, tx| match d.roles.get(tx, &key(id)).map_err(err)? {
            Some(s) => decode(s).map(Some),
            None => Ok(None),
        })
    }

    pub fn find_role(&self, name: &str) -> Result<Option<u64>> {
        self.read(|d, tx| d.names.get(tx, name).map_err(err))
    }

    /// All roles in id order
    pub fn list_roles(&self) -> Result<Vec<RoleRecord>> {
        self.read(|d, tx| {
            let mut r = Vec::new();
            for item in d.roles.iter(tx).map_err(err)? {
                let (_, v) = item.map_err(err)?;
                r.push(decode(v)?);
            }
            Ok(r)
        })
    }

    pub fn create_role(&self, name: &str) -> Result<u64> {
        self.transact(|tx| tx.create_role(name))
    }

    pub fn rename_role(&self, id: u64, new_name: &str) -> Result<()> {
        self.transact(|tx| tx.rename_role(id, new_name))
    }

    pub fn delete_role(&self, id: u64) -> Result<bool> {
        self.transact(|tx| tx.delete_role(id))
    }
}

/// In-memory store. Loads and saves can be made to fail on demand.
#[derive(Default)]
pub struct MemoryStore {
    roles: Mutex<BTreeMap<u64, RoleRecord>>,
    fail_loads: AtomicBool,
    fail_saves: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a role with the given permissions, returning its id
    pub fn insert(&self, name: &str, permissions: Vec<GrantEntry>) -> u64 {
        let mut roles = self.roles.lock().unwrap_or_else(|p| p.into_inner());
        let id = roles.keys().next_back().map_or(1, |k| k + 1);
        roles.insert(id, RoleRecord { id, name: name.into(), permissions });
        id
    }

    pub fn get(&self, id: u64) -> Option<RoleRecord> {
        self.roles.lock().unwrap_or_else(|p| p.into_inner()).get(&id).cloned()
    }

    pub fn fail_loads(&self, on: bool) {
        self.fail_loads.store(on, Ordering::SeqCst);
    }

    pub fn fail_saves(&self, on: bool) {
        self.fail_saves.store(on, Ordering::SeqCst);
    }
}

impl GrantStore for MemoryStore {
    fn load(&self, role: u64) -> Result<RoleRecord> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(PermError::Store("store unavailable".into()));
        }
        self.get(role).ok_or_else(|| PermError::RoleNotFound(role.to_string()))
    }

    fn save(&self, role: u64, permissions: &[GrantEntry]) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(PermError::Store("store unavailable".into()));
        }
        let mut roles = self.roles.lock().unwrap_or_else(|p| p.into_inner());
        let r = roles.get_mut(&role).ok_or_else(|| PermError::RoleNotFound(role.to_string()))?;
        r.permissions = permissions.to_vec();
        Ok(())
    }
}
