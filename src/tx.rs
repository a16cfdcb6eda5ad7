//! Transaction wrapper for batched writes

use heed::{Env, RwTxn};
use tracing::info;

use crate::constants::META_NEXT_ID;
use crate::db::{decode, key, Dbs};
use crate::error::{err, PermError, Result};
use crate::grant::{GrantEntry, RoleRecord};

/// Transaction wrapper for batched writes
pub struct Tx<'a> {
    txn: RwTxn<'a>,
    dbs: &'a Dbs,
}

impl<'a> Tx<'a> {
    #[inline]
    pub(crate) fn new(env: &'a Env, dbs: &'a Dbs) -> Result<Self> {
        Ok(Tx { txn: env.write_txn().map_err(err)?, dbs })
    }

    #[inline]
    pub(crate) fn commit(self) -> Result<()> {
        self.txn.commit().map_err(err)
    }

    /// Read a role inside this transaction
    pub fn role(&self, id: u64) -> Result<Option<RoleRecord>> {
        match self.dbs.roles.get(&self.txn, &key(id)).map_err(err)? {
            Some(s) => decode(s).map(Some),
            None => Ok(None),
        }
    }

    pub fn role_id(&self, name: &str) -> Result<Option<u64>> {
        self.dbs.names.get(&self.txn, name).map_err(err)
    }

    fn put_role(&mut self, r: &RoleRecord) -> Result<()> {
        let s = serde_json::to_string(r).map_err(err)?;
        self.dbs.roles.put(&mut self.txn, &key(r.id), &s).map_err(err)
    }

    /// Create a role with no permissions
    pub fn create_role(&mut self, name: &str) -> Result<u64> {
        if name.trim().is_empty() {
            return Err(PermError::InvalidRoleName(name.into()));
        }
        if self.role_id(name)?.is_some() {
            return Err(PermError::DuplicateRole(name.into()));
        }
        let id = self.next_id()?;
        self.put_role(&RoleRecord::new(id, name))?;
        self.dbs.names.put(&mut self.txn, name, &id).map_err(err)?;
        self.set_next_id(id + 1)?;
        info!(role = id, name, "created role");
        Ok(id)
    }

    /// Rename a role, keeping its permissions
    pub fn rename_role(&mut self, id: u64, new_name: &str) -> Result<()> {
        if new_name.trim().is_empty() {
            return Err(PermError::InvalidRoleName(new_name.into()));
        }
        let mut r = self.role(id)?.ok_or_else(|| PermError::RoleNotFound(id.to_string()))?;
        match self.role_id(new_name)? {
            Some(other) if other != id => return Err(PermError::DuplicateRole(new_name.into())),
            _ => {}
        }
        self.dbs.names.delete(&mut self.txn, &r.name).map_err(err)?;
        r.name = new_name.to_string();
        self.put_role(&r)?;
        self.dbs.names.put(&mut self.txn, new_name, &id).map_err(err)
    }

    /// Delete a role and its name index entry
    pub fn delete_role(&mut self, id: u64) -> Result<bool> {
        let Some(r) = self.role(id)? else {
            return Ok(false);
        };
        self.dbs.names.delete(&mut self.txn, &r.name).map_err(err)?;
        self.dbs.roles.delete(&mut self.txn, &key(id)).map_err(err)
    }

    /// Replace a role's permission list wholesale
    pub fn set_permissions(&mut self, id: u64, permissions: &[GrantEntry]) -> Result<()> {
        let mut r = self.role(id)?.ok_or_else(|| PermError::RoleNotFound(id.to_string()))?;
        r.permissions = permissions.to_vec();
        self.put_role(&r)
    }

    pub(crate) fn meta(&self, k: &str) -> Result<Option<String>> {
        Ok(self.dbs.meta.get(&self.txn, k).map_err(err)?.map(str::to_string))
    }

    pub(crate) fn set_meta(&mut self, k: &str, v: &str) -> Result<()> {
        self.dbs.meta.put(&mut self.txn, k, v).map_err(err)
    }

    pub(crate) fn next_id(&self) -> Result<u64> {
        Ok(self.meta(META_NEXT_ID)?.and_then(|s| s.parse().ok()).unwrap_or(1u64))
    }

    pub(crate) fn set_next_id(&mut self, id: u64) -> Result<()> {
        self.set_meta(META_NEXT_ID, &id.to_string())
    }

    pub(crate) fn clear(&mut self) -> Result<()> {
        self.dbs.roles.clear(&mut self.txn).map_err(err)?;
        self.dbs.names.clear(&mut self.txn).map_err(err)?;
        self.dbs.meta.clear(&mut self.txn).map_err(err)
    }
}
