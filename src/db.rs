//! LMDB environment and database handles for the grant store

use std::path::{Path, PathBuf};

use heed::types::{Bytes, Str, U64};
use heed::{Database, Env, EnvOpenOptions, RoTxn};
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::constants::{DEFAULT_MAP_SIZE, MAX_DBS, META_CATALOG_VERSION};
use crate::error::{err, Result};
use crate::grant::RoleRecord;
use crate::tx::Tx;

// Database type aliases
pub type DbStr = Database<Bytes, Str>;
pub type DbU64 = Database<Str, U64<byteorder::BigEndian>>;

/// Role id as a big-endian key, so iteration follows id order
#[inline]
pub fn key(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

/// All database handles
pub struct Dbs {
    /// role id -> JSON role record
    pub roles: DbStr,
    /// role name -> role id
    pub names: DbU64,
    pub meta: Database<Str, Str>,
}

pub(crate) fn decode(s: &str) -> Result<RoleRecord> {
    serde_json::from_str(s).map_err(err)
}

/// LMDB-backed grant store. Each save is one write transaction.
pub struct LmdbStore {
    env: Env,
    dbs: Dbs,
    path: PathBuf,
}

impl LmdbStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_map_size(path, DEFAULT_MAP_SIZE)
    }

    pub fn open_with_map_size(path: impl AsRef<Path>, map_size: usize) -> Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path).map_err(err)?;
        // SAFETY: LMDB requires no other processes access this path concurrently during open.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)
                .map_err(err)?
        };
        let mut tx = env.write_txn().map_err(err)?;
        let dbs = Dbs {
            roles: env.create_database(&mut tx, Some("roles")).map_err(err)?,
            names: env.create_database(&mut tx, Some("names")).map_err(err)?,
            meta: env.create_database(&mut tx, Some("meta")).map_err(err)?,
        };
        tx.commit().map_err(err)?;
        info!(path = %path.display(), "opened grant store");
        Ok(LmdbStore { env, dbs, path: path.to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Execute a read-only operation
    #[inline]
    pub(crate) fn read<T, F: FnOnce(&Dbs, &RoTxn) -> Result<T>>(&self, f: F) -> Result<T> {
        f(&self.dbs, &self.env.read_txn().map_err(err)?)
    }

    /// Run multiple operations in a single write transaction
    pub fn transact<T, F: FnOnce(&mut Tx) -> Result<T>>(&self, f: F) -> Result<T> {
        let mut tx = Tx::new(&self.env, &self.dbs)?;
        let r = f(&mut tx)?;
        tx.commit()?;
        Ok(r)
    }

    /// Record the catalog version in use; returns the previous one if it differs.
    ///
    /// A changed version means some stored grants may be stale and will be
    /// dropped the next time those roles are loaded.
    pub fn sync_catalog_version(&self, catalog: &Catalog) -> Result<Option<String>> {
        self.transact(|tx| {
            let prev = tx.meta(META_CATALOG_VERSION)?;
            tx.set_meta(META_CATALOG_VERSION, &catalog.version)?;
            Ok(match prev {
                Some(p) if p != catalog.version => {
                    warn!(previous = %p, current = %catalog.version, "catalog version changed");
                    Some(p)
                }
                _ => None,
            })
        })
    }

    /// Clear all databases (for testing)
    pub fn clear_all(&self) -> Result<()> {
        self.transact(|tx| tx.clear())
    }
}
