//! Server configuration from command line and environment

use std::path::PathBuf;

use clap::Parser;

use crate::catalog::Catalog;
use crate::constants::DEFAULT_MAP_SIZE;
use crate::db::LmdbStore;
use crate::error::Result;

#[derive(Debug, Clone, Parser)]
#[command(name = "roleperm-server", version, about = "Role permission editor API")]
pub struct ServerConfig {
    /// LMDB directory for the grant store
    #[arg(short = 'd', long, env = "ROLEPERM_DB", default_value = "./data/roleperm.mdb")]
    pub db_path: PathBuf,

    #[arg(long, env = "ROLEPERM_BIND", default_value = "0.0.0.0")]
    pub bind: String,

    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// JSON catalog file; the compiled-in catalog is used when absent
    #[arg(short, long = "catalog", env = "ROLEPERM_CATALOG")]
    pub catalog_path: Option<PathBuf>,

    #[arg(long, env = "ROLEPERM_MAP_SIZE", default_value_t = DEFAULT_MAP_SIZE)]
    pub map_size: usize,
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn catalog(&self) -> Result<Catalog> {
        match &self.catalog_path {
            Some(p) => Catalog::load(p),
            None => Ok(Catalog::builtin().clone()),
        }
    }

    pub fn open_store(&self) -> Result<LmdbStore> {
        LmdbStore::open_with_map_size(&self.db_path, self.map_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ServerConfig::parse_from(["roleperm-server"]);
        assert_eq!(c.map_size, DEFAULT_MAP_SIZE);
        assert!(c.catalog_path.is_none());
    }

    #[test]
    fn flags_override() {
        let c = ServerConfig::parse_from(["roleperm-server", "-d", "/tmp/x", "--port", "8080", "--bind", "127.0.0.1"]);
        assert_eq!(c.addr(), "127.0.0.1:8080");
        assert_eq!(c.db_path, PathBuf::from("/tmp/x"));
    }
}
