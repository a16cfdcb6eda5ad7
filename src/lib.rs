//! roleperm - Role permission catalog, cascading editor state and sparse grant store
//!
//! Data flow for one role:
//! stored grant list -> `hydrate` -> `PermissionState` <-> toggles -> `flatten` -> stored grant list

pub mod builtin;
pub mod catalog;
pub mod constants;
pub mod db;
pub mod error;
pub mod flatten;
pub mod grant;
pub mod hydrate;
pub mod session;
pub mod state;
pub mod store;
mod toggle;
pub mod tx;
pub mod view;

#[cfg(feature = "server")]
pub mod config;

pub use catalog::{Catalog, Module, Shape, SubModule};
pub use constants::{leaf_key, VERBS};
pub use db::LmdbStore;
pub use error::{PermError, Result};
pub use flatten::flatten;
pub use grant::{GrantEntry, RoleRecord};
pub use hydrate::{hydrate, hydrate_with_report, StaleGrant};
pub use session::{Phase, Session};
pub use state::{PermissionState, SubModuleState};
pub use store::{GrantStore, MemoryStore};
pub use tx::Tx;
pub use view::{tree, LeafNode, ModuleNode, SubModuleNode};
