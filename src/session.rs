//! Editing session for one role: Loading -> Ready -> Saving -> Ready
//!
//! A failed save leaves the session in `ReadyWithError` with every edit
//! intact, so the caller can retry. A failed load never produces state.

use tracing::{error, info};

use crate::catalog::Catalog;
use crate::error::{PermError, Result};
use crate::flatten::flatten;
use crate::grant::GrantEntry;
use crate::hydrate::{hydrate_with_report, StaleGrant};
use crate::state::{PermissionState, SubModuleState};
use crate::store::GrantStore;
use crate::view::{tree, ModuleNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Ready,
    Saving,
    ReadyWithError,
}

pub struct Session<'a, S: GrantStore + ?Sized> {
    catalog: &'a Catalog,
    store: &'a S,
    role: u64,
    name: String,
    phase: Phase,
    state: PermissionState,
    /// State as last loaded or saved
    baseline: PermissionState,
    stale: Vec<StaleGrant>,
    last_error: Option<PermError>,
}

impl<'a, S: GrantStore + ?Sized> Session<'a, S> {
    /// A session in `Loading`; call `load` before editing
    pub fn new(catalog: &'a Catalog, store: &'a S, role: u64) -> Self {
        Session {
            catalog,
            store,
            role,
            name: String::new(),
            phase: Phase::Loading,
            state: PermissionState::default(),
            baseline: PermissionState::default(),
            stale: Vec::new(),
            last_error: None,
        }
    }

    /// Create and load in one step
    pub fn open(catalog: &'a Catalog, store: &'a S, role: u64) -> Result<Self> {
        let mut s = Self::new(catalog, store, role);
        s.load()?;
        Ok(s)
    }

    /// Fetch the role and hydrate it. On failure nothing changes.
    pub fn load(&mut self) -> Result<()> {
        if self.phase == Phase::Saving {
            return Err(PermError::Busy("saving"));
        }
        let record = self.store.load(self.role).map_err(|e| {
            error!(role = self.role, error = %e, "load failed");
            PermError::LoadFailed { role: self.role, source: Box::new(e) }
        })?;
        let (state, stale) = hydrate_with_report(self.catalog, &record.permissions);
        if !stale.is_empty() {
            info!(role = self.role, dropped = stale.len(), "dropped stale grants");
        }
        self.name = record.name;
        self.baseline = state.clone();
        self.state = state;
        self.stale = stale;
        self.last_error = None;
        self.phase = Phase::Ready;
        Ok(())
    }

    /// Re-run the load, keeping current edits if it fails
    pub fn reload(&mut self) -> Result<()> {
        self.load()
    }

    /// Flatten and write the whole state. On failure edits are kept.
    pub fn save(&mut self) -> Result<Vec<GrantEntry>> {
        self.ready()?;
        self.phase = Phase::Saving;
        let permissions = flatten(self.catalog, &self.state);
        match self.store.save(self.role, &permissions) {
            Ok(()) => {
                self.baseline = self.state.clone();
                // Stale grants were overwritten by this save
                self.stale.clear();
                self.last_error = None;
                self.phase = Phase::Ready;
                Ok(permissions)
            }
            Err(e) => {
                error!(role = self.role, error = %e, "save failed");
                let e = PermError::SaveFailed { role: self.role, source: Box::new(e) };
                self.last_error = Some(e.clone());
                self.phase = Phase::ReadyWithError;
                Err(e)
            }
        }
    }

    /// Replace the whole state from an incoming grant list, returning what was dropped
    pub fn replace(&mut self, grants: &[GrantEntry]) -> Result<Vec<StaleGrant>> {
        self.ready()?;
        let (state, stale) = hydrate_with_report(self.catalog, grants);
        self.state = state;
        self.stale = stale.clone();
        Ok(stale)
    }

    /// Drop edits and return to the last loaded or saved state
    pub fn discard(&mut self) -> Result<()> {
        self.ready()?;
        self.state = self.baseline.clone();
        Ok(())
    }

    pub fn toggle_leaf(&mut self, module: &str, key: &str) -> Result<bool> {
        self.ready()?;
        self.state.toggle_leaf(self.catalog, module, key)
    }

    pub fn toggle_sub_module(&mut self, module: &str, sub_module: &str) -> Result<bool> {
        self.ready()?;
        self.state.toggle_sub_module(self.catalog, module, sub_module)
    }

    pub fn toggle_fixed_verb(&mut self, module: &str, verb: &str) -> Result<bool> {
        self.ready()?;
        self.state.toggle_fixed_verb(self.catalog, module, verb)
    }

    pub fn toggle_module(&mut self, module: &str) -> Result<bool> {
        self.ready()?;
        self.state.toggle_module(self.catalog, module)
    }

    pub fn set_leaf(&mut self, module: &str, key: &str, value: bool) -> Result<()> {
        self.ready()?;
        self.state.set_leaf(self.catalog, module, key, value)
    }

    pub fn sub_module_state(&self, module: &str, sub_module: &str) -> Result<SubModuleState> {
        self.state.sub_module_state(self.catalog, module, sub_module)
    }

    pub fn tree(&self) -> Vec<ModuleNode> {
        tree(self.catalog, &self.state)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn role(&self) -> u64 {
        self.role
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> &PermissionState {
        &self.state
    }

    /// Grants dropped by the last load or replace
    pub fn stale(&self) -> &[StaleGrant] {
        &self.stale
    }

    pub fn last_error(&self) -> Option<&PermError> {
        self.last_error.as_ref()
    }

    /// True if the state differs from what was last loaded or saved
    pub fn is_dirty(&self) -> bool {
        self.state != self.baseline
    }

    fn ready(&self) -> Result<()> {
        match self.phase {
            Phase::Ready | Phase::ReadyWithError => Ok(()),
            Phase::Loading => Err(PermError::Busy("loading")),
            Phase::Saving => Err(PermError::Busy("saving")),
        }
    }
}
