//! Add-on management
//!
//! The manager tracks installed add-ons and the permissions granted to each.
//! The updater decides whether an add-on update may proceed: updates that
//! ask for nothing new go through, the rest wait for review.

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, OnceLock};

use lantern_engine::{UpdatePermissionHandler, UpdatePermissionRequest};

use crate::error::ExtensionError;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Addon {
    pub id: String,
    pub name: String,
    pub version: String,
    pub permissions: BTreeSet<String>,
    pub enabled: bool,
}

impl Addon {
    pub fn new(id: &str, name: &str, version: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            version: version.to_string(),
            permissions: BTreeSet::new(),
            enabled: true,
        }
    }

    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    /// Permissions in `requested` that this add-on does not hold yet
    pub fn missing_permissions<'a>(&self, requested: &'a [String]) -> Vec<&'a str> {
        requested
            .iter()
            .filter(|p| !self.permissions.contains(p.as_str()))
            .map(String::as_str)
            .collect()
    }
}

#[derive(Default)]
pub struct AddonManager {
    addons: RwLock<HashMap<String, Addon>>,
}

impl AddonManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&self, addon: Addon) -> Result<()> {
        let mut addons = self.addons.write();
        if addons.contains_key(&addon.id) {
            return Err(ExtensionError::AlreadyInstalled(addon.id));
        }

        tracing::info!(addon_id = %addon.id, version = %addon.version, "Add-on installed");
        addons.insert(addon.id.clone(), addon);
        Ok(())
    }

    pub fn uninstall(&self, addon_id: &str) -> Result<Addon> {
        self.addons
            .write()
            .remove(addon_id)
            .ok_or_else(|| ExtensionError::NotInstalled(addon_id.to_string()))
    }

    pub fn get(&self, addon_id: &str) -> Option<Addon> {
        self.addons.read().get(addon_id).cloned()
    }

    pub fn installed(&self) -> Vec<Addon> {
        let mut addons: Vec<Addon> = self.addons.read().values().cloned().collect();
        addons.sort_by(|a, b| a.id.cmp(&b.id));
        addons
    }

    pub fn set_enabled(&self, addon_id: &str, enabled: bool) -> Result<()> {
        let mut addons = self.addons.write();
        let addon = addons
            .get_mut(addon_id)
            .ok_or_else(|| ExtensionError::NotInstalled(addon_id.to_string()))?;
        addon.enabled = enabled;
        Ok(())
    }

    /// Move an add-on to a new version, granting `permissions` alongside
    /// the ones it already holds.
    pub fn apply_update(&self, addon_id: &str, version: &str, permissions: &[String]) -> Result<()> {
        let mut addons = self.addons.write();
        let addon = addons
            .get_mut(addon_id)
            .ok_or_else(|| ExtensionError::NotInstalled(addon_id.to_string()))?;

        addon.version = version.to_string();
        addon.permissions.extend(permissions.iter().cloned());

        tracing::info!(addon_id = %addon_id, version = %version, "Add-on updated");
        Ok(())
    }
}

pub struct AddonUpdater {
    manager: Arc<AddonManager>,
    pending: Mutex<Vec<UpdatePermissionRequest>>,
}

impl AddonUpdater {
    pub fn new(manager: Arc<AddonManager>) -> Self {
        Self {
            manager,
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Updates held back because they asked for new permissions
    pub fn pending_reviews(&self) -> Vec<UpdatePermissionRequest> {
        self.pending.lock().clone()
    }

    /// Grant a held-back update. Returns `false` if none was pending.
    pub fn approve(&self, addon_id: &str) -> Result<bool> {
        let request = {
            let mut pending = self.pending.lock();
            match pending.iter().position(|r| r.addon_id == addon_id) {
                Some(index) => pending.remove(index),
                None => return Ok(false),
            }
        };

        self.manager
            .apply_update(&request.addon_id, &request.new_version, &request.permissions)?;
        Ok(true)
    }
}

impl UpdatePermissionHandler for AddonUpdater {
    fn on_update_permission_request(&self, request: &UpdatePermissionRequest) -> bool {
        let Some(addon) = self.manager.get(&request.addon_id) else {
            tracing::warn!(addon_id = %request.addon_id, "Update requested for unknown add-on");
            return false;
        };

        let missing = addon.missing_permissions(&request.permissions);
        if missing.is_empty() {
            return self
                .manager
                .apply_update(&request.addon_id, &request.new_version, &request.permissions)
                .is_ok();
        }

        tracing::info!(
            addon_id = %request.addon_id,
            missing = ?missing,
            "Add-on update needs new permissions, holding for review"
        );

        let mut pending = self.pending.lock();
        pending.retain(|r| r.addon_id != request.addon_id);
        pending.push(request.clone());
        false
    }
}

/// Process-wide holder for the add-on manager and updater.
#[derive(Default)]
pub struct AddonDependencyProvider {
    deps: OnceLock<(Arc<AddonManager>, Arc<AddonUpdater>)>,
}

impl AddonDependencyProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initialize(&self, manager: Arc<AddonManager>, updater: Arc<AddonUpdater>) -> Result<()> {
        self.deps
            .set((manager, updater))
            .map_err(|_| ExtensionError::ProviderAlreadyInitialized)
    }

    pub fn is_initialized(&self) -> bool {
        self.deps.get().is_some()
    }

    pub fn manager(&self) -> Option<Arc<AddonManager>> {
        self.deps.get().map(|(manager, _)| Arc::clone(manager))
    }

    pub fn updater(&self) -> Option<Arc<AddonUpdater>> {
        self.deps.get().map(|(_, updater)| Arc::clone(updater))
    }
}
