//! Group Registry
//!
//! Name to group lookup shared by the peer server and the front API.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::group::{Getter, Group};

// == Group Registry ==
/// Holds every group a process serves, keyed by name.
///
/// Callers keep an `Arc<GroupRegistry>` and pass it to whatever needs to
/// resolve groups by name.
#[derive(Debug, Default)]
pub struct GroupRegistry {
    groups: RwLock<HashMap<String, Arc<Group>>>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // == New Group ==
    /// Creates a group and registers it under `name`.
    ///
    /// An existing group with the same name is replaced in the registry;
    /// handles already given out keep working.
    pub fn new_group(
        &self,
        name: impl Into<String>,
        cache_bytes: usize,
        getter: Arc<dyn Getter>,
    ) -> Arc<Group> {
        let name = name.into();
        let group = Arc::new(Group::new(name.clone(), cache_bytes, getter));

        let mut groups = self.groups.write();
        if groups.insert(name.clone(), group.clone()).is_some() {
            warn!(group = %name, "replaced existing group");
        } else {
            info!(group = %name, cache_bytes, "group created");
        }
        group
    }

    // == Get Group ==
    /// Returns the group registered under `name`, if any.
    pub fn get_group(&self, name: &str) -> Option<Arc<Group>> {
        self.groups.read().get(name).cloned()
    }

    /// Registered group names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.groups.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.groups.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.read().is_empty()
    }
}
