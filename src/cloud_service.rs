//! Capability contract of a cloud provider backend.

use std::collections::{BTreeMap, HashSet};
use std::fmt::{Display, Formatter};
use std::sync::Mutex;
use serde::{Deserialize, Serialize};
use crate::error::{CloudProviderError, CloudProviderResult};

/// Provider-specific identifier of a running instance.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(pub String);

impl InstanceId {
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl Display for InstanceId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Calls issued by the core to a cloud backend. Auth, retries and rate limits are
/// the backend's business; every returned error is treated as opaque.
pub trait CloudService: Send + Sync {
    fn list_instances(&self, group_id: &str) -> CloudProviderResult<Vec<InstanceId>>;

    fn target_size(&self, group_id: &str) -> CloudProviderResult<usize>;

    fn resize(&self, group_id: &str, new_size: usize) -> CloudProviderResult<()>;

    fn delete_instance(&self, group_id: &str, instance: &InstanceId) -> CloudProviderResult<()>;

    fn create_group(&self, group_id: &str) -> CloudProviderResult<()>;

    fn delete_group(&self, group_id: &str) -> CloudProviderResult<()>;
}

/// Number of provider round-trips made for a single group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CallCounters {
    pub list_instances: usize,
    pub resize: usize,
    pub delete_instance: usize,
}

#[derive(Default)]
struct GroupState {
    target_size: usize,
    instances: Vec<InstanceId>,
    next_instance: usize,
    fail_listing: bool,
    calls: CallCounters,
}

#[derive(Default)]
struct InMemoryState {
    groups: BTreeMap<String, GroupState>,
    failing_deletions: HashSet<InstanceId>,
}

/// Cloud backend kept entirely in memory. Resizes only move the target size,
/// instances appear when `provision` is called, like a real provider booting VMs.
#[derive(Default)]
pub struct InMemoryCloudService {
    state: Mutex<InMemoryState>,
}

impl InMemoryCloudService {
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds a group and provisions `size` instances in it.
    pub fn add_group(&self, group_id: &str, size: usize) -> Vec<InstanceId> {
        let mut state = self.lock();
        let group = state.groups.entry(group_id.to_string()).or_default();
        group.target_size = size;
        Self::provision_group(group_id, group)
    }

    /// Creates instances until every group reaches its target size.
    pub fn provision(&self) -> Vec<InstanceId> {
        let mut state = self.lock();
        let mut created = Vec::<InstanceId>::default();
        for (group_id, group) in state.groups.iter_mut() {
            created.extend(Self::provision_group(group_id, group));
        }
        created
    }

    pub fn set_fail_listing(&self, group_id: &str, fail: bool) {
        if let Some(group) = self.lock().groups.get_mut(group_id) {
            group.fail_listing = fail;
        }
    }

    pub fn set_fail_deletion(&self, instance: &InstanceId) {
        self.lock().failing_deletions.insert(instance.clone());
    }

    pub fn calls(&self, group_id: &str) -> CallCounters {
        self.lock().groups.get(group_id).map(|group| group.calls).unwrap_or_default()
    }

    pub fn has_group(&self, group_id: &str) -> bool {
        self.lock().groups.contains_key(group_id)
    }

    fn provision_group(group_id: &str, group: &mut GroupState) -> Vec<InstanceId> {
        let mut created = Vec::<InstanceId>::default();
        while group.instances.len() < group.target_size {
            let instance = InstanceId(format!("{}-{}", group_id, group.next_instance));
            group.next_instance += 1;
            group.instances.push(instance.clone());
            created.push(instance);
        }
        created
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InMemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn group_not_found(group_id: &str) -> CloudProviderError {
    CloudProviderError::Provider(format!("group {} does not exist", group_id))
}

impl CloudService for InMemoryCloudService {
    fn list_instances(&self, group_id: &str) -> CloudProviderResult<Vec<InstanceId>> {
        let mut state = self.lock();
        let group = state.groups.get_mut(group_id).ok_or_else(|| group_not_found(group_id))?;
        group.calls.list_instances += 1;
        if group.fail_listing {
            return Err(CloudProviderError::Provider(format!("listing of {} failed", group_id)));
        }
        Ok(group.instances.clone())
    }

    fn target_size(&self, group_id: &str) -> CloudProviderResult<usize> {
        let state = self.lock();
        let group = state.groups.get(group_id).ok_or_else(|| group_not_found(group_id))?;
        Ok(group.target_size)
    }

    fn resize(&self, group_id: &str, new_size: usize) -> CloudProviderResult<()> {
        let mut state = self.lock();
        let group = state.groups.get_mut(group_id).ok_or_else(|| group_not_found(group_id))?;
        group.calls.resize += 1;
        group.target_size = new_size;
        Ok(())
    }

    fn delete_instance(&self, group_id: &str, instance: &InstanceId) -> CloudProviderResult<()> {
        let mut state = self.lock();
        let failing = state.failing_deletions.contains(instance);
        let group = state.groups.get_mut(group_id).ok_or_else(|| group_not_found(group_id))?;
        group.calls.delete_instance += 1;
        if failing {
            return Err(CloudProviderError::Provider(format!("deletion of {} failed", instance)));
        }
        let position = group.instances.iter().position(|candidate| candidate == instance)
            .ok_or_else(|| CloudProviderError::Provider(
                format!("instance {} is not part of {}", instance, group_id)))?;
        group.instances.remove(position);
        group.target_size = group.target_size.saturating_sub(1);
        Ok(())
    }

    fn create_group(&self, group_id: &str) -> CloudProviderResult<()> {
        let mut state = self.lock();
        if state.groups.contains_key(group_id) {
            return Err(CloudProviderError::Provider(format!("group {} already exists", group_id)));
        }
        state.groups.insert(group_id.to_string(), GroupState::default());
        Ok(())
    }

    fn delete_group(&self, group_id: &str) -> CloudProviderResult<()> {
        self.lock().groups.remove(group_id).map(|_| ()).ok_or_else(|| group_not_found(group_id))
    }
}
