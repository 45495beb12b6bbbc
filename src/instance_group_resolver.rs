//! Cache mapping running instances to the node group that owns them.
//!
//! Lookups that miss trigger a full, synchronous rebuild of the cache while the
//! lock is held, so concurrent callers wait for the rebuild instead of observing
//! a half-filled map. Instances found in no registered group are remembered in a
//! negative set and answered without touching the provider again. A rebuild only
//! drops negative entries that now belong to a group.

use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use log::{debug, error, info};
use crate::cloud_service::{CloudService, InstanceId};
use crate::error::CloudProviderResult;

/// Default period of the background refresh.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Default)]
struct ResolverState {
    registered_groups: Vec<String>,
    instance_to_group: HashMap<InstanceId, String>,
    not_in_any_group: HashSet<InstanceId>,
}

pub struct InstanceGroupResolver {
    cloud_service: Arc<dyn CloudService>,
    state: Mutex<ResolverState>,
}

impl InstanceGroupResolver {
    pub fn new(cloud_service: Arc<dyn CloudService>) -> Self {
        Self {
            cloud_service,
            state: Mutex::new(ResolverState::default()),
        }
    }

    /// Registers a group. Takes effect on the next regeneration.
    /// Returns false if the group was already registered.
    pub fn register(&self, group_id: &str) -> bool {
        let mut state = self.lock();
        if state.registered_groups.iter().any(|registered| registered == group_id) {
            return false;
        }
        state.registered_groups.push(group_id.to_string());
        true
    }

    /// Forgets a group. Cached instances of it stay until the next regeneration.
    pub fn unregister(&self, group_id: &str) -> bool {
        let mut state = self.lock();
        let before = state.registered_groups.len();
        state.registered_groups.retain(|registered| registered != group_id);
        before != state.registered_groups.len()
    }

    pub fn registered_groups(&self) -> Vec<String> {
        self.lock().registered_groups.clone()
    }

    /// Returns the id of the group owning `instance`, or None if no registered group owns it.
    pub fn find_for_instance(&self, instance: &InstanceId) -> CloudProviderResult<Option<String>> {
        let mut state = self.lock();
        if let Some(group_id) = state.instance_to_group.get(instance) {
            return Ok(Some(group_id.clone()));
        }
        if state.not_in_any_group.contains(instance) {
            return Ok(None);
        }

        self.regenerate_locked(&mut state)?;

        if let Some(group_id) = state.instance_to_group.get(instance) {
            return Ok(Some(group_id.clone()));
        }
        debug!("Instance {} does not belong to any registered node group", instance);
        state.not_in_any_group.insert(instance.clone());
        Ok(None)
    }

    /// Rebuilds the cache from the provider. On failure the previous contents are kept.
    pub fn regenerate(&self) -> CloudProviderResult<()> {
        let mut state = self.lock();
        self.regenerate_locked(&mut state)
    }

    fn regenerate_locked(&self, state: &mut ResolverState) -> CloudProviderResult<()> {
        let mut instance_to_group = HashMap::<InstanceId, String>::default();
        for group_id in &state.registered_groups {
            let instances = self.cloud_service.list_instances(group_id).map_err(|err| {
                error!("Failed to regenerate instance cache, listing {} failed: {}", group_id, err);
                err
            })?;
            for instance in instances {
                instance_to_group.insert(instance, group_id.clone());
            }
        }
        debug!("Regenerated instance cache: {} instances in {} groups",
               instance_to_group.len(), state.registered_groups.len());
        state.not_in_any_group.retain(|instance| !instance_to_group.contains_key(instance));
        state.instance_to_group = instance_to_group;
        Ok(())
    }

    /// Spawns a thread regenerating the cache every `interval` until the handle is stopped.
    pub fn start_refresh(self: &Arc<Self>, interval: Duration) -> RefreshHandle {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let resolver = Arc::clone(self);
        let thread = thread::spawn(move || loop {
            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {
                    if let Err(err) = resolver.regenerate() {
                        error!("Periodic instance cache refresh failed: {}", err);
                    }
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });
        info!("Started instance cache refresh every {:?}", interval);
        RefreshHandle {
            stop_tx: Some(stop_tx),
            thread: Some(thread),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ResolverState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owns the background refresh thread. Dropping the handle stops the thread.
pub struct RefreshHandle {
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl RefreshHandle {
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Instance cache refresh thread panicked");
            }
        }
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
