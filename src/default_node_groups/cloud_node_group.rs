use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use log::{info, warn};
use crate::cloud_service::{CloudService, InstanceId};
use crate::error::{CloudProviderError, CloudProviderResult};
use crate::instance_group_resolver::InstanceGroupResolver;
use crate::node_group::{NodeGroup, NodeGroupSpec};

/// Node group backed by a `CloudService`, with ownership checks through the resolver.
pub struct CloudNodeGroup {
    spec: NodeGroupSpec,
    zone: String,
    autoprovisioned: bool,
    exists: AtomicBool,
    cloud_service: Arc<dyn CloudService>,
    resolver: Arc<InstanceGroupResolver>,
}

impl CloudNodeGroup {
    /// Group that already exists at the provider.
    pub fn new(spec: NodeGroupSpec, zone: &str, cloud_service: Arc<dyn CloudService>,
               resolver: Arc<InstanceGroupResolver>) -> Self {
        Self {
            spec,
            zone: zone.to_string(),
            autoprovisioned: false,
            exists: AtomicBool::new(true),
            cloud_service,
            resolver,
        }
    }

    /// Theoretical group the autoscaler may create on demand and delete when empty.
    pub fn new_autoprovisioned(spec: NodeGroupSpec, zone: &str, cloud_service: Arc<dyn CloudService>,
                               resolver: Arc<InstanceGroupResolver>) -> Self {
        Self {
            autoprovisioned: true,
            exists: AtomicBool::new(false),
            ..Self::new(spec, zone, cloud_service, resolver)
        }
    }

    fn ensure_owned(&self, nodes: &[InstanceId]) -> CloudProviderResult<()> {
        for node in nodes {
            match self.resolver.find_for_instance(node)? {
                Some(group_id) if group_id == self.spec.name => {}
                Some(group_id) => {
                    return Err(CloudProviderError::PreconditionFailed(
                        format!("{} belongs to node group {}, not {}", node, group_id, self.spec.name)));
                }
                None => {
                    return Err(CloudProviderError::PreconditionFailed(
                        format!("{} does not belong to node group {}", node, self.spec.name)));
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for CloudNodeGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudNodeGroup")
            .field("spec", &self.spec)
            .field("zone", &self.zone)
            .field("autoprovisioned", &self.autoprovisioned)
            .field("exists", &self.exist())
            .finish()
    }
}

impl NodeGroup for CloudNodeGroup {
    fn id(&self) -> &str {
        &self.spec.name
    }

    fn zone(&self) -> &str {
        &self.zone
    }

    fn min_size(&self) -> usize {
        self.spec.min_size
    }

    fn max_size(&self) -> usize {
        self.spec.max_size
    }

    fn target_size(&self) -> CloudProviderResult<usize> {
        if !self.exist() {
            return Ok(0);
        }
        self.cloud_service.target_size(&self.spec.name)
    }

    fn increase_size(&self, delta: i64) -> CloudProviderResult<()> {
        if delta <= 0 {
            return Err(CloudProviderError::InvalidArgument(
                format!("size increase must be positive, got {}", delta)));
        }
        let size = self.target_size()?;
        let headroom = self.spec.max_size.saturating_sub(size);
        if delta as u64 > headroom as u64 {
            return Err(CloudProviderError::LimitExceeded(
                format!("size increase too large - current:{} delta:{} max:{}", size, delta, self.spec.max_size)));
        }
        let new_size = size + delta as usize;
        info!("Setting node group {} size to {}", self.spec.name, new_size);
        self.cloud_service.resize(&self.spec.name, new_size)
    }

    fn decrease_target_size(&self, delta: i64) -> CloudProviderResult<()> {
        if delta >= 0 {
            return Err(CloudProviderError::InvalidArgument(
                format!("size decrease must be negative, got {}", delta)));
        }
        let size = self.target_size()?;
        let nodes = self.nodes()?;
        let new_size = size as i64 + delta;
        if new_size < nodes.len() as i64 {
            return Err(CloudProviderError::PreconditionFailed(
                format!("attempt to delete existing nodes targetSize:{} delta:{} existingNodes: {}",
                        size, delta, nodes.len())));
        }
        if new_size < self.spec.min_size as i64 {
            return Err(CloudProviderError::LimitExceeded(
                format!("size decrease too large - desired:{} min:{}", new_size, self.spec.min_size)));
        }
        info!("Decreasing node group {} target size to {}", self.spec.name, new_size);
        self.cloud_service.resize(&self.spec.name, new_size as usize)
    }

    fn delete_nodes(&self, nodes: &[InstanceId]) -> CloudProviderResult<()> {
        if nodes.is_empty() {
            return Ok(());
        }
        let size = self.target_size()?;
        // Draining down to exactly min size is allowed, only going below it is rejected.
        if size < self.spec.min_size.saturating_add(nodes.len()) {
            return Err(CloudProviderError::PreconditionFailed(
                format!("min size reached, {} nodes will not be deleted from {} (size {}, min {})",
                        nodes.len(), self.spec.name, size, self.spec.min_size)));
        }
        self.ensure_owned(nodes)?;

        let mut failures = Vec::<String>::default();
        for node in nodes {
            info!("Deleting instance {} from node group {}", node, self.spec.name);
            if let Err(err) = self.cloud_service.delete_instance(&self.spec.name, node) {
                warn!("Failed to delete instance {} from node group {}: {}", node, self.spec.name, err);
                failures.push(format!("{}: {}", node, err));
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(CloudProviderError::Provider(format!("failed to delete {} of {} instances: {}",
                                                     failures.len(), nodes.len(), failures.join("; "))))
        }
    }

    fn nodes(&self) -> CloudProviderResult<Vec<InstanceId>> {
        if !self.exist() {
            return Ok(Vec::default());
        }
        self.cloud_service.list_instances(&self.spec.name)
    }

    fn exist(&self) -> bool {
        self.exists.load(Ordering::SeqCst)
    }

    fn create(&self) -> CloudProviderResult<()> {
        if !self.autoprovisioned {
            return Err(CloudProviderError::NotImplemented(
                format!("node group {} is not autoprovisioned", self.spec.name)));
        }
        if self.exist() {
            return Err(CloudProviderError::PreconditionFailed(
                format!("node group {} already exists", self.spec.name)));
        }
        info!("Creating node group {}", self.spec.name);
        self.cloud_service.create_group(&self.spec.name)?;
        self.exists.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn delete(&self) -> CloudProviderResult<()> {
        if !self.autoprovisioned {
            return Err(CloudProviderError::NotImplemented(
                format!("node group {} is not autoprovisioned", self.spec.name)));
        }
        let size = self.target_size()?;
        if size > 0 {
            return Err(CloudProviderError::PreconditionFailed(
                format!("node group {} still has target size {}", self.spec.name, size)));
        }
        if !self.exist() {
            return Ok(());
        }
        info!("Deleting node group {}", self.spec.name);
        self.cloud_service.delete_group(&self.spec.name)?;
        self.exists.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn autoprovisioned(&self) -> bool {
        self.autoprovisioned
    }
}
