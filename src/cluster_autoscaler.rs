use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use log::{info, warn};
use crate::cloud_service::{CloudService, InstanceId};
use crate::config::AutoscalerConfig;
use crate::default_node_groups::cloud_node_group::CloudNodeGroup;
use crate::error::{CloudProviderError, CloudProviderResult, ConfigError};
use crate::expander::{Expander, ExpanderRegistry, ExpansionOption};
use crate::instance_group_resolver::{InstanceGroupResolver, RefreshHandle};
use crate::node::NodeTemplate;
use crate::node_group::{NodeGroup, NodeGroupSpec};
use crate::pricing::{LinearPricingModel, PreferredNodeProvider, SimplePreferredNodeProvider,
                     StaticPreferredNodeProvider};

/// Owns the node groups of one cloud, the instance resolver and the expander.
pub struct ClusterAutoscaler {
    cloud_service: Arc<dyn CloudService>,
    resolver: Arc<InstanceGroupResolver>,
    node_groups: BTreeMap<String, Arc<dyn NodeGroup>>,
    expander: Box<dyn Expander>,
    _refresh: RefreshHandle,
}

impl ClusterAutoscaler {
    /// Builds the autoscaler with the stock expanders.
    pub fn new(config: &AutoscalerConfig, cloud_service: Arc<dyn CloudService>) -> Result<Self, ConfigError> {
        let resolver = Arc::new(InstanceGroupResolver::new(cloud_service.clone()));
        let preferred_node_provider: Arc<dyn PreferredNodeProvider> = match config.preferred_node {
            Some(node) => Arc::new(StaticPreferredNodeProvider::new(node.cpu_millis, node.memory_bytes)),
            None => {
                let cloud_service = cloud_service.clone();
                let resolver = resolver.clone();
                Arc::new(SimplePreferredNodeProvider::new(move || {
                    let mut cluster_size = 0;
                    for group_id in resolver.registered_groups() {
                        cluster_size += cloud_service.target_size(&group_id)?;
                    }
                    Ok(cluster_size)
                }))
            }
        };
        let registry = ExpanderRegistry::with_defaults(Arc::new(LinearPricingModel::new(config.pricing)),
                                                       preferred_node_provider, config.random_seed);
        Self::with_registry(config, cloud_service, resolver, &registry)
    }

    /// Builds the autoscaler picking the configured expander from `registry`.
    pub fn with_registry(config: &AutoscalerConfig, cloud_service: Arc<dyn CloudService>,
                         resolver: Arc<InstanceGroupResolver>,
                         registry: &ExpanderRegistry) -> Result<Self, ConfigError> {
        let expander = registry.build(&config.expander)?;

        let mut node_groups = BTreeMap::<String, Arc<dyn NodeGroup>>::default();
        for (spec, group_config) in &config.node_groups {
            let node_group: Arc<dyn NodeGroup> = if group_config.autoprovisioned {
                Arc::new(CloudNodeGroup::new_autoprovisioned(spec.clone(), &group_config.zone,
                                                             cloud_service.clone(), resolver.clone()))
            } else {
                resolver.register(&spec.name);
                Arc::new(CloudNodeGroup::new(spec.clone(), &group_config.zone,
                                             cloud_service.clone(), resolver.clone()))
            };
            node_groups.insert(spec.name.clone(), node_group);
        }

        if let Err(err) = resolver.regenerate() {
            warn!("Initial instance cache regeneration failed: {}", err);
        }
        let refresh = resolver.start_refresh(config.cache_refresh_interval);
        info!("Cluster autoscaler started with {} node groups and the {} expander",
              node_groups.len(), expander.name());

        Ok(Self {
            cloud_service,
            resolver,
            node_groups,
            expander,
            _refresh: refresh,
        })
    }

    pub fn expander_name(&self) -> &'static str {
        self.expander.name()
    }

    pub fn resolver(&self) -> &Arc<InstanceGroupResolver> {
        &self.resolver
    }

    pub fn node_groups(&self) -> Vec<Arc<dyn NodeGroup>> {
        self.node_groups.values().cloned().collect()
    }

    pub fn node_group(&self, group_id: &str) -> Option<Arc<dyn NodeGroup>> {
        self.node_groups.get(group_id).cloned()
    }

    pub fn node_group_for_instance(&self, instance: &InstanceId) -> CloudProviderResult<Option<Arc<dyn NodeGroup>>> {
        Ok(self.resolver.find_for_instance(instance)?
            .and_then(|group_id| self.node_group(&group_id)))
    }

    /// Picks the best option and grows its group, creating the group first if needed.
    /// Returns the chosen option, or None if no option is viable.
    pub fn try_to_scale_up(&self, options: &[ExpansionOption],
                           node_infos: &HashMap<String, NodeTemplate>) -> CloudProviderResult<Option<ExpansionOption>> {
        if options.is_empty() {
            return Ok(None);
        }
        let best = match self.expander.best_option(options, node_infos) {
            Some(best) => best,
            None => {
                info!("None of {} expansion options is viable", options.len());
                return Ok(None);
            }
        };
        let node_group = &best.node_group;
        if !node_group.exist() {
            node_group.create()?;
            self.resolver.register(node_group.id());
        }
        info!("Scaling up node group {} by {} nodes for {} pods", node_group.id(), best.node_count,
              best.pods.len());
        node_group.increase_size(best.node_count as i64)?;
        Ok(Some(best))
    }

    /// Deletes instances group by group. Instances of unmanaged groups are skipped,
    /// a failing group does not stop the others and its first error is returned.
    pub fn scale_down(&self, instances: &[InstanceId]) -> CloudProviderResult<()> {
        let mut by_group = BTreeMap::<String, Vec<InstanceId>>::default();
        for instance in instances {
            match self.resolver.find_for_instance(instance)? {
                Some(group_id) => by_group.entry(group_id).or_default().push(instance.clone()),
                None => warn!("Instance {} is not managed by any node group, skipping it", instance),
            }
        }

        let mut first_error = None;
        for (group_id, group_instances) in by_group {
            let node_group = match self.node_group(&group_id) {
                Some(node_group) => node_group,
                None => {
                    warn!("Node group {} is registered but unknown, skipping it", group_id);
                    continue;
                }
            };
            if let Err(err) = node_group.delete_nodes(&group_instances) {
                warn!("Failed to scale down node group {}: {}", group_id, err);
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Adds a theoretical group that is created on its first scale-up.
    pub fn add_autoprovisioned_group(&mut self, spec: NodeGroupSpec, zone: &str) -> CloudProviderResult<Arc<dyn NodeGroup>> {
        if self.node_groups.contains_key(&spec.name) {
            return Err(CloudProviderError::PreconditionFailed(
                format!("node group {} already exists", spec.name)));
        }
        let node_group: Arc<dyn NodeGroup> = Arc::new(CloudNodeGroup::new_autoprovisioned(
            spec.clone(), zone, self.cloud_service.clone(), self.resolver.clone()));
        self.node_groups.insert(spec.name, node_group.clone());
        Ok(node_group)
    }

    /// Deletes autoprovisioned groups scaled down to zero. Returns their ids.
    /// Deleted groups stay known as theoretical groups.
    pub fn remove_unneeded_autoprovisioned_groups(&self) -> CloudProviderResult<Vec<String>> {
        let mut removed = Vec::<String>::default();
        for node_group in self.node_groups.values() {
            if !node_group.autoprovisioned() || !node_group.exist() || node_group.target_size()? > 0 {
                continue;
            }
            node_group.delete()?;
            self.resolver.unregister(node_group.id());
            removed.push(node_group.id().to_string());
        }
        Ok(removed)
    }
}
