#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;
use cluster_autoscaler_core::cloud_service::{CloudService, InMemoryCloudService, InstanceId};
use cluster_autoscaler_core::default_node_groups::cloud_node_group::CloudNodeGroup;
use cluster_autoscaler_core::error::{CloudProviderError, CloudProviderResult};
use cluster_autoscaler_core::expander::ExpansionOption;
use cluster_autoscaler_core::instance_group_resolver::InstanceGroupResolver;
use cluster_autoscaler_core::node::NodeTemplate;
use cluster_autoscaler_core::node_group::{NodeGroup, NodeGroupSpec};
use cluster_autoscaler_core::pod::Pod;
use cluster_autoscaler_core::pricing::PricingModel;

pub fn name_wrapper(file_name: &str) -> String {
    format!("test-configs/{}", file_name)
}

/// Node group with no provider behind it, for expander tests.
#[derive(Debug)]
pub struct TestNodeGroup {
    id: String,
    exists: bool,
}

fn not_implemented() -> CloudProviderError {
    CloudProviderError::NotImplemented("test node group".to_string())
}

impl NodeGroup for TestNodeGroup {
    fn id(&self) -> &str {
        &self.id
    }

    fn zone(&self) -> &str {
        "test-zone"
    }

    fn min_size(&self) -> usize {
        0
    }

    fn max_size(&self) -> usize {
        100
    }

    fn target_size(&self) -> CloudProviderResult<usize> {
        Ok(0)
    }

    fn increase_size(&self, _delta: i64) -> CloudProviderResult<()> {
        Err(not_implemented())
    }

    fn decrease_target_size(&self, _delta: i64) -> CloudProviderResult<()> {
        Err(not_implemented())
    }

    fn delete_nodes(&self, _nodes: &[InstanceId]) -> CloudProviderResult<()> {
        Err(not_implemented())
    }

    fn nodes(&self) -> CloudProviderResult<Vec<InstanceId>> {
        Ok(Vec::default())
    }

    fn exist(&self) -> bool {
        self.exists
    }

    fn create(&self) -> CloudProviderResult<()> {
        Err(not_implemented())
    }

    fn delete(&self) -> CloudProviderResult<()> {
        Err(not_implemented())
    }

    fn autoprovisioned(&self) -> bool {
        !self.exists
    }
}

pub fn test_group(id: &str) -> Arc<dyn NodeGroup> {
    Arc::new(TestNodeGroup { id: id.to_string(), exists: true })
}

pub fn theoretical_group(id: &str) -> Arc<dyn NodeGroup> {
    Arc::new(TestNodeGroup { id: id.to_string(), exists: false })
}

pub fn pods(count: usize) -> Vec<Pod> {
    (0..count).map(|i| Pod::with_requests(&format!("pod-{}", i), 100, 100)).collect()
}

pub fn option(node_group: Arc<dyn NodeGroup>, node_count: usize, pods: Vec<Pod>) -> ExpansionOption {
    ExpansionOption::new(node_group, node_count, pods)
}

/// Prices looked up by node and pod name. Unknown names have no price.
#[derive(Default)]
pub struct StaticPricingModel {
    pub node_prices: HashMap<String, f64>,
    pub pod_prices: HashMap<String, f64>,
}

impl StaticPricingModel {
    pub fn new(node_prices: &[(&str, f64)], pod_prices: &[(&str, f64)]) -> Self {
        Self {
            node_prices: node_prices.iter().map(|(name, price)| (name.to_string(), *price)).collect(),
            pod_prices: pod_prices.iter().map(|(name, price)| (name.to_string(), *price)).collect(),
        }
    }
}

impl PricingModel for StaticPricingModel {
    fn node_price(&self, node: &NodeTemplate, _start: SystemTime, _end: SystemTime) -> CloudProviderResult<f64> {
        self.node_prices.get(&node.name).copied()
            .ok_or_else(|| CloudProviderError::NotFound(format!("price of node {}", node.name)))
    }

    fn pod_price(&self, pod: &Pod, _start: SystemTime, _end: SystemTime) -> CloudProviderResult<f64> {
        self.pod_prices.get(&pod.name).copied()
            .ok_or_else(|| CloudProviderError::NotFound(format!("price of pod {}", pod.name)))
    }
}

pub fn cloud() -> (Arc<InMemoryCloudService>, Arc<InstanceGroupResolver>) {
    let cloud_service = Arc::new(InMemoryCloudService::new());
    let resolver = Arc::new(InstanceGroupResolver::new(cloud_service.clone() as Arc<dyn CloudService>));
    (cloud_service, resolver)
}

/// Existing group of `size` instances, registered with the resolver.
pub fn cloud_group(cloud_service: &Arc<InMemoryCloudService>, resolver: &Arc<InstanceGroupResolver>,
                   spec: &str, size: usize) -> (CloudNodeGroup, Vec<InstanceId>) {
    let spec = spec.parse::<NodeGroupSpec>().unwrap();
    let instances = cloud_service.add_group(&spec.name, size);
    resolver.register(&spec.name);
    let node_group = CloudNodeGroup::new(spec, "zone-a", cloud_service.clone(), resolver.clone());
    (node_group, instances)
}
