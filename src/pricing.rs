//! Collaborators of the price based expander.

use std::time::SystemTime;
use serde::{Deserialize, Serialize};
use crate::error::{CloudProviderError, CloudProviderResult};
use crate::node::NodeTemplate;
use crate::pod::Pod;
use crate::resources::{resources_for_pods, Resources, MIB};

/// Prices nodes and pods over the `[start, end)` window.
pub trait PricingModel: Send + Sync {
    fn node_price(&self, node: &NodeTemplate, start: SystemTime, end: SystemTime) -> CloudProviderResult<f64>;

    fn pod_price(&self, pod: &Pod, start: SystemTime, end: SystemTime) -> CloudProviderResult<f64>;
}

/// Returns the shape of the "ideal" node for the current cluster.
pub trait PreferredNodeProvider: Send + Sync {
    fn node(&self) -> CloudProviderResult<NodeTemplate>;
}

fn window_hours(start: SystemTime, end: SystemTime) -> CloudProviderResult<f64> {
    end.duration_since(start)
        .map(|window| window.as_secs_f64() / 3600.0)
        .map_err(|_| CloudProviderError::InvalidArgument("pricing window ends before it starts".to_string()))
}

/// Hourly prices of a linear pricing model.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct LinearPrices {
    /// Price of one cpu core for one hour.
    pub cpu_hour: f64,
    /// Price of one GiB of memory for one hour.
    pub memory_gib_hour: f64,
    /// Price of one gpu for one hour.
    pub gpu_hour: f64,
}

impl Default for LinearPrices {
    fn default() -> Self {
        Self {
            cpu_hour: 0.033174,
            memory_gib_hour: 0.004446,
            gpu_hour: 0.7,
        }
    }
}

/// Prices resources linearly: nodes by capacity, pods by requests.
#[derive(Debug, Default, Clone)]
pub struct LinearPricingModel {
    prices: LinearPrices,
}

impl LinearPricingModel {
    pub fn new(prices: LinearPrices) -> Self {
        Self { prices }
    }

    fn price(&self, resources: Resources, hours: f64) -> f64 {
        hours * (resources.cpu_cores() * self.prices.cpu_hour +
            resources.memory_gib() * self.prices.memory_gib_hour +
            resources.gpus as f64 * self.prices.gpu_hour)
    }
}

impl PricingModel for LinearPricingModel {
    fn node_price(&self, node: &NodeTemplate, start: SystemTime, end: SystemTime) -> CloudProviderResult<f64> {
        Ok(self.price(node.capacity, window_hours(start, end)?))
    }

    fn pod_price(&self, pod: &Pod, start: SystemTime, end: SystemTime) -> CloudProviderResult<f64> {
        let requests = resources_for_pods(std::slice::from_ref(pod));
        Ok(self.price(requests, window_hours(start, end)?))
    }
}

/// Always prefers the same node shape.
#[derive(Debug, Clone)]
pub struct StaticPreferredNodeProvider {
    node: NodeTemplate,
}

impl StaticPreferredNodeProvider {
    pub fn new(cpu_millis: u64, memory_bytes: u64) -> Self {
        Self {
            node: NodeTemplate::new("preferred", Resources::new(cpu_millis, memory_bytes)),
        }
    }
}

impl PreferredNodeProvider for StaticPreferredNodeProvider {
    fn node(&self) -> CloudProviderResult<NodeTemplate> {
        Ok(self.node.clone())
    }
}

/// Prefers bigger nodes in bigger clusters: the preferred size doubles every time
/// the cluster grows roughly three times.
pub struct SimplePreferredNodeProvider {
    cluster_size: Box<dyn Fn() -> CloudProviderResult<usize> + Send + Sync>,
}

impl SimplePreferredNodeProvider {
    pub fn new(cluster_size: impl Fn() -> CloudProviderResult<usize> + Send + Sync + 'static) -> Self {
        Self {
            cluster_size: Box::new(cluster_size),
        }
    }
}

impl PreferredNodeProvider for SimplePreferredNodeProvider {
    fn node(&self) -> CloudProviderResult<NodeTemplate> {
        let size = (self.cluster_size)()?;
        let (cpu_cores, memory_mib) = match size {
            0..=2 => (1, 3750),
            3..=6 => (2, 7500),
            7..=20 => (4, 15000),
            21..=60 => (8, 30000),
            61..=200 => (16, 60000),
            _ => (32, 120000),
        };
        Ok(NodeTemplate::new("preferred", Resources::new(cpu_cores * 1000, memory_mib * MIB)))
    }
}
