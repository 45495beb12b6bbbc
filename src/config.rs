//! Autoscaler configuration.

use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::error::ConfigError;
use crate::expander::RANDOM;
use crate::instance_group_resolver::DEFAULT_REFRESH_INTERVAL;
use crate::node_group::NodeGroupSpec;
use crate::pricing::LinearPrices;
use crate::resources::Resources;

/// Holds configuration of a single statically configured node group.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct NodeGroupConfig {
    /// Discovery spec, `min:max:name`.
    pub spec: String,
    /// Region or zone of the group.
    #[serde(default)]
    pub zone: String,
    /// Whether the autoscaler created this group and may delete it.
    #[serde(default)]
    pub autoprovisioned: bool,
}

/// Holds raw autoscaler config parsed from YAML file.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
struct RawAutoscalerConfig {
    pub expander: Option<String>,
    pub cache_refresh_interval: Option<f64>,
    pub node_groups: Option<Vec<NodeGroupConfig>>,
    pub preferred_node: Option<Resources>,
    pub pricing: Option<LinearPrices>,
    pub random_seed: Option<u64>,
}

/// Represents autoscaler configuration.
#[derive(Debug, PartialEq, Clone)]
pub struct AutoscalerConfig {
    /// Name of the expander choosing between scale-up options.
    pub expander: String,
    /// Period of the background instance cache refresh.
    pub cache_refresh_interval: Duration,
    /// Statically configured node groups.
    pub node_groups: Vec<(NodeGroupSpec, NodeGroupConfig)>,
    /// Fixed preferred node shape. None means it follows the cluster size.
    pub preferred_node: Option<Resources>,
    /// Hourly prices for the price expander.
    pub pricing: LinearPrices,
    /// Seed of the random expander.
    pub random_seed: Option<u64>,
}

impl Default for AutoscalerConfig {
    fn default() -> Self {
        Self {
            expander: RANDOM.to_string(),
            cache_refresh_interval: DEFAULT_REFRESH_INTERVAL,
            node_groups: Vec::default(),
            preferred_node: None,
            pricing: LinearPrices::default(),
            random_seed: None,
        }
    }
}

impl AutoscalerConfig {
    pub fn from_file(file_name: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(file_name).map_err(|source| ConfigError::Io {
            path: file_name.to_string(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let raw: RawAutoscalerConfig = serde_yaml::from_str(content)?;
        let defaults = Self::default();

        let cache_refresh_interval = match raw.cache_refresh_interval {
            Some(seconds) if seconds.is_finite() && seconds > 0.0 => Duration::from_secs_f64(seconds),
            Some(seconds) => {
                return Err(ConfigError::InvalidValue(
                    format!("cache_refresh_interval must be positive, got {}", seconds)));
            }
            None => defaults.cache_refresh_interval,
        };

        let mut node_groups = Vec::default();
        for group in raw.node_groups.unwrap_or_default() {
            let spec = group.spec.parse::<NodeGroupSpec>()?;
            if node_groups.iter().any(|(known, _): &(NodeGroupSpec, NodeGroupConfig)| known.name == spec.name) {
                return Err(ConfigError::InvalidValue(format!("node group {} is configured twice", spec.name)));
            }
            node_groups.push((spec, group));
        }

        Ok(Self {
            expander: raw.expander.unwrap_or(defaults.expander),
            cache_refresh_interval,
            node_groups,
            preferred_node: raw.preferred_node,
            pricing: raw.pricing.unwrap_or(defaults.pricing),
            random_seed: raw.random_seed,
        })
    }
}
