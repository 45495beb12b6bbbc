//! Node group abstraction implemented by every cloud backend.

use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::cloud_service::InstanceId;
use crate::error::{CloudProviderResult, ConfigError};

/// An elastically sized pool of interchangeable instances.
///
/// Size changing operations validate their arguments and the group bounds before
/// any call to the provider is made, so a rejected call leaves the group untouched.
pub trait NodeGroup: Send + Sync + Debug {
    fn id(&self) -> &str;

    /// Region or zone the group lives in.
    fn zone(&self) -> &str;

    fn min_size(&self) -> usize;

    fn max_size(&self) -> usize;

    /// Desired size of the group as known by the provider.
    fn target_size(&self) -> CloudProviderResult<usize>;

    /// Grows the group by `delta` nodes. `delta` must be positive.
    fn increase_size(&self, delta: i64) -> CloudProviderResult<()>;

    /// Shrinks the target size without deleting live nodes. `delta` must be negative.
    fn decrease_target_size(&self, delta: i64) -> CloudProviderResult<()>;

    /// Deletes the given instances. Best effort: one failure does not stop the rest.
    fn delete_nodes(&self, nodes: &[InstanceId]) -> CloudProviderResult<()>;

    /// Instances currently running in the group.
    fn nodes(&self) -> CloudProviderResult<Vec<InstanceId>>;

    /// False for theoretical groups that the autoscaler could create.
    fn exist(&self) -> bool;

    fn create(&self) -> CloudProviderResult<()>;

    fn delete(&self) -> CloudProviderResult<()>;

    /// Autoprovisioned groups may reach size zero and be deleted.
    fn autoprovisioned(&self) -> bool;
}

/// Discovery spec of a statically configured node group, `min:max:name`.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct NodeGroupSpec {
    pub name: String,
    pub min_size: usize,
    pub max_size: usize,
}

impl NodeGroupSpec {
    pub fn new(name: &str, min_size: usize, max_size: usize) -> Self {
        Self {
            name: name.to_string(),
            min_size,
            max_size,
        }
    }
}

impl FromStr for NodeGroupSpec {
    type Err = ConfigError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidNodeGroupSpec(spec.to_string());
        let mut parts = spec.splitn(3, ':');
        let (min, max, name) = match (parts.next(), parts.next(), parts.next()) {
            (Some(min), Some(max), Some(name)) => (min, max, name),
            _ => return Err(invalid()),
        };
        let min_size = min.trim().parse::<usize>().map_err(|_| invalid())?;
        let max_size = max.trim().parse::<usize>().map_err(|_| invalid())?;
        let name = name.trim();
        if name.is_empty() || min_size > max_size {
            return Err(invalid());
        }
        Ok(Self::new(name, min_size, max_size))
    }
}

impl Display for NodeGroupSpec {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.min_size, self.max_size, self.name)
    }
}
