//! Representation of the k8s node template of a node group

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};
use crate::resources::Resources;

/// Shape of the nodes a node group would add.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeTemplate {
    pub name: String,
    pub capacity: Resources,
    /// Usually slightly lower than capacity. Scoring reads capacity only.
    pub allocatable: Resources,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl NodeTemplate {
    pub fn new(name: &str, capacity: Resources) -> Self {
        Self {
            name: name.to_string(),
            capacity,
            allocatable: capacity,
            labels: BTreeMap::default(),
        }
    }

    pub fn with_allocatable(mut self, allocatable: Resources) -> Self {
        self.allocatable = allocatable;
        self
    }

    pub fn with_label(mut self, key: &str, value: &str) -> Self {
        self.labels.insert(key.to_string(), value.to_string());
        self
    }

    pub fn has_gpu(&self) -> bool {
        self.capacity.gpus > 0
    }
}

impl Display for NodeTemplate {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} ({}m cpu, {} bytes memory", self.name, self.capacity.cpu_millis,
               self.capacity.memory_bytes)?;
        if self.has_gpu() {
            write!(f, ", {} gpu", self.capacity.gpus)?;
        }
        write!(f, ")")
    }
}
