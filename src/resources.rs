//! Resource quantities and the numeric helpers shared by the expanders.

use std::ops::Add;
use serde::{Deserialize, Serialize};
use crate::node::NodeTemplate;
use crate::pod::Pod;

pub const MIB: u64 = 1024 * 1024;
pub const GIB: u64 = 1024 * MIB;

/// Cpu in millicores, memory in bytes, whole gpus.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    pub cpu_millis: u64,
    pub memory_bytes: u64,
    #[serde(default)]
    pub gpus: u64,
}

impl Resources {
    pub fn new(cpu_millis: u64, memory_bytes: u64) -> Self {
        Self {
            cpu_millis,
            memory_bytes,
            gpus: 0,
        }
    }

    pub fn with_gpus(mut self, gpus: u64) -> Self {
        self.gpus = gpus;
        self
    }

    pub fn cpu_cores(&self) -> f64 {
        self.cpu_millis as f64 / 1000.0
    }

    pub fn memory_gib(&self) -> f64 {
        self.memory_bytes as f64 / GIB as f64
    }
}

impl Add for Resources {
    type Output = Resources;

    fn add(self, other: Resources) -> Resources {
        Resources {
            cpu_millis: self.cpu_millis + other.cpu_millis,
            memory_bytes: self.memory_bytes + other.memory_bytes,
            gpus: self.gpus + other.gpus,
        }
    }
}

/// Sums cpu and memory requests (not limits) of all containers of all pods.
pub fn resources_for_pods(pods: &[Pod]) -> Resources {
    pods.iter().fold(Resources::default(), |acc, pod| acc + pod.requests())
}

/// Reads cpu and memory from the node capacity, not from allocatable.
pub fn resources_for_node(node: &NodeTemplate) -> Resources {
    node.capacity
}

/// How far the cpu shape of `evaluated` is from `preferred`.
/// Symmetric, never below 1.0 and exactly 1.0 for identical cpu.
pub fn simple_node_unfitness(preferred: &NodeTemplate, evaluated: &NodeTemplate) -> f64 {
    let preferred_cpu = resources_for_node(preferred).cpu_millis;
    let evaluated_cpu = resources_for_node(evaluated).cpu_millis;
    if preferred_cpu == evaluated_cpu {
        return 1.0;
    }
    if preferred_cpu == 0 || evaluated_cpu == 0 {
        return f64::INFINITY;
    }
    let preferred_cpu = preferred_cpu as f64;
    let evaluated_cpu = evaluated_cpu as f64;
    (preferred_cpu / evaluated_cpu).max(evaluated_cpu / preferred_cpu)
}
