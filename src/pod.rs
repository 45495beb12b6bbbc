//! Representation of the k8s pod

use std::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};
use crate::resources::Resources;

/// Single container of a pod. Requests and limits are optional, as in k8s.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub name: String,
    pub requests: Option<Resources>,
    pub limits: Option<Resources>,
}

impl Container {
    pub fn new(name: &str, requests: Option<Resources>, limits: Option<Resources>) -> Self {
        Self {
            name: name.to_string(),
            requests,
            limits,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pod {
    pub name: String,
    pub namespace: String,
    pub containers: Vec<Container>,
}

impl Pod {
    pub fn new(name: &str, namespace: &str, containers: Vec<Container>) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            containers,
        }
    }

    /// Pod with one container requesting the given cpu (millicores) and memory (bytes).
    pub fn with_requests(name: &str, cpu_millis: u64, memory_bytes: u64) -> Self {
        let requests = Resources::new(cpu_millis, memory_bytes);
        Self::new(name, "default", vec![Container::new("main", Some(requests), None)])
    }

    /// Sum of requests over all containers. Containers without requests contribute zero.
    pub fn requests(&self) -> Resources {
        self.containers.iter()
            .filter_map(|container| container.requests)
            .fold(Resources::default(), |acc, requests| acc + requests)
    }
}

impl Display for Pod {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
