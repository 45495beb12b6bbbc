//! Decision core of a cluster autoscaler: resolves which node group owns a running
//! instance and chooses which node group to scale up.

pub mod cloud_service;
pub mod cluster_autoscaler;
pub mod config;
pub mod error;
pub mod expander;
pub mod instance_group_resolver;
pub mod node;
pub mod node_group;
pub mod pod;
pub mod pricing;
pub mod resources;

pub mod default_expanders {
    pub mod least_waste;
    pub mod most_pods;
    pub mod price;
    pub mod random;
}

pub mod default_node_groups {
    pub mod cloud_node_group;
}
