use std::collections::HashMap;
use std::process::ExitCode;
use std::sync::Arc;
use log::{error, info};
use cluster_autoscaler_core::cloud_service::InMemoryCloudService;
use cluster_autoscaler_core::cluster_autoscaler::ClusterAutoscaler;
use cluster_autoscaler_core::config::AutoscalerConfig;
use cluster_autoscaler_core::expander::ExpansionOption;
use cluster_autoscaler_core::node::NodeTemplate;
use cluster_autoscaler_core::pod::Pod;
use cluster_autoscaler_core::resources::{Resources, GIB, MIB};

/// Node shape of the demo groups: the n-th group gets 2^n cores and 4 GiB per core.
fn demo_template(index: usize) -> NodeTemplate {
    let cores = 1u64 << index.min(5);
    NodeTemplate::new(&format!("template-{}", index), Resources::new(cores * 1000, cores * 4 * GIB))
}

fn run(config_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = AutoscalerConfig::from_file(config_path)?;
    let cloud_service = Arc::new(InMemoryCloudService::new());
    for (spec, group_config) in &config.node_groups {
        if !group_config.autoprovisioned {
            cloud_service.add_group(&spec.name, spec.min_size);
        }
    }
    let autoscaler = ClusterAutoscaler::new(&config, cloud_service.clone())?;

    let pending_pods: Vec<Pod> = (0..6)
        .map(|i| Pod::with_requests(&format!("pending-{}", i), 700, 1536 * MIB))
        .collect();
    let mut node_infos = HashMap::<String, NodeTemplate>::default();
    let mut options = Vec::<ExpansionOption>::default();
    for (index, node_group) in autoscaler.node_groups().into_iter().enumerate() {
        let template = demo_template(index);
        let per_node = (template.capacity.cpu_millis / 700).max(1) as usize;
        let node_count = pending_pods.len().div_ceil(per_node);
        node_infos.insert(node_group.id().to_string(), template);
        options.push(ExpansionOption::new(node_group, node_count, pending_pods.clone()));
    }

    match autoscaler.try_to_scale_up(&options, &node_infos)? {
        Some(best) => {
            cloud_service.provision();
            info!("Expander {} picked node group {} (+{} nodes)", autoscaler.expander_name(),
                  best.node_group.id(), best.node_count);
            println!("{}", serde_json::to_string_pretty(&best.debug)?);
        }
        None => info!("No node group can be scaled up"),
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config_path = match std::env::args().nth(1) {
        Some(path) => path,
        None => {
            error!("Usage: cluster-autoscaler-core <config.yaml>");
            return ExitCode::FAILURE;
        }
    };
    match run(&config_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
