use std::collections::HashMap;
use log::{debug, warn};
use crate::expander::{Expander, ExpansionOption, LEAST_WASTE};
use crate::node::NodeTemplate;
use crate::resources::{resources_for_node, resources_for_pods};

/// Prefers the option leaving the smallest fraction of cpu and memory unused.
pub struct LeastWasteExpander {
    fallback: Box<dyn Expander>,
}

impl LeastWasteExpander {
    pub fn new(fallback: Box<dyn Expander>) -> Self {
        Self { fallback }
    }
}

fn wasted_fraction(available: f64, requested: u64) -> f64 {
    (available - requested as f64) / available
}

impl Expander for LeastWasteExpander {
    fn name(&self) -> &'static str {
        LEAST_WASTE
    }

    fn best_option(&self, options: &[ExpansionOption],
                   node_infos: &HashMap<String, NodeTemplate>) -> Option<ExpansionOption> {
        let mut least_waste = f64::INFINITY;
        let mut best_options = Vec::<ExpansionOption>::default();

        for option in options {
            let group_id = option.node_group.id();
            let node = match node_infos.get(group_id) {
                Some(node) => node,
                None => {
                    warn!("No node info for node group {}, skipping it", group_id);
                    continue;
                }
            };
            let requested = resources_for_pods(&option.pods);
            let node_resources = resources_for_node(node);
            let available_cpu = node_resources.cpu_millis as f64 * option.node_count as f64;
            let available_memory = node_resources.memory_bytes as f64 * option.node_count as f64;
            if available_cpu <= 0.0 || available_memory <= 0.0 {
                warn!("Node group {} would add no cpu or memory, skipping it", group_id);
                continue;
            }

            let wasted_cpu = wasted_fraction(available_cpu, requested.cpu_millis);
            let wasted_memory = wasted_fraction(available_memory, requested.memory_bytes);
            let waste = wasted_cpu + wasted_memory;
            debug!("Expanding node group {} would waste {:.2}% cpu, {:.2}% memory, {:.2}% blended",
                   group_id, wasted_cpu * 100.0, wasted_memory * 100.0, waste * 50.0);

            if waste > least_waste {
                continue;
            }
            if waste < least_waste {
                least_waste = waste;
                best_options.clear();
            }
            best_options.push(option.with_debug(LEAST_WASTE, format!(
                "cpu waste {:.4}, memory waste {:.4}", wasted_cpu, wasted_memory)));
        }

        if best_options.is_empty() {
            return None;
        }
        self.fallback.best_option(&best_options, node_infos)
    }
}
