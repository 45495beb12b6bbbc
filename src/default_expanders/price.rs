//! Price based expander.
//!
//! Each option is scored as `unfitness * price_ratio`, lower is better:
//! - `price_ratio` compares what the new nodes cost with what the pods they
//!   schedule are worth. A synthetic stabilization pod is priced once per call and
//!   added on both sides so that very small pods do not dominate the ratio.
//! - `unfitness` measures how far the node shape is from the preferred node and is
//!   damped as the number of requested nodes grows. Gpu nodes get a fixed, very
//!   high unfitness.
//! - Groups that do not exist yet have their score multiplied by a fixed factor.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use log::{error, warn};
use crate::expander::{Expander, ExpansionOption, PRICE};
use crate::node::NodeTemplate;
use crate::pod::Pod;
use crate::pricing::{PreferredNodeProvider, PricingModel};
use crate::resources::{simple_node_unfitness, Resources, GIB, MIB};

/// Unfitness of any node carrying a gpu.
pub const GPU_UNFITNESS_OVERRIDE: f64 = 1000.0;
/// Score multiplier of groups that would have to be created.
pub const NOT_EXIST_COEFFICIENT: f64 = 2.0;

const PRICING_WINDOW: Duration = Duration::from_secs(60 * 60);

pub fn default_preferred_node() -> NodeTemplate {
    NodeTemplate::new("preferred", Resources::new(4000, 16 * GIB))
}

pub fn stabilization_pod() -> Pod {
    Pod::with_requests("stabilize", 500, 512 * MIB)
}

/// Damps the unfitness penalty as `node_count` grows. An infinite unfitness stays infinite.
pub fn suppressed_unfitness(unfitness: f64, node_count: usize) -> f64 {
    if unfitness.is_infinite() {
        return unfitness;
    }
    (unfitness - 1.0) * (1.0 - ((node_count as f64 - 1.0) / 15.0).tanh()) + 1.0
}

pub struct PriceBasedExpander {
    pricing_model: Arc<dyn PricingModel>,
    preferred_node_provider: Arc<dyn PreferredNodeProvider>,
}

impl PriceBasedExpander {
    pub fn new(pricing_model: Arc<dyn PricingModel>,
               preferred_node_provider: Arc<dyn PreferredNodeProvider>) -> Self {
        Self {
            pricing_model,
            preferred_node_provider,
        }
    }

    fn score_option(&self, option: &ExpansionOption, node: &NodeTemplate, preferred_node: &NodeTemplate,
                    stabilization_price: f64, start: SystemTime, end: SystemTime) -> Option<(f64, String)> {
        let group_id = option.node_group.id();
        let node_price = match self.pricing_model.node_price(node, start, end) {
            Ok(price) => price,
            Err(err) => {
                warn!("Failed to calculate node price for node group {}: {}", group_id, err);
                return None;
            }
        };
        let total_node_price = node_price * option.node_count as f64;

        let mut total_pod_price = 0.0;
        for pod in &option.pods {
            match self.pricing_model.pod_price(pod, start, end) {
                Ok(price) => total_pod_price += price,
                Err(err) => {
                    warn!("Failed to calculate price of pod {} for node group {}: {}", pod, group_id, err);
                    return None;
                }
            }
        }

        let denominator = total_pod_price + stabilization_price;
        if denominator <= 0.0 {
            warn!("Pods of node group {} are priced at zero, skipping it", group_id);
            return None;
        }
        let price_ratio = (total_node_price + stabilization_price) / denominator;

        let unfitness = simple_node_unfitness(preferred_node, node);
        let suppressed = if node.has_gpu() {
            GPU_UNFITNESS_OVERRIDE
        } else {
            suppressed_unfitness(unfitness, option.node_count)
        };

        let mut score = suppressed * price_ratio;
        if !option.node_group.exist() {
            score *= NOT_EXIST_COEFFICIENT;
        }
        if score.is_nan() {
            warn!("Score of node group {} is not a number, skipping it", group_id);
            return None;
        }
        let detail = format!("all_nodes_price={:.6} pods_price={:.6} stabilized_ratio={:.6} \
                              unfitness={:.6} suppressed={:.6} final_score={:.6}",
                             total_node_price, total_pod_price, price_ratio, unfitness, suppressed, score);
        Some((score, detail))
    }
}

impl Expander for PriceBasedExpander {
    fn name(&self) -> &'static str {
        PRICE
    }

    fn best_option(&self, options: &[ExpansionOption],
                   node_infos: &HashMap<String, NodeTemplate>) -> Option<ExpansionOption> {
        let start = SystemTime::now();
        let end = start + PRICING_WINDOW;

        let preferred_node = self.preferred_node_provider.node().unwrap_or_else(|err| {
            error!("Failed to get preferred node, switching to default: {}", err);
            default_preferred_node()
        });
        let stabilization_price = self.pricing_model.pod_price(&stabilization_pod(), start, end)
            .unwrap_or_else(|err| {
                error!("Failed to get price of stabilization pod, continuing without it: {}", err);
                0.0
            });

        let mut best: Option<(f64, ExpansionOption)> = None;
        for option in options {
            let node = match node_infos.get(option.node_group.id()) {
                Some(node) => node,
                None => {
                    warn!("No node info for node group {}, skipping it", option.node_group.id());
                    continue;
                }
            };
            let (score, detail) = match self.score_option(option, node, &preferred_node,
                                                          stabilization_price, start, end) {
                Some(scored) => scored,
                None => continue,
            };
            let is_better = match &best {
                None => true,
                Some((best_score, _)) => score < *best_score,
            };
            if is_better {
                best = Some((score, option.with_debug(PRICE, detail)));
            }
        }
        best.map(|(_, option)| option)
    }
}
