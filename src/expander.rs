//! Expanders choose which node group to scale up among competing options.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use serde::Serialize;
use crate::default_expanders::least_waste::LeastWasteExpander;
use crate::default_expanders::most_pods::MostPodsExpander;
use crate::default_expanders::price::PriceBasedExpander;
use crate::default_expanders::random::RandomExpander;
use crate::error::ConfigError;
use crate::node::NodeTemplate;
use crate::node_group::NodeGroup;
use crate::pod::Pod;
use crate::pricing::{PreferredNodeProvider, PricingModel};

pub const RANDOM: &str = "random";
pub const MOST_PODS: &str = "most-pods";
pub const LEAST_WASTE: &str = "least-waste";
pub const PRICE: &str = "price";

/// One step of reasoning an expander attached to an option.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DebugEntry {
    pub strategy: String,
    pub detail: String,
}

/// A scale-up candidate: the group, how many nodes it would add and which
/// unschedulable pods those nodes would fit.
#[derive(Clone, Debug)]
pub struct ExpansionOption {
    pub node_group: Arc<dyn NodeGroup>,
    pub node_count: usize,
    pub pods: Vec<Pod>,
    pub debug: Vec<DebugEntry>,
}

impl ExpansionOption {
    pub fn new(node_group: Arc<dyn NodeGroup>, node_count: usize, pods: Vec<Pod>) -> Self {
        Self {
            node_group,
            node_count,
            pods,
            debug: Vec::default(),
        }
    }

    /// Copy of this option with one more debug entry.
    pub fn with_debug(&self, strategy: &str, detail: String) -> Self {
        let mut option = self.clone();
        option.debug.push(DebugEntry {
            strategy: strategy.to_string(),
            detail,
        });
        option
    }
}

pub trait Expander: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns the best option, or None if no option is viable. Options without a
    /// node template in `node_infos` (keyed by group id) may be skipped.
    fn best_option(&self, options: &[ExpansionOption],
                   node_infos: &HashMap<String, NodeTemplate>) -> Option<ExpansionOption>;
}

type ExpanderConstructor = Box<dyn Fn() -> Box<dyn Expander> + Send + Sync>;

/// Maps expander names to constructors.
#[derive(Default)]
pub struct ExpanderRegistry {
    constructors: BTreeMap<String, ExpanderConstructor>,
}

impl ExpanderRegistry {
    pub fn new() -> Self {
        Default::default()
    }

    /// Registry with the four stock expanders. `seed` pins the random choices.
    pub fn with_defaults(pricing_model: Arc<dyn PricingModel>,
                         preferred_node_provider: Arc<dyn PreferredNodeProvider>,
                         seed: Option<u64>) -> Self {
        let random = move || match seed {
            Some(seed) => RandomExpander::with_seed(seed),
            None => RandomExpander::new(),
        };
        let mut registry = Self::new();
        registry.register(RANDOM, move || Box::new(random()));
        registry.register(MOST_PODS, move || Box::new(MostPodsExpander::new(Box::new(random()))));
        registry.register(LEAST_WASTE, move || Box::new(LeastWasteExpander::new(Box::new(random()))));
        registry.register(PRICE, move || Box::new(PriceBasedExpander::new(pricing_model.clone(),
                                                                         preferred_node_provider.clone())));
        registry
    }

    pub fn register(&mut self, name: &str,
                    constructor: impl Fn() -> Box<dyn Expander> + Send + Sync + 'static) {
        self.constructors.insert(name.to_string(), Box::new(constructor));
    }

    pub fn names(&self) -> Vec<String> {
        self.constructors.keys().cloned().collect()
    }

    pub fn build(&self, name: &str) -> Result<Box<dyn Expander>, ConfigError> {
        self.constructors.get(name)
            .map(|constructor| constructor())
            .ok_or_else(|| ConfigError::UnknownExpander(name.to_string()))
    }
}
