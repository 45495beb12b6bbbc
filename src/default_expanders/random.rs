use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::expander::{Expander, ExpansionOption, RANDOM};
use crate::node::NodeTemplate;

/// Picks an option uniformly at random. Also the tie breaker of other expanders.
pub struct RandomExpander {
    rng: Mutex<StdRng>,
}

impl RandomExpander {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomExpander {
    fn default() -> Self {
        Self::new()
    }
}

impl Expander for RandomExpander {
    fn name(&self) -> &'static str {
        RANDOM
    }

    fn best_option(&self, options: &[ExpansionOption],
                   _node_infos: &HashMap<String, NodeTemplate>) -> Option<ExpansionOption> {
        if options.is_empty() {
            return None;
        }
        let index = self.rng.lock().unwrap_or_else(PoisonError::into_inner).gen_range(0..options.len());
        let option = &options[index];
        Some(option.with_debug(RANDOM, format!("picked {} out of {} options", option.node_group.id(),
                                               options.len())))
    }
}
