use std::collections::HashMap;
use crate::expander::{Expander, ExpansionOption, MOST_PODS};
use crate::node::NodeTemplate;

/// Prefers the option that schedules the most pods, ties go to the fallback.
pub struct MostPodsExpander {
    fallback: Box<dyn Expander>,
}

impl MostPodsExpander {
    pub fn new(fallback: Box<dyn Expander>) -> Self {
        Self { fallback }
    }
}

impl Expander for MostPodsExpander {
    fn name(&self) -> &'static str {
        MOST_PODS
    }

    fn best_option(&self, options: &[ExpansionOption],
                   node_infos: &HashMap<String, NodeTemplate>) -> Option<ExpansionOption> {
        let mut max_pods = 0;
        let mut best_options = Vec::<ExpansionOption>::default();
        for option in options {
            let pods = option.pods.len();
            if pods < max_pods {
                continue;
            }
            if pods > max_pods {
                max_pods = pods;
                best_options.clear();
            }
            best_options.push(option.with_debug(MOST_PODS, format!("{} pods", pods)));
        }
        if best_options.is_empty() {
            return None;
        }
        self.fallback.best_option(&best_options, node_infos)
    }
}
