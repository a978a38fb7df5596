//! Contract with the external discounted-cash-flow evaluator.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::errors::Lh2Result;

/// Output of one DCF evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfSummary {
    /// Levelized hydrogen cost in $/kg.
    pub h2_cost: f64,

    /// Auxiliary named metrics reported by the model (cost contributions,
    /// capacity figures, ...). Ignored by the optimization core.
    pub metrics: HashMap<String, f64>,
}

impl DcfSummary {
    pub fn new(h2_cost: f64) -> Self {
        Self {
            h2_cost,
            metrics: HashMap::new(),
        }
    }

    pub fn with_metric(mut self, name: &str, value: f64) -> Self {
        self.metrics.insert(name.to_string(), value);
        self
    }
}

/// A discounted-cash-flow model evaluating a full techno-economic
/// configuration.
///
/// The model is a black box to the optimization core: it may reject a
/// configuration with any [`Lh2Error`](crate::errors::Lh2Error), and it may
/// retain references into the structure it consumes, so callers hand each
/// invocation its own copy. `Send + Sync` because batches of independent
/// evaluations run on worker threads.
pub trait DcfModel: Send + Sync {
    /// Evaluate `input` and return the cost summary.
    fn run(&self, input: &Value) -> Lh2Result<DcfSummary>;

    /// Human-readable model name.
    fn name(&self) -> &str {
        "dcf"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FlatCost(f64);

    impl DcfModel for FlatCost {
        fn run(&self, _input: &Value) -> Lh2Result<DcfSummary> {
            Ok(DcfSummary::new(self.0).with_metric("capex", 1.2e6))
        }
    }

    #[test]
    fn summary_carries_cost_and_metrics() {
        let model = FlatCost(4.75);
        let summary = model.run(&json!({})).unwrap();
        assert_eq!(summary.h2_cost, 4.75);
        assert_eq!(summary.metrics.get("capex"), Some(&1.2e6));
        assert_eq!(model.name(), "dcf");
    }
}
