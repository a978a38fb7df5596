//! Cost evaluation of candidate parameter vectors.
//!
//! Every evaluation works on its own deep copy of the base configuration;
//! the model may retain references into what it consumes, so copies are
//! never shared or reused across candidates.

use rayon::prelude::*;
use serde_json::Value;

use lh2_types::{set_by_path, DcfModel, Lh2Error, Lh2Result};

use crate::params::{CandidateVector, ParameterSet};

/// Substitutes candidate values into a private copy of the base
/// configuration and prices it with the DCF model.
///
/// Faults are returned as values at this boundary; containment into
/// penalty costs happens one layer up, in the objective wrapper.
pub struct CostEvaluator<'a> {
    base: &'a Value,
    params: &'a ParameterSet,
    model: &'a dyn DcfModel,
}

impl<'a> CostEvaluator<'a> {
    pub fn new(base: &'a Value, params: &'a ParameterSet, model: &'a dyn DcfModel) -> Self {
        Self {
            base,
            params,
            model,
        }
    }

    /// Build the configuration for one candidate: a deep copy of the base
    /// with each spec's value substituted at its path, creating
    /// intermediate mappings where absent.
    pub fn configuration(&self, candidate: &[f64]) -> Lh2Result<Value> {
        if candidate.len() != self.params.len() {
            return Err(Lh2Error::Validation(format!(
                "candidate has {} values for {} parameters",
                candidate.len(),
                self.params.len()
            )));
        }
        if let Some(bad) = candidate.iter().find(|v| !v.is_finite()) {
            return Err(Lh2Error::Validation(format!(
                "candidate contains a non-finite value: {bad}"
            )));
        }

        let mut config = self.base.clone();
        for (spec, &value) in self.params.specs().iter().zip(candidate) {
            set_by_path(&mut config, &spec.path, Value::from(value))?;
        }
        Ok(config)
    }

    /// Evaluate a single candidate and return its LCOH2 in $/kg.
    pub fn evaluate(&self, candidate: &[f64]) -> Lh2Result<f64> {
        let config = self.configuration(candidate)?;
        let summary = self.model.run(&config)?;
        Ok(summary.h2_cost)
    }

    /// Evaluate a batch of candidates, one independent configuration copy
    /// each, across worker threads. Results are aligned with input order.
    pub fn evaluate_batch(&self, candidates: &[CandidateVector]) -> Vec<Lh2Result<f64>> {
        candidates
            .par_iter()
            .map(|candidate| self.evaluate(candidate))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lh2_types::{DcfSummary, KeyPath, ModelError};
    use serde_json::json;

    /// Cost model: sum of the two leaf values it reads, so substitutions
    /// are directly observable in the cost.
    struct SumModel;

    impl DcfModel for SumModel {
        fn run(&self, input: &Value) -> Lh2Result<DcfSummary> {
            let a = lh2_types::get_by_path(input, &KeyPath::parse("Plant > A"))
                .and_then(lh2_types::coerce_f64)
                .ok_or(ModelError::MissingOutput {
                    field: "Plant > A".to_string(),
                })?;
            let b = lh2_types::get_by_path(input, &KeyPath::parse("Plant > B"))
                .and_then(lh2_types::coerce_f64)
                .ok_or(ModelError::MissingOutput {
                    field: "Plant > B".to_string(),
                })?;
            Ok(DcfSummary::new(a + b))
        }
    }

    struct FailingModel;

    impl DcfModel for FailingModel {
        fn run(&self, _input: &Value) -> Lh2Result<DcfSummary> {
            Err(ModelError::EvaluationFailed {
                message: "negative cash flow schedule".to_string(),
            }
            .into())
        }
    }

    fn base_config() -> Value {
        json!({"Plant": {"A": 1.0, "B": 2.0, "Keep": "untouched"}})
    }

    fn two_params() -> ParameterSet {
        ParameterSet::new()
            .with_parameter("Plant > A", "a", 0.0, 10.0)
            .with_parameter("Plant > B", "b", 0.0, 10.0)
    }

    #[test]
    fn substitutes_candidate_values() {
        let base = base_config();
        let params = two_params();
        let evaluator = CostEvaluator::new(&base, &params, &SumModel);

        assert_eq!(evaluator.evaluate(&[3.0, 4.0]).unwrap(), 7.0);
    }

    #[test]
    fn sibling_keys_survive_substitution() {
        let base = base_config();
        let params = two_params();
        let evaluator = CostEvaluator::new(&base, &params, &SumModel);

        let config = evaluator.configuration(&[5.0, 6.0]).unwrap();
        assert_eq!(config, json!({"Plant": {"A": 5.0, "B": 6.0, "Keep": "untouched"}}));
    }

    #[test]
    fn base_configuration_is_never_mutated() {
        let base = base_config();
        let params = two_params();
        let evaluator = CostEvaluator::new(&base, &params, &SumModel);

        evaluator.evaluate(&[9.0, 9.0]).unwrap();
        evaluator.evaluate(&[0.5, 0.5]).unwrap();
        assert_eq!(base, base_config());
    }

    #[test]
    fn evaluation_is_idempotent() {
        let base = base_config();
        let params = two_params();
        let evaluator = CostEvaluator::new(&base, &params, &SumModel);

        let first = evaluator.evaluate(&[2.5, 3.5]).unwrap();
        let second = evaluator.evaluate(&[2.5, 3.5]).unwrap();
        assert!((first - second).abs() < 1e-12);
    }

    #[test]
    fn bounds_are_inclusive() {
        let base = base_config();
        let params = two_params();
        let evaluator = CostEvaluator::new(&base, &params, &SumModel);

        assert!(evaluator.evaluate(&[0.0, 10.0]).is_ok());
        assert!(evaluator.evaluate(&[10.0, 0.0]).is_ok());
    }

    #[test]
    fn batch_results_align_with_input_order() {
        let base = base_config();
        let params = two_params();
        let evaluator = CostEvaluator::new(&base, &params, &SumModel);

        let candidates = vec![vec![1.0, 1.0], vec![2.0, 2.0], vec![3.0, 3.0]];
        let costs: Vec<f64> = evaluator
            .evaluate_batch(&candidates)
            .into_iter()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(costs, vec![2.0, 4.0, 6.0]);
    }

    #[test]
    fn dimension_mismatch_is_an_error() {
        let base = base_config();
        let params = two_params();
        let evaluator = CostEvaluator::new(&base, &params, &SumModel);

        assert!(evaluator.evaluate(&[1.0]).is_err());
        assert!(evaluator.evaluate(&[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn non_finite_candidate_is_an_error() {
        let base = base_config();
        let params = two_params();
        let evaluator = CostEvaluator::new(&base, &params, &SumModel);

        assert!(evaluator.evaluate(&[f64::NAN, 1.0]).is_err());
        assert!(evaluator.evaluate(&[1.0, f64::INFINITY]).is_err());
    }

    #[test]
    fn model_errors_propagate_as_values() {
        let base = base_config();
        let params = two_params();
        let evaluator = CostEvaluator::new(&base, &params, &FailingModel);

        let results = evaluator.evaluate_batch(&[vec![1.0, 1.0]]);
        assert!(results[0].is_err());
    }

    #[test]
    fn missing_intermediate_levels_are_created() {
        let base = json!({});
        let params = ParameterSet::new().with_parameter("New > Deep > Leaf", "leaf", 0.0, 1.0);
        let evaluator = CostEvaluator::new(&base, &params, &SumModel);

        let config = evaluator.configuration(&[0.25]).unwrap();
        assert_eq!(config, json!({"New": {"Deep": {"Leaf": 0.25}}}));
    }
}
