//! Human-readable rendering of an optimization outcome.

use crate::run::OptimizationOutcome;

/// Format `outcome` as a console-style comparison report.
///
/// Successful runs get baseline vs. optimal costs, the absolute and
/// percentage reduction, and per-parameter optimal vs. baseline values
/// keyed by display name. Anything else renders the failure message.
pub fn format_outcome(outcome: &OptimizationOutcome) -> String {
    match (outcome.success, outcome.baseline_cost, outcome.optimal_cost) {
        (true, Some(baseline), Some(optimal)) => {
            let reduction = baseline - optimal;
            let reduction_pct = reduction / baseline * 100.0;

            let mut out = String::new();
            out.push_str("=== Optimization Results ===\n");
            out.push_str(&format!("Baseline LCOH2: ${baseline:.4}/kg\n"));
            out.push_str(&format!("Optimal LCOH2:  ${optimal:.4}/kg\n"));
            out.push_str(&format!(
                "Reduction:      ${reduction:.4}/kg ({reduction_pct:.2}%)\n\n"
            ));
            out.push_str("Optimized Parameter Values:\n");
            for (i, name) in outcome.parameter_names.iter().enumerate() {
                let baseline_value = outcome.baseline_values[i];
                let optimal_value = outcome.optimal_values[i];
                out.push_str(&format!(
                    "  {name}: {optimal_value:.2} (baseline: {baseline_value:.2})\n"
                ));
            }
            out
        }
        _ => {
            let message = outcome.message.as_deref().unwrap_or("unknown failure");
            format!("Optimization failed: {message}\n")
        }
    }
}
