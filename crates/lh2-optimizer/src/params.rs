//! Parameter binding and optimizer settings.
//!
//! An input declares the variables to optimize as a table keyed by
//! parameter path, each entry carrying a display name and two bounds.
//! Binding resolves every declaration against the configuration once, up
//! front, so a malformed declaration can never surface mid-search.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use lh2_types::{coerce_f64, get_by_path, ConfigError, KeyPath, Lh2Error, Lh2Result};

/// Configuration section declaring the parameters to optimize.
pub const PARAMETERS_SECTION: &str = "Parameters - Optimization";

/// Configuration section holding optimizer settings.
pub const SETTINGS_SECTION: &str = "Optimization";

/// One proposed assignment of values to all declared parameters, in
/// declaration order.
pub type CandidateVector = Vec<f64>;

/// A named, bounded optimization variable bound to its location in the
/// input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Location of the value inside the nested configuration.
    pub path: KeyPath,
    /// Display name used in reports.
    pub name: String,
    /// Inclusive lower bound.
    pub lower: f64,
    /// Inclusive upper bound.
    pub upper: f64,
}

/// The ordered parameter set for one optimization run.
///
/// Declaration order is preserved: specs, bounds, names, baseline values,
/// and candidate vectors are all positionally aligned.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterSet {
    specs: Vec<ParameterSpec>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the declarations in `config` against the configuration itself.
    ///
    /// Fails fast on missing, non-numeric, non-finite, or inverted bounds
    /// and on paths that do not resolve to a numeric baseline value. An
    /// absent declaration section yields an empty set.
    pub fn from_config(config: &Value) -> Lh2Result<Self> {
        let mut set = Self::new();
        let Some(section) = config.get(PARAMETERS_SECTION).and_then(Value::as_object) else {
            return Ok(set);
        };

        for (raw_path, entry) in section {
            let path = KeyPath::parse(raw_path);
            let name = entry
                .get("Name")
                .and_then(Value::as_str)
                .unwrap_or(raw_path.as_str())
                .to_string();

            let lower = parse_bound(&name, "Lower_Bound", entry)?;
            let upper = parse_bound(&name, "Upper_Bound", entry)?;
            if lower >= upper {
                return Err(ConfigError::InvertedBounds {
                    parameter: name,
                    lower,
                    upper,
                }
                .into());
            }

            let baseline = get_by_path(config, &path).ok_or_else(|| ConfigError::UnresolvedPath {
                parameter: name.clone(),
                path: path.to_string(),
            })?;
            if coerce_f64(baseline).is_none() {
                return Err(ConfigError::NonNumericBaseline {
                    parameter: name,
                    path: path.to_string(),
                    raw: baseline.to_string(),
                }
                .into());
            }

            set.specs.push(ParameterSpec {
                path,
                name,
                lower,
                upper,
            });
        }

        Ok(set)
    }

    /// Append a parameter. Callers uphold `lower < upper`; the search
    /// engine revalidates bounds before running.
    pub fn with_parameter(mut self, path: &str, name: &str, lower: f64, upper: f64) -> Self {
        self.specs.push(ParameterSpec {
            path: KeyPath::parse(path),
            name: name.to_string(),
            lower,
            upper,
        });
        self
    }

    pub fn specs(&self) -> &[ParameterSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Bound pairs, aligned with declaration order.
    pub fn bounds(&self) -> Vec<(f64, f64)> {
        self.specs.iter().map(|s| (s.lower, s.upper)).collect()
    }

    /// Display names, aligned with declaration order.
    pub fn names(&self) -> Vec<String> {
        self.specs.iter().map(|s| s.name.clone()).collect()
    }

    /// Current values of every parameter inside `config`, aligned with
    /// declaration order.
    pub fn baseline_values(&self, config: &Value) -> Lh2Result<Vec<f64>> {
        self.specs
            .iter()
            .map(|spec| {
                let value =
                    get_by_path(config, &spec.path).ok_or_else(|| ConfigError::UnresolvedPath {
                        parameter: spec.name.clone(),
                        path: spec.path.to_string(),
                    })?;
                coerce_f64(value).ok_or_else(|| {
                    Lh2Error::from(ConfigError::NonNumericBaseline {
                        parameter: spec.name.clone(),
                        path: spec.path.to_string(),
                        raw: value.to_string(),
                    })
                })
            })
            .collect()
    }
}

fn parse_bound(parameter: &str, bound: &'static str, entry: &Value) -> Lh2Result<f64> {
    let raw = entry.get(bound).ok_or_else(|| ConfigError::MissingBound {
        parameter: parameter.to_string(),
        bound,
    })?;
    let value = coerce_f64(raw).ok_or_else(|| ConfigError::NonNumericBound {
        parameter: parameter.to_string(),
        bound,
        raw: raw.to_string(),
    })?;
    if !value.is_finite() {
        return Err(ConfigError::NonFiniteBound {
            parameter: parameter.to_string(),
            bound,
            value,
        }
        .into());
    }
    Ok(value)
}

// ---------------------------------------------------------------------------
// Optimizer settings
// ---------------------------------------------------------------------------

/// Search methods recognized by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchMethod {
    DifferentialEvolution,
}

impl SearchMethod {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "differential_evolution" => Some(Self::DifferentialEvolution),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DifferentialEvolution => "differential_evolution",
        }
    }
}

/// Optimizer settings, each with a defined default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerSettings {
    pub method: SearchMethod,
    /// Generation cap for the search.
    pub max_iterations: usize,
    /// Convergence threshold on the relative population spread.
    pub tolerance: f64,
    /// RNG seed; fixed so identical inputs reproduce identical runs.
    pub seed: u64,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            method: SearchMethod::DifferentialEvolution,
            max_iterations: 1000,
            tolerance: 1e-6,
            seed: 42,
        }
    }
}

impl OptimizerSettings {
    /// Read the settings section, falling back to defaults for absent
    /// entries. Unknown methods and malformed values are construction-time
    /// errors.
    pub fn from_config(config: &Value) -> Lh2Result<Self> {
        let defaults = Self::default();

        let method = match setting(config, "Method") {
            Some(value) => {
                let raw = value.as_str().ok_or_else(|| invalid_setting("Method", value))?;
                SearchMethod::parse(raw).ok_or(ConfigError::UnknownMethod {
                    method: raw.to_string(),
                })?
            }
            None => defaults.method,
        };

        let max_iterations = match setting(config, "Max_Iterations") {
            Some(value) => coerce_f64(value)
                .filter(|n| n.is_finite() && *n >= 1.0)
                .ok_or_else(|| invalid_setting("Max_Iterations", value))?
                as usize,
            None => defaults.max_iterations,
        };

        let tolerance = match setting(config, "Tolerance") {
            Some(value) => coerce_f64(value)
                .filter(|t| t.is_finite() && *t > 0.0)
                .ok_or_else(|| invalid_setting("Tolerance", value))?,
            None => defaults.tolerance,
        };

        let seed = match setting(config, "Seed") {
            Some(value) => coerce_f64(value)
                .filter(|s| s.is_finite() && *s >= 0.0)
                .map(|s| s as u64)
                .ok_or_else(|| invalid_setting("Seed", value))?,
            None => defaults.seed,
        };

        Ok(Self {
            method,
            max_iterations,
            tolerance,
            seed,
        })
    }
}

/// Settings entries live one level down, under a `Value` key.
fn setting<'a>(config: &'a Value, key: &str) -> Option<&'a Value> {
    config.get(SETTINGS_SECTION)?.get(key)?.get("Value")
}

fn invalid_setting(setting: &str, raw: &Value) -> ConfigError {
    ConfigError::InvalidSetting {
        setting: setting.to_string(),
        raw: raw.to_string(),
    }
}
