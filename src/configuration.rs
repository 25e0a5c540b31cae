use std::io::Read;

use serde::{
    Deserialize,
    Serialize
};

use crate::curve::curve::{
    DEFAULT_LOWER_LIMIT,
    validate_lower_limit
};
use crate::error::toolboxerror::{
    Result,
    ToolboxError,
    parse_json_value
};
use crate::math::interpolation::InterpolationMethod;

fn default_lower_limit() -> f64 {
    DEFAULT_LOWER_LIMIT
}

fn default_true() -> bool {
    true
}

/// Options passed explicitly into every operation.
///
/// Every field has a default, so `{}` is a valid configuration document:
///
/// ```json
/// {
///     "lower_limit": 1e-200,
///     "enforce_monotonic": true,
///     "add_steps": true,
///     "refine_step_size": 0.05,
///     "include_tail": true,
///     "contribution_floor": 0.0,
///     "fragility_interpolation": "Log"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default = "default_lower_limit")]
    lower_limit: f64,
    #[serde(default = "default_true")]
    enforce_monotonic: bool,
    #[serde(default = "default_true")]
    add_steps: bool,
    #[serde(default)]
    refine_step_size: Option<f64>,
    #[serde(default = "default_true")]
    include_tail: bool,
    #[serde(default)]
    contribution_floor: f64,
    #[serde(default)]
    fragility_interpolation: InterpolationMethod
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            lower_limit: DEFAULT_LOWER_LIMIT,
            enforce_monotonic: true,
            add_steps: true,
            refine_step_size: None,
            include_tail: true,
            contribution_floor: 0.0,
            fragility_interpolation: InterpolationMethod::Log
        }
    }
}

impl Configuration {
    pub fn new() -> Configuration {
        Configuration::default()
    }

    pub fn from_json_value(json_value: serde_json::Value) -> Result<Configuration> {
        let configuration: Configuration = parse_json_value(json_value)?;
        configuration.validate()?;
        Ok(configuration)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Configuration> {
        let json_value: serde_json::Value = serde_json::from_reader(reader)?;
        Configuration::from_json_value(json_value)
    }

    pub fn validate(&self) -> Result<()> {
        validate_lower_limit(self.lower_limit)?;
        if let Some(step) = self.refine_step_size {
            if !(step > 0.0) || !step.is_finite() {
                return Err(ToolboxError::numeric_domain(format!(
                    "refine step size must be positive, got {}", step
                )));
            }
        }
        if !(self.contribution_floor >= 0.0) {
            return Err(ToolboxError::numeric_domain(format!(
                "contribution floor must be non-negative, got {}", self.contribution_floor
            )));
        }
        Ok(())
    }

    pub fn lower_limit(&self) -> f64 {
        self.lower_limit
    }

    pub fn enforce_monotonic(&self) -> bool {
        self.enforce_monotonic
    }

    pub fn add_steps(&self) -> bool {
        self.add_steps
    }

    /// Uniform resampling step. When unset, integration splits the exceedance
    /// range into a fixed number of intervals and combination keeps the input
    /// loads.
    pub fn refine_step_size(&self) -> Option<f64> {
        self.refine_step_size
    }

    pub fn include_tail(&self) -> bool {
        self.include_tail
    }

    pub fn contribution_floor(&self) -> f64 {
        self.contribution_floor
    }

    pub fn fragility_interpolation(&self) -> InterpolationMethod {
        self.fragility_interpolation
    }

    pub fn with_lower_limit(mut self, lower_limit: f64) -> Configuration {
        self.lower_limit = lower_limit;
        self
    }

    pub fn with_enforce_monotonic(mut self, enforce_monotonic: bool) -> Configuration {
        self.enforce_monotonic = enforce_monotonic;
        self
    }

    pub fn with_add_steps(mut self, add_steps: bool) -> Configuration {
        self.add_steps = add_steps;
        self
    }

    pub fn with_refine_step_size(mut self, refine_step_size: Option<f64>) -> Configuration {
        self.refine_step_size = refine_step_size;
        self
    }

    pub fn with_include_tail(mut self, include_tail: bool) -> Configuration {
        self.include_tail = include_tail;
        self
    }

    pub fn with_contribution_floor(mut self, contribution_floor: f64) -> Configuration {
        self.contribution_floor = contribution_floor;
        self
    }

    pub fn with_fragility_interpolation(mut self, method: InterpolationMethod) -> Configuration {
        self.fragility_interpolation = method;
        self
    }
}
