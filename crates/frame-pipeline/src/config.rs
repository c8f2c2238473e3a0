//! Pipeline configuration.
//!
//! One immutable [`PipelineConfig`] is built before a run and passed by
//! reference into every entry point. Values are layered, lowest first:
//!
//! 1. built-in defaults
//! 2. a YAML file, with `${VAR}` and `${VAR:-default}` substitution
//! 3. `FRAME_OUTPUT_DIR` / `FRAME_TIME_BLOCK` environment variables
//! 4. command-line flags (applied by the binary)

use std::path::{Path, PathBuf};

use moisture_common::{FrameError, FrameResult};
use renderer::ScalingLaw;
use serde::{Deserialize, Serialize};

/// Default number of timesteps per block, matching the on-disk chunking of
/// the reanalysis downloads.
pub const DEFAULT_TIME_BLOCK: usize = 183;

/// Environment override for the output directory.
pub const ENV_OUTPUT_DIR: &str = "FRAME_OUTPUT_DIR";

/// Environment override for the block size.
pub const ENV_TIME_BLOCK: &str = "FRAME_TIME_BLOCK";

// ============================================================================
// Configuration types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory receiving one PNG per retained timestep.
    pub output_dir: PathBuf,
    /// Timesteps loaded per block.
    pub time_block: usize,
    /// Calendar months rendered by the anomaly variant; empty means all.
    pub months: Vec<u32>,
    pub channels: ChannelScales,
    pub inputs: InputPaths,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("frames"),
            time_block: DEFAULT_TIME_BLOCK,
            months: vec![11, 12],
            channels: ChannelScales::default(),
            inputs: InputPaths::default(),
        }
    }
}

/// Scaling law of every quantity that can land on a channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelScales {
    /// Total column water, kg/m^2.
    pub tcw: ScalingLaw,
    /// Total column water minus its monthly climatology, kg/m^2.
    pub anomaly: ScalingLaw,
    /// Total precipitation, m.
    pub precipitation: ScalingLaw,
    /// Evaporation as a positive downward amount, m.
    pub evaporation: ScalingLaw,
}

impl Default for ChannelScales {
    fn default() -> Self {
        Self {
            tcw: ScalingLaw::new(0.0, 110.0),
            anomaly: ScalingLaw::new(-50.0, 50.0),
            precipitation: ScalingLaw::new(0.0, 0.02),
            evaporation: ScalingLaw::new(0.0, 0.003),
        }
    }
}

impl ChannelScales {
    fn named(&self) -> [(&'static str, &ScalingLaw); 4] {
        [
            ("tcw", &self.tcw),
            ("anomaly", &self.anomaly),
            ("precipitation", &self.precipitation),
            ("evaporation", &self.evaporation),
        ]
    }
}

/// Input dataset locations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputPaths {
    /// Instantaneous fields (total column water).
    pub instant: Option<PathBuf>,
    /// Multi-year baseline for the monthly climatology.
    pub baseline: Option<PathBuf>,
    /// Accumulated fields (precipitation, evaporation).
    pub accumulated: Option<PathBuf>,
}

// ============================================================================
// Loading
// ============================================================================

impl PipelineConfig {
    /// Parse YAML after environment substitution. Missing keys keep their
    /// defaults.
    pub fn from_yaml_str(content: &str) -> FrameResult<Self> {
        let expanded = expand_env_vars(content)?;
        serde_yaml::from_str(&expanded)
            .map_err(|e| FrameError::InvalidConfig(format!("YAML parse error: {e}")))
    }

    /// Load a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> FrameResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            FrameError::InvalidConfig(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Apply `FRAME_OUTPUT_DIR` and `FRAME_TIME_BLOCK` from the process
    /// environment.
    pub fn apply_env(&mut self) -> FrameResult<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> FrameResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_OUTPUT_DIR).filter(|v| !v.is_empty()) {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup(ENV_TIME_BLOCK).filter(|v| !v.is_empty()) {
            self.time_block = raw.trim().parse().map_err(|_| {
                FrameError::InvalidConfig(format!("{ENV_TIME_BLOCK}={raw} is not a block size"))
            })?;
        }
        Ok(())
    }

    /// Reject settings no run could succeed with.
    pub fn validate(&self) -> FrameResult<()> {
        if self.time_block == 0 {
            return Err(FrameError::InvalidConfig(
                "time_block must be greater than 0".to_string(),
            ));
        }

        for (name, law) in self.channels.named() {
            if !law.is_valid() {
                return Err(FrameError::InvalidConfig(format!(
                    "channel {name} needs finite bounds with max > min, got [{}, {}]",
                    law.min, law.max
                )));
            }
        }

        if let Some(bad) = self.months.iter().find(|m| !(1..=12).contains(*m)) {
            return Err(FrameError::InvalidConfig(format!(
                "month {bad} is outside 1..=12"
            )));
        }

        Ok(())
    }
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in YAML content.
/// Supports ${VAR} and ${VAR:-default} syntax.
fn expand_env_vars(content: &str) -> FrameResult<String> {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut var_expr = String::new();
            let mut brace_count = 1;

            while brace_count > 0 {
                match chars.next() {
                    Some('{') => {
                        brace_count += 1;
                        var_expr.push('{');
                    }
                    Some('}') => {
                        brace_count -= 1;
                        if brace_count > 0 {
                            var_expr.push('}');
                        }
                    }
                    Some(c) => var_expr.push(c),
                    None => {
                        return Err(FrameError::InvalidConfig(format!(
                            "unclosed variable substitution: ${{{var_expr}"
                        )))
                    }
                }
            }

            result.push_str(&resolve_var_expr(&var_expr)?);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

/// Resolve variable expression (supports VAR and VAR:-default syntax).
fn resolve_var_expr(expr: &str) -> FrameResult<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).map_err(|_| {
            FrameError::InvalidConfig(format!("environment variable {expr} not set"))
        })
    }
}
