use crate::error::MatchError;
use clap::Args;
use eyre::Result;
use serde::{Deserialize, Serialize};

/// Prefix of the environment variables read by [`MatcherConfig::load_config`].
pub const ENV_PREFIX: &str = "FPZK";

/// Fixed-point scale of `lowes_ratio` in the circuit input.
pub const LOWES_RATIO_SCALE: u32 = 10_000;
/// Fixed-point scale of `threshold` in the circuit input.
pub const THRESHOLD_SCALE: u32 = 100;

/// Command line overrides, flattened into every binary.
#[derive(Debug, Clone, Default, Args)]
pub struct Opt {
    #[arg(long)]
    pub min_matches: Option<usize>,

    #[arg(long)]
    pub lowes_ratio_numerator: Option<u32>,

    #[arg(long)]
    pub lowes_ratio_denominator: Option<u32>,

    #[arg(long)]
    pub count_saturation: Option<u32>,

    #[arg(long)]
    pub distance_weight: Option<u32>,

    #[arg(long)]
    pub count_weight: Option<u32>,

    #[arg(long, value_enum)]
    pub failure_policy: Option<FailurePolicy>,
}

/// What the match pipeline does with an error raised between loading and
/// scoring.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log the error and answer with a zero-score no-match.
    #[default]
    DowngradeToNoMatch,
    /// Return the error to the caller.
    Propagate,
}

/// Tuning of the matcher, filter and scorer. Built once and shared read-only
/// by every component of a match invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Good matches needed for `is_match`.
    #[serde(default = "default_min_matches")]
    pub min_matches: usize,

    #[serde(default = "default_lowes_ratio_numerator")]
    pub lowes_ratio_numerator: u32,

    #[serde(default = "default_lowes_ratio_denominator")]
    pub lowes_ratio_denominator: u32,

    /// Good match count at which the count score saturates at 100.
    #[serde(default = "default_count_saturation")]
    pub count_saturation: u32,

    #[serde(default = "default_distance_weight")]
    pub distance_weight: u32,

    #[serde(default = "default_count_weight")]
    pub count_weight: u32,

    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Scan query descriptors on the rayon pool.
    #[serde(default = "default_parallel_scan")]
    pub parallel_scan: bool,

    #[serde(default = "default_load_max_retries")]
    pub load_max_retries: usize,

    #[serde(default = "default_load_initial_backoff_ms")]
    pub load_initial_backoff_ms: u64,

    #[serde(default)]
    pub metrics: Option<MetricsConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub host: String,
    pub port: u16,
    pub queue_size: usize,
    pub buffer_size: usize,
    pub prefix: String,
}

fn default_min_matches() -> usize {
    10
}

fn default_lowes_ratio_numerator() -> u32 {
    7_000
}

fn default_lowes_ratio_denominator() -> u32 {
    LOWES_RATIO_SCALE
}

fn default_count_saturation() -> u32 {
    30
}

fn default_distance_weight() -> u32 {
    40
}

fn default_count_weight() -> u32 {
    60
}

fn default_parallel_scan() -> bool {
    true
}

fn default_load_max_retries() -> usize {
    3
}

fn default_load_initial_backoff_ms() -> u64 {
    50
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            min_matches: default_min_matches(),
            lowes_ratio_numerator: default_lowes_ratio_numerator(),
            lowes_ratio_denominator: default_lowes_ratio_denominator(),
            count_saturation: default_count_saturation(),
            distance_weight: default_distance_weight(),
            count_weight: default_count_weight(),
            failure_policy: FailurePolicy::default(),
            parallel_scan: default_parallel_scan(),
            load_max_retries: default_load_max_retries(),
            load_initial_backoff_ms: default_load_initial_backoff_ms(),
            metrics: None,
        }
    }
}

impl MatcherConfig {
    /// Reads `{prefix}__*` environment variables on top of the defaults, e.g.
    /// `FPZK__MIN_MATCHES=12`. Not validated here since command line
    /// overrides usually follow.
    pub fn load_config(prefix: &str) -> Result<MatcherConfig> {
        let settings = config::Config::builder();
        let settings = settings
            .add_source(
                config::Environment::with_prefix(prefix)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: MatcherConfig = settings.try_deserialize::<MatcherConfig>()?;
        Ok(config)
    }

    pub fn overwrite_defaults_with_cli_args(&mut self, opts: Opt) {
        if let Some(min_matches) = opts.min_matches {
            self.min_matches = min_matches;
        }
        if let Some(numerator) = opts.lowes_ratio_numerator {
            self.lowes_ratio_numerator = numerator;
        }
        if let Some(denominator) = opts.lowes_ratio_denominator {
            self.lowes_ratio_denominator = denominator;
        }
        if let Some(count_saturation) = opts.count_saturation {
            self.count_saturation = count_saturation;
        }
        if let Some(distance_weight) = opts.distance_weight {
            self.distance_weight = distance_weight;
        }
        if let Some(count_weight) = opts.count_weight {
            self.count_weight = count_weight;
        }
        if let Some(failure_policy) = opts.failure_policy {
            self.failure_policy = failure_policy;
        }
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if self.lowes_ratio_numerator == 0 || self.lowes_ratio_denominator == 0 {
            return Err(MatchError::InvalidConfig(format!(
                "lowes ratio must be positive, got {}/{}",
                self.lowes_ratio_numerator, self.lowes_ratio_denominator
            )));
        }
        if self.lowes_ratio_numerator >= self.lowes_ratio_denominator {
            return Err(MatchError::InvalidConfig(format!(
                "lowes ratio must be below 1, got {}/{}",
                self.lowes_ratio_numerator, self.lowes_ratio_denominator
            )));
        }
        // The circuit only sees the ratio at LOWES_RATIO_SCALE.
        if self.lowes_ratio_numerator as u64 * LOWES_RATIO_SCALE as u64
            % self.lowes_ratio_denominator as u64
            != 0
        {
            return Err(MatchError::InvalidConfig(format!(
                "lowes ratio {}/{} is not a multiple of 1/{}",
                self.lowes_ratio_numerator, self.lowes_ratio_denominator, LOWES_RATIO_SCALE
            )));
        }
        if self.count_saturation == 0 {
            return Err(MatchError::InvalidConfig(
                "count_saturation must be positive".to_string(),
            ));
        }
        if self.distance_weight.checked_add(self.count_weight) != Some(100) {
            return Err(MatchError::InvalidConfig(format!(
                "distance_weight + count_weight must be 100, got {} + {}",
                self.distance_weight, self.count_weight
            )));
        }
        Ok(())
    }

    /// Lowe's ratio scaled by [`LOWES_RATIO_SCALE`]. Exact for a validated
    /// config.
    pub fn lowes_ratio_scaled(&self) -> u32 {
        scale_ratio(
            self.lowes_ratio_numerator,
            self.lowes_ratio_denominator,
            LOWES_RATIO_SCALE,
        )
    }

    /// Lowe's ratio scaled by [`THRESHOLD_SCALE`], floored.
    pub fn threshold_scaled(&self) -> u32 {
        scale_ratio(
            self.lowes_ratio_numerator,
            self.lowes_ratio_denominator,
            THRESHOLD_SCALE,
        )
    }
}

fn scale_ratio(numerator: u32, denominator: u32, scale: u32) -> u32 {
    (numerator as u64 * scale as u64 / denominator as u64) as u32
}
