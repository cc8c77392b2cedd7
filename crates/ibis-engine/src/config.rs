//! Engine configuration
//!
//! Every tunable of the construction engine lives here. All sections default
//! sensibly, so a TOML file only needs the keys it overrides:
//!
//! ```toml
//! [duplicate]
//! threshold = 0.9
//! window_secs = 60
//!
//! [cleanup_retry]
//! max_attempts = 5
//! ```

use crate::retry::RetryPolicy;
use ibis_layout::{LayoutConfig, LayoutError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Near-duplicate detection tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuplicatePolicy {
    /// Similarity at or above which a title counts as a duplicate
    pub threshold: f64,
    /// Trailing window of the author's own nodes to compare against
    pub window_secs: u64,
}

impl DuplicatePolicy {
    /// Window as a duration
    #[inline]
    #[must_use]
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for DuplicatePolicy {
    fn default() -> Self {
        Self {
            threshold: 0.85,
            window_secs: 30,
        }
    }
}

/// Per-submission caps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionLimits {
    /// Relationships attached to one new node
    pub max_relationships_per_node: usize,
    /// Root issues created in one batch
    pub max_root_issues: usize,
}

impl Default for SelectionLimits {
    fn default() -> Self {
        Self {
            max_relationships_per_node: 3,
            max_root_issues: 5,
        }
    }
}

/// Which suggestions get attached automatically
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionPolicy {
    /// Suggestions below this confidence are discarded
    pub min_confidence: f64,
    /// How many candidates to ask the service for
    pub request_limit: usize,
}

impl Default for SuggestionPolicy {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            request_limit: 10,
        }
    }
}

/// Embedding worker tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Bounded queue length; enqueue never blocks
    pub queue_capacity: usize,
    /// Retry schedule per node
    pub retry: RetryPolicy,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            retry: RetryPolicy::new(3, 200),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Duplicate detector
    pub duplicate: DuplicatePolicy,
    /// Compensating delete schedule
    pub cleanup_retry: RetryPolicy,
    /// Canvas, zones, jitter, root grid
    pub layout: LayoutConfig,
    /// Selection caps
    pub limits: SelectionLimits,
    /// Suggestion filtering
    pub suggestions: SuggestionPolicy,
    /// Embedding queue
    pub embedding: EmbeddingConfig,
    /// Fixed seed for placement jitter; entropy when absent
    pub rng_seed: Option<u64>,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With duplicate policy
    #[inline]
    #[must_use]
    pub fn with_duplicate_policy(mut self, threshold: f64, window: Duration) -> Self {
        self.duplicate = DuplicatePolicy {
            threshold,
            window_secs: window.as_secs(),
        };
        self
    }

    /// With cleanup retry schedule
    #[inline]
    #[must_use]
    pub fn with_cleanup_retry(mut self, retry: RetryPolicy) -> Self {
        self.cleanup_retry = retry;
        self
    }

    /// With layout
    #[inline]
    #[must_use]
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    /// With a fixed jitter seed
    #[inline]
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Parse a (partial) TOML document
    ///
    /// # Errors
    /// [`ConfigError::Parse`] on malformed TOML, or any [`Self::validate`] error.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject inconsistent values
    ///
    /// # Errors
    /// Describes the first inconsistency found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.duplicate.threshold) {
            return Err(ConfigError::Invalid(format!(
                "duplicate.threshold must be in [0, 1], got {}",
                self.duplicate.threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.suggestions.min_confidence) {
            return Err(ConfigError::Invalid(format!(
                "suggestions.min_confidence must be in [0, 1], got {}",
                self.suggestions.min_confidence
            )));
        }
        if self.cleanup_retry.max_attempts == 0 || self.embedding.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry policies need at least one attempt".to_string(),
            ));
        }
        if self.limits.max_relationships_per_node == 0 || self.limits.max_root_issues == 0 {
            return Err(ConfigError::Invalid(
                "selection limits must be positive".to_string(),
            ));
        }
        if self.embedding.queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "embedding.queue_capacity must be positive".to_string(),
            ));
        }
        if !self.layout.jitter_variation.is_finite() || self.layout.jitter_variation < 0.0 {
            return Err(ConfigError::Invalid(
                "layout.jitter_variation must be a non-negative number".to_string(),
            ));
        }
        self.layout.validate()?;
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            duplicate: DuplicatePolicy::default(),
            cleanup_retry: RetryPolicy::cleanup(),
            layout: LayoutConfig::default(),
            limits: SelectionLimits::default(),
            suggestions: SuggestionPolicy::default(),
            embedding: EmbeddingConfig::default(),
            rng_seed: None,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// TOML could not be parsed
    #[error("config parse error: {0}")]
    Parse(String),

    /// Value out of range
    #[error("invalid config: {0}")]
    Invalid(String),

    /// Layout inconsistency
    #[error("invalid layout: {0}")]
    Layout(#[from] LayoutError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use ibis_model::Category;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.duplicate.threshold, 0.85);
        assert_eq!(config.duplicate.window(), Duration::from_secs(30));
        assert_eq!(config.cleanup_retry, RetryPolicy::new(3, 100));
        assert_eq!(config.limits.max_relationships_per_node, 3);
        assert_eq!(config.limits.max_root_issues, 5);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            rng_seed = 7

            [duplicate]
            threshold = 0.9

            [cleanup_retry]
            max_attempts = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.duplicate.threshold, 0.9);
        assert_eq!(config.duplicate.window_secs, 30);
        assert_eq!(config.cleanup_retry.max_attempts, 5);
        assert_eq!(config.cleanup_retry.base_delay_ms, 100);
        assert_eq!(config.rng_seed, Some(7));
        assert_eq!(config.layout, LayoutConfig::default());
    }

    #[test]
    fn nested_layout_override() {
        let config = EngineConfig::from_toml_str(
            r#"
            [layout]
            jitter_variation = 20.0

            [layout.zones.issue]
            inner = 0.0
            outer = 80.0
            center = { x = 425.0, y = 325.0 }
            "#,
        )
        .unwrap();

        assert_eq!(config.layout.jitter_variation, 20.0);
        assert_eq!(config.layout.zones.issue.outer, 80.0);
        assert_eq!(config.layout.zones.position.inner, 100.0);
    }

    #[test]
    fn out_of_range_threshold_rejected() {
        let err = EngineConfig::from_toml_str("[duplicate]\nthreshold = 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn overlapping_zones_rejected() {
        let err = EngineConfig::from_toml_str(
            r#"
            [layout.zones.position]
            inner = 100.0
            outer = 250.0
            center = { x = 425.0, y = 325.0 }
            "#,
        )
        .unwrap_err();
        assert_eq!(err, ConfigError::Layout(LayoutError::OverlappingBands));
    }

    #[test]
    fn nan_canvas_bound_rejected() {
        let err = EngineConfig::from_toml_str(
            r#"
            [layout.canvas]
            min = { x = nan, y = 50.0 }
            max = { x = 800.0, y = 600.0 }
            "#,
        )
        .unwrap_err();
        assert_eq!(err, ConfigError::Layout(LayoutError::InvalidCanvas));
    }

    #[test]
    fn non_finite_zone_center_rejected() {
        let err = EngineConfig::from_toml_str(
            r#"
            [layout.zones.issue]
            inner = 0.0
            outer = 100.0
            center = { x = 425.0, y = inf }
            "#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Layout(LayoutError::InvalidCenter {
                category: Category::Issue
            })
        );
    }

    #[test]
    fn nan_grid_spacing_rejected() {
        let err = EngineConfig::from_toml_str("[layout]\ngrid_spacing = nan\n").unwrap_err();
        assert_eq!(err, ConfigError::Layout(LayoutError::NonFinite("grid_spacing")));
    }

    #[test]
    fn malformed_toml_rejected() {
        assert!(matches!(
            EngineConfig::from_toml_str("duplicate = ["),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn zero_attempts_rejected() {
        let config = EngineConfig::new().with_cleanup_retry(RetryPolicy::new(0, 100));
        assert!(config.validate().is_err());
    }
}
