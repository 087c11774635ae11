//! Tunable constants for blocking analysis and recommendations.
//!
//! Defaults reproduce the standard scoring: reduction weighted 0.7,
//! cardinality weighted 0.3, a rule is efficient from a score of 70, and
//! runtime estimates assume 10,000 comparisons per second.
//!
//! ```rust
//! use term_linkage::config::AnalyzerConfig;
//!
//! let config = AnalyzerConfig::default().with_comparisons_per_second(50_000.0);
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{LinkageError, Result};
use crate::security::InputValidator;

/// Scoring configuration for the blocking analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Weight of the reduction percentage in the efficiency score
    pub reduction_weight: f64,
    /// Weight of the cardinality ratio in the efficiency score
    pub cardinality_weight: f64,
    /// Minimum efficiency score for a rule to count as efficient
    pub efficient_threshold: u8,
    /// Assumed comparison throughput used for runtime estimates
    pub comparisons_per_second: f64,
    /// Thresholds for the recommendation rules
    pub recommendations: RecommendationConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            reduction_weight: 0.7,
            cardinality_weight: 0.3,
            efficient_threshold: 70,
            comparisons_per_second: 10_000.0,
            recommendations: RecommendationConfig::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Parses a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&contents)
    }

    /// Sets the score weights.
    pub fn with_weights(mut self, reduction: f64, cardinality: f64) -> Self {
        self.reduction_weight = reduction;
        self.cardinality_weight = cardinality;
        self
    }

    /// Sets the efficient threshold.
    pub fn with_efficient_threshold(mut self, threshold: u8) -> Self {
        self.efficient_threshold = threshold;
        self
    }

    /// Sets the throughput used for runtime estimates.
    pub fn with_comparisons_per_second(mut self, rate: f64) -> Self {
        self.comparisons_per_second = rate;
        self
    }

    /// Replaces the recommendation thresholds.
    pub fn with_recommendations(mut self, recommendations: RecommendationConfig) -> Self {
        self.recommendations = recommendations;
        self
    }

    /// Checks that weights are fractions summing to 1 and the rate is positive.
    pub fn validate(&self) -> Result<()> {
        InputValidator::validate_fraction(self.reduction_weight, "reduction_weight")?;
        InputValidator::validate_fraction(self.cardinality_weight, "cardinality_weight")?;

        let total = self.reduction_weight + self.cardinality_weight;
        if (total - 1.0).abs() > 1e-9 {
            return Err(LinkageError::configuration(format!(
                "score weights must sum to 1.0, got {total}"
            )));
        }
        if self.efficient_threshold > 100 {
            return Err(LinkageError::configuration(format!(
                "efficient_threshold must be at most 100, got {}",
                self.efficient_threshold
            )));
        }
        InputValidator::validate_threshold(self.comparisons_per_second, "comparisons_per_second")?;
        if self.comparisons_per_second <= 0.0 {
            return Err(LinkageError::configuration(
                "comparisons_per_second must be positive",
            ));
        }
        self.recommendations.validate()
    }
}

/// Thresholds used by the built-in recommendation rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    /// Reduction above which a rule is excellent
    pub excellent_reduction: f64,
    /// Reduction above which a rule performs well
    pub good_reduction: f64,
    /// Reduction below which a rule should be reconsidered
    pub poor_reduction: f64,
    /// Cardinality below which a column is too broad to block on
    pub min_cardinality: u64,
    /// Average efficiency above which the rule set is efficient overall
    pub overall_efficient: f64,
    /// Average efficiency below which more selective rules are needed
    pub overall_inefficient: f64,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            excellent_reduction: 99.0,
            good_reduction: 90.0,
            poor_reduction: 50.0,
            min_cardinality: 10,
            overall_efficient: 80.0,
            overall_inefficient: 50.0,
        }
    }
}

impl RecommendationConfig {
    pub fn validate(&self) -> Result<()> {
        for (value, name) in [
            (self.excellent_reduction, "excellent_reduction"),
            (self.good_reduction, "good_reduction"),
            (self.poor_reduction, "poor_reduction"),
            (self.overall_efficient, "overall_efficient"),
            (self.overall_inefficient, "overall_inefficient"),
        ] {
            InputValidator::validate_threshold(value, name)?;
        }
        if self.good_reduction > self.excellent_reduction {
            return Err(LinkageError::configuration(
                "good_reduction must not exceed excellent_reduction",
            ));
        }
        if self.poor_reduction > self.good_reduction {
            return Err(LinkageError::configuration(
                "poor_reduction must not exceed good_reduction",
            ));
        }
        if self.overall_inefficient > self.overall_efficient {
            return Err(LinkageError::configuration(
                "overall_inefficient must not exceed overall_efficient",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.reduction_weight, 0.7);
        assert_eq!(config.cardinality_weight, 0.3);
        assert_eq!(config.efficient_threshold, 70);
        assert_eq!(config.comparisons_per_second, 10_000.0);
        assert_eq!(config.recommendations.min_cardinality, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            AnalyzerConfig::from_json_str(r#"{"comparisons_per_second": 25000.0}"#).unwrap();
        assert_eq!(config.comparisons_per_second, 25_000.0);
        assert_eq!(config.efficient_threshold, 70);
        assert_eq!(config.recommendations, RecommendationConfig::default());
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let config = AnalyzerConfig::default().with_weights(0.5, 0.2);
        assert!(matches!(
            config.validate(),
            Err(LinkageError::Configuration(_))
        ));

        let config = AnalyzerConfig::default().with_weights(1.2, -0.2);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overlapping_reduction_bands_rejected() {
        let recommendations = RecommendationConfig {
            poor_reduction: 95.0,
            ..RecommendationConfig::default()
        };
        let config = AnalyzerConfig::default().with_recommendations(recommendations);
        assert!(matches!(
            config.validate(),
            Err(LinkageError::Configuration(msg)) if msg.contains("poor_reduction")
        ));

        let touching = RecommendationConfig {
            poor_reduction: 90.0,
            ..RecommendationConfig::default()
        };
        assert!(touching.validate().is_ok());
    }

    #[test]
    fn test_invalid_rate_rejected() {
        assert!(AnalyzerConfig::default()
            .with_comparisons_per_second(0.0)
            .validate()
            .is_err());
        assert!(AnalyzerConfig::default()
            .with_comparisons_per_second(f64::NAN)
            .validate()
            .is_err());
    }

    #[test]
    fn test_malformed_json_is_serialization_error() {
        let err = AnalyzerConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, LinkageError::Serialization(_)));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"efficient_threshold": 60, "recommendations": {{"min_cardinality": 25}}}}"#
        )
        .unwrap();

        let config = AnalyzerConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.efficient_threshold, 60);
        assert_eq!(config.recommendations.min_cardinality, 25);
        assert_eq!(config.recommendations.poor_reduction, 50.0);
    }
}
