//! Threshold evaluation engine for telemetry readings.
//!
//! Pure logic: the caller fetches readings and passes them in. At most one
//! violation is reported per reading; the first rule that fires wins.

use serde::Serialize;

use crate::error::CoreError;
use crate::reading::Reading;

/// Default lower temperature bound in degrees Celsius.
pub const DEFAULT_MIN_TEMPERATURE: f64 = 10.0;
/// Default upper temperature bound in degrees Celsius.
pub const DEFAULT_MAX_TEMPERATURE: f64 = 30.0;
/// Default lower humidity bound in percent.
pub const DEFAULT_MIN_HUMIDITY: f64 = 20.0;
/// Default upper humidity bound in percent.
pub const DEFAULT_MAX_HUMIDITY: f64 = 80.0;

/// Which measurement a rule checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Temperature,
    Humidity,
}

impl Metric {
    /// Display label, e.g. `"Temperature"`.
    pub fn label(self) -> &'static str {
        match self {
            Metric::Temperature => "Temperature",
            Metric::Humidity => "Humidity",
        }
    }

    /// Display unit appended to formatted values.
    pub fn unit(self) -> &'static str {
        match self {
            Metric::Temperature => "°C",
            Metric::Humidity => "%",
        }
    }

    /// Extract this metric's value from a reading.
    pub fn value_of(self, reading: &Reading) -> f64 {
        match self {
            Metric::Temperature => reading.temperature,
            Metric::Humidity => reading.humidity,
        }
    }
}

/// Direction of a bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Bound {
    /// Violated when the value is strictly below the limit.
    Min,
    /// Violated when the value is strictly above the limit.
    Max,
}

/// A single scalar bound on one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdRule {
    pub metric: Metric,
    pub bound: Bound,
    pub limit: f64,
}

impl ThresholdRule {
    pub fn min(metric: Metric, limit: f64) -> Self {
        Self {
            metric,
            bound: Bound::Min,
            limit,
        }
    }

    pub fn max(metric: Metric, limit: f64) -> Self {
        Self {
            metric,
            bound: Bound::Max,
            limit,
        }
    }

    /// Strict comparison: a value equal to the limit is not a violation.
    pub fn violates(&self, reading: &Reading) -> bool {
        let value = self.metric.value_of(reading);
        match self.bound {
            Bound::Min => value < self.limit,
            Bound::Max => value > self.limit,
        }
    }
}

/// A reading that failed one threshold rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub rule: ThresholdRule,
    pub reading: Reading,
}

impl Violation {
    /// The measured value of the rule's metric.
    pub fn observed(&self) -> f64 {
        self.rule.metric.value_of(&self.reading)
    }

    /// How far past the limit the observed value is (always positive).
    pub fn margin(&self) -> f64 {
        (self.observed() - self.rule.limit).abs()
    }
}

/// Evaluate `reading` against `rules` in order and return the first violation.
pub fn evaluate(reading: &Reading, rules: &[ThresholdRule]) -> Option<Violation> {
    rules
        .iter()
        .find(|rule| rule.violates(reading))
        .map(|rule| Violation {
            rule: *rule,
            reading: reading.clone(),
        })
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// The four configured bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdConfig {
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub min_humidity: f64,
    pub max_humidity: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            min_temperature: DEFAULT_MIN_TEMPERATURE,
            max_temperature: DEFAULT_MAX_TEMPERATURE,
            min_humidity: DEFAULT_MIN_HUMIDITY,
            max_humidity: DEFAULT_MAX_HUMIDITY,
        }
    }
}

impl ThresholdConfig {
    /// Check every bound is finite and each `min <= max`.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_range(
            "temperature",
            self.min_temperature,
            self.max_temperature,
        )?;
        validate_range("humidity", self.min_humidity, self.max_humidity)
    }

    /// Rule list in evaluation order: temperature min, temperature max,
    /// humidity min, humidity max.
    pub fn rules(&self) -> Vec<ThresholdRule> {
        vec![
            ThresholdRule::min(Metric::Temperature, self.min_temperature),
            ThresholdRule::max(Metric::Temperature, self.max_temperature),
            ThresholdRule::min(Metric::Humidity, self.min_humidity),
            ThresholdRule::max(Metric::Humidity, self.max_humidity),
        ]
    }
}

fn validate_range(name: &str, min: f64, max: f64) -> Result<(), CoreError> {
    if !min.is_finite() || !max.is_finite() {
        return Err(CoreError::Validation(format!(
            "{name} bounds must be finite, got min {min} and max {max}"
        )));
    }
    if min > max {
        return Err(CoreError::Validation(format!(
            "{name} minimum {min} is greater than maximum {max}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn default_rules() -> Vec<ThresholdRule> {
        ThresholdConfig::default().rules()
    }

    fn make_reading(temp: f64, humidity: f64) -> Reading {
        Reading::new("dev1", 100, temp, humidity)
    }

    #[test]
    fn no_violation_when_within_thresholds() {
        assert!(evaluate(&make_reading(25.0, 60.0), &default_rules()).is_none());
    }

    #[test]
    fn low_temperature_violates_min() {
        let violation = evaluate(&make_reading(5.0, 55.0), &default_rules()).unwrap();
        assert_eq!(violation.rule.metric, Metric::Temperature);
        assert_eq!(violation.rule.bound, Bound::Min);
        assert_eq!(violation.rule.limit, 10.0);
        assert_eq!(violation.margin(), 5.0);
    }

    #[test]
    fn high_humidity_violates_max() {
        let violation = evaluate(&make_reading(20.0, 91.5), &default_rules()).unwrap();
        assert_eq!(violation.rule.metric, Metric::Humidity);
        assert_eq!(violation.rule.bound, Bound::Max);
        assert_eq!(violation.observed(), 91.5);
    }

    #[test]
    fn boundary_values_do_not_violate() {
        let rules = default_rules();
        assert!(evaluate(&make_reading(10.0, 50.0), &rules).is_none());
        assert!(evaluate(&make_reading(30.0, 50.0), &rules).is_none());
        assert!(evaluate(&make_reading(20.0, 20.0), &rules).is_none());
        assert!(evaluate(&make_reading(20.0, 80.0), &rules).is_none());
    }

    #[test]
    fn first_matching_rule_wins() {
        // Both temperature max and humidity min fire; temperature comes first.
        let violation = evaluate(&make_reading(45.0, 5.0), &default_rules()).unwrap();
        assert_eq!(violation.rule.metric, Metric::Temperature);
        assert_eq!(violation.rule.bound, Bound::Max);

        // Reversing the list reverses the winner.
        let mut reversed = default_rules();
        reversed.reverse();
        let violation = evaluate(&make_reading(45.0, 5.0), &reversed).unwrap();
        assert_eq!(violation.rule.metric, Metric::Humidity);
        assert_eq!(violation.rule.bound, Bound::Min);
    }

    #[test]
    fn empty_rule_list_never_fires() {
        assert!(evaluate(&make_reading(-100.0, 500.0), &[]).is_none());
    }

    #[test]
    fn violation_carries_the_reading() {
        let reading = make_reading(31.25, 40.0);
        let violation = evaluate(&reading, &default_rules()).unwrap();
        assert_eq!(violation.reading, reading);
    }

    #[test]
    fn default_config_is_valid() {
        assert!(ThresholdConfig::default().validate().is_ok());
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let config = ThresholdConfig {
            min_temperature: 40.0,
            max_temperature: 10.0,
            ..ThresholdConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("temperature minimum"));
    }

    #[test]
    fn non_finite_bounds_are_rejected() {
        let config = ThresholdConfig {
            max_humidity: f64::NAN,
            ..ThresholdConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn equal_bounds_are_accepted() {
        let config = ThresholdConfig {
            min_humidity: 50.0,
            max_humidity: 50.0,
            ..ThresholdConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
