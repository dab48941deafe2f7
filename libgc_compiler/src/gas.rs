use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// An inclusive range of values, used both for retention windows and tolerance bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Both edges are inside the range
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    /// Reject ranges where min > max. `name` is only used for the error message.
    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if self.min > self.max || self.min.is_nan() || self.max.is_nan() {
            return Err(ConfigError::InvertedRange {
                name: name.to_string(),
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// A reference compound: where its peak is expected to show up.
///
/// A peak belongs to the gas if it was seen on `channel` with a retention time inside `range`
/// (inclusive).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasSpec {
    pub name: String,
    pub channel: u32,
    pub range: Range,
}

impl GasSpec {
    pub fn new(name: &str, channel: u32, min: f64, max: f64) -> Self {
        Self {
            name: name.to_string(),
            channel,
            range: Range::new(min, max),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.range
            .validate(&format!("{} (Chan#{})", self.name, self.channel))
    }

    /// The gas name as used in report column keys, i.e. spaces replaced by underscores
    pub fn key_name(&self) -> String {
        self.name.replace(' ', "_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_edges_inclusive() {
        let band = Range::new(0.4, 0.6);
        assert!(band.contains(0.4));
        assert!(band.contains(0.6));
        assert!(band.contains(0.5));
        assert!(!band.contains(0.399_999));
        assert!(!band.contains(0.600_001));
        assert!(!band.contains(f64::NAN));
    }

    #[test]
    fn test_validate() {
        assert!(GasSpec::new("Hydrogen", 1, 21.0, 26.0).validate().is_ok());
        assert!(GasSpec::new("Point", 1, 21.0, 21.0).validate().is_ok());
        match GasSpec::new("Backwards", 2, 33.0, 31.0).validate() {
            Err(ConfigError::InvertedRange { name, .. }) => assert_eq!(name, "Backwards (Chan#2)"),
            _ => panic!(),
        }
    }

    #[test]
    fn test_key_name() {
        assert_eq!(
            GasSpec::new("Carbon Monoxide", 1, 60.0, 90.0).key_name(),
            "Carbon_Monoxide"
        );
    }
}
