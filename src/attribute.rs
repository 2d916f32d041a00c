//! Attribute schema: names, types, and the string↔scalar encoding used
//! throughout the crate.
//!
//! Every value that flows through a [`Dataset`](crate::dataset::Dataset) is
//! a plain `f64`. Nominal attributes store the index into their `levels`
//! table as that `f64`; missing values of any type are `NaN`.

use crate::error::{RuleInductionError, RuleInductionResult};
use serde::{Deserialize, Serialize};

/// The two attribute kinds the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeType {
    /// Ordered, real-valued; possibly missing.
    Numerical,
    /// Finite-domain categorical; possibly missing.
    Nominal,
}

/// Name, type, and (for nominal attributes) level table of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    name: String,
    attribute_type: AttributeType,
    /// Ordered list of level strings. Empty for numerical attributes.
    levels: Vec<String>,
}

impl Attribute {
    /// Builds a numerical attribute.
    pub fn numerical(name: impl Into<String>) -> Self {
        Attribute {
            name: name.into(),
            attribute_type: AttributeType::Numerical,
            levels: Vec::new(),
        }
    }

    /// Builds a nominal attribute with the given ordered levels.
    pub fn nominal(name: impl Into<String>, levels: Vec<String>) -> Self {
        Attribute {
            name: name.into(),
            attribute_type: AttributeType::Nominal,
            levels,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute_type(&self) -> AttributeType {
        self.attribute_type
    }

    pub fn is_nominal(&self) -> bool {
        matches!(self.attribute_type, AttributeType::Nominal)
    }

    pub fn is_numerical(&self) -> bool {
        matches!(self.attribute_type, AttributeType::Numerical)
    }

    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    /// Appends a new level, returning its index, or reuses an existing one.
    pub fn intern_level(&mut self, value: &str) -> usize {
        if let Some(pos) = self.levels.iter().position(|l| l == value) {
            pos
        } else {
            self.levels.push(value.to_string());
            self.levels.len() - 1
        }
    }

    /// Encodes a raw string field into the scalar representation.
    ///
    /// Empty string, `"?"`, and `"NA"` always decode to `NaN` regardless of
    /// type. For nominal attributes the string must already be a known
    /// level. For numerical attributes the string must parse as a float.
    pub fn encode(&self, raw: &str) -> RuleInductionResult<f64> {
        if raw.is_empty() || raw == "?" || raw == "NA" {
            return Ok(f64::NAN);
        }
        match self.attribute_type {
            AttributeType::Nominal => self
                .levels
                .iter()
                .position(|l| l == raw)
                .map(|idx| idx as f64)
                .ok_or_else(|| {
                    RuleInductionError::SchemaMismatch(format!(
                        "unknown value \"{raw}\" for nominal attribute \"{}\"",
                        self.name
                    ))
                }),
            AttributeType::Numerical => raw.trim().parse::<f64>().map_err(|_| {
                RuleInductionError::SchemaMismatch(format!(
                    "attribute \"{}\" is numerical, cannot parse \"{raw}\"",
                    self.name
                ))
            }),
        }
    }

    /// Decodes a scalar back into its string form.
    ///
    /// Nominal attributes look up `levels[round(scalar)]`; numerical
    /// attributes format the float with the default `f64` `Display`
    /// formatting. `NaN` decodes to `"?"`.
    pub fn decode(&self, value: f64) -> String {
        if value.is_nan() {
            return "?".to_string();
        }
        match self.attribute_type {
            AttributeType::Nominal => {
                let idx = value.round() as usize;
                self.levels
                    .get(idx)
                    .cloned()
                    .unwrap_or_else(|| "?".to_string())
            }
            AttributeType::Numerical => format_float(value),
        }
    }
}

/// Formats a float the way the engine's rule grammar expects: the shortest
/// representation that round-trips, with no trailing `.0` stripped (matches
/// the host's default float formatting referenced by the rule grammar).
pub(crate) fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numerical_encode_decode() {
        let attr = Attribute::numerical("x1");
        assert_eq!(attr.encode("3.14").unwrap(), 3.14);
        assert!(attr.encode("?").unwrap().is_nan());
        assert!(attr.encode("").unwrap().is_nan());
        assert!(attr.encode("NA").unwrap().is_nan());
        assert_eq!(attr.decode(3.14), "3.14");
        assert_eq!(attr.decode(2.0), "2");
    }

    #[test]
    fn test_numerical_encode_bad_value() {
        let attr = Attribute::numerical("x1");
        assert!(attr.encode("not-a-number").is_err());
    }

    #[test]
    fn test_nominal_encode_decode() {
        let attr = Attribute::nominal(
            "color",
            vec!["red".to_string(), "green".to_string(), "blue".to_string()],
        );
        assert_eq!(attr.encode("green").unwrap(), 1.0);
        assert_eq!(attr.decode(1.0), "green");
        assert!(attr.encode("?").unwrap().is_nan());
    }

    #[test]
    fn test_nominal_unknown_value_errors() {
        let attr = Attribute::nominal("color", vec!["red".to_string()]);
        let err = attr.encode("purple").unwrap_err();
        assert!(matches!(err, RuleInductionError::SchemaMismatch(_)));
    }

    #[test]
    fn test_intern_level_reuses_existing() {
        let mut attr = Attribute::nominal("color", vec!["red".to_string()]);
        assert_eq!(attr.intern_level("red"), 0);
        assert_eq!(attr.intern_level("blue"), 1);
        assert_eq!(attr.levels(), &["red".to_string(), "blue".to_string()]);
    }
}
