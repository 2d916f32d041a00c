//! Dataset: columnar storage of attribute values, labels, and weights.
//!
//! A [`Dataset`] owns every [`Example`] for its lifetime. Conditional
//! attribute indices (used everywhere else in the crate) refer to the
//! *i*-th non-decision attribute; the decision attribute itself is stored
//! separately and is always [`AttributeType::Nominal`](crate::attribute::AttributeType::Nominal).

use crate::attribute::{Attribute, AttributeType};
use crate::error::{RuleInductionError, RuleInductionResult};
use serde::{Deserialize, Serialize};

/// One row: conditional attribute values, decision class, and weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    attributes: Vec<f64>,
    decision: f64,
    weight: f64,
}

impl Example {
    pub fn new(attributes: Vec<f64>, decision: f64, weight: f64) -> Self {
        Example {
            attributes,
            decision,
            weight,
        }
    }

    pub fn attribute(&self, conditional_index: usize) -> f64 {
        self.attributes[conditional_index]
    }

    pub fn attributes(&self) -> &[f64] {
        &self.attributes
    }

    pub fn decision(&self) -> f64 {
        self.decision
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }
}

/// Owns all examples plus the attribute schema.
///
/// Conditional attributes are stored in `attributes` (schema) and in each
/// `Example::attributes` in the same order; the decision attribute is kept
/// separately in `decision_attribute`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    name: String,
    /// Schema for the conditional (non-decision) attributes, in order.
    attributes: Vec<Attribute>,
    decision_attribute: Attribute,
    examples: Vec<Example>,
}

impl Dataset {
    /// Creates an empty dataset. Conditional columns and the decision
    /// column are added afterward via [`Dataset::add_attribute`] /
    /// [`Dataset::add_decision`].
    pub fn new(name: impl Into<String>, decision_attribute: Attribute) -> Self {
        Dataset {
            name: name.into(),
            attributes: Vec::new(),
            decision_attribute,
            examples: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_examples(&self) -> usize {
        self.examples.len()
    }

    pub fn num_conditional_attributes(&self) -> usize {
        self.attributes.len()
    }

    pub fn conditional_attribute(&self, index: usize) -> &Attribute {
        &self.attributes[index]
    }

    pub fn conditional_attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn decision_attribute(&self) -> &Attribute {
        &self.decision_attribute
    }

    pub fn decision_attribute_mut(&mut self) -> &mut Attribute {
        &mut self.decision_attribute
    }

    pub fn example(&self, index: usize) -> &Example {
        &self.examples[index]
    }

    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    pub fn conditional_attribute_index_by_name(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name() == name)
    }

    /// Appends a new conditional attribute column.
    ///
    /// If this is the first column added, it establishes the dataset's row
    /// count by allocating one [`Example`] per value with a default
    /// decision of `NaN` and weight `1.0`. Otherwise the column's length
    /// must match the established row count.
    pub fn add_attribute(
        &mut self,
        values: Vec<f64>,
        attribute: Attribute,
    ) -> RuleInductionResult<()> {
        if self.examples.is_empty() && self.attributes.is_empty() {
            self.examples = values
                .iter()
                .map(|&v| Example::new(vec![v], f64::NAN, 1.0))
                .collect();
        } else {
            if values.len() != self.examples.len() {
                return Err(RuleInductionError::ShapeMismatch {
                    expected: self.examples.len(),
                    actual: values.len(),
                });
            }
            for (example, value) in self.examples.iter_mut().zip(values.iter()) {
                example.attributes.push(*value);
            }
        }
        self.attributes.push(attribute);
        Ok(())
    }

    /// Sets the decision column. Row count must already be established
    /// (via a prior `add_attribute` call) or this call establishes it
    /// itself.
    pub fn add_decision(&mut self, values: Vec<f64>) -> RuleInductionResult<()> {
        if self.examples.is_empty() && self.attributes.is_empty() {
            self.examples = values
                .iter()
                .map(|&v| Example::new(Vec::new(), v, 1.0))
                .collect();
        } else {
            if values.len() != self.examples.len() {
                return Err(RuleInductionError::ShapeMismatch {
                    expected: self.examples.len(),
                    actual: values.len(),
                });
            }
            for (example, value) in self.examples.iter_mut().zip(values.iter()) {
                example.decision = *value;
            }
        }
        Ok(())
    }

    /// Sets per-example weights; defaults to `1.0` when never called.
    pub fn add_weights(&mut self, weights: Vec<f64>) -> RuleInductionResult<()> {
        if weights.len() != self.examples.len() {
            return Err(RuleInductionError::ShapeMismatch {
                expected: self.examples.len(),
                actual: weights.len(),
            });
        }
        for (example, weight) in self.examples.iter_mut().zip(weights.iter()) {
            example.weight = *weight;
        }
        Ok(())
    }

    /// Confirms that `decision_attribute` is nominal, per the invariant
    /// that the decision column is always a finite-domain class label.
    pub fn validate_decision_is_nominal(&self) -> RuleInductionResult<()> {
        if self.decision_attribute.attribute_type() != AttributeType::Nominal {
            return Err(RuleInductionError::SchemaMismatch(
                "decision attribute must be nominal".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_dataset() -> Dataset {
        let mut ds = Dataset::new(
            "t",
            Attribute::nominal("class", vec!["A".to_string(), "B".to_string()]),
        );
        ds.add_attribute(vec![1.0, 2.0, 3.0], Attribute::numerical("x1"))
            .unwrap();
        ds.add_decision(vec![0.0, 1.0, 0.0]).unwrap();
        ds
    }

    #[test]
    fn test_build_dataset() {
        let ds = sample_dataset();
        assert_eq!(ds.num_examples(), 3);
        assert_eq!(ds.num_conditional_attributes(), 1);
        assert_eq!(ds.example(1).decision(), 1.0);
        assert_eq!(ds.example(1).attribute(0), 2.0);
        assert_eq!(ds.example(0).weight(), 1.0);
    }

    #[test]
    fn test_shape_mismatch_on_second_column() {
        let mut ds = Dataset::new(
            "t",
            Attribute::nominal("class", vec!["A".to_string()]),
        );
        ds.add_attribute(vec![1.0, 2.0], Attribute::numerical("x1"))
            .unwrap();
        let err = ds
            .add_attribute(vec![1.0], Attribute::numerical("x2"))
            .unwrap_err();
        assert!(matches!(err, RuleInductionError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_weights_default_to_one() {
        let ds = sample_dataset();
        assert!(ds.examples().iter().all(|e| e.weight() == 1.0));
    }

    #[test]
    fn test_weights_shape_mismatch() {
        let mut ds = sample_dataset();
        let err = ds.add_weights(vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, RuleInductionError::ShapeMismatch { .. }));
    }
}
