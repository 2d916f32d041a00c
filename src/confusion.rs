//! Confusion matrix: a weighted `actual × predicted` matrix plus an
//! `unclassified[actual]` vector for examples no rule covered.
//!
//! Grounded on `ConfusionMatrix.h/cpp`, with two intentional departures
//! from the reference engine: every accumulator here is `f64` (the
//! reference truncates `getSumOfCorrectlyClassifiedExamples` through an
//! `int`), and `unclassified` is never folded into `FalseNegatives` (the
//! reference's `getSumOfFalseNegatives` adds `unclassified[classNumber]`
//! into the false-negative count, conflating "predicted the other class"
//! with "predicted nothing").

use serde::{Deserialize, Serialize};

/// A weighted confusion matrix over `num_classes` classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    num_classes: usize,
    matrix: Vec<Vec<f64>>,
    unclassified: Vec<f64>,
}

impl ConfusionMatrix {
    pub fn new(num_classes: usize) -> Self {
        ConfusionMatrix {
            num_classes,
            matrix: vec![vec![0.0; num_classes]; num_classes],
            unclassified: vec![0.0; num_classes],
        }
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Records one example of class `actual` weighted `weight`, predicted
    /// as `predicted` (`None` meaning no rule covered it).
    pub fn record(&mut self, actual: usize, predicted: Option<usize>, weight: f64) {
        match predicted {
            Some(predicted) => self.matrix[actual][predicted] += weight,
            None => self.unclassified[actual] += weight,
        }
    }

    pub fn cell(&self, actual: usize, predicted: usize) -> f64 {
        self.matrix[actual][predicted]
    }

    pub fn unclassified(&self, actual: usize) -> f64 {
        self.unclassified[actual]
    }

    /// Total weighted examples, across every cell and the unclassified
    /// vector.
    pub fn sum_of_examples(&self) -> f64 {
        self.matrix.iter().flatten().sum::<f64>() + self.unclassified.iter().sum::<f64>()
    }

    /// Total weighted examples of a single actual class (its matrix row
    /// plus its unclassified entry).
    pub fn sum_of_examples_for_class(&self, class: usize) -> f64 {
        self.matrix[class].iter().sum::<f64>() + self.unclassified[class]
    }

    pub fn sum_of_correctly_classified(&self) -> f64 {
        (0..self.num_classes).map(|c| self.matrix[c][c]).sum()
    }

    pub fn sum_of_true_positives(&self, class: usize) -> f64 {
        self.matrix[class][class]
    }

    pub fn sum_of_false_positives(&self, class: usize) -> f64 {
        (0..self.num_classes)
            .filter(|&actual| actual != class)
            .map(|actual| self.matrix[actual][class])
            .sum()
    }

    /// Weighted examples of `class` predicted as something else.
    /// Deliberately excludes `unclassified[class]` — see the module note.
    pub fn sum_of_false_negatives(&self, class: usize) -> f64 {
        (0..self.num_classes)
            .filter(|&predicted| predicted != class)
            .map(|predicted| self.matrix[class][predicted])
            .sum()
    }

    pub fn sum_of_true_negatives(&self, class: usize) -> f64 {
        self.sum_of_examples()
            - self.sum_of_true_positives(class)
            - self.sum_of_false_positives(class)
            - self.sum_of_false_negatives(class)
            - self.unclassified.iter().sum::<f64>()
            + self.unclassified[class]
    }

    pub fn sum_of_unclassified(&self) -> f64 {
        self.unclassified.iter().sum()
    }

    /// Overall accuracy: correctly classified over every example,
    /// including those no rule covered.
    pub fn accuracy(&self) -> f64 {
        let total = self.sum_of_examples();
        if total == 0.0 {
            f64::NAN
        } else {
            self.sum_of_correctly_classified() / total
        }
    }

    /// Per-class accuracy; `NaN` for a class with zero weight (per the
    /// reference engine's convention — a class that contributes no
    /// examples has no accuracy to report).
    pub fn class_accuracy(&self, class: usize) -> f64 {
        let total = self.sum_of_examples_for_class(class);
        if total == 0.0 {
            f64::NAN
        } else {
            self.matrix[class][class] / total
        }
    }

    /// Mean of the non-`NaN` per-class accuracies (balanced accuracy).
    pub fn average_accuracy(&self) -> f64 {
        let values: Vec<f64> = (0..self.num_classes)
            .map(|c| self.class_accuracy(c))
            .filter(|v| !v.is_nan())
            .collect();
        if values.is_empty() {
            f64::NAN
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        }
    }
}
