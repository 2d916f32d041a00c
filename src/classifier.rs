//! Voting classifier: a rule set that predicts by summing the confidence
//! of every rule covering an example, grouped by the class each rule
//! predicts.
//!
//! Grounded on `RuleClassifier.h/cpp`. One deliberate correction: the
//! reference engine's `resolveConflict` breaks ties by ascending class
//! number, which silently favors low-numbered classes regardless of rule
//! order. This classifier instead breaks ties by the order classes were
//! first seen among the covering rules — the first rule (in the set's
//! insertion order) whose class attains the maximum vote wins.

use crate::confusion::ConfusionMatrix;
use crate::dataset::{Dataset, Example};
use crate::measures::{evaluate_rule, pvalue_with_warning, QualityMeasure};
use crate::rule::Rule;
use serde::{Deserialize, Serialize};

/// A rule set that classifies by confidence-weighted voting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RuleClassifier {
    rules: Vec<Rule>,
}

/// Summary statistics over a rule set's fixed measures, independent of
/// whichever grow/prune measures induced the rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSetStats {
    /// Distinct attribute count per rule (non-empty buckets, not raw
    /// condition count).
    pub condition_counts: Vec<usize>,
    pub precisions: Vec<f64>,
    pub coverages: Vec<f64>,
    pub pvalues: Vec<f64>,
    /// Set if any rule's `(P,p,N,n)` had non-integral weights, which
    /// makes the hypergeometric p-value only approximate.
    pub warning: bool,
}

impl RuleClassifier {
    pub fn new() -> Self {
        RuleClassifier { rules: Vec::new() }
    }

    pub fn from_rules(rules: Vec<Rule>) -> Self {
        RuleClassifier { rules }
    }

    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn add_rules(&mut self, rules: impl IntoIterator<Item = Rule>) {
        self.rules.extend(rules);
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn get_covering_rules(&self, example: &Example) -> Vec<&Rule> {
        self.rules.iter().filter(|rule| rule.covers(example)).collect()
    }

    /// Classifies one example: `NaN` if no rule covers it, the single
    /// rule's class if exactly one covers it, otherwise the
    /// confidence-weighted vote winner (see [`resolve_conflict`]).
    pub fn classify(&self, example: &Example) -> f64 {
        let covering = self.get_covering_rules(example);
        match covering.len() {
            0 => f64::NAN,
            1 => covering[0].decision_class(),
            _ => resolve_conflict(&covering),
        }
    }

    pub fn classify_examples(&self, examples: &[Example]) -> Vec<f64> {
        examples.iter().map(|example| self.classify(example)).collect()
    }

    /// Weighted accuracy over `examples`, ignoring unclassified ones in
    /// the denominator is *not* done here — unclassified examples count
    /// against accuracy, matching [`ConfusionMatrix::accuracy`].
    pub fn evaluate_accuracy(&self, examples: &[Example]) -> f64 {
        let predictions = self.classify_examples(examples);
        let correct: f64 = examples
            .iter()
            .zip(&predictions)
            .filter(|(e, &p)| p == e.decision())
            .map(|(e, _)| e.weight())
            .sum();
        let total: f64 = examples.iter().map(Example::weight).sum();
        if total == 0.0 {
            f64::NAN
        } else {
            correct / total
        }
    }

    /// Builds a confusion matrix, reclassifying every example with this
    /// rule set. `num_classes` must cover every class index present.
    pub fn confusion_matrix(&self, examples: &[Example], num_classes: usize) -> ConfusionMatrix {
        let predictions = self.classify_examples(examples);
        self.confusion_matrix_with_predictions(examples, &predictions, num_classes)
    }

    /// Builds a confusion matrix from externally supplied predictions
    /// instead of reclassifying — used when `predict` was handed
    /// precomputed predictions alongside ground truth.
    pub fn confusion_matrix_with_predictions(
        &self,
        examples: &[Example],
        predictions: &[f64],
        num_classes: usize,
    ) -> ConfusionMatrix {
        let mut matrix = ConfusionMatrix::new(num_classes);
        for (example, &prediction) in examples.iter().zip(predictions) {
            let actual = example.decision().round() as usize;
            let predicted = if prediction.is_nan() {
                None
            } else {
                Some(prediction.round() as usize)
            };
            matrix.record(actual, predicted, example.weight());
        }
        matrix
    }

    /// Unweighted count of examples covered by at least one rule.
    pub fn coverage_count(&self, examples: &[Example]) -> usize {
        examples
            .iter()
            .filter(|e| !self.get_covering_rules(e).is_empty())
            .count()
    }

    /// Weighted coverage fraction.
    pub fn coverage_weighted(&self, examples: &[Example]) -> f64 {
        let total: f64 = examples.iter().map(Example::weight).sum();
        if total == 0.0 {
            return f64::NAN;
        }
        let covered: f64 = examples
            .iter()
            .filter(|e| !self.get_covering_rules(e).is_empty())
            .map(Example::weight)
            .sum();
        covered / total
    }

    /// Textual form of every rule, one per line, using `dataset` to
    /// decode attribute names and values.
    pub fn to_string(&self, dataset: &Dataset) -> String {
        self.to_vector_of_strings(dataset).join("\n")
    }

    pub fn to_vector_of_strings(&self, dataset: &Dataset) -> Vec<String> {
        self.rules.iter().map(|rule| rule.to_string(dataset)).collect()
    }

    /// Per-rule statistics using the fixed Precision/Coverage/Pvalue
    /// measures, regardless of what measures induced the rules.
    pub fn rule_set_stats(&self, whole: &crate::view::SetOfExamples<'_>) -> RuleSetStats {
        let mut condition_counts = Vec::with_capacity(self.rules.len());
        let mut precisions = Vec::with_capacity(self.rules.len());
        let mut coverages = Vec::with_capacity(self.rules.len());
        let mut pvalues = Vec::with_capacity(self.rules.len());
        let mut warning = false;

        for rule in &self.rules {
            let eval = evaluate_rule(whole, rule);
            condition_counts.push(rule.num_conditions_distinct_attributes());
            precisions.push(QualityMeasure::Precision.evaluate(eval));
            coverages.push(QualityMeasure::Coverage.evaluate(eval));
            let pvalue = pvalue_with_warning(eval);
            pvalues.push(pvalue.value);
            warning |= pvalue.warning;
        }

        RuleSetStats {
            condition_counts,
            precisions,
            coverages,
            pvalues,
            warning,
        }
    }
}

/// Sums each covering rule's confidence degree into a per-class vote
/// total, then returns the first-seen class with the maximum vote.
fn resolve_conflict(covering: &[&Rule]) -> f64 {
    let mut classes: Vec<f64> = Vec::new();
    let mut votes: Vec<f64> = Vec::new();
    for rule in covering {
        let class = rule.decision_class();
        let confidence = if rule.confidence_degree().is_nan() {
            0.0
        } else {
            rule.confidence_degree()
        };
        if let Some(pos) = classes.iter().position(|&c| c == class) {
            votes[pos] += confidence;
        } else {
            classes.push(class);
            votes.push(confidence);
        }
    }
    let mut best_index = 0;
    for i in 1..votes.len() {
        if votes[i] > votes[best_index] {
            best_index = i;
        }
    }
    classes[best_index]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::Attribute;
    use crate::condition::{ElementaryCondition, RelationalOperator};
    use crate::dataset::Dataset;
    use crate::view::SetOfExamples;

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
    fn test_no_covering_rule_yields_nan() {
        let ds = sample_dataset();
        let classifier = RuleClassifier::new();
        assert!(classifier.classify(ds.example(0)).is_nan());
    }

    #[test]
    fn test_single_covering_rule_wins_outright() {
        let ds = sample_dataset();
        let mut rule = Rule::new(0.0);
        rule.add_condition(ElementaryCondition::new(0, RelationalOperator::LessThan, 2.0));
        rule.set_confidence_degree(1.0);
        let classifier = RuleClassifier::from_rules(vec![rule]);
        assert_eq!(classifier.classify(ds.example(0)), 0.0);
        assert!(classifier.classify(ds.example(1)).is_nan());
    }

    #[test]
    fn test_tie_break_uses_first_occurrence_not_class_order() {
        let mut rule_b = Rule::new(1.0);
        rule_b.set_confidence_degree(0.5);
        let mut rule_a = Rule::new(0.0);
        rule_a.set_confidence_degree(0.5);
        // rule_b (class 1.0) appears first in the set; with an equal vote
        // it must win over rule_a (class 0.0), contradicting ascending
        // class-number tie-breaking.
        let classifier = RuleClassifier::from_rules(vec![rule_b, rule_a]);
        let example = Example::new(vec![1.0], 0.0, 1.0);
        assert_eq!(classifier.classify(&example), 1.0);
    }

    #[test]
    fn test_higher_confidence_wins_vote() {
        let mut rule_a = Rule::new(0.0);
        rule_a.set_confidence_degree(0.9);
        let mut rule_b = Rule::new(1.0);
        rule_b.set_confidence_degree(0.1);
        let classifier = RuleClassifier::from_rules(vec![rule_a, rule_b]);
        let example = Example::new(vec![1.0], 0.0, 1.0);
        assert_eq!(classifier.classify(&example), 0.0);
    }

    #[test]
    fn test_confusion_matrix_and_accuracy() {
        let ds = sample_dataset();
        let mut rule0 = Rule::new(0.0);
        rule0.add_condition(ElementaryCondition::new(0, RelationalOperator::LessThan, 1.5));
        rule0.set_confidence_degree(1.0);
        let mut rule1 = Rule::new(1.0);
        rule1.add_condition(ElementaryCondition::new(0, RelationalOperator::GreaterEqual, 1.5));
        rule1.set_confidence_degree(1.0);
        let classifier = RuleClassifier::from_rules(vec![rule0, rule1]);
        let matrix = classifier.confusion_matrix(ds.examples(), 2);
        assert_eq!(matrix.sum_of_correctly_classified(), 2.0);
        assert_eq!(matrix.cell(0, 1), 1.0);
    }

    #[test]
    fn test_rule_set_stats_uses_fixed_measures() {
        let ds = sample_dataset();
        let whole = SetOfExamples::whole(&ds);
        let mut rule = Rule::new(0.0);
        rule.add_condition(ElementaryCondition::new(0, RelationalOperator::LessThan, 1.5));
        let classifier = RuleClassifier::from_rules(vec![rule]);
        let stats = classifier.rule_set_stats(&whole);
        assert_eq!(stats.condition_counts, vec![1]);
        assert_eq!(stats.precisions.len(), 1);
    }
}
