//! Stratified k-fold cross-validation, repeated over `runs` independent
//! fold partitions.
//!
//! Each run builds fresh stratified folds (see
//! [`crate::view::SetOfExamples::stratified_folds`]), holds out one fold
//! at a time, induces rules on the remaining folds, and accumulates a
//! confusion matrix over the held-out predictions.

use crate::classifier::RuleClassifier;
use crate::confusion::ConfusionMatrix;
use crate::engine;
use crate::error::RuleInductionResult;
use crate::knowledge::Knowledge;
use crate::measures::QualityMeasure;
use crate::preference;
use crate::rule::Rule;
use crate::view::SetOfExamples;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossValidationSettings {
    pub folds: usize,
    pub runs: usize,
    pub every_class_in_fold: bool,
}

/// One held-out fold's induced rules and the metrics computed from
/// classifying that fold with them — the `(Rules, metrics)` pair §6's
/// `crossValidation` nests as `runs[r].folds[j]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldResult {
    pub rules: Vec<Rule>,
    pub confusion_matrix: ConfusionMatrix,
    pub accuracy: f64,
    pub average_accuracy: f64,
}

/// One independent stratified-fold partition's `k` fold results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub folds: Vec<FoldResult>,
}

/// Outcome of `runs` independent stratified `k`-fold rounds: the nested
/// per-run, per-fold rule sets and metrics, plus a confusion matrix and
/// accuracy/balanced-accuracy aggregated over every fold of every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidationResult {
    pub runs: Vec<RunResult>,
    pub confusion_matrix: ConfusionMatrix,
    pub accuracy: f64,
    pub average_accuracy: f64,
}

/// Runs unrestricted cross-validation (no [`Knowledge`]).
pub fn cross_validate(
    whole: &SetOfExamples<'_>,
    num_classes: usize,
    settings: CrossValidationSettings,
    grow_measure: QualityMeasure,
    prune_measure: QualityMeasure,
    rng: &mut impl Rng,
) -> RuleInductionResult<CrossValidationResult> {
    run(whole, num_classes, settings, rng, |fold_train, rng| {
        let rules = engine::generate_rules(fold_train, grow_measure, prune_measure, rng);
        RuleClassifier::from_rules(rules)
    })
}

/// Runs preference-guided cross-validation.
pub fn cross_validate_with_knowledge(
    whole: &SetOfExamples<'_>,
    num_classes: usize,
    settings: CrossValidationSettings,
    knowledge: &Knowledge,
    grow_measure: QualityMeasure,
    prune_measure: QualityMeasure,
    rng: &mut impl Rng,
) -> RuleInductionResult<CrossValidationResult> {
    run(whole, num_classes, settings, rng, |fold_train, rng| {
        let rules = preference::generate_rules(fold_train, knowledge, grow_measure, prune_measure, rng);
        RuleClassifier::from_rules(rules)
    })
}

fn run<R: Rng>(
    whole: &SetOfExamples<'_>,
    num_classes: usize,
    settings: CrossValidationSettings,
    rng: &mut R,
    induce: impl Fn(&SetOfExamples<'_>, &mut R) -> RuleClassifier,
) -> RuleInductionResult<CrossValidationResult> {
    let dataset = whole.dataset();
    let mut aggregate = ConfusionMatrix::new(num_classes);
    let mut runs = Vec::with_capacity(settings.runs);

    for _ in 0..settings.runs {
        let folds = whole.stratified_folds(settings.folds, settings.every_class_in_fold, rng)?;
        let mut fold_results = Vec::with_capacity(folds.len());

        for (held_out_index, held_out) in folds.iter().enumerate() {
            let mut train_indices: Vec<usize> = Vec::new();
            for (other_index, fold) in folds.iter().enumerate() {
                if other_index != held_out_index {
                    train_indices.extend_from_slice(fold.indices());
                }
            }
            let train_view = SetOfExamples::from_indices(dataset, train_indices);
            let classifier = induce(&train_view, rng);

            let mut fold_matrix = ConfusionMatrix::new(num_classes);
            for &idx in held_out.indices() {
                let example = dataset.example(idx);
                let prediction = classifier.classify(example);
                let actual = example.decision().round() as usize;
                let predicted = if prediction.is_nan() {
                    None
                } else {
                    Some(prediction.round() as usize)
                };
                fold_matrix.record(actual, predicted, example.weight());
                aggregate.record(actual, predicted, example.weight());
            }

            fold_results.push(FoldResult {
                rules: classifier.rules().to_vec(),
                accuracy: fold_matrix.accuracy(),
                average_accuracy: fold_matrix.average_accuracy(),
                confusion_matrix: fold_matrix,
            });
        }

        runs.push(RunResult { folds: fold_results });
    }

    Ok(CrossValidationResult {
        accuracy: aggregate.accuracy(),
        average_accuracy: aggregate.average_accuracy(),
        confusion_matrix: aggregate,
        runs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::Attribute;
    use crate::dataset::Dataset;
    use rand::SeedableRng;

    fn dataset() -> Dataset {
        let mut ds = Dataset::new(
            "t",
            Attribute::nominal("class", vec!["neg".to_string(), "pos".to_string()]),
        );
        ds.add_attribute(
            vec![0.0, 1.0, 2.0, 3.0, 10.0, 11.0, 12.0, 13.0],
            Attribute::numerical("x1"),
        )
        .unwrap();
        ds.add_decision(vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0])
            .unwrap();
        ds
    }

    #[test]
    fn test_cross_validate_produces_full_confusion_matrix_coverage() {
        let ds = dataset();
        let whole = SetOfExamples::whole(&ds);
        let settings = CrossValidationSettings {
            folds: 4,
            runs: 1,
            every_class_in_fold: false,
        };
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let result = cross_validate(&whole, 2, settings, QualityMeasure::TwoMeasure, QualityMeasure::Precision, &mut rng).unwrap();
        assert_eq!(result.confusion_matrix.sum_of_examples(), 8.0);
    }

    #[test]
    fn test_cross_validate_returns_per_run_per_fold_rules() {
        let ds = dataset();
        let whole = SetOfExamples::whole(&ds);
        let settings = CrossValidationSettings {
            folds: 4,
            runs: 2,
            every_class_in_fold: false,
        };
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let result = cross_validate(&whole, 2, settings, QualityMeasure::TwoMeasure, QualityMeasure::Precision, &mut rng).unwrap();
        assert_eq!(result.runs.len(), 2);
        for run in &result.runs {
            assert_eq!(run.folds.len(), 4);
            for fold in &run.folds {
                assert!(fold.confusion_matrix.sum_of_examples() > 0.0);
            }
        }
        let reconstructed: f64 = result
            .runs
            .iter()
            .flat_map(|r| &r.folds)
            .map(|f| f.confusion_matrix.sum_of_examples())
            .sum();
        assert_eq!(reconstructed, result.confusion_matrix.sum_of_examples());
    }

    #[test]
    fn test_bad_fold_count_propagates_error() {
        let ds = dataset();
        let whole = SetOfExamples::whole(&ds);
        let settings = CrossValidationSettings {
            folds: 100,
            runs: 1,
            every_class_in_fold: false,
        };
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let result = cross_validate(&whole, 2, settings, QualityMeasure::TwoMeasure, QualityMeasure::Precision, &mut rng);
        assert!(result.is_err());
    }
}
