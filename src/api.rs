//! External call surface: the three entry points a caller drives the
//! engine through — [`generate_rules`], [`predict`], and
//! [`cross_validation`] — plus the RNG-seeding convention shared by all
//! three.
//!
//! Grounded on `RInterface.cpp`'s dispatch (construct dataset, construct
//! an optional knowledge object, pick the unrestricted or
//! preference-guided engine based on whether knowledge was supplied,
//! wrap the result in a [`RuleClassifier`]), reworked from an `Rcpp::List`
//! marshaling layer into plain typed parameter structs.

use crate::classifier::{RuleClassifier, RuleSetStats};
use crate::confusion::ConfusionMatrix;
use crate::cross_validation::{self, CrossValidationResult, CrossValidationSettings};
use crate::dataset::Dataset;
use crate::engine;
use crate::error::RuleInductionResult;
use crate::knowledge::Knowledge;
use crate::measures::QualityMeasure;
use crate::preference;
use crate::rule::Rule;
use crate::view::SetOfExamples;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Seeds a deterministic RNG from an external `seed in [0, 1]` — the
/// convention the rest of the external call surface uses, mirroring the
/// reference engine's `srand(seed * UINT32_MAX)` (§6).
pub fn rng_from_seed(seed: f64) -> StdRng {
    let scaled = (seed.clamp(0.0, 1.0) * u32::MAX as f64) as u64;
    StdRng::seed_from_u64(scaled)
}

#[derive(Debug, Clone, Copy)]
pub struct GenerateRulesParams {
    pub grow_measure: QualityMeasure,
    pub prune_measure: QualityMeasure,
    pub seed: f64,
}

/// Result of [`generate_rules`]: the induced classifier plus the fixed
/// Precision/Coverage/Pvalue statistics §6 bundles alongside the rule
/// strings and confidence degrees (`Rules`, `ConfidenceDegrees`,
/// `NumbersOfConditions`, `RulesPrecisions`, `RulesCoverages`, `Pvalues`).
#[derive(Debug, Clone)]
pub struct GenerateRulesResult {
    pub classifier: RuleClassifier,
    pub stats: RuleSetStats,
}

/// Induces a rule set from `dataset`, optionally constrained by
/// `knowledge`.
pub fn generate_rules(
    dataset: &Dataset,
    knowledge: Option<&Knowledge>,
    params: GenerateRulesParams,
) -> RuleInductionResult<GenerateRulesResult> {
    dataset.validate_decision_is_nominal()?;
    let whole = SetOfExamples::whole(dataset);
    let mut rng = rng_from_seed(params.seed);

    let rules: Vec<Rule> = match knowledge {
        Some(knowledge) => preference::generate_rules(
            &whole,
            knowledge,
            params.grow_measure,
            params.prune_measure,
            &mut rng,
        ),
        None => engine::generate_rules(&whole, params.grow_measure, params.prune_measure, &mut rng),
    };

    let classifier = RuleClassifier::from_rules(rules);
    let stats = classifier.rule_set_stats(&whole);
    Ok(GenerateRulesResult { classifier, stats })
}

#[derive(Debug, Clone)]
pub struct PredictParams {
    /// Ground-truth decisions to compare against, if available. When
    /// present (and matching `dataset`'s row count) a confusion matrix
    /// and accuracy metrics are computed; otherwise only predictions are
    /// returned.
    pub ground_truth: Option<Vec<f64>>,
    pub num_classes: usize,
}

#[derive(Debug, Clone)]
pub struct PredictResult {
    pub predictions: Vec<f64>,
    /// `NaN` when no ground truth was supplied (`acc` in §6).
    pub accuracy: f64,
    /// Balanced accuracy, `NaN` when no ground truth was supplied (`bac`).
    pub average_accuracy: f64,
    /// Fraction of examples at least one rule covered (`cov`); computed
    /// regardless of whether ground truth was supplied.
    pub coverage: f64,
    /// Present only when ground truth was supplied.
    pub confusion_matrix: Option<ConfusionMatrix>,
    /// Per-class accuracy, `NaN` for a class with no examples; empty
    /// when no ground truth was supplied.
    pub classes_accuracies: Vec<f64>,
    /// Weighted unclassified count per actual class; empty when no
    /// ground truth was supplied.
    pub unclassified: Vec<f64>,
}

/// Classifies every example in `dataset` with `classifier`. When
/// `params.ground_truth` is supplied and its length matches the dataset's
/// row count, also reports a confusion matrix, accuracy, balanced
/// accuracy, and per-class accuracies/unclassified counts.
pub fn predict(
    classifier: &RuleClassifier,
    dataset: &Dataset,
    params: &PredictParams,
) -> PredictResult {
    let predictions = classifier.classify_examples(dataset.examples());
    let coverage = classifier.coverage_weighted(dataset.examples());

    let has_ground_truth = params
        .ground_truth
        .as_ref()
        .is_some_and(|gt| gt.len() == dataset.num_examples());

    if !has_ground_truth {
        return PredictResult {
            predictions,
            accuracy: f64::NAN,
            average_accuracy: f64::NAN,
            coverage,
            confusion_matrix: None,
            classes_accuracies: Vec::new(),
            unclassified: Vec::new(),
        };
    }

    let ground_truth = params.ground_truth.as_ref().unwrap();
    let examples_with_truth: Vec<_> = dataset
        .examples()
        .iter()
        .zip(ground_truth)
        .map(|(example, &truth)| {
            crate::dataset::Example::new(example.attributes().to_vec(), truth, example.weight())
        })
        .collect();
    let matrix =
        classifier.confusion_matrix_with_predictions(&examples_with_truth, &predictions, params.num_classes);

    let classes_accuracies: Vec<f64> = (0..params.num_classes).map(|c| matrix.class_accuracy(c)).collect();
    let unclassified: Vec<f64> = (0..params.num_classes).map(|c| matrix.unclassified(c)).collect();

    PredictResult {
        predictions,
        accuracy: matrix.accuracy(),
        average_accuracy: matrix.average_accuracy(),
        coverage,
        classes_accuracies,
        unclassified,
        confusion_matrix: Some(matrix),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CrossValidationParams {
    pub grow_measure: QualityMeasure,
    pub prune_measure: QualityMeasure,
    pub settings: CrossValidationSettings,
    pub seed: f64,
}

/// Runs cross-validation on `dataset`, optionally constrained by
/// `knowledge`.
pub fn cross_validation(
    dataset: &Dataset,
    knowledge: Option<&Knowledge>,
    num_classes: usize,
    params: CrossValidationParams,
) -> RuleInductionResult<CrossValidationResult> {
    dataset.validate_decision_is_nominal()?;
    let whole = SetOfExamples::whole(dataset);
    let mut rng = rng_from_seed(params.seed);

    match knowledge {
        Some(knowledge) => cross_validation::cross_validate_with_knowledge(
            &whole,
            num_classes,
            params.settings,
            knowledge,
            params.grow_measure,
            params.prune_measure,
            &mut rng,
        ),
        None => cross_validation::cross_validate(
            &whole,
            num_classes,
            params.settings,
            params.grow_measure,
            params.prune_measure,
            &mut rng,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::Attribute;

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
    fn test_seed_is_deterministic() {
        let ds = dataset();
        let params = GenerateRulesParams {
            grow_measure: QualityMeasure::TwoMeasure,
            prune_measure: QualityMeasure::Precision,
            seed: 0.5,
        };
        let a = generate_rules(&ds, None, params).unwrap();
        let b = generate_rules(&ds, None, params).unwrap();
        assert_eq!(a.classifier.rules().len(), b.classifier.rules().len());
    }

    #[test]
    fn test_generate_and_predict_round_trip() {
        let ds = dataset();
        let params = GenerateRulesParams {
            grow_measure: QualityMeasure::TwoMeasure,
            prune_measure: QualityMeasure::Precision,
            seed: 0.1,
        };
        let generated = generate_rules(&ds, None, params).unwrap();
        assert_eq!(generated.stats.precisions.len(), generated.classifier.rules().len());
        let predict_params = PredictParams {
            ground_truth: Some(ds.examples().iter().map(|e| e.decision()).collect()),
            num_classes: 2,
        };
        let result = predict(&generated.classifier, &ds, &predict_params);
        assert_eq!(result.predictions.len(), 8);
        assert!(result.accuracy >= 0.0);
    }

    #[test]
    fn test_predict_without_ground_truth_leaves_accuracy_nan() {
        let ds = dataset();
        let params = GenerateRulesParams {
            grow_measure: QualityMeasure::TwoMeasure,
            prune_measure: QualityMeasure::Precision,
            seed: 0.1,
        };
        let generated = generate_rules(&ds, None, params).unwrap();
        let predict_params = PredictParams {
            ground_truth: None,
            num_classes: 2,
        };
        let result = predict(&generated.classifier, &ds, &predict_params);
        assert!(result.accuracy.is_nan());
    }

    #[test]
    fn test_cross_validation_entry_point() {
        let ds = dataset();
        let params = CrossValidationParams {
            grow_measure: QualityMeasure::TwoMeasure,
            prune_measure: QualityMeasure::Precision,
            settings: CrossValidationSettings {
                folds: 4,
                runs: 1,
                every_class_in_fold: false,
            },
            seed: 0.2,
        };
        let result = cross_validation(&ds, None, 2, params).unwrap();
        assert_eq!(result.confusion_matrix.sum_of_examples(), 8.0);
    }
}
