//! Unrestricted sequential covering: grow a maximally specific rule,
//! prune it back while quality holds above the ungrown rule's quality,
//! repeat until every positive example of a class is covered.
//!
//! Grounded on `SequentialCovering.cpp`'s `generateRules`/`growRule`/
//! `findBestCondition`/`pruneRule`. The preference-guided variant lives in
//! [`crate::preference`].

use crate::condition::{ElementaryCondition, RelationalOperator};
use crate::measures::{evaluate_counts, evaluate_rule, QualityMeasure};
use crate::rule::Rule;
use crate::view::SetOfExamples;
use rand::Rng;

/// Induces a rule set from every distinct class present in `whole`,
/// growing with `grow_measure` and pruning with `prune_measure`.
pub fn generate_rules(
    whole: &SetOfExamples<'_>,
    grow_measure: QualityMeasure,
    prune_measure: QualityMeasure,
    rng: &mut impl Rng,
) -> Vec<Rule> {
    let mut rules = Vec::new();
    for class in whole.distinct_classes() {
        rules.extend(generate_rules_for_class(
            whole,
            class,
            grow_measure,
            prune_measure,
            rng,
        ));
    }
    rules
}

/// Induces rules for a single `decision_class` until every positive
/// example is covered by at least one produced rule.
pub fn generate_rules_for_class(
    whole: &SetOfExamples<'_>,
    decision_class: f64,
    grow_measure: QualityMeasure,
    prune_measure: QualityMeasure,
    rng: &mut impl Rng,
) -> Vec<Rule> {
    let dataset = whole.dataset();
    let mut uncovered_positives = whole.filter_by_class(decision_class);
    let mut rules = Vec::new();

    let apriori_eval = evaluate_rule(whole, &Rule::new(decision_class));
    let apriori = if apriori_eval.p_total + apriori_eval.n_total == 0.0 {
        0.0
    } else {
        apriori_eval.p_total / (apriori_eval.p_total + apriori_eval.n_total)
    };

    while !uncovered_positives.is_empty() {
        let mut rule = Rule::new(decision_class);
        grow_rule(&mut rule, whole, &uncovered_positives, grow_measure, rng);

        let grown_eval = evaluate_rule(whole, &rule);
        if QualityMeasure::Precision.evaluate(grown_eval) <= apriori {
            break;
        }

        prune_rule(&mut rule, whole, prune_measure, apriori, rng);

        let eval = evaluate_rule(whole, &rule);
        rule.set_confidence_degree(prune_measure.evaluate(eval));

        let newly_covered: Vec<usize> = uncovered_positives
            .indices()
            .iter()
            .copied()
            .filter(|&idx| rule.covers(dataset.example(idx)))
            .collect();
        if newly_covered.is_empty() {
            // A degenerate rule (e.g. no conditions available to separate
            // the remaining positives) would loop forever; stop instead.
            rules.push(rule);
            break;
        }
        let newly_covered_view = SetOfExamples::from_indices(dataset, newly_covered);
        uncovered_positives = uncovered_positives.difference(&newly_covered_view);
        rules.push(rule);
    }

    rules
}

/// Greedily specializes `rule` by repeatedly appending the single
/// best-quality condition (per `measure`, evaluated over the examples the
/// rule currently covers within `whole`) until no condition improves on
/// an empty rule or the rule covers only `decision_class` examples.
pub fn grow_rule(
    rule: &mut Rule,
    whole: &SetOfExamples<'_>,
    uncovered_positives: &SetOfExamples<'_>,
    measure: QualityMeasure,
    rng: &mut impl Rng,
) {
    let dataset = whole.dataset();
    let mut covered = whole.clone();
    let mut uncovered_positives = uncovered_positives.clone();
    let mut prev_covered_count = covered.indices().len();

    loop {
        let eval = evaluate_rule(whole, rule);
        if eval.n == 0.0 && eval.p > 0.0 {
            break;
        }
        match find_best_condition(dataset, &covered, &uncovered_positives, rule, measure, rng) {
            Some(condition) => {
                let narrowed: Vec<usize> = covered
                    .indices()
                    .iter()
                    .copied()
                    .filter(|&idx| condition.is_satisfied(dataset.example(idx).attribute(condition.attribute_index())))
                    .collect();
                let covers_no_negatives = narrowed.iter().all(|&idx| dataset.example(idx).decision() == rule.decision_class());
                if covers_no_negatives {
                    rule.add_condition_and_optimize(condition);
                    break;
                }
                if narrowed.len() == prev_covered_count {
                    break;
                }
                rule.add_condition_and_optimize(condition);
                prev_covered_count = narrowed.len();
                covered = SetOfExamples::from_indices(dataset, narrowed);
                let narrowed_uncovered: Vec<usize> = uncovered_positives
                    .indices()
                    .iter()
                    .copied()
                    .filter(|&idx| condition.is_satisfied(dataset.example(idx).attribute(condition.attribute_index())))
                    .collect();
                uncovered_positives = SetOfExamples::from_indices(dataset, narrowed_uncovered);
            }
            None => break,
        }
    }
}

/// Searches every conditional attribute for the single condition that
/// maximizes `measure` when appended to the rule-so-far, restricted to
/// candidates that actually cover at least one example in
/// `uncovered_positives` (otherwise growth would add conditions that
/// never help cover a still-uncovered positive).
fn find_best_condition(
    dataset: &crate::dataset::Dataset,
    covered: &SetOfExamples<'_>,
    uncovered_positives: &SetOfExamples<'_>,
    rule: &Rule,
    measure: QualityMeasure,
    rng: &mut impl Rng,
) -> Option<ElementaryCondition> {
    let decision_class = rule.decision_class();
    let mut best_quality = f64::NEG_INFINITY;
    let mut candidates: Vec<ElementaryCondition> = Vec::new();

    for attribute_index in 0..dataset.num_conditional_attributes() {
        let attribute = dataset.conditional_attribute(attribute_index);
        let proposals: Vec<ElementaryCondition> = if attribute.is_numerical() {
            numerical_candidates(covered, uncovered_positives, attribute_index)
        } else {
            nominal_candidates(covered, attribute_index)
        };

        for candidate in proposals {
            if rule.contains_condition(&candidate) {
                continue;
            }
            if !uncovered_positives_contains_candidate(uncovered_positives, &candidate) {
                continue;
            }
            let candidate_view = restrict(dataset, covered, &candidate);
            let counts = evaluate_counts(covered, &candidate_view, decision_class);
            let quality = measure.evaluate(counts);
            if quality > best_quality {
                best_quality = quality;
                candidates.clear();
                candidates.push(candidate);
            } else if quality == best_quality {
                candidates.push(candidate);
            }
        }
    }

    if candidates.is_empty() {
        None
    } else if candidates.len() == 1 {
        Some(candidates[0])
    } else {
        Some(choose_condition_from_equal(&candidates, uncovered_positives, rng))
    }
}

fn uncovered_positives_contains_candidate(
    uncovered_positives: &SetOfExamples<'_>,
    candidate: &ElementaryCondition,
) -> bool {
    uncovered_positives
        .iter()
        .any(|example| candidate.is_satisfied(example.attribute(candidate.attribute_index())))
}

fn restrict<'a>(
    dataset: &'a crate::dataset::Dataset,
    view: &SetOfExamples<'a>,
    candidate: &ElementaryCondition,
) -> SetOfExamples<'a> {
    let indices: Vec<usize> = view
        .indices()
        .iter()
        .copied()
        .filter(|&idx| candidate.is_satisfied(dataset.example(idx).attribute(candidate.attribute_index())))
        .collect();
    SetOfExamples::from_indices(dataset, indices)
}

/// Midpoint thresholds between every pair of distinct adjacent values of a
/// numerical attribute within `covered` **where the decision class changes**
/// across that boundary (§4.F), generating both a `>=` and a `<` candidate
/// per threshold. A boundary between same-value examples is never a valid
/// threshold; a boundary between distinct values whose classes agree on
/// both sides cannot produce a purer split than its neighbors and is
/// skipped.
///
/// Each direction is further pruned against `uncovered_positives`'
/// extrema for this attribute (`min_unc`/`max_unc`): a `>=` threshold is
/// only proposed when it could still select some uncovered positive
/// (`threshold <= max_unc`), and a `<` threshold only when
/// `threshold > min_unc`. A threshold on the wrong side of both bounds
/// would never cover a still-uncovered positive and is filtered out by
/// `uncovered_positives_contains_candidate` anyway, but computing it here
/// skips the scan entirely when the attribute has no uncovered positives.
fn numerical_candidates(
    covered: &SetOfExamples<'_>,
    uncovered_positives: &SetOfExamples<'_>,
    attribute_index: usize,
) -> Vec<ElementaryCondition> {
    let Some((min_unc, max_unc)) = uncovered_positives.attribute_extrema(attribute_index) else {
        return Vec::new();
    };

    let mut pairs: Vec<(f64, f64)> = covered
        .iter()
        .map(|example| (example.attribute(attribute_index), example.decision()))
        .filter(|(v, _)| !v.is_nan())
        .collect();
    pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

    let mut thresholds = Vec::new();
    for pair in pairs.windows(2) {
        let ((prev_value, prev_class), (curr_value, curr_class)) = (pair[0], pair[1]);
        if prev_value != curr_value && prev_class != curr_class {
            let midpoint = (prev_value + curr_value) / 2.0;
            thresholds.push(midpoint);
        }
    }
    thresholds.dedup();

    let mut candidates = Vec::new();
    for midpoint in thresholds {
        if midpoint <= max_unc {
            candidates.push(ElementaryCondition::new(attribute_index, RelationalOperator::GreaterEqual, midpoint));
        }
        if midpoint > min_unc {
            candidates.push(ElementaryCondition::new(attribute_index, RelationalOperator::LessThan, midpoint));
        }
    }
    candidates
}

fn nominal_candidates(covered: &SetOfExamples<'_>, attribute_index: usize) -> Vec<ElementaryCondition> {
    let mut values: Vec<f64> = covered
        .iter()
        .map(|example| example.attribute(attribute_index))
        .filter(|v| !v.is_nan())
        .collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    values.dedup();
    values
        .into_iter()
        .map(|value| ElementaryCondition::new(attribute_index, RelationalOperator::Equal, value))
        .collect()
}

/// Among quality-tied candidates, keeps those covering the most weighted
/// `uncovered_positives`, then picks uniformly at random among that
/// narrowed set (mirroring the reference engine's random tie-break).
fn choose_condition_from_equal(
    candidates: &[ElementaryCondition],
    uncovered_positives: &SetOfExamples<'_>,
    rng: &mut impl Rng,
) -> ElementaryCondition {
    let weighted: Vec<(ElementaryCondition, f64)> = candidates
        .iter()
        .map(|&candidate| {
            let p: f64 = uncovered_positives
                .iter()
                .filter(|example| candidate.is_satisfied(example.attribute(candidate.attribute_index())))
                .map(|example| example.weight())
                .sum();
            (candidate, p)
        })
        .collect();
    let best_p = weighted.iter().map(|&(_, p)| p).fold(f64::NEG_INFINITY, f64::max);
    let tied: Vec<ElementaryCondition> = weighted
        .into_iter()
        .filter(|&(_, p)| p == best_p)
        .map(|(c, _)| c)
        .collect();
    tied[rng.gen_range(0..tied.len())]
}

/// Greedily removes conditions as long as the resulting rule's quality
/// (under `measure`) improves on or ties the rule's quality before that
/// removal, gated by `apriori` (the class base rate `P/(P+N)`): a removal
/// is only eligible when it keeps `Precision(E, tmp) > apriori`. Ties are
/// broken by picking uniformly at random among every eligible removal,
/// not by a single greedy maximum.
pub fn prune_rule(rule: &mut Rule, whole: &SetOfExamples<'_>, measure: QualityMeasure, apriori: f64, rng: &mut impl Rng) {
    let mut best_quality = measure.evaluate(evaluate_rule(whole, rule));

    loop {
        if rule.num_conditions() <= 1 {
            break;
        }
        let removable: Vec<ElementaryCondition> = rule.all_conditions().copied().collect();
        let mut equally_worst: Vec<(ElementaryCondition, f64)> = Vec::new();

        for condition in &removable {
            let mut candidate = rule.clone();
            candidate.remove_condition(condition);
            let eval = evaluate_rule(whole, &candidate);
            if QualityMeasure::Precision.evaluate(eval) <= apriori {
                continue;
            }
            let quality = measure.evaluate(eval);
            if quality >= best_quality {
                equally_worst.push((*condition, quality));
            }
        }

        if equally_worst.is_empty() {
            break;
        }
        let (condition, quality) = equally_worst[rng.gen_range(0..equally_worst.len())];
        rule.remove_condition(&condition);
        best_quality = quality;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::Attribute;
    use crate::dataset::Dataset;
    use rand::SeedableRng;

    fn linearly_separable_dataset() -> Dataset {
        let mut ds = Dataset::new(
            "t",
            Attribute::nominal("class", vec!["neg".to_string(), "pos".to_string()]),
        );
        ds.add_attribute(
            vec![0.0, 1.0, 2.0, 10.0, 11.0, 12.0],
            Attribute::numerical("x1"),
        )
        .unwrap();
        ds.add_decision(vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]).unwrap();
        ds
    }

    #[test]
    fn test_generate_rules_for_class_covers_every_positive() {
        let ds = linearly_separable_dataset();
        let whole = SetOfExamples::whole(&ds);
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let rules = generate_rules_for_class(&whole, 1.0, QualityMeasure::TwoMeasure, QualityMeasure::Precision, &mut rng);
        assert!(!rules.is_empty());
        for idx in 3..6 {
            assert!(rules.iter().any(|r| r.covers(ds.example(idx))));
        }
    }

    #[test]
    fn test_generate_rules_produces_every_class() {
        let ds = linearly_separable_dataset();
        let whole = SetOfExamples::whole(&ds);
        let mut rng = rand::rngs::StdRng::seed_from_u64(2);
        let rules = generate_rules(&whole, QualityMeasure::TwoMeasure, QualityMeasure::Precision, &mut rng);
        let classes: std::collections::HashSet<_> = rules.iter().map(|r| r.decision_class() as i64).collect();
        assert!(classes.contains(&0));
        assert!(classes.contains(&1));
    }

    #[test]
    fn test_grown_rules_are_pure_on_training_data() {
        let ds = linearly_separable_dataset();
        let whole = SetOfExamples::whole(&ds);
        let mut rng = rand::rngs::StdRng::seed_from_u64(3);
        let rules = generate_rules(&whole, QualityMeasure::TwoMeasure, QualityMeasure::Precision, &mut rng);
        for rule in &rules {
            for example in whole.iter() {
                if rule.covers(example) {
                    assert_eq!(example.decision(), rule.decision_class());
                }
            }
        }
    }
}
