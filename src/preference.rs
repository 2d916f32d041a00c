//! Preference-guided sequential covering: the same grow/prune loop as
//! [`crate::engine`], constrained by a [`Knowledge`] of allowed/forbidden
//! rules and conditions per class.
//!
//! Grounded on `SequentialCoveringWithPreferences.h/cpp`. Three mechanics
//! distinguish this from the unrestricted engine:
//!
//! 1. A class with no preference entries at all is skipped entirely
//!    unless [`Knowledge::generate_rules_for_other_classes`] is set
//!    ([`Knowledge::should_skip_class`]).
//! 2. `allowed_rules[class]` seeds concrete rules before any growth
//!    happens; an `expandable` seed is then grown further, restricted to
//!    conditions compatible with that seed's own template combined with
//!    the class's `allowed_conditions` (built as a combined value per
//!    call rather than temporarily mutating the shared knowledge and
//!    restoring it afterward, which would alias across concurrent
//!    growth attempts).
//! 3. A condition present in `allowed_conditions` and marked `required`
//!    survives pruning unless another compatible condition on the same
//!    attribute is also required (so the requirement is still met after
//!    removing this one).

use crate::attribute::AttributeType;
use crate::condition::{ElementaryCondition, RelationalOperator};
use crate::knowledge::{Knowledge, KnowledgeCondition, SetOfConditions};
use crate::measures::{evaluate_counts, evaluate_rule, QualityMeasure};
use crate::rule::Rule;
use crate::view::SetOfExamples;
use rand::Rng;

/// Induces rules for every class `knowledge` does not gate out.
pub fn generate_rules(
    whole: &SetOfExamples<'_>,
    knowledge: &Knowledge,
    grow_measure: QualityMeasure,
    prune_measure: QualityMeasure,
    rng: &mut impl Rng,
) -> Vec<Rule> {
    let mut rules = Vec::new();
    for class_index in 0..knowledge.num_classes {
        if knowledge.should_skip_class(class_index) {
            continue;
        }
        rules.extend(generate_rules_for_class(
            whole,
            class_index as f64,
            knowledge,
            grow_measure,
            prune_measure,
            rng,
        ));
    }
    rules
}

fn generate_rules_for_class(
    whole: &SetOfExamples<'_>,
    decision_class: f64,
    knowledge: &Knowledge,
    grow_measure: QualityMeasure,
    prune_measure: QualityMeasure,
    rng: &mut impl Rng,
) -> Vec<Rule> {
    let dataset = whole.dataset();
    let class_index = decision_class.round() as usize;
    let mut uncovered_positives = whole.filter_by_class(decision_class);
    let mut rules = Vec::new();

    let empty_allowed = SetOfConditions::new(decision_class, true, 0, false);
    let allowed = knowledge
        .allowed_conditions
        .get(class_index)
        .unwrap_or(&empty_allowed);
    let forbidden = knowledge.forbidden_conditions.get(class_index);
    let allowed_rules = knowledge.allowed_rules.get(class_index).cloned().unwrap_or_default();
    let forbidden_rules = knowledge.forbidden_rules.get(class_index).cloned().unwrap_or_default();

    let apriori_eval = evaluate_rule(whole, &Rule::new(decision_class));
    let apriori = if apriori_eval.p_total + apriori_eval.n_total == 0.0 {
        0.0
    } else {
        apriori_eval.p_total / (apriori_eval.p_total + apriori_eval.n_total)
    };

    let mut specified_rule_count = 0usize;

    for seed in &allowed_rules {
        let mut rule = rule_from_knowledge_rule(&seed.template);
        let seed_eval = evaluate_rule(whole, &rule);
        let apriori_quality = grow_measure.evaluate(seed_eval);
        specified_rule_count += 1;

        if seed.template.expandable {
            let mut combined = allowed.clone();
            combined.conditions.extend(seed.template.conditions.iter().copied());

            let mut use_specified_only = knowledge.use_specified_only;
            let mut grown = rule.clone();
            grow_rule(
                &mut grown,
                whole,
                &uncovered_positives,
                grow_measure,
                &combined,
                forbidden,
                &forbidden_rules,
                use_specified_only,
                rng,
            );
            let grown_quality = grow_measure.evaluate(evaluate_rule(whole, &grown));

            if grown_quality < apriori_quality && specified_rule_count >= allowed.rules_at_least {
                if !knowledge.use_specified_only {
                    use_specified_only = false;
                    grown = rule.clone();
                    grow_rule(
                        &mut grown,
                        whole,
                        &uncovered_positives,
                        grow_measure,
                        &combined,
                        forbidden,
                        &forbidden_rules,
                        use_specified_only,
                        rng,
                    );
                }
                // Otherwise keep the unexpanded seed rule as-is.
            } else {
                rule = grown;
            }

            prune_rule(&mut rule, whole, prune_measure, apriori, &combined, &forbidden_rules, rng);
        }

        let eval = evaluate_rule(whole, &rule);
        rule.set_confidence_degree(prune_measure.evaluate(eval));

        let newly_covered: Vec<usize> = uncovered_positives
            .indices()
            .iter()
            .copied()
            .filter(|&idx| rule.covers(dataset.example(idx)))
            .collect();
        if !newly_covered.is_empty() {
            let newly_covered_view = SetOfExamples::from_indices(dataset, newly_covered);
            uncovered_positives = uncovered_positives.difference(&newly_covered_view);
        }
        rules.push(rule);
    }

    if allowed_rules.is_empty() || !knowledge.use_specified_only {
        let mut guard = 0usize;
        while !uncovered_positives.is_empty() {
            guard += 1;
            if guard > dataset.num_examples() + 1 {
                break;
            }
            let mut rule = Rule::new(decision_class);
            grow_rule(
                &mut rule,
                whole,
                &uncovered_positives,
                grow_measure,
                allowed,
                forbidden,
                &forbidden_rules,
                knowledge.use_specified_only,
                rng,
            );
            let grown_eval = evaluate_rule(whole, &rule);
            if QualityMeasure::Precision.evaluate(grown_eval) <= apriori
                && specified_rule_count >= allowed.rules_at_least
            {
                break;
            }

            prune_rule(&mut rule, whole, prune_measure, apriori, allowed, &forbidden_rules, rng);

            let eval = evaluate_rule(whole, &rule);
            rule.set_confidence_degree(prune_measure.evaluate(eval));

            let newly_covered: Vec<usize> = uncovered_positives
                .indices()
                .iter()
                .copied()
                .filter(|&idx| rule.covers(dataset.example(idx)))
                .collect();
            if newly_covered.is_empty() {
                rules.push(rule);
                break;
            }
            let newly_covered_view = SetOfExamples::from_indices(dataset, newly_covered);
            uncovered_positives = uncovered_positives.difference(&newly_covered_view);
            rules.push(rule);
        }
    }

    rules
}

/// Materializes a seed template directly into a concrete rule: a pinned
/// value (`from == to`) becomes an `Equal` condition, a genuine range
/// becomes up to a `GreaterEqual(from)`/`LessThan(to)` pair (open bounds
/// are skipped).
fn rule_from_knowledge_rule(template: &SetOfConditions) -> Rule {
    let mut rule = Rule::new(template.decision_class);
    for condition in &template.conditions {
        let value = condition.get_value();
        if !value.is_nan() {
            rule.add_condition(ElementaryCondition::new(
                condition.attribute_index,
                RelationalOperator::Equal,
                value,
            ));
        } else {
            if condition.from > f64::MIN {
                rule.add_condition(ElementaryCondition::new(
                    condition.attribute_index,
                    RelationalOperator::GreaterEqual,
                    condition.from,
                ));
            }
            if condition.to < f64::MAX {
                rule.add_condition(ElementaryCondition::new(
                    condition.attribute_index,
                    RelationalOperator::LessThan,
                    condition.to,
                ));
            }
        }
    }
    rule
}

#[allow(clippy::too_many_arguments)]
fn grow_rule(
    rule: &mut Rule,
    whole: &SetOfExamples<'_>,
    uncovered_positives: &SetOfExamples<'_>,
    measure: QualityMeasure,
    allowed: &SetOfConditions,
    forbidden: Option<&SetOfConditions>,
    forbidden_rules: &[crate::knowledge::KnowledgeRule],
    mut use_specified_only: bool,
    rng: &mut impl Rng,
) {
    let dataset = whole.dataset();
    let mut covered = whole.clone();
    let mut uncovered_positives = uncovered_positives.clone();

    loop {
        let eval = evaluate_rule(whole, rule);
        if eval.n == 0.0 && eval.p > 0.0 {
            break;
        }
        let found = find_best_condition(
            dataset,
            &covered,
            &uncovered_positives,
            rule,
            rule.decision_class(),
            measure,
            allowed,
            forbidden,
            forbidden_rules,
            use_specified_only,
            rng,
        );
        match found {
            Some(condition) => {
                rule.add_condition_and_optimize(condition);
                let narrowed: Vec<usize> = covered
                    .indices()
                    .iter()
                    .copied()
                    .filter(|&idx| condition.is_satisfied(dataset.example(idx).attribute(condition.attribute_index())))
                    .collect();
                covered = SetOfExamples::from_indices(dataset, narrowed);
                let narrowed_uncovered: Vec<usize> = uncovered_positives
                    .indices()
                    .iter()
                    .copied()
                    .filter(|&idx| condition.is_satisfied(dataset.example(idx).attribute(condition.attribute_index())))
                    .collect();
                uncovered_positives = SetOfExamples::from_indices(dataset, narrowed_uncovered);
            }
            None if use_specified_only && allowed.expandable => {
                // Downgrade: retry this step allowing any condition, not
                // just the specified ones.
                use_specified_only = false;
            }
            None => break,
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn find_best_condition(
    dataset: &crate::dataset::Dataset,
    covered: &SetOfExamples<'_>,
    uncovered_positives: &SetOfExamples<'_>,
    rule: &Rule,
    decision_class: f64,
    measure: QualityMeasure,
    allowed: &SetOfConditions,
    forbidden: Option<&SetOfConditions>,
    forbidden_rules: &[crate::knowledge::KnowledgeRule],
    use_specified_only: bool,
    rng: &mut impl Rng,
) -> Option<ElementaryCondition> {
    let mut best_quality = f64::NEG_INFINITY;
    let mut candidates: Vec<ElementaryCondition> = Vec::new();

    for attribute_index in 0..dataset.num_conditional_attributes() {
        let attribute = dataset.conditional_attribute(attribute_index);
        let proposals: Vec<ElementaryCondition> = if attribute.is_numerical() {
            numerical_candidates(covered, attribute_index, allowed, use_specified_only)
        } else {
            nominal_candidates(covered, attribute_index, allowed, use_specified_only)
        };

        for candidate in proposals {
            if !uncovered_positives
                .iter()
                .any(|example| candidate.is_satisfied(example.attribute(candidate.attribute_index())))
            {
                continue;
            }
            if is_condition_forbidden(&candidate, decision_class, forbidden, rule, forbidden_rules) {
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
        let weighted: Vec<(ElementaryCondition, f64)> = candidates
            .iter()
            .map(|&c| {
                let p: f64 = uncovered_positives
                    .iter()
                    .filter(|e| c.is_satisfied(e.attribute(c.attribute_index())))
                    .map(|e| e.weight())
                    .sum();
                (c, p)
            })
            .collect();
        let best_p = weighted.iter().map(|&(_, p)| p).fold(f64::NEG_INFINITY, f64::max);
        let tied: Vec<ElementaryCondition> = weighted
            .into_iter()
            .filter(|&(_, p)| p == best_p)
            .map(|(c, _)| c)
            .collect();
        Some(tied[rng.gen_range(0..tied.len())])
    }
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

fn numerical_candidates(
    covered: &SetOfExamples<'_>,
    attribute_index: usize,
    allowed: &SetOfConditions,
    use_specified_only: bool,
) -> Vec<ElementaryCondition> {
    let mut values: Vec<f64> = covered
        .iter()
        .map(|example| example.attribute(attribute_index))
        .filter(|v| !v.is_nan())
        .collect();
    for bound in allowed.conditions_for_attribute(attribute_index) {
        values.push(bound.from);
        values.push(bound.to);
    }
    values.retain(|v| v.is_finite());
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    values.dedup();

    let attribute_conditions = allowed.conditions_for_attribute(attribute_index);
    let mut candidates = Vec::new();
    for pair in values.windows(2) {
        let midpoint = (pair[0] + pair[1]) / 2.0;
        let ge = ElementaryCondition::new(attribute_index, RelationalOperator::GreaterEqual, midpoint);
        let lt = ElementaryCondition::new(attribute_index, RelationalOperator::LessThan, midpoint);
        if !use_specified_only || is_numeric_condition_specified(midpoint, true, &attribute_conditions, false) {
            candidates.push(ge);
        }
        if !use_specified_only || is_numeric_condition_specified(midpoint, false, &attribute_conditions, false) {
            candidates.push(lt);
        }
    }
    candidates
}

fn nominal_candidates(
    covered: &SetOfExamples<'_>,
    attribute_index: usize,
    allowed: &SetOfConditions,
    use_specified_only: bool,
) -> Vec<ElementaryCondition> {
    let values: Vec<f64> = if use_specified_only {
        allowed
            .conditions_for_attribute(attribute_index)
            .iter()
            .map(|c| c.get_value())
            .filter(|v| !v.is_nan())
            .filter(|&v| covered.exists_example_with_attribute_value(attribute_index, v))
            .collect()
    } else {
        let mut values: Vec<f64> = covered
            .iter()
            .map(|example| example.attribute(attribute_index))
            .filter(|v| !v.is_nan())
            .collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        values.dedup();
        values
    };
    values
        .into_iter()
        .map(|value| ElementaryCondition::new(attribute_index, RelationalOperator::Equal, value))
        .collect()
}

/// Whether `value` (as a `>=` bound if `greater_equal`, else a `<` bound)
/// matches an entry in `conditions`: a `fixed` entry needs an exact bound
/// match, a non-fixed entry only needs the half-line to intersect the
/// interval's interior. `and_required` additionally requires the entry's
/// `required` flag (used by the pruning-survival check).
fn is_numeric_condition_specified(
    value: f64,
    greater_equal: bool,
    conditions: &[&KnowledgeCondition],
    and_required: bool,
) -> bool {
    conditions.iter().any(|cond| {
        if and_required && !cond.required {
            return false;
        }
        if cond.fixed {
            if greater_equal {
                value == cond.from
            } else {
                value == cond.to
            }
        } else if greater_equal {
            cond.from <= value && value < cond.to
        } else {
            cond.from < value && value <= cond.to
        }
    })
}

fn is_condition_forbidden(
    candidate: &ElementaryCondition,
    decision_class: f64,
    forbidden: Option<&SetOfConditions>,
    rule: &Rule,
    forbidden_rules: &[crate::knowledge::KnowledgeRule],
) -> bool {
    let nominal = candidate.operator() == RelationalOperator::Equal;
    if let Some(forbidden) = forbidden {
        let hits = forbidden.conditions_for_attribute(candidate.attribute_index());
        let matched = hits.iter().any(|cond| {
            if nominal {
                cond.get_value() == candidate.value()
            } else {
                interval_overlaps(cond, candidate.value(), candidate.operator() == RelationalOperator::GreaterEqual)
            }
        });
        if matched {
            return true;
        }
    }

    let _ = decision_class;
    for template in forbidden_rules {
        let hits = template
            .template
            .conditions_for_attribute(candidate.attribute_index());
        let matches_this = hits.iter().any(|cond| {
            if nominal {
                cond.get_value() == candidate.value()
            } else {
                interval_overlaps(cond, candidate.value(), candidate.operator() == RelationalOperator::GreaterEqual)
            }
        });
        if !matches_this {
            continue;
        }
        let others_present = template.template.conditions.iter().all(|other| {
            if other.attribute_index == candidate.attribute_index()
                && (other.get_value() == candidate.value()
                    || interval_overlaps(other, candidate.value(), candidate.operator() == RelationalOperator::GreaterEqual))
            {
                return true;
            }
            rule.conditions()
                .get(other.attribute_index)
                .is_some_and(|bucket| {
                    bucket.iter().any(|existing| {
                        if other.attribute_type == AttributeType::Nominal {
                            existing.value() == other.get_value()
                        } else {
                            interval_overlaps(other, existing.value(), existing.operator() == RelationalOperator::GreaterEqual)
                        }
                    })
                })
        });
        if others_present {
            return true;
        }
    }
    false
}

fn interval_overlaps(cond: &KnowledgeCondition, value: f64, greater_equal: bool) -> bool {
    if cond.fixed {
        if greater_equal {
            value == cond.from
        } else {
            value == cond.to
        }
    } else if greater_equal {
        value < cond.to
    } else {
        value > cond.from
    }
}

#[allow(clippy::too_many_arguments)]
fn prune_rule(
    rule: &mut Rule,
    whole: &SetOfExamples<'_>,
    measure: QualityMeasure,
    apriori: f64,
    allowed: &SetOfConditions,
    _forbidden_rules: &[crate::knowledge::KnowledgeRule],
    rng: &mut impl Rng,
) {
    let mut best_quality = measure.evaluate(evaluate_rule(whole, rule));

    loop {
        if rule.num_conditions() <= 1 {
            break;
        }
        let removable: Vec<ElementaryCondition> = rule.all_conditions().copied().collect();
        let mut equally_worst: Vec<(ElementaryCondition, f64)> = Vec::new();

        for condition in &removable {
            if is_condition_required(condition, rule, allowed) {
                continue;
            }
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

/// A condition survives pruning when `allowed` marks it `required` *and*
/// no other condition already in the rule's same-attribute bucket is also
/// a required, compatible specification (in which case the requirement
/// is still satisfied after removing this one).
fn is_condition_required(condition: &ElementaryCondition, rule: &Rule, allowed: &SetOfConditions) -> bool {
    let attribute_conditions = allowed.conditions_for_attribute(condition.attribute_index());
    let nominal = condition.operator() == RelationalOperator::Equal;

    let directly_required = attribute_conditions.iter().any(|cond| {
        if !cond.required {
            return false;
        }
        if nominal {
            cond.get_value() == condition.value()
        } else {
            let greater_equal = condition.operator() == RelationalOperator::GreaterEqual;
            is_numeric_condition_specified(condition.value(), greater_equal, std::slice::from_ref(cond), true)
        }
    });
    if !directly_required {
        return false;
    }

    if let Some(bucket) = rule.conditions().get(condition.attribute_index()) {
        if bucket.len() > 1 {
            let another_covers_requirement = bucket.iter().any(|other| {
                other != condition
                    && other.operator() == condition.operator()
                    && attribute_conditions.iter().any(|cond| {
                        cond.required
                            && if nominal {
                                cond.get_value() == other.value()
                            } else {
                                is_numeric_condition_specified(
                                    other.value(),
                                    other.operator() == RelationalOperator::GreaterEqual,
                                    std::slice::from_ref(cond),
                                    true,
                                )
                            }
                    })
            });
            if another_covers_requirement {
                return false;
            }
        }
    }
    true
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
        ds.add_attribute(vec![0.0, 1.0, 2.0, 10.0, 11.0, 12.0], Attribute::numerical("x1"))
            .unwrap();
        ds.add_decision(vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]).unwrap();
        ds
    }

    #[test]
    fn test_class_with_no_preferences_is_skipped() {
        let ds = dataset();
        let whole = SetOfExamples::whole(&ds);
        let knowledge = Knowledge::new(2, false, false);
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let rules = generate_rules(&whole, &knowledge, QualityMeasure::TwoMeasure, QualityMeasure::Precision, &mut rng);
        assert!(rules.is_empty());
    }

    #[test]
    fn test_generate_rules_for_other_classes_still_induces() {
        let ds = dataset();
        let whole = SetOfExamples::whole(&ds);
        let knowledge = Knowledge::new(2, true, false);
        let mut rng = rand::rngs::StdRng::seed_from_u64(2);
        let rules = generate_rules(&whole, &knowledge, QualityMeasure::TwoMeasure, QualityMeasure::Precision, &mut rng);
        assert!(!rules.is_empty());
    }

    #[test]
    fn test_forbidden_condition_is_never_used() {
        let ds = dataset();
        let whole = SetOfExamples::whole(&ds);
        let mut knowledge = Knowledge::new(2, true, false);
        knowledge.forbidden_conditions[1]
            .conditions
            .push(KnowledgeCondition::numerical(0, 5.0, 13.0, false, false));
        let mut rng = rand::rngs::StdRng::seed_from_u64(3);
        let rules = generate_rules(&whole, &knowledge, QualityMeasure::TwoMeasure, QualityMeasure::Precision, &mut rng);
        for rule in rules.iter().filter(|r| r.decision_class() == 1.0) {
            for condition in rule.all_conditions() {
                let overlaps = !(condition.value() < 5.0 || condition.value() > 13.0);
                assert!(!(overlaps && condition.operator() != RelationalOperator::Equal) || condition.value() <= 5.0);
            }
        }
    }
}
