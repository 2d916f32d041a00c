//! Rule: ordered per-attribute buckets of elementary conditions plus a
//! decision class and confidence degree.
//!
//! Grounded on `Rule.cpp`/`Rule.h` in the original `rforge/crules` engine:
//! one bucket (here a `Vec<ElementaryCondition>`) per conditional attribute
//! index, a `covers` that ANDs every bucket, and the `toString`/`parseRule`
//! pair that gives rules a bit-exact textual form (§6).

use crate::attribute::AttributeType;
use crate::condition::{ElementaryCondition, RelationalOperator};
use crate::dataset::{Dataset, Example};
use crate::error::{RuleInductionError, RuleInductionResult};
use serde::{Deserialize, Serialize};

/// `(P, p, N, n)`: total weighted positives/negatives and the weighted
/// counts of each covered by the rule or condition under test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleEvaluationResult {
    /// Total weighted positive examples.
    pub p_total: f64,
    /// Weighted positives covered (true positives).
    pub p: f64,
    /// Total weighted negative examples.
    pub n_total: f64,
    /// Weighted negatives covered (false positives).
    pub n: f64,
}

impl RuleEvaluationResult {
    pub const ZERO: RuleEvaluationResult = RuleEvaluationResult {
        p_total: 0.0,
        p: 0.0,
        n_total: 0.0,
        n: 0.0,
    };

    pub fn new(p_total: f64, p: f64, n_total: f64, n: f64) -> Self {
        RuleEvaluationResult {
            p_total,
            p,
            n_total,
            n,
        }
    }
}

impl std::ops::Add for RuleEvaluationResult {
    type Output = RuleEvaluationResult;
    fn add(self, rhs: RuleEvaluationResult) -> RuleEvaluationResult {
        RuleEvaluationResult::new(
            self.p_total + rhs.p_total,
            self.p + rhs.p,
            self.n_total + rhs.n_total,
            self.n + rhs.n,
        )
    }
}

/// A conjunction of elementary conditions implying a decision class.
///
/// Conditions are grouped one bucket per conditional attribute index;
/// buckets may be empty (a rule with no conditions covers everything).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// `conditions[attributeIndex]` holds every condition on that
    /// attribute, in insertion order.
    conditions: Vec<Vec<ElementaryCondition>>,
    decision_class: f64,
    confidence_degree: f64,
}

impl Rule {
    /// An empty rule (covers everything) for the given class.
    pub fn new(decision_class: f64) -> Self {
        Rule {
            conditions: Vec::new(),
            decision_class,
            confidence_degree: f64::NAN,
        }
    }

    pub fn decision_class(&self) -> f64 {
        self.decision_class
    }

    pub fn confidence_degree(&self) -> f64 {
        self.confidence_degree
    }

    pub fn set_confidence_degree(&mut self, confidence: f64) {
        self.confidence_degree = confidence;
    }

    /// Buckets of conditions, indexed by conditional attribute index.
    /// Trailing attributes with no condition on them are simply absent
    /// (the bucket vector is only as long as the highest referenced
    /// index + 1).
    pub fn conditions(&self) -> &[Vec<ElementaryCondition>] {
        &self.conditions
    }

    /// Every condition across every bucket, in bucket order.
    pub fn all_conditions(&self) -> impl Iterator<Item = &ElementaryCondition> {
        self.conditions.iter().flatten()
    }

    pub fn num_conditions(&self) -> usize {
        self.conditions.iter().map(Vec::len).sum()
    }

    /// Number of distinct attributes referenced by this rule (non-empty
    /// buckets), not the raw condition count — this is what the external
    /// `NumbersOfConditions` statistic reports (see `RuleClassifier::getRuleSetStats`
    /// in the original engine).
    pub fn num_conditions_distinct_attributes(&self) -> usize {
        self.conditions.iter().filter(|bucket| !bucket.is_empty()).count()
    }

    fn ensure_bucket(&mut self, attribute_index: usize) {
        if attribute_index + 1 > self.conditions.len() {
            self.conditions.resize(attribute_index + 1, Vec::new());
        }
    }

    /// Appends unconditionally to the condition's bucket.
    pub fn add_condition(&mut self, condition: ElementaryCondition) {
        self.ensure_bucket(condition.attribute_index());
        self.conditions[condition.attribute_index()].push(condition);
    }

    /// Appends a condition, collapsing redundant `<`/`≥` conditions in the
    /// same bucket: if an existing same-operator condition is at least as
    /// strict, the new one is dropped; if the new one is strictly
    /// stricter, it replaces the existing one. `=` conditions always
    /// append (never coalesce).
    pub fn add_condition_and_optimize(&mut self, condition: ElementaryCondition) {
        let attribute_index = condition.attribute_index();
        self.ensure_bucket(attribute_index);
        if condition.operator() == RelationalOperator::Equal {
            self.conditions[attribute_index].push(condition);
            return;
        }
        let bucket = &mut self.conditions[attribute_index];
        for existing in bucket.iter() {
            if existing.operator() != condition.operator() {
                continue;
            }
            if existing
                .operator()
                .apply(existing.value(), condition.value())
            {
                // existing is at least as strict; keep it.
                return;
            }
            if existing
                .operator()
                .apply(condition.value(), existing.value())
            {
                let existing_value = existing.value();
                bucket.retain(|c| {
                    !(c.operator() == condition.operator() && c.value() == existing_value)
                });
                bucket.push(condition);
                return;
            }
        }
        bucket.push(condition);
    }

    /// Removes the first matching condition from its bucket.
    pub fn remove_condition(&mut self, condition: &ElementaryCondition) {
        if let Some(bucket) = self.conditions.get_mut(condition.attribute_index()) {
            if let Some(pos) = bucket.iter().position(|c| c == condition) {
                bucket.remove(pos);
            }
        }
    }

    pub fn contains_condition(&self, condition: &ElementaryCondition) -> bool {
        self.all_conditions().any(|c| c == condition)
    }

    /// Logical AND across every bucket and condition; a rule with no
    /// conditions covers everything.
    pub fn covers(&self, example: &Example) -> bool {
        self.conditions.iter().all(|bucket| {
            bucket
                .iter()
                .all(|cond| cond.is_satisfied(example.attribute(cond.attribute_index())))
        })
    }

    /// Renders per §6's grammar: a numerical attribute with ≥2 conditions
    /// renders as `name in [ low ; high )` using the bucket's raw
    /// min/max attribute value (regardless of operator direction — after
    /// `add_condition_and_optimize` a numeric bucket never holds two
    /// same-direction conditions, so this coincides with "mixed
    /// direction" in practice); otherwise each condition renders
    /// individually.
    pub fn to_string(&self, dataset: &Dataset) -> String {
        let mut clauses = Vec::new();
        for (attribute_index, bucket) in self.conditions.iter().enumerate() {
            if bucket.is_empty() {
                continue;
            }
            let attribute = dataset.conditional_attribute(attribute_index);
            if attribute.attribute_type() == AttributeType::Numerical && bucket.len() > 1 {
                let low = bucket
                    .iter()
                    .map(|c| c.value())
                    .fold(f64::INFINITY, f64::min);
                let high = bucket
                    .iter()
                    .map(|c| c.value())
                    .fold(f64::NEG_INFINITY, f64::max);
                clauses.push(format!(
                    "{} in [ {} ; {} )",
                    attribute.name(),
                    crate::attribute::format_float(low),
                    crate::attribute::format_float(high)
                ));
            } else {
                for cond in bucket {
                    let decoded = attribute.decode(cond.value());
                    clauses.push(cond.to_string_named(attribute.name(), &decoded));
                }
            }
        }
        let consequent = dataset.decision_attribute().decode(self.decision_class);
        if clauses.is_empty() {
            format!("IF THEN {consequent}")
        } else {
            format!("IF {} THEN {consequent}", clauses.join(" AND "))
        }
    }

    /// Parses the §6 grammar, including the `in [ low ; high )` sugar
    /// which expands to `attr >= low AND attr < high`.
    pub fn parse(dataset: &Dataset, text: &str) -> RuleInductionResult<Rule> {
        let text = text.trim();
        let text = text
            .strip_prefix("IF")
            .ok_or_else(|| RuleInductionError::ParseError("rule must start with IF".to_string()))?
            .trim();
        let (antecedent, consequent) = text.split_once("THEN").ok_or_else(|| {
            RuleInductionError::ParseError("rule must contain THEN".to_string())
        })?;
        let antecedent = antecedent.trim();
        let consequent = consequent.trim();

        let decision_class = dataset.decision_attribute().encode(consequent)?;
        let mut rule = Rule::new(decision_class);

        if antecedent.is_empty() {
            return Ok(rule);
        }

        for clause in antecedent.split(" AND ") {
            let clause = clause.trim();
            if let Some(rest) = clause
                .find(" in [")
                .map(|idx| (&clause[..idx], &clause[idx + 5..]))
            {
                let (name, bounds) = rest;
                let name = name.trim();
                let bounds = bounds.trim_end_matches(')').trim();
                let (low_str, high_str) = bounds.split_once(';').ok_or_else(|| {
                    RuleInductionError::ParseError(format!("malformed interval in \"{clause}\""))
                })?;
                let attribute_index = dataset
                    .conditional_attribute_index_by_name(name)
                    .ok_or_else(|| {
                        RuleInductionError::SchemaMismatch(format!("unknown attribute \"{name}\""))
                    })?;
                let attribute = dataset.conditional_attribute(attribute_index);
                let low = attribute.encode(low_str.trim())?;
                let high = attribute.encode(high_str.trim())?;
                rule.add_condition(ElementaryCondition::new(
                    attribute_index,
                    RelationalOperator::GreaterEqual,
                    low,
                ));
                rule.add_condition(ElementaryCondition::new(
                    attribute_index,
                    RelationalOperator::LessThan,
                    high,
                ));
                continue;
            }

            let parts: Vec<&str> = clause.splitn(3, ' ').collect();
            if parts.len() != 3 {
                return Err(RuleInductionError::ParseError(format!(
                    "malformed condition \"{clause}\""
                )));
            }
            let [name, op_symbol, value_str] = [parts[0], parts[1], parts[2]];
            let attribute_index =
                dataset
                    .conditional_attribute_index_by_name(name)
                    .ok_or_else(|| {
                        RuleInductionError::SchemaMismatch(format!("unknown attribute \"{name}\""))
                    })?;
            let operator = RelationalOperator::from_symbol(op_symbol).ok_or_else(|| {
                RuleInductionError::ParseError(format!("unknown operator \"{op_symbol}\""))
            })?;
            let attribute = dataset.conditional_attribute(attribute_index);
            let value = attribute.encode(value_str.trim())?;
            rule.add_condition(ElementaryCondition::new(attribute_index, operator, value));
        }

        Ok(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::Attribute;

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
    fn test_empty_rule_covers_everything() {
        let ds = sample_dataset();
        let rule = Rule::new(0.0);
        assert!(rule.covers(ds.example(0)));
        assert!(rule.covers(ds.example(1)));
    }

    #[test]
    fn test_add_condition_and_optimize_keeps_stricter_ge() {
        let mut rule = Rule::new(0.0);
        rule.add_condition_and_optimize(ElementaryCondition::new(
            0,
            RelationalOperator::GreaterEqual,
            1.0,
        ));
        rule.add_condition_and_optimize(ElementaryCondition::new(
            0,
            RelationalOperator::GreaterEqual,
            5.0,
        ));
        assert_eq!(rule.conditions()[0].len(), 1);
        assert_eq!(rule.conditions()[0][0].value(), 5.0);

        rule.add_condition_and_optimize(ElementaryCondition::new(
            0,
            RelationalOperator::GreaterEqual,
            2.0,
        ));
        assert_eq!(rule.conditions()[0][0].value(), 5.0);
    }

    #[test]
    fn test_add_condition_and_optimize_equality_always_appends() {
        let mut rule = Rule::new(0.0);
        rule.add_condition_and_optimize(ElementaryCondition::new(0, RelationalOperator::Equal, 1.0));
        rule.add_condition_and_optimize(ElementaryCondition::new(0, RelationalOperator::Equal, 2.0));
        assert_eq!(rule.conditions()[0].len(), 2);
    }

    #[test]
    fn test_covers_ands_across_buckets() {
        let mut rule = Rule::new(0.0);
        rule.add_condition(ElementaryCondition::new(0, RelationalOperator::GreaterEqual, 2.0));
        let ds = sample_dataset();
        assert!(!rule.covers(ds.example(0)));
        assert!(rule.covers(ds.example(1)));
    }

    #[test]
    fn test_to_string_and_parse_round_trip_single_condition() {
        let ds = sample_dataset();
        let mut rule = Rule::new(0.0);
        rule.add_condition(ElementaryCondition::new(0, RelationalOperator::LessThan, 2.0));
        let text = rule.to_string(&ds);
        assert_eq!(text, "IF x1 < 2 THEN A");
        let parsed = Rule::parse(&ds, &text).unwrap();
        assert_eq!(parsed, rule);
    }

    #[test]
    fn test_to_string_numeric_range_sugar() {
        let ds = sample_dataset();
        let mut rule = Rule::new(1.0);
        rule.add_condition(ElementaryCondition::new(0, RelationalOperator::GreaterEqual, 1.0));
        rule.add_condition(ElementaryCondition::new(0, RelationalOperator::LessThan, 3.0));
        let text = rule.to_string(&ds);
        assert_eq!(text, "IF x1 in [ 1 ; 3 ) THEN B");
        let parsed = Rule::parse(&ds, &text).unwrap();
        assert_eq!(parsed.conditions()[0].len(), 2);
        assert_eq!(parsed.decision_class(), 1.0);
    }

    #[test]
    fn test_parse_unknown_attribute_errors() {
        let ds = sample_dataset();
        let err = Rule::parse(&ds, "IF bogus = 1 THEN A").unwrap_err();
        assert!(matches!(err, RuleInductionError::SchemaMismatch(_)));
    }

    #[test]
    fn test_num_conditions_distinct_attributes_counts_buckets_not_conditions() {
        let mut rule = Rule::new(0.0);
        rule.add_condition(ElementaryCondition::new(0, RelationalOperator::GreaterEqual, 1.0));
        rule.add_condition(ElementaryCondition::new(0, RelationalOperator::LessThan, 3.0));
        assert_eq!(rule.num_conditions(), 2);
        assert_eq!(rule.num_conditions_distinct_attributes(), 1);
    }
}
