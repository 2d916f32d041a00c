//! Preference/knowledge data model: user-supplied constraints that steer
//! or restrict rule induction per class, grounded on `Knowledge.h`,
//! `KnowledgeCondition.h`, `SetOfConditions.h/cpp`, and `KnowledgeRule.h`.

use crate::attribute::AttributeType;
use serde::{Deserialize, Serialize};

/// One bound on a single attribute within a [`SetOfConditions`] template.
///
/// Numerical conditions carry a half-open `[from, to)` interval;
/// `KnowledgeCondition::numerical` is the usual constructor. Nominal
/// conditions pin a single value and are built with
/// `KnowledgeCondition::nominal`, which sets `from == to == value`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeCondition {
    pub attribute_index: usize,
    pub from: f64,
    pub to: f64,
    /// The bound must be met exactly (`value == from`/`value == to`),
    /// not just intersected.
    pub fixed: bool,
    /// Once present in a rule, this condition must survive pruning.
    pub required: bool,
    pub attribute_type: AttributeType,
}

impl KnowledgeCondition {
    pub fn numerical(attribute_index: usize, from: f64, to: f64, fixed: bool, required: bool) -> Self {
        KnowledgeCondition {
            attribute_index,
            from,
            to,
            fixed,
            required,
            attribute_type: AttributeType::Numerical,
        }
    }

    pub fn nominal(attribute_index: usize, value: f64, fixed: bool, required: bool) -> Self {
        KnowledgeCondition {
            attribute_index,
            from: value,
            to: value,
            fixed,
            required,
            attribute_type: AttributeType::Nominal,
        }
    }

    /// The single pinned value if `from == to`, else `NaN` (a genuine
    /// numeric range has no single representative value).
    pub fn get_value(&self) -> f64 {
        if self.from == self.to {
            self.from
        } else {
            f64::NAN
        }
    }
}

/// A named bundle of [`KnowledgeCondition`]s for one decision class: either
/// a condition-level restriction (`allowedConditions`/`forbiddenConditions`)
/// or the template backing a [`KnowledgeRule`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetOfConditions {
    pub conditions: Vec<KnowledgeCondition>,
    pub decision_class: f64,
    /// Whether the engine may grow additional conditions beyond this set.
    pub expandable: bool,
    /// Minimum count of rules that must be produced from these
    /// specified conditions before falling back to unrestricted growth
    /// is permitted.
    pub rules_at_least: usize,
    pub forbidden: bool,
}

impl SetOfConditions {
    pub fn new(decision_class: f64, expandable: bool, rules_at_least: usize, forbidden: bool) -> Self {
        SetOfConditions {
            conditions: Vec::new(),
            decision_class,
            expandable,
            rules_at_least,
            forbidden,
        }
    }

    pub fn conditions_for_attribute(&self, attribute_index: usize) -> Vec<&KnowledgeCondition> {
        self.conditions
            .iter()
            .filter(|c| c.attribute_index == attribute_index)
            .collect()
    }
}

/// A seed rule template: a [`SetOfConditions`] the engine materializes
/// directly into a concrete [`crate::rule::Rule`] before optionally
/// growing it further.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeRule {
    pub template: SetOfConditions,
}

impl KnowledgeRule {
    pub fn new(template: SetOfConditions) -> Self {
        KnowledgeRule { template }
    }
}

/// Per-class preference constraints steering the induction engine.
///
/// `allowed_rules[c]`/`forbidden_rules[c]` are templates; `allowed_conditions[c]`/
/// `forbidden_conditions[c]` are single `SetOfConditions` restricting which
/// individual conditions may (or may never) appear in a rule for class `c`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Knowledge {
    pub num_classes: usize,
    /// Whether classes with no explicit preference entries still get
    /// freely-induced rules (`true`) or are skipped entirely (`false`).
    pub generate_rules_for_other_classes: bool,
    /// Global default: restrict growth to allowed conditions only,
    /// unless a per-call downgrade re-enables free growth.
    pub use_specified_only: bool,
    pub allowed_rules: Vec<Vec<KnowledgeRule>>,
    pub forbidden_rules: Vec<Vec<KnowledgeRule>>,
    pub allowed_conditions: Vec<SetOfConditions>,
    pub forbidden_conditions: Vec<SetOfConditions>,
}

impl Knowledge {
    pub fn new(num_classes: usize, generate_rules_for_other_classes: bool, use_specified_only: bool) -> Self {
        Knowledge {
            num_classes,
            generate_rules_for_other_classes,
            use_specified_only,
            allowed_rules: vec![Vec::new(); num_classes],
            forbidden_rules: vec![Vec::new(); num_classes],
            allowed_conditions: (0..num_classes)
                .map(|c| SetOfConditions::new(c as f64, true, 0, false))
                .collect(),
            forbidden_conditions: (0..num_classes)
                .map(|c| SetOfConditions::new(c as f64, true, 0, true))
                .collect(),
        }
    }

    /// True when class `c` has no preference entries at all and
    /// [`Knowledge::generate_rules_for_other_classes`] is off — in that
    /// case the induction engine skips the class entirely rather than
    /// inducing freely for it.
    pub fn should_skip_class(&self, c: usize) -> bool {
        !self.generate_rules_for_other_classes
            && self.allowed_rules.get(c).is_none_or(Vec::is_empty)
            && self
                .allowed_conditions
                .get(c)
                .is_none_or(|s| s.conditions.is_empty())
            && self.forbidden_rules.get(c).is_none_or(Vec::is_empty)
            && self
                .forbidden_conditions
                .get(c)
                .is_none_or(|s| s.conditions.is_empty())
    }
}
