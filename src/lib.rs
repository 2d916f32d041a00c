//! # Sequential-covering rule induction
//!
//! This crate induces IF-THEN classification rules from labeled tabular
//! data and classifies new examples by voting across the induced rule
//! set. It follows the classic separate-and-conquer recipe: grow a
//! maximally specific rule against the training data, prune it back
//! while a chosen quality measure holds up, remove what it covers, and
//! repeat until every class has been accounted for.
//!
//! ## Pipeline architecture
//!
//! ```text
//! ARFF file / in-memory rows
//!     ↓
//! [Dataset / Attribute (dataset, attribute)]   → typed, encoded columns
//!     ↓
//! [SetOfExamples (view)]                       → immutable row subsets
//!     ↓
//! [Sequential covering (engine)]               → grow / prune / cover
//!     ↓  (optionally constrained by)
//! [Knowledge (knowledge, preference)]           → allowed/forbidden rules
//!     ↓
//! [RuleClassifier (classifier)]                 → voting classification
//!     ↓
//! [ConfusionMatrix (confusion)]                 → accuracy metrics
//! ```
//!
//! Cross-validation ([`cross_validation`]) wraps the whole pipeline in a
//! stratified k-fold loop; [`api`] is the single call surface external
//! callers (including the `rule-induce` binary) are expected to use.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rule_induction::api::{self, GenerateRulesParams};
//! use rule_induction::arff;
//! use rule_induction::measures::QualityMeasure;
//!
//! let dataset = arff::load_from_arff("train.arff")?;
//! let generated = api::generate_rules(
//!     &dataset,
//!     None,
//!     GenerateRulesParams {
//!         grow_measure: QualityMeasure::TwoMeasure,
//!         prune_measure: QualityMeasure::Precision,
//!         seed: 0.5,
//!     },
//! )?;
//!
//! for rule in generated.classifier.rules() {
//!     println!("{}", rule.to_string(&dataset));
//! }
//! ```
//!
//! ## Module map
//!
//! - [`attribute`] / [`dataset`] / [`view`]: the data model — typed
//!   columns, owned examples, borrowed row subsets.
//! - [`condition`] / [`rule`]: elementary conditions and the rules built
//!   from them, plus the ARFF-adjacent textual grammar.
//! - [`measures`]: the rule-quality measures the engine optimizes for.
//! - [`engine`]: unrestricted sequential covering.
//! - [`knowledge`] / [`preference`]: the optional preference layer that
//!   restricts, seeds, or forbids conditions and whole rules per class.
//! - [`classifier`] / [`confusion`]: voting classification and the
//!   resulting confusion matrix and derived metrics.
//! - [`cross_validation`]: stratified k-fold evaluation.
//! - [`arff`]: the ARFF text format reader/writer.
//! - [`config`] / [`error`]: ambient configuration and error types.
//! - [`api`]: the stable, typed entry points tying the above together.

pub mod api;
pub mod arff;
pub mod attribute;
pub mod classifier;
pub mod condition;
pub mod config;
pub mod confusion;
pub mod cross_validation;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod knowledge;
pub mod measures;
pub mod preference;
pub mod rule;
pub mod view;

pub use attribute::{Attribute, AttributeType};
pub use classifier::RuleClassifier;
pub use condition::{ElementaryCondition, RelationalOperator};
pub use config::Config;
pub use confusion::ConfusionMatrix;
pub use dataset::{Dataset, Example};
pub use error::{RuleInductionError, RuleInductionResult};
pub use knowledge::Knowledge;
pub use measures::QualityMeasure;
pub use rule::Rule;
pub use view::SetOfExamples;
