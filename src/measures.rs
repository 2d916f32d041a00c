//! Rule quality measures.
//!
//! Every measure is a pure function of `(P, p, N, n)` — total weighted
//! positives/negatives and the weighted positives/negatives covered —
//! except [`QualityMeasure::NegConditionalEntropy`], which needs the raw
//! covered/uncovered views to compute an entropy over every class, not
//! just the two-way split. Formulas are grounded on `RuleQualityMeasure.cpp`.

use crate::dataset::Example;
use crate::rule::{Rule, RuleEvaluationResult};
use crate::view::SetOfExamples;
use serde::{Deserialize, Serialize};

/// Identifies one of the built-in quality measures (§6's `q`/`qsplit`
/// identifiers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityMeasure {
    Precision,
    Coverage,
    Rss,
    #[serde(rename = "g2")]
    TwoMeasure,
    Lift,
    #[serde(rename = "ls")]
    LogicalSufficiency,
    MutualSupport,
    #[serde(rename = "corr")]
    Correlation,
    #[serde(rename = "s")]
    SBayesConfirmation,
    C2,
    CohenMeasure,
    C1,
    Cn2,
    Gain,
    NegConditionalEntropy,
    Pvalue,
}

impl QualityMeasure {
    pub fn identifier(self) -> &'static str {
        match self {
            QualityMeasure::Precision => "precision",
            QualityMeasure::Coverage => "coverage",
            QualityMeasure::Rss => "rss",
            QualityMeasure::TwoMeasure => "g2",
            QualityMeasure::Lift => "lift",
            QualityMeasure::LogicalSufficiency => "ls",
            QualityMeasure::MutualSupport => "mutualsupport",
            QualityMeasure::Correlation => "corr",
            QualityMeasure::SBayesConfirmation => "s",
            QualityMeasure::C2 => "c2",
            QualityMeasure::CohenMeasure => "cohen",
            QualityMeasure::C1 => "c1",
            QualityMeasure::Cn2 => "cn2",
            QualityMeasure::Gain => "gain",
            QualityMeasure::NegConditionalEntropy => "negconditionalentropy",
            QualityMeasure::Pvalue => "pvalue",
        }
    }

    pub fn from_identifier(identifier: &str) -> Option<Self> {
        Some(match identifier.to_ascii_lowercase().as_str() {
            "precision" => QualityMeasure::Precision,
            "coverage" => QualityMeasure::Coverage,
            "rss" => QualityMeasure::Rss,
            "g2" => QualityMeasure::TwoMeasure,
            "lift" => QualityMeasure::Lift,
            "ls" => QualityMeasure::LogicalSufficiency,
            "mutualsupport" => QualityMeasure::MutualSupport,
            "corr" => QualityMeasure::Correlation,
            "s" => QualityMeasure::SBayesConfirmation,
            "c2" => QualityMeasure::C2,
            "cohen" => QualityMeasure::CohenMeasure,
            "c1" => QualityMeasure::C1,
            "cn2" => QualityMeasure::Cn2,
            "gain" => QualityMeasure::Gain,
            "negconditionalentropy" => QualityMeasure::NegConditionalEntropy,
            "pvalue" => QualityMeasure::Pvalue,
            _ => return None,
        })
    }

    /// Evaluates this measure from the four weighted counts alone. For
    /// [`QualityMeasure::NegConditionalEntropy`], which needs the actual
    /// per-class split, use [`evaluate_on_views`] instead — this always
    /// falls back to the two-group approximation via
    /// `compute_quality_for_two_groups`.
    pub fn evaluate(self, result: RuleEvaluationResult) -> f64 {
        let RuleEvaluationResult { p_total, p, n_total, n } = result;
        match self {
            QualityMeasure::Precision => precision(p, n),
            QualityMeasure::Coverage => coverage(p, p_total),
            QualityMeasure::Rss => rss(p, p_total, n, n_total),
            QualityMeasure::TwoMeasure => two_measure(p, n),
            QualityMeasure::Lift => lift(p_total, p, n_total, n),
            QualityMeasure::LogicalSufficiency => logical_sufficiency(p_total, p, n_total, n),
            QualityMeasure::MutualSupport => mutual_support(p_total, p, n),
            QualityMeasure::Correlation => correlation(p_total, p, n_total, n),
            QualityMeasure::SBayesConfirmation => s_bayes_confirmation(p_total, p, n_total, n),
            QualityMeasure::C2 => c2(p_total, p, n_total, n),
            QualityMeasure::CohenMeasure => cohen_measure(p_total, p, n_total, n),
            QualityMeasure::C1 => c1(p_total, p, n_total, n),
            QualityMeasure::Cn2 => cn2(p_total, p, n_total, n),
            QualityMeasure::Gain => gain(p_total, p, n_total, n),
            QualityMeasure::NegConditionalEntropy => {
                compute_quality_for_two_groups(p_total, p, n_total, n)
            }
            QualityMeasure::Pvalue => pvalue(p_total, p, n_total, n).value,
        }
    }

    /// Evaluates this measure directly over the covered/uncovered views.
    /// Only [`QualityMeasure::NegConditionalEntropy`] needs this — every
    /// other measure here just collapses the views to `(P, p, N, n)` first.
    pub fn evaluate_on_views(
        self,
        whole: &SetOfExamples<'_>,
        covered: &SetOfExamples<'_>,
    ) -> f64 {
        match self {
            QualityMeasure::NegConditionalEntropy => neg_conditional_entropy(whole, covered),
            other => other.evaluate(evaluate_counts(whole, covered, covered_positive_class(whole, covered))),
        }
    }
}

/// Weighted `(P, p, N, n)` for a rule or condition relative to `positive_class`:
/// `P`/`N` are the total weighted examples of/outside that class in `whole`;
/// `p`/`n` are the weighted examples of/outside that class in `covered`.
pub fn evaluate_counts(
    whole: &SetOfExamples<'_>,
    covered: &SetOfExamples<'_>,
    positive_class: f64,
) -> RuleEvaluationResult {
    let mut p_total = 0.0;
    let mut n_total = 0.0;
    for example in whole.iter() {
        if example.decision() == positive_class {
            p_total += example.weight();
        } else {
            n_total += example.weight();
        }
    }
    let mut p = 0.0;
    let mut n = 0.0;
    for example in covered.iter() {
        if example.decision() == positive_class {
            p += example.weight();
        } else {
            n += example.weight();
        }
    }
    RuleEvaluationResult::new(p_total, p, n_total, n)
}

fn covered_positive_class(whole: &SetOfExamples<'_>, covered: &SetOfExamples<'_>) -> f64 {
    covered
        .iter()
        .next()
        .or_else(|| whole.iter().next())
        .map(Example::decision)
        .unwrap_or(f64::NAN)
}

/// Evaluates a rule's `(P, p, N, n)` against the positive class it predicts.
pub fn evaluate_rule(whole: &SetOfExamples<'_>, rule: &Rule) -> RuleEvaluationResult {
    let mut p_total = 0.0;
    let mut n_total = 0.0;
    let mut p = 0.0;
    let mut n = 0.0;
    for example in whole.iter() {
        let is_positive = example.decision() == rule.decision_class();
        if is_positive {
            p_total += example.weight();
        } else {
            n_total += example.weight();
        }
        if rule.covers(example) {
            if is_positive {
                p += example.weight();
            } else {
                n += example.weight();
            }
        }
    }
    RuleEvaluationResult::new(p_total, p, n_total, n)
}

fn precision(p: f64, n: f64) -> f64 {
    p / (p + n)
}

fn coverage(p: f64, p_total: f64) -> f64 {
    p / p_total
}

fn rss(p: f64, p_total: f64, n: f64, n_total: f64) -> f64 {
    p / p_total - n / n_total
}

/// `g2 = p / (p + n + 2)`.
fn two_measure(p: f64, n: f64) -> f64 {
    p / (p + n + 2.0)
}

/// `Lift = (p+1)(P+N) / ((p+n+2)*P)`.
fn lift(p_total: f64, p: f64, n_total: f64, n: f64) -> f64 {
    (p + 1.0) * (p_total + n_total) / ((p + n + 2.0) * p_total)
}

/// `ls = (p*N) / (n*P)`.
fn logical_sufficiency(p_total: f64, p: f64, n_total: f64, n: f64) -> f64 {
    (p * n_total) / (n * p_total)
}

/// Supplemental measure from the original `RuleQualityMeasure.h`:
/// `MutualSupport = p / (n + P)`.
fn mutual_support(p_total: f64, p: f64, n: f64) -> f64 {
    p / (n + p_total)
}

fn correlation(p_total: f64, p: f64, n_total: f64, n: f64) -> f64 {
    let numerator = p * (n_total - n) - (p_total - p) * n;
    let denom = (p_total * n_total * (p + n) * (p_total + n_total - p - n)).sqrt();
    numerator / denom
}

/// `s = p/(p+n) - (P-p)/((P-p)+(N-n))`.
fn s_bayes_confirmation(p_total: f64, p: f64, n_total: f64, n: f64) -> f64 {
    let prec = precision(p, n);
    let rest_total = (p_total - p) + (n_total - n);
    let rest = (p_total - p) / rest_total;
    prec - rest
}

/// `[((P+N)*p/(p+n) - P)/N] * [(1 + p/P)/2]`.
fn c2_term1(p_total: f64, p: f64, n_total: f64, n: f64) -> f64 {
    ((p_total + n_total) * precision(p, n) - p_total) / n_total
}

fn c2(p_total: f64, p: f64, n_total: f64, n: f64) -> f64 {
    let term1 = c2_term1(p_total, p, n_total, n);
    let coverage_term = (1.0 + p / p_total) / 2.0;
    term1 * coverage_term
}

/// `((P+N)*p/(p+n) - P) / ((P+N)/2 * (1 + (p/(p+n))/(p/P)) - P)`.
fn cohen_measure(p_total: f64, p: f64, n_total: f64, n: f64) -> f64 {
    let prec = precision(p, n);
    let coverage = p / p_total;
    let numerator = (p_total + n_total) * prec - p_total;
    let ratio = prec / coverage;
    let denom = (p_total + n_total) / 2.0 * (1.0 + ratio) - p_total;
    numerator / denom
}

/// `[((P+N)*p/(p+n) - P)/N] * [(2 + Cohen)/3]`.
fn c1(p_total: f64, p: f64, n_total: f64, n: f64) -> f64 {
    let term1 = c2_term1(p_total, p, n_total, n);
    let cohen = cohen_measure(p_total, p, n_total, n);
    term1 * (2.0 + cohen) / 3.0
}

/// `2*(p*ln(p/((p+n)*P/(P+N))) + n*ln((n+1)/((p+n)*N/(P+N))))`, sign
/// negated when `p/(p+n) < P/(P+N)` (natural log, matching the source —
/// see DESIGN.md).
fn cn2(p_total: f64, p: f64, n_total: f64, n: f64) -> f64 {
    let total = p_total + n_total;
    let covered = p + n;
    if total == 0.0 || covered == 0.0 {
        return 0.0;
    }
    let expected_p = covered * p_total / total;
    let term_p = if p > 0.0 && expected_p > 0.0 {
        p * (p / expected_p).ln()
    } else {
        0.0
    };
    let expected_n = covered * n_total / total;
    let term_n = if expected_n > 0.0 {
        n * ((n + 1.0) / expected_n).ln()
    } else {
        0.0
    };
    let raw = 2.0 * (term_p + term_n);
    let prec = precision(p, n);
    let apriori = p_total / total;
    if prec < apriori {
        -raw
    } else {
        raw
    }
}

fn info(p: f64, n: f64) -> f64 {
    let total = p + n;
    if total == 0.0 {
        return 0.0;
    }
    let mut acc = 0.0;
    for x in [p, n] {
        if x > 0.0 {
            let frac = x / total;
            acc -= frac * frac.log2();
        }
    }
    acc
}

/// `Gain = Info(P,N) - Info_pn`, sign negated under the same condition as
/// [`cn2`]; `Info_pn` is the weighted average of `Info(p,n)` over the
/// covered split and `Info(P-p,N-n)` over the uncovered split.
fn gain(p_total: f64, p: f64, n_total: f64, n: f64) -> f64 {
    let total = p_total + n_total;
    if total == 0.0 {
        return 0.0;
    }
    let covered = p + n;
    let uncovered_p = p_total - p;
    let uncovered_n = n_total - n;
    let info_pn = (covered / total) * info(p, n)
        + ((uncovered_p + uncovered_n) / total) * info(uncovered_p, uncovered_n);
    let raw = info(p_total, n_total) - info_pn;
    let prec = precision(p, n);
    let apriori = p_total / total;
    if prec < apriori {
        -raw
    } else {
        raw
    }
}

/// Entropy of the class distribution, evaluated directly on the covered
/// view (not collapsed to a two-way positive/negative split — this is
/// why `NegConditionalEntropy` is routed through [`evaluate_on_views`]
/// rather than the shared `(P,p,N,n)` path).
fn entropy(view: &SetOfExamples<'_>) -> f64 {
    let total = view.sum_of_weights();
    if total == 0.0 {
        return 0.0;
    }
    let mut acc = 0.0;
    for class in view.distinct_classes() {
        let weight = view.filter_by_class(class).sum_of_weights();
        if weight > 0.0 {
            let frac = weight / total;
            acc -= frac * frac.log2();
        }
    }
    acc
}

fn neg_conditional_entropy(whole: &SetOfExamples<'_>, covered: &SetOfExamples<'_>) -> f64 {
    let total = whole.sum_of_weights();
    if total == 0.0 {
        return 0.0;
    }
    let covered_weight = covered.sum_of_weights();
    let uncovered_weight = total - covered_weight;
    let covered_term = (covered_weight / total) * entropy(covered);
    let uncovered_term = if uncovered_weight > 0.0 {
        let uncovered_indices: Vec<usize> = whole
            .indices()
            .iter()
            .copied()
            .filter(|idx| !covered.indices().contains(idx))
            .collect();
        let uncovered = SetOfExamples::from_indices(whole.dataset(), uncovered_indices);
        (uncovered_weight / total) * entropy(&uncovered)
    } else {
        0.0
    };
    -(covered_term + uncovered_term)
}

/// Two-group entropy drop, used as the `(P,p,N,n)`-only approximation of
/// conditional entropy when only the counts (not the full views) are
/// available.
fn compute_quality_for_two_groups(p_total: f64, p: f64, n_total: f64, n: f64) -> f64 {
    let total = p_total + n_total;
    if total == 0.0 {
        return 0.0;
    }
    let covered = p + n;
    let uncovered = total - covered;
    let covered_entropy = info(p, n);
    let uncovered_entropy = info(p_total - p, n_total - n);
    let covered_term = if covered > 0.0 {
        (covered / total) * covered_entropy
    } else {
        0.0
    };
    let uncovered_term = if uncovered > 0.0 {
        (uncovered / total) * uncovered_entropy
    } else {
        0.0
    };
    -(covered_term + uncovered_term)
}

/// Hypergeometric-tail p-value, plus a non-fatal warning when any input
/// count is non-integral (the original computes `lgamma` over raw
/// weights, which is only exact for integer counts).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PvalueResult {
    pub value: f64,
    pub warning: bool,
}

fn ln_choose(n: f64, k: f64) -> f64 {
    if k < 0.0 || k > n {
        return f64::NEG_INFINITY;
    }
    lgamma(n + 1.0) - lgamma(k + 1.0) - lgamma(n - k + 1.0)
}

/// Stirling-series `ln(Gamma(x))`, matching the precision the original
/// engine gets from the C library's `lgamma`.
fn lgamma(x: f64) -> f64 {
    const COEFFICIENTS: [f64; 6] = [
        76.180_091_729_471_46,
        -86.505_320_329_416_77,
        24.014_098_240_830_91,
        -1.231_739_572_450_155,
        0.120_865_097_386_617_93e-2,
        -0.539_523_938_495_912_9e-5,
    ];
    let mut y = x;
    let tmp = x + 5.5 - (x + 0.5) * (x + 5.5).ln();
    let mut series = 1.000_000_000_190_015;
    for coefficient in COEFFICIENTS {
        y += 1.0;
        series += coefficient / y;
    }
    -tmp + (2.506_628_274_631_000_7 * series / x).ln() + x
}

/// One-sided hypergeometric tail: `P(X >= p | P, N, p+n)`, summing
/// `choose(P,k) * choose(N,p+n-k) / choose(P+N,p+n)` for `k` from the
/// observed `p` up to `min(P, p+n)`.
fn pvalue(p_total: f64, p: f64, n_total: f64, n: f64) -> PvalueResult {
    let warning = [p_total, p, n_total, n]
        .iter()
        .any(|v| v.fract().abs() > 1e-9);
    let total = p_total + n_total;
    let covered = p + n;
    if total == 0.0 || covered == 0.0 || p_total == 0.0 {
        return PvalueResult { value: 1.0, warning };
    }
    let log_denom = ln_choose(total, covered);
    let k_max = p_total.min(covered);
    let k_min = p.max(0.0).round();
    let mut sum = 0.0;
    let mut k = k_min;
    // Strictly excludes the k_max boundary term: the original loops
    // `for(k=0; k<upto; k++)` with `upto = min(n, P-p)` terms starting at
    // the observed `p`, i.e. up to but not including `k_max`.
    while k <= k_max - 0.5 {
        let log_p = ln_choose(p_total, k) + ln_choose(n_total, covered - k) - log_denom;
        sum += log_p.exp();
        k += 1.0;
    }
    PvalueResult {
        value: sum.clamp(0.0, 1.0),
        warning,
    }
}

/// Public entry used by the rule-set summary statistic, which always
/// reports `Pvalue`'s warning flag alongside its value.
pub fn pvalue_with_warning(result: RuleEvaluationResult) -> PvalueResult {
    pvalue(result.p_total, result.p, result.n_total, result.n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precision_basic() {
        let r = RuleEvaluationResult::new(10.0, 8.0, 10.0, 2.0);
        assert!((QualityMeasure::Precision.evaluate(r) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_coverage_basic() {
        let r = RuleEvaluationResult::new(10.0, 5.0, 10.0, 0.0);
        assert!((QualityMeasure::Coverage.evaluate(r) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_precision_zero_coverage_is_nan() {
        let r = RuleEvaluationResult::ZERO;
        assert!(QualityMeasure::Precision.evaluate(r).is_nan());
    }

    #[test]
    fn test_perfect_rule_has_high_precision_and_full_coverage() {
        let r = RuleEvaluationResult::new(10.0, 10.0, 10.0, 0.0);
        assert_eq!(QualityMeasure::Precision.evaluate(r), 1.0);
        assert_eq!(QualityMeasure::Coverage.evaluate(r), 1.0);
    }

    #[test]
    fn test_cn2_is_nonnegative_and_sign_negated() {
        let r = RuleEvaluationResult::new(10.0, 9.0, 10.0, 1.0);
        assert!(QualityMeasure::Cn2.evaluate(r) >= 0.0);
    }

    #[test]
    fn test_gain_zero_when_nothing_covered() {
        let r = RuleEvaluationResult::new(10.0, 0.0, 10.0, 0.0);
        assert_eq!(QualityMeasure::Gain.evaluate(r), 0.0);
    }

    #[test]
    fn test_pvalue_integer_counts_no_warning() {
        let r = RuleEvaluationResult::new(10.0, 8.0, 10.0, 1.0);
        let result = pvalue_with_warning(r);
        assert!(!result.warning);
        assert!(result.value >= 0.0 && result.value <= 1.0);
    }

    #[test]
    fn test_pvalue_noninteger_counts_warn() {
        let r = RuleEvaluationResult::new(10.5, 8.2, 10.0, 1.0);
        let result = pvalue_with_warning(r);
        assert!(result.warning);
    }

    #[test]
    fn test_identifier_round_trip() {
        for m in [
            QualityMeasure::Precision,
            QualityMeasure::Coverage,
            QualityMeasure::TwoMeasure,
            QualityMeasure::Cn2,
            QualityMeasure::Gain,
            QualityMeasure::Pvalue,
        ] {
            assert_eq!(QualityMeasure::from_identifier(m.identifier()), Some(m));
        }
    }
}
