//! View (`SetOfExamples`): a borrowed, ordered index list over a
//! [`Dataset`]. Views never own example data; they support the subset
//! algebra the induction engine and cross-validator are built from.

use crate::dataset::Dataset;
use crate::error::{RuleInductionError, RuleInductionResult};
use rand::seq::SliceRandom;
use rand::Rng;

/// A lightweight, borrowed view over a subset of a dataset's examples.
#[derive(Debug, Clone)]
pub struct SetOfExamples<'a> {
    dataset: &'a Dataset,
    indices: Vec<usize>,
}

impl<'a> SetOfExamples<'a> {
    /// A view over every example in `dataset`.
    pub fn whole(dataset: &'a Dataset) -> Self {
        SetOfExamples {
            dataset,
            indices: (0..dataset.num_examples()).collect(),
        }
    }

    /// A view over an explicit list of example indices (caller-checked).
    pub fn from_indices(dataset: &'a Dataset, indices: Vec<usize>) -> Self {
        SetOfExamples { dataset, indices }
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// `self[i]`, dereferenced through to the underlying dataset.
    pub fn get(&self, i: usize) -> &crate::dataset::Example {
        self.dataset.example(self.indices[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &crate::dataset::Example> + '_ {
        self.indices.iter().map(|&idx| self.dataset.example(idx))
    }

    /// Set difference by sort + merge. Not order preserving. Both operands
    /// must reference the same dataset.
    pub fn difference(&self, other: &SetOfExamples<'a>) -> SetOfExamples<'a> {
        let mut a = self.indices.clone();
        let mut b = other.indices.clone();
        a.sort_unstable();
        b.sort_unstable();
        let mut result = Vec::with_capacity(a.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() {
            if j >= b.len() || a[i] < b[j] {
                result.push(a[i]);
                i += 1;
            } else if a[i] == b[j] {
                i += 1;
                j += 1;
            } else {
                j += 1;
            }
        }
        SetOfExamples {
            dataset: self.dataset,
            indices: result,
        }
    }

    /// Indices whose decision equals `class`, preserving iteration order.
    pub fn filter_by_class(&self, class: f64) -> SetOfExamples<'a> {
        let indices = self
            .indices
            .iter()
            .copied()
            .filter(|&idx| self.dataset.example(idx).decision() == class)
            .collect();
        SetOfExamples {
            dataset: self.dataset,
            indices,
        }
    }

    /// Sorted classes present in this view.
    pub fn distinct_classes(&self) -> Vec<f64> {
        let mut classes: Vec<f64> = self
            .indices
            .iter()
            .map(|&idx| self.dataset.example(idx).decision())
            .collect();
        classes.sort_by(|a, b| a.partial_cmp(b).unwrap());
        classes.dedup();
        classes
    }

    pub fn sum_of_weights(&self) -> f64 {
        self.indices
            .iter()
            .map(|&idx| self.dataset.example(idx).weight())
            .sum()
    }

    /// Shuffles the view's index order in place using the given RNG.
    pub fn shuffle(&mut self, rng: &mut impl Rng) {
        self.indices.shuffle(rng);
    }

    /// Extrema of a conditional attribute over this view, ignoring `NaN`.
    /// Returns `None` when the view is empty or every value is `NaN`.
    pub fn attribute_extrema(&self, conditional_index: usize) -> Option<(f64, f64)> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut any = false;
        for &idx in &self.indices {
            let v = self.dataset.example(idx).attribute(conditional_index);
            if v.is_nan() {
                continue;
            }
            any = true;
            if v < min {
                min = v;
            }
            if v > max {
                max = v;
            }
        }
        any.then_some((min, max))
    }

    /// True if any example in this view has `attribute(conditional_index)
    /// == value` (used by the nominal candidate-generation path).
    pub fn exists_example_with_attribute_value(&self, conditional_index: usize, value: f64) -> bool {
        self.indices
            .iter()
            .any(|&idx| self.dataset.example(idx).attribute(conditional_index) == value)
    }

    /// Splits into `k` stratified folds.
    ///
    /// For each distinct class, the class's subview is shuffled and then
    /// distributed round-robin into the `k` folds using a fold counter
    /// that is **not** reset between classes (it carries over, matching
    /// the reference implementation's `createStratifiedFolds`). If
    /// `every_class_in_fold` is set and a class has fewer examples than
    /// `k`, that class's examples are cycled across all `k` folds instead
    /// (possibly duplicating an example across folds).
    pub fn stratified_folds(
        &self,
        k: usize,
        every_class_in_fold: bool,
        rng: &mut impl Rng,
    ) -> RuleInductionResult<Vec<SetOfExamples<'a>>> {
        if k <= 1 || k > self.indices.len() {
            return Err(RuleInductionError::InvalidArgument(format!(
                "fold count {k} must be in (1, {}]",
                self.indices.len()
            )));
        }
        let mut folds: Vec<Vec<usize>> = vec![Vec::new(); k];
        let mut fold_cursor = 0usize;
        for class in self.distinct_classes() {
            let mut of_class = self.filter_by_class(class);
            of_class.shuffle(rng);
            let class_size = of_class.len();
            if !every_class_in_fold || class_size >= k {
                for &idx in &of_class.indices {
                    folds[fold_cursor % k].push(idx);
                    fold_cursor += 1;
                }
            } else {
                for j in 0..k {
                    folds[j].push(of_class.indices[j % class_size]);
                }
            }
        }
        Ok(folds
            .into_iter()
            .map(|indices| SetOfExamples {
                dataset: self.dataset,
                indices,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::Attribute;
    use crate::dataset::Dataset;
    use rand::SeedableRng;

    fn sample_dataset() -> Dataset {
        let mut ds = Dataset::new(
            "t",
            Attribute::nominal("class", vec!["A".to_string(), "B".to_string()]),
        );
        ds.add_attribute(vec![1.0, 2.0, 3.0, 4.0], Attribute::numerical("x1"))
            .unwrap();
        ds.add_decision(vec![0.0, 1.0, 0.0, 1.0]).unwrap();
        ds
    }

    #[test]
    fn test_whole_view_covers_all() {
        let ds = sample_dataset();
        let view = SetOfExamples::whole(&ds);
        assert_eq!(view.len(), 4);
    }

    #[test]
    fn test_difference_is_empty_for_self() {
        let ds = sample_dataset();
        let view = SetOfExamples::whole(&ds);
        let diff = view.difference(&view);
        assert!(diff.is_empty());
    }

    #[test]
    fn test_difference_disjoint_from_subtrahend() {
        let ds = sample_dataset();
        let whole = SetOfExamples::whole(&ds);
        let a = SetOfExamples::from_indices(&ds, vec![0, 1, 2]);
        let b = SetOfExamples::from_indices(&ds, vec![1, 2]);
        let diff = whole.difference(&a);
        let reunion = diff.difference(&b);
        assert_eq!(reunion.indices(), diff.indices());
        let a_minus_b = a.difference(&b);
        for idx in a_minus_b.indices() {
            assert!(!b.indices().contains(idx));
        }
    }

    #[test]
    fn test_filter_by_class() {
        let ds = sample_dataset();
        let view = SetOfExamples::whole(&ds);
        let class_a = view.filter_by_class(0.0);
        assert_eq!(class_a.len(), 2);
    }

    #[test]
    fn test_distinct_classes_sorted() {
        let ds = sample_dataset();
        let view = SetOfExamples::whole(&ds);
        assert_eq!(view.distinct_classes(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_stratified_folds_cover_union() {
        let ds = sample_dataset();
        let view = SetOfExamples::whole(&ds);
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let folds = view.stratified_folds(2, false, &mut rng).unwrap();
        let mut all: Vec<usize> = folds.iter().flat_map(|f| f.indices().to_vec()).collect();
        all.sort_unstable();
        assert_eq!(all, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_stratified_folds_rejects_bad_k() {
        let ds = sample_dataset();
        let view = SetOfExamples::whole(&ds);
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        assert!(view.stratified_folds(1, false, &mut rng).is_err());
        assert!(view.stratified_folds(10, false, &mut rng).is_err());
    }

    #[test]
    fn test_every_class_in_fold_cycles_scarce_class() {
        let mut ds = Dataset::new(
            "t",
            Attribute::nominal("class", vec!["A".to_string(), "B".to_string()]),
        );
        ds.add_attribute(vec![1.0, 2.0, 3.0, 4.0, 5.0], Attribute::numerical("x1"))
            .unwrap();
        // class 1.0 ("B") has only a single example, fewer than k=3
        ds.add_decision(vec![0.0, 0.0, 0.0, 0.0, 1.0]).unwrap();
        let view = SetOfExamples::whole(&ds);
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let folds = view.stratified_folds(3, true, &mut rng).unwrap();
        for fold in &folds {
            assert!(fold.filter_by_class(1.0).len() >= 1);
        }
    }
}
