use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;

use super::model::Dataset;
use crate::config::{check_test_ratio, ConfigError};
use crate::features::FeatureVector;
use crate::labels::LabelIndex;

/// Fraction of each label held out for evaluation unless configured otherwise.
pub const DEFAULT_TEST_RATIO: f64 = 0.2;

// ---------------------------------------------------------------------------
// TrainTestSplit – the partitioned dataset
// ---------------------------------------------------------------------------

/// Training and evaluation subsets as parallel feature / label vectors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train_features: Vec<FeatureVector>,
    pub train_labels: Vec<LabelIndex>,
    pub test_features: Vec<FeatureVector>,
    pub test_labels: Vec<LabelIndex>,
}

impl TrainTestSplit {
    pub fn train_len(&self) -> usize {
        self.train_labels.len()
    }

    pub fn test_len(&self) -> usize {
        self.test_labels.len()
    }
}

/// Group example indices by label, in ascending label order.
fn indices_by_label(dataset: &Dataset) -> BTreeMap<LabelIndex, Vec<usize>> {
    let mut groups: BTreeMap<LabelIndex, Vec<usize>> = BTreeMap::new();
    for (i, ex) in dataset.examples.iter().enumerate() {
        groups.entry(ex.label).or_default().push(i);
    }
    groups
}

/// Stratified split.
///
/// Each label's indices are shuffled independently, then the first
/// `floor(n * (1 - test_ratio))` go to training and the rest to evaluation.
/// A label with a single example therefore lands in training only.
pub fn stratified_split<R: Rng + ?Sized>(
    dataset: &Dataset,
    test_ratio: f64,
    rng: &mut R,
) -> Result<TrainTestSplit, ConfigError> {
    check_test_ratio(test_ratio)?;

    let mut split = TrainTestSplit::default();
    for (label, mut indices) in indices_by_label(dataset) {
        indices.shuffle(rng);
        let n_train = ((indices.len() as f64) * (1.0 - test_ratio)).floor() as usize;
        // Every label keeps at least one training example.
        let n_train = n_train.max(1).min(indices.len());

        let (train, test) = indices.split_at(n_train);
        for &i in train {
            split.train_features.push(dataset.examples[i].features);
            split.train_labels.push(label);
        }
        for &i in test {
            split.test_features.push(dataset.examples[i].features);
            split.test_labels.push(label);
        }
        log::debug!("Label {label}: {} train, {} test", train.len(), test.len());
    }
    Ok(split)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Example;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn dataset(counts: &[(LabelIndex, usize)]) -> Dataset {
        let mut examples = Vec::new();
        for &(label, n) in counts {
            for i in 0..n {
                examples.push(Example {
                    features: [label as i32, i as i32],
                    label,
                });
            }
        }
        Dataset::from_examples(examples)
    }

    fn sorted(mut v: Vec<Example>) -> Vec<Example> {
        v.sort();
        v
    }

    fn rejoin(split: &TrainTestSplit) -> Vec<Example> {
        let train = split
            .train_features
            .iter()
            .zip(&split.train_labels)
            .map(|(&features, &label)| Example { features, label });
        let test = split
            .test_features
            .iter()
            .zip(&split.test_labels)
            .map(|(&features, &label)| Example { features, label });
        train.chain(test).collect()
    }

    #[test]
    fn every_label_reaches_evaluation() {
        let ds = dataset(&[(0, 5), (1, 12), (2, 7), (3, 30)]);
        for seed in 0..20 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let split = stratified_split(&ds, DEFAULT_TEST_RATIO, &mut rng).unwrap();
            for label in 0..4 {
                assert!(split.test_labels.contains(&label), "seed {seed}, label {label}");
                assert!(split.train_labels.contains(&label), "seed {seed}, label {label}");
            }
            assert_eq!(sorted(rejoin(&split)), sorted(ds.examples.clone()));
        }
    }

    #[test]
    fn group_sizes_follow_floor_rule() {
        let ds = dataset(&[(0, 10), (1, 7)]);
        let mut rng = SmallRng::seed_from_u64(4);
        let split = stratified_split(&ds, 0.2, &mut rng).unwrap();
        let train_of = |l| split.train_labels.iter().filter(|&&x| x == l).count();
        assert_eq!(train_of(0), 8);
        // floor(7 * 0.8) = 5
        assert_eq!(train_of(1), 5);
        assert_eq!(split.test_len(), 4);
    }

    #[test]
    fn singleton_label_goes_to_training() {
        let ds = dataset(&[(0, 1), (1, 5)]);
        let mut rng = SmallRng::seed_from_u64(9);
        let split = stratified_split(&ds, 0.2, &mut rng).unwrap();
        assert!(split.train_labels.contains(&0));
        assert!(!split.test_labels.contains(&0));
    }

    #[test]
    fn same_seed_same_partition() {
        let ds = dataset(&[(0, 8), (2, 9)]);
        let a = stratified_split(&ds, 0.25, &mut SmallRng::seed_from_u64(5)).unwrap();
        let b = stratified_split(&ds, 0.25, &mut SmallRng::seed_from_u64(5)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn zero_ratio_keeps_everything_for_training() {
        let ds = dataset(&[(0, 3)]);
        let split = stratified_split(&ds, 0.0, &mut SmallRng::seed_from_u64(1)).unwrap();
        assert_eq!(split.train_len(), 3);
        assert_eq!(split.test_len(), 0);
    }

    #[test]
    fn out_of_range_ratio_is_rejected() {
        let ds = dataset(&[(0, 3)]);
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(
            stratified_split(&ds, 1.0, &mut rng).unwrap_err(),
            ConfigError::TestRatio(1.0)
        );
        assert!(stratified_split(&ds, -0.1, &mut rng).is_err());
        assert!(stratified_split(&ds, f64::NAN, &mut rng).is_err());
    }

    #[test]
    fn empty_dataset_splits_to_nothing() {
        let split = stratified_split(&Dataset::default(), 0.2, &mut SmallRng::seed_from_u64(1)).unwrap();
        assert_eq!(split, TrainTestSplit::default());
    }
}
