//! Brute-force k-nearest-neighbours over two-slot prefix encodings.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::features::FeatureVector;
use crate::labels::LabelIndex;

/// Neighbours consulted unless configured otherwise.
pub const DEFAULT_K: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassifierError {
    #[error("training set is empty")]
    EmptyTrainingSet,
    #[error("{features} training vectors but {labels} labels")]
    LengthMismatch { features: usize, labels: usize },
}

/// One of the training points closest to a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Position in the training set.
    pub index: usize,
    pub label: LabelIndex,
    pub distance: f64,
}

/// Euclidean distance between two encodings.
pub fn euclidean(a: &FeatureVector, b: &FeatureVector) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = f64::from(x - y);
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// KNN classifier borrowing its training set.
#[derive(Debug, Clone, Copy)]
pub struct KnnClassifier<'a> {
    features: &'a [FeatureVector],
    labels: &'a [LabelIndex],
    k: usize,
}

impl<'a> KnnClassifier<'a> {
    /// `k` is clamped to `1..=features.len()`.
    pub fn new(
        features: &'a [FeatureVector],
        labels: &'a [LabelIndex],
        k: usize,
    ) -> Result<Self, ClassifierError> {
        if features.len() != labels.len() {
            return Err(ClassifierError::LengthMismatch {
                features: features.len(),
                labels: labels.len(),
            });
        }
        if features.is_empty() {
            return Err(ClassifierError::EmptyTrainingSet);
        }
        let clamped = k.clamp(1, features.len());
        if clamped != k {
            log::debug!("k={k} clamped to {clamped} for {} training points", features.len());
        }
        Ok(KnnClassifier {
            features,
            labels,
            k: clamped,
        })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn training_len(&self) -> usize {
        self.features.len()
    }

    /// The `k` closest training points, nearest first. Equal distances are
    /// ordered by training index.
    pub fn neighbors(&self, query: &FeatureVector) -> Vec<Neighbor> {
        let mut all: Vec<Neighbor> = self
            .features
            .iter()
            .zip(self.labels.iter())
            .enumerate()
            .map(|(index, (f, &label))| Neighbor {
                index,
                label,
                distance: euclidean(f, query),
            })
            .collect();

        let by_distance =
            |a: &Neighbor, b: &Neighbor| a.distance.total_cmp(&b.distance).then(a.index.cmp(&b.index));

        if self.k < all.len() {
            all.select_nth_unstable_by(self.k - 1, by_distance);
            all.truncate(self.k);
        }
        all.sort_unstable_by(by_distance);
        all
    }

    /// Majority label among the `k` nearest neighbours. Ties go to the
    /// smallest label index.
    pub fn predict(&self, query: &FeatureVector) -> LabelIndex {
        let neighbors = self.neighbors(query);
        log::trace!("query {query:?} neighbours {neighbors:?}");
        vote(&neighbors)
    }
}

/// Majority label of an already computed neighbour list.
pub fn vote(neighbors: &[Neighbor]) -> LabelIndex {
    majority_label(neighbors.iter().map(|n| n.label))
}

/// Most frequent label; the smallest index wins a tie.
fn majority_label(labels: impl Iterator<Item = LabelIndex>) -> LabelIndex {
    let mut counts: BTreeMap<LabelIndex, usize> = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_default() += 1;
    }
    counts
        .into_iter()
        .fold(None, |best: Option<(LabelIndex, usize)>, (label, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((label, count)),
        })
        .map(|(label, _)| label)
        .unwrap_or_default()
}

/// One-shot prediction without keeping a classifier around.
pub fn predict_knn(
    train_features: &[FeatureVector],
    train_labels: &[LabelIndex],
    query: &FeatureVector,
    k: usize,
) -> Result<LabelIndex, ClassifierError> {
    Ok(KnnClassifier::new(train_features, train_labels, k)?.predict(query))
}
