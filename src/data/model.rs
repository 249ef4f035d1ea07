use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;

use crate::features::{FeatureEncoder, FeatureVector};
use crate::labels::{LabelIndex, LabelTable};

// ---------------------------------------------------------------------------
// Example – one labeled plate
// ---------------------------------------------------------------------------

/// An encoded plate prefix and the index of its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Example {
    pub features: FeatureVector,
    pub label: LabelIndex,
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// All examples that survived filtering, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    pub examples: Vec<Example>,
}

impl Dataset {
    pub fn from_examples(examples: Vec<Example>) -> Self {
        Dataset { examples }
    }

    /// Number of examples.
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Number of examples per label index.
    pub fn label_counts(&self) -> BTreeMap<LabelIndex, usize> {
        let mut counts = BTreeMap::new();
        for ex in &self.examples {
            *counts.entry(ex.label).or_default() += 1;
        }
        counts
    }
}

// ---------------------------------------------------------------------------
// Row filtering shared by every source format
// ---------------------------------------------------------------------------

/// Outcome of offering one source record to a [`DatasetBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Kept,
    UnknownLabel,
    InvalidPlate,
}

/// Counters collected while loading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub rows: usize,
    pub kept: usize,
    pub unknown_label: usize,
    pub invalid_plate: usize,
    pub malformed: usize,
}

impl fmt::Display for LoadStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows read, {} kept ({} unknown label, {} unparsable plate, {} malformed)",
            self.rows, self.kept, self.unknown_label, self.invalid_plate, self.malformed
        )
    }
}

/// Applies the label filter and feature encoder to raw `(label, plat)` records.
pub struct DatasetBuilder<'a, R: Rng + ?Sized> {
    labels: &'a LabelTable,
    encoder: FeatureEncoder,
    rng: &'a mut R,
    examples: Vec<Example>,
    stats: LoadStats,
}

impl<'a, R: Rng + ?Sized> DatasetBuilder<'a, R> {
    pub fn new(labels: &'a LabelTable, encoder: FeatureEncoder, rng: &'a mut R) -> Self {
        DatasetBuilder {
            labels,
            encoder,
            rng,
            examples: Vec::new(),
            stats: LoadStats::default(),
        }
    }

    /// Offer one record. The label must match a configured code exactly.
    pub fn push_record(&mut self, label: &str, plate: &str) -> RowOutcome {
        self.stats.rows += 1;

        let Some(label) = self.labels.index_of(label) else {
            self.stats.unknown_label += 1;
            return RowOutcome::UnknownLabel;
        };

        let Some(features) = self.encoder.encode(plate, &mut *self.rng) else {
            self.stats.invalid_plate += 1;
            return RowOutcome::InvalidPlate;
        };

        self.examples.push(Example { features, label });
        self.stats.kept += 1;
        RowOutcome::Kept
    }

    /// Record a row that could not be decoded at all.
    pub fn push_malformed(&mut self) {
        self.stats.rows += 1;
        self.stats.malformed += 1;
    }

    pub fn stats(&self) -> LoadStats {
        self.stats
    }

    pub fn finish(self) -> (Dataset, LoadStats) {
        (Dataset::from_examples(self.examples), self.stats)
    }
}
