//! Accuracy of the classifier on the held-out split.

use std::collections::BTreeMap;
use std::fmt;

use crate::features::FeatureVector;
use crate::knn::KnnClassifier;
use crate::labels::{LabelIndex, LabelTable};

/// Correct / total counts for one label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabelScore {
    pub correct: usize,
    pub total: usize,
}

impl LabelScore {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64 * 100.0
        }
    }
}

/// Result of scoring the evaluation set.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// The evaluation set was empty, so no accuracy exists.
    NoData,
    Scored {
        correct: usize,
        total: usize,
        per_label: BTreeMap<LabelIndex, LabelScore>,
    },
}

impl Evaluation {
    /// Overall accuracy in percent, `None` without evaluation data.
    pub fn accuracy(&self) -> Option<f64> {
        match self {
            Evaluation::NoData => None,
            Evaluation::Scored { correct, total, .. } => Some(*correct as f64 / *total as f64 * 100.0),
        }
    }

    /// Per-label lines (`  DN (Sulawesi Tengah): 4/5 (80.00%)`) in label order.
    pub fn breakdown(&self, labels: &LabelTable) -> Vec<String> {
        let Evaluation::Scored { per_label, .. } = self else {
            return Vec::new();
        };
        per_label
            .iter()
            .map(|(&index, score)| {
                let name = match labels.get(index) {
                    Some(l) => format!("{} ({})", l.code, l.region),
                    None => format!("#{index}"),
                };
                format!(
                    "  {name}: {}/{} ({:.2}%)",
                    score.correct,
                    score.total,
                    score.percentage()
                )
            })
            .collect()
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.accuracy() {
            Some(acc) => write!(f, "Model accuracy on test data: {acc:.2}%"),
            None => write!(f, "No evaluation data: not enough examples to measure accuracy."),
        }
    }
}

/// Classify every evaluation vector and count exact label matches.
pub fn evaluate(
    classifier: &KnnClassifier<'_>,
    test_features: &[FeatureVector],
    test_labels: &[LabelIndex],
) -> Evaluation {
    if test_features.is_empty() || test_labels.is_empty() {
        return Evaluation::NoData;
    }

    let mut correct = 0;
    let mut total = 0;
    let mut per_label: BTreeMap<LabelIndex, LabelScore> = BTreeMap::new();

    for (features, &expected) in test_features.iter().zip(test_labels) {
        let predicted = classifier.predict(features);
        let score = per_label.entry(expected).or_default();
        score.total += 1;
        total += 1;
        if predicted == expected {
            score.correct += 1;
            correct += 1;
        } else {
            log::debug!("Misclassified {features:?}: expected {expected}, got {predicted}");
        }
    }

    Evaluation::Scored {
        correct,
        total,
        per_label,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEATURES: [FeatureVector; 4] = [[0, 13], [3, 3], [1, 0], [3, 0]];
    const LABELS: [LabelIndex; 4] = [0, 1, 2, 3];

    #[test]
    fn empty_evaluation_set_has_no_accuracy() {
        let clf = KnnClassifier::new(&FEATURES, &LABELS, 1).unwrap();
        let eval = evaluate(&clf, &[], &[]);
        assert_eq!(eval, Evaluation::NoData);
        assert_eq!(eval.accuracy(), None);
        assert!(eval.to_string().starts_with("No evaluation data"));
        assert!(eval.breakdown(&LabelTable::reference()).is_empty());
    }

    #[test]
    fn counts_exact_matches() {
        let clf = KnnClassifier::new(&FEATURES, &LABELS, 1).unwrap();
        // last query sits on DD but is labelled D
        let eval = evaluate(&clf, &[[0, 12], [1, 1], [3, 3]], &[0, 2, 3]);
        let Evaluation::Scored { correct, total, per_label } = &eval else {
            panic!("expected a score");
        };
        assert_eq!((*correct, *total), (2, 3));
        assert_eq!(per_label[&3], LabelScore { correct: 0, total: 1 });
        assert_eq!(eval.to_string(), "Model accuracy on test data: 66.67%");
    }

    #[test]
    fn breakdown_names_labels() {
        let clf = KnnClassifier::new(&FEATURES, &LABELS, 1).unwrap();
        let eval = evaluate(&clf, &[[0, 13], [1, 0]], &[0, 2]);
        let lines = eval.breakdown(&LabelTable::reference());
        assert_eq!(
            lines,
            vec![
                "  DN (Sulawesi Tengah): 1/1 (100.00%)".to_string(),
                "  B (DKI Jakarta): 1/1 (100.00%)".to_string(),
            ]
        );
    }
}
