use std::fmt;

use crate::features::{extract_features, is_valid_features, is_valid_prefix};
use crate::knn::{vote, KnnClassifier};
use crate::labels::LabelTable;

/// Input that ends the prediction loop (compared case-insensitively).
pub const EXIT_COMMAND: &str = "EXIT";

// ---------------------------------------------------------------------------
// Predictor state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictorState {
    AwaitingInput,
    Terminated,
}

/// What the predictor has to say about one line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// The exit command was entered; nothing is printed.
    Exit,
    UnknownPrefix { accepted: String },
    UnparsablePlate,
    Prediction {
        plate: String,
        code: String,
        region: String,
    },
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Exit => Ok(()),
            Response::UnknownPrefix { accepted } => {
                write!(f, "Unrecognized plate prefix. Only {accepted} are accepted.")
            }
            Response::UnparsablePlate => write!(f, "Plate number format not recognized."),
            Response::Prediction {
                plate,
                code,
                region,
            } => write!(f, "Plate: {plate} -> predicted origin: {code} ({region})"),
        }
    }
}

/// The interactive predictor, independent of where lines come from.
///
/// Starts in [`PredictorState::AwaitingInput`] and only ever moves to
/// [`PredictorState::Terminated`].
pub struct PredictorSession<'a> {
    labels: &'a LabelTable,
    classifier: KnnClassifier<'a>,
    state: PredictorState,
    predictions: usize,
}

impl<'a> PredictorSession<'a> {
    pub fn new(labels: &'a LabelTable, classifier: KnnClassifier<'a>) -> Self {
        Self {
            labels,
            classifier,
            state: PredictorState::AwaitingInput,
            predictions: 0,
        }
    }

    pub fn state(&self) -> PredictorState {
        self.state
    }

    pub fn is_terminated(&self) -> bool {
        self.state == PredictorState::Terminated
    }

    /// Number of successful predictions so far.
    pub fn predictions(&self) -> usize {
        self.predictions
    }

    /// Input ran out without an exit command.
    pub fn end_of_input(&mut self) {
        self.state = PredictorState::Terminated;
    }

    /// Process one raw input line.
    pub fn handle_line(&mut self, line: &str) -> Response {
        let plate = line.trim().to_ascii_uppercase();
        if plate == EXIT_COMMAND {
            self.state = PredictorState::Terminated;
            return Response::Exit;
        }

        if !is_valid_prefix(&plate, self.labels) {
            return Response::UnknownPrefix {
                accepted: self.labels.describe_codes(),
            };
        }

        let features = extract_features(&plate);
        if !is_valid_features(&features) {
            return Response::UnparsablePlate;
        }

        let neighbors = self.classifier.neighbors(&features);
        log::debug!("{plate}: features {features:?}, neighbours {neighbors:?}");
        let predicted = vote(&neighbors);
        let Some(label) = self.labels.get(predicted) else {
            log::warn!("predicted label {predicted} is missing from the label table");
            return Response::UnparsablePlate;
        };

        self.predictions += 1;
        Response::Prediction {
            plate,
            code: label.code.clone(),
            region: label.region.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureVector;
    use crate::features::PADDING_SLOT;
    use crate::labels::LabelIndex;

    const FEATURES: [FeatureVector; 4] = [[3, 13], [3, 3], [PADDING_SLOT, 1], [PADDING_SLOT, 3]];
    const LABELS: [LabelIndex; 4] = [0, 1, 2, 3];

    fn session(labels: &LabelTable) -> PredictorSession<'_> {
        let clf = KnnClassifier::new(&FEATURES, &LABELS, 1).unwrap();
        PredictorSession::new(labels, clf)
    }

    #[test]
    fn exit_terminates_in_any_case() {
        let labels = LabelTable::reference();
        for word in ["exit", "EXIT", "  Exit \n"] {
            let mut s = session(&labels);
            assert_eq!(s.state(), PredictorState::AwaitingInput);
            assert_eq!(s.handle_line(word), Response::Exit);
            assert!(s.is_terminated());
            assert_eq!(s.predictions(), 0);
        }
    }

    #[test]
    fn unknown_prefix_keeps_waiting() {
        let labels = LabelTable::reference();
        let mut s = session(&labels);
        let r = s.handle_line("XY 999");
        assert_eq!(
            r,
            Response::UnknownPrefix {
                accepted: "DN, DD, B, D".into()
            }
        );
        assert_eq!(s.state(), PredictorState::AwaitingInput);
        assert!(matches!(s.handle_line(""), Response::UnknownPrefix { .. }));
        assert!(matches!(s.handle_line("1234"), Response::UnknownPrefix { .. }));
    }

    #[test]
    fn valid_plate_is_classified() {
        let labels = LabelTable::reference();
        let mut s = session(&labels);
        let r = s.handle_line(" dn 1234 ab ");
        assert_eq!(
            r,
            Response::Prediction {
                plate: "DN 1234 AB".into(),
                code: "DN".into(),
                region: "Sulawesi Tengah".into(),
            }
        );
        assert_eq!(r.to_string(), "Plate: DN 1234 AB -> predicted origin: DN (Sulawesi Tengah)");

        let r = s.handle_line("B 1 CD");
        assert!(matches!(r, Response::Prediction { ref code, .. } if code == "B"));
        assert_eq!(s.predictions(), 2);
        assert!(!s.is_terminated());
    }

    #[test]
    fn label_outside_table_is_not_counted() {
        let labels = LabelTable::reference();
        let features = [[3, 13]];
        let stray = [9];
        let clf = KnnClassifier::new(&features, &stray, 1).unwrap();
        let mut s = PredictorSession::new(&labels, clf);
        assert_eq!(s.handle_line("DN 1"), Response::UnparsablePlate);
        assert_eq!(s.predictions(), 0);
        assert!(!s.is_terminated());
    }

    #[test]
    fn end_of_input_terminates() {
        let labels = LabelTable::reference();
        let mut s = session(&labels);
        s.end_of_input();
        assert!(s.is_terminated());
    }

    #[test]
    fn exit_response_prints_nothing() {
        assert_eq!(Response::Exit.to_string(), "");
    }
}
