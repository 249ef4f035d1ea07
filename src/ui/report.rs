use std::io::{self, Write};
use std::path::Path;

use crate::evaluate::Evaluation;
use crate::labels::LabelTable;

// ---------------------------------------------------------------------------
// Status lines
// ---------------------------------------------------------------------------

pub const EMPTY_DATASET: &str = "No data found or the file format is wrong.";
pub const TRAINING: &str = "Training and testing model...";
pub const MANUAL_TEST: &str = "Manual plate number test:";

pub fn loading(out: &mut impl Write, path: &Path) -> io::Result<()> {
    writeln!(out, "Reading data from '{}'...", path.display())
}

/// Headline accuracy followed by the per-label breakdown.
pub fn evaluation(out: &mut impl Write, eval: &Evaluation, labels: &LabelTable) -> io::Result<()> {
    writeln!(out, "\n{eval}")?;
    for line in eval.breakdown(labels) {
        writeln!(out, "{line}")?;
    }
    Ok(())
}
