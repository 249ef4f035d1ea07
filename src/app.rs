use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::config::RunConfig;
use crate::data::loader::load_file;
use crate::data::split::stratified_split;
use crate::evaluate::{evaluate, Evaluation};
use crate::knn::KnnClassifier;
use crate::state::PredictorSession;
use crate::ui::{prompt, report};

// ---------------------------------------------------------------------------
// Pipeline driver
// ---------------------------------------------------------------------------

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Nothing survived filtering; no model was built.
    EmptyDataset,
    Completed {
        evaluation: Evaluation,
        predictions: usize,
    },
}

/// Load → split → evaluate → interactive prompt.
pub struct PlateApp {
    pub config: RunConfig,
}

impl PlateApp {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    fn rng(&self) -> SmallRng {
        match self.config.seed {
            Some(seed) => {
                log::info!("Using fixed seed {seed}");
                SmallRng::seed_from_u64(seed)
            }
            None => SmallRng::from_entropy(),
        }
    }

    /// Run the whole pipeline, reading queries from `input`.
    pub fn run<R: BufRead, W: Write>(&self, input: R, out: &mut W) -> Result<RunOutcome> {
        let cfg = &self.config;
        cfg.validate()?;
        let mut rng = self.rng();

        report::loading(out, &cfg.dataset)?;
        let (dataset, _stats) = load_file(&cfg.dataset, &cfg.labels, cfg.encoder, &mut rng)
            .with_context(|| format!("loading dataset {}", cfg.dataset.display()))?;

        if dataset.is_empty() {
            log::warn!("No usable rows in {}", cfg.dataset.display());
            writeln!(out, "{}", report::EMPTY_DATASET)?;
            return Ok(RunOutcome::EmptyDataset);
        }
        for (label, count) in dataset.label_counts() {
            log::info!("  {}: {count} examples", cfg.labels.code(label).unwrap_or("?"));
        }

        let split = stratified_split(&dataset, cfg.test_ratio, &mut rng)?;
        log::info!(
            "Split {} examples into {} train / {} test (k={})",
            dataset.len(),
            split.train_len(),
            split.test_len(),
            cfg.k
        );

        writeln!(out, "{}", report::TRAINING)?;
        let classifier = KnnClassifier::new(&split.train_features, &split.train_labels, cfg.k)?;
        let evaluation = evaluate(&classifier, &split.test_features, &split.test_labels);
        report::evaluation(out, &evaluation, &cfg.labels)?;

        writeln!(out, "\n{}", report::MANUAL_TEST)?;
        let mut session = PredictorSession::new(&cfg.labels, classifier);
        prompt::run_prompt(&mut session, input, out)?;

        Ok(RunOutcome::Completed {
            evaluation,
            predictions: session.predictions(),
        })
    }
}
