use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use plate_knn::app::PlateApp;
use plate_knn::config::{RunConfig, DEFAULT_DATASET};
use plate_knn::data::split::DEFAULT_TEST_RATIO;
use plate_knn::features::FeatureEncoder;
use plate_knn::knn::DEFAULT_K;
use plate_knn::labels::LabelTable;

/// Classify license plates by region from their letter prefix.
#[derive(Parser, Debug)]
#[command(name = "plate-knn", version, long_about = None)]
struct Args {
    /// Labeled dataset (.csv, .json or .parquet) with `label` and `plat` columns
    #[arg(default_value = DEFAULT_DATASET)]
    dataset: PathBuf,

    /// Number of neighbours consulted per prediction
    #[arg(short = 'k', long = "neighbors", default_value_t = DEFAULT_K)]
    k: usize,

    /// Fraction of each label held out for evaluation
    #[arg(long, default_value_t = DEFAULT_TEST_RATIO)]
    test_ratio: f64,

    /// Seed for feature noise and shuffling (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// JSON label table replacing the built-in DN/DD/B/D regions
    #[arg(long)]
    labels: Option<PathBuf>,

    /// Encode dataset rows without random perturbation
    #[arg(long, default_value_t = false)]
    no_noise: bool,

    /// Enable verbose logging
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> Result<RunConfig> {
        let labels = match &self.labels {
            Some(path) => LabelTable::from_json_file(path)?,
            None => LabelTable::reference(),
        };
        Ok(RunConfig {
            dataset: self.dataset,
            k: self.k,
            test_ratio: self.test_ratio,
            seed: self.seed,
            encoder: if self.no_noise {
                FeatureEncoder::Exact
            } else {
                FeatureEncoder::Noisy
            },
            labels,
        })
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if args.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    let config = args.into_config()?;
    log::debug!("Running with {config:?}");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    PlateApp::new(config).run(stdin.lock(), &mut out)?;
    Ok(())
}
