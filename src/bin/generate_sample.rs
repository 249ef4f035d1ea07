use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::StringArray;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::ArrowWriter;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use plate_knn::data::loader::{LABEL_COLUMN, PLATE_COLUMN};
use plate_knn::labels::LabelTable;

/// Write a synthetic labeled plate dataset.
#[derive(Parser, Debug)]
#[command(name = "generate_sample", long_about = None)]
struct Args {
    /// Output file; `.parquet` writes Parquet, anything else CSV
    #[arg(default_value = "dataset_manual.csv")]
    output: PathBuf,

    /// Plates generated for each configured label
    #[arg(long, default_value_t = 50)]
    rows_per_label: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// `DN 1234 AB` style plate: prefix, 1–4 digits, 0–3 suffix letters.
fn random_plate(prefix: &str, rng: &mut SmallRng) -> String {
    let number: u32 = rng.gen_range(1..=9999);
    let suffix_len = rng.gen_range(0..=3);
    let suffix: String = (0..suffix_len)
        .map(|_| char::from(rng.gen_range(b'A'..=b'Z')))
        .collect();
    if suffix.is_empty() {
        format!("{prefix} {number}")
    } else {
        format!("{prefix} {number} {suffix}")
    }
}

/// Rows for every label plus a few the loader should skip.
fn generate_rows(labels: &LabelTable, rows_per_label: usize, rng: &mut SmallRng) -> Vec<(String, String)> {
    let mut rows = Vec::with_capacity(labels.len() * rows_per_label + 4);
    for label in labels.iter() {
        for _ in 0..rows_per_label {
            rows.push((label.code.clone(), random_plate(&label.code, rng)));
        }
    }

    // Unknown label and prefix-less plates exercise the skip paths.
    rows.push(("AB".to_string(), random_plate("AB", rng)));
    rows.push(("L".to_string(), random_plate("L", rng)));
    for label in labels.iter().take(2) {
        rows.push((label.code.clone(), rng.gen_range(1000..=9999).to_string()));
    }

    rows.shuffle(rng);
    rows
}

fn write_csv(path: &Path, rows: &[(String, String)]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    writer.write_record([LABEL_COLUMN, PLATE_COLUMN])?;
    for (label, plate) in rows {
        writer.write_record([label, plate])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, rows: &[(String, String)]) -> Result<()> {
    let label_array = StringArray::from(rows.iter().map(|(l, _)| l.as_str()).collect::<Vec<_>>());
    let plate_array = StringArray::from(rows.iter().map(|(_, p)| p.as_str()).collect::<Vec<_>>());

    let schema = Arc::new(Schema::new(vec![
        Field::new(LABEL_COLUMN, DataType::Utf8, false),
        Field::new(PLATE_COLUMN, DataType::Utf8, false),
    ]));
    let batch = RecordBatch::try_new(schema.clone(), vec![Arc::new(label_array), Arc::new(plate_array)])
        .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating Parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing Parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let labels = LabelTable::reference();
    let mut rng = SmallRng::seed_from_u64(args.seed);
    let rows = generate_rows(&labels, args.rows_per_label, &mut rng);

    let is_parquet = args
        .output
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("parquet") || e.eq_ignore_ascii_case("pq"));
    if is_parquet {
        write_parquet(&args.output, &rows)?;
    } else {
        write_csv(&args.output, &rows)?;
    }

    log::info!("Generated with seed {}", args.seed);
    println!("Wrote {} rows to {}", rows.len(), args.output.display());
    Ok(())
}
