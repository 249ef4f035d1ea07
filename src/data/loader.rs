use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, AsArray, StringArray};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use rand::Rng;
use serde_json::Value as JsonValue;

use super::model::{Dataset, DatasetBuilder, LoadStats};
use crate::features::FeatureEncoder;
use crate::labels::LabelTable;

/// Column holding the label code.
pub const LABEL_COLUMN: &str = "label";
/// Column holding the plate string.
pub const PLATE_COLUMN: &str = "plat";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a labeled plate dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with at least `label` and `plat` columns
/// * `.json`    – `[{ "label": "DN", "plat": "DN 1234 AB" }, ...]`
/// * `.parquet` – Utf8 `label` and `plat` columns
///
/// Rows with an unknown label or a plate without a letter prefix are skipped.
/// An empty source gives an empty dataset, not an error.
pub fn load_file<R: Rng + ?Sized>(
    path: &Path,
    labels: &LabelTable,
    encoder: FeatureEncoder,
    rng: &mut R,
) -> Result<(Dataset, LoadStats)> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let mut builder = DatasetBuilder::new(labels, encoder, rng);
    match ext.as_str() {
        "csv" => load_csv(path, &mut builder)?,
        "json" => load_json(path, &mut builder)?,
        "parquet" | "pq" => load_parquet(path, &mut builder)?,
        other => bail!("Unsupported file extension: .{other}"),
    }

    let (dataset, stats) = builder.finish();
    log::info!("Loaded {}: {stats}", path.display());
    Ok((dataset, stats))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Read CSV records from any reader. Rows with missing fields or bad
/// encoding are counted as malformed; I/O errors abort the load.
pub fn read_csv<T, R>(source: T, builder: &mut DatasetBuilder<'_, R>) -> Result<()>
where
    T: std::io::Read,
    R: Rng + ?Sized,
{
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(source);

    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    // A zero-byte file has no header row at all.
    if headers.is_empty() {
        return Ok(());
    }

    let label_idx = headers
        .iter()
        .position(|h| h == LABEL_COLUMN)
        .with_context(|| format!("CSV missing '{LABEL_COLUMN}' column"))?;
    let plate_idx = headers
        .iter()
        .position(|h| h == PLATE_COLUMN)
        .with_context(|| format!("CSV missing '{PLATE_COLUMN}' column"))?;

    for (row_no, result) in reader.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => {
                return Err(e).with_context(|| format!("CSV row {row_no}"));
            }
            Err(e) => {
                log::debug!("Skipping malformed CSV row {row_no}: {e}");
                builder.push_malformed();
                continue;
            }
        };

        match (record.get(label_idx), record.get(plate_idx)) {
            (Some(label), Some(plate)) => {
                let outcome = builder.push_record(label, plate);
                log::trace!("CSV row {row_no}: {label:?} {plate:?} -> {outcome:?}");
            }
            _ => {
                log::debug!("Skipping CSV row {row_no}: missing field");
                builder.push_malformed();
            }
        }
    }
    Ok(())
}

fn load_csv<R: Rng + ?Sized>(path: &Path, builder: &mut DatasetBuilder<'_, R>) -> Result<()> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening CSV {}", path.display()))?;
    read_csv(file, builder)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented):
///
/// ```json
/// [
///   { "label": "DN", "plat": "DN 1234 AB" },
///   { "label": "B",  "plat": "B 77 XY" }
/// ]
/// ```
///
/// Entries that are not objects, or whose fields are not strings, are malformed rows.
pub fn read_json<R: Rng + ?Sized>(text: &str, builder: &mut DatasetBuilder<'_, R>) -> Result<()> {
    if text.trim().is_empty() {
        return Ok(());
    }
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let records = root.as_array().context("Expected top-level JSON array")?;

    for (i, rec) in records.iter().enumerate() {
        let fields = rec.as_object().and_then(|obj| {
            let label = obj.get(LABEL_COLUMN)?.as_str()?;
            let plate = obj.get(PLATE_COLUMN)?.as_str()?;
            Some((label, plate))
        });
        match fields {
            Some((label, plate)) => {
                builder.push_record(label, plate);
            }
            None => {
                log::debug!("Skipping JSON row {i}: expected string '{LABEL_COLUMN}' and '{PLATE_COLUMN}'");
                builder.push_malformed();
            }
        }
    }
    Ok(())
}

fn load_json<R: Rng + ?Sized>(path: &Path, builder: &mut DatasetBuilder<'_, R>) -> Result<()> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    read_json(&text, builder)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with Utf8 (or LargeUtf8) `label` and `plat` columns.
/// Null cells are malformed rows.
fn load_parquet<R: Rng + ?Sized>(path: &Path, builder: &mut DatasetBuilder<'_, R>) -> Result<()> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let reader_builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = reader_builder.build().context("building parquet reader")?;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let label_idx = schema
            .index_of(LABEL_COLUMN)
            .map_err(|_| anyhow::anyhow!("Parquet file missing '{LABEL_COLUMN}' column"))?;
        let plate_idx = schema
            .index_of(PLATE_COLUMN)
            .map_err(|_| anyhow::anyhow!("Parquet file missing '{PLATE_COLUMN}' column"))?;

        let label_col = batch.column(label_idx);
        let plate_col = batch.column(plate_idx);

        for row in 0..batch.num_rows() {
            let label = string_cell(label_col, row, LABEL_COLUMN)?;
            let plate = string_cell(plate_col, row, PLATE_COLUMN)?;
            match (label, plate) {
                (Some(label), Some(plate)) => {
                    builder.push_record(&label, &plate);
                }
                _ => builder.push_malformed(),
            }
        }
    }
    Ok(())
}

/// Read one string cell. `None` for nulls; non-string columns are an error.
fn string_cell(col: &Arc<dyn Array>, row: usize, name: &str) -> Result<Option<String>> {
    if col.is_null(row) {
        return Ok(None);
    }
    match col.data_type() {
        DataType::Utf8 => {
            let arr = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            Ok(Some(arr.value(row).to_string()))
        }
        DataType::LargeUtf8 => {
            let arr = col.as_string::<i64>();
            Ok(Some(arr.value(row).to_string()))
        }
        other => bail!("Parquet column '{name}' is {other:?}, expected Utf8"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn load(path: &Path) -> Result<(Dataset, LoadStats)> {
        let labels = LabelTable::reference();
        let mut rng = SmallRng::seed_from_u64(0);
        load_file(path, &labels, FeatureEncoder::Exact, &mut rng)
    }

    #[test]
    fn csv_rows_are_filtered() {
        let file = write_temp(
            ".csv",
            "id,label,plat\n1,DN,DN 1234 AB\n2,B,B 99 X\n3,AB,AB 1\n4,D,1234\n5,DD\n6,D,d 5 z\n",
        );
        let (ds, stats) = load(file.path()).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.examples[0].features, [3, 13]);
        assert_eq!(ds.examples[2].label, 3);
        assert_eq!(stats.unknown_label, 1);
        assert_eq!(stats.invalid_plate, 1);
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.rows, 6);
    }

    #[test]
    fn empty_csv_gives_empty_dataset() {
        let file = write_temp(".csv", "");
        let (ds, _) = load(file.path()).unwrap();
        assert!(ds.is_empty());

        let header_only = write_temp(".csv", "label,plat\n");
        let (ds, _) = load(header_only.path()).unwrap();
        assert!(ds.is_empty());
    }

    #[test]
    fn csv_without_plate_column_is_an_error() {
        let file = write_temp(".csv", "label,plate\nDN,DN 1\n");
        let err = load(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("plat"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(&dir.path().join("nope.csv")).is_err());
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let file = write_temp(".txt", "label,plat\n");
        assert!(load(file.path()).is_err());
    }

    #[test]
    fn json_records_are_filtered() {
        let file = write_temp(
            ".json",
            r#"[
                {"label": "DD", "plat": "DD 1 A"},
                {"label": "B", "plat": 12},
                {"label": "X", "plat": "X 1"},
                "junk",
                {"label": "D", "plat": "D 7"}
            ]"#,
        );
        let (ds, stats) = load(file.path()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(stats.malformed, 2);
        assert_eq!(stats.unknown_label, 1);
    }

    #[test]
    fn json_must_be_an_array() {
        let file = write_temp(".json", r#"{"label": "D"}"#);
        assert!(load(file.path()).is_err());
    }

    #[test]
    fn parquet_rows_are_filtered() {
        let schema = Arc::new(Schema::new(vec![
            Field::new(LABEL_COLUMN, DataType::Utf8, true),
            Field::new(PLATE_COLUMN, DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec![Some("DN"), Some("B"), None, Some("D")])),
                Arc::new(StringArray::from(vec![Some("DN 1"), Some("B 2"), Some("D 3"), Some("99")])),
            ],
        )
        .unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(std::fs::File::create(file.path()).unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let (ds, stats) = load(file.path()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.invalid_plate, 1);
    }
}
