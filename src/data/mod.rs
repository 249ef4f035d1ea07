/// Data layer: core types, loading, and splitting.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → (label, plat) records
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ DatasetBuilder│  label filter + feature encoding → Dataset
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  split    │  stratified shuffle → TrainTestSplit
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod split;
