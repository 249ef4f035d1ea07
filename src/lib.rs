//! plate-knn: guess the region of a vehicle license plate from its letter prefix.
//!
//! Exposes the label table, feature encoder, data layer, classifier and the
//! console pipeline for use by the binaries and integration tests.

pub mod app;
pub mod config;
pub mod data;
pub mod evaluate;
pub mod features;
pub mod knn;
pub mod labels;
pub mod state;
pub mod ui;
