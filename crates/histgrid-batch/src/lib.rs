//! Extraction orchestration
//!
//! [`ExtractionEngine`] plans windows for a requested range, assembles a grid
//! per window (or one grid for the whole run) and hands each completed grid
//! to a [`GridSink`](histgrid_core::GridSink).

pub mod engine;

pub use engine::{BatchConfig, EngineError, ExtractionEngine, RunSummary};
