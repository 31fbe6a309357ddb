//! Affinity-to-occupancy inference for GRiP transcription factor binding simulations

pub mod compare;
pub mod constants;
pub mod error;
pub mod landscape;
pub mod motif;
pub mod naming;
pub mod occupancy;
pub mod params;
pub mod pipeline;
pub mod sites;
pub mod species;
pub mod strand;
pub mod table;
pub mod track;

pub use error::{GripError, Result};
pub use pipeline::{process_run, PipelineConfig, RunResult, ScoreKind};
