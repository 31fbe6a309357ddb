//! One simulation run, from the files on disk to comparable probability tensors

use crate::constants::DIR_SEP;
use crate::error::{GripError, Result};
use crate::landscape::{reconstruct, AccessibilityMask};
use crate::naming::{Artifact, RunLocation};
use crate::occupancy::{empirical_probability, theoretical_probability, total_bind_time, ProbabilityOptions};
use crate::params::RunParameters;
use crate::sites::{annotate, TargetSite};
use crate::species::{read_tf_species, TfRecord};
use crate::strand::{Kinetics, StrandLayout};
use crate::track::{read_track, PositionTrack, TrackOptions};
use log::{info, warn};
use ndarray::{Array1, Array2};
use std::path::PathBuf;

/// What the numbers in an affinity landscape file mean
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScoreKind {
    /// Log-affinities, higher is stronger (PWM scores, 0 for a perfect match)
    #[default]
    Affinity,
    /// Binding energies, lower is stronger; negated on load
    Energy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Directory that relative paths in params files (`TS_FILE`, `DNA_AVAILABILITY_FILE`) start from
    pub project_root: PathBuf,
    pub score_kind: ScoreKind,
    /// Descriptive lines before the header of track files
    pub track_skip_lines: usize,
    pub probability: ProbabilityOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            project_root: PathBuf::from("."),
            score_kind: ScoreKind::Affinity,
            track_skip_lines: 1,
            probability: ProbabilityOptions::default(),
        }
    }
}

impl PipelineConfig {
    /// Turns a `/`-separated path from a params file into a path below `project_root`
    pub fn project_path(&self, relative: &str) -> PathBuf {
        relative
            .replace('"', "")
            .split(DIR_SEP)
            .filter(|part| !part.is_empty())
            .fold(self.project_root.clone(), |acc, part| acc.join(part))
    }
}

/// Everything derived from one run
#[derive(Debug, Clone)]
pub struct RunResult {
    pub location: RunLocation,
    pub params: RunParameters,
    pub records: Vec<TfRecord>,
    pub layout: StrandLayout,
    pub kinetics: Kinetics,
    /// Landscape row names, shared by every tensor below
    pub row_names: Vec<String>,
    pub positions: Vec<i64>,
    /// Log-affinities as read (after energy conversion), before masking
    pub raw_affinity: Array2<f64>,
    /// Log-affinities after accessibility, threshold and edge masking
    pub affinity: Array2<f64>,
    pub theoretical: Array2<f64>,
    pub empirical: Array2<f64>,
    /// Bound time of each row per run
    pub total_bind_time: Array1<f64>,
    /// Rows zero-filled in the theoretical tensor
    pub degenerate_theoretical: Vec<usize>,
    /// Rows zero-filled in the empirical tensor
    pub degenerate_empirical: Vec<usize>,
    pub target_sites: Option<Vec<TargetSite>>,
}

fn format_values(values: &[f64], digits: usize) -> String {
    values
        .iter()
        .map(|v| format!("{:.*}", digits, v))
        .collect::<Vec<_>>()
        .join(", ")
}

fn load_mask(config: &PipelineConfig, params: &RunParameters, len: usize) -> Result<AccessibilityMask> {
    let configured = params
        .availability_file
        .as_deref()
        .filter(|p| !p.trim().is_empty());
    let Some(configured) = configured else {
        info!("no accessibility file, the whole chromatin is assumed to be open");
        return Ok(AccessibilityMask::fully_open(len));
    };

    let path = config.project_path(configured);
    if path.is_file() {
        AccessibilityMask::read(&path, len)
    } else {
        warn!(
            "accessibility file {} not found, the whole chromatin is assumed to be open",
            path.display()
        );
        Ok(AccessibilityMask::fully_open(len))
    }
}

/// Rearranges the series of a track into `names` order
fn align_rows(track: PositionTrack, names: &[String], what: &str) -> Result<PositionTrack> {
    if track.names == names {
        return Ok(track);
    }
    info!("{} columns {:?} reordered to {:?}", what, track.names, names);
    track.reorder(names).map_err(|_| {
        GripError::Lookup(format!(
            "{} columns {:?} do not match the TF table rows {:?}",
            what, track.names, names
        ))
    })
}

fn target_sites_path(config: &PipelineConfig, params: &RunParameters) -> Option<PathBuf> {
    params
        .target_sites_file
        .as_deref()
        .map(|p| config.project_path(p))
        .filter(|p| p.is_file())
}

/// Processes one `(dir, prefix, run_id)` triple end to end.
///
/// Reads the occupancy track, affinity landscape, TF table and params file,
/// detects the strand layout, masks the landscape and computes the theoretical
/// and empirical probability of every site. Target sites are annotated when the
/// params file points at an existing site list.
///
/// # Errors
/// Any failure aborts the run and is returned wrapped in `GripError::Run`,
/// naming the run id and directory.
pub fn process_run(location: &RunLocation, config: &PipelineConfig) -> Result<RunResult> {
    run(location, config).map_err(|e| e.in_run(&location.run_id, &location.dir))
}

fn run(location: &RunLocation, config: &PipelineConfig) -> Result<RunResult> {
    info!(
        "processing run {} (prefix {}) in {}",
        location.run_id,
        location.prefix,
        location.dir.display()
    );

    let occupancy = read_track(
        location.resolve(Artifact::Occupancy)?,
        &TrackOptions::occupancy().with_skip_lines(config.track_skip_lines),
    )?;
    let mut landscape = read_track(
        location.resolve(Artifact::Affinity)?,
        &TrackOptions::affinity().with_skip_lines(config.track_skip_lines),
    )?;
    if config.score_kind == ScoreKind::Energy {
        landscape.negate();
    }
    let records = read_tf_species(location.resolve(Artifact::TfSpecies)?)?;
    let params = RunParameters::read(location.resolve(Artifact::Params)?)?;

    info!("STOP_TIME: {}", params.stop_time);
    info!("ENSEMBLE_SIZE: {}", params.ensemble_size);

    let layout = StrandLayout::detect(records.len(), occupancy.width())?;
    check_alignment(&occupancy, &landscape, records.len(), layout)?;

    let positions = landscape.len();
    let kinetics = Kinetics::from_records(&records, layout, positions)?;
    let tf_names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    let row_names = layout.row_names(tf_names.as_slice());
    let landscape = align_rows(landscape, &row_names, "affinity landscape")?;
    let occupancy = align_rows(occupancy, &row_names, "occupancy")?;

    let mask = load_mask(config, &params, positions)?;
    let affinity = reconstruct(
        &landscape.values,
        &kinetics.footprint_size,
        &mask,
        Some(kinetics.affinity_threshold.as_slice()),
    )?;

    let bind_time = total_bind_time(&occupancy.values, params.ensemble_size);
    info!(
        "binding time of each TF on each strand: {}",
        format_values(&bind_time.to_vec(), 0)
    );
    let theoretical = theoretical_probability(&affinity, config.probability)?;
    info!(
        "log partition sum of each row: {}",
        format_values(&theoretical.log_totals, 2)
    );
    let empirical = empirical_probability(&occupancy.values, params.ensemble_size, config.probability)?;

    let target_sites = match target_sites_path(config, &params) {
        Some(path) => Some(annotate(&path, &landscape, layout, &records)?),
        None => {
            if let Some(ts) = &params.target_sites_file {
                warn!("target-site file {} not found, sites are not annotated", ts);
            }
            None
        }
    };

    Ok(RunResult {
        location: location.clone(),
        layout,
        kinetics,
        row_names,
        positions: landscape.positions.clone(),
        raw_affinity: landscape.values,
        affinity,
        theoretical: theoretical.values,
        empirical: empirical.values,
        total_bind_time: bind_time,
        degenerate_theoretical: theoretical.degenerate,
        degenerate_empirical: empirical.degenerate,
        target_sites,
        records,
        params,
    })
}

/// The occupancy and affinity tracks must describe the same rows over the same positions
fn check_alignment(
    occupancy: &PositionTrack,
    landscape: &PositionTrack,
    tf_rows: usize,
    layout: StrandLayout,
) -> Result<()> {
    if landscape.width() != tf_rows * layout.factor() {
        return Err(GripError::InconsistentStrandCount {
            tf_rows,
            track_columns: landscape.width(),
        });
    }
    if occupancy.positions != landscape.positions {
        return Err(GripError::InvalidInput(format!(
            "occupancy covers {} positions from {:?}, the landscape {} from {:?}",
            occupancy.len(),
            occupancy.positions.first(),
            landscape.len(),
            landscape.positions.first()
        )));
    }
    Ok(())
}
