//! Locating the files of a simulation run on disk

use crate::constants::*;
use crate::error::{open_artifact, FileCategory, GripError, Result};
use crate::params::RunParameters;
use crate::species::{read_tf_species, TfRecord};
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// The artifacts the simulator writes for every run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Occupancy,
    Params,
    Affinity,
    TfSpecies,
}

impl Artifact {
    pub fn marker(self) -> &'static str {
        match self {
            Artifact::Occupancy => OCCUPANCY,
            Artifact::Params => PARAMS,
            Artifact::Affinity => AFFINITY,
            Artifact::TfSpecies => TF_SPECIES,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Artifact::Occupancy => OCCUPANCY_EXT,
            Artifact::Params => PARAMS_EXT,
            Artifact::Affinity => AFFINITY_EXT,
            Artifact::TfSpecies => TF_SPECIES_EXT,
        }
    }

    pub fn category(self) -> FileCategory {
        match self {
            Artifact::Occupancy => FileCategory::Occupancy,
            Artifact::Params => FileCategory::Params,
            Artifact::Affinity => FileCategory::Affinity,
            Artifact::TfSpecies => FileCategory::TfTable,
        }
    }
}

/// One simulation run: the directory holding its files, their common prefix and the run id
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunLocation {
    pub dir: PathBuf,
    pub prefix: String,
    pub run_id: String,
}

impl RunLocation {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>, run_id: impl Into<String>) -> Self {
        RunLocation {
            dir: dir.into(),
            prefix: prefix.into(),
            run_id: run_id.into(),
        }
    }

    /// Resolves the on-disk path of one of this run's artifacts
    pub fn resolve(&self, artifact: Artifact) -> Result<PathBuf> {
        resolve_artifact(&self.dir, &self.prefix, artifact, &self.run_id)
    }
}

/// Expected file name `{dir}/{prefix}{marker}{run_id}.{ext}`
pub fn artifact_path(dir: &Path, prefix: &str, artifact: Artifact, run_id: &str) -> PathBuf {
    dir.join(format!(
        "{}{}{}.{}",
        prefix,
        artifact.marker(),
        run_id,
        artifact.extension()
    ))
}

/// Finds the file of an artifact, falling back to time-stamped variants.
///
/// When the exact name is absent, every file in `dir` that starts with
/// `prefix + marker` and ends with `_run_id.ext` is a candidate. Several candidates
/// are reported as ambiguous; the lexicographically smallest one without the
/// legacy `0.0s` stamp wins, or the smallest one overall if all carry it.
///
/// # Errors
/// * `GripError::FileNotFound` - If neither the exact name nor any variant exists
pub fn resolve_artifact(dir: &Path, prefix: &str, artifact: Artifact, run_id: &str) -> Result<PathBuf> {
    let exact = artifact_path(dir, prefix, artifact, run_id);
    if exact.is_file() {
        return Ok(exact);
    }

    let start = format!("{}{}", prefix, artifact.marker());
    let end = format!("_{}.{}", run_id, artifact.extension());
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Err(GripError::file_not_found(exact, artifact.category())),
    };
    let candidates: BTreeSet<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| name.starts_with(&start) && name.ends_with(&end))
        .collect();

    if candidates.len() > 1 {
        warn!(
            "more than one {} file for run {} in {}: {:?}",
            artifact.category(),
            run_id,
            dir.display(),
            candidates
        );
    }

    let chosen = candidates
        .iter()
        .find(|name| !name.contains(LEGACY_ZERO_DURATION))
        .or_else(|| candidates.iter().next());

    match chosen {
        Some(name) => {
            debug!("resolved {} file for run {} to {}", artifact.category(), run_id, name);
            Ok(dir.join(name))
        }
        None => Err(GripError::file_not_found(exact, artifact.category())),
    }
}

/// Run id of an output file: the text after the last `_`, without its extension
pub fn run_id_of(file_name: &str) -> Option<&str> {
    let (_, tail) = file_name.rsplit_once('_')?;
    let id = tail.split('.').next().unwrap_or(tail);
    (!id.is_empty()).then_some(id)
}

fn location_of(path: &Path) -> Option<RunLocation> {
    let name = path.file_name()?.to_str()?;
    let (prefix, _) = name.split_once(PARAMS)?;
    let run_id = run_id_of(name)?;
    Some(RunLocation::new(
        path.parent().unwrap_or_else(|| Path::new("")),
        prefix,
        run_id,
    ))
}

/// Every run found below `root`, at any depth, identified by its params file.
///
/// # Errors
/// * `GripError::FileNotFound` - If `root` is not a directory
pub fn discover_runs(root: impl AsRef<Path>) -> Result<Vec<RunLocation>> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(GripError::file_not_found(root, FileCategory::Params));
    }

    let runs: BTreeSet<RunLocation> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| location_of(e.path()))
        .collect();

    Ok(runs.into_iter().collect())
}

/// Runs below `root` whose id is in `ids`
pub fn discover_runs_by_ids(root: impl AsRef<Path>, ids: &[String]) -> Result<Vec<RunLocation>> {
    Ok(discover_runs(root)?
        .into_iter()
        .filter(|run| ids.contains(&run.run_id))
        .collect())
}

/// Runs below `root` whose params satisfy `params_filter` and whose TF table
/// satisfies `tf_filter`.
///
/// The TF table is only read for runs that pass `params_filter`. A run without a
/// TF table is skipped with a warning.
///
/// # Errors
/// * `GripError::FileNotFound` - If `root` is not a directory
/// * `GripError::Run` - If the params file or TF table of a run cannot be parsed
pub fn discover_runs_matching<P, T>(
    root: impl AsRef<Path>,
    params_filter: P,
    tf_filter: T,
) -> Result<Vec<RunLocation>>
where
    P: Fn(&RunParameters) -> bool,
    T: Fn(&[TfRecord]) -> bool,
{
    let mut selected = Vec::new();
    for run in discover_runs(root)? {
        let in_run = |e: GripError| e.in_run(&run.run_id, &run.dir);
        let params = RunParameters::read(run.resolve(Artifact::Params).map_err(in_run)?).map_err(in_run)?;
        if !params_filter(&params) {
            continue;
        }
        let tf_file = match run.resolve(Artifact::TfSpecies) {
            Ok(path) => path,
            Err(_) => {
                warn!("no TF table for run {} in {}, skipped", run.run_id, run.dir.display());
                continue;
            }
        };
        let records = read_tf_species(tf_file).map_err(in_run)?;
        if tf_filter(&records) {
            selected.push(run);
        }
    }
    info!("{} runs match the filters", selected.len());
    Ok(selected)
}

/// A batch of runs listed by id, each simulated with one value of a swept parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdList {
    pub param_name: String,
    pub param_values: Vec<String>,
    pub ids: Vec<String>,
}

fn split_list_line(line: &str) -> Option<(String, Vec<String>)> {
    let (name, values) = line.trim().split_once('=')?;
    let values = values
        .split(',')
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();
    Some((name.trim().to_string(), values))
}

/// Reads an id-list file: leading `#` comment lines, then `PARAM = v1, v2, ...`
/// followed by `IDS = id1, id2, ...`.
///
/// # Errors
/// * `GripError::FileNotFound` - If the file does not exist
/// * `GripError::MalformedFile` - If either list line is missing or has no `=`
pub fn read_id_list(path: impl AsRef<Path>) -> Result<IdList> {
    let path = path.as_ref();
    let reader = BufReader::new(open_artifact(path, FileCategory::Params)?);
    let lines = reader.lines().collect::<std::io::Result<Vec<_>>>()?;
    let first = lines
        .iter()
        .position(|l| !l.trim_start().starts_with('#'))
        .unwrap_or(lines.len());

    let (param_name, param_values) = lines
        .get(first)
        .and_then(|l| split_list_line(l))
        .ok_or_else(|| GripError::malformed(path, first + 1, "expected PARAM = values"))?;
    let (_, ids) = lines
        .get(first + 1)
        .and_then(|l| split_list_line(l))
        .ok_or_else(|| GripError::malformed(path, first + 2, "expected IDS = ids"))?;

    Ok(IdList {
        param_name,
        param_values,
        ids,
    })
}
