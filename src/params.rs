use crate::constants::*;
use crate::error::{open_artifact, FileCategory, GripError, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Reads a `KEY = VALUE;` parameters file into a map.
///
/// Blank lines and lines starting with `#` are ignored. The value is everything
/// after the first `=`, with the trailing `;` removed, whitespace trimmed and
/// quote characters stripped.
///
/// # Errors
/// * `GripError::FileNotFound` - If the file does not exist
/// * `GripError::MalformedFile` - If a line has no `=` or an empty key
pub fn read_params(path: impl AsRef<Path>) -> Result<BTreeMap<String, String>> {
    let path = path.as_ref();
    let reader = BufReader::new(open_artifact(path, FileCategory::Params)?);
    let mut params = BTreeMap::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| GripError::malformed(path, idx + 1, "expected `KEY = VALUE;`"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(GripError::malformed(path, idx + 1, "empty parameter name"));
        }
        params.insert(key.to_string(), normalize_value(value));
    }

    Ok(params)
}

fn normalize_value(raw: &str) -> String {
    raw.trim()
        .trim_end_matches(';')
        .replace('"', "")
        .trim()
        .to_string()
}

/// Writes a map as a `KEY = VALUE;` parameters file, one entry per line in key order
pub fn write_params(path: impl AsRef<Path>, params: &BTreeMap<String, String>) -> Result<()> {
    let mut out = BufWriter::new(File::create(path.as_ref())?);
    for (key, value) in params {
        writeln!(out, "{} = {};", key, value)?;
    }
    out.flush()?;
    Ok(())
}

/// Typed view over the parameters of one simulation run
#[derive(Debug, Clone, PartialEq)]
pub struct RunParameters {
    /// Total simulated time
    pub stop_time: f64,
    /// Number of replicate simulations aggregated into the output files
    pub ensemble_size: usize,
    pub target_sites_file: Option<String>,
    pub availability_file: Option<String>,
    pub raw: BTreeMap<String, String>,
}

impl RunParameters {
    pub fn from_map(raw: BTreeMap<String, String>) -> Result<Self> {
        let stop_time = required(&raw, TOTAL_SIM_TIME)?;
        let stop_time: f64 = stop_time.parse().map_err(|_| {
            GripError::invalid_parameter(TOTAL_SIM_TIME, stop_time, "expected a number")
        })?;

        let (ensemble_key, ensemble_value) = match raw.get(ENSEMBLE_SIZE) {
            Some(v) => (ENSEMBLE_SIZE, v),
            None => (
                ENSEMBLE_SIZE_LEGACY,
                required(&raw, ENSEMBLE_SIZE_LEGACY)
                    .map_err(|_| GripError::Lookup(format!("missing parameter {}", ENSEMBLE_SIZE)))?,
            ),
        };
        let ensemble_size = match ensemble_value.parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => {
                return Err(GripError::invalid_parameter(
                    ensemble_key,
                    ensemble_value,
                    "expected a positive integer",
                ))
            }
        };

        let optional = |key: &str| raw.get(key).filter(|v| !v.is_empty()).cloned();

        Ok(RunParameters {
            stop_time,
            ensemble_size,
            target_sites_file: optional(TS_FILE),
            availability_file: optional(BTRACK),
            raw,
        })
    }

    /// Reads and validates a params file
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_map(read_params(path)?)
    }
}

fn required<'a>(raw: &'a BTreeMap<String, String>, key: &str) -> Result<&'a String> {
    raw.get(key)
        .ok_or_else(|| GripError::Lookup(format!("missing parameter {}", key)))
}
