use crate::error::{open_artifact, FileCategory, GripError, Result};
use log::warn;
use ndarray::{Array2, Axis};
use std::io::Read;
use std::path::Path;

/// Per-position chromatin accessibility; `true` means the basepair can be bound
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessibilityMask {
    open: Vec<bool>,
}

impl AccessibilityMask {
    pub fn new(open: Vec<bool>) -> Self {
        AccessibilityMask { open }
    }

    /// Every position open
    pub fn fully_open(len: usize) -> Self {
        AccessibilityMask {
            open: vec![true; len],
        }
    }

    pub fn fully_closed(len: usize) -> Self {
        AccessibilityMask {
            open: vec![false; len],
        }
    }

    /// Reads a `.btrack` file of whitespace-separated integers, nonzero meaning open.
    ///
    /// Only the first `len` entries are used.
    ///
    /// # Errors
    /// * `GripError::FileNotFound` - If the file does not exist
    /// * `GripError::MalformedFile` - If a token is not an integer or there are
    ///   fewer than `len` entries
    pub fn read(path: impl AsRef<Path>, len: usize) -> Result<Self> {
        let path = path.as_ref();
        let mut text = String::new();
        open_artifact(path, FileCategory::Accessibility)?.read_to_string(&mut text)?;

        let mut open = Vec::with_capacity(len);
        for (idx, line) in text.lines().enumerate() {
            for token in line.split_whitespace() {
                let value: i64 = token.parse().map_err(|_| {
                    GripError::malformed(path, idx + 1, format!("invalid accessibility value: {}", token))
                })?;
                open.push(value != 0);
            }
        }

        if open.len() < len {
            return Err(GripError::malformed(
                path,
                text.lines().count(),
                format!("{} entries for {} positions", open.len(), len),
            ));
        }
        if open.len() > len {
            warn!(
                "{} has {} entries, only the first {} are used",
                path.display(),
                open.len(),
                len
            );
            open.truncate(len);
        }
        Ok(AccessibilityMask { open })
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    pub fn is_open(&self, position: usize) -> bool {
        self.open.get(position).copied().unwrap_or(false)
    }

    /// True if every position of `[start, start + size)` is open
    pub fn is_window_open(&self, start: usize, size: usize) -> bool {
        start + size <= self.open.len() && self.open[start..start + size].iter().all(|&o| o)
    }
}

/// Builds the masked log-affinity landscape.
///
/// For every row `i` (a TF, or a TF strand) and every start position `p`:
/// * if `[p, p + sizes[i])` touches a closed position the value becomes `-inf`;
/// * otherwise the value is floored at `thresholds[i]` (`max(value, threshold)`),
///   where a `-inf` threshold leaves it unchanged;
/// * the last `sizes[i] - 1` positions are `-inf`, since a footprint cannot start there.
///
/// # Arguments
/// * `raw` - Log-affinities shaped (rows × positions)
/// * `sizes` - Footprint size of each row, at least 1
/// * `mask` - Accessibility of each position
/// * `thresholds` - Optional per-row lower bound; `None` means no thresholding
///
/// # Errors
/// * `GripError::InvalidInput` - If the vector lengths do not match the landscape
///   or a footprint size is zero
pub fn reconstruct(
    raw: &Array2<f64>,
    sizes: &[usize],
    mask: &AccessibilityMask,
    thresholds: Option<&[f64]>,
) -> Result<Array2<f64>> {
    let (rows, positions) = raw.dim();
    if sizes.len() != rows {
        return Err(GripError::InvalidInput(format!(
            "{} footprint sizes for {} landscape rows",
            sizes.len(),
            rows
        )));
    }
    if mask.len() != positions {
        return Err(GripError::InvalidInput(format!(
            "accessibility mask of {} positions for a landscape of {}",
            mask.len(),
            positions
        )));
    }
    if let Some(t) = thresholds {
        if t.len() != rows {
            return Err(GripError::InvalidInput(format!(
                "{} thresholds for {} landscape rows",
                t.len(),
                rows
            )));
        }
    }
    if let Some(row) = sizes.iter().position(|&s| s == 0) {
        return Err(GripError::InvalidInput(format!("footprint size 0 in row {}", row)));
    }

    let mut landscape = raw.to_owned();
    for (i, mut row) in landscape.axis_iter_mut(Axis(0)).enumerate() {
        let size = sizes[i];
        let threshold = thresholds.map_or(f64::NEG_INFINITY, |t| t[i]);
        let reachable = (positions + 1).saturating_sub(size);

        for p in 0..positions {
            row[p] = if p >= reachable || !mask.is_window_open(p, size) {
                f64::NEG_INFINITY
            } else {
                row[p].max(threshold)
            };
        }
    }

    Ok(landscape)
}
