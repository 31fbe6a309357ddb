use crate::constants::COLLISIONS;
use crate::error::{FileCategory, GripError, Result};
use crate::table::read_string_frame;
use ndarray::{s, Array2, ArrayView1, Axis};
use std::collections::BTreeMap;
use std::path::Path;

/// How a track file is laid out before the numeric body starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackOptions {
    /// Descriptive lines before the header (the `fixedStep` line)
    pub skip_lines: usize,
    /// Value columns after the position column that are not TF series
    pub auxiliary_columns: usize,
    pub category: FileCategory,
}

impl TrackOptions {
    /// Layout of an `_affinity_landscape_` file: position, then one column per TF (or TF strand)
    pub fn affinity() -> Self {
        TrackOptions {
            skip_lines: 1,
            auxiliary_columns: 0,
            category: FileCategory::Affinity,
        }
    }

    /// Layout of an `_occupancy_` file: position, collisionsCount, then the TF columns
    pub fn occupancy() -> Self {
        TrackOptions {
            skip_lines: 1,
            auxiliary_columns: 1,
            category: FileCategory::Occupancy,
        }
    }

    pub fn with_skip_lines(mut self, skip_lines: usize) -> Self {
        self.skip_lines = skip_lines;
        self
    }
}

/// Per-position values for a set of named series sharing one contiguous position domain
#[derive(Debug, Clone, PartialEq)]
pub struct PositionTrack {
    pub positions: Vec<i64>,
    pub names: Vec<String>,
    /// Shaped (series × positions)
    pub values: Array2<f64>,
    pub auxiliary: BTreeMap<String, Vec<f64>>,
}

impl PositionTrack {
    /// Builds a track from rows of series values, checking that the shapes agree
    /// and the positions are contiguous
    pub fn new(positions: Vec<i64>, names: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if values.nrows() != names.len() || values.ncols() != positions.len() {
            return Err(GripError::InvalidInput(format!(
                "track of {} series × {} positions given {:?} values",
                names.len(),
                positions.len(),
                values.shape()
            )));
        }
        if let Some(gap) = first_gap(&positions) {
            return Err(GripError::InvalidInput(format!(
                "positions are not contiguous after {}",
                positions[gap]
            )));
        }
        Ok(PositionTrack {
            positions,
            names,
            values,
            auxiliary: BTreeMap::new(),
        })
    }

    /// Number of positions
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Number of named series
    pub fn width(&self) -> usize {
        self.names.len()
    }

    /// Column index of a genomic position
    pub fn index_of(&self, position: i64) -> Option<usize> {
        let first = *self.positions.first()?;
        let idx = usize::try_from(position.checked_sub(first)?).ok()?;
        (idx < self.positions.len()).then_some(idx)
    }

    pub fn series_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn series(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.series_index(name)
            .map(|i| self.values.index_axis(Axis(0), i))
    }

    /// Value of a series at a genomic position
    pub fn get(&self, name: &str, position: i64) -> Option<f64> {
        let col = self.index_of(position)?;
        self.series(name).map(|s| s[col])
    }

    /// Copy of the track with its series rearranged into `order`
    ///
    /// # Errors
    /// * `GripError::Lookup` - If a name in `order` is not a series of the track
    pub fn reorder<S: AsRef<str>>(&self, order: &[S]) -> Result<PositionTrack> {
        let indices = order
            .iter()
            .map(|name| {
                self.series_index(name.as_ref())
                    .ok_or_else(|| GripError::Lookup(format!("no series {}", name.as_ref())))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(PositionTrack {
            positions: self.positions.clone(),
            names: order.iter().map(|n| n.as_ref().to_string()).collect(),
            values: self.values.select(Axis(0), &indices),
            auxiliary: self.auxiliary.clone(),
        })
    }

    /// Flips the sign of every series value, turning energies into log-affinities
    pub fn negate(&mut self) {
        self.values.mapv_inplace(|v| -v);
    }

    /// Collision counts of an occupancy track, if the file carried them
    pub fn collisions(&self) -> Option<&[f64]> {
        self.auxiliary.get(COLLISIONS).map(|v| v.as_slice())
    }
}

fn first_gap(positions: &[i64]) -> Option<usize> {
    positions.windows(2).position(|w| w[1] != w[0] + 1)
}

fn parse_position(token: &str) -> Option<i64> {
    token.parse::<i64>().ok().or_else(|| {
        token
            .parse::<f64>()
            .ok()
            .filter(|v| v.fract() == 0.0)
            .map(|v| v as i64)
    })
}

/// Reads a header-annotated numeric track (`.wig` output of the simulator).
///
/// The first `options.skip_lines` lines are skipped, the next line names the
/// columns (comma separated, optionally quoted), and every following non-blank
/// line is a numeric row whose first field is the genomic position.
///
/// # Returns
/// * `Result<PositionTrack>` - Series values shaped (series × positions); the
///   first `options.auxiliary_columns` value columns are stored in `auxiliary`
///
/// # Errors
/// * `GripError::FileNotFound` - If the file does not exist
/// * `GripError::MalformedFile` - On a missing header, a row of the wrong width,
///   a non-numeric value, non-contiguous positions or an empty body
pub fn read_track(path: impl AsRef<Path>, options: &TrackOptions) -> Result<PositionTrack> {
    let path = path.as_ref();
    let frame = read_string_frame(path, options.category, b',', options.skip_lines)?;
    let header = frame.column_names();
    if header.len() < 1 + options.auxiliary_columns {
        return Err(GripError::malformed(
            path,
            frame.header_line,
            format!("expected at least {} columns", 1 + options.auxiliary_columns),
        ));
    }
    let n_rows = frame.df.height();
    if n_rows == 0 {
        return Err(GripError::malformed(path, frame.header_line, "no data rows"));
    }

    let mut positions = Vec::with_capacity(n_rows);
    for (row, token) in frame.column_values(0)?.into_iter().enumerate() {
        let token = token.unwrap_or_default();
        let position = parse_position(&token).ok_or_else(|| {
            GripError::malformed(path, frame.line_of(row), format!("invalid position: {}", token))
        })?;
        positions.push(position);
    }
    if let Some(gap) = first_gap(&positions) {
        return Err(GripError::malformed(
            path,
            frame.line_of(gap + 1),
            format!("positions are not contiguous after {}", positions[gap]),
        ));
    }

    let mut values = Array2::<f64>::zeros((header.len() - 1, n_rows));
    for (col, mut series) in values.axis_iter_mut(Axis(0)).enumerate() {
        for (row, token) in frame.column_values(col + 1)?.into_iter().enumerate() {
            let value = token
                .ok_or_else(|| {
                    GripError::malformed(
                        path,
                        frame.line_of(row),
                        format!("expected {} values", header.len()),
                    )
                })?
                .parse::<f64>()
                .map_err(|e| {
                    GripError::malformed(path, frame.line_of(row), format!("invalid value: {}", e))
                })?;
            series[row] = value;
        }
    }

    let n_aux = options.auxiliary_columns;
    let auxiliary = header[1..1 + n_aux]
        .iter()
        .enumerate()
        .map(|(j, name)| (name.clone(), values.row(j).to_vec()))
        .collect();

    Ok(PositionTrack {
        positions,
        names: header[1 + n_aux..].to_vec(),
        values: values.slice(s![n_aux.., ..]).to_owned(),
        auxiliary,
    })
}
