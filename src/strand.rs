use crate::constants::{FORWARD_SUFFIX, REVERSE_SUFFIX};
use crate::error::{GripError, Result};
use crate::species::TfRecord;

/// DNA strand a site is read on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    /// 5'→3', flag 0 in target-site files
    Forward,
    /// 3'→5', flag 1 in target-site files
    Reverse,
}

impl Strand {
    pub fn from_flag(flag: u8) -> Option<Strand> {
        match flag {
            0 => Some(Strand::Forward),
            1 => Some(Strand::Reverse),
            _ => None,
        }
    }

    pub fn flag(self) -> u8 {
        match self {
            Strand::Forward => 0,
            Strand::Reverse => 1,
        }
    }

    /// Suffix the simulator appends to TF names in double-stranded tracks
    pub fn suffix(self) -> &'static str {
        match self {
            Strand::Forward => FORWARD_SUFFIX,
            Strand::Reverse => REVERSE_SUFFIX,
        }
    }
}

/// Whether per-TF tracks carry one column per TF or one per TF and strand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrandLayout {
    Single,
    Double,
}

impl StrandLayout {
    /// Compares the TF table height with the number of TF columns of a track.
    ///
    /// # Errors
    /// * `GripError::InconsistentStrandCount` - If the column count is neither
    ///   equal to nor twice the number of TF rows
    pub fn detect(tf_rows: usize, track_columns: usize) -> Result<StrandLayout> {
        if track_columns == tf_rows {
            Ok(StrandLayout::Single)
        } else if track_columns == 2 * tf_rows {
            Ok(StrandLayout::Double)
        } else {
            Err(GripError::InconsistentStrandCount {
                tf_rows,
                track_columns,
            })
        }
    }

    /// Rows of the landscape per TF record
    pub fn factor(self) -> usize {
        match self {
            StrandLayout::Single => 1,
            StrandLayout::Double => 2,
        }
    }

    /// Column name of a TF on a strand under this layout
    pub fn column_name(self, tf: &str, strand: Strand) -> String {
        match self {
            StrandLayout::Single => tf.to_string(),
            StrandLayout::Double => format!("{}{}", tf, strand.suffix()),
        }
    }

    /// Landscape row names for the given TF names, in track order
    pub fn row_names<S: AsRef<str>>(self, tf_names: &[S]) -> Vec<String> {
        match self {
            StrandLayout::Single => tf_names.iter().map(|n| n.as_ref().to_string()).collect(),
            StrandLayout::Double => tf_names
                .iter()
                .flat_map(|n| {
                    [Strand::Forward, Strand::Reverse]
                        .map(|s| format!("{}{}", n.as_ref(), s.suffix()))
                })
                .collect(),
        }
    }
}

/// Convenience form of [`StrandLayout::detect`]
pub fn is_both_directions(tf_rows: usize, track_columns: usize) -> Result<bool> {
    Ok(StrandLayout::detect(tf_rows, track_columns)? == StrandLayout::Double)
}

/// Repeats every element twice in place: `[a, b]` becomes `[a, a, b, b]`
pub fn double_each_element<T: Clone>(values: &[T]) -> Vec<T> {
    values
        .iter()
        .flat_map(|v| [v.clone(), v.clone()])
        .collect()
}

/// Adds up consecutive pairs: `[a, b, c, d]` becomes `[a + b, c + d]`
pub fn sum_neighbours(values: &[f64]) -> Result<Vec<f64>> {
    if values.len() % 2 != 0 {
        return Err(GripError::InvalidInput(format!(
            "cannot pair up {} values",
            values.len()
        )));
    }
    Ok(values.chunks_exact(2).map(|p| p[0] + p[1]).collect())
}

/// Per-row kinetic quantities aligned with the rows of the landscape
#[derive(Debug, Clone, PartialEq)]
pub struct Kinetics {
    pub layout: StrandLayout,
    /// Association rate per site
    pub assoc_rate: Vec<f64>,
    pub specific_waiting_time: Vec<f64>,
    pub footprint_size: Vec<usize>,
    pub jumping_probability: Vec<f64>,
    pub unbinding_probability: Vec<f64>,
    pub copy_number: Vec<u64>,
    pub affinity_threshold: Vec<f64>,
}

impl Kinetics {
    /// Collects the per-TF vectors and, for two strands, duplicates each entry so
    /// that row `2i` and `2i + 1` both describe TF `i`. The association rate is
    /// spread over `positions` sites and, for two strands, split evenly between them.
    pub fn from_records(records: &[TfRecord], layout: StrandLayout, positions: usize) -> Result<Kinetics> {
        let per_site = positions.max(1) as f64;
        let assoc_rate: Vec<f64> = records.iter().map(|r| r.assoc_rate / per_site).collect();
        let affinity_threshold = records
            .iter()
            .map(TfRecord::affinity_threshold)
            .collect::<Result<Vec<_>>>()?;

        let kinetics = Kinetics {
            layout,
            assoc_rate,
            specific_waiting_time: records.iter().map(|r| r.specific_waiting_time).collect(),
            footprint_size: records.iter().map(TfRecord::footprint_size).collect(),
            jumping_probability: records.iter().map(|r| r.jumping_probability).collect(),
            unbinding_probability: records.iter().map(|r| r.unbinding_probability).collect(),
            copy_number: records.iter().map(|r| r.copy_number).collect(),
            affinity_threshold,
        };

        Ok(match layout {
            StrandLayout::Single => kinetics,
            StrandLayout::Double => kinetics.doubled(),
        })
    }

    fn doubled(self) -> Kinetics {
        Kinetics {
            layout: StrandLayout::Double,
            assoc_rate: double_each_element(&self.assoc_rate)
                .into_iter()
                .map(|r| r / 2.0)
                .collect(),
            specific_waiting_time: double_each_element(&self.specific_waiting_time),
            footprint_size: double_each_element(&self.footprint_size),
            jumping_probability: double_each_element(&self.jumping_probability),
            unbinding_probability: double_each_element(&self.unbinding_probability),
            copy_number: double_each_element(&self.copy_number),
            affinity_threshold: double_each_element(&self.affinity_threshold),
        }
    }

    /// Number of landscape rows described
    pub fn rows(&self) -> usize {
        self.footprint_size.len()
    }
}
