use crate::error::{DistributionKind, GripError, Result};
use log::warn;
use ndarray::{Array1, Array2, Axis};

/// How rows that sum to zero are handled during normalisation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbabilityOptions {
    /// Fill degenerate rows with zeros and report them instead of failing
    pub zero_degenerate_rows: bool,
}

/// A row-normalised tensor together with the rows that could not be normalised
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    pub values: Array2<f64>,
    /// Rows whose total was zero; only non-empty with `zero_degenerate_rows`
    pub degenerate: Vec<usize>,
    /// Natural log of each row's total before normalisation (`-inf` for degenerate rows)
    pub log_totals: Vec<f64>,
}

/// Largest finite value of each row, `None` for rows without one
fn finite_row_max(landscape: &Array2<f64>) -> Vec<Option<f64>> {
    landscape
        .axis_iter(Axis(0))
        .map(|row| {
            row.iter()
                .copied()
                .filter(|v| v.is_finite())
                .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))))
        })
        .collect()
}

/// Divides every row by its sum; `shifts` are added back to the log totals
fn normalize_rows(
    values: Array2<f64>,
    shifts: &[f64],
    kind: DistributionKind,
    options: ProbabilityOptions,
) -> Result<Distribution> {
    let mut values = values;
    let mut degenerate = Vec::new();
    let mut log_totals = Vec::with_capacity(values.nrows());

    for (i, mut row) in values.axis_iter_mut(Axis(0)).enumerate() {
        let total = row.sum();
        if total == 0.0 || !total.is_finite() {
            if !options.zero_degenerate_rows {
                return Err(GripError::DegenerateDistribution { row: i, kind });
            }
            warn!("{} distribution of row {} sums to {}, filled with zeros", kind, i, total);
            row.fill(0.0);
            degenerate.push(i);
            log_totals.push(f64::NEG_INFINITY);
        } else {
            row /= total;
            log_totals.push(total.ln() + shifts.get(i).copied().unwrap_or(0.0));
        }
    }

    Ok(Distribution {
        values,
        degenerate,
        log_totals,
    })
}

/// Theoretical binding probability of every site: the Boltzmann weights of each
/// row divided by their sum.
///
/// Each row is shifted by its largest finite value before exponentiation, so
/// landscapes far above or below zero normalise without overflow or underflow.
/// `log_totals` holds the log partition sum of every row.
///
/// # Errors
/// * `GripError::DegenerateDistribution` - If a row has no finite site (everything
///   masked) or contains `+inf`, and `options.zero_degenerate_rows` is off
pub fn theoretical_probability(landscape: &Array2<f64>, options: ProbabilityOptions) -> Result<Distribution> {
    let row_max = finite_row_max(landscape);
    let mut weights = landscape.clone();
    for (mut row, max) in weights.axis_iter_mut(Axis(0)).zip(&row_max) {
        match max {
            Some(max) => row.mapv_inplace(|v| (v - max).exp()),
            None => row.fill(0.0),
        }
    }
    let shifts: Vec<f64> = row_max.iter().map(|m| m.unwrap_or(0.0)).collect();
    normalize_rows(weights, &shifts, DistributionKind::Theoretical, options)
}

/// Expected occupancy per run: the aggregated counts divided by the number of replicates
pub fn occupancy_per_run(counts: &Array2<f64>, ensemble_size: usize) -> Array2<f64> {
    counts / ensemble_size.max(1) as f64
}

/// Total bound time of each row per run
pub fn total_bind_time(counts: &Array2<f64>, ensemble_size: usize) -> Array1<f64> {
    occupancy_per_run(counts, ensemble_size).sum_axis(Axis(1))
}

/// Empirical binding probability of every site.
///
/// Counts are divided by the ensemble size and then each row by its total bound
/// time, giving a distribution directly comparable to [`theoretical_probability`].
///
/// # Errors
/// * `GripError::DegenerateDistribution` - If a row was never bound and
///   `options.zero_degenerate_rows` is off
pub fn empirical_probability(
    counts: &Array2<f64>,
    ensemble_size: usize,
    options: ProbabilityOptions,
) -> Result<Distribution> {
    normalize_rows(
        occupancy_per_run(counts, ensemble_size),
        &[],
        DistributionKind::Empirical,
        options,
    )
}
