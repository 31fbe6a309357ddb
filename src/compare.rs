//! Theory against experiment: ranking curves, per-row agreement and tabular output

use crate::error::{GripError, Result};
use crate::pipeline::RunResult;
use polars::prelude::*;
use statrs::statistics::Statistics;

/// One site of a comparison curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePoint {
    pub position: i64,
    /// Log-affinity as read, before thresholding
    pub raw_affinity: f64,
    /// Log-affinity the probabilities were computed from
    pub affinity: f64,
    pub theoretical: f64,
    pub empirical: f64,
}

/// Sites of one row that a footprint can start at, strongest raw affinity first.
///
/// Plotting theoretical and empirical probability along this order gives the
/// monotone affinity-to-occupancy curve.
///
/// # Errors
/// * `GripError::InvalidInput` - If `row` is out of range
pub fn comparison_curve(result: &RunResult, row: usize) -> Result<Vec<CurvePoint>> {
    if row >= result.row_names.len() {
        return Err(GripError::InvalidInput(format!(
            "row {} of {}",
            row,
            result.row_names.len()
        )));
    }

    let mut points: Vec<CurvePoint> = result
        .positions
        .iter()
        .enumerate()
        .filter(|&(p, _)| result.affinity[[row, p]].is_finite())
        .map(|(p, &position)| CurvePoint {
            position,
            raw_affinity: result.raw_affinity[[row, p]],
            affinity: result.affinity[[row, p]],
            theoretical: result.theoretical[[row, p]],
            empirical: result.empirical[[row, p]],
        })
        .collect();

    points.sort_by(|a, b| {
        b.raw_affinity
            .total_cmp(&a.raw_affinity)
            .then(a.position.cmp(&b.position))
    });
    Ok(points)
}

/// Agreement between the theoretical and empirical distribution of one row
#[derive(Debug, Clone, PartialEq)]
pub struct RowSummary {
    pub name: String,
    /// Pearson correlation over all positions; `None` if either row is constant
    pub pearson: Option<f64>,
    /// Half the L1 distance between the two distributions
    pub total_variation: f64,
    pub max_theoretical: f64,
    pub max_empirical: f64,
    pub total_bind_time: f64,
}

pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let sx = x.iter().std_dev();
    let sy = y.iter().std_dev();
    if sx == 0.0 || sy == 0.0 || !sx.is_finite() || !sy.is_finite() {
        return None;
    }
    Some(x.iter().covariance(y.iter()) / (sx * sy))
}

/// One [`RowSummary`] per landscape row
pub fn summarize(result: &RunResult) -> Vec<RowSummary> {
    result
        .row_names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let theoretical = result.theoretical.row(i).to_vec();
            let empirical = result.empirical.row(i).to_vec();
            let total_variation = 0.5
                * theoretical
                    .iter()
                    .zip(&empirical)
                    .map(|(t, e)| (t - e).abs())
                    .sum::<f64>();
            RowSummary {
                name: name.clone(),
                pearson: pearson(&theoretical, &empirical),
                total_variation,
                max_theoretical: theoretical.iter().copied().fold(0.0, f64::max),
                max_empirical: empirical.iter().copied().fold(0.0, f64::max),
                total_bind_time: result.total_bind_time[i],
            }
        })
        .collect()
}

fn data_error(e: PolarsError) -> GripError {
    GripError::DataError(e.to_string())
}

impl RunResult {
    /// Long-format table with one line per row and position:
    /// `name`, `position`, `affinity`, `theoretical`, `empirical`
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let n = self.positions.len();
        let mut names = Vec::with_capacity(self.row_names.len() * n);
        let mut positions = Vec::with_capacity(names.capacity());
        for name in &self.row_names {
            names.extend(std::iter::repeat(name.clone()).take(n));
            positions.extend_from_slice(&self.positions);
        }

        DataFrame::new(vec![
            Column::new("name".into(), names),
            Column::new("position".into(), positions),
            Column::new("affinity".into(), self.affinity.iter().copied().collect::<Vec<f64>>()),
            Column::new("theoretical".into(), self.theoretical.iter().copied().collect::<Vec<f64>>()),
            Column::new("empirical".into(), self.empirical.iter().copied().collect::<Vec<f64>>()),
        ])
        .map_err(data_error)
    }

    /// [`summarize`] as a table
    pub fn summary_dataframe(&self) -> Result<DataFrame> {
        let rows = summarize(self);
        DataFrame::new(vec![
            Column::new("name".into(), rows.iter().map(|r| r.name.clone()).collect::<Vec<_>>()),
            Column::new("pearson".into(), rows.iter().map(|r| r.pearson).collect::<Vec<_>>()),
            Column::new(
                "total_variation".into(),
                rows.iter().map(|r| r.total_variation).collect::<Vec<_>>(),
            ),
            Column::new(
                "max_theoretical".into(),
                rows.iter().map(|r| r.max_theoretical).collect::<Vec<_>>(),
            ),
            Column::new(
                "max_empirical".into(),
                rows.iter().map(|r| r.max_empirical).collect::<Vec<_>>(),
            ),
            Column::new(
                "total_bind_time".into(),
                rows.iter().map(|r| r.total_bind_time).collect::<Vec<_>>(),
            ),
        ])
        .map_err(data_error)
    }

    /// Annotated target sites as a table, `None` if the run had no site list
    pub fn target_sites_dataframe(&self) -> Option<Result<DataFrame>> {
        let sites = self.target_sites.as_ref()?;
        Some(
            DataFrame::new(vec![
                Column::new("repressor".into(), sites.iter().map(|s| s.repressor).collect::<Vec<_>>()),
                Column::new("name".into(), sites.iter().map(|s| s.name.clone()).collect::<Vec<_>>()),
                Column::new(
                    "name_strand".into(),
                    sites.iter().map(|s| s.name_strand.clone()).collect::<Vec<_>>(),
                ),
                Column::new("position".into(), sites.iter().map(|s| s.position).collect::<Vec<_>>()),
                Column::new("size".into(), sites.iter().map(|s| s.size as u64).collect::<Vec<_>>()),
                Column::new(
                    "strand".into(),
                    sites.iter().map(|s| s.strand.flag() as i32).collect::<Vec<_>>(),
                ),
                Column::new("affinity".into(), sites.iter().map(|s| s.affinity).collect::<Vec<_>>()),
            ])
            .map_err(data_error),
        )
    }
}
