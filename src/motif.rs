use crate::constants::{BASES, BASE_INDEX, PWM_MARKER};
use crate::error::{GripError, Result};
use ndarray::{Array2, Axis};

/// Position Weight Matrix stored as a (4 × motif length) matrix with rows A, C, G, T.
///
/// Entries are log-affinity contributions: a higher entry means the base binds
/// better at that motif position.
#[derive(Debug, Clone, PartialEq)]
pub struct Pwm {
    matrix: Array2<f64>,
}

/// Parses one `X=[v0,v1,...]` row of a PWM string
fn parse_row(row: &str) -> Result<(char, Vec<f64>)> {
    let (label, values) = row
        .split_once('=')
        .ok_or_else(|| GripError::invalid_pwm(format!("missing `=` in row `{}`", row)))?;

    let mut label_chars = label.chars();
    let base = match (label_chars.next(), label_chars.next()) {
        (Some(c), None) => c.to_ascii_uppercase(),
        _ => return Err(GripError::invalid_pwm(format!("invalid row label `{}`", label))),
    };

    let values = values
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .ok_or_else(|| GripError::invalid_pwm(format!("row `{}` is not bracketed", row)))?;

    let values = values
        .split(',')
        .map(|s| s.parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| GripError::invalid_pwm(format!("invalid PWM value: {}", e)))?;

    Ok((base, values))
}

impl Pwm {
    /// Parses the `DBD` string of a TF table row.
    ///
    /// # Format
    /// `PWM: A=[v0, v1, ...]; C=[...]; G=[...]; T=[...]`. Whitespace is ignored and
    /// the rows may come in any order. The empty string is a TF without a
    /// sequence-specific motif and yields a zero-length matrix.
    ///
    /// # Errors
    /// * `GripError::InvalidPwm` - If the marker is missing, a row is malformed,
    ///   a base is missing or duplicated, or the rows differ in length
    ///
    /// # Example
    /// ```
    /// use grip_occupancy::motif::Pwm;
    ///
    /// let pwm = Pwm::parse("PWM: A=[0,1];C=[1,0];G=[0,0];T=[0,0]").unwrap();
    /// assert_eq!(pwm.len(), 2);
    /// assert_eq!(pwm.score_normalized("ac").unwrap(), -2.0);
    /// assert_eq!(pwm.score_normalized("aa").unwrap(), -1.0);
    /// ```
    pub fn parse(s: &str) -> Result<Pwm> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Pwm {
                matrix: Array2::zeros((4, 0)),
            });
        }
        let body = s
            .strip_prefix(PWM_MARKER)
            .ok_or_else(|| GripError::invalid_pwm(format!("expected `{}` prefix", PWM_MARKER)))?;
        let body: String = body.chars().filter(|c| !c.is_whitespace()).collect();

        let mut rows: [Option<Vec<f64>>; 4] = Default::default();
        for row in body.split(';').filter(|r| !r.is_empty()) {
            let (base, values) = parse_row(row)?;
            let idx = BASES
                .iter()
                .position(|&b| b == base)
                .ok_or_else(|| GripError::invalid_pwm(format!("unknown base `{}`", base)))?;
            if rows[idx].replace(values).is_some() {
                return Err(GripError::invalid_pwm(format!("duplicate row for `{}`", base)));
            }
        }

        let rows = rows
            .into_iter()
            .zip(BASES)
            .map(|(row, base)| row.ok_or_else(|| GripError::invalid_pwm(format!("missing row for `{}`", base))))
            .collect::<Result<Vec<_>>>()?;

        let len = rows[0].len();
        if rows.iter().any(|r| r.len() != len) {
            return Err(GripError::invalid_pwm("rows have different lengths"));
        }

        let matrix = Array2::from_shape_fn((4, len), |(b, i)| rows[b][i]);
        Ok(Pwm { matrix })
    }

    pub fn from_matrix(matrix: Array2<f64>) -> Result<Pwm> {
        if matrix.nrows() != 4 {
            return Err(GripError::invalid_pwm(format!(
                "expected 4 rows, found {}",
                matrix.nrows()
            )));
        }
        Ok(Pwm { matrix })
    }

    /// Motif length
    pub fn len(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.ncols() == 0
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    /// Sum over positions of the best entry, the score of a perfect match
    pub fn max_score(&self) -> f64 {
        self.matrix
            .axis_iter(Axis(1))
            .map(|col| col.fold(f64::NEG_INFINITY, |a, &b| a.max(b)))
            .sum()
    }

    fn base_indices(&self, seq: &str) -> Result<Vec<usize>> {
        let indices = seq
            .chars()
            .enumerate()
            .map(|(i, c)| {
                BASE_INDEX.get(&c).copied().ok_or_else(|| {
                    GripError::invalid_sequence(i, format!("base `{}` cannot be scored", c))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        if indices.len() != self.len() {
            return Err(GripError::invalid_sequence(
                indices.len().min(self.len()),
                format!("window of length {} for a motif of length {}", indices.len(), self.len()),
            ));
        }
        Ok(indices)
    }

    /// Raw score of a window: the sum of the entries of the observed bases
    pub fn score(&self, seq: &str) -> Result<f64> {
        let indices = self.base_indices(seq)?;
        Ok(indices
            .iter()
            .enumerate()
            .map(|(i, &b)| self.matrix[[b, i]])
            .sum())
    }

    /// Raw score minus the perfect-match score, so 0 is the best possible value
    pub fn score_normalized(&self, seq: &str) -> Result<f64> {
        Ok(self.score(seq)? - self.max_score())
    }

    /// Normalized score of the window read on the opposite strand
    pub fn score_reverse(&self, seq: &str) -> Result<f64> {
        let indices = self.base_indices(seq)?;
        let raw: f64 = indices
            .iter()
            .rev()
            .enumerate()
            .map(|(i, &b)| self.matrix[[3 - b, i]])
            .sum();
        Ok(raw - self.max_score())
    }
}
