use crate::constants::*;
use crate::error::{FileCategory, GripError, Result};
use crate::motif::Pwm;
use crate::table::{read_indexed_csv, IndexedTable};
use std::path::Path;

/// One transcription factor species as listed in the `_TF_species_` table
#[derive(Debug, Clone, PartialEq)]
pub struct TfRecord {
    pub name: String,
    pub pwm: Pwm,
    pub size_left: usize,
    pub size_right: usize,
    pub copy_number: u64,
    /// Score-to-energy conversion factor
    pub es: f64,
    pub assoc_rate: f64,
    pub unbinding_probability: f64,
    pub jumping_probability: f64,
    pub specific_waiting_time: f64,
    pub repression_rate: f64,
    pub derepression_attenuation_factor: f64,
    pub specific_energy_threshold: f64,
    pub is_two_state_random_walk: bool,
}

impl TfRecord {
    /// Number of basepairs covered by one bound molecule
    pub fn footprint_size(&self) -> usize {
        self.pwm.len() + self.size_left + self.size_right
    }

    /// Lower bound applied to this TF's log-affinities.
    ///
    /// Only two-state random walkers have one (`SPECIFICENERGYTHRESHOLD / ES`);
    /// every other TF gets `-inf`, which leaves the landscape untouched.
    pub fn affinity_threshold(&self) -> Result<f64> {
        if !self.is_two_state_random_walk {
            return Ok(f64::NEG_INFINITY);
        }
        if self.es == 0.0 {
            return Err(GripError::invalid_parameter(
                SCORE_TO_ENERGY,
                self.es,
                format!("two-state TF {} needs a nonzero score-to-energy factor", self.name),
            ));
        }
        Ok(self.specific_energy_threshold / self.es)
    }

    pub fn is_repressor(&self) -> bool {
        self.repression_rate > 0.0
    }

    fn from_row(table: &IndexedTable, row: usize) -> Result<TfRecord> {
        let name = table.index[row].clone();
        let optional_f64 = |column: &str, default: f64| -> Result<f64> {
            if table.has_column(column) {
                table.get_f64(row, column)
            } else {
                Ok(default)
            }
        };

        let record = TfRecord {
            pwm: Pwm::parse(table.value(row, MOTIF)?)?,
            size_left: table.get_u64(row, SIZE_LEFT)? as usize,
            size_right: table.get_u64(row, SIZE_RIGHT)? as usize,
            copy_number: table.get_u64(row, COPY_NUMBER)?,
            es: optional_f64(SCORE_TO_ENERGY, 1.0)?,
            assoc_rate: table.get_f64(row, ASSOC_RATE)?,
            unbinding_probability: table.get_f64(row, UNBIND_PROB)?,
            jumping_probability: table.get_f64(row, JUMP_PROB)?,
            specific_waiting_time: table.get_f64(row, SPEC_WAITING_TIME)?,
            repression_rate: optional_f64(REPRESSION_RATE, 0.0)?,
            derepression_attenuation_factor: optional_f64(DEREPRESSION_ATTENUATION_FACTOR, 0.0)?,
            specific_energy_threshold: optional_f64(SPEC_ENERGY_THRESH, 0.0)?,
            is_two_state_random_walk: if table.has_column(IS_TWO_STATE) {
                table.get_bool(row, IS_TWO_STATE)?
            } else {
                false
            },
            name,
        };

        if record.footprint_size() == 0 {
            return Err(GripError::invalid_parameter(
                MOTIF,
                table.value(row, MOTIF)?,
                format!("TF {} has an empty footprint", record.name),
            ));
        }
        Ok(record)
    }
}

/// Converts every row of a TF table into a typed record, keeping the table order
pub fn records_from_table(table: &IndexedTable) -> Result<Vec<TfRecord>> {
    (0..table.len())
        .map(|row| TfRecord::from_row(table, row))
        .collect()
}

/// Reads a `_TF_species_` CSV file into typed records.
///
/// # Errors
/// * `GripError::FileNotFound` - If the file does not exist
/// * `GripError::MalformedFile` - If a row has the wrong number of fields
/// * `GripError::InvalidPwm` - If a `DBD` entry is not a PWM string
/// * `GripError::Lookup` - If a required column is missing
/// * `GripError::InvalidParameter` - If a value cannot be cast or a footprint is empty
pub fn read_tf_species(path: impl AsRef<Path>) -> Result<Vec<TfRecord>> {
    let table = read_indexed_csv(path, b',', FileCategory::TfTable)?;
    records_from_table(&table)
}
