//! File-name markers and field names written by the GRiP simulator

use phf::phf_map;

/// Separator used by relative paths stored in params files
pub const DIR_SEP: char = '/';

// parts of file names
pub const OCCUPANCY: &str = "_occupancy_";
pub const PARAMS: &str = "_params_";
pub const AFFINITY: &str = "_affinity_landscape_";
pub const TF_SPECIES: &str = "_TF_species_";

pub const OCCUPANCY_EXT: &str = "wig";
pub const PARAMS_EXT: &str = "grp";
pub const AFFINITY_EXT: &str = "wig";
pub const TF_SPECIES_EXT: &str = "csv";

/// Older simulator versions stamped intermediate snapshots with their time
pub const LEGACY_ZERO_DURATION: &str = "0.0s";

// params file fields
pub const TOTAL_SIM_TIME: &str = "STOP_TIME";
pub const ENSEMBLE_SIZE: &str = "ENSEMBLE_SIZE";
pub const ENSEMBLE_SIZE_LEGACY: &str = "ENSAMBLE_SIZE";
pub const TS_FILE: &str = "TS_FILE";
pub const BTRACK: &str = "DNA_AVAILABILITY_FILE";

// TF table fields
pub const MOTIF: &str = "DBD";
pub const SCORE_TO_ENERGY: &str = "ES";
pub const COPY_NUMBER: &str = "COPYNUMBER";
pub const SIZE_LEFT: &str = "SIZELEFT";
pub const SIZE_RIGHT: &str = "SIZERIGHT";
pub const ASSOC_RATE: &str = "ASSOCRATE";
pub const UNBIND_PROB: &str = "UNBINDINGPROBABILITY";
pub const JUMP_PROB: &str = "JUMPINGPROBABILITY";
pub const SPEC_WAITING_TIME: &str = "SPECIFICWAITINGTIME";
pub const REPRESSION_RATE: &str = "REPRESSIONRATE";
pub const DEREPRESSION_ATTENUATION_FACTOR: &str = "DEREPRESSIONATTENUATIONFACTOR";
pub const SPEC_ENERGY_THRESH: &str = "SPECIFICENERGYTHRESHOLD";
pub const IS_TWO_STATE: &str = "ISTWOSTATERANDOMWALK";

/// Marker that opens every PWM string in the DBD column
pub const PWM_MARKER: &str = "PWM:";

// track columns
pub const COLLISIONS: &str = "collisionsCount";

// strand suffixes appended to TF names in double-stranded tracks
pub const FORWARD_SUFFIX: &str = "5'3'";
pub const REVERSE_SUFFIX: &str = "3'5'";

/// Row order of every PWM
pub const BASES: [char; 4] = ['A', 'C', 'G', 'T'];

/// Base to PWM row index
pub static BASE_INDEX: phf::Map<char, usize> = phf_map! {
    'a' => 0,
    'c' => 1,
    'g' => 2,
    't' => 3,
    'A' => 0,
    'C' => 1,
    'G' => 2,
    'T' => 3,
};
