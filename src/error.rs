use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Logical kind of a simulation artifact, used to tell the caller which file is missing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileCategory {
    Occupancy,
    Affinity,
    Params,
    TfTable,
    TargetSites,
    Accessibility,
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileCategory::Occupancy => "occupancy",
            FileCategory::Affinity => "affinity landscape",
            FileCategory::Params => "params",
            FileCategory::TfTable => "TF table",
            FileCategory::TargetSites => "target sites",
            FileCategory::Accessibility => "accessibility",
        };
        f.write_str(name)
    }
}

/// Which of the two probability tensors failed to normalise
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributionKind {
    Theoretical,
    Empirical,
}

impl fmt::Display for DistributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistributionKind::Theoretical => f.write_str("theoretical"),
            DistributionKind::Empirical => f.write_str("empirical"),
        }
    }
}

#[derive(Error, Debug)]
pub enum GripError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("{category} file not found: {}", path.display())]
    FileNotFound { path: PathBuf, category: FileCategory },

    #[error("Malformed file {} (line {line}): {message}", path.display())]
    MalformedFile {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Invalid sequence at position {position}: {message}")]
    InvalidSequence { position: usize, message: String },

    #[error("Invalid PWM format: {0}")]
    InvalidPwm(String),

    #[error("Inconsistent strand count: {tf_rows} TF rows but {track_columns} track columns")]
    InconsistentStrandCount { tf_rows: usize, track_columns: usize },

    #[error("Degenerate {kind} distribution in row {row}: the row sums to zero")]
    DegenerateDistribution { row: usize, kind: DistributionKind },

    #[error("Lookup failed: {0}")]
    Lookup(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Invalid parameter: {name} = {value}, {message}")]
    InvalidParameter {
        name: String,
        value: String,
        message: String,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Run {run_id} in {}: {source}", dir.display())]
    Run {
        run_id: String,
        dir: PathBuf,
        #[source]
        source: Box<GripError>,
    },
}

/// Type alias for Result with GripError
pub type Result<T> = std::result::Result<T, GripError>;

impl GripError {
    /// Create a new FileNotFound error
    pub fn file_not_found(path: impl AsRef<Path>, category: FileCategory) -> Self {
        GripError::FileNotFound {
            path: path.as_ref().to_path_buf(),
            category,
        }
    }

    /// Create a new MalformedFile error; `line` is 1-based
    pub fn malformed(path: impl AsRef<Path>, line: usize, message: impl Into<String>) -> Self {
        GripError::MalformedFile {
            path: path.as_ref().to_path_buf(),
            line,
            message: message.into(),
        }
    }

    /// Create a new InvalidSequence error
    pub fn invalid_sequence(position: usize, message: impl Into<String>) -> Self {
        GripError::InvalidSequence {
            position,
            message: message.into(),
        }
    }

    /// Create a new InvalidPwm error
    pub fn invalid_pwm(message: impl Into<String>) -> Self {
        GripError::InvalidPwm(message.into())
    }

    /// Create a new InvalidParameter error
    pub fn invalid_parameter(
        name: impl Into<String>,
        value: impl ToString,
        message: impl Into<String>,
    ) -> Self {
        GripError::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
            message: message.into(),
        }
    }

    /// Attach the run id and directory to an error raised while processing that run
    pub fn in_run(self, run_id: impl Into<String>, dir: impl AsRef<Path>) -> Self {
        GripError::Run {
            run_id: run_id.into(),
            dir: dir.as_ref().to_path_buf(),
            source: Box::new(self),
        }
    }

    /// Strips any run context and returns the underlying error
    pub fn root_cause(&self) -> &GripError {
        match self {
            GripError::Run { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Opens a file, turning a missing path into `FileNotFound` for the given category
pub(crate) fn open_artifact(path: &Path, category: FileCategory) -> Result<std::fs::File> {
    std::fs::File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => GripError::file_not_found(path, category),
        _ => GripError::Io(e),
    })
}
