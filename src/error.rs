use thiserror::Error;

/// Error types for the fibercouple-rs library.
#[derive(Error, Debug)]
pub enum CouplingError {
    /// The beam-width curve fit did not converge, or its covariance is singular.
    #[error("Beam width fit diverged: {0}")]
    FitDivergence(String),

    /// A thin lens was given a zero (or non-finite) focal length.
    #[error("Invalid lens: focal length {0} is not usable")]
    InvalidLens(f64),

    /// Beam parameter propagation hit a pole of the transfer matrix.
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// A beam parameter does not describe a beam with a positive real size.
    #[error("Non-physical beam: {0}")]
    NonPhysicalBeam(String),

    /// Every search trial was infeasible.
    #[error("No feasible configuration found after {trials} trials")]
    NoFeasibleConfiguration {
        /// Number of trials that were run
        trials: usize,
    },

    /// Caller-supplied geometry constants or lens catalog are contradictory.
    #[error("Invalid search bounds: {0}")]
    InvalidSearchBounds(String),

    /// Error indicating a mismatch in array or matrix dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Error indicating a singular matrix was encountered.
    #[error("Singular matrix encountered")]
    SingularMatrix,

    /// Error indicating the least-squares solver failed to converge.
    #[error("Algorithm failed to converge: {0}")]
    ConvergenceFailure(String),

    /// Invalid input data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error for boundary constraint violations.
    #[error("Bounds error: {0}")]
    BoundsError(#[from] crate::parameters::bounds::BoundsError),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CouplingError {
    /// Whether this error only invalidates a single search trial.
    ///
    /// Geometry and beam errors, and a local minimization that did not
    /// converge, make that one trial infeasible. Everything else is structural.
    pub fn is_trial_local(&self) -> bool {
        matches!(
            self,
            CouplingError::DegenerateGeometry(_)
                | CouplingError::NonPhysicalBeam(_)
                | CouplingError::ConvergenceFailure(_)
                | CouplingError::SingularMatrix
        )
    }
}

/// Result type alias for fibercouple-rs operations.
pub type Result<T> = std::result::Result<T, CouplingError>;
