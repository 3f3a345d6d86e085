use thiserror::Error;

/// Errors raised while setting up a simulation run.
///
/// Empty paths and cancellation are not errors; they are reported through
/// [`crate::simulation::RunStatus`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// Shape, endpoint, or numeric parameter is inconsistent. Always raised
    /// before any timestep runs.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A mode selector did not name a known variant.
    #[error("unrecognized {kind} mode '{name}'")]
    UnrecognizedMode { kind: &'static str, name: String },
}

pub type Result<T> = std::result::Result<T, SimulationError>;

pub(crate) fn invalid(msg: impl Into<String>) -> SimulationError {
    SimulationError::InvalidConfiguration(msg.into())
}
