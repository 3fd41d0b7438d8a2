use crate::domain::{problem_builder::ModelError, solver_service::SolverError};

/// Errors surfaced by the optimization engine.
///
/// Infeasible, unbounded and timed-out models are not errors: they come back
/// as the `status` of a report.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The solver backend is missing or misconfigured.
    #[error("Configuration error: {0}")]
    Configuration(SolverError),

    /// Malformed input, caught while building the model.
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// The backend rejected a model the builder accepted.
    #[error("Solver error: {0}")]
    Solver(SolverError),
}

pub type Result<T> = std::result::Result<T, Error>;
