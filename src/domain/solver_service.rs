// Domain service interface for solving optimization problems
// Defines the contract that any solver backend must follow

use super::models::{OptimizationProblem, Solution};

/// Error types for the solver service
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    #[error("Solver not available: {0}")]
    SolverNotAvailable(String),

    #[error("Solver execution failed: {0}")]
    ExecutionFailed(String),
}

pub type Result<T> = std::result::Result<T, SolverError>;

/// Domain service interface for optimization solvers
///
/// Backends receive a fully built problem and report the outcome as a
/// [`Solution`] status. Infeasible, unbounded and timed-out models are
/// successful calls; `Err` is reserved for a backend that could not run.
pub trait SolverService: Send + Sync {
    /// Solve an optimization problem
    fn solve(&self, problem: &OptimizationProblem) -> Result<Solution>;

    /// Validate a problem without solving it
    fn validate(&self, problem: &OptimizationProblem) -> Result<()> {
        let mut errors = Vec::new();
        let num_vars = problem.num_variables();

        if num_vars == 0 {
            errors.push("Problem must have at least one variable".to_string());
        }

        if problem
            .objective
            .expression
            .terms
            .iter()
            .any(|(var, _)| var.index() >= num_vars)
        {
            errors.push("Objective references an unknown variable".to_string());
        }

        for (i, constraint) in problem.constraints.iter().enumerate() {
            if constraint
                .expression
                .terms
                .iter()
                .any(|(var, _)| var.index() >= num_vars)
            {
                errors.push(format!(
                    "Constraint {} '{}' references an unknown variable",
                    i, constraint.name
                ));
            }
        }

        for (i, var) in problem.variables.iter().enumerate() {
            if let Some(upper) = var.upper_bound {
                if var.lower_bound > upper {
                    errors.push(format!(
                        "Variable {} '{}' has lower bound ({}) > upper bound ({})",
                        i, var.name, var.lower_bound, upper
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SolverError::InvalidProblem(errors.join("; ")))
        }
    }

    /// Get the name of this solver backend
    fn name(&self) -> &str;

    /// Check if this solver supports mixed-integer programming
    fn supports_mip(&self) -> bool;
}
