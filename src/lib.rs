// costopt: cloud cost-optimization scenarios encoded as mixed-integer programs

// Domain layer: modeling primitives, pricing and the solver contract
pub mod domain;

// Application layer: engine and scenario encoders
pub mod application;

// Solver adapters: Concrete implementations of SolverService
pub mod solver;

pub mod error;

// Infrastructure layer: batch runner
#[cfg(feature = "runner")]
pub mod infrastructure;

// Re-export commonly used types
pub use domain::{
    Constraint, ConstraintClass, ConstraintType, CostTable, LinearExpression, ModelError,
    ObjectiveFunction, OptimizationProblem, PricingMode, ProblemBuilder, QueryPricing, Solution,
    SolutionStatus, SolverBackend, SolverError, SolverService, UsageFeed, VarId, Variable,
    VariableType,
};

pub use application::{Optimizer, OptimizerConfig, SolveSummary};
pub use error::{Error, Result};

#[cfg(feature = "runner")]
pub use infrastructure::{load_batch, run_batch, Batch, ScenarioReport, ScenarioRequest};

#[cfg(feature = "coin_cbc")]
pub use solver::CoinCbcSolver;
#[cfg(feature = "highs")]
pub use solver::HighsSolver;
pub use solver::SolverFactory;
