// Domain value objects representing core modeling concepts

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of decision variable in the optimization problem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableType {
    /// Continuous real number (x ∈ ℝ)
    Continuous,
    /// Integer number (x ∈ ℤ)
    Integer,
    /// Binary variable (x ∈ {0, 1})
    Binary,
}

/// Type of constraint comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintType {
    /// Less than or equal (≤)
    LessThanOrEqual,
    /// Equal (=)
    Equal,
    /// Greater than or equal (≥)
    GreaterThanOrEqual,
}

/// Direction of optimization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationType {
    /// Minimize the objective function
    Minimize,
    /// Maximize the objective function
    Maximize,
}

/// Family a constraint row belongs to.
///
/// Every row carries one so that an infeasible model can be traced back to
/// the kind of requirement that could not be met.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintClass {
    /// Every demand item is served by exactly one option
    Coverage,
    /// Resource ceilings (node vCPU/memory, per-slot budget)
    Capacity,
    /// Options an item is not allowed to use
    Eligibility,
    /// Global spending cap
    Budget,
    /// Mutually exclusive pricing modes
    Exclusivity,
    /// Structural rows tying auxiliary variables to the ones they derive from
    Linking,
}

impl ConstraintClass {
    /// Classes that may be relaxed when looking for the cause of infeasibility,
    /// in the order they are tried.
    pub const RELAXABLE: [ConstraintClass; 4] = [
        ConstraintClass::Budget,
        ConstraintClass::Eligibility,
        ConstraintClass::Capacity,
        ConstraintClass::Coverage,
    ];
}

impl fmt::Display for ConstraintClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintClass::Coverage => write!(f, "coverage"),
            ConstraintClass::Capacity => write!(f, "capacity"),
            ConstraintClass::Eligibility => write!(f, "eligibility"),
            ConstraintClass::Budget => write!(f, "budget"),
            ConstraintClass::Exclusivity => write!(f, "exclusivity"),
            ConstraintClass::Linking => write!(f, "linking"),
        }
    }
}

/// Status of the optimization solution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolutionStatus {
    /// Found optimal solution
    Optimal,
    /// Problem has no feasible solution
    Infeasible,
    /// Objective can be improved infinitely
    Unbounded,
    /// Time limit reached before optimality was proven
    Timeout,
    /// Solver error occurred
    Error,
}

impl fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolutionStatus::Optimal => write!(f, "Optimal"),
            SolutionStatus::Infeasible => write!(f, "Infeasible"),
            SolutionStatus::Unbounded => write!(f, "Unbounded"),
            SolutionStatus::Timeout => write!(f, "Time Limit Reached"),
            SolutionStatus::Error => write!(f, "Error"),
        }
    }
}

/// Solver backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverBackend {
    /// Automatically select best solver
    #[default]
    Auto,
    /// HiGHS solver
    Highs,
    /// COIN-OR CBC solver
    CoinCbc,
}

impl fmt::Display for SolverBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverBackend::Auto => write!(f, "Auto"),
            SolverBackend::Highs => write!(f, "HiGHS"),
            SolverBackend::CoinCbc => write!(f, "COIN-OR CBC"),
        }
    }
}

/// Pricing mode of a compute node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingMode {
    /// Regular on-demand node-hour price
    Standard,
    /// Preemptible capacity at the spot discount
    Spot,
    /// Committed-use discount
    CommittedUse,
}

impl fmt::Display for PricingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricingMode::Standard => write!(f, "Standard"),
            PricingMode::Spot => write!(f, "Spot"),
            PricingMode::CommittedUse => write!(f, "Committed Use"),
        }
    }
}

/// How a scheduled query is billed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryPricing {
    /// Runs on reserved flat-rate slots
    FlatRate,
    /// Billed per unit of data scanned
    OnDemand,
}
