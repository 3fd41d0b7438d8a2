// Optimization engine: one private model and one blocking solve per call

use crate::domain::{
    cost_model::CostTable,
    models::{OptimizationProblem, Solution, SolverConfig, SolverStatistics},
    solver_service::{SolverError, SolverService},
    value_objects::{ConstraintClass, SolutionStatus, SolverBackend},
};
use crate::error::{Error, Result};
use crate::solver::SolverFactory;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Slack allowed on constant rows of a model without variables.
const TRIVIAL_ROW_TOLERANCE: f64 = 1e-9;

/// Engine settings, passed in explicitly at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub backend: SolverBackend,
    /// Wall-clock limit handed to the backend for every solve.
    pub time_limit_secs: Option<f64>,
    pub gap_tolerance: Option<f64>,
    pub verbose: bool,
    /// Re-solve infeasible models with one constraint class relaxed at a time.
    pub diagnose_infeasibility: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            backend: SolverBackend::Auto,
            time_limit_secs: None,
            gap_tolerance: None,
            verbose: false,
            diagnose_infeasibility: true,
        }
    }
}

impl OptimizerConfig {
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit_secs = Some(limit.as_secs_f64());
        self
    }

    pub fn solver_config(&self) -> SolverConfig {
        SolverConfig {
            backend: self.backend,
            time_limit: self
                .time_limit_secs
                .filter(|secs| secs.is_finite() && *secs > 0.0)
                .map(Duration::from_secs_f64),
            gap_tolerance: self.gap_tolerance,
            verbose: self.verbose,
        }
    }
}

/// Status part shared by every scenario report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveSummary {
    pub status: SolutionStatus,
    pub message: String,
    /// Constraint family whose relaxation restores feasibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infeasible_class: Option<ConstraintClass>,
}

/// Raw result of one solve.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub summary: SolveSummary,
    pub solution: Solution,
}

/// Stateless front door to the scenario encoders.
///
/// Holds only immutable configuration; every call builds its own problem
/// and solver session, so one instance can serve concurrent callers.
pub struct Optimizer {
    solver: Arc<dyn SolverService>,
    config: OptimizerConfig,
    costs: CostTable,
}

impl Optimizer {
    pub fn new(solver: Arc<dyn SolverService>, config: OptimizerConfig) -> Self {
        Self {
            solver,
            config,
            costs: CostTable::default(),
        }
    }

    /// Resolves the configured backend, failing before any model is built.
    pub fn from_config(config: OptimizerConfig) -> Result<Self> {
        let solver = SolverFactory::create_from_backend(config.backend).map_err(Error::Configuration)?;
        Ok(Self::new(solver, config))
    }

    pub fn with_cost_table(mut self, costs: CostTable) -> Self {
        self.costs = costs;
        self
    }

    pub fn costs(&self) -> &CostTable {
        &self.costs
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn solver_name(&self) -> &str {
        self.solver.name()
    }

    /// Solves a built problem and classifies the outcome.
    pub fn solve(&self, problem: OptimizationProblem) -> Result<SolveOutcome> {
        let problem = problem.with_config(self.config.solver_config());
        debug!(
            "Solving '{}' with {}: {} variables ({} integer), {} constraints",
            problem.name,
            self.solver.name(),
            problem.num_variables(),
            problem.num_integer_variables(),
            problem.constraints.len()
        );

        let solution = match self.run(&problem) {
            Ok(solution) => solution,
            Err(SolverError::ExecutionFailed(reason)) => {
                warn!("Solver failed on '{}': {}", problem.name, reason);
                Solution::new(SolutionStatus::Error, reason)
            }
            Err(e @ SolverError::SolverNotAvailable(_)) => return Err(Error::Configuration(e)),
            Err(e @ SolverError::InvalidProblem(_)) => return Err(Error::Solver(e)),
        };

        let infeasible_class = if solution.status == SolutionStatus::Infeasible
            && self.config.diagnose_infeasibility
        {
            self.diagnose(&problem)
        } else {
            None
        };

        info!(
            "'{}': {} in {:.1} ms",
            problem.name, solution.status, solution.statistics.solve_time_ms
        );

        let mut message = solution.message.clone();
        if let Some(class) = infeasible_class {
            message = format!("{} (relaxing {} constraints restores feasibility)", message, class);
        }

        Ok(SolveOutcome {
            summary: SolveSummary {
                status: solution.status,
                message,
                infeasible_class,
            },
            solution,
        })
    }

    fn run(&self, problem: &OptimizationProblem) -> std::result::Result<Solution, SolverError> {
        match Self::solve_without_variables(problem) {
            Some(solution) => Ok(solution),
            None => self.solver.solve(problem),
        }
    }

    /// Settles a model with no decision variables without calling the backend.
    /// Only its constant rows remain, so the empty assignment is the answer.
    fn solve_without_variables(problem: &OptimizationProblem) -> Option<Solution> {
        if problem.num_variables() > 0 {
            return None;
        }
        let mut solution = if problem.assess(&[]).max_constraint_violation > TRIVIAL_ROW_TOLERANCE {
            Solution::new(SolutionStatus::Infeasible, "Constant constraints cannot be satisfied")
        } else {
            Solution::optimal(problem.objective_value(&[]), Vec::new())
        };
        solution.statistics = SolverStatistics::for_problem(problem, 0.0);
        Some(solution)
    }

    /// Finds the first relaxable constraint class whose removal makes the
    /// model feasible.
    fn diagnose(&self, problem: &OptimizationProblem) -> Option<ConstraintClass> {
        for class in ConstraintClass::RELAXABLE {
            if !problem.has_class(class) {
                continue;
            }
            match self.run(&problem.relaxed(class)) {
                Ok(solution)
                    if matches!(
                        solution.status,
                        SolutionStatus::Optimal | SolutionStatus::Unbounded
                    ) =>
                {
                    warn!("'{}' is infeasible because of its {} constraints", problem.name, class);
                    return Some(class);
                }
                Ok(_) => {}
                Err(e) => {
                    debug!("Diagnosis solve without {} rows failed: {}", class, e);
                }
            }
        }
        None
    }
}
