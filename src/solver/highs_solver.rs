// HiGHS Solver Adapter
// Implements the SolverService interface for HiGHS
// Translates domain problems to a HiGHS row problem and statuses back

use crate::domain::{
    models::{OptimizationProblem, Solution as DomainSolution, SolverStatistics, Variable},
    solver_service::{Result, SolverError, SolverService},
    value_objects::{ConstraintType, OptimizationType, SolutionStatus as DomainSolutionStatus},
};
use highs::{Col, HighsModelStatus, RowProblem, Sense};
use log::{debug, warn};
use std::time::Instant;

pub struct HighsSolver;

impl HighsSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HighsSolver {
    fn default() -> Self {
        Self::new()
    }
}

fn add_column(pb: &mut RowProblem, var: &Variable, cost: f64) -> Col {
    let lower = var.lower_bound;
    match (var.upper_bound, var.is_integer()) {
        (Some(upper), true) => pb.add_integer_column(cost, lower..=upper),
        (Some(upper), false) => pb.add_column(cost, lower..=upper),
        (None, true) => pb.add_integer_column(cost, lower..),
        (None, false) => pb.add_column(cost, lower..),
    }
}

fn build_row_problem(problem: &OptimizationProblem) -> RowProblem {
    let mut objective = vec![0.0; problem.num_variables()];
    for (var, coeff) in problem.objective.expression.canonical_terms() {
        objective[var.index()] = coeff;
    }

    // Use HiGHS RowProblem (add variables first, then constraints)
    let mut pb = RowProblem::default();
    let cols: Vec<Col> = problem
        .variables
        .iter()
        .zip(&objective)
        .map(|(var, &cost)| add_column(&mut pb, var, cost))
        .collect();

    for constraint in &problem.constraints {
        let terms: Vec<(Col, f64)> = constraint
            .expression
            .canonical_terms()
            .into_iter()
            .map(|(var, coeff)| (cols[var.index()], coeff))
            .collect();
        let rhs = constraint.rhs();

        match constraint.constraint_type {
            ConstraintType::LessThanOrEqual => {
                pb.add_row(..=rhs, &terms);
            }
            ConstraintType::Equal => {
                pb.add_row(rhs..=rhs, &terms);
            }
            ConstraintType::GreaterThanOrEqual => {
                pb.add_row(rhs.., &terms);
            }
        }
    }
    pb
}

impl HighsSolver {
    fn run(&self, problem: &OptimizationProblem, presolve: bool) -> HighsOutcome {
        let sense = if problem.objective.optimization_type == OptimizationType::Maximize {
            Sense::Maximise
        } else {
            Sense::Minimise
        };

        let mut model = build_row_problem(problem).optimise(sense);
        let config = &problem.solver_config;
        if !config.verbose {
            model.make_quiet();
        }
        if let Some(limit) = config.time_limit {
            model.set_option("time_limit", limit.as_secs_f64());
        }
        if let Some(gap) = config.gap_tolerance {
            model.set_option("mip_rel_gap", gap);
        }
        if !presolve {
            model.set_option("presolve", "off");
        }

        let solved = model.solve();
        match solved.status() {
            HighsModelStatus::Optimal => {
                HighsOutcome::Solved(solved.get_solution().columns().to_vec())
            }
            status => HighsOutcome::Stopped(status),
        }
    }
}

enum HighsOutcome {
    Solved(Vec<f64>),
    Stopped(HighsModelStatus),
}

impl SolverService for HighsSolver {
    fn solve(&self, problem: &OptimizationProblem) -> Result<DomainSolution> {
        // Validate first
        self.validate(problem)?;

        let start_time = Instant::now();
        debug!(
            "HiGHS: solving '{}' ({} variables, {} constraints)",
            problem.name,
            problem.num_variables(),
            problem.constraints.len()
        );

        let mut outcome = self.run(problem, true);
        if let HighsOutcome::Stopped(HighsModelStatus::UnboundedOrInfeasible) = outcome {
            debug!("HiGHS: presolve could not tell infeasible from unbounded, re-solving without it");
            outcome = self.run(problem, false);
        }

        let solve_time = start_time.elapsed().as_secs_f64() * 1000.0;
        let statistics = SolverStatistics::for_problem(problem, solve_time);

        // Process result
        let solution = match outcome {
            HighsOutcome::Solved(variable_values) => {
                let quality = problem.assess(&variable_values);
                if quality.max_constraint_violation > 1e-6 {
                    warn!(
                        "HiGHS: '{}' solution violates a constraint by {:e}",
                        problem.name, quality.max_constraint_violation
                    );
                }

                let objective = problem.objective_value(&variable_values);
                let mut solution = DomainSolution::optimal(objective, variable_values);
                solution.message = format!("Optimal solution found for '{}'", problem.name);
                solution.with_quality(quality)
            }
            HighsOutcome::Stopped(HighsModelStatus::Infeasible) => DomainSolution::new(
                DomainSolutionStatus::Infeasible,
                "Problem is infeasible: no solution satisfies all constraints",
            ),
            HighsOutcome::Stopped(
                HighsModelStatus::Unbounded | HighsModelStatus::UnboundedOrInfeasible,
            ) => DomainSolution::new(
                DomainSolutionStatus::Unbounded,
                "Problem is unbounded: a cost-bearing variable is missing an upper bound",
            ),
            HighsOutcome::Stopped(HighsModelStatus::ReachedTimeLimit) => DomainSolution::new(
                DomainSolutionStatus::Timeout,
                format!(
                    "Time limit of {:?} reached before optimality was proven",
                    problem.solver_config.time_limit.unwrap_or_default()
                ),
            ),
            HighsOutcome::Stopped(status) => {
                return Err(SolverError::ExecutionFailed(format!(
                    "HiGHS solver returned status: {:?}",
                    status
                )))
            }
        };

        Ok(solution.with_statistics(statistics))
    }

    fn name(&self) -> &str {
        "HiGHS"
    }

    fn supports_mip(&self) -> bool {
        true
    }
}
