use crate::domain::{
    models::{LinearExpression, OptimizationProblem, Solution as DomainSolution, SolverStatistics},
    solver_service::{Result, SolverError, SolverService},
    value_objects::{ConstraintType, OptimizationType, SolutionStatus as DomainSolutionStatus},
};
use good_lp::{
    solvers::coin_cbc, variable, variables, Expression, ResolutionError,
    Solution as GoodLpSolutionTrait, SolverModel, Variable as GoodLpVariable,
};
use log::debug;
use std::time::Instant;

pub struct CoinCbcSolver;

impl CoinCbcSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CoinCbcSolver {
    fn default() -> Self {
        Self::new()
    }
}

fn to_expression(expression: &LinearExpression, lp_variables: &[GoodLpVariable]) -> Expression {
    let mut expr: Expression = expression.constant.into();
    for (var, coeff) in expression.canonical_terms() {
        expr += coeff * lp_variables[var.index()];
    }
    expr
}

impl SolverService for CoinCbcSolver {
    fn solve(&self, problem: &OptimizationProblem) -> Result<DomainSolution> {
        // Validate first
        self.validate(problem)?;

        let start_time = Instant::now();
        debug!(
            "CBC: solving '{}' ({} variables, {} constraints)",
            problem.name,
            problem.num_variables(),
            problem.constraints.len()
        );

        // Build variables using good_lp
        let mut vars = variables!();
        let lp_variables: Vec<GoodLpVariable> = problem
            .variables
            .iter()
            .map(|var_def| {
                let lower = var_def.lower_bound;
                let upper = var_def.upper_bound.unwrap_or(f64::INFINITY);
                if var_def.is_integer() {
                    vars.add(variable().integer().min(lower).max(upper))
                } else {
                    vars.add(variable().min(lower).max(upper))
                }
            })
            .collect();

        // good_lp minimises, so negate for maximisation
        let mut objective = to_expression(&problem.objective.expression, &lp_variables);
        if problem.objective.optimization_type == OptimizationType::Maximize {
            objective = objective * -1.0;
        }

        let mut lp_model = vars.minimise(objective).using(coin_cbc::coin_cbc);
        let config = &problem.solver_config;
        if !config.verbose {
            lp_model.set_parameter("log", "0");
        }
        if let Some(limit) = config.time_limit {
            lp_model.set_parameter("seconds", &limit.as_secs_f64().to_string());
        }
        if let Some(gap) = config.gap_tolerance {
            lp_model.set_parameter("ratioGap", &gap.to_string());
        }

        for constraint in &problem.constraints {
            let lhs = to_expression(&constraint.expression, &lp_variables);
            lp_model = match constraint.constraint_type {
                ConstraintType::LessThanOrEqual => lp_model.with(lhs.leq(constraint.bound)),
                ConstraintType::Equal => lp_model.with(lhs.eq(constraint.bound)),
                ConstraintType::GreaterThanOrEqual => lp_model.with(lhs.geq(constraint.bound)),
            };
        }

        // Solve the problem
        let solution_result = lp_model.solve();
        let elapsed = start_time.elapsed();
        let statistics = SolverStatistics::for_problem(problem, elapsed.as_secs_f64() * 1000.0);
        let timed_out = config.time_limit.is_some_and(|limit| elapsed >= limit);

        // Process result
        let solution = match solution_result {
            Ok(_) if timed_out => DomainSolution::new(
                DomainSolutionStatus::Timeout,
                "Time limit reached before optimality was proven",
            ),
            Ok(sol) => {
                let variable_values: Vec<f64> =
                    lp_variables.iter().map(|&var| sol.value(var)).collect();
                let quality = problem.assess(&variable_values);
                let objective = problem.objective_value(&variable_values);

                let mut solution = DomainSolution::optimal(objective, variable_values);
                solution.message = format!("Optimal solution found for '{}'", problem.name);
                solution.with_quality(quality)
            }
            Err(ResolutionError::Infeasible) => DomainSolution::new(
                DomainSolutionStatus::Infeasible,
                "Problem is infeasible: no solution satisfies all constraints",
            ),
            Err(ResolutionError::Unbounded) => DomainSolution::new(
                DomainSolutionStatus::Unbounded,
                "Problem is unbounded: a cost-bearing variable is missing an upper bound",
            ),
            Err(ResolutionError::Other(reason)) if reason == "Stopped" => DomainSolution::new(
                DomainSolutionStatus::Timeout,
                "Time limit reached before a feasible solution was found",
            ),
            Err(e) => return Err(SolverError::ExecutionFailed(format!("{:?}", e))),
        };

        Ok(solution.with_statistics(statistics))
    }

    fn name(&self) -> &str {
        "COIN-OR CBC"
    }

    fn supports_mip(&self) -> bool {
        true
    }
}
