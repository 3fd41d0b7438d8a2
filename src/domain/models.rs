use super::value_objects::{
    ConstraintClass, ConstraintType, OptimizationType, SolutionStatus, SolverBackend, VariableType,
};
use std::collections::BTreeMap;
use std::time::Duration;

/// Identity of a decision variable inside one [`OptimizationProblem`].
///
/// Ids are handed out by the problem builder and index its variable registry;
/// they mean nothing outside the problem that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub(crate) usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Decision variable in an optimization problem
#[derive(Debug, Clone)]
pub struct Variable {
    pub variable_type: VariableType,
    pub lower_bound: f64,
    /// `None` is an explicit infinite upper bound.
    pub upper_bound: Option<f64>,
    pub name: String,
}

impl Variable {
    pub fn continuous(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Continuous,
            lower_bound: 0.0,
            upper_bound: None,
            name: name.into(),
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Integer,
            lower_bound: 0.0,
            upper_bound: None,
            name: name.into(),
        }
    }

    pub fn binary(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Binary,
            lower_bound: 0.0,
            upper_bound: Some(1.0),
            name: name.into(),
        }
    }

    pub fn with_bounds(mut self, lower: f64, upper: Option<f64>) -> Self {
        self.lower_bound = lower;
        self.upper_bound = upper;
        self
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self.variable_type,
            VariableType::Integer | VariableType::Binary
        )
    }
}

/// Affine expression `Σ coeff·var + constant`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpression {
    pub terms: Vec<(VarId, f64)>,
    pub constant: f64,
}

impl LinearExpression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    /// `1 - var`, the complement of a binary indicator.
    pub fn one_minus(var: VarId) -> Self {
        Self::constant(1.0).term(var, -1.0)
    }

    /// Unweighted sum of variables.
    pub fn sum<I: IntoIterator<Item = VarId>>(vars: I) -> Self {
        vars.into_iter().map(|v| (v, 1.0)).collect()
    }

    pub fn term(mut self, var: VarId, coefficient: f64) -> Self {
        self.push(var, coefficient);
        self
    }

    pub fn push(&mut self, var: VarId, coefficient: f64) {
        if coefficient != 0.0 {
            self.terms.push((var, coefficient));
        }
    }

    pub fn plus(mut self, other: LinearExpression) -> Self {
        self.terms.extend(other.terms);
        self.constant += other.constant;
        self
    }

    pub fn plus_constant(mut self, value: f64) -> Self {
        self.constant += value;
        self
    }

    pub fn scaled(mut self, factor: f64) -> Self {
        for (_, coefficient) in &mut self.terms {
            *coefficient *= factor;
        }
        self.constant *= factor;
        self.terms.retain(|&(_, c)| c != 0.0);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Terms with repeated variables merged, zeros dropped, sorted by id.
    pub fn canonical_terms(&self) -> Vec<(VarId, f64)> {
        let mut merged: BTreeMap<VarId, f64> = BTreeMap::new();
        for &(var, coefficient) in &self.terms {
            *merged.entry(var).or_insert(0.0) += coefficient;
        }
        merged.into_iter().filter(|&(_, c)| c != 0.0).collect()
    }

    /// Value of the expression for a full assignment of variable values.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(var, coefficient)| coefficient * values.get(var.0).copied().unwrap_or(0.0))
            .sum::<f64>()
            + self.constant
    }
}

impl From<VarId> for LinearExpression {
    fn from(var: VarId) -> Self {
        Self::new().term(var, 1.0)
    }
}

impl FromIterator<(VarId, f64)> for LinearExpression {
    fn from_iter<I: IntoIterator<Item = (VarId, f64)>>(iter: I) -> Self {
        let mut expression = Self::new();
        for (var, coefficient) in iter {
            expression.push(var, coefficient);
        }
        expression
    }
}

/// Objective function to minimize or maximize
#[derive(Debug, Clone)]
pub struct ObjectiveFunction {
    pub optimization_type: OptimizationType,
    pub expression: LinearExpression,
}

impl ObjectiveFunction {
    pub fn minimize(expression: LinearExpression) -> Self {
        Self {
            optimization_type: OptimizationType::Minimize,
            expression,
        }
    }
}

/// Linear constraint on variables
#[derive(Debug, Clone)]
pub struct Constraint {
    pub constraint_type: ConstraintType,
    pub class: ConstraintClass,
    pub expression: LinearExpression,
    pub bound: f64,
    pub name: String,
}

impl Constraint {
    pub fn new(
        class: ConstraintClass,
        expression: LinearExpression,
        constraint_type: ConstraintType,
        bound: f64,
    ) -> Self {
        Self {
            constraint_type,
            class,
            expression,
            bound,
            name: String::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Right-hand side once the expression constant is moved across.
    pub fn rhs(&self) -> f64 {
        self.bound - self.expression.constant
    }

    /// How far `values` are from satisfying this row (0 when satisfied).
    pub fn violation(&self, values: &[f64]) -> f64 {
        let activity = self.expression.evaluate(values);
        match self.constraint_type {
            ConstraintType::LessThanOrEqual => (activity - self.bound).max(0.0),
            ConstraintType::GreaterThanOrEqual => (self.bound - activity).max(0.0),
            ConstraintType::Equal => (activity - self.bound).abs(),
        }
    }
}

/// Configuration for the solver
#[derive(Debug, Clone, Default)]
pub struct SolverConfig {
    pub backend: SolverBackend,
    pub time_limit: Option<Duration>,
    pub gap_tolerance: Option<f64>,
    pub verbose: bool,
}

/// Complete optimization problem
#[derive(Debug, Clone)]
pub struct OptimizationProblem {
    pub name: String,
    pub description: String,
    pub objective: ObjectiveFunction,
    pub constraints: Vec<Constraint>,
    pub variables: Vec<Variable>,
    pub solver_config: SolverConfig,
}

impl OptimizationProblem {
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.solver_config = config;
        self
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_integer_variables(&self) -> usize {
        self.variables.iter().filter(|v| v.is_integer()).count()
    }

    pub fn num_binary_variables(&self) -> usize {
        self.variables
            .iter()
            .filter(|v| v.variable_type == VariableType::Binary)
            .count()
    }

    pub fn is_mixed_integer(&self) -> bool {
        self.num_integer_variables() > 0
    }

    pub fn has_class(&self, class: ConstraintClass) -> bool {
        self.constraints.iter().any(|c| c.class == class)
    }

    /// Copy of the problem without the rows of `class`.
    pub fn relaxed(&self, class: ConstraintClass) -> Self {
        let mut relaxed = self.clone();
        relaxed.constraints.retain(|c| c.class != class);
        relaxed.name = format!("{} (without {} rows)", self.name, class);
        relaxed
    }

    /// Objective value of a full assignment, constant included.
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective.expression.evaluate(values)
    }

    /// Measures how well `values` honour rows and integrality.
    pub fn assess(&self, values: &[f64]) -> SolutionQuality {
        let max_constraint_violation = self
            .constraints
            .iter()
            .map(|c| c.violation(values))
            .fold(0.0, f64::max);
        let max_integrality_violation = self
            .variables
            .iter()
            .zip(values)
            .filter(|(var, _)| var.is_integer())
            .map(|(_, value)| (value - value.round()).abs())
            .fold(0.0, f64::max);

        SolutionQuality {
            max_constraint_violation,
            max_integrality_violation,
        }
    }
}

/// Statistics about the solve process
#[derive(Debug, Clone, Default)]
pub struct SolverStatistics {
    pub solve_time_ms: f64,
    pub num_variables: u32,
    pub num_constraints: u32,
    pub num_integer_vars: u32,
    pub num_binary_vars: u32,
}

impl SolverStatistics {
    pub fn for_problem(problem: &OptimizationProblem, solve_time_ms: f64) -> Self {
        Self {
            solve_time_ms,
            num_variables: problem.num_variables() as u32,
            num_constraints: problem.constraints.len() as u32,
            num_integer_vars: (problem.num_integer_variables() - problem.num_binary_variables())
                as u32,
            num_binary_vars: problem.num_binary_variables() as u32,
        }
    }
}

/// Quality metrics for the solution
#[derive(Debug, Clone, Default)]
pub struct SolutionQuality {
    pub max_constraint_violation: f64,
    pub max_integrality_violation: f64,
}

/// Solution to an optimization problem
#[derive(Debug, Clone)]
pub struct Solution {
    pub status: SolutionStatus,
    pub optimal_value: Option<f64>,
    pub variable_values: Vec<f64>,
    pub message: String,
    pub statistics: SolverStatistics,
    pub quality: SolutionQuality,
}

impl Solution {
    pub fn new(status: SolutionStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            optimal_value: None,
            variable_values: Vec::new(),
            message: message.into(),
            statistics: SolverStatistics::default(),
            quality: SolutionQuality::default(),
        }
    }

    pub fn optimal(value: f64, variable_values: Vec<f64>) -> Self {
        Self {
            status: SolutionStatus::Optimal,
            optimal_value: Some(value),
            variable_values,
            message: "Optimal solution found".to_string(),
            statistics: SolverStatistics::default(),
            quality: SolutionQuality::default(),
        }
    }

    pub fn with_statistics(mut self, statistics: SolverStatistics) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn with_quality(mut self, quality: SolutionQuality) -> Self {
        self.quality = quality;
        self
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    pub fn value(&self, var: VarId) -> Option<f64> {
        self.variable_values.get(var.0).copied()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_expression_evaluation() {
        let expr = LinearExpression::one_minus(VarId(1)).term(VarId(0), 2.0);
        assert_eq!(expr.evaluate(&[3.0, 1.0]), 6.0);
        assert_eq!(expr.scaled(0.5).evaluate(&[3.0, 0.0]), 3.5);
    }

    #[test]
    fn test_zero_coefficients_are_dropped() {
        let expr: LinearExpression = vec![(VarId(0), 0.0), (VarId(1), 1.5)].into_iter().collect();
        assert_eq!(expr.terms, vec![(VarId(1), 1.5)]);
    }

    #[test]
    fn test_canonical_terms_merge_duplicates() {
        let expr = LinearExpression::from(VarId(2))
            .term(VarId(0), 1.0)
            .term(VarId(2), -1.0)
            .term(VarId(0), 2.0);
        assert_eq!(expr.canonical_terms(), vec![(VarId(0), 3.0)]);
    }

    #[test]
    fn test_constraint_violation() {
        let row = Constraint::new(
            ConstraintClass::Capacity,
            LinearExpression::sum([VarId(0), VarId(1)]),
            ConstraintType::LessThanOrEqual,
            2.0,
        );
        assert_eq!(row.violation(&[1.0, 0.5]), 0.0);
        assert_eq!(row.violation(&[2.0, 0.5]), 0.5);
    }
}
