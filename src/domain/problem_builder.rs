// Variable registry + constraint list + objective, shared by every scenario encoder.
// Malformed input is rejected here, before a solver ever sees the model.

use super::models::{
    Constraint, LinearExpression, ObjectiveFunction, OptimizationProblem, SolverConfig, VarId,
    Variable,
};
use super::value_objects::{ConstraintClass, ConstraintType};
use std::collections::HashSet;

/// Errors raised while describing a model
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Duplicate variable name '{0}'")]
    DuplicateVariable(String),

    #[error("Variable '{name}' has invalid bounds [{lower}, {upper}]")]
    InvalidBounds { name: String, lower: f64, upper: f64 },

    #[error("Constraint '{0}' references a variable that does not belong to this model")]
    UnknownVariable(String),

    #[error("Constraint '{0}' has a non-finite coefficient or right-hand side")]
    NonFiniteRow(String),

    #[error("Capacity constraint '{name}' has right-hand side {rhs}; capacities must be finite and non-negative")]
    NegativeCapacity { name: String, rhs: f64 },

    #[error("Cannot linearize '{0}': the bounded factor has no finite upper bound")]
    UnboundedProduct(String),

    #[error("Invalid input '{field}': {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Unknown pricing key '{0}'")]
    UnknownPricingKey(String),

    #[error("Model '{0}' has no objective")]
    MissingObjective(String),
}

impl ModelError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ModelError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;

/// Rejects negative or non-finite quantities.
pub fn ensure_non_negative(field: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ModelError::invalid(
            field,
            format!("expected a finite non-negative number, got {}", value),
        ))
    }
}

/// Builds an [`OptimizationProblem`] one variable and row at a time.
#[derive(Debug)]
pub struct ProblemBuilder {
    name: String,
    variables: Vec<Variable>,
    names: HashSet<String>,
    constraints: Vec<Constraint>,
    objective: Option<LinearExpression>,
}

impl ProblemBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: Vec::new(),
            names: HashSet::new(),
            constraints: Vec::new(),
            objective: None,
        }
    }

    /// Continuous variable in `[lower, upper]`; `None` means no upper bound.
    pub fn continuous(
        &mut self,
        name: impl Into<String>,
        lower: f64,
        upper: Option<f64>,
    ) -> Result<VarId> {
        self.register(Variable::continuous(name).with_bounds(lower, upper))
    }

    pub fn integer(
        &mut self,
        name: impl Into<String>,
        lower: f64,
        upper: Option<f64>,
    ) -> Result<VarId> {
        self.register(Variable::integer(name).with_bounds(lower, upper))
    }

    pub fn binary(&mut self, name: impl Into<String>) -> Result<VarId> {
        self.register(Variable::binary(name))
    }

    fn register(&mut self, variable: Variable) -> Result<VarId> {
        let upper = variable.upper_bound.unwrap_or(f64::INFINITY);
        if !variable.lower_bound.is_finite() || upper.is_nan() || variable.lower_bound > upper {
            return Err(ModelError::InvalidBounds {
                name: variable.name,
                lower: variable.lower_bound,
                upper,
            });
        }
        if let Some(upper) = variable.upper_bound {
            if upper.is_infinite() {
                return Err(ModelError::InvalidBounds {
                    name: variable.name,
                    lower: variable.lower_bound,
                    upper,
                });
            }
        }
        if !self.names.insert(variable.name.clone()) {
            return Err(ModelError::DuplicateVariable(variable.name));
        }
        let id = VarId(self.variables.len());
        self.variables.push(variable);
        Ok(id)
    }

    pub fn variable(&self, id: VarId) -> Option<&Variable> {
        self.variables.get(id.0)
    }

    /// Adds `expression <op> rhs`.
    pub fn constrain(
        &mut self,
        name: impl Into<String>,
        class: ConstraintClass,
        expression: LinearExpression,
        constraint_type: ConstraintType,
        rhs: f64,
    ) -> Result<()> {
        let name = name.into();
        if expression.terms.iter().any(|&(var, _)| var.0 >= self.variables.len()) {
            return Err(ModelError::UnknownVariable(name));
        }
        let finite = rhs.is_finite()
            && expression.constant.is_finite()
            && expression.terms.iter().all(|(_, c)| c.is_finite());
        if !finite {
            return Err(ModelError::NonFiniteRow(name));
        }
        let constraint = Constraint::new(class, expression, constraint_type, rhs).with_name(name);
        if class == ConstraintClass::Capacity && constraint.rhs() < 0.0 {
            return Err(ModelError::NegativeCapacity {
                rhs: constraint.rhs(),
                name: constraint.name,
            });
        }
        self.constraints.push(constraint);
        Ok(())
    }

    /// Pins a variable to zero, e.g. an option the item is not eligible for.
    pub fn forbid(&mut self, name: impl Into<String>, class: ConstraintClass, var: VarId) -> Result<()> {
        self.constrain(name, class, var.into(), ConstraintType::Equal, 0.0)
    }

    pub fn minimize(&mut self, expression: LinearExpression) {
        self.objective = Some(expression);
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn build(self) -> Result<OptimizationProblem> {
        let expression = self
            .objective
            .ok_or_else(|| ModelError::MissingObjective(self.name.clone()))?;
        if expression.terms.iter().any(|&(var, _)| var.0 >= self.variables.len()) {
            return Err(ModelError::UnknownVariable(format!("{} objective", self.name)));
        }
        if !expression.constant.is_finite() || expression.terms.iter().any(|(_, c)| !c.is_finite()) {
            return Err(ModelError::NonFiniteRow(format!("{} objective", self.name)));
        }
        // Cost-bearing variables are quantities and may not go negative.
        if let Some(var) = expression
            .terms
            .iter()
            .map(|&(var, _)| &self.variables[var.0])
            .find(|var| var.lower_bound < 0.0)
        {
            return Err(ModelError::InvalidBounds {
                name: var.name.clone(),
                lower: var.lower_bound,
                upper: var.upper_bound.unwrap_or(f64::INFINITY),
            });
        }

        Ok(OptimizationProblem {
            name: self.name,
            description: String::new(),
            objective: ObjectiveFunction::minimize(expression),
            constraints: self.constraints,
            variables: self.variables,
            solver_config: SolverConfig::default(),
        })
    }
}
