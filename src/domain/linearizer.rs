// Domain linearizations of products of decision variables
// Every big-M coefficient is the proven bound supplied by the caller

use super::models::{LinearExpression, VarId};
use super::problem_builder::{ModelError, ProblemBuilder, Result};
use super::value_objects::{ConstraintClass, ConstraintType, VariableType};

const CLASS: ConstraintClass = ConstraintClass::Linking;

/// `z = scale · x · y` where `x` and `y` are binary-valued expressions.
///
/// McCormick envelope, exact when `x` and `y` take values in {0, 1}:
///
/// ```text
/// z ≤ scale · x
/// z ≤ scale · y
/// z ≥ scale · (x + y − 1)
/// 0 ≤ z ≤ scale
/// ```
pub fn scaled_product(
    builder: &mut ProblemBuilder,
    name: &str,
    scale: f64,
    x: LinearExpression,
    y: LinearExpression,
) -> Result<VarId> {
    if !scale.is_finite() || scale < 0.0 {
        return Err(ModelError::invalid(
            name,
            format!("product scale must be finite and non-negative, got {}", scale),
        ));
    }
    let z = builder.continuous(name, 0.0, Some(scale))?;

    builder.constrain(
        format!("{}_le_x", name),
        CLASS,
        LinearExpression::from(z).plus(x.clone().scaled(-scale)),
        ConstraintType::LessThanOrEqual,
        0.0,
    )?;
    builder.constrain(
        format!("{}_le_y", name),
        CLASS,
        LinearExpression::from(z).plus(y.clone().scaled(-scale)),
        ConstraintType::LessThanOrEqual,
        0.0,
    )?;
    builder.constrain(
        format!("{}_ge_xy", name),
        CLASS,
        LinearExpression::from(z).plus(x.plus(y).plus_constant(-1.0).scaled(-scale)),
        ConstraintType::GreaterThanOrEqual,
        0.0,
    )?;
    Ok(z)
}

/// `z = a · b` for two binaries (logical AND).
pub fn binary_product(builder: &mut ProblemBuilder, name: &str, a: VarId, b: VarId) -> Result<VarId> {
    scaled_product(builder, name, 1.0, a.into(), b.into())
}

/// `z = indicator · value` for a binary `indicator` and a non-negative
/// variable `value` with a finite upper bound `U`:
///
/// ```text
/// z ≤ U · indicator
/// z ≤ value
/// z ≥ value − U · (1 − indicator)
/// 0 ≤ z ≤ U
/// ```
///
/// `z` is integer when `value` is.
pub fn bounded_product(
    builder: &mut ProblemBuilder,
    name: &str,
    indicator: VarId,
    value: VarId,
) -> Result<VarId> {
    let (upper, lower, integral) = match builder.variable(value) {
        Some(var) => (
            var.upper_bound,
            var.lower_bound,
            var.variable_type != VariableType::Continuous,
        ),
        None => return Err(ModelError::UnknownVariable(name.to_string())),
    };
    let upper = upper.ok_or_else(|| ModelError::UnboundedProduct(name.to_string()))?;
    if lower < 0.0 {
        return Err(ModelError::invalid(
            name,
            "bounded factor must be non-negative",
        ));
    }

    let z = if integral {
        builder.integer(name, 0.0, Some(upper))?
    } else {
        builder.continuous(name, 0.0, Some(upper))?
    };

    builder.constrain(
        format!("{}_le_indicator", name),
        CLASS,
        LinearExpression::from(z).term(indicator, -upper),
        ConstraintType::LessThanOrEqual,
        0.0,
    )?;
    builder.constrain(
        format!("{}_le_value", name),
        CLASS,
        LinearExpression::from(z).term(value, -1.0),
        ConstraintType::LessThanOrEqual,
        0.0,
    )?;
    // z - value - U·indicator ≥ -U
    builder.constrain(
        format!("{}_ge_value", name),
        CLASS,
        LinearExpression::from(z)
            .term(value, -1.0)
            .term(indicator, -upper),
        ConstraintType::GreaterThanOrEqual,
        -upper,
    )?;
    Ok(z)
}

/// Binary `c = 1` exactly when none of the mutually exclusive `indicators` is set.
pub fn complement(builder: &mut ProblemBuilder, name: &str, indicators: &[VarId]) -> Result<VarId> {
    let c = builder.binary(name)?;

    builder.constrain(
        format!("{}_ge", name),
        CLASS,
        LinearExpression::sum(indicators.iter().copied()).term(c, 1.0),
        ConstraintType::GreaterThanOrEqual,
        1.0,
    )?;
    for (k, &indicator) in indicators.iter().enumerate() {
        builder.constrain(
            format!("{}_le_{}", name, k),
            CLASS,
            LinearExpression::from(c).term(indicator, 1.0),
            ConstraintType::LessThanOrEqual,
            1.0,
        )?;
    }
    Ok(c)
}
