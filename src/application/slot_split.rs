// Use case: reserved versus on-demand capacity split
// On-demand has no upper bound, so every well-formed input is feasible

use super::extractor::Extractor;
use super::optimizer::{Optimizer, SolveSummary};
use crate::domain::{
    cost_model::CostTable,
    models::{LinearExpression, OptimizationProblem, VarId},
    problem_builder::{ensure_non_negative, ProblemBuilder, Result as ModelResult},
    value_objects::{ConstraintClass, ConstraintType},
};
use crate::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotSplitInput {
    /// Demand to cover, in capacity-equivalent units (e.g. TiB scanned).
    pub demand: f64,
    pub max_reserved: u32,
    /// Price of one reserved unit per hour.
    pub reserved_unit_hour_cost: f64,
    /// Price of one unit of demand served on demand.
    pub on_demand_unit_cost: f64,
    /// Demand served by one reserved unit over the billing period.
    pub units_per_reserved: f64,
    pub hours: f64,
}

impl SlotSplitInput {
    /// Fills the prices from a cost table for `region`.
    pub fn from_cost_table(
        demand: f64,
        max_reserved: u32,
        costs: &CostTable,
        region: &str,
        hours: f64,
    ) -> ModelResult<Self> {
        Ok(Self {
            demand,
            max_reserved,
            reserved_unit_hour_cost: costs.reserved_slot_hour,
            on_demand_unit_cost: costs.on_demand_rate(region)?,
            units_per_reserved: costs.tib_per_reserved_unit,
            hours,
        })
    }

    fn validate(&self) -> ModelResult<()> {
        ensure_non_negative("demand", self.demand)?;
        ensure_non_negative("reserved_unit_hour_cost", self.reserved_unit_hour_cost)?;
        ensure_non_negative("on_demand_unit_cost", self.on_demand_unit_cost)?;
        ensure_non_negative("units_per_reserved", self.units_per_reserved)?;
        ensure_non_negative("hours", self.hours)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotSplitReport {
    #[serde(flatten)]
    pub summary: SolveSummary,
    pub reserved_units: u64,
    pub on_demand_units: f64,
    pub reserved_cost: f64,
    pub on_demand_cost: f64,
    pub total_cost: Option<f64>,
}

struct SlotSplitModel {
    problem: OptimizationProblem,
    reserved: VarId,
    on_demand: VarId,
}

fn build(input: &SlotSplitInput) -> ModelResult<SlotSplitModel> {
    input.validate()?;

    let mut builder = ProblemBuilder::new("slot_split");
    let reserved = builder.integer("reserved", 0.0, Some(f64::from(input.max_reserved)))?;
    let on_demand = builder.continuous("on_demand", 0.0, None)?;

    builder.constrain(
        "cover_demand",
        ConstraintClass::Coverage,
        LinearExpression::from(on_demand).term(reserved, input.units_per_reserved),
        ConstraintType::GreaterThanOrEqual,
        input.demand,
    )?;
    builder.minimize(
        LinearExpression::new()
            .term(reserved, input.reserved_unit_hour_cost * input.hours)
            .term(on_demand, input.on_demand_unit_cost),
    );

    Ok(SlotSplitModel {
        problem: builder.build()?,
        reserved,
        on_demand,
    })
}

impl Optimizer {
    /// Cheapest mix of reserved units and on-demand capacity covering the demand.
    pub fn slot_split(&self, input: &SlotSplitInput) -> Result<SlotSplitReport> {
        let model = build(input)?;
        let outcome = self.solve(model.problem)?;

        let mut report = SlotSplitReport {
            summary: outcome.summary,
            reserved_units: 0,
            on_demand_units: 0.0,
            reserved_cost: 0.0,
            on_demand_cost: 0.0,
            total_cost: None,
        };
        if let Some(values) = Extractor::new(&outcome.solution) {
            report.reserved_units = values.count(model.reserved);
            report.on_demand_units = values.value(model.on_demand).max(0.0);
            report.reserved_cost =
                report.reserved_units as f64 * input.reserved_unit_hour_cost * input.hours;
            report.on_demand_cost = report.on_demand_units * input.on_demand_unit_cost;
            report.total_cost = Some(report.reserved_cost + report.on_demand_cost);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::domain::problem_builder::ModelError;

    #[test]
    fn test_rejects_negative_demand() {
        let input = SlotSplitInput {
            demand: -1.0,
            max_reserved: 10,
            reserved_unit_hour_cost: 0.05,
            on_demand_unit_cost: 6.25,
            units_per_reserved: 100.0,
            hours: 720.0,
        };
        assert!(matches!(build(&input), Err(ModelError::InvalidInput { .. })));
    }

    #[test]
    fn test_model_shape() {
        let input = SlotSplitInput {
            demand: 500.0,
            max_reserved: 50,
            reserved_unit_hour_cost: 0.055,
            on_demand_unit_cost: 6.25,
            units_per_reserved: 100.0,
            hours: 720.0,
        };
        let model = build(&input).unwrap();
        let reserved = &model.problem.variables[model.reserved.index()];
        assert!(reserved.is_integer());
        assert_eq!(reserved.upper_bound, Some(50.0));
        assert_eq!(model.problem.variables[model.on_demand.index()].upper_bound, None);
        assert_eq!(model.problem.constraints.len(), 1);
    }

    #[test]
    fn test_from_cost_table() {
        let input = SlotSplitInput::from_cost_table(500.0, 50, &CostTable::default(), "eu", 720.0)
            .unwrap();
        assert_eq!(input.on_demand_unit_cost, 7.0);
        assert_eq!(input.units_per_reserved, 100.0);
    }
}
