// Use case: time-windowed query scheduling over a shared flat-rate slot pool
// Each query starts once within its deadline and is billed on demand or against the pool

use super::extractor::Extractor;
use super::optimizer::{Optimizer, SolveSummary};
use crate::domain::{
    cost_model::CostTable,
    linearizer::scaled_product,
    models::{LinearExpression, OptimizationProblem, VarId},
    problem_builder::{ensure_non_negative, ModelError, ProblemBuilder, Result as ModelResult},
    value_objects::{ConstraintClass, ConstraintType, QueryPricing},
};
use crate::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlatRateBilling {
    /// The whole pool is paid for over the horizon whether used or not.
    Committed,
    /// Each held slot-hour costs `flat_rate_hourly / max_slots`.
    #[default]
    Prorated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledQuery {
    pub id: String,
    /// Data scanned, in the unit `on_demand_unit_cost` is quoted in.
    pub data_volume: f64,
    pub slots_required: u32,
    pub runtime_slots: u32,
    /// The query must finish by the end of this slot index.
    pub deadline_slot: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryScheduleInput {
    pub queries: Vec<ScheduledQuery>,
    pub horizon_slots: u32,
    pub max_slots: u32,
    pub on_demand_unit_cost: f64,
    /// Price of the whole flat-rate pool per hour.
    pub flat_rate_hourly: f64,
    /// Length of one time slot in hours.
    #[serde(default = "default_slot_hours")]
    pub slot_hours: f64,
    #[serde(default)]
    pub billing: FlatRateBilling,
}

fn default_slot_hours() -> f64 {
    1.0
}

impl QueryScheduleInput {
    /// Prices from a cost table for `region`, with one-hour slots.
    pub fn from_cost_table(
        queries: Vec<ScheduledQuery>,
        horizon_slots: u32,
        max_slots: u32,
        costs: &CostTable,
        region: &str,
    ) -> ModelResult<Self> {
        Ok(Self {
            queries,
            horizon_slots,
            max_slots,
            on_demand_unit_cost: costs.on_demand_rate(region)?,
            flat_rate_hourly: costs.flat_rate_hourly,
            slot_hours: default_slot_hours(),
            billing: FlatRateBilling::default(),
        })
    }

    fn validate(&self) -> ModelResult<()> {
        if self.horizon_slots == 0 {
            return Err(ModelError::invalid("horizon_slots", "horizon must contain at least one slot"));
        }
        for q in &self.queries {
            ensure_non_negative(&format!("{}.data_volume", q.id), q.data_volume)?;
            if q.runtime_slots == 0 {
                return Err(ModelError::invalid(
                    format!("{}.runtime_slots", q.id),
                    "runtime must be at least one slot",
                ));
            }
        }
        ensure_non_negative("on_demand_unit_cost", self.on_demand_unit_cost)?;
        ensure_non_negative("flat_rate_hourly", self.flat_rate_hourly)?;
        ensure_non_negative("slot_hours", self.slot_hours)
    }

    /// Last slot (exclusive) by which `query` must have finished.
    fn finish_limit(&self, query: &ScheduledQuery) -> u32 {
        query.deadline_slot.min(self.horizon_slots)
    }

    /// Cost of one slot held for one time slot under prorated billing.
    fn slot_rate(&self) -> f64 {
        if self.max_slots == 0 {
            0.0
        } else {
            self.flat_rate_hourly * self.slot_hours / f64::from(self.max_slots)
        }
    }

    /// Fixed pool cost under committed billing.
    fn committed_cost(&self) -> f64 {
        self.flat_rate_hourly * self.slot_hours * f64::from(self.horizon_slots)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPlacement {
    pub query_id: String,
    pub start_slot: u32,
    pub pricing_mode: QueryPricing,
    /// Pool slots held while running; zero when billed on demand.
    pub slots: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryScheduleReport {
    #[serde(flatten)]
    pub summary: SolveSummary,
    pub schedule: Vec<QueryPlacement>,
    pub on_demand_cost: f64,
    pub flat_rate_cost: f64,
    pub total_cost: Option<f64>,
}

struct QueryScheduleModel {
    problem: OptimizationProblem,
    /// `start[q][t]`: query `q` starts at slot `t`
    start: Vec<Vec<VarId>>,
    on_demand: Vec<VarId>,
    /// Slot usage per query, as `(t, var)` for every slot it may run in.
    slots: Vec<Vec<(u32, VarId)>>,
}

fn build(input: &QueryScheduleInput) -> ModelResult<QueryScheduleModel> {
    input.validate()?;
    let horizon = input.horizon_slots;

    let mut builder = ProblemBuilder::new("query_schedule");
    let mut start = Vec::with_capacity(input.queries.len());
    let mut on_demand = Vec::with_capacity(input.queries.len());
    let mut slots = Vec::with_capacity(input.queries.len());
    let mut usage_per_slot = vec![LinearExpression::new(); horizon as usize];
    let mut objective = LinearExpression::new();

    for q in &input.queries {
        let starts = (0..horizon)
            .map(|t| builder.binary(format!("start[{}][{}]", q.id, t)))
            .collect::<ModelResult<Vec<_>>>()?;
        let billed_on_demand = builder.binary(format!("on_demand[{}]", q.id))?;

        builder.constrain(
            format!("start_once[{}]", q.id),
            ConstraintClass::Coverage,
            LinearExpression::sum(starts.iter().copied()),
            ConstraintType::Equal,
            1.0,
        )?;
        let limit = input.finish_limit(q);
        for (t, &var) in (0..horizon).zip(&starts) {
            if u64::from(t) + u64::from(q.runtime_slots) > u64::from(limit) {
                builder.forbid(
                    format!("past_deadline[{}][{}]", q.id, t),
                    ConstraintClass::Eligibility,
                    var,
                )?;
            }
        }

        // running(q, t) = Σ start[q][s] for s in (t - runtime, t]
        let mut used = Vec::new();
        for t in 0..horizon {
            let first = (t + 1).saturating_sub(q.runtime_slots);
            let running = LinearExpression::sum((first..=t).map(|s| starts[s as usize]));
            let z = scaled_product(
                &mut builder,
                &format!("slots[{}][{}]", q.id, t),
                f64::from(q.slots_required),
                running,
                LinearExpression::one_minus(billed_on_demand),
            )?;
            usage_per_slot[t as usize].push(z, 1.0);
            if input.billing == FlatRateBilling::Prorated {
                objective.push(z, input.slot_rate());
            }
            used.push((t, z));
        }

        objective.push(billed_on_demand, q.data_volume * input.on_demand_unit_cost);
        start.push(starts);
        on_demand.push(billed_on_demand);
        slots.push(used);
    }

    for (t, usage) in usage_per_slot.into_iter().enumerate() {
        if usage.is_empty() {
            continue;
        }
        builder.constrain(
            format!("pool[{}]", t),
            ConstraintClass::Capacity,
            usage,
            ConstraintType::LessThanOrEqual,
            f64::from(input.max_slots),
        )?;
    }

    if input.billing == FlatRateBilling::Committed {
        objective = objective.plus_constant(input.committed_cost());
    }
    builder.minimize(objective);

    Ok(QueryScheduleModel {
        problem: builder.build()?,
        start,
        on_demand,
        slots,
    })
}

impl Optimizer {
    /// Schedules every query within its deadline at the lowest combined
    /// on-demand and flat-rate cost.
    pub fn query_schedule(&self, input: &QueryScheduleInput) -> Result<QueryScheduleReport> {
        let model = build(input)?;
        let outcome = self.solve(model.problem)?;

        let mut report = QueryScheduleReport {
            summary: outcome.summary,
            schedule: Vec::new(),
            on_demand_cost: 0.0,
            flat_rate_cost: 0.0,
            total_cost: None,
        };
        let Some(values) = Extractor::new(&outcome.solution) else {
            return Ok(report);
        };

        for (q, query) in input.queries.iter().enumerate() {
            let start_slot = values.selected(&model.start[q]).unwrap_or(0) as u32;
            let pricing_mode = if values.flag(model.on_demand[q]) {
                report.on_demand_cost += query.data_volume * input.on_demand_unit_cost;
                QueryPricing::OnDemand
            } else {
                QueryPricing::FlatRate
            };
            if input.billing == FlatRateBilling::Prorated {
                report.flat_rate_cost += model.slots[q]
                    .iter()
                    .map(|&(_, var)| values.value(var).max(0.0))
                    .sum::<f64>()
                    * input.slot_rate();
            }
            report.schedule.push(QueryPlacement {
                query_id: query.id.clone(),
                start_slot,
                pricing_mode,
                slots: match pricing_mode {
                    QueryPricing::FlatRate => query.slots_required,
                    QueryPricing::OnDemand => 0,
                },
            });
        }
        if input.billing == FlatRateBilling::Committed {
            report.flat_rate_cost = input.committed_cost();
        }
        report.total_cost = Some(report.on_demand_cost + report.flat_rate_cost);
        Ok(report)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn query(id: &str, runtime_slots: u32, deadline_slot: u32) -> ScheduledQuery {
        ScheduledQuery {
            id: id.to_string(),
            data_volume: 1.0,
            slots_required: 10,
            runtime_slots,
            deadline_slot,
        }
    }

    fn input(queries: Vec<ScheduledQuery>, billing: FlatRateBilling) -> QueryScheduleInput {
        QueryScheduleInput {
            queries,
            horizon_slots: 4,
            max_slots: 20,
            on_demand_unit_cost: 5.0,
            flat_rate_hourly: 4.0,
            slot_hours: 1.0,
            billing,
        }
    }

    #[test]
    fn test_starts_past_deadline_are_forbidden() {
        let model = build(&input(vec![query("q", 2, 3)], FlatRateBilling::Prorated)).unwrap();
        let forbidden: Vec<_> = model
            .problem
            .constraints
            .iter()
            .filter(|c| c.class == ConstraintClass::Eligibility)
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(forbidden, vec!["past_deadline[q][2]", "past_deadline[q][3]"]);
    }

    #[test]
    fn test_runtime_longer_than_horizon_forbids_every_start() {
        let model = build(&input(vec![query("q", u32::MAX, 5)], FlatRateBilling::Prorated)).unwrap();
        let forbidden = model
            .problem
            .constraints
            .iter()
            .filter(|c| c.class == ConstraintClass::Eligibility)
            .count();
        assert_eq!(forbidden, 4);
    }

    #[test]
    fn test_no_queries_leaves_committed_pool_cost() {
        let model = build(&input(Vec::new(), FlatRateBilling::Committed)).unwrap();
        assert_eq!(model.problem.num_variables(), 0);
        assert_eq!(model.problem.objective_value(&[]), 16.0);
    }

    #[test]
    fn test_horizon_caps_deadline() {
        let model = build(&input(vec![query("q", 1, 100)], FlatRateBilling::Prorated)).unwrap();
        assert_eq!(model.start[0].len(), 4);
        assert!(!model
            .problem
            .constraints
            .iter()
            .any(|c| c.class == ConstraintClass::Eligibility));
    }

    #[test]
    fn test_billing_shapes_objective() {
        let prorated = build(&input(vec![query("q", 1, 4)], FlatRateBilling::Prorated)).unwrap();
        assert_eq!(prorated.problem.objective.expression.constant, 0.0);
        let (_, slot) = prorated.slots[0][0];
        let coefficient = prorated
            .problem
            .objective
            .expression
            .canonical_terms()
            .into_iter()
            .find(|&(var, _)| var == slot)
            .map(|(_, c)| c);
        assert_eq!(coefficient, Some(0.2));

        let committed = build(&input(vec![query("q", 1, 4)], FlatRateBilling::Committed)).unwrap();
        assert_eq!(committed.problem.objective.expression.constant, 16.0);
    }

    #[test]
    fn test_empty_pool_has_zero_slot_rate() {
        let mut empty = input(vec![query("q", 1, 4)], FlatRateBilling::Prorated);
        empty.max_slots = 0;
        assert_eq!(empty.slot_rate(), 0.0);
        assert!(build(&empty).is_ok());
    }

    #[test]
    fn test_rejects_zero_runtime() {
        let result = build(&input(vec![query("q", 0, 4)], FlatRateBilling::Prorated));
        assert!(matches!(result, Err(ModelError::InvalidInput { .. })));
    }

    #[test]
    fn test_billing_defaults_to_prorated() {
        let input: QueryScheduleInput = serde_json::from_str(
            r#"{"queries": [], "horizon_slots": 9, "max_slots": 100,
                "on_demand_unit_cost": 5.0, "flat_rate_hourly": 4.0}"#,
        )
        .unwrap();
        assert_eq!(input.billing, FlatRateBilling::Prorated);
        assert_eq!(input.slot_hours, 1.0);
    }
}
