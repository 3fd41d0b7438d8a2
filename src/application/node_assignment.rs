// Use case: workload placement with a pricing mode per node
// Node cost base · active · mode is linearized per mode, bounded by the node's monthly price in that mode

use super::extractor::Extractor;
use super::optimizer::{Optimizer, SolveSummary};
use crate::domain::{
    cost_model::{CostTable, MachineType},
    linearizer::{complement, scaled_product},
    models::{LinearExpression, OptimizationProblem, VarId},
    problem_builder::{ensure_non_negative, ModelError, ProblemBuilder, Result as ModelResult},
    value_objects::{ConstraintClass, ConstraintType, PricingMode},
};
use crate::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workload {
    pub id: String,
    pub vcpu: f64,
    pub memory_gb: f64,
    #[serde(default)]
    pub disk_gb: f64,
    #[serde(default)]
    pub egress_gb: f64,
    #[serde(default)]
    pub monitoring_gb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: String,
    /// Key into the cost table's machine types.
    pub machine_type: String,
    #[serde(default = "default_true")]
    pub allow_spot: bool,
    #[serde(default = "default_true")]
    pub allow_committed_use: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeAssignmentInput {
    pub workloads: Vec<Workload>,
    pub nodes: Vec<NodeSpec>,
}

impl NodeAssignmentInput {
    fn validate(&self) -> ModelResult<()> {
        if self.nodes.is_empty() {
            return Err(ModelError::invalid("nodes", "at least one node is required"));
        }
        for w in &self.workloads {
            ensure_non_negative(&format!("{}.vcpu", w.id), w.vcpu)?;
            ensure_non_negative(&format!("{}.memory_gb", w.id), w.memory_gb)?;
            ensure_non_negative(&format!("{}.disk_gb", w.id), w.disk_gb)?;
            ensure_non_negative(&format!("{}.egress_gb", w.id), w.egress_gb)?;
            ensure_non_negative(&format!("{}.monitoring_gb", w.id), w.monitoring_gb)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadAssignment {
    pub workload_id: String,
    pub node_id: String,
    pub pricing_mode: PricingMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSummary {
    pub node_id: String,
    pub active: bool,
    /// `None` for inactive nodes.
    pub pricing_mode: Option<PricingMode>,
    pub vcpu_used: f64,
    pub memory_used_gb: f64,
    pub monthly_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeAssignmentReport {
    #[serde(flatten)]
    pub summary: SolveSummary,
    pub workload_assignments: Vec<WorkloadAssignment>,
    pub node_summary: Vec<NodeSummary>,
    pub compute_cost: f64,
    pub free_tier_credit: f64,
    pub total_cost: Option<f64>,
}

/// Decision variables of one node.
struct NodeVars {
    active: VarId,
    spot: VarId,
    cud: VarId,
    standard: VarId,
    /// Cost component per mode, in `PricingMode` order.
    costs: [(PricingMode, VarId); 3],
}

struct NodeAssignmentModel {
    problem: OptimizationProblem,
    /// `assign[w][n]`: workload `w` runs on node `n`
    assign: Vec<Vec<VarId>>,
    nodes: Vec<NodeVars>,
    credit: VarId,
}

fn build(input: &NodeAssignmentInput, costs: &CostTable) -> ModelResult<NodeAssignmentModel> {
    input.validate()?;
    costs.validate()?;
    let machines = input
        .nodes
        .iter()
        .map(|node| costs.machine_type(&node.machine_type).copied())
        .collect::<ModelResult<Vec<MachineType>>>()?;

    let mut builder = ProblemBuilder::new("node_assignment");

    let mut assign = Vec::with_capacity(input.workloads.len());
    for w in &input.workloads {
        let row = input
            .nodes
            .iter()
            .map(|n| builder.binary(format!("assign[{}][{}]", w.id, n.id)))
            .collect::<ModelResult<Vec<_>>>()?;
        assign.push(row);
    }

    let mut objective = LinearExpression::new();
    let mut nodes = Vec::with_capacity(input.nodes.len());
    for (n, (node, machine)) in input.nodes.iter().zip(&machines).enumerate() {
        let active = builder.binary(format!("active[{}]", node.id))?;
        let spot = builder.binary(format!("use_spot[{}]", node.id))?;
        let cud = builder.binary(format!("use_cud[{}]", node.id))?;

        builder.constrain(
            format!("one_mode[{}]", node.id),
            ConstraintClass::Exclusivity,
            LinearExpression::sum([spot, cud]),
            ConstraintType::LessThanOrEqual,
            1.0,
        )?;
        if !node.allow_spot {
            builder.forbid(format!("no_spot[{}]", node.id), ConstraintClass::Eligibility, spot)?;
        }
        if !node.allow_committed_use {
            builder.forbid(format!("no_cud[{}]", node.id), ConstraintClass::Eligibility, cud)?;
        }
        let standard = complement(&mut builder, &format!("is_standard[{}]", node.id), &[spot, cud])?;

        let base = machine.cost_per_hour * costs.hours_per_month;
        let mut node_costs = Vec::with_capacity(3);
        for (mode, indicator, label) in [
            (PricingMode::Standard, standard, "standard"),
            (PricingMode::Spot, spot, "spot"),
            (PricingMode::CommittedUse, cud, "cud"),
        ] {
            let cost = scaled_product(
                &mut builder,
                &format!("cost_{}[{}]", label, node.id),
                base * costs.mode_multiplier(mode),
                active.into(),
                indicator.into(),
            )?;
            objective.push(cost, 1.0);
            node_costs.push((mode, cost));
        }

        let column = assign.iter().map(|row| row[n]);
        builder.constrain(
            format!("vcpu[{}]", node.id),
            ConstraintClass::Capacity,
            input
                .workloads
                .iter()
                .zip(column.clone())
                .map(|(w, var)| (var, w.vcpu))
                .collect::<LinearExpression>()
                .term(active, -machine.vcpu),
            ConstraintType::LessThanOrEqual,
            0.0,
        )?;
        builder.constrain(
            format!("memory[{}]", node.id),
            ConstraintClass::Capacity,
            input
                .workloads
                .iter()
                .zip(column.clone())
                .map(|(w, var)| (var, w.memory_gb))
                .collect::<LinearExpression>()
                .term(active, -machine.memory_gb),
            ConstraintType::LessThanOrEqual,
            0.0,
        )?;
        for (w, var) in input.workloads.iter().zip(column) {
            builder.constrain(
                format!("on_active[{}][{}]", w.id, node.id),
                ConstraintClass::Linking,
                LinearExpression::from(var).term(active, -1.0),
                ConstraintType::LessThanOrEqual,
                0.0,
            )?;
        }

        nodes.push(NodeVars {
            active,
            spot,
            cud,
            standard,
            costs: [node_costs[0], node_costs[1], node_costs[2]],
        });
    }

    for (w, row) in input.workloads.iter().zip(&assign) {
        builder.constrain(
            format!("placed[{}]", w.id),
            ConstraintClass::Coverage,
            LinearExpression::sum(row.iter().copied()),
            ConstraintType::Equal,
            1.0,
        )?;
        let per_assignment = w.disk_gb * costs.disk_rate_per_month()
            + w.egress_gb * costs.egress_rate
            + w.monitoring_gb * costs.monitoring_rate;
        for &var in row {
            objective.push(var, per_assignment);
        }
    }

    builder.constrain(
        "any_active",
        ConstraintClass::Coverage,
        LinearExpression::sum(nodes.iter().map(|n| n.active)),
        ConstraintType::GreaterThanOrEqual,
        1.0,
    )?;

    let fee = costs.monthly_management_fee();
    let credit = builder.continuous("free_tier_credit", 0.0, Some(costs.free_tier_credit))?;
    builder.constrain(
        "credit_within_fee",
        ConstraintClass::Linking,
        credit.into(),
        ConstraintType::LessThanOrEqual,
        fee,
    )?;

    builder.minimize(
        objective
            .term(credit, -1.0)
            .plus_constant(costs.monthly_load_balancer() + fee),
    );

    Ok(NodeAssignmentModel {
        problem: builder.build()?,
        assign,
        nodes,
        credit,
    })
}

impl Optimizer {
    /// Places workloads on nodes and picks each active node's pricing mode
    /// at the lowest monthly cost.
    pub fn node_assignment(&self, input: &NodeAssignmentInput) -> Result<NodeAssignmentReport> {
        let model = build(input, self.costs())?;
        let outcome = self.solve(model.problem)?;

        let mut report = NodeAssignmentReport {
            summary: outcome.summary,
            workload_assignments: Vec::new(),
            node_summary: Vec::new(),
            compute_cost: 0.0,
            free_tier_credit: 0.0,
            total_cost: None,
        };
        let Some(values) = Extractor::new(&outcome.solution) else {
            return Ok(report);
        };

        let modes: Vec<Option<PricingMode>> = model
            .nodes
            .iter()
            .map(|vars| {
                if !values.flag(vars.active) {
                    None
                } else if values.flag(vars.standard) {
                    Some(PricingMode::Standard)
                } else if values.flag(vars.spot) {
                    Some(PricingMode::Spot)
                } else if values.flag(vars.cud) {
                    Some(PricingMode::CommittedUse)
                } else {
                    Some(PricingMode::Standard)
                }
            })
            .collect();

        for (w, row) in input.workloads.iter().zip(&model.assign) {
            if let Some(n) = values.selected(row) {
                report.workload_assignments.push(WorkloadAssignment {
                    workload_id: w.id.clone(),
                    node_id: input.nodes[n].id.clone(),
                    pricing_mode: modes[n].unwrap_or(PricingMode::Standard),
                });
            }
        }

        for (n, (node, vars)) in input.nodes.iter().zip(&model.nodes).enumerate() {
            let hosted: Vec<&Workload> = input
                .workloads
                .iter()
                .zip(&model.assign)
                .filter(|(_, row)| values.flag(row[n]))
                .map(|(w, _)| w)
                .collect();
            let monthly_cost = vars
                .costs
                .iter()
                .filter(|(mode, _)| Some(*mode) == modes[n])
                .map(|&(_, var)| values.value(var))
                .sum::<f64>();
            report.compute_cost += monthly_cost;
            report.node_summary.push(NodeSummary {
                node_id: node.id.clone(),
                active: modes[n].is_some(),
                pricing_mode: modes[n],
                vcpu_used: hosted.iter().map(|w| w.vcpu).sum(),
                memory_used_gb: hosted.iter().map(|w| w.memory_gb).sum(),
                monthly_cost,
            });
        }

        report.free_tier_credit = values.value(model.credit);
        report.total_cost = Some(values.objective());
        Ok(report)
    }
}
