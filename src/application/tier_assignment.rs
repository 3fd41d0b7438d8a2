// Use case: storage class assignment
// Each item goes to exactly one storage class it is eligible for

use super::extractor::Extractor;
use super::optimizer::{Optimizer, SolveSummary};
use crate::domain::{
    cost_model::{CostTable, StorageClass},
    models::{LinearExpression, OptimizationProblem, VarId},
    problem_builder::{ensure_non_negative, ModelError, ProblemBuilder, Result as ModelResult},
    value_objects::{ConstraintClass, ConstraintType},
};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Costs within this distance are treated as equal when breaking ties.
const COST_TIE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageItem {
    pub id: String,
    pub size_gb: f64,
    /// Reads per month; each read retrieves the whole item.
    pub access_frequency: f64,
    pub retention_days: u32,
    #[serde(default)]
    pub high_frequency: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierAssignmentInput {
    pub items: Vec<StorageItem>,
    pub tiers: Vec<StorageClass>,
    /// Monthly spending cap across all items.
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub egress_rate: f64,
    #[serde(default)]
    pub ops_rate: f64,
}

impl TierAssignmentInput {
    /// Takes tiers, egress and operation rates from a cost table.
    pub fn with_cost_table(items: Vec<StorageItem>, costs: &CostTable, budget: Option<f64>) -> Self {
        Self {
            items,
            tiers: costs.storage_classes.clone(),
            budget,
            egress_rate: costs.egress_rate,
            ops_rate: costs.class_b_ops_rate,
        }
    }

    fn validate(&self) -> ModelResult<()> {
        if self.tiers.is_empty() {
            return Err(ModelError::invalid("tiers", "at least one storage class is required"));
        }
        for item in &self.items {
            ensure_non_negative(&format!("{}.size_gb", item.id), item.size_gb)?;
            ensure_non_negative(&format!("{}.access_frequency", item.id), item.access_frequency)?;
        }
        for tier in &self.tiers {
            ensure_non_negative(&format!("{}.storage_rate", tier.name), tier.storage_rate)?;
            ensure_non_negative(&format!("{}.retrieval_rate", tier.name), tier.retrieval_rate)?;
        }
        if let Some(budget) = self.budget {
            ensure_non_negative("budget", budget)?;
        }
        ensure_non_negative("egress_rate", self.egress_rate)?;
        ensure_non_negative("ops_rate", self.ops_rate)
    }

    fn is_eligible(&self, item: &StorageItem, tier: &StorageClass) -> bool {
        item.retention_days >= tier.min_retention_days
            && (!item.high_frequency || tier.serves_high_frequency)
    }

    /// Monthly cost of keeping `item` in `tier`.
    pub fn cost_breakdown(&self, item: &StorageItem, tier: &StorageClass) -> CostBreakdown {
        let retrieved_gb = item.size_gb * item.access_frequency;
        CostBreakdown {
            storage: item.size_gb * tier.storage_rate,
            retrieval: retrieved_gb * tier.retrieval_rate,
            egress: retrieved_gb * self.egress_rate,
            operations: item.access_frequency * self.ops_rate,
        }
    }

    fn cost(&self, i: usize, j: usize) -> f64 {
        self.cost_breakdown(&self.items[i], &self.tiers[j]).total()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub storage: f64,
    pub retrieval: f64,
    pub egress: f64,
    pub operations: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.storage + self.retrieval + self.egress + self.operations
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierAssignment {
    pub item_id: String,
    pub tier_name: String,
    pub cost: f64,
    pub breakdown: CostBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierAssignmentReport {
    #[serde(flatten)]
    pub summary: SolveSummary,
    pub assignments: Vec<TierAssignment>,
    pub total_cost: Option<f64>,
}

struct TierAssignmentModel {
    problem: OptimizationProblem,
    /// `assign[i][j]`: item `i` lives in tier `j`
    assign: Vec<Vec<VarId>>,
}

fn build(input: &TierAssignmentInput) -> ModelResult<TierAssignmentModel> {
    input.validate()?;

    let mut builder = ProblemBuilder::new("tier_assignment");
    let mut assign = Vec::with_capacity(input.items.len());
    for i in 0..input.items.len() {
        let row = (0..input.tiers.len())
            .map(|j| builder.binary(format!("assign[{}][{}]", i, j)))
            .collect::<ModelResult<Vec<_>>>()?;
        assign.push(row);
    }

    let mut total_cost = LinearExpression::new();
    for (i, item) in input.items.iter().enumerate() {
        builder.constrain(
            format!("one_tier[{}]", item.id),
            ConstraintClass::Coverage,
            LinearExpression::sum(assign[i].iter().copied()),
            ConstraintType::Equal,
            1.0,
        )?;
        for (j, tier) in input.tiers.iter().enumerate() {
            if !input.is_eligible(item, tier) {
                builder.forbid(
                    format!("ineligible[{}][{}]", item.id, tier.name),
                    ConstraintClass::Eligibility,
                    assign[i][j],
                )?;
            }
            total_cost.push(assign[i][j], input.cost(i, j));
        }
    }

    if let Some(budget) = input.budget {
        builder.constrain(
            "budget",
            ConstraintClass::Budget,
            total_cost.clone(),
            ConstraintType::LessThanOrEqual,
            budget,
        )?;
    }
    builder.minimize(total_cost);

    Ok(TierAssignmentModel {
        problem: builder.build()?,
        assign,
    })
}

/// Moves each item to the lowest-index eligible tier that costs no more than
/// the one the solver picked. Costs never rise, so the budget still holds.
fn break_ties(input: &TierAssignmentInput, chosen: &mut [usize]) {
    for (i, choice) in chosen.iter_mut().enumerate() {
        let picked_cost = input.cost(i, *choice);
        if let Some(j) = (0..*choice).find(|&j| {
            input.is_eligible(&input.items[i], &input.tiers[j])
                && input.cost(i, j) <= picked_cost + COST_TIE_EPSILON
        }) {
            *choice = j;
        }
    }
}

impl Optimizer {
    /// Cheapest eligible storage class per item, within the optional budget.
    pub fn tier_assignment(&self, input: &TierAssignmentInput) -> Result<TierAssignmentReport> {
        let model = build(input)?;
        let outcome = self.solve(model.problem)?;

        let mut report = TierAssignmentReport {
            summary: outcome.summary,
            assignments: Vec::new(),
            total_cost: None,
        };
        let Some(values) = Extractor::new(&outcome.solution) else {
            return Ok(report);
        };

        let mut chosen = model
            .assign
            .iter()
            .map(|row| values.selected(row).unwrap_or(0))
            .collect::<Vec<_>>();
        break_ties(input, &mut chosen);

        report.assignments = input
            .items
            .iter()
            .zip(&chosen)
            .map(|(item, &j)| {
                let tier = &input.tiers[j];
                let breakdown = input.cost_breakdown(item, tier);
                TierAssignment {
                    item_id: item.id.clone(),
                    tier_name: tier.name.clone(),
                    cost: breakdown.total(),
                    breakdown,
                }
            })
            .collect();
        report.total_cost = Some(report.assignments.iter().map(|a| a.cost).sum());
        Ok(report)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn item(id: &str, size_gb: f64, access: f64, retention_days: u32) -> StorageItem {
        StorageItem {
            id: id.to_string(),
            size_gb,
            access_frequency: access,
            retention_days,
            high_frequency: false,
        }
    }

    fn input(items: Vec<StorageItem>) -> TierAssignmentInput {
        TierAssignmentInput::with_cost_table(items, &CostTable::default(), None)
    }

    #[test]
    fn test_eligibility_rows() {
        let model = build(&input(vec![item("logs", 10.0, 1.0, 45)])).unwrap();
        let forbidden: Vec<_> = model
            .problem
            .constraints
            .iter()
            .filter(|c| c.class == ConstraintClass::Eligibility)
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(forbidden, vec!["ineligible[logs][Coldline]", "ineligible[logs][Archive]"]);
    }

    #[test]
    fn test_high_frequency_restriction() {
        let mut hot = item("hot", 10.0, 1.0, 400);
        hot.high_frequency = true;
        let input = input(vec![hot]);
        let eligible: Vec<_> = input
            .tiers
            .iter()
            .filter(|t| input.is_eligible(&input.items[0], t))
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(eligible, vec!["Standard", "Nearline"]);
    }

    #[test]
    fn test_break_ties_prefers_lowest_index() {
        let mut input = input(vec![item("a", 100.0, 0.0, 400)]);
        input.tiers = vec![
            StorageClass::new("first", 0.01, 0.0, 0),
            StorageClass::new("second", 0.01, 0.0, 0),
            StorageClass::new("third", 0.02, 0.0, 0),
        ];
        let mut chosen = vec![1];
        break_ties(&input, &mut chosen);
        assert_eq!(chosen, vec![0]);

        let mut chosen = vec![2];
        break_ties(&input, &mut chosen);
        assert_eq!(chosen, vec![0]);
    }

    #[test]
    fn test_break_ties_skips_ineligible() {
        let mut input = input(vec![item("a", 100.0, 0.0, 10)]);
        input.tiers = vec![
            StorageClass::new("locked", 0.01, 0.0, 30),
            StorageClass::new("open", 0.01, 0.0, 0),
        ];
        let mut chosen = vec![1];
        break_ties(&input, &mut chosen);
        assert_eq!(chosen, vec![1]);
    }

    #[test]
    fn test_cost_breakdown() {
        let input = TierAssignmentInput {
            items: vec![item("a", 100.0, 2.0, 400)],
            tiers: vec![StorageClass::new("Nearline", 0.01, 0.01, 30)],
            budget: None,
            egress_rate: 0.12,
            ops_rate: 0.5,
        };
        let cost = input.cost_breakdown(&input.items[0], &input.tiers[0]);
        assert_eq!(
            cost,
            CostBreakdown {
                storage: 1.0,
                retrieval: 2.0,
                egress: 24.0,
                operations: 1.0,
            }
        );
        assert_eq!(cost.total(), 28.0);
    }

    #[test]
    fn test_rejects_empty_tiers() {
        let mut input = input(vec![item("a", 1.0, 1.0, 1)]);
        input.tiers.clear();
        assert!(build(&input).is_err());
    }
}
