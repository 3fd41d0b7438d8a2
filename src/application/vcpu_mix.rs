// Use case: standard versus spot vCPU split with an optional committed-use contract

use super::extractor::Extractor;
use super::optimizer::{Optimizer, SolveSummary};
use crate::domain::{
    linearizer::bounded_product,
    models::{LinearExpression, OptimizationProblem, VarId},
    problem_builder::{ensure_non_negative, ModelError, ProblemBuilder, Result as ModelResult},
    value_objects::{ConstraintClass, ConstraintType},
};
use crate::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VcpuMixInput {
    pub total_vcpu: u32,
    /// Most vCPUs that may run on preemptible capacity.
    pub max_spot_vcpu: u32,
    /// Hourly price of one standard vCPU.
    pub standard_rate: f64,
    pub spot_rate: f64,
    /// Hourly amount taken off each standard vCPU under the contract.
    pub cud_discount: f64,
    /// Flat hourly charge for holding the contract.
    #[serde(default)]
    pub cud_commitment_fee: f64,
    #[serde(default = "default_true")]
    pub allow_committed_use: bool,
}

fn default_true() -> bool {
    true
}

impl VcpuMixInput {
    fn validate(&self) -> ModelResult<()> {
        ensure_non_negative("standard_rate", self.standard_rate)?;
        ensure_non_negative("spot_rate", self.spot_rate)?;
        ensure_non_negative("cud_discount", self.cud_discount)?;
        ensure_non_negative("cud_commitment_fee", self.cud_commitment_fee)?;
        if self.cud_discount > self.standard_rate {
            return Err(ModelError::invalid(
                "cud_discount",
                "discount cannot exceed the standard rate",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VcpuMixReport {
    #[serde(flatten)]
    pub summary: SolveSummary,
    pub standard_vcpu: u64,
    pub spot_vcpu: u64,
    pub committed_use: bool,
    pub standard_cost: f64,
    pub spot_cost: f64,
    pub total_cost: Option<f64>,
}

struct VcpuMixModel {
    problem: OptimizationProblem,
    standard: VarId,
    spot: VarId,
    cud: VarId,
}

fn build(input: &VcpuMixInput) -> ModelResult<VcpuMixModel> {
    input.validate()?;
    let total = f64::from(input.total_vcpu);

    let mut builder = ProblemBuilder::new("vcpu_mix");
    let standard = builder.integer("standard", 0.0, Some(total))?;
    let spot = builder.integer("spot", 0.0, Some(f64::from(input.max_spot_vcpu)))?;
    let cud = builder.binary("cud")?;
    let discounted = bounded_product(&mut builder, "standard_cud", cud, standard)?;

    builder.constrain(
        "cover_vcpu",
        ConstraintClass::Coverage,
        LinearExpression::sum([standard, spot]),
        ConstraintType::Equal,
        total,
    )?;
    if !input.allow_committed_use {
        builder.forbid("no_cud", ConstraintClass::Eligibility, cud)?;
    }

    builder.minimize(
        LinearExpression::new()
            .term(standard, input.standard_rate)
            .term(discounted, -input.cud_discount)
            .term(spot, input.spot_rate)
            .term(cud, input.cud_commitment_fee),
    );

    Ok(VcpuMixModel {
        problem: builder.build()?,
        standard,
        spot,
        cud,
    })
}

impl Optimizer {
    /// Cheapest split of a fixed vCPU demand between standard and spot capacity.
    pub fn vcpu_mix(&self, input: &VcpuMixInput) -> Result<VcpuMixReport> {
        let model = build(input)?;
        let outcome = self.solve(model.problem)?;

        let mut report = VcpuMixReport {
            summary: outcome.summary,
            standard_vcpu: 0,
            spot_vcpu: 0,
            committed_use: false,
            standard_cost: 0.0,
            spot_cost: 0.0,
            total_cost: None,
        };
        if let Some(values) = Extractor::new(&outcome.solution) {
            report.standard_vcpu = values.count(model.standard);
            report.spot_vcpu = values.count(model.spot);
            report.committed_use = values.flag(model.cud);

            let mut standard_rate = input.standard_rate;
            let mut fee = 0.0;
            if report.committed_use {
                standard_rate -= input.cud_discount;
                fee = input.cud_commitment_fee;
            }
            report.standard_cost = report.standard_vcpu as f64 * standard_rate + fee;
            report.spot_cost = report.spot_vcpu as f64 * input.spot_rate;
            report.total_cost = Some(report.standard_cost + report.spot_cost);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn input() -> VcpuMixInput {
        VcpuMixInput {
            total_vcpu: 100,
            max_spot_vcpu: 50,
            standard_rate: 0.04,
            spot_rate: 0.01,
            cud_discount: 0.012,
            cud_commitment_fee: 0.0,
            allow_committed_use: true,
        }
    }

    #[test]
    fn test_model_shape() {
        let model = build(&input()).unwrap();
        assert_eq!(model.problem.num_integer_variables(), 4);
        assert_eq!(model.problem.variables[model.spot.index()].upper_bound, Some(50.0));
        assert!(!model
            .problem
            .constraints
            .iter()
            .any(|c| c.class == ConstraintClass::Eligibility));
    }

    #[test]
    fn test_forbids_cud_when_disallowed() {
        let model = build(&VcpuMixInput {
            allow_committed_use: false,
            ..input()
        })
        .unwrap();
        assert!(model.problem.constraints.iter().any(|c| c.name == "no_cud"));
    }

    #[test]
    fn test_rejects_discount_above_rate() {
        let result = build(&VcpuMixInput {
            cud_discount: 0.05,
            ..input()
        });
        assert!(result.is_err());
    }
}
