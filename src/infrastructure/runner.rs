// Infrastructure: batch file loading and concurrent scenario execution
// Every scenario runs on its own blocking worker with a private model and solver session

use crate::application::{
    NodeAssignmentInput, NodeAssignmentReport, Optimizer, OptimizerConfig, QueryScheduleInput,
    QueryScheduleReport, SlotSplitInput, SlotSplitReport, TierAssignmentInput,
    TierAssignmentReport, VcpuMixInput, VcpuMixReport,
};
use crate::domain::cost_model::{CostTable, UsageFeed};
use crate::domain::value_objects::SolutionStatus;
use crate::error::Error;
use futures::future::join_all;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("Failed to read batch file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse batch file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Optimizer(#[from] Error),
}

/// One scenario of a batch, tagged by its `scenario` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scenario", rename_all = "snake_case")]
pub enum ScenarioRequest {
    SlotSplit(SlotSplitInput),
    /// Slot split priced from the batch cost table, with demand projected
    /// from a usage sample.
    SlotSplitFromUsage {
        usage: UsageFeed,
        max_reserved: u32,
        #[serde(default)]
        region: Option<String>,
        hours: f64,
    },
    TierAssignment(TierAssignmentInput),
    NodeAssignment(NodeAssignmentInput),
    QuerySchedule(QueryScheduleInput),
    VcpuMix(VcpuMixInput),
}

impl ScenarioRequest {
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioRequest::SlotSplit(_) => "slot_split",
            ScenarioRequest::SlotSplitFromUsage { .. } => "slot_split_from_usage",
            ScenarioRequest::TierAssignment(_) => "tier_assignment",
            ScenarioRequest::NodeAssignment(_) => "node_assignment",
            ScenarioRequest::QuerySchedule(_) => "query_schedule",
            ScenarioRequest::VcpuMix(_) => "vcpu_mix",
        }
    }

    /// Runs the scenario; malformed input becomes a [`ScenarioReport::Rejected`].
    pub fn run(&self, optimizer: &Optimizer) -> ScenarioReport {
        let report = match self {
            ScenarioRequest::SlotSplit(input) => optimizer.slot_split(input).map(ScenarioReport::SlotSplit),
            ScenarioRequest::SlotSplitFromUsage {
                usage,
                max_reserved,
                region,
                hours,
            } => {
                let costs = optimizer.costs();
                let region = region.as_deref().unwrap_or(costs.region.as_str());
                usage
                    .monthly_demand()
                    .and_then(|demand| {
                        SlotSplitInput::from_cost_table(demand, *max_reserved, costs, region, *hours)
                    })
                    .map_err(Error::from)
                    .and_then(|input| optimizer.slot_split(&input))
                    .map(ScenarioReport::SlotSplit)
            }
            ScenarioRequest::TierAssignment(input) => {
                optimizer.tier_assignment(input).map(ScenarioReport::TierAssignment)
            }
            ScenarioRequest::NodeAssignment(input) => {
                optimizer.node_assignment(input).map(ScenarioReport::NodeAssignment)
            }
            ScenarioRequest::QuerySchedule(input) => {
                optimizer.query_schedule(input).map(ScenarioReport::QuerySchedule)
            }
            ScenarioRequest::VcpuMix(input) => optimizer.vcpu_mix(input).map(ScenarioReport::VcpuMix),
        };

        report.unwrap_or_else(|e| {
            warn!("Rejected {} scenario: {}", self.name(), e);
            ScenarioReport::Rejected {
                request: self.name().to_string(),
                status: SolutionStatus::Error,
                error: e.to_string(),
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "scenario", rename_all = "snake_case")]
pub enum ScenarioReport {
    SlotSplit(SlotSplitReport),
    TierAssignment(TierAssignmentReport),
    NodeAssignment(NodeAssignmentReport),
    QuerySchedule(QueryScheduleReport),
    VcpuMix(VcpuMixReport),
    /// Input that failed validation before reaching a solver.
    Rejected {
        request: String,
        /// Always `ERROR`.
        status: SolutionStatus,
        error: String,
    },
}

/// Contents of a batch file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Batch {
    pub optimizer: OptimizerConfig,
    pub cost_table: CostTable,
    pub scenarios: Vec<ScenarioRequest>,
}

pub fn load_batch(path: &Path) -> Result<Batch, RunnerError> {
    let content = std::fs::read_to_string(path).map_err(|source| RunnerError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// Solves every scenario of `batch` concurrently and returns the reports in
/// input order.
pub async fn run_batch(batch: Batch) -> Result<Vec<ScenarioReport>, RunnerError> {
    batch.cost_table.validate().map_err(Error::from)?;
    let optimizer = Arc::new(Optimizer::from_config(batch.optimizer)?.with_cost_table(batch.cost_table));
    info!(
        "Running {} scenarios with {}",
        batch.scenarios.len(),
        optimizer.solver_name()
    );

    let names: Vec<&'static str> = batch.scenarios.iter().map(ScenarioRequest::name).collect();
    let tasks = batch.scenarios.into_iter().map(|request| {
        let optimizer = Arc::clone(&optimizer);
        tokio::task::spawn_blocking(move || request.run(&optimizer))
    });

    let reports = join_all(tasks)
        .await
        .into_iter()
        .zip(names)
        .map(|(joined, name)| {
            joined.unwrap_or_else(|e| {
                warn!("{} scenario task failed: {}", name, e);
                ScenarioReport::Rejected {
                    request: name.to_string(),
                    status: SolutionStatus::Error,
                    error: format!("scenario task failed: {}", e),
                }
            })
        })
        .collect();
    Ok(reports)
}
