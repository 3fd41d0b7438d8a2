// Application layer: the optimization engine and one encoder per scenario

pub mod extractor;
pub mod node_assignment;
pub mod optimizer;
pub mod query_schedule;
pub mod slot_split;
pub mod tier_assignment;
pub mod vcpu_mix;

pub use extractor::{Extractor, BINARY_THRESHOLD, INTEGRALITY_TOLERANCE};
pub use node_assignment::{
    NodeAssignmentInput, NodeAssignmentReport, NodeSpec, NodeSummary, Workload, WorkloadAssignment,
};
pub use optimizer::{Optimizer, OptimizerConfig, SolveOutcome, SolveSummary};
pub use query_schedule::{
    FlatRateBilling, QueryPlacement, QueryScheduleInput, QueryScheduleReport, ScheduledQuery,
};
pub use slot_split::{SlotSplitInput, SlotSplitReport};
pub use tier_assignment::{
    CostBreakdown, StorageItem, TierAssignment, TierAssignmentInput, TierAssignmentReport,
};
pub use vcpu_mix::{VcpuMixInput, VcpuMixReport};
