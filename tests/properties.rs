#![cfg(feature = "highs")]

use costopt::application::{
    NodeAssignmentInput, NodeSpec, QueryScheduleInput, ScheduledQuery, SlotSplitInput,
    StorageItem, TierAssignmentInput, Workload,
};
use costopt::{CostTable, Optimizer, OptimizerConfig, SolutionStatus};
use proptest::prelude::*;

fn optimizer() -> Optimizer {
    Optimizer::from_config(OptimizerConfig::default()).unwrap()
}

fn storage_item() -> impl Strategy<Value = StorageItem> {
    (1.0..5000.0_f64, 0.0..20.0_f64, 0..400_u32, any::<bool>()).prop_map(
        |(size_gb, access_frequency, retention_days, high_frequency)| StorageItem {
            id: String::new(),
            size_gb,
            access_frequency,
            retention_days,
            high_frequency,
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn test_slot_split_covers_demand(
        demand in 0.0..5000.0_f64,
        max_reserved in 0..40_u32,
        reserved_unit_hour_cost in 0.01..0.2_f64,
        on_demand_unit_cost in 0.5..10.0_f64,
    ) {
        let input = SlotSplitInput {
            demand,
            max_reserved,
            reserved_unit_hour_cost,
            on_demand_unit_cost,
            units_per_reserved: 100.0,
            hours: 720.0,
        };
        let report = optimizer().slot_split(&input).unwrap();
        prop_assert_eq!(report.summary.status, SolutionStatus::Optimal);
        prop_assert!(report.reserved_units <= u64::from(max_reserved));
        prop_assert!(report.reserved_units as f64 * 100.0 + report.on_demand_units >= demand - 1e-6);
    }

    #[test]
    fn test_tier_assignment_is_exclusive_and_eligible(
        items in prop::collection::vec(storage_item(), 1..6),
    ) {
        let items: Vec<_> = items
            .into_iter()
            .enumerate()
            .map(|(i, item)| StorageItem { id: format!("item{}", i), ..item })
            .collect();
        let input = TierAssignmentInput::with_cost_table(items, &CostTable::default(), None);
        let optimizer = optimizer();
        let report = optimizer.tier_assignment(&input).unwrap();
        prop_assert_eq!(report.summary.status, SolutionStatus::Optimal);
        prop_assert_eq!(report.assignments.len(), input.items.len());

        for (item, assignment) in input.items.iter().zip(&report.assignments) {
            prop_assert_eq!(&assignment.item_id, &item.id);
            let tier = input.tiers.iter().find(|t| t.name == assignment.tier_name).unwrap();
            prop_assert!(tier.min_retention_days <= item.retention_days);
            prop_assert!(!item.high_frequency || tier.serves_high_frequency);
        }

        let again = optimizer.tier_assignment(&input).unwrap();
        prop_assert_eq!(again.total_cost, report.total_cost);
        prop_assert_eq!(again.assignments, report.assignments);
    }

    #[test]
    fn test_node_assignment_respects_capacity(
        demands in prop::collection::vec((0.1..2.0_f64, 0.5..8.0_f64), 1..5),
    ) {
        let workloads: Vec<_> = demands
            .iter()
            .enumerate()
            .map(|(i, &(vcpu, memory_gb))| Workload {
                id: format!("w{}", i),
                vcpu,
                memory_gb,
                disk_gb: 10.0,
                egress_gb: 1.0,
                monitoring_gb: 0.5,
            })
            .collect();
        let nodes = ["n1-standard-2", "e2-standard-2", "e2-standard-2"]
            .iter()
            .enumerate()
            .map(|(i, machine_type)| NodeSpec {
                id: format!("node{}", i),
                machine_type: machine_type.to_string(),
                allow_spot: i != 0,
                allow_committed_use: true,
            })
            .collect();
        let input = NodeAssignmentInput { workloads, nodes };
        let report = optimizer().node_assignment(&input).unwrap();
        let costs = CostTable::default();

        if report.summary.status == SolutionStatus::Optimal {
            prop_assert_eq!(report.workload_assignments.len(), input.workloads.len());
            for (spec, summary) in input.nodes.iter().zip(&report.node_summary) {
                let machine = costs.machine_type(&spec.machine_type).unwrap();
                prop_assert!(summary.vcpu_used <= machine.vcpu + 1e-6);
                prop_assert!(summary.memory_used_gb <= machine.memory_gb + 1e-6);
                prop_assert_eq!(summary.active, summary.pricing_mode.is_some());
            }
            for assignment in &report.workload_assignments {
                let host = report.node_summary.iter().find(|n| n.node_id == assignment.node_id).unwrap();
                prop_assert!(host.active);
                prop_assert_eq!(Some(assignment.pricing_mode), host.pricing_mode);
            }
        } else {
            prop_assert_eq!(report.summary.status, SolutionStatus::Infeasible);
        }
    }

    #[test]
    fn test_schedule_meets_deadlines(
        shapes in prop::collection::vec((1..3_u32, 0..4_u32, 5..40_u32), 1..4),
    ) {
        let queries: Vec<_> = shapes
            .iter()
            .enumerate()
            .map(|(i, &(runtime_slots, slack, slots_required))| ScheduledQuery {
                id: format!("q{}", i),
                data_volume: 1.0,
                slots_required,
                runtime_slots,
                deadline_slot: runtime_slots + slack,
            })
            .collect();
        let input = QueryScheduleInput {
            queries,
            horizon_slots: 6,
            max_slots: 50,
            on_demand_unit_cost: 5.0,
            flat_rate_hourly: 4.0,
            slot_hours: 1.0,
            billing: Default::default(),
        };
        let report = optimizer().query_schedule(&input).unwrap();
        prop_assert_eq!(report.summary.status, SolutionStatus::Optimal);
        for (query, placement) in input.queries.iter().zip(&report.schedule) {
            prop_assert!(placement.start_slot + query.runtime_slots <= query.deadline_slot);
        }
    }
}
