#![cfg(all(feature = "highs", feature = "runner"))]

use costopt::{run_batch, Batch, ScenarioReport, SolutionStatus};

const BATCH: &str = r#"{
    "optimizer": {"backend": "highs", "time_limit_secs": 60},
    "cost_table": {"region": "eu"},
    "scenarios": [
        {"scenario": "slot_split_from_usage",
         "usage": {"metric_value": 70, "window_days": 7},
         "max_reserved": 10, "hours": 720},
        {"scenario": "vcpu_mix", "total_vcpu": 100, "max_spot_vcpu": 50,
         "standard_rate": 0.04, "spot_rate": 0.01, "cud_discount": 0.012},
        {"scenario": "node_assignment",
         "workloads": [{"id": "api", "vcpu": 0.5, "memory_gb": 1}],
         "nodes": [{"id": "a", "machine_type": "m9-missing"}]},
        {"scenario": "tier_assignment",
         "items": [{"id": "logs", "size_gb": 100, "access_frequency": 1, "retention_days": 10}],
         "tiers": [{"name": "Standard", "storage_rate": 0.02, "retrieval_rate": 0, "min_retention_days": 0}],
         "budget": 1.0}
    ]
}"#;

#[tokio::test]
async fn test_batch_reports_in_input_order() {
    let batch: Batch = serde_json::from_str(BATCH).unwrap();
    let reports = run_batch(batch).await.unwrap();
    assert_eq!(reports.len(), 4);

    match &reports[0] {
        ScenarioReport::SlotSplit(report) => {
            assert_eq!(report.summary.status, SolutionStatus::Optimal);
            assert_eq!(report.reserved_units, 3);
        }
        other => panic!("unexpected report {:?}", other),
    }
    assert!(matches!(&reports[1], ScenarioReport::VcpuMix(r) if r.committed_use));
    match &reports[2] {
        ScenarioReport::Rejected {
            request,
            status,
            error,
        } => {
            assert_eq!(request, "node_assignment");
            assert_eq!(*status, SolutionStatus::Error);
            assert!(error.contains("m9-missing"));
        }
        other => panic!("unexpected report {:?}", other),
    }
    match &reports[3] {
        ScenarioReport::TierAssignment(report) => {
            assert_eq!(report.summary.status, SolutionStatus::Infeasible);
        }
        other => panic!("unexpected report {:?}", other),
    }
}

#[tokio::test]
async fn test_report_json_shape() {
    let batch: Batch = serde_json::from_str(BATCH).unwrap();
    let reports = run_batch(batch).await.unwrap();
    let json = serde_json::to_value(&reports).unwrap();
    assert_eq!(json[0]["scenario"], "slot_split");
    assert_eq!(json[0]["status"], "OPTIMAL");
    assert_eq!(json[2]["scenario"], "rejected");
    assert_eq!(json[2]["status"], "ERROR");
    assert_eq!(json[3]["status"], "INFEASIBLE");
    assert_eq!(json[3]["infeasible_class"], "budget");
}

#[tokio::test]
async fn test_invalid_cost_table_is_rejected() {
    let mut batch = Batch::default();
    batch.cost_table.cud_discount = 2.0;
    assert!(run_batch(batch).await.is_err());
}
