//! 集成測試

use std::fs;

use lotsize::{
    class_averages, instance_class, logging, write_records_csv, BatchRunner, BatchSummary,
    BoundCalculator, DemandLayout, InstanceParser, InstancePipeline, LotSizingError,
    MicroLpSolver, PlanningConfig, RecordStatus, Shard,
};
use rstest::rstest;

const TOLERANCE: f64 = 1e-6;

fn approx(actual: Option<f64>, expected: f64) -> bool {
    actual.is_some_and(|v| (v - expected).abs() < TOLERANCE)
}

#[test]
fn test_single_product_defers_production() {
    logging::init_test();
    // 場景：需求只在第二期，延後生產可省下持有成本
    let instance = InstanceParser::default()
        .parse_str("scenario_a.txt", "1 2 0 1000 1 1 0 50 0 10")
        .unwrap();
    let config = PlanningConfig::default();
    let solver = MicroLpSolver::new();

    let outcome = InstancePipeline::new(&solver, &config).solve(&instance).unwrap();
    let record = outcome.record;

    assert_eq!(record.status, RecordStatus::Optimal);
    assert!(approx(record.total_cost, 50.0));
    assert!(approx(record.holding_cost, 0.0));
    assert!(approx(record.setup_cost, 50.0));
    assert!(approx(record.inventory_units, 0.0));
    assert_eq!(record.setup_count, Some(1));
    assert!(approx(record.gap, 0.0));

    let plan = outcome.plan.unwrap();
    assert_eq!(plan.len(), 1);
    assert_eq!(plan[0].period, 1);
    assert!((plan[0].quantity - 10.0).abs() < TOLERANCE);
}

#[test]
fn test_insufficient_demand_builds_no_model() {
    // 宣告 2×2=4 個需求值，只提供 3 個
    let result = InstanceParser::default().parse_str(
        "scenario_b.txt",
        "2 2 0 100 1 1 0 10 1 1 0 10 5 5 5",
    );

    assert!(matches!(
        result,
        Err(LotSizingError::InsufficientData {
            expected: 4,
            found: 3
        })
    ));

    let config = PlanningConfig::default();
    let solver = MicroLpSolver::new();
    let record = InstancePipeline::new(&solver, &config)
        .run_source("scenario_b.txt", "2 2 0 100 1 1 0 10 1 1 0 10 5 5 5");

    assert_eq!(record.status, RecordStatus::ParseError);
    assert_eq!(record.product_count, None);
}

#[test]
fn test_zero_capacity_is_infeasible() {
    let instance = InstanceParser::default()
        .parse_str("scenario_c.txt", "1 2 0 0 1 1 1 10 5 5")
        .unwrap();
    let config = PlanningConfig::default();
    let solver = MicroLpSolver::new();

    let big_m = BoundCalculator::compute(&instance);
    assert!(big_m.iter().all(|&m| m == 0.0));

    let outcome = InstancePipeline::new(&solver, &config).solve(&instance).unwrap();
    let record = outcome.record;

    assert_eq!(record.status, RecordStatus::Infeasible);
    assert_eq!(record.total_cost, None);
    assert_eq!(record.holding_cost, None);
    assert_eq!(record.setup_cost, None);
    assert_eq!(record.setup_count, None);
    assert_eq!(record.product_count, Some(1));
    assert!(outcome.plan.is_none());
}

#[rstest]
// 全零需求：不整備、不生產
#[case::zero_demand("zero.txt", "2 3 0 50 1 1 5 10 2 1 5 20 0 0 0 0 0 0", 0.0, 0.0, 0)]
// 第二期需求 15 超過單期產能 10，必須提前生產 5 單位
#[case::capacity_forces_early_production("tight.txt", "1 2 0 10 1 2 0 1 0 15", 12.0, 5.0, 2)]
// 兩期需求合併於第一期生產比整備兩次便宜
#[case::merge_lots("merge.txt", "1 2 0 100 1 1 0 20 5 5", 25.0, 5.0, 1)]
fn test_optimal_costs(
    #[case] name: &str,
    #[case] text: &str,
    #[case] total_cost: f64,
    #[case] inventory_units: f64,
    #[case] setup_count: usize,
) {
    logging::init_test();
    let instance = InstanceParser::default().parse_str(name, text).unwrap();
    let config = PlanningConfig::default();
    let solver = MicroLpSolver::new();

    let record = InstancePipeline::new(&solver, &config).run(&instance).unwrap();

    assert_eq!(record.status, RecordStatus::Optimal);
    assert!(approx(record.total_cost, total_cost));
    assert!(approx(record.inventory_units, inventory_units));
    assert_eq!(record.setup_count, Some(setup_count));
}

#[test]
fn test_period_block_layout() {
    // 兩產品、區塊大小 2：需求逐期交錯列出
    let parser = InstanceParser::new(DemandLayout::PeriodMajorBlocks { block: 2 });
    let instance = parser
        .parse_str("blocks.txt", "2 2 0 100 1 1 0 5 1 1 0 5 1 2 3 4")
        .unwrap();

    assert_eq!(instance.demand_row(0), &[1.0, 3.0]);
    assert_eq!(instance.demand_row(1), &[2.0, 4.0]);
}

#[test]
fn test_batch_sharding_and_reporting() {
    logging::init_test();
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("X10001.txt"), "1 2 0 1000 1 1 0 50 0 10").unwrap();
    fs::write(dir.path().join("X10002.txt"), "1 2 0 1000 1 1 0 30 10 0").unwrap();
    fs::write(dir.path().join("X20001.txt"), "1 2 0 0 1 1 1 10 5 5").unwrap();
    fs::write(dir.path().join("X20002.txt"), "1 2 0 100 1 1").unwrap();

    let solver = MicroLpSolver::new();
    let config = PlanningConfig::default().with_workers(2);
    let records = BatchRunner::new(solver, config)
        .unwrap()
        .run_dir(dir.path())
        .unwrap();

    let statuses: Vec<_> = records.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![
            RecordStatus::Optimal,
            RecordStatus::Optimal,
            RecordStatus::Infeasible,
            RecordStatus::ParseError,
        ]
    );

    let averages = class_averages(&records, instance_class);
    assert_eq!(averages.len(), 2);
    assert_eq!(averages[0].class, "100");
    assert_eq!(averages[0].total_cost, Some(40.0));
    assert_eq!(averages[1].class, "200");
    assert_eq!(averages[1].total_cost, None);

    let summary = BatchSummary::new(&records);
    assert_eq!(summary.solved, 2);
    assert_eq!(summary.failed, 2);

    let mut buffer = Vec::new();
    write_records_csv(&records, &mut buffer).unwrap();
    let csv_text = String::from_utf8(buffer).unwrap();
    assert_eq!(csv_text.lines().count(), 5);
    assert!(csv_text.contains("INFEASIBLE"));

    // 第二個分片只拿到奇數位置的檔案
    let sharded = PlanningConfig::default().with_shard(Shard::new(2, 1));
    let records = BatchRunner::new(MicroLpSolver::new(), sharded)
        .unwrap()
        .run_dir(dir.path())
        .unwrap();
    let files: Vec<_> = records.iter().map(|r| r.file.as_str()).collect();
    assert_eq!(files, vec!["X10002.txt", "X20002.txt"]);
}
