//! 單一產品批量規劃示例
//!
//! 兩期、需求只出現在第二期：延後生產可免除持有成本。

use lotsize::{
    InstanceParser, InstancePipeline, MicroLpSolver, PlanningConfig, RecordStatus,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== 單一產品批量規劃示例 ===\n");

    // n=1, T=2, 保留欄位, 產能=1000
    // p=1, h=1, sT=0, sC=50
    // 需求: [0, 10]
    let text = "1 2 0 1000\n1 1 0 50\n0 10\n";
    let instance = InstanceParser::default().parse_str("single_product", text)?;

    println!(
        "實例: 產品 {}、期數 {}、產能 {}",
        instance.product_count(),
        instance.period_count(),
        instance.capacity()
    );

    let config = PlanningConfig::new().with_time_limit_secs(Some(60.0));
    let solver = MicroLpSolver::new();
    let pipeline = InstancePipeline::new(&solver, &config);
    let outcome = pipeline.solve(&instance)?;
    let record = &outcome.record;

    println!("\n狀態: {:?}", record.status);
    if record.status == RecordStatus::Optimal {
        println!("  總成本:   {:?}", record.total_cost);
        println!("  持有成本: {:?}", record.holding_cost);
        println!("  整備成本: {:?}", record.setup_cost);
        println!("  整備次數: {:?}", record.setup_count);
        println!("  庫存單位: {:?}", record.inventory_units);
    }

    Ok(())
}
