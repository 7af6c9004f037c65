//! 兩產品共用產能的生產計劃示例
//!
//! 列出每個生產批量及其分配到的需求期別。

use lotsize::{InstancePipeline, Instance, MicroLpSolver, PlanningConfig, Product};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== 兩產品生產計劃示例 ===\n");

    let instance = Instance::new(
        "two_product",
        40.0,
        vec![
            // p, h, sT, sC
            Product::new(1.0, 1.0, 2.0, 30.0),
            Product::new(2.0, 2.0, 1.0, 20.0),
        ],
        vec![vec![10.0, 0.0, 15.0, 5.0], vec![5.0, 5.0, 5.0, 10.0]],
    )?;

    let config = PlanningConfig::new();
    let solver = MicroLpSolver::new();
    let outcome = InstancePipeline::new(&solver, &config).solve(&instance)?;

    println!(
        "模型規模: 需求列 {}、產能列 {}、連結列 {}",
        outcome.stats.demand_rows, outcome.stats.capacity_rows, outcome.stats.linkage_rows
    );
    println!("狀態: {:?}，總成本 {:?}\n", outcome.record.status, outcome.record.total_cost);

    let Some(plan) = outcome.plan else {
        println!("無可用的解");
        return Ok(());
    };

    println!("生產計劃:");
    for lot in &plan {
        println!(
            "  產品 {} 於第 {} 期生產 {:.1}（持有單位 {:.1}）",
            lot.product, lot.period, lot.quantity, lot.carried_units()
        );
        for allocation in &lot.allocations {
            println!("    -> 第 {} 期需求 {:.1}", allocation.period, allocation.quantity);
        }
    }

    Ok(())
}
