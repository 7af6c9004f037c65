//! 結果萃取

use lotsize_core::{DemandAllocation, Instance, ProductionLot, RecordStatus, SolutionRecord};
use lotsize_solver::{MipModel, TerminationStatus};

use crate::builder::LotSizingModel;

/// 視為零的流量門檻
const QUANTITY_EPSILON: f64 = 1e-9;

/// 整備變數視為 1 的門檻
const SETUP_THRESHOLD: f64 = 0.5;

/// KPI 彙總
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Kpis {
    inventory_units: f64,
    holding_cost: f64,
    setup_cost: f64,
    setup_count: usize,
    production_cost: f64,
}

/// 結果萃取器
pub struct ResultExtractor;

impl ResultExtractor {
    /// 由已結束求解的模型產生 KPI 紀錄
    ///
    /// 無解（不可行、時限內無解、錯誤）時成本欄位保持 None。
    pub fn extract<M: MipModel>(
        instance: &Instance,
        model: &LotSizingModel<M>,
        status: TerminationStatus,
    ) -> SolutionRecord {
        let mut record = SolutionRecord::for_instance(instance, Self::record_status(status));
        record.time_seconds = model.elapsed().as_secs_f64();

        if !status.has_solution() {
            return record;
        }

        let kpis = match Self::compute_kpis(instance, model) {
            Some(kpis) => kpis,
            None => {
                tracing::warn!("實例 {} 回報 {:?} 但無法讀取變數值", instance.name(), status);
                return record
                    .with_message("求解器回報有解但無變數值")
                    .with_status(RecordStatus::SolverError);
            }
        };

        record.inventory_units = Some(kpis.inventory_units);
        record.holding_cost = Some(kpis.holding_cost);
        record.setup_cost = Some(kpis.setup_cost);
        record.setup_count = Some(kpis.setup_count);
        record.total_cost = Some(kpis.holding_cost + kpis.setup_cost + kpis.production_cost);
        record.gap = model.mip_gap();
        record
    }

    /// 終止狀態對應的紀錄狀態
    pub fn record_status(status: TerminationStatus) -> RecordStatus {
        match status {
            TerminationStatus::Optimal => RecordStatus::Optimal,
            TerminationStatus::FeasibleTimeLimit => RecordStatus::FeasibleTimeLimit,
            TerminationStatus::Infeasible => RecordStatus::Infeasible,
            TerminationStatus::TimeLimitNoSolution => RecordStatus::TimeLimitNoSolution,
            TerminationStatus::Error => RecordStatus::SolverError,
        }
    }

    /// 萃取生產批量計劃；模型無解時回傳 None
    pub fn production_plan<M: MipModel>(model: &LotSizingModel<M>) -> Option<Vec<ProductionLot>> {
        let mut lots = Vec::new();

        for (&(j, t), &setup_var) in model.setups() {
            let setup = model.value(setup_var)? >= SETUP_THRESHOLD;
            let mut lot = ProductionLot::new(j, t, setup);

            for (key, &var) in model.production_flows(j, t) {
                let quantity = model.value(var)?;
                if quantity > QUANTITY_EPSILON {
                    lot.add_allocation(DemandAllocation::new(key.serves, quantity));
                }
            }

            if lot.setup || lot.quantity > QUANTITY_EPSILON {
                lots.push(lot);
            }
        }

        Some(lots)
    }

    fn compute_kpis<M: MipModel>(instance: &Instance, model: &LotSizingModel<M>) -> Option<Kpis> {
        let mut kpis = Kpis::default();
        let mut produced = 0.0;

        for (key, &var) in model.flows() {
            let quantity = model.value(var)?;
            produced += quantity;

            let held = key.periods_held();
            if held > 0 {
                let weighted = held as f64 * quantity;
                kpis.inventory_units += weighted;
                kpis.holding_cost += weighted * instance.product(key.product).holding_cost;
            }
        }

        for (&(j, _), &var) in model.setups() {
            if model.value(var)? >= SETUP_THRESHOLD {
                kpis.setup_count += 1;
                kpis.setup_cost += instance.product(j).setup_cost;
            }
        }

        kpis.production_cost = produced * model.unit_production_cost();
        Some(kpis)
    }
}
