//! 生產批量計劃模型

use serde::{Deserialize, Serialize};

/// 生產批量（求解結果）
///
/// 一個產品在一個期別的生產，以及其分配到各需求期別的數量。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionLot {
    /// 產品索引
    pub product: usize,

    /// 生產期別
    pub period: usize,

    /// 生產數量
    pub quantity: f64,

    /// 是否整備
    pub setup: bool,

    /// 需求分配
    pub allocations: Vec<DemandAllocation>,
}

impl ProductionLot {
    /// 創建新的生產批量
    pub fn new(product: usize, period: usize, setup: bool) -> Self {
        Self {
            product,
            period,
            quantity: 0.0,
            setup,
            allocations: Vec::new(),
        }
    }

    /// 添加需求分配並累計生產數量
    pub fn add_allocation(&mut self, allocation: DemandAllocation) {
        self.quantity += allocation.quantity;
        self.allocations.push(allocation);
    }

    /// 持有單位數（數量乘以等待期數）
    pub fn carried_units(&self) -> f64 {
        self.allocations
            .iter()
            .map(|a| a.quantity * a.periods_held(self.period) as f64)
            .sum()
    }
}

/// 需求分配記錄
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemandAllocation {
    /// 滿足的需求期別
    pub period: usize,

    /// 分配數量
    pub quantity: f64,
}

impl DemandAllocation {
    /// 創建新的需求分配
    pub fn new(period: usize, quantity: f64) -> Self {
        Self { period, quantity }
    }

    /// 自生產期別起的等待期數
    pub fn periods_held(&self, produced_in: usize) -> usize {
        self.period.saturating_sub(produced_in)
    }
}
