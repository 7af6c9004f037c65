//! 問題實例模型

use serde::{Deserialize, Serialize};

use crate::{LotSizingError, Result};

/// 產品參數
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// 單位加工時間
    pub unit_processing_time: f64,

    /// 單位持有成本（每單位每期）
    pub holding_cost: f64,

    /// 整備時間（生產當期佔用產能）
    pub setup_time: f64,

    /// 整備成本（生產當期發生）
    pub setup_cost: f64,
}

impl Product {
    /// 創建新的產品參數
    pub fn new(unit_processing_time: f64, holding_cost: f64, setup_time: f64, setup_cost: f64) -> Self {
        Self {
            unit_processing_time,
            holding_cost,
            setup_time,
            setup_cost,
        }
    }

    fn validate(&self, index: usize) -> Result<()> {
        let fields = [
            ("unit_processing_time", self.unit_processing_time),
            ("holding_cost", self.holding_cost),
            ("setup_time", self.setup_time),
            ("setup_cost", self.setup_cost),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(LotSizingError::MalformedInstance(format!(
                    "產品 {} 的 {} 必須為非負實數，讀到 {}",
                    index, field, value
                )));
            }
        }
        Ok(())
    }
}

/// 多產品多期產能受限批量問題實例
///
/// 建立後不可變更；所有欄位經由存取方法讀取。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instance {
    name: String,
    capacity: f64,
    products: Vec<Product>,
    /// 需求矩陣，產品 × 期別
    demand: Vec<Vec<f64>>,
}

impl Instance {
    /// 創建新的實例並檢查維度與數值
    pub fn new(
        name: impl Into<String>,
        capacity: f64,
        products: Vec<Product>,
        demand: Vec<Vec<f64>>,
    ) -> Result<Self> {
        if products.is_empty() {
            return Err(LotSizingError::MalformedInstance("產品數必須為正整數".to_string()));
        }
        if demand.len() != products.len() {
            return Err(LotSizingError::MalformedInstance(format!(
                "需求列數 {} 與產品數 {} 不符",
                demand.len(),
                products.len()
            )));
        }

        let period_count = demand[0].len();
        if period_count == 0 {
            return Err(LotSizingError::MalformedInstance("期數必須為正整數".to_string()));
        }

        if !capacity.is_finite() || capacity < 0.0 {
            return Err(LotSizingError::MalformedInstance(format!(
                "產能必須為非負實數，讀到 {}",
                capacity
            )));
        }

        for (j, product) in products.iter().enumerate() {
            product.validate(j)?;
        }

        for (j, row) in demand.iter().enumerate() {
            if row.len() != period_count {
                return Err(LotSizingError::MalformedInstance(format!(
                    "產品 {} 的需求長度 {} 與期數 {} 不符",
                    j,
                    row.len(),
                    period_count
                )));
            }
            if let Some((t, value)) = row
                .iter()
                .enumerate()
                .find(|(_, d)| !d.is_finite() || **d < 0.0)
            {
                return Err(LotSizingError::MalformedInstance(format!(
                    "產品 {} 第 {} 期需求為負值或非數值: {}",
                    j, t, value
                )));
            }
        }

        Ok(Self {
            name: name.into(),
            capacity,
            products,
            demand,
        })
    }

    /// 實例名稱（通常為來源檔名）
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    pub fn period_count(&self) -> usize {
        self.demand[0].len()
    }

    /// 每期可用產能
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn product(&self, j: usize) -> &Product {
        &self.products[j]
    }

    /// 產品 j 在第 t 期的需求
    pub fn demand(&self, j: usize, t: usize) -> f64 {
        self.demand[j][t]
    }

    pub fn demand_row(&self, j: usize) -> &[f64] {
        &self.demand[j]
    }

    /// 產品 j 自第 t 期起（含）的剩餘需求
    pub fn future_demand(&self, j: usize, t: usize) -> f64 {
        self.demand[j][t..].iter().sum()
    }

    /// 所有產品所有期別的總需求
    pub fn total_demand(&self) -> f64 {
        self.demand.iter().flat_map(|row| row.iter()).sum()
    }
}
