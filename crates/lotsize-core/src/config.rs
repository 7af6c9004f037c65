//! 規劃執行配置

use serde::{Deserialize, Serialize};

use crate::{LotSizingError, Result};

/// 單一實例的預設求解時間上限（秒）
pub const DEFAULT_TIME_LIMIT_SECS: f64 = 900.0;

/// 基準檔案中每個需求區塊的產品數
pub const DEFAULT_DEMAND_BLOCK: usize = 15;

/// 規劃流程配置
///
/// 明確傳入流程入口，不使用行程層級的全域狀態。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningConfig {
    /// 每個實例的求解時間上限（秒），None 表示不限制
    pub time_limit_secs: Option<f64>,

    /// 單位生產成本（預設為 0，不計入目標式）
    pub unit_production_cost: f64,

    /// 需求資料排列方式
    pub demand_layout: DemandLayout,

    /// 批次分片
    pub shard: Shard,

    /// 最多處理的檔案數
    pub file_limit: Option<usize>,

    /// 同一行程內的平行工作數
    pub workers: usize,

    /// 是否關閉求解器輸出
    pub suppress_solver_output: bool,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: Some(DEFAULT_TIME_LIMIT_SECS),
            unit_production_cost: 0.0,
            demand_layout: DemandLayout::ProductMajor,
            shard: Shard::default(),
            file_limit: None,
            workers: 1,
            suppress_solver_output: true,
        }
    }
}

impl PlanningConfig {
    /// 創建預設配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 從 JSON 字串載入配置，缺少的欄位使用預設值
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| LotSizingError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 建構器模式：設置求解時間上限
    pub fn with_time_limit_secs(mut self, secs: Option<f64>) -> Self {
        self.time_limit_secs = secs;
        self
    }

    /// 建構器模式：設置單位生產成本
    pub fn with_unit_production_cost(mut self, cost: f64) -> Self {
        self.unit_production_cost = cost;
        self
    }

    /// 建構器模式：設置需求排列方式
    pub fn with_demand_layout(mut self, layout: DemandLayout) -> Self {
        self.demand_layout = layout;
        self
    }

    /// 建構器模式：設置分片
    pub fn with_shard(mut self, shard: Shard) -> Self {
        self.shard = shard;
        self
    }

    /// 建構器模式：設置檔案數上限
    pub fn with_file_limit(mut self, limit: Option<usize>) -> Self {
        self.file_limit = limit;
        self
    }

    /// 建構器模式：設置平行工作數（至少為 1）
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// 建構器模式：設置是否關閉求解器輸出
    pub fn with_suppress_solver_output(mut self, suppress: bool) -> Self {
        self.suppress_solver_output = suppress;
        self
    }

    /// 檢查配置是否有效
    pub fn validate(&self) -> Result<()> {
        self.shard.validate()?;

        if let Some(limit) = self.time_limit_secs {
            if !limit.is_finite() || limit <= 0.0 {
                return Err(LotSizingError::InvalidConfig(format!(
                    "求解時間上限必須為正數，讀到 {}",
                    limit
                )));
            }
        }

        if !self.unit_production_cost.is_finite() || self.unit_production_cost < 0.0 {
            return Err(LotSizingError::InvalidConfig(format!(
                "單位生產成本必須為非負數，讀到 {}",
                self.unit_production_cost
            )));
        }

        self.demand_layout.validate()?;

        Ok(())
    }

    /// 時間上限轉為 Duration
    pub fn time_limit(&self) -> Option<std::time::Duration> {
        self.time_limit_secs.map(std::time::Duration::from_secs_f64)
    }
}

/// 需求資料排列方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandLayout {
    /// 以產品為主：每個產品依序列出所有期別
    ProductMajor,

    /// 分區塊以期別為主：每 `block` 個產品一組，
    /// 組內逐期列出該組所有產品的需求
    PeriodMajorBlocks { block: usize },
}

impl Default for DemandLayout {
    fn default() -> Self {
        DemandLayout::ProductMajor
    }
}

impl DemandLayout {
    /// 檢查排列參數
    pub fn validate(&self) -> Result<()> {
        match *self {
            DemandLayout::PeriodMajorBlocks { block: 0 } => Err(LotSizingError::InvalidConfig(
                "需求區塊大小必須為正數".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// 第 `index` 個讀入的需求值對應的（產品, 期別）
    ///
    /// 呼叫前需通過 [`DemandLayout::validate`]，且 `index < product_count * period_count`。
    /// 區塊大小超過產品數時視為單一區塊。
    pub fn position(&self, index: usize, product_count: usize, period_count: usize) -> (usize, usize) {
        match *self {
            DemandLayout::ProductMajor => (index / period_count, index % period_count),
            DemandLayout::PeriodMajorBlocks { block } => {
                let block = block.min(product_count);
                let full_block_span = block * period_count;
                let base = (index / full_block_span) * block;
                let width = block.min(product_count - base);
                let offset = index - base * period_count;
                (base + offset % width, offset / width)
            }
        }
    }
}

/// 批次分片：保留索引 `i % parts == part` 的檔案
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shard {
    /// 分片總數
    pub parts: usize,

    /// 本工作負責的分片
    pub part: usize,
}

impl Default for Shard {
    fn default() -> Self {
        Self { parts: 1, part: 0 }
    }
}

impl Shard {
    /// 創建新的分片
    pub fn new(parts: usize, part: usize) -> Self {
        Self { parts, part }
    }

    /// 檢查分片索引
    pub fn validate(&self) -> Result<()> {
        if self.parts == 0 || self.part >= self.parts {
            return Err(LotSizingError::InvalidConfig(format!(
                "分片索引無效: part={} parts={}",
                self.part, self.parts
            )));
        }
        Ok(())
    }

    /// 檢查第 `index` 個檔案是否屬於本分片
    pub fn contains(&self, index: usize) -> bool {
        index % self.parts == self.part
    }
}
