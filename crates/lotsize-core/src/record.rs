//! 單一實例的 KPI 紀錄

use serde::{Deserialize, Serialize};

use crate::Instance;

/// 紀錄狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordStatus {
    /// 已證明最佳
    Optimal,
    /// 時間上限內找到可行解
    FeasibleTimeLimit,
    /// 求解器證明不可行
    Infeasible,
    /// 時間上限內未找到任何解
    TimeLimitNoSolution,
    /// 求解器回報錯誤
    SolverError,
    /// 實例解析失敗
    ParseError,
    /// 模型建構失敗
    BuildError,
}

impl RecordStatus {
    /// 是否帶有可用的解
    pub fn has_solution(&self) -> bool {
        matches!(self, RecordStatus::Optimal | RecordStatus::FeasibleTimeLimit)
    }
}

/// 每個實例的 KPI 紀錄
///
/// 無解時成本欄位為 None，與「成本為 0 的解」區分。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionRecord {
    /// 來源檔名
    pub file: String,

    pub product_count: Option<usize>,
    pub period_count: Option<usize>,
    pub capacity: Option<f64>,
    pub demand_total: Option<f64>,

    /// 等待至少一期的庫存單位（依等待期數加權）
    pub inventory_units: Option<f64>,
    pub holding_cost: Option<f64>,
    pub setup_cost: Option<f64>,
    pub setup_count: Option<usize>,
    pub total_cost: Option<f64>,

    /// 求解耗時（秒）
    pub time_seconds: f64,

    /// MIP 間隙
    pub gap: Option<f64>,

    pub status: RecordStatus,

    /// 失敗說明
    pub message: Option<String>,
}

impl SolutionRecord {
    /// 以實例基本資料創建無成本欄位的紀錄
    pub fn for_instance(instance: &Instance, status: RecordStatus) -> Self {
        Self {
            file: instance.name().to_string(),
            product_count: Some(instance.product_count()),
            period_count: Some(instance.period_count()),
            capacity: Some(instance.capacity()),
            demand_total: Some(instance.total_demand()),
            inventory_units: None,
            holding_cost: None,
            setup_cost: None,
            setup_count: None,
            total_cost: None,
            time_seconds: 0.0,
            gap: None,
            status,
            message: None,
        }
    }

    /// 創建失敗紀錄（實例未能解析時不含任何實例資料）
    pub fn failed(file: impl Into<String>, status: RecordStatus, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            product_count: None,
            period_count: None,
            capacity: None,
            demand_total: None,
            inventory_units: None,
            holding_cost: None,
            setup_cost: None,
            setup_count: None,
            total_cost: None,
            time_seconds: 0.0,
            gap: None,
            status,
            message: Some(message.into()),
        }
    }

    /// 建構器模式：設置失敗說明
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// 建構器模式：設置狀態
    pub fn with_status(mut self, status: RecordStatus) -> Self {
        self.status = status;
        self
    }

    /// 檢查是否帶有可用的解
    pub fn is_solved(&self) -> bool {
        self.status.has_solution() && self.total_cost.is_some()
    }
}
