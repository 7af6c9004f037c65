//! # Lot-Sizing Core
//!
//! 核心資料模型與類型定義

pub mod config;
pub mod instance;
pub mod parser;
pub mod plan;
pub mod record;

// Re-export 主要類型
pub use config::{DemandLayout, PlanningConfig, Shard};
pub use instance::{Instance, Product};
pub use parser::InstanceParser;
pub use plan::{DemandAllocation, ProductionLot};
pub use record::{RecordStatus, SolutionRecord};

/// 批量規劃錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum LotSizingError {
    #[error("實例格式錯誤: {0}")]
    MalformedInstance(String),

    #[error("需求資料不足：需要 {expected} 筆，僅讀到 {found} 筆")]
    InsufficientData { expected: usize, found: usize },

    #[error("模型建構錯誤: {0}")]
    ModelConstruction(String),

    #[error("求解器錯誤: {0}")]
    Solver(String),

    #[error("無效的配置: {0}")]
    InvalidConfig(String),

    #[error("報表輸出錯誤: {0}")]
    Report(String),

    #[error("讀取錯誤: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LotSizingError>;
