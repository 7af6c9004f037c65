//! # Lot-Sizing Solver
//!
//! MIP 求解器能力介面。模型建構與結果萃取只依賴此處定義的能力集合，
//! 不依賴任何特定求解器的原生 API。

#[cfg(feature = "highs")]
pub mod highs;
pub mod microlp;
mod program;

use std::time::Duration;

use serde::{Deserialize, Serialize};

// Re-export 主要類型
#[cfg(feature = "highs")]
pub use self::highs::{HighsModel, HighsSolver};
pub use microlp::{MicroLpModel, MicroLpSolver};

/// 變數代號
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarHandle(usize);

impl VarHandle {
    /// 以欄位索引創建代號
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// 欄位索引
    pub fn index(&self) -> usize {
        self.0
    }
}

/// 線性項：(變數, 係數)
pub type Term = (VarHandle, f64);

/// 約束關係
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Equal,
    LessOrEqual,
    GreaterOrEqual,
}

/// 目標方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Minimize,
    Maximize,
}

/// 求解終止狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TerminationStatus {
    /// 已證明最佳
    Optimal,
    /// 達時間上限，持有可行解
    FeasibleTimeLimit,
    /// 證明不可行
    Infeasible,
    /// 達時間上限，未找到可行解
    TimeLimitNoSolution,
    /// 求解器錯誤
    Error,
}

impl TerminationStatus {
    /// 是否帶有可讀取的解
    pub fn has_solution(&self) -> bool {
        matches!(
            self,
            TerminationStatus::Optimal | TerminationStatus::FeasibleTimeLimit
        )
    }
}

/// MIP 求解器：為每個實例產生獨立的模型
pub trait MipSolver: Sync {
    type Model: MipModel;

    /// 創建空模型
    fn create_model(&self, name: &str) -> Self::Model;

    /// 是否會在時間上限到達時中止求解
    fn enforces_time_limit(&self) -> bool {
        true
    }
}

/// MIP 模型能力集合
pub trait MipModel {
    /// 新增連續變數（下界為 `lower_bound`，無上界）
    fn add_continuous_variable(&mut self, lower_bound: f64) -> VarHandle;

    /// 新增二元變數
    fn add_binary_variable(&mut self) -> VarHandle;

    /// 新增線性約束 `Σ coef·var (relation) rhs`
    fn add_linear_constraint(&mut self, terms: &[Term], relation: Relation, rhs: f64);

    /// 設置目標式
    fn set_objective(&mut self, terms: &[Term], direction: Direction);

    /// 開關求解器輸出；沒有輸出的後端忽略此設定
    fn set_output(&mut self, _enabled: bool) {}

    /// 同步求解；呼叫端阻塞至求解結束或達時間上限
    fn solve(&mut self, time_limit: Option<Duration>) -> TerminationStatus;

    /// 變數值；尚無解時為 None
    fn value(&self, var: VarHandle) -> Option<f64>;

    /// 最近一次求解耗時
    fn elapsed(&self) -> Duration;

    /// 最近一次求解的 MIP 間隙
    fn mip_gap(&self) -> Option<f64>;
}
