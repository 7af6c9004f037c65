//! # Lot-Sizing
//!
//! 產能受限多產品批量規劃（運輸重構 MIP）
//!
//! 匯出各子 crate 的主要類型，並提供 CLI 使用的日誌初始化。

pub use lotsize_core::*;
pub use lotsize_model::*;
#[cfg(feature = "highs")]
pub use lotsize_solver::{HighsModel, HighsSolver};
pub use lotsize_solver::{
    Direction, MicroLpModel, MicroLpSolver, MipModel, MipSolver, Relation, TerminationStatus,
    Term, VarHandle,
};

pub mod logging {
    //! 日誌系統初始化（tracing-subscriber）

    use tracing_subscriber::{fmt, EnvFilter};

    /// 初始化日誌系統
    ///
    /// # 環境變數
    /// - RUST_LOG: 日誌級別過濾器（預設: info）
    ///   例如: RUST_LOG=debug 或 RUST_LOG=lotsize_model=trace
    pub fn init() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_line_number(true)
            .init();
    }

    /// 測試用日誌：輸出交給測試框架擷取，預設顯示本專案的 debug 訊息
    ///
    /// 可重複呼叫；已安裝 subscriber 時不做任何事。
    pub fn init_test() {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("lotsize=debug,lotsize_model=debug"));

        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(false)
            .try_init();
    }
}
