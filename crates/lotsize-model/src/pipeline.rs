//! 單一實例規劃流程：解析 → Big-M → 建模 → 求解 → 萃取

use std::path::Path;

use lotsize_core::{
    Instance, InstanceParser, LotSizingError, PlanningConfig, ProductionLot, RecordStatus,
    Result, SolutionRecord,
};
use lotsize_solver::{MipModel, MipSolver};

use crate::bounds::BoundCalculator;
use crate::builder::{LotSizingModel, ModelBuilder, ModelStats};
use crate::extractor::ResultExtractor;

/// 單一實例的完整結果
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// KPI 紀錄
    pub record: SolutionRecord,

    /// 生產批量計劃（無解時為 None）
    pub plan: Option<Vec<ProductionLot>>,

    /// 模型規模
    pub stats: ModelStats,
}

/// 規劃流程
pub struct InstancePipeline<'a, S: MipSolver> {
    solver: &'a S,
    config: &'a PlanningConfig,
}

impl<'a, S: MipSolver> InstancePipeline<'a, S> {
    /// 創建新的規劃流程
    pub fn new(solver: &'a S, config: &'a PlanningConfig) -> Self {
        Self { solver, config }
    }

    /// 求解單一實例並回傳 KPI 紀錄
    pub fn run(&self, instance: &Instance) -> Result<SolutionRecord> {
        self.solve(instance).map(|outcome| outcome.record)
    }

    /// 求解單一實例並回傳紀錄、生產計劃與模型規模
    ///
    /// 模型在函式結束前萃取完畢並釋放。
    pub fn solve(&self, instance: &Instance) -> Result<PipelineOutcome> {
        tracing::info!(
            "開始求解 {}：產品 {}、期數 {}",
            instance.name(),
            instance.product_count(),
            instance.period_count()
        );

        // Step 1: Big-M
        tracing::debug!("Step 1: 計算 Big-M");
        let big_m = BoundCalculator::compute(instance);

        // Step 2: 建構模型
        tracing::debug!("Step 2: 建構模型");
        let mut model = ModelBuilder::new(instance, &big_m)
            .with_unit_production_cost(self.config.unit_production_cost)
            .build(self.solver)
            .map_err(|e| {
                tracing::error!("實例 {} 模型建構失敗: {}", instance.name(), e);
                e
            })?;
        let stats = model.stats();

        // Step 3: 求解
        tracing::debug!("Step 3: 求解（時間上限 {:?}）", self.config.time_limit_secs);
        self.configure(&mut model);
        let status = model.solve(self.config.time_limit());

        // Step 4: 萃取結果
        tracing::debug!("Step 4: 萃取結果");
        let record = ResultExtractor::extract(instance, &model, status);
        let plan = ResultExtractor::production_plan(&model);

        tracing::info!(
            "完成 {}：{:?}，總成本 {:?}，耗時 {:.2}s",
            instance.name(),
            record.status,
            record.total_cost,
            record.time_seconds
        );

        Ok(PipelineOutcome {
            record,
            plan,
            stats,
        })
    }

    /// 套用與求解器相關的配置
    fn configure<M: MipModel>(&self, model: &mut LotSizingModel<M>) {
        model.set_output(!self.config.suppress_solver_output);
    }

    /// 解析並求解文字來源；任何失敗都轉為失敗紀錄
    pub fn run_source(&self, name: &str, text: &str) -> SolutionRecord {
        let parser = InstanceParser::from_config(self.config);
        match parser.parse_str(name, text) {
            Ok(instance) => self.run_parsed(&instance),
            Err(e) => Self::failure_record(name, e),
        }
    }

    /// 讀取並求解檔案；任何失敗都轉為失敗紀錄
    pub fn run_path(&self, path: &Path) -> SolutionRecord {
        let parser = InstanceParser::from_config(self.config);
        match parser.parse_path(path) {
            Ok(instance) => self.run_parsed(&instance),
            Err(e) => {
                let file = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                Self::failure_record(&file, e)
            }
        }
    }

    fn run_parsed(&self, instance: &Instance) -> SolutionRecord {
        match self.run(instance) {
            Ok(record) => record,
            Err(e) => SolutionRecord::for_instance(instance, Self::failure_status(&e))
                .with_message(e.to_string()),
        }
    }

    fn failure_record(file: &str, error: LotSizingError) -> SolutionRecord {
        tracing::warn!("實例 {} 無法處理: {}", file, error);
        SolutionRecord::failed(file, Self::failure_status(&error), error.to_string())
    }

    /// 錯誤對應的紀錄狀態
    fn failure_status(error: &LotSizingError) -> RecordStatus {
        match error {
            LotSizingError::MalformedInstance(_)
            | LotSizingError::InsufficientData { .. }
            | LotSizingError::InvalidConfig(_)
            | LotSizingError::Io(_) => RecordStatus::ParseError,
            LotSizingError::ModelConstruction(_) => RecordStatus::BuildError,
            _ => RecordStatus::SolverError,
        }
    }
}
