//! 批次執行
//!
//! 每個實例各自建模、求解、萃取，彼此不共享可變狀態。
//! 跨行程以分片（parts/part）切分檔案；同一行程內可用 rayon 平行。

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use lotsize_core::{LotSizingError, PlanningConfig, Result, Shard, SolutionRecord};
use lotsize_solver::MipSolver;
use rayon::prelude::*;

use crate::pipeline::InstancePipeline;

/// 實例檔副檔名
const INSTANCE_EXTENSION: &str = "txt";

/// 列出目錄下所有實例檔（依路徑排序）
pub fn discover_instances(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == INSTANCE_EXTENSION) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// 選出本分片負責的檔案，並套用數量上限
pub fn select_shard(paths: Vec<PathBuf>, shard: &Shard, limit: Option<usize>) -> Result<Vec<PathBuf>> {
    shard.validate()?;

    let mut selected: Vec<PathBuf> = paths
        .into_iter()
        .enumerate()
        .filter(|(i, _)| shard.contains(*i))
        .map(|(_, path)| path)
        .collect();

    if let Some(limit) = limit {
        selected.truncate(limit);
    }
    Ok(selected)
}

/// 批次執行器
pub struct BatchRunner<S: MipSolver> {
    solver: S,
    config: PlanningConfig,
}

impl<S: MipSolver> BatchRunner<S> {
    /// 創建新的批次執行器
    pub fn new(solver: S, config: PlanningConfig) -> Result<Self> {
        config.validate()?;
        if config.time_limit_secs.is_some() && !solver.enforces_time_limit() {
            tracing::warn!(
                "求解器不支援時間上限，{:?} 秒的設定不會生效",
                config.time_limit_secs
            );
        }
        Ok(Self { solver, config })
    }

    pub fn config(&self) -> &PlanningConfig {
        &self.config
    }

    /// 探索目錄、套用分片後執行
    pub fn run_dir(&self, dir: &Path) -> Result<Vec<SolutionRecord>> {
        let all = discover_instances(dir)?;
        let total = all.len();
        let selected = select_shard(all, &self.config.shard, self.config.file_limit)?;

        tracing::info!(
            "求解 {} / {} 個實例（分片 {}/{}，時間上限 {:?}）",
            selected.len(),
            total,
            self.config.shard.part,
            self.config.shard.parts,
            self.config.time_limit_secs
        );

        self.run(&selected)
    }

    /// 依序（或平行）執行每個檔案，輸出順序與輸入相同
    ///
    /// 單一實例失敗只會產生失敗紀錄，不會中斷批次。
    pub fn run(&self, paths: &[PathBuf]) -> Result<Vec<SolutionRecord>> {
        let pipeline = InstancePipeline::new(&self.solver, &self.config);
        let total = paths.len();
        let finished = AtomicUsize::new(0);

        let solve_one = |path: &PathBuf| {
            let record = pipeline.run_path(path);
            let done = finished.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::info!(
                "[{}/{}] {}  {:?}  ({:.2}s)",
                done,
                total,
                record.file,
                record.status,
                record.time_seconds
            );
            record
        };

        if self.config.workers <= 1 {
            return Ok(paths.iter().map(solve_one).collect());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .build()
            .map_err(|e| LotSizingError::Solver(format!("無法建立執行緒池: {}", e)))?;

        Ok(pool.install(|| paths.par_iter().map(solve_one).collect()))
    }
}
