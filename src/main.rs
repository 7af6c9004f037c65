//! 批量規劃命令列工具
//!
//! 對一組實例檔建模、求解並輸出 KPI 表。

use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use lotsize::config::DEFAULT_DEMAND_BLOCK;
use lotsize::{
    discover_instances, logging, select_shard, write_averages_csv, write_csv_file,
    write_records_csv, BatchRunner, BatchSummary, DemandLayout, MicroLpSolver, MipSolver,
    PlanningConfig, Shard, SolutionRecord,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SolverArg {
    /// 純 Rust 後端，不支援時間上限
    Microlp,
    /// HiGHS 後端
    #[cfg(feature = "highs")]
    Highs,
}

impl Default for SolverArg {
    #[cfg(feature = "highs")]
    fn default() -> Self {
        SolverArg::Highs
    }

    #[cfg(not(feature = "highs"))]
    fn default() -> Self {
        SolverArg::Microlp
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LayoutArg {
    /// 每個產品依序列出所有期別
    ProductMajor,
    /// 每 `--block` 個產品一組，組內逐期列出
    PeriodBlocks,
}

#[derive(Debug, Parser)]
#[command(name = "lotsize", version, about = "產能受限多產品批量規劃（運輸重構 MIP）")]
struct Cli {
    /// 實例檔
    files: Vec<PathBuf>,

    /// 實例目錄（讀取其中所有 .txt）
    #[arg(long)]
    dir: Option<PathBuf>,

    /// 每個實例的求解時間上限（秒）
    #[arg(long, default_value_t = lotsize::config::DEFAULT_TIME_LIMIT_SECS)]
    time_limit: f64,

    /// 分片總數
    #[arg(long, env = "PARTS", default_value_t = 1)]
    parts: usize,

    /// 本分片索引
    #[arg(long, env = "PART", default_value_t = 0)]
    part: usize,

    /// 最多處理的檔案數
    #[arg(long)]
    limit: Option<usize>,

    /// 行程內平行求解的執行緒數
    #[arg(long, default_value_t = 1)]
    workers: usize,

    /// 需求資料排列方式
    #[arg(long, value_enum, default_value_t = LayoutArg::ProductMajor)]
    layout: LayoutArg,

    /// period-blocks 排列的區塊大小
    #[arg(long, default_value_t = DEFAULT_DEMAND_BLOCK)]
    block: usize,

    /// MIP 求解器後端
    #[arg(long, value_enum, default_value_t = SolverArg::default())]
    solver: SolverArg,

    /// 顯示求解器輸出
    #[arg(long)]
    solver_output: bool,

    /// 單位生產成本
    #[arg(long, default_value_t = 0.0)]
    unit_production_cost: f64,

    /// KPI 表輸出路徑（預設寫到標準輸出）
    #[arg(long)]
    output: Option<PathBuf>,

    /// 類別平均表輸出路徑
    #[arg(long)]
    averages: Option<PathBuf>,

    /// JSON 摘要輸出路徑
    #[arg(long)]
    summary: Option<PathBuf>,
}

impl Cli {
    fn config(&self) -> PlanningConfig {
        let layout = match self.layout {
            LayoutArg::ProductMajor => DemandLayout::ProductMajor,
            LayoutArg::PeriodBlocks => DemandLayout::PeriodMajorBlocks { block: self.block },
        };

        PlanningConfig::new()
            .with_time_limit_secs(Some(self.time_limit))
            .with_unit_production_cost(self.unit_production_cost)
            .with_demand_layout(layout)
            .with_shard(Shard::new(self.parts, self.part))
            .with_file_limit(self.limit)
            .with_workers(self.workers)
            .with_suppress_solver_output(!self.solver_output)
    }

    fn instance_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = self.files.clone();
        if let Some(dir) = &self.dir {
            let found = discover_instances(dir)
                .with_context(|| format!("無法讀取實例目錄 {}", dir.display()))?;
            files.extend(found);
        }
        if files.is_empty() {
            bail!("未指定任何實例檔（請提供檔案或 --dir）");
        }
        Ok(files)
    }
}

fn main() -> Result<()> {
    logging::init();

    let cli = Cli::parse();
    let config = cli.config();
    config.validate().context("設定無效")?;

    let all = cli.instance_files()?;
    let total = all.len();
    let selected = select_shard(all, &config.shard, config.file_limit)?;
    tracing::info!(
        "分片 {}/{}：處理 {} / {} 個實例",
        config.shard.part,
        config.shard.parts,
        selected.len(),
        total
    );

    let records = match cli.solver {
        SolverArg::Microlp => run_batch(MicroLpSolver::new(), config, &selected)?,
        #[cfg(feature = "highs")]
        SolverArg::Highs => run_batch(lotsize::HighsSolver::new(), config, &selected)?,
    };

    match &cli.output {
        Some(path) => write_csv_file(&records, path)
            .with_context(|| format!("無法寫入 {}", path.display()))?,
        None => write_records_csv(&records, io::stdout().lock())?,
    }

    let summary = BatchSummary::new(&records);
    if let Some(path) = &cli.averages {
        let file = std::fs::File::create(path)
            .with_context(|| format!("無法建立 {}", path.display()))?;
        write_averages_csv(&summary.averages, file)?;
        tracing::info!("類別平均已寫入 {}", path.display());
    }
    if let Some(path) = &cli.summary {
        summary
            .write_json(path)
            .with_context(|| format!("無法寫入 {}", path.display()))?;
    }

    tracing::info!(
        "完成：{} 個實例，{} 個有解，{} 個失敗",
        summary.instances,
        summary.solved,
        summary.failed
    );
    Ok(())
}

fn run_batch<S: MipSolver>(
    solver: S,
    config: PlanningConfig,
    files: &[PathBuf],
) -> Result<Vec<SolutionRecord>> {
    let runner = BatchRunner::new(solver, config)?;
    Ok(runner.run(files)?)
}
