//! # Lot-Sizing Model
//!
//! 運輸重構模型：Big-M 計算、模型建構、結果萃取與批次執行

pub mod batch;
pub mod bounds;
pub mod builder;
pub mod extractor;
pub mod pipeline;
pub mod report;

// Re-export 主要類型
pub use batch::{discover_instances, select_shard, BatchRunner};
pub use bounds::{BigMTable, BoundCalculator};
pub use builder::{FlowKey, LotSizingModel, ModelBuilder, ModelStats};
pub use extractor::ResultExtractor;
pub use pipeline::{InstancePipeline, PipelineOutcome};
pub use report::{
    class_averages, instance_class, write_averages_csv, write_csv_file, write_records_csv,
    BatchSummary, ClassAverage,
};
