//! KPI 報表：逐實例 CSV、實例類別平均與 JSON 摘要

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use lotsize_core::{LotSizingError, Result, SolutionRecord};
use serde::{Deserialize, Serialize};

/// 實例類別：檔名中第一個 `X` 後接三位數字，回傳該三位數字
pub fn instance_class(file: &str) -> Option<String> {
    let bytes = file.as_bytes();
    bytes.windows(4).find_map(|w| {
        if w[0] == b'X' && w[1..].iter().all(u8::is_ascii_digit) {
            std::str::from_utf8(&w[1..]).ok().map(str::to_string)
        } else {
            None
        }
    })
}

/// 類別平均
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassAverage {
    pub class: String,
    pub instances: usize,
    pub demand_total: Option<f64>,
    pub inventory_units: Option<f64>,
    pub holding_cost: Option<f64>,
    pub setup_cost: Option<f64>,
    pub total_cost: Option<f64>,
    pub time_seconds: Option<f64>,
    pub gap: Option<f64>,
}

/// 依類別計算平均值（略過缺值），四捨五入至小數第二位
///
/// 無法取得類別的紀錄不列入。
pub fn class_averages<F>(records: &[SolutionRecord], key: F) -> Vec<ClassAverage>
where
    F: Fn(&str) -> Option<String>,
{
    let mut groups: BTreeMap<String, Vec<&SolutionRecord>> = BTreeMap::new();
    for record in records {
        if let Some(class) = key(&record.file) {
            groups.entry(class).or_default().push(record);
        }
    }

    groups
        .into_iter()
        .map(|(class, members)| ClassAverage {
            instances: members.len(),
            demand_total: mean(members.iter().map(|r| r.demand_total)),
            inventory_units: mean(members.iter().map(|r| r.inventory_units)),
            holding_cost: mean(members.iter().map(|r| r.holding_cost)),
            setup_cost: mean(members.iter().map(|r| r.setup_cost)),
            total_cost: mean(members.iter().map(|r| r.total_cost)),
            time_seconds: mean(members.iter().map(|r| Some(r.time_seconds))),
            gap: mean(members.iter().map(|r| r.gap)),
            class,
        })
        .collect()
}

fn mean(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let (sum, count) = values
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(round2(sum / count as f64))
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 寫出逐實例 KPI 表
pub fn write_records_csv<W: Write>(records: &[SolutionRecord], writer: W) -> Result<()> {
    write_csv(records, writer)
}

/// 寫出類別平均表
pub fn write_averages_csv<W: Write>(averages: &[ClassAverage], writer: W) -> Result<()> {
    write_csv(averages, writer)
}

/// 寫出 CSV 檔
pub fn write_csv_file<T: Serialize>(rows: &[T], path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_csv(rows, file)?;
    tracing::info!("結果已寫入 {}", path.display());
    Ok(())
}

fn write_csv<T: Serialize, W: Write>(rows: &[T], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer
            .serialize(row)
            .map_err(|e| LotSizingError::Report(e.to_string()))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// 批次摘要
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub generated_at: DateTime<Utc>,
    pub instances: usize,
    pub solved: usize,
    pub failed: usize,
    pub averages: Vec<ClassAverage>,
}

impl BatchSummary {
    /// 由紀錄建立摘要，類別依 [`instance_class`] 分組
    pub fn new(records: &[SolutionRecord]) -> Self {
        let solved = records.iter().filter(|r| r.is_solved()).count();
        Self {
            generated_at: Utc::now(),
            instances: records.len(),
            solved,
            failed: records.len() - solved,
            averages: class_averages(records, instance_class),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| LotSizingError::Report(e.to_string()))
    }

    /// 寫出 JSON 檔
    pub fn write_json(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        tracing::info!("摘要已寫入 {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotsize_core::RecordStatus;

    fn solved(file: &str, total: f64, time: f64) -> SolutionRecord {
        SolutionRecord {
            file: file.to_string(),
            product_count: Some(2),
            period_count: Some(3),
            capacity: Some(100.0),
            demand_total: Some(30.0),
            inventory_units: Some(4.0),
            holding_cost: Some(total - 20.0),
            setup_cost: Some(20.0),
            setup_count: Some(2),
            total_cost: Some(total),
            time_seconds: time,
            gap: Some(0.0),
            status: RecordStatus::Optimal,
            message: None,
        }
    }

    #[test]
    fn test_instance_class() {
        assert_eq!(instance_class("X11117.txt"), Some("111".to_string()));
        assert_eq!(instance_class("setA_X042_b.txt"), Some("042".to_string()));
        assert_eq!(instance_class("XA123X9.txt"), None);
        assert_eq!(instance_class("x123.txt"), None);
    }

    #[test]
    fn test_class_averages() {
        let records = vec![
            solved("X11101.txt", 50.0, 1.0),
            solved("X11102.txt", 61.0, 2.0),
            solved("X22201.txt", 70.0, 0.5),
            SolutionRecord::failed("X22202.txt", RecordStatus::ParseError, "bad"),
            solved("other.txt", 10.0, 0.1),
        ];

        let averages = class_averages(&records, instance_class);

        assert_eq!(averages.len(), 2);
        assert_eq!(averages[0].class, "111");
        assert_eq!(averages[0].instances, 2);
        assert_eq!(averages[0].total_cost, Some(55.5));
        assert_eq!(averages[0].time_seconds, Some(1.5));

        // 失敗紀錄計入個數，但不影響成本平均
        assert_eq!(averages[1].class, "222");
        assert_eq!(averages[1].instances, 2);
        assert_eq!(averages[1].total_cost, Some(70.0));
        assert_eq!(averages[1].time_seconds, Some(0.25));
    }

    #[test]
    fn test_mean_rounds_to_two_decimals() {
        assert_eq!(mean([Some(1.0), Some(2.0), Some(2.0)].into_iter()), Some(1.67));
        assert_eq!(mean([None, None].into_iter()), None);
    }

    #[test]
    fn test_write_records_csv() {
        let records = vec![
            solved("X11101.txt", 50.0, 1.0),
            SolutionRecord::failed("bad.txt", RecordStatus::ParseError, "需求資料不足"),
        ];
        let mut buffer = Vec::new();

        write_records_csv(&records, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("file,product_count,period_count,capacity,demand_total"));
        assert!(lines[1].contains("OPTIMAL"));
        assert!(lines[2].starts_with("bad.txt,,,,,"));
        assert!(lines[2].contains("PARSE_ERROR"));
    }

    #[test]
    fn test_batch_summary() {
        let records = vec![
            solved("X11101.txt", 50.0, 1.0),
            SolutionRecord::failed("X11102.txt", RecordStatus::ParseError, "bad"),
        ];

        let summary = BatchSummary::new(&records);
        let json = summary.to_json().unwrap();

        assert_eq!(summary.instances, 2);
        assert_eq!(summary.solved, 1);
        assert_eq!(summary.failed, 1);
        assert!(json.contains("\"generated_at\""));
        assert!(json.contains("\"class\": \"111\""));
    }
}
