//! 實例解析
//!
//! 輸入為以空白、逗號或分號分隔的數值符號串流：
//! 產品數、期數、一個保留欄位（不使用）、產能、
//! 每個產品的 (加工時間, 持有成本, 整備時間, 整備成本)，
//! 最後是 產品數 × 期數 筆需求。讀滿需求後的符號一律忽略。

use std::path::Path;

use crate::config::{DemandLayout, PlanningConfig};
use crate::instance::{Instance, Product};
use crate::{LotSizingError, Result};

/// 將文字切分為數值符號
pub fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .filter(|token| !token.is_empty())
}

/// 實例解析器
#[derive(Debug, Clone, Copy, Default)]
pub struct InstanceParser {
    layout: DemandLayout,
}

impl InstanceParser {
    /// 創建新的解析器
    pub fn new(layout: DemandLayout) -> Self {
        Self { layout }
    }

    /// 依規劃配置創建解析器
    pub fn from_config(config: &PlanningConfig) -> Self {
        Self::new(config.demand_layout)
    }

    /// 從檔案解析，實例名稱為檔名
    pub fn parse_path(&self, path: &Path) -> Result<Instance> {
        let text = std::fs::read_to_string(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.parse_str(name, &text)
    }

    /// 從文字解析
    pub fn parse_str(&self, name: impl Into<String>, text: &str) -> Result<Instance> {
        self.parse_tokens(name, tokenize(text))
    }

    /// 從符號串流解析
    pub fn parse_tokens<I, S>(&self, name: impl Into<String>, tokens: I) -> Result<Instance>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.layout.validate()?;

        let name = name.into();
        let mut cursor = TokenCursor::new(tokens.into_iter());

        let product_count = cursor.next_count("產品數")?;
        let period_count = cursor.next_count("期數")?;

        // 保留欄位：僅為相容舊格式而略過
        cursor.next_token("保留欄位")?;

        let capacity = cursor.next_non_negative("產能")?;

        let mut products = Vec::new();
        for j in 0..product_count {
            let unit_processing_time = cursor.next_non_negative(&format!("產品 {} 加工時間", j))?;
            let holding_cost = cursor.next_non_negative(&format!("產品 {} 持有成本", j))?;
            let setup_time = cursor.next_non_negative(&format!("產品 {} 整備時間", j))?;
            let setup_cost = cursor.next_non_negative(&format!("產品 {} 整備成本", j))?;
            products.push(Product::new(
                unit_processing_time,
                holding_cost,
                setup_time,
                setup_cost,
            ));
        }

        let expected = product_count.checked_mul(period_count).ok_or_else(|| {
            LotSizingError::MalformedInstance(format!(
                "需求筆數溢位: {} × {}",
                product_count, period_count
            ))
        })?;

        // 先讀入實際存在的需求值，宣告筆數不足時不配置矩陣
        let mut values = Vec::new();
        while values.len() < expected {
            let Some(token) = cursor.tokens.next() else {
                return Err(LotSizingError::InsufficientData {
                    expected,
                    found: values.len(),
                });
            };
            let value = parse_real(token.as_ref(), "需求")?;
            if value < 0.0 {
                return Err(LotSizingError::MalformedInstance(format!(
                    "第 {} 筆需求為負值: {}",
                    values.len(),
                    value
                )));
            }
            values.push(value);
        }

        let mut demand = vec![vec![0.0; period_count]; product_count];
        for (index, value) in values.into_iter().enumerate() {
            let (j, t) = self.layout.position(index, product_count, period_count);
            demand[j][t] = value;
        }

        tracing::debug!(
            "解析實例 {}：產品 {}、期數 {}、產能 {}",
            name,
            product_count,
            period_count,
            capacity
        );

        Instance::new(name, capacity, products, demand)
    }
}

/// 符號游標
struct TokenCursor<I> {
    tokens: I,
}

impl<I, S> TokenCursor<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    fn new(tokens: I) -> Self {
        Self { tokens }
    }

    fn next_token(&mut self, what: &str) -> Result<S> {
        self.tokens.next().ok_or_else(|| {
            LotSizingError::MalformedInstance(format!("讀取{}時資料已結束", what))
        })
    }

    fn next_count(&mut self, what: &str) -> Result<usize> {
        let token = self.next_token(what)?;
        let value = parse_real(token.as_ref(), what)?;
        if value < 1.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
            return Err(LotSizingError::MalformedInstance(format!(
                "{}必須為正整數，讀到 {}",
                what,
                token.as_ref()
            )));
        }
        Ok(value as usize)
    }

    fn next_non_negative(&mut self, what: &str) -> Result<f64> {
        let token = self.next_token(what)?;
        let value = parse_real(token.as_ref(), what)?;
        if value < 0.0 {
            return Err(LotSizingError::MalformedInstance(format!(
                "{}不可為負值，讀到 {}",
                what, value
            )));
        }
        Ok(value)
    }
}

fn parse_real(token: &str, what: &str) -> Result<f64> {
    match token.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(LotSizingError::MalformedInstance(format!(
            "{}不是有效數值: {:?}",
            what, token
        ))),
    }
}
