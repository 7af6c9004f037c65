//! Big-M 上界計算

use lotsize_core::Instance;

/// 每個（產品, 期別）的生產量上界
#[derive(Debug, Clone, PartialEq)]
pub struct BigMTable {
    product_count: usize,
    period_count: usize,
    values: Vec<f64>,
}

impl BigMTable {
    /// 以列優先（產品 × 期別）的數值創建上界表
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Self {
        let product_count = rows.len();
        let period_count = rows.first().map_or(0, |r| r.len());
        let values = rows.into_iter().flatten().collect();
        Self {
            product_count,
            period_count,
            values,
        }
    }

    pub fn product_count(&self) -> usize {
        self.product_count
    }

    pub fn period_count(&self) -> usize {
        self.period_count
    }

    /// 維度是否一致（每列長度相同）
    pub fn is_rectangular(&self) -> bool {
        self.values.len() == self.product_count * self.period_count
    }

    /// 產品 j 在第 t 期的上界
    pub fn get(&self, j: usize, t: usize) -> f64 {
        self.values[j * self.period_count + t]
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.values.iter()
    }
}

/// Big-M 計算器
pub struct BoundCalculator;

impl BoundCalculator {
    /// 計算所有（產品, 期別）的 Big-M
    ///
    /// `BigM[j,t] = min(futureDemand(j,t), capacityBound(j))`
    pub fn compute(instance: &Instance) -> BigMTable {
        let period_count = instance.period_count();
        let mut values = Vec::with_capacity(instance.product_count() * period_count);

        for j in 0..instance.product_count() {
            let future = Self::future_demands(instance, j);
            let capacity_bound = Self::capacity_bound(instance, j);

            values.extend(future.into_iter().map(|demand| match capacity_bound {
                Some(bound) => demand.min(bound),
                None => demand,
            }));
        }

        BigMTable {
            product_count: instance.product_count(),
            period_count,
            values,
        }
    }

    /// 產品 j 在第 t 期及之後的總需求
    pub fn future_demand(instance: &Instance, j: usize, t: usize) -> f64 {
        instance.future_demand(j, t)
    }

    /// 產品 j 單期最多可生產量（扣除自身整備時間）
    ///
    /// 加工時間為 0 時不受產能限制，回傳 None。
    pub fn capacity_bound(instance: &Instance, j: usize) -> Option<f64> {
        let product = instance.product(j);
        if product.unit_processing_time > 0.0 {
            let net_capacity = instance.capacity() - product.setup_time;
            Some((net_capacity / product.unit_processing_time).max(0.0))
        } else {
            None
        }
    }

    /// 以後綴和計算產品 j 每期的剩餘需求
    fn future_demands(instance: &Instance, j: usize) -> Vec<f64> {
        let row = instance.demand_row(j);
        let mut suffix = vec![0.0; row.len()];
        let mut running = 0.0;
        for t in (0..row.len()).rev() {
            running += row[t];
            suffix[t] = running;
        }
        suffix
    }
}
