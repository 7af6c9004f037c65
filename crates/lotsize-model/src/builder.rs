//! 運輸重構模型建構
//!
//! 變數：
//! - `x[j,t,r]`（t <= r）：產品 j 於第 t 期生產、用於滿足第 r 期需求的數量
//! - `y[j,t]`：產品 j 於第 t 期是否整備
//!
//! 約束：需求滿足、各期產能、整備連結（Big-M）。

use std::collections::BTreeMap;
use std::time::Duration;

use lotsize_core::{Instance, LotSizingError, Result};
use lotsize_solver::{Direction, MipModel, MipSolver, Relation, Term, TerminationStatus, VarHandle};

use crate::bounds::BigMTable;

/// 生產流量變數鍵
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FlowKey {
    /// 產品
    pub product: usize,
    /// 生產期別 t
    pub produced_in: usize,
    /// 滿足的需求期別 r（r >= t）
    pub serves: usize,
}

impl FlowKey {
    pub fn new(product: usize, produced_in: usize, serves: usize) -> Self {
        Self {
            product,
            produced_in,
            serves,
        }
    }

    /// 等待期數 r - t
    pub fn periods_held(&self) -> usize {
        self.serves - self.produced_in
    }
}

/// 模型規模統計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModelStats {
    pub flow_variables: usize,
    pub setup_variables: usize,
    pub demand_rows: usize,
    pub capacity_rows: usize,
    pub linkage_rows: usize,
}

impl ModelStats {
    /// 約束總數
    pub fn total_rows(&self) -> usize {
        self.demand_rows + self.capacity_rows + self.linkage_rows
    }
}

/// 單一實例的批量模型
///
/// 擁有後端模型與所有變數代號；求解並萃取結果後即可丟棄。
pub struct LotSizingModel<M> {
    model: M,
    flows: BTreeMap<FlowKey, VarHandle>,
    setups: BTreeMap<(usize, usize), VarHandle>,
    stats: ModelStats,
    unit_production_cost: f64,
}

impl<M: MipModel> LotSizingModel<M> {
    /// 生產流量變數 x[j,t,r]，t > r 時不存在
    pub fn flow(&self, product: usize, produced_in: usize, serves: usize) -> Option<VarHandle> {
        self.flows
            .get(&FlowKey::new(product, produced_in, serves))
            .copied()
    }

    /// 整備變數 y[j,t]
    pub fn setup(&self, product: usize, period: usize) -> Option<VarHandle> {
        self.setups.get(&(product, period)).copied()
    }

    pub fn flows(&self) -> impl Iterator<Item = (&FlowKey, &VarHandle)> {
        self.flows.iter()
    }

    /// 產品 j 於第 t 期生產的所有流量變數（依需求期別排序）
    pub fn production_flows(
        &self,
        product: usize,
        produced_in: usize,
    ) -> impl Iterator<Item = (&FlowKey, &VarHandle)> {
        self.flows.range(
            FlowKey::new(product, produced_in, produced_in)..=FlowKey::new(product, produced_in, usize::MAX),
        )
    }

    pub fn setups(&self) -> impl Iterator<Item = (&(usize, usize), &VarHandle)> {
        self.setups.iter()
    }

    pub fn stats(&self) -> ModelStats {
        self.stats
    }

    pub fn unit_production_cost(&self) -> f64 {
        self.unit_production_cost
    }

    /// 開關求解器輸出
    pub fn set_output(&mut self, enabled: bool) {
        self.model.set_output(enabled);
    }

    /// 交由求解器求解
    pub fn solve(&mut self, time_limit: Option<Duration>) -> TerminationStatus {
        self.model.solve(time_limit)
    }

    pub fn value(&self, var: VarHandle) -> Option<f64> {
        self.model.value(var)
    }

    pub fn elapsed(&self) -> Duration {
        self.model.elapsed()
    }

    pub fn mip_gap(&self) -> Option<f64> {
        self.model.mip_gap()
    }

    /// 後端模型
    pub fn inner(&self) -> &M {
        &self.model
    }

    pub fn inner_mut(&mut self) -> &mut M {
        &mut self.model
    }
}

/// 模型建構器
pub struct ModelBuilder<'a> {
    instance: &'a Instance,
    big_m: &'a BigMTable,
    unit_production_cost: f64,
}

impl<'a> ModelBuilder<'a> {
    /// 創建新的模型建構器
    pub fn new(instance: &'a Instance, big_m: &'a BigMTable) -> Self {
        Self {
            instance,
            big_m,
            unit_production_cost: 0.0,
        }
    }

    /// 建構器模式：設置單位生產成本（預設 0，不進入目標式）
    pub fn with_unit_production_cost(mut self, cost: f64) -> Self {
        self.unit_production_cost = cost;
        self
    }

    /// 宣告變數並產生約束與目標式
    pub fn build<S: MipSolver>(&self, solver: &S) -> Result<LotSizingModel<S::Model>> {
        self.validate()?;

        let instance = self.instance;
        let product_count = instance.product_count();
        let period_count = instance.period_count();
        let mut model = solver.create_model(instance.name());
        let mut stats = ModelStats::default();

        // 變數：x 僅建立 t <= r 的三角區域
        let mut flows = BTreeMap::new();
        for j in 0..product_count {
            for t in 0..period_count {
                for r in t..period_count {
                    flows.insert(FlowKey::new(j, t, r), model.add_continuous_variable(0.0));
                }
            }
        }
        stats.flow_variables = flows.len();

        let mut setups = BTreeMap::new();
        for j in 0..product_count {
            for t in 0..period_count {
                setups.insert((j, t), model.add_binary_variable());
            }
        }
        stats.setup_variables = setups.len();

        // 1. 需求滿足：Σ_{t<=r} x[j,t,r] = d[j,r]
        for j in 0..product_count {
            for r in 0..period_count {
                let terms: Vec<Term> = (0..=r)
                    .map(|t| (flows[&FlowKey::new(j, t, r)], 1.0))
                    .collect();
                model.add_linear_constraint(&terms, Relation::Equal, instance.demand(j, r));
                stats.demand_rows += 1;
            }
        }

        // 2. 產能：Σ_j (p_j Σ_{r>=t} x[j,t,r] + sT_j y[j,t]) <= C
        for t in 0..period_count {
            let mut terms: Vec<Term> = Vec::new();
            for (j, product) in instance.products().iter().enumerate() {
                if product.unit_processing_time != 0.0 {
                    terms.extend(
                        (t..period_count)
                            .map(|r| (flows[&FlowKey::new(j, t, r)], product.unit_processing_time)),
                    );
                }
                if product.setup_time != 0.0 {
                    terms.push((setups[&(j, t)], product.setup_time));
                }
            }

            if terms.is_empty() {
                tracing::trace!("第 {} 期無產能消耗，略過產能約束", t);
                continue;
            }
            model.add_linear_constraint(&terms, Relation::LessOrEqual, instance.capacity());
            stats.capacity_rows += 1;
        }

        // 3. 整備連結：Σ_{r>=t} x[j,t,r] - M[j,t] y[j,t] <= 0
        for j in 0..product_count {
            for t in 0..period_count {
                let mut terms: Vec<Term> = (t..period_count)
                    .map(|r| (flows[&FlowKey::new(j, t, r)], 1.0))
                    .collect();
                terms.push((setups[&(j, t)], -self.big_m.get(j, t)));
                model.add_linear_constraint(&terms, Relation::LessOrEqual, 0.0);
                stats.linkage_rows += 1;
            }
        }

        // 目標式：持有成本 + 整備成本（+ 生產成本，預設為 0）
        let mut objective: Vec<Term> = Vec::with_capacity(flows.len() + setups.len());
        for (key, &var) in &flows {
            let holding = key.periods_held() as f64 * instance.product(key.product).holding_cost;
            let coefficient = holding + self.unit_production_cost;
            if coefficient != 0.0 {
                objective.push((var, coefficient));
            }
        }
        for (&(j, _), &var) in &setups {
            let setup_cost = instance.product(j).setup_cost;
            if setup_cost != 0.0 {
                objective.push((var, setup_cost));
            }
        }
        model.set_objective(&objective, Direction::Minimize);

        tracing::debug!(
            "模型 {} 建構完成：x {} 個、y {} 個、需求約束 {}、產能約束 {}、連結約束 {}",
            instance.name(),
            stats.flow_variables,
            stats.setup_variables,
            stats.demand_rows,
            stats.capacity_rows,
            stats.linkage_rows
        );

        Ok(LotSizingModel {
            model,
            flows,
            setups,
            stats,
            unit_production_cost: self.unit_production_cost,
        })
    }

    /// 檢查 Big-M 表與實例維度一致、係數有限
    fn validate(&self) -> Result<()> {
        let instance = self.instance;

        if !self.big_m.is_rectangular()
            || self.big_m.product_count() != instance.product_count()
            || self.big_m.period_count() != instance.period_count()
        {
            return Err(LotSizingError::ModelConstruction(format!(
                "Big-M 維度 {}×{} 與實例 {}×{} 不符",
                self.big_m.product_count(),
                self.big_m.period_count(),
                instance.product_count(),
                instance.period_count()
            )));
        }

        if let Some(value) = self.big_m.iter().find(|m| !m.is_finite() || **m < 0.0) {
            return Err(LotSizingError::ModelConstruction(format!(
                "Big-M 必須為有限非負值，讀到 {}",
                value
            )));
        }

        if !self.unit_production_cost.is_finite() || self.unit_production_cost < 0.0 {
            return Err(LotSizingError::ModelConstruction(format!(
                "單位生產成本必須為有限非負值，讀到 {}",
                self.unit_production_cost
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::BoundCalculator;
    use crate::testing::RecordingSolver;
    use lotsize_core::{InstanceParser, Product};
    use proptest::prelude::*;

    fn build(instance: &Instance) -> LotSizingModel<crate::testing::RecordingModel> {
        let big_m = BoundCalculator::compute(instance);
        ModelBuilder::new(instance, &big_m)
            .build(&RecordingSolver)
            .unwrap()
    }

    fn three_products() -> Instance {
        InstanceParser::default()
            .parse_str(
                "three",
                "3 4 0 200 \
                 1 1 10 100 \
                 2 2 0 80 \
                 0 1 5 60 \
                 10 20 0 5 \
                 0 0 30 30 \
                 7 7 7 7",
            )
            .unwrap()
    }

    #[test]
    fn test_row_and_column_counts() {
        let instance = three_products();
        let model = build(&instance);
        let stats = model.stats();

        // 每產品三角變數數量 T(T+1)/2 = 10
        assert_eq!(stats.flow_variables, 3 * 10);
        assert_eq!(stats.setup_variables, 3 * 4);
        assert_eq!(stats.demand_rows, 3 * 4);
        assert_eq!(stats.linkage_rows, 3 * 4);
        assert_eq!(stats.capacity_rows, 4);
        assert_eq!(model.inner().rows.len(), stats.total_rows());
        assert_eq!(model.inner().columns.len(), 30 + 12);
    }

    #[test]
    fn test_flows_are_triangular() {
        let instance = three_products();
        let model = build(&instance);

        assert!(model.flow(0, 1, 3).is_some());
        assert!(model.flow(0, 2, 2).is_some());
        assert!(model.flow(0, 3, 1).is_none());
        assert!(model.flows().all(|(key, _)| key.produced_in <= key.serves));
    }

    #[test]
    fn test_single_period_only_diagonal() {
        let instance = Instance::new(
            "one-period",
            100.0,
            vec![Product::new(1.0, 3.0, 0.0, 10.0), Product::new(2.0, 4.0, 1.0, 20.0)],
            vec![vec![5.0], vec![7.0]],
        )
        .unwrap();
        let model = build(&instance);

        assert_eq!(model.stats().flow_variables, 2);
        assert!(model
            .flows()
            .all(|(key, _)| key.produced_in == 0 && key.serves == 0));

        // 目標式不含持有成本：僅剩整備成本項
        let objective = &model.inner().objective;
        assert_eq!(objective.len(), 2);
        assert!(objective
            .iter()
            .all(|(var, _)| model.inner().binary.contains(&var.index())));
    }

    #[test]
    fn test_objective_coefficients() {
        let instance = three_products();
        let model = build(&instance);
        let objective = &model.inner().objective;

        // x[1,0,3]：等待 3 期 × 持有成本 2
        let x = model.flow(1, 0, 3).unwrap();
        assert!(objective.contains(&(x, 6.0)));

        // 對角變數不進入目標式
        let diagonal = model.flow(1, 2, 2).unwrap();
        assert!(objective.iter().all(|(var, _)| *var != diagonal));

        let y = model.setup(2, 1).unwrap();
        assert!(objective.contains(&(y, 60.0)));
    }

    #[test]
    fn test_capacity_row_terms() {
        let instance = three_products();
        let model = build(&instance);
        let rows = &model.inner().rows;

        // 第 3 期產能約束：產品 0 (p=1, sT=10)、產品 1 (p=2)、產品 2 (sT=5)
        let capacity_row = rows
            .iter()
            .filter(|row| row.relation == Relation::LessOrEqual && row.rhs == 200.0)
            .nth(3)
            .unwrap();

        assert!(capacity_row.terms.contains(&(model.flow(0, 3, 3).unwrap(), 1.0)));
        assert!(capacity_row.terms.contains(&(model.setup(0, 3).unwrap(), 10.0)));
        assert!(capacity_row.terms.contains(&(model.flow(1, 3, 3).unwrap(), 2.0)));
        assert!(capacity_row.terms.contains(&(model.setup(2, 3).unwrap(), 5.0)));
        assert!(capacity_row
            .terms
            .iter()
            .all(|(var, _)| *var != model.flow(2, 3, 3).unwrap()));
    }

    #[test]
    fn test_skip_capacity_row_without_usage() {
        let instance = Instance::new(
            "free",
            0.0,
            vec![Product::new(0.0, 1.0, 0.0, 1.0)],
            vec![vec![1.0, 1.0]],
        )
        .unwrap();
        let model = build(&instance);

        assert_eq!(model.stats().capacity_rows, 0);
        assert_eq!(model.stats().demand_rows, 2);
    }

    #[test]
    fn test_zero_demand_trivial_solution_feasible() {
        let instance = Instance::new(
            "zero",
            50.0,
            vec![Product::new(1.0, 2.0, 3.0, 40.0), Product::new(2.0, 1.0, 0.0, 10.0)],
            vec![vec![0.0; 3], vec![0.0; 3]],
        )
        .unwrap();
        let model = build(&instance);
        let zeros = vec![0.0; model.inner().columns.len()];

        assert!(model.inner().is_feasible(&zeros));
        assert_eq!(model.inner().objective_value(&zeros), 0.0);
    }

    #[test]
    fn test_production_cost_enters_objective() {
        let instance = Instance::new(
            "priced",
            50.0,
            vec![Product::new(1.0, 0.0, 0.0, 0.0)],
            vec![vec![1.0, 1.0]],
        )
        .unwrap();
        let big_m = BoundCalculator::compute(&instance);

        let free = ModelBuilder::new(&instance, &big_m)
            .build(&RecordingSolver)
            .unwrap();
        assert!(free.inner().objective.is_empty());

        let priced = ModelBuilder::new(&instance, &big_m)
            .with_unit_production_cost(2.5)
            .build(&RecordingSolver)
            .unwrap();
        assert_eq!(priced.inner().objective.len(), 3);
        assert_eq!(priced.unit_production_cost(), 2.5);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let instance = three_products();
        let wrong = BigMTable::from_rows(vec![vec![1.0; 4]; 2]);

        let result = ModelBuilder::new(&instance, &wrong).build(&RecordingSolver);

        assert!(matches!(result, Err(LotSizingError::ModelConstruction(_))));
    }

    #[test]
    fn test_negative_big_m_rejected() {
        let instance = Instance::new(
            "neg-m",
            10.0,
            vec![Product::new(1.0, 1.0, 0.0, 1.0)],
            vec![vec![1.0]],
        )
        .unwrap();
        let wrong = BigMTable::from_rows(vec![vec![-1.0]]);

        let result = ModelBuilder::new(&instance, &wrong).build(&RecordingSolver);

        assert!(matches!(result, Err(LotSizingError::ModelConstruction(_))));
    }

    proptest! {
        #[test]
        fn prop_model_shape_matches_dimensions(
            (product_count, period_count, demand) in (1usize..5, 1usize..7).prop_flat_map(|(n, t)| {
                (
                    Just(n),
                    Just(t),
                    proptest::collection::vec(proptest::collection::vec(0.0f64..50.0, t), n),
                )
            }),
            capacity in 0.0f64..300.0,
        ) {
            let products = (0..product_count)
                .map(|j| Product::new(1.0 + j as f64, 1.0, j as f64, 10.0))
                .collect();
            let instance = Instance::new("random", capacity, products, demand).unwrap();
            let model = build(&instance);
            let stats = model.stats();
            let cells = product_count * period_count;

            prop_assert_eq!(stats.demand_rows, cells);
            prop_assert_eq!(stats.linkage_rows, cells);
            prop_assert_eq!(stats.setup_variables, cells);
            prop_assert_eq!(stats.flow_variables, product_count * period_count * (period_count + 1) / 2);
            prop_assert_eq!(model.flows().count(), stats.flow_variables);
            prop_assert!(model.flows().all(|(key, _)| key.produced_in <= key.serves));
            prop_assert!(model
                .flows()
                .all(|(key, _)| key.product < product_count && key.serves < period_count));
        }
    }
}
