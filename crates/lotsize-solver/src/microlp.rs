//! 純 Rust MIP 後端（good_lp + microlp）
//!
//! 變數、約束與目標式先記錄於模型中，求解時再一次轉為 good_lp 問題。
//! microlp 不支援時間上限，傳入的上限僅記錄於日誌。

use std::time::{Duration, Instant};

use good_lp::solvers::microlp::microlp;
use good_lp::{
    constraint, variable, Expression, ProblemVariables, ResolutionError, Solution, SolverModel,
    Variable,
};

use crate::program::{Column, LinearProgram};
use crate::{Direction, MipModel, MipSolver, Relation, TerminationStatus, Term, VarHandle};

/// microlp 求解器
#[derive(Debug, Clone, Copy, Default)]
pub struct MicroLpSolver;

impl MicroLpSolver {
    pub fn new() -> Self {
        Self
    }
}

impl MipSolver for MicroLpSolver {
    type Model = MicroLpModel;

    fn create_model(&self, name: &str) -> MicroLpModel {
        MicroLpModel::new(name)
    }

    fn enforces_time_limit(&self) -> bool {
        false
    }
}

/// microlp 模型
#[derive(Debug, Clone)]
pub struct MicroLpModel {
    name: String,
    program: LinearProgram,
    values: Option<Vec<f64>>,
    elapsed: Duration,
    gap: Option<f64>,
}

impl MicroLpModel {
    /// 創建空模型
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            program: LinearProgram::default(),
            values: None,
            elapsed: Duration::ZERO,
            gap: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 變數數量
    pub fn column_count(&self) -> usize {
        self.program.columns.len()
    }

    /// 約束數量
    pub fn row_count(&self) -> usize {
        self.program.rows.len()
    }

    fn expression(columns: &[Variable], terms: &[Term]) -> Expression {
        let mut expr = Expression::with_capacity(terms.len());
        for &(var, coefficient) in terms {
            expr.add_mul(coefficient, columns[var.index()]);
        }
        expr
    }
}

impl MipModel for MicroLpModel {
    fn add_continuous_variable(&mut self, lower_bound: f64) -> VarHandle {
        self.program.add_column(Column::Continuous { lower_bound })
    }

    fn add_binary_variable(&mut self) -> VarHandle {
        self.program.add_column(Column::Binary)
    }

    fn add_linear_constraint(&mut self, terms: &[Term], relation: Relation, rhs: f64) {
        self.program.add_row(terms, relation, rhs);
    }

    fn set_objective(&mut self, terms: &[Term], direction: Direction) {
        self.program.set_objective(terms, direction);
    }

    fn solve(&mut self, time_limit: Option<Duration>) -> TerminationStatus {
        if let Some(limit) = time_limit {
            tracing::debug!("microlp 不支援時間上限，忽略 {:?}（模型 {}）", limit, self.name);
        }

        self.values = None;
        self.gap = None;
        let start_time = Instant::now();

        let mut problem_vars = ProblemVariables::new();
        let columns: Vec<Variable> = self
            .program
            .columns
            .iter()
            .map(|column| match *column {
                Column::Continuous { lower_bound } => problem_vars.add(variable().min(lower_bound)),
                Column::Binary => problem_vars.add(variable().binary()),
            })
            .collect();

        let objective = Self::expression(&columns, &self.program.objective);
        let unsolved = match self.program.direction {
            Direction::Minimize => problem_vars.minimise(objective),
            Direction::Maximize => problem_vars.maximise(objective),
        };

        let mut problem = unsolved.using(microlp);
        for row in &self.program.rows {
            let lhs = Self::expression(&columns, &row.terms);
            let rhs = Expression::from(row.rhs);
            let c = match row.relation {
                Relation::Equal => constraint::eq(lhs, rhs),
                Relation::LessOrEqual => constraint::leq(lhs, rhs),
                Relation::GreaterOrEqual => constraint::geq(lhs, rhs),
            };
            problem.add_constraint(c);
        }

        let status = match problem.solve() {
            Ok(solution) => {
                self.values = Some(columns.iter().map(|&v| solution.value(v)).collect());
                self.gap = Some(0.0);
                TerminationStatus::Optimal
            }
            Err(ResolutionError::Infeasible) => TerminationStatus::Infeasible,
            Err(e) => {
                tracing::warn!("模型 {} 求解失敗: {}", self.name, e);
                TerminationStatus::Error
            }
        };

        self.elapsed = start_time.elapsed();
        tracing::debug!(
            "模型 {} 求解結束：{:?}，耗時 {:?}",
            self.name,
            status,
            self.elapsed
        );

        status
    }

    fn value(&self, var: VarHandle) -> Option<f64> {
        self.values.as_ref().and_then(|v| v.get(var.index()).copied())
    }

    fn elapsed(&self) -> Duration {
        self.elapsed
    }

    fn mip_gap(&self) -> Option<f64> {
        self.gap
    }
}
