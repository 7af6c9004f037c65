//! 後端共用的線性規劃紀錄
//!
//! 變數、約束與目標式先以索引形式保存，求解時再由各後端轉為原生問題。

use crate::{Direction, Relation, Term, VarHandle};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Column {
    Continuous { lower_bound: f64 },
    Binary,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Row {
    pub terms: Vec<Term>,
    pub relation: Relation,
    pub rhs: f64,
}

#[derive(Debug, Clone)]
pub(crate) struct LinearProgram {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    pub objective: Vec<Term>,
    pub direction: Direction,
}

impl Default for LinearProgram {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            objective: Vec::new(),
            direction: Direction::Minimize,
        }
    }
}

impl LinearProgram {
    pub fn add_column(&mut self, column: Column) -> VarHandle {
        self.columns.push(column);
        VarHandle::new(self.columns.len() - 1)
    }

    pub fn add_row(&mut self, terms: &[Term], relation: Relation, rhs: f64) {
        self.rows.push(Row {
            terms: terms.to_vec(),
            relation,
            rhs,
        });
    }

    pub fn set_objective(&mut self, terms: &[Term], direction: Direction) {
        self.objective = terms.to_vec();
        self.direction = direction;
    }

    /// 目標係數（依欄位索引累加）
    #[cfg_attr(not(feature = "highs"), allow(dead_code))]
    pub fn objective_coefficients(&self) -> Vec<f64> {
        let mut costs = vec![0.0; self.columns.len()];
        for &(var, coefficient) in &self.objective {
            costs[var.index()] += coefficient;
        }
        costs
    }
}
