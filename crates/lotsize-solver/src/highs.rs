//! HiGHS MIP 後端（`highs` feature）
//!
//! 支援時間上限、求解器輸出開關，並回報實際的 MIP 間隙。
//! 達時間上限時以間隙是否有限判斷是否持有可行解。

use std::time::{Duration, Instant};

use ::highs::{Col, HighsModelStatus, RowProblem, Sense};

use crate::program::{Column, LinearProgram};
use crate::{Direction, MipModel, MipSolver, Relation, TerminationStatus, Term, VarHandle};

/// HiGHS 求解器
#[derive(Debug, Clone, Copy, Default)]
pub struct HighsSolver;

impl HighsSolver {
    pub fn new() -> Self {
        Self
    }
}

impl MipSolver for HighsSolver {
    type Model = HighsModel;

    fn create_model(&self, name: &str) -> HighsModel {
        HighsModel::new(name)
    }
}

/// HiGHS 模型
#[derive(Debug, Clone)]
pub struct HighsModel {
    name: String,
    program: LinearProgram,
    output: bool,
    values: Option<Vec<f64>>,
    elapsed: Duration,
    gap: Option<f64>,
}

impl HighsModel {
    /// 創建空模型（預設關閉求解器輸出）
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            program: LinearProgram::default(),
            output: false,
            values: None,
            elapsed: Duration::ZERO,
            gap: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn row_problem(&self) -> RowProblem {
        let mut problem = RowProblem::default();
        let costs = self.program.objective_coefficients();

        let columns: Vec<Col> = self
            .program
            .columns
            .iter()
            .zip(costs)
            .map(|(column, cost)| match *column {
                Column::Continuous { lower_bound } => problem.add_column(cost, lower_bound..),
                Column::Binary => problem.add_integer_column(cost, 0.0..=1.0),
            })
            .collect();

        for row in &self.program.rows {
            let factors: Vec<(Col, f64)> = row
                .terms
                .iter()
                .map(|&(var, coefficient)| (columns[var.index()], coefficient))
                .collect();
            match row.relation {
                Relation::Equal => {
                    problem.add_row(row.rhs..=row.rhs, factors);
                }
                Relation::LessOrEqual => {
                    problem.add_row(..=row.rhs, factors);
                }
                Relation::GreaterOrEqual => {
                    problem.add_row(row.rhs.., factors);
                }
            }
        }

        problem
    }
}

impl MipModel for HighsModel {
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

    fn set_output(&mut self, enabled: bool) {
        self.output = enabled;
    }

    fn solve(&mut self, time_limit: Option<Duration>) -> TerminationStatus {
        self.values = None;
        self.gap = None;
        let start_time = Instant::now();

        let problem = self.row_problem();
        let sense = match self.program.direction {
            Direction::Minimize => Sense::Minimise,
            Direction::Maximize => Sense::Maximise,
        };

        let mut model = problem.optimise(sense);
        model.set_option("output_flag", self.output);
        if let Some(limit) = time_limit {
            model.set_option("time_limit", limit.as_secs_f64());
        }

        let status = match model.try_solve() {
            Ok(solved) => {
                let gap = solved.mip_gap();
                let read_values = || solved.get_solution().columns().to_vec();

                match solved.status() {
                    HighsModelStatus::Optimal | HighsModelStatus::ModelEmpty => {
                        self.values = Some(read_values());
                        self.gap = Some(if gap.is_finite() { gap.max(0.0) } else { 0.0 });
                        TerminationStatus::Optimal
                    }
                    HighsModelStatus::ReachedTimeLimit if gap.is_finite() => {
                        self.values = Some(read_values());
                        self.gap = Some(gap.max(0.0));
                        TerminationStatus::FeasibleTimeLimit
                    }
                    HighsModelStatus::ReachedTimeLimit => TerminationStatus::TimeLimitNoSolution,
                    HighsModelStatus::Infeasible | HighsModelStatus::UnboundedOrInfeasible => {
                        TerminationStatus::Infeasible
                    }
                    other => {
                        tracing::warn!("模型 {} 求解結束於非預期狀態: {:?}", self.name, other);
                        TerminationStatus::Error
                    }
                }
            }
            Err(e) => {
                tracing::warn!("模型 {} 求解失敗: {:?}", self.name, e);
                TerminationStatus::Error
            }
        };

        self.elapsed = start_time.elapsed();
        tracing::debug!(
            "模型 {} 求解結束：{:?}，間隙 {:?}，耗時 {:?}",
            self.name,
            status,
            self.gap,
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

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    #[test]
    fn test_solve_fixed_charge() {
        // min x + 5y, x >= 3, x <= 10y
        let mut model = HighsSolver::new().create_model("fixed-charge");
        let x = model.add_continuous_variable(0.0);
        let y = model.add_binary_variable();
        model.add_linear_constraint(&[(x, 1.0)], Relation::GreaterOrEqual, 3.0);
        model.add_linear_constraint(&[(x, 1.0), (y, -10.0)], Relation::LessOrEqual, 0.0);
        model.set_objective(&[(x, 1.0), (y, 5.0)], Direction::Minimize);

        let status = model.solve(Some(Duration::from_secs(30)));

        assert_eq!(status, TerminationStatus::Optimal);
        assert!((model.value(x).unwrap() - 3.0).abs() < EPS);
        assert!((model.value(y).unwrap() - 1.0).abs() < EPS);
        assert!(model.mip_gap().unwrap() < EPS);
        assert!(HighsSolver::new().enforces_time_limit());
    }

    #[test]
    fn test_solve_infeasible() {
        let mut model = HighsSolver::new().create_model("infeasible");
        let x = model.add_continuous_variable(0.0);
        let y = model.add_binary_variable();
        model.add_linear_constraint(&[(x, 1.0)], Relation::Equal, 5.0);
        model.add_linear_constraint(&[(x, 1.0), (y, -2.0)], Relation::LessOrEqual, 0.0);
        model.set_objective(&[(y, 1.0)], Direction::Minimize);

        assert_eq!(model.solve(None), TerminationStatus::Infeasible);
        assert_eq!(model.value(x), None);
        assert_eq!(model.mip_gap(), None);
    }

    #[test]
    fn test_output_flag_recorded() {
        let mut model = HighsSolver::new().create_model("quiet");
        assert!(!model.output);

        model.set_output(true);
        assert!(model.output);
    }
}
