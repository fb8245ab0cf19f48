//! Post-optimal analysis read off the final simplex tableau.
//!
//! Duals are recovered from the objective-row entries of each row's slack,
//! surplus or artificial column, which together hold `B^-1` at optimality.

use crate::problem::{ConstraintOp, Problem};
use crate::simplex::clean;
use crate::solution::{CoefficientRange, ReducedCost, RhsRange, SensitivityAnalysis};
use crate::standard_form::{RowInfo, StandardForm};

pub struct SensitivityAnalyzer<'a> {
    problem: &'a Problem,
    form: &'a StandardForm,
    tolerance: f64,
    /// Objective penalty carried by artificial columns (Big-M), else 0
    artificial_cost: f64,
}

impl<'a> SensitivityAnalyzer<'a> {
    pub fn new(problem: &'a Problem, form: &'a StandardForm, tolerance: f64, artificial_cost: f64) -> Self {
        Self {
            problem,
            form,
            tolerance,
            artificial_cost,
        }
    }

    /// Dual value of a tableau row, in maximization form and row orientation.
    fn dual(&self, row: &RowInfo) -> f64 {
        let tableau = &self.form.tableau;
        match row.op {
            ConstraintOp::Le => row.slack.map_or(0.0, |c| tableau.reduced_cost(c)),
            ConstraintOp::Ge => row.slack.map_or(0.0, |c| -tableau.reduced_cost(c)),
            ConstraintOp::Eq => row
                .artificial
                .map_or(0.0, |c| tableau.reduced_cost(c) - self.artificial_cost),
        }
    }

    fn constraint_rows(&self) -> impl Iterator<Item = (usize, Option<&RowInfo>)> {
        (0..self.problem.num_constraints())
            .map(move |i| (i, self.form.constraint_row(i).map(|r| &self.form.rows[r])))
    }

    /// Change in the optimal value per unit increase of each constraint's RHS.
    pub fn shadow_prices(&self) -> Vec<f64> {
        self.constraint_rows()
            .map(|(_, row)| {
                row.map_or(0.0, |row| {
                    clean(self.form.sense * row.sign() * self.dual(row), self.tolerance)
                })
            })
            .collect()
    }

    /// Non-negative gap of each constraint at `values`; binding ones are exactly 0.
    pub fn slack_values(&self, values: &[f64]) -> Vec<f64> {
        self.problem
            .constraints
            .iter()
            .map(|c| {
                let lhs = c.lhs(values);
                let gap = match c.op {
                    ConstraintOp::Le => c.rhs - lhs,
                    ConstraintOp::Ge => lhs - c.rhs,
                    ConstraintOp::Eq => (lhs - c.rhs).abs(),
                };
                if gap.abs() <= self.tolerance * (1.0 + c.rhs.abs()) {
                    0.0
                } else {
                    gap
                }
            })
            .collect()
    }

    pub fn binding_constraints(&self, slacks: &[f64]) -> Vec<String> {
        slacks
            .iter()
            .enumerate()
            .filter(|(_, slack)| **slack == 0.0)
            .map(|(i, _)| self.problem.constraint_name(i))
            .collect()
    }

    pub fn reduced_costs(&self, values: &[f64], shadow_prices: &[f64]) -> Vec<ReducedCost> {
        let tableau = &self.form.tableau;
        self.problem
            .variables()
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let (reduced_cost, is_basic) = match self.form.structural[j] {
                    Some(col) if tableau.basic_row(col).is_some() => (0.0, true),
                    Some(col) => (-self.form.sense * tableau.reduced_cost(col), false),
                    // Substituted out: price it against the constraint duals
                    None => {
                        let priced: f64 = self
                            .problem
                            .constraints
                            .iter()
                            .zip(shadow_prices)
                            .map(|(c, y)| c.coefficients[j] * y)
                            .sum();
                        (self.problem.objective.coefficients[j] - priced, false)
                    }
                };
                ReducedCost {
                    variable: name.clone(),
                    value: values[j],
                    reduced_cost: clean(reduced_cost, self.tolerance),
                    is_basic,
                }
            })
            .collect()
    }

    /// Objective coefficient intervals over which the basis stays optimal.
    pub fn coefficient_ranges(&self) -> Vec<CoefficientRange> {
        let tol = self.tolerance;
        let tableau = &self.form.tableau;
        let obj = tableau.obj_row();

        self.problem
            .variables()
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let current = self.problem.objective.coefficients[j];
                let (lo, hi) = match self.form.structural[j] {
                    None => (f64::NEG_INFINITY, f64::INFINITY),
                    Some(col) => match tableau.basic_row(col) {
                        None => (f64::NEG_INFINITY, tableau.data[obj][col].max(0.0)),
                        Some(row) => {
                            let mut lo = f64::NEG_INFINITY;
                            let mut hi = f64::INFINITY;
                            for k in 0..self.form.artificial_start {
                                if k == col || tableau.basic_row(k).is_some() {
                                    continue;
                                }
                                let a = tableau.data[row][k];
                                let r = tableau.data[obj][k].max(0.0);
                                if a > tol {
                                    lo = lo.max(-r / a);
                                } else if a < -tol {
                                    hi = hi.min(-r / a);
                                }
                            }
                            (lo, hi)
                        }
                    },
                };
                // Deltas are in maximization form
                let (min, max) = if self.form.sense > 0.0 {
                    (current + lo, current + hi)
                } else {
                    (current - hi, current - lo)
                };
                CoefficientRange {
                    variable: name.clone(),
                    min,
                    max,
                }
            })
            .collect()
    }

    /// RHS intervals over which the basis stays primal feasible.
    pub fn rhs_ranges(&self) -> Vec<RhsRange> {
        let tol = self.tolerance;
        let tableau = &self.form.tableau;

        self.constraint_rows()
            .map(|(i, row)| {
                let rhs = self.problem.constraints[i].rhs;
                let mut lo = f64::NEG_INFINITY;
                let mut hi = f64::INFINITY;

                if let Some((col, sign)) = row.and_then(|r| r.basis_inverse_column()) {
                    for k in 0..tableau.num_rows() {
                        let d = sign * tableau.data[k][col];
                        if tableau.basis[k] >= self.form.artificial_start {
                            // Pinned artificial of a redundant row must stay at zero
                            if d.abs() > tol {
                                lo = lo.max(0.0);
                                hi = hi.min(0.0);
                            }
                            continue;
                        }
                        let x = tableau.rhs(k).max(0.0);
                        if d > tol {
                            lo = lo.max(-x / d);
                        } else if d < -tol {
                            hi = hi.min(-x / d);
                        }
                    }
                }

                let (lo, hi) = match row {
                    Some(row) if row.negated => (-hi, -lo),
                    _ => (lo, hi),
                };
                RhsRange {
                    constraint: self.problem.constraint_name(i),
                    min: rhs + lo,
                    max: rhs + hi,
                }
            })
            .collect()
    }

    pub fn analyze(&self, slacks: &[f64]) -> SensitivityAnalysis {
        SensitivityAnalysis {
            coefficient_ranges: self.coefficient_ranges(),
            rhs_ranges: self.rhs_ranges(),
            binding_constraints: self.binding_constraints(slacks),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::problem::{ConstraintOp, ProblemBuilder};
    use crate::Solver;

    fn assert_close(actual: f64, expected: f64, what: &str) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "{what} = {actual} (expected {expected})"
        );
    }

    #[test]
    fn test_textbook_maximization_ranges() {
        // Maximize 3x1 + 2x2 s.t. x1 + x2 <= 4, 2x1 + x2 <= 6
        let problem = ProblemBuilder::new()
            .maximize()
            .variable("x1", 3.0)
            .variable("x2", 2.0)
            .unnamed_constraint(vec![1.0, 1.0], ConstraintOp::Le, 4.0)
            .unnamed_constraint(vec![2.0, 1.0], ConstraintOp::Le, 6.0)
            .build()
            .unwrap();
        let solution = Solver::new().solve(&problem).unwrap();

        assert_close(solution.shadow_prices[0], 1.0, "y1");
        assert_close(solution.shadow_prices[1], 1.0, "y2");
        assert_eq!(solution.sensitivity.binding_constraints, vec!["C1", "C2"]);

        let ranges = &solution.sensitivity.coefficient_ranges;
        assert_close(ranges[0].min, 2.0, "c1 min");
        assert_close(ranges[0].max, 4.0, "c1 max");
        assert_close(ranges[1].min, 1.5, "c2 min");
        assert_close(ranges[1].max, 3.0, "c2 max");

        let rhs = &solution.sensitivity.rhs_ranges;
        assert_eq!(rhs[0].constraint, "C1");
        assert_close(rhs[0].min, 3.0, "b1 min");
        assert_close(rhs[0].max, 6.0, "b1 max");
        assert_close(rhs[1].min, 4.0, "b2 min");
        assert_close(rhs[1].max, 8.0, "b2 max");
    }

    #[test]
    fn test_minimization_shadow_price_signs() {
        // Minimize 2x + 3y s.t. x + y >= 4, x <= 3, y <= 3 -> (3, 1)
        let problem = ProblemBuilder::new()
            .minimize()
            .variable("x", 2.0)
            .variable("y", 3.0)
            .constraint("sum", vec![1.0, 1.0], ConstraintOp::Ge, 4.0)
            .constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0)
            .constraint("y_max", vec![0.0, 1.0], ConstraintOp::Le, 3.0)
            .build()
            .unwrap();
        let solution = Solver::new().solve(&problem).unwrap();

        assert_close(solution.shadow_prices[0], 3.0, "sum");
        assert_close(solution.shadow_prices[1], -1.0, "x_max");
        assert_eq!(solution.shadow_prices[2], 0.0);
        assert_eq!(solution.slack_variables, vec![0.0, 0.0, 2.0]);
        assert_eq!(solution.sensitivity.binding_constraints, vec!["sum", "x_max"]);

        // y stays in the basis while its cost is between 2 and infinity
        let y = &solution.sensitivity.coefficient_ranges[1];
        assert_close(y.min, 2.0, "c_y min");
        assert_eq!(y.max, f64::INFINITY);

        // sum can range from 3 (y hits 0) to 6 (y hits its cap)
        let sum = &solution.sensitivity.rhs_ranges[0];
        assert_close(sum.min, 3.0, "sum min");
        assert_close(sum.max, 6.0, "sum max");
        let y_max = &solution.sensitivity.rhs_ranges[2];
        assert_close(y_max.min, 1.0, "y_max min");
        assert_eq!(y_max.max, f64::INFINITY);
    }

    #[test]
    fn test_nonbasic_reduced_cost_and_range() {
        // Maximize 5x + y s.t. x + y <= 2: y stays out until its price beats x
        let problem = ProblemBuilder::new()
            .maximize()
            .variable("x", 5.0)
            .variable("y", 1.0)
            .unnamed_constraint(vec![1.0, 1.0], ConstraintOp::Le, 2.0)
            .build()
            .unwrap();
        let solution = Solver::new().solve(&problem).unwrap();

        let y = &solution.reduced_costs[1];
        assert!(!y.is_basic);
        assert_close(y.reduced_cost, -4.0, "reduced cost of y");
        assert!(solution.reduced_costs[0].is_basic);

        let range = &solution.sensitivity.coefficient_ranges[1];
        assert_eq!(range.min, f64::NEG_INFINITY);
        assert_close(range.max, 5.0, "c_y max");
    }

    #[test]
    fn test_negated_row_ranges_in_original_orientation() {
        // -x <= -2 is x >= 2; minimize x puts x at 2
        let problem = ProblemBuilder::new()
            .minimize()
            .variable("x", 1.0)
            .unnamed_constraint(vec![-1.0], ConstraintOp::Le, -2.0)
            .build()
            .unwrap();
        let solution = Solver::new().solve(&problem).unwrap();

        assert_close(solution.optimal_value, 2.0, "obj");
        // Raising the RHS of -x <= -2 relaxes it and lowers the minimum
        assert_close(solution.shadow_prices[0], -1.0, "shadow");
        let range = &solution.sensitivity.rhs_ranges[0];
        assert_eq!(range.min, f64::NEG_INFINITY);
        assert_close(range.max, 0.0, "rhs max");
    }

    #[test]
    fn test_fixed_variable_is_priced_against_duals() {
        let problem = ProblemBuilder::new()
            .maximize()
            .variable("x", 2.0)
            .variable("y", 1.0)
            .unnamed_constraint(vec![1.0, 1.0], ConstraintOp::Le, 5.0)
            .bound("y", ConstraintOp::Eq, 1.0)
            .build()
            .unwrap();
        let solution = Solver::new().solve(&problem).unwrap();

        assert_close(solution.optimal_value, 9.0, "obj");
        assert_close(solution.optimal_solution[1], 1.0, "y");
        let y = &solution.reduced_costs[1];
        assert_close(y.reduced_cost, -1.0, "reduced cost of fixed y");
        let range = &solution.sensitivity.coefficient_ranges[1];
        assert_eq!((range.min, range.max), (f64::NEG_INFINITY, f64::INFINITY));
    }

    #[test]
    fn test_balanced_transportation_rhs_ranges_are_pinned() {
        // Two supplies of 5, demands 4 and 6: one equality is redundant,
        // so moving any single right-hand side breaks the balance
        let problem = ProblemBuilder::new()
            .minimize()
            .variable("x11", 1.0)
            .variable("x12", 3.0)
            .variable("x21", 2.0)
            .variable("x22", 1.0)
            .constraint("s1", vec![1.0, 1.0, 0.0, 0.0], ConstraintOp::Eq, 5.0)
            .constraint("s2", vec![0.0, 0.0, 1.0, 1.0], ConstraintOp::Eq, 5.0)
            .constraint("d1", vec![1.0, 0.0, 1.0, 0.0], ConstraintOp::Eq, 4.0)
            .constraint("d2", vec![0.0, 1.0, 0.0, 1.0], ConstraintOp::Eq, 6.0)
            .build()
            .unwrap();
        let solver = Solver::new();
        let solution = solver.solve(&problem).unwrap();
        assert_close(solution.optimal_value, 12.0, "obj");

        for (i, range) in solution.sensitivity.rhs_ranges.iter().enumerate() {
            let rhs = problem.constraints[i].rhs;
            assert_close(range.min, rhs, &format!("{} min", range.constraint));
            assert_close(range.max, rhs, &format!("{} max", range.constraint));
        }

        let mut shifted = problem.clone();
        shifted.constraints[2].rhs = 4.5;
        assert!(solver.solve(&shifted).is_err(), "d1 = 4.5 is unbalanced");
    }

    #[test]
    fn test_duplicate_equality_rhs_range_is_a_point() {
        let problem = ProblemBuilder::new()
            .maximize()
            .variable("x", 1.0)
            .unnamed_constraint(vec![1.0], ConstraintOp::Eq, 2.0)
            .unnamed_constraint(vec![1.0], ConstraintOp::Eq, 2.0)
            .build()
            .unwrap();
        let solution = Solver::new().solve(&problem).unwrap();

        assert_close(solution.optimal_value, 2.0, "obj");
        for range in &solution.sensitivity.rhs_ranges {
            assert_close(range.min, 2.0, "rhs min");
            assert_close(range.max, 2.0, "rhs max");
        }
    }
}
