//! Conversion of a [`Problem`] into a canonical maximization tableau.
//!
//! Column layout is `[structural | slack/surplus | artificial | rhs]` and the
//! last row is the objective row, stored as `-c` so that a negative entry
//! marks an improving column.

use log::debug;

use crate::error::SolveError;
use crate::problem::{ConstraintOp, Direction, Problem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Minimizing the sum of artificial variables
    One,
    /// Optimizing the real objective
    Two,
}

/// Dense simplex tableau: constraint rows followed by the objective row.
#[derive(Debug, Clone)]
pub struct Tableau {
    pub data: Vec<Vec<f64>>,
    /// Basic column of each constraint row
    pub basis: Vec<usize>,
    pub phase: Phase,
}

impl Tableau {
    fn new(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![vec![0.0; cols + 1]; rows + 1],
            basis: vec![0; rows],
            phase: Phase::Two,
        }
    }

    /// Number of constraint rows.
    pub fn num_rows(&self) -> usize {
        self.data.len() - 1
    }

    /// Number of variable columns, excluding the RHS.
    pub fn num_cols(&self) -> usize {
        self.data[0].len() - 1
    }

    pub fn obj_row(&self) -> usize {
        self.num_rows()
    }

    pub fn rhs_col(&self) -> usize {
        self.num_cols()
    }

    pub fn rhs(&self, row: usize) -> f64 {
        self.data[row][self.rhs_col()]
    }

    /// Reduced cost of `col` in the current objective row.
    pub fn reduced_cost(&self, col: usize) -> f64 {
        self.data[self.obj_row()][col]
    }

    /// Objective value of the current basic solution.
    pub fn objective(&self) -> f64 {
        self.data[self.obj_row()][self.rhs_col()]
    }

    /// Row in which `col` is basic, if any.
    pub fn basic_row(&self, col: usize) -> Option<usize> {
        self.basis.iter().position(|&b| b == col)
    }

    /// Value of `col` in the current basic solution.
    pub fn value(&self, col: usize) -> f64 {
        self.basic_row(col).map_or(0.0, |row| self.rhs(row))
    }

    /// Replaces the objective row and prices out the current basis.
    pub fn set_objective(&mut self, costs: &[f64]) {
        let obj = self.obj_row();
        let rhs = self.rhs_col();
        for (j, &c) in costs.iter().enumerate() {
            self.data[obj][j] = -c;
        }
        self.data[obj][rhs] = 0.0;

        for i in 0..self.num_rows() {
            let factor = self.data[obj][self.basis[i]];
            if factor != 0.0 {
                for j in 0..=rhs {
                    self.data[obj][j] -= factor * self.data[i][j];
                }
                self.data[obj][self.basis[i]] = 0.0;
            }
        }
    }

    /// Gauss-Jordan pivot on `(row, col)`; `col` becomes basic in `row`.
    pub fn pivot(&mut self, row: usize, col: usize) {
        let n_cols = self.data[0].len();

        self.basis[row] = col;

        let pivot_val = self.data[row][col];
        for j in 0..n_cols {
            self.data[row][j] /= pivot_val;
        }
        self.data[row][col] = 1.0;

        for i in 0..self.data.len() {
            if i == row {
                continue;
            }
            let factor = self.data[i][col];
            if factor == 0.0 {
                continue;
            }
            for j in 0..n_cols {
                self.data[i][j] -= factor * self.data[row][j];
            }
            self.data[i][col] = 0.0;
        }
    }
}

/// Meaning of a tableau column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Original variable, by index into the problem's variables
    Structural(usize),
    Slack(usize),
    Surplus(usize),
    Artificial(usize),
}

/// Where a tableau row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrigin {
    /// A user constraint, by index
    Constraint(usize),
    /// The finite upper bound of a variable
    UpperBound(usize),
}

#[derive(Debug, Clone)]
pub struct RowInfo {
    pub origin: RowOrigin,
    /// Operator after normalizing the RHS to be non-negative
    pub op: ConstraintOp,
    /// Whether the row was multiplied by -1
    pub negated: bool,
    pub slack: Option<usize>,
    pub artificial: Option<usize>,
}

impl RowInfo {
    /// +1 for rows kept as written, -1 for negated rows.
    pub fn sign(&self) -> f64 {
        if self.negated { -1.0 } else { 1.0 }
    }

    /// Column holding `B^-1 e_row` (up to `sign`) and that sign.
    pub fn basis_inverse_column(&self) -> Option<(usize, f64)> {
        match self.op {
            ConstraintOp::Le => self.slack.map(|c| (c, 1.0)),
            ConstraintOp::Ge => self.slack.map(|c| (c, -1.0)),
            ConstraintOp::Eq => self.artificial.map(|c| (c, 1.0)),
        }
    }
}

/// Effective bounds of one variable after merging the problem's bound list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariableBounds {
    pub lower: f64,
    pub upper: Option<f64>,
}

impl VariableBounds {
    pub fn is_fixed(&self, tolerance: f64) -> bool {
        self.upper.is_some_and(|u| (u - self.lower).abs() <= tolerance)
    }
}

/// A problem rewritten as `max c'x, Ax = b, x >= 0, b >= 0`.
#[derive(Debug, Clone)]
pub struct StandardForm {
    pub tableau: Tableau,
    pub columns: Vec<ColumnKind>,
    pub rows: Vec<RowInfo>,
    /// Column of each original variable; `None` when fixed and substituted out
    pub structural: Vec<Option<usize>>,
    pub bounds: Vec<VariableBounds>,
    /// Phase-2 objective coefficients per column (maximization form)
    pub costs: Vec<f64>,
    /// +1 for maximize, -1 for minimize
    pub sense: f64,
    /// First artificial column
    pub artificial_start: usize,
}

impl StandardForm {
    pub fn build(problem: &Problem, tolerance: f64) -> Result<Self, SolveError> {
        let n_vars = problem.num_variables();
        let sense = match problem.objective.direction {
            Direction::Maximize => 1.0,
            Direction::Minimize => -1.0,
        };

        let bounds = resolve_bounds(problem, tolerance)?;

        let mut structural = vec![None; n_vars];
        let mut columns = Vec::new();
        for (j, b) in bounds.iter().enumerate() {
            if !b.is_fixed(tolerance) {
                structural[j] = Some(columns.len());
                columns.push(ColumnKind::Structural(j));
            }
        }
        let n_structural = columns.len();

        // Each row as (origin, coefficients over structural columns, op, rhs)
        let mut raw_rows: Vec<(RowOrigin, Vec<f64>, ConstraintOp, f64)> = Vec::new();
        for (i, c) in problem.constraints.iter().enumerate() {
            let mut coefs = vec![0.0; n_structural];
            let mut rhs = c.rhs;
            for (j, &a) in c.coefficients.iter().enumerate() {
                rhs -= a * bounds[j].lower;
                if let Some(col) = structural[j] {
                    coefs[col] = a;
                }
            }
            raw_rows.push((RowOrigin::Constraint(i), coefs, c.op, rhs));
        }
        for (j, b) in bounds.iter().enumerate() {
            let (Some(col), Some(upper)) = (structural[j], b.upper) else {
                continue;
            };
            let mut coefs = vec![0.0; n_structural];
            coefs[col] = 1.0;
            raw_rows.push((
                RowOrigin::UpperBound(j),
                coefs,
                ConstraintOp::Le,
                (upper - b.lower).max(0.0),
            ));
        }

        // Negative RHS: flip the row so every RHS enters Phase 1 non-negative
        let mut rows = Vec::with_capacity(raw_rows.len());
        for (origin, coefs, op, rhs) in raw_rows.iter_mut() {
            let negated = *rhs < 0.0;
            if negated {
                *rhs = -*rhs;
                for a in coefs.iter_mut() {
                    *a = -*a;
                }
            }
            rows.push(RowInfo {
                origin: *origin,
                op: if negated { op.flipped() } else { *op },
                negated,
                slack: None,
                artificial: None,
            });
        }

        for (i, row) in rows.iter_mut().enumerate() {
            match row.op {
                ConstraintOp::Le => {
                    row.slack = Some(columns.len());
                    columns.push(ColumnKind::Slack(i));
                }
                ConstraintOp::Ge => {
                    row.slack = Some(columns.len());
                    columns.push(ColumnKind::Surplus(i));
                }
                ConstraintOp::Eq => {}
            }
        }
        let artificial_start = columns.len();
        for (i, row) in rows.iter_mut().enumerate() {
            if matches!(row.op, ConstraintOp::Ge | ConstraintOp::Eq) {
                row.artificial = Some(columns.len());
                columns.push(ColumnKind::Artificial(i));
            }
        }

        let mut tableau = Tableau::new(rows.len(), columns.len());
        let rhs_col = tableau.rhs_col();
        for (i, ((_, coefs, _, rhs), info)) in raw_rows.iter().zip(&rows).enumerate() {
            tableau.data[i][..n_structural].copy_from_slice(coefs);
            tableau.data[i][rhs_col] = *rhs;
            match info.op {
                ConstraintOp::Le => {
                    let slack = info.slack.unwrap_or_default();
                    tableau.data[i][slack] = 1.0;
                    tableau.basis[i] = slack;
                }
                ConstraintOp::Ge => {
                    let surplus = info.slack.unwrap_or_default();
                    let artificial = info.artificial.unwrap_or_default();
                    tableau.data[i][surplus] = -1.0;
                    tableau.data[i][artificial] = 1.0;
                    tableau.basis[i] = artificial;
                }
                ConstraintOp::Eq => {
                    let artificial = info.artificial.unwrap_or_default();
                    tableau.data[i][artificial] = 1.0;
                    tableau.basis[i] = artificial;
                }
            }
        }
        if artificial_start < columns.len() {
            tableau.phase = Phase::One;
        }

        let mut costs = vec![0.0; columns.len()];
        for (j, col) in structural.iter().enumerate() {
            if let Some(col) = col {
                costs[*col] = sense * problem.objective.coefficients[j];
            }
        }
        tableau.set_objective(&costs);

        debug!(
            "standard form: {} rows, {} structural, {} slack/surplus, {} artificial columns",
            rows.len(),
            n_structural,
            artificial_start - n_structural,
            columns.len() - artificial_start
        );

        Ok(Self {
            tableau,
            columns,
            rows,
            structural,
            bounds,
            costs,
            sense,
            artificial_start,
        })
    }

    pub fn has_artificial(&self) -> bool {
        self.artificial_start < self.columns.len()
    }

    pub fn is_artificial(&self, col: usize) -> bool {
        col >= self.artificial_start
    }

    /// Row index of user constraint `constraint`.
    pub fn constraint_row(&self, constraint: usize) -> Option<usize> {
        self.rows
            .iter()
            .position(|r| r.origin == RowOrigin::Constraint(constraint))
    }

    /// Values of the original variables at the current basic solution.
    pub fn variable_values(&self) -> Vec<f64> {
        self.structural
            .iter()
            .zip(&self.bounds)
            .map(|(col, b)| b.lower + col.map_or(0.0, |c| self.tableau.value(c)))
            .collect()
    }

    /// Human-readable name of a column, for diagnostics.
    pub fn column_name(&self, col: usize, problem: &Problem) -> String {
        let row_name = |row: usize| match self.rows[row].origin {
            RowOrigin::Constraint(i) => problem.constraint_name(i),
            RowOrigin::UpperBound(j) => format!("{} upper bound", problem.variables()[j]),
        };
        match self.columns.get(col) {
            Some(ColumnKind::Structural(j)) => problem.variables()[*j].clone(),
            Some(ColumnKind::Slack(row)) => format!("slack of {}", row_name(*row)),
            Some(ColumnKind::Surplus(row)) => format!("surplus of {}", row_name(*row)),
            Some(ColumnKind::Artificial(row)) => format!("artificial of {}", row_name(*row)),
            None => format!("column {col}"),
        }
    }
}

/// Merges the bound list into one lower/upper pair per variable.
///
/// A `>=` bound replaces the implicit lower bound of 0.
pub fn resolve_bounds(problem: &Problem, tolerance: f64) -> Result<Vec<VariableBounds>, SolveError> {
    let n = problem.num_variables();
    let mut lower: Vec<Option<f64>> = vec![None; n];
    let mut upper: Vec<Option<f64>> = vec![None; n];

    for b in &problem.bounds {
        let Some(j) = problem.variable_index(&b.variable) else {
            continue;
        };
        if matches!(b.op, ConstraintOp::Ge | ConstraintOp::Eq) {
            lower[j] = Some(lower[j].map_or(b.value, |l| l.max(b.value)));
        }
        if matches!(b.op, ConstraintOp::Le | ConstraintOp::Eq) {
            upper[j] = Some(upper[j].map_or(b.value, |u| u.min(b.value)));
        }
    }

    lower
        .into_iter()
        .zip(upper)
        .enumerate()
        .map(|(j, (lower, upper))| {
            let lower = lower.unwrap_or(0.0);
            if let Some(u) = upper {
                if u < lower - tolerance {
                    return Err(SolveError::Infeasible {
                        reason: format!(
                            "bounds on {} are contradictory ({} > {})",
                            problem.variables()[j],
                            lower,
                            u
                        ),
                    });
                }
            }
            Ok(VariableBounds { lower, upper })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::ProblemBuilder;

    #[test]
    fn test_layout_for_mixed_operators() {
        let problem = ProblemBuilder::new()
            .minimize()
            .variable("x", 2.0)
            .variable("y", 3.0)
            .constraint("le", vec![1.0, 1.0], ConstraintOp::Le, 4.0)
            .constraint("ge", vec![1.0, 0.0], ConstraintOp::Ge, 1.0)
            .constraint("eq", vec![0.0, 1.0], ConstraintOp::Eq, 2.0)
            .build()
            .unwrap();
        let form = StandardForm::build(&problem, 1e-9).unwrap();

        assert_eq!(
            form.columns,
            vec![
                ColumnKind::Structural(0),
                ColumnKind::Structural(1),
                ColumnKind::Slack(0),
                ColumnKind::Surplus(1),
                ColumnKind::Artificial(1),
                ColumnKind::Artificial(2),
            ]
        );
        assert_eq!(form.artificial_start, 4);
        assert_eq!(form.tableau.phase, Phase::One);
        assert_eq!(form.tableau.basis, vec![2, 4, 5]);
        assert_eq!(form.tableau.data.len(), 4);
        assert_eq!(form.tableau.data[0].len(), 7);
        // Minimization is negated into maximization form
        assert_eq!(form.costs[..2], [-2.0, -3.0]);
        assert_eq!(form.tableau.reduced_cost(0), 2.0);
    }

    #[test]
    fn test_negative_rhs_flips_operator() {
        let problem = ProblemBuilder::new()
            .variable("x", 1.0)
            .unnamed_constraint(vec![-1.0], ConstraintOp::Le, -2.0)
            .build()
            .unwrap();
        let form = StandardForm::build(&problem, 1e-9).unwrap();

        let row = &form.rows[0];
        assert!(row.negated);
        assert_eq!(row.op, ConstraintOp::Ge);
        assert_eq!(form.tableau.data[0][0], 1.0);
        assert_eq!(form.tableau.rhs(0), 2.0);
        assert!(form.has_artificial());
    }

    #[test]
    fn test_bounds_shift_and_substitute() {
        let problem = ProblemBuilder::new()
            .variable("x", 1.0)
            .variable("y", 1.0)
            .variable("z", 1.0)
            .unnamed_constraint(vec![1.0, 1.0, 1.0], ConstraintOp::Le, 10.0)
            .bound("x", ConstraintOp::Ge, 2.0)
            .bound("x", ConstraintOp::Le, 5.0)
            .bound("z", ConstraintOp::Eq, 3.0)
            .build()
            .unwrap();
        let form = StandardForm::build(&problem, 1e-9).unwrap();

        assert_eq!(form.structural, vec![Some(0), Some(1), None]);
        // 10 - 2 (x lower) - 3 (z fixed)
        assert_eq!(form.tableau.rhs(0), 5.0);
        // Upper bound row for x: x' <= 3
        assert_eq!(form.rows[1].origin, RowOrigin::UpperBound(0));
        assert_eq!(form.tableau.rhs(1), 3.0);
        assert_eq!(form.variable_values(), vec![2.0, 0.0, 3.0]);
    }

    #[test]
    fn test_contradictory_bounds_are_infeasible() {
        let problem = ProblemBuilder::new()
            .variable("x", 1.0)
            .bound("x", ConstraintOp::Ge, 5.0)
            .bound("x", ConstraintOp::Le, 2.0)
            .build()
            .unwrap();
        let err = StandardForm::build(&problem, 1e-9).unwrap_err();
        assert!(matches!(err, SolveError::Infeasible { .. }));
    }

    #[test]
    fn test_pivot_keeps_unit_column() {
        let problem = ProblemBuilder::new()
            .variable("x", 3.0)
            .variable("y", 2.0)
            .unnamed_constraint(vec![1.0, 1.0], ConstraintOp::Le, 4.0)
            .unnamed_constraint(vec![2.0, 1.0], ConstraintOp::Le, 6.0)
            .build()
            .unwrap();
        let mut form = StandardForm::build(&problem, 1e-9).unwrap();
        form.tableau.pivot(1, 0);

        assert_eq!(form.tableau.basis, vec![2, 0]);
        assert_eq!(form.tableau.data[0][0], 0.0);
        assert_eq!(form.tableau.data[1][0], 1.0);
        assert_eq!(form.tableau.reduced_cost(0), 0.0);
        assert_eq!(form.tableau.value(0), 3.0);
        assert_eq!(form.tableau.objective(), 9.0);
    }
}
