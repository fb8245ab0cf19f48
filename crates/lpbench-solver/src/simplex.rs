use log::{debug, trace, warn};

use crate::config::{PivotRule, SolverConfig};
use crate::error::SolveError;
use crate::problem::Problem;
use crate::sensitivity::SensitivityAnalyzer;
use crate::solution::{Solution, SolveReport, VariableValue};
use crate::standard_form::{Phase, StandardForm, Tableau};

/// Simplex solver for linear programming problems
///
/// Holds only configuration; every call to [`Solver::solve`] builds its own
/// tableau, so one solver can be shared freely between threads.
#[derive(Debug, Clone, Default)]
pub struct Solver {
    config: SolverConfig,
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = Some(max);
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.config.tolerance = tol;
        self
    }

    pub fn with_big_m(mut self, m: f64) -> Self {
        self.config.big_m = Some(m);
        self
    }

    pub fn with_pivot_rule(mut self, rule: PivotRule) -> Self {
        self.config.pivot_rule = rule;
        self
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solve the LP problem using the two-phase (or Big-M) simplex method
    pub fn solve(&self, problem: &Problem) -> Result<Solution, SolveError> {
        let watch = Stopwatch::start();
        problem.validate()?;

        let mut form = StandardForm::build(problem, self.config.tolerance)?;
        let limit = self
            .config
            .iteration_limit(form.tableau.num_rows(), form.tableau.num_cols());
        let mut engine = Engine::new(&self.config, limit);

        let artificial_cost = match self.config.big_m {
            Some(m) if form.has_artificial() => match engine.big_m(&mut form, problem, m)? {
                BigMOutcome::Solved => m,
                BigMOutcome::Undecided => {
                    warn!("big-M diverged with an artificial still positive, retrying with two phases");
                    form = StandardForm::build(problem, self.config.tolerance)?;
                    engine.phase1(&mut form)?;
                    engine.phase2(&mut form, problem)?;
                    0.0
                }
            },
            _ => {
                if form.has_artificial() {
                    engine.phase1(&mut form)?;
                }
                engine.phase2(&mut form, problem)?;
                0.0
            }
        };

        debug!(
            "optimal after {} pivots, objective {}",
            engine.iterations,
            form.sense * form.tableau.objective()
        );

        let mut solution = self.extract_solution(&form, problem, artificial_cost);
        solution.iterations = engine.iterations;
        solution.execution_time_ms = watch.elapsed_ms();
        Ok(solution)
    }

    /// Like [`Solver::solve`], folded into a serializable report.
    pub fn report(&self, problem: &Problem) -> SolveReport {
        self.solve(problem).into()
    }

    fn extract_solution(&self, form: &StandardForm, problem: &Problem, artificial_cost: f64) -> Solution {
        let tol = self.config.tolerance;
        let values: Vec<f64> = form
            .variable_values()
            .into_iter()
            .map(|v| clean(v, tol))
            .collect();

        let analyzer = SensitivityAnalyzer::new(problem, form, tol, artificial_cost);
        let slack_variables = analyzer.slack_values(&values);
        let shadow_prices = analyzer.shadow_prices();
        let reduced_costs = analyzer.reduced_costs(&values, &shadow_prices);
        let sensitivity = analyzer.analyze(&slack_variables);

        Solution {
            optimal_value: clean(problem.objective_value(&values), tol),
            variables: problem
                .variables()
                .iter()
                .zip(&values)
                .map(|(name, &value)| VariableValue {
                    name: name.clone(),
                    value,
                })
                .collect(),
            optimal_solution: values,
            slack_variables,
            shadow_prices,
            sensitivity,
            reduced_costs,
            success: true,
            iterations: 0,
            execution_time_ms: 0.0,
        }
    }
}

/// Snaps values within `tol` of zero to exactly zero.
pub(crate) fn clean(value: f64, tol: f64) -> f64 {
    if value.abs() <= tol { 0.0 } else { value }
}

enum BigMOutcome {
    Solved,
    /// Diverged before every artificial reached zero; feasibility unknown
    Undecided,
}

enum PhaseOutcome {
    Optimal,
    /// Improving column with no limiting row
    Unbounded(usize),
}

/// Pivoting state of one solve call.
struct Engine<'a> {
    config: &'a SolverConfig,
    limit: usize,
    iterations: usize,
    rule: PivotRule,
    degenerate_streak: usize,
}

impl<'a> Engine<'a> {
    fn new(config: &'a SolverConfig, limit: usize) -> Self {
        Self {
            config,
            limit,
            iterations: 0,
            rule: config.pivot_rule,
            degenerate_streak: 0,
        }
    }

    fn phase1(&mut self, form: &mut StandardForm) -> Result<(), SolveError> {
        let tol = self.config.tolerance;
        let artificial_start = form.artificial_start;
        let tableau = &mut form.tableau;
        tableau.phase = Phase::One;

        // Maximize -sum(artificials)
        let mut costs = vec![0.0; tableau.num_cols()];
        for c in costs.iter_mut().skip(artificial_start) {
            *c = -1.0;
        }
        tableau.set_objective(&costs);
        debug!("phase 1: initial artificial sum {}", -tableau.objective());

        let all_cols = tableau.num_cols();
        if let PhaseOutcome::Unbounded(_) = self.run(tableau, all_cols)? {
            return Err(SolveError::Infeasible {
                reason: "phase 1 objective diverged".to_string(),
            });
        }

        let residual = -tableau.objective();
        if residual > tol {
            debug!("phase 1 residual {residual:e}, problem infeasible");
            return Err(SolveError::Infeasible {
                reason: format!(
                    "no point satisfies every constraint (artificial sum {residual:.3e} after phase 1)"
                ),
            });
        }

        // Drive zero-level artificials out of the basis where possible
        for row in 0..tableau.num_rows() {
            if tableau.basis[row] < artificial_start {
                continue;
            }
            let replacement = (0..artificial_start)
                .filter(|&j| tableau.data[row][j].abs() > tol)
                .max_by(|&a, &b| tableau.data[row][a].abs().total_cmp(&tableau.data[row][b].abs()));
            match replacement {
                Some(col) => self.pivot(tableau, row, col)?,
                None => trace!("row {row} is redundant, artificial stays pinned at zero"),
            }
        }

        Ok(())
    }

    fn phase2(&mut self, form: &mut StandardForm, problem: &Problem) -> Result<(), SolveError> {
        form.tableau.phase = Phase::Two;
        form.tableau.set_objective(&form.costs);
        debug!("phase 2: starting objective {}", form.tableau.objective());

        // Artificial columns never re-enter
        let allowed = form.artificial_start;
        match self.run(&mut form.tableau, allowed)? {
            PhaseOutcome::Optimal => Ok(()),
            PhaseOutcome::Unbounded(col) => Err(SolveError::Unbounded {
                variable: form.column_name(col, problem),
            }),
        }
    }

    /// Single-phase Big-M: artificials carry cost `-m` in the real objective.
    fn big_m(
        &mut self,
        form: &mut StandardForm,
        problem: &Problem,
        m: f64,
    ) -> Result<BigMOutcome, SolveError> {
        let tol = self.config.tolerance;
        let artificial_start = form.artificial_start;
        let mut costs = form.costs.clone();
        for c in costs.iter_mut().skip(artificial_start) {
            *c = -m;
        }
        let tableau = &mut form.tableau;
        tableau.phase = Phase::Two;
        tableau.set_objective(&costs);
        debug!("big-M with M = {m}");

        let all_cols = tableau.num_cols();
        let outcome = self.run(tableau, all_cols)?;

        let stuck = (0..tableau.num_rows())
            .find(|&row| tableau.basis[row] >= artificial_start && tableau.rhs(row) > tol)
            .map(|row| (tableau.basis[row], tableau.rhs(row)));

        match (outcome, stuck) {
            (PhaseOutcome::Optimal, None) => Ok(BigMOutcome::Solved),
            (PhaseOutcome::Optimal, Some((col, level))) => Err(SolveError::Infeasible {
                reason: format!(
                    "{} remains at {:.3e} at the Big-M optimum",
                    form.column_name(col, problem),
                    level
                ),
            }),
            (PhaseOutcome::Unbounded(col), None) => Err(SolveError::Unbounded {
                variable: form.column_name(col, problem),
            }),
            (PhaseOutcome::Unbounded(_), Some(_)) => Ok(BigMOutcome::Undecided),
        }
    }

    /// Pivots until no column below `allowed` has a negative reduced cost.
    fn run(&mut self, tableau: &mut Tableau, allowed: usize) -> Result<PhaseOutcome, SolveError> {
        loop {
            let Some(col) = self.entering_column(tableau, allowed) else {
                return Ok(PhaseOutcome::Optimal);
            };
            let Some((row, ratio)) = self.leaving_row(tableau, col) else {
                return Ok(PhaseOutcome::Unbounded(col));
            };

            if ratio <= self.config.tolerance {
                self.degenerate_streak += 1;
                if self.rule == PivotRule::Dantzig
                    && self.degenerate_streak >= self.config.bland_fallback_after
                {
                    warn!(
                        "{} consecutive degenerate pivots, switching to Bland's rule",
                        self.degenerate_streak
                    );
                    self.rule = PivotRule::Bland;
                }
            } else {
                self.degenerate_streak = 0;
            }

            trace!(
                "pivot {}: column {} enters, row {} (column {}) leaves, ratio {}",
                self.iterations + 1,
                col,
                row,
                tableau.basis[row],
                ratio
            );
            self.pivot(tableau, row, col)?;
        }
    }

    fn entering_column(&self, tableau: &Tableau, allowed: usize) -> Option<usize> {
        let tol = self.config.tolerance;
        let obj = &tableau.data[tableau.obj_row()];

        match self.rule {
            PivotRule::Bland => (0..allowed).find(|&j| obj[j] < -tol),
            PivotRule::Dantzig => {
                let mut min_val = -tol;
                let mut min_col = None;
                for (j, &val) in obj.iter().enumerate().take(allowed) {
                    if val < min_val {
                        min_val = val;
                        min_col = Some(j);
                    }
                }
                min_col
            }
        }
    }

    /// Minimum ratio test over strictly positive entries of `col`.
    fn leaving_row(&self, tableau: &Tableau, col: usize) -> Option<(usize, f64)> {
        let tol = self.config.tolerance;
        let mut best: Option<(usize, f64)> = None;

        for i in 0..tableau.num_rows() {
            let val = tableau.data[i][col];
            if val <= tol {
                continue;
            }
            let ratio = tableau.rhs(i).max(0.0) / val;
            best = match best {
                None => Some((i, ratio)),
                Some((_, min_ratio)) if ratio < min_ratio - tol => Some((i, ratio)),
                Some((r, min_ratio))
                    if self.rule == PivotRule::Bland
                        && (ratio - min_ratio).abs() <= tol
                        && tableau.basis[i] < tableau.basis[r] =>
                {
                    Some((i, min_ratio.min(ratio)))
                }
                keep => keep,
            };
        }

        best
    }

    fn pivot(&mut self, tableau: &mut Tableau, row: usize, col: usize) -> Result<(), SolveError> {
        if self.iterations >= self.limit {
            return Err(SolveError::NonConvergent {
                iterations: self.iterations,
                limit: self.limit,
            });
        }

        let pivot = tableau.data[row][col];
        let scale = tableau.data[row][..tableau.rhs_col()]
            .iter()
            .fold(1.0_f64, |m, v| m.max(v.abs()));
        if pivot.abs() < self.config.pivot_floor * scale {
            warn!("pivot {pivot:e} at ({row}, {col}) is below the safety floor (row scale {scale:e})");
            return Err(SolveError::NumericalInstability {
                row,
                column: col,
                pivot,
            });
        }

        tableau.pivot(row, col);
        self.iterations += 1;

        let rhs = tableau.rhs_col();
        let finite = tableau.data.iter().all(|r| r[rhs].is_finite())
            && tableau.data[tableau.obj_row()].iter().all(|v| v.is_finite());
        if !finite {
            return Err(SolveError::NumericalInstability {
                row,
                column: col,
                pivot,
            });
        }
        Ok(())
    }
}

/// Wall-clock timer; reports zero where `Instant` is unavailable.
struct Stopwatch {
    #[cfg(not(target_arch = "wasm32"))]
    start: std::time::Instant,
}

impl Stopwatch {
    fn start() -> Self {
        Self {
            #[cfg(not(target_arch = "wasm32"))]
            start: std::time::Instant::now(),
        }
    }

    fn elapsed_ms(&self) -> f64 {
        #[cfg(not(target_arch = "wasm32"))]
        {
            self.start.elapsed().as_secs_f64() * 1000.0
        }
        #[cfg(target_arch = "wasm32")]
        {
            0.0
        }
    }
}
