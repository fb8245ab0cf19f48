/// Rule used to choose the entering column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PivotRule {
    /// Most negative reduced cost, lowest index on ties
    #[default]
    Dantzig,
    /// Lowest index with a negative reduced cost; never cycles
    Bland,
}

/// Options recognized by [`crate::Solver`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SolverConfig {
    /// Tolerance for "approximately zero" comparisons
    pub tolerance: f64,
    /// Pivot limit across both phases; `None` derives `50 * (rows + cols)`
    pub max_iterations: Option<usize>,
    /// Artificial cost for a single-phase Big-M formulation instead of two phases
    pub big_m: Option<f64>,
    pub pivot_rule: PivotRule,
    /// Consecutive degenerate pivots tolerated before switching to Bland's rule
    pub bland_fallback_after: usize,
    /// Pivots smaller than this times the largest entry of their row (or this
    /// alone, for rows of small entries) abort with `NumericalInstability`
    pub pivot_floor: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-9,
            max_iterations: None,
            big_m: None,
            pivot_rule: PivotRule::Dantzig,
            bland_fallback_after: 50,
            pivot_floor: 1e-12,
        }
    }
}

impl SolverConfig {
    /// Iteration cap for a tableau of the given shape.
    pub fn iteration_limit(&self, rows: usize, cols: usize) -> usize {
        self.max_iterations
            .unwrap_or_else(|| 50 * (rows + cols).max(1))
    }
}
