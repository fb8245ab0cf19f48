mod config;
mod error;
mod geometry;
mod problem;
mod sensitivity;
mod simplex;
mod solution;
mod standard_form;

pub use config::{PivotRule, SolverConfig};
pub use error::{FailureKind, GeometryError, SolveError, ValidationError};
pub use geometry::{compute_feasible_region, Extent, FeasibleRegion, Point, Polygon, Segment};
pub use problem::{Bound, Constraint, ConstraintOp, Direction, Objective, Problem, ProblemBuilder};
pub use sensitivity::SensitivityAnalyzer;
pub use simplex::Solver;
pub use solution::{
    CoefficientRange, Failure, ReducedCost, RhsRange, SensitivityAnalysis, Solution, SolveReport,
    VariableValue,
};
pub use standard_form::{ColumnKind, Phase, RowInfo, RowOrigin, StandardForm, Tableau, VariableBounds};
