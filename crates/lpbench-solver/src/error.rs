use thiserror::Error;

/// A malformed problem, rejected before it reaches the simplex engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Problem has no variables")]
    NoVariables,
    #[error("Objective has {coefficients} coefficients but {variables} variable names")]
    ObjectiveLengthMismatch { coefficients: usize, variables: usize },
    #[error("Constraint {constraint} has {found} coefficients, expected {expected}")]
    ConstraintLengthMismatch {
        constraint: String,
        expected: usize,
        found: usize,
    },
    #[error("Non-finite coefficient in {location}")]
    NonFiniteCoefficient { location: String },
    #[error("Constraint {constraint} has a non-finite right-hand side")]
    NonFiniteRhs { constraint: String },
    #[error("Bound on {variable} has a non-finite value")]
    NonFiniteBound { variable: String },
    #[error("Duplicate variable name: {0}")]
    DuplicateVariable(String),
    #[error("Variable {0} has an empty name")]
    EmptyVariableName(usize),
    #[error("Bound refers to unknown variable: {0}")]
    UnknownBoundVariable(String),
}

/// Why a solve call produced no solution.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("Invalid problem: {0}")]
    Validation(#[from] ValidationError),
    #[error("Problem is infeasible: {reason}")]
    Infeasible { reason: String },
    #[error("Objective is unbounded: {variable} can grow without limit")]
    Unbounded { variable: String },
    #[error("Simplex did not converge within {limit} iterations (stopped after {iterations})")]
    NonConvergent { iterations: usize, limit: usize },
    #[error("Numerically unstable pivot {pivot:e} at row {row}, column {column}")]
    NumericalInstability { row: usize, column: usize, pivot: f64 },
}

/// Discriminant of [`SolveError`], for callers that only branch on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FailureKind {
    Validation,
    Infeasible,
    Unbounded,
    NonConvergent,
    NumericalInstability,
}

impl SolveError {
    pub fn kind(&self) -> FailureKind {
        match self {
            SolveError::Validation(_) => FailureKind::Validation,
            SolveError::Infeasible { .. } => FailureKind::Infeasible,
            SolveError::Unbounded { .. } => FailureKind::Unbounded,
            SolveError::NonConvergent { .. } => FailureKind::NonConvergent,
            SolveError::NumericalInstability { .. } => FailureKind::NumericalInstability,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Feasible region plotting needs exactly 2 variables, problem has {0}")]
    NotTwoDimensional(usize),
    #[error("Invalid problem: {0}")]
    Validation(#[from] ValidationError),
    #[error("Plot extent must be positive and finite")]
    InvalidExtent,
}
