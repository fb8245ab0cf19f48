use std::collections::HashSet;
use std::fmt;

use crate::error::ValidationError;

/// Represents a linear programming problem
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Problem {
    /// Objective function, including the variable names
    pub objective: Objective,
    /// Constraints
    pub constraints: Vec<Constraint>,
    /// Explicit variable bounds; variables without one are non-negative
    #[cfg_attr(feature = "serde", serde(default))]
    pub bounds: Vec<Bound>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Objective {
    /// Whether to minimize or maximize
    #[cfg_attr(feature = "serde", serde(rename = "type", alias = "direction"))]
    pub direction: Direction,
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Variable names, in column order
    pub variables: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    Maximize,
    Minimize,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Constraint {
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Comparison operator
    #[cfg_attr(feature = "serde", serde(rename = "operator"))]
    pub op: ConstraintOp,
    /// Right-hand side value
    pub rhs: f64,
    /// Optional label; unnamed constraints are reported as `C1`, `C2`, ...
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    #[cfg_attr(feature = "serde", serde(rename = "<="))]
    Le,
    /// Greater than or equal (>=)
    #[cfg_attr(feature = "serde", serde(rename = ">="))]
    Ge,
    /// Equal (=)
    #[cfg_attr(feature = "serde", serde(rename = "="))]
    Eq,
}

/// A bound on a single variable, e.g. `x <= 10`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bound {
    pub variable: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub op: ConstraintOp,
    pub value: f64,
}

impl ConstraintOp {
    /// The operator obtained by multiplying both sides by -1.
    pub fn flipped(self) -> Self {
        match self {
            ConstraintOp::Le => ConstraintOp::Ge,
            ConstraintOp::Ge => ConstraintOp::Le,
            ConstraintOp::Eq => ConstraintOp::Eq,
        }
    }

    /// Whether `lhs op rhs` holds within `tolerance`.
    pub fn is_satisfied(self, lhs: f64, rhs: f64, tolerance: f64) -> bool {
        match self {
            ConstraintOp::Le => lhs <= rhs + tolerance,
            ConstraintOp::Ge => lhs >= rhs - tolerance,
            ConstraintOp::Eq => (lhs - rhs).abs() <= tolerance,
        }
    }
}

impl fmt::Display for ConstraintOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConstraintOp::Le => "<=",
            ConstraintOp::Ge => ">=",
            ConstraintOp::Eq => "=",
        })
    }
}

impl Constraint {
    pub fn new(coefficients: Vec<f64>, op: ConstraintOp, rhs: f64) -> Self {
        Self {
            coefficients,
            op,
            rhs,
            name: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Left-hand side evaluated at `values`.
    pub fn lhs(&self, values: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(values)
            .map(|(coef, value)| coef * value)
            .sum()
    }
}

impl Problem {
    pub fn new(variables: Vec<String>, direction: Direction) -> Self {
        let n = variables.len();
        Self {
            objective: Objective {
                direction,
                coefficients: vec![0.0; n],
                variables,
            },
            constraints: Vec::new(),
            bounds: Vec::new(),
        }
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>, direction: Direction) {
        self.objective.coefficients = coefficients;
        self.objective.direction = direction;
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        coefficients: Vec<f64>,
        op: ConstraintOp,
        rhs: f64,
    ) {
        self.constraints
            .push(Constraint::new(coefficients, op, rhs).named(name));
    }

    pub fn add_bound(&mut self, variable: impl Into<String>, op: ConstraintOp, value: f64) {
        self.bounds.push(Bound {
            variable: variable.into(),
            op,
            value,
        });
    }

    pub fn num_variables(&self) -> usize {
        self.objective.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn variables(&self) -> &[String] {
        &self.objective.variables
    }

    pub fn variable_index(&self, name: &str) -> Option<usize> {
        self.objective.variables.iter().position(|v| v == name)
    }

    /// Display name of constraint `index`.
    pub fn constraint_name(&self, index: usize) -> String {
        self.constraints
            .get(index)
            .and_then(|c| c.name.clone())
            .unwrap_or_else(|| format!("C{}", index + 1))
    }

    /// Objective value at `values`, in the problem's own direction.
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective
            .coefficients
            .iter()
            .zip(values)
            .map(|(coef, value)| coef * value)
            .sum()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let n = self.num_variables();
        if n == 0 {
            return Err(ValidationError::NoVariables);
        }
        if self.objective.coefficients.len() != n {
            return Err(ValidationError::ObjectiveLengthMismatch {
                coefficients: self.objective.coefficients.len(),
                variables: n,
            });
        }

        let mut seen = HashSet::with_capacity(n);
        for (j, name) in self.objective.variables.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(ValidationError::EmptyVariableName(j));
            }
            if !seen.insert(name.as_str()) {
                return Err(ValidationError::DuplicateVariable(name.clone()));
            }
        }

        if let Some(j) = self.objective.coefficients.iter().position(|c| !c.is_finite()) {
            return Err(ValidationError::NonFiniteCoefficient {
                location: format!("objective term {}", self.objective.variables[j]),
            });
        }

        for (i, c) in self.constraints.iter().enumerate() {
            if c.coefficients.len() != n {
                return Err(ValidationError::ConstraintLengthMismatch {
                    constraint: self.constraint_name(i),
                    expected: n,
                    found: c.coefficients.len(),
                });
            }
            if c.coefficients.iter().any(|v| !v.is_finite()) {
                return Err(ValidationError::NonFiniteCoefficient {
                    location: format!("constraint {}", self.constraint_name(i)),
                });
            }
            if !c.rhs.is_finite() {
                return Err(ValidationError::NonFiniteRhs {
                    constraint: self.constraint_name(i),
                });
            }
        }

        for b in &self.bounds {
            if !seen.contains(b.variable.as_str()) {
                return Err(ValidationError::UnknownBoundVariable(b.variable.clone()));
            }
            if !b.value.is_finite() {
                return Err(ValidationError::NonFiniteBound {
                    variable: b.variable.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Incrementally assembles a [`Problem`], e.g. while a form is being edited.
///
/// Nothing is checked until [`ProblemBuilder::build`], which returns a
/// validated snapshot.
#[derive(Debug, Clone)]
pub struct ProblemBuilder {
    direction: Direction,
    variables: Vec<String>,
    coefficients: Vec<f64>,
    constraints: Vec<Constraint>,
    bounds: Vec<Bound>,
}

impl Default for ProblemBuilder {
    fn default() -> Self {
        Self {
            direction: Direction::Maximize,
            variables: Vec::new(),
            coefficients: Vec::new(),
            constraints: Vec::new(),
            bounds: Vec::new(),
        }
    }
}

impl ProblemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn maximize(mut self) -> Self {
        self.direction = Direction::Maximize;
        self
    }

    pub fn minimize(mut self) -> Self {
        self.direction = Direction::Minimize;
        self
    }

    /// Adds a variable with its objective coefficient.
    pub fn variable(mut self, name: impl Into<String>, coefficient: f64) -> Self {
        self.variables.push(name.into());
        self.coefficients.push(coefficient);
        self
    }

    pub fn constraint(
        mut self,
        name: impl Into<String>,
        coefficients: Vec<f64>,
        op: ConstraintOp,
        rhs: f64,
    ) -> Self {
        self.constraints
            .push(Constraint::new(coefficients, op, rhs).named(name));
        self
    }

    pub fn unnamed_constraint(mut self, coefficients: Vec<f64>, op: ConstraintOp, rhs: f64) -> Self {
        self.constraints.push(Constraint::new(coefficients, op, rhs));
        self
    }

    pub fn bound(mut self, variable: impl Into<String>, op: ConstraintOp, value: f64) -> Self {
        self.bounds.push(Bound {
            variable: variable.into(),
            op,
            value,
        });
        self
    }

    pub fn build(self) -> Result<Problem, ValidationError> {
        let problem = Problem {
            objective: Objective {
                direction: self.direction,
                coefficients: self.coefficients,
                variables: self.variables,
            },
            constraints: self.constraints,
            bounds: self.bounds,
        };
        problem.validate()?;
        Ok(problem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_var() -> ProblemBuilder {
        ProblemBuilder::new()
            .maximize()
            .variable("x1", 3.0)
            .variable("x2", 2.0)
    }

    #[test]
    fn test_builder_produces_valid_problem() {
        let problem = two_var()
            .constraint("sum", vec![1.0, 1.0], ConstraintOp::Le, 4.0)
            .unnamed_constraint(vec![2.0, 1.0], ConstraintOp::Le, 6.0)
            .bound("x1", ConstraintOp::Le, 5.0)
            .build()
            .unwrap();

        assert_eq!(problem.num_variables(), 2);
        assert_eq!(problem.num_constraints(), 2);
        assert_eq!(problem.constraint_name(0), "sum");
        assert_eq!(problem.constraint_name(1), "C2");
        assert_eq!(problem.variable_index("x2"), Some(1));
    }

    #[test]
    fn test_no_variables() {
        let err = ProblemBuilder::new().build().unwrap_err();
        assert_eq!(err, ValidationError::NoVariables);
    }

    #[test]
    fn test_constraint_length_mismatch() {
        let err = two_var()
            .constraint("short", vec![1.0], ConstraintOp::Le, 4.0)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::ConstraintLengthMismatch {
                constraint: "short".to_string(),
                expected: 2,
                found: 1,
            }
        );
    }

    #[test]
    fn test_non_finite_values() {
        let err = two_var()
            .unnamed_constraint(vec![1.0, 1.0], ConstraintOp::Le, f64::NAN)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::NonFiniteRhs {
                constraint: "C1".to_string()
            }
        );

        let err = two_var()
            .bound("x1", ConstraintOp::Le, f64::INFINITY)
            .build()
            .unwrap_err();
        assert!(matches!(err, ValidationError::NonFiniteBound { .. }));
    }

    #[test]
    fn test_duplicate_and_unknown_names() {
        let err = ProblemBuilder::new()
            .variable("x", 1.0)
            .variable("x", 2.0)
            .build()
            .unwrap_err();
        assert_eq!(err, ValidationError::DuplicateVariable("x".to_string()));

        let err = two_var().bound("y", ConstraintOp::Ge, 1.0).build().unwrap_err();
        assert_eq!(err, ValidationError::UnknownBoundVariable("y".to_string()));
    }

    #[test]
    fn test_objective_length_mismatch() {
        let mut problem = Problem::new(vec!["a".to_string(), "b".to_string()], Direction::Minimize);
        problem.set_objective(vec![1.0], Direction::Minimize);
        assert!(matches!(
            problem.validate(),
            Err(ValidationError::ObjectiveLengthMismatch { coefficients: 1, variables: 2 })
        ));
    }

    #[test]
    fn test_operator_helpers() {
        assert_eq!(ConstraintOp::Le.flipped(), ConstraintOp::Ge);
        assert_eq!(ConstraintOp::Eq.flipped(), ConstraintOp::Eq);
        assert!(ConstraintOp::Le.is_satisfied(4.0 + 1e-12, 4.0, 1e-9));
        assert!(!ConstraintOp::Ge.is_satisfied(3.9, 4.0, 1e-9));
        assert_eq!(ConstraintOp::Ge.to_string(), ">=");
    }
}
