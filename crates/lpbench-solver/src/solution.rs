use crate::error::{FailureKind, SolveError};

/// The result of solving an LP problem to optimality
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Solution {
    /// Optimal objective value, in the problem's own direction
    pub optimal_value: f64,
    /// Optimal values of the structural variables, in input order
    pub optimal_solution: Vec<f64>,
    pub variables: Vec<VariableValue>,
    /// Non-negative gap of each constraint at the optimum (0 for `=`)
    pub slack_variables: Vec<f64>,
    /// Change in optimal value per unit increase of each constraint's RHS
    pub shadow_prices: Vec<f64>,
    #[cfg_attr(feature = "serde", serde(rename = "sensitivity_analysis"))]
    pub sensitivity: SensitivityAnalysis,
    pub reduced_costs: Vec<ReducedCost>,
    pub success: bool,
    /// Pivots performed across both phases
    pub iterations: usize,
    #[cfg_attr(feature = "serde", serde(rename = "execution_time"))]
    pub execution_time_ms: f64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VariableValue {
    pub name: String,
    pub value: f64,
}

/// Post-optimal ranging of the final basis
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensitivityAnalysis {
    /// Objective coefficient intervals that keep the basis optimal
    pub coefficient_ranges: Vec<CoefficientRange>,
    /// RHS intervals that keep the basis feasible
    pub rhs_ranges: Vec<RhsRange>,
    /// Constraints satisfied with equality at the optimum
    pub binding_constraints: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoefficientRange {
    pub variable: String,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RhsRange {
    pub constraint: String,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReducedCost {
    /// Variable name
    pub variable: String,
    /// Current value in solution
    pub value: f64,
    /// Change in objective per unit increase of a non-basic variable
    pub reduced_cost: f64,
    /// Is this variable in the basis?
    pub is_basic: bool,
}

impl Solution {
    /// Value of the named variable.
    pub fn value_of(&self, name: &str) -> Option<f64> {
        self.variables
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.value)
    }

    /// Sentence describing what the shadow price of constraint `index` means.
    pub fn shadow_price_interpretation(&self, index: usize) -> Option<String> {
        let value = *self.shadow_prices.get(index)?;
        Some(if value == 0.0 {
            "Non-binding constraint".to_string()
        } else if value > 0.0 {
            format!("Increasing RHS by 1 unit would increase the objective by {:.4}", value)
        } else {
            format!("Increasing RHS by 1 unit would decrease the objective by {:.4}", -value)
        })
    }
}

/// Structured outcome of a solve call, shaped for JSON consumers.
///
/// Exactly one of `solution` and `failure` is present.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolveReport {
    pub success: bool,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub solution: Option<Solution>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub failure: Option<Failure>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl From<Result<Solution, SolveError>> for SolveReport {
    fn from(result: Result<Solution, SolveError>) -> Self {
        match result {
            Ok(solution) => Self {
                success: true,
                solution: Some(solution),
                failure: None,
            },
            Err(err) => Self {
                success: false,
                solution: None,
                failure: Some(Failure {
                    kind: err.kind(),
                    message: err.to_string(),
                }),
            },
        }
    }
}
