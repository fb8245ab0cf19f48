//! WASM bindings for lpbench
//!
//! Problems cross the boundary as JSON text in the same shape the CLI reads;
//! results come back as plain JS objects.

use wasm_bindgen::prelude::*;

use lpbench_solver::{
    Extent, FeasibleRegion, Problem, SolveReport, Solver, SolverConfig, compute_feasible_region,
};

#[derive(serde::Serialize, Debug, PartialEq)]
struct Diagnostic {
    severity: String,
    message: String,
}

fn parse_problem(source: &str) -> Result<Problem, String> {
    serde_json::from_str(source).map_err(|e| e.to_string())
}

fn parse_config(source: Option<&str>) -> Result<SolverConfig, String> {
    match source {
        Some(text) if !text.trim().is_empty() => {
            serde_json::from_str(text).map_err(|e| e.to_string())
        }
        _ => Ok(SolverConfig::default()),
    }
}

fn get_diagnostics(source: &str) -> Vec<Diagnostic> {
    let error = |message: String| Diagnostic {
        severity: "error".to_string(),
        message,
    };

    match parse_problem(source) {
        Err(e) => vec![error(e)],
        Ok(problem) => match problem.validate() {
            Err(e) => vec![error(e.to_string())],
            Ok(()) if problem.constraints.is_empty() => vec![Diagnostic {
                severity: "warning".to_string(),
                message: "Problem has no constraints".to_string(),
            }],
            Ok(()) => Vec::new(),
        },
    }
}

fn solve_report(source: &str, config: Option<&str>) -> Result<SolveReport, String> {
    let problem = parse_problem(source)?;
    let config = parse_config(config)?;
    Ok(Solver::with_config(config).report(&problem))
}

fn region(
    source: &str,
    max_x: f64,
    max_y: f64,
    with_solution: bool,
) -> Result<FeasibleRegion, String> {
    let problem = parse_problem(source)?;
    let solver = Solver::new();
    let solution = if with_solution {
        solver.solve(&problem).ok()
    } else {
        None
    };
    compute_feasible_region(
        &problem,
        Extent::new(max_x, max_y),
        solution.as_ref(),
        solver.config().tolerance,
    )
    .map_err(|e| e.to_string())
}

/// Validate a problem and return diagnostics as JSON
#[wasm_bindgen]
pub fn validate(source: &str) -> JsValue {
    let diagnostics = get_diagnostics(source);
    serde_wasm_bindgen::to_value(&diagnostics).unwrap_or(JsValue::NULL)
}

/// Solve a problem and return the report as JSON.
///
/// `config` is an optional JSON solver configuration.
#[wasm_bindgen]
pub fn solve(source: &str, config: Option<String>) -> Result<JsValue, JsValue> {
    let started = js_sys::Date::now();
    let mut report =
        solve_report(source, config.as_deref()).map_err(|e| JsValue::from_str(&e))?;
    if let Some(solution) = report.solution.as_mut() {
        solution.execution_time_ms = js_sys::Date::now() - started;
    }
    serde_wasm_bindgen::to_value(&report).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Compute the feasible region of a two-variable problem
#[wasm_bindgen]
pub fn feasible_region(
    source: &str,
    max_x: f64,
    max_y: f64,
    with_solution: bool,
) -> Result<JsValue, JsValue> {
    let plotted = region(source, max_x, max_y, with_solution).map_err(|e| JsValue::from_str(&e))?;
    serde_wasm_bindgen::to_value(&plotted).map_err(|e| JsValue::from_str(&e.to_string()))
}
