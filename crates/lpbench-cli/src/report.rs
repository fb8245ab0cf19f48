use std::fmt::Write;

use lpbench_solver::{FeasibleRegion, Problem, SolveReport};

fn bound(value: f64) -> String {
    if value.is_infinite() {
        if value > 0.0 { "+inf".to_string() } else { "-inf".to_string() }
    } else {
        format!("{:.4}", value)
    }
}

/// Human-readable solve report.
pub fn render_report(problem: &Problem, report: &SolveReport, analysis: bool) -> String {
    let mut out = String::new();

    let Some(solution) = &report.solution else {
        if let Some(failure) = &report.failure {
            let _ = writeln!(out, "Status: {:?}", failure.kind);
            let _ = writeln!(out, "{}", failure.message);
        }
        return out;
    };

    let _ = writeln!(out, "Status: OPTIMAL");
    let _ = writeln!(out, "Objective value: {:.4}", solution.optimal_value);
    let _ = writeln!(
        out,
        "Iterations: {} ({:.3} ms)",
        solution.iterations, solution.execution_time_ms
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "Variables:");
    for v in &solution.variables {
        let _ = writeln!(out, "  {:20} {:12.4}", v.name, v.value);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Constraints:");
    for (i, slack) in solution.slack_variables.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {:20} slack {:12.4}  shadow price {:12.4}",
            problem.constraint_name(i),
            slack,
            solution.shadow_prices[i]
        );
    }

    if analysis {
        let sensitivity = &solution.sensitivity;
        let _ = writeln!(out);
        let _ = writeln!(out, "Analysis:");
        let _ = writeln!(out);

        if !sensitivity.binding_constraints.is_empty() {
            let _ = writeln!(out, "Binding constraints:");
            for name in &sensitivity.binding_constraints {
                let _ = writeln!(out, "  - {}", name);
            }
            let _ = writeln!(out);
        }

        let _ = writeln!(out, "Shadow prices:");
        for i in 0..solution.shadow_prices.len() {
            if let Some(text) = solution.shadow_price_interpretation(i) {
                let _ = writeln!(out, "  {:20} {}", problem.constraint_name(i), text);
            }
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "Objective coefficient ranges:");
        for r in &sensitivity.coefficient_ranges {
            let _ = writeln!(out, "  {:20} [{}, {}]", r.variable, bound(r.min), bound(r.max));
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "Right-hand side ranges:");
        for r in &sensitivity.rhs_ranges {
            let _ = writeln!(out, "  {:20} [{}, {}]", r.constraint, bound(r.min), bound(r.max));
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "Reduced costs (variables not in solution):");
        for rc in &solution.reduced_costs {
            if !rc.is_basic && rc.reduced_cost != 0.0 {
                let _ = writeln!(
                    out,
                    "  {:20} objective changes by {:.4} per unit",
                    rc.variable, rc.reduced_cost
                );
            }
        }
    }

    out
}

/// Vertex listing of a feasible region.
pub fn render_region(problem: &Problem, region: &FeasibleRegion) -> String {
    let mut out = String::new();
    let names = problem.variables();

    if region.polygon.is_degenerate() {
        let _ = writeln!(
            out,
            "Feasible region is degenerate ({} vertices)",
            region.polygon.vertices.len()
        );
    } else {
        let _ = writeln!(out, "Feasible region ({:.4} area):", region.polygon.area());
    }
    for p in &region.polygon.vertices {
        let _ = writeln!(out, "  ({} = {:.4}, {} = {:.4})", names[0], p.x, names[1], p.y);
    }
    if let Some(p) = region.optimal_point {
        let _ = writeln!(out, "Optimal: ({:.2}, {:.2})", p.x, p.y);
    }
    out
}
