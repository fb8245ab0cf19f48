use approx::assert_abs_diff_eq;
use lpbench_solver::{
    compute_feasible_region, ConstraintOp, Extent, FailureKind, Point, ProblemBuilder, Solver,
};

const EPS: f64 = 1e-9;

#[test]
fn textbook_maximization() {
    // maximize 3x1 + 2x2 s.t. x1 + x2 <= 4, 2x1 + x2 <= 6
    let problem = ProblemBuilder::new()
        .maximize()
        .variable("x1", 3.0)
        .variable("x2", 2.0)
        .unnamed_constraint(vec![1.0, 1.0], ConstraintOp::Le, 4.0)
        .unnamed_constraint(vec![2.0, 1.0], ConstraintOp::Le, 6.0)
        .build()
        .unwrap();

    let solution = Solver::new().solve(&problem).unwrap();

    assert!(solution.success);
    assert_abs_diff_eq!(solution.optimal_value, 10.0, epsilon = EPS);
    assert_abs_diff_eq!(solution.optimal_solution[..], [2.0, 2.0][..], epsilon = EPS);
    assert_eq!(solution.value_of("x1"), Some(solution.optimal_solution[0]));
    assert_eq!(solution.variables[1].name, "x2");
}

#[test]
fn minimization_with_covering_constraint() {
    // minimize x1 + x2 s.t. x1 + 2x2 >= 4: the cheaper vertex is (0, 2)
    let problem = ProblemBuilder::new()
        .minimize()
        .variable("x1", 1.0)
        .variable("x2", 1.0)
        .unnamed_constraint(vec![1.0, 2.0], ConstraintOp::Ge, 4.0)
        .build()
        .unwrap();

    let solution = Solver::new().solve(&problem).unwrap();

    assert_abs_diff_eq!(solution.optimal_value, 2.0, epsilon = EPS);
    assert_abs_diff_eq!(solution.optimal_solution[..], [0.0, 2.0][..], epsilon = EPS);
    assert_abs_diff_eq!(solution.shadow_prices[0], 0.5, epsilon = EPS);
    assert_eq!(solution.sensitivity.binding_constraints, vec!["C1"]);
}

#[test]
fn contradictory_constraints_are_infeasible() {
    let problem = ProblemBuilder::new()
        .maximize()
        .variable("x", 1.0)
        .constraint("at_least_5", vec![1.0], ConstraintOp::Ge, 5.0)
        .constraint("at_most_2", vec![1.0], ConstraintOp::Le, 2.0)
        .build()
        .unwrap();

    let err = Solver::new().solve(&problem).unwrap_err();
    assert_eq!(err.kind(), FailureKind::Infeasible);
}

#[test]
fn missing_upper_limit_is_unbounded() {
    let problem = ProblemBuilder::new()
        .maximize()
        .variable("x", 1.0)
        .constraint("floor", vec![1.0], ConstraintOp::Ge, 1.0)
        .build()
        .unwrap();

    let err = Solver::new().solve(&problem).unwrap_err();
    assert_eq!(err.kind(), FailureKind::Unbounded);
}

#[test]
fn textbook_feasible_region() {
    let problem = ProblemBuilder::new()
        .maximize()
        .variable("x1", 3.0)
        .variable("x2", 2.0)
        .unnamed_constraint(vec![1.0, 1.0], ConstraintOp::Le, 4.0)
        .unnamed_constraint(vec![2.0, 1.0], ConstraintOp::Le, 6.0)
        .build()
        .unwrap();

    let region = compute_feasible_region(&problem, Extent::default(), None, EPS).unwrap();

    let expected = [
        Point::new(0.0, 0.0),
        Point::new(3.0, 0.0),
        Point::new(2.0, 2.0),
        Point::new(0.0, 4.0),
    ];
    assert_eq!(region.polygon.vertices.len(), expected.len());
    for p in &expected {
        assert!(
            region
                .polygon
                .vertices
                .iter()
                .any(|v| (v.x - p.x).abs() < EPS && (v.y - p.y).abs() < EPS),
            "missing vertex {p:?}"
        );
    }
    assert!(region.polygon.area() > 0.0, "vertices must wind counter-clockwise");
}

#[test]
fn diet_problem_with_bounds() {
    // minimize 0.6a + 0.2b
    // 5a + 7b >= 8, 4a + 2b >= 15, 2a + b >= 3, b <= 3, a >= 1
    let problem = ProblemBuilder::new()
        .minimize()
        .variable("a", 0.6)
        .variable("b", 0.2)
        .constraint("protein", vec![5.0, 7.0], ConstraintOp::Ge, 8.0)
        .constraint("iron", vec![4.0, 2.0], ConstraintOp::Ge, 15.0)
        .constraint("calcium", vec![2.0, 1.0], ConstraintOp::Ge, 3.0)
        .bound("b", ConstraintOp::Le, 3.0)
        .bound("a", ConstraintOp::Ge, 1.0)
        .build()
        .unwrap();

    let solution = Solver::new().solve(&problem).unwrap();

    // iron binds with b at its cap: a = (15 - 6) / 4
    assert_abs_diff_eq!(solution.optimal_solution[..], [2.25, 3.0][..], epsilon = EPS);
    assert_abs_diff_eq!(solution.optimal_value, 0.6 * 2.25 + 0.2 * 3.0, epsilon = EPS);
    assert_abs_diff_eq!(solution.shadow_prices[1], 0.15, epsilon = EPS);
    assert_eq!(solution.sensitivity.binding_constraints, vec!["iron"]);
    assert_eq!(solution.sensitivity.rhs_ranges.len(), 3);
}

#[test]
fn solving_twice_is_deterministic() {
    let problem = ProblemBuilder::new()
        .maximize()
        .variable("x", 2.0)
        .variable("y", 2.0)
        .variable("z", 1.0)
        .unnamed_constraint(vec![1.0, 1.0, 1.0], ConstraintOp::Le, 10.0)
        .unnamed_constraint(vec![1.0, -1.0, 0.0], ConstraintOp::Eq, 0.0)
        .unnamed_constraint(vec![0.0, 1.0, 2.0], ConstraintOp::Ge, 2.0)
        .build()
        .unwrap();

    let solver = Solver::new();
    let first = solver.solve(&problem).unwrap();
    let second = solver.solve(&problem).unwrap();

    assert_eq!(first.optimal_value, second.optimal_value);
    assert_eq!(first.optimal_solution, second.optimal_solution);
    assert_eq!(first.iterations, second.iterations);
}

#[cfg(feature = "serde")]
#[test]
fn problem_json_matches_form_shape() {
    let json = r#"{
        "objective": { "type": "maximize", "coefficients": [3, 2], "variables": ["x1", "x2"] },
        "constraints": [
            { "coefficients": [1, 1], "operator": "<=", "rhs": 4, "name": "labor" },
            { "coefficients": [2, 1], "operator": "<=", "rhs": 6 }
        ]
    }"#;
    let problem: lpbench_solver::Problem = serde_json::from_str(json).unwrap();
    assert!(problem.bounds.is_empty());
    assert_eq!(problem.constraint_name(0), "labor");

    let report = Solver::new().report(&problem);
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["success"], true);
    assert_eq!(value["solution"]["optimal_value"], 10.0);
    assert_eq!(
        value["solution"]["sensitivity_analysis"]["binding_constraints"][1],
        "C2"
    );
}
