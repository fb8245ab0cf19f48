//! Feasible-region geometry for two-variable problems.
//!
//! Every constraint, bound, axis and extent edge is treated as a line; the
//! region's vertices are the pairwise intersections that satisfy all
//! half-planes, ordered counter-clockwise around their centroid.
//!
//! The far edges of the extent are candidate lines too, on top of the
//! constraint, bound and axis lines. An unbounded region therefore comes back
//! as the polygon clipped to the extent rather than as a degenerate one.

use crate::error::GeometryError;
use crate::problem::{ConstraintOp, Problem};
use crate::simplex::clean;
use crate::solution::Solution;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Plotted window `[0, max_x] x [0, max_y]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Extent {
    pub max_x: f64,
    pub max_y: f64,
}

impl Default for Extent {
    fn default() -> Self {
        Self {
            max_x: 10.0,
            max_y: 10.0,
        }
    }
}

impl Extent {
    pub fn new(max_x: f64, max_y: f64) -> Self {
        Self { max_x, max_y }
    }

    pub fn contains(&self, p: Point, tolerance: f64) -> bool {
        p.x >= -tolerance
            && p.y >= -tolerance
            && p.x <= self.max_x + tolerance
            && p.y <= self.max_y + tolerance
    }
}

/// Boundary of the feasible region, counter-clockwise.
///
/// Fewer than three vertices means the region is empty, a point or a segment.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Polygon {
    pub vertices: Vec<Point>,
}

impl Polygon {
    pub fn is_degenerate(&self) -> bool {
        self.vertices.len() < 3
    }

    /// Signed shoelace area; positive for counter-clockwise winding.
    pub fn area(&self) -> f64 {
        let n = self.vertices.len();
        if n < 3 {
            return 0.0;
        }
        let twice: f64 = (0..n)
            .map(|i| {
                let p = self.vertices[i];
                let q = self.vertices[(i + 1) % n];
                p.x * q.y - q.x * p.y
            })
            .sum();
        twice / 2.0
    }

    /// Whether `p` lies inside or on the boundary of a convex polygon.
    pub fn contains(&self, p: Point, tolerance: f64) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }
        (0..n).all(|i| {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x) >= -tolerance
        })
    }
}

/// A labelled line segment, clipped to the extent.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    pub label: String,
    pub start: Point,
    pub end: Point,
}

/// Everything needed to plot a two-variable problem.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeasibleRegion {
    pub polygon: Polygon,
    /// Each constraint's line within the extent, in constraint order
    pub constraint_lines: Vec<Segment>,
    /// Optimal point of the supplied solution, when inside the extent
    pub optimal_point: Option<Point>,
    /// Objective iso-lines at 0.2, 0.4, ..., 1.2 times the optimal value
    pub objective_contours: Vec<Segment>,
}

/// `a*x + b*y op c`
#[derive(Debug, Clone, Copy)]
struct HalfPlane {
    a: f64,
    b: f64,
    op: ConstraintOp,
    c: f64,
}

impl HalfPlane {
    fn new(a: f64, b: f64, op: ConstraintOp, c: f64) -> Self {
        Self { a, b, op, c }
    }

    fn is_line(&self, tolerance: f64) -> bool {
        self.a.abs() > tolerance || self.b.abs() > tolerance
    }

    fn admits(&self, p: Point, tolerance: f64) -> bool {
        self.op
            .is_satisfied(self.a * p.x + self.b * p.y, self.c, tolerance * (1.0 + self.c.abs()))
    }

    /// Intersection of the two boundary lines; `None` when (nearly) parallel.
    fn intersect(&self, other: &HalfPlane, tolerance: f64) -> Option<Point> {
        let det = self.a * other.b - other.a * self.b;
        if det.abs() < tolerance {
            return None;
        }
        let x = (self.c * other.b - other.c * self.b) / det;
        let y = (self.a * other.c - other.a * self.c) / det;
        Some(Point::new(clean(x, tolerance), clean(y, tolerance)))
    }
}

/// Edges of the plotted window, as half-planes the region must satisfy.
fn window(extent: Extent) -> [HalfPlane; 4] {
    [
        HalfPlane::new(1.0, 0.0, ConstraintOp::Ge, 0.0),
        HalfPlane::new(0.0, 1.0, ConstraintOp::Ge, 0.0),
        HalfPlane::new(1.0, 0.0, ConstraintOp::Le, extent.max_x),
        HalfPlane::new(0.0, 1.0, ConstraintOp::Le, extent.max_y),
    ]
}

/// Computes the feasible polygon of a two-variable problem within `extent`.
///
/// `solution`, when given, contributes the optimal point and objective
/// contours; it is not needed for the polygon itself.
pub fn compute_feasible_region(
    problem: &Problem,
    extent: Extent,
    solution: Option<&Solution>,
    tolerance: f64,
) -> Result<FeasibleRegion, GeometryError> {
    problem.validate()?;
    if problem.num_variables() != 2 {
        return Err(GeometryError::NotTwoDimensional(problem.num_variables()));
    }
    let extent_ok = |v: f64| v.is_finite() && v > 0.0;
    if !extent_ok(extent.max_x) || !extent_ok(extent.max_y) {
        return Err(GeometryError::InvalidExtent);
    }

    let mut planes: Vec<HalfPlane> = problem
        .constraints
        .iter()
        .map(|c| HalfPlane::new(c.coefficients[0], c.coefficients[1], c.op, c.rhs))
        .collect();
    for b in &problem.bounds {
        let (a, bb) = match problem.variable_index(&b.variable) {
            Some(0) => (1.0, 0.0),
            Some(_) => (0.0, 1.0),
            None => continue,
        };
        planes.push(HalfPlane::new(a, bb, b.op, b.value));
    }
    planes.extend(window(extent));

    let vertices = region_vertices(&planes, tolerance);

    let constraint_lines = problem
        .constraints
        .iter()
        .enumerate()
        .filter_map(|(i, c)| {
            let line = HalfPlane::new(c.coefficients[0], c.coefficients[1], ConstraintOp::Eq, c.rhs);
            clip_line(&line, extent, tolerance).map(|(start, end)| Segment {
                label: problem.constraint_name(i),
                start,
                end,
            })
        })
        .collect();

    let optimal_point = solution
        .filter(|s| s.optimal_solution.len() == 2)
        .map(|s| Point::new(s.optimal_solution[0], s.optimal_solution[1]))
        .filter(|p| extent.contains(*p, tolerance));

    let objective_contours = match solution {
        Some(s) => objective_contours(problem, s.optimal_value, extent, tolerance),
        None => Vec::new(),
    };

    Ok(FeasibleRegion {
        polygon: Polygon { vertices },
        constraint_lines,
        optimal_point,
        objective_contours,
    })
}

fn region_vertices(planes: &[HalfPlane], tolerance: f64) -> Vec<Point> {
    let lines: Vec<&HalfPlane> = planes.iter().filter(|p| p.is_line(tolerance)).collect();

    let mut vertices: Vec<Point> = Vec::new();
    for (i, first) in lines.iter().enumerate() {
        for second in &lines[i + 1..] {
            let Some(p) = first.intersect(second, tolerance) else {
                continue;
            };
            if !planes.iter().all(|h| h.admits(p, tolerance)) {
                continue;
            }
            let duplicate = vertices
                .iter()
                .any(|v| (v.x - p.x).abs() <= tolerance && (v.y - p.y).abs() <= tolerance);
            if !duplicate {
                vertices.push(p);
            }
        }
    }

    sort_counter_clockwise(&mut vertices);
    vertices
}

fn sort_counter_clockwise(points: &mut [Point]) {
    if points.len() < 3 {
        return;
    }
    let n = points.len() as f64;
    let cx = points.iter().map(|p| p.x).sum::<f64>() / n;
    let cy = points.iter().map(|p| p.y).sum::<f64>() / n;
    points.sort_by(|p, q| {
        let angle_p = (p.y - cy).atan2(p.x - cx);
        let angle_q = (q.y - cy).atan2(q.x - cx);
        angle_p.total_cmp(&angle_q)
    });
}

/// Portion of a line inside the extent, or `None` if it misses it.
fn clip_line(line: &HalfPlane, extent: Extent, tolerance: f64) -> Option<(Point, Point)> {
    if !line.is_line(tolerance) {
        return None;
    }
    let mut hits: Vec<Point> = Vec::with_capacity(4);
    for edge in window(extent) {
        let Some(p) = line.intersect(&edge, tolerance) else {
            continue;
        };
        let inside = extent.contains(p, tolerance * (1.0 + extent.max_x.max(extent.max_y)));
        let seen = hits
            .iter()
            .any(|h| (h.x - p.x).abs() <= tolerance && (h.y - p.y).abs() <= tolerance);
        if inside && !seen {
            hits.push(p);
        }
    }
    if hits.len() < 2 {
        return None;
    }
    // Extreme points along the line direction (-b, a)
    let along = |p: &Point| -line.b * p.x + line.a * p.y;
    let start = *hits.iter().min_by(|p, q| along(p).total_cmp(&along(q)))?;
    let end = *hits.iter().max_by(|p, q| along(p).total_cmp(&along(q)))?;
    Some((start, end))
}

fn objective_contours(problem: &Problem, optimal: f64, extent: Extent, tolerance: f64) -> Vec<Segment> {
    let c = &problem.objective.coefficients;
    (1..=6)
        .filter_map(|k| {
            let level = optimal * f64::from(k) * 0.2;
            let line = HalfPlane::new(c[0], c[1], ConstraintOp::Eq, level);
            clip_line(&line, extent, tolerance).map(|(start, end)| Segment {
                label: format!("{level:.3}"),
                start,
                end,
            })
        })
        .collect()
}
