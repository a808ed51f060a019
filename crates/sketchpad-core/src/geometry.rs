//! Path geometry: turning vertex lists into path descriptions.
//!
//! Everything here is pure. Shapes call into this module on every render and
//! never cache the result.

use kurbo::{BezPath, PathEl, Point, Rect, Vec2};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_6};

/// Straight segments through `points`, optionally closed back to the start.
///
/// Returns an empty path for fewer than two points.
pub fn straight_path(points: &[Point], close_loop: bool) -> BezPath {
    let mut path = BezPath::new();
    if points.len() < 2 {
        return path;
    }
    path.move_to(points[0]);
    for &p in &points[1..] {
        path.line_to(p);
    }
    if close_loop {
        path.close_path();
    }
    path
}

/// Quadratic curve through the midpoints of consecutive vertices.
///
/// Each intermediate vertex becomes a control point and the curve passes
/// through the midpoint of every pair. The final segment continues smoothly
/// (its control is the previous control reflected through the current point)
/// and ends exactly on the last vertex.
pub fn smooth_path(points: &[Point]) -> BezPath {
    match points.len() {
        0 | 1 => return BezPath::new(),
        2 => return straight_path(points, false),
        _ => {}
    }

    let mut path = BezPath::new();
    path.move_to(points[0]);
    let last = points.len() - 1;
    let mut control = points[0];
    let mut current = points[0];
    for i in 1..last {
        control = points[i];
        current = points[i].midpoint(points[i + 1]);
        path.quad_to(control, current);
    }
    let reflected = current + (current - control);
    path.quad_to(reflected, points[last]);
    path
}

/// The two wedge points of an arrow head at `tip`, pointing away from `previous`.
///
/// Both points sit `radius` away from the tip, 30 degrees either side of the
/// direction back towards `previous`. Coincident points yield a collapsed
/// wedge at the tip.
pub fn arrow_head(tip: Point, previous: Point, radius: f64) -> [Point; 2] {
    // Screen y grows downwards, so the vertical delta is flipped.
    let y_diff = previous.y - tip.y;
    let x_diff = tip.x - previous.x;
    if x_diff == 0.0 && y_diff == 0.0 {
        return [tip, tip];
    }

    let (slope, fix) = if x_diff == 0.0 {
        (if y_diff > 0.0 { FRAC_PI_2 } else { -FRAC_PI_2 }, 1.0)
    } else {
        (
            (y_diff / x_diff).atan(),
            if x_diff < 0.0 { -1.0 } else { 1.0 },
        )
    };

    let wing = |angle: f64| {
        Point::new(
            tip.x - angle.cos() * radius * fix,
            tip.y + angle.sin() * radius * fix,
        )
    };
    [wing(slope + FRAC_PI_6), wing(slope - FRAC_PI_6)]
}

/// Append an arrow head at the end of `path`.
///
/// Drawn as `M w1 L tip L w2 L w1 L tip` so the path still ends at the tip.
pub fn append_arrow(path: &mut BezPath, tip: Point, previous: Point, radius: f64) {
    let [w1, w2] = arrow_head(tip, previous, radius);
    path.move_to(w1);
    path.line_to(tip);
    path.line_to(w2);
    path.line_to(w1);
    path.line_to(tip);
}

/// Path for an open line: optionally smoothed, optionally arrow-terminated.
///
/// `arrow` carries the arrow radius when a head should be drawn.
pub fn line_path(points: &[Point], smooth: bool, arrow: Option<f64>) -> BezPath {
    if points.len() < 2 {
        return BezPath::new();
    }
    let mut path = if smooth {
        smooth_path(points)
    } else {
        straight_path(points, false)
    };
    if let Some(radius) = arrow {
        let n = points.len();
        append_arrow(&mut path, points[n - 1], points[n - 2], radius);
    }
    path
}

/// Render a path as an SVG path string, e.g. `M1,2 L3,4 Z`.
pub fn to_svg(path: &BezPath) -> String {
    path.elements()
        .iter()
        .map(|el| match el {
            PathEl::MoveTo(p) => format!("M{},{}", p.x, p.y),
            PathEl::LineTo(p) => format!("L{},{}", p.x, p.y),
            PathEl::QuadTo(c, p) => format!("Q{},{} {},{}", c.x, c.y, p.x, p.y),
            PathEl::CurveTo(c1, c2, p) => {
                format!("C{},{} {},{} {},{}", c1.x, c1.y, c2.x, c2.y, p.x, p.y)
            }
            PathEl::ClosePath => "Z".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Axis-aligned bounds of a vertex list.
pub fn bounds(points: &[Point]) -> Option<Rect> {
    let first = *points.first()?;
    Some(
        points
            .iter()
            .fold(Rect::from_points(first, first), |r, &p| r.union_pt(p)),
    )
}

/// Centre of the vertex bounds; where shape labels are anchored.
pub fn bounds_center(points: &[Point]) -> Option<Point> {
    bounds(points).map(|r| r.center())
}

/// Distance from a point to a line segment.
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let rel = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return rel.hypot();
    }
    let t = (rel.dot(seg) / len_sq).clamp(0.0, 1.0);
    (point - (a + seg * t)).hypot()
}

/// Minimum distance from a point to a polyline.
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    points
        .windows(2)
        .map(|w| point_to_segment_dist(point, w[0], w[1]))
        .fold(f64::INFINITY, f64::min)
}

/// Translate every point by `delta`.
pub fn translate_points(points: &mut [Point], delta: Vec2) {
    for p in points {
        *p += delta;
    }
}
