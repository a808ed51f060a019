//! Open stroked lines, optionally smoothed and arrow-tipped.

use super::{DrawType, GraphicBehavior};
use crate::color::CssColor;
use crate::config::SketchConfig;
use crate::geometry::line_path;
use crate::surface::{Glow, Paint};
use kurbo::{BezPath, Point};

const DRAWING_STROKE: CssColor = CssColor::new(0, 0, 0, 115);

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub stroke: CssColor,
    pub stroke_width: f64,
    /// Per-line override of the container's `smooth` option.
    pub smooth: Option<bool>,
}

impl Line {
    pub const DEFAULT_STROKE: CssColor = CssColor::rgb(255, 213, 145);
    pub const DEFAULT_STROKE_WIDTH: f64 = 6.0;

    /// Styling for a new line: explicit values first, then the config.
    pub fn styled(
        stroke: Option<CssColor>,
        stroke_width: Option<f64>,
        config: &SketchConfig,
    ) -> Self {
        Self {
            stroke: stroke.or(config.stroke).unwrap_or(Self::DEFAULT_STROKE),
            stroke_width: stroke_width
                .or(config.stroke_width)
                .unwrap_or(Self::DEFAULT_STROKE_WIDTH),
            smooth: None,
        }
    }
}

impl Default for Line {
    fn default() -> Self {
        Self {
            stroke: Self::DEFAULT_STROKE,
            stroke_width: Self::DEFAULT_STROKE_WIDTH,
            smooth: None,
        }
    }
}

impl GraphicBehavior for Line {
    fn draw_type(&self) -> DrawType {
        DrawType::Line
    }

    fn min_dots(&self) -> usize {
        2
    }

    fn path_geometry(&self, points: &[Point], closed: bool, config: &SketchConfig) -> BezPath {
        let smooth = self.smooth.unwrap_or(config.smooth);
        // The arrow only appears once the line is finished.
        let arrow = (closed && config.arrow_show).then_some(config.arrow_radius);
        line_path(points, smooth, arrow)
    }

    fn path_paint(&self, closed: bool) -> Paint {
        if closed {
            Paint {
                stroke: Some(self.stroke),
                stroke_width: self.stroke_width,
                ..Default::default()
            }
        } else {
            Paint {
                stroke: Some(DRAWING_STROKE),
                stroke_width: 2.0,
                ..Default::default()
            }
        }
    }

    fn brighten(&self, paint: &mut Paint) {
        let stroke = self.stroke.darken(0.1);
        paint.stroke = Some(stroke);
        paint.glow = Some(Glow {
            color: stroke,
            blur: 6.0,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::PathEl;

    fn points() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(20.0, 20.0),
            Point::new(40.0, 0.0),
        ]
    }

    fn count_moves(path: &BezPath) -> usize {
        path.elements()
            .iter()
            .filter(|el| matches!(el, PathEl::MoveTo(_)))
            .count()
    }

    #[test]
    fn test_styled_precedence() {
        let mut config = SketchConfig::default();
        let line = Line::styled(None, None, &config);
        assert_eq!(line.stroke, Line::DEFAULT_STROKE);
        assert!((line.stroke_width - 6.0).abs() < f64::EPSILON);

        config.stroke = Some(CssColor::black());
        config.stroke_width = Some(2.0);
        let line = Line::styled(Some(CssColor::white()), None, &config);
        assert_eq!(line.stroke, CssColor::white());
        assert!((line.stroke_width - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_arrow_only_when_closed_and_enabled() {
        let line = Line::default();
        let mut config = SketchConfig::default();
        assert_eq!(count_moves(&line.path_geometry(&points(), true, &config)), 1);

        config.arrow_show = true;
        assert_eq!(count_moves(&line.path_geometry(&points(), false, &config)), 1);
        assert_eq!(count_moves(&line.path_geometry(&points(), true, &config)), 2);
    }

    #[test]
    fn test_smooth_override() {
        let mut line = Line::default();
        let config = SketchConfig::default();
        let smoothed = line.path_geometry(&points(), true, &config);
        assert!(smoothed.elements().iter().any(|el| matches!(el, PathEl::QuadTo(..))));

        line.smooth = Some(false);
        let straight = line.path_geometry(&points(), true, &config);
        assert!(straight.elements().iter().all(|el| !matches!(el, PathEl::QuadTo(..))));
    }

    #[test]
    fn test_paint_has_no_fill() {
        let line = Line::default();
        assert!(line.path_paint(true).fill.is_none());
        assert!(line.path_paint(false).fill.is_none());
        assert!((line.path_paint(false).stroke_width - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_brighten_darkens_stroke() {
        let line = Line::default();
        let mut paint = line.path_paint(true);
        line.brighten(&mut paint);
        let darker = Line::DEFAULT_STROKE.darken(0.1);
        assert_eq!(paint.stroke, Some(darker));
        assert_eq!(paint.glow.map(|g| g.color), Some(darker));
    }
}
