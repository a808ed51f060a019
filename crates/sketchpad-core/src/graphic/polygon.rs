//! Filled polygon shapes.

use super::{DrawType, GraphicBehavior};
use crate::color::CssColor;
use crate::config::SketchConfig;
use crate::geometry::straight_path;
use crate::surface::{Glow, Paint};
use kurbo::{BezPath, Point};

const DRAWING_STROKE: CssColor = CssColor::new(0, 0, 0, 191);
const DRAWING_FILL: CssColor = CssColor::new(255, 255, 255, 191);

/// A closed, filled region.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub fill: CssColor,
}

impl Polygon {
    /// Fill used when neither the data nor the config provides one.
    pub const DEFAULT_FILL: CssColor = CssColor::new(255, 255, 0, 191);

    pub fn new(fill: CssColor) -> Self {
        Self { fill }
    }
}

impl Default for Polygon {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FILL)
    }
}

impl GraphicBehavior for Polygon {
    fn draw_type(&self) -> DrawType {
        DrawType::Polygon
    }

    fn min_dots(&self) -> usize {
        3
    }

    fn path_geometry(&self, points: &[Point], _closed: bool, _config: &SketchConfig) -> BezPath {
        straight_path(points, true)
    }

    fn path_paint(&self, closed: bool) -> Paint {
        if closed {
            Paint {
                fill: Some(self.fill),
                ..Default::default()
            }
        } else {
            Paint {
                fill: Some(DRAWING_FILL),
                stroke: Some(DRAWING_STROKE),
                stroke_width: 1.0,
                ..Default::default()
            }
        }
    }

    fn brighten(&self, paint: &mut Paint) {
        paint.fill = Some(self.fill.darken(0.1));
        paint.glow = Some(Glow {
            color: self.fill,
            blur: 6.0,
        });
    }
}
