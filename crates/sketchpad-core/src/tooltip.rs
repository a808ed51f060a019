//! Tooltip model. The host decides how to draw it.

use kurbo::Point;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tooltip {
    pub content: String,
    /// Screen position of the anchor point.
    pub position: Point,
    pub visible: bool,
}

impl Tooltip {
    pub fn new(content: impl Into<String>, position: Point) -> Self {
        Self {
            content: content.into(),
            position,
            visible: true,
        }
    }

    pub fn show_at(&mut self, position: Point) {
        self.position = position;
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }
}
