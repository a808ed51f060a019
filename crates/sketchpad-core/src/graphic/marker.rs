//! Static markers: locked circles, rectangles and images with a label.

use super::ShapeId;
use crate::color::CssColor;
use crate::config::TextStyle;
use crate::data::MarkerData;
use crate::error::{SketchError, SketchResult};
use crate::events::{GraphInfo, GraphKind};
use crate::surface::{
    Cursor, DisplayList, DisplayObject, Drawable, ObjectId, ObjectRole, ObjectTag, Paint,
};
use kurbo::{Point, Rect, Size, Vec2};
use log::debug;
use std::str::FromStr;

const DEFAULT_RADIUS: f64 = 5.0;
const DEFAULT_SIDE: f64 = 10.0;
const DEFAULT_GROUP: &str = "static";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Image,
    Rect,
    Circle,
}

impl FromStr for MarkerKind {
    type Err = SketchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(MarkerKind::Image),
            "rect" => Ok(MarkerKind::Rect),
            "circle" => Ok(MarkerKind::Circle),
            other => Err(SketchError::InvalidMarkerType(other.to_string())),
        }
    }
}

/// A non-editable marker centred on a fixed point. It never enters the
/// drawing lifecycle and has no vertex handles.
#[derive(Debug, Clone)]
pub struct StaticGraphic {
    id: ShapeId,
    name: Option<String>,
    group: String,
    kind: MarkerKind,
    evented: bool,
    hidden: bool,
    center: Point,
    graph: ObjectId,
    text: Option<ObjectId>,
}

impl StaticGraphic {
    /// Build the marker and its label on `surface`. `(x, y)` in `data` are
    /// fractions of `size`.
    pub(crate) fn build(
        data: &MarkerData,
        group: Option<&str>,
        size: Size,
        text_style: &TextStyle,
        surface: &mut DisplayList,
    ) -> SketchResult<Self> {
        let kind: MarkerKind = data.kind.parse()?;
        let center = Point::new(data.x * size.width, data.y * size.height);
        let evented = data.evented.unwrap_or(true);

        let box_rect = || {
            Rect::from_center_size(
                center,
                Size::new(
                    data.width.unwrap_or(DEFAULT_SIDE),
                    data.height.unwrap_or(DEFAULT_SIDE),
                ),
            )
        };
        let drawable = match kind {
            MarkerKind::Circle => Drawable::Circle {
                center,
                radius: data.radius.unwrap_or(DEFAULT_RADIUS),
            },
            MarkerKind::Rect => Drawable::Rect(box_rect()),
            MarkerKind::Image => Drawable::Image {
                rect: box_rect(),
                source: data.bg.clone().unwrap_or_default(),
            },
        };
        let paint = Paint {
            fill: data.fill,
            stroke: data.stroke,
            stroke_width: data.stroke_width.unwrap_or(1.0),
            ..Default::default()
        };
        let object = DisplayObject::new(drawable)
            .with_tag(ObjectTag::marker(&data.id, ObjectRole::Body))
            .with_paint(paint)
            .with_locked(true)
            .with_selectable(false)
            .with_evented(evented)
            .with_cursor(Cursor::Pointer);
        let graph = surface.add(object);

        let mut marker = Self {
            id: data.id.clone(),
            name: data.name.clone(),
            group: group.unwrap_or(DEFAULT_GROUP).to_string(),
            kind,
            evented,
            hidden: false,
            center,
            graph,
            text: None,
        };
        marker.render_text(text_style, surface);
        debug!("Placed {:?} marker {}", kind, marker.id);
        Ok(marker)
    }

    pub fn id(&self) -> &ShapeId {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn kind(&self) -> MarkerKind {
        self.kind
    }

    pub fn evented(&self) -> bool {
        self.evented
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn graph_object(&self) -> ObjectId {
        self.graph
    }

    pub fn label_object(&self) -> Option<ObjectId> {
        self.text
    }

    pub fn info(&self) -> GraphInfo {
        GraphInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            kind: GraphKind::Marker,
        }
    }

    fn render_text(&mut self, style: &TextStyle, surface: &mut DisplayList) {
        if let Some(old) = self.text.take() {
            surface.remove(old);
        }
        let Some(name) = self.name.clone() else {
            return;
        };
        if !style.show {
            return;
        }
        let label = DisplayObject::new(Drawable::Text {
            anchor: self.center,
            content: name,
            font_size: style.font_size,
        })
        .with_tag(ObjectTag::marker(&self.id, ObjectRole::Label))
        .with_paint(Paint {
            fill: Some(style.color),
            stroke: Some(CssColor::black()),
            stroke_width: 0.5,
            ..Default::default()
        })
        .with_visible(!self.hidden)
        .with_evented(false)
        .with_locked(true);
        self.text = Some(surface.add(label));
    }

    pub(crate) fn set_name(
        &mut self,
        name: Option<String>,
        style: &TextStyle,
        surface: &mut DisplayList,
    ) {
        self.name = name;
        self.render_text(style, surface);
    }

    pub(crate) fn restyle_text(&mut self, style: &TextStyle, surface: &mut DisplayList) {
        self.render_text(style, surface);
    }

    pub(crate) fn set_hidden(&mut self, hidden: bool, surface: &mut DisplayList) {
        self.hidden = hidden;
        surface.set_visible(self.graph, !hidden);
        if let Some(text) = self.text {
            surface.set_visible(text, !hidden);
        }
    }

    /// Keep the marker at the same fractional position after a resize.
    pub(crate) fn rescale(&mut self, sx: f64, sy: f64, surface: &mut DisplayList) {
        let center = Point::new(self.center.x * sx, self.center.y * sy);
        let delta: Vec2 = center - self.center;
        self.center = center;
        surface.translate(self.graph, delta);
        if let Some(text) = self.text {
            surface.set_position(text, center);
        }
    }

    pub(crate) fn destroy(&mut self, surface: &mut DisplayList) {
        surface.remove(self.graph);
        if let Some(text) = self.text.take() {
            surface.remove(text);
        }
        debug!("Removed marker {}", self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(kind: &str) -> MarkerData {
        MarkerData {
            id: ShapeId::from("m1"),
            kind: kind.to_string(),
            name: Some("Gate".to_string()),
            evented: None,
            x: 0.5,
            y: 0.25,
            width: Some(20.0),
            height: None,
            radius: None,
            fill: None,
            stroke: None,
            stroke_width: None,
            bg: Some("gate.png".to_string()),
        }
    }

    fn surface() -> DisplayList {
        DisplayList::new(Size::new(400.0, 200.0))
    }

    fn build(
        data: &MarkerData,
        group: Option<&str>,
        surface: &mut DisplayList,
    ) -> SketchResult<StaticGraphic> {
        StaticGraphic::build(data, group, surface.size(), &TextStyle::default(), surface)
    }

    #[test]
    fn test_build_circle_centred() {
        let mut surface = surface();
        let m = build(&marker("circle"), None, &mut surface).unwrap();
        assert_eq!(m.center(), Point::new(200.0, 50.0));
        assert_eq!(m.group(), "static");
        assert!(m.evented());

        let body = surface.get(m.graph_object()).unwrap();
        assert_eq!(
            body.drawable,
            Drawable::Circle {
                center: Point::new(200.0, 50.0),
                radius: 5.0
            }
        );
        assert!(body.locked);
        assert!(!body.draggable());
        assert_eq!(surface.anchor(m.label_object().unwrap()), Some(Point::new(200.0, 50.0)));
    }

    #[test]
    fn test_build_image_uses_defaults_for_missing_size() {
        let mut surface = surface();
        let m = build(&marker("image"), Some("cams"), &mut surface).unwrap();
        assert_eq!(m.group(), "cams");
        match &surface.get(m.graph_object()).unwrap().drawable {
            Drawable::Image { rect, source } => {
                assert_eq!(*rect, Rect::new(190.0, 45.0, 210.0, 55.0));
                assert_eq!(source, "gate.png");
            }
            other => panic!("expected image, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let mut surface = surface();
        let result = build(&marker("star"), None, &mut surface);
        assert!(matches!(result, Err(SketchError::InvalidMarkerType(t)) if t == "star"));
        assert!(surface.is_empty());
    }

    #[test]
    fn test_hide_and_destroy() {
        let mut surface = surface();
        let mut m = build(&marker("rect"), None, &mut surface).unwrap();
        m.set_hidden(true, &mut surface);
        assert!(surface.objects().iter().all(|o| !o.visible));

        m.destroy(&mut surface);
        assert!(surface.is_empty());
    }

    #[test]
    fn test_rescale_keeps_fraction() {
        let mut surface = surface();
        let mut m = build(&marker("rect"), None, &mut surface).unwrap();
        m.rescale(2.0, 2.0, &mut surface);
        assert_eq!(m.center(), Point::new(400.0, 100.0));
        assert_eq!(
            surface.get(m.graph_object()).unwrap().drawable.bounds(),
            Rect::new(390.0, 95.0, 410.0, 105.0)
        );
    }
}
