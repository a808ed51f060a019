//! Editable shapes and their lifecycle.
//!
//! A [`Graphic`] starts out drawing (growing by clicks), closes into an
//! editable shape, and is destroyed by the container. Variant-specific
//! geometry and styling live behind [`GraphicBehavior`].

mod line;
mod marker;
mod polygon;

pub use line::Line;
pub use marker::{MarkerKind, StaticGraphic};
pub use polygon::Polygon;

use crate::camera::Camera;
use crate::color::CssColor;
use crate::config::{Formatter, FormatterInput, SketchConfig};
use crate::data::GraphicData;
use crate::error::SketchError;
use crate::events::{DotInfo, EventBus, GraphInfo, GraphKind, SketchEvent};
use crate::geometry::{bounds_center, translate_points};
use crate::surface::{
    Cursor, DisplayList, DisplayObject, Drawable, Glow, ObjectId, ObjectRole, ObjectTag, Paint,
};
use crate::tooltip::Tooltip;
use kurbo::{BezPath, Point, Size, Vec2};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for shapes, random or supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(String);

impl ShapeId {
    pub fn random() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ShapeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ShapeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which shape a click on empty surface starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawType {
    #[default]
    Polygon,
    Line,
}

impl DrawType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DrawType::Polygon => "polygon",
            DrawType::Line => "line",
        }
    }
}

impl FromStr for DrawType {
    type Err = SketchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "polygon" => Ok(DrawType::Polygon),
            "line" => Ok(DrawType::Line),
            other => Err(SketchError::InvalidDrawType(other.to_string())),
        }
    }
}

impl fmt::Display for DrawType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<DrawType> for GraphKind {
    fn from(draw_type: DrawType) -> Self {
        match draw_type {
            DrawType::Polygon => GraphKind::Polygon,
            DrawType::Line => GraphKind::Line,
        }
    }
}

/// Variant hooks used by the shared lifecycle code.
pub trait GraphicBehavior {
    fn draw_type(&self) -> DrawType;

    /// Vertex count a shape needs to survive closing.
    fn min_dots(&self) -> usize;

    /// Path through `points`. `closed` is false for the drawing preview.
    fn path_geometry(&self, points: &[Point], closed: bool, config: &SketchConfig) -> BezPath;

    /// Base appearance, before selection or shadow treatment.
    fn path_paint(&self, closed: bool) -> Paint;

    /// Highlight applied while selected.
    fn brighten(&self, paint: &mut Paint);
}

/// Enum wrapper over the editable shape variants.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphicKind {
    Polygon(Polygon),
    Line(Line),
}

impl GraphicKind {
    /// Styling for a new interactive shape; `index` selects the palette entry.
    pub fn for_draw_type(draw_type: DrawType, config: &SketchConfig, index: usize) -> Self {
        match draw_type {
            DrawType::Polygon => GraphicKind::Polygon(Polygon::new(
                config.fill_for(index).unwrap_or(Polygon::DEFAULT_FILL),
            )),
            DrawType::Line => GraphicKind::Line(Line::styled(None, None, config)),
        }
    }

    /// Styling for a shape loaded from data. Explicit colors win over the
    /// palette.
    pub fn for_data(
        draw_type: DrawType,
        item: &GraphicData,
        config: &SketchConfig,
        index: usize,
    ) -> Self {
        match draw_type {
            DrawType::Polygon => GraphicKind::Polygon(Polygon::new(
                item.fill
                    .or_else(|| config.fill_for(index))
                    .unwrap_or(Polygon::DEFAULT_FILL),
            )),
            DrawType::Line => {
                let mut line = Line::styled(item.stroke, item.stroke_width, config);
                line.smooth = item.smooth;
                GraphicKind::Line(line)
            }
        }
    }

    /// Per-line smoothing override, if one was set.
    pub fn smooth(&self) -> Option<bool> {
        match self {
            GraphicKind::Line(line) => line.smooth,
            GraphicKind::Polygon(_) => None,
        }
    }

    pub fn fill(&self) -> Option<CssColor> {
        match self {
            GraphicKind::Polygon(p) => Some(p.fill),
            GraphicKind::Line(_) => None,
        }
    }

    pub fn stroke(&self) -> Option<(CssColor, f64)> {
        match self {
            GraphicKind::Polygon(_) => None,
            GraphicKind::Line(l) => Some((l.stroke, l.stroke_width)),
        }
    }

    pub fn is_line(&self) -> bool {
        matches!(self, GraphicKind::Line(_))
    }
}

impl GraphicBehavior for GraphicKind {
    fn draw_type(&self) -> DrawType {
        match self {
            GraphicKind::Polygon(s) => s.draw_type(),
            GraphicKind::Line(s) => s.draw_type(),
        }
    }

    fn min_dots(&self) -> usize {
        match self {
            GraphicKind::Polygon(s) => s.min_dots(),
            GraphicKind::Line(s) => s.min_dots(),
        }
    }

    fn path_geometry(&self, points: &[Point], closed: bool, config: &SketchConfig) -> BezPath {
        match self {
            GraphicKind::Polygon(s) => s.path_geometry(points, closed, config),
            GraphicKind::Line(s) => s.path_geometry(points, closed, config),
        }
    }

    fn path_paint(&self, closed: bool) -> Paint {
        match self {
            GraphicKind::Polygon(s) => s.path_paint(closed),
            GraphicKind::Line(s) => s.path_paint(closed),
        }
    }

    fn brighten(&self, paint: &mut Paint) {
        match self {
            GraphicKind::Polygon(s) => s.brighten(paint),
            GraphicKind::Line(s) => s.brighten(paint),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Drawing,
    Closed,
}

/// Which gesture families a shape currently reacts to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Listeners {
    /// Clicks, moves and close gestures while drawing.
    pub drawing: bool,
    /// Vertex and body drags while active.
    pub closed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Created,
    /// Too few vertices; the shape destroyed itself.
    Discarded,
    AlreadyClosed,
}

/// Everything a shape touches outside itself while reacting to input.
pub(crate) struct Ctx<'a> {
    pub surface: &'a mut DisplayList,
    pub config: &'a SketchConfig,
    pub events: &'a mut EventBus,
    pub camera: &'a Camera,
    pub formatter: Option<&'a Formatter>,
}

/// Fields a closed shape is rebuilt from.
pub(crate) struct Seed {
    pub id: ShapeId,
    pub name: Option<String>,
    pub group: Option<String>,
    pub evented: bool,
    pub dots: Vec<Point>,
    pub data: Option<serde_json::Value>,
}

const DEFAULT_GROUP: &str = "default";
const HANDLE_STROKE: CssColor = CssColor::rgb(221, 221, 221);
const FOCUSED_HANDLE_FILL: CssColor = CssColor::rgb(255, 240, 240);
const FOCUSED_HANDLE_STROKE: CssColor = CssColor::rgb(0, 0, 255);

/// A polygon or line on the surface.
#[derive(Debug, Clone)]
pub struct Graphic {
    id: ShapeId,
    name: Option<String>,
    group: String,
    kind: GraphicKind,
    phase: Phase,
    active: bool,
    selected: bool,
    hidden: bool,
    evented: bool,
    dots: Vec<Point>,
    move_pointer: Option<Point>,
    listeners: Listeners,
    path: Option<ObjectId>,
    path_anchor: Option<Point>,
    vertexes: Vec<ObjectId>,
    text: Option<ObjectId>,
    focused_vertex: Option<usize>,
    tooltip: Option<Tooltip>,
    data: Option<serde_json::Value>,
}

impl Graphic {
    fn blank(id: ShapeId, kind: GraphicKind, phase: Phase) -> Self {
        Self {
            id,
            name: None,
            group: DEFAULT_GROUP.to_string(),
            kind,
            phase,
            active: false,
            selected: false,
            hidden: false,
            evented: true,
            dots: Vec::new(),
            move_pointer: None,
            listeners: Listeners::default(),
            path: None,
            path_anchor: None,
            vertexes: Vec::new(),
            text: None,
            focused_vertex: None,
            tooltip: None,
            data: None,
        }
    }

    /// Start drawing a shape seeded with its first vertex.
    pub(crate) fn new_drawing(kind: GraphicKind, start: Point) -> Self {
        let mut graphic = Self::blank(ShapeId::random(), kind, Phase::Drawing);
        graphic.active = true;
        graphic.listeners.drawing = true;
        graphic.make_start_dot(start);
        debug!("Started drawing {} {}", graphic.draw_type(), graphic.id);
        graphic
    }

    /// Build an already-closed shape and render it.
    pub(crate) fn from_seed(kind: GraphicKind, seed: Seed, ctx: &mut Ctx<'_>) -> Self {
        let mut graphic = Self::blank(seed.id, kind, Phase::Closed);
        graphic.name = seed.name;
        if let Some(group) = seed.group {
            graphic.group = group;
        }
        graphic.evented = seed.evented;
        graphic.dots = seed.dots;
        graphic.data = seed.data;
        graphic.listeners.closed = true;
        graphic.render_path(ctx);
        graphic.render_text(ctx);
        graphic.update_state(ctx);
        graphic
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

    pub fn kind(&self) -> &GraphicKind {
        &self.kind
    }

    pub fn draw_type(&self) -> DrawType {
        self.kind.draw_type()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_closed(&self) -> bool {
        self.phase == Phase::Closed
    }

    pub fn is_drawing(&self) -> bool {
        self.phase == Phase::Drawing
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn evented(&self) -> bool {
        self.evented
    }

    pub fn dots(&self) -> &[Point] {
        &self.dots
    }

    pub fn move_pointer(&self) -> Option<Point> {
        self.move_pointer
    }

    pub fn listeners(&self) -> Listeners {
        self.listeners
    }

    pub fn data(&self) -> Option<&serde_json::Value> {
        self.data.as_ref()
    }

    pub fn set_data(&mut self, data: Option<serde_json::Value>) {
        self.data = data;
    }

    pub fn path_object(&self) -> Option<ObjectId> {
        self.path
    }

    pub fn vertex_objects(&self) -> &[ObjectId] {
        &self.vertexes
    }

    pub fn label_object(&self) -> Option<ObjectId> {
        self.text
    }

    pub fn focused_vertex(&self) -> Option<usize> {
        self.focused_vertex
    }

    /// Per-line tooltip anchored at the last vertex, when shown.
    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.tooltip.as_ref()
    }

    pub fn info(&self) -> GraphInfo {
        GraphInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            kind: self.draw_type().into(),
        }
    }

    pub fn formatter_input(&self) -> FormatterInput<'_> {
        FormatterInput {
            id: &self.id,
            name: self.name.as_deref(),
            data: self.data.as_ref(),
            dots: &self.dots,
        }
    }

    /// Vertices as fractions of `size`.
    pub fn to_fractional(&self, size: Size) -> Vec<Point> {
        let fraction = |value: f64, extent: f64| if extent > 0.0 { value / extent } else { 0.0 };
        self.dots
            .iter()
            .map(|p| Point::new(fraction(p.x, size.width), fraction(p.y, size.height)))
            .collect()
    }

    /// Serializable form, with vertices as fractions of `size`.
    pub fn to_data(&self, size: Size) -> GraphicData {
        let (stroke, stroke_width) = self.kind.stroke().unzip();
        GraphicData {
            id: self.id.clone(),
            name: self.name.clone(),
            evented: Some(self.evented),
            fill: self.kind.fill(),
            stroke,
            stroke_width,
            smooth: self.kind.smooth(),
            path: self.to_fractional(size),
            data: self.data.clone(),
            group: Some(self.group.clone()),
        }
    }

    fn make_start_dot(&mut self, point: Point) {
        self.dots.clear();
        self.push_dot(point);
    }

    /// Append unless it repeats the last vertex.
    fn push_dot(&mut self, point: Point) -> bool {
        if self.dots.last() == Some(&point) {
            return false;
        }
        self.dots.push(point);
        true
    }

    /// Commit a clicked vertex while drawing.
    pub(crate) fn add_dot(&mut self, point: Point, ctx: &mut Ctx<'_>) -> bool {
        if !self.listeners.drawing || !self.push_dot(point) {
            return false;
        }
        self.render_path(ctx);
        if self.kind.is_line() {
            ctx.events.emit(&SketchEvent::AddDot(DotInfo {
                id: self.id.clone(),
                index: self.dots.len() - 1,
                point,
            }));
        }
        true
    }

    /// Track the pointer while drawing.
    pub(crate) fn on_move(&mut self, point: Point, ctx: &mut Ctx<'_>) {
        if !self.listeners.drawing {
            return;
        }
        self.move_pointer = Some(point);
        self.render_path(ctx);
    }

    /// Finish drawing: commit the pending pointer, then either become an
    /// active closed shape or destroy the degenerate result.
    pub(crate) fn close(&mut self, ctx: &mut Ctx<'_>) -> CloseOutcome {
        if self.is_closed() {
            return CloseOutcome::AlreadyClosed;
        }
        self.phase = Phase::Closed;
        if let Some(pointer) = self.move_pointer.take() {
            self.push_dot(pointer);
        }
        if self.dots.len() < self.kind.min_dots() {
            debug!(
                "Discarding {} {} with {} vertices",
                self.draw_type(),
                self.id,
                self.dots.len()
            );
            self.destroy(ctx);
            return CloseOutcome::Discarded;
        }

        self.active = true;
        self.listeners = Listeners {
            drawing: false,
            closed: true,
        };
        self.render_path(ctx);
        self.render_vertexes(ctx);
        self.render_text(ctx);
        debug!("Closed {} {}", self.draw_type(), self.id);
        ctx.events.emit(&SketchEvent::Create(self.info()));
        CloseOutcome::Created
    }

    fn render_points(&self) -> Vec<Point> {
        let mut points = self.dots.clone();
        if self.is_drawing() {
            points.extend(self.move_pointer);
        }
        points
    }

    fn paint(&self, config: &SketchConfig) -> Paint {
        let mut paint = self.kind.path_paint(self.is_closed());
        paint.opacity = config.path_opacity;
        if self.selected {
            self.kind.brighten(&mut paint);
        } else if self.is_closed() && !config.editable && config.has_shadow {
            paint.glow = Some(Glow {
                color: CssColor::white(),
                blur: 5.0,
            });
        }
        paint
    }

    /// Apply paint and pointer affordances to the path object.
    fn decorate(&self, object: &mut DisplayObject, config: &SketchConfig) {
        object.paint = self.paint(config);
        object.visible = !self.hidden;
        if self.is_drawing() {
            object.hover_cursor = Cursor::Crosshair;
            object.selectable = false;
            object.evented = true;
        } else {
            object.hover_cursor = if config.editable {
                Cursor::Move
            } else {
                Cursor::Pointer
            };
            object.selectable = config.editable;
            object.evented = self.evented;
        }
    }

    /// Recreate the path object from the current vertices.
    pub(crate) fn render_path(&mut self, ctx: &mut Ctx<'_>) {
        if let Some(old) = self.path.take() {
            ctx.surface.remove(old);
        }
        self.path_anchor = None;
        let geometry = self
            .kind
            .path_geometry(&self.render_points(), self.is_closed(), ctx.config);
        if geometry.is_empty() {
            return;
        }
        let mut object = DisplayObject::new(Drawable::Path(geometry))
            .with_tag(ObjectTag::graphic(&self.id, ObjectRole::Path));
        self.decorate(&mut object, ctx.config);
        let id = ctx.surface.add(object);
        self.path = Some(id);
        self.path_anchor = ctx.surface.anchor(id);
        self.bring_path_to_front(ctx.surface);
        self.update_text_position(ctx.surface);
    }

    /// Restyle the path in place, keeping its geometry and stacking.
    fn restyle_path(&self, ctx: &mut Ctx<'_>) {
        let Some(object) = self.path.and_then(|id| ctx.surface.get_mut(id)) else {
            return;
        };
        self.decorate(object, ctx.config);
    }

    /// Put the path on top, but directly below the lowest of this shape's
    /// handles and label.
    fn bring_path_to_front(&self, surface: &mut DisplayList) {
        let Some(path) = self.path else {
            return;
        };
        surface.bring_to_front(path);
        let lowest = self
            .vertexes
            .iter()
            .copied()
            .chain(self.text)
            .filter_map(|id| surface.index_of(id))
            .min();
        if let Some(index) = lowest {
            surface.move_to(path, index);
        }
    }

    fn vertex_object(&self, index: usize, dot: Point, config: &SketchConfig) -> DisplayObject {
        let focused = self.focused_vertex == Some(index);
        let (radius, paint) = if focused {
            (
                config.ctl_size + 2.0,
                Paint {
                    fill: Some(FOCUSED_HANDLE_FILL),
                    stroke: Some(FOCUSED_HANDLE_STROKE),
                    stroke_width: 3.0,
                    ..Default::default()
                },
            )
        } else {
            (
                config.ctl_size,
                Paint {
                    stroke: Some(HANDLE_STROKE),
                    stroke_width: 3.0,
                    ..Default::default()
                },
            )
        };
        DisplayObject::new(Drawable::Circle {
            center: dot,
            radius,
        })
        .with_tag(ObjectTag::graphic(&self.id, ObjectRole::Vertex(index)))
        .with_paint(paint)
        .with_visible(!self.hidden)
        .with_selectable(true)
        .with_cursor(Cursor::Move)
    }

    /// Show one handle per vertex: rebuilt when the count changed,
    /// otherwise repositioned from the vertices and restacked on top.
    pub(crate) fn render_vertexes(&mut self, ctx: &mut Ctx<'_>) {
        if !self.vertexes.is_empty() && self.vertexes.len() == self.dots.len() {
            for (&handle, &dot) in self.vertexes.iter().zip(&self.dots) {
                ctx.surface.set_position(handle, dot);
                ctx.surface.bring_to_front(handle);
            }
            return;
        }
        self.remove_vertexes(ctx.surface);
        for (index, &dot) in self.dots.iter().enumerate() {
            let handle = ctx.surface.add(self.vertex_object(index, dot, ctx.config));
            self.vertexes.push(handle);
        }
    }

    /// Recreate the handles from scratch, e.g. after the handle size changed.
    pub(crate) fn rebuild_vertexes(&mut self, ctx: &mut Ctx<'_>) {
        if self.vertexes.is_empty() {
            return;
        }
        self.remove_vertexes(ctx.surface);
        self.render_vertexes(ctx);
        self.bring_path_to_front(ctx.surface);
    }

    fn remove_vertexes(&mut self, surface: &mut DisplayList) {
        for handle in self.vertexes.drain(..) {
            surface.remove(handle);
        }
    }

    /// Recreate the name label at the centre of the vertex bounds.
    pub(crate) fn render_text(&mut self, ctx: &mut Ctx<'_>) {
        if let Some(old) = self.text.take() {
            ctx.surface.remove(old);
        }
        let style = &ctx.config.text_style;
        if !style.show {
            return;
        }
        let (Some(name), Some(anchor)) = (&self.name, bounds_center(&self.dots)) else {
            return;
        };
        let label = DisplayObject::new(Drawable::Text {
            anchor,
            content: name.clone(),
            font_size: style.font_size,
        })
        .with_tag(ObjectTag::graphic(&self.id, ObjectRole::Label))
        .with_paint(Paint {
            fill: Some(style.color),
            stroke: Some(CssColor::black()),
            stroke_width: 0.5,
            ..Default::default()
        })
        .with_visible(!self.hidden)
        .with_evented(false);
        self.text = Some(ctx.surface.add(label));
    }

    fn update_text_position(&self, surface: &mut DisplayList) {
        if let (Some(text), Some(center)) = (self.text, bounds_center(&self.dots)) {
            surface.set_position(text, center);
        }
    }

    /// A vertex handle was dragged by `delta`. The handle is the source of
    /// truth: the vertex is synced from its new position.
    pub(crate) fn on_vertex_moving(
        &mut self,
        index: usize,
        delta: Vec2,
        ctx: &mut Ctx<'_>,
    ) -> bool {
        if !self.active || !ctx.config.editable || !self.listeners.closed {
            return false;
        }
        let Some(&handle) = self.vertexes.get(index) else {
            return false;
        };
        ctx.surface.translate(handle, delta);
        let (Some(position), Some(dot)) = (ctx.surface.anchor(handle), self.dots.get_mut(index))
        else {
            return false;
        };
        *dot = position;
        self.render_path(ctx);
        self.refresh_tooltip_position(ctx.camera);
        true
    }

    /// The path body was dragged by `delta`; every vertex follows.
    pub(crate) fn on_path_moving(&mut self, delta: Vec2, ctx: &mut Ctx<'_>) -> bool {
        if !self.active || !ctx.config.editable || !self.listeners.closed {
            return false;
        }
        let (Some(path), Some(previous)) = (self.path, self.path_anchor) else {
            return false;
        };
        ctx.surface.translate(path, delta);
        let Some(anchor) = ctx.surface.anchor(path) else {
            return false;
        };
        translate_points(&mut self.dots, anchor - previous);
        self.render_vertexes(ctx);
        self.path_anchor = Some(anchor);
        self.update_text_position(ctx.surface);
        self.refresh_tooltip_position(ctx.camera);
        true
    }

    /// Take edit focus. Only allowed in editable mode.
    pub(crate) fn focus(&mut self, ctx: &mut Ctx<'_>) -> bool {
        if !ctx.config.editable {
            return false;
        }
        self.active = true;
        if self.is_closed() {
            self.listeners.closed = true;
        }
        self.render_vertexes(ctx);
        self.bring_path_to_front(ctx.surface);
        debug!("Focused {}", self.id);
        if self.kind.is_line() {
            ctx.events.emit(&SketchEvent::FocusPath(self.info()));
        }
        true
    }

    /// Drop edit focus and tear down the handles.
    pub(crate) fn blur(&mut self, ctx: &mut Ctx<'_>) {
        self.active = false;
        self.focused_vertex = None;
        self.listeners.closed = false;
        self.remove_vertexes(ctx.surface);
        debug!("Blurred {}", self.id);
    }

    /// Highlight one vertex handle of the active shape.
    pub(crate) fn focus_vertex(&mut self, index: usize, ctx: &mut Ctx<'_>) {
        if !self.active || index >= self.vertexes.len() {
            return;
        }
        let previous = self.focused_vertex.replace(index);
        for i in previous.into_iter().chain([index]) {
            let (Some(&handle), Some(&dot)) = (self.vertexes.get(i), self.dots.get(i)) else {
                continue;
            };
            let styled = self.vertex_object(i, dot, ctx.config);
            if let Some(object) = ctx.surface.get_mut(handle) {
                object.drawable = styled.drawable;
                object.paint = styled.paint;
            }
        }
        if let (true, Some(&point)) = (self.kind.is_line(), self.dots.get(index)) {
            ctx.events.emit(&SketchEvent::FocusDot(DotInfo {
                id: self.id.clone(),
                index,
                point,
            }));
        }
    }

    /// Remove the focused vertex of an active line, keeping at least the
    /// minimum vertex count.
    pub(crate) fn remove_focused_vertex(&mut self, ctx: &mut Ctx<'_>) -> Option<DotInfo> {
        if !self.kind.is_line() || !self.active || !ctx.config.editable {
            return None;
        }
        let index = self.focused_vertex?;
        if index >= self.dots.len() || self.dots.len() <= self.kind.min_dots() {
            return None;
        }
        let point = self.dots.remove(index);
        self.focused_vertex = None;
        self.remove_vertexes(ctx.surface);
        self.render_path(ctx);
        self.render_vertexes(ctx);
        self.refresh_tooltip_position(ctx.camera);

        let info = DotInfo {
            id: self.id.clone(),
            index,
            point,
        };
        ctx.events.emit(&SketchEvent::DelDot(info.clone()));
        Some(info)
    }

    pub(crate) fn select(&mut self, ctx: &mut Ctx<'_>) {
        self.selected = true;
        self.restyle_path(ctx);
    }

    pub(crate) fn unselect(&mut self, ctx: &mut Ctx<'_>) {
        self.selected = false;
        self.restyle_path(ctx);
    }

    /// Sync affordances with the container's edit mode.
    pub(crate) fn update_state(&mut self, ctx: &mut Ctx<'_>) {
        if ctx.config.editable {
            self.selected = false;
        } else {
            self.active = false;
        }
        self.restyle_path(ctx);
        self.refresh_tooltip(ctx);
    }

    pub(crate) fn set_hidden(&mut self, hidden: bool, ctx: &mut Ctx<'_>) {
        self.hidden = hidden;
        let owned = self.path.into_iter().chain(self.text).chain(self.vertexes.iter().copied());
        for object in owned {
            ctx.surface.set_visible(object, !hidden);
        }
        if let Some(tooltip) = &mut self.tooltip {
            tooltip.visible = !hidden;
        }
    }

    pub(crate) fn set_name(&mut self, name: Option<String>, ctx: &mut Ctx<'_>) {
        self.name = name;
        self.render_text(ctx);
        self.refresh_tooltip(ctx);
    }

    /// Scale every vertex, e.g. after the surface was resized.
    pub(crate) fn rescale(&mut self, sx: f64, sy: f64, ctx: &mut Ctx<'_>) {
        let scale = |p: &mut Point| {
            p.x *= sx;
            p.y *= sy;
        };
        self.dots.iter_mut().for_each(scale);
        self.move_pointer.iter_mut().for_each(scale);
        self.render_path(ctx);
        if !self.vertexes.is_empty() {
            self.render_vertexes(ctx);
            self.bring_path_to_front(ctx.surface);
        }
        self.update_text_position(ctx.surface);
        self.refresh_tooltip_position(ctx.camera);
    }

    /// Rebuild the anchored line tooltip: closed lines in read-only mode
    /// with a formatter and `always_show_tip`.
    pub(crate) fn refresh_tooltip(&mut self, ctx: &Ctx<'_>) {
        self.tooltip = None;
        let wanted = self.kind.is_line()
            && self.is_closed()
            && !ctx.config.editable
            && ctx.config.always_show_tip;
        let (true, Some(formatter), Some(&last)) = (wanted, ctx.formatter, self.dots.last()) else {
            return;
        };
        let content = formatter(&self.formatter_input());
        if content.is_empty() {
            return;
        }
        let mut tooltip = Tooltip::new(content, ctx.camera.world_to_screen(last));
        tooltip.visible = !self.hidden;
        self.tooltip = Some(tooltip);
    }

    /// Follow pan/zoom with the anchored tooltip.
    pub(crate) fn refresh_tooltip_position(&mut self, camera: &Camera) {
        if let (Some(tooltip), Some(&last)) = (&mut self.tooltip, self.dots.last()) {
            tooltip.position = camera.world_to_screen(last);
        }
    }

    /// Remove every display object and detach all listeners.
    pub(crate) fn destroy(&mut self, ctx: &mut Ctx<'_>) {
        if let Some(path) = self.path.take() {
            ctx.surface.remove(path);
        }
        if let Some(text) = self.text.take() {
            ctx.surface.remove(text);
        }
        self.remove_vertexes(ctx.surface);
        self.listeners = Listeners::default();
        self.active = false;
        self.selected = false;
        self.tooltip = None;
        debug!("Destroyed {} {}", self.draw_type(), self.id);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::events::EventKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Owned pieces a [`Ctx`] borrows from.
    pub(crate) struct Fixture {
        pub surface: DisplayList,
        pub config: SketchConfig,
        pub events: EventBus,
        pub camera: Camera,
        pub formatter: Option<Formatter>,
    }

    impl Fixture {
        pub fn new(editable: bool) -> Self {
            Self {
                surface: DisplayList::new(Size::new(800.0, 600.0)),
                config: SketchConfig {
                    editable,
                    ..Default::default()
                },
                events: EventBus::new(),
                camera: Camera::new(),
                formatter: None,
            }
        }

        pub fn ctx(&mut self) -> Ctx<'_> {
            Ctx {
                surface: &mut self.surface,
                config: &self.config,
                events: &mut self.events,
                camera: &self.camera,
                formatter: self.formatter.as_ref(),
            }
        }

        pub fn record(&mut self, kind: EventKind) -> Rc<RefCell<Vec<SketchEvent>>> {
            let seen = Rc::new(RefCell::new(Vec::new()));
            let sink = seen.clone();
            self.events
                .on(kind, move |event| sink.borrow_mut().push(event.clone()));
            seen
        }
    }

    fn draw(fx: &mut Fixture, kind: GraphicKind, points: &[(f64, f64)]) -> Graphic {
        let (x, y) = points[0];
        let mut graphic = Graphic::new_drawing(kind, Point::new(x, y));
        for &(x, y) in &points[1..] {
            graphic.add_dot(Point::new(x, y), &mut fx.ctx());
        }
        graphic
    }

    pub(crate) fn count_vertices(input: &FormatterInput<'_>) -> String {
        format!("{} vertices", input.dots.len())
    }

    fn seed(dots: Vec<Point>) -> Seed {
        Seed {
            id: ShapeId::from("seeded"),
            name: Some("zone".to_string()),
            group: None,
            evented: true,
            dots,
            data: None,
        }
    }

    fn square() -> Vec<Point> {
        vec![
            Point::new(10.0, 10.0),
            Point::new(50.0, 10.0),
            Point::new(50.0, 50.0),
            Point::new(10.0, 50.0),
        ]
    }

    #[test]
    fn test_draw_type_parse() {
        assert_eq!("line".parse::<DrawType>().unwrap(), DrawType::Line);
        assert!(matches!(
            "rectangle".parse::<DrawType>(),
            Err(SketchError::InvalidDrawType(t)) if t == "rectangle"
        ));
    }

    #[test]
    fn test_shape_id_random_is_simple_uuid() {
        let id = ShapeId::random();
        assert_eq!(id.as_str().len(), 32);
        assert_ne!(id, ShapeId::random());
    }

    #[test]
    fn test_polygon_with_two_vertices_is_discarded() {
        let mut fx = Fixture::new(true);
        let created = fx.record(EventKind::GraphCreate);
        let mut graphic = draw(&mut fx, GraphicKind::Polygon(Polygon::default()), &[(0.0, 0.0)]);
        graphic.on_move(Point::new(10.0, 10.0), &mut fx.ctx());
        assert!(graphic.path_object().is_some());

        assert_eq!(graphic.close(&mut fx.ctx()), CloseOutcome::Discarded);
        assert!(created.borrow().is_empty());
        assert!(fx.surface.is_empty());
        assert_eq!(graphic.listeners(), Listeners::default());
    }

    #[test]
    fn test_polygon_with_three_vertices_is_created() {
        let mut fx = Fixture::new(true);
        let created = fx.record(EventKind::GraphCreate);
        let mut graphic = draw(
            &mut fx,
            GraphicKind::Polygon(Polygon::default()),
            &[(0.0, 0.0), (40.0, 0.0)],
        );
        graphic.on_move(Point::new(20.0, 30.0), &mut fx.ctx());

        assert_eq!(graphic.close(&mut fx.ctx()), CloseOutcome::Created);
        assert!(graphic.is_closed());
        assert!(graphic.is_active());
        assert_eq!(graphic.dots().len(), 3);
        assert_eq!(graphic.vertex_objects().len(), 3);
        assert!(graphic.move_pointer().is_none());
        assert_eq!(
            graphic.listeners(),
            Listeners {
                drawing: false,
                closed: true
            }
        );

        let events = created.borrow();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].graph().map(|g| &g.id), Some(graphic.id()));

        assert_eq!(graphic.close(&mut fx.ctx()), CloseOutcome::AlreadyClosed);
        assert_eq!(created.borrow().len(), 1);
    }

    #[test]
    fn test_line_close_thresholds() {
        let mut fx = Fixture::new(true);
        let mut single = draw(&mut fx, GraphicKind::Line(Line::default()), &[(0.0, 0.0)]);
        assert_eq!(single.close(&mut fx.ctx()), CloseOutcome::Discarded);

        let mut pair = draw(&mut fx, GraphicKind::Line(Line::default()), &[(0.0, 0.0)]);
        pair.on_move(Point::new(30.0, 0.0), &mut fx.ctx());
        assert_eq!(pair.close(&mut fx.ctx()), CloseOutcome::Created);
        assert_eq!(pair.dots().len(), 2);
    }

    #[test]
    fn test_duplicate_point_is_noop() {
        let mut fx = Fixture::new(true);
        let dots = fx.record(EventKind::AddDot);
        let mut graphic = draw(
            &mut fx,
            GraphicKind::Line(Line::default()),
            &[(0.0, 0.0), (10.0, 10.0)],
        );
        assert_eq!(dots.borrow().len(), 1);
        let path_before = graphic.path_object();

        assert!(!graphic.add_dot(Point::new(10.0, 10.0), &mut fx.ctx()));
        assert_eq!(graphic.dots().len(), 2);
        assert_eq!(graphic.path_object(), path_before);
        assert_eq!(dots.borrow().len(), 1);
    }

    #[test]
    fn test_preview_includes_move_pointer_only_while_drawing() {
        let mut fx = Fixture::new(true);
        let mut graphic = draw(
            &mut fx,
            GraphicKind::Polygon(Polygon::default()),
            &[(0.0, 0.0), (40.0, 0.0)],
        );
        graphic.on_move(Point::new(20.0, 90.0), &mut fx.ctx());
        let path = graphic.path_object().unwrap();
        let bounds = fx.surface.get(path).unwrap().drawable.bounds();
        assert!((bounds.height() - 90.0).abs() < 1e-9);
        assert_eq!(graphic.dots().len(), 2);
        assert_eq!(
            fx.surface.get(path).unwrap().hover_cursor,
            Cursor::Crosshair
        );
    }

    #[test]
    fn test_blur_and_focus_handles() {
        let mut fx = Fixture::new(true);
        let mut graphic = Graphic::from_seed(
            GraphicKind::Polygon(Polygon::default()),
            seed(square()),
            &mut fx.ctx(),
        );
        assert!(!graphic.is_active());
        assert!(graphic.vertex_objects().is_empty());

        assert!(graphic.focus(&mut fx.ctx()));
        assert_eq!(graphic.vertex_objects().len(), 4);
        let path = graphic.path_object().unwrap();
        assert_eq!(fx.surface.index_of(path), Some(fx.surface.len() - 5));

        graphic.blur(&mut fx.ctx());
        assert!(!graphic.is_active());
        assert!(graphic.vertex_objects().is_empty());
        assert_eq!(fx.surface.len(), 2);
    }

    #[test]
    fn test_focus_requires_editable() {
        let mut fx = Fixture::new(false);
        let mut graphic = Graphic::from_seed(
            GraphicKind::Polygon(Polygon::default()),
            seed(square()),
            &mut fx.ctx(),
        );
        assert!(!graphic.focus(&mut fx.ctx()));
        assert!(!graphic.is_active());
        assert!(graphic.vertex_objects().is_empty());
    }

    #[test]
    fn test_vertex_drag_syncs_dot_from_handle() {
        let mut fx = Fixture::new(true);
        let mut graphic = Graphic::from_seed(
            GraphicKind::Polygon(Polygon::default()),
            seed(square()),
            &mut fx.ctx(),
        );
        graphic.focus(&mut fx.ctx());
        let handles = graphic.vertex_objects().to_vec();

        assert!(graphic.on_vertex_moving(2, Vec2::new(10.0, 5.0), &mut fx.ctx()));
        assert_eq!(graphic.dots()[2], Point::new(60.0, 55.0));
        assert_eq!(graphic.vertex_objects(), handles.as_slice());
        assert_eq!(fx.surface.anchor(handles[2]), Some(Point::new(60.0, 55.0)));
        assert_eq!(fx.surface.anchor(handles[0]), Some(Point::new(10.0, 10.0)));
    }

    #[test]
    fn test_path_drag_moves_every_dot() {
        let mut fx = Fixture::new(true);
        let mut graphic = Graphic::from_seed(
            GraphicKind::Polygon(Polygon::default()),
            seed(square()),
            &mut fx.ctx(),
        );
        graphic.focus(&mut fx.ctx());
        let label = graphic.label_object().unwrap();

        assert!(graphic.on_path_moving(Vec2::new(-5.0, 20.0), &mut fx.ctx()));
        assert_eq!(graphic.dots()[0], Point::new(5.0, 30.0));
        assert_eq!(graphic.dots()[2], Point::new(45.0, 70.0));
        let handle = graphic.vertex_objects()[2];
        assert_eq!(fx.surface.anchor(handle), Some(Point::new(45.0, 70.0)));
        assert_eq!(fx.surface.anchor(label), Some(Point::new(25.0, 50.0)));
    }

    #[test]
    fn test_drags_ignored_when_inactive() {
        let mut fx = Fixture::new(true);
        let mut graphic = Graphic::from_seed(
            GraphicKind::Polygon(Polygon::default()),
            seed(square()),
            &mut fx.ctx(),
        );
        assert!(!graphic.on_path_moving(Vec2::new(1.0, 1.0), &mut fx.ctx()));
        assert_eq!(graphic.dots(), square().as_slice());
    }

    #[test]
    fn test_select_brightens_and_unselect_restores() {
        let mut fx = Fixture::new(false);
        let mut graphic = Graphic::from_seed(
            GraphicKind::Polygon(Polygon::default()),
            seed(square()),
            &mut fx.ctx(),
        );
        let path = graphic.path_object().unwrap();

        graphic.select(&mut fx.ctx());
        let paint = fx.surface.get(path).unwrap().paint.clone();
        assert_eq!(paint.fill, Some(Polygon::DEFAULT_FILL.darken(0.1)));
        assert!(paint.glow.is_some());

        graphic.unselect(&mut fx.ctx());
        let paint = fx.surface.get(path).unwrap().paint.clone();
        assert_eq!(paint.fill, Some(Polygon::DEFAULT_FILL));
        assert!(paint.glow.is_none());
    }

    #[test]
    fn test_hidden_shape_keeps_handles_hidden_on_focus() {
        let mut fx = Fixture::new(true);
        let mut graphic = Graphic::from_seed(
            GraphicKind::Polygon(Polygon::default()),
            seed(square()),
            &mut fx.ctx(),
        );
        graphic.set_hidden(true, &mut fx.ctx());
        graphic.focus(&mut fx.ctx());
        assert!(fx.surface.objects().iter().all(|o| !o.visible));

        graphic.set_hidden(false, &mut fx.ctx());
        assert!(fx.surface.objects().iter().all(|o| o.visible));
    }

    #[test]
    fn test_set_name_rerenders_label() {
        let mut fx = Fixture::new(true);
        let mut graphic = Graphic::from_seed(
            GraphicKind::Polygon(Polygon::default()),
            seed(square()),
            &mut fx.ctx(),
        );
        graphic.set_name(Some("renamed".to_string()), &mut fx.ctx());
        let label = graphic.label_object().unwrap();
        match &fx.surface.get(label).unwrap().drawable {
            Drawable::Text { content, anchor, .. } => {
                assert_eq!(content, "renamed");
                assert_eq!(*anchor, Point::new(30.0, 30.0));
            }
            other => panic!("expected text, got {other:?}"),
        }

        graphic.set_name(None, &mut fx.ctx());
        assert!(graphic.label_object().is_none());
    }

    #[test]
    fn test_path_stays_below_handles_after_label_added() {
        let mut fx = Fixture::new(true);
        let mut graphic = draw(
            &mut fx,
            GraphicKind::Polygon(Polygon::default()),
            &[(100.0, 100.0), (300.0, 100.0), (200.0, 300.0)],
        );
        assert_eq!(graphic.close(&mut fx.ctx()), CloseOutcome::Created);
        graphic.set_name(Some("zone".to_string()), &mut fx.ctx());
        assert!(graphic.on_vertex_moving(1, Vec2::new(-10.0, 0.0), &mut fx.ctx()));

        let roles: Vec<ObjectRole> = fx
            .surface
            .objects()
            .iter()
            .filter_map(|o| o.tag.as_ref().map(|t| t.role))
            .collect();
        assert_eq!(
            roles,
            vec![
                ObjectRole::Path,
                ObjectRole::Vertex(0),
                ObjectRole::Vertex(1),
                ObjectRole::Vertex(2),
                ObjectRole::Label,
            ]
        );

        let hit = fx.surface.hit_test(Point::new(100.0, 100.0), 0.0).unwrap();
        assert_eq!(hit.tag.as_ref().map(|t| t.role), Some(ObjectRole::Vertex(0)));
    }

    #[test]
    fn test_remove_focused_vertex_of_line() {
        let mut fx = Fixture::new(true);
        let removed = fx.record(EventKind::DelDot);
        let mut line = Graphic::from_seed(
            GraphicKind::Line(Line::default()),
            seed(vec![
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(20.0, 0.0),
            ]),
            &mut fx.ctx(),
        );
        line.focus(&mut fx.ctx());
        assert!(line.remove_focused_vertex(&mut fx.ctx()).is_none());

        line.focus_vertex(1, &mut fx.ctx());
        let info = line.remove_focused_vertex(&mut fx.ctx()).unwrap();
        assert_eq!(info.index, 1);
        assert_eq!(info.point, Point::new(10.0, 0.0));
        assert_eq!(line.dots().len(), 2);
        assert_eq!(line.vertex_objects().len(), 2);
        assert_eq!(removed.borrow().len(), 1);

        // A line never drops below two vertices.
        line.focus_vertex(0, &mut fx.ctx());
        assert!(line.remove_focused_vertex(&mut fx.ctx()).is_none());
    }

    #[test]
    fn test_rescale() {
        let mut fx = Fixture::new(true);
        let mut graphic = Graphic::from_seed(
            GraphicKind::Polygon(Polygon::default()),
            seed(square()),
            &mut fx.ctx(),
        );
        graphic.rescale(2.0, 0.5, &mut fx.ctx());
        assert_eq!(graphic.dots()[2], Point::new(100.0, 25.0));
        let frac = graphic.to_fractional(Size::new(200.0, 50.0));
        assert_eq!(frac[2], Point::new(0.5, 0.5));
    }

    #[test]
    fn test_line_tooltip_tracks_camera() {
        let mut fx = Fixture::new(false);
        fx.config.always_show_tip = true;
        fx.formatter = Some(Box::new(count_vertices));
        let mut line = Graphic::from_seed(
            GraphicKind::Line(Line::default()),
            seed(vec![Point::new(0.0, 0.0), Point::new(100.0, 50.0)]),
            &mut fx.ctx(),
        );
        let tooltip = line.tooltip().unwrap();
        assert_eq!(tooltip.content, "2 vertices");
        assert_eq!(tooltip.position, Point::new(100.0, 50.0));

        fx.camera.pan(Vec2::new(10.0, 10.0));
        line.refresh_tooltip_position(&fx.camera);
        assert_eq!(line.tooltip().unwrap().position, Point::new(110.0, 60.0));

        fx.config.editable = true;
        line.update_state(&mut fx.ctx());
        assert!(line.tooltip().is_none());
    }

    #[test]
    fn test_destroy_removes_everything() {
        let mut fx = Fixture::new(true);
        let mut graphic = Graphic::from_seed(
            GraphicKind::Polygon(Polygon::default()),
            seed(square()),
            &mut fx.ctx(),
        );
        graphic.focus(&mut fx.ctx());
        assert_eq!(fx.surface.len(), 6);
        graphic.destroy(&mut fx.ctx());
        assert!(fx.surface.is_empty());
        assert!(graphic.path_object().is_none());
        assert!(!graphic.is_active());
    }
}
