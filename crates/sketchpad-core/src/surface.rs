//! Retained display list the shapes render into.
//!
//! A host backend draws [`DisplayList::objects`] back to front. Each object
//! carries an optional [`ObjectTag`] naming the shape that owns it, which is
//! how a hit on the surface is mapped back to a shape without back-pointers.

use crate::color::CssColor;
use crate::graphic::ShapeId;
use kurbo::{Affine, BezPath, Circle, ParamCurveNearest, Point, Rect, Shape, Size, Vec2};

/// Identifier of a display object, unique within one list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

/// The registry entry owning a display object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Owner {
    Graphic(ShapeId),
    Marker(ShapeId),
}

impl Owner {
    pub fn id(&self) -> &ShapeId {
        match self {
            Owner::Graphic(id) | Owner::Marker(id) => id,
        }
    }
}

/// What part of its owner a display object is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectRole {
    Path,
    /// Handle for the vertex at this index.
    Vertex(usize),
    Label,
    /// Body of a static marker.
    Body,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectTag {
    pub owner: Owner,
    pub role: ObjectRole,
}

impl ObjectTag {
    pub fn graphic(id: &ShapeId, role: ObjectRole) -> Self {
        Self {
            owner: Owner::Graphic(id.clone()),
            role,
        }
    }

    pub fn marker(id: &ShapeId, role: ObjectRole) -> Self {
        Self {
            owner: Owner::Marker(id.clone()),
            role,
        }
    }
}

/// Pointer cursor shown while hovering an object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Cursor {
    #[default]
    Default,
    Crosshair,
    Move,
    Pointer,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glow {
    pub color: CssColor,
    pub blur: f64,
}

/// Fill and stroke of a display object.
#[derive(Debug, Clone, PartialEq)]
pub struct Paint {
    pub fill: Option<CssColor>,
    pub stroke: Option<CssColor>,
    pub stroke_width: f64,
    pub glow: Option<Glow>,
    pub opacity: f64,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            fill: None,
            stroke: None,
            stroke_width: 1.0,
            glow: None,
            opacity: 1.0,
        }
    }
}

impl Paint {
    fn has_fill(&self) -> bool {
        self.fill.is_some_and(|fill| !fill.is_transparent())
    }
}

/// Geometry of a display object.
#[derive(Debug, Clone, PartialEq)]
pub enum Drawable {
    Path(BezPath),
    Circle { center: Point, radius: f64 },
    Rect(Rect),
    Image { rect: Rect, source: String },
    /// Text centred on `anchor`.
    Text {
        anchor: Point,
        content: String,
        font_size: f64,
    },
}

impl Drawable {
    /// Approximate bounds. Text width is estimated from the glyph count.
    pub fn bounds(&self) -> Rect {
        match self {
            Drawable::Path(path) => path.bounding_box(),
            Drawable::Circle { center, radius } => Circle::new(*center, *radius).bounding_box(),
            Drawable::Rect(rect) | Drawable::Image { rect, .. } => *rect,
            Drawable::Text {
                anchor,
                content,
                font_size,
            } => {
                let width = content.chars().count() as f64 * font_size * 0.6;
                Rect::from_center_size(*anchor, Size::new(width, *font_size))
            }
        }
    }

    /// Reference point used for drags and positioning: the top-left of the
    /// bounds for paths and boxes, the centre for circles and text.
    pub fn anchor(&self) -> Point {
        match self {
            Drawable::Circle { center, .. } => *center,
            Drawable::Text { anchor, .. } => *anchor,
            other => other.bounds().origin(),
        }
    }

    pub fn translate(&mut self, delta: Vec2) {
        match self {
            Drawable::Path(path) => path.apply_affine(Affine::translate(delta)),
            Drawable::Circle { center, .. } => *center += delta,
            Drawable::Rect(rect) | Drawable::Image { rect, .. } => *rect = *rect + delta,
            Drawable::Text { anchor, .. } => *anchor += delta,
        }
    }

    fn hit(&self, paint: &Paint, point: Point, tolerance: f64) -> bool {
        let reach = tolerance + paint.stroke_width / 2.0;
        match self {
            Drawable::Path(path) => {
                if paint.has_fill() && path.contains(point) {
                    return true;
                }
                path.segments()
                    .any(|seg| seg.nearest(point, 1e-3).distance_sq <= reach * reach)
            }
            Drawable::Circle { center, radius } => (point - *center).hypot() <= radius + reach,
            Drawable::Rect(rect) | Drawable::Image { rect, .. } => {
                rect.inflate(reach, reach).contains(point)
            }
            Drawable::Text { .. } => self.bounds().inflate(tolerance, tolerance).contains(point),
        }
    }
}

/// One entry of the display list.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayObject {
    id: ObjectId,
    pub tag: Option<ObjectTag>,
    pub drawable: Drawable,
    pub paint: Paint,
    pub visible: bool,
    /// Receives pointer hits.
    pub evented: bool,
    /// Can be dragged by the pointer.
    pub selectable: bool,
    /// Position cannot change through dragging.
    pub locked: bool,
    pub hover_cursor: Cursor,
}

impl DisplayObject {
    pub fn new(drawable: Drawable) -> Self {
        Self {
            id: ObjectId(0),
            tag: None,
            drawable,
            paint: Paint::default(),
            visible: true,
            evented: true,
            selectable: false,
            locked: false,
            hover_cursor: Cursor::Default,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn with_tag(mut self, tag: ObjectTag) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn with_paint(mut self, paint: Paint) -> Self {
        self.paint = paint;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_evented(mut self, evented: bool) -> Self {
        self.evented = evented;
        self
    }

    pub fn with_selectable(mut self, selectable: bool) -> Self {
        self.selectable = selectable;
        self
    }

    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    pub fn with_cursor(mut self, cursor: Cursor) -> Self {
        self.hover_cursor = cursor;
        self
    }

    /// Whether a pointer drag may move this object.
    pub fn draggable(&self) -> bool {
        self.selectable && !self.locked
    }
}

/// Background image, stretched over the whole surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Background {
    pub source: String,
    pub rect: Rect,
}

/// Z-ordered (back to front) list of display objects.
#[derive(Debug, Clone, Default)]
pub struct DisplayList {
    objects: Vec<DisplayObject>,
    next_id: u64,
    size: Size,
    background: Option<Background>,
}

impl DisplayList {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Resize the surface; the background keeps filling it.
    pub fn set_size(&mut self, size: Size) {
        self.size = size;
        if let Some(bg) = &mut self.background {
            bg.rect = size.to_rect();
        }
    }

    pub fn background(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    pub fn set_background(&mut self, source: Option<String>) {
        self.background = source.map(|source| Background {
            source,
            rect: self.size.to_rect(),
        });
    }

    /// Append an object on top and return its id.
    pub fn add(&mut self, mut object: DisplayObject) -> ObjectId {
        self.next_id += 1;
        object.id = ObjectId(self.next_id);
        self.objects.push(object);
        ObjectId(self.next_id)
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<DisplayObject> {
        let index = self.index_of(id)?;
        Some(self.objects.remove(index))
    }

    pub fn get(&self, id: ObjectId) -> Option<&DisplayObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut DisplayObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.index_of(id).is_some()
    }

    /// Stacking position, 0 being the bottom.
    pub fn index_of(&self, id: ObjectId) -> Option<usize> {
        self.objects.iter().position(|o| o.id == id)
    }

    /// Restack an object at `index` (clamped to the top).
    pub fn move_to(&mut self, id: ObjectId, index: usize) -> bool {
        let Some(from) = self.index_of(id) else {
            return false;
        };
        let object = self.objects.remove(from);
        let index = index.min(self.objects.len());
        self.objects.insert(index, object);
        true
    }

    pub fn bring_to_front(&mut self, id: ObjectId) -> bool {
        self.move_to(id, usize::MAX)
    }

    pub fn translate(&mut self, id: ObjectId, delta: Vec2) {
        if let Some(object) = self.get_mut(id) {
            object.drawable.translate(delta);
        }
    }

    /// Move an object so its anchor lands on `position`.
    pub fn set_position(&mut self, id: ObjectId, position: Point) {
        if let Some(object) = self.get_mut(id) {
            let delta = position - object.drawable.anchor();
            object.drawable.translate(delta);
        }
    }

    pub fn anchor(&self, id: ObjectId) -> Option<Point> {
        self.get(id).map(|o| o.drawable.anchor())
    }

    pub fn set_visible(&mut self, id: ObjectId, visible: bool) {
        if let Some(object) = self.get_mut(id) {
            object.visible = visible;
        }
    }

    pub fn objects(&self) -> &[DisplayObject] {
        &self.objects
    }

    /// Objects belonging to `owner`, back to front.
    pub fn owned_by<'a>(&'a self, owner: &'a Owner) -> impl Iterator<Item = &'a DisplayObject> {
        self.objects
            .iter()
            .filter(move |o| o.tag.as_ref().is_some_and(|t| &t.owner == owner))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Drop every object. The background stays.
    pub fn clear(&mut self) {
        self.objects.clear();
    }

    /// Topmost visible, evented object under `point`.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> Option<&DisplayObject> {
        self.objects
            .iter()
            .rev()
            .filter(|o| o.visible && o.evented)
            .find(|o| o.drawable.hit(&o.paint, point, tolerance))
    }

    /// Cursor to show with the pointer at `point`.
    pub fn cursor_at(&self, point: Point, tolerance: f64) -> Cursor {
        self.hit_test(point, tolerance)
            .map_or(Cursor::Default, |o| o.hover_cursor)
    }
}
