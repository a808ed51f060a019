//! The shape container.
//!
//! [`Sketchpad`] owns the display list, the camera and every shape drawn on
//! it. The host forwards raw pointer and keyboard events; the container
//! decides which shape they belong to, enforces that at most one shape is
//! active and at most one is selected, and publishes lifecycle events.

use crate::camera::Camera;
use crate::config::{ConfigPatch, Formatter, FormatterInput, SketchConfig};
use crate::data::{GraphicsData, StaticData};
use crate::error::{SketchError, SketchResult};
use crate::events::{
    BoxFuture, DeleteVerdict, EventBus, EventKind, GraphInfo, GraphKind, ListenerId, SketchEvent,
};
use crate::graphic::{
    CloseOutcome, Ctx, DrawType, Graphic, GraphicKind, MarkerKind, Seed, ShapeId, StaticGraphic,
};
use crate::input::{Gesture, KeyEvent, MouseButton, PointerEvent};
use crate::surface::{Cursor, DisplayList, DisplayObject, ObjectRole, Owner};
use crate::tooltip::Tooltip;
use kurbo::{Point, Size, Vec2};
use log::{debug, info, warn};
use std::collections::HashMap;

/// Hit tolerance in screen pixels.
const HIT_TOLERANCE: f64 = 4.0;

/// What a key press did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Ignored,
    /// The shape being drawn was closed or discarded.
    Closed,
    /// Ctrl+Z removed the focused vertex of the active line.
    VertexRemoved,
    /// Delete was pressed on the active shape. Finish it with
    /// [`Sketchpad::delete_active`], which runs the before-delete hooks.
    DeleteRequested,
}

/// Everything shapes render against.
struct Stage {
    surface: DisplayList,
    camera: Camera,
    config: SketchConfig,
    formatter: Option<Formatter>,
    events: EventBus,
}

impl Stage {
    fn ctx(&mut self) -> Ctx<'_> {
        Ctx {
            surface: &mut self.surface,
            config: &self.config,
            events: &mut self.events,
            camera: &self.camera,
            formatter: self.formatter.as_ref(),
        }
    }

    fn tolerance(&self) -> f64 {
        HIT_TOLERANCE / self.camera.zoom
    }
}

/// Interactive annotation layer: polygons or lines drawn by the user plus
/// static markers loaded from data.
pub struct Sketchpad {
    stage: Stage,
    graphics: HashMap<ShapeId, Graphic>,
    statics: HashMap<ShapeId, StaticGraphic>,
    /// The shape holding edit focus, if any.
    current: Option<ShapeId>,
    draw_type: DrawType,
    gesture: Gesture,
    /// Shared tooltip following the pointer in read-only mode.
    hover_tip: Tooltip,
}

impl Sketchpad {
    pub fn new(size: Size, config: SketchConfig) -> Self {
        let mut surface = DisplayList::new(size);
        surface.set_background(config.bg_url.clone());
        let camera = Camera::with_limits(config.min_zoom, config.max_zoom);
        Self {
            stage: Stage {
                surface,
                camera,
                config,
                formatter: None,
                events: EventBus::new(),
            },
            graphics: HashMap::new(),
            statics: HashMap::new(),
            current: None,
            draw_type: DrawType::default(),
            gesture: Gesture::Idle,
            hover_tip: Tooltip::default(),
        }
    }

    pub fn surface(&self) -> &DisplayList {
        &self.stage.surface
    }

    pub fn camera(&self) -> &Camera {
        &self.stage.camera
    }

    pub fn config(&self) -> &SketchConfig {
        &self.stage.config
    }

    pub fn graphic(&self, id: &ShapeId) -> Option<&Graphic> {
        self.graphics.get(id)
    }

    pub fn graphics(&self) -> impl Iterator<Item = &Graphic> {
        self.graphics.values()
    }

    pub fn static_graphic(&self, id: &ShapeId) -> Option<&StaticGraphic> {
        self.statics.get(id)
    }

    pub fn static_graphics(&self) -> impl Iterator<Item = &StaticGraphic> {
        self.statics.values()
    }

    pub fn current(&self) -> Option<&ShapeId> {
        self.current.as_ref()
    }

    pub fn current_graphic(&self) -> Option<&Graphic> {
        self.current.as_ref().and_then(|id| self.graphics.get(id))
    }

    fn active_graphic(&self) -> Option<&Graphic> {
        self.current_graphic().filter(|g| g.is_active())
    }

    fn drawing_id(&self) -> Option<ShapeId> {
        self.current_graphic()
            .filter(|g| g.is_drawing())
            .map(|g| g.id().clone())
    }

    pub fn draw_type(&self) -> DrawType {
        self.draw_type
    }

    /// Choose what an empty-area click starts. A shape still being drawn is
    /// closed first.
    pub fn set_draw_type(&mut self, draw_type: DrawType) {
        if draw_type != self.draw_type {
            self.close_current();
            self.draw_type = draw_type;
        }
    }

    pub fn set_draw_type_str(&mut self, draw_type: &str) -> SketchResult<()> {
        self.set_draw_type(draw_type.parse()?);
        Ok(())
    }

    pub fn on<F>(&mut self, kind: EventKind, handler: F) -> ListenerId
    where
        F: FnMut(&SketchEvent) + 'static,
    {
        self.stage.events.on(kind, handler)
    }

    pub fn off(&mut self, kind: EventKind, id: ListenerId) -> bool {
        self.stage.events.off(kind, id)
    }

    /// Register a `graph.beforeDel` hook. A [`DeleteVerdict::Veto`] cancels
    /// the delete.
    pub fn on_before_delete<F>(&mut self, hook: F) -> ListenerId
    where
        F: Fn(&GraphInfo) -> BoxFuture<'static, DeleteVerdict> + 'static,
    {
        self.stage.events.on_before_delete(hook)
    }

    pub fn off_before_delete(&mut self, id: ListenerId) -> bool {
        self.stage.events.off_before_delete(id)
    }

    /// Install the tooltip formatter. Anchored line tooltips are rebuilt.
    pub fn set_formatter<F>(&mut self, formatter: F)
    where
        F: Fn(&FormatterInput<'_>) -> String + 'static,
    {
        self.stage.formatter = Some(Box::new(formatter));
        self.refresh_tooltips();
    }

    /// Remove the formatter, which disables every tooltip.
    pub fn clear_formatter(&mut self) {
        self.stage.formatter = None;
        self.hover_tip.hide();
        self.refresh_tooltips();
    }

    fn refresh_tooltips(&mut self) {
        let ctx = self.stage.ctx();
        for graphic in self.graphics.values_mut() {
            graphic.refresh_tooltip(&ctx);
        }
    }

    fn reposition_tooltips(&mut self) {
        for graphic in self.graphics.values_mut() {
            graphic.refresh_tooltip_position(&self.stage.camera);
        }
    }

    /// The pointer-following tooltip, while shown.
    pub fn hover_tooltip(&self) -> Option<&Tooltip> {
        Some(&self.hover_tip).filter(|tip| tip.visible)
    }

    /// Anchored line tooltips currently shown.
    pub fn tooltips(&self) -> impl Iterator<Item = &Tooltip> {
        self.graphics
            .values()
            .filter_map(Graphic::tooltip)
            .filter(|tip| tip.visible)
    }

    /// Cursor for the pointer at `screen`.
    pub fn cursor_at(&self, screen: Point) -> Cursor {
        let world = self.stage.camera.screen_to_world(screen);
        match self.stage.surface.cursor_at(world, self.stage.tolerance()) {
            Cursor::Default if self.stage.config.editable => Cursor::Crosshair,
            cursor => cursor,
        }
    }

    fn hit(&self, world: Point) -> Option<(Owner, ObjectRole)> {
        self.stage
            .surface
            .hit_test(world, self.stage.tolerance())
            .and_then(|object| object.tag.clone())
            .map(|tag| (tag.owner, tag.role))
    }

    /// Ids of every shape, back to front by the stacking of their paths.
    fn ordered_ids(&self) -> Vec<ShapeId> {
        let mut ordered: Vec<(usize, &ShapeId)> = self
            .graphics
            .values()
            .map(|g| {
                let index = g
                    .path_object()
                    .and_then(|path| self.stage.surface.index_of(path))
                    .unwrap_or(usize::MAX);
                (index, g.id())
            })
            .collect();
        ordered.sort();
        ordered.into_iter().map(|(_, id)| id.clone()).collect()
    }

    // --- Input dispatch ---

    pub fn handle_pointer(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down { position, button } => self.on_pointer_down(position, button),
            PointerEvent::Up { .. } => self.gesture = Gesture::Idle,
            PointerEvent::Move { position } => self.on_pointer_move(position),
            PointerEvent::DoubleClick { .. } => {
                if self.stage.config.editable {
                    self.close_current();
                }
            }
            PointerEvent::Scroll { position, delta } => self.on_scroll(position, delta.y),
        }
    }

    fn on_pointer_down(&mut self, screen: Point, button: MouseButton) {
        let world = self.stage.camera.screen_to_world(screen);
        if !self.stage.config.editable {
            if button == MouseButton::Left {
                self.on_readonly_down(screen, world);
            }
            return;
        }

        match button {
            MouseButton::Right => {
                self.close_current();
                return;
            }
            MouseButton::Middle => return,
            MouseButton::Left => {}
        }

        // While drawing every click commits a vertex, even over other shapes.
        if let Some(id) = self.drawing_id() {
            let mut ctx = self.stage.ctx();
            if let Some(graphic) = self.graphics.get_mut(&id) {
                graphic.add_dot(world, &mut ctx);
            }
            return;
        }

        match self.hit(world) {
            None => self.start_graphic(world),
            Some((Owner::Graphic(id), role)) => self.on_graphic_down(id, role, world),
            Some((Owner::Marker(id), _)) => self.emit_marker_click(&id),
        }
    }

    fn on_readonly_down(&mut self, screen: Point, world: Point) {
        match self.hit(world) {
            Some((Owner::Graphic(id), ObjectRole::Path)) => {
                if self.graphics.get(&id).is_some_and(Graphic::is_closed) {
                    self.select_graphic(&id);
                    if let Some(graphic) = self.graphics.get(&id) {
                        self.stage.events.emit(&SketchEvent::Click(graphic.info()));
                    }
                }
            }
            Some((Owner::Marker(id), _)) => self.emit_marker_click(&id),
            Some(_) => {}
            None => self.gesture = Gesture::Panning { last_screen: screen },
        }
    }

    fn emit_marker_click(&mut self, id: &ShapeId) {
        if let Some(marker) = self.statics.get(id) {
            self.stage.events.emit(&SketchEvent::Click(marker.info()));
        }
    }

    /// Empty-area click in editable mode: drop focus and start a new shape.
    fn start_graphic(&mut self, world: Point) {
        self.blur_current();
        let kind =
            GraphicKind::for_draw_type(self.draw_type, &self.stage.config, self.graphics.len());
        let graphic = Graphic::new_drawing(kind, world);
        if graphic.kind().is_line() {
            self.stage.events.emit(&SketchEvent::AddLine(graphic.info()));
        }
        let id = graphic.id().clone();
        self.graphics.insert(id.clone(), graphic);
        self.current = Some(id);
    }

    fn on_graphic_down(&mut self, id: ShapeId, role: ObjectRole, world: Point) {
        let switch = match &self.current {
            None => true,
            Some(current) => {
                *current != id && self.graphics.get(current).is_none_or(Graphic::is_closed)
            }
        };
        if switch {
            self.focus_graphic(&id);
        }

        let Some(graphic) = self.graphics.get_mut(&id) else {
            return;
        };
        if role == ObjectRole::Path && graphic.is_closed() {
            self.stage.events.emit(&SketchEvent::Click(graphic.info()));
        }
        if self.current.as_ref() != Some(&id) || !graphic.is_active() {
            return;
        }

        match role {
            ObjectRole::Vertex(index) => {
                let mut ctx = self.stage.ctx();
                graphic.focus_vertex(index, &mut ctx);
                self.gesture = Gesture::DraggingVertex {
                    id,
                    index,
                    last_world: world,
                };
            }
            ObjectRole::Path => {
                let draggable = graphic
                    .path_object()
                    .and_then(|path| self.stage.surface.get(path))
                    .is_some_and(DisplayObject::draggable);
                if draggable {
                    self.gesture = Gesture::DraggingPath {
                        id,
                        last_world: world,
                    };
                }
            }
            ObjectRole::Label | ObjectRole::Body => {}
        }
    }

    fn on_pointer_move(&mut self, screen: Point) {
        let world = self.stage.camera.screen_to_world(screen);
        match std::mem::take(&mut self.gesture) {
            Gesture::Panning { last_screen } => {
                self.stage.camera.pan(screen - last_screen);
                self.gesture = Gesture::Panning {
                    last_screen: screen,
                };
                self.stage.events.emit(&SketchEvent::Pan {
                    offset: self.stage.camera.offset,
                });
                self.reposition_tooltips();
            }
            Gesture::DraggingVertex {
                id,
                index,
                last_world,
            } => {
                let mut ctx = self.stage.ctx();
                if let Some(graphic) = self.graphics.get_mut(&id) {
                    graphic.on_vertex_moving(index, world - last_world, &mut ctx);
                }
                self.gesture = Gesture::DraggingVertex {
                    id,
                    index,
                    last_world: world,
                };
            }
            Gesture::DraggingPath { id, last_world } => {
                let mut ctx = self.stage.ctx();
                if let Some(graphic) = self.graphics.get_mut(&id) {
                    graphic.on_path_moving(world - last_world, &mut ctx);
                }
                self.gesture = Gesture::DraggingPath {
                    id,
                    last_world: world,
                };
            }
            Gesture::Idle => {
                if self.stage.config.editable {
                    if let Some(id) = self.drawing_id() {
                        let mut ctx = self.stage.ctx();
                        if let Some(graphic) = self.graphics.get_mut(&id) {
                            graphic.on_move(world, &mut ctx);
                        }
                    }
                } else {
                    self.update_hover_tip(screen, world);
                }
            }
        }
    }

    fn update_hover_tip(&mut self, screen: Point, world: Point) {
        if self.stage.config.always_show_tip {
            return;
        }
        let Some(formatter) = self.stage.formatter.as_ref() else {
            return;
        };
        let hovered = match self.hit(world) {
            Some((Owner::Graphic(id), ObjectRole::Path)) => self.graphics.get(&id),
            _ => None,
        };
        match hovered.map(|g| formatter(&g.formatter_input())) {
            Some(content) if !content.is_empty() => {
                self.hover_tip.content = content;
                self.hover_tip.show_at(screen);
            }
            _ => self.hover_tip.hide(),
        }
    }

    fn on_scroll(&mut self, screen: Point, delta_y: f64) {
        if !self.stage.config.scalable || self.stage.config.editable {
            return;
        }
        if self.stage.camera.wheel_zoom(screen, delta_y) {
            self.stage.events.emit(&SketchEvent::Scale {
                zoom: self.stage.camera.zoom,
                offset: self.stage.camera.offset,
            });
            self.reposition_tooltips();
        }
    }

    /// Pan the view by a screen-space delta, as a drag on empty area does.
    pub fn pan(&mut self, delta: Vec2) {
        self.stage.camera.pan(delta);
        self.stage.events.emit(&SketchEvent::Pan {
            offset: self.stage.camera.offset,
        });
        self.reposition_tooltips();
    }

    pub fn handle_key(&mut self, event: KeyEvent) -> KeyOutcome {
        let KeyEvent::Pressed { key, modifiers } = event else {
            return KeyOutcome::Ignored;
        };
        if !self.stage.config.editable {
            return KeyOutcome::Ignored;
        }
        match key.as_str() {
            "Escape" if self.close_current() => KeyOutcome::Closed,
            "Delete" if self.active_graphic().is_some() => KeyOutcome::DeleteRequested,
            "z" | "Z" | "KeyZ" if modifiers.command() => {
                if self.remove_focused_vertex() {
                    KeyOutcome::VertexRemoved
                } else {
                    KeyOutcome::Ignored
                }
            }
            _ => KeyOutcome::Ignored,
        }
    }

    fn remove_focused_vertex(&mut self) -> bool {
        let Some(id) = self.current.clone() else {
            return false;
        };
        let mut ctx = self.stage.ctx();
        self.graphics
            .get_mut(&id)
            .and_then(|graphic| graphic.remove_focused_vertex(&mut ctx))
            .is_some()
    }

    /// Close the shape being drawn. Returns `false` when nothing was drawing.
    pub fn close_current(&mut self) -> bool {
        let Some(id) = self.drawing_id() else {
            return false;
        };
        let mut ctx = self.stage.ctx();
        let outcome = match self.graphics.get_mut(&id) {
            Some(graphic) => graphic.close(&mut ctx),
            None => return false,
        };
        if outcome == CloseOutcome::Discarded {
            self.graphics.remove(&id);
            self.current = None;
        }
        true
    }

    // --- Focus and selection ---

    fn blur_current(&mut self) {
        let Some(id) = self.current.take() else {
            return;
        };
        let mut ctx = self.stage.ctx();
        if let Some(graphic) = self.graphics.get_mut(&id) {
            graphic.blur(&mut ctx);
        }
    }

    /// Move edit focus to `id`, blurring the previous holder first.
    fn focus_graphic(&mut self, id: &ShapeId) -> bool {
        if !self.stage.config.editable || !self.graphics.contains_key(id) {
            return false;
        }
        if self.current.as_ref() != Some(id) {
            self.blur_current();
        }
        let mut ctx = self.stage.ctx();
        let Some(graphic) = self.graphics.get_mut(id) else {
            return false;
        };
        if !graphic.focus(&mut ctx) {
            return false;
        }
        self.current = Some(id.clone());
        true
    }

    /// Give `id` edit focus. Editable mode only; a shape still being drawn
    /// is closed first.
    pub fn focus(&mut self, id: &ShapeId) -> SketchResult<bool> {
        if !self.graphics.contains_key(id) {
            return Err(SketchError::ShapeNotFound(id.clone()));
        }
        self.close_current();
        Ok(self.focus_graphic(id))
    }

    /// Drop edit focus without starting a new shape.
    pub fn blur(&mut self) {
        self.close_current();
        self.blur_current();
    }

    fn select_graphic(&mut self, id: &ShapeId) -> bool {
        if self.stage.config.editable || !self.graphics.contains_key(id) {
            return false;
        }
        let mut ctx = self.stage.ctx();
        for graphic in self.graphics.values_mut() {
            if graphic.is_selected() && graphic.id() != id {
                graphic.unselect(&mut ctx);
            }
        }
        if let Some(graphic) = self.graphics.get_mut(id) {
            if !graphic.is_selected() {
                graphic.select(&mut ctx);
            }
        }
        true
    }

    /// Highlight `id`, unselecting every other shape. Read-only mode only.
    pub fn select(&mut self, id: &ShapeId) -> SketchResult<bool> {
        if !self.graphics.contains_key(id) {
            return Err(SketchError::ShapeNotFound(id.clone()));
        }
        Ok(self.select_graphic(id))
    }

    pub fn clear_selection(&mut self) {
        let mut ctx = self.stage.ctx();
        for graphic in self.graphics.values_mut().filter(|g| g.is_selected()) {
            graphic.unselect(&mut ctx);
        }
    }

    pub fn selected(&self) -> Option<&Graphic> {
        self.graphics.values().find(|g| g.is_selected())
    }

    // --- Deletion ---

    /// Delete `id` once every before-delete hook has resolved. Returns the
    /// deleted shape's info, or `None` when a hook vetoed.
    pub async fn delete(&mut self, id: &ShapeId) -> SketchResult<Option<GraphInfo>> {
        let info = self
            .graphics
            .get(id)
            .map(Graphic::info)
            .ok_or_else(|| SketchError::ShapeNotFound(id.clone()))?;

        for hook in self.stage.events.before_delete(&info) {
            if hook.await == DeleteVerdict::Veto {
                warn!("Delete of {} vetoed by a before-delete hook", info.id);
                return Ok(None);
            }
        }

        self.destroy_graphic(id);
        self.stage.events.emit(&SketchEvent::Delete(info.clone()));
        if info.kind == GraphKind::Line {
            self.stage.events.emit(&SketchEvent::DelLine(info.clone()));
        }
        Ok(Some(info))
    }

    /// Delete the active shape, as the Delete key does. Editable mode only.
    pub async fn delete_active(&mut self) -> SketchResult<Option<GraphInfo>> {
        if !self.stage.config.editable {
            return Ok(None);
        }
        let Some(id) = self.active_graphic().map(|g| g.id().clone()) else {
            return Ok(None);
        };
        self.delete(&id).await
    }

    fn destroy_graphic(&mut self, id: &ShapeId) -> Option<Graphic> {
        let mut graphic = self.graphics.remove(id)?;
        let mut ctx = self.stage.ctx();
        graphic.destroy(&mut ctx);
        if self.current.as_ref() == Some(id) {
            self.current = None;
        }
        let dragging = match &self.gesture {
            Gesture::DraggingVertex { id: target, .. }
            | Gesture::DraggingPath { id: target, .. } => {
                target == id
            }
            Gesture::Idle | Gesture::Panning { .. } => false,
        };
        if dragging {
            self.gesture = Gesture::Idle;
        }
        Some(graphic)
    }

    // --- Configuration ---

    /// Apply a partial config, running the transitions the changed keys
    /// imply.
    pub fn update_config(&mut self, patch: ConfigPatch) {
        let was_editable = self.stage.config.editable;
        let old_text_style = self.stage.config.text_style.clone();
        let old_bg = self.stage.config.bg_url.clone();
        let geometry = patch.touches_geometry();

        if was_editable && patch.editable == Some(false) {
            self.close_current();
        }
        patch.apply(&mut self.stage.config);

        match (was_editable, self.stage.config.editable) {
            (true, false) => self.enter_readonly_state(),
            (false, true) => self.enter_editing_state(),
            _ => {}
        }
        if geometry {
            self.rerender_paths();
        }
        if self.stage.config.text_style != old_text_style {
            self.rerender_labels();
        }
        if self.stage.config.bg_url != old_bg {
            self.stage
                .surface
                .set_background(self.stage.config.bg_url.clone());
        }
        let (min_zoom, max_zoom) = (self.stage.config.min_zoom, self.stage.config.max_zoom);
        self.stage.camera.set_limits(min_zoom, max_zoom);
    }

    fn enter_readonly_state(&mut self) {
        self.current = None;
        self.gesture = Gesture::Idle;
        let mut ctx = self.stage.ctx();
        for graphic in self.graphics.values_mut() {
            if graphic.is_active() {
                graphic.blur(&mut ctx);
            }
            graphic.update_state(&mut ctx);
        }
        debug!("Switched to read-only mode");
    }

    fn enter_editing_state(&mut self) {
        self.gesture = Gesture::Idle;
        self.hover_tip.hide();
        let mut ctx = self.stage.ctx();
        for graphic in self.graphics.values_mut() {
            graphic.update_state(&mut ctx);
        }
        debug!("Switched to editing mode");
    }

    fn rerender_paths(&mut self) {
        let ids = self.ordered_ids();
        let mut ctx = self.stage.ctx();
        for id in &ids {
            if let Some(graphic) = self.graphics.get_mut(id) {
                graphic.render_path(&mut ctx);
                graphic.rebuild_vertexes(&mut ctx);
            }
        }
    }

    fn rerender_labels(&mut self) {
        let mut ctx = self.stage.ctx();
        for graphic in self.graphics.values_mut() {
            graphic.render_text(&mut ctx);
        }
        for marker in self.statics.values_mut() {
            marker.restyle_text(&ctx.config.text_style, ctx.surface);
        }
    }

    pub fn set_background(&mut self, source: Option<String>) {
        self.stage.config.bg_url = source.clone();
        self.stage.surface.set_background(source);
    }

    // --- Bulk data ---

    /// Load closed shapes from fractional data. A shape whose id is already
    /// present replaces it. The container adopts the collection's draw type.
    pub fn add_data(&mut self, data: GraphicsData) -> SketchResult<Vec<ShapeId>> {
        let draw_type = data.draw_type()?;
        let size = self.stage.surface.size();
        let mut ids = Vec::with_capacity(data.graphics.len());

        for item in data.graphics {
            self.destroy_graphic(&item.id);
            let kind =
                GraphicKind::for_data(draw_type, &item, &self.stage.config, self.graphics.len());
            let seed = Seed {
                id: item.id,
                name: item.name,
                group: item.group.or_else(|| data.group.clone()),
                evented: item.evented.unwrap_or(true),
                dots: item
                    .path
                    .iter()
                    .map(|p| Point::new(p.x * size.width, p.y * size.height))
                    .collect(),
                data: item.data,
            };
            let mut ctx = self.stage.ctx();
            let graphic = Graphic::from_seed(kind, seed, &mut ctx);
            ids.push(graphic.id().clone());
            self.graphics.insert(graphic.id().clone(), graphic);
        }

        self.draw_type = draw_type;
        info!("Loaded {} {} shapes", ids.len(), draw_type);
        Ok(ids)
    }

    pub fn add_data_json(&mut self, json: &str) -> SketchResult<Vec<ShapeId>> {
        self.add_data(GraphicsData::from_json(json)?)
    }

    /// Closed shapes of the current draw type, back to front, with vertices
    /// as fractions of the surface size.
    pub fn get_data(&self) -> GraphicsData {
        let size = self.stage.surface.size();
        let graphics = self
            .ordered_ids()
            .iter()
            .filter_map(|id| self.graphics.get(id))
            .filter(|g| g.is_closed() && g.draw_type() == self.draw_type)
            .map(|g| g.to_data(size))
            .collect();
        GraphicsData::new(self.draw_type, graphics)
    }

    pub fn get_data_json(&self) -> SketchResult<String> {
        self.get_data().to_json()
    }

    /// Place static markers. Aborts at the first entry with an unknown type;
    /// entries before it stay placed.
    pub fn add_static_data(&mut self, data: StaticData) -> SketchResult<Vec<ShapeId>> {
        let size = self.stage.surface.size();
        let mut ids = Vec::with_capacity(data.graphics.len());
        for item in &data.graphics {
            item.kind.parse::<MarkerKind>()?;
            if let Some(mut previous) = self.statics.remove(&item.id) {
                previous.destroy(&mut self.stage.surface);
            }
            let marker = StaticGraphic::build(
                item,
                data.group.as_deref(),
                size,
                &self.stage.config.text_style,
                &mut self.stage.surface,
            )?;
            ids.push(marker.id().clone());
            self.statics.insert(marker.id().clone(), marker);
        }
        info!("Placed {} static markers", ids.len());
        Ok(ids)
    }

    pub fn add_static_data_json(&mut self, json: &str) -> SketchResult<Vec<ShapeId>> {
        self.add_static_data(StaticData::from_json(json)?)
    }

    /// Destroy every shape and static marker.
    pub fn clean_graphics(&mut self) {
        let count = self.graphics.len() + self.statics.len();
        let mut ctx = self.stage.ctx();
        for (_, mut graphic) in self.graphics.drain() {
            graphic.destroy(&mut ctx);
        }
        for (_, mut marker) in self.statics.drain() {
            marker.destroy(ctx.surface);
        }
        self.current = None;
        self.gesture = Gesture::Idle;
        self.hover_tip.hide();
        info!("Cleared {} shapes", count);
    }

    pub fn show_graphics(&mut self, groups: &[&str]) {
        self.toggle_graphics_visible(true, groups);
    }

    pub fn hide_graphics(&mut self, groups: &[&str]) {
        self.toggle_graphics_visible(false, groups);
    }

    /// An empty `groups` list matches every shape.
    fn toggle_graphics_visible(&mut self, visible: bool, groups: &[&str]) {
        let in_groups = |group: &str| groups.is_empty() || groups.iter().any(|g| *g == group);
        let mut ctx = self.stage.ctx();
        for graphic in self.graphics.values_mut().filter(|g| in_groups(g.group())) {
            graphic.set_hidden(!visible, &mut ctx);
        }
        for marker in self.statics.values_mut().filter(|m| in_groups(m.group())) {
            marker.set_hidden(!visible, ctx.surface);
        }
    }

    pub fn set_name(&mut self, id: &ShapeId, name: Option<String>) -> SketchResult<()> {
        let mut ctx = self.stage.ctx();
        if let Some(graphic) = self.graphics.get_mut(id) {
            graphic.set_name(name, &mut ctx);
        } else if let Some(marker) = self.statics.get_mut(id) {
            marker.set_name(name, &ctx.config.text_style, ctx.surface);
        } else {
            return Err(SketchError::ShapeNotFound(id.clone()));
        }
        Ok(())
    }

    /// Resize the surface. Shapes and markers keep their fractional
    /// positions.
    pub fn resize(&mut self, size: Size) {
        if !(size.width > 0.0 && size.height > 0.0) {
            debug!("Ignoring resize to {}x{}", size.width, size.height);
            return;
        }
        let old = self.stage.surface.size();
        self.stage.surface.set_size(size);
        if old.width <= 0.0 || old.height <= 0.0 || old == size {
            return;
        }
        let (sx, sy) = (size.width / old.width, size.height / old.height);
        let ids = self.ordered_ids();
        let mut ctx = self.stage.ctx();
        for id in &ids {
            if let Some(graphic) = self.graphics.get_mut(id) {
                graphic.rescale(sx, sy, &mut ctx);
            }
        }
        for marker in self.statics.values_mut() {
            marker.rescale(sx, sy, ctx.surface);
        }
        debug!("Resized surface to {}x{}", size.width, size.height);
    }

    /// Tear everything down: shapes, markers, listeners and background.
    pub fn dispose(&mut self) {
        self.clean_graphics();
        self.stage.events.clear();
        self.stage.surface.clear();
        self.stage.surface.set_background(None);
        self.stage.formatter = None;
        self.stage.camera.reset();
    }
}
