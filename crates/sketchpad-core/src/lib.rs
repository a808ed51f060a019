//! Sketchpad Core Library
//!
//! Platform-agnostic shape lifecycle and interaction logic for the Sketchpad
//! annotation overlay: polygons, lines and arrow-tipped connectors drawn on top
//! of a 2D scene, edited through vertex handles and persisted as normalized
//! (0..1) coordinates.
//!
//! The host owns the real rendering backend. It forwards pointer and keyboard
//! events to [`Sketchpad`] and draws the retained [`DisplayList`] it exposes.

pub mod camera;
pub mod color;
pub mod config;
pub mod data;
pub mod drawer;
pub mod error;
pub mod events;
pub mod geometry;
pub mod graphic;
pub mod input;
pub mod surface;
pub mod tooltip;

pub use camera::Camera;
pub use color::CssColor;
pub use config::{ConfigPatch, Formatter, FormatterInput, SketchConfig, TextStyle};
pub use data::{GraphicData, GraphicsData, MarkerData, StaticData};
pub use drawer::{KeyOutcome, Sketchpad};
pub use error::{SketchError, SketchResult};
pub use events::{
    BoxFuture, DeleteVerdict, DotInfo, EventBus, EventKind, GraphInfo, GraphKind, ListenerId,
    SketchEvent,
};
pub use graphic::{DrawType, Graphic, GraphicKind, ShapeId, StaticGraphic};
pub use input::{KeyEvent, Modifiers, MouseButton, PointerEvent};
pub use surface::{Cursor, DisplayList, DisplayObject, Drawable, ObjectId, ObjectRole, Owner, Paint};
pub use tooltip::Tooltip;
