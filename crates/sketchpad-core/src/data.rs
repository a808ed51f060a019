//! Serialized shape collections.
//!
//! Vertex and marker positions are stored as fractions (0..1) of the surface
//! size so a collection survives a resize of the host canvas.

use crate::color::CssColor;
use crate::error::SketchResult;
use crate::graphic::{DrawType, ShapeId};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// A batch of polygons or lines sharing one draw type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphicsData {
    /// `"polygon"` or `"line"`. Kept as a string so an unknown value is
    /// reported as [`SketchError::InvalidDrawType`](crate::SketchError).
    pub draw_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default)]
    pub graphics: Vec<GraphicData>,
}

impl GraphicsData {
    pub fn new(draw_type: DrawType, graphics: Vec<GraphicData>) -> Self {
        Self {
            draw_type: draw_type.to_string(),
            group: None,
            graphics,
        }
    }

    pub fn from_json(json: &str) -> SketchResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> SketchResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn draw_type(&self) -> SketchResult<DrawType> {
        self.draw_type.parse()
    }
}

/// One shape with fractional vertices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphicData {
    #[serde(default = "ShapeId::random")]
    pub id: ShapeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evented: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<CssColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<CssColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    /// Lines only: overrides the container's `smooth` option.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smooth: Option<bool>,
    #[serde(default)]
    pub path: Vec<Point>,
    /// Host payload, carried through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Per-shape group. Falls back to the collection's group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl GraphicData {
    pub fn new(id: impl Into<ShapeId>, path: Vec<Point>) -> Self {
        Self {
            id: id.into(),
            name: None,
            evented: None,
            fill: None,
            stroke: None,
            stroke_width: None,
            smooth: None,
            path,
            data: None,
            group: None,
        }
    }
}

/// A batch of static markers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default)]
    pub graphics: Vec<MarkerData>,
}

impl StaticData {
    pub fn from_json(json: &str) -> SketchResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// One static marker, centred on the fractional position `(x, y)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerData {
    #[serde(default = "ShapeId::random")]
    pub id: ShapeId,
    /// `"image"`, `"rect"` or `"circle"`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evented: Option<bool>,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<CssColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<CssColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    /// Image source for `"image"` markers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg: Option<String>,
}
