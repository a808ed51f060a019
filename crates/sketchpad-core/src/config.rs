//! Container configuration and runtime patches.

use crate::camera::{DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM};
use crate::color::CssColor;
use crate::graphic::ShapeId;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Label styling shared by every shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextStyle {
    pub show: bool,
    pub color: CssColor,
    pub font_size: f64,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            show: true,
            color: CssColor::white(),
            font_size: 14.0,
        }
    }
}

/// Options recognized by [`crate::Sketchpad`].
///
/// `stroke` and `stroke_width` stay unset by default so each shape type can
/// fall back to its own appearance (a closed line is thicker than a polygon
/// outline).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SketchConfig {
    pub editable: bool,
    pub fill: Option<CssColor>,
    pub fills: Vec<CssColor>,
    #[serde(alias = "lineStroke")]
    pub stroke: Option<CssColor>,
    pub stroke_width: Option<f64>,
    pub arrow_radius: f64,
    pub arrow_show: bool,
    pub smooth: bool,
    pub always_show_tip: bool,
    pub bg_url: Option<String>,
    pub scalable: bool,
    pub ctl_size: f64,
    pub text_style: TextStyle,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub path_opacity: f64,
    pub has_shadow: bool,
}

impl Default for SketchConfig {
    fn default() -> Self {
        Self {
            editable: false,
            fill: None,
            fills: Vec::new(),
            stroke: None,
            stroke_width: None,
            arrow_radius: 6.0,
            arrow_show: false,
            smooth: true,
            always_show_tip: false,
            bg_url: None,
            scalable: true,
            ctl_size: 6.0,
            text_style: TextStyle::default(),
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            path_opacity: 1.0,
            has_shadow: false,
        }
    }
}

impl SketchConfig {
    /// Fill for the `index`-th shape: the palette cycles, then the single fill.
    pub fn fill_for(&self, index: usize) -> Option<CssColor> {
        if self.fills.is_empty() {
            self.fill
        } else {
            Some(self.fills[index % self.fills.len()])
        }
    }
}

/// A partial update for [`SketchConfig`]. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigPatch {
    pub editable: Option<bool>,
    pub fill: Option<CssColor>,
    pub fills: Option<Vec<CssColor>>,
    #[serde(alias = "lineStroke")]
    pub stroke: Option<CssColor>,
    pub stroke_width: Option<f64>,
    pub arrow_radius: Option<f64>,
    pub arrow_show: Option<bool>,
    pub smooth: Option<bool>,
    pub always_show_tip: Option<bool>,
    pub bg_url: Option<String>,
    pub scalable: Option<bool>,
    pub ctl_size: Option<f64>,
    pub text_style: Option<TextStyle>,
    pub min_zoom: Option<f64>,
    pub max_zoom: Option<f64>,
    pub path_opacity: Option<f64>,
    pub has_shadow: Option<bool>,
}

impl ConfigPatch {
    /// Whether applying this patch changes how existing paths are drawn.
    pub fn touches_geometry(&self) -> bool {
        self.fill.is_some()
            || self.fills.is_some()
            || self.stroke.is_some()
            || self.stroke_width.is_some()
            || self.arrow_radius.is_some()
            || self.arrow_show.is_some()
            || self.smooth.is_some()
            || self.path_opacity.is_some()
            || self.has_shadow.is_some()
            || self.ctl_size.is_some()
    }

    /// Write every set field into `config`.
    pub fn apply(self, config: &mut SketchConfig) {
        if let Some(value) = self.editable {
            config.editable = value;
        }
        if let Some(value) = self.fills {
            config.fills = value;
        }
        if let Some(value) = self.arrow_radius {
            config.arrow_radius = value;
        }
        if let Some(value) = self.arrow_show {
            config.arrow_show = value;
        }
        if let Some(value) = self.smooth {
            config.smooth = value;
        }
        if let Some(value) = self.always_show_tip {
            config.always_show_tip = value;
        }
        if let Some(value) = self.scalable {
            config.scalable = value;
        }
        if let Some(value) = self.ctl_size {
            config.ctl_size = value;
        }
        if let Some(value) = self.text_style {
            config.text_style = value;
        }
        if let Some(value) = self.min_zoom {
            config.min_zoom = value;
        }
        if let Some(value) = self.max_zoom {
            config.max_zoom = value;
        }
        if let Some(value) = self.path_opacity {
            config.path_opacity = value;
        }
        if let Some(value) = self.has_shadow {
            config.has_shadow = value;
        }
        if self.fill.is_some() {
            config.fill = self.fill;
        }
        if self.stroke.is_some() {
            config.stroke = self.stroke;
        }
        if self.stroke_width.is_some() {
            config.stroke_width = self.stroke_width;
        }
        if self.bg_url.is_some() {
            config.bg_url = self.bg_url;
        }
    }
}

/// What a tooltip formatter is given to describe a shape.
#[derive(Debug, Clone)]
pub struct FormatterInput<'a> {
    pub id: &'a ShapeId,
    pub name: Option<&'a str>,
    pub data: Option<&'a serde_json::Value>,
    pub dots: &'a [Point],
}

/// Maps a shape to tooltip content. Without one, tooltips are disabled.
pub type Formatter = Box<dyn Fn(&FormatterInput<'_>) -> String>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = SketchConfig::default();
        assert!(!config.editable);
        assert!(config.smooth);
        assert!(!config.arrow_show);
        assert!(config.scalable);
        assert!((config.arrow_radius - 6.0).abs() < f64::EPSILON);
        assert!((config.ctl_size - 6.0).abs() < f64::EPSILON);
        assert!((config.min_zoom - 0.01).abs() < f64::EPSILON);
        assert!((config.max_zoom - 20.0).abs() < f64::EPSILON);
        assert!(config.text_style.show);
    }

    #[test]
    fn test_deserialize_partial_camel_case() {
        let config: SketchConfig = serde_json::from_value(json!({
            "editable": true,
            "lineStroke": "#ff0000",
            "strokeWidth": 3,
            "fills": ["#000", "rgba(255,255,255,0.5)"],
            "textStyle": {"fontSize": 20}
        }))
        .unwrap();
        assert!(config.editable);
        assert_eq!(config.stroke, Some(CssColor::rgb(255, 0, 0)));
        assert_eq!(config.stroke_width, Some(3.0));
        assert_eq!(config.fills.len(), 2);
        assert!((config.text_style.font_size - 20.0).abs() < f64::EPSILON);
        assert_eq!(config.text_style.color, CssColor::white());
        assert!((config.arrow_radius - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fill_palette_cycles() {
        let mut config = SketchConfig::default();
        assert_eq!(config.fill_for(3), None);

        config.fill = Some(CssColor::black());
        assert_eq!(config.fill_for(3), Some(CssColor::black()));

        config.fills = vec![CssColor::rgb(1, 0, 0), CssColor::rgb(2, 0, 0)];
        assert_eq!(config.fill_for(0), Some(CssColor::rgb(1, 0, 0)));
        assert_eq!(config.fill_for(3), Some(CssColor::rgb(2, 0, 0)));
    }

    #[test]
    fn test_patch_apply_only_set_fields() {
        let mut config = SketchConfig::default();
        let patch = ConfigPatch {
            editable: Some(true),
            stroke_width: Some(4.0),
            ..Default::default()
        };
        assert!(patch.touches_geometry());
        patch.apply(&mut config);

        assert!(config.editable);
        assert_eq!(config.stroke_width, Some(4.0));
        assert!(config.smooth);
        assert!(config.scalable);
    }

    #[test]
    fn test_patch_without_geometry_keys() {
        let patch: ConfigPatch = serde_json::from_value(json!({"editable": false})).unwrap();
        assert!(!patch.touches_geometry());
        assert_eq!(patch.editable, Some(false));
    }
}
