use crate::color::{Cmyk, Paint, Rgb};
use egui::{Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct LayerId(pub u64);

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl BlendMode {
    pub fn all() -> &'static [BlendMode] {
        &[
            BlendMode::Normal,
            BlendMode::Multiply,
            BlendMode::Screen,
            BlendMode::Overlay,
            BlendMode::Darken,
            BlendMode::Lighten,
            BlendMode::ColorDodge,
            BlendMode::ColorBurn,
            BlendMode::HardLight,
            BlendMode::SoftLight,
            BlendMode::Difference,
            BlendMode::Exclusion,
            BlendMode::Hue,
            BlendMode::Saturation,
            BlendMode::Color,
            BlendMode::Luminosity,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            BlendMode::Normal => "Normal",
            BlendMode::Multiply => "Multiply",
            BlendMode::Screen => "Screen",
            BlendMode::Overlay => "Overlay",
            BlendMode::Darken => "Darken",
            BlendMode::Lighten => "Lighten",
            BlendMode::ColorDodge => "Color Dodge",
            BlendMode::ColorBurn => "Color Burn",
            BlendMode::HardLight => "Hard Light",
            BlendMode::SoftLight => "Soft Light",
            BlendMode::Difference => "Difference",
            BlendMode::Exclusion => "Exclusion",
            BlendMode::Hue => "Hue",
            BlendMode::Saturation => "Saturation",
            BlendMode::Color => "Color",
            BlendMode::Luminosity => "Luminosity",
        }
    }
}

/// Style stamped onto new shape/path layers while nothing is selected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VectorStyle {
    pub fill_color: Paint,
    pub stroke_color: Paint,
    pub stroke_width: f32,
    pub opacity: f32,
    pub stroke_opacity: f32,
    pub fill_cmyk: Option<Cmyk>,
    pub stroke_cmyk: Option<Cmyk>,
}

impl Default for VectorStyle {
    fn default() -> Self {
        Self {
            fill_color: Paint::Transparent,
            stroke_color: Paint::Solid(Rgb::new(0xef, 0x44, 0x44)),
            stroke_width: 4.0,
            opacity: 1.0,
            stroke_opacity: 1.0,
            fill_cmyk: None,
            stroke_cmyk: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StylePatch {
    pub fill_color: Option<Paint>,
    pub stroke_color: Option<Paint>,
    pub stroke_width: Option<f32>,
    pub opacity: Option<f32>,
    pub stroke_opacity: Option<f32>,
    pub fill_cmyk: Option<Cmyk>,
    pub stroke_cmyk: Option<Cmyk>,
}

impl StylePatch {
    pub fn is_empty(&self) -> bool {
        *self == StylePatch::default()
    }
}

impl VectorStyle {
    pub fn apply(&mut self, patch: &StylePatch) {
        if let Some(v) = patch.fill_color {
            self.fill_color = v;
        }
        if let Some(v) = patch.stroke_color {
            self.stroke_color = v;
        }
        if let Some(v) = patch.stroke_width {
            self.stroke_width = v.max(0.0);
        }
        if let Some(v) = patch.opacity {
            self.opacity = v.clamp(0.0, 1.0);
        }
        if let Some(v) = patch.stroke_opacity {
            self.stroke_opacity = v.clamp(0.0, 1.0);
        }
        if patch.fill_cmyk.is_some() {
            self.fill_cmyk = patch.fill_cmyk;
        }
        if patch.stroke_cmyk.is_some() {
            self.stroke_cmyk = patch.stroke_cmyk;
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextProps {
    pub text: String,
    pub font_size: f32,
    pub color: Rgb,
    pub font_family: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShapeProps {
    pub size: Vec2,
    pub style: VectorStyle,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathProps {
    pub points: Vec<Pos2>,
    pub style: VectorStyle,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LayerKind {
    Text(TextProps),
    Rectangle(ShapeProps),
    Ellipse(ShapeProps),
    Path(PathProps),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LayerType {
    Text,
    Rectangle,
    Ellipse,
    Path,
}

impl LayerType {
    pub fn label(&self) -> &'static str {
        match self {
            LayerType::Text => "Text Layer",
            LayerType::Rectangle => "Rectangle",
            LayerType::Ellipse => "Ellipse",
            LayerType::Path => "Path",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub position: Pos2,
    pub rotation: f32,
    pub visible: bool,
    pub locked: bool,
    pub opacity: f32,
    pub blend: BlendMode,
    pub kind: LayerKind,
}

impl Layer {
    fn with_kind(id: LayerId, name: String, position: Pos2, opacity: f32, kind: LayerKind) -> Self {
        Self {
            id,
            name,
            position,
            rotation: 0.0,
            visible: true,
            locked: false,
            opacity,
            blend: BlendMode::Normal,
            kind,
        }
    }

    pub fn new_text(id: LayerId, name: String, position: Pos2, text: TextProps) -> Self {
        Self::with_kind(id, name, position, 1.0, LayerKind::Text(text))
    }

    pub fn new_rectangle(id: LayerId, name: String, position: Pos2, style: &VectorStyle) -> Self {
        let props = ShapeProps {
            size: Vec2::ZERO,
            style: style.clone(),
        };
        Self::with_kind(id, name, position, style.opacity, LayerKind::Rectangle(props))
    }

    pub fn new_ellipse(id: LayerId, name: String, position: Pos2, style: &VectorStyle) -> Self {
        let props = ShapeProps {
            size: Vec2::ZERO,
            style: style.clone(),
        };
        Self::with_kind(id, name, position, style.opacity, LayerKind::Ellipse(props))
    }

    /// Paths never fill, whatever the template says.
    pub fn new_path(id: LayerId, name: String, points: Vec<Pos2>, style: &VectorStyle) -> Self {
        let mut style = style.clone();
        style.fill_color = Paint::Transparent;
        let opacity = style.opacity;
        let props = PathProps { points, style };
        Self::with_kind(id, name, Pos2::ZERO, opacity, LayerKind::Path(props))
    }

    pub fn layer_type(&self) -> LayerType {
        match &self.kind {
            LayerKind::Text(_) => LayerType::Text,
            LayerKind::Rectangle(_) => LayerType::Rectangle,
            LayerKind::Ellipse(_) => LayerType::Ellipse,
            LayerKind::Path(_) => LayerType::Path,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, LayerKind::Text(_))
    }

    pub fn style(&self) -> Option<&VectorStyle> {
        match &self.kind {
            LayerKind::Rectangle(s) | LayerKind::Ellipse(s) => Some(&s.style),
            LayerKind::Path(p) => Some(&p.style),
            LayerKind::Text(_) => None,
        }
    }

    pub fn style_mut(&mut self) -> Option<&mut VectorStyle> {
        match &mut self.kind {
            LayerKind::Rectangle(s) | LayerKind::Ellipse(s) => Some(&mut s.style),
            LayerKind::Path(p) => Some(&mut p.style),
            LayerKind::Text(_) => None,
        }
    }

    /// Bounds of shape layers in image space. Paths report the hull of their
    /// points; text has no stored extent.
    pub fn bounds(&self) -> Option<Rect> {
        match &self.kind {
            LayerKind::Rectangle(s) | LayerKind::Ellipse(s) => {
                Some(Rect::from_min_size(self.position, s.size))
            }
            LayerKind::Path(p) => {
                let first = p.points.first()?;
                let start = Rect::from_min_max(*first, *first);
                let hull = p
                    .points
                    .iter()
                    .fold(start, |r, pt| r.union(Rect::from_min_max(*pt, *pt)));
                Some(hull.translate(self.position.to_vec2()))
            }
            LayerKind::Text(_) => None,
        }
    }

    /// Shallow merge. Fields that do not exist on this variant are ignored.
    pub fn apply(&mut self, patch: &LayerPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(pos) = patch.position {
            self.position = pos;
        }
        if let Some(rotation) = patch.rotation {
            self.rotation = rotation;
        }
        if let Some(visible) = patch.visible {
            self.visible = visible;
        }
        if let Some(locked) = patch.locked {
            self.locked = locked;
        }
        if let Some(opacity) = patch.opacity.or(patch.style.opacity) {
            self.opacity = opacity.clamp(0.0, 1.0);
        }
        if let Some(blend) = patch.blend {
            self.blend = blend;
        }

        match &mut self.kind {
            LayerKind::Text(t) => {
                if let Some(text) = &patch.text {
                    t.text = text.clone();
                }
                if let Some(size) = patch.font_size {
                    t.font_size = size.max(1.0);
                }
                if let Some(color) = patch.color {
                    t.color = color;
                }
                if let Some(family) = &patch.font_family {
                    t.font_family = family.clone();
                }
            }
            LayerKind::Rectangle(s) | LayerKind::Ellipse(s) => {
                if let Some(size) = patch.size {
                    s.size = Vec2::new(size.x.max(0.0), size.y.max(0.0));
                }
                s.style.apply(&patch.style);
            }
            LayerKind::Path(p) => {
                if let Some(points) = &patch.points {
                    p.points = points.clone();
                }
                let mut style = patch.style.clone();
                style.fill_color = None;
                p.style.apply(&style);
            }
        }
    }
}

/// Partial update for `Layer::apply`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayerPatch {
    pub name: Option<String>,
    pub position: Option<Pos2>,
    pub rotation: Option<f32>,
    pub visible: Option<bool>,
    pub locked: Option<bool>,
    pub opacity: Option<f32>,
    pub blend: Option<BlendMode>,
    pub text: Option<String>,
    pub font_size: Option<f32>,
    pub color: Option<Rgb>,
    pub font_family: Option<String>,
    pub size: Option<Vec2>,
    pub points: Option<Vec<Pos2>>,
    pub style: StylePatch,
}

impl LayerPatch {
    pub fn position(pos: Pos2) -> Self {
        Self {
            position: Some(pos),
            ..Default::default()
        }
    }

    pub fn geometry(pos: Pos2, size: Vec2) -> Self {
        Self {
            position: Some(pos),
            size: Some(size),
            ..Default::default()
        }
    }

    pub fn points(points: Vec<Pos2>) -> Self {
        Self {
            points: Some(points),
            ..Default::default()
        }
    }

    pub fn style(style: StylePatch) -> Self {
        Self {
            style,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_layer() -> Layer {
        Layer::new_rectangle(
            LayerId(1),
            "Rectangle 1".into(),
            Pos2::new(10.0, 20.0),
            &VectorStyle::default(),
        )
    }

    #[test]
    fn test_new_shape_is_zero_sized_with_template_style() {
        let layer = rect_layer();
        assert_eq!(layer.bounds(), Some(Rect::from_min_size(Pos2::new(10.0, 20.0), Vec2::ZERO)));
        assert_eq!(layer.style(), Some(&VectorStyle::default()));
        assert!(layer.visible);
        assert!(!layer.locked);
    }

    #[test]
    fn test_patch_ignores_foreign_fields() {
        let mut layer = rect_layer();
        let patch = LayerPatch {
            text: Some("ignored".into()),
            font_size: Some(99.0),
            points: Some(vec![Pos2::ZERO]),
            size: Some(Vec2::new(30.0, 40.0)),
            ..Default::default()
        };
        layer.apply(&patch);
        match &layer.kind {
            LayerKind::Rectangle(s) => assert_eq!(s.size, Vec2::new(30.0, 40.0)),
            other => panic!("variant changed: {other:?}"),
        }
    }

    #[test]
    fn test_path_keeps_no_fill() {
        let style = VectorStyle {
            fill_color: Paint::solid("#00ff00"),
            ..Default::default()
        };
        let mut layer = Layer::new_path(LayerId(2), "Path 1".into(), vec![Pos2::ZERO], &style);
        assert_eq!(layer.style().map(|s| s.fill_color), Some(Paint::Transparent));

        layer.apply(&LayerPatch::style(StylePatch {
            fill_color: Some(Paint::solid("#0000ff")),
            stroke_width: Some(9.0),
            ..Default::default()
        }));
        let style = layer.style().cloned().unwrap_or_default();
        assert_eq!(style.fill_color, Paint::Transparent);
        assert_eq!(style.stroke_width, 9.0);
    }

    #[test]
    fn test_text_patch() {
        let mut layer = Layer::new_text(
            LayerId(3),
            "Text Layer 1".into(),
            Pos2::ZERO,
            TextProps {
                text: "hi".into(),
                font_size: 32.0,
                color: Rgb::WHITE,
                font_family: "Inter".into(),
            },
        );
        layer.apply(&LayerPatch {
            text: Some("hello".into()),
            opacity: Some(4.0),
            size: Some(Vec2::splat(5.0)),
            ..Default::default()
        });
        assert_eq!(layer.opacity, 1.0);
        match &layer.kind {
            LayerKind::Text(t) => assert_eq!(t.text, "hello"),
            other => panic!("variant changed: {other:?}"),
        }
        assert_eq!(layer.bounds(), None);
    }

    #[test]
    fn test_path_bounds_follow_points() {
        let layer = Layer::new_path(
            LayerId(4),
            "Path 1".into(),
            vec![Pos2::new(5.0, 9.0), Pos2::new(1.0, 3.0), Pos2::new(7.0, 4.0)],
            &VectorStyle::default(),
        );
        assert_eq!(
            layer.bounds(),
            Some(Rect::from_min_max(Pos2::new(1.0, 3.0), Pos2::new(7.0, 9.0)))
        );
    }

    #[test]
    fn test_sixteen_blend_modes() {
        assert_eq!(BlendMode::all().len(), 16);
    }
}
