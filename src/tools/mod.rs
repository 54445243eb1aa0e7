pub mod engine;
pub mod pen;
pub mod shape;
pub mod transform;

use crate::fonts::FontLibrary;
use crate::layer_store::LayerStore;
use crate::layers::VectorStyle;
use egui::{Pos2, Vec2};

pub use engine::InteractionEngine;
pub use pen::PenTool;
pub use shape::ShapeTool;
pub use transform::TransformTool;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ToolKind {
    #[default]
    None,
    Adjust,
    Text,
    Rectangle,
    Ellipse,
    Pen,
    Grid,
    Print,
    Ai,
    AiEdit,
    Video,
}

impl ToolKind {
    pub fn label(&self) -> &'static str {
        match self {
            ToolKind::None => "Select",
            ToolKind::Adjust => "Adjust",
            ToolKind::Text => "Text",
            ToolKind::Rectangle => "Rectangle",
            ToolKind::Ellipse => "Ellipse",
            ToolKind::Pen => "Pen",
            ToolKind::Grid => "Grid",
            ToolKind::Print => "Print",
            ToolKind::Ai => "AI Analysis",
            ToolKind::AiEdit => "AI Edit",
            ToolKind::Video => "Video",
        }
    }

    /// Tools that drag existing layers on pointer-down.
    pub fn moves_layers(&self) -> bool {
        matches!(self, ToolKind::None | ToolKind::Text)
    }
}

/// Pointer events with positions already in image space.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ToolInput {
    Press { pos: Pos2 },
    Drag { pos: Pos2 },
    Release,
    Click { pos: Pos2 },
    DoubleClick { pos: Pos2 },
}

/// What a tool may touch while handling an event.
pub struct ToolContext<'a> {
    pub layers: &'a mut LayerStore,
    pub style: &'a VectorStyle,
    pub fonts: &'a FontLibrary,
}

pub trait Tool {
    fn name(&self) -> &str;

    /// Returns `true` when the layer store changed.
    fn update(&mut self, ctx: &mut ToolContext<'_>, input: &ToolInput) -> bool;

    /// Drops any gesture in progress.
    fn reset(&mut self);

    fn is_active(&self) -> bool;
}

/// Maps screen positions into unscaled image pixels.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Viewport {
    pub zoom: f32,
    /// Screen position of the image's top-left corner.
    pub origin: Pos2,
}

impl Viewport {
    pub fn screen_to_image(&self, screen: Pos2) -> Pos2 {
        let zoom = if self.zoom > 0.0 { self.zoom } else { 1.0 };
        Pos2::ZERO + (screen - self.origin) / zoom
    }

    pub fn image_to_screen(&self, image: Pos2) -> Pos2 {
        self.origin + image.to_vec2() * self.zoom
    }

    pub fn scale(&self, v: Vec2) -> Vec2 {
        v * self.zoom
    }
}
