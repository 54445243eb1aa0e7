use crate::layers::{Layer, LayerId, LayerPatch, LayerType};
use crate::tools::{Tool, ToolContext, ToolInput};
use egui::{Pos2, Vec2};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ShapeKind {
    Rectangle,
    Ellipse,
}

#[derive(Clone, Copy, Debug)]
struct Drawing {
    id: LayerId,
    anchor: Pos2,
}

/// Press-drag-release creation of rectangle and ellipse layers.
pub struct ShapeTool {
    kind: ShapeKind,
    drawing: Option<Drawing>,
}

impl ShapeTool {
    pub fn rectangle() -> Self {
        Self {
            kind: ShapeKind::Rectangle,
            drawing: None,
        }
    }

    pub fn ellipse() -> Self {
        Self {
            kind: ShapeKind::Ellipse,
            drawing: None,
        }
    }

    pub fn drawing_id(&self) -> Option<LayerId> {
        self.drawing.map(|d| d.id)
    }

    fn start(&mut self, ctx: &mut ToolContext<'_>, pos: Pos2) -> bool {
        let id = ctx.layers.next_id();
        let layer = match self.kind {
            ShapeKind::Rectangle => {
                let name = ctx.layers.next_name(LayerType::Rectangle);
                Layer::new_rectangle(id, name, pos, ctx.style)
            }
            ShapeKind::Ellipse => {
                let name = ctx.layers.next_name(LayerType::Ellipse);
                Layer::new_ellipse(id, name, pos, ctx.style)
            }
        };
        if !ctx.layers.add(layer) {
            return false;
        }
        ctx.layers.select(Some(id));
        self.drawing = Some(Drawing { id, anchor: pos });
        true
    }
}

/// Normalized bounds spanned by `anchor` and `current`.
pub fn span(anchor: Pos2, current: Pos2) -> (Pos2, Vec2) {
    let min = anchor.min(current);
    let size = (current - anchor).abs();
    (min, size)
}

impl Tool for ShapeTool {
    fn name(&self) -> &str {
        match self.kind {
            ShapeKind::Rectangle => "Rectangle",
            ShapeKind::Ellipse => "Ellipse",
        }
    }

    fn update(&mut self, ctx: &mut ToolContext<'_>, input: &ToolInput) -> bool {
        match *input {
            ToolInput::Press { pos } => self.start(ctx, pos),
            ToolInput::Drag { pos } => match self.drawing {
                Some(d) => {
                    let (min, size) = span(d.anchor, pos);
                    ctx.layers.update(d.id, &LayerPatch::geometry(min, size))
                }
                None => false,
            },
            ToolInput::Release => {
                self.drawing = None;
                false
            }
            ToolInput::Click { .. } | ToolInput::DoubleClick { .. } => false,
        }
    }

    fn reset(&mut self) {
        self.drawing = None;
    }

    fn is_active(&self) -> bool {
        self.drawing.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::FontLibrary;
    use crate::layer_store::LayerStore;
    use crate::layers::{LayerKind, VectorStyle};

    #[test]
    fn test_span_normalizes() {
        let (min, size) = span(Pos2::new(50.0, 50.0), Pos2::new(20.0, 80.0));
        assert_eq!(min, Pos2::new(20.0, 50.0));
        assert_eq!(size, Vec2::new(30.0, 30.0));
    }

    #[test]
    fn test_press_drag_release() {
        let mut store = LayerStore::new();
        let style = VectorStyle::default();
        let fonts = FontLibrary::default();
        let mut ctx = ToolContext {
            layers: &mut store,
            style: &style,
            fonts: &fonts,
        };
        let mut tool = ShapeTool::ellipse();

        assert!(tool.update(&mut ctx, &ToolInput::Press { pos: Pos2::new(10.0, 10.0) }));
        let id = tool.drawing_id().unwrap();
        assert_eq!(ctx.layers.selected_id(), Some(id));
        assert_eq!(ctx.layers.get(id).unwrap().name, "Ellipse 1");

        tool.update(&mut ctx, &ToolInput::Drag { pos: Pos2::new(4.0, 30.0) });
        tool.update(&mut ctx, &ToolInput::Release);
        assert!(!tool.is_active());

        let layer = ctx.layers.get(id).unwrap();
        assert_eq!(layer.position, Pos2::new(4.0, 10.0));
        match &layer.kind {
            LayerKind::Ellipse(s) => assert_eq!(s.size, Vec2::new(6.0, 20.0)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_degenerate_shape_persists() {
        let mut store = LayerStore::new();
        let style = VectorStyle::default();
        let fonts = FontLibrary::default();
        let mut ctx = ToolContext {
            layers: &mut store,
            style: &style,
            fonts: &fonts,
        };
        let mut tool = ShapeTool::rectangle();
        tool.update(&mut ctx, &ToolInput::Press { pos: Pos2::new(5.0, 5.0) });
        tool.update(&mut ctx, &ToolInput::Release);
        assert_eq!(ctx.layers.len(), 1);
        let bounds = ctx.layers.layers()[0].bounds().unwrap();
        assert_eq!(bounds.size(), Vec2::ZERO);
    }
}
