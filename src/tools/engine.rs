//! Routes pointer gestures to the tool that owns them.

use crate::tools::hit_test::hit_test;
use crate::tools::{
    PenTool, ShapeTool, Tool, ToolContext, ToolInput, ToolKind, TransformTool,
};

pub struct InteractionEngine {
    active: ToolKind,
    rectangle: ShapeTool,
    ellipse: ShapeTool,
    pen: PenTool,
    mover: TransformTool,
}

impl Default for InteractionEngine {
    fn default() -> Self {
        Self {
            active: ToolKind::None,
            rectangle: ShapeTool::rectangle(),
            ellipse: ShapeTool::ellipse(),
            pen: PenTool::new(),
            mover: TransformTool::new(),
        }
    }
}

impl InteractionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> ToolKind {
        self.active
    }

    /// Switches tools, abandoning any gesture in progress. Selection is kept.
    pub fn set_tool(&mut self, tool: ToolKind) {
        if tool != self.active {
            log::debug!("Tool {:?} -> {:?}", self.active, tool);
        }
        self.active = tool;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.rectangle.reset();
        self.ellipse.reset();
        self.pen.reset();
        self.mover.reset();
    }

    pub fn pen(&self) -> &PenTool {
        &self.pen
    }

    pub fn is_busy(&self) -> bool {
        self.rectangle.is_active() || self.ellipse.is_active() || self.mover.is_active()
    }

    /// Returns `true` when the layer store changed.
    pub fn handle(&mut self, ctx: &mut ToolContext<'_>, input: &ToolInput) -> bool {
        match *input {
            ToolInput::Press { pos } => match self.active {
                ToolKind::Rectangle => self.rectangle.update(ctx, input),
                ToolKind::Ellipse => self.ellipse.update(ctx, input),
                ToolKind::Pen => false,
                tool => match hit_test(ctx.layers.layers(), ctx.fonts, pos) {
                    None => {
                        let had = ctx.layers.selected_id().is_some();
                        ctx.layers.select(None);
                        had
                    }
                    Some(hit) if !hit.locked && tool.moves_layers() => {
                        self.mover.update(ctx, input)
                    }
                    Some(_) => false,
                },
            },
            ToolInput::Drag { .. } => {
                if self.rectangle.is_active() {
                    self.rectangle.update(ctx, input)
                } else if self.ellipse.is_active() {
                    self.ellipse.update(ctx, input)
                } else {
                    self.mover.update(ctx, input)
                }
            }
            ToolInput::Release => {
                self.rectangle.update(ctx, input);
                self.ellipse.update(ctx, input);
                self.mover.update(ctx, input);
                false
            }
            ToolInput::Click { .. } | ToolInput::DoubleClick { .. } => {
                if self.active == ToolKind::Pen {
                    self.pen.update(ctx, input)
                } else {
                    false
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::FontLibrary;
    use crate::layer_store::LayerStore;
    use crate::layers::{LayerKind, LayerPatch, VectorStyle};
    use egui::{Pos2, Vec2};

    struct Fixture {
        store: LayerStore,
        style: VectorStyle,
        fonts: FontLibrary,
        engine: InteractionEngine,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: LayerStore::new(),
                style: VectorStyle::default(),
                fonts: FontLibrary::default(),
                engine: InteractionEngine::new(),
            }
        }

        fn send(&mut self, input: ToolInput) -> bool {
            let mut ctx = ToolContext {
                layers: &mut self.store,
                style: &self.style,
                fonts: &self.fonts,
            };
            self.engine.handle(&mut ctx, &input)
        }

        fn gesture(&mut self, from: Pos2, to: Pos2) {
            self.send(ToolInput::Press { pos: from });
            self.send(ToolInput::Drag { pos: to });
            self.send(ToolInput::Release);
        }
    }

    #[test]
    fn test_rectangle_then_move() {
        let mut f = Fixture::new();
        f.engine.set_tool(ToolKind::Rectangle);
        f.gesture(Pos2::new(10.0, 10.0), Pos2::new(60.0, 40.0));
        let id = f.store.selected_id().unwrap();

        f.engine.set_tool(ToolKind::None);
        assert_eq!(f.store.selected_id(), Some(id));
        f.gesture(Pos2::new(20.0, 20.0), Pos2::new(30.0, 25.0));
        let layer = f.store.get(id).unwrap();
        assert_eq!(layer.position, Pos2::new(20.0, 15.0));
        assert!(matches!(layer.kind, LayerKind::Rectangle(ref s) if s.size == Vec2::new(50.0, 30.0)));
    }

    #[test]
    fn test_shape_tool_press_on_layer_creates_new_shape() {
        let mut f = Fixture::new();
        f.engine.set_tool(ToolKind::Ellipse);
        f.gesture(Pos2::new(0.0, 0.0), Pos2::new(100.0, 100.0));
        f.gesture(Pos2::new(50.0, 50.0), Pos2::new(70.0, 70.0));
        assert_eq!(f.store.len(), 2);
        assert_eq!(f.store.layers()[1].name, "Ellipse 2");
    }

    #[test]
    fn test_background_press_deselects_except_shape_and_pen() {
        let mut f = Fixture::new();
        f.engine.set_tool(ToolKind::Rectangle);
        f.gesture(Pos2::new(0.0, 0.0), Pos2::new(10.0, 10.0));
        let id = f.store.selected_id();
        assert!(id.is_some());

        f.engine.set_tool(ToolKind::Pen);
        f.send(ToolInput::Press { pos: Pos2::new(500.0, 500.0) });
        assert_eq!(f.store.selected_id(), id);

        f.engine.set_tool(ToolKind::Adjust);
        assert!(f.send(ToolInput::Press { pos: Pos2::new(500.0, 500.0) }));
        assert_eq!(f.store.selected_id(), None);
    }

    #[test]
    fn test_locked_layer_absorbs_press() {
        let mut f = Fixture::new();
        f.engine.set_tool(ToolKind::Rectangle);
        f.gesture(Pos2::new(0.0, 0.0), Pos2::new(50.0, 50.0));
        let id = f.store.selected_id().unwrap();
        f.store.set_locked(id, true);

        f.engine.set_tool(ToolKind::None);
        f.gesture(Pos2::new(10.0, 10.0), Pos2::new(40.0, 40.0));
        assert_eq!(f.store.get(id).unwrap().position, Pos2::ZERO);
        // The press landed on the layer, so the selection is untouched.
        assert_eq!(f.store.selected_id(), Some(id));
    }

    #[test]
    fn test_adjust_tool_does_not_drag() {
        let mut f = Fixture::new();
        f.engine.set_tool(ToolKind::Rectangle);
        f.gesture(Pos2::new(0.0, 0.0), Pos2::new(50.0, 50.0));
        let id = f.store.selected_id().unwrap();
        f.engine.set_tool(ToolKind::Adjust);
        f.gesture(Pos2::new(10.0, 10.0), Pos2::new(40.0, 40.0));
        assert_eq!(f.store.get(id).unwrap().position, Pos2::ZERO);
    }

    #[test]
    fn test_pen_via_engine() {
        let mut f = Fixture::new();
        f.engine.set_tool(ToolKind::Pen);
        for p in [Pos2::new(0.0, 0.0), Pos2::new(10.0, 10.0)] {
            f.send(ToolInput::Press { pos: p });
            f.send(ToolInput::Release);
            f.send(ToolInput::Click { pos: p });
        }
        assert_eq!(f.engine.pen().points().len(), 2);
        f.send(ToolInput::DoubleClick { pos: Pos2::new(10.0, 10.0) });
        assert_eq!(f.store.len(), 1);
        assert_eq!(f.store.selected_id(), None);
        assert!(f.engine.pen().points().is_empty());
    }

    #[test]
    fn test_hidden_layer_is_click_through() {
        let mut f = Fixture::new();
        f.engine.set_tool(ToolKind::Rectangle);
        f.gesture(Pos2::new(0.0, 0.0), Pos2::new(50.0, 50.0));
        let id = f.store.selected_id().unwrap();
        f.store.update(id, &LayerPatch { visible: Some(false), ..Default::default() });
        f.engine.set_tool(ToolKind::None);
        f.gesture(Pos2::new(10.0, 10.0), Pos2::new(30.0, 30.0));
        assert_eq!(f.store.get(id).unwrap().position, Pos2::ZERO);
        assert_eq!(f.store.selected_id(), None);
    }
}
