use crate::layers::{LayerId, LayerPatch};
use crate::tools::hit_test::hit_test;
use crate::tools::{Tool, ToolContext, ToolInput};
use egui::Pos2;

#[derive(Clone, Copy, Debug)]
struct DragState {
    id: LayerId,
    start: Pos2,
    initial: Pos2,
}

/// Moves an existing layer by dragging it.
#[derive(Default)]
pub struct TransformTool {
    drag: Option<DragState>,
}

impl TransformTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dragging(&self) -> Option<LayerId> {
        self.drag.map(|d| d.id)
    }

    fn begin(&mut self, ctx: &mut ToolContext<'_>, pos: Pos2) -> bool {
        let Some(hit) = hit_test(ctx.layers.layers(), ctx.fonts, pos) else {
            return false;
        };
        let Some(layer) = ctx.layers.get(hit.id) else {
            return false;
        };
        if layer.locked || !layer.visible {
            return false;
        }
        self.drag = Some(DragState {
            id: layer.id,
            start: pos,
            initial: layer.position,
        });
        ctx.layers.select(Some(hit.id));
        true
    }

    fn move_to(&mut self, ctx: &mut ToolContext<'_>, pos: Pos2) -> bool {
        let Some(drag) = self.drag else {
            return false;
        };
        // Lock state is read on every move so a lock taken mid-drag sticks.
        match ctx.layers.get(drag.id) {
            Some(layer) if !layer.locked => {}
            _ => return false,
        }
        let target = drag.initial + (pos - drag.start);
        ctx.layers.update(drag.id, &LayerPatch::position(target))
    }
}

impl Tool for TransformTool {
    fn name(&self) -> &str {
        "Move"
    }

    fn update(&mut self, ctx: &mut ToolContext<'_>, input: &ToolInput) -> bool {
        match *input {
            ToolInput::Press { pos } => self.begin(ctx, pos),
            ToolInput::Drag { pos } => self.move_to(ctx, pos),
            ToolInput::Release => {
                self.drag = None;
                false
            }
            ToolInput::Click { .. } | ToolInput::DoubleClick { .. } => false,
        }
    }

    fn reset(&mut self) {
        self.drag = None;
    }

    fn is_active(&self) -> bool {
        self.drag.is_some()
    }
}
