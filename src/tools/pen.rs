use crate::layers::{Layer, LayerKind, LayerPatch, LayerType};
use crate::tools::{Tool, ToolContext, ToolInput};
use egui::Pos2;

/// Click-to-add polyline tool. Clicks extend the selected path, or start a
/// new one from the points gathered so far; a double-click ends the path.
#[derive(Default)]
pub struct PenTool {
    points: Vec<Pos2>,
}

impl PenTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[Pos2] {
        &self.points
    }

    fn add_point(&mut self, ctx: &mut ToolContext<'_>, pos: Pos2) -> bool {
        self.points.push(pos);

        let selected_path = ctx.layers.selected().and_then(|l| match &l.kind {
            LayerKind::Path(p) => Some((l.id, l.locked, l.position, p.points.clone())),
            _ => None,
        });

        match selected_path {
            Some((_, true, _, _)) => false,
            Some((id, false, offset, mut points)) => {
                points.push(pos - offset.to_vec2());
                ctx.layers.update(id, &LayerPatch::points(points))
            }
            None => {
                let id = ctx.layers.next_id();
                let name = ctx.layers.next_name(LayerType::Path);
                let layer = Layer::new_path(id, name, self.points.clone(), ctx.style);
                let added = ctx.layers.add(layer);
                if added {
                    ctx.layers.select(Some(id));
                }
                added
            }
        }
    }

    fn finish(&mut self, ctx: &mut ToolContext<'_>) -> bool {
        self.points.clear();
        let had_selection = ctx.layers.selected_id().is_some();
        ctx.layers.select(None);
        had_selection
    }
}

impl Tool for PenTool {
    fn name(&self) -> &str {
        "Pen"
    }

    fn update(&mut self, ctx: &mut ToolContext<'_>, input: &ToolInput) -> bool {
        match *input {
            ToolInput::Click { pos } => self.add_point(ctx, pos),
            ToolInput::DoubleClick { .. } => self.finish(ctx),
            ToolInput::Press { .. } | ToolInput::Drag { .. } | ToolInput::Release => false,
        }
    }

    fn reset(&mut self) {
        self.points.clear();
    }

    fn is_active(&self) -> bool {
        !self.points.is_empty()
    }
}
