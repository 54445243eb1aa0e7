use eframe::egui::{
    self, Align2, Color32, Context, FontId, PointerButton, Pos2, Rect, ScrollArea, Sense, Stroke,
    TextureOptions, Ui, Vec2,
};
use eframe::Frame;
use printmaster::ai::UnavailableAiService;
use printmaster::color::{Cmyk, Paint, Rgb};
use printmaster::composite::{FlattenOptions, RenderItem, Rulers};
use printmaster::filters::FilterParam;
use printmaster::image_store::Histogram;
use printmaster::layers::{BlendMode, LayerKind, LayerPatch, StylePatch};
use printmaster::print::{PaperType, RenderingIntent, DPI_PRESETS};
use printmaster::state::{default_export_name, Admission, PaintTarget};
use printmaster::tools::{ToolInput, ToolKind, Viewport};
use printmaster::{AppState, EditorConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

const RULER_SIZE: f32 = 20.0;
const SELECTION_COLOR: Color32 = Color32::from_rgb(96, 165, 250);

pub struct PrintMasterApp {
    state: AppState,
    texture: Option<egui::TextureHandle>,
    dirty: bool,
    histogram: Option<Histogram>,
    edit_prompt: String,
    video_prompt: String,
    /// Hex field text for fill and stroke while it is being typed.
    hex_inputs: [String; 2],
}

impl PrintMasterApp {
    pub fn new(cc: &eframe::CreationContext<'_>, runtime: Option<Handle>) -> Self {
        let mut visuals = egui::Visuals::dark();
        visuals.window_fill = Color32::from_rgb(24, 24, 27);
        visuals.panel_fill = Color32::from_rgb(24, 24, 27);
        visuals.extreme_bg_color = Color32::from_rgb(9, 9, 11);
        cc.egui_ctx.set_visuals(visuals);

        Self {
            state: AppState::new(EditorConfig::default(), Arc::new(UnavailableAiService), runtime),
            texture: None,
            dirty: true,
            histogram: None,
            edit_prompt: String::new(),
            video_prompt: String::new(),
            hex_inputs: Default::default(),
        }
    }

    fn update_texture(&mut self, ctx: &Context) {
        if !self.dirty {
            return;
        }
        self.dirty = false;
        self.histogram = self.state.histogram();
        self.texture = self
            .state
            .flatten(FlattenOptions::default())
            .map(|flat| {
                let color_image = egui::ColorImage::from_rgba_unmultiplied(
                    [flat.width() as usize, flat.height() as usize],
                    flat.as_raw(),
                );
                ctx.load_texture("composite", color_image, TextureOptions::LINEAR)
            });
    }

    fn open_image(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Image", &["png", "jpg", "jpeg", "bmp", "webp", "tif", "tiff"])
            .pick_file()
        else {
            return;
        };
        match self.state.open_file(&path) {
            Ok(Admission::Admitted) => self.dirty = true,
            Ok(Admission::AwaitingDecision) => {}
            Err(e) => {
                log::error!("Failed to open: {:#}", e);
                self.state.notices.push(format!("Could not open image: {e:#}"));
            }
        }
    }

    fn export(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG", &["png"])
            .set_file_name(default_export_name())
            .save_file()
        else {
            return;
        };
        if let Err(e) = self.state.export_png(&path) {
            log::error!("Failed to export: {:#}", e);
            self.state.notices.push(format!("Export failed: {e:#}"));
        }
    }

    fn upload_profile(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("ICC profile", &["icc", "icm"])
            .pick_file()
        {
            match std::fs::read(&path) {
                Ok(bytes) => {
                    let name = file_name(&path);
                    self.state.upload_profile(&name, bytes);
                    self.dirty = true;
                }
                Err(e) => log::warn!("Failed to read profile {}: {}", path.display(), e),
            }
        }
    }

    fn upload_font(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Font", &["ttf", "otf"])
            .pick_file()
        {
            match std::fs::read(&path) {
                Ok(bytes) => {
                    let name = file_name(&path);
                    self.state.add_font(&name, bytes);
                    self.dirty = true;
                }
                Err(e) => log::warn!("Failed to read font {}: {}", path.display(), e),
            }
        }
    }

    fn top_bar(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.heading("PrintMaster");
            ui.separator();

            if ui.button("Open").clicked() {
                self.open_image();
            }
            let has_image = self.state.image.is_some();
            if ui.add_enabled(has_image, egui::Button::new("Export")).clicked() {
                self.export();
            }

            ui.separator();
            for tool in [
                ToolKind::Adjust,
                ToolKind::Text,
                ToolKind::Rectangle,
                ToolKind::Ellipse,
                ToolKind::Pen,
                ToolKind::Grid,
                ToolKind::Print,
                ToolKind::Ai,
                ToolKind::AiEdit,
                ToolKind::Video,
            ] {
                let active = self.state.engine.active() == tool;
                if ui.selectable_label(active, tool.label()).clicked() {
                    self.state.toggle_tool(tool);
                    if tool == ToolKind::Text && self.state.engine.active() == ToolKind::Text {
                        self.state.add_text_layer();
                        self.dirty = true;
                    }
                }
            }

            ui.separator();
            if ui.button("-").clicked() {
                self.state.zoom_out();
            }
            ui.label(format!("{:.0}%", self.state.zoom * 100.0));
            if ui.button("+").clicked() {
                self.state.zoom_in();
            }
        });
    }

    fn tool_panel(&mut self, ui: &mut Ui) {
        match self.state.engine.active() {
            ToolKind::None | ToolKind::Adjust => self.adjust_panel(ui),
            ToolKind::Text => self.text_panel(ui),
            ToolKind::Rectangle | ToolKind::Ellipse | ToolKind::Pen => self.style_panel(ui),
            ToolKind::Grid => self.grid_panel(ui),
            ToolKind::Print => self.print_panel(ui),
            ToolKind::Ai => self.analysis_panel(ui),
            ToolKind::AiEdit => self.edit_panel(ui),
            ToolKind::Video => self.video_panel(ui),
        }
    }

    fn adjust_panel(&mut self, ui: &mut Ui) {
        ui.heading("Adjustments");
        let mut changed = false;
        for (title, params) in [("Classic", &FilterParam::CLASSIC[..]), ("Pro", &FilterParam::PRO[..])] {
            ui.label(title);
            for param in params {
                let value = self.state.filters.get_mut(*param);
                changed |= ui
                    .add(egui::Slider::new(value, param.range()).text(param.label()))
                    .changed();
            }
            ui.separator();
        }
        if ui.button("Reset").clicked() {
            self.state.filters.reset();
            changed = true;
        }
        if changed {
            self.dirty = true;
        }

        if let Some(h) = &self.histogram {
            ui.separator();
            ui.label("Histogram");
            draw_histogram(ui, h);
        }
    }

    fn text_panel(&mut self, ui: &mut Ui) {
        ui.heading("Text");
        if ui.button("Add text").clicked() {
            self.state.add_text_layer();
            self.dirty = true;
        }

        let selected = self.state.layers.selected().and_then(|l| match &l.kind {
            LayerKind::Text(t) => Some((l.id, l.rotation, t.clone())),
            _ => None,
        });
        let Some((id, rotation, props)) = selected else {
            ui.label("Select a text layer to edit it.");
            return;
        };
        let mut text = props.text.clone();
        let mut color = [props.color.r, props.color.g, props.color.b];
        let mut family = props.font_family.clone();
        let mut rotation = rotation;

        if ui.text_edit_multiline(&mut text).changed() {
            self.state.set_text(id, &text);
            self.dirty = true;
        }
        ui.horizontal(|ui| {
            if ui.button("A-").clicked() {
                self.dirty |= self.state.nudge_font_size(id, -2.0);
            }
            if ui.button("A+").clicked() {
                self.dirty |= self.state.nudge_font_size(id, 2.0);
            }
        });

        let mut patch = LayerPatch::default();
        if ui.color_edit_button_srgb(&mut color).changed() {
            patch.color = Some(Rgb::new(color[0], color[1], color[2]));
        }
        egui::ComboBox::from_label("Font")
            .selected_text(family.clone())
            .show_ui(ui, |ui| {
                for f in self.state.fonts.families() {
                    ui.selectable_value(&mut family, f.clone(), f.as_str());
                }
            });
        if family != props.font_family {
            patch.font_family = Some(family);
        }
        if ui
            .add(egui::Slider::new(&mut rotation, -180.0..=180.0).text("Rotation"))
            .changed()
        {
            patch.rotation = Some(rotation);
        }
        if patch != LayerPatch::default() {
            self.state.update_selected_layer(&patch);
            self.dirty = true;
        }

        if ui.button("Upload font").clicked() {
            self.upload_font();
        }
    }

    fn style_panel(&mut self, ui: &mut Ui) {
        ui.heading("Style");
        let selected = self.state.layers.selected().and_then(|l| l.style().cloned());
        let editing_layer = selected.is_some();
        ui.label(if editing_layer {
            "Editing selected layer"
        } else {
            "Default for new shapes"
        });

        let mut style = selected.unwrap_or_else(|| self.state.default_style.clone());
        let [fill_hex, stroke_hex] = &mut self.hex_inputs;
        let edits = [
            (PaintTarget::Fill, cmyk_picker(ui, "Fill", style.fill_color, style.fill_cmyk, fill_hex)),
            (PaintTarget::Stroke, cmyk_picker(ui, "Stroke", style.stroke_color, style.stroke_cmyk, stroke_hex)),
        ];
        for (target, edit) in edits {
            let changed = match edit {
                Some(PaintEdit::Paint(paint)) => self.state.set_paint(target, paint),
                Some(PaintEdit::Cmyk(cmyk)) => self.state.set_paint_cmyk(target, cmyk),
                Some(PaintEdit::Hex(text)) => self.state.set_paint_hex(target, &text),
                None => false,
            };
            self.dirty |= changed && editing_layer;
        }

        let before = (style.stroke_width, style.stroke_opacity, style.opacity);
        ui.add(egui::Slider::new(&mut style.stroke_width, 0.0..=50.0).text("Stroke width"));
        ui.add(egui::Slider::new(&mut style.stroke_opacity, 0.0..=1.0).text("Stroke opacity"));
        ui.add(egui::Slider::new(&mut style.opacity, 0.0..=1.0).text("Opacity"));

        if (style.stroke_width, style.stroke_opacity, style.opacity) != before {
            let patch = StylePatch {
                stroke_width: Some(style.stroke_width),
                stroke_opacity: Some(style.stroke_opacity),
                opacity: Some(style.opacity),
                ..Default::default()
            };
            if editing_layer {
                self.state.update_selected_layer(&LayerPatch::style(patch));
                self.dirty = true;
            } else {
                self.state.update_default_style(&patch);
            }
        }

        if self.state.engine.active() == ToolKind::Pen {
            ui.separator();
            ui.label(format!("{} points, double-click to finish", self.state.engine.pen().points().len()));
        }
    }

    fn grid_panel(&mut self, ui: &mut Ui) {
        ui.heading("Grid & Rulers");
        let before = (self.state.grid, self.state.view);
        let grid = &mut self.state.grid;
        ui.checkbox(&mut grid.enabled, "Show grid");
        ui.add(egui::Slider::new(&mut grid.spacing, 10.0..=200.0).text("Spacing"));
        ui.add(egui::Slider::new(&mut grid.opacity, 0.0..=1.0).text("Opacity"));
        let mut color = [grid.color.r, grid.color.g, grid.color.b];
        if ui.color_edit_button_srgb(&mut color).changed() {
            grid.color = Rgb::new(color[0], color[1], color[2]);
        }
        ui.checkbox(&mut self.state.view.show_rulers, "Show rulers");
        if before != (self.state.grid, self.state.view) {
            self.dirty = true;
        }
    }

    fn print_panel(&mut self, ui: &mut Ui) {
        ui.heading("Print");
        let before = self.state.print.clone();
        let soft_proof = self.state.view.soft_proof;
        let print = &mut self.state.print;

        ui.horizontal(|ui| {
            for dpi in DPI_PRESETS {
                ui.selectable_value(&mut print.dpi, dpi, dpi.to_string());
            }
        });
        ui.add(egui::DragValue::new(&mut print.width_cm).range(1.0..=500.0).suffix(" cm"));
        ui.add(egui::DragValue::new(&mut print.height_cm).range(1.0..=500.0).suffix(" cm"));
        ui.add(egui::Slider::new(&mut print.bleed_mm, 0.0..=10.0).text("Bleed (mm)"));

        egui::ComboBox::from_label("Paper")
            .selected_text(print.paper_type.label())
            .show_ui(ui, |ui| {
                for paper in PaperType::all() {
                    ui.selectable_value(&mut print.paper_type, paper, paper.label());
                }
            });

        let (w, h) = print.pixel_dimensions();
        ui.label(format!("Required: {} x {} px ({:.1} MP)", w, h, print.megapixels()));

        let current = self
            .state
            .profiles
            .iter()
            .find(|p| p.id == self.state.print.profile_id)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        egui::ComboBox::from_label("Profile")
            .selected_text(current)
            .show_ui(ui, |ui| {
                for p in &self.state.profiles {
                    ui.selectable_value(&mut self.state.print.profile_id, p.id.clone(), p.name.as_str());
                }
            });
        egui::ComboBox::from_label("Intent")
            .selected_text(self.state.print.intent.label())
            .show_ui(ui, |ui| {
                for intent in RenderingIntent::all() {
                    ui.selectable_value(&mut self.state.print.intent, intent, intent.label());
                }
            });
        if ui.button("Upload ICC profile").clicked() {
            self.upload_profile();
        }
        ui.checkbox(&mut self.state.view.soft_proof, "Soft proof");

        if before != self.state.print || soft_proof != self.state.view.soft_proof {
            self.dirty = true;
        }
    }

    fn analysis_panel(&mut self, ui: &mut Ui) {
        ui.heading("Print analysis");
        let busy = self.state.jobs.analysis.as_ref().is_some_and(|t| t.is_pending());
        let enabled = self.state.image.is_some() && !busy;
        if ui.add_enabled(enabled, egui::Button::new("Analyze")).clicked() {
            self.state.start_analysis();
        }
        if busy {
            ui.spinner();
        }
        if let Some(a) = &self.state.analysis {
            ui.label(format!("Quality score: {:.0}/10", a.quality_score));
            ui.label("Issues:");
            for issue in &a.issues {
                ui.label(format!("• {issue}"));
            }
            ui.label("Recommendations:");
            for rec in &a.recommendations {
                ui.label(format!("• {rec}"));
            }
            ui.label(format!("Paper: {}", a.paper_recommendation));
        }
    }

    fn edit_panel(&mut self, ui: &mut Ui) {
        ui.heading("AI edit");
        let busy = self.state.jobs.edit.as_ref().is_some_and(|t| t.is_pending());
        ui.text_edit_multiline(&mut self.edit_prompt);
        let enabled = self.state.image.is_some() && !busy && !self.edit_prompt.trim().is_empty();
        if ui.add_enabled(enabled, egui::Button::new("Generate")).clicked() {
            self.state.start_edit(&self.edit_prompt);
        }
        if busy {
            ui.spinner();
        }
    }

    fn video_panel(&mut self, ui: &mut Ui) {
        ui.heading("Video");
        let busy = self.state.jobs.video.as_ref().is_some_and(|t| t.is_pending());
        ui.text_edit_multiline(&mut self.video_prompt);
        let enabled = self.state.image.is_some() && !busy;
        if ui.add_enabled(enabled, egui::Button::new("Generate video")).clicked() {
            self.state.start_video(&self.video_prompt);
        }
        if busy {
            ui.horizontal(|ui| {
                ui.spinner();
                if ui.button("Cancel").clicked() {
                    self.state.cancel_video();
                }
            });
        }
        if let Some(uri) = &self.state.video_uri {
            ui.hyperlink(uri);
        }
    }

    fn layers_panel(&mut self, ui: &mut Ui) {
        ui.heading("Layers");
        let rows: Vec<_> = self
            .state
            .layers
            .display_order()
            .map(|(index, l)| (index, l.id, l.name.clone(), l.visible, l.locked))
            .collect();
        let selected = self.state.layers.selected_id();
        let last = self.state.layers.len().saturating_sub(1);

        ScrollArea::vertical().max_height(300.0).show(ui, |ui| {
            for (index, id, name, visible, locked) in rows {
                let row = ui.horizontal(|ui| {
                    ui.dnd_drag_source(egui::Id::new(("layer-row", id)), index, |ui| {
                        ui.weak("::");
                    });
                    if ui.selectable_label(selected == Some(id), name).clicked() {
                        self.state.layers.select(Some(id));
                        self.dirty = true;
                    }
                    if ui.small_button(if visible { "👁" } else { "–" }).clicked() {
                        self.dirty |= self.state.layers.toggle_visible(id);
                    }
                    if ui.small_button(if locked { "🔒" } else { "🔓" }).clicked() {
                        self.state.layers.toggle_locked(id);
                    }
                    if ui.add_enabled(index < last, egui::Button::new("▲").small()).clicked() {
                        self.dirty |= self.state.layers.move_up(index);
                    }
                    if ui.add_enabled(index > 0, egui::Button::new("▼").small()).clicked() {
                        self.dirty |= self.state.layers.move_down(index);
                    }
                    if ui.small_button("🗑").clicked() {
                        self.dirty |= self.state.layers.remove(id).is_some();
                    }
                })
                .response;

                if row.dnd_hover_payload::<usize>().is_some() {
                    ui.painter()
                        .hline(row.rect.x_range(), row.rect.top(), Stroke::new(2.0, SELECTION_COLOR));
                }
                if let Some(from) = row.dnd_release_payload::<usize>() {
                    self.dirty |= self.state.move_layer(*from, index);
                }
            }
        });

        let Some(layer) = self.state.layers.selected() else {
            return;
        };
        let (mut opacity, mut blend) = (layer.opacity, layer.blend);
        ui.separator();
        ui.add(egui::Slider::new(&mut opacity, 0.0..=1.0).text("Opacity"));
        egui::ComboBox::from_label("Blend")
            .selected_text(blend.name())
            .show_ui(ui, |ui| {
                for mode in BlendMode::all() {
                    ui.selectable_value(&mut blend, *mode, mode.name());
                }
            });
        if opacity != layer.opacity || blend != layer.blend {
            let patch = LayerPatch {
                opacity: Some(opacity),
                blend: Some(blend),
                ..Default::default()
            };
            self.state.update_selected_layer(&patch);
            self.dirty = true;
        }
    }

    fn render_canvas(&mut self, ui: &mut Ui) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let Some(image) = &self.state.image else {
            painter.text(
                response.rect.center(),
                Align2::CENTER_CENTER,
                "Open an image to start",
                FontId::proportional(18.0),
                Color32::GRAY,
            );
            return;
        };

        let zoom = self.state.zoom;
        let image_size = Vec2::new(image.width() as f32, image.height() as f32) * zoom;
        let image_rect = Rect::from_center_size(response.rect.center(), image_size);
        let viewport = Viewport {
            zoom,
            origin: image_rect.min,
        };

        draw_checkerboard(&painter, image_rect);
        if let Some(texture) = &self.texture {
            painter.image(
                texture.id(),
                image_rect,
                Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
        }
        painter.rect_stroke(image_rect, 0.0, Stroke::new(1.0, Color32::from_gray(60)));

        if let Some(scene) = self.state.scene() {
            for item in &scene.items {
                match item {
                    RenderItem::Rulers(r) => draw_rulers(&painter, &viewport, image_rect, r),
                    RenderItem::SelectionOutline(b) => {
                        let rect = Rect::from_min_max(viewport.image_to_screen(b.min), viewport.image_to_screen(b.max));
                        painter.rect_stroke(rect, 0.0, Stroke::new(2.0, SELECTION_COLOR.gamma_multiply(0.5)));
                    }
                    RenderItem::Grid(g) => {
                        let c = Color32::from_rgb(g.color.r, g.color.g, g.color.b).gamma_multiply(g.opacity);
                        let step = g.spacing * zoom;
                        if step >= 2.0 {
                            let mut x = image_rect.min.x;
                            while x <= image_rect.max.x {
                                painter.vline(x, image_rect.y_range(), Stroke::new(1.0, c));
                                x += step;
                            }
                            let mut y = image_rect.min.y;
                            while y <= image_rect.max.y {
                                painter.hline(image_rect.x_range(), y, Stroke::new(1.0, c));
                                y += step;
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        // In-progress pen points.
        if self.state.engine.active() == ToolKind::Pen {
            let pts: Vec<Pos2> = self
                .state
                .engine
                .pen()
                .points()
                .iter()
                .map(|p| viewport.image_to_screen(*p))
                .collect();
            for p in &pts {
                painter.circle_filled(*p, 3.0, SELECTION_COLOR);
            }
        }

        let to_image = |p: Pos2| viewport.screen_to_image(p);
        let mut inputs = Vec::new();
        let (pressed, released, press_origin) = ui.input(|i| {
            (
                i.pointer.button_pressed(PointerButton::Primary),
                i.pointer.button_released(PointerButton::Primary),
                i.pointer.press_origin(),
            )
        });
        if pressed && response.hovered() {
            if let Some(p) = press_origin {
                inputs.push(ToolInput::Press { pos: to_image(p) });
            }
        }
        if response.dragged_by(PointerButton::Primary) {
            if let Some(p) = response.interact_pointer_pos() {
                inputs.push(ToolInput::Drag { pos: to_image(p) });
            }
        }
        if released {
            inputs.push(ToolInput::Release);
        }
        if response.double_clicked() {
            if let Some(p) = response.interact_pointer_pos() {
                inputs.push(ToolInput::DoubleClick { pos: to_image(p) });
            }
        } else if response.clicked() {
            if let Some(p) = response.interact_pointer_pos() {
                inputs.push(ToolInput::Click { pos: to_image(p) });
            }
        }

        for input in inputs {
            if self.state.handle_pointer(input) {
                self.dirty = true;
            }
            let on_text = self.state.layers.selected().is_some_and(|l| l.is_text());
            if matches!(input, ToolInput::DoubleClick { .. }) && on_text {
                self.state.set_tool(ToolKind::Text);
            }
        }
    }

    fn low_res_prompt(&mut self, ctx: &Context) {
        let Some(pending) = self.state.pending_image() else {
            return;
        };
        let (w, h) = (pending.meta.width, pending.meta.height);
        let threshold = self.state.config.low_res_threshold;
        let busy = self.state.is_upscaling();
        egui::Window::new("Low resolution image")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(format!(
                    "This image is {w} x {h} px, below {threshold} px. Upscale it with AI before editing?"
                ));
                ui.horizontal(|ui| {
                    if ui.add_enabled(!busy, egui::Button::new("Upscale")).clicked() {
                        self.state.accept_upscale();
                        self.dirty = true;
                    }
                    if ui.add_enabled(!busy, egui::Button::new("Keep original")).clicked() {
                        self.state.decline_upscale();
                        self.dirty = true;
                    }
                    if busy {
                        ui.spinner();
                    }
                });
            });
    }

    fn notices(&mut self, ctx: &Context) {
        let Some(notice) = self.state.notices.first().cloned() else {
            return;
        };
        egui::Window::new("Notice")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_TOP, [0.0, 40.0])
            .show(ctx, |ui| {
                ui.label(notice);
                if ui.button("OK").clicked() {
                    self.state.dismiss_notice();
                }
            });
    }
}

impl eframe::App for PrintMasterApp {
    fn update(&mut self, ctx: &Context, _frame: &mut Frame) {
        if self.state.poll_ai() {
            self.dirty = true;
        }
        let jobs = &self.state.jobs;
        if [jobs.analysis.is_some(), jobs.edit.is_some(), jobs.upscale.is_some(), jobs.video.is_some()]
            .contains(&true)
        {
            ctx.request_repaint_after(Duration::from_millis(200));
        }

        if !ctx.wants_keyboard_input() {
            if let Some(action) = ctx.input(|i| self.state.keybindings.action(i)) {
                self.state.run_shortcut(action);
                self.dirty = true;
            }
        }

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| self.top_bar(ui));
        egui::SidePanel::left("tool_panel")
            .default_width(260.0)
            .show(ctx, |ui| {
                ScrollArea::vertical().show(ui, |ui| self.tool_panel(ui));
            });
        egui::SidePanel::right("layer_panel")
            .default_width(240.0)
            .show(ctx, |ui| self.layers_panel(ui));

        self.update_texture(ctx);
        egui::CentralPanel::default().show(ctx, |ui| self.render_canvas(ui));

        self.low_res_prompt(ctx);
        self.notices(ctx);
    }
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

enum PaintEdit {
    Paint(Paint),
    Cmyk(Cmyk),
    Hex(String),
}

/// Swatch, hex field and "none" toggle, with collapsible CMYK sliders and a
/// copy button for the ink values.
fn cmyk_picker(
    ui: &mut Ui,
    label: &str,
    paint: Paint,
    cmyk: Option<Cmyk>,
    hex_input: &mut String,
) -> Option<PaintEdit> {
    let mut edit = None;
    ui.horizontal(|ui| {
        ui.label(label);
        let mut none = paint == Paint::Transparent;
        if ui.checkbox(&mut none, "None").changed() {
            let next = if none { Paint::Transparent } else { Paint::Solid(Rgb::BLACK) };
            edit = Some(PaintEdit::Paint(next));
        }
        if let Paint::Solid(rgb) = paint {
            let mut c = [rgb.r, rgb.g, rgb.b];
            if ui.color_edit_button_srgb(&mut c).changed() {
                edit = Some(PaintEdit::Paint(Paint::Solid(Rgb::new(c[0], c[1], c[2]))));
            }
        }
        let field = ui.add(
            egui::TextEdit::singleline(hex_input)
                .font(egui::TextStyle::Monospace)
                .desired_width(72.0),
        );
        if field.lost_focus() {
            edit = Some(PaintEdit::Hex(hex_input.clone()));
        } else if !field.has_focus() {
            *hex_input = paint.to_css();
        }
    });

    let Paint::Solid(rgb) = paint else {
        return edit;
    };
    let current = cmyk.unwrap_or_else(|| rgb.to_cmyk());
    ui.collapsing(format!("{label} CMYK"), |ui| {
        ui.horizontal(|ui| {
            ui.monospace(current.to_string());
            if ui.small_button("Copy").clicked() {
                ui.ctx().copy_text(current.to_string());
            }
        });
        let mut next = current;
        for (name, value) in [("C", &mut next.c), ("M", &mut next.m), ("Y", &mut next.y), ("K", &mut next.k)] {
            ui.add(egui::Slider::new(value, 0..=100).text(name));
        }
        if next != current {
            edit = Some(PaintEdit::Cmyk(next));
        }
    });
    edit
}

fn draw_checkerboard(painter: &egui::Painter, rect: Rect) {
    const CELL: f32 = 12.0;
    painter.rect_filled(rect, 0.0, Color32::from_gray(200));
    let cols = (rect.width() / CELL).ceil() as i32;
    let rows = (rect.height() / CELL).ceil() as i32;
    for y in 0..rows {
        for x in (y % 2..cols).step_by(2) {
            let min = rect.min + Vec2::new(x as f32 * CELL, y as f32 * CELL);
            let cell = Rect::from_min_size(min, Vec2::splat(CELL)).intersect(rect);
            painter.rect_filled(cell, 0.0, Color32::from_gray(160));
        }
    }
}

fn draw_rulers(painter: &egui::Painter, viewport: &Viewport, image_rect: Rect, rulers: &Rulers) {
    let top = Rect::from_min_max(
        Pos2::new(image_rect.min.x, image_rect.min.y - RULER_SIZE),
        Pos2::new(image_rect.max.x, image_rect.min.y),
    );
    let left = Rect::from_min_max(
        Pos2::new(image_rect.min.x - RULER_SIZE, image_rect.min.y),
        Pos2::new(image_rect.min.x, image_rect.max.y),
    );
    let bg = Color32::from_rgb(39, 39, 42);
    painter.rect_filled(top, 0.0, bg);
    painter.rect_filled(left, 0.0, bg);
    let tick = Stroke::new(1.0, Color32::from_gray(150));
    let font = FontId::monospace(9.0);

    for (cm, offset) in rulers.ticks(rulers.width_cm) {
        let x = viewport.image_to_screen(Pos2::new(offset, 0.0)).x;
        if x > image_rect.max.x {
            break;
        }
        painter.vline(x, top.min.y + 10.0..=top.max.y, tick);
        painter.text(Pos2::new(x + 2.0, top.min.y + 1.0), Align2::LEFT_TOP, cm.to_string(), font.clone(), Color32::GRAY);
    }
    for (cm, offset) in rulers.ticks(rulers.height_cm) {
        let y = viewport.image_to_screen(Pos2::new(0.0, offset)).y;
        if y > image_rect.max.y {
            break;
        }
        painter.hline(left.min.x + 10.0..=left.max.x, y, tick);
        painter.text(Pos2::new(left.min.x + 1.0, y + 2.0), Align2::LEFT_TOP, cm.to_string(), font.clone(), Color32::GRAY);
    }
}

fn draw_histogram(ui: &mut Ui, hist: &Histogram) {
    let (rect, _) = ui.allocate_exact_size(Vec2::new(ui.available_width(), 80.0), Sense::hover());
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 2.0, Color32::from_gray(20));
    let peak = hist.peak() as f32;
    let bin_w = rect.width() / 256.0;
    for (bins, color) in [
        (&hist.r, Color32::from_rgba_unmultiplied(239, 68, 68, 110)),
        (&hist.g, Color32::from_rgba_unmultiplied(34, 197, 94, 110)),
        (&hist.b, Color32::from_rgba_unmultiplied(59, 130, 246, 110)),
    ] {
        for (i, count) in bins.iter().enumerate() {
            let h = *count as f32 / peak * rect.height();
            if h <= 0.0 {
                continue;
            }
            let x = rect.min.x + i as f32 * bin_w;
            painter.rect_filled(
                Rect::from_min_max(Pos2::new(x, rect.max.y - h), Pos2::new(x + bin_w, rect.max.y)),
                0.0,
                color,
            );
        }
    }
}
