use crate::ai::{self, AiService, AiTask, ImagePayload, PrintAnalysis, UnavailableAiService};
use crate::color::{Cmyk, Paint, Rgb};
use crate::composite::{self, FlattenOptions, GridSettings, Scene, SceneInputs, ViewSettings};
use crate::config::{EditorConfig, INITIAL_ZOOM, MAX_ZOOM, MIN_ZOOM, ZOOM_STEP};
use crate::filters::FilterState;
use crate::fonts::{FontLibrary, DEFAULT_FAMILY};
use crate::image_store::{self, Histogram, ImageLoadError, ImageStore};
use crate::layer_store::LayerStore;
use crate::layers::{Layer, LayerId, LayerKind, LayerPatch, LayerType, StylePatch, TextProps, VectorStyle};
use crate::pipeline::{self, CompiledPipeline, ProofSettings};
use crate::print::{profile_display_name, ColorSpaceType, IccProfile, PrintSettings};
use crate::tools::{InteractionEngine, ToolContext, ToolInput, ToolKind};
use anyhow::{Context, Result};
use egui::Pos2;
use image::RgbaImage;
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::runtime::Handle;

pub const DEFAULT_TEXT: &str = "Double click to edit";
pub const DEFAULT_FONT_SIZE: f32 = 32.0;
pub const MIN_FONT_SIZE: f32 = 12.0;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Shortcut {
    pub key: egui::Key,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Shortcut {
    pub fn new(key: egui::Key) -> Self {
        Self {
            key,
            ctrl: false,
            shift: false,
            alt: false,
        }
    }

    pub fn ctrl(mut self, value: bool) -> Self {
        self.ctrl = value;
        self
    }

    pub fn matches(&self, i: &egui::InputState) -> bool {
        i.key_pressed(self.key)
            && i.modifiers.ctrl == self.ctrl
            && i.modifiers.shift == self.shift
            && i.modifiers.alt == self.alt
    }

    pub fn format(&self) -> String {
        let mut s = String::new();
        if self.ctrl {
            s.push_str("Ctrl+");
        }
        if self.shift {
            s.push_str("Shift+");
        }
        if self.alt {
            s.push_str("Alt+");
        }
        s.push_str(self.key.name());
        s
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ShortcutAction {
    Tool(ToolKind),
    DeleteSelected,
    ZoomIn,
    ZoomOut,
}

pub struct Keybindings {
    pub rect: Shortcut,
    pub ellipse: Shortcut,
    pub pen: Shortcut,
    pub text: Shortcut,
    pub select: Shortcut,
    pub escape: Shortcut,
    pub delete: Shortcut,
    pub zoom_in: Shortcut,
    pub zoom_out: Shortcut,
}

impl Default for Keybindings {
    fn default() -> Self {
        Self {
            rect: Shortcut::new(egui::Key::R),
            ellipse: Shortcut::new(egui::Key::O),
            pen: Shortcut::new(egui::Key::P),
            text: Shortcut::new(egui::Key::T),
            select: Shortcut::new(egui::Key::V),
            escape: Shortcut::new(egui::Key::Escape),
            delete: Shortcut::new(egui::Key::Delete),
            zoom_in: Shortcut::new(egui::Key::Equals).ctrl(true),
            zoom_out: Shortcut::new(egui::Key::Minus).ctrl(true),
        }
    }
}

impl Keybindings {
    /// First binding pressed this frame, if any.
    pub fn action(&self, i: &egui::InputState) -> Option<ShortcutAction> {
        let table = [
            (self.rect, ShortcutAction::Tool(ToolKind::Rectangle)),
            (self.ellipse, ShortcutAction::Tool(ToolKind::Ellipse)),
            (self.pen, ShortcutAction::Tool(ToolKind::Pen)),
            (self.text, ShortcutAction::Tool(ToolKind::Text)),
            (self.select, ShortcutAction::Tool(ToolKind::None)),
            (self.escape, ShortcutAction::Tool(ToolKind::None)),
            (self.delete, ShortcutAction::DeleteSelected),
            (self.zoom_in, ShortcutAction::ZoomIn),
            (self.zoom_out, ShortcutAction::ZoomOut),
        ];
        table
            .into_iter()
            .find(|(shortcut, _)| shortcut.matches(i))
            .map(|(_, action)| action)
    }
}

/// Result of offering an image to the editor.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Admission {
    Admitted,
    /// Below the resolution threshold; waiting for upscale-or-keep.
    AwaitingDecision,
}

/// Which paint of a vector style a color edit targets.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PaintTarget {
    Fill,
    Stroke,
}

/// In-flight AI calls, at most one per kind.
#[derive(Default)]
pub struct AiJobs {
    pub analysis: Option<AiTask<PrintAnalysis>>,
    pub edit: Option<AiTask<ImagePayload>>,
    pub upscale: Option<AiTask<ImagePayload>>,
    pub video: Option<AiTask<String>>,
}

struct ProcessedCache {
    revision: u64,
    filters: FilterState,
    proof: ProofSettings,
    image: RgbaImage,
}

/// Everything the editor knows. The front end reads and mutates it only
/// through this type.
pub struct AppState {
    pub config: EditorConfig,
    pub image: Option<ImageStore>,
    pending: Option<ImageStore>,
    pub filters: FilterState,
    pub layers: LayerStore,
    pub default_style: VectorStyle,
    pub engine: InteractionEngine,
    pub grid: GridSettings,
    pub view: ViewSettings,
    pub print: PrintSettings,
    pub profiles: Vec<IccProfile>,
    pub fonts: FontLibrary,
    pub keybindings: Keybindings,
    pub zoom: f32,
    pub analysis: Option<PrintAnalysis>,
    pub video_uri: Option<String>,
    pub notices: Vec<String>,
    pub jobs: AiJobs,
    ai: Arc<dyn AiService>,
    runtime: Option<Handle>,
    revision: u64,
    next_profile: u64,
    cache: Option<ProcessedCache>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(EditorConfig::default(), Arc::new(UnavailableAiService), None)
    }
}

impl AppState {
    /// `runtime` hosts AI calls; without one every AI action reports that
    /// the service is unavailable.
    pub fn new(config: EditorConfig, ai: Arc<dyn AiService>, runtime: Option<Handle>) -> Self {
        Self {
            config,
            image: None,
            pending: None,
            filters: FilterState::default(),
            layers: LayerStore::new(),
            default_style: VectorStyle::default(),
            engine: InteractionEngine::new(),
            grid: GridSettings::default(),
            view: ViewSettings::default(),
            print: PrintSettings::default(),
            profiles: IccProfile::built_ins(),
            fonts: FontLibrary::default(),
            keybindings: Keybindings::default(),
            zoom: INITIAL_ZOOM,
            analysis: None,
            video_uri: None,
            notices: Vec::new(),
            jobs: AiJobs::default(),
            ai,
            runtime,
            revision: 0,
            next_profile: 0,
            cache: None,
        }
    }

    // Image admission

    /// Decodes and offers an image. Low-resolution images wait for
    /// [`AppState::decline_upscale`] or [`AppState::accept_upscale`].
    pub fn load_image_bytes(&mut self, name: &str, bytes: Vec<u8>) -> Result<Admission, ImageLoadError> {
        let store = ImageStore::decode(name, bytes, self.config.max_preview_dim)?;
        Ok(self.offer(store))
    }

    pub fn open_file(&mut self, path: &Path) -> Result<Admission> {
        let store = ImageStore::from_file(path, self.config.max_preview_dim)?;
        Ok(self.offer(store))
    }

    fn offer(&mut self, store: ImageStore) -> Admission {
        if store.is_low_resolution(self.config.low_res_threshold) {
            log::info!(
                "'{}' is {}x{}, below {} px; asking before admitting",
                store.meta.name,
                store.meta.width,
                store.meta.height,
                self.config.low_res_threshold
            );
            self.pending = Some(store);
            Admission::AwaitingDecision
        } else {
            self.admit(store);
            Admission::Admitted
        }
    }

    fn admit(&mut self, store: ImageStore) {
        log::info!(
            "Admitted '{}' ({}x{})",
            store.meta.name,
            store.meta.width,
            store.meta.height
        );
        self.image = Some(store);
        self.revision += 1;
        self.reset_for_new_image();
    }

    pub fn pending_image(&self) -> Option<&ImageStore> {
        self.pending.as_ref()
    }

    /// Keeps the low-resolution original as is.
    pub fn decline_upscale(&mut self) {
        if let Some(store) = self.pending.take() {
            self.admit(store);
        }
    }

    /// Sends the pending image for upscaling. The original stays pending
    /// until the call finishes; on failure it is admitted unchanged.
    pub fn accept_upscale(&mut self) -> bool {
        let Some(pending) = &self.pending else {
            return false;
        };
        if self.is_upscaling() {
            return false;
        }
        let payload = payload_of(pending);
        let service = self.ai.clone();
        match self.spawn(ai::upscale(service, payload)) {
            Some(task) => {
                log::info!("Upscale requested");
                self.jobs.upscale = Some(task);
                true
            }
            None => {
                self.notices.push("AI upscaling is not available; keeping the original image.".into());
                self.decline_upscale();
                false
            }
        }
    }

    pub fn is_upscaling(&self) -> bool {
        self.jobs.upscale.as_ref().is_some_and(|t| t.is_pending())
    }

    /// Filters, layers and the last analysis are cleared; zoom returns to
    /// its initial value.
    pub fn reset_for_new_image(&mut self) {
        self.filters.reset();
        self.layers.clear();
        self.engine.reset();
        self.analysis = None;
        self.zoom = INITIAL_ZOOM;
        self.cache = None;
    }

    // Layers

    /// Patches the selected layer. Returns `false` when nothing is selected.
    pub fn update_selected_layer(&mut self, patch: &LayerPatch) -> bool {
        match self.layers.selected_id() {
            Some(id) => self.layers.update(id, patch),
            None => false,
        }
    }

    /// Patches the style new shapes and paths are created with.
    pub fn update_default_style(&mut self, patch: &StylePatch) {
        self.default_style.apply(patch);
    }

    /// Adds a default text layer near the image center, selects it and
    /// switches to the text tool.
    pub fn add_text_layer(&mut self) -> LayerId {
        let position = match &self.image {
            Some(img) => Pos2::new(img.width() as f32 / 2.0 - 100.0, img.height() as f32 / 2.0),
            None => Pos2::new(300.0, 300.0),
        };
        let id = self.layers.next_id();
        let name = self.layers.next_name(LayerType::Text);
        self.layers.add(Layer::new_text(
            id,
            name,
            position,
            TextProps {
                text: DEFAULT_TEXT.to_string(),
                font_size: DEFAULT_FONT_SIZE,
                color: Rgb::WHITE,
                font_family: DEFAULT_FAMILY.to_string(),
            },
        ));
        self.layers.select(Some(id));
        self.set_tool(ToolKind::Text);
        id
    }

    pub fn set_text(&mut self, id: LayerId, text: &str) -> bool {
        let patch = LayerPatch {
            text: Some(text.to_string()),
            ..Default::default()
        };
        self.layers.get(id).is_some_and(Layer::is_text) && self.layers.update(id, &patch)
    }

    /// Grows or shrinks a text layer's font, never below 12 px.
    pub fn nudge_font_size(&mut self, id: LayerId, delta: f32) -> bool {
        let Some(LayerKind::Text(t)) = self.layers.get(id).map(|l| &l.kind) else {
            return false;
        };
        let size = (t.font_size + delta).max(MIN_FONT_SIZE);
        self.layers.update(
            id,
            &LayerPatch {
                font_size: Some(size),
                ..Default::default()
            },
        )
    }

    /// Writes a paint to the selected shape or path, or to the default
    /// style when no styled layer is selected. The stored CMYK follows the
    /// RGB value.
    pub fn set_paint(&mut self, target: PaintTarget, paint: Paint) -> bool {
        let cmyk = paint.rgb().map(Rgb::to_cmyk).unwrap_or_default();
        self.apply_paint(target, paint, cmyk)
    }

    /// Picker sliders: the color comes from the CMYK percentages, which
    /// are kept as entered.
    pub fn set_paint_cmyk(&mut self, target: PaintTarget, cmyk: Cmyk) -> bool {
        self.apply_paint(target, Paint::Solid(cmyk.to_rgb()), cmyk)
    }

    /// Hex field of the picker. Invalid input changes nothing.
    pub fn set_paint_hex(&mut self, target: PaintTarget, input: &str) -> bool {
        match Paint::from_input(input) {
            Some(paint) => self.set_paint(target, paint),
            None => {
                log::debug!("Ignoring color input '{}'", input);
                false
            }
        }
    }

    fn apply_paint(&mut self, target: PaintTarget, paint: Paint, cmyk: Cmyk) -> bool {
        let patch = match target {
            PaintTarget::Fill => StylePatch {
                fill_color: Some(paint),
                fill_cmyk: Some(cmyk),
                ..Default::default()
            },
            PaintTarget::Stroke => StylePatch {
                stroke_color: Some(paint),
                stroke_cmyk: Some(cmyk),
                ..Default::default()
            },
        };
        if self.layers.selected().is_some_and(|l| l.style().is_some()) {
            self.update_selected_layer(&LayerPatch::style(patch))
        } else {
            self.update_default_style(&patch);
            true
        }
    }

    /// Layers-panel drag and drop, in store indices (back to front).
    pub fn move_layer(&mut self, from: usize, to: usize) -> bool {
        let moved = from != to && self.layers.move_to(from, to);
        if moved {
            log::debug!("Layer moved from {} to {}", from, to);
        }
        moved
    }

    pub fn delete_selected(&mut self) -> bool {
        match self.layers.selected_id() {
            Some(id) => self.layers.remove(id).is_some(),
            None => false,
        }
    }

    /// Routes a pointer event through the active tool.
    pub fn handle_pointer(&mut self, input: ToolInput) -> bool {
        let mut ctx = ToolContext {
            layers: &mut self.layers,
            style: &self.default_style,
            fonts: &self.fonts,
        };
        self.engine.handle(&mut ctx, &input)
    }

    // Tools and view

    /// Activating the current tool again returns to plain selection.
    pub fn toggle_tool(&mut self, tool: ToolKind) {
        let next = if self.engine.active() == tool {
            ToolKind::None
        } else {
            tool
        };
        self.set_tool(next);
    }

    /// Leaving the video tool abandons a running generation.
    pub fn set_tool(&mut self, tool: ToolKind) {
        if self.engine.active() == ToolKind::Video && tool != ToolKind::Video {
            self.cancel_video();
        }
        self.engine.set_tool(tool);
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom + ZOOM_STEP).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom - ZOOM_STEP).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn run_shortcut(&mut self, action: ShortcutAction) {
        match action {
            ShortcutAction::Tool(tool) => self.set_tool(tool),
            ShortcutAction::DeleteSelected => {
                self.delete_selected();
            }
            ShortcutAction::ZoomIn => self.zoom_in(),
            ShortcutAction::ZoomOut => self.zoom_out(),
        }
    }

    // Print assets

    /// Registers an uploaded ICC/ICM file and selects it. The bytes are
    /// kept opaque.
    pub fn upload_profile(&mut self, file_name: &str, bytes: Vec<u8>) -> String {
        self.next_profile += 1;
        let profile = IccProfile {
            id: format!("custom-{}", self.next_profile),
            name: profile_display_name(file_name),
            color_space: ColorSpaceType::Cmyk,
            data: Some(bytes),
            built_in: false,
        };
        log::info!("Uploaded profile '{}' as {}", profile.name, profile.id);
        let id = profile.id.clone();
        self.print.profile_id = id.clone();
        self.profiles.push(profile);
        id
    }

    /// Registers a font and applies it to the selected text layer, if any.
    pub fn add_font(&mut self, file_name: &str, bytes: Vec<u8>) -> String {
        let family = self.fonts.add(file_name, bytes);
        if let Some(id) = self.layers.selected().filter(|l| l.is_text()).map(|l| l.id) {
            self.layers.update(
                id,
                &LayerPatch {
                    font_family: Some(family.clone()),
                    ..Default::default()
                },
            );
        }
        family
    }

    // Rendering

    pub fn proof_settings(&self) -> ProofSettings {
        ProofSettings {
            enabled: self.view.soft_proof,
            profile_id: self.print.profile_id.clone(),
            intent: self.print.intent,
        }
    }

    pub fn pipeline(&self) -> CompiledPipeline {
        pipeline::compile(&self.filters, &self.proof_settings())
    }

    /// Pipeline output for the current image, recomputed only when the
    /// image, filters or proofing changed.
    pub fn processed(&mut self) -> Option<&RgbaImage> {
        let source = self.image.as_ref()?;
        let proof = self.proof_settings();
        let fresh = self.cache.as_ref().is_some_and(|c| {
            c.revision == self.revision && c.filters == self.filters && c.proof == proof
        });
        if !fresh {
            let image = pipeline::compile(&self.filters, &proof).run(&source.buffer);
            self.cache = Some(ProcessedCache {
                revision: self.revision,
                filters: self.filters,
                proof,
                image,
            });
        }
        self.cache.as_ref().map(|c| &c.image)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn scene(&self) -> Option<Scene> {
        let image = self.image.as_ref()?;
        Some(composite::build_scene(&SceneInputs {
            layers: &self.layers,
            vignette: self.pipeline().vignette,
            grid: &self.grid,
            view: &self.view,
            print: &self.print,
            image_width: image.width(),
        }))
    }

    /// The composited picture at preview resolution.
    pub fn flatten(&mut self, opts: FlattenOptions) -> Option<RgbaImage> {
        let scene = self.scene()?;
        let processed = self.processed()?.clone();
        Some(composite::flatten(&scene, &processed, &self.layers, &self.fonts, opts))
    }

    pub fn export_png(&mut self, path: &Path) -> Result<()> {
        let flat = self
            .flatten(FlattenOptions::default())
            .context("No image to export")?;
        image_store::save_png(&flat, path)?;
        log::info!("Exported {}x{} to {}", flat.width(), flat.height(), path.display());
        Ok(())
    }

    pub fn histogram(&mut self) -> Option<Histogram> {
        self.processed().map(Histogram::compute)
    }

    // AI

    fn spawn<T, F>(&self, future: F) -> Option<AiTask<T>>
    where
        T: Send + 'static,
        F: std::future::Future<Output = Result<T, ai::AiError>> + Send + 'static,
    {
        self.runtime.as_ref().map(|rt| AiTask::spawn(rt, future))
    }

    fn current_payload(&self) -> Option<ImagePayload> {
        self.image.as_ref().map(payload_of)
    }

    pub fn start_analysis(&mut self) -> bool {
        if self.jobs.analysis.as_ref().is_some_and(|t| t.is_pending()) {
            return false;
        }
        let Some(image) = self.current_payload() else {
            return false;
        };
        let (w, h, dpi) = (self.print.width_cm, self.print.height_cm, self.print.dpi);
        let future = ai::analyze(self.ai.clone(), image, w, h, dpi);
        self.jobs.analysis = self.spawn(future);
        self.report_unavailable(self.jobs.analysis.is_some())
    }

    pub fn start_edit(&mut self, prompt: &str) -> bool {
        if prompt.trim().is_empty() || self.jobs.edit.as_ref().is_some_and(|t| t.is_pending()) {
            return false;
        }
        let Some(image) = self.current_payload() else {
            return false;
        };
        let future = ai::edit(self.ai.clone(), image, prompt.to_string());
        self.jobs.edit = self.spawn(future);
        self.report_unavailable(self.jobs.edit.is_some())
    }

    pub fn start_video(&mut self, prompt: &str) -> bool {
        if self.jobs.video.as_ref().is_some_and(|t| t.is_pending()) {
            return false;
        }
        let Some(image) = self.current_payload() else {
            return false;
        };
        let future = ai::generate_video(
            self.ai.clone(),
            image,
            prompt.to_string(),
            self.config.video_poll_interval,
        );
        self.video_uri = None;
        self.jobs.video = self.spawn(future);
        self.report_unavailable(self.jobs.video.is_some())
    }

    /// Abandons video generation; the polling loop stops.
    pub fn cancel_video(&mut self) {
        if let Some(mut task) = self.jobs.video.take() {
            task.cancel();
            log::info!("Video generation abandoned");
        }
    }

    fn report_unavailable(&mut self, started: bool) -> bool {
        if !started {
            self.notices.push("AI features are not available in this session.".into());
        }
        started
    }

    /// Collects finished AI calls. Returns `true` when anything changed.
    pub fn poll_ai(&mut self) -> bool {
        let mut changed = false;

        if let Some(result) = self.jobs.analysis.as_mut().and_then(AiTask::try_take) {
            self.jobs.analysis = None;
            changed = true;
            match result {
                Ok(analysis) => {
                    log::info!("Print analysis scored {}", analysis.quality_score);
                    self.analysis = Some(analysis);
                }
                Err(e) => self.fail("Analysis failed", &e),
            }
        }

        if let Some(result) = self.jobs.edit.as_mut().and_then(AiTask::try_take) {
            self.jobs.edit = None;
            changed = true;
            match result.map_err(|e| e.to_string()).and_then(|p| self.decode_payload(p, false)) {
                Ok(store) => self.replace_image(store),
                Err(e) => self.fail("Edit failed", &e),
            }
        }

        if let Some(result) = self.jobs.upscale.as_mut().and_then(AiTask::try_take) {
            self.jobs.upscale = None;
            changed = true;
            match result.map_err(|e| e.to_string()).and_then(|p| self.decode_payload(p, true)) {
                Ok(store) => {
                    self.pending = None;
                    self.admit(store);
                }
                Err(e) => {
                    self.fail("Upscale failed, keeping the original", &e);
                    self.decline_upscale();
                }
            }
        }

        if let Some(result) = self.jobs.video.as_mut().and_then(AiTask::try_take) {
            self.jobs.video = None;
            changed = true;
            match result {
                Ok(uri) => {
                    log::info!("Video ready at {}", uri);
                    self.video_uri = Some(uri);
                }
                Err(e) => self.fail("Video generation failed", &e),
            }
        }

        changed
    }

    /// Upscales are named after the pending original, edits after the
    /// current image.
    fn decode_payload(&self, payload: ImagePayload, upscaled: bool) -> std::result::Result<ImageStore, String> {
        let (first, second) = if upscaled {
            (&self.pending, &self.image)
        } else {
            (&self.image, &self.pending)
        };
        let name = first
            .as_ref()
            .or(second.as_ref())
            .map(|s| s.meta.name.clone())
            .unwrap_or_else(|| "generated".to_string());
        let bytes = Arc::try_unwrap(payload.bytes).unwrap_or_else(|shared| (*shared).clone());
        ImageStore::decode(&name, bytes, self.config.max_preview_dim).map_err(|e| e.to_string())
    }

    /// Swaps the picture under the existing layers and filters.
    fn replace_image(&mut self, store: ImageStore) {
        log::info!("Image replaced ({}x{})", store.meta.width, store.meta.height);
        self.image = Some(store);
        self.revision += 1;
    }

    fn fail(&mut self, what: &str, error: &dyn std::fmt::Display) {
        log::error!("{}: {}", what, error);
        self.notices.push(format!("{what}: {error}"));
    }

    pub fn dismiss_notice(&mut self) {
        if !self.notices.is_empty() {
            self.notices.remove(0);
        }
    }
}

fn payload_of(store: &ImageStore) -> ImagePayload {
    ImagePayload {
        bytes: store.meta.bytes.clone(),
        mime: store.meta.mime.clone(),
    }
}

/// `printmaster-export-<unix millis>.png`
pub fn default_export_name() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("printmaster-export-{millis}.png")
}
