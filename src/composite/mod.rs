//! Builds the back-to-front display list and flattens it to a raster.

pub mod raster;

use crate::color::Rgb;
use crate::fonts::FontLibrary;
use crate::layer_store::LayerStore;
use crate::layers::{LayerId, LayerKind};
use crate::pipeline::Vignette;
use crate::print::PrintSettings;
use egui::Rect;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSettings {
    pub enabled: bool,
    pub spacing: f32,
    pub color: Rgb,
    pub opacity: f32,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            spacing: 50.0,
            color: Rgb::WHITE,
            opacity: 0.2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewSettings {
    pub show_rulers: bool,
    pub soft_proof: bool,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            show_rulers: true,
            soft_proof: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rulers {
    pub pixels_per_cm: f32,
    pub width_cm: f32,
    pub height_cm: f32,
}

impl Rulers {
    /// Tick offsets in image pixels, one per whole centimetre.
    pub fn ticks(&self, extent_cm: f32) -> Vec<(u32, f32)> {
        let count = extent_cm.max(0.0).ceil() as u32;
        (0..=count).map(|i| (i, i as f32 * self.pixels_per_cm)).collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RenderItem {
    Background,
    Rulers(Rulers),
    Image,
    Vignette(Vignette),
    Layer(LayerId),
    SelectionOutline(Rect),
    Grid(GridSettings),
}

impl RenderItem {
    /// Editing aids that are not part of the picture.
    pub fn is_guide(&self) -> bool {
        matches!(
            self,
            RenderItem::Rulers(_) | RenderItem::SelectionOutline(_) | RenderItem::Grid(_)
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    pub items: Vec<RenderItem>,
}

impl Scene {
    pub fn layer_order(&self) -> Vec<LayerId> {
        self.items
            .iter()
            .filter_map(|i| match i {
                RenderItem::Layer(id) => Some(*id),
                _ => None,
            })
            .collect()
    }
}

pub struct SceneInputs<'a> {
    pub layers: &'a LayerStore,
    pub vignette: Option<Vignette>,
    pub grid: &'a GridSettings,
    pub view: &'a ViewSettings,
    pub print: &'a PrintSettings,
    pub image_width: u32,
}

/// Display list, back to front. Hidden layers are left out entirely.
pub fn build_scene(inputs: &SceneInputs<'_>) -> Scene {
    let mut items = vec![RenderItem::Background];

    if inputs.view.show_rulers {
        items.push(RenderItem::Rulers(Rulers {
            pixels_per_cm: inputs.print.pixels_per_cm(inputs.image_width),
            width_cm: inputs.print.width_cm,
            height_cm: inputs.print.height_cm,
        }));
    }

    items.push(RenderItem::Image);

    if let Some(v) = inputs.vignette {
        items.push(RenderItem::Vignette(v));
    }

    let visible = inputs.layers.layers().iter().filter(|l| l.visible);
    items.extend(
        visible
            .clone()
            .filter(|l| !l.is_text())
            .map(|l| RenderItem::Layer(l.id)),
    );
    items.extend(visible.filter(|l| l.is_text()).map(|l| RenderItem::Layer(l.id)));

    if let Some(selected) = inputs.layers.selected() {
        let outlined = selected.visible
            && matches!(selected.kind, LayerKind::Rectangle(_) | LayerKind::Ellipse(_));
        if let (true, Some(bounds)) = (outlined, selected.bounds()) {
            items.push(RenderItem::SelectionOutline(bounds));
        }
    }

    if inputs.grid.enabled {
        items.push(RenderItem::Grid(*inputs.grid));
    }

    Scene { items }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FlattenOptions {
    pub include_guides: bool,
}

/// Rasterizes `scene` over the processed image at its own resolution.
pub fn flatten(
    scene: &Scene,
    processed: &RgbaImage,
    layers: &LayerStore,
    fonts: &FontLibrary,
    opts: FlattenOptions,
) -> RgbaImage {
    let mut canvas = RgbaImage::new(processed.width(), processed.height());

    for item in &scene.items {
        if item.is_guide() && !opts.include_guides {
            continue;
        }
        match item {
            RenderItem::Background => {}
            // Rulers sit in the margin outside the image bounds.
            RenderItem::Rulers(_) => {}
            RenderItem::Image => raster::draw_image(&mut canvas, processed),
            RenderItem::Vignette(v) => v.apply(&mut canvas),
            RenderItem::Layer(id) => {
                if let Some(layer) = layers.get(*id) {
                    if let Some(sprite) = raster::rasterize_layer(layer, fonts, raster::canvas_rect(&canvas)) {
                        raster::blend_sprite(&mut canvas, &sprite, layer.blend, layer.opacity);
                    }
                }
            }
            RenderItem::SelectionOutline(rect) => raster::draw_outline(&mut canvas, *rect),
            RenderItem::Grid(grid) => raster::draw_grid(&mut canvas, grid),
        }
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::layers::{Layer, LayerPatch, TextProps, VectorStyle};
    use egui::{Pos2, Vec2};

    fn setup() -> (LayerStore, LayerId, LayerId, LayerId) {
        let mut store = LayerStore::new();
        let text_id = store.next_id();
        store.add(Layer::new_text(
            text_id,
            "Text Layer 1".into(),
            Pos2::new(5.0, 5.0),
            TextProps {
                text: "Hi".into(),
                font_size: 12.0,
                color: Rgb::WHITE,
                font_family: "Inter".into(),
            },
        ));
        let a = store.next_id();
        let mut rect = Layer::new_rectangle(a, "Rectangle 1".into(), Pos2::ZERO, &VectorStyle::default());
        rect.apply(&LayerPatch::geometry(Pos2::new(2.0, 2.0), Vec2::new(10.0, 10.0)));
        store.add(rect);
        let b = store.next_id();
        store.add(Layer::new_path(b, "Path 1".into(), vec![Pos2::ZERO, Pos2::new(5.0, 5.0)], &VectorStyle::default()));
        (store, text_id, a, b)
    }

    fn inputs<'a>(
        layers: &'a LayerStore,
        grid: &'a GridSettings,
        view: &'a ViewSettings,
        print: &'a PrintSettings,
    ) -> SceneInputs<'a> {
        SceneInputs {
            layers,
            vignette: None,
            grid,
            view,
            print,
            image_width: 100,
        }
    }

    #[test]
    fn test_order_vectors_then_text() {
        let (store, text_id, a, b) = setup();
        let (grid, view, print) = (GridSettings::default(), ViewSettings::default(), PrintSettings::default());
        let scene = build_scene(&inputs(&store, &grid, &view, &print));
        assert_eq!(scene.layer_order(), vec![a, b, text_id]);
        assert_eq!(scene.items[0], RenderItem::Background);
        assert!(matches!(scene.items[1], RenderItem::Rulers(_)));
        assert_eq!(scene.items[2], RenderItem::Image);
    }

    #[test]
    fn test_hidden_layers_and_overlays() {
        let (mut store, _text_id, a, b) = setup();
        store.set_visible(b, false);
        store.select(Some(a));
        let grid = GridSettings {
            enabled: true,
            ..Default::default()
        };
        let view = ViewSettings {
            show_rulers: false,
            ..Default::default()
        };
        let print = PrintSettings::default();
        let mut si = inputs(&store, &grid, &view, &print);
        si.vignette = Vignette::from_amount(30.0);
        let scene = build_scene(&si);

        assert!(!scene.layer_order().contains(&b));
        assert!(matches!(scene.items[1], RenderItem::Image));
        assert!(matches!(scene.items[2], RenderItem::Vignette(_)));
        let n = scene.items.len();
        assert!(matches!(scene.items[n - 2], RenderItem::SelectionOutline(_)));
        assert!(matches!(scene.items[n - 1], RenderItem::Grid(_)));
    }

    #[test]
    fn test_no_outline_for_paths_or_hidden() {
        let (mut store, _t, a, b) = setup();
        let (grid, view, print) = (GridSettings::default(), ViewSettings::default(), PrintSettings::default());
        store.select(Some(b));
        let scene = build_scene(&inputs(&store, &grid, &view, &print));
        assert!(!scene.items.iter().any(|i| matches!(i, RenderItem::SelectionOutline(_))));

        store.select(Some(a));
        store.set_visible(a, false);
        let scene = build_scene(&inputs(&store, &grid, &view, &print));
        assert!(!scene.items.iter().any(|i| matches!(i, RenderItem::SelectionOutline(_))));
    }

    #[test]
    fn test_flatten_keeps_size_and_skips_guides() {
        let (store, ..) = setup();
        let grid = GridSettings {
            enabled: true,
            spacing: 4.0,
            color: Rgb::new(255, 0, 0),
            opacity: 1.0,
        };
        let view = ViewSettings::default();
        let print = PrintSettings::default();
        let scene = build_scene(&inputs(&store, &grid, &view, &print));
        let image = RgbaImage::from_pixel(40, 30, image::Rgba([0, 0, 255, 255]));
        let fonts = FontLibrary::default();

        let plain = flatten(&scene, &image, &store, &fonts, FlattenOptions::default());
        assert_eq!(plain.dimensions(), (40, 30));
        // Far corner: untouched image, no grid line.
        assert_eq!(*plain.get_pixel(39, 29), image::Rgba([0, 0, 255, 255]));

        let guided = flatten(&scene, &image, &store, &fonts, FlattenOptions { include_guides: true });
        assert_eq!(*guided.get_pixel(36, 29), image::Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_ruler_ticks() {
        let r = Rulers {
            pixels_per_cm: 10.0,
            width_cm: 2.5,
            height_cm: 1.0,
        };
        assert_eq!(r.ticks(2.5), vec![(0, 0.0), (1, 10.0), (2, 20.0), (3, 30.0)]);
    }
}
