use egui::{Pos2, Vec2};
use image::{Rgba, RgbaImage};
use printmaster::ai::UnavailableAiService;
use printmaster::composite::FlattenOptions;
use printmaster::filters::FilterState;
use printmaster::image_store::encode_png;
use printmaster::layers::LayerPatch;
use printmaster::pipeline::{compile, ProofSettings, StageId};
use printmaster::state::Admission;
use printmaster::tools::{ToolInput, ToolKind};
use printmaster::{AppState, EditorConfig};
use std::sync::Arc;

fn state_with_threshold(threshold: u32) -> AppState {
    let config = EditorConfig {
        low_res_threshold: threshold,
        ..EditorConfig::builtin()
    };
    AppState::new(config, Arc::new(UnavailableAiService), None)
}

fn png(w: u32, h: u32) -> Vec<u8> {
    encode_png(&RgbaImage::from_pixel(w, h, Rgba([90, 120, 150, 255]))).unwrap()
}

fn draw_rect(state: &mut AppState, from: Pos2, to: Pos2) {
    state.handle_pointer(ToolInput::Press { pos: from });
    state.handle_pointer(ToolInput::Drag { pos: to });
    state.handle_pointer(ToolInput::Release);
}

#[test]
fn low_res_image_is_never_auto_admitted() {
    let mut state = state_with_threshold(1200);
    let admission = state.load_image_bytes("small.png", png(64, 2000)).unwrap();
    assert_eq!(admission, Admission::AwaitingDecision);
    assert!(state.image.is_none());

    state.decline_upscale();
    let image = state.image.as_ref().unwrap();
    assert_eq!((image.width(), image.height()), (64, 2000));
    assert_eq!(image.meta.name, "small.png");
}

#[test]
fn reorder_changes_paint_order_not_geometry() {
    let mut state = state_with_threshold(1);
    state.load_image_bytes("a.png", png(100, 100)).unwrap();
    state.toggle_tool(ToolKind::Rectangle);
    draw_rect(&mut state, Pos2::new(10.0, 10.0), Pos2::new(40.0, 30.0));
    draw_rect(&mut state, Pos2::new(20.0, 20.0), Pos2::new(60.0, 70.0));

    let first = state.layers.layers()[0].clone();
    let second = state.layers.layers()[1].clone();
    assert_eq!(state.scene().unwrap().layer_order(), vec![first.id, second.id]);

    assert!(state.layers.move_up(0));
    assert_eq!(state.scene().unwrap().layer_order(), vec![second.id, first.id]);
    assert_eq!(state.layers.get(first.id).unwrap().bounds(), first.bounds());
    assert_eq!(state.layers.get(second.id).unwrap().bounds(), second.bounds());
    assert_eq!(
        state.layers.get(first.id).unwrap().bounds(),
        Some(egui::Rect::from_min_size(Pos2::new(10.0, 10.0), Vec2::new(30.0, 20.0)))
    );
}

#[test]
fn locked_layer_does_not_move() {
    let mut state = state_with_threshold(1);
    state.load_image_bytes("a.png", png(100, 100)).unwrap();
    state.toggle_tool(ToolKind::Rectangle);
    draw_rect(&mut state, Pos2::new(10.0, 10.0), Pos2::new(40.0, 40.0));
    let id = state.layers.selected_id().unwrap();
    state.update_selected_layer(&LayerPatch {
        locked: Some(true),
        ..Default::default()
    });
    state.toggle_tool(ToolKind::Rectangle);
    assert_eq!(state.engine.active(), ToolKind::None);

    draw_rect(&mut state, Pos2::new(20.0, 20.0), Pos2::new(80.0, 90.0));
    assert_eq!(state.layers.get(id).unwrap().position, Pos2::new(10.0, 10.0));

    // Unlocked, the same gesture moves it.
    state.layers.set_locked(id, false);
    draw_rect(&mut state, Pos2::new(20.0, 20.0), Pos2::new(30.0, 25.0));
    assert_eq!(state.layers.get(id).unwrap().position, Pos2::new(20.0, 15.0));
}

#[test]
fn neutral_filters_compile_to_two_stages() {
    let pipeline = compile(&FilterState::default(), &ProofSettings::default());
    assert_eq!(pipeline.stage_ids(), vec![StageId::Tonal, StageId::ColorCorrected]);
    assert!(pipeline.vignette.is_none());
}

#[test]
fn chain_ends_on_color_correction_without_detail_stages() {
    let filters = FilterState {
        brightness: 120.0,
        temperature: 40.0,
        ..Default::default()
    };
    let pipeline = compile(&filters, &ProofSettings::default());
    assert_eq!(pipeline.output(), StageId::ColorCorrected);
    assert!(!pipeline.stage_ids().contains(&StageId::LightAdjusted));
    assert!(!pipeline.stage_ids().contains(&StageId::Sharpened));
}

#[test]
fn uncoated_and_fogra39_proofs_differ() {
    let mut source = RgbaImage::new(16, 16);
    for (x, y, px) in source.enumerate_pixels_mut() {
        *px = Rgba([(x * 16) as u8, (y * 16) as u8, 200, 255]);
    }
    let mean = |profile: &str| {
        let proof = ProofSettings {
            enabled: true,
            profile_id: profile.to_string(),
            ..Default::default()
        };
        let out = compile(&FilterState::default(), &proof).run(&source);
        let sum: u64 = out.pixels().map(|p| p[0] as u64 + p[1] as u64 + p[2] as u64).sum();
        sum as f64 / (out.width() * out.height() * 3) as f64
    };
    let (uncoated, fogra) = (mean("uncoated"), mean("fogra39"));
    assert!((uncoated - fogra).abs() > 1.0, "uncoated {uncoated} vs fogra39 {fogra}");
}

#[test]
fn export_matches_preview_resolution() {
    let config = EditorConfig {
        low_res_threshold: 1,
        max_preview_dim: 50,
        ..EditorConfig::builtin()
    };
    let mut state = AppState::new(config, Arc::new(UnavailableAiService), None);
    state.load_image_bytes("big.png", png(200, 100)).unwrap();
    state.add_text_layer();
    let flat = state.flatten(FlattenOptions::default()).unwrap();
    assert_eq!(flat.dimensions(), (50, 25));

    let dir = std::env::temp_dir().join(printmaster::state::default_export_name());
    state.export_png(&dir).unwrap();
    let reloaded = image::open(&dir).unwrap();
    assert_eq!((reloaded.width(), reloaded.height()), (50, 25));
    let _ = std::fs::remove_file(&dir);
}
