//! Compiles a [`FilterState`] into an ordered chain of image stages.
//!
//! Every stage names the result it reads from, so the wiring stays explicit
//! when optional stages drop out. The vignette is not a stage: it is returned
//! alongside the chain and drawn by the compositor on top of the final result.

pub mod convolve;
pub mod matrix;
pub mod noise;
pub mod softproof;
pub mod tonal;
pub mod vignette;

use crate::filters::FilterState;
use crate::print::RenderingIntent;
use convolve::Kernel3;
use image::RgbaImage;
use matrix::ColorMatrix;
use noise::Grain;
use tonal::TonalParams;
pub use vignette::Vignette;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum StageId {
    Tonal,
    ColorCorrected,
    LightAdjusted,
    Sharpened,
    Noised,
    Proofed,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StageInput {
    Source,
    Stage(StageId),
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum StageOp {
    Tonal(TonalParams),
    ColorMatrix(ColorMatrix),
    /// `slope * c + intercept` on R, G and B.
    Linear { slope: f32, intercept: f32 },
    Convolve(Kernel3),
    Grain(Grain),
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Stage {
    pub id: StageId,
    pub input: StageInput,
    pub op: StageOp,
}

impl Stage {
    fn run(&self, image: &RgbaImage) -> RgbaImage {
        match &self.op {
            StageOp::Tonal(p) => p.apply(image),
            StageOp::ColorMatrix(m) => m.apply(image),
            StageOp::Linear { slope, intercept } => {
                let (slope, intercept) = (*slope, *intercept);
                matrix::map_pixels(image, move |px| {
                    let f = |c: f32| (slope * c + intercept).clamp(0.0, 1.0);
                    [f(px[0]), f(px[1]), f(px[2]), px[3]]
                })
            }
            StageOp::Convolve(k) => k.apply(image),
            StageOp::Grain(g) => g.apply(image),
        }
    }
}

/// Soft-proof inputs that feed the pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct ProofSettings {
    pub enabled: bool,
    pub profile_id: String,
    /// Recorded but not applied: every intent uses the same matrix.
    pub intent: RenderingIntent,
}

impl Default for ProofSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            profile_id: softproof::SWOP_COATED.to_string(),
            intent: RenderingIntent::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompiledPipeline {
    pub stages: Vec<Stage>,
    pub vignette: Option<Vignette>,
}

/// Builds the stage chain. Pure in its inputs; out-of-range filter values
/// are clamped first.
pub fn compile(filters: &FilterState, proof: &ProofSettings) -> CompiledPipeline {
    let f = filters.clamped();
    let mut stages = Vec::with_capacity(6);
    let mut last = StageId::Tonal;

    stages.push(Stage {
        id: StageId::Tonal,
        input: StageInput::Source,
        op: StageOp::Tonal(TonalParams::from_filters(&f)),
    });

    let mut push = |id: StageId, op: StageOp| {
        stages.push(Stage {
            id,
            input: StageInput::Stage(last),
            op,
        });
        last = id;
    };

    push(
        StageId::ColorCorrected,
        StageOp::ColorMatrix(ColorMatrix::temperature_tint(f.temperature, f.tint)),
    );

    if f.highlights != 0.0 || f.shadows != 0.0 {
        push(
            StageId::LightAdjusted,
            StageOp::Linear {
                slope: 1.0 - f.highlights * 0.002,
                intercept: f.shadows * 0.002,
            },
        );
    }

    if f.sharpen > 0.0 {
        push(StageId::Sharpened, StageOp::Convolve(Kernel3::sharpen(f.sharpen)));
    }

    if f.noise > 0.0 {
        push(StageId::Noised, StageOp::Grain(Grain::from_amount(f.noise)));
    }

    if proof.enabled {
        push(
            StageId::Proofed,
            StageOp::ColorMatrix(softproof::profile_matrix(&proof.profile_id)),
        );
    }

    let pipeline = CompiledPipeline {
        stages,
        vignette: Vignette::from_amount(f.vignette),
    };
    log::debug!(
        "Compiled pipeline {:?} (vignette: {})",
        pipeline.stage_ids(),
        pipeline.vignette.is_some()
    );
    pipeline
}

impl CompiledPipeline {
    pub fn stage_ids(&self) -> Vec<StageId> {
        self.stages.iter().map(|s| s.id).collect()
    }

    /// Name of the result the chain ends on.
    pub fn output(&self) -> StageId {
        self.stages.last().map(|s| s.id).unwrap_or(StageId::Tonal)
    }

    pub fn input_of(&self, id: StageId) -> Option<StageInput> {
        self.stages.iter().find(|s| s.id == id).map(|s| s.input)
    }

    /// Evaluates the chain over `source`. The vignette is not applied.
    pub fn run(&self, source: &RgbaImage) -> RgbaImage {
        let mut results: Vec<(StageId, RgbaImage)> = Vec::new();

        for (i, stage) in self.stages.iter().enumerate() {
            let output = match stage.input {
                StageInput::Source => stage.run(source),
                StageInput::Stage(from) => match results.iter().find(|(id, _)| *id == from) {
                    Some((_, input)) => stage.run(input),
                    None => {
                        log::warn!("Stage {:?} reads missing {:?}; using source", stage.id, from);
                        stage.run(source)
                    }
                },
            };

            // Keep only results that a later stage still reads.
            let rest = &self.stages[i + 1..];
            results.retain(|(id, _)| rest.iter().any(|s| s.input == StageInput::Stage(*id)));
            results.push((stage.id, output));
        }

        let output = self.output();
        results
            .into_iter()
            .find(|(id, _)| *id == output)
            .map(|(_, image)| image)
            .unwrap_or_else(|| source.clone())
    }

    /// Runs the chain, then draws the vignette over the result.
    pub fn render(&self, source: &RgbaImage) -> RgbaImage {
        let mut out = self.run(source);
        if let Some(v) = &self.vignette {
            v.apply(&mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn off() -> ProofSettings {
        ProofSettings::default()
    }

    #[test]
    fn test_neutral_is_two_stages_no_vignette() {
        let p = compile(&FilterState::default(), &off());
        assert_eq!(p.stage_ids(), vec![StageId::Tonal, StageId::ColorCorrected]);
        assert_eq!(p.input_of(StageId::ColorCorrected), Some(StageInput::Stage(StageId::Tonal)));
        assert_eq!(p.vignette, None);
        assert_eq!(p.output(), StageId::ColorCorrected);
    }

    #[test]
    fn test_sharpen_reads_color_corrected_without_light_stage() {
        let f = FilterState {
            sharpen: 40.0,
            ..Default::default()
        };
        let p = compile(&f, &off());
        assert_eq!(
            p.stage_ids(),
            vec![StageId::Tonal, StageId::ColorCorrected, StageId::Sharpened]
        );
        assert_eq!(
            p.input_of(StageId::Sharpened),
            Some(StageInput::Stage(StageId::ColorCorrected))
        );
    }

    #[test]
    fn test_full_chain_wiring() {
        let f = FilterState {
            highlights: 20.0,
            shadows: -10.0,
            sharpen: 10.0,
            noise: 30.0,
            vignette: 40.0,
            ..Default::default()
        };
        let proof = ProofSettings {
            enabled: true,
            profile_id: "fogra39".into(),
            ..Default::default()
        };
        let p = compile(&f, &proof);
        assert_eq!(
            p.stage_ids(),
            vec![
                StageId::Tonal,
                StageId::ColorCorrected,
                StageId::LightAdjusted,
                StageId::Sharpened,
                StageId::Noised,
                StageId::Proofed
            ]
        );
        assert_eq!(p.input_of(StageId::Sharpened), Some(StageInput::Stage(StageId::LightAdjusted)));
        assert_eq!(p.input_of(StageId::Noised), Some(StageInput::Stage(StageId::Sharpened)));
        assert_eq!(p.input_of(StageId::Proofed), Some(StageInput::Stage(StageId::Noised)));
        assert!(p.vignette.is_some());
        match p.stages[2].op {
            StageOp::Linear { slope, intercept } => {
                assert!((slope - 0.96).abs() < 1e-6);
                assert!((intercept + 0.02).abs() < 1e-6);
            }
            other => panic!("unexpected op {other:?}"),
        }
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        let f = FilterState {
            sharpen: -5.0,
            noise: -1.0,
            vignette: 400.0,
            ..Default::default()
        };
        let p = compile(&f, &off());
        assert_eq!(p.stage_ids().len(), 2);
        assert_eq!(p.vignette.map(|v| v.max_alpha), Some(1.0));
    }

    #[test]
    fn test_neutral_run_is_identity() {
        let mut img = RgbaImage::new(6, 4);
        for (x, y, px) in img.enumerate_pixels_mut() {
            *px = Rgba([(x * 40) as u8, (y * 60) as u8, 77, 255]);
        }
        let p = compile(&FilterState::default(), &off());
        assert_eq!(p.run(&img), img);
        assert_eq!(p.render(&img), img);
    }

    #[test]
    fn test_light_stage_changes_pixels() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([100, 100, 100, 255]));
        let f = FilterState {
            shadows: 100.0,
            ..Default::default()
        };
        let out = compile(&f, &off()).run(&img);
        // 100/255 + 0.2 -> ~151
        assert_eq!(out.get_pixel(0, 0)[0], 151);
    }
}
