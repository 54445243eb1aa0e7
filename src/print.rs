//! Print job settings and ICC profile bookkeeping.

use crate::pipeline::softproof;
use serde::{Deserialize, Serialize};

pub const DPI_PRESETS: [u32; 4] = [72, 150, 300, 600];

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderingIntent {
    Perceptual,
    #[default]
    RelativeColorimetric,
    AbsoluteColorimetric,
    Saturation,
}

impl RenderingIntent {
    pub fn all() -> [RenderingIntent; 4] {
        [
            RenderingIntent::Perceptual,
            RenderingIntent::RelativeColorimetric,
            RenderingIntent::AbsoluteColorimetric,
            RenderingIntent::Saturation,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            RenderingIntent::Perceptual => "Perceptual",
            RenderingIntent::RelativeColorimetric => "Relative Colorimetric",
            RenderingIntent::AbsoluteColorimetric => "Absolute Colorimetric",
            RenderingIntent::Saturation => "Saturation",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperType {
    #[default]
    Glossy,
    Matte,
    Canvas,
    Vinyl,
}

impl PaperType {
    pub fn all() -> [PaperType; 4] {
        [PaperType::Glossy, PaperType::Matte, PaperType::Canvas, PaperType::Vinyl]
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaperType::Glossy => "Glossy Photo",
            PaperType::Matte => "Matte Fine Art",
            PaperType::Canvas => "Canvas",
            PaperType::Vinyl => "Vinyl",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum ColorSpaceType {
    Cmyk,
    Rgb,
    Gray,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IccProfile {
    pub id: String,
    pub name: String,
    pub color_space: ColorSpaceType,
    /// Opaque; never parsed.
    #[serde(skip)]
    pub data: Option<Vec<u8>>,
    pub built_in: bool,
}

impl IccProfile {
    fn built_in(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            color_space: ColorSpaceType::Cmyk,
            data: None,
            built_in: true,
        }
    }

    pub fn built_ins() -> Vec<IccProfile> {
        vec![
            IccProfile::built_in(softproof::SWOP_COATED, "U.S. Web Coated (SWOP) v2"),
            IccProfile::built_in(softproof::FOGRA39, "Coated FOGRA39 (ISO 12647-2:2004)"),
            IccProfile::built_in(softproof::GRACOL, "GRACoL 2006 Coated1v2"),
            IccProfile::built_in(softproof::UNCOATED, "Uncoated FOGRA29"),
        ]
    }
}

/// Display name for an uploaded profile file: the file name without a
/// trailing `.icc` / `.icm`, compared case-insensitively.
pub fn profile_display_name(file_name: &str) -> String {
    let lower = file_name.to_ascii_lowercase();
    for ext in [".icc", ".icm"] {
        if lower.ends_with(ext) && file_name.len() > ext.len() {
            return file_name[..file_name.len() - ext.len()].to_string();
        }
    }
    file_name.to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrintSettings {
    pub dpi: u32,
    pub width_cm: f32,
    pub height_cm: f32,
    pub paper_type: PaperType,
    pub bleed_mm: f32,
    pub profile_id: String,
    pub intent: RenderingIntent,
}

impl Default for PrintSettings {
    fn default() -> Self {
        Self {
            dpi: 300,
            width_cm: 21.0,
            height_cm: 29.7,
            paper_type: PaperType::Glossy,
            bleed_mm: 3.0,
            profile_id: softproof::SWOP_COATED.to_string(),
            intent: RenderingIntent::RelativeColorimetric,
        }
    }
}

impl PrintSettings {
    /// Pixel dimensions the physical size needs at the chosen DPI.
    pub fn pixel_dimensions(&self) -> (u32, u32) {
        let px = |cm: f32| ((cm.max(0.0) / 2.54) * self.dpi as f32).round() as u32;
        (px(self.width_cm), px(self.height_cm))
    }

    pub fn megapixels(&self) -> f32 {
        let (w, h) = self.pixel_dimensions();
        (w as f64 * h as f64 / 1_000_000.0) as f32
    }

    /// Ruler scale for an image of `image_width` pixels.
    pub fn pixels_per_cm(&self, image_width: u32) -> f32 {
        let width_cm = if self.width_cm > 0.0 { self.width_cm } else { 21.0 };
        image_width as f32 / width_cm
    }
}
