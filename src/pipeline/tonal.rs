//! The base tonal stage: brightness, contrast, saturate, grayscale, blur, sepia,
//! applied in that order with clamping after each step.

use super::matrix::map_pixels;
use crate::filters::FilterState;
use image::RgbaImage;

/// Effective tonal amounts, as fractions (1.0 = unchanged for the first three).
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct TonalParams {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub grayscale: f32,
    pub blur_px: f32,
    pub sepia: f32,
}

impl TonalParams {
    /// Exposure folds into brightness; clarity boosts contrast.
    pub fn from_filters(f: &FilterState) -> Self {
        let brightness = 100.0 + f.exposure + (f.brightness - 100.0);
        let contrast = f.contrast * (1.0 + f.clarity / 200.0);
        Self {
            brightness: (brightness / 100.0).max(0.0),
            contrast: (contrast / 100.0).max(0.0),
            saturation: (f.saturation / 100.0).max(0.0),
            grayscale: (f.grayscale / 100.0).clamp(0.0, 1.0),
            blur_px: f.blur.max(0.0),
            sepia: (f.sepia / 100.0).clamp(0.0, 1.0),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.brightness == 1.0
            && self.contrast == 1.0
            && self.saturation == 1.0
            && self.grayscale == 0.0
            && self.blur_px == 0.0
            && self.sepia == 0.0
    }

    /// CSS-style filter string equivalent, used for logging.
    pub fn to_css(&self) -> String {
        format!(
            "brightness({:.0}%) contrast({:.0}%) saturate({:.0}%) grayscale({:.0}%) blur({}px) sepia({:.0}%)",
            self.brightness * 100.0,
            self.contrast * 100.0,
            self.saturation * 100.0,
            self.grayscale * 100.0,
            self.blur_px,
            self.sepia * 100.0
        )
    }

    pub fn apply(&self, image: &RgbaImage) -> RgbaImage {
        if self.is_identity() {
            return image.clone();
        }
        let p = *self;
        let pre = map_pixels(image, move |px| {
            let rgb = [px[0], px[1], px[2]];
            let rgb = clamp3(rgb.map(|c| c * p.brightness));
            let rgb = clamp3(rgb.map(|c| (c - 0.5) * p.contrast + 0.5));
            let rgb = clamp3(mul3(&saturate_matrix(p.saturation), rgb));
            let rgb = clamp3(mul3(&grayscale_matrix(p.grayscale), rgb));
            if p.blur_px == 0.0 {
                let rgb = clamp3(mul3(&sepia_matrix(p.sepia), rgb));
                [rgb[0], rgb[1], rgb[2], px[3]]
            } else {
                [rgb[0], rgb[1], rgb[2], px[3]]
            }
        });
        if self.blur_px == 0.0 {
            return pre;
        }
        let blurred = image::imageops::blur(&pre, self.blur_px);
        if self.sepia == 0.0 {
            return blurred;
        }
        let sepia = sepia_matrix(self.sepia);
        map_pixels(&blurred, move |px| {
            let rgb = clamp3(mul3(&sepia, [px[0], px[1], px[2]]));
            [rgb[0], rgb[1], rgb[2], px[3]]
        })
    }
}

fn mul3(m: &[[f32; 3]; 3], c: [f32; 3]) -> [f32; 3] {
    [
        m[0][0] * c[0] + m[0][1] * c[1] + m[0][2] * c[2],
        m[1][0] * c[0] + m[1][1] * c[1] + m[1][2] * c[2],
        m[2][0] * c[0] + m[2][1] * c[1] + m[2][2] * c[2],
    ]
}

fn clamp3(c: [f32; 3]) -> [f32; 3] {
    c.map(|v| v.clamp(0.0, 1.0))
}

fn saturate_matrix(s: f32) -> [[f32; 3]; 3] {
    [
        [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
    ]
}

fn grayscale_matrix(g: f32) -> [[f32; 3]; 3] {
    let k = 1.0 - g;
    [
        [0.2126 + 0.7874 * k, 0.7152 - 0.7152 * k, 0.0722 - 0.0722 * k],
        [0.2126 - 0.2126 * k, 0.7152 + 0.2848 * k, 0.0722 - 0.0722 * k],
        [0.2126 - 0.2126 * k, 0.7152 - 0.7152 * k, 0.0722 + 0.9278 * k],
    ]
}

fn sepia_matrix(s: f32) -> [[f32; 3]; 3] {
    let k = 1.0 - s;
    [
        [0.393 + 0.607 * k, 0.769 - 0.769 * k, 0.189 - 0.189 * k],
        [0.349 - 0.349 * k, 0.686 + 0.314 * k, 0.168 - 0.168 * k],
        [0.272 - 0.272 * k, 0.534 - 0.534 * k, 0.131 + 0.869 * k],
    ]
}
