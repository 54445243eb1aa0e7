//! Adjustment parameters and their ranges.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum FilterParam {
    Brightness,
    Contrast,
    Saturation,
    Grayscale,
    Sepia,
    Blur,
    Exposure,
    Highlights,
    Shadows,
    Temperature,
    Tint,
    Vibrance,
    Sharpen,
    Clarity,
    Noise,
    Vignette,
}

impl FilterParam {
    pub const CLASSIC: [FilterParam; 6] = [
        FilterParam::Brightness,
        FilterParam::Contrast,
        FilterParam::Saturation,
        FilterParam::Grayscale,
        FilterParam::Sepia,
        FilterParam::Blur,
    ];

    pub const PRO: [FilterParam; 10] = [
        FilterParam::Exposure,
        FilterParam::Highlights,
        FilterParam::Shadows,
        FilterParam::Temperature,
        FilterParam::Tint,
        FilterParam::Vibrance,
        FilterParam::Sharpen,
        FilterParam::Clarity,
        FilterParam::Noise,
        FilterParam::Vignette,
    ];

    pub fn range(&self) -> RangeInclusive<f32> {
        use FilterParam::*;
        match self {
            Brightness | Contrast | Saturation => 0.0..=200.0,
            Grayscale | Sepia => 0.0..=100.0,
            Blur => 0.0..=20.0,
            Exposure | Highlights | Shadows | Temperature | Tint | Vibrance => -100.0..=100.0,
            Sharpen | Clarity | Noise | Vignette => 0.0..=100.0,
        }
    }

    pub fn neutral(&self) -> f32 {
        match self {
            FilterParam::Brightness | FilterParam::Contrast | FilterParam::Saturation => 100.0,
            _ => 0.0,
        }
    }

    pub fn label(&self) -> &'static str {
        use FilterParam::*;
        match self {
            Brightness => "Brightness",
            Contrast => "Contrast",
            Saturation => "Saturation",
            Grayscale => "Grayscale",
            Sepia => "Sepia",
            Blur => "Blur",
            Exposure => "Exposure",
            Highlights => "Highlights",
            Shadows => "Shadows",
            Temperature => "Temperature",
            Tint => "Tint",
            Vibrance => "Vibrance",
            Sharpen => "Sharpen",
            Clarity => "Clarity",
            Noise => "Noise",
            Vignette => "Vignette",
        }
    }
}

/// Raw slider values. Nothing here is clamped; readers go through
/// [`FilterState::clamped`].
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct FilterState {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub grayscale: f32,
    pub sepia: f32,
    pub blur: f32,
    pub exposure: f32,
    pub highlights: f32,
    pub shadows: f32,
    pub temperature: f32,
    pub tint: f32,
    /// Stored and shown, but no pipeline stage reads it.
    pub vibrance: f32,
    pub sharpen: f32,
    pub clarity: f32,
    pub noise: f32,
    pub vignette: f32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            brightness: 100.0,
            contrast: 100.0,
            saturation: 100.0,
            grayscale: 0.0,
            sepia: 0.0,
            blur: 0.0,
            exposure: 0.0,
            highlights: 0.0,
            shadows: 0.0,
            temperature: 0.0,
            tint: 0.0,
            vibrance: 0.0,
            sharpen: 0.0,
            clarity: 0.0,
            noise: 0.0,
            vignette: 0.0,
        }
    }
}

impl FilterState {
    pub fn get(&self, param: FilterParam) -> f32 {
        use FilterParam::*;
        match param {
            Brightness => self.brightness,
            Contrast => self.contrast,
            Saturation => self.saturation,
            Grayscale => self.grayscale,
            Sepia => self.sepia,
            Blur => self.blur,
            Exposure => self.exposure,
            Highlights => self.highlights,
            Shadows => self.shadows,
            Temperature => self.temperature,
            Tint => self.tint,
            Vibrance => self.vibrance,
            Sharpen => self.sharpen,
            Clarity => self.clarity,
            Noise => self.noise,
            Vignette => self.vignette,
        }
    }

    pub fn get_mut(&mut self, param: FilterParam) -> &mut f32 {
        use FilterParam::*;
        match param {
            Brightness => &mut self.brightness,
            Contrast => &mut self.contrast,
            Saturation => &mut self.saturation,
            Grayscale => &mut self.grayscale,
            Sepia => &mut self.sepia,
            Blur => &mut self.blur,
            Exposure => &mut self.exposure,
            Highlights => &mut self.highlights,
            Shadows => &mut self.shadows,
            Temperature => &mut self.temperature,
            Tint => &mut self.tint,
            Vibrance => &mut self.vibrance,
            Sharpen => &mut self.sharpen,
            Clarity => &mut self.clarity,
            Noise => &mut self.noise,
            Vignette => &mut self.vignette,
        }
    }

    pub fn set(&mut self, param: FilterParam, value: f32) {
        *self.get_mut(param) = value;
    }

    /// Copy with every value pulled into its range. NaN becomes neutral.
    pub fn clamped(&self) -> Self {
        let mut out = *self;
        for param in FilterParam::CLASSIC.iter().chain(FilterParam::PRO.iter()) {
            let range = param.range();
            let v = self.get(*param);
            let v = if v.is_nan() {
                param.neutral()
            } else {
                v.clamp(*range.start(), *range.end())
            };
            out.set(*param, v);
        }
        out
    }

    pub fn is_neutral(&self) -> bool {
        *self == FilterState::default()
    }

    pub fn reset(&mut self) {
        *self = FilterState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_neutral() {
        let f = FilterState::default();
        for p in FilterParam::CLASSIC.iter().chain(FilterParam::PRO.iter()) {
            assert_eq!(f.get(*p), p.neutral(), "{}", p.label());
            assert!(p.range().contains(&p.neutral()));
        }
        assert!(f.is_neutral());
    }

    #[test]
    fn test_clamped() {
        let mut f = FilterState::default();
        f.brightness = 500.0;
        f.exposure = -300.0;
        f.blur = 25.0;
        f.noise = f32::NAN;
        let c = f.clamped();
        assert_eq!(c.brightness, 200.0);
        assert_eq!(c.exposure, -100.0);
        assert_eq!(c.blur, 20.0);
        assert_eq!(c.noise, 0.0);
        // Source untouched.
        assert_eq!(f.brightness, 500.0);
    }

    #[test]
    fn test_set_get() {
        let mut f = FilterState::default();
        f.set(FilterParam::Tint, -40.0);
        assert_eq!(f.tint, -40.0);
        assert!(!f.is_neutral());
        f.reset();
        assert!(f.is_neutral());
    }
}
