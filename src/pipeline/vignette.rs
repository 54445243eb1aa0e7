use image::RgbaImage;
use rayon::prelude::*;

/// Radial darkening: clear out to `inner` of the center-to-corner distance,
/// then ramping linearly to black at `max_alpha` on the corners.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Vignette {
    pub inner: f32,
    pub max_alpha: f32,
}

impl Vignette {
    pub fn from_amount(amount: f32) -> Option<Self> {
        if amount <= 0.0 {
            return None;
        }
        Some(Self {
            inner: (100.0 - amount * 0.8) / 100.0,
            max_alpha: amount / 100.0,
        })
    }

    /// Overlay alpha at pixel (x, y) of a `w`×`h` surface.
    pub fn alpha_at(&self, x: u32, y: u32, w: u32, h: u32) -> f32 {
        let cx = w as f32 / 2.0;
        let cy = h as f32 / 2.0;
        let radius = (cx * cx + cy * cy).sqrt();
        if radius <= 0.0 {
            return 0.0;
        }
        let dx = x as f32 + 0.5 - cx;
        let dy = y as f32 + 0.5 - cy;
        let t = (dx * dx + dy * dy).sqrt() / radius;
        if t <= self.inner {
            return 0.0;
        }
        let span = (1.0 - self.inner).max(f32::EPSILON);
        ((t - self.inner) / span).min(1.0) * self.max_alpha
    }

    /// Darkens `image` in place with the black overlay.
    pub fn apply(&self, image: &mut RgbaImage) {
        let (w, h) = image.dimensions();
        if w == 0 {
            return;
        }
        let v = *self;
        let pixels: &mut [[u8; 4]] = bytemuck::cast_slice_mut(&mut **image);
        pixels
            .par_chunks_mut(w as usize)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, px) in row.iter_mut().enumerate() {
                    let a = v.alpha_at(x as u32, y as u32, w, h);
                    if a <= 0.0 {
                        continue;
                    }
                    for c in px.iter_mut().take(3) {
                        *c = (*c as f32 * (1.0 - a)).round() as u8;
                    }
                    let alpha = px[3] as f32 / 255.0;
                    px[3] = ((a + alpha * (1.0 - a)) * 255.0).round().min(255.0) as u8;
                }
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_zero_amount_has_no_overlay() {
        assert_eq!(Vignette::from_amount(0.0), None);
    }

    #[test]
    fn test_full_amount_geometry() {
        let v = Vignette::from_amount(100.0).unwrap();
        assert!((v.inner - 0.2).abs() < 1e-6);
        assert_eq!(v.max_alpha, 1.0);
        assert_eq!(v.alpha_at(50, 50, 100, 100), 0.0);
        assert!(v.alpha_at(0, 0, 100, 100) > 0.95);
    }

    #[test]
    fn test_center_untouched_corners_darkened() {
        let mut img = RgbaImage::from_pixel(40, 40, Rgba([200, 200, 200, 255]));
        Vignette::from_amount(50.0).unwrap().apply(&mut img);
        assert_eq!(*img.get_pixel(20, 20), Rgba([200, 200, 200, 255]));
        assert!(img.get_pixel(0, 0)[0] < 200);
        assert_eq!(img.get_pixel(0, 0)[3], 255);
    }
}
