//! 4×5 color matrices (rows R,G,B,A; columns R,G,B,A,offset) over 0..1 channels.

use image::RgbaImage;
use rayon::prelude::*;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ColorMatrix(pub [[f32; 5]; 4]);

impl ColorMatrix {
    pub const IDENTITY: ColorMatrix = ColorMatrix([
        [1.0, 0.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, 1.0, 0.0],
    ]);

    /// Per-channel gains with alpha untouched.
    pub fn diagonal(r: f32, g: f32, b: f32) -> Self {
        Self::rgb([[r, 0.0, 0.0], [0.0, g, 0.0], [0.0, 0.0, b]])
    }

    /// 3×3 color block with identity alpha and no offsets.
    pub fn rgb(m: [[f32; 3]; 3]) -> Self {
        let mut out = Self::IDENTITY;
        for (row, src) in out.0.iter_mut().zip(m.iter()) {
            row[..3].copy_from_slice(src);
        }
        out
    }

    /// Warm pushes red, cool pushes blue, tint scales green (negative tint
    /// pulls green below 1 for a magenta cast).
    pub fn temperature_tint(temperature: f32, tint: f32) -> Self {
        let t = temperature / 100.0;
        let r = 1.0 + if t > 0.0 { t * 0.1 } else { 0.0 };
        let g = 1.0 + (tint / 100.0) * 0.1;
        let b = 1.0 + if t < 0.0 { t.abs() * 0.1 } else { 0.0 };
        Self::diagonal(r, g, b)
    }

    pub fn transform(&self, px: [f32; 4]) -> [f32; 4] {
        let mut out = [0.0; 4];
        for (o, row) in out.iter_mut().zip(self.0.iter()) {
            let v = row[0] * px[0] + row[1] * px[1] + row[2] * px[2] + row[3] * px[3] + row[4];
            *o = v.clamp(0.0, 1.0);
        }
        out
    }

    pub fn apply(&self, image: &RgbaImage) -> RgbaImage {
        map_pixels(image, |px| self.transform(px))
    }
}

/// Runs `f` on every pixel in parallel rows, with channels in 0..1.
pub fn map_pixels<F>(image: &RgbaImage, f: F) -> RgbaImage
where
    F: Fn([f32; 4]) -> [f32; 4] + Sync,
{
    map_pixels_indexed(image, |_, _, px| f(px))
}

/// Like [`map_pixels`] but also passes the pixel coordinates.
pub fn map_pixels_indexed<F>(image: &RgbaImage, f: F) -> RgbaImage
where
    F: Fn(u32, u32, [f32; 4]) -> [f32; 4] + Sync,
{
    let mut out = image.clone();
    let row_len = image.width() as usize;
    if row_len == 0 {
        return out;
    }
    let pixels: &mut [[u8; 4]] = bytemuck::cast_slice_mut(&mut *out);
    pixels
        .par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.iter_mut().enumerate() {
                *px = from_unit(f(x as u32, y as u32, to_unit(*px)));
            }
        });
    out
}

pub fn to_unit(px: [u8; 4]) -> [f32; 4] {
    [
        px[0] as f32 / 255.0,
        px[1] as f32 / 255.0,
        px[2] as f32 / 255.0,
        px[3] as f32 / 255.0,
    ]
}

pub fn from_unit(v: [f32; 4]) -> [u8; 4] {
    let c = |x: f32| (x * 255.0).round().clamp(0.0, 255.0) as u8;
    [c(v[0]), c(v[1]), c(v[2]), c(v[3])]
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const EPSILON: f32 = 1e-6;

    #[test]
    fn test_temperature_tint_coefficients() {
        let warm = ColorMatrix::temperature_tint(100.0, 0.0);
        assert!((warm.0[0][0] - 1.1).abs() < EPSILON);
        assert_eq!(warm.0[2][2], 1.0);

        let cool = ColorMatrix::temperature_tint(-50.0, 0.0);
        assert_eq!(cool.0[0][0], 1.0);
        assert!((cool.0[2][2] - 1.05).abs() < EPSILON);

        let magenta = ColorMatrix::temperature_tint(0.0, -100.0);
        assert!((magenta.0[1][1] - 0.9).abs() < EPSILON);
        assert_eq!(magenta.0[3][3], 1.0);
    }

    #[test]
    fn test_neutral_temperature_is_identity() {
        assert_eq!(ColorMatrix::temperature_tint(0.0, 0.0), ColorMatrix::IDENTITY);
    }

    #[test]
    fn test_apply_keeps_alpha_and_clamps() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([250, 100, 0, 77]));
        let out = ColorMatrix::diagonal(2.0, 0.5, 1.0).apply(&img);
        assert_eq!(*out.get_pixel(1, 1), Rgba([255, 50, 0, 77]));
    }
}
