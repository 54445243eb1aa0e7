use image::RgbaImage;
use rayon::prelude::*;

/// 3×3 kernel, row-major. Edges repeat the border pixel; alpha passes through.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Kernel3(pub [[f32; 3]; 3]);

impl Kernel3 {
    /// Cross-shaped unsharp kernel; the weights always sum to one.
    pub fn sharpen(amount: f32) -> Self {
        let s = amount / 20.0;
        let c = 1.0 + 4.0 * s;
        Kernel3([[0.0, -s, 0.0], [-s, c, -s], [0.0, -s, 0.0]])
    }

    pub fn apply(&self, image: &RgbaImage) -> RgbaImage {
        let (w, h) = image.dimensions();
        let mut out = image.clone();
        if w == 0 || h == 0 {
            return out;
        }
        let src: &[[u8; 4]] = bytemuck::cast_slice(image.as_raw());
        let dst: &mut [[u8; 4]] = bytemuck::cast_slice_mut(&mut *out);
        let (w, h) = (w as i64, h as i64);

        dst.par_chunks_mut(w as usize)
            .enumerate()
            .for_each(|(y, row)| {
                let y = y as i64;
                for (x, px) in row.iter_mut().enumerate() {
                    let x = x as i64;
                    let mut acc = [0.0f32; 3];
                    for (ky, krow) in self.0.iter().enumerate() {
                        for (kx, weight) in krow.iter().enumerate() {
                            if *weight == 0.0 {
                                continue;
                            }
                            let sx = (x + kx as i64 - 1).clamp(0, w - 1);
                            let sy = (y + ky as i64 - 1).clamp(0, h - 1);
                            let sample = src[(sy * w + sx) as usize];
                            for (a, s) in acc.iter_mut().zip(sample.iter()) {
                                *a += weight * *s as f32;
                            }
                        }
                    }
                    for (c, a) in px.iter_mut().zip(acc.iter()) {
                        *c = a.round().clamp(0.0, 255.0) as u8;
                    }
                }
            });
        out
    }
}
