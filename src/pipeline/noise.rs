//! Monochrome film grain: one octave of lattice value noise, overlaid on the
//! image at low alpha.

use super::matrix::map_pixels_indexed;
use crate::blend::overlay_channel;
use image::RgbaImage;

const SEED: u32 = 0x9e37_79b9;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Grain {
    /// Lattice cells per pixel.
    pub frequency: f32,
    /// Peak alpha of the grain layer.
    pub alpha: f32,
}

impl Grain {
    pub fn from_amount(noise: f32) -> Self {
        Self {
            frequency: 0.5 + noise / 100.0,
            alpha: noise / 300.0,
        }
    }

    /// Grain layer sample at a pixel: (gray value, alpha), both 0..1.
    pub fn sample(&self, x: u32, y: u32) -> (f32, f32) {
        let fx = (x as f32 + 0.5) * self.frequency;
        let fy = (y as f32 + 0.5) * self.frequency;
        let value = value_noise(fx, fy, SEED);
        let coverage = value_noise(fx, fy, SEED ^ 0x5bd1_e995);
        (value, coverage * self.alpha)
    }

    pub fn apply(&self, image: &RgbaImage) -> RgbaImage {
        if self.alpha <= 0.0 {
            return image.clone();
        }
        let grain = *self;
        map_pixels_indexed(image, move |x, y, px| {
            let (gray, a) = grain.sample(x, y);
            let mut out = px;
            for c in out.iter_mut().take(3) {
                *c = (1.0 - a) * *c + a * overlay_channel(*c, gray);
            }
            out[3] = a + px[3] * (1.0 - a);
            out
        })
    }
}

fn hash(x: i32, y: i32, seed: u32) -> f32 {
    let mut h = (x as u32).wrapping_mul(0x27d4_eb2d) ^ (y as u32).wrapping_mul(0x1656_67b1) ^ seed;
    h ^= h >> 15;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h as f32 / u32::MAX as f32
}

fn smooth(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

fn value_noise(x: f32, y: f32, seed: u32) -> f32 {
    let x0 = x.floor();
    let y0 = y.floor();
    let (ix, iy) = (x0 as i32, y0 as i32);
    let tx = smooth(x - x0);
    let ty = smooth(y - y0);
    let a = hash(ix, iy, seed);
    let b = hash(ix + 1, iy, seed);
    let c = hash(ix, iy + 1, seed);
    let d = hash(ix + 1, iy + 1, seed);
    let top = a + (b - a) * tx;
    let bottom = c + (d - c) * tx;
    top + (bottom - top) * ty
}
