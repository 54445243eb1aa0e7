//! Per-pixel compositing for the sixteen layer blend modes.

use crate::layers::BlendMode;
use image::Rgba;

/// Composites `top` over `base` with `mode`, scaling the top alpha by `opacity`.
pub fn blend_pixel(base: Rgba<u8>, top: Rgba<u8>, mode: BlendMode, opacity: f32) -> Rgba<u8> {
    if top[3] == 0 || opacity <= 0.0 {
        return base;
    }
    if mode == BlendMode::Normal && opacity >= 1.0 && top[3] == 255 {
        return top;
    }

    let opacity = opacity.clamp(0.0, 1.0);
    let cb = [unit(base[0]), unit(base[1]), unit(base[2])];
    let cs = [unit(top[0]), unit(top[1]), unit(top[2])];
    let ab = unit(base[3]);
    let as_ = unit(top[3]) * opacity;

    let mixed = blend_rgb(cb, cs, mode);

    // Where the backdrop is transparent the source color shows unmodified.
    let src = [
        (1.0 - ab) * cs[0] + ab * mixed[0],
        (1.0 - ab) * cs[1] + ab * mixed[1],
        (1.0 - ab) * cs[2] + ab * mixed[2],
    ];

    let out_a = as_ + ab * (1.0 - as_);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let channel = |i: usize| (src[i] * as_ + cb[i] * ab * (1.0 - as_)) / out_a;

    Rgba([
        to_u8(channel(0)),
        to_u8(channel(1)),
        to_u8(channel(2)),
        to_u8(out_a),
    ])
}

/// The mode's mixing function on straight (unpremultiplied) colors.
pub fn blend_rgb(cb: [f32; 3], cs: [f32; 3], mode: BlendMode) -> [f32; 3] {
    let per_channel = |f: fn(f32, f32) -> f32| [f(cb[0], cs[0]), f(cb[1], cs[1]), f(cb[2], cs[2])];
    match mode {
        BlendMode::Normal => cs,
        BlendMode::Multiply => per_channel(|b, s| b * s),
        BlendMode::Screen => per_channel(screen),
        BlendMode::Overlay => per_channel(|b, s| hard_light(s, b)),
        BlendMode::Darken => per_channel(f32::min),
        BlendMode::Lighten => per_channel(f32::max),
        BlendMode::ColorDodge => per_channel(color_dodge),
        BlendMode::ColorBurn => per_channel(color_burn),
        BlendMode::HardLight => per_channel(hard_light),
        BlendMode::SoftLight => per_channel(soft_light),
        BlendMode::Difference => per_channel(|b, s| (b - s).abs()),
        BlendMode::Exclusion => per_channel(|b, s| b + s - 2.0 * b * s),
        BlendMode::Hue => set_lum(set_sat(cs, sat(cb)), lum(cb)),
        BlendMode::Saturation => set_lum(set_sat(cb, sat(cs)), lum(cb)),
        BlendMode::Color => set_lum(cs, lum(cb)),
        BlendMode::Luminosity => set_lum(cb, lum(cs)),
    }
}

/// Overlay of a single channel, used by the grain stage.
pub fn overlay_channel(base: f32, top: f32) -> f32 {
    hard_light(top, base)
}

fn unit(v: u8) -> f32 {
    v as f32 / 255.0
}

fn to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

fn screen(b: f32, s: f32) -> f32 {
    b + s - b * s
}

fn hard_light(b: f32, s: f32) -> f32 {
    if s <= 0.5 {
        b * 2.0 * s
    } else {
        screen(b, 2.0 * s - 1.0)
    }
}

fn color_dodge(b: f32, s: f32) -> f32 {
    if b <= 0.0 {
        0.0
    } else if s >= 1.0 {
        1.0
    } else {
        (b / (1.0 - s)).min(1.0)
    }
}

fn color_burn(b: f32, s: f32) -> f32 {
    if b >= 1.0 {
        1.0
    } else if s <= 0.0 {
        0.0
    } else {
        1.0 - ((1.0 - b) / s).min(1.0)
    }
}

fn soft_light(b: f32, s: f32) -> f32 {
    if s <= 0.5 {
        b - (1.0 - 2.0 * s) * b * (1.0 - b)
    } else {
        let d = if b <= 0.25 {
            ((16.0 * b - 12.0) * b + 4.0) * b
        } else {
            b.sqrt()
        };
        b + (2.0 * s - 1.0) * (d - b)
    }
}

fn lum(c: [f32; 3]) -> f32 {
    0.3 * c[0] + 0.59 * c[1] + 0.11 * c[2]
}

fn clip_color(c: [f32; 3]) -> [f32; 3] {
    let l = lum(c);
    let n = c[0].min(c[1]).min(c[2]);
    let x = c[0].max(c[1]).max(c[2]);
    let mut out = c;
    if n < 0.0 {
        for v in &mut out {
            *v = l + (*v - l) * l / (l - n);
        }
    }
    if x > 1.0 {
        for v in &mut out {
            *v = l + (*v - l) * (1.0 - l) / (x - l);
        }
    }
    out
}

fn set_lum(c: [f32; 3], l: f32) -> [f32; 3] {
    let d = l - lum(c);
    clip_color([c[0] + d, c[1] + d, c[2] + d])
}

fn sat(c: [f32; 3]) -> f32 {
    c[0].max(c[1]).max(c[2]) - c[0].min(c[1]).min(c[2])
}

fn set_sat(c: [f32; 3], s: f32) -> [f32; 3] {
    let max = c[0].max(c[1]).max(c[2]);
    let min = c[0].min(c[1]).min(c[2]);
    if max <= min {
        return [0.0; 3];
    }
    let scale = s / (max - min);
    [(c[0] - min) * scale, (c[1] - min) * scale, (c[2] - min) * scale]
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn close(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < EPSILON)
    }

    #[test]
    fn test_normal_opaque_overwrites() {
        let out = blend_pixel(Rgba([10, 20, 30, 255]), Rgba([200, 100, 50, 255]), BlendMode::Normal, 1.0);
        assert_eq!(out, Rgba([200, 100, 50, 255]));
    }

    #[test]
    fn test_transparent_top_or_zero_opacity_is_noop() {
        let base = Rgba([10, 20, 30, 255]);
        for mode in BlendMode::all() {
            assert_eq!(blend_pixel(base, Rgba([255, 0, 0, 0]), *mode, 1.0), base);
            assert_eq!(blend_pixel(base, Rgba([255, 0, 0, 255]), *mode, 0.0), base);
        }
    }

    #[test]
    fn test_half_opacity_normal() {
        let out = blend_pixel(Rgba([0, 0, 0, 255]), Rgba([255, 255, 255, 255]), BlendMode::Normal, 0.5);
        assert!((out[0] as i32 - 128).abs() <= 1);
        assert_eq!(out[3], 255);
    }

    #[test]
    fn test_separable_modes() {
        let b = [0.25, 0.5, 0.75];
        let s = [0.5, 0.5, 0.5];
        assert!(close(blend_rgb(b, s, BlendMode::Multiply), [0.125, 0.25, 0.375]));
        assert!(close(blend_rgb(b, s, BlendMode::Screen), [0.625, 0.75, 0.875]));
        assert!(close(blend_rgb(b, s, BlendMode::Darken), [0.25, 0.5, 0.5]));
        assert!(close(blend_rgb(b, s, BlendMode::Lighten), [0.5, 0.5, 0.75]));
        assert!(close(blend_rgb(b, s, BlendMode::Difference), [0.25, 0.0, 0.25]));
        assert!(close(blend_rgb(b, s, BlendMode::Exclusion), [0.5, 0.5, 0.5]));
        // Mid-gray is the identity for overlay's source and soft light.
        assert!(close(blend_rgb(b, s, BlendMode::Overlay), [0.25, 0.5, 0.75]));
        assert!(close(blend_rgb(b, s, BlendMode::SoftLight), b));
    }

    #[test]
    fn test_dodge_and_burn_edges() {
        assert_eq!(color_dodge(0.0, 1.0), 0.0);
        assert_eq!(color_dodge(0.5, 1.0), 1.0);
        assert_eq!(color_burn(1.0, 0.0), 1.0);
        assert_eq!(color_burn(0.5, 0.0), 0.0);
    }

    #[test]
    fn test_luminosity_keeps_backdrop_hue() {
        let gray = [0.5, 0.5, 0.5];
        let red = [1.0, 0.0, 0.0];
        let out = blend_rgb(gray, red, BlendMode::Color);
        assert!((lum(out) - 0.5).abs() < EPSILON);
        assert!(out[0] > out[1] && out[0] > out[2]);

        let out = blend_rgb(red, gray, BlendMode::Luminosity);
        assert!((lum(out) - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_over_transparent_backdrop_shows_source() {
        let out = blend_pixel(Rgba([0, 0, 0, 0]), Rgba([200, 40, 40, 255]), BlendMode::Multiply, 1.0);
        assert_eq!(out, Rgba([200, 40, 40, 255]));
    }
}
