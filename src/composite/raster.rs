use crate::blend::blend_pixel;
use crate::color::{Paint, Rgb};
use crate::composite::GridSettings;
use crate::fonts::FontLibrary;
use crate::layers::{BlendMode, Layer, LayerKind, PathProps, ShapeProps, TextProps, VectorStyle};
use crate::tools::hit_test::{text_rect, TEXT_PADDING};
use ab_glyph::{point, Font, PxScale, ScaleFont};
use egui::{Pos2, Rect, Vec2};
use image::{Rgba, RgbaImage};
use rayon::prelude::*;

/// Selection outline color (a light blue at half strength).
const OUTLINE: Rgba<u8> = Rgba([96, 165, 250, 128]);
const OUTLINE_WIDTH: i64 = 2;

/// A rasterized layer placed at `origin` in canvas pixels.
pub struct Sprite {
    pub origin: (i64, i64),
    pub image: RgbaImage,
}

pub fn draw_image(canvas: &mut RgbaImage, image: &RgbaImage) {
    if canvas.dimensions() == image.dimensions() {
        canvas.copy_from_slice(image.as_raw());
    } else {
        image::imageops::overlay(canvas, image, 0, 0);
    }
}

pub fn canvas_rect(canvas: &RgbaImage) -> Rect {
    Rect::from_min_size(Pos2::ZERO, Vec2::new(canvas.width() as f32, canvas.height() as f32))
}

/// Shapes and paths are only rasterized where they overlap `clip`.
pub fn rasterize_layer(layer: &Layer, fonts: &FontLibrary, clip: Rect) -> Option<Sprite> {
    match &layer.kind {
        LayerKind::Rectangle(s) => rasterize_shape(layer.position, s, false, clip),
        LayerKind::Ellipse(s) => rasterize_shape(layer.position, s, true, clip),
        LayerKind::Path(p) => rasterize_path(layer.position, p, clip),
        LayerKind::Text(t) => {
            let sprite = rasterize_text(layer.position, t, fonts)?;
            if layer.rotation == 0.0 {
                Some(sprite)
            } else {
                Some(rotate_sprite(&sprite, layer.rotation))
            }
        }
    }
}

fn paint_color(paint: Paint, alpha: f32) -> Option<Rgba<u8>> {
    let Rgb { r, g, b } = paint.rgb()?;
    let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
    (a > 0).then_some(Rgba([r, g, b, a]))
}

/// Stroke over fill, with the stroke centered on the outline.
fn rasterize_shape(position: Pos2, shape: &ShapeProps, ellipse: bool, clip: Rect) -> Option<Sprite> {
    if shape.size.x <= 0.0 || shape.size.y <= 0.0 {
        return None;
    }
    let style: &VectorStyle = &shape.style;
    let fill = paint_color(style.fill_color, 1.0);
    let stroke = if style.stroke_width > 0.0 {
        paint_color(style.stroke_color, style.stroke_opacity)
    } else {
        None
    };
    if fill.is_none() && stroke.is_none() {
        return None;
    }

    let half = style.stroke_width / 2.0;
    let bounds = Rect::from_min_size(position, shape.size)
        .expand(half + 1.0)
        .intersect(clip);
    if !bounds.is_positive() {
        return None;
    }
    let origin = (bounds.min.x.floor() as i64, bounds.min.y.floor() as i64);
    let w = (bounds.max.x.ceil() as i64 - origin.0).max(1) as u32;
    let h = (bounds.max.y.ceil() as i64 - origin.1).max(1) as u32;

    let center = position + shape.size / 2.0;
    let radii = shape.size / 2.0;
    let rect = Rect::from_min_size(position, shape.size);

    let mut image = RgbaImage::new(w, h);
    let pixels: &mut [[u8; 4]] = bytemuck::cast_slice_mut(&mut *image);
    pixels
        .par_chunks_mut(w as usize)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.iter_mut().enumerate() {
                let p = Pos2::new(
                    (origin.0 + x as i64) as f32 + 0.5,
                    (origin.1 + y as i64) as f32 + 0.5,
                );
                let (inside, on_stroke) = if ellipse {
                    let inside = in_ellipse(p, center, radii);
                    let on_stroke = half > 0.0
                        && in_ellipse(p, center, radii + Vec2::splat(half))
                        && !in_ellipse(p, center, radii - Vec2::splat(half));
                    (inside, on_stroke)
                } else {
                    let inside = rect.contains(p);
                    let on_stroke = half > 0.0
                        && rect.expand(half).contains(p)
                        && !rect.shrink(half).contains(p);
                    (inside, on_stroke)
                };
                let mut out = Rgba([0, 0, 0, 0]);
                if let (true, Some(f)) = (inside, fill) {
                    out = f;
                }
                if let (true, Some(s)) = (on_stroke, stroke) {
                    out = blend_pixel(out, s, BlendMode::Normal, 1.0);
                }
                *px = out.0;
            }
        });
    Some(Sprite { origin, image })
}

fn in_ellipse(p: Pos2, c: Pos2, r: Vec2) -> bool {
    if r.x <= 0.0 || r.y <= 0.0 {
        return false;
    }
    let dx = (p.x - c.x) / r.x;
    let dy = (p.y - c.y) / r.y;
    dx * dx + dy * dy <= 1.0
}

/// Stroke-only polyline drawn by stamping discs along each segment.
fn rasterize_path(position: Pos2, path: &PathProps, clip: Rect) -> Option<Sprite> {
    let style = &path.style;
    let color = paint_color(style.stroke_color, style.stroke_opacity)?;
    let first = *path.points.first()?;
    if style.stroke_width <= 0.0 {
        return None;
    }
    let offset = position.to_vec2();
    let radius = style.stroke_width / 2.0;

    let hull = path
        .points
        .iter()
        .fold(Rect::from_min_max(first, first), |r, p| r.union(Rect::from_min_max(*p, *p)))
        .translate(offset)
        .expand(radius + 1.0)
        .intersect(clip);
    if !hull.is_positive() {
        return None;
    }
    let origin = (hull.min.x.floor() as i64, hull.min.y.floor() as i64);
    let w = (hull.max.x.ceil() as i64 - origin.0).max(1) as u32;
    let h = (hull.max.y.ceil() as i64 - origin.1).max(1) as u32;
    let mut image = RgbaImage::new(w, h);
    let local = |p: Pos2| p + offset - Vec2::new(origin.0 as f32, origin.1 as f32);
    let area = canvas_rect(&image).expand(radius);

    if path.points.len() == 1 {
        stamp_disc(&mut image, local(first), radius, color);
    }
    for pair in path.points.windows(2) {
        let (a, b) = (local(pair[0]), local(pair[1]));
        let Some((t0, t1)) = clip_segment(a, b, area) else {
            continue;
        };
        let (start, end) = (a.lerp(b, t0), a.lerp(b, t1));
        let steps = start.distance(end).max(1.0) as u32;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            stamp_disc(&mut image, start.lerp(end, t), radius, color);
        }
    }
    Some(Sprite { origin, image })
}

/// Parameter range of the segment `a..b` that lies inside `r`.
fn clip_segment(a: Pos2, b: Pos2, r: Rect) -> Option<(f32, f32)> {
    let d = b - a;
    let (mut t0, mut t1) = (0.0_f32, 1.0_f32);
    for (p, q) in [
        (-d.x, a.x - r.min.x),
        (d.x, r.max.x - a.x),
        (-d.y, a.y - r.min.y),
        (d.y, r.max.y - a.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else if p < 0.0 {
            t0 = t0.max(q / p);
        } else {
            t1 = t1.min(q / p);
        }
    }
    (t0 <= t1).then_some((t0, t1))
}

fn stamp_disc(image: &mut RgbaImage, center: Pos2, radius: f32, color: Rgba<u8>) {
    let (w, h) = (image.width() as i64, image.height() as i64);
    let min_x = ((center.x - radius).floor() as i64).max(0);
    let max_x = ((center.x + radius).ceil() as i64).min(w - 1);
    let min_y = ((center.y - radius).floor() as i64).max(0);
    let max_y = ((center.y + radius).ceil() as i64).min(h - 1);
    let r_sq = radius * radius;

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dx = x as f32 + 0.5 - center.x;
            let dy = y as f32 + 0.5 - center.y;
            if dx * dx + dy * dy <= r_sq.max(0.25) {
                image.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

fn rasterize_text(position: Pos2, text: &TextProps, fonts: &FontLibrary) -> Option<Sprite> {
    let font = fonts.face(&text.font_family)?;
    let rect = text_rect(position, text, fonts);
    let w = rect.width().ceil().max(1.0) as u32;
    let h = rect.height().ceil().max(1.0) as u32;
    let mut image = RgbaImage::new(w, h);

    let scaled = font.as_scaled(PxScale::from(text.font_size));
    let baseline = TEXT_PADDING + scaled.ascent();
    let mut caret = TEXT_PADDING;
    let mut prev = None;
    let Rgb { r, g, b } = text.color;

    for c in text.text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(p) = prev {
            caret += scaled.kern(p, id);
        }
        let glyph = id.with_scale_and_position(scaled.scale(), point(caret, baseline));
        caret += scaled.h_advance(id);
        prev = Some(id);

        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|gx, gy, coverage| {
            let x = bounds.min.x as i64 + gx as i64;
            let y = bounds.min.y as i64 + gy as i64;
            if x < 0 || y < 0 || x >= w as i64 || y >= h as i64 {
                return;
            }
            let a = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
            let px = image.get_pixel_mut(x as u32, y as u32);
            if a > px[3] {
                *px = Rgba([r, g, b, a]);
            }
        });
    }

    Some(Sprite {
        origin: (rect.min.x.round() as i64, rect.min.y.round() as i64),
        image,
    })
}

/// Rotates a sprite about its center (nearest-neighbour).
pub fn rotate_sprite(sprite: &Sprite, degrees: f32) -> Sprite {
    let (w, h) = (sprite.image.width() as f32, sprite.image.height() as f32);
    let (sin, cos) = degrees.to_radians().sin_cos();
    let nw = (w * cos.abs() + h * sin.abs()).ceil().max(1.0);
    let nh = (w * sin.abs() + h * cos.abs()).ceil().max(1.0);
    let mut image = RgbaImage::new(nw as u32, nh as u32);

    for (x, y, px) in image.enumerate_pixels_mut() {
        let dx = x as f32 + 0.5 - nw / 2.0;
        let dy = y as f32 + 0.5 - nh / 2.0;
        // Inverse rotation back into the source.
        let sx = dx * cos + dy * sin + w / 2.0;
        let sy = -dx * sin + dy * cos + h / 2.0;
        if sx >= 0.0 && sy >= 0.0 && sx < w && sy < h {
            *px = *sprite.image.get_pixel(sx as u32, sy as u32);
        }
    }

    let shift_x = ((nw - w) / 2.0).round() as i64;
    let shift_y = ((nh - h) / 2.0).round() as i64;
    Sprite {
        origin: (sprite.origin.0 - shift_x, sprite.origin.1 - shift_y),
        image,
    }
}

/// Composites a sprite onto the canvas, clipped to the canvas bounds.
pub fn blend_sprite(canvas: &mut RgbaImage, sprite: &Sprite, mode: BlendMode, opacity: f32) {
    let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);
    let (ox, oy) = sprite.origin;
    let (sw, sh) = (sprite.image.width() as i64, sprite.image.height() as i64);
    let x0 = ox.max(0);
    let x1 = (ox + sw).min(cw);
    let y0 = oy.max(0);
    let y1 = (oy + sh).min(ch);
    if x0 >= x1 || y0 >= y1 || opacity <= 0.0 {
        return;
    }

    let row_len = cw as usize;
    let pixels: &mut [[u8; 4]] = bytemuck::cast_slice_mut(&mut **canvas);
    pixels
        .par_chunks_mut(row_len)
        .enumerate()
        .skip(y0 as usize)
        .take((y1 - y0) as usize)
        .for_each(|(y, row)| {
            let sy = (y as i64 - oy) as u32;
            for x in x0..x1 {
                let top = *sprite.image.get_pixel((x - ox) as u32, sy);
                let dst = &mut row[x as usize];
                *dst = blend_pixel(Rgba(*dst), top, mode, opacity).0;
            }
        });
}

/// Two-pixel border just inside `rect`.
pub fn draw_outline(canvas: &mut RgbaImage, rect: Rect) {
    let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);
    let x0 = rect.min.x.floor() as i64;
    let y0 = rect.min.y.floor() as i64;
    let x1 = rect.max.x.ceil() as i64;
    let y1 = rect.max.y.ceil() as i64;
    for y in y0.max(0)..y1.min(ch) {
        for x in x0.max(0)..x1.min(cw) {
            let edge = x - x0 < OUTLINE_WIDTH
                || x1 - 1 - x < OUTLINE_WIDTH
                || y - y0 < OUTLINE_WIDTH
                || y1 - 1 - y < OUTLINE_WIDTH;
            if edge {
                let px = canvas.get_pixel_mut(x as u32, y as u32);
                *px = blend_pixel(*px, OUTLINE, BlendMode::Normal, 1.0);
            }
        }
    }
}

/// One-pixel lines every `spacing` pixels from the top-left corner.
pub fn draw_grid(canvas: &mut RgbaImage, grid: &GridSettings) {
    if grid.spacing < 1.0 || grid.opacity <= 0.0 {
        return;
    }
    let Rgb { r, g, b } = grid.color;
    let line = Rgba([r, g, b, 255]);
    let spacing = grid.spacing;
    let on_line = |v: u32| {
        let k = (v as f32 / spacing).round();
        (k * spacing).floor() as u32 == v
    };
    let opacity = grid.opacity;
    let (w, _) = canvas.dimensions();
    if w == 0 {
        return;
    }
    let pixels: &mut [[u8; 4]] = bytemuck::cast_slice_mut(&mut **canvas);
    pixels
        .par_chunks_mut(w as usize)
        .enumerate()
        .for_each(|(y, row)| {
            let row_line = on_line(y as u32);
            for (x, px) in row.iter_mut().enumerate() {
                if row_line || on_line(x as u32) {
                    *px = blend_pixel(Rgba(*px), line, BlendMode::Normal, opacity).0;
                }
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::{LayerId, LayerPatch, StylePatch};

    fn clip() -> Rect {
        Rect::from_min_size(Pos2::ZERO, Vec2::splat(30.0))
    }

    fn filled_rect(fill: &str) -> Layer {
        let mut layer = Layer::new_rectangle(LayerId(1), "r".into(), Pos2::ZERO, &VectorStyle::default());
        layer.apply(&LayerPatch {
            position: Some(Pos2::new(4.0, 4.0)),
            size: Some(Vec2::new(10.0, 6.0)),
            style: StylePatch {
                fill_color: Some(Paint::solid(fill)),
                stroke_width: Some(2.0),
                ..Default::default()
            },
            ..Default::default()
        });
        layer
    }

    #[test]
    fn test_rect_fill_and_stroke() {
        let fonts = FontLibrary::default();
        let sprite = rasterize_layer(&filled_rect("#00ff00"), &fonts, clip()).unwrap();
        let mut canvas = RgbaImage::new(30, 30);
        blend_sprite(&mut canvas, &sprite, BlendMode::Normal, 1.0);
        // Interior is fill, edge is the default red stroke.
        assert_eq!(*canvas.get_pixel(9, 7), Rgba([0, 255, 0, 255]));
        assert_eq!(*canvas.get_pixel(4, 7), Rgba([0xef, 0x44, 0x44, 255]));
        assert_eq!(canvas.get_pixel(20, 20)[3], 0);
    }

    #[test]
    fn test_zero_size_shape_draws_nothing() {
        let fonts = FontLibrary::default();
        let layer = Layer::new_ellipse(LayerId(1), "e".into(), Pos2::new(3.0, 3.0), &VectorStyle::default());
        assert!(rasterize_layer(&layer, &fonts, clip()).is_none());
    }

    #[test]
    fn test_sprite_clipped_to_canvas() {
        let sprite = Sprite {
            origin: (-2, -2),
            image: RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 255])),
        };
        let mut canvas = RgbaImage::new(3, 3);
        blend_sprite(&mut canvas, &sprite, BlendMode::Normal, 1.0);
        assert_eq!(*canvas.get_pixel(0, 0), Rgba([9, 9, 9, 255]));
        assert_eq!(*canvas.get_pixel(1, 1), Rgba([9, 9, 9, 255]));
        assert_eq!(canvas.get_pixel(2, 2)[3], 0);
    }

    #[test]
    fn test_oversized_shape_allocates_only_visible_part() {
        let fonts = FontLibrary::default();
        let mut layer = filled_rect("#0000ff");
        layer.apply(&LayerPatch {
            position: Some(Pos2::new(-500_000.0, -500_000.0)),
            size: Some(Vec2::splat(1_000_000.0)),
            ..Default::default()
        });
        let sprite = rasterize_layer(&layer, &fonts, clip()).unwrap();
        assert_eq!(sprite.origin, (0, 0));
        assert_eq!(sprite.image.dimensions(), (30, 30));

        let mut canvas = RgbaImage::new(30, 30);
        blend_sprite(&mut canvas, &sprite, BlendMode::Normal, 1.0);
        assert_eq!(*canvas.get_pixel(15, 15), Rgba([0, 0, 255, 255]));

        layer.apply(&LayerPatch {
            position: Some(Pos2::new(100.0, 100.0)),
            ..Default::default()
        });
        assert!(rasterize_layer(&layer, &fonts, clip()).is_none());
    }

    #[test]
    fn test_long_path_is_clipped() {
        let fonts = FontLibrary::default();
        let layer = Layer::new_path(
            LayerId(1),
            "p".into(),
            vec![Pos2::new(5.0, 10.0), Pos2::new(10_000_000.0, 10.0)],
            &VectorStyle::default(),
        );
        let sprite = rasterize_layer(&layer, &fonts, clip()).unwrap();
        assert!(sprite.image.width() <= 30);

        let mut canvas = RgbaImage::new(30, 30);
        blend_sprite(&mut canvas, &sprite, BlendMode::Normal, 1.0);
        assert_eq!(canvas.get_pixel(25, 10)[3], 255);
        assert_eq!(canvas.get_pixel(25, 20)[3], 0);
    }

    #[test]
    fn test_path_stroke_covers_segment() {
        let fonts = FontLibrary::default();
        let layer = Layer::new_path(
            LayerId(1),
            "p".into(),
            vec![Pos2::new(2.0, 10.0), Pos2::new(20.0, 10.0)],
            &VectorStyle::default(),
        );
        let sprite = rasterize_layer(&layer, &fonts, clip()).unwrap();
        let mut canvas = RgbaImage::new(30, 30);
        blend_sprite(&mut canvas, &sprite, BlendMode::Normal, 1.0);
        assert_eq!(canvas.get_pixel(10, 10)[3], 255);
        assert_eq!(canvas.get_pixel(10, 20)[3], 0);
    }

    #[test]
    fn test_text_leaves_ink() {
        let fonts = FontLibrary::default();
        let layer = Layer::new_text(
            LayerId(1),
            "t".into(),
            Pos2::new(2.0, 2.0),
            TextProps {
                text: "Hello".into(),
                font_size: 24.0,
                color: Rgb::new(255, 0, 0),
                font_family: "Inter".into(),
            },
        );
        let sprite = rasterize_layer(&layer, &fonts, clip()).unwrap();
        assert!(sprite.image.pixels().any(|p| p[3] > 200 && p[0] == 255));
    }

    #[test]
    fn test_rotation_swaps_extent() {
        let sprite = Sprite {
            origin: (10, 10),
            image: RgbaImage::from_pixel(20, 4, Rgba([1, 2, 3, 255])),
        };
        let rotated = rotate_sprite(&sprite, 90.0);
        let (w, h) = rotated.image.dimensions();
        assert!(w <= 5 && h >= 20);
    }

    #[test]
    fn test_opacity_halves_layer() {
        let fonts = FontLibrary::default();
        let sprite = rasterize_layer(&filled_rect("#ffffff"), &fonts, clip()).unwrap();
        let mut canvas = RgbaImage::from_pixel(30, 30, Rgba([0, 0, 0, 255]));
        blend_sprite(&mut canvas, &sprite, BlendMode::Normal, 0.5);
        let v = canvas.get_pixel(9, 7)[0] as i32;
        assert!((v - 128).abs() <= 1);
    }
}
