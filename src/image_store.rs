use anyhow::{Context, Result};
use image::{imageops::FilterType, ImageFormat, RgbaImage};
use std::path::Path;
use std::sync::Arc;

/// Errors that can occur while turning bytes into an editable image.
#[derive(Debug, thiserror::Error)]
pub enum ImageLoadError {
    #[error("image payload is empty")]
    Empty,
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImageMetaData {
    pub name: String,
    /// Decoded pixel size before any preview downsampling.
    pub width: u32,
    pub height: u32,
    pub mime: String,
    /// Encoded source bytes, kept for the AI collaborators.
    pub bytes: Arc<Vec<u8>>,
    pub original_size: usize,
}

/// A decoded photo plus the bounded-size raster the editor works on.
#[derive(Clone)]
pub struct ImageStore {
    pub meta: ImageMetaData,
    pub buffer: RgbaImage,
}

impl ImageStore {
    /// Decodes `bytes`, downsampling so the long edge is at most `max_dim`.
    pub fn decode(name: &str, bytes: Vec<u8>, max_dim: u32) -> Result<Self, ImageLoadError> {
        if bytes.is_empty() {
            return Err(ImageLoadError::Empty);
        }
        let format = image::guess_format(&bytes).ok();
        let decoded = match format {
            Some(f) => image::load_from_memory_with_format(&bytes, f)?,
            None => image::load_from_memory(&bytes)?,
        };
        let (width, height) = (decoded.width(), decoded.height());
        let buffer = downsample(decoded.to_rgba8(), max_dim);
        if buffer.dimensions() != (width, height) {
            log::info!(
                "Preview of '{}' downsampled from {}x{} to {}x{}",
                name,
                width,
                height,
                buffer.width(),
                buffer.height()
            );
        }

        let meta = ImageMetaData {
            name: name.to_string(),
            width,
            height,
            mime: format.map(mime_for).unwrap_or("application/octet-stream").to_string(),
            original_size: bytes.len(),
            bytes: Arc::new(bytes),
        };
        Ok(Self { meta, buffer })
    }

    pub fn from_file(path: &Path, max_dim: u32) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read image file {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Self::decode(&name, bytes, max_dim).context("Failed to open image file")
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn is_low_resolution(&self, threshold: u32) -> bool {
        self.meta.width < threshold || self.meta.height < threshold
    }
}

fn mime_for(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Tiff => "image/tiff",
        _ => "application/octet-stream",
    }
}

/// Scales `image` down so neither side exceeds `max_dim`, keeping the aspect.
pub fn downsample(image: RgbaImage, max_dim: u32) -> RgbaImage {
    let (w, h) = image.dimensions();
    let long = w.max(h);
    if max_dim == 0 || long <= max_dim {
        return image;
    }
    let scale = max_dim as f64 / long as f64;
    let nw = ((w as f64 * scale).round() as u32).clamp(1, max_dim);
    let nh = ((h as f64 * scale).round() as u32).clamp(1, max_dim);
    image::imageops::resize(&image, nw, nh, FilterType::Triangle)
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ImageLoadError> {
    let mut out = std::io::Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

pub fn save_png(image: &RgbaImage, path: &Path) -> Result<()> {
    image
        .save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("Failed to save image to {}", path.display()))
}

/// Channel histograms over every 4th pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram {
    pub r: [u32; 256],
    pub g: [u32; 256],
    pub b: [u32; 256],
}

impl Histogram {
    pub fn compute(image: &RgbaImage) -> Self {
        let mut hist = Histogram {
            r: [0; 256],
            g: [0; 256],
            b: [0; 256],
        };
        for px in image.pixels().step_by(4) {
            hist.r[px[0] as usize] += 1;
            hist.g[px[1] as usize] += 1;
            hist.b[px[2] as usize] += 1;
        }
        hist
    }

    /// Largest bin across all channels, at least 1.
    pub fn peak(&self) -> u32 {
        self.r
            .iter()
            .chain(self.g.iter())
            .chain(self.b.iter())
            .copied()
            .max()
            .unwrap_or(0)
            .max(1)
    }
}
