//! Editor configuration with environment overrides.

use std::time::Duration;

/// Either image dimension below this asks the user whether to upscale.
const DEFAULT_LOW_RES_THRESHOLD: u32 = 1200;
/// Long-edge cap for the live preview surface.
const DEFAULT_MAX_PREVIEW_DIM: u32 = 4096;
const DEFAULT_VIDEO_POLL_SECS: u64 = 5;

pub const INITIAL_ZOOM: f32 = 0.8;
pub const ZOOM_STEP: f32 = 0.1;
pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 3.0;
pub const WINDOW_WIDTH: f32 = 1280.0;
pub const WINDOW_HEIGHT: f32 = 820.0;

#[derive(Clone, Debug, PartialEq)]
pub struct EditorConfig {
    pub low_res_threshold: u32,
    pub max_preview_dim: u32,
    pub video_poll_interval: Duration,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            low_res_threshold: env_or("PRINTMASTER_LOW_RES_THRESHOLD", DEFAULT_LOW_RES_THRESHOLD),
            max_preview_dim: env_or("PRINTMASTER_MAX_PREVIEW_DIM", DEFAULT_MAX_PREVIEW_DIM)
                .max(1),
            video_poll_interval: Duration::from_secs(
                env_or("PRINTMASTER_VIDEO_POLL_SECS", DEFAULT_VIDEO_POLL_SECS).max(1),
            ),
        }
    }
}

impl EditorConfig {
    /// Built-in values only, ignoring the environment.
    pub fn builtin() -> Self {
        Self {
            low_res_threshold: DEFAULT_LOW_RES_THRESHOLD,
            max_preview_dim: DEFAULT_MAX_PREVIEW_DIM,
            video_poll_interval: Duration::from_secs(DEFAULT_VIDEO_POLL_SECS),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
