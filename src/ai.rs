//! Boundary to the generative AI collaborator.
//!
//! The editor never talks to a model directly. It drives an [`AiService`]
//! through [`AiTask`]s spawned on a tokio runtime and polls them from the UI
//! thread, so a slow call never blocks pointer or slider handling. Dropping a
//! task aborts it.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("no AI service is configured")]
    NotConfigured,
    #[error("AI service failed: {0}")]
    Service(String),
    #[error("the AI service returned no image")]
    MissingImage,
    #[error("the AI service returned no video")]
    MissingVideo,
    #[error("malformed AI response: {0}")]
    MalformedResponse(#[from] serde_json::Error),
    #[error("the AI request was cancelled")]
    Cancelled,
}

/// An encoded image sent to or received from the service.
#[derive(Clone, Debug, PartialEq)]
pub struct ImagePayload {
    pub bytes: Arc<Vec<u8>>,
    pub mime: String,
}

impl ImagePayload {
    pub fn new(bytes: Vec<u8>, mime: &str) -> Self {
        Self {
            bytes: Arc::new(bytes),
            mime: mime.to_string(),
        }
    }
}

/// Opaque handle to a long-running video job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoOperation(pub String);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoStatus {
    pub done: bool,
    pub uri: Option<String>,
}

pub type AiFuture<T> = BoxFuture<'static, Result<T, AiError>>;

/// A generative backend. Implementations own their transport; every call
/// returns a boxed future so the trait stays object safe.
pub trait AiService: Send + Sync {
    /// Raw model text for a print assessment. See [`PrintAnalysis::parse`].
    fn analyze_for_print(&self, image: ImagePayload, prompt: String) -> AiFuture<String>;

    /// `None` when the model answered without an image part.
    fn edit_image(&self, image: ImagePayload, prompt: String) -> AiFuture<Option<ImagePayload>>;

    fn upscale_image(&self, image: ImagePayload, prompt: String) -> AiFuture<Option<ImagePayload>>;

    fn start_video(&self, image: ImagePayload, prompt: String) -> AiFuture<VideoOperation>;

    fn poll_video(&self, operation: VideoOperation) -> AiFuture<VideoStatus>;
}

/// Stand-in used when no backend is wired up. Every call fails with
/// [`AiError::NotConfigured`].
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableAiService;

impl AiService for UnavailableAiService {
    fn analyze_for_print(&self, _: ImagePayload, _: String) -> AiFuture<String> {
        async { Err(AiError::NotConfigured) }.boxed()
    }

    fn edit_image(&self, _: ImagePayload, _: String) -> AiFuture<Option<ImagePayload>> {
        async { Err(AiError::NotConfigured) }.boxed()
    }

    fn upscale_image(&self, _: ImagePayload, _: String) -> AiFuture<Option<ImagePayload>> {
        async { Err(AiError::NotConfigured) }.boxed()
    }

    fn start_video(&self, _: ImagePayload, _: String) -> AiFuture<VideoOperation> {
        async { Err(AiError::NotConfigured) }.boxed()
    }

    fn poll_video(&self, _: VideoOperation) -> AiFuture<VideoStatus> {
        async { Err(AiError::NotConfigured) }.boxed()
    }
}

pub const UPSCALE_PROMPT: &str = "Upscale this image to 4K resolution. Enhance details, sharpness, \
and clarity while maintaining the original artistic style and content.";

pub fn analysis_prompt(width_cm: f32, height_cm: f32, dpi: u32) -> String {
    format!(
        "I am a professional printer. Analyze this image for large format printing.\n\
         Current Settings:\n\
         - Physical Dimensions: {width_cm}cm x {height_cm}cm\n\
         - Target DPI: {dpi}\n\n\
         Please provide a professional assessment in JSON format with the following keys:\n\
         1. \"qualityScore\": 1-10 rating.\n\
         2. \"issues\": Array of potential issues (e.g., low resolution, artifacts, lighting).\n\
         3. \"recommendations\": Array of specific editing steps.\n\
         4. \"paperRecommendation\": Best paper type for this visual style.\n\n\
         Return ONLY the JSON string, no markdown formatting."
    )
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintAnalysis {
    pub quality_score: f32,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub paper_recommendation: String,
}

impl PrintAnalysis {
    /// Parses model output, tolerating surrounding markdown code fences.
    pub fn parse(raw: &str) -> Result<Self, AiError> {
        let mut analysis: PrintAnalysis = serde_json::from_str(strip_fences(raw))?;
        analysis.quality_score = analysis.quality_score.clamp(1.0, 10.0);
        Ok(analysis)
    }
}

fn strip_fences(raw: &str) -> &str {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix("```") {
        s = rest.strip_prefix("json").unwrap_or(rest);
    }
    if let Some(rest) = s.trim_end().strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

pub async fn analyze(
    service: Arc<dyn AiService>,
    image: ImagePayload,
    width_cm: f32,
    height_cm: f32,
    dpi: u32,
) -> Result<PrintAnalysis, AiError> {
    let raw = service
        .analyze_for_print(image, analysis_prompt(width_cm, height_cm, dpi))
        .await?;
    PrintAnalysis::parse(&raw)
}

pub async fn edit(
    service: Arc<dyn AiService>,
    image: ImagePayload,
    prompt: String,
) -> Result<ImagePayload, AiError> {
    service.edit_image(image, prompt).await?.ok_or(AiError::MissingImage)
}

pub async fn upscale(service: Arc<dyn AiService>, image: ImagePayload) -> Result<ImagePayload, AiError> {
    service
        .upscale_image(image, UPSCALE_PROMPT.to_string())
        .await?
        .ok_or(AiError::MissingImage)
}

/// Starts a video job and polls it every `poll_interval` until it reports
/// done. Returns the video URI.
pub async fn generate_video(
    service: Arc<dyn AiService>,
    image: ImagePayload,
    prompt: String,
    poll_interval: Duration,
) -> Result<String, AiError> {
    let operation = service.start_video(image, prompt).await?;
    log::info!("Video job {} started", operation.0);

    let mut ticker = tokio::time::interval(poll_interval);
    // The first tick completes immediately.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let status = service.poll_video(operation.clone()).await?;
        if status.done {
            return status.uri.ok_or(AiError::MissingVideo);
        }
        log::debug!("Video job {} still running", operation.0);
    }
}

/// A spawned AI call. Aborted on [`AiTask::cancel`] or when dropped.
pub struct AiTask<T> {
    handle: Option<JoinHandle<Result<T, AiError>>>,
}

impl<T: Send + 'static> AiTask<T> {
    pub fn spawn<F>(runtime: &Handle, future: F) -> Self
    where
        F: Future<Output = Result<T, AiError>> + Send + 'static,
    {
        Self {
            handle: Some(runtime.spawn(future)),
        }
    }

    /// The result, once the call has finished. Never blocks.
    pub fn try_take(&mut self) -> Option<Result<T, AiError>> {
        let handle = self.handle.as_mut()?;
        if !handle.is_finished() {
            return None;
        }
        let joined = handle.now_or_never()?;
        self.handle = None;
        Some(match joined {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(AiError::Cancelled),
            Err(e) => Err(AiError::Service(e.to_string())),
        })
    }
}

impl<T> AiTask<T> {
    pub fn is_pending(&self) -> bool {
        self.handle.is_some()
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl<T> Drop for AiTask<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}
