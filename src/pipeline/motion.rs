use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::assets::basemap::BasemapProvider;
use crate::data::dataset::WindowedDataSource;
use crate::encode::ffmpeg::Mp4Sink;
use crate::encode::gif::GifSink;
use crate::encode::sink::FrameSink;
use crate::foundation::color::Rgba8;
use crate::foundation::error::{MotionError, MotionResult};
use crate::render::colormap::ColorMapping;
use crate::render::compositor::composite;
use crate::render::overlay::{FrameAnnotation, FrameWatermark};
use crate::render::raster::Raster;
use crate::render::rasterize::{rasterize, validate_point_radius};
use crate::scene::playback::{PlaybackSpec, TimeWindow};
use crate::scene::viewport::ViewportSpec;

/// Lifecycle of a [`MotionVideo`] render.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderState {
    /// No render has started.
    Idle,
    /// Fetching the basemap.
    FetchingBasemap,
    /// Producing and appending frames.
    Rendering,
    /// Flushing the sink.
    Finalizing,
    /// Output written.
    Done,
    /// The last render failed.
    Failed,
}

impl fmt::Display for RenderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::FetchingBasemap => "fetching_basemap",
            Self::Rendering => "rendering",
            Self::Finalizing => "finalizing",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Shared cancellation flag, checked before each window is fetched.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create an un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Every clone observes it.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Return `true` once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
/// Threading and chunking controls for multi-frame rendering.
pub struct RenderThreading {
    /// Enable parallel rendering when `true`.
    pub parallel: bool,
    /// Chunk size in frames for batched scheduling.
    pub chunk_size: usize,
    /// Optional explicit worker thread count.
    pub threads: Option<usize>,
}

impl Default for RenderThreading {
    fn default() -> Self {
        Self {
            parallel: false,
            chunk_size: 64,
            threads: None,
        }
    }
}

/// Per-render shading, overlay, threading and encoding options.
#[derive(Clone, Debug)]
pub struct RenderOptions {
    /// Bin shading.
    pub color_mapping: ColorMapping,
    /// Disk radius painted around every colored bin; `0` paints single pixels. At most
    /// [`MAX_POINT_RADIUS_PX`](crate::render::rasterize::MAX_POINT_RADIUS_PX).
    pub point_radius_px: u32,
    /// Optional time/center label.
    pub annotation: Option<FrameAnnotation>,
    /// Optional static text.
    pub watermark: Option<FrameWatermark>,
    /// Threading/chunking configuration.
    pub threading: RenderThreading,
    /// Optional cancellation flag.
    pub cancel: Option<CancelToken>,
    /// Opaque color that encoders flatten translucent pixels over.
    pub background: Rgba8,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            color_mapping: ColorMapping::fire(),
            point_radius_px: 0,
            annotation: None,
            watermark: None,
            threading: RenderThreading::default(),
            cancel: None,
            background: Rgba8::BLACK,
        }
    }
}

impl RenderOptions {
    /// Check option invariants that construction cannot enforce.
    pub fn validate(&self) -> MotionResult<()> {
        self.color_mapping.validate()?;
        validate_point_radius(self.point_radius_px)?;
        if let Some(n) = self.threading.threads
            && n == 0
        {
            return Err(MotionError::validation(
                "render threading 'threads' must be >= 1 when set",
            ));
        }
        Ok(())
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}

/// Outcome of a successful render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderReport {
    /// Path returned by the sink's `finalize`.
    pub output: PathBuf,
    /// Frames appended to the sink.
    pub frames: u64,
    /// States visited, in order, from `Idle` to `Done`.
    pub states: Vec<RenderState>,
}

/// Renders a windowed point dataset over a basemap into an animation.
///
/// The basemap is fetched once per render and shared read-only by every frame. Frames reach the
/// sink in window order whether they are rendered sequentially or in parallel chunks.
pub struct MotionVideo {
    dataset: Arc<dyn WindowedDataSource>,
    basemap: Box<dyn BasemapProvider>,
    state: RenderState,
}

impl fmt::Debug for MotionVideo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MotionVideo")
            .field("points", &self.dataset.len_hint())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl MotionVideo {
    /// Create a pipeline over `dataset` with `basemap` as background provider.
    pub fn new(dataset: Arc<dyn WindowedDataSource>, basemap: Box<dyn BasemapProvider>) -> Self {
        Self {
            dataset,
            basemap,
            state: RenderState::Idle,
        }
    }

    /// State reached by the most recent render.
    pub fn state(&self) -> RenderState {
        self.state
    }

    /// Render to `<base_name>.gif`.
    pub fn to_gif(
        &mut self,
        viewport: &ViewportSpec,
        playback: &PlaybackSpec,
        base_name: impl AsRef<Path>,
        options: &RenderOptions,
    ) -> MotionResult<RenderReport> {
        let mut sink = GifSink::new(output_path(base_name.as_ref(), "gif"), playback.frame_rate())?
            .with_background(options.background);
        self.render(viewport, playback, &mut sink, options)
    }

    /// Render to `<base_name>.mp4` through the system `ffmpeg`.
    pub fn to_video(
        &mut self,
        viewport: &ViewportSpec,
        playback: &PlaybackSpec,
        base_name: impl AsRef<Path>,
        options: &RenderOptions,
    ) -> MotionResult<RenderReport> {
        let mut sink = Mp4Sink::new(output_path(base_name.as_ref(), "mp4"), playback.frame_rate())?
            .with_background(options.background);
        self.render(viewport, playback, &mut sink, options)
    }

    /// Render every playback window into `sink` and finalize it.
    ///
    /// On failure the sink is left unfinalized and the state becomes [`RenderState::Failed`].
    #[tracing::instrument(skip_all, fields(windows = playback.frame_count()))]
    pub fn render(
        &mut self,
        viewport: &ViewportSpec,
        playback: &PlaybackSpec,
        sink: &mut dyn FrameSink,
        options: &RenderOptions,
    ) -> MotionResult<RenderReport> {
        let mut states = Vec::with_capacity(6);
        self.enter(&mut states, RenderState::Idle);

        match self.run(viewport, playback, sink, options, &mut states) {
            Ok((output, frames)) => Ok(RenderReport {
                output,
                frames,
                states,
            }),
            Err(err) => {
                self.enter(&mut states, RenderState::Failed);
                tracing::error!(error = %err, "render failed");
                Err(err)
            }
        }
    }

    /// Render the single window at `index` without involving a sink.
    #[tracing::instrument(skip(self, viewport, playback, options))]
    pub fn render_frame(
        &self,
        viewport: &ViewportSpec,
        playback: &PlaybackSpec,
        index: u64,
        options: &RenderOptions,
    ) -> MotionResult<Raster> {
        options.validate()?;
        let count = playback.frame_count();
        let window = playback
            .windows()
            .nth(usize::try_from(index).unwrap_or(usize::MAX))
            .ok_or_else(|| {
                MotionError::validation(format!(
                    "frame index {index} out of range (playback has {count} windows)"
                ))
            })?;
        let basemap = self.basemap.fetch(viewport)?;
        render_window(self.dataset.as_ref(), &basemap, &window, viewport, options)
    }

    fn run(
        &mut self,
        viewport: &ViewportSpec,
        playback: &PlaybackSpec,
        sink: &mut dyn FrameSink,
        options: &RenderOptions,
        states: &mut Vec<RenderState>,
    ) -> MotionResult<(PathBuf, u64)> {
        options.validate()?;

        self.enter(states, RenderState::FetchingBasemap);
        let basemap = self.basemap.fetch(viewport)?;

        self.enter(states, RenderState::Rendering);
        tracing::info!(
            categorical = options.color_mapping.is_categorical(),
            parallel = options.threading.parallel,
            "rendering windows"
        );
        let frames = if options.threading.parallel {
            self.render_chunked(&basemap, viewport, playback, sink, options)?
        } else {
            self.render_sequential(&basemap, viewport, playback, sink, options)?
        };

        self.enter(states, RenderState::Finalizing);
        let output = sink.finalize()?;

        self.enter(states, RenderState::Done);
        tracing::info!(output = %output.display(), frames, "render complete");
        Ok((output, frames))
    }

    fn render_sequential(
        &self,
        basemap: &Raster,
        viewport: &ViewportSpec,
        playback: &PlaybackSpec,
        sink: &mut dyn FrameSink,
        options: &RenderOptions,
    ) -> MotionResult<u64> {
        let mut frames = 0u64;
        for window in playback.windows() {
            let frame = cancellable_window(
                self.dataset.as_ref(),
                basemap,
                &window,
                viewport,
                options,
            )?;
            sink.append(&frame).map_err(|e| in_window(e, &window))?;
            frames += 1;
        }
        Ok(frames)
    }

    fn render_chunked(
        &self,
        basemap: &Raster,
        viewport: &ViewportSpec,
        playback: &PlaybackSpec,
        sink: &mut dyn FrameSink,
        options: &RenderOptions,
    ) -> MotionResult<u64> {
        let pool = build_thread_pool(options.threading.threads)?;
        let chunk_size = normalized_chunk_size(options.threading.chunk_size);
        let dataset = self.dataset.as_ref();

        let mut frames = 0u64;
        let mut windows = playback.windows().peekable();
        while windows.peek().is_some() {
            let chunk: Vec<TimeWindow> = windows.by_ref().take(chunk_size).collect();
            let rendered = pool.install(|| {
                chunk
                    .par_iter()
                    .map(|window| cancellable_window(dataset, basemap, window, viewport, options))
                    .collect::<Vec<_>>()
            });
            for (window, frame) in chunk.iter().zip(rendered) {
                sink.append(&frame?).map_err(|e| in_window(e, window))?;
                frames += 1;
            }
        }
        Ok(frames)
    }

    fn enter(&mut self, states: &mut Vec<RenderState>, next: RenderState) {
        self.state = next;
        states.push(next);
        tracing::info!(state = %next, "render state");
    }
}

fn cancellable_window(
    dataset: &dyn WindowedDataSource,
    basemap: &Raster,
    window: &TimeWindow,
    viewport: &ViewportSpec,
    options: &RenderOptions,
) -> MotionResult<Raster> {
    if options.is_cancelled() {
        return Err(MotionError::Cancelled { window: *window });
    }
    render_window(dataset, basemap, window, viewport, options)
}

fn render_window(
    dataset: &dyn WindowedDataSource,
    basemap: &Raster,
    window: &TimeWindow,
    viewport: &ViewportSpec,
    options: &RenderOptions,
) -> MotionResult<Raster> {
    let points = dataset.subset(window).map_err(|e| match e {
        e @ MotionError::DataSource { .. } => e,
        other => MotionError::data_source(*window, other.to_string()),
    })?;
    let layer = rasterize(
        &points,
        viewport,
        &options.color_mapping,
        options.point_radius_px,
    )
    .map_err(|e| in_window(e, window))?;
    let frame = composite(
        basemap,
        &layer,
        window,
        viewport,
        options.annotation.as_ref(),
        options.watermark.as_ref(),
    )
    .map_err(|e| in_window(e, window))?;
    tracing::debug!(%window, points = points.len(), "rendered frame");
    Ok(frame)
}

/// Prefix render and encoding failures with the window they happened in.
fn in_window(err: MotionError, window: &TimeWindow) -> MotionError {
    match err {
        MotionError::Render(msg) => MotionError::render(format!("window {window}: {msg}")),
        MotionError::Encoding(msg) => MotionError::encoding(format!("window {window}: {msg}")),
        other => other,
    }
}

/// `<base>.<ext>`, appended rather than replacing any existing extension.
pub fn output_path(base: &Path, ext: &str) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

fn build_thread_pool(threads: Option<usize>) -> MotionResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(MotionError::validation(
            "render threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| MotionError::render(format!("failed to build rayon thread pool: {e}")))
}

fn normalized_chunk_size(chunk_size: usize) -> usize {
    chunk_size.max(1)
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/motion.rs"]
mod tests;
