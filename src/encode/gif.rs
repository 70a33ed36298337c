use std::io::{BufWriter, Write as _};
use std::path::PathBuf;

use anyhow::Context as _;
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};

use crate::encode::sink::{FrameShape, FrameSink, PartialOutput, ensure_parent_dir};
use crate::foundation::color::Rgba8;
use crate::foundation::error::{MotionError, MotionResult};
use crate::render::composite::flatten_over_bg;
use crate::render::raster::Raster;

/// Palette quantization speed handed to the GIF encoder (1 is slowest, 30 fastest).
const QUANTIZE_SPEED: i32 = 10;

/// Sink that buffers frames and writes an infinitely looping animated GIF on finalize.
///
/// Every frame is shown for `1000 / frame_rate` milliseconds.
pub struct GifSink {
    output: PartialOutput,
    frame_rate: u32,
    background: Rgba8,
    shape: FrameShape,
    frames: Vec<RgbaImage>,
}

impl GifSink {
    /// GIF sink writing to `out_path` at `frame_rate` frames per second.
    pub fn new(out_path: impl Into<PathBuf>, frame_rate: u32) -> MotionResult<Self> {
        if frame_rate == 0 {
            return Err(MotionError::validation("gif frame_rate must be non-zero"));
        }
        Ok(Self {
            output: PartialOutput::new(out_path.into()),
            frame_rate,
            background: Rgba8::BLACK,
            shape: FrameShape::default(),
            frames: Vec::new(),
        })
    }

    /// Flatten translucent pixels over `background` instead of black.
    pub fn with_background(mut self, background: Rgba8) -> Self {
        self.background = Rgba8 {
            a: 255,
            ..background
        };
        self
    }

    /// Final output path.
    pub fn out_path(&self) -> &std::path::Path {
        self.output.out_path()
    }
}

impl FrameSink for GifSink {
    fn append(&mut self, frame: &Raster) -> MotionResult<()> {
        self.shape.check(frame)?;
        let bytes = flatten_over_bg(frame, self.background);
        let img = RgbaImage::from_raw(frame.width, frame.height, bytes)
            .ok_or_else(|| MotionError::encoding("frame buffer does not match its dimensions"))?;
        self.frames.push(img);
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(out = %self.output.out_path().display(), frames = self.frames.len()))]
    fn finalize(&mut self) -> MotionResult<PathBuf> {
        self.shape.require_frames()?;
        ensure_parent_dir(self.output.out_path())?;

        let file = std::fs::File::create(self.output.partial_path()).with_context(|| {
            format!(
                "failed to create '{}'",
                self.output.partial_path().display()
            )
        })?;
        let mut writer = BufWriter::new(file);
        {
            let mut encoder = GifEncoder::new_with_speed(&mut writer, QUANTIZE_SPEED);
            encoder
                .set_repeat(Repeat::Infinite)
                .map_err(|e| MotionError::encoding(format!("gif header: {e}")))?;
            let delay = Delay::from_numer_denom_ms(1000, self.frame_rate);
            for img in self.frames.drain(..) {
                encoder
                    .encode_frame(Frame::from_parts(img, 0, 0, delay))
                    .map_err(|e| MotionError::encoding(format!("gif frame: {e}")))?;
            }
        }
        writer
            .flush()
            .map_err(|e| MotionError::encoding(format!("gif flush: {e}")))?;
        drop(writer);

        let out = self.output.commit()?;
        tracing::info!(path = %out.display(), "wrote gif");
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/gif.rs"]
mod tests;
