use std::io::{Read, Write as _};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::encode::sink::{FrameShape, FrameSink, PartialOutput, ensure_parent_dir};
use crate::foundation::color::Rgba8;
use crate::foundation::error::{MotionError, MotionResult};
use crate::render::composite::flatten_over_bg;
use crate::render::raster::Raster;

/// Sink that spawns the system `ffmpeg` on the first frame and streams raw frames to stdin.
///
/// Output is H.264 in an MP4 container with `yuv420p` pixels. Odd frame dimensions are padded
/// to the next even size by ffmpeg.
pub struct Mp4Sink {
    output: PartialOutput,
    frame_rate: u32,
    background: Rgba8,
    shape: FrameShape,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
}

impl Mp4Sink {
    /// MP4 sink writing to `out_path` at `frame_rate` frames per second.
    pub fn new(out_path: impl Into<PathBuf>, frame_rate: u32) -> MotionResult<Self> {
        if frame_rate == 0 {
            return Err(MotionError::validation("mp4 frame_rate must be non-zero"));
        }
        Ok(Self {
            output: PartialOutput::new(out_path.into()),
            frame_rate,
            background: Rgba8::BLACK,
            shape: FrameShape::default(),
            child: None,
            stdin: None,
            stderr_drain: None,
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

    fn spawn(&mut self, width: u32, height: u32) -> MotionResult<()> {
        ensure_parent_dir(self.output.out_path())?;
        if !is_ffmpeg_on_path() {
            return Err(MotionError::encoding(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        // Input: flattened opaque RGBA8 frames at the playback frame rate.
        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{width}x{height}"),
            "-r",
            &self.frame_rate.to_string(),
            "-i",
            "pipe:0",
            "-an",
        ]);
        if !width.is_multiple_of(2) || !height.is_multiple_of(2) {
            cmd.args(["-vf", "pad=ceil(iw/2)*2:ceil(ih/2)*2"]);
        }
        // The partial path has no recognizable extension, so the muxer is named explicitly.
        cmd.args([
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
            "-f",
            "mp4",
        ]);
        cmd.arg(self.output.partial_path());

        let mut child = cmd.spawn().map_err(|e| {
            MotionError::encoding(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| MotionError::encoding("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| MotionError::encoding("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        tracing::debug!(width, height, fps = self.frame_rate, "spawned ffmpeg");
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        Ok(())
    }

    fn take_stderr(&mut self) -> MotionResult<String> {
        let bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| MotionError::encoding("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| MotionError::encoding(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };
        Ok(String::from_utf8_lossy(&bytes).trim().to_owned())
    }
}

impl FrameSink for Mp4Sink {
    fn append(&mut self, frame: &Raster) -> MotionResult<()> {
        self.shape.check(frame)?;
        if self.child.is_none() {
            self.spawn(frame.width, frame.height)?;
        }

        let bytes = flatten_over_bg(frame, self.background);
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(MotionError::encoding("mp4 sink is already finalized"));
        };
        if let Err(e) = stdin.write_all(&bytes) {
            // A broken pipe usually means ffmpeg exited; its stderr says why.
            drop(self.stdin.take());
            if let Some(child) = self.child.as_mut() {
                let _ = child.wait();
            }
            let stderr = self.take_stderr().unwrap_or_default();
            return Err(MotionError::encoding(format!(
                "failed to write frame to ffmpeg stdin: {e}: {stderr}"
            )));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(out = %self.output.out_path().display()))]
    fn finalize(&mut self) -> MotionResult<PathBuf> {
        self.shape.require_frames()?;
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| MotionError::encoding("mp4 sink already finalized"))?;

        let status = child.wait().map_err(|e| {
            MotionError::encoding(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr = self.take_stderr()?;

        if !status.success() {
            return Err(MotionError::encoding(format!(
                "ffmpeg exited with status {status}: {stderr}"
            )));
        }

        let out = self.output.commit()?;
        tracing::info!(path = %out.display(), "wrote mp4");
        Ok(out)
    }
}

impl Drop for Mp4Sink {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(handle) = self.stderr_drain.take() {
            let _ = handle.join();
        }
    }
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
