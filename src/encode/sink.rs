use std::path::{Path, PathBuf};

use crate::foundation::error::{MotionError, MotionResult};
use crate::render::raster::Raster;

/// Sink contract for consuming composited frames in window order.
///
/// Ordering contract: `append` is called once per playback window, in window order, by a single
/// producer. `finalize` is called at most once, after the last frame.
pub trait FrameSink: Send {
    /// Append one frame. The first frame fixes the output dimensions.
    fn append(&mut self, frame: &Raster) -> MotionResult<()>;
    /// Flush all frames and return the output path.
    fn finalize(&mut self) -> MotionResult<PathBuf>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    shape: FrameShape,
    finalized: bool,
    /// Frames in window order.
    pub(crate) frames: Vec<Raster>,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[Raster] {
        &self.frames
    }

    /// Return `true` once `finalize` has succeeded.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }
}

impl FrameSink for InMemorySink {
    fn append(&mut self, frame: &Raster) -> MotionResult<()> {
        self.shape.check(frame)?;
        self.frames.push(frame.clone());
        Ok(())
    }

    /// In-memory output has no path; an empty path is returned.
    fn finalize(&mut self) -> MotionResult<PathBuf> {
        self.shape.require_frames()?;
        self.finalized = true;
        Ok(PathBuf::new())
    }
}

/// Dimensions fixed by the first appended frame.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct FrameShape {
    dims: Option<(u32, u32)>,
    frames: u64,
}

impl FrameShape {
    pub(crate) fn check(&mut self, frame: &Raster) -> MotionResult<()> {
        let got = frame.dimensions();
        match self.dims {
            None => self.dims = Some(got),
            Some(expected) if expected != got => {
                return Err(MotionError::encoding(format!(
                    "frame size mismatch: got {}x{}, expected {}x{}",
                    got.0, got.1, expected.0, expected.1
                )));
            }
            Some(_) => {}
        }
        self.frames += 1;
        Ok(())
    }

    pub(crate) fn require_frames(&self) -> MotionResult<()> {
        if self.frames == 0 {
            return Err(MotionError::encoding("cannot finalize a sink with no frames"));
        }
        Ok(())
    }
}

/// Output file written under a `.partial` sibling and renamed into place on commit.
///
/// Dropping an uncommitted guard removes the partial file.
#[derive(Debug)]
pub(crate) struct PartialOutput {
    out_path: PathBuf,
    partial_path: PathBuf,
    committed: bool,
}

impl PartialOutput {
    pub(crate) fn new(out_path: PathBuf) -> Self {
        let mut name = out_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".partial");
        let partial_path = out_path.with_file_name(name);
        Self {
            out_path,
            partial_path,
            committed: false,
        }
    }

    pub(crate) fn out_path(&self) -> &Path {
        &self.out_path
    }

    pub(crate) fn partial_path(&self) -> &Path {
        &self.partial_path
    }

    pub(crate) fn commit(&mut self) -> MotionResult<PathBuf> {
        use anyhow::Context as _;
        std::fs::rename(&self.partial_path, &self.out_path).with_context(|| {
            format!(
                "failed to move '{}' into place at '{}'",
                self.partial_path.display(),
                self.out_path.display()
            )
        })?;
        self.committed = true;
        Ok(self.out_path.clone())
    }
}

impl Drop for PartialOutput {
    fn drop(&mut self) {
        if !self.committed {
            let _ = std::fs::remove_file(&self.partial_path);
        }
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> MotionResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
