use crate::foundation::error::{MotionError, MotionResult};
use crate::render::composite::over_in_place;
use crate::render::overlay::{FrameAnnotation, FrameWatermark};
use crate::render::raster::Raster;
use crate::scene::playback::TimeWindow;
use crate::scene::viewport::ViewportSpec;

/// Layer one frame: basemap, then the rasterized points, then annotation, then watermark.
///
/// The basemap is only read; the returned raster is a new buffer of the viewport's size.
pub fn composite(
    basemap: &Raster,
    frame: &Raster,
    window: &TimeWindow,
    viewport: &ViewportSpec,
    annotation: Option<&FrameAnnotation>,
    watermark: Option<&FrameWatermark>,
) -> MotionResult<Raster> {
    let expected = (viewport.width_px(), viewport.height_px());
    if basemap.dimensions() != expected {
        return Err(MotionError::render(format!(
            "basemap is {}x{}, viewport is {}x{}",
            basemap.width, basemap.height, expected.0, expected.1
        )));
    }

    let mut out = basemap.clone();
    over_in_place(&mut out, frame)?;

    if let Some(annotation) = annotation {
        annotation.apply(&mut out, window, viewport)?;
    }
    if let Some(watermark) = watermark {
        watermark.apply(&mut out)?;
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
