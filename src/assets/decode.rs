use anyhow::Context;

use crate::foundation::error::MotionResult;
use crate::render::raster::Raster;

/// Decode an encoded image (PNG, JPEG, GIF) into a premultiplied [`Raster`].
pub fn decode_image(bytes: &[u8]) -> MotionResult<Raster> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    Ok(rgba_image_to_raster(dyn_img.to_rgba8()))
}

/// Decode and resize to exactly `width × height` when the source differs.
pub fn decode_image_sized(bytes: &[u8], width: u32, height: u32) -> MotionResult<Raster> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let mut rgba = dyn_img.to_rgba8();
    if rgba.dimensions() != (width, height) {
        tracing::warn!(
            got_width = rgba.width(),
            got_height = rgba.height(),
            width,
            height,
            "basemap size differs from viewport; resizing"
        );
        rgba = image::imageops::resize(&rgba, width, height, image::imageops::FilterType::Triangle);
    }
    Ok(rgba_image_to_raster(rgba))
}

/// Write a raster as a straight-alpha PNG.
pub fn save_png(raster: &Raster, path: &std::path::Path) -> MotionResult<()> {
    let straight = crate::render::composite::unpremultiply(raster);
    image::save_buffer_with_format(
        path,
        &straight,
        raster.width,
        raster.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

fn rgba_image_to_raster(rgba: image::RgbaImage) -> Raster {
    let (width, height) = rgba.dimensions();
    let mut data = rgba.into_raw();
    premultiply_rgba8_in_place(&mut data);
    Raster {
        width,
        height,
        data,
    }
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
