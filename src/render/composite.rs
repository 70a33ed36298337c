use crate::foundation::color::Rgba8;
use crate::foundation::error::{MotionError, MotionResult};
use crate::foundation::math::{mul_div255_u8, mul_div255_u16, unpremul_u8};
use crate::render::raster::Raster;

/// Premultiplied RGBA8 pixel.
pub type PremulRgba8 = [u8; 4];

/// Porter-Duff source-over for premultiplied pixels.
pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    let sa = src[3];
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }

    let inv = 255u16 - u16::from(sa);
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = src[i].saturating_add(mul_div255_u8(u16::from(dst[i]), inv));
    }
    out
}

/// Composite `src` over `dst` in place. Both rasters must have equal dimensions.
pub fn over_in_place(dst: &mut Raster, src: &Raster) -> MotionResult<()> {
    if dst.dimensions() != src.dimensions() || dst.data.len() != src.data.len() {
        return Err(MotionError::render(format!(
            "cannot composite {}x{} over {}x{}",
            src.width, src.height, dst.width, dst.height
        )));
    }
    for (d, s) in dst.data.chunks_exact_mut(4).zip(src.data.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Flatten a premultiplied raster over an opaque background into straight, opaque RGBA8.
///
/// Encoders receive this form: neither GIF nor yuv420p video carries partial alpha.
pub fn flatten_over_bg(src: &Raster, bg: Rgba8) -> Vec<u8> {
    let mut out = vec![0u8; src.data.len()];
    let bg_r = u16::from(bg.r);
    let bg_g = u16::from(bg.g);
    let bg_b = u16::from(bg.b);

    for (d, s) in out.chunks_exact_mut(4).zip(src.data.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }

        let inv = 255u16 - a;
        d[0] = (u16::from(s[0]) + mul_div255_u16(bg_r, inv)).min(255) as u8;
        d[1] = (u16::from(s[1]) + mul_div255_u16(bg_g, inv)).min(255) as u8;
        d[2] = (u16::from(s[2]) + mul_div255_u16(bg_b, inv)).min(255) as u8;
        d[3] = 255;
    }
    out
}

/// Convert a premultiplied raster to straight-alpha RGBA8 bytes.
pub fn unpremultiply(src: &Raster) -> Vec<u8> {
    let mut out = src.data.clone();
    for px in out.chunks_exact_mut(4) {
        let a = px[3];
        if a == 255 {
            continue;
        }
        px[0] = unpremul_u8(px[0], a);
        px[1] = unpremul_u8(px[1], a);
        px[2] = unpremul_u8(px[2], a);
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
