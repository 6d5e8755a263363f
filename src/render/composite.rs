use crate::foundation::math::mul_div255_u8;

pub(crate) type PremulRgba8 = [u8; 4];

/// Premultiplied source-over: `dst * (1 - src.a) + src`.
pub(crate) fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    match src[3] {
        0 => return dst,
        255 => return src,
        _ => {}
    }
    let inv = 255u16 - u16::from(src[3]);
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = src[i].saturating_add(mul_div255_u8(u16::from(dst[i]), inv));
    }
    out
}

/// Fill a tightly packed RGBA8 buffer with one pixel value.
pub(crate) fn fill(buf: &mut [u8], px: PremulRgba8) {
    for d in buf.chunks_exact_mut(4) {
        d.copy_from_slice(&px);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
