use crate::{
    assets::raster::{PreparedImage, unpremultiply_rgba8_in_place},
    foundation::math::mul_div255_u8,
};

pub type PremulRgba8 = [u8; 4];

/// One composed output frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Frame initialized from a prepared (premultiplied) image.
    pub fn from_prepared(image: &PreparedImage) -> Self {
        Self {
            width: image.width,
            height: image.height,
            data: image.rgba8_premul.as_ref().clone(),
            premultiplied: true,
        }
    }

    /// Straight-alpha copy of the pixel data.
    pub fn to_straight_rgba(&self) -> Vec<u8> {
        let mut data = self.data.clone();
        if self.premultiplied {
            unpremultiply_rgba8_in_place(&mut data);
        }
        data
    }
}

/// Source-over for premultiplied pixels.
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

fn over_row(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&out);
    }
}

/// Draw `sprite` over `dst` with its top-left corner at `(x, y)`, clipped to the frame.
pub fn blit_over(dst: &mut FrameRGBA, sprite: &PreparedImage, x: i64, y: i64) {
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = x.saturating_add(i64::from(sprite.width)).min(i64::from(dst.width));
    let y1 = y.saturating_add(i64::from(sprite.height)).min(i64::from(dst.height));
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    let span = ((x1 - x0) as usize) * 4;
    let src = sprite.rgba8_premul.as_slice();
    let dst_stride = dst.width as usize * 4;
    let src_stride = sprite.width as usize * 4;
    let sx = (x0 - x) as usize * 4;
    for row in y0..y1 {
        let sy = (row - y) as usize;
        let d_off = row as usize * dst_stride + x0 as usize * 4;
        let s_off = sy * src_stride + sx;
        over_row(&mut dst.data[d_off..d_off + span], &src[s_off..s_off + span]);
    }
}

/// Output size: the larger side becomes `max_dimension`, the other keeps the aspect ratio
/// (rounded, at least 1).
pub fn output_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let scaled = |side: u32, long: u32| -> u32 {
        let v = (f64::from(side) * f64::from(max_dimension) / f64::from(long)).round();
        (v as u32).max(1)
    };
    if width >= height {
        (max_dimension, scaled(height, width))
    } else {
        (scaled(width, height), max_dimension)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
