//! RGBA8 pixel type and small color-math helpers shared across components.

use bytemuck::{Pod, Zeroable};

/// One RGBA8 pixel, 4 bytes, row-major layout matching the wire format.
///
/// `Pod`/`Zeroable` let a `&[u8]` frame buffer be reinterpreted as
/// `&[Rgba8]` (and back) without copying, the way the teacher's
/// `CpuBuffer` casts typed slices through `bytemuck::cast_slice`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable, Default)]
#[repr(C)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const BLACK_OPAQUE: Rgba8 = Rgba8 { r: 0, g: 0, b: 0, a: 255 };
    /// `0xFF00FFFF` magenta, the hole-fill sentinel for unsampled gradient cells.
    pub const MAGENTA_SENTINEL: Rgba8 = Rgba8 { r: 255, g: 0, b: 255, a: 255 };

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[must_use]
    pub fn as_vec3(self) -> glam::Vec3 {
        glam::Vec3::new(self.r as f32, self.g as f32, self.b as f32)
    }

    /// Reinterpret a raw RGBA8 byte buffer as a slice of pixels.
    ///
    /// # Panics
    /// Panics if `bytes.len()` is not a multiple of 4 (the caller is
    /// expected to have already validated frame size at the API boundary).
    #[must_use]
    pub fn slice_from_bytes(bytes: &[u8]) -> &[Rgba8] {
        bytemuck::cast_slice(bytes)
    }

    #[must_use]
    pub fn slice_to_bytes(pixels: &[Rgba8]) -> &[u8] {
        bytemuck::cast_slice(pixels)
    }
}

/// Clamp `x` to `[0, 255]` and round to the nearest `u8`.
#[must_use]
pub fn clamp_round_u8(x: f32) -> u8 {
    x.round().clamp(0.0, 255.0) as u8
}

/// Clamp `x` to `[lo, hi]`.
#[must_use]
pub fn clampf(x: f32, lo: f32, hi: f32) -> f32 {
    x.max(lo).min(hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cast_round_trips() {
        let bytes = [10u8, 20, 30, 255, 1, 2, 3, 4];
        let pixels = Rgba8::slice_from_bytes(&bytes);
        assert_eq!(pixels, &[Rgba8::new(10, 20, 30, 255), Rgba8::new(1, 2, 3, 4)]);
        assert_eq!(Rgba8::slice_to_bytes(pixels), &bytes);
    }

    #[test]
    fn clamp_round_saturates() {
        assert_eq!(clamp_round_u8(-5.0), 0);
        assert_eq!(clamp_round_u8(300.0), 255);
        assert_eq!(clamp_round_u8(127.6), 128);
    }
}
