//! Chroma Alpha (C2)
//!
//! Computes a per-pixel effective alpha against a chroma key color using
//! normalized-color similarity. Background-colored pixels collapse to 0
//! while antialiased edges keep a graded alpha.

use crate::color::Rgba8;

/// Reference color marking "background". Sampled from `frame[0].pixel(0,0)`
/// by default (see [`crate::config::PipelineOptions::chroma_key_from_pixel00`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChromaKey(pub Rgba8);

impl ChromaKey {
    #[must_use]
    pub fn sample(frame0: &[Rgba8]) -> Self {
        Self(*frame0.first().unwrap_or(&Rgba8::BLACK_OPAQUE))
    }

    /// Whether this key actually gates masking (spec: "used when its
    /// alpha >= 32").
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.0.a > 32
    }
}

/// Effective alpha of `sample` against `key`, in `[0, 255]`.
///
/// - If either color's RGB vector has negligible length, the source alpha
///   passes through unchanged (there is no meaningful direction to compare
///   against).
/// - Otherwise the cosine similarity between the two RGB vectors is mapped
///   to a masking alpha, binarized below `128`, and combined with the
///   source alpha when the key is active.
#[must_use]
pub fn chroma_alpha(key: ChromaKey, sample: Rgba8) -> u8 {
    let k = key.0.as_vec3();
    let s = sample.as_vec3();

    if k.length() < 0.001 || s.length() < 0.001 {
        return sample.a;
    }

    let sim = k.dot(s) / (k.length() * s.length());
    let mut alpha_key = crate::color::clampf((1.0 - sim) * 255.0, 0.0, 255.0);
    if alpha_key < 128.0 {
        alpha_key = 0.0;
    }

    if key.0.a > 32 {
        let modulated = f32::from(sample.a) * (alpha_key / 255.0);
        crate::color::clamp_round_u8(modulated)
    } else {
        sample.a
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_length_key_passes_source_alpha_through() {
        let key = ChromaKey(Rgba8::new(0, 0, 0, 255));
        let sample = Rgba8::new(10, 20, 30, 77);
        assert_eq!(chroma_alpha(key, sample), 77);
    }

    #[test]
    fn identical_color_to_key_collapses_to_zero() {
        let key = ChromaKey(Rgba8::new(0, 255, 0, 255));
        let sample = Rgba8::new(0, 255, 0, 200);
        assert_eq!(chroma_alpha(key, sample), 0);
    }

    #[test]
    fn orthogonal_color_keeps_source_alpha() {
        let key = ChromaKey(Rgba8::new(0, 255, 0, 255));
        let sample = Rgba8::new(255, 0, 0, 200);
        // sim = 0 -> alpha_key = 255 -> full pass-through of source alpha.
        assert_eq!(chroma_alpha(key, sample), 200);
    }

    #[test]
    fn inactive_key_passes_source_alpha_through() {
        let key = ChromaKey(Rgba8::new(0, 255, 0, 10));
        let sample = Rgba8::new(0, 255, 0, 200);
        assert_eq!(chroma_alpha(key, sample), 200);
    }
}
