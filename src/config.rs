//! Pipeline configuration
//!
//! [`PipelineOptions`] collects every tunable named in the configurable
//! options table: envelope noise thresholds, chroma-key sampling, gradient
//! volume extent, and the iteration/convergence limits of the optional
//! cleanup passes (C5/C6/C7). The core never reads these from the
//! environment or from disk; a host application owns loading them (e.g. via
//! `serde_json` deserialization, enabled by the default `serde` feature).

/// Tunable parameters for the whole pipeline.
///
/// All fields have defaults matching the spec's configurable-options table.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PipelineOptions {
    /// Minimum envelope length, in frames, for it to be retained.
    pub noise_frames: u32,
    /// Minimum peak alpha for an envelope to be retained.
    pub noise_alpha: u8,
    /// Alpha floor for entering the ATTACK state.
    pub alpha_threshold: u8,
    /// Sample the chroma key from `frame[0].pixel(0, 0)` rather than a
    /// caller-supplied color.
    pub chroma_key_from_pixel00: bool,
    /// `1` for a 2D ramp, `>1` for a 3D cube.
    pub gradient_depth: u32,
    /// `(width, height)` of the gradient volume.
    pub gradient_size: (u32, u32),
    /// Cap on smart-blur iterations.
    pub max_blur_iterations: u32,
    /// Smart-blur convergence threshold (max per-iteration change).
    pub blur_convergence_threshold: f32,
    /// Fourier clamp cutoff ratio, in `(0, 1]`.
    pub fourier_cutoff_ratio: f32,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            noise_frames: 4,
            noise_alpha: 32,
            alpha_threshold: 4,
            chroma_key_from_pixel00: true,
            gradient_depth: 1,
            gradient_size: (128, 128),
            max_blur_iterations: 200,
            blur_convergence_threshold: 0.01,
            fourier_cutoff_ratio: 0.3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let opts = PipelineOptions::default();
        assert_eq!(opts.noise_frames, 4);
        assert_eq!(opts.noise_alpha, 32);
        assert_eq!(opts.alpha_threshold, 4);
        assert!(opts.chroma_key_from_pixel00);
        assert_eq!(opts.gradient_depth, 1);
        assert_eq!(opts.gradient_size, (128, 128));
        assert_eq!(opts.max_blur_iterations, 200);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn round_trips_through_json() {
        let opts = PipelineOptions::default();
        let json = serde_json::to_string(&opts).unwrap();
        let back: PipelineOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(opts, back);
    }
}
