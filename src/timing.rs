//! Envelope Encoder (C4)
//!
//! Reduces the per-pixel envelopes accumulated by C3 to global timing
//! bounds, then writes a normalized RGBA8 timing map: `R` encodes reveal
//! order (earliest `attack_start` -> brightest), `G` encodes dissolve order
//! (earliest `release_end` -> darkest), `B` is reserved edge hardness
//! (written `0` in this encoding; see `DESIGN.md` Open Question on the
//! hardness formula), `A` is `255` everywhere, with color `(0,0,0)` for
//! pixels that never accumulated a qualifying envelope.

use crate::color::{clamp_round_u8, Rgba8};
use crate::envelope::EnvelopeTracker;
use crate::errors::{RevealError, Result};

/// The four global bounds the encoder reduces envelopes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeBounds {
    pub min_attack: u32,
    pub max_attack: u32,
    pub min_release: u32,
    pub max_release: u32,
}

impl EnvelopeBounds {
    #[must_use]
    pub fn attack_span(&self) -> u32 {
        (self.max_attack - self.min_attack).max(1)
    }

    #[must_use]
    pub fn release_span(&self) -> u32 {
        (self.max_release - self.min_release).max(1)
    }
}

/// RGBA8 `(width, height)` texture consumed by the playback shader as
/// `u_erosionTexture`.
#[derive(Debug, Clone)]
pub struct TimingMap {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Rgba8>,
}

impl TimingMap {
    #[must_use]
    pub fn to_bytes(&self) -> &[u8] {
        Rgba8::slice_to_bytes(&self.pixels)
    }
}

/// Metadata surfaced through the public `get_metadata` operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metadata {
    /// Fraction of total duration spent fading pixels in, in `[0, 1]`.
    pub fade_in_duration: f32,
    /// Fraction of total duration spent fading pixels out, in `[0, 1]`.
    pub fade_out_duration: f32,
}

/// Run the C4 reduction + encode pass.
///
/// # Errors
/// Returns [`RevealError::NoEnvelopes`] if no pixel in `trackers` produced a
/// qualifying `best` envelope.
pub fn encode(
    width: u32,
    height: u32,
    trackers: &[EnvelopeTracker],
    total_frames: u32,
) -> Result<(TimingMap, EnvelopeBounds, Metadata)> {
    let mut bounds: Option<EnvelopeBounds> = None;
    for tracker in trackers {
        if let Some(best) = tracker.best() {
            bounds = Some(match bounds {
                None => EnvelopeBounds {
                    min_attack: best.attack_start,
                    max_attack: best.attack_start,
                    min_release: best.release_end,
                    max_release: best.release_end,
                },
                Some(b) => EnvelopeBounds {
                    min_attack: b.min_attack.min(best.attack_start),
                    max_attack: b.max_attack.max(best.attack_start),
                    min_release: b.min_release.min(best.release_end),
                    max_release: b.max_release.max(best.release_end),
                },
            });
        }
    }
    let bounds = bounds.ok_or(RevealError::NoEnvelopes)?;

    let attack_span = bounds.attack_span();
    let release_span = bounds.release_span();

    let mut pixels = Vec::with_capacity(trackers.len());
    for tracker in trackers {
        match tracker.best() {
            None => pixels.push(Rgba8::BLACK_OPAQUE),
            Some(best) => {
                let r = clamp_round_u8(
                    255.0
                        * (1.0
                            - (best.attack_start - bounds.min_attack) as f32 / attack_span as f32),
                );
                let g = clamp_round_u8(
                    255.0 * (best.release_end - bounds.min_release) as f32 / release_span as f32,
                );
                pixels.push(Rgba8::new(r, g, 0, 255));
            }
        }
    }

    let total = total_frames.max(1) as f32;
    let metadata = Metadata {
        fade_in_duration: crate::color::clampf(attack_span as f32 / total, 0.0, 1.0),
        fade_out_duration: crate::color::clampf(release_span as f32 / total, 0.0, 1.0),
    };

    Ok((TimingMap { width, height, pixels }, bounds, metadata))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineOptions;

    fn tracker_from(alphas: &[u8], opts: &PipelineOptions) -> EnvelopeTracker {
        let mut tracker = EnvelopeTracker::new();
        for (f, &a) in alphas.iter().enumerate() {
            tracker.process_frame(f as u32, a, opts);
        }
        tracker.process_frame(alphas.len() as u32, 0, opts);
        tracker
    }

    #[test]
    fn no_envelopes_is_an_error() {
        let opts = PipelineOptions::default();
        let trackers = vec![tracker_from(&[0, 0, 0, 0], &opts)];
        let err = encode(1, 1, &trackers, 4).unwrap_err();
        assert_eq!(err, RevealError::NoEnvelopes);
    }

    #[test]
    fn earlier_reveal_gets_brighter_red() {
        let opts = PipelineOptions::default();
        // A reveals/fades early; B reveals/fades late.
        let a = tracker_from(&[0, 255, 255, 255, 255, 0, 0, 0, 0, 0], &opts);
        let b = tracker_from(&[0, 0, 0, 0, 0, 255, 255, 255, 255, 0], &opts);
        let trackers = vec![a, b];
        let (map, _, meta) = encode(2, 1, &trackers, 10).unwrap();
        assert_eq!(map.pixels[0].a, 255);
        assert!(map.pixels[0].r > map.pixels[1].r, "earlier attack_start should be brighter red");
        assert!(map.pixels[0].g < map.pixels[1].g, "earlier release_end should be darker green");
        assert!(meta.fade_in_duration >= 0.0 && meta.fade_in_duration <= 1.0);
        assert!(meta.fade_out_duration >= 0.0 && meta.fade_out_duration <= 1.0);
    }

    #[test]
    fn pixel_without_best_is_black_opaque() {
        let opts = PipelineOptions::default();
        let has_best = tracker_from(&[0, 255, 255, 255, 255, 0, 0], &opts);
        let no_best = tracker_from(&[0, 0, 0, 0, 0, 0, 0], &opts);
        let trackers = vec![has_best, no_best];
        let (map, ..) = encode(2, 1, &trackers, 7).unwrap();
        assert_eq!(map.pixels[1], Rgba8::BLACK_OPAQUE);
    }
}
