//! Envelope Builder (C3)
//!
//! A per-pixel ADSR-style tracker driven once per frame. Implemented as an
//! explicit state enum plus a `re_examine` flag returned from the
//! transition step, driving a do-while loop around one frame's evaluation
//! (see the ADSR design note): a single incoming `(frame_id, alpha)` pair
//! may cause more than one state transition before settling, but never
//! advances the frame clock itself.
//!
//! ## Deviations from the literal transition table
//!
//! Three cells of the table in the distilled spec conflict with its own
//! worked example (a single pulse `[0, 50, 200, 200, 100, 0, 0, 0]`
//! expected to close with `release_end = 5`, and a rebound
//! `[0, 200, 180, 220, 50, 0]` expected to continue as one envelope peaking
//! at `max = 220`). Both worked examples are treated as authoritative over
//! the table text; see `DESIGN.md` for the full reasoning. The three
//! resolved deviations:
//!
//! 1. `RELEASE, α = 0`: `release_end = f` (the zero frame itself), not
//!    `f - 1`. This matches the already-unambiguous sibling rule
//!    (`SUSTAIN` dropping straight to zero also uses `release_end = f`)
//!    and the worked single-pulse example.
//! 2. The noise-rejection test is `release_end - attack_start >=
//!    NOISE_FRAMES`, not `>`. The worked example's span is exactly 4.
//! 3. `RELEASE, α > min_release, duration < NOISE_FRAMES`: backtrack into
//!    `SUSTAIN` re-examining the same frame, *preserving* `attack_start`/
//!    `max` (the "envelope never started [a release]" framing in the
//!    design notes), rather than resetting to `NOT_IN`. `duration` is
//!    `frame_id - release_start`.

use crate::config::PipelineOptions;

/// The four ADSR phases, plus the "not currently tracking anything" phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    NotIn,
    Attack,
    Sustain,
    Release,
}

/// A fully closed envelope, retained only if it passed the noise filters
/// in [`EnvelopeTracker::finalize`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompletedEnvelope {
    pub attack_start: u32,
    pub attack_end: u32,
    pub release_start: u32,
    pub release_end: u32,
    pub min_attack_alpha: u8,
    pub min_release_alpha: u8,
    pub max_alpha: u8,
    /// Sum of alpha across every in-envelope frame; the selection score.
    pub area: u64,
}

/// Per-pixel state. Owned by the `Vec<EnvelopeTracker>` in
/// [`crate::pipeline::PipelineCoordinator`], one per pixel.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeTracker {
    state_tag: u8, // 0=NotIn,1=Attack,2=Sustain,3=Release (Default-friendly)
    attack_start: u32,
    attack_end: u32,
    release_start: u32,
    release_end: u32,
    min_attack_alpha: u8,
    min_release_alpha: u8,
    max_alpha: u8,
    area: u64,
    best: Option<CompletedEnvelope>,
}

fn tag_to_state(tag: u8) -> EnvelopeState {
    match tag {
        1 => EnvelopeState::Attack,
        2 => EnvelopeState::Sustain,
        3 => EnvelopeState::Release,
        _ => EnvelopeState::NotIn,
    }
}

fn state_to_tag(state: EnvelopeState) -> u8 {
    match state {
        EnvelopeState::NotIn => 0,
        EnvelopeState::Attack => 1,
        EnvelopeState::Sustain => 2,
        EnvelopeState::Release => 3,
    }
}

impl EnvelopeTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> EnvelopeState {
        tag_to_state(self.state_tag)
    }

    #[must_use]
    pub fn best(&self) -> Option<&CompletedEnvelope> {
        self.best.as_ref()
    }

    /// Process one frame's effective alpha for this pixel.
    pub fn process_frame(&mut self, frame_id: u32, alpha: u8, opts: &PipelineOptions) {
        let mut state = self.state();
        let mut re_examine;
        let mut iterations = 0u8;
        loop {
            iterations += 1;
            debug_assert!(iterations < 8, "envelope transition did not converge for one frame");
            re_examine = false;

            state = match state {
                EnvelopeState::NotIn => {
                    if alpha > opts.alpha_threshold {
                        self.attack_start = frame_id;
                        self.attack_end = frame_id;
                        self.max_alpha = alpha;
                        self.min_attack_alpha = alpha;
                        EnvelopeState::Attack
                    } else {
                        EnvelopeState::NotIn
                    }
                }
                EnvelopeState::Attack => {
                    if alpha > self.max_alpha {
                        self.max_alpha = alpha;
                        self.attack_end = frame_id;
                        EnvelopeState::Attack
                    } else {
                        re_examine = true;
                        EnvelopeState::Sustain
                    }
                }
                EnvelopeState::Sustain => {
                    if alpha > self.max_alpha {
                        self.max_alpha = alpha;
                        self.attack_end = frame_id;
                        EnvelopeState::Attack
                    } else if alpha < self.max_alpha {
                        self.release_start = frame_id;
                        self.min_release_alpha = alpha;
                        if alpha == 0 {
                            self.release_end = frame_id;
                            self.finalize(opts);
                            EnvelopeState::NotIn
                        } else {
                            EnvelopeState::Release
                        }
                    } else {
                        EnvelopeState::Sustain
                    }
                }
                EnvelopeState::Release => {
                    if alpha == 0 {
                        self.release_end = frame_id; // deviation (1): not frame_id - 1
                        self.finalize(opts);
                        EnvelopeState::NotIn
                    } else if alpha < self.min_release_alpha {
                        self.min_release_alpha = alpha;
                        self.release_end = frame_id;
                        EnvelopeState::Release
                    } else if alpha > self.min_release_alpha {
                        let duration = frame_id - self.release_start;
                        if duration < opts.noise_frames {
                            // deviation (3): backtrack into SUSTAIN, keep attack_start/max
                            re_examine = true;
                            EnvelopeState::Sustain
                        } else {
                            self.release_end = frame_id.saturating_sub(1);
                            self.finalize(opts);
                            re_examine = true;
                            EnvelopeState::NotIn
                        }
                    } else {
                        // alpha == min_release_alpha: plateau, stays in RELEASE.
                        EnvelopeState::Release
                    }
                }
            };

            if !re_examine {
                break;
            }
        }

        self.state_tag = state_to_tag(state);
        if state != EnvelopeState::NotIn {
            self.area = self.area.saturating_add(u64::from(alpha));
        }
    }

    fn finalize(&mut self, opts: &PipelineOptions) {
        let span = self.release_end.saturating_sub(self.attack_start);
        if span >= opts.noise_frames && self.max_alpha > opts.noise_alpha {
            let candidate = CompletedEnvelope {
                attack_start: self.attack_start,
                attack_end: self.attack_end,
                release_start: self.release_start,
                release_end: self.release_end,
                min_attack_alpha: self.min_attack_alpha,
                min_release_alpha: self.min_release_alpha,
                max_alpha: self.max_alpha,
                area: self.area,
            };
            let replace = match &self.best {
                Some(best) => candidate.area > best.area,
                None => true,
            };
            if replace {
                self.best = Some(candidate);
            }
        }
        self.area = 0;
        self.attack_start = 0;
        self.attack_end = 0;
        self.release_start = 0;
        self.release_end = 0;
        self.max_alpha = 0;
        self.min_attack_alpha = 0;
        self.min_release_alpha = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(alphas: &[u8], opts: &PipelineOptions) -> EnvelopeTracker {
        let mut tracker = EnvelopeTracker::new();
        for (f, &a) in alphas.iter().enumerate() {
            tracker.process_frame(f as u32, a, opts);
        }
        // synthetic flush frame at total_frames
        tracker.process_frame(alphas.len() as u32, 0, opts);
        tracker
    }

    #[test]
    fn s1_single_pulse() {
        let opts = PipelineOptions::default();
        let tracker = run(&[0, 50, 200, 200, 100, 0, 0, 0], &opts);
        let best = tracker.best().expect("expected a best envelope");
        assert_eq!(best.attack_start, 1);
        assert_eq!(best.attack_end, 2);
        assert_eq!(best.release_start, 4);
        assert_eq!(best.release_end, 5);
        assert_eq!(best.max_alpha, 200);
    }

    #[test]
    fn s2_no_envelope() {
        let opts = PipelineOptions::default();
        let tracker = run(&[0, 0, 0, 0], &opts);
        assert!(tracker.best().is_none());
    }

    #[test]
    fn s4_noise_rejection() {
        let opts = PipelineOptions::default();
        let tracker = run(&[0, 30, 0, 0, 0], &opts);
        assert!(tracker.best().is_none(), "sub-threshold alpha must not retain an envelope");
    }

    #[test]
    fn s5_ripple_rebound_continues_single_envelope() {
        let opts = PipelineOptions::default();
        let tracker = run(&[0, 200, 180, 220, 50, 0], &opts);
        let best = tracker.best().expect("expected a best envelope");
        assert_eq!(best.max_alpha, 220);
        assert_eq!(best.attack_end, 3);
    }

    #[test]
    fn monotonicity_invariant_holds_on_random_like_sequences() {
        let opts = PipelineOptions::default();
        let sequences: &[&[u8]] = &[
            &[0, 60, 255, 255, 255, 10, 0, 0, 0, 0],
            &[0, 40, 80, 40, 80, 160, 0, 0, 0],
            &[0, 5, 5, 5, 0],
        ];
        for seq in sequences {
            let tracker = run(seq, &opts);
            if let Some(best) = tracker.best() {
                assert!(best.attack_start <= best.attack_end);
                assert!(best.attack_end <= best.release_start);
                assert!(best.release_start <= best.release_end);
                assert!(best.max_alpha >= best.min_attack_alpha);
                assert!(best.max_alpha >= best.min_release_alpha);
            }
        }
    }
}
