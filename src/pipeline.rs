//! Pipeline Coordinator (C11)
//!
//! Owns the frame buffer, envelope trackers, timing map, and gradient
//! volume; drives every other component in order and exposes the sole
//! public surface a host application touches. State machine:
//!
//! ```text
//! Uninitialized -> Pushing -> Encoded -> Gradient(k) -> Complete
//! ```
//!
//! `push_frame` is only valid in `Pushing`; `compute_gradient` is valid in
//! `Encoded` or `Gradient(_)` and becomes a no-op once two passes have run
//! (the second pass also triggers the C10 hole-fill). `shutdown` is valid
//! from any state and is itself idempotent.

use crate::chroma::{chroma_alpha, ChromaKey};
use crate::color::Rgba8;
use crate::config::PipelineOptions;
use crate::envelope::EnvelopeTracker;
use crate::errors::{RevealError, Result};
use crate::frame::{synthetic_flush_frame, Frame};
use crate::gradient::{accumulate_frame, GradientVolume};
use crate::holefill::{emit, hole_fill};
use crate::timing::{self, EnvelopeBounds, Metadata, TimingMap};

const HOLE_FILL_MAX_RADIUS: u32 = 128;

/// Which output buffer `get_image` should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSlot {
    Timing,
    Gradient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Uninitialized,
    Pushing,
    Encoded,
    Gradient(u32),
    Complete,
    Poisoned,
    ShutDown,
}

impl State {
    fn name(self) -> &'static str {
        match self {
            State::Uninitialized => "Uninitialized",
            State::Pushing => "Pushing",
            State::Encoded => "Encoded",
            State::Gradient(_) => "Gradient",
            State::Complete => "Complete",
            State::Poisoned => "Poisoned",
            State::ShutDown => "ShutDown",
        }
    }
}

/// The CPU-side analysis pipeline. See the module doc for the state
/// machine it enforces.
pub struct PipelineCoordinator {
    opts: PipelineOptions,
    state: State,
    width: u32,
    height: u32,
    frames: Vec<Vec<u8>>,
    trackers: Vec<EnvelopeTracker>,
    chroma_key: Option<ChromaKey>,
    timing_map: Option<TimingMap>,
    bounds: Option<EnvelopeBounds>,
    metadata: Option<Metadata>,
    gradient: Option<GradientVolume>,
    gradient_bytes: Option<Vec<Rgba8>>,
}

impl PipelineCoordinator {
    #[must_use]
    pub fn new(opts: PipelineOptions) -> Self {
        Self {
            opts,
            state: State::Uninitialized,
            width: 0,
            height: 0,
            frames: Vec::new(),
            trackers: Vec::new(),
            chroma_key: None,
            timing_map: None,
            bounds: None,
            metadata: None,
            gradient: None,
            gradient_bytes: None,
        }
    }

    fn reject(&self, op: &'static str) -> RevealError {
        RevealError::BadOperationOrder { op, state: self.state.name() }
    }

    /// Allocate frame storage and the per-pixel envelope buffer for a
    /// `(width, height)` stream.
    pub fn initialize(&mut self, width: u32, height: u32) -> Result<()> {
        if self.state != State::Uninitialized {
            return Err(self.reject("initialize"));
        }
        let pixel_count = width as usize * height as usize;
        let mut trackers = Vec::new();
        if let Err(e) = trackers.try_reserve_exact(pixel_count) {
            self.state = State::Poisoned;
            return Err(RevealError::AllocationFailed(e.to_string()));
        }
        trackers.resize(pixel_count, EnvelopeTracker::new());

        self.width = width;
        self.height = height;
        self.trackers = trackers;
        self.state = State::Pushing;
        log::info!("pipeline initialized at {width}x{height}");
        Ok(())
    }

    /// Store one RGBA8 frame and feed it through the chroma-key and
    /// envelope-builder stages.
    ///
    /// # Errors
    /// [`RevealError::InvalidFrameSize`] if `bytes.len() != width*height*4`.
    pub fn push_frame(&mut self, bytes: &[u8]) -> Result<()> {
        if self.state != State::Pushing {
            return Err(self.reject("push_frame"));
        }
        let expected = self.width as usize * self.height as usize * 4;
        if bytes.len() != expected {
            return Err(RevealError::InvalidFrameSize { expected, actual: bytes.len() });
        }

        let pixels = Rgba8::slice_from_bytes(bytes);
        let key = *self.chroma_key.get_or_insert_with(|| ChromaKey::sample(pixels));
        let frame_id = self.frames.len() as u32;

        for (tracker, &pixel) in self.trackers.iter_mut().zip(pixels.iter()) {
            let alpha = chroma_alpha(key, pixel);
            tracker.process_frame(frame_id, alpha, &self.opts);
        }

        let mut owned = Vec::new();
        if let Err(e) = owned.try_reserve_exact(bytes.len()) {
            self.state = State::Poisoned;
            return Err(RevealError::AllocationFailed(e.to_string()));
        }
        owned.extend_from_slice(bytes);
        self.frames.push(owned);
        log::debug!("pushed frame {frame_id}");
        Ok(())
    }

    /// Flush the envelope builder with a synthetic zero frame and encode
    /// the timing map.
    ///
    /// # Errors
    /// [`RevealError::ZeroFrames`] if no frame was ever pushed,
    /// [`RevealError::NoEnvelopes`] if no pixel produced a qualifying one.
    pub fn finish_pushing_frames(&mut self) -> Result<()> {
        if self.state != State::Pushing {
            return Err(self.reject("finish_pushing_frames"));
        }
        if self.frames.is_empty() {
            return Err(RevealError::ZeroFrames);
        }

        let total_frames = self.frames.len() as u32;
        let key = self.chroma_key.expect("set on the first push_frame");
        let flush = synthetic_flush_frame(self.width, self.height);
        let flush_pixels = Rgba8::slice_from_bytes(&flush);
        for (tracker, &pixel) in self.trackers.iter_mut().zip(flush_pixels.iter()) {
            let alpha = chroma_alpha(key, pixel);
            tracker.process_frame(total_frames, alpha, &self.opts);
        }

        let (timing_map, bounds, metadata) =
            timing::encode(self.width, self.height, &self.trackers, total_frames)?;
        log::info!(
            "timing map encoded: fade_in={:.3} fade_out={:.3}",
            metadata.fade_in_duration,
            metadata.fade_out_duration
        );

        let (gw, gh) = self.opts.gradient_size;
        self.gradient = Some(GradientVolume::new(gw, gh, self.opts.gradient_depth));
        self.timing_map = Some(timing_map);
        self.bounds = Some(bounds);
        self.metadata = Some(metadata);
        self.state = State::Encoded;
        Ok(())
    }

    /// Run one reverse-splat gradient pass over every stored frame. The
    /// second pass additionally runs the C10 hole-fill; subsequent calls
    /// are a no-op.
    pub fn compute_gradient(&mut self) -> Result<()> {
        let pass = match self.state {
            State::Encoded => 0,
            State::Gradient(k) => k,
            State::Complete => {
                log::debug!("compute_gradient called again after completion; no-op");
                return Ok(());
            }
            _ => return Err(self.reject("compute_gradient")),
        };

        let timing_map = self.timing_map.as_ref().expect("set in finish_pushing_frames");
        let metadata = self.metadata.as_ref().expect("set in finish_pushing_frames");
        let total_frames = self.frames.len() as u32;
        let volume = self.gradient.as_mut().expect("set in finish_pushing_frames");

        for (frame_id, bytes) in self.frames.iter().enumerate() {
            let frame = Frame::new(bytes, self.width, self.height, frame_id as u32);
            accumulate_frame(volume, &frame, timing_map, metadata, frame_id as u32, total_frames);
        }

        let next_pass = pass + 1;
        if next_pass >= 2 {
            hole_fill(volume, HOLE_FILL_MAX_RADIUS);
        }
        self.gradient_bytes = Some(emit(volume));
        log::info!("gradient pass {next_pass} complete");

        self.state = if next_pass >= 2 { State::Complete } else { State::Gradient(next_pass) };
        Ok(())
    }

    /// `{fade_in_duration, fade_out_duration}`, available once the timing
    /// map has been encoded.
    pub fn get_metadata(&self) -> Result<Metadata> {
        self.metadata.ok_or_else(|| self.reject("get_metadata"))
    }

    /// The min/max attack/release frame bounds used to encode the timing
    /// map.
    pub fn get_bounds(&self) -> Result<EnvelopeBounds> {
        self.bounds.ok_or_else(|| self.reject("get_bounds"))
    }

    /// The timing map or gradient volume as packed RGBA8 bytes.
    pub fn get_image(&self, slot: ImageSlot) -> Result<&[u8]> {
        match slot {
            ImageSlot::Timing => {
                self.timing_map.as_ref().map(TimingMap::to_bytes).ok_or_else(|| self.reject("get_image(timing)"))
            }
            ImageSlot::Gradient => self
                .gradient_bytes
                .as_deref()
                .map(Rgba8::slice_to_bytes)
                .ok_or_else(|| self.reject("get_image(gradient)")),
        }
    }

    /// Free all owned buffers. Idempotent; every other operation fails
    /// afterward.
    pub fn shutdown(&mut self) {
        self.frames = Vec::new();
        self.trackers = Vec::new();
        self.timing_map = None;
        self.bounds = None;
        self.metadata = None;
        self.gradient = None;
        self.gradient_bytes = None;
        self.state = State::ShutDown;
        log::info!("pipeline shut down");
    }
}
