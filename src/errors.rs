//! Error Types
//!
//! This module defines the error type used throughout the pipeline.
//!
//! # Overview
//!
//! The main error type [`RevealError`] covers all failure modes including:
//! - Frame-shape and operation-order errors raised at the public API boundary
//! - Data-exhaustion errors (no pixel ever accumulated a qualifying envelope)
//! - Allocation failures, which poison the coordinator
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for `std::result::Result<T, RevealError>`.
//!
//! ```rust,ignore
//! use reveal_core::errors::{RevealError, Result};
//!
//! fn push(len: usize, expected: usize) -> Result<()> {
//!     if len != expected {
//!         return Err(RevealError::InvalidFrameSize { expected, actual: len });
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the reveal pipeline.
///
/// Each variant corresponds to one of the error classes in the taxonomy:
/// input-shape errors, data-exhaustion, allocation failures, and internal
/// logic violations (bugs, never expected for valid input).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RevealError {
    // ========================================================================
    // Input-shape errors
    // ========================================================================
    /// A pushed frame's byte length did not match `width * height * 4`.
    #[error("invalid frame size: expected {expected} bytes, got {actual}")]
    InvalidFrameSize {
        /// `width * height * 4`
        expected: usize,
        /// Length of the buffer actually supplied
        actual: usize,
    },

    /// A public operation was called while the coordinator was in a state
    /// that does not accept it (see the state machine in `pipeline`).
    #[error("operation {op} is invalid in state {state}")]
    BadOperationOrder {
        /// Name of the rejected operation
        op: &'static str,
        /// Debug name of the current state
        state: &'static str,
    },

    /// `finish_pushing_frames` was called without ever pushing a frame.
    #[error("zero frames were pushed before finishing the stream")]
    ZeroFrames,

    // ========================================================================
    // Data-exhaustion errors
    // ========================================================================
    /// No pixel in the stream accumulated a qualifying (non-noise) envelope.
    #[error("no pixel produced a qualifying envelope")]
    NoEnvelopes,

    // ========================================================================
    // Allocation & internal errors
    // ========================================================================
    /// Allocating one of the coordinator's internal buffers failed. The
    /// coordinator transitions to a poisoned state after this error; every
    /// operation except `shutdown` will subsequently fail.
    #[error("allocation failed: {0}")]
    AllocationFailed(String),

    /// An internal invariant was violated. This should never happen for
    /// valid input; it is reported rather than panicking so that a caller
    /// embedding the pipeline can fail gracefully.
    #[error("internal invariant violated: {0}")]
    Internal(String),
}

/// Alias for `Result<T, RevealError>`.
pub type Result<T> = std::result::Result<T, RevealError>;
