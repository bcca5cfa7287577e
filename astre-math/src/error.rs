//! The error kinds shared by every crate in this workspace.
//!
//! `astre-math` and `astre-solver` never panic on bad *input*; they return
//! `AstreError`. Defensive checks that should be unreachable in a correct
//! run (e.g. the extractor failing to find a matching predecessor) still
//! surface as `InvariantViolation` rather than a panic, so a host can
//! report the failure instead of crashing.

/// Errors the core surfaces to its host.
#[derive(Debug, thiserror::Error)]
pub enum AstreError {
    /// Fewer than 3 frames, or non-positive image dimensions.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A frame whose first column is not integer-valued, or whose row
    /// width differs from its peers.
    #[error("malformed frame {frame}: {reason}")]
    MalformedFrame { frame: usize, reason: String },

    /// Reached only via defensive checks; indicates either a numerical
    /// bug or input violating the monotonicity invariants of the DP
    /// table. Not expected in correct runs.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, AstreError>;
