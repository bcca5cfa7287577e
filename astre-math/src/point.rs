//! The shared point/frame/sequence data model (§3).

use crate::error::{AstreError, Result};

/// A 2-D detection coordinate. `x, y` are conventionally inside
/// `[0, W] x [0, H]` but this is not enforced by the type.
pub type Coord = (f64, f64);

/// One frame: an ordered list of 2-D detections.
pub type Frame = Vec<Coord>;

/// A single element of an extracted (or interpolated, for display)
/// trajectory.
///
/// `Interp` is only ever constructed by a display/viewer collaborator;
/// the core extractor in `astre-solver` emits only `Ref` and `None`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Point {
    /// References `frames[k][index]` for the trajectory's frame `k`.
    Ref(usize),
    /// The trajectory has a hole at this frame.
    None,
    /// A display-only interpolated coordinate; never produced by the core.
    Interp(f32, f32),
}

/// An immutable input: image dimensions plus an ordered sequence of
/// frames.
#[derive(Debug, Clone)]
pub struct PointSequence {
    width: u32,
    height: u32,
    frames: Vec<Frame>,
}

impl PointSequence {
    /// Builds a `PointSequence`. Fails with `InvalidInput` if the image
    /// has a non-positive dimension or there are fewer than 3 frames.
    pub fn new(width: u32, height: u32, frames: Vec<Frame>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(AstreError::InvalidInput(format!(
                "image dimensions must be positive, got {}x{}",
                width, height
            )));
        }
        if frames.len() < 3 {
            return Err(AstreError::InvalidInput(format!(
                "need at least 3 frames, got {}",
                frames.len()
            )));
        }
        Ok(Self { width, height, frames })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn image_area(&self) -> f64 {
        f64::from(self.width) * f64::from(self.height)
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn frame(&self, k: usize) -> &[Coord] {
        &self.frames[k]
    }

    pub fn frame_len(&self, k: usize) -> usize {
        self.frames[k].len()
    }

    pub fn max_frame_len(&self) -> usize {
        self.frames.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_too_few_frames() {
        let err = PointSequence::new(10, 10, vec![vec![], vec![]]).unwrap_err();
        assert!(matches!(err, AstreError::InvalidInput(_)));
    }

    #[test]
    fn rejects_non_positive_dimensions() {
        let err = PointSequence::new(0, 10, vec![vec![], vec![], vec![]]).unwrap_err();
        assert!(matches!(err, AstreError::InvalidInput(_)));
    }

    #[test]
    fn accepts_three_frames() {
        let seq = PointSequence::new(100, 100, vec![vec![(1.0, 1.0)], vec![], vec![]]).unwrap();
        assert_eq!(seq.num_frames(), 3);
        assert_eq!(seq.image_area(), 10_000.0);
    }
}
