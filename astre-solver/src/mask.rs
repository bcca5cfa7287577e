//! The activation mask: per-point availability, shared mutable state
//! across outer-loop iterations.

use vob::Vob;

/// One boolean per `(frame, point)`. Initially all true; monotonically
/// set to false by the extractor. An extracted point is never re-used.
#[derive(Debug, Clone)]
pub struct ActivationMask {
    frames: Vec<Vob>,
}

impl ActivationMask {
    pub fn new(frame_lens: &[usize]) -> Self {
        let frames = frame_lens.iter().map(|&n| Vob::from_elem(n, true)).collect();
        Self { frames }
    }

    #[inline]
    pub fn is_active(&self, k: usize, i: usize) -> bool {
        self.frames[k].get(i).unwrap_or(false)
    }

    pub fn deactivate(&mut self, k: usize, i: usize) {
        self.frames[k].set(i, false);
    }

    /// Active point indices of frame `k`, in ascending order.
    pub fn active_indices(&self, k: usize) -> impl Iterator<Item = usize> + '_ {
        self.frames[k].iter_set_bits(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deactivation_is_monotone_and_exclusive() {
        let mut mask = ActivationMask::new(&[2, 3]);
        assert!(mask.is_active(0, 0));
        mask.deactivate(0, 0);
        assert!(!mask.is_active(0, 0));
        assert!(mask.is_active(0, 1));
        assert!(mask.is_active(1, 2));
    }

    #[test]
    fn active_indices_lists_only_set_bits() {
        let mut mask = ActivationMask::new(&[4]);
        mask.deactivate(0, 1);
        mask.deactivate(0, 3);
        let active: Vec<usize> = mask.active_indices(0).collect();
        assert_eq!(active, vec![0, 2]);
    }
}
