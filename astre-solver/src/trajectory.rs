//! Output types: one step of an extracted trajectory, and the trajectory
//! itself.

use astre_math::Point;

/// One step of an extracted trajectory. The core only ever produces
/// `Ref` and `Hole` steps (never `Point::Interp`, which is a display-only
/// concern of a viewer collaborator).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub frame_index: usize,
    pub kind: StepKind,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepKind {
    /// References `point_index` in frame `frame_index`.
    Ref(usize),
    /// The trajectory has a hole at this frame (holes solver only).
    Hole,
}

impl Step {
    pub fn reference(frame_index: usize, point_index: usize) -> Self {
        Self { frame_index, kind: StepKind::Ref(point_index) }
    }

    pub fn hole(frame_index: usize) -> Self {
        Self { frame_index, kind: StepKind::Hole }
    }

    pub fn as_point(&self) -> Point {
        match self.kind {
            StepKind::Ref(i) => Point::Ref(i),
            StepKind::Hole => Point::None,
        }
    }

    pub fn is_ref(&self) -> bool {
        matches!(self.kind, StepKind::Ref(_))
    }
}

/// An extracted trajectory: an ordered list of steps plus its
/// `log10(NFA)` score. The first and last step are always `Ref`.
#[derive(Debug, Clone)]
pub struct Trajectory {
    pub steps: Vec<Step>,
    pub log_nfa: f64,
}

impl Trajectory {
    /// Size: the number of `Ref` (observed) steps.
    pub fn size(&self) -> usize {
        self.steps.iter().filter(|s| s.is_ref()).count()
    }

    /// Span: last frame minus first frame, plus one.
    pub fn span(&self) -> usize {
        self.steps.len()
    }

    /// Number of maximal `Ref`-only runs.
    pub fn runs(&self) -> usize {
        let mut runs = 0;
        let mut in_run = false;
        for step in &self.steps {
            if step.is_ref() {
                if !in_run {
                    runs += 1;
                    in_run = true;
                }
            } else {
                in_run = false;
            }
        }
        runs
    }

    /// `(frame_index, point_index)` pairs this trajectory occupies.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.steps.iter().filter_map(|s| match s.kind {
            StepKind::Ref(i) => Some((s.frame_index, i)),
            StepKind::Hole => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_counts_maximal_ref_subsequences() {
        let traj = Trajectory {
            steps: vec![
                Step::reference(0, 0),
                Step::hole(1),
                Step::reference(2, 0),
                Step::hole(3),
                Step::reference(4, 0),
            ],
            log_nfa: -1.0,
        };
        assert_eq!(traj.size(), 3);
        assert_eq!(traj.span(), 5);
        assert_eq!(traj.runs(), 3);
    }

    #[test]
    fn runs_counts_one_run_when_contiguous() {
        let traj = Trajectory {
            steps: vec![Step::reference(0, 0), Step::reference(1, 0), Step::reference(2, 0)],
            log_nfa: -1.0,
        };
        assert_eq!(traj.runs(), 1);
    }
}
