//! The noholes solver (§4.4): trajectories occupy consecutive frames.
//!
//! Ported from `NoholesSolver` in `astre_naive.py`. `g[k0, ix, iy, l0]`
//! is the minimum, over active prefixes of length `l0+1` ending at
//! `(k0-1, iy) -> (k0, ix)`, of the maximum discrete acceleration area
//! along the prefix.

use rayon::prelude::*;

use astre_math::{AstreError, CombinatoricTables, DiscreteArea, PointSequence, Result};

use crate::journal::{IterationRecord, SolveJournal};
use crate::mask::ActivationMask;
use crate::nfa::{log_nfa_noholes, NoholesNprod};
use crate::trajectory::{Step, Trajectory};

const TIE_EPS: f64 = 1e-4;

/// Dense DP table, shape `(K, N_max, N_max, K)`, flattened row-major.
struct GTable {
    k: usize,
    n_max: usize,
    cells: Vec<f64>,
}

impl GTable {
    fn new(k: usize, n_max: usize) -> Self {
        Self { k, n_max, cells: vec![f64::INFINITY; k * n_max * n_max * k] }
    }

    #[inline]
    fn index(&self, k0: usize, ix: usize, iy: usize, l0: usize) -> usize {
        ((k0 * self.n_max + ix) * self.n_max + iy) * self.k + l0
    }

    fn get(&self, k0: usize, ix: usize, iy: usize, l0: usize) -> f64 {
        self.cells[self.index(k0, ix, iy, l0)]
    }

    fn set(&mut self, k0: usize, ix: usize, iy: usize, l0: usize, v: f64) {
        let idx = self.index(k0, ix, iy, l0);
        self.cells[idx] = v;
    }

    fn reset(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = f64::INFINITY);
    }

    /// A mutable view restricted to a single `(k0, ix)` row, i.e. the
    /// `n_max * k` slab for every `(iy, l0)`.
    fn row_mut(&mut self, k0: usize, ix: usize) -> &mut [f64] {
        let start = (k0 * self.n_max + ix) * self.n_max * self.k;
        &mut self.cells[start..start + self.n_max * self.k]
    }
}

pub struct NoholesSolver<'a> {
    seq: &'a PointSequence,
    combi: CombinatoricTables,
    area: DiscreteArea,
    log_image_area: f64,
    nprod: NoholesNprod,
    k: usize,
    g: GTable,
    mask: ActivationMask,
}

impl<'a> NoholesSolver<'a> {
    pub fn new(seq: &'a PointSequence) -> Self {
        let k = seq.num_frames();
        let n_max = seq.max_frame_len().max(1);
        let frame_lens: Vec<usize> = (0..k).map(|i| seq.frame_len(i)).collect();
        Self {
            seq,
            combi: CombinatoricTables::new(k),
            area: DiscreteArea::default(),
            log_image_area: seq.image_area().log10(),
            nprod: NoholesNprod::new(seq),
            k,
            g: GTable::new(k, n_max),
            mask: ActivationMask::new(&frame_lens),
        }
    }

    /// Runs the outer loop to completion and returns every extracted
    /// trajectory, in extraction order, alongside a per-iteration journal.
    pub fn solve(&mut self, eps: f64) -> Result<(Vec<Trajectory>, SolveJournal)> {
        let mut trajs = Vec::new();
        let mut journal = SolveJournal::new();

        loop {
            let touched = self.compute_g();
            if !touched {
                break;
            }

            let best = self.minimal_log_nfa()?;
            let (m, _) = match best {
                Some(b) => b,
                None => break,
            };
            if m > eps {
                journal.push(IterationRecord { touched: true, chosen_log_nfa: None, trajectory_len: None });
                break;
            }

            let (k0, ix, iy, l0) = self.locate_cell(m)?;
            let traj = self.extract_trajectory(m, k0, ix, iy, l0)?;
            journal.push(IterationRecord {
                touched: true,
                chosen_log_nfa: Some(m),
                trajectory_len: Some(traj.steps.len()),
            });
            trajs.push(traj);
        }

        Ok((trajs, journal))
    }

    /// Fills `g` from scratch for the current activation mask. Returns
    /// whether any cell was actually considered (i.e. whether a viable
    /// `(ix, iy, iz)` triple exists at all).
    fn compute_g(&mut self) -> bool {
        self.g.reset();
        let k = self.k;
        let n_max = self.g.n_max;

        let mut touched = false;

        for k0 in 1..k {
            let fx_active: Vec<usize> = self.mask.active_indices(k0).collect();
            let fy_active: Vec<usize> = self.mask.active_indices(k0 - 1).collect();
            let fz_active: Vec<usize> =
                if k0 >= 2 { self.mask.active_indices(k0 - 2).collect() } else { Vec::new() };

            // Every read below (frame data, and g at k0-1) was produced
            // by an earlier, strictly sequential k0 pass, so this
            // immutable borrow of `g` never overlaps the k0-2 writes
            // that happened two iterations ago. Writes for a fixed
            // (k0, ix) never touch another ix's cells, so rows are safe
            // to fill concurrently.
            let seq = self.seq;
            let area = &self.area;
            let g_ref = &self.g;
            let rows: Vec<(usize, Vec<f64>)> = fx_active
                .par_iter()
                .map(|&ix| {
                    let x = seq.frame(k0)[ix];
                    let mut row = vec![f64::INFINITY; n_max * k];
                    for &iy in &fy_active {
                        let y = seq.frame(k0 - 1)[iy];
                        row[iy * k + 1] = 1.0;

                        let m0 = x.0 - 2.0 * y.0;
                        let m1 = x.1 - 2.0 * y.1;

                        for l0 in 2..=k0 {
                            let mut gmin = f64::INFINITY;
                            for &iz in &fz_active {
                                let z = seq.frame(k0 - 2)[iz];
                                let a = area
                                    .a_d(m0 + z.0, m1 + z.1)
                                    .max(g_ref.get(k0 - 1, iy, iz, l0 - 1));
                                if a < gmin {
                                    gmin = a;
                                }
                            }
                            row[iy * k + l0] = gmin;
                        }
                    }
                    (ix, row)
                })
                .collect();

            for (ix, row) in rows {
                self.g.row_mut(k0, ix).copy_from_slice(&row);
            }
            // Only a genuine l>=3 candidate — an active (ix, iy, iz) triple
            // at some k0>=2 — counts as "touched"; a bare active (ix, iy)
            // pair only ever seeds the l=2 base case, which is never itself
            // eligible for NFA scoring.
            if k0 >= 2 && !fz_active.is_empty() && !fy_active.is_empty() && !fx_active.is_empty() {
                touched = true;
            }
        }

        touched
    }

    /// Scans every finite, active cell and returns `(log_NFA, cell)` for
    /// the global minimum, or `None` if no candidate (`l >= 3`) exists.
    fn minimal_log_nfa(&self) -> Result<Option<(f64, (usize, usize, usize, usize))>> {
        let mut best: Option<(f64, (usize, usize, usize, usize))> = None;
        for k0 in 2..self.k {
            for ix in self.mask.active_indices(k0) {
                for iy in self.mask.active_indices(k0 - 1) {
                    for l0 in 2..=k0 {
                        let a = self.g.get(k0, ix, iy, l0);
                        if !a.is_finite() {
                            continue;
                        }
                        let m = log_nfa_noholes(&self.combi, &self.nprod, self.log_image_area, k0, l0 + 1, a)?;
                        if best.map_or(true, |(bm, _)| m < bm) {
                            best = Some((m, (k0, ix, iy, l0)));
                        }
                    }
                }
            }
        }
        Ok(best)
    }

    /// Re-locates a cell matching the chosen minimum `m`, using the same
    /// descending iteration order the original reference implementation
    /// uses for extraction (stable regardless of how the minimum was
    /// first found).
    fn locate_cell(&self, m: f64) -> Result<(usize, usize, usize, usize)> {
        for k0 in (2..self.k).rev() {
            for ix in self.mask.active_indices(k0) {
                for iy in self.mask.active_indices(k0 - 1) {
                    for l0 in (2..=k0).rev() {
                        let a = self.g.get(k0, ix, iy, l0);
                        if !a.is_finite() {
                            continue;
                        }
                        let cur = log_nfa_noholes(&self.combi, &self.nprod, self.log_image_area, k0, l0 + 1, a)?;
                        if (cur - m).abs() < TIE_EPS {
                            return Ok((k0, ix, iy, l0));
                        }
                    }
                }
            }
        }
        Err(AstreError::InvariantViolation(format!(
            "no cell matches the reported minimum log_NFA {}",
            m
        )))
    }

    fn extract_trajectory(&mut self, m: f64, mut k0: usize, mut ix: usize, mut iy: usize, mut l0: usize) -> Result<Trajectory> {
        let mut a_max = self.g.get(k0, ix, iy, l0);
        debug_assert!(l0 >= 2 && k0 >= l0);

        let mut rev_steps = Vec::new();

        while l0 >= 2 {
            rev_steps.push(Step::reference(k0, ix));

            let x = self.seq.frame(k0)[ix];
            let y = self.seq.frame(k0 - 1)[iy];
            let m0 = x.0 - 2.0 * y.0;
            let m1 = x.1 - 2.0 * y.1;

            let mut iz_min = None;
            let mut a_min = f64::INFINITY;
            for iz in self.mask.active_indices(k0 - 2) {
                let z = self.seq.frame(k0 - 2)[iz];
                let a = self.area.a_d(m0 + z.0, m1 + z.1).max(self.g.get(k0 - 1, iy, iz, l0 - 1));
                if a < a_min && a < a_max + TIE_EPS {
                    iz_min = Some(iz);
                    a_min = a;
                }
            }

            let iz = iz_min.ok_or_else(|| {
                AstreError::InvariantViolation(format!(
                    "extractor found no predecessor within a_max+1e-4 at frame {}",
                    k0
                ))
            })?;

            k0 -= 1;
            l0 -= 1;
            ix = iy;
            iy = iz;
            a_max = a_min;
        }

        rev_steps.push(Step::reference(k0, ix));
        rev_steps.push(Step::reference(k0 - 1, iy));

        for step in &rev_steps {
            if let crate::trajectory::StepKind::Ref(i) = step.kind {
                self.mask.deactivate(step.frame_index, i);
            }
        }

        rev_steps.reverse();
        Ok(Trajectory { steps: rev_steps, log_nfa: m })
    }

    pub fn mask(&self) -> &ActivationMask {
        &self.mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use astre_math::PointSequence;

    #[test]
    fn empty_frames_below_threshold_yield_nothing() {
        let seq = PointSequence::new(100, 100, vec![vec![], vec![], vec![]]).unwrap();
        let mut solver = NoholesSolver::new(&seq);
        let (trajs, _) = solver.solve(0.0).unwrap();
        assert!(trajs.is_empty());
    }

    #[test]
    fn a_two_point_pair_with_no_third_frame_does_not_touch_the_dp() {
        // Frame 0 is empty, so (ix, iy) at k0=1 has no k0-2 frame to reach
        // back to: `compute_g` must report untouched even though an
        // active (ix, iy) pair exists, since no l>=3 candidate can ever
        // form from it.
        let seq = PointSequence::new(100, 100, vec![vec![], vec![(10.0, 10.0)], vec![(20.0, 20.0)]]).unwrap();
        let mut solver = NoholesSolver::new(&seq);
        assert!(!solver.compute_g());
        let (trajs, _) = solver.solve(1000.0).unwrap();
        assert!(trajs.is_empty());
    }

    #[test]
    fn single_perfect_line_is_extracted() {
        let seq = PointSequence::new(
            100,
            100,
            vec![vec![(10.0, 10.0)], vec![(20.0, 20.0)], vec![(30.0, 30.0)]],
        )
        .unwrap();
        let mut solver = NoholesSolver::new(&seq);
        let (trajs, _) = solver.solve(0.0).unwrap();
        assert_eq!(trajs.len(), 1);
        let traj = &trajs[0];
        assert_eq!(traj.steps.len(), 3);
        assert_eq!(traj.occupied().collect::<Vec<_>>(), vec![(0, 0), (1, 0), (2, 0)]);
        assert!(traj.log_nfa <= 0.0);
    }

    #[test]
    fn two_competing_lines_are_both_extracted_disjointly() {
        let seq = PointSequence::new(
            100,
            100,
            vec![
                vec![(10.0, 10.0), (50.0, 50.0)],
                vec![(20.0, 20.0), (60.0, 60.0)],
                vec![(30.0, 30.0), (70.0, 70.0)],
            ],
        )
        .unwrap();
        let mut solver = NoholesSolver::new(&seq);
        let (trajs, _) = solver.solve(0.0).unwrap();
        assert_eq!(trajs.len(), 2);

        let mut seen = std::collections::HashSet::new();
        for t in &trajs {
            for pair in t.occupied() {
                assert!(seen.insert(pair), "point {:?} used by more than one trajectory", pair);
            }
        }
    }

    #[test]
    fn emission_order_is_nondecreasing_in_log_nfa() {
        let seq = PointSequence::new(
            200,
            200,
            vec![
                vec![(10.0, 10.0), (150.0, 20.0)],
                vec![(20.0, 20.0), (140.0, 45.0)],
                vec![(30.0, 30.0), (130.0, 15.0)],
            ],
        )
        .unwrap();
        let mut solver = NoholesSolver::new(&seq);
        let (trajs, _) = solver.solve(0.0).unwrap();
        let mut last = f64::NEG_INFINITY;
        for t in &trajs {
            assert!(t.log_nfa + TIE_EPS >= last);
            last = t.log_nfa;
        }
    }

    #[test]
    fn reextraction_after_deactivation_yields_nothing_new() {
        let seq = PointSequence::new(
            100,
            100,
            vec![
                vec![(10.0, 10.0), (50.0, 50.0)],
                vec![(20.0, 20.0), (60.0, 60.0)],
                vec![(30.0, 30.0), (70.0, 70.0)],
            ],
        )
        .unwrap();
        let mut solver = NoholesSolver::new(&seq);
        let (first, _) = solver.solve(0.0).unwrap();
        assert_eq!(first.len(), 2);
        let (second, _) = solver.solve(0.0).unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn extraction_consistency_recomputes_same_score() {
        let seq = PointSequence::new(
            100,
            100,
            vec![vec![(10.0, 10.0)], vec![(20.0, 20.0)], vec![(30.0, 30.0)]],
        )
        .unwrap();
        let mut solver = NoholesSolver::new(&seq);
        let (trajs, _) = solver.solve(0.0).unwrap();
        let traj = &trajs[0];
        // Recompute log_NFA from scratch using a fresh solver + the same
        // worst acceleration area that produced this trajectory.
        let combi = CombinatoricTables::new(seq.num_frames());
        let nprod = NoholesNprod::new(&seq);
        let recomputed = log_nfa_noholes(&combi, &nprod, seq.image_area().log10(), 2, 3, 1.0).unwrap();
        assert!((recomputed - traj.log_nfa).abs() < 1e-4);
    }
}
