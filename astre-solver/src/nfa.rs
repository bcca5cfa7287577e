//! Number-of-false-alarms scoring (§4.3).
//!
//! Both `log_nprod` tables and both `log_NFA` formulas are ported
//! directly from `NoholesSolver`/`HolesSolver` in
//! `astre_naive.py`; see the module doc comments on `noholes` and
//! `holes` for how they're consumed.

use astre_math::{AstreError, CombinatoricTables, PointSequence, Result};

/// `log_nprod[k0, l0] = sum_{j=k0-l0..=k0} log10(N_j)`, the noholes
/// product of per-frame point counts over a trajectory's frames.
#[derive(Debug, Clone)]
pub struct NoholesNprod {
    k: usize,
    table: Vec<f64>,
}

impl NoholesNprod {
    pub fn new(seq: &PointSequence) -> Self {
        let k = seq.num_frames();
        let mut table = vec![0.0_f64; k * k];
        for k0 in 0..k {
            let log_n_k0 = (seq.frame_len(k0) as f64).log10();
            for l0 in 0..=k0 {
                table[k0 * k + l0] = if l0 == 0 {
                    log_n_k0
                } else {
                    log_n_k0 + table[(k0 - 1) * k + (l0 - 1)]
                };
            }
        }
        Self { k, table }
    }

    pub fn get(&self, k0: usize, l0: usize) -> f64 {
        self.table[k0 * self.k + l0]
    }
}

/// `log10(NFA)` for a noholes trajectory ending at frame `k0`, of length
/// `l`, with worst discrete acceleration area `a` (§4.3.1).
pub fn log_nfa_noholes(
    combi: &CombinatoricTables,
    nprod: &NoholesNprod,
    log_image_area: f64,
    k0: usize,
    l: usize,
    a: f64,
) -> Result<f64> {
    if a.is_nan() {
        return Err(AstreError::InvariantViolation(format!(
            "log_NFA received a NaN acceleration area at frame {}, length {}",
            k0, l
        )));
    }
    let k_max = combi.k_max();
    let l0 = l - 1;
    Ok(combi.log_k(k_max) + combi.log_k(k_max - l + 1) + nprod.get(k0, l0)
        + (l as f64 - 2.0) * (a.log10() - log_image_area))
}

/// `log_nprod[k0, l0, s0]` for the holes solver: `log10(N_{k0-l0})` plus
/// `log10(N_{k0})` plus the sum of the top `s0-1` per-frame log-counts
/// strictly between them (§4.3.2).
#[derive(Debug, Clone)]
pub struct HolesNprod {
    k: usize,
    table: Vec<f64>,
}

impl HolesNprod {
    pub fn new(seq: &PointSequence) -> Self {
        let k = seq.num_frames();
        let log_n: Vec<f64> = (0..k).map(|i| (seq.frame_len(i) as f64).log10()).collect();
        let mut table = vec![f64::NEG_INFINITY; k * k * k];

        for k0 in 0..k {
            for l0 in 0..=k0 {
                let lo = k0 - l0 + 1;
                let mut middle: Vec<f64> = if lo < k0 { log_n[lo..k0].to_vec() } else { Vec::new() };
                middle.sort_by(|a, b| b.partial_cmp(a).expect("log-count is never NaN"));

                for s0 in 0..=l0 {
                    let idx = (k0 * k + l0) * k + s0;
                    table[idx] = if s0 == 0 {
                        f64::NEG_INFINITY
                    } else {
                        let take = (s0 - 1).min(middle.len());
                        let log_max_prod: f64 = middle[..take].iter().sum();
                        log_n[k0] + log_n[k0 - l0] + log_max_prod
                    };
                }
            }
        }

        Self { k, table }
    }

    pub fn get(&self, k0: usize, l0: usize, s0: usize) -> f64 {
        self.table[(k0 * self.k + l0) * self.k + s0]
    }
}

/// `log10(NFA)` for a holes trajectory ending at frame `k0`, of span `l`,
/// size `s`, and `p` runs, with worst discrete acceleration area `a`
/// (§4.3.2).
#[allow(clippy::too_many_arguments)]
pub fn log_nfa_holes(
    combi: &CombinatoricTables,
    nprod: &HolesNprod,
    log_image_area: f64,
    k0: usize,
    l: usize,
    s: usize,
    p: usize,
    a: f64,
) -> Result<f64> {
    if a.is_nan() {
        return Err(AstreError::InvariantViolation(format!(
            "log_NFA received a NaN acceleration area at frame {}, span {}, size {}",
            k0, l, s
        )));
    }
    let k_max = combi.k_max();
    let l0 = l - 1;
    let s0 = s - 1;

    let hole_factor = if p > 1 {
        (2.0 * p as f64 - 2.0) * (((l as f64 - s as f64) / (p as f64 - 1.0) + 1.0).log10())
    } else {
        0.0
    };

    Ok(combi.log_k(k_max) + combi.log_k(k_max - l + 1) + combi.log_k(l) + combi.log_cnk(l, s)
        + nprod.get(k0, l0, s0)
        + (s as f64 - 2.0) * (a.log10() - log_image_area)
        + hole_factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(frames: Vec<Vec<(f64, f64)>>) -> PointSequence {
        PointSequence::new(100, 100, frames).unwrap()
    }

    #[test]
    fn noholes_nprod_matches_direct_product() {
        let s = seq(vec![vec![(0.0, 0.0); 2], vec![(0.0, 0.0); 3], vec![(0.0, 0.0); 1]]);
        let nprod = NoholesNprod::new(&s);
        // k0=2, l0=2: frames 0,1,2 => 2*3*1
        let got = 10f64.powf(nprod.get(2, 2));
        assert!((got - 6.0).abs() / 6.0 < 1e-9);
    }

    #[test]
    fn holes_nprod_s0_zero_is_neg_infinity() {
        let s = seq(vec![vec![(0.0, 0.0); 2], vec![], vec![(0.0, 0.0); 1]]);
        let nprod = HolesNprod::new(&s);
        assert_eq!(nprod.get(2, 2, 0), f64::NEG_INFINITY);
    }

    #[test]
    fn nan_area_is_an_invariant_violation() {
        let s = seq(vec![vec![(0.0, 0.0); 2], vec![(0.0, 0.0); 2], vec![(0.0, 0.0); 2]]);
        let combi = CombinatoricTables::new(s.num_frames());
        let nprod = NoholesNprod::new(&s);
        let err = log_nfa_noholes(&combi, &nprod, s.image_area().log10(), 2, 3, f64::NAN).unwrap_err();
        assert!(matches!(err, AstreError::InvariantViolation(_)));
    }
}
