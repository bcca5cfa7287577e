//! Log-combinatorial precomputations shared by both solvers.
//!
//! Ported from `pymage.math.combinatorics`. All tables are indexed by
//! plain integers and computed once per solve, up to `K` (the number of
//! frames).

/// `log10(k)`, `log10(k!)`, `ln(k!)` and `log10(C(n,k))` for `0 <= k <= n <= K`.
#[derive(Debug, Clone)]
pub struct CombinatoricTables {
    k_max: usize,
    log_k: Vec<f64>,
    log_kfact: Vec<f64>,
    ln_kfact: Vec<f64>,
    /// Flattened `(k_max+1) x (k_max+1)` grid, row-major by `n`.
    log_cnk: Vec<f64>,
}

impl CombinatoricTables {
    pub fn new(k_max: usize) -> Self {
        let log_k = precompute_log_k(k_max);
        let log_kfact = precompute_log_kfact(k_max);
        let ln_kfact = precompute_ln_kfact(k_max);
        let log_cnk = precompute_log_cnk(k_max, &log_kfact);

        Self { k_max, log_k, log_kfact, ln_kfact, log_cnk }
    }

    /// `log10(k)` for `k = 0..=K`; `log_k(0)` is the sentinel `-1.0` and
    /// must never be consumed as an actual logarithm.
    pub fn log_k(&self, k: usize) -> f64 {
        self.log_k[k]
    }

    /// `log10(k!)` for `k = 0..=K`.
    pub fn log_kfact(&self, k: usize) -> f64 {
        self.log_kfact[k]
    }

    /// `ln(k!)` for `k = 0..=K`.
    pub fn ln_kfact(&self, k: usize) -> f64 {
        self.ln_kfact[k]
    }

    /// `log10(C(n, k))` for `0 <= k <= n <= K`.
    pub fn log_cnk(&self, n: usize, k: usize) -> f64 {
        debug_assert!(k <= n && n <= self.k_max);
        self.log_cnk[n * (self.k_max + 1) + k]
    }

    pub fn k_max(&self) -> usize {
        self.k_max
    }
}

fn precompute_log_k(k_max: usize) -> Vec<f64> {
    let mut store = vec![0.0_f64; k_max + 1];
    store[0] = -1.0;
    for k in 1..=k_max {
        store[k] = (k as f64).log10();
    }
    store
}

fn precompute_log_kfact(k_max: usize) -> Vec<f64> {
    let mut store = vec![0.0_f64; k_max + 1];
    for k in 1..=k_max {
        store[k] = store[k - 1] + (k as f64).log10();
    }
    store
}

fn precompute_ln_kfact(k_max: usize) -> Vec<f64> {
    let mut store = vec![0.0_f64; k_max + 1];
    for k in 1..=k_max {
        store[k] = store[k - 1] + (k as f64).ln();
    }
    store
}

fn precompute_log_cnk(k_max: usize, log_kfact: &[f64]) -> Vec<f64> {
    let width = k_max + 1;
    let mut store = vec![0.0_f64; width * width];
    for n in 0..=k_max {
        for k in 0..=n {
            store[n * width + k] = log_kfact[n] - log_kfact[n - k] - log_kfact[k];
        }
    }
    store
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choose(n: u64, k: u64) -> u64 {
        if k > n {
            return 0;
        }
        let k = k.min(n - k);
        let mut result = 1u64;
        for i in 0..k {
            result = result * (n - i) / (i + 1);
        }
        result
    }

    #[test]
    fn log_k_sentinel() {
        let t = CombinatoricTables::new(5);
        assert_eq!(t.log_k(0), -1.0);
        assert_eq!(t.log_k(1), 0.0);
        assert!((t.log_k(5) - 5f64.log10()).abs() < 1e-12);
    }

    #[test]
    fn log_kfact_matches_factorial() {
        let t = CombinatoricTables::new(6);
        assert_eq!(t.log_kfact(0), 0.0);
        for k in 1..=6 {
            let mut fact = 1.0_f64;
            for i in 1..=k {
                fact *= i as f64;
            }
            assert!((10f64.powf(t.log_kfact(k)) - fact).abs() / fact < 1e-9);
        }
    }

    #[test]
    fn log_cnk_round_trips_to_binomial_coefficient() {
        let k_max = 12;
        let t = CombinatoricTables::new(k_max);
        for n in 0..=k_max {
            for k in 0..=n {
                let want = choose(n as u64, k as u64) as f64;
                let got = 10f64.powf(t.log_cnk(n, k));
                if want == 0.0 {
                    continue;
                }
                assert!((got - want).abs() / want <= 1e-10, "n={} k={} got={} want={}", n, k, got, want);
            }
        }
    }

    #[test]
    fn log_cnk_is_symmetric() {
        let k_max = 9;
        let t = CombinatoricTables::new(k_max);
        for n in 0..=k_max {
            for k in 0..=n {
                assert!((t.log_cnk(n, k) - t.log_cnk(n, n - k)).abs() < 1e-9);
            }
        }
    }
}
