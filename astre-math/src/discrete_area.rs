//! Discrete pixel-area table.
//!
//! Replaces the continuous disk area `pi * r^2` by an integer pixel count
//! for small radii, where a continuous formula would misrepresent how many
//! pixels an acceleration vector of sub-pixel magnitude actually covers.
//! Ported from `pymage.utils.discrete_area.DiscreteArea`.

/// Radius, in pixels, used by the CLI and by every default solver setup.
pub const DEFAULT_MAX_R: usize = 50;

/// Two pixels are considered to lie on the same concentric layer when
/// their euclidean radii differ by less than this.
const LAYER_EPS: f64 = 1e-3;

/// A precomputed table of `area(x, y)`, the integer pixel count of a disk
/// of euclidean radius `sqrt(x^2 + y^2)`, for integer offsets up to
/// `max_r`. Ties at equal radius share the same area (§4.1).
#[derive(Debug, Clone)]
pub struct DiscreteArea {
    max_r: usize,
    max_r_sq: f64,
    width: usize,
    data: Vec<f64>,
}

impl DiscreteArea {
    /// Builds the table for offsets `0..=max_r`. `max_r` must be positive.
    pub fn new(max_r: usize) -> Self {
        assert!(max_r > 0, "max_r must be positive");
        let width = max_r + 1;
        let mut data = vec![0.0_f64; width * width];

        // One octant: 0 <= y <= x <= max_r, truncated to radius <= max_r.
        let mut pixels: Vec<(usize, usize, f64)> = Vec::new();
        for x in 0..width {
            for y in 0..=x {
                let r = ((x * x + y * y) as f64).sqrt();
                if r <= max_r as f64 {
                    pixels.push((x, y, r));
                }
            }
        }
        pixels.sort_by(|a, b| a.2.partial_cmp(&b.2).expect("radius is never NaN"));

        let mut cur_area = 0.0_f64;
        let mut i = 0;
        while i < pixels.len() {
            let cur_radius = pixels[i].2;
            let mut j = i;
            while j + 1 < pixels.len() && pixels[j + 1].2 - cur_radius < LAYER_EPS {
                j += 1;
            }

            // Octant multiplicity: the center counts once, axis/diagonal
            // pixels are shared by 4 octants, interior pixels by 8.
            for &(px, py, _) in &pixels[i..=j] {
                cur_area += if px == 0 && py == 0 {
                    1.0
                } else if py == 0 || py == px {
                    4.0
                } else {
                    8.0
                };
            }
            for &(px, py, _) in &pixels[i..=j] {
                data[px * width + py] = cur_area;
                data[py * width + px] = cur_area;
            }

            i = j + 1;
        }

        Self { max_r, max_r_sq: (max_r * max_r) as f64, width, data }
    }

    /// `area(x, y)`: the discrete disk area for real offsets `(x, y)`.
    /// Falls back to the continuous `pi * (x^2+y^2)` formula beyond `max_r`.
    pub fn area(&self, x: f64, y: f64) -> f64 {
        let d_sq = x * x + y * y;
        if d_sq > self.max_r_sq {
            std::f64::consts::PI * d_sq
        } else {
            let ix = (x.abs().floor() as usize).min(self.max_r);
            let iy = (y.abs().floor() as usize).min(self.max_r);
            self.data[ix * self.width + iy]
        }
    }

    /// The public `a_d` helper: rounds `(x, y)` to the nearest pixel before
    /// querying `area`.
    pub fn a_d(&self, x: f64, y: f64) -> f64 {
        let ix = x.abs() + 0.5;
        let iy = y.abs() + 0.5;
        self.area(ix.floor(), iy.floor())
    }

    pub fn max_r(&self) -> usize {
        self.max_r
    }
}

impl Default for DiscreteArea {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_R)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetric_and_non_decreasing_by_radius() {
        let area = DiscreteArea::new(20);
        for x in 0..=20 {
            for y in 0..=20 {
                assert_eq!(area.area(x as f64, y as f64), area.area(y as f64, x as f64));
            }
        }

        let mut offsets: Vec<(usize, usize)> = Vec::new();
        for x in 0..=20 {
            for y in 0..=20 {
                offsets.push((x, y));
            }
        }
        offsets.sort_by(|a, b| {
            let ra = (a.0 * a.0 + a.1 * a.1) as f64;
            let rb = (b.0 * b.0 + b.1 * b.1) as f64;
            ra.partial_cmp(&rb).unwrap()
        });
        let mut prev = 0.0;
        for (x, y) in offsets {
            let a = area.area(x as f64, y as f64);
            assert!(a >= prev - 1e-9);
            prev = a;
        }
    }

    #[test]
    fn origin_is_a_single_pixel() {
        let area = DiscreteArea::new(10);
        assert_eq!(area.area(0.0, 0.0), 1.0);
    }

    #[test]
    fn continuous_fallback_beyond_max_r() {
        let area = DiscreteArea::new(5);
        let got = area.area(100.0, 0.0);
        let want = std::f64::consts::PI * 100.0 * 100.0;
        assert!((got - want).abs() < 1e-9);
    }

    #[test]
    fn a_d_rounds_to_nearest_pixel() {
        let area = DiscreteArea::new(10);
        assert_eq!(area.a_d(-1.2, 0.9), area.area(1.0, 1.0));
    }
}
