//! NaN-aware sample moments over the leading axis of a sample cube.
//!
//! Conventions:
//! - Input cubes are `samples × rows × cols`; every statistic reduces axis 0
//!   and returns a `rows × cols` grid.
//! - Non-finite samples (NaN, ±∞) are ignored.
//! - Variances are population variances (divisor = number of valid samples).
//! - A pixel with no valid sample has `count = 0` and NaN moments.
use ndarray::{Array2, ArrayView1, ArrayView3, Axis, Zip};

/// Per-pixel summary of one lane of samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneMoments {
    /// Number of finite samples.
    pub count: usize,
    /// Mean of finite samples (NaN when `count == 0`).
    pub mean: f64,
    /// Population variance of finite samples (NaN when `count == 0`).
    pub variance: f64,
    /// Number of finite samples `<= 0`.
    pub non_positive: usize,
}

impl LaneMoments {
    /// Two-pass moments of a single lane.
    pub fn from_lane(lane: ArrayView1<f64>) -> Self {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut non_positive = 0usize;
        for &v in lane.iter().filter(|v| v.is_finite()) {
            count += 1;
            sum += v;
            if v <= 0.0 {
                non_positive += 1;
            }
        }
        if count == 0 {
            return LaneMoments { count, mean: f64::NAN, variance: f64::NAN, non_positive };
        }

        let n = count as f64;
        let mean = sum / n;
        let ss: f64 = lane.iter().filter(|v| v.is_finite()).map(|&v| (v - mean) * (v - mean)).sum();
        LaneMoments { count, mean, variance: ss / n, non_positive }
    }

    /// Population standard deviation.
    pub fn std(&self) -> f64 {
        self.variance.sqrt()
    }
}

/// Moments of every `(row, col)` lane along axis 0.
pub fn lane_moments(samples: ArrayView3<f64>) -> Array2<LaneMoments> {
    Zip::from(samples.lanes(Axis(0))).map_collect(LaneMoments::from_lane)
}
