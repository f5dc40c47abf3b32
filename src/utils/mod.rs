//! Small statistics helpers shared by the binning, sampling and rendering code.

use ndarray::ArrayView1;

/// Sample quantile with linear interpolation between order statistics
/// (the "type 7" definition). `sorted` must be ascending and non-empty.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let q = q.clamp(0.0, 1.0);
    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

/// Returns a sorted copy of the values, NaNs excluded.
pub fn sorted_values(values: ArrayView1<f64>) -> Vec<f64> {
    let mut v: Vec<f64> = values.iter().copied().filter(|x| !x.is_nan()).collect();
    v.sort_by(|a, b| a.total_cmp(b));
    v
}

/// Mean and sample standard deviation (n - 1). A single value has sd 0.
pub fn mean_std(values: ArrayView1<f64>) -> (f64, f64) {
    let n = values.len();
    if n == 0 {
        return (0.0, 0.0);
    }
    let mean = values.sum() / n as f64;
    if n == 1 {
        return (mean, 0.0);
    }
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (mean, (ss / (n - 1) as f64).sqrt())
}

/// Minimum, lower quartile, median, upper quartile, maximum.
pub fn five_number(values: ArrayView1<f64>) -> Option<[f64; 5]> {
    let sorted = sorted_values(values);
    if sorted.is_empty() {
        return None;
    }
    Some([
        sorted[0],
        quantile_sorted(&sorted, 0.25),
        quantile_sorted(&sorted, 0.5),
        quantile_sorted(&sorted, 0.75),
        sorted[sorted.len() - 1],
    ])
}
