//! Closed-form kernels and the geometry used to emulate circular fields.
//!
//! A circular field is fed into ordinary (non-wrapping) convolution by first
//! materializing an "extended" vector: the field prefixed/suffixed with its
//! own wrapped tail, gathered through a precomputed index table. Convolving
//! that in VALID mode is equivalent to circular convolution of the field.

/// Symmetric truncation support of a kernel, in taps left/right of center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KernelRange {
    pub lower: usize,
    pub upper: usize,
}

impl KernelRange {
    /// Number of taps in a kernel spanning this range.
    pub fn extent(&self) -> usize {
        self.lower + self.upper + 1
    }
}

/// Support radius beyond which a kernel of the given width is truncated.
///
/// The raw radius is `ceil(width * cutoff_factor)`; circular fields clamp it
/// so the extended vector never wraps more than once.
pub fn compute_kernel_range(
    width: f64,
    cutoff_factor: f64,
    field_size: usize,
    circular: bool,
) -> KernelRange {
    let radius = (width.abs() * cutoff_factor).ceil() as usize;
    if circular {
        KernelRange {
            lower: radius.min(field_size.saturating_sub(1) / 2),
            upper: radius.min(field_size / 2),
        }
    } else {
        let cap = field_size.saturating_sub(1);
        KernelRange {
            lower: radius.min(cap),
            upper: radius.min(cap),
        }
    }
}

/// Index table mapping extended-buffer positions back into the field.
///
/// Length is `field_size + lower + upper`; entry `p` refers to field position
/// `(p - lower) mod field_size`.
pub fn create_extended_index(field_size: usize, range: KernelRange) -> Vec<usize> {
    if field_size == 0 {
        return Vec::new();
    }
    let len = field_size + range.lower + range.upper;
    let mut index = Vec::with_capacity(len);
    for p in 0..len {
        let shifted = p as isize - range.lower as isize;
        index.push(shifted.rem_euclid(field_size as isize) as usize);
    }
    index
}

/// Materialize the extended vector by gathering `src` through `index`.
/// Entries pointing outside `src` contribute 0 (can only happen if the table
/// was built for a different field size).
pub fn gather_extended(index: &[usize], src: &[f64]) -> Vec<f64> {
    index
        .iter()
        .map(|&i| src.get(i).copied().unwrap_or(0.0))
        .collect()
}

/// Unnormalized Gaussian over integer offsets.
pub fn gauss(range: impl Iterator<Item = i64>, mean: f64, sigma: f64) -> Vec<f64> {
    if sigma == 0.0 {
        return range.map(|x| if x as f64 == mean { 1.0 } else { 0.0 }).collect();
    }
    let inv = 1.0 / (2.0 * sigma * sigma);
    range
        .map(|x| {
            let d = x as f64 - mean;
            (-d * d * inv).exp()
        })
        .collect()
}

/// Gaussian normalized so the taps sum to 1.
pub fn gauss_norm(range: impl Iterator<Item = i64>, mean: f64, sigma: f64) -> Vec<f64> {
    let mut g = gauss(range, mean, sigma);
    let sum: f64 = g.iter().sum();
    if sum != 0.0 {
        for v in &mut g {
            *v /= sum;
        }
    }
    g
}

/// Gaussian over a circular domain of `size` positions, centered at
/// `position`, using wrap-around distance.
pub fn circular_gauss(size: usize, sigma: f64, position: f64) -> Vec<f64> {
    if size == 0 {
        return Vec::new();
    }
    if sigma == 0.0 {
        let mut g = vec![0.0; size];
        let p = (position.round().rem_euclid(size as f64)) as usize % size;
        g[p] = 1.0;
        return g;
    }
    let n = size as f64;
    let inv = 1.0 / (2.0 * sigma * sigma);
    (0..size)
        .map(|i| {
            let raw = (i as f64 - position).abs() % n;
            let d = raw.min(n - raw);
            (-d * d * inv).exp()
        })
        .collect()
}

#[inline]
pub fn sigmoid(x: f64, steepness: f64, x_shift: f64) -> f64 {
    1.0 / (1.0 + (-steepness * (x - x_shift)).exp())
}

#[inline]
pub fn heaviside(x: f64, threshold: f64) -> f64 {
    if x > threshold {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_range_clamps_for_circular_fields() {
        let r = compute_kernel_range(100.0, 5.0, 10, true);
        assert_eq!(r.lower, 4, "lower clamp is (size-1)/2");
        assert_eq!(r.upper, 5, "upper clamp is size/2");

        let r = compute_kernel_range(100.0, 5.0, 10, false);
        assert_eq!(r, KernelRange { lower: 9, upper: 9 });
    }

    #[test]
    fn kernel_range_narrow_kernel_untouched() {
        let r = compute_kernel_range(2.0, 3.0, 100, true);
        assert_eq!(r, KernelRange { lower: 6, upper: 6 });
    }

    #[test]
    fn extended_index_wraps_both_ends() {
        let index = create_extended_index(5, KernelRange { lower: 2, upper: 2 });
        assert_eq!(index, vec![3, 4, 0, 1, 2, 3, 4, 0, 1]);
    }

    #[test]
    fn gather_reproduces_wrapped_field() {
        let index = create_extended_index(4, KernelRange { lower: 1, upper: 1 });
        let src = [10.0, 20.0, 30.0, 40.0];
        assert_eq!(
            gather_extended(&index, &src),
            vec![40.0, 10.0, 20.0, 30.0, 40.0, 10.0]
        );
    }

    #[test]
    fn gauss_peaks_at_mean_and_is_symmetric() {
        let g = gauss(-3..=3, 0.0, 1.5);
        assert_eq!(g.len(), 7);
        assert!((g[3] - 1.0).abs() < 1e-12);
        for k in 0..3 {
            assert!((g[k] - g[6 - k]).abs() < 1e-12, "asymmetry at offset {}", k);
        }
    }

    #[test]
    fn gauss_norm_sums_to_one() {
        let g = gauss_norm(-10..=10, 0.0, 2.0);
        let sum: f64 = g.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12, "sum was {}", sum);
    }

    #[test]
    fn circular_gauss_uses_wrap_distance() {
        let g = circular_gauss(10, 2.0, 0.0);
        // Position 9 is distance 1 from the center through the wrap.
        assert!((g[9] - g[1]).abs() < 1e-12);
        assert!(g[5] < g[1], "farthest point should be smallest");
    }

    #[test]
    fn activation_functions() {
        assert!((sigmoid(0.0, 1.0, 0.0) - 0.5).abs() < 1e-12);
        assert!(sigmoid(10.0, 4.0, 0.0) > 0.99);
        assert_eq!(heaviside(0.0, 0.0), 0.0, "threshold itself maps to 0");
        assert_eq!(heaviside(0.1, 0.0), 1.0);
    }
}
