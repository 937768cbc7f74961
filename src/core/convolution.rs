//! Discrete convolution over row-major buffers.
//!
//! Written generically over two dimensions; the field pipeline uses it with
//! `1 x n` shapes. Circular modes wrap indices modulo the destination extent
//! and skip taps that land outside the source.

/// Row-major `(rows, cols)` shape.
pub type Shape = (usize, usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConvolutionMode {
    /// Output extent `src + kernel - 1`.
    LinearFull,
    /// Output extent equals the source; kernel centered.
    LinearSame,
    /// Output extent `src - kernel + 1`; kernel slides fully inside.
    LinearValid,
    /// Same extent as the source, indices wrapped.
    CircularSame,
    /// Same extent as `LinearFull`, indices wrapped.
    CircularFull,
}

/// Destination shape for a mode, or `None` when it would be empty
/// (VALID with a kernel larger than the source).
pub fn dest_shape(mode: ConvolutionMode, src: Shape, kernel: Shape) -> Option<Shape> {
    let (h_s, w_s) = src;
    let (h_k, w_k) = kernel;
    match mode {
        ConvolutionMode::LinearFull | ConvolutionMode::CircularFull => {
            Some((h_s + h_k - 1, w_s + w_k - 1))
        }
        ConvolutionMode::LinearSame | ConvolutionMode::CircularSame => Some((h_s, w_s)),
        ConvolutionMode::LinearValid => {
            if h_s >= h_k && w_s >= w_k {
                Some((h_s - h_k + 1, w_s - w_k + 1))
            } else {
                None
            }
        }
    }
}

/// Convolve `src` with `kernel`, both row-major with explicit shapes.
/// Returns the row-major destination; empty when the mode yields no output.
pub fn convolve(
    mode: ConvolutionMode,
    src: &[f64],
    src_shape: Shape,
    kernel: &[f64],
    kernel_shape: Shape,
) -> Vec<f64> {
    debug_assert_eq!(src.len(), src_shape.0 * src_shape.1);
    debug_assert_eq!(kernel.len(), kernel_shape.0 * kernel_shape.1);

    let Some((h_dst, w_dst)) = dest_shape(mode, src_shape, kernel_shape) else {
        return Vec::new();
    };
    let (h_s, w_s) = src_shape;
    let (h_k, w_k) = kernel_shape;
    let mut dst = vec![0.0; h_dst * w_dst];

    match mode {
        ConvolutionMode::LinearFull => {
            for i in 0..h_dst {
                let low_k = i.saturating_sub(h_k - 1);
                let high_k = (h_s - 1).min(i);
                for j in 0..w_dst {
                    let low_l = j.saturating_sub(w_k - 1);
                    let high_l = (w_s - 1).min(j);
                    let mut acc = 0.0;
                    for k in low_k..=high_k {
                        for l in low_l..=high_l {
                            acc += src[k * w_s + l] * kernel[(i - k) * w_k + (j - l)];
                        }
                    }
                    dst[i * w_dst + j] = acc;
                }
            }
        }
        ConvolutionMode::LinearSame => {
            // Center offsets: floor((k-1)/2) behind, floor(k/2) ahead.
            let back_h = (h_k - 1) / 2;
            let ahead_h = h_k / 2;
            let back_w = (w_k - 1) / 2;
            let ahead_w = w_k / 2;
            for i in 0..h_dst {
                let low_k = i.saturating_sub(back_h);
                let high_k = (h_s - 1).min(i + ahead_h);
                for j in 0..w_dst {
                    let low_l = j.saturating_sub(back_w);
                    let high_l = (w_s - 1).min(j + ahead_w);
                    let mut acc = 0.0;
                    for k in low_k..=high_k {
                        for l in low_l..=high_l {
                            acc += src[k * w_s + l]
                                * kernel[(i + ahead_h - k) * w_k + (j + ahead_w - l)];
                        }
                    }
                    dst[i * w_dst + j] = acc;
                }
            }
        }
        ConvolutionMode::LinearValid => {
            for i in 0..h_dst {
                for j in 0..w_dst {
                    let mut acc = 0.0;
                    for k in i..=(i + h_k - 1) {
                        for l in j..=(j + w_k - 1) {
                            acc += src[k * w_s + l]
                                * kernel[(i + h_k - 1 - k) * w_k + (j + w_k - 1 - l)];
                        }
                    }
                    dst[i * w_dst + j] = acc;
                }
            }
        }
        ConvolutionMode::CircularSame | ConvolutionMode::CircularFull => {
            // Kernel assumed no larger than the destination extent; taps that
            // wrap outside the source extent are skipped.
            for i in 0..h_dst {
                for j in 0..w_dst {
                    let mut acc = 0.0;
                    for k in 0..h_k {
                        let i_src =
                            (i as isize - k as isize).rem_euclid(h_dst as isize) as usize;
                        if i_src >= h_s {
                            continue;
                        }
                        for l in 0..w_k {
                            let j_src =
                                (j as isize - l as isize).rem_euclid(w_dst as isize) as usize;
                            if j_src >= w_s {
                                continue;
                            }
                            acc += src[i_src * w_s + j_src] * kernel[k * w_k + l];
                        }
                    }
                    dst[i * w_dst + j] = acc;
                }
            }
        }
    }

    dst
}

/// 1-D full convolution.
pub fn conv_full(src: &[f64], kernel: &[f64]) -> Vec<f64> {
    convolve(
        ConvolutionMode::LinearFull,
        src,
        (1, src.len()),
        kernel,
        (1, kernel.len()),
    )
}

/// 1-D same-size convolution.
pub fn conv_same(src: &[f64], kernel: &[f64]) -> Vec<f64> {
    convolve(
        ConvolutionMode::LinearSame,
        src,
        (1, src.len()),
        kernel,
        (1, kernel.len()),
    )
}

/// 1-D valid convolution; empty if the kernel is longer than the source.
pub fn conv_valid(src: &[f64], kernel: &[f64]) -> Vec<f64> {
    convolve(
        ConvolutionMode::LinearValid,
        src,
        (1, src.len()),
        kernel,
        (1, kernel.len()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &[f64], b: &[f64]) {
        assert_eq!(a.len(), b.len(), "length mismatch: {:?} vs {:?}", a, b);
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-12, "{:?} != {:?}", a, b);
        }
    }

    #[test]
    fn same_with_unit_kernel_is_identity() {
        let src = [3.0, -1.0, 0.5, 7.0, 2.0];
        assert_close(&conv_same(&src, &[1.0]), &src);
    }

    #[test]
    fn circular_full_with_unit_impulse_is_identity() {
        let src = [1.0, 0.0, 0.0, 0.0];
        let dst = convolve(
            ConvolutionMode::CircularFull,
            &src,
            (1, 4),
            &[1.0],
            (1, 1),
        );
        assert_close(&dst, &src);
    }

    #[test]
    fn full_matches_hand_computed() {
        // [1,2,3] * [1,1] = [1,3,5,3]
        assert_close(&conv_full(&[1.0, 2.0, 3.0], &[1.0, 1.0]), &[1.0, 3.0, 5.0, 3.0]);
    }

    #[test]
    fn valid_slides_fully_inside() {
        // [1,2,3,4] * [1,1,1] valid = [6,9]
        assert_close(&conv_valid(&[1.0, 2.0, 3.0, 4.0], &[1.0, 1.0, 1.0]), &[6.0, 9.0]);
    }

    #[test]
    fn valid_with_oversized_kernel_is_empty() {
        assert!(conv_valid(&[1.0, 2.0], &[1.0, 1.0, 1.0]).is_empty());
        assert_eq!(
            dest_shape(ConvolutionMode::LinearValid, (1, 2), (1, 3)),
            None
        );
    }

    #[test]
    fn same_centers_even_kernel_forward() {
        // Even kernel: center offset floor(k/2) taps ahead.
        // [1,2,3,4] * [1,1] same = [3,5,7,4]
        assert_close(&conv_same(&[1.0, 2.0, 3.0, 4.0], &[1.0, 1.0]), &[3.0, 5.0, 7.0, 4.0]);
    }

    #[test]
    fn circular_same_wraps_the_boundary() {
        // Shift-by-one kernel [0,0,1] (tap at offset -1 after wrap logic):
        // dst[j] = sum_l src[(j-l) mod n] * k[l] = src[(j-2) mod n]
        let src = [1.0, 2.0, 3.0, 4.0];
        let dst = convolve(
            ConvolutionMode::CircularSame,
            &src,
            (1, 4),
            &[0.0, 0.0, 1.0],
            (1, 3),
        );
        assert_close(&dst, &[3.0, 4.0, 1.0, 2.0]);
    }

    #[test]
    fn two_dimensional_full() {
        // 2x2 ones * 2x2 ones: full is 3x3 with center 4.
        let src = [1.0; 4];
        let kernel = [1.0; 4];
        let dst = convolve(ConvolutionMode::LinearFull, &src, (2, 2), &kernel, (2, 2));
        assert_close(&dst, &[1.0, 2.0, 1.0, 2.0, 4.0, 2.0, 1.0, 2.0, 1.0]);
    }

    #[test]
    fn extended_gather_plus_valid_centers_circular_smoothing() {
        use crate::mathtools::{create_extended_index, gather_extended, KernelRange};

        let src = [0.2, 1.0, -0.4, 0.7, 0.1, 0.9];
        let kernel = [0.25, 0.5, 0.25];
        let range = KernelRange { lower: 1, upper: 1 };

        let index = create_extended_index(src.len(), range);
        let extended = gather_extended(&index, &src);
        let via_gather = conv_valid(&extended, &kernel);

        let n = src.len();
        let expected: Vec<f64> = (0..n)
            .map(|i| 0.25 * src[(i + n - 1) % n] + 0.5 * src[i] + 0.25 * src[(i + 1) % n])
            .collect();
        assert_close(&via_gather, &expected);
    }
}
