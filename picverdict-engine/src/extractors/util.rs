//! Shared numeric helpers for the signal extractors.

use image::DynamicImage;
use ndarray::Array2;

/// Decode to a grayscale f64 matrix (row-major, values 0-255).
pub fn gray_f64(image: &DynamicImage) -> Array2<f64> {
    let gray = image.to_luma8();
    let (w, h) = gray.dimensions();
    Array2::from_shape_fn((h as usize, w as usize), |(y, x)| {
        f64::from(gray.get_pixel(x as u32, y as u32)[0])
    })
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Pearson correlation between two equal-length samples. Degenerate
/// (constant) samples yield 0.
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    if a.len() < 2 {
        return 0.0;
    }
    let ma = mean(a);
    let mb = mean(b);
    let mut cov = 0.0;
    let mut va = 0.0;
    let mut vb = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        cov += (x - ma) * (y - mb);
        va += (x - ma).powi(2);
        vb += (y - mb).powi(2);
    }
    if va <= f64::EPSILON || vb <= f64::EPSILON {
        return 0.0;
    }
    cov / (va.sqrt() * vb.sqrt())
}

/// 3x3 convolution with zero-padded borders.
pub fn convolve3x3(input: &Array2<f64>, kernel: &[[f64; 3]; 3]) -> Array2<f64> {
    let (h, w) = input.dim();
    let mut out = Array2::zeros((h, w));
    if h < 3 || w < 3 {
        return out;
    }
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (ky, row) in kernel.iter().enumerate() {
                for (kx, &k) in row.iter().enumerate() {
                    let iy = y as isize + ky as isize - 1;
                    let ix = x as isize + kx as isize - 1;
                    if iy >= 0 && ix >= 0 && (iy as usize) < h && (ix as usize) < w {
                        acc += k * input[(iy as usize, ix as usize)];
                    }
                }
            }
            out[(y, x)] = acc;
        }
    }
    out
}

const SOBEL_X: [[f64; 3]; 3] = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const SOBEL_Y: [[f64; 3]; 3] = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

pub const LAPLACIAN: [[f64; 3]; 3] = [[0.0, 1.0, 0.0], [1.0, -4.0, 1.0], [0.0, 1.0, 0.0]];

/// First-order Sobel gradients (gx, gy).
pub fn sobel(input: &Array2<f64>) -> (Array2<f64>, Array2<f64>) {
    (convolve3x3(input, &SOBEL_X), convolve3x3(input, &SOBEL_Y))
}

/// Separable 5-tap Gaussian blur (binomial kernel 1 4 6 4 1 / 16).
pub fn gaussian5(input: &Array2<f64>) -> Array2<f64> {
    const K: [f64; 5] = [1.0 / 16.0, 4.0 / 16.0, 6.0 / 16.0, 4.0 / 16.0, 1.0 / 16.0];
    let (h, w) = input.dim();
    let mut tmp = Array2::zeros((h, w));
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (i, &k) in K.iter().enumerate() {
                let ix = (x as isize + i as isize - 2).clamp(0, w as isize - 1) as usize;
                acc += k * input[(y, ix)];
            }
            tmp[(y, x)] = acc;
        }
    }
    let mut out = Array2::zeros((h, w));
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (i, &k) in K.iter().enumerate() {
                let iy = (y as isize + i as isize - 2).clamp(0, h as isize - 1) as usize;
                acc += k * tmp[(iy, x)];
            }
            out[(y, x)] = acc;
        }
    }
    out
}

/// Mean over a k x k window centered on each pixel, via integral image.
/// Windows are clipped at the borders.
pub fn box_mean(input: &Array2<f64>, k: usize) -> Array2<f64> {
    let (h, w) = input.dim();
    let r = (k / 2) as isize;
    // Integral image with a zero row/column prefix
    let mut integral = Array2::<f64>::zeros((h + 1, w + 1));
    for y in 0..h {
        let mut row_sum = 0.0;
        for x in 0..w {
            row_sum += input[(y, x)];
            integral[(y + 1, x + 1)] = integral[(y, x + 1)] + row_sum;
        }
    }
    let mut out = Array2::zeros((h, w));
    for y in 0..h {
        for x in 0..w {
            let y0 = (y as isize - r).max(0) as usize;
            let x0 = (x as isize - r).max(0) as usize;
            let y1 = ((y as isize + r + 1) as usize).min(h);
            let x1 = ((x as isize + r + 1) as usize).min(w);
            let area = ((y1 - y0) * (x1 - x0)) as f64;
            let sum = integral[(y1, x1)] - integral[(y0, x1)] - integral[(y1, x0)]
                + integral[(y0, x0)];
            out[(y, x)] = sum / area;
        }
    }
    out
}

/// p-th percentile (0-100) by nearest-rank over a sorted copy.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let rank = ((p / 100.0) * (sorted.len() - 1) as f64).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}

/// Fixed-range histogram with `bins` buckets over [lo, hi].
pub fn histogram(values: &[f64], bins: usize, lo: f64, hi: f64) -> Vec<usize> {
    let mut hist = vec![0usize; bins];
    if bins == 0 || hi <= lo {
        return hist;
    }
    let scale = bins as f64 / (hi - lo);
    for &v in values {
        if v < lo || v > hi {
            continue;
        }
        let idx = (((v - lo) * scale) as usize).min(bins - 1);
        hist[idx] += 1;
    }
    hist
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_pearson_perfect_correlation() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [2.0, 4.0, 6.0, 8.0];
        assert!((pearson(&a, &b) - 1.0).abs() < 1e-12);

        let c = [4.0, 3.0, 2.0, 1.0];
        assert!((pearson(&a, &c) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_degenerate_is_zero() {
        let flat = [5.0, 5.0, 5.0];
        let ramp = [1.0, 2.0, 3.0];
        assert_eq!(pearson(&flat, &ramp), 0.0);
    }

    #[test]
    fn test_box_mean_uniform_input() {
        let input = Array2::from_elem((10, 10), 7.0);
        let out = box_mean(&input, 3);
        for &v in out.iter() {
            assert!((v - 7.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_sobel_flat_image_has_zero_gradient() {
        let input = Array2::from_elem((8, 8), 100.0);
        let (gx, gy) = sobel(&input);
        // Interior pixels only; borders see zero padding
        assert_eq!(gx[(4, 4)], 0.0);
        assert_eq!(gy[(4, 4)], 0.0);
    }

    #[test]
    fn test_histogram_counts() {
        let values = [0.0, 0.5, 1.0, 1.5, 2.0];
        let hist = histogram(&values, 2, 0.0, 2.0);
        assert_eq!(hist.iter().sum::<usize>(), 5);
    }

    #[test]
    fn test_convolve_identity_kernel() {
        let input = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
        let identity = [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]];
        let out = convolve3x3(&input, &identity);
        assert_eq!(out[(1, 1)], 5.0);
    }
}
