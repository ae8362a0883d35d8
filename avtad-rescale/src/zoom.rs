//! Resampling of snips onto a common grid.
//!
//! Shrinking happens in two steps: the snip is first interpolated onto a grid
//! that is an integer multiple of the target, then averaged block by block.
//! Enlarging interpolates directly. With `preserve_sum` the result is divided
//! by the area ratio, so total intensity rather than pixel density is kept.
//!
//! Interpolation uses centered B-spline kernels of degree `order`
//! (0 = nearest, 1 = linear, 2..=5 higher-order splines). For orders 2 and up
//! the samples are first turned into spline coefficients by a recursive
//! prefilter with mirror boundaries, so the spline passes through every
//! sample. Non-finite samples split a line into runs that are prefiltered
//! separately. They are left out of every weighted sum and the remaining
//! weights are renormalized; a cell whose support holds no finite sample
//! stays NaN.

use ndarray::{Array2, ArrayView2, Axis};

use crate::errors::{RescaleError, Result};

pub const MAX_ORDER: usize = 5;

///
/// Target grid and interpolation settings shared by every snip of a run.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RescaleParams {
    pub shape: (usize, usize),
    pub preserve_sum: bool,
    pub order: usize,
}

impl RescaleParams {
    pub fn square(size: usize, preserve_sum: bool, order: usize) -> Self {
        RescaleParams {
            shape: (size, size),
            preserve_sum,
            order,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.order > MAX_ORDER {
            return Err(RescaleError::InvalidOrder(self.order));
        }
        if self.shape.0 == 0 || self.shape.1 == 0 {
            return Err(RescaleError::InvalidShape(self.shape.0, self.shape.1));
        }
        Ok(())
    }
}

fn factorial(n: usize) -> f64 {
    (1..=n).map(|k| k as f64).product()
}

/// Centered B-spline of the given degree (degree >= 1).
fn bspline(degree: usize, x: f64) -> f64 {
    let half = (degree as f64 + 1.0) / 2.0;
    if x.abs() >= half {
        return 0.0;
    }

    let mut acc = 0.0;
    let mut binom = 1.0;
    for k in 0..=degree + 1 {
        let t = x + half - k as f64;
        if t > 0.0 {
            let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
            acc += sign * binom * t.powi(degree as i32);
        }
        binom = binom * (degree + 1 - k) as f64 / (k + 1) as f64;
    }
    acc / factorial(degree)
}

/// Poles of the recursive prefilter that turns samples into B-spline coefficients.
fn spline_poles(degree: usize) -> Vec<f64> {
    match degree {
        2 => vec![8f64.sqrt() - 3.0],
        3 => vec![3f64.sqrt() - 2.0],
        4 => vec![
            (664.0 - 438976f64.sqrt()).sqrt() + 304f64.sqrt() - 19.0,
            (664.0 + 438976f64.sqrt()).sqrt() - 304f64.sqrt() - 19.0,
        ],
        5 => vec![
            (135.0 / 2.0 - (17745.0f64 / 4.0).sqrt()).sqrt() + (105.0f64 / 4.0).sqrt() - 13.0 / 2.0,
            (135.0 / 2.0 + (17745.0f64 / 4.0).sqrt()).sqrt() - (105.0f64 / 4.0).sqrt() - 13.0 / 2.0,
        ],
        _ => Vec::new(),
    }
}

/// Causal initial value for a mirror-symmetric extension of `c`.
fn initial_causal(c: &[f64], z: f64) -> f64 {
    let n = c.len();
    let iz = 1.0 / z;
    let mut zn = z;
    let mut z2n = z.powi(n as i32 - 1);
    let mut sum = c[0] + z2n * c[n - 1];
    z2n *= z2n * iz;
    for &v in &c[1..n - 1] {
        sum += (zn + z2n) * v;
        zn *= z;
        z2n *= iz;
    }
    sum / (1.0 - zn * zn)
}

/// Anti-causal initial value for a mirror-symmetric extension of `c`.
fn initial_anticausal(c: &[f64], z: f64) -> f64 {
    let n = c.len();
    (z / (z * z - 1.0)) * (z * c[n - 2] + c[n - 1])
}

/// Replace one run of finite samples by its B-spline coefficients, in place.
fn prefilter_run(c: &mut [f64], poles: &[f64]) {
    let n = c.len();
    if n < 2 {
        return;
    }
    let gain: f64 = poles.iter().map(|&z| (1.0 - z) * (1.0 - 1.0 / z)).product();
    c.iter_mut().for_each(|v| *v *= gain);

    for &z in poles {
        c[0] = initial_causal(c, z);
        for k in 1..n {
            c[k] += z * c[k - 1];
        }
        c[n - 1] = initial_anticausal(c, z);
        for k in (0..n - 1).rev() {
            c[k] = z * (c[k + 1] - c[k]);
        }
    }
}

/// Prefilter every line of one axis; non-finite samples stay in place and
/// bound the runs around them.
fn prefilter_lines(data: &mut Array2<f64>, axis: Axis, poles: &[f64]) {
    for mut lane in data.lanes_mut(axis) {
        let mut line: Vec<f64> = lane.iter().copied().collect();
        let mut start = 0;
        while start < line.len() {
            if !line[start].is_finite() {
                start += 1;
                continue;
            }
            let end = line[start..]
                .iter()
                .position(|v| !v.is_finite())
                .map_or(line.len(), |p| start + p);
            prefilter_run(&mut line[start..end], poles);
            start = end;
        }
        lane.iter_mut().zip(line).for_each(|(dst, v)| *dst = v);
    }
}

/// B-spline coefficients of `input` along both axes.
fn spline_coefficients(input: ArrayView2<'_, f64>, order: usize) -> Array2<f64> {
    let mut coeffs = input.to_owned();
    let poles = spline_poles(order);
    if !poles.is_empty() {
        prefilter_lines(&mut coeffs, Axis(1), &poles);
        prefilter_lines(&mut coeffs, Axis(0), &poles);
    }
    coeffs
}

/// Fold an index outside `0..n` back in by whole-sample mirroring.
fn mirror(p: i64, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let period = 2 * (n as i64 - 1);
    let m = p.rem_euclid(period);
    (if m > n as i64 - 1 { period - m } else { m }) as usize
}

/// Input samples and kernel weights contributing to each output position.
fn axis_weights(n_in: usize, n_out: usize, order: usize) -> Vec<Vec<(usize, f64)>> {
    let step = if n_out > 1 {
        (n_in - 1) as f64 / (n_out - 1) as f64
    } else {
        0.0
    };
    let last = (n_in - 1) as i64;

    (0..n_out)
        .map(|i| {
            let x = i as f64 * step;
            if order == 0 {
                return vec![((x.round() as i64).clamp(0, last) as usize, 1.0)];
            }
            let half = (order as f64 + 1.0) / 2.0;
            let lo = (x - half).ceil() as i64;
            let hi = (x + half).floor() as i64;
            (lo..=hi)
                .filter_map(|p| {
                    let w = bspline(order, x - p as f64);
                    (w > 0.0).then_some((mirror(p, n_in), w))
                })
                .collect()
        })
        .collect()
}

///
/// Interpolate `input` onto `shape`, skipping non-finite samples.
fn interpolate(input: ArrayView2<'_, f64>, shape: (usize, usize), order: usize) -> Array2<f64> {
    let (rows, cols) = input.dim();
    let row_weights = axis_weights(rows, shape.0, order);
    let col_weights = axis_weights(cols, shape.1, order);
    let coeffs = spline_coefficients(input, order);

    Array2::from_shape_fn(shape, |(i, j)| {
        let mut acc = 0.0;
        let mut total = 0.0;
        for &(p, wp) in &row_weights[i] {
            for &(q, wq) in &col_weights[j] {
                let v = coeffs[(p, q)];
                if v.is_finite() {
                    acc += wp * wq * v;
                    total += wp * wq;
                }
            }
        }
        if total > 0.0 { acc / total } else { f64::NAN }
    })
}

/// NaN-aware mean over non-overlapping `mr x mc` blocks.
fn block_mean(input: &Array2<f64>, mr: usize, mc: usize) -> Array2<f64> {
    let (rows, cols) = input.dim();
    Array2::from_shape_fn((rows / mr, cols / mc), |(i, j)| {
        let mut sum = 0.0;
        let mut count = 0usize;
        for p in i * mr..(i + 1) * mr {
            for q in j * mc..(j + 1) * mc {
                let v = input[(p, q)];
                if v.is_finite() {
                    sum += v;
                    count += 1;
                }
            }
        }
        if count > 0 { sum / count as f64 } else { f64::NAN }
    })
}

/// Integer oversampling factor used when shrinking an axis.
fn multiplier(n_in: usize, n_out: usize) -> usize {
    if n_out < n_in { n_in.div_ceil(n_out) } else { 1 }
}

///
/// Resample one snip onto `params.shape`.
///
/// # Arguments
/// - snip: matrix of any size; empty snips give an all-NaN result
/// - params: target shape, sum preservation and interpolation order
pub fn rescale(snip: ArrayView2<'_, f64>, params: &RescaleParams) -> Result<Array2<f64>> {
    params.validate()?;
    let (rows, cols) = snip.dim();
    let shape = params.shape;
    if rows == 0 || cols == 0 {
        return Ok(Array2::from_elem(shape, f64::NAN));
    }

    let mr = multiplier(rows, shape.0);
    let mc = multiplier(cols, shape.1);

    let oversampled = interpolate(snip, (shape.0 * mr, shape.1 * mc), params.order);
    let mut rescaled = if mr == 1 && mc == 1 {
        oversampled
    } else {
        block_mean(&oversampled, mr, mc)
    };

    if params.preserve_sum {
        let area_ratio = (shape.0 * shape.1) as f64 / (rows * cols) as f64;
        rescaled.mapv_inplace(|v| v / area_ratio);
    }
    Ok(rescaled)
}
