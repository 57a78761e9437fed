//! Stroke resampler (§6 "External interfaces", external collaborator).
//!
//! Reads a stroke's spline and produces a new [`Spline`] resampled at a
//! fixed arc-length step, evaluated with a Catmull-Rom curve through the
//! existing control points. Read-only: this crate never reaches back
//! into an `InkModel`'s triples, trees, or sensor-data repository, and
//! never mutates anything in place.

use thiserror::Error;
use uim_model::ink::{LayoutMask, Spline, Stroke};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResampleError {
    #[error("resample step must be positive, got {0}")]
    NonPositiveStep(f64),
    #[error("spline is malformed: {0}")]
    MalformedSpline(String),
}

/// Resamples `stroke`'s spline at a fixed arc-length `step`, in the
/// stroke's own coordinate units. Every column the layout mask carries —
/// not just X/Y — is interpolated along the same curve parameter, so
/// size/color/rotation/etc. vary smoothly across the new points too.
pub fn resample_stroke(stroke: &Stroke, step: f64) -> Result<Spline, ResampleError> {
    resample_spline(&stroke.spline, step)
}

/// Resamples `spline` at a fixed arc-length `step` (§6 "Resampler").
pub fn resample_spline(spline: &Spline, step: f64) -> Result<Spline, ResampleError> {
    if !(step > 0.0) {
        return Err(ResampleError::NonPositiveStep(step));
    }
    spline
        .validate()
        .map_err(|err| ResampleError::MalformedSpline(err.to_string()))?;

    let row_len = spline.layout_mask.stride();
    let point_count = spline.point_count();
    if point_count < 2 {
        return Ok(spline.clone());
    }
    let position_dims = if spline.layout_mask.contains(LayoutMask::Z) { 3 } else { 2 };

    let rows: Vec<&[f32]> = (0..point_count)
        .map(|i| spline.point(i).expect("index within point_count"))
        .collect();

    let mut cumulative = vec![0.0f64; point_count];
    for i in 1..point_count {
        let distance = euclidean_distance(rows[i - 1], rows[i], position_dims);
        cumulative[i] = cumulative[i - 1] + distance;
    }
    let total_length = cumulative[point_count - 1];

    if total_length == 0.0 {
        return Ok(spline.clone());
    }

    let sample_count = (total_length / step).floor() as usize;
    let mut values = Vec::with_capacity((sample_count + 1) * row_len);

    for sample in 0..=sample_count {
        let target = (sample as f64 * step).min(total_length);
        let segment = cumulative
            .windows(2)
            .position(|w| target >= w[0] && target <= w[1])
            .unwrap_or(point_count.saturating_sub(2));
        let (lo, hi) = (cumulative[segment], cumulative[segment + 1]);
        let local_t = if hi > lo { (target - lo) / (hi - lo) } else { 0.0 };

        let p0 = rows[segment.saturating_sub(1)];
        let p1 = rows[segment];
        let p2 = rows[(segment + 1).min(point_count - 1)];
        let p3 = rows[(segment + 2).min(point_count - 1)];

        for column in 0..row_len {
            values.push(catmull_rom(
                p0[column] as f64,
                p1[column] as f64,
                p2[column] as f64,
                p3[column] as f64,
                local_t,
            ) as f32);
        }
    }

    Ok(Spline {
        layout_mask: spline.layout_mask,
        values,
    })
}

fn euclidean_distance(a: &[f32], b: &[f32], dims: usize) -> f64 {
    (0..dims)
        .map(|d| ((a[d] - b[d]) as f64).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Centripetal-free (uniform) Catmull-Rom interpolation between `p1` and
/// `p2`, using `p0`/`p3` as the neighboring tangent-defining controls.
fn catmull_rom(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * p1)
        + (-p0 + p2) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t3)
}
