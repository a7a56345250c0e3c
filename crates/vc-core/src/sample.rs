use crate::geom::Point3f;
use crate::volume::VolumeView;

/// Interpolation order used when sampling at real-valued coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Nearest,
    Trilinear,
    Tricubic,
}

/// Samples a volume at `p` with the requested interpolation.
///
/// Returns `None` when the interpolation support is not fully inside the
/// volume. The dispatch is a plain match: selection happens per call site
/// once per run, not through virtual calls.
pub fn sample(vol: &VolumeView<'_, f32>, interp: Interpolation, p: Point3f) -> Option<f32> {
    match interp {
        Interpolation::Nearest => sample_nearest(vol, p.x, p.y, p.z),
        Interpolation::Trilinear => sample_trilinear(vol, p.x, p.y, p.z),
        Interpolation::Tricubic => sample_tricubic(vol, p.x, p.y, p.z),
    }
}

pub fn sample_nearest(vol: &VolumeView<'_, f32>, x: f32, y: f32, z: f32) -> Option<f32> {
    let xi = x.round();
    let yi = y.round();
    let zi = z.round();
    if xi < 0.0 || yi < 0.0 || zi < 0.0 {
        return None;
    }

    let (xi, yi, zi) = (xi as usize, yi as usize, zi as usize);
    if xi >= vol.width() || yi >= vol.height() || zi >= vol.depth() {
        return None;
    }
    // SAFETY: Bounds are checked immediately above.
    Some(unsafe { *vol.get_unchecked(xi, yi, zi) })
}

pub fn sample_trilinear(vol: &VolumeView<'_, f32>, x: f32, y: f32, z: f32) -> Option<f32> {
    let (x0, dx) = floor_frac(x, vol.width())?;
    let (y0, dy) = floor_frac(y, vol.height())?;
    let (z0, dz) = floor_frac(z, vol.depth())?;
    let x1 = (x0 + 1).min(vol.width() - 1);
    let y1 = (y0 + 1).min(vol.height() - 1);
    let z1 = (z0 + 1).min(vol.depth() - 1);

    // SAFETY: All eight corner indices are clamped into the extents above.
    let at = |xi: usize, yi: usize, zi: usize| unsafe { *vol.get_unchecked(xi, yi, zi) };

    let lerp = |a: f32, b: f32, t: f32| a * (1.0 - t) + b * t;
    let c00 = lerp(at(x0, y0, z0), at(x1, y0, z0), dx);
    let c10 = lerp(at(x0, y1, z0), at(x1, y1, z0), dx);
    let c01 = lerp(at(x0, y0, z1), at(x1, y0, z1), dx);
    let c11 = lerp(at(x0, y1, z1), at(x1, y1, z1), dx);
    let c0 = lerp(c00, c10, dy);
    let c1 = lerp(c01, c11, dy);
    Some(lerp(c0, c1, dz))
}

pub fn sample_tricubic(vol: &VolumeView<'_, f32>, x: f32, y: f32, z: f32) -> Option<f32> {
    let (x0, dx) = floor_frac(x, vol.width())?;
    let (y0, dy) = floor_frac(y, vol.height())?;
    let (z0, dz) = floor_frac(z, vol.depth())?;

    // The 4x4x4 support spans [i0 - 1, i0 + 2] along each axis.
    if x0 < 1 || y0 < 1 || z0 < 1 {
        return None;
    }
    if x0 + 2 >= vol.width() || y0 + 2 >= vol.height() || z0 + 2 >= vol.depth() {
        return None;
    }

    let wx = cubic_weights(dx);
    let wy = cubic_weights(dy);
    let wz = cubic_weights(dz);

    let mut acc = 0.0f32;
    for (kz, &wkz) in wz.iter().enumerate() {
        let zi = z0 - 1 + kz;
        for (ky, &wky) in wy.iter().enumerate() {
            let yi = y0 - 1 + ky;
            let wzy = wkz * wky;
            for (kx, &wkx) in wx.iter().enumerate() {
                let xi = x0 - 1 + kx;
                // SAFETY: Support bounds are checked before the loops.
                acc += wzy * wkx * unsafe { *vol.get_unchecked(xi, yi, zi) };
            }
        }
    }
    Some(acc)
}

/// Cubic convolution weights (Catmull-Rom, a = -0.5) for the four samples
/// at offsets -1, 0, 1, 2 relative to the floor index.
fn cubic_weights(t: f32) -> [f32; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    [
        -0.5 * t3 + t2 - 0.5 * t,
        1.5 * t3 - 2.5 * t2 + 1.0,
        -1.5 * t3 + 2.0 * t2 + 0.5 * t,
        0.5 * t3 - 0.5 * t2,
    ]
}

/// Splits a coordinate into floor index and fraction, rejecting positions
/// outside `[0, len - 1]`.
fn floor_frac(v: f32, len: usize) -> Option<(usize, f32)> {
    if len == 0 || v < 0.0 {
        return None;
    }
    let max = (len - 1) as f32;
    if v > max {
        return None;
    }
    let f = v.floor();
    Some((f as usize, v - f))
}
