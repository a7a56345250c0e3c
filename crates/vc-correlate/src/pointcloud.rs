use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vc_core::Point3f;

/// One cloud point: a stable identifier and a reference-volume position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub id: u32,
    pub pos: Point3f,
}

/// The set of reference-volume positions to correlate.
///
/// Identifiers are carried through to the results table unchanged, so rows
/// stay attributable when points are filtered or processed out of order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    points: Vec<Point>,
}

impl PointCloud {
    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Regular grid covering the volume interior.
    ///
    /// Spacing is `subvol_size * (1 - overlap)` voxels, at least one. A
    /// margin of half a subvolume keeps templates away from the faces; axes
    /// too small for the margin get a single centered plane.
    pub fn grid(dims: (usize, usize, usize), subvol_size: u32, overlap: f32) -> Self {
        let spacing = ((subvol_size as f32 * (1.0 - overlap)).round() as usize).max(1);
        let margin = (subvol_size as usize) / 2;

        let xs = axis_positions(dims.0, margin, spacing);
        let ys = axis_positions(dims.1, margin, spacing);
        let zs = axis_positions(dims.2, margin, spacing);

        let mut points = Vec::with_capacity(xs.len() * ys.len() * zs.len());
        let mut id = 1u32;
        for &z in &zs {
            for &y in &ys {
                for &x in &xs {
                    points.push(Point {
                        id,
                        pos: Point3f::new(x, y, z),
                    });
                    id += 1;
                }
            }
        }
        Self { points }
    }

    /// Uniform random cloud over the volume interior, reproducible from the
    /// seed.
    pub fn random(dims: (usize, usize, usize), count: usize, subvol_size: u32, seed: u64) -> Self {
        let margin = (subvol_size as usize) / 2;
        let mut rng = StdRng::seed_from_u64(seed);
        let points = (0..count)
            .map(|i| Point {
                id: i as u32 + 1,
                pos: Point3f::new(
                    axis_random(&mut rng, dims.0, margin),
                    axis_random(&mut rng, dims.1, margin),
                    axis_random(&mut rng, dims.2, margin),
                ),
            })
            .collect();
        Self { points }
    }

    /// Parses a whitespace- or comma-delimited `id x y z` table.
    ///
    /// Rows whose first four fields are not all numeric (headers, comments)
    /// are skipped.
    pub fn from_delimited_text(text: &str) -> Self {
        let mut points = Vec::new();
        for line in text.lines() {
            let mut fields = line
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|f| !f.is_empty());
            let parsed = (|| {
                let id: u32 = fields.next()?.parse().ok()?;
                let x: f32 = fields.next()?.parse().ok()?;
                let y: f32 = fields.next()?.parse().ok()?;
                let z: f32 = fields.next()?.parse().ok()?;
                Some(Point {
                    id,
                    pos: Point3f::new(x, y, z),
                })
            })();
            if let Some(p) = parsed {
                points.push(p);
            }
        }
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

fn axis_positions(extent: usize, margin: usize, spacing: usize) -> Vec<f32> {
    if extent <= 2 * margin {
        return vec![extent as f32 * 0.5];
    }
    (margin..=extent - 1 - margin)
        .step_by(spacing)
        .map(|v| v as f32)
        .collect()
}

fn axis_random(rng: &mut StdRng, extent: usize, margin: usize) -> f32 {
    if extent <= 2 * margin {
        return extent as f32 * 0.5;
    }
    rng.random_range(margin as f32..=(extent - 1 - margin) as f32)
}
