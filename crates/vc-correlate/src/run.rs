use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::info;
use rayon::prelude::*;
use vc_core::Volume;
use vc_mask::Mask;
use vc_pyr::VolumePyramidF32;
use vc_search::{SearchConfig, search_point};
use vc_subvol::{SubvolTemplate, TemplateFilter};

use crate::params::{ConfigError, SearchParameters};
use crate::pointcloud::{Point, PointCloud};
use crate::results::{CorrelationResult, PointStatus, ResultsTable};

/// Cooperative cancellation handle shared between the run and its caller.
///
/// Cancellation stops the run between points: points not yet started are
/// reported as not processed, so the table still holds one row per input
/// point.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Correlates every cloud point between the reference and correlated
/// volumes.
///
/// Builds the subvolume template and both pyramids once, then searches the
/// points in parallel. Returns one row per input point in input order.
pub fn run(
    reference: &Volume<f32>,
    correlated: &Volume<f32>,
    mask: Option<&Mask>,
    cloud: &PointCloud,
    params: &SearchParameters,
    cancel: &CancelToken,
) -> Result<ResultsTable, ConfigError> {
    params.validate()?;
    if (reference.width(), reference.height(), reference.depth())
        != (correlated.width(), correlated.height(), correlated.depth())
    {
        return Err(ConfigError::VolumeSizeMismatch(format!(
            "{}x{}x{} vs {}x{}x{}",
            reference.width(),
            reference.height(),
            reference.depth(),
            correlated.width(),
            correlated.height(),
            correlated.depth()
        )));
    }

    let template = SubvolTemplate::build(params.subvol_geom, params.subvol_size, params.subvol_aspect);
    let filter = TemplateFilter {
        gray_range: params.gray_range(),
        mask,
    };

    let mut ref_pyr = VolumePyramidF32::new();
    ref_pyr.build_from_f32(&reference.as_view(), params.num_res_levels);
    let mut cor_pyr = VolumePyramidF32::new();
    cor_pyr.build_from_f32(&correlated.as_view(), params.num_res_levels);

    let cfg = SearchConfig {
        objective: params.obj_function,
        interpolation: params.interp_type,
        dof: params.dof_schedule.clone(),
        disp_max: params.disp_max,
        basin_radius: params.basin_radius,
        conv_tol: params.conv_tol,
        max_iters: params.max_iters,
    };

    let points = match params.num_points_to_process {
        Some(n) => &cloud.points()[..n.min(cloud.len())],
        None => cloud.points(),
    };
    info!(
        "correlating {} points, subvol {:?} size {}, {} dof, {} levels",
        points.len(),
        params.subvol_geom,
        params.subvol_size,
        params.num_srch_dof,
        ref_pyr.num_levels().min(cor_pyr.num_levels())
    );

    let process = |p: &Point| -> CorrelationResult {
        if cancel.is_cancelled() {
            return CorrelationResult::unsearched(p.id, p.pos, PointStatus::NotProcessed);
        }
        let filtered = template.filter_at(&reference.as_view(), p.pos, &filter);
        if filtered.is_empty() || filtered.fraction() < params.min_vol_fract {
            return CorrelationResult::unsearched(p.id, p.pos, PointStatus::InsufficientVolume);
        }
        let outcome = search_point(
            &ref_pyr,
            &cor_pyr,
            filtered.offsets(),
            p.pos,
            params.rigid_trans,
            &cfg,
        );
        CorrelationResult::from_outcome(p.id, p.pos, &outcome)
    };

    let rows: Vec<CorrelationResult> = if params.num_threads > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(params.num_threads)
            .build()
            .map_err(|e| ConfigError::ThreadPool(e.to_string()))?;
        pool.install(|| points.par_iter().map(process).collect())
    } else {
        points.par_iter().map(process).collect()
    };

    let table = ResultsTable::from_rows(rows);
    let (good, range, convg, insufficient, skipped) = table.status_counts();
    info!(
        "done: {good} good, {range} range failures, {convg} convergence failures, \
         {insufficient} insufficient volume, {skipped} not processed"
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use vc_core::{Interpolation, Point3f, Vec3f, Volume};
    use vc_mask::Mask;
    use vc_search::{DofCount, DofSchedule, ObjectiveKind};

    use super::{CancelToken, run};
    use crate::params::{ConfigError, SearchParameters};
    use crate::pointcloud::{Point, PointCloud};
    use crate::results::PointStatus;

    fn field(x: f32, y: f32, z: f32) -> f32 {
        (0.29 * x).sin() + (0.41 * y).cos() + (0.19 * z).sin() + (0.13 * (x - y + 2.0 * z)).cos()
    }

    fn volume_from_field(n: usize, shift: Vec3f) -> Volume<f32> {
        let mut vol = Volume::new_fill(n, n, n, 0.0f32);
        for z in 0..n {
            for y in 0..n {
                for x in 0..n {
                    *vol.get_mut(x, y, z).unwrap() = field(
                        x as f32 - shift.x,
                        y as f32 - shift.y,
                        z as f32 - shift.z,
                    );
                }
            }
        }
        vol
    }

    fn single_point_cloud(x: f32, y: f32, z: f32) -> PointCloud {
        PointCloud::from_points(vec![Point {
            id: 1,
            pos: Point3f::new(x, y, z),
        }])
    }

    #[test]
    fn identical_volumes_report_zero_displacement() {
        let vol = volume_from_field(32, Vec3f::default());
        let cloud = PointCloud::grid((32, 32, 32), 10, 0.0);
        let params = SearchParameters {
            subvol_size: 9,
            disp_max: 3.0,
            num_res_levels: 2,
            ..SearchParameters::default()
        };

        let table = run(&vol, &vol, None, &cloud, &params, &CancelToken::new()).unwrap();
        assert_eq!(table.len(), cloud.len());
        for r in table.rows() {
            assert_eq!(r.status, PointStatus::Good);
            assert!(r.u.abs() < 0.01 && r.v.abs() < 0.01 && r.w.abs() < 0.01);
            assert!(r.obj_min < 1e-6);
        }
    }

    #[test]
    fn recovers_subvoxel_shift() {
        let shift = Vec3f::new(0.5, -0.3, 0.2);
        let reference = volume_from_field(28, Vec3f::default());
        let correlated = volume_from_field(28, shift);
        let cloud = single_point_cloud(14.0, 14.0, 14.0);
        let params = SearchParameters {
            subvol_size: 11,
            disp_max: 3.0,
            num_srch_dof: 6,
            obj_function: ObjectiveKind::Znssd,
            interp_type: Interpolation::Tricubic,
            num_res_levels: 1,
            max_iters: 300,
            ..SearchParameters::default()
        };

        let table = run(&reference, &correlated, None, &cloud, &params, &CancelToken::new())
            .unwrap();
        let r = table.get(1).unwrap();
        assert_eq!(r.status, PointStatus::Good);
        assert!((r.u - shift.x).abs() < 0.05);
        assert!((r.v - shift.y).abs() < 0.05);
        assert!((r.w - shift.z).abs() < 0.05);
    }

    #[test]
    fn dof_schedule_overrides_num_srch_dof() {
        // Pure rotation about the z axis around the cloud point. A
        // translation-only search leaves psi at zero, so a recovered angle
        // proves the schedule field drives the search.
        let angle = 0.1f32;
        let c = 14.0f32;
        let n = 28;
        let reference = volume_from_field(n, Vec3f::default());
        let mut correlated = Volume::new_fill(n, n, n, 0.0f32);
        let (s, co) = angle.sin_cos();
        for z in 0..n {
            for y in 0..n {
                for x in 0..n {
                    let dx = x as f32 - c;
                    let dy = y as f32 - c;
                    *correlated.get_mut(x, y, z).unwrap() = field(
                        c + co * dx + s * dy,
                        c - s * dx + co * dy,
                        z as f32,
                    );
                }
            }
        }
        let cloud = single_point_cloud(c, c, c);
        let params = SearchParameters {
            subvol_size: 11,
            disp_max: 2.0,
            num_srch_dof: 3,
            dof_schedule: DofSchedule::Uniform(DofCount::Rigid),
            interp_type: Interpolation::Tricubic,
            num_res_levels: 1,
            max_iters: 300,
            ..SearchParameters::default()
        };

        let table = run(&reference, &correlated, None, &cloud, &params, &CancelToken::new())
            .unwrap();
        let r = table.get(1).unwrap();
        assert_eq!(r.status, PointStatus::Good);
        assert!((r.psi - angle).abs() < 0.03, "psi = {}", r.psi);
        assert!(r.u.abs() < 0.1 && r.v.abs() < 0.1 && r.w.abs() < 0.1);
    }

    #[test]
    fn mask_starves_template_to_insufficient_volume() {
        let vol = volume_from_field(24, Vec3f::default());
        // Only a thin slab is included, leaving well under half of any
        // centered template.
        let mask = Mask::from_fn(24, 24, 24, |_, _, z| z < 3);
        let cloud = single_point_cloud(12.0, 12.0, 12.0);
        let params = SearchParameters {
            subvol_size: 11,
            min_vol_fract: 0.5,
            disp_max: 2.0,
            num_res_levels: 1,
            ..SearchParameters::default()
        };

        let table = run(&vol, &vol, Some(&mask), &cloud, &params, &CancelToken::new()).unwrap();
        assert_eq!(table.get(1).unwrap().status, PointStatus::InsufficientVolume);
    }

    #[test]
    fn shift_beyond_disp_max_is_range_fail() {
        let reference = volume_from_field(32, Vec3f::default());
        let correlated = volume_from_field(32, Vec3f::new(4.0, 0.0, 0.0));
        let cloud = single_point_cloud(16.0, 16.0, 16.0);
        let params = SearchParameters {
            subvol_size: 9,
            disp_max: 2.0,
            num_srch_dof: 3,
            num_res_levels: 1,
            max_iters: 400,
            ..SearchParameters::default()
        };

        let table = run(&reference, &correlated, None, &cloud, &params, &CancelToken::new())
            .unwrap();
        let r = table.get(1).unwrap();
        assert_eq!(r.status, PointStatus::RangeFail);
        let norm = (r.u * r.u + r.v * r.v + r.w * r.w).sqrt();
        assert!(norm <= params.disp_max + 1e-6);
    }

    #[test]
    fn runs_are_deterministic_and_bounded() {
        let reference = volume_from_field(28, Vec3f::default());
        let correlated = volume_from_field(28, Vec3f::new(1.0, -1.0, 0.5));
        let cloud = PointCloud::grid((28, 28, 28), 9, 0.0);
        let params = SearchParameters {
            subvol_size: 9,
            disp_max: 3.0,
            num_threads: 3,
            num_res_levels: 2,
            ..SearchParameters::default()
        };

        let a = run(&reference, &correlated, None, &cloud, &params, &CancelToken::new()).unwrap();
        let b = run(&reference, &correlated, None, &cloud, &params, &CancelToken::new()).unwrap();
        assert_eq!(a, b);

        // Exactly one row per input point, in input order.
        assert_eq!(a.len(), cloud.len());
        for (r, p) in a.rows().iter().zip(cloud.points()) {
            assert_eq!(r.id, p.id);
            if r.status != PointStatus::RangeFail {
                let norm = (r.u * r.u + r.v * r.v + r.w * r.w).sqrt();
                assert!(norm <= params.disp_max + 1e-6);
            }
        }
    }

    #[test]
    fn num_points_cap_limits_rows() {
        let vol = volume_from_field(24, Vec3f::default());
        let cloud = PointCloud::grid((24, 24, 24), 8, 0.0);
        let params = SearchParameters {
            subvol_size: 7,
            disp_max: 2.0,
            num_points_to_process: Some(3),
            num_res_levels: 1,
            ..SearchParameters::default()
        };
        let table = run(&vol, &vol, None, &cloud, &params, &CancelToken::new()).unwrap();
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn mismatched_extents_are_rejected() {
        let a = Volume::new_fill(8, 8, 8, 0.0f32);
        let b = Volume::new_fill(8, 8, 9, 0.0f32);
        let cloud = PointCloud::grid((8, 8, 8), 4, 0.0);
        let err = run(
            &a,
            &b,
            None,
            &cloud,
            &SearchParameters::default(),
            &CancelToken::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::VolumeSizeMismatch(_)));
    }

    #[test]
    fn empty_cloud_gives_empty_table() {
        let a = Volume::new_fill(16, 16, 16, 0.0f32);
        let table = run(
            &a,
            &a,
            None,
            &PointCloud::default(),
            &SearchParameters::default(),
            &CancelToken::new(),
        )
        .unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn cancelled_run_marks_points_not_processed() {
        let a = Volume::new_fill(16, 16, 16, 1.0f32);
        let cloud = PointCloud::grid((16, 16, 16), 8, 0.0);
        let cancel = CancelToken::new();
        cancel.cancel();

        let table = run(&a, &a, None, &cloud, &SearchParameters::default(), &cancel).unwrap();
        assert_eq!(table.len(), cloud.len());
        assert!(
            table
                .rows()
                .iter()
                .all(|r| r.status == PointStatus::NotProcessed)
        );
    }
}
