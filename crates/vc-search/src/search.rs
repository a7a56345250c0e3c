use log::{debug, trace};
use vc_core::{Interpolation, Point3f, Vec3f, VolumeView, sample};
use vc_pyr::VolumePyramidF32;

use crate::objective::{ObjectiveKind, score};
use crate::transform::{DofCount, TransformParams};

/// Degrees of freedom searched per pyramid level.
///
/// Which components activate at which level is a schedule, not a single
/// policy: coarse levels have too few voxels to condition rotation and
/// strain, so runs usually escalate from translation-only toward the full
/// target count as the resolution grows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DofSchedule {
    /// The same count at every level.
    Uniform(DofCount),
    /// Translation only at the coarsest level, the target count at every
    /// finer level.
    Escalating(DofCount),
    /// Explicit count per level, finest first. Levels beyond the list use
    /// its last entry.
    PerLevel(Vec<DofCount>),
}

impl Default for DofSchedule {
    fn default() -> Self {
        Self::Escalating(DofCount::Rigid)
    }
}

impl DofSchedule {
    pub fn dof_for_level(&self, level: usize, num_levels: usize) -> DofCount {
        match self {
            Self::Uniform(target) => *target,
            Self::Escalating(target) => {
                if num_levels > 1 && level == num_levels - 1 {
                    DofCount::Translation
                } else {
                    *target
                }
            }
            Self::PerLevel(counts) => match counts.get(level).or(counts.last()) {
                Some(&count) => count,
                None => DofCount::Translation,
            },
        }
    }
}

/// Per-point search configuration.
///
/// Distances are in full-resolution voxels; the search rescales them per
/// pyramid level.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub objective: ObjectiveKind,
    pub interpolation: Interpolation,
    pub dof: DofSchedule,
    /// Radius of the admissible translation ball.
    pub disp_max: f32,
    /// Radius of the exhaustive translation scan seeding the coarsest
    /// level. Zero disables the scan.
    pub basin_radius: f32,
    /// Threshold on the per-sweep transform change and on the pattern-search
    /// steps below which a level is converged.
    pub conv_tol: f32,
    /// Iteration cap per pyramid level.
    pub max_iters: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            objective: ObjectiveKind::Znssd,
            interpolation: Interpolation::Trilinear,
            dof: DofSchedule::default(),
            disp_max: 10.0,
            basin_radius: 0.0,
            conv_tol: 1e-4,
            max_iters: 200,
        }
    }
}

/// Terminal classification of one point's search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    /// The transform change per sweep fell below `conv_tol` at the finest
    /// level.
    Converged,
    /// The translation ended pinned at the `disp_max` ball boundary; the
    /// true displacement most likely lies outside the admissible range.
    RangeFailed,
    /// The iteration cap was hit or the objective never became finite.
    ConvergenceFailed,
}

/// Result of one point's search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub params: TransformParams,
    pub objective: f32,
    /// Best objective at each pyramid level, coarsest first. Objectives are
    /// normalized per sample, so the entries are comparable across levels.
    pub level_objectives: Vec<f32>,
    pub iterations: u32,
    pub status: SearchStatus,
}

impl SearchOutcome {
    fn failed() -> Self {
        Self {
            params: TransformParams::identity(),
            objective: f32::INFINITY,
            level_objectives: Vec::new(),
            iterations: 0,
            status: SearchStatus::ConvergenceFailed,
        }
    }
}

const RANGE_TOL: f32 = 1e-3;

// Initial pattern-search steps per component group. Translation is in
// level voxels, rotation in radians, strain dimensionless.
const STEP_TRANSLATION: f32 = 1.0;
const STEP_ROTATION: f32 = 0.05;
const STEP_STRAIN: f32 = 0.02;

/// Searches the transform matching the reference template at `point` into
/// the correlated volume.
///
/// `offsets` are the template's sample offsets around the point, in
/// full-resolution voxels. `seed` is the initial translation guess. Both
/// pyramids must be built from volumes of equal full-resolution extents.
pub fn search_point(
    ref_pyr: &VolumePyramidF32,
    cor_pyr: &VolumePyramidF32,
    offsets: &[Vec3f],
    point: Point3f,
    seed: Vec3f,
    cfg: &SearchConfig,
) -> SearchOutcome {
    let num_levels = ref_pyr.num_levels().min(cor_pyr.num_levels());
    if num_levels == 0 || offsets.is_empty() {
        return SearchOutcome::failed();
    }

    let coarsest_scale = level_scale(num_levels - 1);
    let mut params = TransformParams::from_translation(seed * coarsest_scale);
    let mut total_iters = 0u32;
    let mut objective = f32::INFINITY;
    let mut level_objectives = Vec::with_capacity(num_levels);
    let mut finest_capped = false;

    let mut ref_vals = Vec::with_capacity(offsets.len());
    let mut level_offsets = Vec::with_capacity(offsets.len());
    let mut candidate = Vec::with_capacity(offsets.len());

    for level in (0..num_levels).rev() {
        let scale = level_scale(level);
        // Both pyramids hold this level by construction of `num_levels`.
        let Some((ref_vol, cor_vol)) = ref_pyr.level(level).zip(cor_pyr.level(level)) else {
            return SearchOutcome::failed();
        };
        let level_point = Point3f::new(point.x * scale, point.y * scale, point.z * scale);
        let disp_max = cfg.disp_max * scale;

        gather_reference(
            &ref_vol.as_view(),
            cfg.interpolation,
            level_point,
            offsets,
            scale,
            &mut level_offsets,
            &mut ref_vals,
        );
        if ref_vals.len() < 2 {
            return SearchOutcome::failed();
        }

        let ctx = LevelContext {
            cor: cor_vol.as_view(),
            point: level_point,
            offsets: &level_offsets,
            ref_vals: &ref_vals,
            interpolation: cfg.interpolation,
            objective: cfg.objective,
        };

        clamp_translation(&mut params, disp_max);

        if level == num_levels - 1 && cfg.basin_radius > 0.0 {
            basin_scan(&ctx, &mut params, cfg.basin_radius * scale, disp_max, &mut candidate);
        }

        let dof = cfg.dof.dof_for_level(level, num_levels);
        let (best, iters, converged) =
            pattern_search(&ctx, &mut params, dof, disp_max, cfg, &mut candidate);
        objective = best;
        level_objectives.push(best);
        total_iters += iters;
        if level == 0 && !converged {
            finest_capped = true;
        }
        trace!(
            "level {level}: obj {objective:.6e} after {iters} iterations, t = ({:.3}, {:.3}, {:.3})",
            params.translation.x, params.translation.y, params.translation.z
        );

        if level > 0 {
            params.translation = params.translation * 2.0;
        }
    }

    let status = if !objective.is_finite() || finest_capped {
        SearchStatus::ConvergenceFailed
    } else if params.translation.norm() >= cfg.disp_max - RANGE_TOL {
        SearchStatus::RangeFailed
    } else {
        SearchStatus::Converged
    };
    debug!(
        "point ({:.1}, {:.1}, {:.1}): {status:?}, obj {objective:.6e}, {total_iters} iterations",
        point.x, point.y, point.z
    );

    SearchOutcome {
        params,
        objective,
        level_objectives,
        iterations: total_iters,
        status,
    }
}

fn level_scale(level: usize) -> f32 {
    1.0 / (1u32 << level) as f32
}

/// Samples the reference template at one pyramid level, dropping offsets
/// whose interpolation support falls outside the level.
fn gather_reference(
    ref_vol: &VolumeView<'_, f32>,
    interp: Interpolation,
    level_point: Point3f,
    offsets: &[Vec3f],
    scale: f32,
    level_offsets: &mut Vec<Vec3f>,
    ref_vals: &mut Vec<f32>,
) {
    level_offsets.clear();
    ref_vals.clear();
    for &d in offsets {
        let ld = d * scale;
        if let Some(v) = sample(ref_vol, interp, level_point + ld) {
            level_offsets.push(ld);
            ref_vals.push(v);
        }
    }
}

struct LevelContext<'a> {
    cor: VolumeView<'a, f32>,
    point: Point3f,
    offsets: &'a [Vec3f],
    ref_vals: &'a [f32],
    interpolation: Interpolation,
    objective: ObjectiveKind,
}

impl LevelContext<'_> {
    /// Scores one candidate transform. Any sample outside the correlated
    /// volume makes the candidate non-evaluable.
    fn evaluate(&self, params: &TransformParams, candidate: &mut Vec<f32>) -> f32 {
        let map = params.offset_map();
        candidate.clear();
        for &d in self.offsets {
            match sample(&self.cor, self.interpolation, self.point + map.map(d)) {
                Some(v) => candidate.push(v),
                None => return f32::INFINITY,
            }
        }
        score(self.objective, self.ref_vals, candidate)
    }
}

/// Exhaustive single-voxel translation scan over the basin ball, keeping
/// the best start for the pattern search. Ties keep the incumbent.
fn basin_scan(
    ctx: &LevelContext<'_>,
    params: &mut TransformParams,
    basin_radius: f32,
    disp_max: f32,
    candidate: &mut Vec<f32>,
) {
    let radius = basin_radius.min(disp_max);
    let r = radius.floor() as i32;
    let mut best = ctx.evaluate(params, candidate);
    let mut best_t = params.translation;

    for dz in -r..=r {
        for dy in -r..=r {
            for dx in -r..=r {
                let t = Vec3f::new(dx as f32, dy as f32, dz as f32);
                if t.norm() > radius {
                    continue;
                }
                let mut trial = *params;
                trial.translation = t;
                let obj = ctx.evaluate(&trial, candidate);
                if obj < best {
                    best = obj;
                    best_t = t;
                }
            }
        }
    }
    params.translation = best_t;
}

/// Compass pattern search over the enabled components.
///
/// Each iteration probes every enabled component at plus and minus its
/// current step, accepting strict improvements immediately. A sweep with no
/// accepted probe halves all steps. The level converges once a sweep moves
/// the transform by less than `conv_tol` with all steps below `conv_tol`.
/// Returns the best objective, the number of sweeps, and whether the level
/// converged within the cap.
fn pattern_search(
    ctx: &LevelContext<'_>,
    params: &mut TransformParams,
    dof: DofCount,
    disp_max: f32,
    cfg: &SearchConfig,
    candidate: &mut Vec<f32>,
) -> (f32, u32, bool) {
    let num_dof = dof.count();
    let mut steps = [0.0f32; TransformParams::NUM_COMPONENTS];
    for (i, s) in steps.iter_mut().enumerate() {
        *s = match i {
            0..=2 => STEP_TRANSLATION.min(disp_max.max(f32::EPSILON)),
            3..=5 => STEP_ROTATION,
            _ => STEP_STRAIN,
        };
    }

    let mut best = ctx.evaluate(params, candidate);
    let mut iters = 0u32;

    while iters < cfg.max_iters {
        iters += 1;
        let sweep_start = *params;
        let mut improved = false;

        for i in 0..num_dof {
            for sign in [1.0f32, -1.0] {
                let mut trial = *params;
                trial.set_component(i, trial.component(i) + sign * steps[i]);
                if i < 3 && trial.translation.norm() > disp_max {
                    continue;
                }
                let obj = ctx.evaluate(&trial, candidate);
                if obj < best {
                    best = obj;
                    *params = trial;
                    improved = true;
                    break;
                }
            }
        }

        if !improved {
            for s in &mut steps {
                *s *= 0.5;
            }
        }

        let max_step = steps[..num_dof].iter().fold(0.0f32, |a, &b| a.max(b));
        if params.delta_norm(&sweep_start) < cfg.conv_tol && max_step < cfg.conv_tol {
            return (best, iters, true);
        }
    }

    (best, iters, false)
}

fn clamp_translation(params: &mut TransformParams, disp_max: f32) {
    let norm = params.translation.norm();
    if norm > disp_max {
        let f = if norm > 0.0 { disp_max / norm } else { 0.0 };
        params.translation = params.translation * f;
    }
}
