use thiserror::Error;
use vc_core::{Interpolation, Vec3f};
use vc_search::{DofCount, DofSchedule, ObjectiveKind};
use vc_subvol::SubvolShape;

/// Errors from parsing or validating search parameters.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("unknown parameter `{0}`")]
    UnknownKey(String),
    #[error("invalid value `{value}` for `{key}`")]
    InvalidValue { key: String, value: String },
    #[error("subvol_size must be at least 2, got {0}")]
    SubvolSizeTooSmall(u32),
    #[error("subvol_aspect components must be positive")]
    NonPositiveAspect,
    #[error("gray_thresh_min {min} exceeds gray_thresh_max {max}")]
    ThresholdRangeInverted { min: f32, max: f32 },
    #[error("min_vol_fract must lie in [0, 1], got {0}")]
    VolumeFractionOutOfRange(f32),
    #[error("disp_max must be positive, got {0}")]
    NonPositiveDispMax(f32),
    #[error("conv_tol must be positive, got {0}")]
    NonPositiveConvTol(f32),
    #[error("num_res_levels must be at least 1")]
    ZeroResolutionLevels,
    #[error("max_iters must be at least 1")]
    ZeroIterationCap,
    #[error("reference and correlated volume extents differ: {0}")]
    VolumeSizeMismatch(String),
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
}

/// The full run configuration, in the classic control-file vocabulary of
/// volume correlation engines: every field corresponds to one `key value`
/// line.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParameters {
    pub subvol_geom: SubvolShape,
    pub subvol_size: u32,
    pub subvol_aspect: [f32; 3],
    /// Enables gray-value thresholding of template voxels.
    pub subvol_thresh: bool,
    pub gray_thresh_min: f32,
    pub gray_thresh_max: f32,
    /// Minimum surviving template fraction below which a point is skipped.
    pub min_vol_fract: f32,
    pub disp_max: f32,
    /// 3 (translation), 6 (rigid) or 12 (rigid plus strain).
    pub num_srch_dof: u32,
    /// How `num_srch_dof` is distributed over the resolution levels.
    pub dof_schedule: DofSchedule,
    pub obj_function: ObjectiveKind,
    pub interp_type: Interpolation,
    /// Rigid translation applied as the search seed for every point.
    pub rigid_trans: Vec3f,
    /// Radius of the coarse exhaustive scan; zero disables it.
    pub basin_radius: f32,
    /// Caps how many cloud points are processed; `None` processes all.
    pub num_points_to_process: Option<usize>,
    pub num_res_levels: usize,
    pub conv_tol: f32,
    pub max_iters: u32,
    /// Worker thread count; zero picks the number of cores.
    pub num_threads: usize,
}

impl Default for SearchParameters {
    fn default() -> Self {
        Self {
            subvol_geom: SubvolShape::Cube,
            subvol_size: 15,
            subvol_aspect: [1.0, 1.0, 1.0],
            subvol_thresh: false,
            gray_thresh_min: 0.0,
            gray_thresh_max: f32::MAX,
            min_vol_fract: 0.2,
            disp_max: 10.0,
            num_srch_dof: 6,
            dof_schedule: DofSchedule::Escalating(DofCount::Rigid),
            obj_function: ObjectiveKind::Znssd,
            interp_type: Interpolation::Trilinear,
            rigid_trans: Vec3f::default(),
            basin_radius: 0.0,
            num_points_to_process: None,
            num_res_levels: 3,
            conv_tol: 1e-4,
            max_iters: 200,
            num_threads: 0,
        }
    }
}

impl SearchParameters {
    /// Applies one `key value` assignment.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let bad = || ConfigError::InvalidValue {
            key: key.to_owned(),
            value: value.to_owned(),
        };

        match key {
            "subvol_geom" => {
                self.subvol_geom = match value {
                    "cube" => SubvolShape::Cube,
                    "sphere" => SubvolShape::Sphere,
                    _ => return Err(bad()),
                };
            }
            "subvol_size" => self.subvol_size = value.parse().map_err(|_| bad())?,
            "subvol_aspect" => {
                let mut it = value.split_whitespace();
                for slot in &mut self.subvol_aspect {
                    *slot = it.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
                }
                if it.next().is_some() {
                    return Err(bad());
                }
            }
            "subvol_thresh" => {
                self.subvol_thresh = match value {
                    "on" => true,
                    "off" => false,
                    _ => return Err(bad()),
                };
            }
            "gray_thresh_min" => self.gray_thresh_min = value.parse().map_err(|_| bad())?,
            "gray_thresh_max" => self.gray_thresh_max = value.parse().map_err(|_| bad())?,
            "min_vol_fract" => self.min_vol_fract = value.parse().map_err(|_| bad())?,
            "disp_max" => self.disp_max = value.parse().map_err(|_| bad())?,
            "num_srch_dof" => {
                let dof: u32 = value.parse().map_err(|_| bad())?;
                if !matches!(dof, 3 | 6 | 12) {
                    return Err(bad());
                }
                self.num_srch_dof = dof;
                // Keep the schedule target in sync regardless of key order.
                match &mut self.dof_schedule {
                    DofSchedule::Uniform(target) | DofSchedule::Escalating(target) => {
                        *target = dof_count(dof);
                    }
                    DofSchedule::PerLevel(_) => {}
                }
            }
            "dof_schedule" => {
                self.dof_schedule = match value {
                    "uniform" => DofSchedule::Uniform(dof_count(self.num_srch_dof)),
                    "escalating" => DofSchedule::Escalating(dof_count(self.num_srch_dof)),
                    list => {
                        let counts = list
                            .split_whitespace()
                            .map(|tok| match tok.parse::<u32>() {
                                Ok(n @ (3 | 6 | 12)) => Ok(dof_count(n)),
                                _ => Err(bad()),
                            })
                            .collect::<Result<Vec<_>, _>>()?;
                        if counts.is_empty() {
                            return Err(bad());
                        }
                        DofSchedule::PerLevel(counts)
                    }
                };
            }
            "obj_function" => {
                self.obj_function = match value {
                    "sad" => ObjectiveKind::Sad,
                    "ssd" => ObjectiveKind::Ssd,
                    "zssd" => ObjectiveKind::Zssd,
                    "nssd" => ObjectiveKind::Nssd,
                    "znssd" => ObjectiveKind::Znssd,
                    _ => return Err(bad()),
                };
            }
            "interp_type" => {
                self.interp_type = match value {
                    "nearest" => Interpolation::Nearest,
                    "trilinear" => Interpolation::Trilinear,
                    "tricubic" => Interpolation::Tricubic,
                    _ => return Err(bad()),
                };
            }
            "rigid_trans" => {
                let mut it = value.split_whitespace();
                for slot in [
                    &mut self.rigid_trans.x,
                    &mut self.rigid_trans.y,
                    &mut self.rigid_trans.z,
                ] {
                    *slot = it.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
                }
                if it.next().is_some() {
                    return Err(bad());
                }
            }
            "basin_radius" => self.basin_radius = value.parse().map_err(|_| bad())?,
            "num_points_to_process" => {
                self.num_points_to_process = Some(value.parse().map_err(|_| bad())?);
            }
            "num_res_levels" => self.num_res_levels = value.parse().map_err(|_| bad())?,
            "conv_tol" => self.conv_tol = value.parse().map_err(|_| bad())?,
            "max_iters" => self.max_iters = value.parse().map_err(|_| bad())?,
            "num_threads" => self.num_threads = value.parse().map_err(|_| bad())?,
            _ => return Err(ConfigError::UnknownKey(key.to_owned())),
        }
        Ok(())
    }

    /// Builds parameters from `(key, value)` pairs on top of the defaults.
    pub fn from_key_values<'a, I>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            params.apply(key, value)?;
        }
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.subvol_size < 2 {
            return Err(ConfigError::SubvolSizeTooSmall(self.subvol_size));
        }
        if self.subvol_aspect.iter().any(|&a| a <= 0.0) {
            return Err(ConfigError::NonPositiveAspect);
        }
        if self.subvol_thresh && self.gray_thresh_min > self.gray_thresh_max {
            return Err(ConfigError::ThresholdRangeInverted {
                min: self.gray_thresh_min,
                max: self.gray_thresh_max,
            });
        }
        if !(0.0..=1.0).contains(&self.min_vol_fract) {
            return Err(ConfigError::VolumeFractionOutOfRange(self.min_vol_fract));
        }
        if self.disp_max <= 0.0 {
            return Err(ConfigError::NonPositiveDispMax(self.disp_max));
        }
        if self.conv_tol <= 0.0 {
            return Err(ConfigError::NonPositiveConvTol(self.conv_tol));
        }
        if self.num_res_levels == 0 {
            return Err(ConfigError::ZeroResolutionLevels);
        }
        if self.max_iters == 0 {
            return Err(ConfigError::ZeroIterationCap);
        }
        Ok(())
    }

    pub(crate) fn gray_range(&self) -> Option<(f32, f32)> {
        self.subvol_thresh
            .then_some((self.gray_thresh_min, self.gray_thresh_max))
    }
}

/// Maps a validated `num_srch_dof` value to the search-space tier.
pub(crate) fn dof_count(num_srch_dof: u32) -> DofCount {
    match num_srch_dof {
        3 => DofCount::Translation,
        6 => DofCount::Rigid,
        _ => DofCount::Full,
    }
}
