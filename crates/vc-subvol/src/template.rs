use vc_core::{Point3f, Vec3f, VolumeView, sample_nearest};
use vc_mask::Mask;

/// Subvolume geometry selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubvolShape {
    /// Cube of the given side length.
    Cube,
    /// Sphere of the given diameter.
    Sphere,
}

/// Fixed, ordered set of offsets that defines a subvolume around a point.
///
/// Offsets are generated on the integer voxel lattice in `z`, `y`, `x` scan
/// order. `aspect` scales the half-extent of each axis independently.
#[derive(Debug, Clone, PartialEq)]
pub struct SubvolTemplate {
    shape: SubvolShape,
    size: u32,
    offsets: Vec<Vec3f>,
}

impl SubvolTemplate {
    /// Builds the offset set for a cube side length or sphere diameter of
    /// `size` voxels.
    ///
    /// The lattice is symmetric about the point, so each axis spans an odd
    /// number of voxels: an even `size` rounds down to the nearest odd
    /// extent (a cube of side 12 yields an 11-voxel cube). Fractional
    /// half-extents from `aspect` round down the same way.
    ///
    /// `size` must be at least 2; a degenerate subvolume cannot anchor a
    /// search and is a fatal configuration error upstream.
    pub fn build(shape: SubvolShape, size: u32, aspect: [f32; 3]) -> Self {
        assert!(size >= 2, "subvolume size must be at least 2 voxels");
        let radius = (size as f32 - 1.0) * 0.5;
        let rx = radius * aspect[0];
        let ry = radius * aspect[1];
        let rz = radius * aspect[2];
        let ix = rx.floor() as i32;
        let iy = ry.floor() as i32;
        let iz = rz.floor() as i32;

        let mut offsets = Vec::new();
        for dz in -iz..=iz {
            for dy in -iy..=iy {
                for dx in -ix..=ix {
                    if shape == SubvolShape::Sphere {
                        let nx = dx as f32 / rx;
                        let ny = dy as f32 / ry;
                        let nz = dz as f32 / rz;
                        if nx * nx + ny * ny + nz * nz > 1.0 {
                            continue;
                        }
                    }
                    offsets.push(Vec3f::new(dx as f32, dy as f32, dz as f32));
                }
            }
        }

        Self {
            shape,
            size,
            offsets,
        }
    }

    pub fn shape(&self) -> SubvolShape {
        self.shape
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn offsets(&self) -> &[Vec3f] {
        &self.offsets
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Narrows the template for one point against the reference volume.
    ///
    /// An offset is kept when its reference voxel lies inside the volume,
    /// inside the mask (if any), and within the gray threshold range (if
    /// thresholding is on). The surviving offsets keep their original order.
    pub fn filter_at(
        &self,
        reference: &VolumeView<'_, f32>,
        point: Point3f,
        filter: &TemplateFilter<'_>,
    ) -> FilteredTemplate {
        let mut kept = Vec::with_capacity(self.offsets.len());
        for &off in &self.offsets {
            let p = point + off;
            let Some(value) = sample_nearest(reference, p.x, p.y, p.z) else {
                continue;
            };
            if let Some(mask) = filter.mask {
                let (xi, yi, zi) = (
                    p.x.round() as usize,
                    p.y.round() as usize,
                    p.z.round() as usize,
                );
                if !mask.is_included(xi, yi, zi) {
                    continue;
                }
            }
            if let Some((lo, hi)) = filter.gray_range {
                if value < lo || value > hi {
                    continue;
                }
            }
            kept.push(off);
        }

        FilteredTemplate {
            offsets: kept,
            total: self.offsets.len(),
        }
    }
}

/// Per-point inclusion criteria applied to a template.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateFilter<'a> {
    /// Inclusive gray threshold range; `None` disables thresholding.
    pub gray_range: Option<(f32, f32)>,
    /// Inclusion mask; `None` disables masking.
    pub mask: Option<&'a Mask>,
}

/// Template offsets surviving the per-point filter.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredTemplate {
    offsets: Vec<Vec3f>,
    total: usize,
}

impl FilteredTemplate {
    pub fn offsets(&self) -> &[Vec3f] {
        &self.offsets
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Fraction of the full template that survived filtering.
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        self.offsets.len() as f32 / self.total as f32
    }
}

#[cfg(test)]
mod tests {
    use vc_core::{Point3f, Volume};
    use vc_mask::Mask;

    use super::{SubvolShape, SubvolTemplate, TemplateFilter};

    #[test]
    fn cube_side_three_has_27_offsets() {
        let tpl = SubvolTemplate::build(SubvolShape::Cube, 3, [1.0; 3]);
        assert_eq!(tpl.len(), 27);
        assert_eq!(tpl.offsets()[0], vc_core::Vec3f::new(-1.0, -1.0, -1.0));
        assert_eq!(tpl.offsets()[26], vc_core::Vec3f::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn even_size_rounds_down_to_symmetric_lattice() {
        let tpl = SubvolTemplate::build(SubvolShape::Cube, 12, [1.0; 3]);
        // Half-extent floor(5.5) = 5, so the cube spans 11 voxels per axis.
        assert_eq!(tpl.len(), 11 * 11 * 11);
        assert_eq!(
            tpl.offsets(),
            SubvolTemplate::build(SubvolShape::Cube, 11, [1.0; 3]).offsets()
        );
    }

    #[test]
    fn sphere_diameter_three_is_face_neighborhood() {
        let tpl = SubvolTemplate::build(SubvolShape::Sphere, 3, [1.0; 3]);
        // Center plus the six face neighbors: corner and edge offsets fall
        // outside the unit ball.
        assert_eq!(tpl.len(), 7);
    }

    #[test]
    fn aspect_stretches_one_axis() {
        let iso = SubvolTemplate::build(SubvolShape::Cube, 3, [1.0, 1.0, 1.0]);
        let tall = SubvolTemplate::build(SubvolShape::Cube, 3, [1.0, 1.0, 2.0]);
        assert_eq!(iso.len(), 3 * 3 * 3);
        assert_eq!(tall.len(), 3 * 3 * 5);
    }

    #[test]
    fn filter_rejects_thresholded_and_out_of_bounds() {
        let mut vol = Volume::new_fill(5, 5, 5, 50.0f32);
        *vol.get_mut(2, 2, 2).expect("in bounds") = 200.0;
        let view = vol.as_view();

        let tpl = SubvolTemplate::build(SubvolShape::Cube, 3, [1.0; 3]);

        // Thresholding drops the single bright voxel at the center.
        let filter = TemplateFilter {
            gray_range: Some((0.0, 100.0)),
            mask: None,
        };
        let kept = tpl.filter_at(&view, Point3f::new(2.0, 2.0, 2.0), &filter);
        assert_eq!(kept.len(), 26);
        assert!((kept.fraction() - 26.0 / 27.0).abs() < 1e-6);

        // A corner point loses the out-of-bounds octants.
        let kept = tpl.filter_at(
            &view,
            Point3f::new(0.0, 0.0, 0.0),
            &TemplateFilter::default(),
        );
        assert_eq!(kept.len(), 8);
    }

    #[test]
    fn filter_respects_mask() {
        let vol = Volume::new_fill(6, 6, 6, 10.0f32);
        let mask = Mask::from_fn(6, 6, 6, |x, _, _| x >= 3);
        let tpl = SubvolTemplate::build(SubvolShape::Cube, 3, [1.0; 3]);

        let filter = TemplateFilter {
            gray_range: None,
            mask: Some(&mask),
        };
        let kept = tpl.filter_at(&vol.as_view(), Point3f::new(3.0, 3.0, 3.0), &filter);
        // Offsets with x == -1 land on x == 2, which the mask excludes.
        assert_eq!(kept.len(), 18);
    }
}
