use vc_core::{Volume, VolumeView};

use crate::downsample::downsample2x2x2_mean_f32_into;

/// Reusable f32 volume pyramid.
///
/// Level 0 is a copy of the input. Each next level is a 2x2x2 mean downsample
/// of the previous level.
///
/// If a requested level cannot be built because any extent falls below 2,
/// building stops early.
#[derive(Debug, Default, Clone)]
pub struct VolumePyramidF32 {
    levels: Vec<Volume<f32>>,
}

impl VolumePyramidF32 {
    pub fn new() -> Self {
        Self { levels: Vec::new() }
    }

    /// Ensures that internal buffers match the size chain implied by
    /// `(base extents, num_levels)`.
    ///
    /// Level extents are computed with integer halving:
    /// `(w, h, d), (w/2, h/2, d/2), ...`.
    pub fn ensure(&mut self, base_w: usize, base_h: usize, base_d: usize, num_levels: usize) {
        if num_levels == 0 {
            self.levels.clear();
            return;
        }

        self.levels.truncate(num_levels);
        self.levels
            .resize_with(num_levels, || Volume::new_fill(0, 0, 0, 0.0f32));

        let mut w = base_w;
        let mut h = base_h;
        let mut d = base_d;
        for level in &mut self.levels {
            if level.width() != w || level.height() != h || level.depth() != d {
                *level = Volume::new_fill(w, h, d, 0.0f32);
            }
            w /= 2;
            h /= 2;
            d /= 2;
        }
    }

    pub fn build_from_f32(&mut self, src: &VolumeView<'_, f32>, num_levels: usize) {
        let build_levels = max_build_levels(src.width(), src.height(), src.depth(), num_levels);
        if build_levels == 0 {
            self.levels.clear();
            return;
        }

        self.ensure(src.width(), src.height(), src.depth(), build_levels);
        copy_f32(src, &mut self.levels[0]);

        for level_idx in 1..build_levels {
            let (prev_levels, curr_and_tail) = self.levels.split_at_mut(level_idx);
            let prev = &prev_levels[level_idx - 1];
            let curr = &mut curr_and_tail[0];
            downsample2x2x2_mean_f32_into(&prev.as_view(), curr);
        }
    }

    pub fn level(&self, i: usize) -> Option<&Volume<f32>> {
        self.levels.get(i)
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }
}

fn max_build_levels(
    base_w: usize,
    base_h: usize,
    base_d: usize,
    requested_levels: usize,
) -> usize {
    if requested_levels == 0 || base_w == 0 || base_h == 0 || base_d == 0 {
        return 0;
    }

    let mut levels = 1usize;
    let mut w = base_w;
    let mut h = base_h;
    let mut d = base_d;
    while levels < requested_levels && w >= 2 && h >= 2 && d >= 2 {
        w /= 2;
        h /= 2;
        d /= 2;
        levels += 1;
    }
    levels
}

fn copy_f32(src: &VolumeView<'_, f32>, dst: &mut Volume<f32>) {
    debug_assert_eq!(src.width(), dst.width());
    debug_assert_eq!(src.height(), dst.height());
    debug_assert_eq!(src.depth(), dst.depth());

    let out = dst.data_mut();
    let mut idx = 0usize;
    for z in 0..src.depth() {
        for y in 0..src.height() {
            for x in 0..src.width() {
                // SAFETY: Loop bounds match the view extents.
                out[idx] = unsafe { *src.get_unchecked(x, y, z) };
                idx += 1;
            }
        }
    }
}
