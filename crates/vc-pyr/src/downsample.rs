use vc_core::{Volume, VolumeView};

/// 2x2x2 mean downsample into a preallocated destination volume.
///
/// Destination extents must be `(w / 2, h / 2, d / 2)` of the source; odd
/// trailing columns/rows/slices are dropped.
pub fn downsample2x2x2_mean_f32_into(src: &VolumeView<'_, f32>, dst: &mut Volume<f32>) {
    let dst_w = src.width() / 2;
    let dst_h = src.height() / 2;
    let dst_d = src.depth() / 2;
    debug_assert_eq!(dst.width(), dst_w);
    debug_assert_eq!(dst.height(), dst_h);
    debug_assert_eq!(dst.depth(), dst_d);

    if dst_w == 0 || dst_h == 0 || dst_d == 0 {
        return;
    }

    let out = dst.data_mut();
    let mut idx = 0usize;
    for z in 0..dst_d {
        let sz = z * 2;
        for y in 0..dst_h {
            let sy = y * 2;
            for x in 0..dst_w {
                let sx = x * 2;
                let mut acc = 0.0f32;
                for kz in 0..2 {
                    for ky in 0..2 {
                        for kx in 0..2 {
                            // SAFETY: `sx + kx < 2 * dst_w <= width` and
                            // likewise for the other axes.
                            acc += unsafe { *src.get_unchecked(sx + kx, sy + ky, sz + kz) };
                        }
                    }
                }
                out[idx] = acc * 0.125;
                idx += 1;
            }
        }
    }
}
