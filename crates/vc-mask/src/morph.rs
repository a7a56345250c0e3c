use vc_core::{Volume, VolumeView};

/// One binary erosion pass with a full 3x3x3 structuring element.
///
/// A voxel survives only if its complete 27-neighborhood is set; volume
/// borders count as unset.
pub fn erode3x3x3_binary_u8(src: &VolumeView<'_, u8>) -> Volume<u8> {
    let mut out = Volume::new_fill(src.width(), src.height(), src.depth(), 0u8);
    if src.width() == 0 || src.height() == 0 || src.depth() == 0 {
        return out;
    }

    for z in 0..src.depth() {
        for y in 0..src.height() {
            for x in 0..src.width() {
                let mut all_set = true;
                'probe: for dz in -1isize..=1 {
                    let nz = z as isize + dz;
                    if nz < 0 || nz >= src.depth() as isize {
                        all_set = false;
                        break;
                    }
                    for dy in -1isize..=1 {
                        let ny = y as isize + dy;
                        if ny < 0 || ny >= src.height() as isize {
                            all_set = false;
                            break 'probe;
                        }
                        for dx in -1isize..=1 {
                            let nx = x as isize + dx;
                            if nx < 0 || nx >= src.width() as isize {
                                all_set = false;
                                break 'probe;
                            }
                            let v = src
                                .get(nx as usize, ny as usize, nz as usize)
                                .expect("in-bounds neighborhood access");
                            if *v == 0 {
                                all_set = false;
                                break 'probe;
                            }
                        }
                    }
                }

                *out.get_mut(x, y, z).expect("in-bounds write in erode3x3x3") =
                    if all_set { 255 } else { 0 };
            }
        }
    }

    out
}

/// One binary dilation pass with a full 3x3x3 structuring element.
pub fn dilate3x3x3_binary_u8(src: &VolumeView<'_, u8>) -> Volume<u8> {
    let mut out = Volume::new_fill(src.width(), src.height(), src.depth(), 0u8);
    if src.width() == 0 || src.height() == 0 || src.depth() == 0 {
        return out;
    }

    for z in 0..src.depth() {
        for y in 0..src.height() {
            for x in 0..src.width() {
                let mut any_set = false;
                'probe: for dz in -1isize..=1 {
                    let nz = z as isize + dz;
                    if nz < 0 || nz >= src.depth() as isize {
                        continue;
                    }
                    for dy in -1isize..=1 {
                        let ny = y as isize + dy;
                        if ny < 0 || ny >= src.height() as isize {
                            continue;
                        }
                        for dx in -1isize..=1 {
                            let nx = x as isize + dx;
                            if nx < 0 || nx >= src.width() as isize {
                                continue;
                            }
                            let v = src
                                .get(nx as usize, ny as usize, nz as usize)
                                .expect("in-bounds neighborhood access");
                            if *v != 0 {
                                any_set = true;
                                break 'probe;
                            }
                        }
                    }
                }

                *out.get_mut(x, y, z)
                    .expect("in-bounds write in dilate3x3x3") = if any_set { 255 } else { 0 };
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use vc_core::Volume;

    use super::{dilate3x3x3_binary_u8, erode3x3x3_binary_u8};

    #[test]
    fn erode_removes_isolated_voxel() {
        let mut vol = Volume::new_fill(5, 5, 5, 0u8);
        *vol.get_mut(2, 2, 2).expect("in bounds") = 255;

        let out = erode3x3x3_binary_u8(&vol.as_view());
        assert!(out.data().iter().all(|&v| v == 0));
    }

    #[test]
    fn dilate_grows_isolated_voxel_to_block() {
        let mut vol = Volume::new_fill(5, 5, 5, 0u8);
        *vol.get_mut(2, 2, 2).expect("in bounds") = 255;

        let out = dilate3x3x3_binary_u8(&vol.as_view());
        assert_eq!(out.data().iter().filter(|&&v| v > 0).count(), 27);
        assert_eq!(out.get(1, 1, 1), Some(&255));
        assert_eq!(out.get(0, 2, 2), Some(&0));
    }
}
