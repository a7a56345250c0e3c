use crate::Error;

/// Bit depth of a raw intensity buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitDepth {
    U8,
    U16,
}

/// Byte ordering of 16-bit raw intensity buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// Owned 3D scalar field stored slice-major (`z`, then `y`, then `x`).
#[derive(Debug, Clone, PartialEq)]
pub struct Volume<T> {
    width: usize,
    height: usize,
    depth: usize,
    data: Vec<T>,
}

impl<T> Volume<T> {
    pub fn from_vec(width: usize, height: usize, depth: usize, data: Vec<T>) -> Result<Self, Error> {
        let expected = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(depth))
            .ok_or(Error::SizeMismatch {
                expected: usize::MAX,
                actual: data.len(),
            })?;

        if data.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            depth,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<&T> {
        if x >= self.width || y >= self.height || z >= self.depth {
            return None;
        }
        self.data.get((z * self.height + y) * self.width + x)
    }

    pub fn get_mut(&mut self, x: usize, y: usize, z: usize) -> Option<&mut T> {
        if x >= self.width || y >= self.height || z >= self.depth {
            return None;
        }
        self.data.get_mut((z * self.height + y) * self.width + x)
    }

    pub fn as_view(&self) -> VolumeView<'_, T> {
        VolumeView {
            width: self.width,
            height: self.height,
            depth: self.depth,
            row_stride: self.width,
            slice_stride: self.width * self.height,
            data: &self.data,
        }
    }
}

impl<T: Clone> Volume<T> {
    pub fn new_fill(width: usize, height: usize, depth: usize, value: T) -> Self {
        let len = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(depth))
            .expect("volume size overflow");
        Self {
            width,
            height,
            depth,
            data: vec![value; len],
        }
    }
}

impl Volume<f32> {
    /// Decodes a raw intensity buffer into an `f32` volume.
    ///
    /// `header_len` bytes are skipped before the first voxel. 16-bit data is
    /// decoded with the requested byte order; 8-bit data ignores `endian`.
    pub fn from_raw(
        bytes: &[u8],
        header_len: usize,
        width: usize,
        height: usize,
        depth: usize,
        bit_depth: BitDepth,
        endian: Endian,
    ) -> Result<Self, Error> {
        let voxels = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(depth))
            .ok_or(Error::SizeMismatch {
                expected: usize::MAX,
                actual: bytes.len(),
            })?;
        let bytes_per_voxel = match bit_depth {
            BitDepth::U8 => 1,
            BitDepth::U16 => 2,
        };
        let needed = voxels * bytes_per_voxel;
        let payload = bytes.get(header_len..).ok_or(Error::TruncatedBuffer {
            expected: needed,
            actual: 0,
        })?;
        if payload.len() < needed {
            return Err(Error::TruncatedBuffer {
                expected: needed,
                actual: payload.len(),
            });
        }

        let data = match bit_depth {
            BitDepth::U8 => payload[..needed].iter().map(|&b| b as f32).collect(),
            BitDepth::U16 => payload[..needed]
                .chunks_exact(2)
                .map(|pair| {
                    let raw = [pair[0], pair[1]];
                    let v = match endian {
                        Endian::Little => u16::from_le_bytes(raw),
                        Endian::Big => u16::from_be_bytes(raw),
                    };
                    v as f32
                })
                .collect(),
        };

        Self::from_vec(width, height, depth, data)
    }
}

/// Borrowed, read-only view into a 3D scalar field.
#[derive(Debug, Clone, Copy)]
pub struct VolumeView<'a, T> {
    width: usize,
    height: usize,
    depth: usize,
    row_stride: usize,
    slice_stride: usize,
    data: &'a [T],
}

impl<'a, T> VolumeView<'a, T> {
    pub fn from_slice(
        width: usize,
        height: usize,
        depth: usize,
        row_stride: usize,
        slice_stride: usize,
        data: &'a [T],
    ) -> Result<Self, Error> {
        if row_stride < width || slice_stride < row_stride.saturating_mul(height) {
            return Err(Error::InvalidStride);
        }

        let min_len = slice_stride.checked_mul(depth).ok_or(Error::SizeMismatch {
            expected: usize::MAX,
            actual: data.len(),
        })?;

        if data.len() < min_len {
            return Err(Error::SizeMismatch {
                expected: min_len,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            depth,
            row_stride,
            slice_stride,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.height || z >= self.depth {
            return None;
        }
        self.data.get(z * self.slice_stride + y * self.row_stride + x)
    }

    /// Returns a voxel reference without bounds checks.
    ///
    /// # Safety
    /// Caller must guarantee `x < self.width()`, `y < self.height()` and
    /// `z < self.depth()`.
    pub unsafe fn get_unchecked(&self, x: usize, y: usize, z: usize) -> &'a T {
        // SAFETY: Caller guarantees the indices are inside the extents. With
        // view invariants this implies the flat index is in bounds of `data`.
        unsafe {
            self.data
                .get_unchecked(z * self.slice_stride + y * self.row_stride + x)
        }
    }
}

pub fn to_f32_u8(vol: &Volume<u8>) -> Volume<f32> {
    let data = vol.data().iter().map(|&v| v as f32).collect();
    Volume::from_vec(vol.width(), vol.height(), vol.depth(), data)
        .expect("source volume has consistent extents")
}

pub fn to_f32_u16(vol: &Volume<u16>) -> Volume<f32> {
    let data = vol.data().iter().map(|&v| v as f32).collect();
    Volume::from_vec(vol.width(), vol.height(), vol.depth(), data)
        .expect("source volume has consistent extents")
}

#[cfg(test)]
mod tests {
    use super::{BitDepth, Endian, Volume, VolumeView, to_f32_u8, to_f32_u16};

    #[test]
    fn from_vec_validates_len() {
        assert!(Volume::from_vec(2, 2, 2, vec![0u8; 8]).is_ok());
        assert!(Volume::from_vec(2, 2, 2, vec![0u8; 7]).is_err());
    }

    #[test]
    fn slice_major_indexing() {
        let data: Vec<u8> = (0..24).collect();
        let vol = Volume::from_vec(2, 3, 4, data).expect("valid volume");

        assert_eq!(vol.get(0, 0, 0), Some(&0));
        assert_eq!(vol.get(1, 0, 0), Some(&1));
        assert_eq!(vol.get(0, 1, 0), Some(&2));
        assert_eq!(vol.get(0, 0, 1), Some(&6));
        assert_eq!(vol.get(1, 2, 3), Some(&23));
        assert_eq!(vol.get(2, 0, 0), None);
    }

    #[test]
    fn view_with_padded_strides() {
        // 2x2x2 logical extents inside a 3x2-row, 8-element-slice buffer.
        let data: Vec<u8> = (0..16).collect();
        let view = VolumeView::from_slice(2, 2, 2, 3, 8, &data).expect("valid view");

        assert_eq!(view.get(0, 0, 0), Some(&0));
        assert_eq!(view.get(1, 1, 0), Some(&4));
        assert_eq!(view.get(1, 1, 1), Some(&12));
        assert_eq!(view.get(0, 0, 2), None);
        assert!(VolumeView::from_slice(4, 2, 2, 3, 8, &data).is_err());
    }

    #[test]
    fn raw_import_u8_with_header() {
        let mut bytes = vec![0xAAu8; 3];
        bytes.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let vol = Volume::from_raw(&bytes, 3, 2, 2, 2, BitDepth::U8, Endian::Little)
            .expect("valid raw buffer");
        assert_eq!(vol.data()[0], 1.0);
        assert_eq!(vol.data()[7], 8.0);
    }

    #[test]
    fn raw_import_u16_endianness() {
        let bytes = [0x01, 0x02, 0x03, 0x04];
        let le = Volume::from_raw(&bytes, 0, 2, 1, 1, BitDepth::U16, Endian::Little)
            .expect("valid raw buffer");
        let be = Volume::from_raw(&bytes, 0, 2, 1, 1, BitDepth::U16, Endian::Big)
            .expect("valid raw buffer");
        assert_eq!(le.data(), &[0x0201 as f32, 0x0403 as f32]);
        assert_eq!(be.data(), &[0x0102 as f32, 0x0304 as f32]);
    }

    #[test]
    fn raw_import_rejects_truncated_buffer() {
        let bytes = [0u8; 7];
        assert!(Volume::from_raw(&bytes, 0, 2, 2, 2, BitDepth::U8, Endian::Little).is_err());
        assert!(Volume::from_raw(&bytes, 8, 1, 1, 1, BitDepth::U8, Endian::Little).is_err());
    }

    #[test]
    fn convert_to_f32_variants() {
        let v8 = Volume::from_vec(2, 1, 1, vec![1u8, 2]).expect("valid volume");
        assert_eq!(to_f32_u8(&v8).data(), &[1.0, 2.0]);

        let v16 = Volume::from_vec(2, 1, 1, vec![300u16, 400]).expect("valid volume");
        assert_eq!(to_f32_u16(&v16).data(), &[300.0, 400.0]);
    }
}
