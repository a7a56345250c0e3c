//! Foundational primitives for digital volume correlation.
//!
//! ## Volume Views and Stride
//! Volumes use element strides (not byte strides). `row_stride` is the
//! distance, in elements, between adjacent row starts and `slice_stride` the
//! distance between adjacent slice starts. Both may exceed the nominal
//! extents, which allows borrowed views over padded buffers.
//!
//! ## Sampling Coordinates
//! Sampling uses voxel-center coordinates where integer coordinates refer to
//! voxel centers. Nearest-neighbor uses round-to-nearest integer indices;
//! trilinear uses the floor-based 2x2x2 neighborhood and tricubic the
//! floor-based 4x4x4 neighborhood.
//!
//! ## Out-of-bounds Policy
//! Samplers return `None` whenever the full interpolation support does not
//! lie inside the volume. There is no extrapolation: correlation treats an
//! out-of-bounds sample as a non-evaluable candidate.

mod error;
mod geom;
mod sample;
mod volume;

pub use error::Error;
pub use geom::{Point3f, Vec3f};
pub use sample::{Interpolation, sample, sample_nearest, sample_tricubic, sample_trilinear};
pub use volume::{BitDepth, Endian, Volume, VolumeView, to_f32_u8, to_f32_u16};
