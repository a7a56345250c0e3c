//! Volume pyramid primitives for coarse-to-fine correlation search.
//!
//! `vc-pyr` uses a fixed 2x2x2 mean downsample (box filter) and favors
//! throughput over filter quality.
//!
//! Drop-odd policy:
//! - Output extents are `(w / 2, h / 2, d / 2)`.
//! - If a source extent is odd, the trailing column/row/slice is dropped.
//!
//! Representational meaning:
//! - Each destination voxel is the arithmetic mean of one 2x2x2 source block.
//! - A coordinate `c` at level `L` corresponds to `c * 2^L` at level 0.

mod downsample;
mod pyramid;

pub use downsample::downsample2x2x2_mean_f32_into;
pub use pyramid::VolumePyramidF32;
