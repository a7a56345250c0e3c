//! Subvolume template construction.
//!
//! A template is a fixed, ordered set of voxel offsets around a search
//! point. It is built once per run from the configured geometry and reused
//! for reference sampling and for every candidate evaluation during search;
//! only a per-point filtering step (gray thresholds, mask) narrows the
//! offset set before a search starts.

mod template;

pub use template::{FilteredTemplate, SubvolShape, SubvolTemplate, TemplateFilter};
