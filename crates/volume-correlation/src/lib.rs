//! Umbrella crate for the `volume-correlation` workspace.
//!
//! Re-exports the leaf crates so applications can depend on a single crate:
//! volume containers and sampling, pyramids, masks, subvolume templates, the
//! transform search and the point-cloud driver.

pub use vc_core::*;
pub use vc_correlate::*;
pub use vc_mask::*;
pub use vc_pyr::*;
pub use vc_search::*;
pub use vc_subvol::*;
