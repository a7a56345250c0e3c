//! Point-cloud volume correlation driver.
//!
//! Ties the leaf crates together: builds the subvolume template and the
//! volume pyramids once, then runs the per-point transform search over a
//! point cloud, in parallel, producing exactly one result row per input
//! point.

mod params;
mod pointcloud;
mod results;
mod run;

pub use params::{ConfigError, SearchParameters};
pub use vc_search::{DofCount, DofSchedule};
pub use pointcloud::{Point, PointCloud};
pub use results::{CorrelationResult, PointStatus, ResultsTable};
pub use run::{CancelToken, run};
