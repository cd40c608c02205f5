//! Spot detection: color segmentation and centroid clustering.

mod locate;
mod segment;

pub use locate::{locate_spots, SpotClusters};
pub use segment::{is_marker_color, segment_markers, ColorMask};
