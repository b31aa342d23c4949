//! Drawboard Geometry Library
//!
//! Pure conversions between canvas pixel space, logical (Cartesian) space and
//! real-world distances for a drawing printed on a known paper size at a
//! known drawing ratio.
//!
//! # Example
//!
//! ```
//! use drawboard_geometry::{
//!     compute_distance_scale, compute_target_dimensions, compute_zoom_to_fit_scale,
//!     find_paper_size, ImageDimensions,
//! };
//!
//! let paper = find_paper_size("ARCH A").unwrap();
//! let target = compute_target_dimensions(paper);
//! let distance_scale = compute_distance_scale("1:10").unwrap();
//!
//! let zoom = compute_zoom_to_fit_scale(
//!     Some(target),
//!     Some(ImageDimensions::new(1000, 1000)),
//!     distance_scale,
//! )
//! .unwrap();
//! assert!((zoom - 6.48).abs() < 1e-9);
//! ```

mod catalog;
mod coords;
mod scale;

pub use catalog::{find_paper_size, PaperSize, DISTANCE_RATIOS, PAPER_SIZES};
pub use coords::{canvas_to_logical, logical_to_canvas, pixel_distance_between, Point, Quadrant};
pub use scale::{
    compute_distance_scale, compute_target_dimensions, compute_zoom_to_fit_scale,
    ImageDimensions, MeasurementScale, ScaleError, ScaleRatio, POINTS_PER_INCH,
};
