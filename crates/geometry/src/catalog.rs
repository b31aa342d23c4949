//! Static paper-size and drawing-ratio catalogs
//!
//! Both tables ship with the crate and are not editable at runtime.

use serde::Serialize;

/// A physical sheet size in inches
///
/// Entries are immutable and come from [`PAPER_SIZES`]. Names are unique
/// within the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PaperSize {
    /// Catalog key (e.g. "ARCH A", "A4")
    pub name: &'static str,
    /// Sheet width in inches
    pub width_inches: f64,
    /// Sheet height in inches
    pub height_inches: f64,
}

impl PaperSize {
    const fn new(name: &'static str, width_inches: f64, height_inches: f64) -> Self {
        Self { name, width_inches, height_inches }
    }
}

/// Architectural and ISO A-series sheets, portrait orientation
pub const PAPER_SIZES: [PaperSize; 10] = [
    PaperSize::new("ARCH A", 9.0, 12.0),
    PaperSize::new("ARCH B", 12.0, 18.0),
    PaperSize::new("ARCH C", 18.0, 24.0),
    PaperSize::new("ARCH D", 24.0, 36.0),
    PaperSize::new("ARCH E", 36.0, 48.0),
    PaperSize::new("A0", 33.1, 46.8),
    PaperSize::new("A1", 23.4, 33.1),
    PaperSize::new("A2", 16.5, 23.4),
    PaperSize::new("A3", 11.7, 16.5),
    PaperSize::new("A4", 8.3, 11.7),
];

/// Drawing ratios offered to the user, in "A:B" form
pub const DISTANCE_RATIOS: [&str; 25] = [
    "1:10", "1:15", "1:20", "1:25", "1:30", "1:40", "1:50", "1:75", "1:100", "1:125", "1:150",
    "1:200", "1:250", "1:300", "1:600", "1:750", "1:1000", "1:1250", "1:1500", "1:2000",
    "1:2500", "1:3000", "1:4000", "1:5000", "1:10000",
];

/// Look up a paper size by its catalog name
pub fn find_paper_size(name: &str) -> Option<&'static PaperSize> {
    PAPER_SIZES.iter().find(|paper| paper.name == name)
}
