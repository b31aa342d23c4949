//! Drawing-ratio parsing and scale computation
//!
//! A drawing ratio "A:B" means one drawing unit stands for B/A real-world
//! units. Combined with the physical size of the sheet the drawing was
//! printed on and the pixel size of the rasterized page, it yields the
//! factor that turns a pixel distance into a real-world distance.

use crate::catalog::PaperSize;
use crate::coords::{pixel_distance_between, Point};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Points per inch (PDF user-space unit)
pub const POINTS_PER_INCH: f64 = 72.0;

/// Suffix used when formatting real-world distances
const DISTANCE_UNIT: &str = "in";

/// Errors raised by scale computations
///
/// None of these are fatal: callers surface them to the user as warnings and
/// keep their previous state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScaleError {
    /// Ratio string is not two positive integers separated by ':'
    #[error("invalid ratio format: {0:?} (expected \"A:B\" with positive integers)")]
    InvalidRatioFormat(String),

    /// No paper size has been chosen yet
    #[error("select a paper size before computing the scale")]
    NoPaperSizeSelected,

    /// No rasterized page is loaded, or it has no area
    #[error("load a PDF page before computing the scale")]
    NoBackgroundImage,
}

/// A parsed "A:B" drawing ratio
///
/// Serialized as its "A:B" string; deserialization goes through [`FromStr`],
/// so both parts are always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScaleRatio {
    /// Drawing units (A)
    drawing: u64,
    /// Real-world units (B)
    real: u64,
}

impl ScaleRatio {
    /// Create a ratio from its two parts; both must be non-zero
    pub fn new(drawing: u64, real: u64) -> Result<Self, ScaleError> {
        if drawing == 0 || real == 0 {
            return Err(ScaleError::InvalidRatioFormat(format!("{drawing}:{real}")));
        }
        Ok(Self { drawing, real })
    }

    /// Drawing units (left-hand side)
    pub fn drawing(&self) -> u64 {
        self.drawing
    }

    /// Real-world units (right-hand side)
    pub fn real(&self) -> u64 {
        self.real
    }

    /// Real-world units per drawing unit (B / A)
    pub fn distance_scale(&self) -> f64 {
        self.real as f64 / self.drawing as f64
    }
}

impl FromStr for ScaleRatio {
    type Err = ScaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ScaleError::InvalidRatioFormat(s.to_string());

        let mut parts = s.split(':');
        let (Some(drawing), Some(real), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(invalid());
        };

        let drawing = parse_positive(drawing).ok_or_else(invalid)?;
        let real = parse_positive(real).ok_or_else(invalid)?;

        Ok(Self { drawing, real })
    }
}

impl TryFrom<String> for ScaleRatio {
    type Error = ScaleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ScaleRatio> for String {
    fn from(ratio: ScaleRatio) -> Self {
        ratio.to_string()
    }
}

impl fmt::Display for ScaleRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.drawing, self.real)
    }
}

/// Digits only; rejects signs, decimals and zero
fn parse_positive(part: &str) -> Option<u64> {
    let part = part.trim();
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse::<u64>().ok().filter(|value| *value > 0)
}

/// Parse an "A:B" ratio and return B / A
///
/// # Errors
/// Returns [`ScaleError::InvalidRatioFormat`] when the string does not split
/// into exactly two positive integers.
pub fn compute_distance_scale(ratio: &str) -> Result<f64, ScaleError> {
    Ok(ratio.parse::<ScaleRatio>()?.distance_scale())
}

/// Physical sheet size in points: (width, height)
pub fn compute_target_dimensions(paper: &PaperSize) -> (f64, f64) {
    (paper.width_inches * POINTS_PER_INCH, paper.height_inches * POINTS_PER_INCH)
}

/// Pixel dimensions of a rasterized page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl ImageDimensions {
    /// Create new dimensions
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either side is zero
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Scale that fits the rasterized page onto the physical sheet
///
/// Each axis is scaled independently and the smaller factor wins, so the
/// aspect ratio is preserved and neither axis overflows the sheet. The result
/// is multiplied by the drawing ratio's distance scale.
///
/// # Errors
/// - [`ScaleError::NoPaperSizeSelected`] if `target` is `None`
/// - [`ScaleError::NoBackgroundImage`] if `image` is `None` or empty
pub fn compute_zoom_to_fit_scale(
    target: Option<(f64, f64)>,
    image: Option<ImageDimensions>,
    distance_scale: f64,
) -> Result<f64, ScaleError> {
    let (target_width, target_height) = target.ok_or(ScaleError::NoPaperSizeSelected)?;
    let image = image.filter(|dims| !dims.is_empty()).ok_or(ScaleError::NoBackgroundImage)?;

    let scale_x = (target_width / image.width as f64) * distance_scale;
    let scale_y = (target_height / image.height as f64) * distance_scale;

    Ok(scale_x.min(scale_y))
}

/// Resolved scale for one (paper, ratio, page raster) combination
///
/// Converts distances measured in raster pixels into real-world inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeasurementScale {
    paper: PaperSize,
    ratio: ScaleRatio,
    image: ImageDimensions,
    zoom_to_fit: f64,
}

impl MeasurementScale {
    /// Resolve a measurement scale
    ///
    /// # Errors
    /// Returns [`ScaleError::NoBackgroundImage`] for an empty raster.
    pub fn new(
        paper: &PaperSize,
        ratio: ScaleRatio,
        image: ImageDimensions,
    ) -> Result<Self, ScaleError> {
        let zoom_to_fit = compute_zoom_to_fit_scale(
            Some(compute_target_dimensions(paper)),
            Some(image),
            ratio.distance_scale(),
        )?;

        Ok(Self { paper: *paper, ratio, image, zoom_to_fit })
    }

    /// Paper size this scale was resolved for
    pub fn paper(&self) -> &PaperSize {
        &self.paper
    }

    /// Drawing ratio this scale was resolved for
    pub fn ratio(&self) -> ScaleRatio {
        self.ratio
    }

    /// Raster dimensions this scale was resolved for
    pub fn image(&self) -> ImageDimensions {
        self.image
    }

    /// The zoom-to-fit factor (points per pixel times distance scale)
    pub fn zoom_to_fit(&self) -> f64 {
        self.zoom_to_fit
    }

    /// Real-world inches represented by one raster pixel
    pub fn units_per_pixel(&self) -> f64 {
        self.zoom_to_fit / POINTS_PER_INCH
    }

    /// Convert a pixel distance to real-world inches
    pub fn to_real_world(&self, pixel_distance: f64) -> f64 {
        pixel_distance * self.units_per_pixel()
    }

    /// Real-world distance between two raster-pixel positions
    pub fn real_world_distance(&self, p1: Point, p2: Point) -> f64 {
        self.to_real_world(pixel_distance_between(p1, p2))
    }

    /// Format a real-world distance for display
    pub fn format_distance(&self, distance: f64) -> String {
        format!("{:.2}{}", distance, DISTANCE_UNIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::find_paper_size;

    fn arch_a() -> PaperSize {
        *find_paper_size("ARCH A").unwrap()
    }

    #[test]
    fn test_distance_scale() {
        assert_eq!(compute_distance_scale("1:10").unwrap(), 10.0);
        assert_eq!(compute_distance_scale("2:10").unwrap(), 5.0);
        assert_eq!(compute_distance_scale(" 1 : 100 ").unwrap(), 100.0);
    }

    #[test]
    fn test_distance_scale_rejects_malformed() {
        for input in ["abc", "", "1", "1:", ":10", "0:10", "1:0", "1:10:100", "-1:10", "1.5:10", "+1:10"] {
            let err = compute_distance_scale(input).unwrap_err();
            assert_eq!(err, ScaleError::InvalidRatioFormat(input.to_string()), "input {input:?}");
        }
    }

    #[test]
    fn test_ratio_display_roundtrip() {
        let ratio: ScaleRatio = "1:250".parse().unwrap();
        assert_eq!(ratio.drawing(), 1);
        assert_eq!(ratio.real(), 250);
        assert_eq!(ratio.to_string(), "1:250");
    }

    #[test]
    fn test_ratio_serde_validates() {
        let ratio: ScaleRatio = serde_json::from_str("\"1:250\"").unwrap();
        assert_eq!(ratio, ScaleRatio::new(1, 250).unwrap());
        assert_eq!(serde_json::to_string(&ratio).unwrap(), "\"1:250\"");

        let rejected = [
            r#"{"drawing":0,"real":10}"#,
            r#"{"drawing":1,"real":10}"#,
            "\"0:10\"",
            "\"1:\"",
        ];
        for input in rejected {
            assert!(serde_json::from_str::<ScaleRatio>(input).is_err(), "input {input}");
        }
    }

    #[test]
    fn test_ratio_new_rejects_zero() {
        assert!(ScaleRatio::new(0, 5).is_err());
        assert!(ScaleRatio::new(5, 0).is_err());
        assert_eq!(ScaleRatio::new(4, 10).unwrap().distance_scale(), 2.5);
    }

    #[test]
    fn test_target_dimensions() {
        assert_eq!(compute_target_dimensions(&arch_a()), (648.0, 864.0));
    }

    #[test]
    fn test_zoom_to_fit_picks_smaller_axis() {
        let zoom = compute_zoom_to_fit_scale(
            Some((648.0, 864.0)),
            Some(ImageDimensions::new(1000, 1000)),
            10.0,
        )
        .unwrap();
        assert!((zoom - 6.48).abs() < 1e-9);

        // Tall raster: the Y axis is the limiting one
        let zoom = compute_zoom_to_fit_scale(
            Some((648.0, 864.0)),
            Some(ImageDimensions::new(100, 1000)),
            1.0,
        )
        .unwrap();
        assert!((zoom - 0.864).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_to_fit_errors() {
        assert_eq!(
            compute_zoom_to_fit_scale(None, Some(ImageDimensions::new(10, 10)), 1.0),
            Err(ScaleError::NoPaperSizeSelected)
        );
        assert_eq!(
            compute_zoom_to_fit_scale(Some((648.0, 864.0)), None, 1.0),
            Err(ScaleError::NoBackgroundImage)
        );
        assert_eq!(
            compute_zoom_to_fit_scale(Some((648.0, 864.0)), Some(ImageDimensions::new(0, 10)), 1.0),
            Err(ScaleError::NoBackgroundImage)
        );
    }

    #[test]
    fn test_measurement_scale_real_world_distance() {
        // 648x864pt sheet rasterized at 1pt per pixel, drawn at 1:10
        let scale = MeasurementScale::new(
            &arch_a(),
            "1:10".parse().unwrap(),
            ImageDimensions::new(648, 864),
        )
        .unwrap();

        assert!((scale.zoom_to_fit() - 10.0).abs() < 1e-9);

        // 72 pixels = 1 inch on paper = 10 inches in the world
        let distance = scale.real_world_distance(Point::new(0.0, 0.0), Point::new(72.0, 0.0));
        assert!((distance - 10.0).abs() < 1e-9);
        assert_eq!(scale.format_distance(distance), "10.00in");
    }

    #[test]
    fn test_measurement_scale_rejects_empty_image() {
        let result = MeasurementScale::new(
            &arch_a(),
            "1:10".parse().unwrap(),
            ImageDimensions::new(0, 0),
        );
        assert_eq!(result.unwrap_err(), ScaleError::NoBackgroundImage);
    }
}
