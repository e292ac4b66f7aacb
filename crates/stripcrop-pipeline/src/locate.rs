//! Region location: derive a single bounding rectangle from an edge map.
//!
//! This module defines the [`RegionLocator`] trait shared by every
//! detection strategy and the [`StrategyKind`] enum for selecting one at
//! runtime.
//!
//! # Strategy pattern
//!
//! The density strategy is cheap and always produces a rectangle, falling
//! back to a centered slice when the edges are inconclusive. The contour
//! strategy is more selective and may report that nothing strip-like was
//! found. Both consume the same edge map and return the same
//! [`DetectionResult`], so callers switch between them through
//! configuration alone.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{CropConfig, CropError, DetectionResult, Dimensions, EdgeMap};

/// Selects which region-location strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StrategyKind {
    /// Column/row edge-density scan. Never fails; degrades to the
    /// horizontally centered half-width slice.
    #[default]
    DensityProfile,
    /// Closed-contour polygon filtering with a lenient fallback pass.
    /// Reports [`CropError::NoRegionFound`] when nothing matches.
    ContourPolygon,
}

impl StrategyKind {
    /// Whether the intensity map is smoothed before edge detection.
    ///
    /// Only the contour strategy blurs; the density strategy relies on
    /// thresholded column counts that sensor noise rarely survives.
    #[must_use]
    pub const fn smooths_input(self) -> bool {
        matches!(self, Self::ContourPolygon)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DensityProfile => f.write_str("density"),
            Self::ContourPolygon => f.write_str("contour"),
        }
    }
}

/// Trait for region-location strategies.
///
/// Input: an edge map with the source image's dimensions.
/// Output: a [`DetectionResult`] whose rectangle (when present) lies
/// inside `dimensions`.
pub trait RegionLocator {
    /// Locate the strip in the given edge map.
    ///
    /// # Errors
    ///
    /// Returns [`CropError::ProcessingFailed`] if `edges` does not match
    /// `dimensions` or a bounds computation overflows.
    fn locate(
        &self,
        edges: &EdgeMap,
        dimensions: Dimensions,
        config: &CropConfig,
    ) -> Result<DetectionResult, CropError>;
}

impl RegionLocator for StrategyKind {
    fn locate(
        &self,
        edges: &EdgeMap,
        dimensions: Dimensions,
        config: &CropConfig,
    ) -> Result<DetectionResult, CropError> {
        if edges.dimensions() != (dimensions.width, dimensions.height) {
            return Err(CropError::ProcessingFailed(format!(
                "edge map is {}x{} but the image is {dimensions}",
                edges.width(),
                edges.height(),
            )));
        }
        match *self {
            Self::DensityProfile => crate::density::locate_density(edges, dimensions, config),
            Self::ContourPolygon => crate::contour::locate_contour(edges, dimensions, config),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{DetectionMethod, GrayImage};

    #[test]
    fn default_is_density() {
        assert_eq!(StrategyKind::default(), StrategyKind::DensityProfile);
    }

    #[test]
    fn only_contour_smooths() {
        assert!(StrategyKind::ContourPolygon.smooths_input());
        assert!(!StrategyKind::DensityProfile.smooths_input());
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let edges = GrayImage::new(10, 10);
        let dims = Dimensions {
            width: 10,
            height: 11,
        };
        let result = StrategyKind::DensityProfile.locate(&edges, dims, &CropConfig::default());
        assert!(matches!(result, Err(CropError::ProcessingFailed(_))));
    }

    #[test]
    fn strategies_share_the_contract_on_blank_input() {
        let edges = GrayImage::new(40, 80);
        let dims = Dimensions {
            width: 40,
            height: 80,
        };
        let config = CropConfig::default();

        let density = StrategyKind::DensityProfile
            .locate(&edges, dims, &config)
            .unwrap();
        assert!(density.success);
        assert_eq!(density.method, DetectionMethod::DensityFallback);

        let contour = StrategyKind::ContourPolygon
            .locate(&edges, dims, &config)
            .unwrap();
        assert!(!contour.success);
        assert!(contour.rect.is_none());
    }

    #[test]
    fn display_names() {
        assert_eq!(StrategyKind::DensityProfile.to_string(), "density");
        assert_eq!(StrategyKind::ContourPolygon.to_string(), "contour");
    }
}
