//! Pile grid inference.
//!
//! The layout is a fixed 4 x 13 lattice, so its geometry is fully
//! determined by the bounding extents of the rough detections: the leftmost
//! and rightmost glyph anchors are 3 column gaps apart, the topmost and
//! bottommost 12 row gaps apart.

use tracing::debug;

use crate::config::Config;
use crate::error::GeometryError;
use crate::geometry::Rect;
use crate::scan::RoughScan;
use crate::tableau::{PILE_COUNT, PILE_SIZE};

/// Spacing and origin of the recognized lattice, in capture pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridGeometry {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
    pub column_spacing: i32,
    pub row_spacing: i32,
}

impl GridGeometry {
    /// Derive the lattice from rough detection extents. A pure function of
    /// the scan: the same detections always yield the same geometry.
    ///
    /// Fails when the extents collapse on either axis, which happens when
    /// the rough pass found detections in only one column or one row;
    /// nothing downstream can work without both spacings.
    pub fn infer(scan: &RoughScan) -> Result<Self, GeometryError> {
        let mut detections = scan.all();
        let first = detections.next().ok_or(GeometryError::NoDetections)?;

        let (mut min_x, mut max_x) = (first.left, first.left);
        let (mut min_y, mut max_y) = (first.top, first.top);
        for det in detections {
            min_x = min_x.min(det.left);
            max_x = max_x.max(det.left);
            min_y = min_y.min(det.top);
            max_y = max_y.max(det.top);
        }

        let column_spacing = (max_x - min_x) / (PILE_COUNT as i32 - 1);
        let row_spacing = (max_y - min_y) / (PILE_SIZE as i32 - 1);
        if column_spacing <= 0 {
            return Err(GeometryError::DegenerateAxis {
                axis: "column",
                detections: scan.total(),
            });
        }
        if row_spacing <= 0 {
            return Err(GeometryError::DegenerateAxis {
                axis: "row",
                detections: scan.total(),
            });
        }

        debug!(
            min_x,
            max_x, min_y, max_y, column_spacing, row_spacing, "grid inferred"
        );
        Ok(Self {
            min_x,
            max_x,
            min_y,
            max_y,
            column_spacing,
            row_spacing,
        })
    }

    /// Search box for the cell at (`pile`, `row`).
    ///
    /// The box pads the lattice anchor leftward and upward because glyph
    /// anchors drift a little against the inferred lattice, then extends a
    /// full row down so the glyph is covered even at maximum drift. Sizes
    /// truncate toward zero, matching the integer lattice the extents were
    /// measured on.
    pub fn cell_box(&self, pile: usize, row: usize, config: &Config) -> Rect {
        let col_spacing = self.column_spacing as f64;
        let row_spacing = self.row_spacing as f64;
        let anchor_x = (self.min_x + self.column_spacing * pile as i32) as f64;
        let anchor_y = (self.min_y + self.row_spacing * row as i32) as f64;

        Rect::new(
            (anchor_x - col_spacing * config.cell_pad_x_frac) as i32,
            (anchor_y - row_spacing * config.cell_pad_y_frac) as i32,
            (col_spacing * config.cell_width_frac) as u32,
            (row_spacing * config.cell_height_frac) as u32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tableau::Rank;

    fn scan_with_boxes(boxes: &[(i32, i32)]) -> RoughScan {
        let mut scan = RoughScan::default();
        for (i, (left, top)) in boxes.iter().enumerate() {
            let rank = Rank::ORDERED[i % Rank::ORDERED.len()];
            scan.consider(rank, Rect::new(*left, *top, 12, 16));
        }
        scan
    }

    #[test]
    fn test_infer_recovers_exact_lattice() {
        // corners of a 150 x 60 lattice
        let scan = scan_with_boxes(&[(100, 80), (550, 80), (100, 800), (550, 800)]);
        let geometry = GridGeometry::infer(&scan).unwrap();

        assert_eq!(geometry.column_spacing, 150);
        assert_eq!(geometry.row_spacing, 60);
        assert_eq!(geometry.min_x, 100);
        assert_eq!(geometry.max_y, 800);
    }

    #[test]
    fn test_infer_is_deterministic() {
        let scan = scan_with_boxes(&[(100, 80), (550, 80), (130, 790), (550, 800), (400, 300)]);
        let a = GridGeometry::infer(&scan).unwrap();
        let b = GridGeometry::infer(&scan).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_infer_truncates_spacing() {
        // spread of 449 -> 449 / 3 = 149 (truncated), 799 / 12 = 66
        let scan = scan_with_boxes(&[(100, 80), (549, 879)]);
        let geometry = GridGeometry::infer(&scan).unwrap();

        assert_eq!(geometry.column_spacing, 149);
        assert_eq!(geometry.row_spacing, 66);
    }

    #[test]
    fn test_infer_rejects_empty_scan() {
        let scan = RoughScan::default();
        assert!(matches!(
            GridGeometry::infer(&scan),
            Err(GeometryError::NoDetections)
        ));
    }

    #[test]
    fn test_infer_rejects_single_column() {
        let scan = scan_with_boxes(&[(100, 80), (100, 400), (100, 800)]);
        let err = GridGeometry::infer(&scan).unwrap_err();
        assert!(matches!(
            err,
            GeometryError::DegenerateAxis { axis: "column", .. }
        ));
    }

    #[test]
    fn test_infer_rejects_single_row() {
        let scan = scan_with_boxes(&[(100, 80), (300, 80), (550, 80)]);
        let err = GridGeometry::infer(&scan).unwrap_err();
        assert!(matches!(
            err,
            GeometryError::DegenerateAxis { axis: "row", .. }
        ));
    }

    #[test]
    fn test_cell_box_applies_configured_fractions() {
        let scan = scan_with_boxes(&[(100, 80), (550, 80), (100, 800), (550, 800)]);
        let geometry = GridGeometry::infer(&scan).unwrap();
        // dyadic fractions keep every product exact
        let config = Config {
            cell_pad_x_frac: 0.0625,
            cell_width_frac: 0.25,
            cell_pad_y_frac: 0.25,
            cell_height_frac: 1.0,
            ..Config::default()
        };

        // pile 2, row 5: anchor = (100 + 300, 80 + 300) = (400, 380)
        let cell = geometry.cell_box(2, 5, &config);
        assert_eq!(cell.left, 390); // 400 - 150 * 0.0625 = 390.625, truncated
        assert_eq!(cell.top, 365); // 380 - 60 * 0.25
        assert_eq!(cell.width, 37); // 150 * 0.25 = 37.5, truncated
        assert_eq!(cell.height, 60);
    }

    #[test]
    fn test_cell_box_truncates_toward_zero() {
        let scan = scan_with_boxes(&[(100, 80), (550, 80), (100, 800), (550, 800)]);
        let geometry = GridGeometry::infer(&scan).unwrap();
        let config = Config::default();

        let cell = geometry.cell_box(0, 0, &config);
        // 80 - 60 * 0.24 = 65.6 truncates to 65, never rounds to 66
        assert_eq!(cell.top, 65);
        // width/height land within one ulp of 36 / 61.2 either way
        assert!(cell.width == 35 || cell.width == 36);
        assert!(cell.height == 61);
    }

    #[test]
    fn test_cell_box_may_hang_off_the_capture() {
        let scan = scan_with_boxes(&[(2, 5), (452, 5), (2, 725), (452, 725)]);
        let geometry = GridGeometry::infer(&scan).unwrap();
        let config = Config::default();

        let cell = geometry.cell_box(0, 0, &config);
        assert!(cell.left < 0);
        assert!(cell.top < 0);
    }
}
