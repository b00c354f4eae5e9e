use std::fmt;

use crate::PlacementAnalysis;

// Every feature is mapped into [0.0, 1.0] where higher is always better.
// Normalization ranges are practical values on a 10x20 board, not maxima;
// anything beyond the range saturates.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureSignal {
    Positive,
    Negative,
}

pub trait FeatureSource: fmt::Debug {
    const MAX_VALUE: f32;
    const SIGNAL: FeatureSignal;

    fn name(&self) -> &'static str;
    fn measure_raw(&self, analysis: &PlacementAnalysis) -> u32;

    #[expect(clippy::cast_precision_loss)]
    fn normalized(&self, analysis: &PlacementAnalysis) -> f32 {
        let norm = (self.measure_raw(analysis) as f32 / Self::MAX_VALUE).clamp(0.0, 1.0);
        match Self::SIGNAL {
            FeatureSignal::Positive => norm,
            FeatureSignal::Negative => 1.0 - norm,
        }
    }
}

// Empty cells under a filled cell. The strongest losing factor; a handful
// of holes already makes recovery hard.
#[derive(Debug)]
pub struct HolesFeature;

impl FeatureSource for HolesFeature {
    const MAX_VALUE: f32 = 12.0;
    const SIGNAL: FeatureSignal = FeatureSignal::Negative;

    fn name(&self) -> &'static str {
        "Holes"
    }

    fn measure_raw(&self, analysis: &PlacementAnalysis) -> u32 {
        analysis.board_analysis().num_holes()
    }
}

// Horizontal occupied/empty changes inside the grid. Walls are ignored.
//
// Typical ranges:
//   0-20  : flat, compact stack
//   40+   : fragmented rows that are hard to clear
#[derive(Debug)]
pub struct RowTransitionsFeature;

impl FeatureSource for RowTransitionsFeature {
    const MAX_VALUE: f32 = 60.0;
    const SIGNAL: FeatureSignal = FeatureSignal::Negative;

    fn name(&self) -> &'static str {
        "Row Transitions"
    }

    fn measure_raw(&self, analysis: &PlacementAnalysis) -> u32 {
        analysis.board_analysis().row_transitions()
    }
}

#[derive(Debug)]
pub struct ColumnTransitionsFeature;

impl FeatureSource for ColumnTransitionsFeature {
    const MAX_VALUE: f32 = 40.0;
    const SIGNAL: FeatureSignal = FeatureSignal::Negative;

    fn name(&self) -> &'static str {
        "Column Transitions"
    }

    fn measure_raw(&self, analysis: &PlacementAnalysis) -> u32 {
        analysis.board_analysis().column_transitions()
    }
}

#[derive(Debug)]
pub struct BumpinessFeature;

impl FeatureSource for BumpinessFeature {
    const MAX_VALUE: f32 = 30.0;
    const SIGNAL: FeatureSignal = FeatureSignal::Negative;

    fn name(&self) -> &'static str {
        "Bumpiness"
    }

    fn measure_raw(&self, analysis: &PlacementAnalysis) -> u32 {
        analysis.board_analysis().surface_bumpiness()
    }
}

// Distance to topping out. Only the upper half of the board is dangerous,
// so heights up to 5 are free.
#[derive(Debug)]
pub struct MaxHeightFeature;

impl FeatureSource for MaxHeightFeature {
    const MAX_VALUE: f32 = 15.0;
    const SIGNAL: FeatureSignal = FeatureSignal::Negative;

    fn name(&self) -> &'static str {
        "Max Height"
    }

    fn measure_raw(&self, analysis: &PlacementAnalysis) -> u32 {
        u32::from(analysis.board_analysis().max_height().saturating_sub(5))
    }
}

#[derive(Debug)]
pub struct TotalHeightFeature;

impl FeatureSource for TotalHeightFeature {
    const MAX_VALUE: f32 = 100.0;
    const SIGNAL: FeatureSignal = FeatureSignal::Negative;

    fn name(&self) -> &'static str {
        "Total Height"
    }

    fn measure_raw(&self, analysis: &PlacementAnalysis) -> u32 {
        analysis.board_analysis().total_height()
    }
}

// Rows cleared by the placement itself.
#[derive(Debug)]
pub struct LinesClearedFeature;

impl FeatureSource for LinesClearedFeature {
    const MAX_VALUE: f32 = 4.0;
    const SIGNAL: FeatureSignal = FeatureSignal::Positive;

    fn name(&self) -> &'static str {
        "Lines Cleared"
    }

    fn measure_raw(&self, analysis: &PlacementAnalysis) -> u32 {
        u32::try_from(analysis.cleared_lines()).unwrap_or(u32::MAX)
    }
}

// A well on either wall that an I-piece can fill. Only depths up to four pay off.
#[derive(Debug)]
pub struct EdgeWellFeature;

impl FeatureSource for EdgeWellFeature {
    const MAX_VALUE: f32 = 4.0;
    const SIGNAL: FeatureSignal = FeatureSignal::Positive;

    fn name(&self) -> &'static str {
        "Edge Well"
    }

    fn measure_raw(&self, analysis: &PlacementAnalysis) -> u32 {
        u32::from(analysis.board_analysis().edge_well_depth().min(4))
    }
}

pub const FEATURE_COUNT: usize = 8;

/// Display names of the features, in [`Features`] order.
#[must_use]
pub fn feature_names() -> [&'static str; FEATURE_COUNT] {
    [
        HolesFeature.name(),
        RowTransitionsFeature.name(),
        ColumnTransitionsFeature.name(),
        BumpinessFeature.name(),
        MaxHeightFeature.name(),
        TotalHeightFeature.name(),
        LinesClearedFeature.name(),
        EdgeWellFeature.name(),
    ]
}

/// Normalized feature values of a single placement, in [`feature_names`] order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Features([f32; FEATURE_COUNT]);

impl Features {
    #[must_use]
    pub fn measure(analysis: &PlacementAnalysis) -> Self {
        Self([
            HolesFeature.normalized(analysis),
            RowTransitionsFeature.normalized(analysis),
            ColumnTransitionsFeature.normalized(analysis),
            BumpinessFeature.normalized(analysis),
            MaxHeightFeature.normalized(analysis),
            TotalHeightFeature.normalized(analysis),
            LinesClearedFeature.normalized(analysis),
            EdgeWellFeature.normalized(analysis),
        ])
    }

    #[must_use]
    pub const fn to_array(&self) -> [f32; FEATURE_COUNT] {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use blockfall_engine::{ActivePiece, Board, PieceKind, Rotation};

    use super::*;

    fn analysis(bottom: &[&str], placement: ActivePiece) -> PlacementAnalysis {
        let mut rows = vec![".........."; 20 - bottom.len()];
        rows.extend_from_slice(bottom);
        PlacementAnalysis::from_board(&Board::from_rows(rows).unwrap(), placement)
    }

    #[test]
    fn test_features_are_normalized() {
        let placement = ActivePiece::new(PieceKind::O, 0, 18, Rotation::SPAWN);
        let features = Features::measure(&analysis(&[], placement));
        for value in features.to_array() {
            assert!((0.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn test_line_clear_is_rewarded() {
        let clear = ActivePiece::new(PieceKind::I, 4, 18, Rotation::SPAWN);
        let features = analysis(&["####....##"], clear);
        assert!((LinesClearedFeature.normalized(&features) - 0.25).abs() < f32::EPSILON);
        assert!((HolesFeature.normalized(&features) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_holes_are_penalized() {
        // S lying flat on an empty floor covers one cell
        let placement = ActivePiece::new(PieceKind::S, 0, 18, Rotation::SPAWN);
        let features = analysis(&[], placement);
        assert_eq!(HolesFeature.measure_raw(&features), 1);
        assert!(HolesFeature.normalized(&features) < 1.0);
    }

    #[test]
    fn test_feature_names() {
        let names = feature_names();
        assert_eq!(names[0], "Holes");
        assert_eq!(names[FEATURE_COUNT - 1], "Edge Well");
    }
}
