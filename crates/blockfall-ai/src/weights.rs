use std::{array, iter};

use crate::{FEATURE_COUNT, Features};

/// Per-feature weights, in [`Features`] order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightSet([f32; FEATURE_COUNT]);

impl WeightSet {
    pub const AGGRO: Self = Self([
        0.40, // Holes
        0.14, // Row Transitions
        0.03, // Column Transitions
        0.06, // Bumpiness
        0.07, // Max Height
        0.01, // Total Height
        0.25, // Lines Cleared
        0.04, // Edge Well
    ]);
    pub const DEFENSIVE: Self = Self([
        0.40, // Holes
        0.16, // Row Transitions
        0.02, // Column Transitions
        0.06, // Bumpiness
        0.22, // Max Height
        0.04, // Total Height
        0.08, // Lines Cleared
        0.02, // Edge Well
    ]);

    #[must_use]
    pub const fn to_array(&self) -> [f32; FEATURE_COUNT] {
        self.0
    }

    /// Linear interpolation from `self` (at 0.0) to `other` (at 1.0).
    #[must_use]
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self(array::from_fn(|i| self.0[i] * (1.0 - t) + other.0[i] * t))
    }

    /// Weights leaning towards line clears as `attack_priority` grows.
    #[must_use]
    pub fn with_attack_priority(attack_priority: f32) -> Self {
        Self::DEFENSIVE.lerp(&Self::AGGRO, attack_priority)
    }

    #[must_use]
    pub fn score(&self, features: &Features) -> f32 {
        iter::zip(features.to_array(), self.0)
            .map(|(f, w)| f * w)
            .sum()
    }
}
