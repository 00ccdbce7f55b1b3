//! Drought and wetness categories of standardized index values.
//!
//! Bands follow the usual standardized-precipitation-index convention:
//!
//! | index        | class          |
//! |--------------|----------------|
//! | ≥ 2.0        | ExtremelyWet   |
//! | [1.5, 2.0)   | VeryWet        |
//! | [1.0, 1.5)   | ModeratelyWet  |
//! | (-1.0, 1.0)  | NearNormal     |
//! | (-1.5, -1.0] | ModeratelyDry  |
//! | (-2.0, -1.5] | SeverelyDry    |
//! | ≤ -2.0       | ExtremelyDry   |
//!
//! NaN has no class.
use ndarray::ArrayView2;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DroughtClass {
    ExtremelyDry,
    SeverelyDry,
    ModeratelyDry,
    NearNormal,
    ModeratelyWet,
    VeryWet,
    ExtremelyWet,
}

impl DroughtClass {
    /// Class of one standardized value; `None` for NaN.
    pub fn from_index(value: f64) -> Option<Self> {
        if value.is_nan() {
            return None;
        }
        let class = if value >= 2.0 {
            DroughtClass::ExtremelyWet
        } else if value >= 1.5 {
            DroughtClass::VeryWet
        } else if value >= 1.0 {
            DroughtClass::ModeratelyWet
        } else if value > -1.0 {
            DroughtClass::NearNormal
        } else if value > -1.5 {
            DroughtClass::ModeratelyDry
        } else if value > -2.0 {
            DroughtClass::SeverelyDry
        } else {
            DroughtClass::ExtremelyDry
        };
        Some(class)
    }

    pub fn name(&self) -> &'static str {
        match self {
            DroughtClass::ExtremelyDry => "extremely_dry",
            DroughtClass::SeverelyDry => "severely_dry",
            DroughtClass::ModeratelyDry => "moderately_dry",
            DroughtClass::NearNormal => "near_normal",
            DroughtClass::ModeratelyWet => "moderately_wet",
            DroughtClass::VeryWet => "very_wet",
            DroughtClass::ExtremelyWet => "extremely_wet",
        }
    }

    /// Whether the class is one of the three dry classes.
    pub fn is_drought(&self) -> bool {
        matches!(
            self,
            DroughtClass::ExtremelyDry | DroughtClass::SeverelyDry | DroughtClass::ModeratelyDry
        )
    }
}

/// Pixel counts per class for one standardized grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassCounts {
    pub counts: BTreeMap<DroughtClass, usize>,
    /// Pixels without a class (NaN).
    pub unclassified: usize,
}

impl ClassCounts {
    pub fn get(&self, class: DroughtClass) -> usize {
        self.counts.get(&class).copied().unwrap_or(0)
    }

    /// Pixels in any dry class.
    pub fn drought_pixels(&self) -> usize {
        self.counts.iter().filter(|(c, _)| c.is_drought()).map(|(_, n)| n).sum()
    }
}

/// Tally the classes of every pixel of a standardized grid.
pub fn classify_grid(index: ArrayView2<f64>) -> ClassCounts {
    let mut out = ClassCounts::default();
    for &v in index.iter() {
        match DroughtClass::from_index(v) {
            Some(class) => *out.counts.entry(class).or_insert(0) += 1,
            None => out.unclassified += 1,
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Verify band edges are assigned as documented.
    //
    // Given
    // -----
    // - Values exactly on every band edge.
    //
    // Expect
    // ------
    // - Upper edges inclusive on the wet side, lower edges inclusive on the
    //   dry side.
    fn band_edges_follow_convention() {
        assert_eq!(DroughtClass::from_index(2.0), Some(DroughtClass::ExtremelyWet));
        assert_eq!(DroughtClass::from_index(1.5), Some(DroughtClass::VeryWet));
        assert_eq!(DroughtClass::from_index(1.0), Some(DroughtClass::ModeratelyWet));
        assert_eq!(DroughtClass::from_index(0.0), Some(DroughtClass::NearNormal));
        assert_eq!(DroughtClass::from_index(-1.0), Some(DroughtClass::ModeratelyDry));
        assert_eq!(DroughtClass::from_index(-1.5), Some(DroughtClass::SeverelyDry));
        assert_eq!(DroughtClass::from_index(-2.0), Some(DroughtClass::ExtremelyDry));
        assert_eq!(DroughtClass::from_index(f64::NAN), None);
    }

    #[test]
    // Purpose
    // -------
    // Verify tallies, including NaN and drought totals.
    //
    // Given
    // -----
    // - [[-2.5, -1.2, 0.3], [NaN, 1.7, -1.9]].
    //
    // Expect
    // ------
    // - one unclassified pixel, three drought pixels, one very-wet pixel.
    fn classify_grid_counts_classes() {
        let grid = array![[-2.5, -1.2, 0.3], [f64::NAN, 1.7, -1.9]];

        let counts = classify_grid(grid.view());

        assert_eq!(counts.unclassified, 1);
        assert_eq!(counts.drought_pixels(), 3);
        assert_eq!(counts.get(DroughtClass::VeryWet), 1);
        assert_eq!(counts.get(DroughtClass::ExtremelyWet), 0);
    }
}
