//! Scaled quantity labels ("сая тн", "мян. тн", "million tons") to base tons.

/// Unit label assumed when the backend leaves one out.
pub const DEFAULT_UNIT_LABEL: &str = "тн";

const MILLION_MARKERS: [&str; 2] = ["million", "сая"];
const THOUSAND_MARKERS: [&str; 2] = ["thousand", "мян"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitScale {
    Million,
    Thousand,
    Base,
}

impl UnitScale {
    /// Detect the scale by case-insensitive substring match. Labels that
    /// match neither marker set are treated as already being in base units.
    pub fn from_label(label: &str) -> Self {
        let lowered = label.to_lowercase();
        if MILLION_MARKERS.iter().any(|marker| lowered.contains(marker)) {
            UnitScale::Million
        } else if THOUSAND_MARKERS.iter().any(|marker| lowered.contains(marker)) {
            UnitScale::Thousand
        } else {
            UnitScale::Base
        }
    }

    pub fn factor(self) -> f64 {
        match self {
            UnitScale::Million => 1_000_000.0,
            UnitScale::Thousand => 1_000.0,
            UnitScale::Base => 1.0,
        }
    }
}

pub fn to_base_units(magnitude: f64, label: &str) -> f64 {
    magnitude * UnitScale::from_label(label).factor()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn million_labels() {
        assert_eq!(to_base_units(2.0, "million tons"), 2_000_000.0);
        assert_eq!(to_base_units(2.0, "Million Tons"), 2_000_000.0);
        assert_eq!(to_base_units(1.5, "сая тн"), 1_500_000.0);
        assert_eq!(to_base_units(1.5, "САЯ ТН"), 1_500_000.0);
    }

    #[test]
    fn thousand_labels() {
        assert_eq!(to_base_units(500.0, "thousand tons"), 500_000.0);
        assert_eq!(to_base_units(500.0, "THOUSAND"), 500_000.0);
        assert_eq!(to_base_units(3.0, "мян. тн"), 3_000.0);
    }

    #[test]
    fn unknown_labels_pass_through() {
        assert_eq!(to_base_units(42.0, DEFAULT_UNIT_LABEL), 42.0);
        assert_eq!(to_base_units(42.0, ""), 42.0);
        assert_eq!(to_base_units(42.0, "milion"), 42.0);
        assert_eq!(UnitScale::from_label("kg"), UnitScale::Base);
    }
}
