//! Threshold table mapping scores to classification labels

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::common::errors::{NotifierError, Result};

/// One classification band of the threshold table
///
/// Bands are closed-open intervals `[low, high)`; the final band also
/// includes its upper bound so the top of the score range classifies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBand {
    /// Inclusive lower bound
    pub low: Decimal,
    /// Exclusive upper bound (inclusive for the final band)
    pub high: Decimal,
    /// Classification label, unique within the table
    pub label: String,
    /// Whether predictions in this band are candidates for dispatch
    pub notify: bool,
}

impl ThresholdBand {
    pub fn new(low: Decimal, high: Decimal, label: impl Into<String>, notify: bool) -> Self {
        Self {
            low,
            high,
            label: label.into(),
            notify,
        }
    }
}

/// Ordered, contiguous table of classification bands
///
/// Validated once at construction: bands must be non-empty, sorted
/// ascending, non-overlapping with no gaps, each with `low < high` and a
/// label unique within the table.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdTable {
    bands: Vec<ThresholdBand>,
}

impl ThresholdTable {
    /// Build a validated table from bands
    pub fn new(bands: Vec<ThresholdBand>) -> Result<Self> {
        if bands.is_empty() {
            return Err(NotifierError::Configuration(
                "threshold table must contain at least one band".to_string(),
            ));
        }

        for band in &bands {
            if band.low >= band.high {
                return Err(NotifierError::Configuration(format!(
                    "threshold band '{}' has low {} >= high {}",
                    band.label, band.low, band.high
                )));
            }
        }

        for pair in bands.windows(2) {
            if pair[1].low != pair[0].high {
                return Err(NotifierError::Configuration(format!(
                    "threshold bands '{}' and '{}' are not contiguous: {} != {}",
                    pair[0].label, pair[1].label, pair[0].high, pair[1].low
                )));
            }
        }

        for (i, band) in bands.iter().enumerate() {
            if bands[..i].iter().any(|other| other.label == band.label) {
                return Err(NotifierError::Configuration(format!(
                    "duplicate threshold label '{}'",
                    band.label
                )));
            }
        }

        Ok(Self { bands })
    }

    /// The score domain covered by the table: `[low of first, high of last]`
    pub fn domain(&self) -> (Decimal, Decimal) {
        // new() guarantees at least one band
        (
            self.bands.first().map(|b| b.low).unwrap_or_default(),
            self.bands.last().map(|b| b.high).unwrap_or_default(),
        )
    }

    /// Classify a score into its band
    ///
    /// A score exactly on a band boundary classifies into the higher band
    /// (lower bounds are inclusive). The table's upper domain bound
    /// classifies into the final band. Returns `None` for scores outside
    /// the domain.
    pub fn classify(&self, score: Decimal) -> Option<&ThresholdBand> {
        let last = self.bands.len() - 1;
        self.bands.iter().enumerate().find_map(|(i, band)| {
            let in_band = if i == last {
                score >= band.low && score <= band.high
            } else {
                score >= band.low && score < band.high
            };
            in_band.then_some(band)
        })
    }

    /// The bands in ascending order
    pub fn bands(&self) -> &[ThresholdBand] {
        &self.bands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn two_band_table() -> ThresholdTable {
        ThresholdTable::new(vec![
            ThresholdBand::new(dec!(0.0), dec!(0.5), "normal", false),
            ThresholdBand::new(dec!(0.5), dec!(1.0), "critical", true),
        ])
        .unwrap()
    }

    fn three_band_table() -> ThresholdTable {
        ThresholdTable::new(vec![
            ThresholdBand::new(dec!(0.0), dec!(0.5), "normal", false),
            ThresholdBand::new(dec!(0.5), dec!(0.9), "at-risk", true),
            ThresholdBand::new(dec!(0.9), dec!(1.0), "critical", true),
        ])
        .unwrap()
    }

    #[test]
    fn test_boundary_score_classifies_into_higher_band() {
        let table = two_band_table();
        assert_eq!(table.classify(dec!(0.5)).unwrap().label, "critical");
    }

    #[test]
    fn test_top_of_domain_classifies_into_final_band() {
        let table = two_band_table();
        assert_eq!(table.classify(dec!(1.0)).unwrap().label, "critical");
    }

    #[test]
    fn test_interior_scores() {
        let table = three_band_table();
        assert_eq!(table.classify(dec!(0.1)).unwrap().label, "normal");
        assert_eq!(table.classify(dec!(0.6)).unwrap().label, "at-risk");
        assert_eq!(table.classify(dec!(0.95)).unwrap().label, "critical");
        assert_eq!(table.classify(dec!(0.9)).unwrap().label, "critical");
        assert_eq!(table.classify(dec!(0.0)).unwrap().label, "normal");
    }

    #[test]
    fn test_out_of_domain_scores_do_not_classify() {
        let table = two_band_table();
        assert!(table.classify(dec!(-0.01)).is_none());
        assert!(table.classify(dec!(1.01)).is_none());
    }

    #[test]
    fn test_domain() {
        assert_eq!(three_band_table().domain(), (dec!(0.0), dec!(1.0)));
    }

    #[test]
    fn test_empty_table_rejected() {
        assert!(ThresholdTable::new(vec![]).is_err());
    }

    #[test]
    fn test_inverted_band_rejected() {
        let result = ThresholdTable::new(vec![ThresholdBand::new(
            dec!(0.5),
            dec!(0.2),
            "bad",
            true,
        )]);
        assert!(result.is_err());
    }

    #[test]
    fn test_gap_rejected() {
        let result = ThresholdTable::new(vec![
            ThresholdBand::new(dec!(0.0), dec!(0.4), "normal", false),
            ThresholdBand::new(dec!(0.5), dec!(1.0), "critical", true),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_overlap_rejected() {
        let result = ThresholdTable::new(vec![
            ThresholdBand::new(dec!(0.0), dec!(0.6), "normal", false),
            ThresholdBand::new(dec!(0.5), dec!(1.0), "critical", true),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_unsorted_bands_rejected() {
        let result = ThresholdTable::new(vec![
            ThresholdBand::new(dec!(0.5), dec!(1.0), "critical", true),
            ThresholdBand::new(dec!(0.0), dec!(0.5), "normal", false),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let result = ThresholdTable::new(vec![
            ThresholdBand::new(dec!(0.0), dec!(0.5), "normal", false),
            ThresholdBand::new(dec!(0.5), dec!(1.0), "normal", true),
        ]);
        assert!(result.is_err());
    }
}
