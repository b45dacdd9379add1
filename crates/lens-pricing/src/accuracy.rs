//! Accuracy validation of a predicted cost against the vendor's actual
//! charge

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccuracyGrade {
    APlus,
    A,
    B,
    C,
    D,
}

impl fmt::Display for AccuracyGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AccuracyGrade::APlus => "A+",
            AccuracyGrade::A => "A",
            AccuracyGrade::B => "B",
            AccuracyGrade::C => "C",
            AccuracyGrade::D => "D",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccuracyReport {
    pub predicted: Decimal,
    pub actual: Decimal,
    pub percentage_error: f64,
    pub grade: AccuracyGrade,
    pub within_target: bool,
    pub validated_at: DateTime<Utc>,
}

/// Validate `predicted` against the vendor's `actual` charge. A zero
/// actual cost is treated as a perfect match — there is nothing to be
/// inaccurate about — rather than dividing by zero.
pub fn validate(predicted: Decimal, actual: Decimal, now: DateTime<Utc>) -> AccuracyReport {
    let difference = (actual - predicted).abs();
    let percentage_error = if actual > Decimal::ZERO {
        (difference / actual * Decimal::from(100)).to_f64().unwrap_or(f64::MAX)
    } else {
        0.0
    };

    let grade = if percentage_error <= 1.0 {
        AccuracyGrade::APlus
    } else if percentage_error <= 2.0 {
        AccuracyGrade::A
    } else if percentage_error <= 5.0 {
        AccuracyGrade::B
    } else if percentage_error <= 10.0 {
        AccuracyGrade::C
    } else {
        AccuracyGrade::D
    };

    AccuracyReport {
        predicted,
        actual,
        percentage_error,
        grade,
        within_target: percentage_error <= 1.0,
        validated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn exact_match_grades_a_plus_and_within_target() {
        let report = validate(dec!(1.00), dec!(1.00), Utc::now());
        assert_eq!(report.grade, AccuracyGrade::APlus);
        assert!(report.within_target);
    }

    #[test]
    fn large_deviation_grades_d_and_outside_target() {
        let report = validate(dec!(0.50), dec!(1.00), Utc::now());
        assert_eq!(report.grade, AccuracyGrade::D);
        assert!(!report.within_target);
    }

    #[test]
    fn zero_actual_cost_is_treated_as_exact() {
        let report = validate(dec!(0), dec!(0), Utc::now());
        assert_eq!(report.percentage_error, 0.0);
        assert_eq!(report.grade, AccuracyGrade::APlus);
    }

    #[test]
    fn grade_boundaries_match_documented_thresholds() {
        assert_eq!(validate(dec!(98), dec!(100), Utc::now()).grade, AccuracyGrade::A);
        assert_eq!(validate(dec!(95), dec!(100), Utc::now()).grade, AccuracyGrade::B);
        assert_eq!(validate(dec!(90), dec!(100), Utc::now()).grade, AccuracyGrade::C);
    }
}
