//! Comparison period resolution.
//!
//! All "previous quarter" arithmetic lives here. Q1 steps back to Q4 of the prior year.

use crate::schema::{CompareMode, ComparisonPeriod, Period, Quarter};

/// The quarter before `quarter`, with the year it falls in.
pub fn previous_quarter(year: i32, quarter: Quarter) -> (i32, Quarter) {
    match quarter {
        Quarter::Q1 => (year - 1, Quarter::Q4),
        Quarter::Q2 => (year, Quarter::Q1),
        Quarter::Q3 => (year, Quarter::Q2),
        Quarter::Q4 => (year, Quarter::Q3),
    }
}

/// Resolves the period `current` is compared against.
///
/// - `PrevYear`: same quarter (or whole year), one year earlier.
/// - `PrevQuarter` with a quarter: the preceding quarter, wrapping Q1 to Q4 of the prior year.
/// - `PrevQuarter` on a whole-year view: there is no quarter to step back from, so it
///   falls back to the previous whole year, i.e. the same result as `PrevYear`.
pub fn resolve_comparison_period(current: Period, mode: CompareMode) -> ComparisonPeriod {
    let resolved = match (mode, current.quarter) {
        (CompareMode::PrevQuarter, Some(quarter)) => {
            let (year, quarter) = previous_quarter(current.year, quarter);
            Period::quarter(year, quarter)
        }
        (CompareMode::PrevQuarter, None) | (CompareMode::PrevYear, _) => {
            Period::new(current.year - 1, current.quarter)
        }
    };

    ComparisonPeriod {
        year: resolved.year,
        quarter: resolved.quarter,
        label: resolved.label(),
    }
}

/// The period insights compare against. Always the previous quarter, whatever the UI
/// comparison mode is.
pub fn insight_baseline(current: Period) -> Period {
    resolve_comparison_period(current, CompareMode::PrevQuarter).period()
}
