//! Period-over-period change.
//!
//! Volumes change by a percentage of the previous value ([`percent_change`]); rates change by
//! percentage points ([`point_change`]). The two are separate types so they cannot be mixed.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Flat,
}

impl Direction {
    fn of(current: f64, previous: f64) -> Self {
        if current > previous {
            Direction::Up
        } else if current < previous {
            Direction::Down
        } else {
            Direction::Flat
        }
    }
}

/// Relative change of a volume metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub percent: f64,
    pub direction: Direction,
    /// The previous value was zero and the current one is not. `percent` is reported as 0
    /// because no ratio exists; display this as "new" rather than "0%".
    pub from_zero: bool,
}

/// Absolute change of a rate metric, in percentage points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointDelta {
    pub points: f64,
    pub direction: Direction,
}

/// `(current - previous) / previous * 100`.
///
/// When `previous` is 0 the percent is 0: direction is `Flat` if `current` is also 0,
/// otherwise `Up`/`Down` with `from_zero` set. Never returns NaN or infinity.
pub fn percent_change(current: f64, previous: f64) -> Trend {
    let current = finite(current);
    let previous = finite(previous);
    let direction = Direction::of(current, previous);

    if previous == 0.0 {
        return Trend {
            percent: 0.0,
            direction,
            from_zero: current != 0.0,
        };
    }

    let percent = (current - previous) / previous * 100.0;
    Trend {
        percent: finite(percent),
        direction,
        from_zero: false,
    }
}

/// `current - previous` for metrics that are already percentages.
pub fn point_change(current: f64, previous: f64) -> PointDelta {
    let current = finite(current);
    let previous = finite(previous);
    PointDelta {
        points: finite(current - previous),
        direction: Direction::of(current, previous),
    }
}

/// Either kind of change, tagged with its unit when serialized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", rename_all = "snake_case")]
pub enum MetricDelta {
    Percent(Trend),
    Points(PointDelta),
}

impl MetricDelta {
    pub fn direction(&self) -> Direction {
        match self {
            MetricDelta::Percent(trend) => trend.direction,
            MetricDelta::Points(delta) => delta.direction,
        }
    }

    pub fn is_rate(&self) -> bool {
        matches!(self, MetricDelta::Points(_))
    }

    /// Percent for volumes, points for rates.
    pub fn amount(&self) -> f64 {
        match self {
            MetricDelta::Percent(trend) => trend.percent,
            MetricDelta::Points(delta) => delta.points,
        }
    }
}

/// A metric's value in the selected and comparison periods plus its change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricComparison {
    pub current: f64,
    pub previous: f64,
    pub delta: MetricDelta,
}

impl MetricComparison {
    pub fn volume(current: f64, previous: f64) -> Self {
        Self {
            current,
            previous,
            delta: MetricDelta::Percent(percent_change(current, previous)),
        }
    }

    pub fn rate(current: f64, previous: f64) -> Self {
        Self {
            current,
            previous,
            delta: MetricDelta::Points(point_change(current, previous)),
        }
    }
}

/// Relative change between two optional values; `None` if either side was not reported.
pub fn optional_percent_change(current: Option<f64>, previous: Option<f64>) -> Option<Trend> {
    Some(percent_change(current?, previous?))
}

/// Point change between two optional rates; `None` if either side was not reported.
pub fn optional_point_change(current: Option<f64>, previous: Option<f64>) -> Option<PointDelta> {
    Some(point_change(current?, previous?))
}

fn finite(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
