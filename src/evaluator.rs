use crate::models::{EvaluationResult, Granularity, MetricKind, Status, TrendSeries};

/// Shown in place of a value when the range holds no data.
pub const NO_DATA: &str = "-";

// Band edges are products like `reference * 1.1`; allow a few ULPs so a
// value sitting exactly on the edge is not lost to rounding of the product.
const EDGE_ULPS: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tolerance {
    /// Favorable at or above the reference, no upper bound.
    AtLeast,
    /// Favorable inside `[reference * lower, reference * upper]`.
    Band { lower: f64, upper: f64 },
    /// The metric is shown but never judged.
    Untracked,
}

impl Tolerance {
    pub fn for_kind(kind: MetricKind) -> Self {
        match kind {
            MetricKind::Steps => Self::AtLeast,
            MetricKind::HeartRate | MetricKind::Bmi => Self::Band { lower: 0.9, upper: 1.1 },
            MetricKind::SleepHours => Self::Band { lower: 0.85, upper: 1.15 },
            MetricKind::IncomeVsExpense | MetricKind::CategoryBreakdown | MetricKind::NetTrend => {
                Self::Untracked
            }
        }
    }

    pub fn judge(self, current: f64, reference: f64) -> Status {
        let favorable = match self {
            Self::AtLeast => current >= reference,
            Self::Band { lower, upper } => {
                above_edge(current, reference * lower) && below_edge(current, reference * upper)
            }
            Self::Untracked => return Status::Neutral,
        };
        if favorable {
            Status::Favorable
        } else {
            Status::Unfavorable
        }
    }
}

fn edge_slack(bound: f64) -> f64 {
    bound.abs() * f64::EPSILON * EDGE_ULPS
}

fn above_edge(value: f64, bound: f64) -> bool {
    value >= bound - edge_slack(bound)
}

fn below_edge(value: f64, bound: f64) -> bool {
    value <= bound + edge_slack(bound)
}

/// Classifies the latest value of a metric against its reference baseline.
///
/// An absent `current` means the series was empty: the result is the
/// [`NO_DATA`] sentinel and no comparison is made. An absent `reference`
/// yields [`Status::Neutral`].
pub fn evaluate(kind: MetricKind, current: Option<f64>, reference: Option<f64>) -> EvaluationResult {
    let reference_label = reference.map(format_value);

    let Some(current) = current else {
        return EvaluationResult {
            status: Status::Neutral,
            display_value: NO_DATA.to_string(),
            reference_label,
        };
    };

    let status = match reference {
        Some(reference) => Tolerance::for_kind(kind).judge(current, reference),
        None => Status::Neutral,
    };

    EvaluationResult {
        status,
        display_value: format_value(current),
        reference_label,
    }
}

/// Picks the scalar a metric is judged on.
///
/// Trend metrics use the last point, reading `average_<field>` in yearly
/// views. Income-vs-expense shows the net of its two slices and the category
/// breakdown shows total spending.
pub fn current_value(kind: MetricKind, series: &TrendSeries, granularity: Granularity) -> Option<f64> {
    if series.is_empty() {
        return None;
    }
    let field = kind.value_field(granularity);
    match kind {
        MetricKind::IncomeVsExpense => {
            let total_for = |label: &str| {
                series
                    .points
                    .iter()
                    .filter(|point| point.label.eq_ignore_ascii_case(label))
                    .filter_map(|point| point.value(&field))
                    .sum::<f64>()
            };
            Some(total_for("income") - total_for("expense"))
        }
        MetricKind::CategoryBreakdown => {
            Some(series.points.iter().filter_map(|point| point.value(&field)).sum())
        }
        _ => series.last().and_then(|point| point.value(&field)),
    }
}

/// Formats a scalar for display: two decimals at most, trailing zeros
/// dropped, thousands grouped with commas.
pub fn format_value(value: f64) -> String {
    if !value.is_finite() {
        return NO_DATA.to_string();
    }
    let rounded = (value * 100.0).round() / 100.0;
    let fixed = format!("{:.2}", rounded.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded < 0.0 { "-" } else { "" };
    if fraction.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{fraction}")
    }
}
