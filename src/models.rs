use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::DashboardError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Daily,
    Monthly,
    Yearly,
    Month,
    Year,
}

impl Granularity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// Yearly views carry monthly averages instead of raw daily values.
    pub fn reads_averages(self) -> bool {
        matches!(self, Self::Yearly)
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = DashboardError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(DashboardError::UnknownGranularity(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketUnit {
    Day,
    Month,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dashboard {
    Health,
    Budget,
}

impl Dashboard {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::Budget => "budget",
        }
    }

    pub fn metrics(self) -> &'static [MetricKind] {
        match self {
            Self::Health => &[
                MetricKind::Steps,
                MetricKind::HeartRate,
                MetricKind::SleepHours,
                MetricKind::Bmi,
            ],
            Self::Budget => &[
                MetricKind::IncomeVsExpense,
                MetricKind::CategoryBreakdown,
                MetricKind::NetTrend,
            ],
        }
    }

    pub fn granularities(self) -> &'static [Granularity] {
        match self {
            Self::Health => &[Granularity::Daily, Granularity::Monthly, Granularity::Yearly],
            Self::Budget => &[Granularity::Month, Granularity::Year],
        }
    }

    pub fn default_granularity(self) -> Granularity {
        match self {
            Self::Health => Granularity::Daily,
            Self::Budget => Granularity::Month,
        }
    }

    pub fn supports(self, granularity: Granularity) -> bool {
        self.granularities().contains(&granularity)
    }
}

impl fmt::Display for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dashboard {
    type Err = DashboardError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "health" => Ok(Self::Health),
            "budget" => Ok(Self::Budget),
            other => Err(DashboardError::UnknownDashboard(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Steps,
    HeartRate,
    SleepHours,
    Bmi,
    IncomeVsExpense,
    CategoryBreakdown,
    NetTrend,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Steps => "steps",
            Self::HeartRate => "heart_rate",
            Self::SleepHours => "sleep_hours",
            Self::Bmi => "bmi",
            Self::IncomeVsExpense => "income_vs_expense",
            Self::CategoryBreakdown => "category_breakdown",
            Self::NetTrend => "net_trend",
        }
    }

    pub fn dashboard(self) -> Dashboard {
        match self {
            Self::Steps | Self::HeartRate | Self::SleepHours | Self::Bmi => Dashboard::Health,
            Self::IncomeVsExpense | Self::CategoryBreakdown | Self::NetTrend => Dashboard::Budget,
        }
    }

    /// Path of the trend endpoint, relative to the server root.
    pub fn endpoint_path(self) -> &'static str {
        match self {
            Self::Steps => "/api/health/steps-trend",
            Self::HeartRate => "/api/health/heart-rate-trend",
            Self::SleepHours => "/api/health/sleep-trend",
            Self::Bmi => "/api/health/bmi-trend",
            Self::IncomeVsExpense => "/api/budget/income-vs-expense",
            Self::CategoryBreakdown => "/api/budget/expense-categories",
            Self::NetTrend => "/api/budget/net-trend",
        }
    }

    /// Raw numeric field carried by each point of this metric's series.
    pub fn base_field(self) -> &'static str {
        match self {
            Self::Steps => "steps",
            Self::HeartRate => "heart_rate",
            Self::SleepHours => "sleep_hours",
            Self::Bmi => "bmi",
            Self::IncomeVsExpense | Self::CategoryBreakdown => "total",
            Self::NetTrend => "net_balance",
        }
    }

    pub fn value_field(self, granularity: Granularity) -> String {
        if granularity.reads_averages() && self.dashboard() == Dashboard::Health {
            format!("average_{}", self.base_field())
        } else {
            self.base_field().to_string()
        }
    }

    /// Keys that may hold a point's bucket label, in lookup order.
    pub fn label_keys(self, granularity: Granularity) -> Vec<&'static str> {
        match self {
            Self::Steps | Self::HeartRate | Self::SleepHours | Self::Bmi => {
                if granularity.reads_averages() {
                    vec!["month"]
                } else {
                    vec!["date"]
                }
            }
            Self::IncomeVsExpense => vec!["type"],
            Self::CategoryBreakdown => vec!["category"],
            Self::NetTrend => {
                let mut keys = vec![granularity.as_str()];
                for fallback in ["date", "month", "year"] {
                    if !keys.contains(&fallback) {
                        keys.push(fallback);
                    }
                }
                keys
            }
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub bucket_unit: BucketUnit,
}

impl DateRange {
    pub fn start_key(&self) -> String {
        date_key(self.start)
    }

    pub fn end_key(&self) -> String {
        date_key(self.end)
    }

    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    pub label: String,
    pub fields: BTreeMap<String, f64>,
}

impl TrendPoint {
    pub fn value(&self, field: &str) -> Option<f64> {
        self.fields.get(field).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrendSeries {
    pub points: Vec<TrendPoint>,
    pub reference_average: Option<f64>,
}

impl TrendSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&TrendPoint> {
        self.points.last()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Favorable,
    Unfavorable,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub status: Status,
    pub display_value: String,
    pub reference_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderInstruction {
    pub metric: MetricKind,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub status: Status,
    pub display_value: String,
    pub reference_label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthEntry {
    pub date: String,
    pub steps: u64,
    pub heart_rate: u32,
    pub sleep_hours: f64,
    pub bmi: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Income,
    Expense,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetEntry {
    pub date: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub category: String,
    pub amount: f64,
}

#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub message: String,
}
