use crate::models::{BucketUnit, DateRange, Granularity};
use chrono::{Datelike, Days, Month, Months, NaiveDate};

const DAILY_HALF_WINDOW: u64 = 15;

/// Turns an anchor date and a view granularity into the inclusive range the
/// trend endpoints are queried with.
pub fn resolve(anchor: NaiveDate, granularity: Granularity) -> DateRange {
    match granularity {
        Granularity::Daily => DateRange {
            start: anchor
                .checked_sub_days(Days::new(DAILY_HALF_WINDOW))
                .unwrap_or(NaiveDate::MIN),
            end: anchor
                .checked_add_days(Days::new(DAILY_HALF_WINDOW))
                .unwrap_or(NaiveDate::MAX),
            bucket_unit: BucketUnit::Day,
        },
        Granularity::Monthly | Granularity::Month => {
            let start = month_start(anchor);
            DateRange {
                start,
                end: month_end(start),
                bucket_unit: BucketUnit::Day,
            }
        }
        Granularity::Yearly | Granularity::Year => DateRange {
            start: NaiveDate::from_ymd_opt(anchor.year(), 1, 1).unwrap_or(anchor),
            end: NaiveDate::from_ymd_opt(anchor.year(), 12, 31).unwrap_or(anchor),
            bucket_unit: BucketUnit::Month,
        },
    }
}

/// Display form of a bucket label. Month buckets (`YYYY-MM`) become the
/// month's name; anything else is returned unchanged.
pub fn format_bucket_label(label: &str, unit: BucketUnit) -> String {
    if unit == BucketUnit::Month {
        if let Some(name) = month_name(label) {
            return name.to_string();
        }
    }
    label.to_string()
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

// Day before the 1st of the following month.
fn month_end(start: NaiveDate) -> NaiveDate {
    start
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

fn month_name(label: &str) -> Option<&'static str> {
    let (year, month) = label.split_once('-')?;
    if year.len() != 4 || month.len() != 2 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let number: u8 = month.parse().ok()?;
    Month::try_from(number).ok().map(|month| month.name())
}
