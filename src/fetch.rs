use crate::config::DashboardConfig;
use crate::errors::{DashboardError, FetchError};
use crate::models::{DateRange, Granularity, MetricKind, TrendPoint, TrendSeries};
use futures_util::stream::{FuturesUnordered, Stream, StreamExt};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

pub type FetchOutcome = Result<TrendSeries, FetchError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricEndpoint {
    pub kind: MetricKind,
    pub path: String,
}

impl MetricEndpoint {
    pub fn new(kind: MetricKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    pub fn canonical(kind: MetricKind) -> Self {
        Self::new(kind, kind.endpoint_path())
    }
}

/// Issues one trend request per metric. Requests share a connection pool
/// but otherwise never wait on each other.
#[derive(Debug, Clone)]
pub struct TrendFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl TrendFetcher {
    pub fn new(config: &DashboardConfig) -> Result<Self, DashboardError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_client(client, &config.base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn url_for(&self, endpoint: &MetricEndpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path)
    }

    pub async fn fetch_one(
        &self,
        endpoint: &MetricEndpoint,
        range: DateRange,
        granularity: Granularity,
    ) -> FetchOutcome {
        let url = self.url_for(endpoint);
        debug!(metric = %endpoint.kind, %url, start = %range.start, end = %range.end, "requesting trend");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("start", range.start_key()),
                ("end", range.end_key()),
                ("view", granularity.as_str().to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::status(status, &url));
        }

        let body: Value = response.json().await?;
        parse_series(endpoint.kind, granularity, body)
    }

    /// Yields each metric's outcome as soon as its response settles.
    pub fn fetch_stream<'a>(
        &'a self,
        range: DateRange,
        granularity: Granularity,
        endpoints: &'a [MetricEndpoint],
    ) -> impl Stream<Item = (MetricKind, FetchOutcome)> + 'a {
        endpoints
            .iter()
            .map(|endpoint| async move {
                let outcome = self.fetch_one(endpoint, range, granularity).await;
                if let Err(err) = &outcome {
                    debug!(metric = %endpoint.kind, "trend fetch failed: {err}");
                }
                (endpoint.kind, outcome)
            })
            .collect::<FuturesUnordered<_>>()
    }

    pub async fn fetch_all(
        &self,
        range: DateRange,
        granularity: Granularity,
        endpoints: &[MetricEndpoint],
    ) -> BTreeMap<MetricKind, FetchOutcome> {
        self.fetch_stream(range, granularity, endpoints)
            .collect::<BTreeMap<_, _>>()
            .await
    }
}

/// Decodes a trend payload. Health endpoints wrap their points in
/// `{trend, reference_average}`; budget endpoints answer with a bare array.
pub fn parse_series(kind: MetricKind, granularity: Granularity, body: Value) -> FetchOutcome {
    let (points, reference_average) = match body {
        Value::Array(points) => (points, None),
        Value::Object(mut envelope) => {
            let reference_average = match envelope.remove("reference_average") {
                None | Some(Value::Null) => None,
                Some(value) => Some(value.as_f64().ok_or_else(|| {
                    FetchError::malformed(format!("{kind}: reference_average is not a number"))
                })?),
            };
            match envelope.remove("trend") {
                Some(Value::Array(points)) => (points, reference_average),
                Some(_) => return Err(FetchError::malformed(format!("{kind}: trend is not an array"))),
                None => return Err(FetchError::malformed(format!("{kind}: missing trend"))),
            }
        }
        _ => {
            return Err(FetchError::malformed(format!(
                "{kind}: expected an object or array payload"
            )));
        }
    };

    let label_keys = kind.label_keys(granularity);
    let value_field = kind.value_field(granularity);

    let points = points
        .into_iter()
        .enumerate()
        .map(|(index, raw)| match raw {
            Value::Object(map) => parse_point(kind, index, &map, &label_keys, &value_field),
            _ => Err(FetchError::malformed(format!("{kind}: point {index} is not an object"))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TrendSeries {
        points,
        reference_average,
    })
}

fn parse_point(
    kind: MetricKind,
    index: usize,
    map: &Map<String, Value>,
    label_keys: &[&str],
    value_field: &str,
) -> Result<TrendPoint, FetchError> {
    let label = label_keys
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_str))
        .ok_or_else(|| {
            FetchError::malformed(format!(
                "{kind}: point {index} has none of the label keys {label_keys:?}"
            ))
        })?;

    let fields: BTreeMap<String, f64> = map
        .iter()
        .filter_map(|(name, value)| value.as_f64().map(|number| (name.clone(), number)))
        .collect();

    if !fields.contains_key(value_field) {
        return Err(FetchError::malformed(format!(
            "{kind}: point {index} is missing '{value_field}'"
        )));
    }

    Ok(TrendPoint {
        label: label.to_string(),
        fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn health_envelope_keeps_server_order() {
        let body = json!({
            "reference_average": 7500.0,
            "trend": [
                { "date": "2024-06-01", "steps": 6000 },
                { "date": "2024-06-02", "steps": 9100 },
                { "date": "2024-06-03", "steps": 7200 }
            ]
        });
        let series = parse_series(MetricKind::Steps, Granularity::Daily, body).unwrap();
        let labels: Vec<_> = series.points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, ["2024-06-01", "2024-06-02", "2024-06-03"]);
        assert_eq!(series.reference_average, Some(7500.0));
        assert_eq!(series.points[1].value("steps"), Some(9100.0));
    }

    #[test]
    fn null_reference_average_is_absent() {
        let body = json!({ "reference_average": null, "trend": [] });
        let series = parse_series(MetricKind::Bmi, Granularity::Monthly, body).unwrap();
        assert_eq!(series.reference_average, None);
        assert!(series.is_empty());
    }

    #[test]
    fn yearly_points_need_average_field() {
        let ok = json!({ "trend": [{ "month": "2024-01", "average_heart_rate": 71.25 }] });
        let series = parse_series(MetricKind::HeartRate, Granularity::Yearly, ok).unwrap();
        assert_eq!(series.points[0].label, "2024-01");

        let raw_only = json!({ "trend": [{ "month": "2024-01", "heart_rate": 71 }] });
        let err = parse_series(MetricKind::HeartRate, Granularity::Yearly, raw_only).unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }

    #[test]
    fn health_payload_without_trend_is_malformed() {
        let err = parse_series(MetricKind::SleepHours, Granularity::Daily, json!({ "reference_average": 7.5 }))
            .unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));

        let err = parse_series(MetricKind::SleepHours, Granularity::Daily, json!("nope")).unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }

    #[test]
    fn budget_arrays_are_flat() {
        let body = json!([
            { "type": "income", "total": 3200.0 },
            { "type": "expense", "total": 1250.5 }
        ]);
        let series = parse_series(MetricKind::IncomeVsExpense, Granularity::Month, body).unwrap();
        assert_eq!(series.points.len(), 2);
        assert_eq!(series.reference_average, None);
    }

    #[test]
    fn net_trend_label_follows_view() {
        let body = json!([
            { "year": "2024", "net_balance": 150.0, "income": 400.0, "expense": 250.0 }
        ]);
        let series = parse_series(MetricKind::NetTrend, Granularity::Year, body).unwrap();
        assert_eq!(series.points[0].label, "2024");
        assert_eq!(series.points[0].value("income"), Some(400.0));

        let body = json!([{ "date": "2024-05-02", "net_balance": -20.0 }]);
        let series = parse_series(MetricKind::NetTrend, Granularity::Month, body).unwrap();
        assert_eq!(series.points[0].label, "2024-05-02");
    }

    #[test]
    fn point_without_label_is_malformed() {
        let body = json!([{ "total": 12.0 }]);
        let err = parse_series(MetricKind::CategoryBreakdown, Granularity::Month, body).unwrap_err();
        assert!(err.to_string().contains("label keys"));
    }

    #[test]
    fn urls_join_base_and_path() {
        let fetcher = TrendFetcher::with_client(reqwest::Client::new(), "http://localhost:5000/");
        let endpoint = MetricEndpoint::canonical(MetricKind::HeartRate);
        assert_eq!(fetcher.url_for(&endpoint), "http://localhost:5000/api/health/heart-rate-trend");
    }
}
