use crate::errors::{DashboardError, FetchError};
use crate::evaluator::{current_value, evaluate};
use crate::fetch::{FetchOutcome, MetricEndpoint, TrendFetcher};
use crate::models::{
    BucketUnit, Dashboard, DateRange, Granularity, MetricKind, RenderInstruction, TrendSeries,
};
use crate::range::{format_bucket_label, resolve};
use crate::render::{RenderSink, RenderSlot};
use crate::state::{DashboardState, Phase};
use chrono::NaiveDate;
use futures_util::StreamExt;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Everything one load needs, captured when the load starts.
#[derive(Debug, Clone)]
pub struct LoadTicket {
    pub generation: u64,
    pub range: DateRange,
    pub granularity: Granularity,
    pub endpoints: Vec<MetricEndpoint>,
}

/// Coordinates range resolution, fetching, evaluation and rendering for one
/// dashboard.
///
/// Each metric owns a [`RenderSlot`]; the sink is told to tear a live slot
/// down before anything new is attached to it. Outcomes belonging to a load
/// that has since been superseded are dropped.
pub struct DashboardController<S> {
    fetcher: TrendFetcher,
    sink: S,
    state: DashboardState,
    endpoints: Vec<MetricEndpoint>,
    slots: BTreeMap<MetricKind, RenderSlot>,
}

impl<S: RenderSink> DashboardController<S> {
    pub fn new(fetcher: TrendFetcher, sink: S, dashboard: Dashboard, anchor: NaiveDate) -> Self {
        Self {
            fetcher,
            sink,
            state: DashboardState::new(dashboard, anchor),
            endpoints: dashboard
                .metrics()
                .iter()
                .copied()
                .map(MetricEndpoint::canonical)
                .collect(),
            slots: BTreeMap::new(),
        }
    }

    /// Replaces the canonical endpoint set, e.g. to target a server that
    /// mounts its routes elsewhere.
    pub fn with_endpoints(mut self, endpoints: Vec<MetricEndpoint>) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn slot(&self, metric: MetricKind) -> Option<&RenderSlot> {
        self.slots.get(&metric)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub async fn on_anchor_date_changed(&mut self, anchor: NaiveDate) {
        self.state.anchor = anchor;
        self.refresh().await;
    }

    pub async fn on_granularity_changed(
        &mut self,
        granularity: Granularity,
    ) -> Result<(), DashboardError> {
        let dashboard = self.state.dashboard;
        if !dashboard.supports(granularity) {
            return Err(DashboardError::UnsupportedGranularity {
                dashboard,
                granularity,
            });
        }
        self.state.granularity = granularity;
        self.refresh().await;
        Ok(())
    }

    /// Runs a full load for the current selection, rendering each metric as
    /// soon as its own fetch settles.
    pub async fn refresh(&mut self) {
        let ticket = self.begin_load();
        let fetcher = self.fetcher.clone();
        let mut outcomes = std::pin::pin!(fetcher.fetch_stream(
            ticket.range,
            ticket.granularity,
            &ticket.endpoints
        ));
        while let Some((metric, outcome)) = outcomes.next().await {
            self.settle(&ticket, metric, outcome);
        }
    }

    /// Enters `Loading` for the current selection and returns the ticket its
    /// outcomes must be settled against.
    pub fn begin_load(&mut self) -> LoadTicket {
        let granularity = self.state.granularity;
        let range = resolve(self.state.anchor, granularity);
        let generation = self
            .state
            .begin(self.endpoints.iter().map(|endpoint| endpoint.kind));

        info!(
            dashboard = %self.state.dashboard,
            %granularity,
            generation,
            "loading {} to {}",
            range.start_key(),
            range.end_key()
        );

        LoadTicket {
            generation,
            range,
            granularity,
            endpoints: self.endpoints.clone(),
        }
    }

    /// Evaluates and renders one settled fetch. Returns `false` when the
    /// outcome was discarded as stale.
    pub fn settle(&mut self, ticket: &LoadTicket, metric: MetricKind, outcome: FetchOutcome) -> bool {
        if !self.state.settle(ticket.generation, metric) {
            debug!(
                %metric,
                generation = ticket.generation,
                current = self.state.generation(),
                "discarding stale outcome"
            );
            return false;
        }

        let instruction = match outcome {
            Ok(series) => build_instruction(metric, &series, ticket.granularity, ticket.range.bucket_unit),
            Err(err) => no_data_instruction(metric, &err),
        };

        self.slots
            .entry(metric)
            .or_default()
            .replace(metric, instruction, ticket.generation, &mut self.sink);
        true
    }
}

pub fn build_instruction(
    metric: MetricKind,
    series: &TrendSeries,
    granularity: Granularity,
    unit: BucketUnit,
) -> RenderInstruction {
    let field = metric.value_field(granularity);
    let (labels, values): (Vec<String>, Vec<f64>) = series
        .points
        .iter()
        .filter_map(|point| {
            point
                .value(&field)
                .map(|value| (format_bucket_label(&point.label, unit), value))
        })
        .unzip();

    let result = evaluate(
        metric,
        current_value(metric, series, granularity),
        series.reference_average,
    );

    RenderInstruction {
        metric,
        labels,
        values,
        status: result.status,
        display_value: result.display_value,
        reference_label: result.reference_label,
    }
}

fn no_data_instruction(metric: MetricKind, err: &FetchError) -> RenderInstruction {
    warn!(%metric, "rendering no-data state: {err}");
    let result = evaluate(metric, None, None);
    RenderInstruction {
        metric,
        labels: Vec::new(),
        values: Vec::new(),
        status: result.status,
        display_value: result.display_value,
        reference_label: result.reference_label,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::NO_DATA;
    use crate::models::{Status, TrendPoint};
    use crate::render::{RecordingSink, RenderEvent};

    fn controller(dashboard: Dashboard) -> DashboardController<RecordingSink> {
        let fetcher = TrendFetcher::with_client(reqwest::Client::new(), "http://127.0.0.1:9");
        DashboardController::new(
            fetcher,
            RecordingSink::default(),
            dashboard,
            NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
        )
    }

    fn steps_series(last: f64) -> TrendSeries {
        TrendSeries {
            points: vec![
                TrendPoint {
                    label: "2024-06-14".to_string(),
                    fields: [("steps".to_string(), 6400.0)].into_iter().collect(),
                },
                TrendPoint {
                    label: "2024-06-15".to_string(),
                    fields: [("steps".to_string(), last)].into_iter().collect(),
                },
            ],
            reference_average: Some(7500.0),
        }
    }

    #[test]
    fn load_ticket_uses_resolved_range() {
        let mut controller = controller(Dashboard::Health);
        controller.state.granularity = Granularity::Monthly;
        let ticket = controller.begin_load();
        assert_eq!(ticket.range.start_key(), "2024-06-01");
        assert_eq!(ticket.range.end_key(), "2024-06-30");
        assert_eq!(ticket.endpoints.len(), 4);
        assert_eq!(controller.phase(), Phase::Loading);
    }

    #[test]
    fn stale_outcomes_are_discarded() {
        let mut controller = controller(Dashboard::Health);
        let stale = controller.begin_load();
        let fresh = controller.begin_load();

        assert!(!controller.settle(&stale, MetricKind::Steps, Ok(steps_series(1.0))));
        assert!(controller.slot(MetricKind::Steps).is_none());

        assert!(controller.settle(&fresh, MetricKind::Steps, Ok(steps_series(8000.0))));
        let live = controller.slot(MetricKind::Steps).and_then(RenderSlot::live).unwrap();
        assert_eq!(live.display_value, "8,000");
        assert_eq!(live.status, Status::Favorable);
        assert_eq!(live.reference_label.as_deref(), Some("7,500"));
    }

    #[test]
    fn failed_metric_renders_sentinel_and_siblings_continue() {
        let mut controller = controller(Dashboard::Health);
        let ticket = controller.begin_load();

        controller.settle(
            &ticket,
            MetricKind::HeartRate,
            Err(FetchError::NetworkFailure("boom".to_string())),
        );
        controller.settle(&ticket, MetricKind::Steps, Ok(steps_series(5000.0)));

        let sink = controller.sink();
        let heart = sink.latest(MetricKind::HeartRate).unwrap();
        assert_eq!(heart.display_value, NO_DATA);
        assert_eq!(heart.status, Status::Neutral);
        assert!(heart.labels.is_empty());

        let steps = sink.latest(MetricKind::Steps).unwrap();
        assert_eq!(steps.status, Status::Unfavorable);
        assert_eq!(controller.phase(), Phase::Loading);
    }

    #[test]
    fn second_load_tears_slot_down_first() {
        let mut controller = controller(Dashboard::Health);
        let first = controller.begin_load();
        controller.settle(&first, MetricKind::Steps, Ok(steps_series(8000.0)));
        let second = controller.begin_load();
        controller.settle(&second, MetricKind::Steps, Ok(steps_series(9000.0)));

        let events = &controller.sink().events;
        assert_eq!(events.len(), 3);
        assert_eq!(events[1], RenderEvent::Teardown { metric: MetricKind::Steps });
        assert_eq!(controller.slot(MetricKind::Steps).unwrap().generation(), second.generation);
    }

    #[test]
    fn yearly_labels_become_month_names() {
        let series = TrendSeries {
            points: vec![TrendPoint {
                label: "2024-02".to_string(),
                fields: [("average_bmi".to_string(), 22.4)].into_iter().collect(),
            }],
            reference_average: Some(22.0),
        };
        let instruction = build_instruction(MetricKind::Bmi, &series, Granularity::Yearly, BucketUnit::Month);
        assert_eq!(instruction.labels, ["February"]);
        assert_eq!(instruction.values, [22.4]);
        assert_eq!(instruction.status, Status::Favorable);
    }

    #[tokio::test]
    async fn budget_rejects_health_granularity() {
        let mut controller = controller(Dashboard::Budget);
        let err = controller.on_granularity_changed(Granularity::Daily).await.unwrap_err();
        assert!(matches!(err, DashboardError::UnsupportedGranularity { .. }));
        assert_eq!(controller.state().granularity, Granularity::Month);
        assert_eq!(controller.phase(), Phase::Idle);
    }
}
