use crate::models::{Dashboard, Granularity, MetricKind};
use chrono::NaiveDate;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Rendered,
}

/// Selection and load progress of one dashboard. Lives as long as the
/// controller that owns it.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub dashboard: Dashboard,
    pub anchor: NaiveDate,
    pub granularity: Granularity,
    generation: u64,
    pending: BTreeSet<MetricKind>,
    phase: Phase,
}

impl DashboardState {
    pub fn new(dashboard: Dashboard, anchor: NaiveDate) -> Self {
        Self {
            dashboard,
            anchor,
            granularity: dashboard.default_granularity(),
            generation: 0,
            pending: BTreeSet::new(),
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Starts a new load and supersedes any load still in flight.
    pub(crate) fn begin(&mut self, metrics: impl IntoIterator<Item = MetricKind>) -> u64 {
        self.generation += 1;
        self.pending = metrics.into_iter().collect();
        self.phase = if self.pending.is_empty() {
            Phase::Rendered
        } else {
            Phase::Loading
        };
        self.generation
    }

    /// Marks one metric of the current load as settled. Returns `false` for
    /// outcomes of a superseded load or a metric that already settled.
    pub(crate) fn settle(&mut self, generation: u64, metric: MetricKind) -> bool {
        if generation != self.generation || !self.pending.remove(&metric) {
            return false;
        }
        if self.pending.is_empty() {
            self.phase = Phase::Rendered;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> DashboardState {
        DashboardState::new(Dashboard::Health, NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
    }

    #[test]
    fn starts_idle_with_dashboard_default_view() {
        let state = state();
        assert_eq!(state.phase(), Phase::Idle);
        assert_eq!(state.granularity, Granularity::Daily);
        assert_eq!(state.generation(), 0);
    }

    #[test]
    fn rendered_once_every_metric_settles() {
        let mut state = state();
        let generation = state.begin([MetricKind::Steps, MetricKind::Bmi]);
        assert_eq!(state.phase(), Phase::Loading);

        assert!(state.settle(generation, MetricKind::Steps));
        assert_eq!(state.phase(), Phase::Loading);
        assert!(!state.settle(generation, MetricKind::Steps));
        assert!(state.settle(generation, MetricKind::Bmi));
        assert_eq!(state.phase(), Phase::Rendered);
    }

    #[test]
    fn superseded_generation_is_rejected() {
        let mut state = state();
        let first = state.begin([MetricKind::Steps]);
        let second = state.begin([MetricKind::Steps]);
        assert!(!state.settle(first, MetricKind::Steps));
        assert_eq!(state.phase(), Phase::Loading);
        assert!(state.settle(second, MetricKind::Steps));
        assert_eq!(state.phase(), Phase::Rendered);
    }
}
