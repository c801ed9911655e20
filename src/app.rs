use crate::config::{DashboardConfig, ViewSelection};
use crate::controller::DashboardController;
use crate::errors::Result;
use crate::fetch::TrendFetcher;
use crate::render::RenderSink;

pub fn controller<S: RenderSink>(
    config: &DashboardConfig,
    selection: &ViewSelection,
    sink: S,
) -> Result<DashboardController<S>> {
    let fetcher = TrendFetcher::new(config)?;
    Ok(DashboardController::new(
        fetcher,
        sink,
        selection.dashboard,
        selection.anchor,
    ))
}

/// Loads the selected view once and hands the sink back.
pub async fn run_once<S: RenderSink>(
    config: &DashboardConfig,
    selection: &ViewSelection,
    sink: S,
) -> Result<S> {
    let mut controller = controller(config, selection, sink)?;
    controller.on_granularity_changed(selection.granularity).await?;
    Ok(controller.into_sink())
}
