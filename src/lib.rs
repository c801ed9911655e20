pub mod app;
pub mod config;
pub mod controller;
pub mod errors;
pub mod evaluator;
pub mod fetch;
pub mod models;
pub mod range;
pub mod render;
pub mod state;
pub mod submit;

pub use app::{controller, run_once};
pub use config::{DashboardConfig, ViewSelection};
pub use controller::DashboardController;
pub use errors::{DashboardError, FetchError};
pub use fetch::{MetricEndpoint, TrendFetcher};
pub use range::resolve;
pub use render::{JsonLinesSink, RecordingSink, RenderSink};
pub use state::{DashboardState, Phase};
