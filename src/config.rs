use crate::errors::{DashboardError, Result};
use crate::models::{Dashboard, Granularity};
use chrono::{Local, NaiveDate};
use std::{env, time::Duration};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            base_url: resolve_base_url()?,
            timeout: resolve_timeout(),
        })
    }
}

/// What the one-shot binary should show.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSelection {
    pub dashboard: Dashboard,
    pub granularity: Granularity,
    pub anchor: NaiveDate,
}

impl ViewSelection {
    pub fn from_env() -> Result<Self> {
        Self::from_values(
            env::var("DASHBOARD").ok().as_deref(),
            env::var("DASHBOARD_VIEW").ok().as_deref(),
            env::var("ANCHOR_DATE").ok().as_deref(),
        )
    }

    /// Builds a selection from raw setting values; absent values fall back to
    /// the health dashboard, its default view and today.
    pub fn from_values(
        dashboard: Option<&str>,
        view: Option<&str>,
        anchor: Option<&str>,
    ) -> Result<Self> {
        let dashboard = match dashboard {
            Some(value) => value.parse()?,
            None => Dashboard::Health,
        };

        let granularity = match view {
            Some(value) => value.parse()?,
            None => dashboard.default_granularity(),
        };
        if !dashboard.supports(granularity) {
            return Err(DashboardError::UnsupportedGranularity {
                dashboard,
                granularity,
            });
        }

        let anchor = match anchor {
            Some(value) => parse_anchor(value)?,
            None => Local::now().date_naive(),
        };

        Ok(Self {
            dashboard,
            granularity,
            anchor,
        })
    }
}

pub fn parse_anchor(value: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")?)
}

pub fn resolve_base_url() -> Result<String> {
    parse_base_url(env::var("DASHBOARD_BASE_URL").ok())
}

pub fn parse_base_url(value: Option<String>) -> Result<String> {
    let url = value.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(DashboardError::Config(format!(
            "DASHBOARD_BASE_URL must be an http(s) URL, got '{url}'"
        )));
    }
    Ok(url)
}

pub fn resolve_timeout() -> Duration {
    parse_timeout(env::var("DASHBOARD_TIMEOUT_SECS").ok().as_deref())
}

/// Whole seconds; zero or anything unparsable falls back to the default.
pub fn parse_timeout(value: Option<&str>) -> Duration {
    let secs = value
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    Duration::from_secs(secs)
}
