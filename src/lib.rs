//! # Marketing Dashboard Engine
//!
//! Turns a spreadsheet of monthly marketing metrics into period-scoped KPIs, period-over-period
//! comparisons, and prioritized insights.
//!
//! ## Core Concepts
//!
//! - **Facts**: typed monthly rows per dataset (website, traffic sources, search, social, email,
//!   leads, share of voice), where an unreported value stays absent instead of becoming zero
//! - **Period**: a year plus an optional quarter; `None` means the whole year
//! - **Comparison**: the previous quarter or the same period a year earlier
//! - **Volumes vs rates**: volumes are summed and change relatively; rates are averaged or
//!   derived from summed counts, and change in percentage points
//! - **Insights**: independent rules evaluated over the aggregated period, sorted by priority
//!
//! ## Example
//!
//! ```rust,ignore
//! use marketing_dashboard_engine::*;
//!
//! let workbook: RawWorkbook = read_sheets_somehow();
//! let q2 = Period::quarter(2024, Quarter::Q2);
//! let selection = PeriodSelection::new(q2, CompareMode::PrevQuarter);
//!
//! let report = DashboardProcessor::process(&workbook, selection, &EngineConfig::default())?;
//! for insight in &report.insights {
//!     println!("[{:?}] {}", insight.priority, insight.title);
//! }
//! ```

pub mod aggregator;
pub mod composite;
pub mod config;
pub mod error;
pub mod ingestion;
pub mod insights;
pub mod narrative;
pub mod period;
pub mod refresh;
pub mod report;
pub mod schema;
pub mod store;
pub mod trend;
pub mod utils;

pub use aggregator::*;
pub use composite::*;
pub use config::{EngineConfig, InsightThresholds, SheetNames};
pub use error::{DashboardError, Result};
pub use ingestion::{load_workbook, DataQualityWarning, RawRow, RawWorkbook};
pub use insights::{generate_insights, InsightEngine, InsightRule, RuleContext};
pub use narrative::{DashboardTab, NarrativePayload};
pub use period::{insight_baseline, previous_quarter, resolve_comparison_period};
pub use refresh::{RefreshCoordinator, RefreshTicket};
pub use report::{build_report, DashboardReport, MetricChange, PeriodSnapshot};
pub use schema::*;
pub use store::{Dataset, FactStore};
pub use trend::{percent_change, point_change, Direction, MetricComparison, MetricDelta, Trend};

use log::{debug, info};

pub struct DashboardProcessor;

impl DashboardProcessor {
    /// Loads `workbook` and builds the report for `selection` in one pass.
    pub fn process(
        workbook: &RawWorkbook,
        selection: PeriodSelection,
        config: &EngineConfig,
    ) -> Result<DashboardReport> {
        config.validate()?;

        info!(
            "Processing dashboard for {} ({} sheets)",
            selection.period,
            workbook.len()
        );

        let store = load_workbook(workbook, &config.sheets)?;
        debug!("Available years: {:?}", store.available_years());

        Ok(build_report(&store, selection, config))
    }

    /// Like [`DashboardProcessor::process`] but uses the workbook's configured default period
    /// when one is set, falling back to the latest quarter that has website data.
    pub fn process_default(
        workbook: &RawWorkbook,
        config: &EngineConfig,
    ) -> Result<DashboardReport> {
        config.validate()?;
        let store = load_workbook(workbook, &config.sheets)?;
        let period = default_period(&store).ok_or(DashboardError::NoData)?;

        Ok(build_report(
            &store,
            PeriodSelection::new(period, CompareMode::default()),
            config,
        ))
    }
}

/// The period a dashboard opens on: the workbook's configured default, otherwise the most
/// recent quarter with website rows, otherwise the most recent year with any data.
pub fn default_period(store: &FactStore) -> Option<Period> {
    if let Some(period) = store.settings.default_period {
        return Some(period);
    }

    let latest_website = store
        .website
        .all()
        .iter()
        .map(|fact| (fact.key.year, fact.key.quarter))
        .max();
    if let Some((year, quarter)) = latest_website {
        return Some(Period::quarter(year, quarter));
    }

    store.available_years().last().map(|&year| Period::whole_year(year))
}
