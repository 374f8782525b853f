//! Payload handed to the narrative-generation collaborator.
//!
//! The engine only assembles already-aggregated JSON for one dashboard tab. Prompt wording and
//! the call to a text-generation service live outside this crate.

use crate::error::Result;
use crate::report::DashboardReport;
use crate::schema::{DatasetKind, Target};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DashboardTab {
    Overview,
    Website,
    Search,
    Social,
    Email,
    Leads,
    ShareOfVoice,
}

impl DashboardTab {
    pub const ALL: [DashboardTab; 7] = [
        DashboardTab::Overview,
        DashboardTab::Website,
        DashboardTab::Search,
        DashboardTab::Social,
        DashboardTab::Email,
        DashboardTab::Leads,
        DashboardTab::ShareOfVoice,
    ];

    /// Datasets whose period changes belong on this tab. The overview shows all of them.
    fn datasets(self) -> &'static [DatasetKind] {
        match self {
            DashboardTab::Overview => &[],
            DashboardTab::Website => &[DatasetKind::Website, DatasetKind::TrafficSources],
            DashboardTab::Search => &[DatasetKind::Search],
            DashboardTab::Social => &[DatasetKind::Social],
            DashboardTab::Email => &[DatasetKind::Email],
            DashboardTab::Leads => &[DatasetKind::Leads],
            DashboardTab::ShareOfVoice => &[DatasetKind::ShareOfVoice],
        }
    }

    /// Target sheet category shown with this tab, if any.
    fn target_category(self) -> Option<&'static str> {
        match self {
            DashboardTab::Overview => None,
            DashboardTab::Website => Some("Website"),
            DashboardTab::Search => Some("Search"),
            DashboardTab::Social => Some("Social"),
            DashboardTab::Email => Some("Email"),
            DashboardTab::Leads => Some("Leads"),
            DashboardTab::ShareOfVoice => Some("Share of Voice"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NarrativePayload {
    #[schemars(description = "Dashboard tab the narrative is written for")]
    pub tab_type: DashboardTab,

    #[schemars(description = "Aggregated metrics for the selected period; never raw monthly rows")]
    pub aggregated_data: Value,

    #[schemars(description = "Human-readable label of the selected period, e.g. 'Q1 2024'")]
    pub period: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Targets for the tab's category, when any are defined")]
    pub targets: Option<Vec<Target>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Comparison period label and period-over-period changes")]
    pub comparison_data: Option<Value>,
}

impl NarrativePayload {
    pub fn new(tab_type: DashboardTab, period: impl Into<String>, aggregated_data: Value) -> Self {
        Self {
            tab_type,
            aggregated_data,
            period: period.into(),
            targets: None,
            comparison_data: None,
        }
    }

    pub fn with_targets(mut self, targets: Vec<Target>) -> Self {
        self.targets = if targets.is_empty() {
            None
        } else {
            Some(targets)
        };
        self
    }

    pub fn with_comparison(mut self, comparison: Value) -> Self {
        self.comparison_data = Some(comparison);
        self
    }

    /// Payload for one tab of an assembled report.
    pub fn from_report(
        report: &DashboardReport,
        tab: DashboardTab,
        targets: &[Target],
    ) -> Result<Self> {
        let current = &report.current;
        let aggregated_data = match tab {
            DashboardTab::Overview => json!({
                "website": current.website,
                "traffic": current.traffic,
                "funnel": current.funnel,
                "share_of_voice": current.sov,
                "digital_reach": current.reach,
                "insights": report.insights,
            }),
            DashboardTab::Website => json!({
                "website": current.website,
                "traffic": current.traffic,
                "target_progress": report.target_progress,
            }),
            DashboardTab::Search => serde_json::to_value(&current.search)?,
            DashboardTab::Social => serde_json::to_value(&current.social)?,
            DashboardTab::Email => serde_json::to_value(&current.email)?,
            DashboardTab::Leads => json!({
                "leads": current.leads,
                "funnel": current.funnel,
            }),
            DashboardTab::ShareOfVoice => json!({
                "summary": current.share_of_voice,
                "shares": current.sov,
            }),
        };

        let datasets = tab.datasets();
        let changes: Vec<_> = report
            .changes
            .iter()
            .filter(|c| datasets.is_empty() || datasets.contains(&c.dataset))
            .collect();
        let comparison = json!({
            "period": report.comparison_period.label,
            "changes": changes,
        });

        let year = report.selection.period.year;
        let tab_targets = match tab.target_category() {
            Some(category) => targets
                .iter()
                .filter(|t| t.is_category(category) && t.applies_to(year))
                .cloned()
                .collect(),
            None => Vec::new(),
        };

        Ok(
            Self::new(tab, report.selection.period.label(), aggregated_data)
                .with_targets(tab_targets)
                .with_comparison(comparison),
        )
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(NarrativePayload)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::report::build_report;
    use crate::schema::{CompareMode, EmailFact, Period, PeriodSelection, Quarter};
    use crate::store::test_support::{key, website};
    use crate::store::{Dataset, FactStore};

    fn target(category: &str) -> Target {
        Target {
            year: None,
            category: category.to_string(),
            metric: "Sessions".to_string(),
            q1: Some(1.0),
            q2: None,
            q3: None,
            q4: None,
            annual: None,
        }
    }

    fn report() -> DashboardReport {
        let store = FactStore {
            website: Dataset::new(vec![
                website(2024, 1, Some(900.0)),
                website(2024, 4, Some(1000.0)),
            ]),
            email: Dataset::new(vec![EmailFact {
                key: key(2024, 4),
                emails_sent: Some(2000.0),
                unique_opens: Some(500.0),
                unique_clicks: Some(40.0),
            }]),
            ..FactStore::default()
        };
        build_report(
            &store,
            PeriodSelection::new(Period::quarter(2024, Quarter::Q2), CompareMode::PrevQuarter),
            &EngineConfig::default(),
        )
    }

    #[test]
    fn test_schema_generation() {
        let schema_json = NarrativePayload::schema_as_json().unwrap();
        assert!(schema_json.contains("tabType"));
        assert!(schema_json.contains("aggregatedData"));
        assert!(schema_json.contains("comparisonData"));
    }

    #[test]
    fn test_wire_field_names() {
        let data = json!({"open_rate": 25.0});
        let payload = NarrativePayload::new(DashboardTab::Email, "Q2 2024", data);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["tabType"], "email");
        assert_eq!(json["period"], "Q2 2024");
        assert!(json.get("targets").is_none());
        assert!(json.get("comparisonData").is_none());
    }

    #[test]
    fn test_tab_payload_from_report() {
        let report = report();
        let targets = vec![target("Website"), target("Email")];

        let website =
            NarrativePayload::from_report(&report, DashboardTab::Website, &targets).unwrap();
        assert_eq!(website.period, "Q2 2024");
        assert_eq!(website.aggregated_data["website"]["sessions"], 1000.0);
        assert_eq!(website.targets.as_ref().map(Vec::len), Some(1));

        let comparison = website.comparison_data.unwrap();
        assert_eq!(comparison["period"], "Q1 2024");
        let changes = comparison["changes"].as_array().unwrap();
        assert!(!changes.is_empty());
        assert!(changes
            .iter()
            .all(|c| c["dataset"] == "website" || c["dataset"] == "traffic_sources"));

        let email = NarrativePayload::from_report(&report, DashboardTab::Email, &targets).unwrap();
        assert_eq!(email.aggregated_data["open_rate"], 25.0);

        let search = NarrativePayload::from_report(&report, DashboardTab::Search, &[]).unwrap();
        assert!(search.targets.is_none());
    }

    #[test]
    fn test_overview_carries_all_changes() {
        let report = report();
        let overview = NarrativePayload::from_report(&report, DashboardTab::Overview, &[]).unwrap();
        let changes = overview.comparison_data.as_ref().unwrap()["changes"]
            .as_array()
            .unwrap()
            .len();
        assert_eq!(changes, report.changes.len());
        assert!(overview.to_json().unwrap().contains("\"tabType\": \"overview\""));
    }
}
