use crate::error::{DashboardError, Result};
use crate::schema::DatasetKind;
use crate::utils::normalize_label;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Engine tuning. Every field falls back to its default when omitted from the JSON.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub thresholds: InsightThresholds,
    pub sheets: SheetNames,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()
    }
}

/// Trigger points for the insight rules. Percentages are on a 0-100 scale,
/// target ratios are actual/target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightThresholds {
    pub session_change_pct: f64,
    pub session_change_high_pct: f64,
    pub bounce_rate_max_pct: f64,
    pub direct_share_max_pct: f64,
    pub search_share_min_pct: f64,
    pub social_share_max_pct: f64,
    pub target_risk_ratio: f64,
    pub target_critical_ratio: f64,
    pub target_exceeded_ratio: f64,
}

impl Default for InsightThresholds {
    fn default() -> Self {
        Self {
            session_change_pct: 10.0,
            session_change_high_pct: 20.0,
            bounce_rate_max_pct: 50.0,
            direct_share_max_pct: 60.0,
            search_share_min_pct: 15.0,
            social_share_max_pct: 5.0,
            target_risk_ratio: 0.8,
            target_critical_ratio: 0.6,
            target_exceeded_ratio: 1.2,
        }
    }
}

impl InsightThresholds {
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("session_change_pct", self.session_change_pct),
            ("session_change_high_pct", self.session_change_high_pct),
            ("bounce_rate_max_pct", self.bounce_rate_max_pct),
            ("direct_share_max_pct", self.direct_share_max_pct),
            ("search_share_min_pct", self.search_share_min_pct),
            ("social_share_max_pct", self.social_share_max_pct),
            ("target_risk_ratio", self.target_risk_ratio),
            ("target_critical_ratio", self.target_critical_ratio),
            ("target_exceeded_ratio", self.target_exceeded_ratio),
        ];

        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(DashboardError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        if self.session_change_high_pct < self.session_change_pct {
            return Err(DashboardError::InvalidConfig(format!(
                "session_change_high_pct ({}) must not be below session_change_pct ({})",
                self.session_change_high_pct, self.session_change_pct
            )));
        }

        if self.target_critical_ratio > self.target_risk_ratio {
            return Err(DashboardError::InvalidConfig(format!(
                "target_critical_ratio ({}) must not exceed target_risk_ratio ({})",
                self.target_critical_ratio, self.target_risk_ratio
            )));
        }

        if self.target_exceeded_ratio < self.target_risk_ratio {
            return Err(DashboardError::InvalidConfig(format!(
                "target_exceeded_ratio ({}) must not be below target_risk_ratio ({})",
                self.target_exceeded_ratio, self.target_risk_ratio
            )));
        }

        Ok(())
    }
}

/// Sheet label used for each dataset in the incoming workbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetNames {
    pub config: String,
    pub website: String,
    pub traffic_sources: String,
    pub search: String,
    pub social: String,
    pub email: String,
    pub leads: String,
    pub share_of_voice: String,
    pub targets: String,
    pub notes: String,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            config: "Config".to_string(),
            website: "Website_Data".to_string(),
            traffic_sources: "Traffic_Sources".to_string(),
            search: "Search_Data".to_string(),
            social: "Social_Data".to_string(),
            email: "Email_Data".to_string(),
            leads: "Leads_Data".to_string(),
            share_of_voice: "Share_of_Voice".to_string(),
            targets: "Targets".to_string(),
            notes: "Notes".to_string(),
        }
    }
}

impl SheetNames {
    pub fn name_for(&self, kind: DatasetKind) -> &str {
        match kind {
            DatasetKind::Config => &self.config,
            DatasetKind::Website => &self.website,
            DatasetKind::TrafficSources => &self.traffic_sources,
            DatasetKind::Search => &self.search,
            DatasetKind::Social => &self.social,
            DatasetKind::Email => &self.email,
            DatasetKind::Leads => &self.leads,
            DatasetKind::ShareOfVoice => &self.share_of_voice,
            DatasetKind::Targets => &self.targets,
            DatasetKind::Notes => &self.notes,
        }
    }

    /// Exact match wins; otherwise labels are compared ignoring case and punctuation,
    /// so "Website Data" finds the `Website_Data` sheet.
    pub fn matches(&self, kind: DatasetKind, sheet: &str) -> bool {
        let expected = self.name_for(kind);
        expected == sheet || normalize_label(expected) == normalize_label(sheet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_rule_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.thresholds.session_change_pct, 10.0);
        assert_eq!(config.thresholds.session_change_high_pct, 20.0);
        assert_eq!(config.thresholds.bounce_rate_max_pct, 50.0);
        assert_eq!(config.sheets.share_of_voice, "Share_of_Voice");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json_str(
            r#"{ "thresholds": { "bounce_rate_max_pct": 65.0 }, "sheets": { "website": "Web" } }"#,
        )
        .unwrap();

        assert_eq!(config.thresholds.bounce_rate_max_pct, 65.0);
        assert_eq!(config.thresholds.search_share_min_pct, 15.0);
        assert_eq!(config.sheets.website, "Web");
        assert_eq!(config.sheets.leads, "Leads_Data");
    }

    #[test]
    fn test_rejects_inverted_bands() {
        let result = EngineConfig::from_json_str(
            r#"{ "thresholds": { "session_change_pct": 30.0, "session_change_high_pct": 20.0 } }"#,
        );
        assert!(matches!(result, Err(DashboardError::InvalidConfig(_))));

        let result =
            EngineConfig::from_json_str(r#"{ "thresholds": { "target_critical_ratio": 0.9 } }"#);
        assert!(matches!(result, Err(DashboardError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let result = EngineConfig::from_json_str("{ thresholds: }");
        assert!(matches!(result, Err(DashboardError::SerializationError(_))));
    }

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{}.json", name, std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_from_path_reads_json_file() {
        let path = write_temp(
            "engine-config-valid",
            r#"{
                "thresholds": { "direct_share_max_pct": 70.0 },
                "sheets": { "leads": "Pipeline" }
            }"#,
        );
        let config = EngineConfig::from_path(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.thresholds.direct_share_max_pct, 70.0);
        assert_eq!(config.sheets.leads, "Pipeline");
        assert_eq!(config.sheets.website, "Website_Data");
    }

    #[test]
    fn test_from_path_rejects_malformed_file() {
        let path = write_temp("engine-config-malformed", "{ \"thresholds\": [ }");
        let result = EngineConfig::from_path(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(DashboardError::SerializationError(_))));

        let missing = std::env::temp_dir().join("engine-config-does-not-exist.json");
        let result = EngineConfig::from_path(&missing);
        assert!(matches!(result, Err(DashboardError::IoError(_))));
    }

    #[test]
    fn test_sheet_name_matching() {
        let sheets = SheetNames::default();
        assert!(sheets.matches(DatasetKind::Website, "Website_Data"));
        assert!(sheets.matches(DatasetKind::Website, "website data"));
        assert!(!sheets.matches(DatasetKind::Website, "Search_Data"));
    }
}
