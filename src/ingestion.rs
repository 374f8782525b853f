use crate::config::SheetNames;
use crate::error::{DashboardError, Result};
use crate::schema::{
    ConfigEntry, DashboardSettings, DatasetKind, EmailFact, LeadsFact, Note, Period, Quarter,
    SearchFact, ShareOfVoiceFact, SocialFact, Target, TemporalKey, TrafficSourceFact, WebsiteFact,
};
use crate::store::{Dataset, FactStore};
use crate::utils::normalize_label;
use chrono::Month;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// One decoded spreadsheet row: column label to raw cell value.
pub type RawRow = BTreeMap<String, Value>;

/// Sheet name to its rows, as produced by the external tabular reader.
pub type RawWorkbook = BTreeMap<String, Vec<RawRow>>;

/// Non-fatal data quality findings collected while loading a workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityWarning {
    MalformedRow {
        sheet: String,
        row: usize,
        column: String,
        reason: String,
    },
    QuarterMonthMismatch {
        sheet: String,
        row: usize,
        month: u32,
        quarter: Quarter,
        expected: Quarter,
    },
    MissingSheet {
        sheet: String,
    },
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataQualityWarning::MalformedRow {
                sheet,
                row,
                column,
                reason,
            } => write!(
                f,
                "{} row {} dropped: column '{}' {}",
                sheet, row, column, reason
            ),
            DataQualityWarning::QuarterMonthMismatch {
                sheet,
                row,
                month,
                quarter,
                expected,
            } => write!(
                f,
                "{} row {}: month {} belongs to {} but the row says {}; using {}",
                sheet, row, month, expected, quarter, quarter
            ),
            DataQualityWarning::MissingSheet { sheet } => {
                write!(f, "Sheet '{}' not found in workbook", sheet)
            }
        }
    }
}

/// A normalized fact together with any warnings raised while reading it.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub fact: T,
    pub warnings: Vec<DataQualityWarning>,
}

/// Conversion from one raw row into a typed record.
pub trait FromRawRow: Sized {
    const KIND: DatasetKind;

    fn from_row(row: &RowReader<'_>, warnings: &mut Vec<DataQualityWarning>) -> Result<Self>;
}

/// Normalizes a single row. `index` is the zero-based position of the row in its sheet.
pub fn normalize_row<T: FromRawRow>(
    sheet: &str,
    index: usize,
    row: &RawRow,
) -> Result<Normalized<T>> {
    let reader = RowReader::new(sheet, index, row);
    let mut warnings = Vec::new();
    let fact = T::from_row(&reader, &mut warnings)?;
    Ok(Normalized { fact, warnings })
}

/// Normalizes every row of a sheet. Malformed rows are dropped and reported, never fatal.
pub fn normalize_sheet<T: FromRawRow>(
    sheet: &str,
    rows: &[RawRow],
) -> (Vec<T>, Vec<DataQualityWarning>) {
    let mut facts = Vec::with_capacity(rows.len());
    let mut warnings = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        match normalize_row::<T>(sheet, index, row) {
            Ok(normalized) => {
                for warning in &normalized.warnings {
                    warn!("{}", warning);
                }
                warnings.extend(normalized.warnings);
                facts.push(normalized.fact);
            }
            Err(DashboardError::MalformedRow {
                sheet,
                row,
                column,
                reason,
            }) => {
                let warning = DataQualityWarning::MalformedRow {
                    sheet,
                    row,
                    column,
                    reason,
                };
                warn!("{}", warning);
                warnings.push(warning);
            }
            Err(other) => {
                let warning = DataQualityWarning::MalformedRow {
                    sheet: sheet.to_string(),
                    row: index + 1,
                    column: String::new(),
                    reason: other.to_string(),
                };
                warn!("{}", warning);
                warnings.push(warning);
            }
        }
    }

    (facts, warnings)
}

/// Builds a [`FactStore`] from a decoded workbook.
///
/// Fails with [`DashboardError::NoData`] only when none of the monthly datasets has a
/// single usable row; every other problem becomes a [`DataQualityWarning`] on the store.
pub fn load_workbook(workbook: &RawWorkbook, sheets: &SheetNames) -> Result<FactStore> {
    let mut warnings = Vec::new();

    let config_entries: Vec<ConfigEntry> = load_sheet(workbook, sheets, &mut warnings);

    let store = FactStore {
        website: Dataset::new(load_sheet(workbook, sheets, &mut warnings)),
        traffic_sources: Dataset::new(load_sheet(workbook, sheets, &mut warnings)),
        search: Dataset::new(load_sheet(workbook, sheets, &mut warnings)),
        social: Dataset::new(load_sheet(workbook, sheets, &mut warnings)),
        email: Dataset::new(load_sheet(workbook, sheets, &mut warnings)),
        leads: Dataset::new(load_sheet(workbook, sheets, &mut warnings)),
        share_of_voice: Dataset::new(load_sheet(workbook, sheets, &mut warnings)),
        targets: load_sheet(workbook, sheets, &mut warnings),
        notes: load_sheet(workbook, sheets, &mut warnings),
        settings: settings_from_entries(&config_entries),
        config_entries,
        warnings,
    };

    if !store.has_monthly_data() {
        return Err(DashboardError::NoData);
    }

    info!(
        "Loaded workbook: {} website, {} traffic, {} search, {} social, {} email, {} leads, \
         {} share-of-voice rows; {} targets, {} warnings",
        store.website.len(),
        store.traffic_sources.len(),
        store.search.len(),
        store.social.len(),
        store.email.len(),
        store.leads.len(),
        store.share_of_voice.len(),
        store.targets.len(),
        store.warnings.len()
    );

    Ok(store)
}

fn load_sheet<T: FromRawRow>(
    workbook: &RawWorkbook,
    sheets: &SheetNames,
    warnings: &mut Vec<DataQualityWarning>,
) -> Vec<T> {
    let kind = T::KIND;
    let found = workbook
        .get_key_value(sheets.name_for(kind))
        .or_else(|| workbook.iter().find(|(name, _)| sheets.matches(kind, name)));

    match found {
        Some((name, rows)) => {
            let (facts, sheet_warnings) = normalize_sheet::<T>(name, rows);
            warnings.extend(sheet_warnings);
            facts
        }
        None => {
            let warning = DataQualityWarning::MissingSheet {
                sheet: sheets.name_for(kind).to_string(),
            };
            warn!("{}", warning);
            warnings.push(warning);
            Vec::new()
        }
    }
}

/// Reads cells out of one raw row by normalized column label.
pub struct RowReader<'a> {
    sheet: &'a str,
    index: usize,
    cells: BTreeMap<String, &'a Value>,
}

impl<'a> RowReader<'a> {
    pub fn new(sheet: &'a str, index: usize, row: &'a RawRow) -> Self {
        let cells = row
            .iter()
            .map(|(label, value)| (normalize_label(label), value))
            .collect();

        Self {
            sheet,
            index,
            cells,
        }
    }

    /// 1-based data row number used in warnings.
    pub fn row_number(&self) -> usize {
        self.index + 1
    }

    /// First cell whose label matches one of the aliases and is not JSON null.
    pub fn cell(&self, aliases: &[&str]) -> Option<&'a Value> {
        aliases
            .iter()
            .filter_map(|alias| self.cells.get(*alias).copied())
            .find(|value| !value.is_null())
    }

    /// Numeric cell. Blank, missing and unparseable cells are absent, not zero.
    pub fn number(&self, aliases: &[&str]) -> Option<f64> {
        self.cell(aliases).and_then(parse_number)
    }

    /// Text cell. Missing cells are `None`; a present empty string stays `Some("")`.
    pub fn text(&self, aliases: &[&str]) -> Option<String> {
        self.cell(aliases).and_then(parse_text)
    }

    pub fn malformed(&self, column: &str, reason: impl Into<String>) -> DashboardError {
        DashboardError::MalformedRow {
            sheet: self.sheet.to_string(),
            row: self.row_number(),
            column: column.to_string(),
            reason: reason.into(),
        }
    }

    fn required_text(&self, column: &str, aliases: &[&str]) -> Result<String> {
        match self.text(aliases) {
            Some(text) if !text.is_empty() => Ok(text),
            _ => Err(self.malformed(column, "is missing")),
        }
    }

    fn year(&self) -> Result<i32> {
        let value = self
            .cell(&["year"])
            .ok_or_else(|| self.malformed("Year", "is missing"))?;

        parse_number(value)
            .and_then(whole_number)
            .and_then(|y| i32::try_from(y).ok())
            .ok_or_else(|| self.malformed("Year", format!("has unparseable value {}", value)))
    }

    fn month(&self) -> Result<u32> {
        let value = self
            .cell(&["month", "monthnumber", "monthname"])
            .ok_or_else(|| self.malformed("Month", "is missing"))?;

        parse_month(value)
            .ok_or_else(|| self.malformed("Month", format!("has unparseable value {}", value)))
    }

    fn optional_quarter(&self) -> Result<Option<Quarter>> {
        match self.cell(&["quarter", "qtr"]) {
            None => Ok(None),
            Some(value) if is_blank(value) => Ok(None),
            Some(value) => parse_quarter(value).map(Some).ok_or_else(|| {
                self.malformed("Quarter", format!("has unparseable value {}", value))
            }),
        }
    }

    /// Reads year/month/quarter. A blank quarter is derived from the month; an explicit
    /// quarter that disagrees with the month is kept and reported.
    pub fn temporal_key(&self, warnings: &mut Vec<DataQualityWarning>) -> Result<TemporalKey> {
        let year = self.year()?;
        let month = self.month()?;
        let expected = Quarter::from_month(month)
            .ok_or_else(|| self.malformed("Month", format!("{} is not a calendar month", month)))?;

        let quarter = match self.optional_quarter()? {
            Some(explicit) => {
                if explicit != expected {
                    warnings.push(DataQualityWarning::QuarterMonthMismatch {
                        sheet: self.sheet.to_string(),
                        row: self.row_number(),
                        month,
                        quarter: explicit,
                        expected,
                    });
                }
                explicit
            }
            None => expected,
        };

        Ok(TemporalKey {
            year,
            quarter,
            month,
            month_name: month_name(month),
        })
    }
}

/// Numbers pass through; strings may carry `%`, `,` or currency decorations.
/// Everything else (null, booleans, blanks, garbage, non-finite) is absent.
pub fn parse_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| !matches!(c, ',' | '%' | '$' | '€' | '£' | ' '))
                .collect();
            if cleaned.is_empty() {
                None
            } else {
                cleaned.parse::<f64>().ok()
            }
        }
        _ => None,
    };

    number.filter(|n| n.is_finite())
}

pub fn parse_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Month as 1-12 or as an English month name or abbreviation.
pub fn parse_month(value: &Value) -> Option<u32> {
    if let Some(number) = parse_number(value) {
        return whole_number(number)
            .and_then(|m| u32::try_from(m).ok())
            .filter(|m| (1..=12).contains(m));
    }

    match value {
        Value::String(s) => s
            .trim()
            .parse::<Month>()
            .ok()
            .map(|m| m.number_from_month()),
        _ => None,
    }
}

pub fn parse_quarter(value: &Value) -> Option<Quarter> {
    match value {
        Value::Number(_) => parse_number(value)
            .and_then(whole_number)
            .and_then(|n| u32::try_from(n).ok())
            .and_then(Quarter::from_number),
        Value::String(s) => s.parse::<Quarter>().ok(),
        _ => None,
    }
}

pub fn month_name(month: u32) -> String {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name().to_string())
        .unwrap_or_default()
}

fn whole_number(value: f64) -> Option<i64> {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

impl FromRawRow for WebsiteFact {
    const KIND: DatasetKind = DatasetKind::Website;

    fn from_row(row: &RowReader<'_>, warnings: &mut Vec<DataQualityWarning>) -> Result<Self> {
        Ok(Self {
            key: row.temporal_key(warnings)?,
            sessions: row.number(&["sessions", "totalsessions"]),
            pageviews: row.number(&["pageviews", "pageview", "views"]),
            unique_visitors: row.number(&["uniquevisitors", "users", "visitors"]),
            returning_visitors: row.number(&["returningvisitors", "returningusers"]),
            bounce_rate: row.number(&["bouncerate", "bounce"]),
            avg_session_duration: row.number(&[
                "avgsessionduration",
                "averagesessionduration",
                "avgsessiondurationsec",
                "avgsessiondurationseconds",
            ]),
        })
    }
}

impl FromRawRow for TrafficSourceFact {
    const KIND: DatasetKind = DatasetKind::TrafficSources;

    fn from_row(row: &RowReader<'_>, warnings: &mut Vec<DataQualityWarning>) -> Result<Self> {
        Ok(Self {
            key: row.temporal_key(warnings)?,
            direct: row.number(&["direct", "directtraffic"]),
            search: row.number(&["search", "organicsearch", "searchtraffic"]),
            social: row.number(&["social", "socialmedia", "socialtraffic"]),
            internal_referrer: row.number(&["internalreferrer", "internalreferral", "internal"]),
            external_referrer: row.number(&[
                "externalreferrer",
                "externalreferral",
                "referral",
                "external",
            ]),
        })
    }
}

impl FromRawRow for SearchFact {
    const KIND: DatasetKind = DatasetKind::Search;

    fn from_row(row: &RowReader<'_>, warnings: &mut Vec<DataQualityWarning>) -> Result<Self> {
        Ok(Self {
            key: row.temporal_key(warnings)?,
            impressions: row.number(&["impressions", "searchimpressions"]),
            clicks: row.number(&["clicks", "searchclicks"]),
            ctr: row.number(&["ctr", "clickthroughrate"]),
            avg_position: row.number(&["avgposition", "averageposition", "position"]),
        })
    }
}

impl FromRawRow for SocialFact {
    const KIND: DatasetKind = DatasetKind::Social;

    fn from_row(row: &RowReader<'_>, warnings: &mut Vec<DataQualityWarning>) -> Result<Self> {
        Ok(Self {
            key: row.temporal_key(warnings)?,
            channel: row.text(&["channel", "platform", "network"]),
            impressions: row.number(&["impressions"]),
            reactions: row.number(&["reactions", "likes"]),
            comments: row.number(&["comments"]),
            shares: row.number(&["shares", "reposts"]),
            clicks: row.number(&["clicks"]),
        })
    }
}

impl FromRawRow for EmailFact {
    const KIND: DatasetKind = DatasetKind::Email;

    fn from_row(row: &RowReader<'_>, warnings: &mut Vec<DataQualityWarning>) -> Result<Self> {
        // Open/click rate columns are ignored; rates are always derived from the counts.
        Ok(Self {
            key: row.temporal_key(warnings)?,
            emails_sent: row.number(&["emailssent", "sent", "delivered"]),
            unique_opens: row.number(&["uniqueopens", "opens"]),
            unique_clicks: row.number(&["uniqueclicks", "clicks"]),
        })
    }
}

impl FromRawRow for LeadsFact {
    const KIND: DatasetKind = DatasetKind::Leads;

    fn from_row(row: &RowReader<'_>, warnings: &mut Vec<DataQualityWarning>) -> Result<Self> {
        Ok(Self {
            key: row.temporal_key(warnings)?,
            new_prospects: row.number(&[
                "newmarketingprospects",
                "newprospects",
                "prospects",
            ]),
            marketing_qualified: row.number(&[
                "marketingqualified",
                "marketingqualifiedleads",
                "mql",
                "mqls",
            ]),
            sales_accepted: row.number(&["salesaccepted", "salesacceptedleads", "sal", "sals"]),
            opportunities: row.number(&["opportunities", "opps"]),
            pipeline_value: row.number(&["pipelinevalue", "pipeline"]),
        })
    }
}

impl FromRawRow for ShareOfVoiceFact {
    const KIND: DatasetKind = DatasetKind::ShareOfVoice;

    fn from_row(row: &RowReader<'_>, warnings: &mut Vec<DataQualityWarning>) -> Result<Self> {
        Ok(Self {
            key: row.temporal_key(warnings)?,
            media_mentions: row.number(&[
                "mediamentionvolume",
                "mediamentions",
                "ourmentions",
                "mentions",
            ]),
            competitor1_mentions: row.number(&["competitor1mentions", "competitor1"]),
            competitor2_mentions: row.number(&["competitor2mentions", "competitor2"]),
            media_reach_impressions: row.number(&[
                "mediareachimpressions",
                "mediareach",
                "reach",
            ]),
            social_mentions: row.number(&["socialmentions"]),
        })
    }
}

impl FromRawRow for Target {
    const KIND: DatasetKind = DatasetKind::Targets;

    fn from_row(row: &RowReader<'_>, _warnings: &mut Vec<DataQualityWarning>) -> Result<Self> {
        let year = match row.cell(&["year"]) {
            None => None,
            Some(value) if is_blank(value) => None,
            Some(value) => Some(
                parse_number(value)
                    .and_then(whole_number)
                    .and_then(|y| i32::try_from(y).ok())
                    .ok_or_else(|| {
                        row.malformed("Year", format!("has unparseable value {}", value))
                    })?,
            ),
        };

        Ok(Self {
            year,
            category: row.required_text("Category", &["category", "metriccategory"])?,
            metric: row.required_text("Metric", &["metric", "metricname", "kpi"])?,
            q1: row.number(&["q1target", "q1"]),
            q2: row.number(&["q2target", "q2"]),
            q3: row.number(&["q3target", "q3"]),
            q4: row.number(&["q4target", "q4"]),
            annual: row.number(&["annualtarget", "annual", "fullyear"]),
        })
    }
}

impl FromRawRow for Note {
    const KIND: DatasetKind = DatasetKind::Notes;

    fn from_row(row: &RowReader<'_>, _warnings: &mut Vec<DataQualityWarning>) -> Result<Self> {
        Ok(Self {
            year: row.year()?,
            quarter: row.optional_quarter()?,
            category: row.text(&["category", "section", "tab"]),
            text: row.required_text("Note", &["note", "notes", "text", "comment"])?,
        })
    }
}

impl FromRawRow for ConfigEntry {
    const KIND: DatasetKind = DatasetKind::Config;

    fn from_row(row: &RowReader<'_>, _warnings: &mut Vec<DataQualityWarning>) -> Result<Self> {
        Ok(Self {
            setting: row.required_text("Setting", &["setting", "key", "parameter", "name"])?,
            value: row.text(&["value"]),
        })
    }
}

/// Maps the `Config` sheet's Setting/Value rows onto known dashboard settings.
pub fn settings_from_entries(entries: &[ConfigEntry]) -> DashboardSettings {
    let mut settings = DashboardSettings::default();
    let mut default_year = None;
    let mut default_quarter = None;

    for entry in entries {
        let Some(value) = entry.value.clone().filter(|v| !v.is_empty()) else {
            continue;
        };

        match normalize_label(&entry.setting).as_str() {
            "companyname" | "company" | "organization" | "organisation" | "client" => {
                settings.company_name = Some(value)
            }
            "currency" | "reportingcurrency" => settings.currency = Some(value),
            "currentyear" | "defaultyear" | "reportingyear" => {
                default_year = value.trim().parse::<i32>().ok()
            }
            "currentquarter" | "defaultquarter" | "reportingquarter" => {
                default_quarter = value.parse::<Quarter>().ok()
            }
            _ => {
                settings.extra.insert(entry.setting.clone(), value);
            }
        }
    }

    settings.default_period = default_year.map(|year| Period::new(year, default_quarter));
    settings
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(cells: Value) -> RawRow {
        match cells {
            Value::Object(map) => map.into_iter().collect(),
            _ => panic!("test rows must be JSON objects"),
        }
    }

    #[test]
    fn test_blank_cells_are_absent_not_zero() {
        let raw = row(json!({
            "Year": 2024, "Quarter": "Q1", "Month": 2,
            "Sessions": "", "Pageviews": null, "Unique Visitors": "n/a",
            "Bounce Rate (%)": "45.5%", "Returning Visitors": 0
        }));

        let normalized = normalize_row::<WebsiteFact>("Website_Data", 0, &raw).unwrap();
        let fact = normalized.fact;
        assert_eq!(fact.sessions, None);
        assert_eq!(fact.pageviews, None);
        assert_eq!(fact.unique_visitors, None);
        assert_eq!(fact.returning_visitors, Some(0.0));
        assert_eq!(fact.bounce_rate, Some(45.5));
        assert_eq!(fact.avg_session_duration, None);
        assert_eq!(fact.key.month_name, "February");
        assert!(normalized.warnings.is_empty());
    }

    #[test]
    fn test_parse_number_decorations() {
        assert_eq!(parse_number(&json!("1,250")), Some(1250.0));
        assert_eq!(parse_number(&json!("$3,400.50")), Some(3400.5));
        assert_eq!(parse_number(&json!(" 12 ")), Some(12.0));
        assert_eq!(parse_number(&json!("NaN")), None);
        assert_eq!(parse_number(&json!("inf")), None);
        assert_eq!(parse_number(&json!(true)), None);
        assert_eq!(parse_number(&json!([1])), None);
    }

    #[test]
    fn test_month_names_and_derived_quarter() {
        let raw = row(json!({ "Year": "2023", "Month": "Nov", "Sessions": 10 }));
        let fact = normalize_row::<WebsiteFact>("Website_Data", 0, &raw)
            .unwrap()
            .fact;
        assert_eq!(fact.key.month, 11);
        assert_eq!(fact.key.quarter, Quarter::Q4);
        assert_eq!(fact.key.month_name, "November");
        assert_eq!(fact.key.year, 2023);
    }

    #[test]
    fn test_quarter_month_mismatch_keeps_explicit_quarter() {
        let raw = row(json!({ "Year": 2024, "Quarter": "Q2", "Month": 1, "Sessions": 10 }));
        let normalized = normalize_row::<WebsiteFact>("Website_Data", 4, &raw).unwrap();

        assert_eq!(normalized.fact.key.quarter, Quarter::Q2);
        assert_eq!(
            normalized.warnings,
            vec![DataQualityWarning::QuarterMonthMismatch {
                sheet: "Website_Data".to_string(),
                row: 5,
                month: 1,
                quarter: Quarter::Q2,
                expected: Quarter::Q1,
            }]
        );
    }

    #[test]
    fn test_malformed_temporal_key_names_column() {
        let raw = row(json!({ "Year": "twenty", "Quarter": "Q1", "Month": 1 }));
        match normalize_row::<SearchFact>("Search_Data", 2, &raw) {
            Err(DashboardError::MalformedRow { column, row, .. }) => {
                assert_eq!(column, "Year");
                assert_eq!(row, 3);
            }
            other => panic!("expected malformed row, got {:?}", other),
        }

        let raw = row(json!({ "Year": 2024, "Quarter": "Q9", "Month": 1 }));
        match normalize_row::<SearchFact>("Search_Data", 0, &raw) {
            Err(DashboardError::MalformedRow { column, .. }) => assert_eq!(column, "Quarter"),
            other => panic!("expected malformed row, got {:?}", other),
        }

        let raw = row(json!({ "Year": 2024, "Month": 13 }));
        match normalize_row::<SearchFact>("Search_Data", 0, &raw) {
            Err(DashboardError::MalformedRow { column, .. }) => assert_eq!(column, "Month"),
            other => panic!("expected malformed row, got {:?}", other),
        }
    }

    #[test]
    fn test_sheet_drops_bad_rows_and_continues() {
        let rows = vec![
            row(json!({ "Year": 2024, "Quarter": "Q1", "Month": 1, "Emails Sent": 100 })),
            row(json!({ "Year": null, "Quarter": "Q1", "Month": 2, "Emails Sent": 100 })),
            row(json!({ "Year": 2024, "Quarter": "Q1", "Month": 3, "Emails Sent": 120 })),
        ];

        let (facts, warnings) = normalize_sheet::<EmailFact>("Email_Data", &rows);
        assert_eq!(facts.len(), 2);
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            &warnings[0],
            DataQualityWarning::MalformedRow { row: 2, column, .. } if column == "Year"
        ));
    }

    #[test]
    fn test_string_fields_default_to_none() {
        let raw = row(json!({ "Year": 2024, "Month": 1, "Impressions": 50 }));
        let fact = normalize_row::<SocialFact>("Social_Data", 0, &raw)
            .unwrap()
            .fact;
        assert_eq!(fact.channel, None);

        let raw = row(json!({ "Year": 2024, "Month": 1, "Channel": "" }));
        let fact = normalize_row::<SocialFact>("Social_Data", 0, &raw)
            .unwrap()
            .fact;
        assert_eq!(fact.channel, Some(String::new()));
    }

    #[test]
    fn test_targets_and_settings() {
        let raw = row(json!({
            "Category": "Website", "Metric": "Sessions",
            "Q1 Target": 3000, "Q2 Target": "3,300", "Q3 Target": "", "Q4 Target": 3600,
            "Annual Target": 13000
        }));
        let target = normalize_row::<Target>("Targets", 0, &raw).unwrap().fact;
        assert_eq!(target.year, None);
        assert_eq!(target.q2, Some(3300.0));
        assert_eq!(target.q3, None);
        assert_eq!(target.annual, Some(13000.0));

        let raw = row(json!({ "Metric": "Sessions", "Q1 Target": 3000 }));
        assert!(normalize_row::<Target>("Targets", 0, &raw).is_err());

        let entries = vec![
            ConfigEntry {
                setting: "Company Name".to_string(),
                value: Some("Acme".to_string()),
            },
            ConfigEntry {
                setting: "Current Year".to_string(),
                value: Some("2024".to_string()),
            },
            ConfigEntry {
                setting: "Current Quarter".to_string(),
                value: Some("Q3".to_string()),
            },
            ConfigEntry {
                setting: "Theme".to_string(),
                value: Some("dark".to_string()),
            },
        ];
        let settings = settings_from_entries(&entries);
        assert_eq!(settings.company_name.as_deref(), Some("Acme"));
        assert_eq!(
            settings.default_period,
            Some(Period::quarter(2024, Quarter::Q3))
        );
        assert_eq!(settings.extra.get("Theme").map(String::as_str), Some("dark"));
    }

    #[test]
    fn test_load_workbook_missing_everything_is_no_data() {
        let workbook = RawWorkbook::new();
        assert!(matches!(
            load_workbook(&workbook, &SheetNames::default()),
            Err(DashboardError::NoData)
        ));
    }

    #[test]
    fn test_load_workbook_records_missing_sheets() {
        let mut workbook = RawWorkbook::new();
        workbook.insert(
            "Website Data".to_string(),
            vec![row(json!({ "Year": 2024, "Quarter": "Q1", "Month": 1, "Sessions": 900 }))],
        );

        let store = load_workbook(&workbook, &SheetNames::default()).unwrap();
        assert_eq!(store.website.len(), 1);
        assert!(store.warnings.contains(&DataQualityWarning::MissingSheet {
            sheet: "Leads_Data".to_string()
        }));
        assert!(!store.warnings.contains(&DataQualityWarning::MissingSheet {
            sheet: "Website_Data".to_string()
        }));
    }
}
