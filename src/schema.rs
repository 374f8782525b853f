use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum Quarter {
    #[schemars(description = "January through March")]
    Q1,
    #[schemars(description = "April through June")]
    Q2,
    #[schemars(description = "July through September")]
    Q3,
    #[schemars(description = "October through December")]
    Q4,
}

impl Quarter {
    pub const ALL: [Quarter; 4] = [Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Q4];

    /// Months 1-3 map to Q1, 4-6 to Q2, 7-9 to Q3, 10-12 to Q4.
    pub fn from_month(month: u32) -> Option<Self> {
        match month {
            1..=3 => Some(Quarter::Q1),
            4..=6 => Some(Quarter::Q2),
            7..=9 => Some(Quarter::Q3),
            10..=12 => Some(Quarter::Q4),
            _ => None,
        }
    }

    pub fn from_number(number: u32) -> Option<Self> {
        match number {
            1 => Some(Quarter::Q1),
            2 => Some(Quarter::Q2),
            3 => Some(Quarter::Q3),
            4 => Some(Quarter::Q4),
            _ => None,
        }
    }

    pub fn number(self) -> u32 {
        match self {
            Quarter::Q1 => 1,
            Quarter::Q2 => 2,
            Quarter::Q3 => 3,
            Quarter::Q4 => 4,
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}", self.number())
    }
}

impl FromStr for Quarter {
    type Err = String;

    /// Accepts "Q1".."Q4" (any case, optional whitespace) and bare "1".."4".
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix('Q')
            .or_else(|| trimmed.strip_prefix('q'))
            .unwrap_or(trimmed)
            .trim();

        digits
            .parse::<u32>()
            .ok()
            .and_then(Quarter::from_number)
            .ok_or_else(|| format!("'{}' is not a quarter (expected Q1-Q4)", raw))
    }
}

/// A (year, quarter-or-whole-year) selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Period {
    pub year: i32,
    #[schemars(description = "Selected quarter, or null for the whole year")]
    pub quarter: Option<Quarter>,
}

impl Period {
    pub fn new(year: i32, quarter: Option<Quarter>) -> Self {
        Self { year, quarter }
    }

    pub fn quarter(year: i32, quarter: Quarter) -> Self {
        Self::new(year, Some(quarter))
    }

    pub fn whole_year(year: i32) -> Self {
        Self::new(year, None)
    }

    pub fn is_whole_year(&self) -> bool {
        self.quarter.is_none()
    }

    /// "Q1 2024" for a quarter, "2024" for a whole year.
    pub fn label(&self) -> String {
        match self.quarter {
            Some(q) => format!("{} {}", q, self.year),
            None => self.year.to_string(),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum CompareMode {
    #[default]
    #[schemars(description = "Compare against the immediately preceding quarter")]
    PrevQuarter,
    #[schemars(description = "Compare against the same period one year earlier")]
    PrevYear,
}

impl FromStr for CompareMode {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "prev_quarter" => Ok(CompareMode::PrevQuarter),
            "prev_year" => Ok(CompareMode::PrevYear),
            other => Err(format!(
                "compare mode must be one of: prev_quarter, prev_year (got '{}')",
                other
            )),
        }
    }
}

/// The concrete period a selection is compared against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ComparisonPeriod {
    pub year: i32,
    pub quarter: Option<Quarter>,
    pub label: String,
}

impl ComparisonPeriod {
    pub fn period(&self) -> Period {
        Period::new(self.year, self.quarter)
    }
}

/// The period currently selected in the UI, passed explicitly into every computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PeriodSelection {
    pub period: Period,
    #[serde(default)]
    pub compare_mode: CompareMode,
}

impl PeriodSelection {
    pub fn new(period: Period, compare_mode: CompareMode) -> Self {
        Self {
            period,
            compare_mode,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    Config,
    Website,
    TrafficSources,
    Search,
    Social,
    Email,
    Leads,
    ShareOfVoice,
    Targets,
    Notes,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 10] = [
        DatasetKind::Config,
        DatasetKind::Website,
        DatasetKind::TrafficSources,
        DatasetKind::Search,
        DatasetKind::Social,
        DatasetKind::Email,
        DatasetKind::Leads,
        DatasetKind::ShareOfVoice,
        DatasetKind::Targets,
        DatasetKind::Notes,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TemporalKey {
    pub year: i32,
    pub quarter: Quarter,
    #[schemars(description = "Calendar month, 1-12")]
    pub month: u32,
    pub month_name: String,
}

/// Implemented by every monthly fact so the store can filter them uniformly.
pub trait TemporalFact {
    fn key(&self) -> &TemporalKey;
}

macro_rules! temporal_fact {
    ($($fact:ty),* $(,)?) => {
        $(impl TemporalFact for $fact {
            fn key(&self) -> &TemporalKey {
                &self.key
            }
        })*
    };
}

// Numeric fields are `None` when the month was not reported, distinct from a reported zero.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WebsiteFact {
    #[serde(flatten)]
    pub key: TemporalKey,
    pub sessions: Option<f64>,
    pub pageviews: Option<f64>,
    pub unique_visitors: Option<f64>,
    pub returning_visitors: Option<f64>,
    #[schemars(description = "Bounce rate as a percentage, 0-100")]
    pub bounce_rate: Option<f64>,
    #[schemars(description = "Average session duration in seconds")]
    pub avg_session_duration: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TrafficChannel {
    Direct,
    Search,
    Social,
    InternalReferrer,
    ExternalReferrer,
}

impl TrafficChannel {
    pub const ALL: [TrafficChannel; 5] = [
        TrafficChannel::Direct,
        TrafficChannel::Search,
        TrafficChannel::Social,
        TrafficChannel::InternalReferrer,
        TrafficChannel::ExternalReferrer,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TrafficChannel::Direct => "Direct",
            TrafficChannel::Search => "Search",
            TrafficChannel::Social => "Social",
            TrafficChannel::InternalReferrer => "Internal Referrer",
            TrafficChannel::ExternalReferrer => "External Referrer",
        }
    }

    /// Snake-case name, matching the serialized form.
    pub fn key(self) -> &'static str {
        match self {
            TrafficChannel::Direct => "direct",
            TrafficChannel::Search => "search",
            TrafficChannel::Social => "social",
            TrafficChannel::InternalReferrer => "internal_referrer",
            TrafficChannel::ExternalReferrer => "external_referrer",
        }
    }
}

/// Channel shares are percentages of that month's website sessions, not counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrafficSourceFact {
    #[serde(flatten)]
    pub key: TemporalKey,
    pub direct: Option<f64>,
    pub search: Option<f64>,
    pub social: Option<f64>,
    pub internal_referrer: Option<f64>,
    pub external_referrer: Option<f64>,
}

impl TrafficSourceFact {
    pub fn share(&self, channel: TrafficChannel) -> Option<f64> {
        match channel {
            TrafficChannel::Direct => self.direct,
            TrafficChannel::Search => self.search,
            TrafficChannel::Social => self.social,
            TrafficChannel::InternalReferrer => self.internal_referrer,
            TrafficChannel::ExternalReferrer => self.external_referrer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SearchFact {
    #[serde(flatten)]
    pub key: TemporalKey,
    pub impressions: Option<f64>,
    pub clicks: Option<f64>,
    #[schemars(description = "Click-through rate as a percentage")]
    pub ctr: Option<f64>,
    #[schemars(description = "Average ranking position, 1 is the top result")]
    pub avg_position: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SocialFact {
    #[serde(flatten)]
    pub key: TemporalKey,
    #[schemars(description = "Platform name, null when the row carries none")]
    pub channel: Option<String>,
    pub impressions: Option<f64>,
    pub reactions: Option<f64>,
    pub comments: Option<f64>,
    pub shares: Option<f64>,
    pub clicks: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EmailFact {
    #[serde(flatten)]
    pub key: TemporalKey,
    pub emails_sent: Option<f64>,
    pub unique_opens: Option<f64>,
    pub unique_clicks: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LeadsFact {
    #[serde(flatten)]
    pub key: TemporalKey,
    pub new_prospects: Option<f64>,
    pub marketing_qualified: Option<f64>,
    pub sales_accepted: Option<f64>,
    pub opportunities: Option<f64>,
    #[schemars(description = "Pipeline value in the reporting currency, additive across months")]
    pub pipeline_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ShareOfVoiceFact {
    #[serde(flatten)]
    pub key: TemporalKey,
    #[schemars(description = "Media mentions of our brand")]
    pub media_mentions: Option<f64>,
    pub competitor1_mentions: Option<f64>,
    pub competitor2_mentions: Option<f64>,
    pub media_reach_impressions: Option<f64>,
    pub social_mentions: Option<f64>,
}

temporal_fact!(
    WebsiteFact,
    TrafficSourceFact,
    SearchFact,
    SocialFact,
    EmailFact,
    LeadsFact,
    ShareOfVoiceFact,
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Target {
    #[schemars(description = "Year the target applies to; null applies to every year")]
    pub year: Option<i32>,
    #[schemars(description = "Metric category, e.g. 'Website'")]
    pub category: String,
    #[schemars(description = "Metric name within the category, e.g. 'Sessions'")]
    pub metric: String,
    pub q1: Option<f64>,
    pub q2: Option<f64>,
    pub q3: Option<f64>,
    pub q4: Option<f64>,
    pub annual: Option<f64>,
}

impl Target {
    pub fn applies_to(&self, year: i32) -> bool {
        self.year.map_or(true, |y| y == year)
    }

    /// The quarterly target for a quarter, or the annual target for a whole-year view.
    pub fn for_quarter(&self, quarter: Option<Quarter>) -> Option<f64> {
        match quarter {
            Some(Quarter::Q1) => self.q1,
            Some(Quarter::Q2) => self.q2,
            Some(Quarter::Q3) => self.q3,
            Some(Quarter::Q4) => self.q4,
            None => self.annual,
        }
    }

    pub fn is_category(&self, category: &str) -> bool {
        self.category.trim().eq_ignore_ascii_case(category)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Note {
    pub year: i32,
    pub quarter: Option<Quarter>,
    pub category: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConfigEntry {
    pub setting: String,
    pub value: Option<String>,
}

/// Settings read from the workbook's `Config` sheet. Presentation only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DashboardSettings {
    pub company_name: Option<String>,
    pub currency: Option<String>,
    pub default_period: Option<Period>,
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum InsightType {
    Performance,
    Trend,
    Comparison,
    Prediction,
    Opportunity,
    Risk,
}

/// Declaration order is sort order: `High` sorts first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Insight {
    pub id: String,
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub title: String,
    pub description: String,
    pub metric: Option<String>,
    pub value: Option<f64>,
    #[schemars(description = "Percentage change or ratio that triggered the insight")]
    pub change: Option<f64>,
    pub confidence: Confidence,
    pub priority: Priority,
    pub actions: Vec<String>,
}
