//! Period aggregation over the fact store.
//!
//! Volumes are summed over reported values. Rate columns are averaged over the months that
//! reported them. Rates derived from several columns are ratios of period sums, never means of
//! monthly ratios. Every fact set is obtained through [`Dataset::filter`].

use crate::schema::{
    EmailFact, LeadsFact, Period, Quarter, SearchFact, ShareOfVoiceFact, SocialFact,
    TemporalFact, TrafficChannel, WebsiteFact,
};
use crate::store::{Dataset, FactStore};
use crate::utils::{percentage, safe_ratio};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Filters `dataset` to the period and hands the facts to `reducer`.
pub fn aggregate<T, R, F>(
    dataset: &Dataset<T>,
    year: i32,
    quarter: Option<Quarter>,
    reducer: F,
) -> R
where
    T: TemporalFact,
    F: FnOnce(&[&T]) -> R,
{
    let facts = dataset.filter(year, quarter);
    reducer(&facts)
}

/// Sum of the reported values. Zero facts, or no reported values, sum to 0.
pub fn sum_present<T>(facts: &[&T], field: impl Fn(&T) -> Option<f64>) -> f64 {
    facts.iter().filter_map(|fact| field(*fact)).sum()
}

/// Mean over the months that reported a value.
///
/// With no samples the value is 0; `samples == 0` marks it as "no signal" rather than a real 0%.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RateMean {
    pub value: f64,
    pub samples: usize,
}

impl RateMean {
    pub fn has_signal(&self) -> bool {
        self.samples > 0
    }

    pub fn as_option(&self) -> Option<f64> {
        self.has_signal().then_some(self.value)
    }
}

pub fn mean_present<T>(facts: &[&T], field: impl Fn(&T) -> Option<f64>) -> RateMean {
    let values: Vec<f64> = facts.iter().filter_map(|fact| field(*fact)).collect();
    RateMean {
        value: safe_ratio(values.iter().sum(), values.len() as f64),
        samples: values.len(),
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WebsiteSummary {
    pub months: usize,
    pub sessions: f64,
    pub pageviews: f64,
    pub unique_visitors: f64,
    pub returning_visitors: f64,
    pub bounce_rate: RateMean,
    pub avg_session_duration: RateMean,
    pub pages_per_session: f64,
    pub returning_visitor_rate: f64,
    /// Names of months in the period whose sessions were not reported.
    pub months_missing_sessions: Vec<String>,
}

impl WebsiteSummary {
    pub fn from_facts(facts: &[&WebsiteFact]) -> Self {
        let sessions = sum_present(facts, |f| f.sessions);
        let pageviews = sum_present(facts, |f| f.pageviews);
        let unique_visitors = sum_present(facts, |f| f.unique_visitors);
        let returning_visitors = sum_present(facts, |f| f.returning_visitors);

        Self {
            months: facts.len(),
            sessions,
            pageviews,
            unique_visitors,
            returning_visitors,
            bounce_rate: mean_present(facts, |f| f.bounce_rate),
            avg_session_duration: mean_present(facts, |f| f.avg_session_duration),
            pages_per_session: safe_ratio(pageviews, sessions),
            returning_visitor_rate: percentage(returning_visitors, unique_visitors),
            months_missing_sessions: facts
                .iter()
                .filter(|f| f.sessions.is_none())
                .map(|f| f.key.month_name.clone())
                .collect(),
        }
    }

    pub fn has_data(&self) -> bool {
        self.months > 0
    }
}

pub fn website_summary(store: &FactStore, period: Period) -> WebsiteSummary {
    aggregate(&store.website, period.year, period.quarter, WebsiteSummary::from_facts)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelShare {
    pub channel: TrafficChannel,
    /// Estimated sessions: monthly share times that month's sessions, summed.
    pub sessions: f64,
    /// Channel sessions over the period's total website sessions, as a percentage.
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrafficSummary {
    pub months: usize,
    /// Website sessions of the months that also have a traffic row.
    pub total_sessions: f64,
    pub channels: Vec<ChannelShare>,
}

impl TrafficSummary {
    pub fn share(&self, channel: TrafficChannel) -> f64 {
        self.channels
            .iter()
            .find(|c| c.channel == channel)
            .map_or(0.0, |c| c.share)
    }

    /// Shares are meaningful only when both traffic rows and sessions exist.
    pub fn has_signal(&self) -> bool {
        self.months > 0 && self.total_sessions > 0.0
    }
}

/// Volume-weighted channel shares for the period.
///
/// Each month's channel percentage is converted to sessions using that month's website
/// sessions. Only months with both a traffic row and reported sessions count, so a month
/// missing from the traffic sheet does not read as 0% on every channel.
pub fn traffic_summary(store: &FactStore, period: Period) -> TrafficSummary {
    let website = store.website.filter_period(period);
    let traffic = store.traffic_sources.filter_period(period);

    let mut sessions_by_month: HashMap<(i32, u32), f64> = HashMap::new();
    for fact in &website {
        if let Some(sessions) = fact.sessions {
            *sessions_by_month
                .entry((fact.key.year, fact.key.month))
                .or_default() += sessions;
        }
    }
    let total_sessions: f64 = traffic
        .iter()
        .filter_map(|fact| sessions_by_month.get(&(fact.key.year, fact.key.month)))
        .sum();

    let channels = TrafficChannel::ALL
        .iter()
        .map(|&channel| {
            let sessions: f64 = traffic
                .iter()
                .filter_map(|fact| {
                    let month_sessions = sessions_by_month.get(&(fact.key.year, fact.key.month))?;
                    let share = fact.share(channel)?;
                    Some(share / 100.0 * month_sessions)
                })
                .sum();

            ChannelShare {
                channel,
                sessions,
                share: percentage(sessions, total_sessions),
            }
        })
        .collect();

    TrafficSummary {
        months: traffic.len(),
        total_sessions,
        channels,
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchSummary {
    pub months: usize,
    pub impressions: f64,
    pub clicks: f64,
    /// Mean of the monthly CTR column.
    pub avg_ctr: RateMean,
    pub avg_position: RateMean,
    /// Clicks over impressions for the whole period.
    pub derived_ctr: f64,
}

impl SearchSummary {
    pub fn from_facts(facts: &[&SearchFact]) -> Self {
        let impressions = sum_present(facts, |f| f.impressions);
        let clicks = sum_present(facts, |f| f.clicks);
        Self {
            months: facts.len(),
            impressions,
            clicks,
            avg_ctr: mean_present(facts, |f| f.ctr),
            avg_position: mean_present(facts, |f| f.avg_position),
            derived_ctr: percentage(clicks, impressions),
        }
    }
}

pub fn search_summary(store: &FactStore, period: Period) -> SearchSummary {
    aggregate(&store.search, period.year, period.quarter, SearchSummary::from_facts)
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SocialTotals {
    pub impressions: f64,
    pub reactions: f64,
    pub comments: f64,
    pub shares: f64,
    pub clicks: f64,
    pub engagements: f64,
    /// (reactions + comments + shares) / impressions, from period sums.
    pub engagement_rate: f64,
    pub click_through_rate: f64,
}

impl SocialTotals {
    pub fn from_facts(facts: &[&SocialFact]) -> Self {
        let impressions = sum_present(facts, |f| f.impressions);
        let reactions = sum_present(facts, |f| f.reactions);
        let comments = sum_present(facts, |f| f.comments);
        let shares = sum_present(facts, |f| f.shares);
        let clicks = sum_present(facts, |f| f.clicks);
        let engagements = reactions + comments + shares;

        Self {
            impressions,
            reactions,
            comments,
            shares,
            clicks,
            engagements,
            engagement_rate: percentage(engagements, impressions),
            click_through_rate: percentage(clicks, impressions),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialChannelSummary {
    pub channel: String,
    pub rows: usize,
    pub totals: SocialTotals,
}

pub const UNSPECIFIED_CHANNEL: &str = "Unspecified";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SocialSummary {
    pub rows: usize,
    pub totals: SocialTotals,
    /// One entry per platform, sorted by name.
    pub channels: Vec<SocialChannelSummary>,
}

impl SocialSummary {
    pub fn from_facts(facts: &[&SocialFact]) -> Self {
        let mut by_channel: BTreeMap<String, Vec<&SocialFact>> = BTreeMap::new();
        for fact in facts {
            let channel = fact
                .channel
                .as_deref()
                .filter(|c| !c.is_empty())
                .unwrap_or(UNSPECIFIED_CHANNEL);
            by_channel.entry(channel.to_string()).or_default().push(*fact);
        }

        Self {
            rows: facts.len(),
            totals: SocialTotals::from_facts(facts),
            channels: by_channel
                .into_iter()
                .map(|(channel, rows)| SocialChannelSummary {
                    channel,
                    rows: rows.len(),
                    totals: SocialTotals::from_facts(&rows),
                })
                .collect(),
        }
    }
}

pub fn social_summary(store: &FactStore, period: Period) -> SocialSummary {
    aggregate(&store.social, period.year, period.quarter, SocialSummary::from_facts)
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmailSummary {
    pub months: usize,
    pub emails_sent: f64,
    pub unique_opens: f64,
    pub unique_clicks: f64,
    pub open_rate: f64,
    pub click_rate: f64,
    pub click_to_open_rate: f64,
}

impl EmailSummary {
    pub fn from_facts(facts: &[&EmailFact]) -> Self {
        let emails_sent = sum_present(facts, |f| f.emails_sent);
        let unique_opens = sum_present(facts, |f| f.unique_opens);
        let unique_clicks = sum_present(facts, |f| f.unique_clicks);
        Self {
            months: facts.len(),
            emails_sent,
            unique_opens,
            unique_clicks,
            open_rate: percentage(unique_opens, emails_sent),
            click_rate: percentage(unique_clicks, emails_sent),
            click_to_open_rate: percentage(unique_clicks, unique_opens),
        }
    }
}

pub fn email_summary(store: &FactStore, period: Period) -> EmailSummary {
    aggregate(&store.email, period.year, period.quarter, EmailSummary::from_facts)
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LeadsSummary {
    pub months: usize,
    pub new_prospects: f64,
    pub marketing_qualified: f64,
    pub sales_accepted: f64,
    pub opportunities: f64,
    pub pipeline_value: f64,
    pub pipeline_per_opportunity: f64,
}

impl LeadsSummary {
    pub fn from_facts(facts: &[&LeadsFact]) -> Self {
        let opportunities = sum_present(facts, |f| f.opportunities);
        let pipeline_value = sum_present(facts, |f| f.pipeline_value);
        Self {
            months: facts.len(),
            new_prospects: sum_present(facts, |f| f.new_prospects),
            marketing_qualified: sum_present(facts, |f| f.marketing_qualified),
            sales_accepted: sum_present(facts, |f| f.sales_accepted),
            opportunities,
            pipeline_value,
            pipeline_per_opportunity: safe_ratio(pipeline_value, opportunities),
        }
    }
}

pub fn leads_summary(store: &FactStore, period: Period) -> LeadsSummary {
    aggregate(&store.leads, period.year, period.quarter, LeadsSummary::from_facts)
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShareOfVoiceSummary {
    pub months: usize,
    pub media_mentions: f64,
    pub competitor1_mentions: f64,
    pub competitor2_mentions: f64,
    pub media_reach_impressions: f64,
    pub social_mentions: f64,
}

impl ShareOfVoiceSummary {
    pub fn from_facts(facts: &[&ShareOfVoiceFact]) -> Self {
        Self {
            months: facts.len(),
            media_mentions: sum_present(facts, |f| f.media_mentions),
            competitor1_mentions: sum_present(facts, |f| f.competitor1_mentions),
            competitor2_mentions: sum_present(facts, |f| f.competitor2_mentions),
            media_reach_impressions: sum_present(facts, |f| f.media_reach_impressions),
            social_mentions: sum_present(facts, |f| f.social_mentions),
        }
    }

    pub fn total_mentions(&self) -> f64 {
        self.media_mentions + self.competitor1_mentions + self.competitor2_mentions
    }
}

pub fn share_of_voice_summary(store: &FactStore, period: Period) -> ShareOfVoiceSummary {
    aggregate(
        &store.share_of_voice,
        period.year,
        period.quarter,
        ShareOfVoiceSummary::from_facts,
    )
}

/// One month of a chart series. `value` stays `None` when nothing was reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    pub year: i32,
    pub quarter: Quarter,
    pub month: u32,
    pub month_name: String,
    pub value: Option<f64>,
}

/// Month-by-month values for the period, ascending. Rows sharing a month (one per social
/// platform, say) are summed; the month is `None` only if none of them reported.
pub fn monthly_series<T: TemporalFact>(
    dataset: &Dataset<T>,
    period: Period,
    field: impl Fn(&T) -> Option<f64>,
) -> Vec<MonthlyPoint> {
    let mut months: BTreeMap<(i32, u32), MonthlyPoint> = BTreeMap::new();

    for fact in dataset.filter_period(period) {
        let key = fact.key();
        let point = months
            .entry((key.year, key.month))
            .or_insert_with(|| MonthlyPoint {
                year: key.year,
                quarter: key.quarter,
                month: key.month,
                month_name: key.month_name.clone(),
                value: None,
            });

        if let Some(value) = field(fact) {
            point.value = Some(point.value.unwrap_or(0.0) + value);
        }
    }

    months.into_values().collect()
}

/// Website metrics that targets can be set against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebsiteMetric {
    Sessions,
    Pageviews,
    UniqueVisitors,
    ReturningVisitors,
    BounceRate,
    AvgSessionDuration,
}

impl WebsiteMetric {
    pub fn from_name(name: &str) -> Option<Self> {
        match crate::utils::normalize_label(name).as_str() {
            "sessions" | "totalsessions" => Some(WebsiteMetric::Sessions),
            "pageviews" | "views" => Some(WebsiteMetric::Pageviews),
            "uniquevisitors" | "users" | "visitors" => Some(WebsiteMetric::UniqueVisitors),
            "returningvisitors" => Some(WebsiteMetric::ReturningVisitors),
            "bouncerate" | "bounce" => Some(WebsiteMetric::BounceRate),
            "avgsessionduration" | "averagesessionduration" => {
                Some(WebsiteMetric::AvgSessionDuration)
            }
            _ => None,
        }
    }

    /// The period actual, or `None` for an averaged metric with no reported months.
    pub fn actual(self, summary: &WebsiteSummary) -> Option<f64> {
        match self {
            WebsiteMetric::Sessions => Some(summary.sessions),
            WebsiteMetric::Pageviews => Some(summary.pageviews),
            WebsiteMetric::UniqueVisitors => Some(summary.unique_visitors),
            WebsiteMetric::ReturningVisitors => Some(summary.returning_visitors),
            WebsiteMetric::BounceRate => summary.bounce_rate.as_option(),
            WebsiteMetric::AvgSessionDuration => summary.avg_session_duration.as_option(),
        }
    }
}

pub const WEBSITE_TARGET_CATEGORY: &str = "Website";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetProgress {
    pub category: String,
    pub metric: String,
    pub website_metric: WebsiteMetric,
    pub target: f64,
    pub actual: f64,
    /// actual / target.
    pub attainment: f64,
}

impl TargetProgress {
    pub fn attainment_pct(&self) -> f64 {
        self.attainment * 100.0
    }
}

/// Actual vs target for every recognized website target of the period.
///
/// Targets with no value for the period (or a zero target), unrecognized metrics, and
/// periods with no website rows are left out: there is nothing to measure against.
pub fn target_progress(store: &FactStore, period: Period) -> Vec<TargetProgress> {
    let summary = website_summary(store, period);
    if !summary.has_data() {
        return Vec::new();
    }

    store
        .targets_for(WEBSITE_TARGET_CATEGORY, period.year)
        .into_iter()
        .filter_map(|target| {
            let metric = WebsiteMetric::from_name(&target.metric)?;
            let goal = target.for_quarter(period.quarter).filter(|v| *v != 0.0)?;
            let actual = metric.actual(&summary)?;
            Some(TargetProgress {
                category: target.category.clone(),
                metric: target.metric.clone(),
                website_metric: metric,
                target: goal,
                actual,
                attainment: safe_ratio(actual, goal),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Target;
    use crate::store::test_support::{key, website};

    fn traffic(
        year: i32,
        month: u32,
        direct: f64,
        search: f64,
        social: f64,
    ) -> crate::schema::TrafficSourceFact {
        crate::schema::TrafficSourceFact {
            key: key(year, month),
            direct: Some(direct),
            search: Some(search),
            social: Some(social),
            internal_referrer: None,
            external_referrer: None,
        }
    }

    #[test]
    fn test_empty_period_sums_to_zero() {
        let store = FactStore::default();
        let summary = website_summary(&store, Period::quarter(2024, Quarter::Q1));
        assert_eq!(summary.months, 0);
        assert_eq!(summary.sessions, 0.0);
        assert_eq!(summary.bounce_rate.value, 0.0);
        assert!(!summary.bounce_rate.has_signal());
        assert_eq!(summary.pages_per_session, 0.0);
    }

    #[test]
    fn test_absent_values_skip_sum_and_mean() {
        let mut jan = website(2024, 1, Some(1000.0));
        jan.bounce_rate = Some(40.0);
        let mut feb = website(2024, 2, None);
        feb.bounce_rate = None;
        let mut mar = website(2024, 3, Some(500.0));
        mar.bounce_rate = Some(60.0);

        let store = FactStore {
            website: Dataset::new(vec![jan, feb, mar]),
            ..FactStore::default()
        };
        let summary = website_summary(&store, Period::quarter(2024, Quarter::Q1));

        assert_eq!(summary.months, 3);
        assert_eq!(summary.sessions, 1500.0);
        assert_eq!(summary.bounce_rate.samples, 2);
        assert!((summary.bounce_rate.value - 50.0).abs() < 1e-9);
        assert_eq!(summary.months_missing_sessions, vec!["February".to_string()]);
    }

    #[test]
    fn test_traffic_shares_are_volume_weighted() {
        // Jan: 1000 sessions at 80% direct; Feb: 9000 sessions at 20% direct.
        // Mean of the column would be 50%; weighted share is (800 + 1800) / 10000 = 26%.
        let store = FactStore {
            website: Dataset::new(vec![
                website(2024, 1, Some(1000.0)),
                website(2024, 2, Some(9000.0)),
            ]),
            traffic_sources: Dataset::new(vec![
                traffic(2024, 1, 80.0, 10.0, 10.0),
                traffic(2024, 2, 20.0, 70.0, 10.0),
            ]),
            ..FactStore::default()
        };

        let summary = traffic_summary(&store, Period::quarter(2024, Quarter::Q1));
        assert!((summary.share(TrafficChannel::Direct) - 26.0).abs() < 1e-9);
        assert!((summary.share(TrafficChannel::Search) - 64.0).abs() < 1e-9);
        assert!((summary.share(TrafficChannel::Social) - 10.0).abs() < 1e-9);
        assert_eq!(summary.share(TrafficChannel::ExternalReferrer), 0.0);
        assert!(summary.has_signal());
    }

    #[test]
    fn test_months_without_traffic_rows_are_not_zero_shares() {
        let store = FactStore {
            website: Dataset::new(vec![
                website(2024, 1, Some(1000.0)),
                website(2024, 2, Some(1000.0)),
                website(2024, 3, Some(1000.0)),
            ]),
            traffic_sources: Dataset::new(vec![traffic(2024, 1, 40.0, 40.0, 20.0)]),
            ..FactStore::default()
        };

        let summary = traffic_summary(&store, Period::quarter(2024, Quarter::Q1));
        assert_eq!(summary.total_sessions, 1000.0);
        assert!((summary.share(TrafficChannel::Search) - 40.0).abs() < 1e-9);
        let total: f64 = summary.channels.iter().map(|c| c.share).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_traffic_without_sessions_has_no_signal() {
        let store = FactStore {
            traffic_sources: Dataset::new(vec![traffic(2024, 1, 80.0, 10.0, 10.0)]),
            ..FactStore::default()
        };
        let summary = traffic_summary(&store, Period::quarter(2024, Quarter::Q1));
        assert!(!summary.has_signal());
        assert_eq!(summary.share(TrafficChannel::Direct), 0.0);
    }

    #[test]
    fn test_social_engagement_is_ratio_of_sums() {
        let row = |month, channel: &str, impressions, reactions| SocialFact {
            key: key(2024, month),
            channel: Some(channel.to_string()),
            impressions: Some(impressions),
            reactions: Some(reactions),
            comments: Some(0.0),
            shares: Some(0.0),
            clicks: None,
        };

        // Per-row rates are 50% and 1%; the mean of those would be 25.5%.
        let store = FactStore {
            social: Dataset::new(vec![
                row(1, "LinkedIn", 10.0, 5.0),
                row(1, "X", 10_000.0, 100.0),
            ]),
            ..FactStore::default()
        };

        let summary = social_summary(&store, Period::quarter(2024, Quarter::Q1));
        assert!((summary.totals.engagement_rate - 105.0 / 10_010.0 * 100.0).abs() < 1e-9);
        assert_eq!(summary.channels.len(), 2);
        assert_eq!(summary.channels[0].channel, "LinkedIn");
        assert!((summary.channels[0].totals.engagement_rate - 50.0).abs() < 1e-9);
        assert_eq!(summary.totals.click_through_rate, 0.0);
    }

    #[test]
    fn test_email_rates_from_counts() {
        let fact = |month, sent, opens, clicks| EmailFact {
            key: key(2024, month),
            emails_sent: Some(sent),
            unique_opens: Some(opens),
            unique_clicks: Some(clicks),
        };
        let store = FactStore {
            email: Dataset::new(vec![fact(4, 1000.0, 250.0, 50.0), fact(5, 3000.0, 750.0, 100.0)]),
            ..FactStore::default()
        };

        let summary = email_summary(&store, Period::quarter(2024, Quarter::Q2));
        assert!((summary.open_rate - 25.0).abs() < 1e-9);
        assert!((summary.click_rate - 3.75).abs() < 1e-9);
        assert!((summary.click_to_open_rate - 15.0).abs() < 1e-9);

        let empty = email_summary(&store, Period::quarter(2024, Quarter::Q3));
        assert_eq!(empty.open_rate, 0.0);
        assert_eq!(empty.click_to_open_rate, 0.0);
    }

    #[test]
    fn test_quarters_add_up_to_year() {
        let facts: Vec<_> = (1..=12)
            .map(|m| website(2024, m, Some(100.0 * m as f64)))
            .collect();
        let store = FactStore {
            website: Dataset::new(facts),
            ..FactStore::default()
        };

        let by_quarter: f64 = Quarter::ALL
            .iter()
            .map(|q| website_summary(&store, Period::quarter(2024, *q)).sessions)
            .sum();
        let year = website_summary(&store, Period::whole_year(2024)).sessions;
        assert!((by_quarter - year).abs() < 1e-9);
        assert_eq!(year, 7800.0);
    }

    #[test]
    fn test_monthly_series_keeps_absent_months() {
        let store = FactStore {
            website: Dataset::new(vec![
                website(2024, 3, Some(30.0)),
                website(2024, 1, Some(10.0)),
                website(2024, 2, None),
            ]),
            ..FactStore::default()
        };

        let q1 = Period::quarter(2024, Quarter::Q1);
        let series = monthly_series(&store.website, q1, |f| f.sessions);
        let values: Vec<Option<f64>> = series.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![Some(10.0), None, Some(30.0)]);
        assert_eq!(series[0].month_name, "January");
    }

    #[test]
    fn test_target_progress() {
        let mut jan = website(2024, 1, Some(600.0));
        jan.bounce_rate = Some(40.0);
        let store = FactStore {
            website: Dataset::new(vec![jan]),
            targets: vec![
                Target {
                    year: Some(2024),
                    category: "Website".to_string(),
                    metric: "Sessions".to_string(),
                    q1: Some(1000.0),
                    q2: None,
                    q3: None,
                    q4: None,
                    annual: None,
                },
                Target {
                    year: None,
                    category: "website".to_string(),
                    metric: "Conversion Velocity".to_string(),
                    q1: Some(1.0),
                    q2: None,
                    q3: None,
                    q4: None,
                    annual: None,
                },
                Target {
                    year: None,
                    category: "Email".to_string(),
                    metric: "Sessions".to_string(),
                    q1: Some(1.0),
                    q2: None,
                    q3: None,
                    q4: None,
                    annual: None,
                },
            ],
            ..FactStore::default()
        };

        let progress = target_progress(&store, Period::quarter(2024, Quarter::Q1));
        assert_eq!(progress.len(), 1);
        assert_eq!(progress[0].website_metric, WebsiteMetric::Sessions);
        assert!((progress[0].attainment - 0.6).abs() < 1e-9);
        assert!((progress[0].attainment_pct() - 60.0).abs() < 1e-9);

        assert!(target_progress(&store, Period::quarter(2024, Quarter::Q2)).is_empty());
    }
}
