//! Dashboard report assembly: the selected period, its comparison period, and everything
//! derived from them.

use crate::aggregator::{
    email_summary, leads_summary, search_summary, share_of_voice_summary, social_summary,
    target_progress, traffic_summary, website_summary, EmailSummary, LeadsSummary,
    SearchSummary, ShareOfVoiceSummary, SocialSummary, TargetProgress, TrafficSummary,
    WebsiteSummary,
};
use crate::composite::{
    digital_reach, lead_funnel, share_of_voice_breakdown, DigitalReach, LeadFunnel, ShareOfVoice,
};
use crate::config::EngineConfig;
use crate::ingestion::DataQualityWarning;
use crate::insights::generate_insights;
use crate::period::resolve_comparison_period;
use crate::schema::{
    ComparisonPeriod, DatasetKind, Insight, Note, Period, PeriodSelection, TrafficChannel,
};
use crate::store::FactStore;
use crate::trend::MetricComparison;
use log::info;
use serde::{Deserialize, Serialize};

/// Every dataset summarized over one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSnapshot {
    pub period: Period,
    pub label: String,
    pub website: WebsiteSummary,
    pub traffic: TrafficSummary,
    pub search: SearchSummary,
    pub social: SocialSummary,
    pub email: EmailSummary,
    pub leads: LeadsSummary,
    pub share_of_voice: ShareOfVoiceSummary,
    pub funnel: LeadFunnel,
    pub sov: ShareOfVoice,
    pub reach: DigitalReach,
}

impl PeriodSnapshot {
    pub fn capture(store: &FactStore, period: Period) -> Self {
        let website = website_summary(store, period);
        let social = social_summary(store, period);
        let leads = leads_summary(store, period);
        let share_of_voice = share_of_voice_summary(store, period);

        Self {
            period,
            label: period.label(),
            traffic: traffic_summary(store, period),
            search: search_summary(store, period),
            email: email_summary(store, period),
            funnel: lead_funnel(&leads),
            sov: share_of_voice_breakdown(&share_of_voice),
            reach: digital_reach(&website, &social),
            website,
            social,
            leads,
            share_of_voice,
        }
    }
}

/// One metric compared across the two periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricChange {
    pub dataset: DatasetKind,
    pub metric: String,
    #[serde(flatten)]
    pub comparison: MetricComparison,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub selection: PeriodSelection,
    pub comparison_period: ComparisonPeriod,
    pub current: PeriodSnapshot,
    pub previous: PeriodSnapshot,
    pub changes: Vec<MetricChange>,
    pub target_progress: Vec<TargetProgress>,
    pub insights: Vec<Insight>,
    pub notes: Vec<Note>,
    pub warnings: Vec<DataQualityWarning>,
}

impl DashboardReport {
    pub fn change(&self, dataset: DatasetKind, metric: &str) -> Option<&MetricComparison> {
        self.changes
            .iter()
            .find(|c| c.dataset == dataset && c.metric == metric)
            .map(|c| &c.comparison)
    }
}

/// Builds the full report for `selection`. Insights compare against the previous quarter
/// regardless of the selected compare mode.
pub fn build_report(
    store: &FactStore,
    selection: PeriodSelection,
    config: &EngineConfig,
) -> DashboardReport {
    let comparison_period = resolve_comparison_period(selection.period, selection.compare_mode);
    let current = PeriodSnapshot::capture(store, selection.period);
    let previous = PeriodSnapshot::capture(store, comparison_period.period());
    let changes = compare_snapshots(&current, &previous);
    let insights = generate_insights(store, selection.period, &config.thresholds);

    info!(
        "Built report for {} vs {}: {} changes, {} insights, {} warnings",
        current.label,
        comparison_period.label,
        changes.len(),
        insights.len(),
        store.warnings.len()
    );

    DashboardReport {
        selection,
        comparison_period,
        target_progress: target_progress(store, selection.period),
        notes: store.notes_for(selection.period).into_iter().cloned().collect(),
        warnings: store.warnings.clone(),
        current,
        previous,
        changes,
        insights,
    }
}

struct ChangeSet {
    changes: Vec<MetricChange>,
}

impl ChangeSet {
    fn volume(&mut self, dataset: DatasetKind, metric: &str, current: f64, previous: f64) {
        self.push(dataset, metric, MetricComparison::volume(current, previous));
    }

    fn rate(&mut self, dataset: DatasetKind, metric: &str, current: f64, previous: f64) {
        self.push(dataset, metric, MetricComparison::rate(current, previous));
    }

    fn push(&mut self, dataset: DatasetKind, metric: &str, comparison: MetricComparison) {
        self.changes.push(MetricChange {
            dataset,
            metric: metric.to_string(),
            comparison,
        });
    }
}

/// Volumes change relatively, rates by percentage points. Averaged metrics are compared only
/// when both periods reported them; shares only when both periods have traffic and sessions.
pub fn compare_snapshots(current: &PeriodSnapshot, previous: &PeriodSnapshot) -> Vec<MetricChange> {
    let mut set = ChangeSet {
        changes: Vec::new(),
    };

    let (cw, pw) = (&current.website, &previous.website);
    let kind = DatasetKind::Website;
    set.volume(kind, "sessions", cw.sessions, pw.sessions);
    set.volume(kind, "pageviews", cw.pageviews, pw.pageviews);
    set.volume(kind, "unique_visitors", cw.unique_visitors, pw.unique_visitors);
    set.volume(kind, "returning_visitors", cw.returning_visitors, pw.returning_visitors);
    if let (Some(c), Some(p)) = (cw.bounce_rate.as_option(), pw.bounce_rate.as_option()) {
        set.rate(kind, "bounce_rate", c, p);
    }
    if let (Some(c), Some(p)) = (
        cw.avg_session_duration.as_option(),
        pw.avg_session_duration.as_option(),
    ) {
        set.volume(kind, "avg_session_duration", c, p);
    }
    set.volume(kind, "pages_per_session", cw.pages_per_session, pw.pages_per_session);
    set.rate(
        kind,
        "returning_visitor_rate",
        cw.returning_visitor_rate,
        pw.returning_visitor_rate,
    );

    if current.traffic.has_signal() && previous.traffic.has_signal() {
        for channel in TrafficChannel::ALL {
            let metric = format!("{}_share", channel.key());
            set.rate(
                DatasetKind::TrafficSources,
                &metric,
                current.traffic.share(channel),
                previous.traffic.share(channel),
            );
        }
    }

    let (cs, ps) = (&current.search, &previous.search);
    let kind = DatasetKind::Search;
    set.volume(kind, "impressions", cs.impressions, ps.impressions);
    set.volume(kind, "clicks", cs.clicks, ps.clicks);
    if let (Some(c), Some(p)) = (cs.avg_ctr.as_option(), ps.avg_ctr.as_option()) {
        set.rate(kind, "ctr", c, p);
    }
    if let (Some(c), Some(p)) = (cs.avg_position.as_option(), ps.avg_position.as_option()) {
        set.rate(kind, "avg_position", c, p);
    }

    let (cs, ps) = (&current.social.totals, &previous.social.totals);
    let kind = DatasetKind::Social;
    set.volume(kind, "impressions", cs.impressions, ps.impressions);
    set.volume(kind, "engagements", cs.engagements, ps.engagements);
    set.volume(kind, "clicks", cs.clicks, ps.clicks);
    set.rate(kind, "engagement_rate", cs.engagement_rate, ps.engagement_rate);
    set.rate(kind, "click_through_rate", cs.click_through_rate, ps.click_through_rate);

    let (ce, pe) = (&current.email, &previous.email);
    let kind = DatasetKind::Email;
    set.volume(kind, "emails_sent", ce.emails_sent, pe.emails_sent);
    set.volume(kind, "unique_opens", ce.unique_opens, pe.unique_opens);
    set.volume(kind, "unique_clicks", ce.unique_clicks, pe.unique_clicks);
    set.rate(kind, "open_rate", ce.open_rate, pe.open_rate);
    set.rate(kind, "click_rate", ce.click_rate, pe.click_rate);
    set.rate(kind, "click_to_open_rate", ce.click_to_open_rate, pe.click_to_open_rate);

    let (cl, pl) = (&current.leads, &previous.leads);
    let kind = DatasetKind::Leads;
    set.volume(kind, "new_prospects", cl.new_prospects, pl.new_prospects);
    set.volume(kind, "marketing_qualified", cl.marketing_qualified, pl.marketing_qualified);
    set.volume(kind, "sales_accepted", cl.sales_accepted, pl.sales_accepted);
    set.volume(kind, "opportunities", cl.opportunities, pl.opportunities);
    set.volume(kind, "pipeline_value", cl.pipeline_value, pl.pipeline_value);
    set.rate(
        kind,
        "overall_conversion",
        current.funnel.overall_conversion,
        previous.funnel.overall_conversion,
    );

    let kind = DatasetKind::ShareOfVoice;
    set.volume(
        kind,
        "media_mentions",
        current.share_of_voice.media_mentions,
        previous.share_of_voice.media_mentions,
    );
    set.volume(
        kind,
        "total_mentions",
        current.sov.total_mentions,
        previous.sov.total_mentions,
    );
    set.rate(kind, "share_of_voice", current.sov.ours, previous.sov.ours);
    set.volume(kind, "digital_reach", current.reach.total, previous.reach.total);

    set.changes
}
