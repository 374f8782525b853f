//! Rule-based insight generation.
//!
//! Each [`InsightRule`] pairs a data requirement with a factory that inspects the aggregated
//! period and returns zero or more insights. Rules are independent; a rule whose data is
//! missing is skipped. Insights always compare against the previous quarter, whatever
//! comparison the UI has selected.

use crate::aggregator::{
    target_progress, traffic_summary, website_summary, TargetProgress, TrafficSummary,
    WebsiteSummary,
};
use crate::config::InsightThresholds;
use crate::period::insight_baseline;
use crate::schema::{Confidence, Insight, InsightType, Period, Priority, TrafficChannel};
use crate::store::FactStore;
use crate::trend::percent_change;
use log::debug;

/// Everything a rule may look at, computed once per evaluation.
pub struct RuleContext<'a> {
    pub store: &'a FactStore,
    pub thresholds: &'a InsightThresholds,
    pub period: Period,
    pub baseline: Period,
    pub website: WebsiteSummary,
    pub baseline_website: WebsiteSummary,
    pub traffic: TrafficSummary,
    pub targets: Vec<TargetProgress>,
}

impl<'a> RuleContext<'a> {
    pub fn new(store: &'a FactStore, period: Period, thresholds: &'a InsightThresholds) -> Self {
        let baseline = insight_baseline(period);
        Self {
            store,
            thresholds,
            period,
            baseline,
            website: website_summary(store, period),
            baseline_website: website_summary(store, baseline),
            traffic: traffic_summary(store, period),
            targets: target_progress(store, period),
        }
    }
}

pub type RequirementFn = fn(&RuleContext<'_>) -> bool;
pub type FactoryFn = fn(&RuleContext<'_>) -> Vec<Insight>;

pub struct InsightRule {
    pub name: &'static str,
    /// Whether the data this rule needs is present.
    pub requires: RequirementFn,
    pub factory: FactoryFn,
}

#[derive(Default)]
pub struct InsightEngine {
    rules: Vec<InsightRule>,
}

impl InsightEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine loaded with the standard website and traffic rules.
    pub fn with_default_rules() -> Self {
        Self {
            rules: default_rules(),
        }
    }

    pub fn register(&mut self, name: &'static str, requires: RequirementFn, factory: FactoryFn) {
        self.rules.push(InsightRule {
            name,
            requires,
            factory,
        });
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }

    /// Runs every rule and returns insights sorted by priority. Ties keep rule order.
    pub fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Insight> {
        let mut insights = Vec::new();

        for rule in &self.rules {
            if !(rule.requires)(ctx) {
                debug!(
                    "Skipping insight rule '{}' for {}: required data missing",
                    rule.name, ctx.period
                );
                continue;
            }
            insights.extend((rule.factory)(ctx));
        }

        insights.sort_by_key(|insight| insight.priority);
        insights
    }

    pub fn generate(
        &self,
        store: &FactStore,
        period: Period,
        thresholds: &InsightThresholds,
    ) -> Vec<Insight> {
        let ctx = RuleContext::new(store, period, thresholds);
        self.evaluate(&ctx)
    }
}

/// Insights for `period` using the standard rule set.
pub fn generate_insights(
    store: &FactStore,
    period: Period,
    thresholds: &InsightThresholds,
) -> Vec<Insight> {
    InsightEngine::with_default_rules().generate(store, period, thresholds)
}

pub fn default_rules() -> Vec<InsightRule> {
    vec![
        InsightRule {
            name: "session_change",
            requires: |ctx| ctx.website.has_data() && ctx.baseline_website.has_data(),
            factory: session_change,
        },
        InsightRule {
            name: "high_bounce_rate",
            requires: |ctx| ctx.website.bounce_rate.has_signal(),
            factory: high_bounce_rate,
        },
        InsightRule {
            name: "missing_sessions",
            requires: |ctx| ctx.website.has_data(),
            factory: missing_sessions,
        },
        InsightRule {
            name: "direct_traffic_dominant",
            requires: |ctx| ctx.traffic.has_signal(),
            factory: direct_traffic_dominant,
        },
        InsightRule {
            name: "search_traffic_low",
            requires: |ctx| ctx.traffic.has_signal(),
            factory: search_traffic_low,
        },
        InsightRule {
            name: "social_traffic_low",
            requires: |ctx| ctx.traffic.has_signal(),
            factory: social_traffic_low,
        },
        InsightRule {
            name: "website_targets",
            requires: |ctx| !ctx.targets.is_empty(),
            factory: website_targets,
        },
    ]
}

fn actions(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn session_change(ctx: &RuleContext<'_>) -> Vec<Insight> {
    let trend = percent_change(ctx.website.sessions, ctx.baseline_website.sessions);
    let magnitude = trend.percent.abs();
    if magnitude <= ctx.thresholds.session_change_pct {
        return Vec::new();
    }

    let priority = if magnitude > ctx.thresholds.session_change_high_pct {
        Priority::High
    } else {
        Priority::Medium
    };

    let insight = if trend.percent > 0.0 {
        Insight {
            id: "session-growth".to_string(),
            insight_type: InsightType::Performance,
            title: format!("Website sessions up {:.1}%", trend.percent),
            description: format!(
                "Sessions rose to {:.0} in {} from {:.0} in {}.",
                ctx.website.sessions, ctx.period, ctx.baseline_website.sessions, ctx.baseline
            ),
            metric: Some("sessions".to_string()),
            value: Some(ctx.website.sessions),
            change: Some(trend.percent),
            confidence: Confidence::High,
            priority,
            actions: actions(&[
                "Identify the campaigns and channels behind the increase",
                "Check that conversion rates held up with the extra traffic",
            ]),
        }
    } else {
        Insight {
            id: "session-decline".to_string(),
            insight_type: InsightType::Risk,
            title: format!("Website sessions down {:.1}%", magnitude),
            description: format!(
                "Sessions fell to {:.0} in {} from {:.0} in {}.",
                ctx.website.sessions, ctx.period, ctx.baseline_website.sessions, ctx.baseline
            ),
            metric: Some("sessions".to_string()),
            value: Some(ctx.website.sessions),
            change: Some(trend.percent),
            confidence: Confidence::High,
            priority,
            actions: actions(&[
                "Compare traffic sources against the previous quarter",
                "Check for tracking or site availability issues",
                "Review paused or ended campaigns",
            ]),
        }
    };

    vec![insight]
}

pub const BOUNCE_RATE_ACTIONS: [&str; 4] = [
    "Review landing page relevance to campaign messaging",
    "Improve page load speed on top entry pages",
    "Add clear calls to action above the fold",
    "Check mobile usability of high-bounce pages",
];

fn high_bounce_rate(ctx: &RuleContext<'_>) -> Vec<Insight> {
    let bounce = ctx.website.bounce_rate.value;
    if bounce <= ctx.thresholds.bounce_rate_max_pct {
        return Vec::new();
    }

    vec![Insight {
        id: "bounce-rate-high".to_string(),
        insight_type: InsightType::Risk,
        title: format!("Bounce rate at {:.1}%", bounce),
        description: format!(
            "Average bounce rate for {} is {:.1}%, above the {:.0}% ceiling.",
            ctx.period, bounce, ctx.thresholds.bounce_rate_max_pct
        ),
        metric: Some("bounce_rate".to_string()),
        value: Some(bounce),
        change: None,
        confidence: Confidence::High,
        priority: Priority::Medium,
        actions: actions(&BOUNCE_RATE_ACTIONS),
    }]
}

fn missing_sessions(ctx: &RuleContext<'_>) -> Vec<Insight> {
    let missing = &ctx.website.months_missing_sessions;
    if missing.is_empty() {
        return Vec::new();
    }

    vec![Insight {
        id: "sessions-incomplete".to_string(),
        insight_type: InsightType::Risk,
        title: "Incomplete website data".to_string(),
        description: format!(
            "Sessions were not reported for {} in {}; totals for the period are understated.",
            missing.join(", "),
            ctx.period
        ),
        metric: Some("sessions".to_string()),
        value: Some(missing.len() as f64),
        change: None,
        confidence: Confidence::High,
        priority: Priority::Low,
        actions: actions(&["Fill in the missing months in the website data sheet"]),
    }]
}

fn channel_insight(
    ctx: &RuleContext<'_>,
    channel: TrafficChannel,
    id: &str,
    title: String,
    priority: Priority,
    actions_list: &[&str],
) -> Insight {
    let share = ctx.traffic.share(channel);
    Insight {
        id: id.to_string(),
        insight_type: InsightType::Opportunity,
        title,
        description: format!(
            "{} traffic made up {:.1}% of sessions in {}.",
            channel.label(),
            share,
            ctx.period
        ),
        metric: Some(format!("{}_share", channel.key())),
        value: Some(share),
        change: None,
        confidence: Confidence::Medium,
        priority,
        actions: actions(actions_list),
    }
}

fn direct_traffic_dominant(ctx: &RuleContext<'_>) -> Vec<Insight> {
    let share = ctx.traffic.share(TrafficChannel::Direct);
    if share <= ctx.thresholds.direct_share_max_pct {
        return Vec::new();
    }

    vec![channel_insight(
        ctx,
        TrafficChannel::Direct,
        "direct-traffic-dominant",
        format!("Direct traffic is {:.1}% of sessions", share),
        Priority::Low,
        &[
            "Diversify acquisition through search and social",
            "Check that campaign links carry UTM tags",
        ],
    )]
}

fn search_traffic_low(ctx: &RuleContext<'_>) -> Vec<Insight> {
    let share = ctx.traffic.share(TrafficChannel::Search);
    if share >= ctx.thresholds.search_share_min_pct {
        return Vec::new();
    }

    vec![channel_insight(
        ctx,
        TrafficChannel::Search,
        "search-traffic-low",
        format!("Search drives only {:.1}% of sessions", share),
        Priority::Medium,
        &[
            "Audit on-page SEO for priority pages",
            "Publish content targeting high-intent keywords",
        ],
    )]
}

fn social_traffic_low(ctx: &RuleContext<'_>) -> Vec<Insight> {
    let share = ctx.traffic.share(TrafficChannel::Social);
    // Exactly 0% means the channel is not used at all, which is not flagged.
    if share <= 0.0 || share >= ctx.thresholds.social_share_max_pct {
        return Vec::new();
    }

    vec![channel_insight(
        ctx,
        TrafficChannel::Social,
        "social-traffic-low",
        format!("Social drives only {:.1}% of sessions", share),
        Priority::Low,
        &[
            "Add links back to the site in social posts",
            "Promote top-performing posts to a wider audience",
        ],
    )]
}

fn website_targets(ctx: &RuleContext<'_>) -> Vec<Insight> {
    let t = ctx.thresholds;

    ctx.targets
        .iter()
        .filter_map(|progress| {
            let ratio = progress.attainment;
            let slug = crate::utils::normalize_label(&progress.metric);

            if ratio < t.target_risk_ratio {
                let priority = if ratio < t.target_critical_ratio {
                    Priority::High
                } else {
                    Priority::Medium
                };
                Some(Insight {
                    id: format!("target-behind-{}", slug),
                    insight_type: InsightType::Risk,
                    title: format!(
                        "{} at {:.0}% of target",
                        progress.metric,
                        progress.attainment_pct()
                    ),
                    description: format!(
                        "{} reached {:.1} against a {} target of {:.1}.",
                        progress.metric, progress.actual, ctx.period, progress.target
                    ),
                    metric: Some(progress.metric.clone()),
                    value: Some(progress.actual),
                    change: Some(progress.attainment_pct()),
                    confidence: Confidence::High,
                    priority,
                    actions: actions(&[
                        "Review the channel plan for this metric",
                        "Reforecast the remaining periods against target",
                    ]),
                })
            } else if ratio > t.target_exceeded_ratio {
                Some(Insight {
                    id: format!("target-exceeded-{}", slug),
                    insight_type: InsightType::Performance,
                    title: format!(
                        "{} at {:.0}% of target",
                        progress.metric,
                        progress.attainment_pct()
                    ),
                    description: format!(
                        "{} reached {:.1} against a {} target of {:.1}.",
                        progress.metric, progress.actual, ctx.period, progress.target
                    ),
                    metric: Some(progress.metric.clone()),
                    value: Some(progress.actual),
                    change: Some(progress.attainment_pct()),
                    confidence: Confidence::High,
                    priority: Priority::Low,
                    actions: actions(&["Consider raising the target for upcoming periods"]),
                })
            } else {
                None
            }
        })
        .collect()
}
