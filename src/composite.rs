//! Metrics composed from aggregated summaries: lead funnel, Share-of-Voice, digital reach.

use crate::aggregator::{LeadsSummary, ShareOfVoiceSummary, SocialSummary, WebsiteSummary};
use crate::utils::{percentage, round_to};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunnelStageKind {
    NewProspects,
    MarketingQualified,
    SalesAccepted,
    Opportunities,
}

impl FunnelStageKind {
    pub const ORDER: [FunnelStageKind; 4] = [
        FunnelStageKind::NewProspects,
        FunnelStageKind::MarketingQualified,
        FunnelStageKind::SalesAccepted,
        FunnelStageKind::Opportunities,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FunnelStageKind::NewProspects => "New Prospects",
            FunnelStageKind::MarketingQualified => "MQL",
            FunnelStageKind::SalesAccepted => "SAL",
            FunnelStageKind::Opportunities => "Opportunities",
        }
    }

    fn value(self, leads: &LeadsSummary) -> f64 {
        match self {
            FunnelStageKind::NewProspects => leads.new_prospects,
            FunnelStageKind::MarketingQualified => leads.marketing_qualified,
            FunnelStageKind::SalesAccepted => leads.sales_accepted,
            FunnelStageKind::Opportunities => leads.opportunities,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelStage {
    pub stage: FunnelStageKind,
    pub label: String,
    pub value: f64,
    /// Percent of the previous stage that reached this one, at full precision.
    /// `None` for the first stage. Not clamped: above 100 means the data is inconsistent.
    pub conversion_rate: Option<f64>,
}

impl FunnelStage {
    pub fn display_rate(&self) -> Option<f64> {
        self.conversion_rate.map(|rate| round_to(rate, 1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadFunnel {
    pub stages: Vec<FunnelStage>,
    /// Opportunities as a percentage of new prospects.
    pub overall_conversion: f64,
}

impl LeadFunnel {
    pub fn stage(&self, kind: FunnelStageKind) -> Option<&FunnelStage> {
        self.stages.iter().find(|s| s.stage == kind)
    }
}

/// Stage-to-stage conversion. A zero previous stage converts at 0%.
pub fn conversion_rate(stage: f64, previous_stage: f64) -> f64 {
    percentage(stage, previous_stage)
}

pub fn lead_funnel(leads: &LeadsSummary) -> LeadFunnel {
    let mut stages: Vec<FunnelStage> = Vec::with_capacity(FunnelStageKind::ORDER.len());

    for kind in FunnelStageKind::ORDER {
        let value = kind.value(leads);
        let conversion_rate = stages
            .last()
            .map(|previous| conversion_rate(value, previous.value));

        stages.push(FunnelStage {
            stage: kind,
            label: kind.label().to_string(),
            value,
            conversion_rate,
        });
    }

    LeadFunnel {
        stages,
        overall_conversion: conversion_rate(leads.opportunities, leads.new_prospects),
    }
}

/// `ours / (ours + competitor1 + competitor2) * 100`, 0 when nobody was mentioned.
pub fn share_of_voice(ours: f64, competitor1: f64, competitor2: f64) -> f64 {
    percentage(ours, ours + competitor1 + competitor2)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShareOfVoice {
    pub ours: f64,
    pub competitor1: f64,
    pub competitor2: f64,
    pub total_mentions: f64,
}

/// Our share and each competitor's share of the period's total mentions.
/// Computed from period sums, not averaged from monthly shares.
pub fn share_of_voice_breakdown(summary: &ShareOfVoiceSummary) -> ShareOfVoice {
    let total = summary.total_mentions();
    ShareOfVoice {
        ours: share_of_voice(
            summary.media_mentions,
            summary.competitor1_mentions,
            summary.competitor2_mentions,
        ),
        competitor1: percentage(summary.competitor1_mentions, total),
        competitor2: percentage(summary.competitor2_mentions, total),
        total_mentions: total,
    }
}

/// Website unique visitors plus social impressions.
///
/// People reached on several channels are counted once per channel; this is not a
/// deduplicated audience.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DigitalReach {
    pub unique_visitors: f64,
    pub social_impressions: f64,
    pub total: f64,
}

pub fn digital_reach(website: &WebsiteSummary, social: &SocialSummary) -> DigitalReach {
    DigitalReach {
        unique_visitors: website.unique_visitors,
        social_impressions: social.totals.impressions,
        total: website.unique_visitors + social.totals.impressions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::SocialTotals;

    fn leads(prospects: f64, mql: f64, sal: f64, opps: f64) -> LeadsSummary {
        LeadsSummary {
            months: 3,
            new_prospects: prospects,
            marketing_qualified: mql,
            sales_accepted: sal,
            opportunities: opps,
            ..LeadsSummary::default()
        }
    }

    #[test]
    fn test_funnel_conversions() {
        let funnel = lead_funnel(&leads(1000.0, 250.0, 100.0, 30.0));
        let rates: Vec<Option<f64>> = funnel.stages.iter().map(|s| s.conversion_rate).collect();

        assert_eq!(rates[0], None);
        assert!((rates[1].unwrap() - 25.0).abs() < 1e-9);
        assert!((rates[2].unwrap() - 40.0).abs() < 1e-9);
        assert!((rates[3].unwrap() - 30.0).abs() < 1e-9);
        assert!((funnel.overall_conversion - 3.0).abs() < 1e-9);
        assert_eq!(funnel.stage(FunnelStageKind::SalesAccepted).unwrap().value, 100.0);
    }

    #[test]
    fn test_zero_prospects_convert_at_zero() {
        let funnel = lead_funnel(&leads(0.0, 0.0, 0.0, 0.0));
        for stage in funnel.stages.iter().skip(1) {
            assert_eq!(stage.conversion_rate, Some(0.0));
        }
        assert_eq!(funnel.overall_conversion, 0.0);
    }

    #[test]
    fn test_conversion_is_not_clamped() {
        let funnel = lead_funnel(&leads(10.0, 15.0, 5.0, 5.0));
        let mql = funnel.stage(FunnelStageKind::MarketingQualified).unwrap();
        assert!((mql.conversion_rate.unwrap() - 150.0).abs() < 1e-9);
        assert!(funnel
            .stages
            .iter()
            .filter_map(|s| s.conversion_rate)
            .all(|r| r.is_finite() && r >= 0.0));
    }

    #[test]
    fn test_display_rate_rounds_but_keeps_precision() {
        let funnel = lead_funnel(&leads(3.0, 1.0, 1.0, 1.0));
        let mql = funnel.stage(FunnelStageKind::MarketingQualified).unwrap();
        assert_eq!(mql.display_rate(), Some(33.3));
        assert!((mql.conversion_rate.unwrap() - 100.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_share_of_voice() {
        assert!((share_of_voice(30.0, 50.0, 20.0) - 30.0).abs() < 1e-9);
        assert_eq!(share_of_voice(0.0, 0.0, 0.0), 0.0);

        let summary = ShareOfVoiceSummary {
            months: 3,
            media_mentions: 40.0,
            competitor1_mentions: 40.0,
            competitor2_mentions: 20.0,
            ..ShareOfVoiceSummary::default()
        };
        let sov = share_of_voice_breakdown(&summary);
        assert!((sov.ours - 40.0).abs() < 1e-9);
        assert!((sov.competitor2 - 20.0).abs() < 1e-9);
        assert_eq!(sov.total_mentions, 100.0);

        let empty = share_of_voice_breakdown(&ShareOfVoiceSummary::default());
        assert_eq!(empty.ours, 0.0);
        assert!(!empty.competitor1.is_nan());
    }

    #[test]
    fn test_digital_reach_is_additive() {
        let website = WebsiteSummary {
            unique_visitors: 4_000.0,
            ..WebsiteSummary::default()
        };
        let social = SocialSummary {
            totals: SocialTotals {
                impressions: 25_000.0,
                ..SocialTotals::default()
            },
            ..SocialSummary::default()
        };

        let reach = digital_reach(&website, &social);
        assert_eq!(reach.total, 29_000.0);
    }
}
