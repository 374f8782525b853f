use crate::ingestion::DataQualityWarning;
use crate::schema::{
    ConfigEntry, DashboardSettings, EmailFact, LeadsFact, Note, Period, Quarter, SearchFact,
    ShareOfVoiceFact, SocialFact, Target, TemporalFact, TrafficSourceFact, WebsiteFact,
};
use serde::{Deserialize, Serialize};

/// An ordered, immutable collection of monthly facts of one kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset<T> {
    facts: Vec<T>,
}

impl<T> Default for Dataset<T> {
    fn default() -> Self {
        Self { facts: Vec::new() }
    }
}

impl<T: TemporalFact> Dataset<T> {
    pub fn new(facts: Vec<T>) -> Self {
        Self { facts }
    }

    pub fn all(&self) -> &[T] {
        &self.facts
    }

    /// Facts for `year`, restricted to `quarter` when one is given.
    ///
    /// This is the only period predicate in the crate; every aggregate goes through it.
    pub fn filter(&self, year: i32, quarter: Option<Quarter>) -> Vec<&T> {
        self.facts
            .iter()
            .filter(|fact| {
                let key = fact.key();
                key.year == year && quarter.map_or(true, |q| key.quarter == q)
            })
            .collect()
    }

    pub fn filter_period(&self, period: Period) -> Vec<&T> {
        self.filter(period.year, period.quarter)
    }

    /// Distinct years present, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.facts.iter().map(|f| f.key().year).collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

/// Every dataset of one workbook load. Replaced wholesale on refresh, never patched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactStore {
    pub website: Dataset<WebsiteFact>,
    pub traffic_sources: Dataset<TrafficSourceFact>,
    pub search: Dataset<SearchFact>,
    pub social: Dataset<SocialFact>,
    pub email: Dataset<EmailFact>,
    pub leads: Dataset<LeadsFact>,
    pub share_of_voice: Dataset<ShareOfVoiceFact>,
    pub targets: Vec<Target>,
    pub notes: Vec<Note>,
    pub config_entries: Vec<ConfigEntry>,
    pub settings: DashboardSettings,
    pub warnings: Vec<DataQualityWarning>,
}

impl FactStore {
    pub fn has_monthly_data(&self) -> bool {
        !(self.website.is_empty()
            && self.traffic_sources.is_empty()
            && self.search.is_empty()
            && self.social.is_empty()
            && self.email.is_empty()
            && self.leads.is_empty()
            && self.share_of_voice.is_empty())
    }

    /// Targets in `category` that apply to `year`.
    pub fn targets_for(&self, category: &str, year: i32) -> Vec<&Target> {
        self.targets
            .iter()
            .filter(|t| t.is_category(category) && t.applies_to(year))
            .collect()
    }

    /// Notes for the period. Year-level notes (no quarter) show in every quarter of that year.
    pub fn notes_for(&self, period: Period) -> Vec<&Note> {
        self.notes
            .iter()
            .filter(|note| {
                note.year == period.year
                    && match (period.quarter, note.quarter) {
                        (Some(selected), Some(noted)) => selected == noted,
                        _ => true,
                    }
            })
            .collect()
    }

    /// Distinct years present in any monthly dataset, ascending.
    pub fn available_years(&self) -> Vec<i32> {
        let mut years = Vec::new();
        years.extend(self.website.years());
        years.extend(self.traffic_sources.years());
        years.extend(self.search.years());
        years.extend(self.social.years());
        years.extend(self.email.years());
        years.extend(self.leads.years());
        years.extend(self.share_of_voice.years());
        years.sort_unstable();
        years.dedup();
        years
    }
}
