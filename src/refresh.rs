//! Latest-request-wins coordination for recomputations.
//!
//! The fact store is replaced wholesale on every data refresh and never mutated in place.
//! Each recomputation takes a ticket when it starts; its result is published only if no later
//! ticket has been issued in the meantime. In-flight work is never cancelled, only discarded.

use crate::config::EngineConfig;
use crate::report::{build_report, DashboardReport};
use crate::schema::PeriodSelection;
use crate::store::FactStore;
use arc_swap::ArcSwap;
use log::debug;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Issued when a recomputation starts. Holds the fact snapshot it must compute from.
#[derive(Debug, Clone)]
pub struct RefreshTicket {
    pub generation: u64,
    pub selection: PeriodSelection,
    pub facts: Arc<FactStore>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishedReport {
    pub generation: u64,
    pub report: Arc<DashboardReport>,
}

#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    facts: ArcSwap<FactStore>,
    latest_started: AtomicU64,
    published: Mutex<Option<PublishedReport>>,
}

impl RefreshCoordinator {
    pub fn new(facts: FactStore) -> Self {
        Self {
            facts: ArcSwap::new(Arc::new(facts)),
            latest_started: AtomicU64::new(0),
            published: Mutex::new(None),
        }
    }

    /// Current fact snapshot. Readers keep their `Arc` even if the store is replaced.
    pub fn facts(&self) -> Arc<FactStore> {
        self.facts.load_full()
    }

    /// Swaps in a freshly loaded store. Computations already running keep the old snapshot.
    pub fn replace_facts(&self, facts: FactStore) {
        self.facts.store(Arc::new(facts));
    }

    /// Starts a recomputation for `selection`, superseding any started earlier.
    pub fn begin(&self, selection: PeriodSelection) -> RefreshTicket {
        let facts = self.facts();
        let generation = self.latest_started.fetch_add(1, Ordering::SeqCst) + 1;
        RefreshTicket {
            generation,
            selection,
            facts,
        }
    }

    pub fn is_latest(&self, ticket: &RefreshTicket) -> bool {
        ticket.generation == self.latest_started.load(Ordering::SeqCst)
    }

    /// Publishes `report` if `ticket` is still the most recently started recomputation.
    /// Returns whether it was published.
    pub fn complete(&self, ticket: &RefreshTicket, report: DashboardReport) -> bool {
        let mut published = self.published.lock().unwrap_or_else(|p| p.into_inner());

        if !self.is_latest(ticket) {
            debug!(
                "Discarding stale report for {} (generation {}, latest {})",
                ticket.selection.period,
                ticket.generation,
                self.latest_started.load(Ordering::SeqCst)
            );
            return false;
        }

        *published = Some(PublishedReport {
            generation: ticket.generation,
            report: Arc::new(report),
        });
        true
    }

    /// Begins, computes and completes in one call.
    pub fn refresh(&self, selection: PeriodSelection, config: &EngineConfig) -> bool {
        let ticket = self.begin(selection);
        let report = build_report(&ticket.facts, ticket.selection, config);
        self.complete(&ticket, report)
    }

    /// The report currently visible to the user.
    pub fn current(&self) -> Option<Arc<DashboardReport>> {
        let published = self.published.lock().unwrap_or_else(|p| p.into_inner());
        published.as_ref().map(|p| Arc::clone(&p.report))
    }

    /// The visible report with its generation, ready to push to a client as JSON.
    pub fn published(&self) -> Option<PublishedReport> {
        let published = self.published.lock().unwrap_or_else(|p| p.into_inner());
        published.clone()
    }

    pub fn current_generation(&self) -> Option<u64> {
        let published = self.published.lock().unwrap_or_else(|p| p.into_inner());
        published.as_ref().map(|p| p.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CompareMode, Period, Quarter};
    use crate::store::test_support::website;
    use crate::store::Dataset;
    use std::sync::Barrier;
    use std::thread;

    fn store(sessions: f64) -> FactStore {
        FactStore {
            website: Dataset::new(vec![
                website(2024, 1, Some(sessions)),
                website(2024, 4, Some(sessions * 2.0)),
            ]),
            ..FactStore::default()
        }
    }

    fn selection(quarter: Quarter) -> PeriodSelection {
        PeriodSelection::new(Period::quarter(2024, quarter), CompareMode::PrevQuarter)
    }

    #[test]
    fn test_stale_result_is_discarded() {
        let coordinator = RefreshCoordinator::new(store(100.0));
        let config = EngineConfig::default();

        let first = coordinator.begin(selection(Quarter::Q1));
        let second = coordinator.begin(selection(Quarter::Q2));

        let second_report = build_report(&second.facts, second.selection, &config);
        assert!(coordinator.complete(&second, second_report));

        let first_report = build_report(&first.facts, first.selection, &config);
        assert!(!coordinator.complete(&first, first_report));

        let visible = coordinator.current().unwrap();
        assert_eq!(visible.selection.period, Period::quarter(2024, Quarter::Q2));
        assert_eq!(coordinator.current_generation(), Some(second.generation));

        let json = serde_json::to_value(coordinator.published().unwrap()).unwrap();
        assert_eq!(json["generation"], 2);
        assert_eq!(json["report"]["comparison_period"]["label"], "Q1 2024");
    }

    #[test]
    fn test_result_finishing_after_newer_start_is_discarded() {
        let coordinator = RefreshCoordinator::new(store(100.0));
        let config = EngineConfig::default();

        let first = coordinator.begin(selection(Quarter::Q1));
        let report = build_report(&first.facts, first.selection, &config);
        let _second = coordinator.begin(selection(Quarter::Q2));

        assert!(!coordinator.complete(&first, report));
        assert!(coordinator.current().is_none());
    }

    #[test]
    fn test_replaced_facts_do_not_affect_running_ticket() {
        let coordinator = RefreshCoordinator::new(store(100.0));
        let ticket = coordinator.begin(selection(Quarter::Q1));

        coordinator.replace_facts(store(500.0));

        let old = build_report(&ticket.facts, ticket.selection, &EngineConfig::default());
        assert_eq!(old.current.website.sessions, 100.0);
        assert_eq!(coordinator.facts().website.all()[0].sessions, Some(500.0));

        assert!(coordinator.refresh(selection(Quarter::Q1), &EngineConfig::default()));
        assert_eq!(coordinator.current().unwrap().current.website.sessions, 500.0);
    }

    #[test]
    fn test_concurrent_refreshes_publish_latest_started() {
        let coordinator = Arc::new(RefreshCoordinator::new(store(100.0)));
        let config = Arc::new(EngineConfig::default());
        let threads = 8;
        let barrier = Arc::new(Barrier::new(threads));

        let handles: Vec<_> = (0..threads)
            .map(|i| {
                let coordinator = Arc::clone(&coordinator);
                let config = Arc::clone(&config);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let quarter = Quarter::ALL[i % 4];
                    barrier.wait();
                    let ticket = coordinator.begin(selection(quarter));
                    let report = build_report(&ticket.facts, ticket.selection, &config);
                    coordinator.complete(&ticket, report);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(coordinator.current_generation(), Some(threads as u64));
    }
}
