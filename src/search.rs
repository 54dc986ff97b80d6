//! Substring search over a report collection.
//!
//! [`search`] is a single linear scan, cheap enough to run on every debounce
//! tick. [`LiveSearch`] is the debounced pipeline an interactive client
//! feeds keystrokes into.

use crate::index::{group_by_date, GroupedView};
use crate::types::Report;
use crate::util::DateParser;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

pub type SearchResult = GroupedView;

fn matches_query(report: &Report, needle: &str) -> bool {
    let hit = |field: &str| field.to_lowercase().contains(needle);
    hit(&report.reference_number)
        || hit(&report.inspector)
        || hit(&report.local_authority)
        || hit(&report.type_of_provision)
        || hit(&report.date)
        || report.themes.iter().any(|t| hit(&t.topic))
}

/// Case-insensitive containment match, grouped and ordered like the date
/// index. Only the empty string matches nothing; the query is used as typed,
/// so surrounding whitespace is part of the needle.
pub fn search(reports: &[Report], query: &str, parser: &DateParser) -> SearchResult {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return SearchResult::default();
    }
    group_by_date(reports.iter().filter(|r| matches_query(r, &needle)), parser)
}

/// Debounced, duplicate-suppressing search over a fixed snapshot.
pub struct LiveSearch {
    reports: Arc<[Report]>,
    parser: DateParser,
    debounce: Duration,
}

impl LiveSearch {
    pub fn new(reports: Arc<[Report]>, parser: DateParser, debounce: Duration) -> Self {
        Self { reports, parser, debounce }
    }

    /// Starts the pipeline. Queries go in through the sender; each executed
    /// search is published on the watch channel. Dropping the sender ends
    /// the task after any pending query has run.
    pub fn spawn(
        self,
    ) -> (
        mpsc::UnboundedSender<String>,
        watch::Receiver<SearchResult>,
        JoinHandle<()>,
    ) {
        let (query_tx, query_rx) = mpsc::unbounded_channel();
        let (result_tx, result_rx) = watch::channel(SearchResult::default());
        let handle = tokio::spawn(self.run(query_rx, result_tx));
        (query_tx, result_rx, handle)
    }

    async fn run(
        self,
        mut queries: mpsc::UnboundedReceiver<String>,
        results: watch::Sender<SearchResult>,
    ) {
        let mut last: Option<String> = None;
        while let Some(mut query) = queries.recv().await {
            // Keep absorbing keystrokes until the input goes quiet.
            loop {
                match tokio::time::timeout(self.debounce, queries.recv()).await {
                    Ok(Some(next)) => query = next,
                    Ok(None) | Err(_) => break,
                }
            }
            if last.as_deref() == Some(query.as_str()) {
                continue;
            }
            let result = search(&self.reports, &query, &self.parser);
            log::debug!("search '{}' matched {} reports", query, result.report_count());
            if results.send(result).is_err() {
                break;
            }
            last = Some(query);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Theme, Timestamp};

    fn report(id: &str, date: &str, authority: &str, topic: &str) -> Report {
        Report {
            id: id.into(),
            date: date.into(),
            timestamp: Timestamp::default(),
            inspector: "Sarah Johnson".into(),
            local_authority: authority.into(),
            type_of_provision: "Childminder".into(),
            outcome: "Met".into(),
            ratings: vec![],
            previous_inspection: String::new(),
            reference_number: format!("EY{id}"),
            themes: vec![Theme { topic: topic.into(), frequency: 1 }],
        }
    }

    fn fixture() -> Vec<Report> {
        vec![
            report("100", "01/02/2024", "Kent", "Safeguarding"),
            report("200", "05/03/2024", "Surrey", "Staff Training"),
            report("300", "01/02/2024", "Kent", "Outdoor Play"),
        ]
    }

    #[test]
    fn empty_query_matches_nothing() {
        assert!(search(&fixture(), "", &DateParser::default()).is_empty());
    }

    #[test]
    fn whitespace_is_matched_literally() {
        let reports = fixture();
        let parser = DateParser::default();
        // Every inspector name contains a space.
        assert_eq!(search(&reports, " ", &parser).report_count(), 3);
        assert_eq!(search(&reports, "staff ", &parser).report_count(), 1);
        assert!(search(&reports, " kent", &parser).is_empty());
        assert!(search(&reports, "   ", &parser).is_empty());
    }

    #[test]
    fn matches_case_insensitively_across_fields() {
        let reports = fixture();
        let parser = DateParser::default();
        assert_eq!(search(&reports, "KENT", &parser).report_count(), 2);
        assert_eq!(search(&reports, "training", &parser).report_count(), 1);
        assert_eq!(search(&reports, "ey3", &parser).report_count(), 1);
        assert_eq!(search(&reports, "05/03", &parser).report_count(), 1);
        assert_eq!(search(&reports, "johnson", &parser).report_count(), 3);
    }

    #[test]
    fn results_group_by_date_newest_first() {
        let result = search(&fixture(), "sarah", &DateParser::default());
        assert_eq!(result.sorted_keys, vec!["05/03/2024", "01/02/2024"]);
        assert_eq!(result.group("01/02/2024").len(), 2);
    }

    #[tokio::test]
    async fn live_search_publishes_only_the_settled_query() {
        let debounce = Duration::from_millis(20);
        let live = LiveSearch::new(fixture().into(), DateParser::default(), debounce);
        let (tx, mut rx, handle) = live.spawn();

        tx.send("s".into()).unwrap();
        tx.send("su".into()).unwrap();
        tx.send("surrey".into()).unwrap();

        rx.changed().await.unwrap();
        let got = rx.borrow_and_update().clone();
        assert_eq!(got.report_count(), 1);
        assert_eq!(got.sorted_keys, vec!["05/03/2024"]);

        // Same query again: suppressed, nothing new is published.
        tx.send("surrey".into()).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!rx.has_changed().unwrap());

        drop(tx);
        handle.await.unwrap();
    }
}
