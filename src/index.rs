//! Grouping indices over a report collection.
//!
//! Every index is a partition of its input: each report lands in exactly one
//! group per dimension, and groups keep the input order.

use crate::types::Report;
use crate::util::DateParser;
use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupedView {
    pub grouped_by_key: HashMap<String, Vec<Report>>,
    pub sorted_keys: Vec<String>,
}

impl GroupedView {
    pub fn is_empty(&self) -> bool {
        self.sorted_keys.is_empty()
    }

    pub fn report_count(&self) -> usize {
        self.grouped_by_key.values().map(Vec::len).sum()
    }

    pub fn group(&self, key: &str) -> &[Report] {
        self.grouped_by_key.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Reports in key order, input order within a key.
    pub fn iter_sorted(&self) -> impl Iterator<Item = &Report> {
        self.sorted_keys.iter().flat_map(move |k| self.group(k).iter())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportIndex {
    pub by_date: GroupedView,
    pub by_inspector: GroupedView,
    pub by_authority: GroupedView,
}

impl ReportIndex {
    pub fn build(reports: &[Report], parser: &DateParser) -> Self {
        let index = Self {
            by_date: group_by_date(reports, parser),
            by_inspector: group_by_name(reports, |r| r.inspector.as_str()),
            by_authority: group_by_name(reports, |r| r.local_authority.as_str()),
        };
        log::debug!(
            "indexed {} reports: {} dates, {} inspectors, {} authorities",
            reports.len(),
            index.by_date.sorted_keys.len(),
            index.by_inspector.sorted_keys.len(),
            index.by_authority.sorted_keys.len()
        );
        index
    }
}

/// Groups by normalized display date. Keys sort newest first; keys that do
/// not parse follow, by raw string descending.
pub fn group_by_date<'a, I>(reports: I, parser: &DateParser) -> GroupedView
where
    I: IntoIterator<Item = &'a Report>,
{
    let mut grouped: HashMap<String, Vec<Report>> = HashMap::new();
    let mut parsed: HashMap<String, Option<NaiveDate>> = HashMap::new();
    for r in reports {
        let (key, date) = parser.group_key(&r.date);
        parsed.entry(key.clone()).or_insert(date);
        grouped.entry(key).or_default().push(r.clone());
    }

    let mut keyed: Vec<(String, Option<NaiveDate>)> = parsed.into_iter().collect();
    keyed.sort_by(|a, b| compare_date_keys(&a.0, a.1, &b.0, b.1));

    GroupedView {
        grouped_by_key: grouped,
        sorted_keys: keyed.into_iter().map(|(k, _)| k).collect(),
    }
}

fn compare_date_keys(
    a_key: &str,
    a_date: Option<NaiveDate>,
    b_key: &str,
    b_date: Option<NaiveDate>,
) -> Ordering {
    match (a_date, b_date) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b_key.cmp(a_key),
    }
}

/// Groups by an exact (case-sensitive) name field; keys sort ascending.
pub fn group_by_name<F>(reports: &[Report], key_of: F) -> GroupedView
where
    F: Fn(&Report) -> &str,
{
    let mut grouped: HashMap<String, Vec<Report>> = HashMap::new();
    for r in reports {
        grouped.entry(key_of(r).to_string()).or_default().push(r.clone());
    }
    let mut sorted_keys: Vec<String> = grouped.keys().cloned().collect();
    sorted_keys.sort();
    GroupedView {
        grouped_by_key: grouped,
        sorted_keys,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Timestamp;
    use std::collections::HashSet;

    fn report(id: &str, date: &str, inspector: &str) -> Report {
        Report {
            id: id.into(),
            date: date.into(),
            timestamp: Timestamp::default(),
            inspector: inspector.into(),
            local_authority: "Kent".into(),
            type_of_provision: String::new(),
            outcome: "Met".into(),
            ratings: vec![],
            previous_inspection: String::new(),
            reference_number: String::new(),
            themes: vec![],
        }
    }

    #[test]
    fn date_keys_sort_newest_first_with_unparsed_last() {
        let reports = vec![
            report("1", "Inspection - 01/02/2023", "A"),
            report("2", "alpha", "A"),
            report("3", "15/06/2024", "B"),
            report("4", "zulu", "B"),
            report("5", "Visit - 1/2/2023", "B"),
        ];
        let view = group_by_date(&reports, &DateParser::default());
        assert_eq!(view.sorted_keys, vec!["15/06/2024", "01/02/2023", "zulu", "alpha"]);
        let ids: Vec<&str> = view.group("01/02/2023").iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "5"]);
    }

    #[test]
    fn every_dimension_is_a_partition() {
        let reports = vec![
            report("1", "01/01/2024", "A"),
            report("2", "garbage", "B"),
            report("3", "01/01/2024", "a"),
            report("4", "", "A"),
        ];
        let index = ReportIndex::build(&reports, &DateParser::default());
        for view in [&index.by_date, &index.by_inspector, &index.by_authority] {
            assert_eq!(view.report_count(), reports.len());
            let ids: HashSet<&str> = view.iter_sorted().map(|r| r.id.as_str()).collect();
            assert_eq!(ids.len(), reports.len());
        }
        // Names group case-sensitively.
        assert_eq!(index.by_inspector.sorted_keys, vec!["A", "B", "a"]);
    }

    #[test]
    fn empty_collection_yields_empty_views() {
        let index = ReportIndex::build(&[], &DateParser::default());
        assert!(index.by_date.is_empty());
        assert!(index.by_inspector.is_empty());
    }
}
