//! Composable report filters and the views derived from them.
//!
//! A [`FilterSpec`] is a conjunction of optional predicates. Alongside the
//! filtered list it yields the values still selectable for each field given
//! the other active filters, so narrowing never dead-ends.

use crate::index::{group_by_date, GroupedView};
use crate::types::{Report, Timestamp};
use crate::util::DateParser;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Inclusive interval over `Report::timestamp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl DateRange {
    pub fn contains(&self, ts: Timestamp) -> bool {
        self.start <= ts && ts <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    Inspector,
    Authority,
    ProvisionType,
    Rating,
    DateRange,
}

impl FilterField {
    const VALUE_FIELDS: [FilterField; 4] = [
        FilterField::Inspector,
        FilterField::Authority,
        FilterField::ProvisionType,
        FilterField::Rating,
    ];
}

/// A single-field mutation of a [`FilterSpec`]. `None` clears the field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChange {
    Inspector(Option<String>),
    Authority(Option<String>),
    ProvisionType(Option<String>),
    Rating(Option<String>),
    DateRange(Option<DateRange>),
}

impl FilterChange {
    fn field(&self) -> FilterField {
        match self {
            FilterChange::Inspector(_) => FilterField::Inspector,
            FilterChange::Authority(_) => FilterField::Authority,
            FilterChange::ProvisionType(_) => FilterField::ProvisionType,
            FilterChange::Rating(_) => FilterField::Rating,
            FilterChange::DateRange(_) => FilterField::DateRange,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    pub inspector: Option<String>,
    pub authority: Option<String>,
    pub provision_type: Option<String>,
    /// Matches a report's outcome or, failing that, its overall grade.
    pub rating: Option<String>,
    pub date_range: Option<DateRange>,
}

impl FilterSpec {
    pub fn is_active(&self) -> bool {
        self.inspector.is_some()
            || self.authority.is_some()
            || self.provision_type.is_some()
            || self.rating.is_some()
            || self.date_range.is_some()
    }

    pub fn matches(&self, report: &Report) -> bool {
        self.matches_except(report, None)
    }

    /// Evaluates every active predicate except `skip`.
    pub fn matches_except(&self, report: &Report, skip: Option<FilterField>) -> bool {
        let check = |field: FilterField| skip != Some(field);

        if check(FilterField::Inspector) {
            if let Some(want) = &self.inspector {
                if report.inspector != *want {
                    return false;
                }
            }
        }
        if check(FilterField::Authority) {
            if let Some(want) = &self.authority {
                if report.local_authority != *want {
                    return false;
                }
            }
        }
        if check(FilterField::ProvisionType) {
            if let Some(want) = &self.provision_type {
                if report.provision_label() != want.as_str() {
                    return false;
                }
            }
        }
        if check(FilterField::Rating) {
            if let Some(want) = &self.rating {
                if report.verdict() != Some(want.as_str()) {
                    return false;
                }
            }
        }
        if check(FilterField::DateRange) {
            if let Some(range) = &self.date_range {
                if !range.contains(report.timestamp) {
                    return false;
                }
            }
        }
        true
    }

    fn value_of(&self, field: FilterField) -> Option<&str> {
        match field {
            FilterField::Inspector => self.inspector.as_deref(),
            FilterField::Authority => self.authority.as_deref(),
            FilterField::ProvisionType => self.provision_type.as_deref(),
            FilterField::Rating => self.rating.as_deref(),
            FilterField::DateRange => None,
        }
    }

    fn clear(&mut self, field: FilterField) {
        match field {
            FilterField::Inspector => self.inspector = None,
            FilterField::Authority => self.authority = None,
            FilterField::ProvisionType => self.provision_type = None,
            FilterField::Rating => self.rating = None,
            FilterField::DateRange => self.date_range = None,
        }
    }

    /// Applies `change`, then clears any other active field whose value is
    /// no longer among its available options. Returns the cleared fields.
    pub fn set(&mut self, change: FilterChange, reports: &[Report]) -> Vec<FilterField> {
        let changed = change.field();
        match change {
            FilterChange::Inspector(v) => self.inspector = v,
            FilterChange::Authority(v) => self.authority = v,
            FilterChange::ProvisionType(v) => self.provision_type = v,
            FilterChange::Rating(v) => self.rating = v,
            FilterChange::DateRange(v) => self.date_range = v,
        }

        let mut cleared = Vec::new();
        for field in FilterField::VALUE_FIELDS {
            if field == changed {
                continue;
            }
            let Some(current) = self.value_of(field) else {
                continue;
            };
            let options = options_for(reports, self, field);
            if !options.contains(current) {
                log::debug!("clearing {:?} filter '{}': no longer available", field, current);
                self.clear(field);
                cleared.push(field);
            }
        }
        cleared
    }
}

pub fn apply_filters(reports: &[Report], spec: &FilterSpec) -> Vec<Report> {
    reports.iter().filter(|r| spec.matches(r)).cloned().collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AvailableOptions {
    pub inspectors: BTreeSet<String>,
    pub authorities: BTreeSet<String>,
    pub provision_types: BTreeSet<String>,
    pub ratings: BTreeSet<String>,
}

fn field_value(report: &Report, field: FilterField) -> Option<&str> {
    match field {
        FilterField::Inspector => Some(report.inspector.as_str()),
        FilterField::Authority => Some(report.local_authority.as_str()),
        FilterField::ProvisionType => Some(report.provision_label()),
        FilterField::Rating => report.verdict(),
        FilterField::DateRange => None,
    }
}

fn options_for(reports: &[Report], spec: &FilterSpec, field: FilterField) -> BTreeSet<String> {
    reports
        .iter()
        .filter(|r| spec.matches_except(r, Some(field)))
        .filter_map(|r| field_value(r, field))
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn available_options(reports: &[Report], spec: &FilterSpec) -> AvailableOptions {
    AvailableOptions {
        inspectors: options_for(reports, spec, FilterField::Inspector),
        authorities: options_for(reports, spec, FilterField::Authority),
        provision_types: options_for(reports, spec, FilterField::ProvisionType),
        ratings: options_for(reports, spec, FilterField::Rating),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilteredView {
    pub grouped: GroupedView,
    pub reports: Vec<Report>,
    pub options: AvailableOptions,
    /// Distinguishes "nothing matched" from "nothing asked".
    pub filters_active: bool,
}

impl FilteredView {
    pub fn is_empty_result(&self) -> bool {
        self.filters_active && self.reports.is_empty()
    }
}

pub fn filtered_view(reports: &[Report], spec: &FilterSpec, parser: &DateParser) -> FilteredView {
    let filtered = apply_filters(reports, spec);
    let grouped = group_by_date(&filtered, parser);
    log::debug!("filter kept {}/{} reports", filtered.len(), reports.len());
    FilteredView {
        grouped,
        reports: filtered,
        options: available_options(reports, spec),
        filters_active: spec.is_active(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RatingEntry, OVERALL_EFFECTIVENESS};

    fn report(id: &str, inspector: &str, authority: &str, verdict: &str, secs: i64) -> Report {
        let graded = !matches!(verdict, "Met" | "Not Met");
        Report {
            id: id.into(),
            date: "01/01/2024".into(),
            timestamp: Timestamp { seconds: secs, nanoseconds: 0 },
            inspector: inspector.into(),
            local_authority: authority.into(),
            type_of_provision: if id == "1" { "Childminder".into() } else { String::new() },
            outcome: if graded { String::new() } else { verdict.into() },
            ratings: if graded {
                vec![RatingEntry {
                    category: OVERALL_EFFECTIVENESS.into(),
                    rating: verdict.into(),
                }]
            } else {
                vec![]
            },
            previous_inspection: String::new(),
            reference_number: String::new(),
            themes: vec![],
        }
    }

    fn fixture() -> Vec<Report> {
        vec![
            report("1", "A", "Kent", "Good", 100),
            report("2", "A", "Surrey", "Met", 200),
            report("3", "B", "Kent", "Outstanding", 300),
            report("4", "A", "Kent", "Not Met", 400),
        ]
    }

    fn ids(reports: &[Report]) -> Vec<&str> {
        reports.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn predicates_conjoin_and_keep_order() {
        let spec = FilterSpec {
            inspector: Some("A".into()),
            authority: Some("Kent".into()),
            ..Default::default()
        };
        assert_eq!(ids(&apply_filters(&fixture(), &spec)), vec!["1", "4"]);
    }

    #[test]
    fn rating_matches_outcome_or_overall_grade() {
        let reports = fixture();
        let met = FilterSpec { rating: Some("Met".into()), ..Default::default() };
        assert_eq!(ids(&apply_filters(&reports, &met)), vec!["2"]);
        let good = FilterSpec { rating: Some("Good".into()), ..Default::default() };
        assert_eq!(ids(&apply_filters(&reports, &good)), vec!["1"]);
    }

    #[test]
    fn empty_provision_filters_as_not_specified() {
        let spec = FilterSpec {
            provision_type: Some("Not Specified".into()),
            ..Default::default()
        };
        assert_eq!(ids(&apply_filters(&fixture(), &spec)), vec!["2", "3", "4"]);
    }

    #[test]
    fn date_range_is_inclusive() {
        let spec = FilterSpec {
            date_range: Some(DateRange {
                start: Timestamp { seconds: 200, nanoseconds: 0 },
                end: Timestamp { seconds: 300, nanoseconds: 0 },
            }),
            ..Default::default()
        };
        assert_eq!(ids(&apply_filters(&fixture(), &spec)), vec!["2", "3"]);
    }

    #[test]
    fn options_ignore_the_field_being_queried() {
        let spec = FilterSpec { inspector: Some("A".into()), ..Default::default() };
        let options = available_options(&fixture(), &spec);
        assert!(options.inspectors.contains("B"));
        assert_eq!(
            options.authorities.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["Kent", "Surrey"]
        );
        assert!(!options.ratings.contains("Outstanding"));
    }

    #[test]
    fn changing_a_field_clears_stale_selections() {
        let reports = fixture();
        let mut spec = FilterSpec { authority: Some("Surrey".into()), ..Default::default() };
        let cleared = spec.set(FilterChange::Inspector(Some("B".into())), &reports);
        assert_eq!(cleared, vec![FilterField::Authority]);
        assert_eq!(spec.authority, None);
        assert_eq!(spec.inspector.as_deref(), Some("B"));
    }

    #[test]
    fn narrowing_the_date_range_clears_an_absent_inspector() {
        let reports = fixture();
        let mut spec = FilterSpec {
            inspector: Some("A".into()),
            authority: Some("Kent".into()),
            ..Default::default()
        };
        let only_b = DateRange {
            start: Timestamp { seconds: 250, nanoseconds: 0 },
            end: Timestamp { seconds: 350, nanoseconds: 0 },
        };
        let cleared = spec.set(FilterChange::DateRange(Some(only_b)), &reports);
        assert_eq!(cleared, vec![FilterField::Inspector]);
        assert_eq!(spec.inspector, None);
        assert_eq!(spec.authority.as_deref(), Some("Kent"));
        assert_eq!(spec.date_range, Some(only_b));
        assert_eq!(ids(&apply_filters(&reports, &spec)), vec!["3"]);
    }

    #[test]
    fn empty_result_is_distinguishable_from_no_filters() {
        let reports = fixture();
        let none = filtered_view(&reports, &FilterSpec::default(), &DateParser::default());
        assert!(!none.filters_active);
        assert_eq!(none.reports.len(), 4);

        let spec = FilterSpec {
            inspector: Some("B".into()),
            rating: Some("Met".into()),
            ..Default::default()
        };
        let view = filtered_view(&reports, &spec, &DateParser::default());
        assert!(view.is_empty_result());
        assert!(view.grouped.is_empty());
    }
}
