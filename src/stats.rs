// Aggregate statistics over a report collection.
//
// Distributions by rating, area, inspector, provision type or month, the
// weighted theme ranking, and per-inspector / per-authority profiles. Every
// figure is derived on request from the slice passed in.
use crate::types::Report;
use crate::util::percentage_of;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupBy {
    /// Outcome or overall grade, "Unknown" when neither is present.
    Rating,
    Authority,
    Inspector,
    ProvisionType,
    /// `YYYY-MM` of the inspection timestamp.
    Month,
}

impl GroupBy {
    fn key_of(self, report: &Report) -> String {
        match self {
            GroupBy::Rating => report.grade_label().to_string(),
            GroupBy::Authority => report.local_authority.clone(),
            GroupBy::Inspector => report.inspector.clone(),
            GroupBy::ProvisionType => report.provision_label().to_string(),
            GroupBy::Month => report.month_key(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCount {
    pub key: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedTheme {
    pub theme: String,
    pub weight: i64,
}

/// Read-only snapshot of one inspector or authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub total_inspections: usize,
    /// Authorities for an inspector profile, inspectors for an authority one.
    pub breakdown_by_other_dimension: BTreeMap<String, usize>,
    pub grade_distribution: BTreeMap<String, usize>,
}

/// Counts per group, largest first. Equal counts keep the order in which
/// their key first appeared.
pub fn distribution(reports: &[Report], by: GroupBy) -> Vec<GroupCount> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut rows: Vec<GroupCount> = Vec::new();
    for r in reports {
        let key = by.key_of(r);
        match slots.get(&key) {
            Some(&i) => rows[i].count += 1,
            None => {
                slots.insert(key.clone(), rows.len());
                rows.push(GroupCount { key, count: 1 });
            }
        }
    }
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows
}

pub fn most_inspected_areas(reports: &[Report], limit: usize) -> Vec<GroupCount> {
    let mut rows = distribution(reports, GroupBy::Authority);
    rows.truncate(limit);
    rows
}

/// Sums each topic's per-report `frequency` weight across the collection.
pub fn most_common_themes(reports: &[Report], limit: usize) -> Vec<WeightedTheme> {
    let mut weights: HashMap<&str, i64> = HashMap::new();
    for r in reports {
        for t in &r.themes {
            *weights.entry(t.topic.as_str()).or_insert(0) += t.frequency;
        }
    }
    let mut rows: Vec<WeightedTheme> = weights
        .into_iter()
        .map(|(theme, weight)| WeightedTheme { theme: theme.to_string(), weight })
        .collect();
    rows.sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.theme.cmp(&b.theme)));
    rows.truncate(limit);
    rows
}

/// Share of reports whose verdict is `label`, floored to one decimal.
pub fn share_of_grade(reports: &[Report], label: &str) -> f64 {
    let count = reports.iter().filter(|r| r.grade_label() == label).count();
    percentage_of(count, reports.len())
}

fn profile<F, G>(reports: &[Report], name: &str, subject_of: F, other_of: G) -> Profile
where
    F: Fn(&Report) -> &str,
    G: Fn(&Report) -> &str,
{
    let mut profile = Profile {
        name: name.to_string(),
        total_inspections: 0,
        breakdown_by_other_dimension: BTreeMap::new(),
        grade_distribution: BTreeMap::new(),
    };
    for r in reports.iter().filter(|&r| subject_of(r) == name) {
        profile.total_inspections += 1;
        *profile
            .breakdown_by_other_dimension
            .entry(other_of(r).to_string())
            .or_insert(0) += 1;
        *profile
            .grade_distribution
            .entry(r.grade_label().to_string())
            .or_insert(0) += 1;
    }
    profile
}

pub fn inspector_profile(reports: &[Report], name: &str) -> Profile {
    profile(reports, name, |r| r.inspector.as_str(), |r| r.local_authority.as_str())
}

pub fn authority_profile(reports: &[Report], name: &str) -> Profile {
    profile(reports, name, |r| r.local_authority.as_str(), |r| r.inspector.as_str())
}
