use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

pub const OVERALL_EFFECTIVENESS: &str = "Overall effectiveness";
pub const NOT_SPECIFIED: &str = "Not Specified";
pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    pub seconds: i64,
    #[serde(default)]
    pub nanoseconds: u32,
}

impl Timestamp {
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.seconds, self.nanoseconds)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self {
            seconds: dt.timestamp(),
            nanoseconds: dt.timestamp_subsec_nanos(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingEntry {
    pub category: String,
    pub rating: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub topic: String,
    /// Ingestion weight local to one report; not a cross-report count.
    #[serde(default)]
    pub frequency: i64,
}

/// One inspection event as pushed by the sync collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    /// Display-only; `timestamp` is authoritative for ordering.
    #[serde(default)]
    pub date: String,
    pub timestamp: Timestamp,
    #[serde(default)]
    pub inspector: String,
    #[serde(default)]
    pub local_authority: String,
    #[serde(default)]
    pub type_of_provision: String,
    #[serde(default)]
    pub outcome: String,
    #[serde(default)]
    pub ratings: Vec<RatingEntry>,
    #[serde(default)]
    pub previous_inspection: String,
    #[serde(default)]
    pub reference_number: String,
    #[serde(default)]
    pub themes: Vec<Theme>,
}

impl Report {
    pub fn overall_rating(&self) -> Option<&str> {
        self.ratings
            .iter()
            .find(|r| r.category == OVERALL_EFFECTIVENESS)
            .map(|r| r.rating.as_str())
    }

    /// The single rating this report carries: its outcome for compliance
    /// checks, otherwise its overall effectiveness grade.
    pub fn verdict(&self) -> Option<&str> {
        let outcome = self.outcome.trim();
        if !outcome.is_empty() {
            return Some(outcome);
        }
        self.overall_rating()
    }

    pub fn grade_label(&self) -> &str {
        self.verdict().unwrap_or(UNKNOWN)
    }

    pub fn provision_label(&self) -> &str {
        let p = self.type_of_provision.trim();
        if p.is_empty() {
            NOT_SPECIFIED
        } else {
            p
        }
    }

    pub fn has_single_verdict(&self) -> bool {
        self.outcome.trim().is_empty() != self.ratings.is_empty()
    }

    pub fn sorted_themes(&self) -> Vec<&Theme> {
        let mut themes: Vec<&Theme> = self.themes.iter().collect();
        themes.sort_by(|a, b| b.frequency.cmp(&a.frequency).then_with(|| a.topic.cmp(&b.topic)));
        themes
    }

    pub fn inspected_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp.to_datetime()
    }

    pub fn month_key(&self) -> String {
        self.inspected_at()
            .map(|dt| dt.format("%Y-%m").to_string())
            .unwrap_or_else(|| UNKNOWN.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    Outstanding,
    Good,
    RequiresImprovement,
    Inadequate,
}

impl Grade {
    pub const ALL: [Grade; 4] = [
        Grade::Outstanding,
        Grade::Good,
        Grade::RequiresImprovement,
        Grade::Inadequate,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Grade::Outstanding => "Outstanding",
            Grade::Good => "Good",
            Grade::RequiresImprovement => "Requires Improvement",
            Grade::Inadequate => "Inadequate",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.label().eq_ignore_ascii_case(s.trim()))
    }

    pub fn value(self) -> u8 {
        match self {
            Grade::Outstanding => 4,
            Grade::Good => 3,
            Grade::RequiresImprovement => 2,
            Grade::Inadequate => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Met,
    NotMet,
}

impl Outcome {
    pub fn label(self) -> &'static str {
        match self {
            Outcome::Met => "Met",
            Outcome::NotMet => "Not Met",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        [Outcome::Met, Outcome::NotMet]
            .into_iter()
            .find(|o| o.label().eq_ignore_ascii_case(s.trim()))
    }
}

/// Position in the canonical severity order: Outstanding, Good,
/// Requires Improvement, Inadequate, Met, Not Met. Anything else sorts last.
pub fn rating_rank(rating: &str) -> usize {
    if let Some(g) = Grade::parse(rating) {
        return Grade::ALL.iter().position(|x| *x == g).unwrap_or(0);
    }
    match Outcome::parse(rating) {
        Some(Outcome::Met) => 4,
        Some(Outcome::NotMet) => 5,
        None => 6,
    }
}

pub fn rating_value(rating: &str) -> u8 {
    if let Some(g) = Grade::parse(rating) {
        return g.value();
    }
    match Outcome::parse(rating) {
        Some(Outcome::Met) => 4,
        Some(Outcome::NotMet) => 1,
        None => 0,
    }
}

// ── Export rows ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ThemeCorrelationRow {
    #[serde(rename = "Theme")]
    #[tabled(rename = "Theme")]
    pub theme: String,
    #[serde(rename = "Reports")]
    #[tabled(rename = "Reports")]
    pub reports: usize,
    #[serde(rename = "Percentage")]
    #[tabled(rename = "Percentage")]
    pub percentage: String,
    #[serde(rename = "DominantRating")]
    #[tabled(rename = "DominantRating")]
    pub dominant_rating: String,
    #[serde(rename = "RatingValue")]
    #[tabled(rename = "RatingValue")]
    pub rating_value: u8,
    #[serde(rename = "Peers")]
    #[tabled(rename = "Peers")]
    pub peers: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct DistributionRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Key")]
    #[tabled(rename = "Key")]
    pub key: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
    #[serde(rename = "Share")]
    #[tabled(rename = "Share")]
    pub share: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ThemeWeightRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Theme")]
    #[tabled(rename = "Theme")]
    pub theme: String,
    #[serde(rename = "Weight")]
    #[tabled(rename = "Weight")]
    pub weight: i64,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SearchHitRow {
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: String,
    #[serde(rename = "Reference")]
    #[tabled(rename = "Reference")]
    pub reference: String,
    #[serde(rename = "Inspector")]
    #[tabled(rename = "Inspector")]
    pub inspector: String,
    #[serde(rename = "Authority")]
    #[tabled(rename = "Authority")]
    pub authority: String,
    #[serde(rename = "Verdict")]
    #[tabled(rename = "Verdict")]
    pub verdict: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graded(outcome: &str, overall: Option<&str>) -> Report {
        Report {
            id: "r".into(),
            date: String::new(),
            timestamp: Timestamp::default(),
            inspector: String::new(),
            local_authority: String::new(),
            type_of_provision: String::new(),
            outcome: outcome.into(),
            ratings: overall
                .map(|g| {
                    vec![RatingEntry {
                        category: OVERALL_EFFECTIVENESS.into(),
                        rating: g.into(),
                    }]
                })
                .unwrap_or_default(),
            previous_inspection: String::new(),
            reference_number: String::new(),
            themes: vec![],
        }
    }

    #[test]
    fn verdict_prefers_outcome_then_overall_rating() {
        assert_eq!(graded("Met", None).verdict(), Some("Met"));
        assert_eq!(graded("", Some("Good")).verdict(), Some("Good"));
        assert_eq!(graded("", None).verdict(), None);
        assert_eq!(graded("", None).grade_label(), UNKNOWN);
    }

    #[test]
    fn single_verdict_invariant() {
        assert!(graded("Met", None).has_single_verdict());
        assert!(graded("", Some("Good")).has_single_verdict());
        assert!(!graded("", None).has_single_verdict());
        assert!(!graded("Met", Some("Good")).has_single_verdict());
    }

    #[test]
    fn empty_provision_reads_as_not_specified() {
        assert_eq!(graded("Met", None).provision_label(), NOT_SPECIFIED);
    }

    #[test]
    fn severity_order_and_values() {
        assert!(rating_rank("Outstanding") < rating_rank("Good"));
        assert!(rating_rank("requires improvement") < rating_rank("Inadequate"));
        assert!(rating_rank("Inadequate") < rating_rank("Met"));
        assert!(rating_rank("Not Met") < rating_rank("Something else"));
        assert_eq!(rating_value("Good"), 3);
        assert_eq!(rating_value("Not Met"), 1);
        assert_eq!(rating_value("n/a"), 0);
    }

    #[test]
    fn themes_sort_by_weight_then_topic() {
        let mut r = graded("Met", None);
        r.themes = vec![
            Theme { topic: "b".into(), frequency: 1 },
            Theme { topic: "c".into(), frequency: 5 },
            Theme { topic: "a".into(), frequency: 1 },
        ];
        let topics: Vec<&str> = r.sorted_themes().iter().map(|t| t.topic.as_str()).collect();
        assert_eq!(topics, vec!["c", "a", "b"]);
    }

    #[test]
    fn month_key_comes_from_timestamp() {
        let mut r = graded("Met", None);
        r.timestamp = Timestamp { seconds: 1_710_000_000, nanoseconds: 0 }; // 2024-03-09
        assert_eq!(r.month_key(), "2024-03");
    }
}
