//! Theme/rating correlation for one inspector or one authority.
//!
//! The subject's reports are scanned in fixed-size chunks. Per theme we keep
//! one occurrence per report (presence is binary, the per-report `frequency`
//! weight is ignored here), the rating that report carried, and the value of
//! the peer dimension so a caller can see which authorities an inspector's
//! themes came from, or which inspectors raised an authority's themes.
//!
//! Results are recomputed from scratch for every request; nothing is cached.

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::types::{rating_rank, rating_value, Report};
use crate::util::percentage_of;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    Inspector,
    Authority,
}

impl Dimension {
    pub fn value_of(self, report: &Report) -> &str {
        match self {
            Dimension::Inspector => &report.inspector,
            Dimension::Authority => &report.local_authority,
        }
    }

    pub fn peer(self) -> Dimension {
        match self {
            Dimension::Inspector => Dimension::Authority,
            Dimension::Authority => Dimension::Inspector,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectSelector {
    pub dimension: Dimension,
    pub name: String,
}

impl SubjectSelector {
    pub fn inspector(name: impl Into<String>) -> Self {
        Self { dimension: Dimension::Inspector, name: name.into() }
    }

    pub fn authority(name: impl Into<String>) -> Self {
        Self { dimension: Dimension::Authority, name: name.into() }
    }

    pub fn matches(&self, report: &Report) -> bool {
        self.dimension.value_of(report) == self.name
    }
}

/// One (report, theme) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeOccurrence {
    /// `None` when the report has neither an outcome nor an overall grade.
    pub rating: Option<String>,
    pub report_id: String,
    pub peer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeCorrelation {
    pub theme: String,
    pub report_count: usize,
    pub percentage: f64,
    pub dominant_rating: Option<String>,
    pub rating_value: u8,
    pub distinct_ratings: BTreeSet<String>,
    pub occurrences: Vec<ThemeOccurrence>,
    pub peers: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeCount {
    pub theme: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub subject: SubjectSelector,
    pub average_themes_per_report: f64,
    pub correlations: Vec<ThemeCorrelation>,
    pub frequent_themes: Vec<ThemeCount>,
    pub total_reports_for_subject: usize,
}

impl CorrelationResult {
    pub fn empty(subject: SubjectSelector) -> Self {
        Self {
            subject,
            average_themes_per_report: 0.0,
            correlations: Vec::new(),
            frequent_themes: Vec::new(),
            total_reports_for_subject: 0,
        }
    }

    pub fn correlation(&self, theme: &str) -> Option<&ThemeCorrelation> {
        self.correlations.iter().find(|c| c.theme == theme)
    }
}

/// Most frequent rating; ties go to the more favourable rating in the
/// canonical order (Outstanding first, Not Met last), then alphabetically.
fn dominant_rating<'a, I>(ratings: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for r in ratings {
        *counts.entry(r).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .min_by(|(ra, ca), (rb, cb)| {
            cb.cmp(ca)
                .then_with(|| rating_rank(ra).cmp(&rating_rank(rb)))
                .then_with(|| ra.cmp(rb))
        })
        .map(|(r, _)| r.to_string())
}

fn summarize(
    theme: String,
    occurrences: Vec<ThemeOccurrence>,
    population: usize,
) -> ThemeCorrelation {
    let report_count = occurrences
        .iter()
        .map(|o| o.report_id.as_str())
        .collect::<HashSet<_>>()
        .len();
    let dominant = dominant_rating(occurrences.iter().filter_map(|o| o.rating.as_deref()));
    let distinct_ratings = occurrences.iter().filter_map(|o| o.rating.clone()).collect();
    let peers = occurrences.iter().map(|o| o.peer.clone()).collect();
    ThemeCorrelation {
        theme,
        report_count,
        percentage: percentage_of(report_count, population),
        rating_value: dominant.as_deref().map(rating_value).unwrap_or(0),
        dominant_rating: dominant,
        distinct_ratings,
        occurrences,
        peers,
    }
}

fn by_percentage_then_theme(a: &ThemeCorrelation, b: &ThemeCorrelation) -> Ordering {
    b.percentage
        .partial_cmp(&a.percentage)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.theme.cmp(&b.theme))
}

/// Running state of one scan; fed chunk by chunk.
#[derive(Default)]
struct Tally {
    subject_reports: usize,
    theme_occurrences: usize,
    themes: HashMap<String, Vec<ThemeOccurrence>>,
}

impl Tally {
    fn absorb(&mut self, chunk: &[Report], subject: &SubjectSelector) {
        let peer = subject.dimension.peer();
        for report in chunk.iter().filter(|r| subject.matches(r)) {
            self.subject_reports += 1;
            self.theme_occurrences += report.themes.len();

            let rating = report.verdict().map(str::to_string);
            let mut seen: HashSet<&str> = HashSet::new();
            for theme in &report.themes {
                if !seen.insert(theme.topic.as_str()) {
                    continue;
                }
                self.themes.entry(theme.topic.clone()).or_default().push(ThemeOccurrence {
                    rating: rating.clone(),
                    report_id: report.id.clone(),
                    peer: peer.value_of(report).to_string(),
                });
            }
        }
    }

    fn finish(self, subject: &SubjectSelector) -> CorrelationResult {
        if self.subject_reports == 0 {
            return CorrelationResult::empty(subject.clone());
        }
        let total = self.subject_reports;

        let mut correlations: Vec<ThemeCorrelation> = self
            .themes
            .into_iter()
            .map(|(theme, occurrences)| summarize(theme, occurrences, total))
            .collect();
        correlations.sort_by(by_percentage_then_theme);

        let mut frequent_themes: Vec<ThemeCount> = correlations
            .iter()
            .map(|c| ThemeCount { theme: c.theme.clone(), count: c.report_count })
            .collect();
        frequent_themes.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.theme.cmp(&b.theme)));

        CorrelationResult {
            subject: subject.clone(),
            average_themes_per_report: self.theme_occurrences as f64 / total as f64,
            correlations,
            frequent_themes,
            total_reports_for_subject: total,
        }
    }
}

/// Stateless; one instance can serve any number of concurrent requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationAnalyzer {
    batch_size: usize,
}

impl Default for CorrelationAnalyzer {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_BATCH_SIZE)
    }
}

impl CorrelationAnalyzer {
    pub fn new(batch_size: usize) -> Self {
        Self { batch_size: batch_size.max(1) }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.batch_size)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn analyze(&self, reports: &[Report], subject: &SubjectSelector) -> CorrelationResult {
        let mut tally = Tally::default();
        for chunk in reports.chunks(self.batch_size) {
            tally.absorb(chunk, subject);
        }
        tally.finish(subject)
    }

    /// Runs the chunked scan on a tokio worker and resolves once with the
    /// finished result. Cancellation is observed before every chunk.
    pub async fn analyze_async(
        &self,
        reports: Arc<[Report]>,
        subject: SubjectSelector,
        cancel: CancellationToken,
    ) -> EngineResult<CorrelationResult> {
        let batch_size = self.batch_size;
        let handle = tokio::spawn(async move {
            log::debug!(
                "correlating {:?} '{}' over {} reports in chunks of {}",
                subject.dimension,
                subject.name,
                reports.len(),
                batch_size
            );
            let mut tally = Tally::default();
            for chunk in reports.chunks(batch_size) {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        log::debug!("correlation for '{}' cancelled", subject.name);
                        return Err(EngineError::Cancelled { subject: subject.name.clone() });
                    }
                    _ = tokio::task::yield_now() => {}
                }
                tally.absorb(chunk, &subject);
            }
            Ok(tally.finish(&subject))
        });
        handle.await?
    }
}

// ── Post-filtering ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PercentageBand {
    /// 50% and above.
    High,
    /// 20% up to but excluding 50%.
    Medium,
    /// Below 20%.
    Low,
}

impl PercentageBand {
    pub fn contains(self, percentage: f64) -> bool {
        match self {
            PercentageBand::High => percentage >= 50.0,
            PercentageBand::Medium => (20.0..50.0).contains(&percentage),
            PercentageBand::Low => percentage < 20.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationFilter {
    pub band: Option<PercentageBand>,
    pub rating: Option<String>,
    pub peer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredCorrelations {
    /// Denominator for every percentage below. Counted before the band is
    /// applied, so it can exceed the reports behind `correlations`.
    pub total_reports: usize,
    /// Distinct reports behind the themes that survived the band.
    pub surviving_reports: usize,
    pub correlations: Vec<ThemeCorrelation>,
}

/// Narrows an already computed result without rescanning reports.
///
/// With a rating or peer criterion the population shrinks to the distinct
/// reports behind the surviving occurrences, and every percentage is
/// rebased on it. Themes left with no occurrence are dropped; the band is
/// applied to the rebased percentage and does not change the denominator.
pub fn filter_correlations(
    result: &CorrelationResult,
    filter: &CorrelationFilter,
) -> FilteredCorrelations {
    let keep = |o: &ThemeOccurrence| {
        filter.rating.as_ref().map_or(true, |want| o.rating.as_ref() == Some(want))
            && filter.peer.as_ref().map_or(true, |want| o.peer == *want)
    };

    let kept: Vec<(String, Vec<ThemeOccurrence>)> = result
        .correlations
        .iter()
        .map(|c| {
            let occ: Vec<ThemeOccurrence> =
                c.occurrences.iter().filter(|&o| keep(o)).cloned().collect();
            (c.theme.clone(), occ)
        })
        .filter(|(_, occ)| !occ.is_empty())
        .collect();

    let total_reports = if filter.rating.is_none() && filter.peer.is_none() {
        result.total_reports_for_subject
    } else {
        kept.iter()
            .flat_map(|(_, occ)| occ.iter().map(|o| o.report_id.as_str()))
            .collect::<HashSet<_>>()
            .len()
    };

    let mut correlations: Vec<ThemeCorrelation> = kept
        .into_iter()
        .map(|(theme, occ)| summarize(theme, occ, total_reports))
        .filter(|c| filter.band.map_or(true, |band| band.contains(c.percentage)))
        .collect();
    correlations.sort_by(by_percentage_then_theme);

    let surviving_reports = correlations
        .iter()
        .flat_map(|c| c.occurrences.iter().map(|o| o.report_id.as_str()))
        .collect::<HashSet<_>>()
        .len();

    FilteredCorrelations { total_reports, surviving_reports, correlations }
}
