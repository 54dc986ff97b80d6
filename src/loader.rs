// Loads inspection reports from a JSON array.
//
// Ingestion tallies what it dropped in a `LoadReport` and logs a warning per
// record; only I/O failures and a non-array document are errors.
use crate::error::EngineResult;
use crate::types::Report;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
    pub duplicate_ids: usize,
    /// Records carrying both an outcome and ratings, or neither. Kept.
    pub verdict_violations: usize,
}

/// Reads a JSON array of reports.
///
/// Elements are decoded one at a time so a single malformed record is
/// counted and skipped instead of failing the whole file. Later records with
/// an id already seen are dropped.
pub fn load_reports(path: impl AsRef<Path>) -> EngineResult<(Vec<Report>, LoadReport)> {
    let raw = std::fs::read_to_string(path.as_ref())?;
    parse_reports(&raw)
}

pub fn parse_reports(raw: &str) -> EngineResult<(Vec<Report>, LoadReport)> {
    let values: Vec<Value> = serde_json::from_str(raw)?;
    let mut summary = LoadReport { total_rows: values.len(), ..Default::default() };
    let mut seen: HashSet<String> = HashSet::new();
    let mut reports: Vec<Report> = Vec::with_capacity(values.len());

    for (idx, value) in values.into_iter().enumerate() {
        let report: Report = match serde_json::from_value(value) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("skipping record #{}: {}", idx, e);
                summary.parse_errors += 1;
                continue;
            }
        };
        if !seen.insert(report.id.clone()) {
            log::warn!("skipping duplicate report id {}", report.id);
            summary.duplicate_ids += 1;
            continue;
        }
        if !report.has_single_verdict() {
            log::warn!(
                "report {} should carry exactly one of outcome or ratings",
                report.id
            );
            summary.verdict_violations += 1;
        }
        reports.push(report);
    }

    summary.loaded_rows = reports.len();
    log::info!(
        "loaded {}/{} reports ({} parse errors)",
        summary.loaded_rows,
        summary.total_rows,
        summary.parse_errors
    );
    Ok((reports, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"[
        {
            "id": "a1",
            "date": "Full inspection - 12/03/2024",
            "timestamp": {"seconds": 1710201600, "nanoseconds": 0},
            "inspector": "Sarah Johnson",
            "localAuthority": "Kent",
            "typeOfProvision": "Childminder",
            "ratings": [{"category": "Overall effectiveness", "rating": "Good"}],
            "referenceNumber": "EY123",
            "themes": [{"topic": "Safeguarding", "frequency": 2}]
        },
        {"id": "broken", "timestamp": "yesterday"},
        {
            "id": "a2",
            "timestamp": {"seconds": 1710201600},
            "outcome": "Met",
            "ratings": [{"category": "Overall effectiveness", "rating": "Good"}]
        },
        {"id": "a1", "timestamp": {"seconds": 0}, "outcome": "Met"}
    ]"#;

    #[test]
    fn bad_and_duplicate_records_are_counted_not_fatal() {
        let (reports, summary) = parse_reports(SAMPLE).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(
            summary,
            LoadReport {
                total_rows: 4,
                loaded_rows: 2,
                parse_errors: 1,
                duplicate_ids: 1,
                verdict_violations: 1,
            }
        );
        assert_eq!(reports[0].local_authority, "Kent");
        assert_eq!(reports[0].themes[0].frequency, 2);
        assert_eq!(reports[1].type_of_provision, "");
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let (reports, _) = load_reports(file.path()).unwrap();
        assert_eq!(reports[0].id, "a1");
    }

    #[test]
    fn non_array_input_is_an_error() {
        assert!(parse_reports(r#"{"id": "x"}"#).is_err());
    }
}
