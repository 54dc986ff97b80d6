// Export and console rendering helpers.
//
// CSV and JSON writers for any serializable rows, plus builders that turn
// analysis results into the flat Tabled rows used for previews.
use crate::correlation::ThemeCorrelation;
use crate::error::EngineResult;
use crate::index::GroupedView;
use crate::stats::{GroupCount, WeightedTheme};
use crate::types::{DistributionRow, SearchHitRow, ThemeCorrelationRow, ThemeWeightRow};
use crate::util::{format_number, percentage_of};
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: impl AsRef<Path>, rows: &[T]) -> EngineResult<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> EngineResult<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

pub fn correlation_rows(correlations: &[ThemeCorrelation]) -> Vec<ThemeCorrelationRow> {
    correlations
        .iter()
        .map(|c| ThemeCorrelationRow {
            theme: c.theme.clone(),
            reports: c.report_count,
            percentage: format_number(c.percentage, 1),
            dominant_rating: c.dominant_rating.clone().unwrap_or_else(|| "-".to_string()),
            rating_value: c.rating_value,
            peers: c.peers.iter().cloned().collect::<Vec<_>>().join(", "),
        })
        .collect()
}

pub fn distribution_rows(counts: &[GroupCount], total: usize) -> Vec<DistributionRow> {
    counts
        .iter()
        .enumerate()
        .map(|(idx, g)| DistributionRow {
            rank: idx + 1,
            key: g.key.clone(),
            count: g.count,
            share: format_number(percentage_of(g.count, total), 1),
        })
        .collect()
}

pub fn theme_weight_rows(themes: &[WeightedTheme]) -> Vec<ThemeWeightRow> {
    themes
        .iter()
        .enumerate()
        .map(|(idx, t)| ThemeWeightRow {
            rank: idx + 1,
            theme: t.theme.clone(),
            weight: t.weight,
        })
        .collect()
}

pub fn search_hit_rows(view: &GroupedView) -> Vec<SearchHitRow> {
    view.sorted_keys
        .iter()
        .flat_map(|key| {
            view.group(key).iter().map(move |r| SearchHitRow {
                date: key.clone(),
                reference: r.reference_number.clone(),
                inspector: r.inspector.clone(),
                authority: r.local_authority.clone(),
                verdict: r.grade_label().to_string(),
            })
        })
        .collect()
}
