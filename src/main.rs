// Entry point and high-level CLI flow.
//
// - Option [1] loads the report collection, printing diagnostics.
// - Option [2] generates the overview reports and a JSON summary.
// - Option [3] profiles and correlates one inspector or authority.
// - Option [4] narrows the collection with filters.
// - Option [5] searches the collection.
use once_cell::sync::Lazy;
use report_analytics::correlation::{CorrelationAnalyzer, SubjectSelector};
use report_analytics::filter::{filtered_view, FilterChange, FilterSpec};
use report_analytics::index::ReportIndex;
use report_analytics::stats::{self, GroupBy};
use report_analytics::types::Report;
use report_analytics::util::{format_int, format_number, DateParser};
use report_analytics::{loader, output, search, EngineConfig, EngineError};
use serde::Serialize;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

const DEFAULT_DATA_PATH: &str = "inspection_reports.json";
const CONFIG_PATH: &str = "analytics.config.json";

// Loaded once, analysed many times in a single run.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| {
    Mutex::new(AppState {
        data: None,
        filters: FilterSpec::default(),
    })
});

struct AppState {
    data: Option<Arc<[Report]>>,
    filters: FilterSpec,
}

fn state() -> MutexGuard<'static, AppState> {
    APP_STATE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn loaded_data() -> Option<Arc<[Report]>> {
    let data = state().data.clone();
    if data.is_none() {
        println!("Error: No data loaded. Please load the report file first (option 1).\n");
    }
    data
}

#[derive(Debug, Serialize)]
struct SummaryStats {
    total_reports: usize,
    total_inspectors: usize,
    total_authorities: usize,
    dates: usize,
    avg_themes_per_report: f64,
}

fn prompt(label: &str) -> String {
    print!("{}: ", label);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn optional(label: &str) -> Option<String> {
    let v = prompt(label);
    if v.is_empty() {
        None
    } else {
        Some(v)
    }
}

/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        match prompt("Back to Report Selection (Y/N)").to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn report_write(result: Result<(), EngineError>) {
    if let Err(e) = result {
        eprintln!("Write error: {}", e);
    }
}

fn handle_load(path: &str) {
    match loader::load_reports(path) {
        Ok((data, load_report)) => {
            println!(
                "Processing dataset... ({} records read, {} loaded)",
                format_int(load_report.total_rows),
                format_int(load_report.loaded_rows)
            );
            println!(
                "Note: {} records skipped due to parse errors, {} duplicate ids.",
                format_int(load_report.parse_errors),
                format_int(load_report.duplicate_ids)
            );
            if load_report.verdict_violations > 0 {
                println!(
                    "Warning: {} records carry both or neither of outcome/ratings.",
                    format_int(load_report.verdict_violations)
                );
            }
            println!();
            let mut st = state();
            st.data = Some(data.into());
            st.filters = FilterSpec::default();
        }
        Err(e) => eprintln!("Failed to load file: {}\n", e),
    }
}

fn handle_generate_reports(config: &EngineConfig, parser: &DateParser) {
    let Some(data) = loaded_data() else {
        return;
    };
    let total = data.len();

    println!("Generating reports...\n");

    let grades = stats::distribution(&data, GroupBy::Rating);
    let r1 = output::distribution_rows(&grades, total);
    report_write(output::write_csv("report1_grade_distribution.csv", &r1));
    println!("Report 1: Grade and Outcome Distribution\n");
    output::preview_table_rows(&r1, 6);

    let areas = stats::most_inspected_areas(&data, config.top_themes_limit);
    let r2 = output::distribution_rows(&areas, total);
    report_write(output::write_csv("report2_most_inspected_areas.csv", &r2));
    println!("Report 2: Most Inspected Areas (Top {})\n", config.top_themes_limit);
    output::preview_table_rows(&r2, 3);

    let themes = stats::most_common_themes(&data, config.top_themes_limit);
    let r3 = output::theme_weight_rows(&themes);
    report_write(output::write_csv("report3_common_themes.csv", &r3));
    println!("Report 3: Most Common Themes (weighted)\n");
    output::preview_table_rows(&r3, 5);

    let months = stats::distribution(&data, GroupBy::Month);
    let r4 = output::distribution_rows(&months, total);
    report_write(output::write_csv("report4_monthly_volume.csv", &r4));
    println!("Report 4: Inspections per Month\n");
    output::preview_table_rows(&r4, 3);

    let index = ReportIndex::build(&data, parser);
    let theme_entries: usize = data.iter().map(|r| r.themes.len()).sum();
    let summary = SummaryStats {
        total_reports: total,
        total_inspectors: index.by_inspector.sorted_keys.len(),
        total_authorities: index.by_authority.sorted_keys.len(),
        dates: index.by_date.sorted_keys.len(),
        avg_themes_per_report: if total == 0 { 0.0 } else { theme_entries as f64 / total as f64 },
    };
    report_write(output::write_json("summary.json", &summary));
    println!("Summary Stats (summary.json):");
    println!(
        "{{\"total_reports\": {}, \"avg_themes_per_report\": {}}}\n",
        format_int(summary.total_reports),
        format_number(summary.avg_themes_per_report, 2)
    );
}

fn handle_subject(runtime: &Runtime, analyzer: &CorrelationAnalyzer) {
    let Some(data) = loaded_data() else {
        return;
    };
    let subject = match prompt("[1] Inspector  [2] Authority").as_str() {
        "1" => SubjectSelector::inspector(prompt("Inspector name")),
        "2" => SubjectSelector::authority(prompt("Authority name")),
        _ => {
            println!("Invalid choice.\n");
            return;
        }
    };

    let profile = match subject.dimension {
        report_analytics::Dimension::Inspector => stats::inspector_profile(&data, &subject.name),
        report_analytics::Dimension::Authority => stats::authority_profile(&data, &subject.name),
    };
    println!(
        "\n{}: {} inspections across {} peers",
        profile.name,
        format_int(profile.total_inspections),
        profile.breakdown_by_other_dimension.len()
    );
    for (grade, count) in &profile.grade_distribution {
        println!("  {:<22} {}", grade, count);
    }
    println!();

    let result = runtime.block_on(analyzer.analyze_async(data, subject, CancellationToken::new()));
    match result {
        Ok(result) => {
            println!(
                "Average themes per report: {}",
                format_number(result.average_themes_per_report, 2)
            );
            let rows = output::correlation_rows(&result.correlations);
            report_write(output::write_csv("theme_correlation.csv", &rows));
            output::preview_table_rows(&rows, 10);
        }
        Err(e) => eprintln!("Correlation failed: {}\n", e),
    }
}

fn handle_filters(parser: &DateParser) {
    let Some(data) = loaded_data() else {
        return;
    };
    let mut filters = state().filters.clone();
    println!("Leave blank to clear a filter.");
    let changes = [
        FilterChange::Inspector(optional("Inspector")),
        FilterChange::Authority(optional("Authority")),
        FilterChange::ProvisionType(optional("Provision type")),
        FilterChange::Rating(optional("Rating or outcome")),
    ];
    for change in changes {
        for field in filters.set(change, &data) {
            println!("Cleared {:?}: no longer available with the other filters.", field);
        }
    }

    let view = filtered_view(&data, &filters, parser);
    if view.is_empty_result() {
        println!("No reports match the current filters.\n");
    } else {
        println!(
            "{} reports across {} dates.",
            format_int(view.reports.len()),
            format_int(view.grouped.sorted_keys.len())
        );
        output::preview_table_rows(&output::search_hit_rows(&view.grouped), 5);
    }
    println!(
        "Available: {} inspectors, {} authorities, {} provision types, ratings [{}]\n",
        view.options.inspectors.len(),
        view.options.authorities.len(),
        view.options.provision_types.len(),
        view.options.ratings.iter().cloned().collect::<Vec<_>>().join(", ")
    );
    state().filters = filters;
}

fn handle_search(parser: &DateParser) {
    let Some(data) = loaded_data() else {
        return;
    };
    let query = prompt("Search");
    let result = search::search(&data, &query, parser);
    println!("{} matches.\n", format_int(result.report_count()));
    output::preview_table_rows(&output::search_hit_rows(&result), 10);
}

fn main() {
    env_logger::init();

    let config = match EngineConfig::load_or_default(CONFIG_PATH) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Ignoring {}: {}", CONFIG_PATH, e);
            EngineConfig::default()
        }
    };
    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start worker runtime: {}", e);
            return;
        }
    };
    let data_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_DATA_PATH.to_string());
    let parser = DateParser::new(config.date_format.clone());
    let analyzer = CorrelationAnalyzer::from_config(&config);

    loop {
        println!("Inspection Report Analytics:");
        println!("[1] Load the file");
        println!("[2] Generate Reports");
        println!("[3] Inspector / Authority Insights");
        println!("[4] Filter Reports");
        println!("[5] Search\n");
        match prompt("Enter choice").as_str() {
            "1" => handle_load(&data_path),
            choice @ ("2" | "3" | "4" | "5") => {
                println!();
                match choice {
                    "2" => handle_generate_reports(&config, &parser),
                    "3" => handle_subject(&runtime, &analyzer),
                    "4" => handle_filters(&parser),
                    _ => handle_search(&parser),
                }
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => println!("Invalid choice. Please enter 1 to 5.\n"),
        }
    }
}
