use std::io::Write;

use anyhow::Result;
use categorizer_lib::summary::{HIGH_CONFIDENCE, MEDIUM_CONFIDENCE};
use categorizer_lib::{CompanyCategorization, RunSummary};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::input::{looks_numeric, InputRow};

/// UTF-8 byte order mark, so spreadsheet tools detect the encoding.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

/// Options for the CSV writer.
#[derive(Debug, Clone, Copy)]
pub struct CsvOptions {
    pub metadata: bool,
    pub bom: bool,
    pub delimiter: u8,
}

#[derive(Serialize)]
struct BasicRow {
    company_name: String,
    company_category: String,
    category_id: u32,
    revenue: String,
    categorized_by_code: u8,
    confidence_score: String,
}

#[derive(Serialize)]
struct MetadataRow {
    company_name: String,
    company_category: String,
    category_id: u32,
    revenue: String,
    subsegment: String,
    confidence_score: String,
    selected_company: String,
    org_number: String,
    candidate_count: usize,
    skipped_malformed: usize,
    industry_code_count: usize,
    categorized_by_code: u8,
    exact_code_match: u8,
    keyword_match: u8,
    exact_name_match: u8,
    matched_code: String,
    matching_keywords: String,
    method: String,
    lookup_status: String,
}

#[derive(Serialize)]
struct JsonRow<'a> {
    #[serde(flatten)]
    result: &'a CompanyCategorization,
    revenue: &'a str,
}

/// Neutralize cells a spreadsheet would evaluate as a formula.
pub fn sanitize_csv_field(value: &str) -> String {
    if value.starts_with(|c| matches!(c, '=' | '+' | '-' | '@')) {
        format!("\t{}", value)
    } else {
        value.to_string()
    }
}

/// Revenue cells pass through untouched when they are plain numbers, so a
/// negative amount stays numeric.
fn sanitize_revenue(value: &str) -> String {
    if looks_numeric(value) {
        value.to_string()
    } else {
        sanitize_csv_field(value)
    }
}

fn flag(value: bool) -> u8 {
    u8::from(value)
}

fn build_basic_row(input: &InputRow, result: &CompanyCategorization) -> BasicRow {
    let a = &result.assignment;
    BasicRow {
        company_name: sanitize_csv_field(&input.company_name),
        company_category: a.category.clone(),
        category_id: a.category_id,
        revenue: sanitize_revenue(&input.revenue),
        categorized_by_code: flag(a.categorized_by_code()),
        confidence_score: format!("{:.3}", a.confidence),
    }
}

fn build_metadata_row(input: &InputRow, result: &CompanyCategorization) -> MetadataRow {
    let a = &result.assignment;
    let d = &a.diagnostics;
    MetadataRow {
        company_name: sanitize_csv_field(&input.company_name),
        company_category: a.category.clone(),
        category_id: a.category_id,
        revenue: sanitize_revenue(&input.revenue),
        subsegment: a.subsegment.clone(),
        confidence_score: format!("{:.3}", a.confidence),
        selected_company: sanitize_csv_field(d.selected_company.as_deref().unwrap_or("")),
        org_number: d.org_number.clone().unwrap_or_default(),
        candidate_count: d.candidate_count,
        skipped_malformed: d.skipped_malformed,
        industry_code_count: d.industry_code_count,
        categorized_by_code: flag(a.categorized_by_code()),
        exact_code_match: flag(d.matched_code.is_some() && a.categorized_by_code()),
        keyword_match: flag(a.keyword_match()),
        exact_name_match: flag(d.exact_name_match),
        matched_code: d.matched_code.clone().unwrap_or_default(),
        matching_keywords: d.matching_keywords.join("; "),
        method: a.method.to_string(),
        lookup_status: d.lookup_status.to_string(),
    }
}

// -- CSV output --

pub fn write_csv<W: Write>(
    mut writer: W,
    inputs: &[InputRow],
    results: &[CompanyCategorization],
    options: CsvOptions,
) -> Result<()> {
    if options.bom {
        writer.write_all(UTF8_BOM)?;
    }
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(writer);
    for (input, result) in inputs.iter().zip(results) {
        if options.metadata {
            wtr.serialize(build_metadata_row(input, result))?;
        } else {
            wtr.serialize(build_basic_row(input, result))?;
        }
    }
    wtr.flush()?;
    Ok(())
}

// -- JSON output --

pub fn write_json<W: Write>(
    writer: W,
    inputs: &[InputRow],
    results: &[CompanyCategorization],
) -> Result<()> {
    let rows: Vec<JsonRow<'_>> = inputs
        .iter()
        .zip(results)
        .map(|(input, result)| JsonRow {
            result,
            revenue: &input.revenue,
        })
        .collect();
    serde_json::to_writer_pretty(writer, &rows)?;
    Ok(())
}

// -- Summary --

#[derive(Tabled)]
struct CategoryRow {
    #[tabled(rename = "Category")]
    name: String,
    #[tabled(rename = "Companies")]
    count: usize,
    #[tabled(rename = "Share")]
    share: String,
}

#[derive(Tabled)]
struct StatRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn stat(metric: &str, value: impl ToString) -> StatRow {
    StatRow {
        metric: metric.to_string(),
        value: value.to_string(),
    }
}

fn build_category_rows(summary: &RunSummary) -> Vec<CategoryRow> {
    summary
        .categories_by_count()
        .into_iter()
        .map(|(name, count)| CategoryRow {
            name: name.to_string(),
            count,
            share: format!("{:.1}%", summary.percent(count)),
        })
        .collect()
}

fn build_stat_rows(summary: &RunSummary) -> Vec<StatRow> {
    let band = |count: usize| format!("{} ({:.1}%)", count, summary.percent(count));
    let mut rows = vec![
        stat("Companies", summary.total),
        stat("Categorized by industry code", band(summary.categorized_by_code)),
    ];
    for (method, count) in &summary.by_method {
        rows.push(stat(&format!("Method {}", method), band(*count)));
    }
    rows.extend([
        stat(&format!("High confidence (>= {})", HIGH_CONFIDENCE), band(summary.high_confidence)),
        stat(
            &format!("Medium confidence ({}-{})", MEDIUM_CONFIDENCE, HIGH_CONFIDENCE),
            band(summary.medium_confidence),
        ),
        stat(&format!("Low confidence (< {})", MEDIUM_CONFIDENCE), band(summary.low_confidence)),
        stat("Average confidence", format!("{:.3}", summary.average_confidence)),
        stat("Needs review", band(summary.needs_review)),
        stat("Unique lookups", summary.unique_lookups),
        stat("Cache hits", summary.cache_hits),
        stat("Registry requests", summary.requests.requests_made),
        stat("  succeeded", summary.requests.requests_succeeded),
        stat("  rate limited", summary.requests.requests_rate_limited),
        stat("  failed", summary.requests.requests_failed),
        stat("Backoff", format!("{:.1}s", summary.requests.total_backoff_secs)),
    ]);
    rows
}

/// Print the run summary to stderr so stdout stays clean for data.
pub fn print_summary(summary: &RunSummary) {
    let mut categories = Table::new(build_category_rows(summary));
    categories.with(Style::rounded());
    eprintln!("{}", categories);

    let mut stats = Table::new(build_stat_rows(summary));
    stats.with(Style::rounded());
    eprintln!("{}", stats);
}
