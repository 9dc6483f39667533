//! Export adapter. The only place numbers become display strings.
//!
//! Writes the ranked signals as `SWING_PRO_<YYYYmmdd_HHMM>.csv` and `.xlsx`
//! with the column layout traders already use, plus a `SWING_PRO_<...>.json`
//! manifest carrying the full numeric report. Nothing is written for a scan
//! with no signals.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rust_xlsxwriter::{Format, Workbook};
use serde::{Deserialize, Serialize};
use swingscan_core::domain::{PriceBand, RewardRatios};
use swingscan_core::SignalRecord;

use crate::aggregate::{ScanReport, ScanSummary};

/// Version 2 added `xlsx_file`.
pub const SCHEMA_VERSION: u32 = 2;

const FILE_PREFIX: &str = "SWING_PRO_";
const STAMP_FORMAT: &str = "%Y%m%d_%H%M";

pub const CSV_COLUMNS: [&str; 14] = [
    "Symbol",
    "Current_Price",
    "Buy_Range",
    "Target_5pct",
    "Target_10pct",
    "Stop_Loss",
    "Risk_Reward",
    "2W_Momentum",
    "RSI",
    "Volume_Ratio",
    "RS_vs_Benchmark",
    "Distance_from_52wH",
    "Range_10d%",
    "Risk%",
];

// ─── Formatting ─────────────────────────────────────────────────────

pub fn format_price(price: f64) -> String {
    format!("₹{price:.2}")
}

pub fn format_band(band: &PriceBand) -> String {
    format!("{} - {}", format_price(band.low), format_price(band.high))
}

pub fn format_ratio_pair(ratios: &RewardRatios) -> String {
    format!("1:{:.1} to 1:{:.1}", ratios.near, ratios.far)
}

fn pct(value: f64) -> String {
    format!("{value:.1}%")
}

/// One CSV row, in `CSV_COLUMNS` order.
pub fn format_row(record: &SignalRecord) -> [String; 14] {
    [
        record.symbol.clone(),
        format!("{:.2}", record.price),
        format_band(&record.buy_range),
        format_price(record.target_near),
        format_price(record.target_far),
        format_price(record.stop_loss),
        format_ratio_pair(&record.reward_ratios),
        pct(record.momentum_pct),
        format!("{:.1}", record.rsi),
        format!("{:.1}x", record.volume_ratio),
        format!("{:+.1}%", record.relative_strength_pct),
        pct(record.distance_from_high_pct),
        pct(record.range_pct),
        pct(record.risk_pct),
    ]
}

// ─── CSV export ─────────────────────────────────────────────────────

pub fn export_signals_csv(signals: &[SignalRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(CSV_COLUMNS)?;
    for record in signals {
        wtr.write_record(format_row(record))?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── XLSX export ────────────────────────────────────────────────────

/// Same rows as the CSV, with the price as a numeric cell.
pub fn export_signals_xlsx(signals: &[SignalRecord], path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Signals")?;

    for (col, name) in CSV_COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, &bold)?;
    }
    for (i, record) in signals.iter().enumerate() {
        let row = i as u32 + 1;
        for (col, cell) in format_row(record).iter().enumerate() {
            if col == 1 {
                sheet.write_number(row, col as u16, record.price)?;
            } else {
                sheet.write_string(row, col as u16, cell.as_str())?;
            }
        }
    }
    sheet.autofit();

    workbook
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))
}

// ─── Manifest ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanManifest {
    pub schema_version: u32,
    pub created_at: NaiveDateTime,
    pub csv_file: String,
    #[serde(default)]
    pub xlsx_file: Option<String>,
    pub summary: Option<ScanSummary>,
    pub report: ScanReport,
}

pub fn export_manifest(manifest: &ScanManifest) -> Result<String> {
    serde_json::to_string_pretty(manifest).context("failed to serialize scan manifest")
}

pub fn load_manifest(path: &Path) -> Result<ScanManifest> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let manifest: ScanManifest =
        serde_json::from_str(&json).context("failed to parse scan manifest")?;
    if manifest.schema_version > SCHEMA_VERSION {
        anyhow::bail!(
            "unsupported schema version {} (max supported: {})",
            manifest.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(manifest)
}

fn stamped(at: NaiveDateTime, ext: &str) -> String {
    format!("{FILE_PREFIX}{}.{ext}", at.format(STAMP_FORMAT))
}

/// CSV file name for a scan started at `at`.
pub fn csv_file_name(at: NaiveDateTime) -> String {
    stamped(at, "csv")
}

pub fn xlsx_file_name(at: NaiveDateTime) -> String {
    stamped(at, "xlsx")
}

pub fn manifest_file_name(at: NaiveDateTime) -> String {
    stamped(at, "json")
}

/// Scan time encoded in a `SWING_PRO_<YYYYmmdd_HHMM>.json` manifest name.
pub fn manifest_timestamp(file_name: &str) -> Option<NaiveDateTime> {
    let stamp = file_name.strip_prefix(FILE_PREFIX)?.strip_suffix(".json")?;
    NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).ok()
}

/// Newest scan manifest in `dir`, by the timestamp in its file name.
pub fn latest_manifest(dir: &Path) -> Result<Option<PathBuf>> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
    let mut newest: Option<(NaiveDateTime, PathBuf)> = None;
    for entry in entries {
        let path = entry?.path();
        let Some(stamp) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(manifest_timestamp)
        else {
            continue;
        };
        if newest.as_ref().map_or(true, |(best, _)| stamp > *best) {
            newest = Some((stamp, path));
        }
    }
    Ok(newest.map(|(_, path)| path))
}

/// Paths written by `save_scan`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFiles {
    pub csv: PathBuf,
    pub xlsx: PathBuf,
    pub manifest: PathBuf,
}

/// Write the CSV, XLSX and manifest into `output_dir`.
///
/// Returns `None` without touching the disk when the report has no signals.
pub fn save_scan(
    report: &ScanReport,
    output_dir: &Path,
    at: NaiveDateTime,
) -> Result<Option<SavedFiles>> {
    if !report.has_signals() {
        return Ok(None);
    }

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;

    let csv_file = csv_file_name(at);
    let csv = output_dir.join(&csv_file);
    std::fs::write(&csv, export_signals_csv(report.signals())?)
        .with_context(|| format!("failed to write {}", csv.display()))?;

    let xlsx_file = xlsx_file_name(at);
    let xlsx = output_dir.join(&xlsx_file);
    export_signals_xlsx(report.signals(), &xlsx)?;

    let manifest = ScanManifest {
        schema_version: SCHEMA_VERSION,
        created_at: at,
        csv_file,
        xlsx_file: Some(xlsx_file),
        summary: report.summary(),
        report: report.clone(),
    };
    let manifest_path = output_dir.join(manifest_file_name(at));
    std::fs::write(&manifest_path, export_manifest(&manifest)?)
        .with_context(|| format!("failed to write {}", manifest_path.display()))?;

    tracing::info!(path = %csv.display(), rows = report.signals().len(), "results saved");
    Ok(Some(SavedFiles {
        csv,
        xlsx,
        manifest: manifest_path,
    }))
}

// ─── Console table ──────────────────────────────────────────────────

/// Fixed-width table of the given records, header included.
pub fn render_table(records: &[SignalRecord]) -> String {
    let rows: Vec<[String; 14]> = records.iter().map(format_row).collect();
    let widths: Vec<usize> = (0..CSV_COLUMNS.len())
        .map(|col| {
            rows.iter()
                .map(|r| r[col].chars().count())
                .chain(std::iter::once(CSV_COLUMNS[col].len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = join_cells(CSV_COLUMNS.iter().copied(), &widths);
    for row in &rows {
        out.push('\n');
        out.push_str(&join_cells(row.iter().map(String::as_str), &widths));
    }
    out
}

fn join_cells<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, w)| format!("{cell:>w$}", w = *w))
        .collect::<Vec<_>>()
        .join("  ")
}
