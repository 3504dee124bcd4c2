//! CSV export of snapshot tables, quality issues and diffs.
//!
//! Files are written for Brazilian spreadsheet conventions: `;` separates
//! fields, `,` is the decimal mark, numbers carry four decimal places, and
//! every file starts with a UTF-8 byte-order mark so Excel detects the
//! encoding.

use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use fidc_core::{Error, FinancialSnapshot, Result, ValidationFlags};

use crate::diff::DiffRecord;

const BOM: &[u8] = b"\xEF\xBB\xBF";

const FLAG_COLUMNS: [&str; 3] = [
    "FLAG_ZERO_ASSETS",
    "FLAG_ZERO_GROSS_PORTFOLIO_WITH_DELINQUENCY",
    "FLAG_NO_POSITION",
];

/// Writes pipeline outputs under one directory.
#[derive(Clone, Debug)]
pub struct Exporter {
    dir: PathBuf,
}

impl Exporter {
    /// Creates an exporter rooted at `dir`. The directory is created on the
    /// first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Writes the snapshot table twice: once under a timestamped name for the
    /// run history and once as `cleaned_snapshot_latest.csv` for consumers
    /// that always want the newest table.
    ///
    /// `flags` must be row-aligned with `table`.
    ///
    /// # Errors
    /// [`Error::Unexpected`] on filesystem failure.
    pub fn export_snapshots(
        &self,
        table: &[FinancialSnapshot],
        flags: &[ValidationFlags],
    ) -> Result<(PathBuf, PathBuf)> {
        let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        self.export_snapshots_at(table, flags, &stamp)
    }

    /// As [`export_snapshots`](Self::export_snapshots), with an explicit
    /// timestamp label.
    ///
    /// # Errors
    /// [`Error::Unexpected`] on filesystem failure.
    pub fn export_snapshots_at(
        &self,
        table: &[FinancialSnapshot],
        flags: &[ValidationFlags],
        stamp: &str,
    ) -> Result<(PathBuf, PathBuf)> {
        let payload = render_snapshot_table(table, flags)?;
        let stamped = self.write(&format!("cleaned_snapshot_{stamp}.csv"), &payload)?;
        let latest = self.write("cleaned_snapshot_latest.csv", &payload)?;
        info!(rows = table.len(), path = %stamped.display(), "Snapshot table exported");
        Ok((stamped, latest))
    }

    /// Writes `qa_issues.csv` listing only the flagged rows.
    ///
    /// `flags` must be row-aligned with `table`.
    ///
    /// # Errors
    /// [`Error::Unexpected`] on filesystem failure.
    pub fn export_qa_issues(
        &self,
        table: &[FinancialSnapshot],
        flags: &[ValidationFlags],
    ) -> Result<PathBuf> {
        let mut writer = csv_writer();
        write_row(
            &mut writer,
            ["FUND_ID", "STATUS"]
                .into_iter()
                .chain(FLAG_COLUMNS)
                .map(String::from),
        )?;
        let mut issues = 0usize;
        for (snapshot, row_flags) in table.iter().zip(flags) {
            if !row_flags.has_issues() {
                continue;
            }
            issues += 1;
            write_row(
                &mut writer,
                [
                    snapshot.fund_id.to_string(),
                    snapshot.status.to_string(),
                    format_bool(row_flags.zero_assets),
                    format_bool(row_flags.zero_gross_portfolio_with_delinquency),
                    format_bool(row_flags.no_position),
                ],
            )?;
        }
        let path = self.write("qa_issues.csv", &finish(writer)?)?;
        info!(issues, path = %path.display(), "Quality issues exported");
        Ok(path)
    }

    /// Writes `diff_v1_v2.csv` with one row per changed field.
    ///
    /// # Errors
    /// [`Error::Unexpected`] on filesystem failure.
    pub fn export_diff(&self, records: &[DiffRecord]) -> Result<PathBuf> {
        let mut writer = csv_writer();
        write_row(
            &mut writer,
            ["FUND_ID", "COLUMN", "PREVIOUS", "CURRENT", "DELTA"]
                .into_iter()
                .map(String::from),
        )?;
        for record in records {
            write_row(
                &mut writer,
                [
                    record.fund_id.to_string(),
                    record.column.to_string(),
                    format_number(record.previous),
                    format_number(record.current),
                    format_number(record.delta),
                ],
            )?;
        }
        let path = self.write("diff_v1_v2.csv", &finish(writer)?)?;
        info!(changes = records.len(), path = %path.display(), "Diff exported");
        Ok(path)
    }

    fn write(&self, name: &str, payload: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| Error::Unexpected(format!("Could not create {}: {e}", self.dir.display())))?;
        let path = self.dir.join(name);
        fs::write(&path, payload)
            .map_err(|e| Error::Unexpected(format!("Could not write {}: {e}", path.display())))?;
        Ok(path)
    }

    /// The export directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn render_snapshot_table(
    table: &[FinancialSnapshot],
    flags: &[ValidationFlags],
) -> Result<Vec<u8>> {
    let mut writer = csv_writer();

    let template = FinancialSnapshot::default();
    let header: Vec<String> = template
        .text_entries()
        .iter()
        .map(|(name, _)| (*name).to_string())
        .chain(
            template
                .numeric_entries()
                .iter()
                .map(|(name, _)| (*name).to_string()),
        )
        .chain(
            [
                "STATUS",
                "ERROR_MESSAGE",
                "DOCUMENT_ID",
                "DOCUMENT_REFERENCE_DATE",
            ]
            .into_iter()
            .map(String::from),
        )
        .chain(FLAG_COLUMNS.into_iter().map(String::from))
        .collect();
    write_row(&mut writer, header)?;

    for (snapshot, row_flags) in table.iter().zip(flags) {
        let row: Vec<String> = snapshot
            .text_entries()
            .into_iter()
            .map(|(_, value)| value.to_string())
            .chain(
                snapshot
                    .numeric_entries()
                    .into_iter()
                    .map(|(_, value)| format_number(value)),
            )
            .chain([
                snapshot.status.to_string(),
                snapshot.error_message.clone().unwrap_or_default(),
                snapshot.document_id.clone(),
                snapshot.document_reference_date.clone(),
            ])
            .chain([
                format_bool(row_flags.zero_assets),
                format_bool(row_flags.zero_gross_portfolio_with_delinquency),
                format_bool(row_flags.no_position),
            ])
            .collect();
        write_row(&mut writer, row)?;
    }

    finish(writer)
}

fn csv_writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(BOM.to_vec())
}

fn write_row(
    writer: &mut csv::Writer<Vec<u8>>,
    fields: impl IntoIterator<Item = String>,
) -> Result<()> {
    writer
        .write_record(fields)
        .map_err(|e| Error::Unexpected(format!("Could not encode row: {e}")))
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| Error::Unexpected(format!("Could not flush output: {e}")))
}

/// Formats a number with four decimals and the Brazilian decimal mark.
/// Missing values (NaN) render as an empty field.
fn format_number(value: f64) -> String {
    if value.is_nan() {
        return String::new();
    }
    format!("{value:.4}").replace('.', ",")
}

fn format_bool(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}
