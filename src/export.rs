use crate::error::Result;
use crate::normalize::{COLUMN_TITLES, MAX_CELL_CHARS, NormalizedRow, truncate_chars};
use chrono::{DateTime, Local};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const DATA_SHEET: &str = "JIRA Issues";
pub const SUMMARY_SHEET: &str = "Summary";
pub const FILENAME_PREFIX: &str = "jira_export";

/// 列幅 = 最長セルの文字数 + 余白（上限あり）
pub const COLUMN_PADDING: usize = 2;
pub const MAX_COLUMN_WIDTH: usize = 50;

const FILENAME_TIMESTAMP: &str = "%Y%m%d_%H%M%S";
const EXPORT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Count(usize),
    Text(String),
}

/// サマリーシートに書く集計値
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub total_issues: usize,
    pub export_date: String,
    pub project: String,
    pub unique_assignees: usize,
    pub unique_statuses: usize,
}

impl ExportSummary {
    pub fn from_rows(rows: &[NormalizedRow], project: &str, now: DateTime<Local>) -> Self {
        let assignees: HashSet<&str> = rows.iter().map(|r| r.assignee.as_str()).collect();
        let statuses: HashSet<&str> = rows.iter().map(|r| r.status.as_str()).collect();

        Self {
            total_issues: rows.len(),
            export_date: now.format(EXPORT_DATE_FORMAT).to_string(),
            project: project.to_string(),
            unique_assignees: assignees.len(),
            unique_statuses: statuses.len(),
        }
    }

    pub fn metrics(&self) -> [(&'static str, MetricValue); 5] {
        [
            ("Total Issues", MetricValue::Count(self.total_issues)),
            ("Export Date", MetricValue::Text(self.export_date.clone())),
            ("Project", MetricValue::Text(self.project.clone())),
            ("Unique Assignees", MetricValue::Count(self.unique_assignees)),
            ("Unique Statuses", MetricValue::Count(self.unique_statuses)),
        ]
    }
}

/// データシートの列幅（見出しを含む）
pub fn column_widths(rows: &[NormalizedRow]) -> [usize; 13] {
    let mut widths = COLUMN_TITLES.map(|title| title.chars().count());

    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row.cells()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    widths.map(|w| (w + COLUMN_PADDING).min(MAX_COLUMN_WIDTH))
}

/// `jira_export[_label]_YYYYMMDD_HHMMSS.xlsx`
pub fn default_filename(label: Option<&str>, now: DateTime<Local>) -> String {
    let timestamp = now.format(FILENAME_TIMESTAMP);
    match label.map(slug).filter(|s| !s.is_empty()) {
        Some(label) => format!("{}_{}_{}.xlsx", FILENAME_PREFIX, label, timestamp),
        None => format!("{}_{}.xlsx", FILENAME_PREFIX, timestamp),
    }
}

fn slug(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// 正規化済みの行をデータシートとサマリーシートの2枚構成のXLSXに書き出す
#[derive(Debug, Clone)]
pub struct SpreadsheetExporter {
    project_key: String,
    output_dir: Option<PathBuf>,
}

impl SpreadsheetExporter {
    pub fn new(project_key: impl Into<String>) -> Self {
        Self {
            project_key: project_key.into(),
            output_dir: None,
        }
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn export(&self, rows: &[NormalizedRow], filename: Option<&Path>) -> Result<PathBuf> {
        self.export_at(rows, filename, Local::now())
    }

    pub fn export_at(
        &self,
        rows: &[NormalizedRow],
        filename: Option<&Path>,
        now: DateTime<Local>,
    ) -> Result<PathBuf> {
        let filename = match filename {
            Some(name) => name.to_path_buf(),
            None => PathBuf::from(default_filename(None, now)),
        };
        let path = match &self.output_dir {
            Some(dir) => dir.join(filename),
            None => filename,
        };

        let summary = ExportSummary::from_rows(rows, &self.project_key, now);
        let bytes = render_workbook(rows, &summary)?;
        write_file(&path, &bytes)?;

        tracing::info!(path = %path.display(), rows = rows.len(), "spreadsheet written");
        Ok(path)
    }
}

fn render_workbook(rows: &[NormalizedRow], summary: &ExportSummary) -> Result<Vec<u8>> {
    let header = Format::new().set_bold();

    let mut workbook = Workbook::new();
    workbook.push_worksheet(data_sheet(rows, &header)?);
    workbook.push_worksheet(summary_sheet(summary, &header)?);

    Ok(workbook.save_to_buffer()?)
}

fn data_sheet(rows: &[NormalizedRow], header: &Format) -> Result<Worksheet> {
    let mut sheet = Worksheet::new();
    sheet.set_name(DATA_SHEET)?;

    for (col, title) in COLUMN_TITLES.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, header)?;
    }
    for (index, row) in rows.iter().enumerate() {
        let excel_row = (index + 1) as u32;
        for (col, cell) in row.cells().iter().enumerate() {
            sheet.write_string(excel_row, col as u16, truncate_chars(cell, MAX_CELL_CHARS))?;
        }
    }
    for (col, width) in column_widths(rows).iter().enumerate() {
        sheet.set_column_width(col as u16, *width as f64)?;
    }
    sheet.set_freeze_panes(1, 0)?;

    Ok(sheet)
}

fn summary_sheet(summary: &ExportSummary, header: &Format) -> Result<Worksheet> {
    let mut sheet = Worksheet::new();
    sheet.set_name(SUMMARY_SHEET)?;

    sheet.write_string_with_format(0, 0, "Metric", header)?;
    sheet.write_string_with_format(0, 1, "Value", header)?;

    for (index, (name, value)) in summary.metrics().iter().enumerate() {
        let row = (index + 1) as u32;
        sheet.write_string(row, 0, *name)?;
        match value {
            MetricValue::Count(n) => sheet.write_number(row, 1, *n as f64)?,
            MetricValue::Text(text) => sheet.write_string(row, 1, text)?,
        };
    }

    Ok(sheet)
}

/// 一時ファイルに書いてからリネームする。失敗時に書きかけのファイルを残さない
fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut part = path.as_os_str().to_owned();
    part.push(".part");
    let part = PathBuf::from(part);

    let result = fs::write(&part, bytes).and_then(|_| fs::rename(&part, path));
    if let Err(e) = result {
        let _ = fs::remove_file(&part);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Issue;
    use crate::normalize::Normalizer;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 5, 10, 30, 15).unwrap()
    }

    fn row(assignee: &str, status: &str) -> NormalizedRow {
        let mut row = Normalizer::default().normalize(&Issue::default());
        row.assignee = assignee.to_string();
        row.status = status.to_string();
        row
    }

    #[test]
    fn test_summary_counts_distinct_values() {
        // Given: 担当者が同じ2行
        let rows = vec![row("Alice", "Open"), row("Alice", "Done")];

        // When: サマリーを計算
        let summary = ExportSummary::from_rows(&rows, "PROJ", fixed_now());

        // Then: 担当者のユニーク数は1
        assert_eq!(summary.total_issues, 2);
        assert_eq!(summary.unique_assignees, 1);
        assert_eq!(summary.unique_statuses, 2);
        assert_eq!(summary.project, "PROJ");
        assert_eq!(summary.export_date, "2024-01-05 10:30:15");
    }

    #[test]
    fn test_summary_of_empty_rows() {
        let summary = ExportSummary::from_rows(&[], "PROJ", fixed_now());

        assert_eq!(summary.total_issues, 0);
        assert_eq!(summary.unique_assignees, 0);
        assert_eq!(summary.unique_statuses, 0);
    }

    #[test]
    fn test_summary_metrics_order() {
        let summary = ExportSummary::from_rows(&[row("Bob", "Open")], "PROJ", fixed_now());

        let names: Vec<&str> = summary.metrics().iter().map(|(name, _)| *name).collect();

        assert_eq!(
            names,
            vec!["Total Issues", "Export Date", "Project", "Unique Assignees", "Unique Statuses"]
        );
        assert_eq!(summary.metrics()[0].1, MetricValue::Count(1));
        assert_eq!(summary.metrics()[2].1, MetricValue::Text("PROJ".to_string()));
    }

    #[test]
    fn test_column_widths_are_capped() {
        // Given: 200文字を超えるセル
        let mut long = row("Alice", "Open");
        long.summary = "s".repeat(250);

        // When: 列幅を計算
        let widths = column_widths(&[long]);

        // Then: 上限を超えない
        assert!(widths.iter().all(|w| *w <= MAX_COLUMN_WIDTH));
        assert_eq!(widths[1], MAX_COLUMN_WIDTH);
    }

    #[test]
    fn test_column_widths_include_header_and_padding() {
        let widths = column_widths(&[row("Al", "Open")]);

        // "Key"(3) と "Assignee"(8) は見出しの方が長い
        assert_eq!(widths[0], 3 + COLUMN_PADDING);
        assert_eq!(widths[3], 8 + COLUMN_PADDING);
        assert_eq!(widths[8], "Labels".len() + COLUMN_PADDING);
    }

    #[test]
    fn test_default_filename() {
        assert_eq!(default_filename(None, fixed_now()), "jira_export_20240105_103015.xlsx");
        assert_eq!(
            default_filename(Some("All Open Issues"), fixed_now()),
            "jira_export_all_open_issues_20240105_103015.xlsx"
        );
        assert_eq!(default_filename(Some("  "), fixed_now()), "jira_export_20240105_103015.xlsx");
    }

    #[test]
    fn test_export_writes_file_with_synthesized_name() {
        // Given: 出力先ディレクトリ
        let temp_dir = TempDir::new().unwrap();
        let exporter = SpreadsheetExporter::new("PROJ").output_dir(temp_dir.path());

        // When: ファイル名なしでエクスポート
        let path = exporter
            .export_at(&[row("Alice", "Open")], None, fixed_now())
            .unwrap();

        // Then: 合成されたファイル名で書き出され、一時ファイルは残らない
        assert_eq!(path, temp_dir.path().join("jira_export_20240105_103015.xlsx"));
        assert!(path.exists());
        assert!(fs::metadata(&path).unwrap().len() > 0);
        let leftovers: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".part"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_export_with_explicit_filename() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("issues.xlsx");

        let path = SpreadsheetExporter::new("PROJ")
            .export(&[row("Alice", "Open")], Some(target.as_path()))
            .unwrap();

        assert_eq!(path, target);
        assert!(target.exists());
    }

    #[test]
    fn test_export_failure_leaves_no_file() {
        // Given: 存在しないディレクトリ
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing");
        let exporter = SpreadsheetExporter::new("PROJ").output_dir(&missing);

        // When: エクスポート
        let result = exporter.export_at(&[row("Alice", "Open")], None, fixed_now());

        // Then: IOエラーになり、何も作られない
        assert!(matches!(result, Err(crate::Error::IoError(_))));
        assert!(!missing.exists());
    }
}
