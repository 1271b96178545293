use crate::error::Result;
use crate::export::{SpreadsheetExporter, default_filename};
use crate::menu::{QuerySelector, SelectedQuery};
use crate::normalize::Normalizer;
use crate::query::QueryExecutor;
use crate::Error;
use chrono::Local;
use std::path::PathBuf;

/// 1回のエクスポートの結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// クエリは成功したが該当Issueがなかった（ファイルは作らない）
    NoIssues { total: u64 },
    Exported {
        path: PathBuf,
        exported: usize,
        total: u64,
    },
}

/// クエリ選択 → 検索 → 正規化 → 書き出し
pub struct ExportPipeline {
    executor: QueryExecutor,
    normalizer: Normalizer,
    exporter: SpreadsheetExporter,
    output: Option<PathBuf>,
}

impl ExportPipeline {
    pub fn new(executor: QueryExecutor, normalizer: Normalizer, exporter: SpreadsheetExporter) -> Self {
        Self {
            executor,
            normalizer,
            exporter,
            output: None,
        }
    }

    /// 出力ファイル名を固定する。指定がなければクエリ名と時刻から作る
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub async fn run(&self, selector: &mut dyn QuerySelector) -> Result<ExportOutcome> {
        let query = selector.select_query()?;
        self.run_query(query).await
    }

    pub async fn run_query(&self, query: SelectedQuery) -> Result<ExportOutcome> {
        println!("\n🔍 Executing query: {}", query.jql);
        tracing::info!(name = %query.name, jql = %query.jql, "executing query");

        let result = self.executor.execute(&query.jql).await.ok_or(Error::QueryFailed)?;

        let total = result.total;
        let returned = result.issues.len();
        println!("📊 Found {} total issues, fetched {}", total, returned);

        if returned == 0 {
            tracing::info!("no issues matched the query");
            return Ok(ExportOutcome::NoIssues { total });
        }

        let rows = self.normalizer.normalize_all(&result.issues);

        let filename = self
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(default_filename(Some(&query.name), Local::now())));
        let path = self.exporter.export(&rows, Some(filename.as_path()))?;

        Ok(ExportOutcome::Exported {
            path,
            exported: rows.len(),
            total,
        })
    }
}
