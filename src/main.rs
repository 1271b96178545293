use clap::Parser;
use dotenv::dotenv;
use jira_export::{
    DescriptionMode, Error, ExportConfig, ExportOutcome, ExportPipeline, FixedQuery, JiraClient,
    Normalizer, PromptSelector, QueryExecutor, QuerySelector, SelectedQuery, SpreadsheetExporter,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const EXIT_SUCCESS: u8 = 0;
const EXIT_FAILURE: u8 = 1;
const EXIT_CANCELLED: u8 = 130;

/// Export JIRA issues to an Excel workbook
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JQL query to run instead of showing the menu
    #[arg(long)]
    jql: Option<String>,

    /// Output file (defaults to jira_export_<query>_<timestamp>.xlsx)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Maximum number of issues to fetch
    #[arg(long)]
    max_results: Option<u32>,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only take the first text run of each description
    #[arg(long)]
    first_run_description: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = run(cli).await;
    if let Err(e) = &result {
        if !matches!(e, Error::Cancelled) {
            tracing::error!(error = ?e, "export failed");
        }
    }

    let report = Report::from_result(&result);
    if report.code == EXIT_FAILURE {
        eprintln!("{}", report.message);
    } else {
        println!("{}", report.message);
    }

    if report.code == EXIT_CANCELLED {
        // 標準入力を待っているブロッキングタスクを待たずに終了する
        std::process::exit(i32::from(EXIT_CANCELLED));
    }
    ExitCode::from(report.code)
}

/// 実行結果に対応する終了コードと利用者向けメッセージ
#[derive(Debug, PartialEq, Eq)]
struct Report {
    code: u8,
    message: String,
}

impl Report {
    fn from_result(result: &Result<ExportOutcome, Error>) -> Self {
        match result {
            Ok(ExportOutcome::Exported { path, exported, .. }) => {
                let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.clone());
                Self {
                    code: EXIT_SUCCESS,
                    message: format!(
                        "\n🎉 Export completed successfully!\n📁 File saved: {}\n📊 Exported {} issues",
                        absolute.display(),
                        exported
                    ),
                }
            }
            Ok(ExportOutcome::NoIssues { .. }) => Self {
                code: EXIT_SUCCESS,
                message: "⚠️  No issues found matching the query".to_string(),
            },
            Err(Error::Cancelled) => Self {
                code: EXIT_CANCELLED,
                message: "\n⚠️  Export cancelled by user".to_string(),
            },
            Err(e) => Self {
                code: EXIT_FAILURE,
                message: format!("❌ {}", user_message(e)),
            },
        }
    }
}

async fn run(cli: Cli) -> Result<ExportOutcome, Error> {
    let mut config = ExportConfig::load(cli.config.as_deref()).await?;
    if let Some(max_results) = cli.max_results {
        config.max_results = max_results;
    }
    if cli.first_run_description {
        config.description_mode = DescriptionMode::FirstRun;
    }
    config.validate()?;
    tracing::debug!(?config, "configuration loaded");

    println!("🔗 JIRA to Excel Export Tool");
    println!("============================");
    println!("JIRA URL: {}", config.base_url);
    println!("Project: {}", config.project_key);
    println!();

    let client = JiraClient::new(config.jira_config()?)?;
    let executor = QueryExecutor::new(client).max_results(config.max_results);
    let mut exporter = SpreadsheetExporter::new(&config.project_key);
    if let Some(dir) = &config.output_dir {
        exporter = exporter.output_dir(dir);
    }
    let mut pipeline = ExportPipeline::new(executor, Normalizer::new(config.description_mode), exporter);
    if let Some(output) = cli.output {
        pipeline = pipeline.output(output);
    }

    let query = match cli.jql {
        Some(jql) => FixedQuery::new(jql).select_query()?,
        None => select_interactively(config.project_key.clone()).await?,
    };

    tokio::select! {
        outcome = pipeline.run_query(query) => outcome,
        _ = tokio::signal::ctrl_c() => Err(Error::Cancelled),
    }
}

async fn select_interactively(project_key: String) -> Result<SelectedQuery, Error> {
    let prompt = tokio::task::spawn_blocking(move || {
        let stdin = std::io::stdin();
        PromptSelector::new(&project_key, stdin.lock(), std::io::stdout()).select_query()
    });

    tokio::select! {
        selected = prompt => selected.map_err(|e| Error::Unexpected(e.to_string()))?,
        _ = tokio::signal::ctrl_c() => Err(Error::Cancelled),
    }
}

fn user_message(error: &Error) -> String {
    match error {
        Error::QueryFailed => "Failed to fetch issues from JIRA".to_string(),
        Error::ConfigurationMissing(_) | Error::InvalidConfiguration(_) => error.to_string(),
        Error::IoError(_) => "Error during export: could not write the output file".to_string(),
        Error::Spreadsheet(_) => "Error during export: could not build the workbook".to_string(),
        _ => "Error during export: unexpected failure (see log for details)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exported_is_success() {
        let result = Ok(ExportOutcome::Exported {
            path: PathBuf::from("jira_export_20240105_103015.xlsx"),
            exported: 3,
            total: 10,
        });

        let report = Report::from_result(&result);

        assert_eq!(report.code, 0);
        assert!(report.message.contains("jira_export_20240105_103015.xlsx"));
        assert!(report.message.contains("Exported 3 issues"));
    }

    #[test]
    fn test_no_issues_is_success() {
        let report = Report::from_result(&Ok(ExportOutcome::NoIssues { total: 0 }));

        assert_eq!(report.code, 0);
        assert_eq!(report.message, "⚠️  No issues found matching the query");
    }

    #[test]
    fn test_cancelled_exits_with_130() {
        let report = Report::from_result(&Err(Error::Cancelled));

        assert_eq!(report.code, 130);
        assert!(report.message.contains("Export cancelled by user"));
    }

    #[test]
    fn test_query_failure_exits_with_1() {
        let report = Report::from_result(&Err(Error::QueryFailed));

        assert_eq!(report.code, 1);
        assert_eq!(report.message, "❌ Failed to fetch issues from JIRA");
    }

    #[test]
    fn test_failure_messages_hide_internal_details() {
        // Given: 内部情報を含むエラー
        let errors = vec![
            Error::ApiError {
                status: 500,
                message: "stack trace at com.atlassian.internal".to_string(),
            },
            Error::Unexpected("stack trace at com.atlassian.internal".to_string()),
            Error::IoError(std::io::Error::other("stack trace at com.atlassian.internal")),
        ];

        for error in errors {
            // When: 利用者向けの表示を作る
            let report = Report::from_result(&Err(error));

            // Then: 失敗扱いで、内部情報は出さない
            assert_eq!(report.code, 1);
            assert!(!report.message.contains("com.atlassian.internal"));
            assert!(report.message.starts_with("❌ "));
        }
    }

    #[test]
    fn test_configuration_errors_are_shown_as_is() {
        let report = Report::from_result(&Err(Error::ConfigurationMissing("JIRA_URL is not set".to_string())));

        assert_eq!(report.code, 1);
        assert!(report.message.contains("JIRA_URL is not set"));
    }
}
