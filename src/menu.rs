use crate::error::Result;
use crate::Error;
use std::io::{BufRead, Write};

pub const CUSTOM_QUERY_NAME: &str = "Custom Query";

/// 実行するJQLとその表示名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedQuery {
    pub name: String,
    pub jql: String,
}

impl SelectedQuery {
    pub fn new(name: impl Into<String>, jql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            jql: jql.into(),
        }
    }
}

/// エクスポート対象のJQLを決める
pub trait QuerySelector {
    fn select_query(&mut self) -> Result<SelectedQuery>;
}

/// プロジェクトキーから組み立てる定番クエリ。先頭がデフォルト
pub fn preset_queries(project_key: &str) -> Vec<SelectedQuery> {
    vec![
        SelectedQuery::new(
            "All Open Issues",
            format!("project = {} AND status != Done", project_key),
        ),
        SelectedQuery::new(
            "My Issues",
            format!("project = {} AND assignee = currentUser()", project_key),
        ),
        SelectedQuery::new(
            "Recent Issues",
            format!("project = {} AND created >= -30d", project_key),
        ),
        SelectedQuery::new(
            "High Priority",
            format!("project = {} AND priority in (Highest, High)", project_key),
        ),
    ]
}

/// コマンドラインで指定されたクエリをそのまま使う
#[derive(Debug, Clone)]
pub struct FixedQuery(SelectedQuery);

impl FixedQuery {
    pub fn new(jql: impl Into<String>) -> Self {
        Self(SelectedQuery::new(CUSTOM_QUERY_NAME, jql))
    }

    pub fn named(name: impl Into<String>, jql: impl Into<String>) -> Self {
        Self(SelectedQuery::new(name, jql))
    }
}

impl QuerySelector for FixedQuery {
    fn select_query(&mut self) -> Result<SelectedQuery> {
        Ok(self.0.clone())
    }
}

/// 番号付きメニューを表示して選択を読み取る
pub struct PromptSelector<R, W> {
    presets: Vec<SelectedQuery>,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptSelector<R, W> {
    pub fn new(project_key: &str, input: R, output: W) -> Self {
        Self {
            presets: preset_queries(project_key),
            input,
            output,
        }
    }

    fn custom_option(&self) -> usize {
        self.presets.len() + 1
    }

    fn print_menu(&mut self) -> Result<()> {
        let custom = self.custom_option();
        writeln!(self.output, "📋 Available Export Options:")?;
        for (i, preset) in self.presets.iter().enumerate() {
            writeln!(self.output, "   {}. {}: {}", i + 1, preset.name, preset.jql)?;
        }
        writeln!(self.output, "   {}. Custom JQL Query", custom)?;
        writeln!(self.output)?;
        Ok(())
    }

    fn prompt(&mut self, message: &str) -> Result<String> {
        write!(self.output, "{}", message)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(Error::Cancelled);
        }
        Ok(line.trim().to_string())
    }

    fn default_query(&mut self) -> Result<SelectedQuery> {
        writeln!(self.output, "Invalid choice. Using default query.")?;
        Ok(self.presets[0].clone())
    }
}

impl<R: BufRead, W: Write> QuerySelector for PromptSelector<R, W> {
    fn select_query(&mut self) -> Result<SelectedQuery> {
        self.print_menu()?;
        let custom = self.custom_option();
        let choice = self.prompt(&format!("Select export option (1-{}): ", custom))?;

        match choice.parse::<usize>() {
            Ok(n) if (1..custom).contains(&n) => Ok(self.presets[n - 1].clone()),
            Ok(n) if n == custom => {
                let jql = self.prompt("Enter custom JQL query: ")?;
                if jql.is_empty() {
                    return self.default_query();
                }
                Ok(SelectedQuery::new(CUSTOM_QUERY_NAME, jql))
            }
            _ => self.default_query(),
        }
    }
}
