use crate::adf::{self, DescriptionMode};
use crate::models::{Issue, User};
use serde::Serialize;

pub const UNASSIGNED: &str = "Unassigned";
pub const UNKNOWN: &str = "Unknown";
pub const NONE: &str = "None";

/// スプレッドシートのセルに書ける最大文字数
pub const MAX_CELL_CHARS: usize = 32_767;

/// データシートの列見出し（`NormalizedRow`のフィールド順）
pub const COLUMN_TITLES: [&str; 13] = [
    "Key",
    "Summary",
    "Status",
    "Assignee",
    "Reporter",
    "Priority",
    "Issue Type",
    "Components",
    "Labels",
    "Created",
    "Updated",
    "Due Date",
    "Description",
];

/// 1件のIssueを平坦化した行。全フィールドが必ず文字列を持つ
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedRow {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Summary")]
    pub summary: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Assignee")]
    pub assignee: String,
    #[serde(rename = "Reporter")]
    pub reporter: String,
    #[serde(rename = "Priority")]
    pub priority: String,
    #[serde(rename = "Issue Type")]
    pub issue_type: String,
    #[serde(rename = "Components")]
    pub components: String,
    #[serde(rename = "Labels")]
    pub labels: String,
    #[serde(rename = "Created")]
    pub created: String,
    #[serde(rename = "Updated")]
    pub updated: String,
    #[serde(rename = "Due Date")]
    pub due_date: String,
    #[serde(rename = "Description")]
    pub description: String,
}

impl NormalizedRow {
    /// `COLUMN_TITLES`と同じ順序のセル値
    pub fn cells(&self) -> [&str; 13] {
        [
            &self.key,
            &self.summary,
            &self.status,
            &self.assignee,
            &self.reporter,
            &self.priority,
            &self.issue_type,
            &self.components,
            &self.labels,
            &self.created,
            &self.updated,
            &self.due_date,
            &self.description,
        ]
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    description_mode: DescriptionMode,
}

impl Normalizer {
    pub fn new(description_mode: DescriptionMode) -> Self {
        Self { description_mode }
    }

    pub fn normalize(&self, issue: &Issue) -> NormalizedRow {
        let fields = &issue.fields;

        let components: Vec<&str> = fields
            .components
            .iter()
            .flatten()
            .filter_map(|c| c.name.as_deref())
            .collect();

        let labels: Vec<&str> = fields
            .labels
            .iter()
            .flatten()
            .map(String::as_str)
            .collect();

        let description = fields
            .description
            .as_ref()
            .map(|d| adf::extract_text(d, self.description_mode))
            .unwrap_or_default();

        NormalizedRow {
            key: issue.key.clone().unwrap_or_default(),
            summary: fields.summary.clone().unwrap_or_default(),
            status: name_or(fields.status.as_ref().and_then(|s| s.name.as_deref()), UNKNOWN),
            assignee: display_name_or(fields.assignee.as_ref(), UNASSIGNED),
            reporter: display_name_or(fields.reporter.as_ref(), UNKNOWN),
            priority: name_or(fields.priority.as_ref().and_then(|p| p.name.as_deref()), UNKNOWN),
            issue_type: name_or(fields.issue_type.as_ref().and_then(|t| t.name.as_deref()), UNKNOWN),
            components: join_or_none(&components),
            labels: join_or_none(&labels),
            created: date_part(fields.created.as_deref()),
            updated: date_part(fields.updated.as_deref()),
            due_date: fields.due_date.clone().unwrap_or_default(),
            description: truncate_chars(&description, MAX_CELL_CHARS),
        }
    }

    pub fn normalize_all(&self, issues: &[Issue]) -> Vec<NormalizedRow> {
        issues.iter().map(|issue| self.normalize(issue)).collect()
    }
}

fn name_or(name: Option<&str>, default: &str) -> String {
    name.unwrap_or(default).to_string()
}

fn display_name_or(user: Option<&User>, default: &str) -> String {
    name_or(user.and_then(|u| u.display_name.as_deref()), default)
}

fn join_or_none(values: &[&str]) -> String {
    if values.is_empty() {
        NONE.to_string()
    } else {
        values.join(", ")
    }
}

/// ISO-8601タイムスタンプの先頭10文字（日付部分）
fn date_part(timestamp: Option<&str>) -> String {
    timestamp.map(|t| truncate_chars(t, 10)).unwrap_or_default()
}

pub(crate) fn truncate_chars(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value.to_string(),
    }
}
