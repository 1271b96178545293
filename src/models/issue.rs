use serde::{Deserialize, Serialize};

use super::{Component, IssueType, Priority, Status, User};

/// 検索APIが返す生のIssueレコード
///
/// どのフィールドも欠けている可能性があり、形の合わないフィールドは`None`になる。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Issue {
    #[serde(default, deserialize_with = "super::lenient")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, deserialize_with = "super::lenient_or_default")]
    pub fields: IssueFields,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueFields {
    #[serde(default, deserialize_with = "super::lenient")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<serde_json::Value>, // 文字列またはADF形式のオブジェクト
    #[serde(rename = "issuetype")]
    #[serde(default, deserialize_with = "super::lenient_object")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<IssueType>,
    #[serde(default, deserialize_with = "super::lenient_object")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "super::lenient_object")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, deserialize_with = "super::lenient_object")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<User>,
    #[serde(default, deserialize_with = "super::lenient_object")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporter: Option<User>,
    #[serde(default, deserialize_with = "super::lenient")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, deserialize_with = "super::lenient")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(rename = "duedate")]
    #[serde(default, deserialize_with = "super::lenient")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, deserialize_with = "super::lenient_strings")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(default, deserialize_with = "super::lenient_objects")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<Component>>,
}

impl Issue {
    /// JSON値からIssueを作る。オブジェクトでない値は空のIssueになる
    pub fn from_value(value: serde_json::Value) -> Self {
        match serde_json::from_value(value) {
            Ok(issue) => issue,
            Err(e) => {
                tracing::warn!("Malformed issue record, using defaults: {}", e);
                Self::default()
            }
        }
    }
}
