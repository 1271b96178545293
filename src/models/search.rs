use super::Issue;
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};

/// 検索で返してもらうフィールドの許可リスト
pub const EXPORT_FIELDS: [&str; 16] = [
    "key",
    "summary",
    "status",
    "assignee",
    "reporter",
    "created",
    "updated",
    "priority",
    "issuetype",
    "description",
    "labels",
    "components",
    "fixVersions",
    "resolution",
    "resolutiondate",
    "duedate",
];

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SearchParams {
    #[serde(rename = "maxResults")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SearchResult {
    #[serde(default)]
    pub total: u64,

    #[serde(default, deserialize_with = "issues_lenient")]
    pub issues: Vec<Issue>,
}

/// `issues`配列の要素ごとに`Issue::from_value`を適用する
fn issues_lenient<'de, D>(deserializer: D) -> Result<Vec<Issue>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Option<Vec<serde_json::Value>> = super::lenient(deserializer)?;
    Ok(values
        .unwrap_or_default()
        .into_iter()
        .map(Issue::from_value)
        .collect())
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// エクスポート用のフィールド許可リストと件数上限を設定したパラメータ
    pub fn for_export(max_results: u32) -> Self {
        Self::new()
            .max_results(max_results)
            .fields(EXPORT_FIELDS.iter().map(|f| f.to_string()).collect())
    }

    pub fn max_results(mut self, max_results: u32) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_params_builder() {
        let params = SearchParams::new()
            .max_results(50)
            .fields(vec!["summary".to_string(), "status".to_string()]);

        assert_eq!(params.max_results, Some(50));
        assert_eq!(params.fields.unwrap().len(), 2);
    }

    #[test]
    fn test_search_params_for_export() {
        let params = SearchParams::for_export(1000);

        assert_eq!(params.max_results, Some(1000));
        let fields = params.fields.unwrap();
        assert_eq!(fields.len(), 16);
        assert!(fields.contains(&"duedate".to_string()));
        assert!(fields.contains(&"fixVersions".to_string()));
    }

    #[test]
    fn test_search_params_serialization() {
        let params = SearchParams::new().max_results(25);

        let json = serde_json::to_value(&params).unwrap();

        assert_eq!(json["maxResults"], 25);
        assert!(json.get("fields").is_none()); // None values should be omitted
    }

    #[test]
    fn test_search_result_deserialization() {
        let json_data = json!({
            "startAt": 0,
            "maxResults": 50,
            "total": 123,
            "issues": [
                {
                    "key": "TEST-1",
                    "fields": {
                        "summary": "Test Issue",
                        "status": { "id": "1", "name": "To Do" },
                        "reporter": { "displayName": "Test User" },
                        "created": "2024-01-01T00:00:00.000Z",
                        "updated": "2024-01-02T00:00:00.000Z"
                    }
                }
            ]
        });

        let result: SearchResult = serde_json::from_value(json_data).unwrap();

        assert_eq!(result.total, 123);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].key.as_deref(), Some("TEST-1"));
    }

    #[test]
    fn test_search_result_keeps_malformed_issue_elements() {
        // Given: オブジェクトでない要素を含むissues配列
        let json_data = json!({
            "total": 3,
            "issues": [
                { "key": "TEST-1", "fields": {} },
                42,
                { "key": "TEST-3" }
            ]
        });

        // When: デシリアライズする
        let result: SearchResult = serde_json::from_value(json_data).unwrap();

        // Then: 要素数は変わらず、不正な要素は空のIssueになる
        assert_eq!(result.issues.len(), 3);
        assert!(result.issues[1].key.is_none());
        assert_eq!(result.issues[2].key.as_deref(), Some("TEST-3"));
    }

    #[test]
    fn test_search_result_without_issues() {
        let result: SearchResult = serde_json::from_value(json!({ "total": 0 })).unwrap();

        assert_eq!(result.total, 0);
        assert!(result.issues.is_empty());
    }
}
