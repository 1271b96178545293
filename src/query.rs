use crate::client::JiraClient;
use crate::models::{SearchParams, SearchResult};

/// 1回の検索に使う件数上限のデフォルト
pub const DEFAULT_MAX_RESULTS: u32 = 1000;

/// JQLを1回だけ実行し、結果または「結果なし」を返す
///
/// ページングもリトライも行わない。失敗はログに記録したうえで`None`になる。
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    client: JiraClient,
    max_results: u32,
}

impl QueryExecutor {
    pub fn new(client: JiraClient) -> Self {
        Self {
            client,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    pub fn max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    pub async fn execute(&self, jql: &str) -> Option<SearchResult> {
        let params = SearchParams::for_export(self.max_results);

        match self.client.search_issues(jql, params).await {
            Ok(result) => {
                tracing::info!(
                    total = result.total,
                    returned = result.issues.len(),
                    "search completed"
                );
                Some(result)
            }
            Err(e) => {
                tracing::error!("Error fetching JIRA issues: {}", e);
                None
            }
        }
    }
}
