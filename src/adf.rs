//! Atlassian Document Format (ADF) からプレーンテキストを取り出す

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// 説明文の取り出し方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptionMode {
    /// 全ノードを再帰的にたどり、テキストを連結する
    #[default]
    FullText,
    /// 最初のノードの最初のテキストだけを使う
    FirstRun,
}

impl FromStr for DescriptionMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" | "full_text" => Ok(Self::FullText),
            "first" | "first_run" => Ok(Self::FirstRun),
            other => Err(crate::Error::InvalidConfiguration(format!(
                "Unknown description mode: {}",
                other
            ))),
        }
    }
}

/// ブロックとして扱い、前のテキストと改行で区切るノード種別
const BLOCK_NODES: &[&str] = &[
    "paragraph",
    "heading",
    "codeBlock",
    "blockquote",
    "listItem",
    "tableCell",
    "tableHeader",
    "panel",
    "rule",
];

pub fn extract_text(description: &Value, mode: DescriptionMode) -> String {
    // v2 APIは説明文を文字列で返す
    if let Some(text) = description.as_str() {
        return text.to_string();
    }

    match mode {
        DescriptionMode::FullText => plain_text(description),
        DescriptionMode::FirstRun => first_text_run(description),
    }
}

/// ドキュメント全体のテキストを連結する
pub fn plain_text(document: &Value) -> String {
    let mut out = String::new();
    walk(document, &mut out);
    out.trim_end().to_string()
}

/// `content[0].content[0].text`、パスがなければ空文字
pub fn first_text_run(document: &Value) -> String {
    document
        .get("content")
        .and_then(|c| c.get(0))
        .and_then(|node| node.get("content"))
        .and_then(|c| c.get(0))
        .and_then(|run| run.get("text"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn walk(node: &Value, out: &mut String) {
    if let Some(nodes) = node.as_array() {
        for child in nodes {
            walk(child, out);
        }
        return;
    }

    match node.get("type").and_then(Value::as_str) {
        Some("text") => {
            if let Some(text) = node.get("text").and_then(Value::as_str) {
                out.push_str(text);
            }
        }
        Some("hardBreak") => out.push('\n'),
        Some("mention") | Some("emoji") => push_attr(node, "text", out),
        Some("inlineCard") => push_attr(node, "url", out),
        kind => {
            if kind.is_some_and(|k| BLOCK_NODES.contains(&k)) {
                start_block(out);
            }
            if let Some(children) = node.get("content") {
                walk(children, out);
            }
        }
    }
}

fn push_attr(node: &Value, name: &str, out: &mut String) {
    if let Some(value) = node
        .get("attrs")
        .and_then(|attrs| attrs.get(name))
        .and_then(Value::as_str)
    {
        out.push_str(value);
    }
}

fn start_block(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}
