pub mod component;
pub mod issue;
pub mod issue_type;
pub mod priority;
pub mod search;
pub mod status;
pub mod user;

pub use component::*;
pub use issue::*;
pub use issue_type::*;
pub use priority::*;
pub use search::*;
pub use status::*;
pub use user::*;

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

/// 形が合わないサブフィールドを「未設定」として扱うデシリアライザ
///
/// JIRAのレスポンスはIssueごとに形が異なることがあるため、
/// 1つのフィールドの不整合でレスポンス全体を失敗させない。
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    Ok(serde_json::from_value(value).ok())
}

/// JSONオブジェクトだけを受け付ける`lenient`
///
/// serdeの構造体デシリアライザは配列を位置順に受け付けてしまうため、
/// ユーザーやステータスなどのオブジェクト型フィールドはこちらを使う。
pub(crate) fn lenient_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(object_of(value))
}

/// 配列の要素ごとに文字列だけを残す。配列でなければ`None`
pub(crate) fn lenient_strings<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(elements(Value::deserialize(deserializer)?, |value| match value {
        Value::String(s) => Some(s),
        _ => None,
    }))
}

/// 配列の要素ごとにオブジェクトだけを`T`として残す。配列でなければ`None`
pub(crate) fn lenient_objects<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(elements(Value::deserialize(deserializer)?, object_of))
}

fn object_of<T: DeserializeOwned>(value: Value) -> Option<T> {
    if !value.is_object() {
        return None;
    }
    serde_json::from_value(value).ok()
}

fn elements<T>(value: Value, keep: impl FnMut(Value) -> Option<T>) -> Option<Vec<T>> {
    match value {
        Value::Array(items) => Some(items.into_iter().filter_map(keep).collect()),
        _ => None,
    }
}

/// `lenient`と同じだが、失敗時は`Default`を返す
pub(crate) fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}
