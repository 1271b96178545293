use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Component {
    #[serde(default, deserialize_with = "super::lenient")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}
