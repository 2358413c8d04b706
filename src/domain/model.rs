use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Compact 模式下從回應頂層移除的欄位
pub const COMPACT_STRIPPED_FIELDS: [&str; 5] = [
    "search_metadata",
    "search_parameters",
    "search_information",
    "pagination",
    "serpapi_pagination",
];

/// Engines advertised to clients. Any other engine name is still forwarded as-is.
pub const SUPPORTED_ENGINES: [&str; 15] = [
    "google",
    "google_light",
    "google_flights",
    "google_hotels",
    "google_images",
    "google_news",
    "google_local",
    "google_shopping",
    "google_jobs",
    "bing",
    "yahoo",
    "duckduckgo",
    "youtube_search",
    "baidu",
    "ebay",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Complete,
    Compact,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidMode(pub String);

impl fmt::Display for InvalidMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid mode. Must be 'complete' or 'compact'")
    }
}

impl std::error::Error for InvalidMode {}

impl FromStr for SearchMode {
    type Err = InvalidMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "complete" => Ok(SearchMode::Complete),
            "compact" => Ok(SearchMode::Compact),
            other => Err(InvalidMode(other.to_string())),
        }
    }
}

impl SearchMode {
    /// 依模式過濾上游回應
    pub fn apply(self, data: &mut Value) {
        if self == SearchMode::Compact {
            if let Value::Object(obj) = data {
                for field in COMPACT_STRIPPED_FIELDS {
                    obj.shift_remove(field);
                }
            }
        }
    }
}

fn default_mode() -> String {
    "complete".to_string()
}

/// `search` 工具的呼叫參數。mode 保留原字串，於執行時才檢查
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchArguments {
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default = "default_mode")]
    pub mode: String,
}

impl Default for SearchArguments {
    fn default() -> Self {
        Self {
            params: Map::new(),
            mode: default_mode(),
        }
    }
}

/// 送往上游的查詢參數，保持插入順序，後寫入者覆蓋同名鍵
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRequest {
    pairs: Vec<(String, String)>,
}

impl SearchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.pairs.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// 將 JSON 值轉為查詢字串值；null 回傳 None
    pub fn param_value(value: &Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Array(items) => {
                let scalars: Option<Vec<String>> = items
                    .iter()
                    .map(|item| match item {
                        Value::Array(_) | Value::Object(_) | Value::Null => None,
                        scalar => Self::param_value(scalar),
                    })
                    .collect();
                Some(scalars.map(|s| s.join(",")).unwrap_or_else(|| value.to_string()))
            }
            Value::Object(_) => Some(value.to_string()),
        }
    }
}
