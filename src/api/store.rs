//! The abstract document store the rest of the crate talks to.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::error::DataResult;

/// Query parameters of a view request.
///
/// Values are JSON encoded on the wire, so string keys keep their quotes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewParams {
    pub key: Option<Value>,
    pub keys: Option<Vec<Value>>,
    pub group: Option<bool>,
    pub include_docs: Option<bool>,
}

impl ViewParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(key: impl Into<Value>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::default()
        }
    }

    pub fn with_keys<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Value>,
    {
        Self {
            keys: Some(keys.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn grouped(mut self) -> Self {
        self.group = Some(true);
        self
    }

    pub fn include_docs(mut self) -> Self {
        self.include_docs = Some(true);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.key.is_none() && self.keys.is_none() && self.group.is_none() && self.include_docs.is_none()
    }

    /// Render as a query string (`?key=...&group=true`), or an empty string
    /// when no parameter is set.
    pub fn to_query(&self) -> String {
        let mut pairs: Vec<(&str, String)> = Vec::new();
        if let Some(key) = &self.key {
            pairs.push(("key", key.to_string()));
        }
        if let Some(keys) = &self.keys {
            pairs.push(("keys", Value::Array(keys.clone()).to_string()));
        }
        if let Some(group) = self.group {
            pairs.push(("group", group.to_string()));
        }
        if let Some(include_docs) = self.include_docs {
            pairs.push(("include_docs", include_docs.to_string()));
        }

        pairs
            .iter()
            .enumerate()
            .map(|(i, (name, json))| {
                let separator = if i == 0 { '?' } else { '&' };
                format!("{}{}={}", separator, name, urlencoding::encode(json))
            })
            .collect()
    }
}

/// One row of a view response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ViewRow {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub key: Value,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub doc: Option<Value>,
    /// Set for requested keys that matched nothing (`"not_found"`).
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ViewResult {
    #[serde(default)]
    pub total_rows: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(default)]
    pub rows: Vec<ViewRow>,
}

/// Data operations of a document-oriented store.
///
/// Every call completes exactly once, with a value or a
/// [`DataError`](super::error::DataError).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create_database(&self, db: &str) -> DataResult<()>;

    /// Store `doc`, under `id` if given. Returns the generated id when the
    /// store picked one.
    async fn put_document(&self, db: &str, id: Option<&str>, doc: &Value) -> DataResult<Option<String>>;

    async fn get_document(&self, db: &str, id: &str) -> DataResult<Value>;

    /// Query `view` of the design document `design` (name without the
    /// `_design/` prefix).
    async fn execute_view(&self, db: &str, design: &str, view: &str, params: &ViewParams) -> DataResult<ViewResult>;

    /// Run the server-side update function `function` of `design` against
    /// document `target`, with `body` as the raw request body.
    async fn update(&self, db: &str, design: &str, function: &str, target: &str, body: &str) -> DataResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_params_render_nothing() {
        assert!(ViewParams::new().is_empty());
        assert_eq!(ViewParams::new().to_query(), "");
    }

    #[test]
    fn test_key_is_json_encoded() {
        let params = ViewParams::with_key("lecture-1");
        assert_eq!(params.to_query(), "?key=%22lecture-1%22");
    }

    #[test]
    fn test_parameters_keep_stable_order() {
        let params = ViewParams::with_keys(["a", "b"]).grouped();
        assert_eq!(params.to_query(), "?keys=%5B%22a%22%2C%22b%22%5D&group=true");

        let params = ViewParams::with_key("u1").include_docs();
        assert_eq!(params.to_query(), "?key=%22u1%22&include_docs=true");
    }

    #[test]
    fn test_row_without_value_decodes() {
        let result: ViewResult = serde_json::from_value(json!({
            "rows": [
                { "key": "q1", "value": 3 },
                { "key": "q2", "error": "not_found" }
            ]
        }))
        .unwrap();

        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[0].value, json!(3));
        assert_eq!(result.rows[1].value, Value::Null);
        assert_eq!(result.rows[1].error.as_deref(), Some("not_found"));
    }
}
