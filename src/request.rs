//! Request values as seen by the CRUD layer.
//!
//! Query string and body are both flattened into ordered `name → JSON value` maps. HTML
//! forms send every value as a string and repeat `name[]` keys for lists, which become
//! JSON arrays under `name`:
//!
//! ```text
//! article_filter_status[]=draft&article_filter_status[]=published&page=2
//! => {"article_filter_status": ["draft", "published"], "page": "2"}
//! ```

use axum::{
    body::to_bytes,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
};
use indexmap::IndexMap;
use serde_json::Value;

use crate::errors::CrudError;

/// Largest body the extractor buffers.
const BODY_LIMIT: usize = 2 * 1024 * 1024;

pub type Values = IndexMap<String, Value>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestValues {
    query: Values,
    body: Values,
}

impl RequestValues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw query string (without the leading `?`).
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        Self {
            query: parse_urlencoded(query.as_bytes()),
            body: Values::new(),
        }
    }

    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.body.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn query(&self) -> &Values {
        &self.query
    }

    #[must_use]
    pub const fn body(&self) -> &Values {
        &self.body
    }

    #[must_use]
    pub fn query_value(&self, key: &str) -> Option<&Value> {
        self.query.get(key)
    }

    /// Body value first, then query value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key).or_else(|| self.query.get(key))
    }

    /// Query and body together; body values win on equal keys.
    #[must_use]
    pub fn merged(&self) -> Values {
        let mut merged = self.query.clone();
        for (key, value) in &self.body {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }
}

/// Decode `application/x-www-form-urlencoded` data; `key[]` entries accumulate into arrays.
#[must_use]
pub fn parse_urlencoded(input: &[u8]) -> Values {
    let mut values = Values::new();
    for (key, value) in url::form_urlencoded::parse(input) {
        if let Some(name) = key.strip_suffix("[]") {
            let entry = values
                .entry(name.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            match entry {
                Value::Array(items) => items.push(Value::String(value.into_owned())),
                other => {
                    let previous = other.take();
                    *other = Value::Array(vec![previous, Value::String(value.into_owned())]);
                }
            }
        } else {
            values.insert(key.into_owned(), Value::String(value.into_owned()));
        }
    }
    values
}

fn parse_json_body(bytes: &[u8]) -> Result<Values, CrudError> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map.into_iter().collect()),
        Ok(Value::Null) => Ok(Values::new()),
        Ok(_) => Err(CrudError::bad_request("The request body must be a JSON object")),
        Err(err) => {
            tracing::warn!(error = %err, "Rejected malformed JSON body");
            Err(CrudError::bad_request("The request body is not valid JSON"))
        }
    }
}

impl<S> FromRequest<S> for RequestValues
where
    S: Send + Sync,
{
    type Rejection = CrudError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let query = req
            .uri()
            .query()
            .map(|q| parse_urlencoded(q.as_bytes()))
            .unwrap_or_default();
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/json"));

        let bytes = to_bytes(req.into_body(), BODY_LIMIT).await.map_err(|err| {
            tracing::warn!(error = %err, "Failed to read request body");
            CrudError::bad_request("The request body could not be read")
        })?;

        let body = if bytes.is_empty() {
            Values::new()
        } else if is_json {
            parse_json_body(&bytes)?
        } else {
            parse_urlencoded(&bytes)
        };

        Ok(Self { query, body })
    }
}
