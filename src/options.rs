//! Repository options and their resolver.
//!
//! Options travel as loosely typed JSON between the session, the request and the
//! service; [`OptionsResolver`] is the single place where they become a typed
//! [`Options`] value. Code that builds options directly uses the builder methods:
//!
//! ```rust,ignore
//! let options = Options::new()
//!     .filter("status", "published")
//!     .sort("title", SortOrder::Desc)
//!     .paginate(2, 10);
//! ```

use indexmap::IndexMap;
use sea_orm::Order;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::CrudError;

/// Field name → filter value, in insertion order.
pub type Filters = IndexMap<String, Value>;

/// Field name → sort order, in insertion order.
pub type Sorting = IndexMap<String, SortOrder>;

const KNOWN_KEYS: [&str; 4] = ["filters", "sorting", "page", "elementsPerPage"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Case-insensitive; anything other than `desc` sorts ascending.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }

    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        value.as_str().map_or(Self::Asc, Self::parse)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl From<SortOrder> for Order {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        }
    }
}

/// Fully resolved repository options.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    pub filters: Filters,
    pub sorting: Sorting,
    /// 1-based page number
    pub page: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elements_per_page: Option<u64>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            filters: Filters::new(),
            sorting: Sorting::new(),
            page: 1,
            elements_per_page: None,
        }
    }
}

impl Options {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    #[must_use]
    pub fn filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    #[must_use]
    pub fn sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sorting.insert(field.into(), order);
        self
    }

    #[must_use]
    pub fn sorting(mut self, sorting: Sorting) -> Self {
        self.sorting = sorting;
        self
    }

    #[must_use]
    pub fn paginate(mut self, page: u64, elements_per_page: u64) -> Self {
        self.page = page;
        self.elements_per_page = Some(elements_per_page);
        self
    }

    #[must_use]
    pub fn is_paginated(&self) -> bool {
        self.elements_per_page.is_some()
    }
}

/// Validates raw options against the declared keys, defaults and types.
///
/// The basic resolver only needs `filters` and `sorting`; the paginated one
/// additionally requires `elementsPerPage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionsResolver {
    paginated: bool,
}

impl OptionsResolver {
    #[must_use]
    pub const fn basic() -> Self {
        Self { paginated: false }
    }

    #[must_use]
    pub const fn paginated() -> Self {
        Self { paginated: true }
    }

    /// # Errors
    ///
    /// `InvalidOptions` when `raw` is not an object, carries unknown keys, lacks a required
    /// key or has a wrongly typed `filters`/`sorting`; `InvalidPagination` when `page` or
    /// `elementsPerPage` are not positive integers.
    pub fn resolve(&self, raw: &Value) -> Result<Options, CrudError> {
        match raw {
            Value::Object(map) => self.resolve_map(map),
            Value::Null => self.resolve_map(&Map::new()),
            other => Err(CrudError::invalid_options(format!(
                "options must be an object, {} given",
                json_type(other)
            ))),
        }
    }

    /// # Errors
    ///
    /// See [`OptionsResolver::resolve`].
    pub fn resolve_map(&self, raw: &Map<String, Value>) -> Result<Options, CrudError> {
        let result = self.resolve_inner(raw);
        match &result {
            Ok(options) => tracing::debug!(
                filters = options.filters.len(),
                sorting = options.sorting.len(),
                page = options.page,
                elements_per_page = ?options.elements_per_page,
                "Resolved repository options"
            ),
            Err(err) => tracing::warn!(error = %err, "Rejected repository options"),
        }
        result
    }

    fn resolve_inner(&self, raw: &Map<String, Value>) -> Result<Options, CrudError> {
        if let Some(unknown) = raw.keys().find(|key| !KNOWN_KEYS.contains(&key.as_str())) {
            return Err(CrudError::invalid_options(format!(
                "the option '{unknown}' does not exist, known options are: {}",
                KNOWN_KEYS.join(", ")
            )));
        }

        let filters = match raw.get("filters") {
            None | Some(Value::Null) => Filters::new(),
            Some(Value::Object(map)) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            Some(other) => {
                return Err(CrudError::invalid_options(format!(
                    "the option 'filters' must be an object, {} given",
                    json_type(other)
                )));
            }
        };

        let sorting = match raw.get("sorting") {
            None | Some(Value::Null) => Sorting::new(),
            Some(Value::Object(map)) => resolve_sorting(map),
            Some(other) => {
                return Err(CrudError::invalid_options(format!(
                    "the option 'sorting' must be an object, {} given",
                    json_type(other)
                )));
            }
        };

        let page = match raw.get("page") {
            None | Some(Value::Null) => 1,
            Some(value) => positive_integer("page", value)?,
        };

        let elements_per_page = match raw.get("elementsPerPage") {
            None | Some(Value::Null) if self.paginated => {
                return Err(CrudError::invalid_options(
                    "the required option 'elementsPerPage' is missing",
                ));
            }
            None | Some(Value::Null) => None,
            Some(value) => Some(positive_integer("elementsPerPage", value)?),
        };

        Ok(Options {
            filters,
            sorting,
            page,
            elements_per_page,
        })
    }
}

/// Accepts both `{field: order, ...}` and the pair form `{"field": f, "order": o}`.
fn resolve_sorting(map: &Map<String, Value>) -> Sorting {
    let is_pair = map.keys().all(|key| key == "field" || key == "order");
    if is_pair && let Some(Value::String(field)) = map.get("field") {
        let mut sorting = Sorting::new();
        if !field.trim().is_empty() {
            let order = map.get("order").map_or(SortOrder::Asc, SortOrder::from_json);
            sorting.insert(field.clone(), order);
        }
        return sorting;
    }

    map.iter()
        .map(|(field, order)| (field.clone(), SortOrder::from_json(order)))
        .collect()
}

/// Integers and numeric strings (query values) are both accepted.
fn positive_integer(key: &str, value: &Value) -> Result<u64, CrudError> {
    let parsed = match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };

    match parsed {
        Some(n) if n >= 1 => Ok(n.unsigned_abs()),
        Some(n) => Err(CrudError::invalid_pagination(format!(
            "the option '{key}' must be greater than zero, {n} given"
        ))),
        None => Err(CrudError::invalid_pagination(format!(
            "the option '{key}' must be an integer number, {} given",
            json_type(value)
        ))),
    }
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
