//! Filters and sorting that stick to the user.
//!
//! A listing's filters come from three places, later ones winning per field: what the
//! session remembers, what the request sends, and what the calling code forces. Request
//! keys and session keys share one namespace per resource:
//!
//! | What    | Key                          | Example                        |
//! |---------|------------------------------|--------------------------------|
//! | filter  | `{prefix}_filter_{field}`    | `article_filter_status=draft`  |
//! | sorting | `{prefix}_sorting_{field}`   | `article_sorting_title=desc`   |
//!
//! The plain `sort`/`order` query pair is understood as well.

use serde_json::Value;

use crate::{
    options::{Filters, SortOrder, Sorting},
    request::RequestValues,
    session::SessionBag,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionBridge {
    prefix: String,
}

impl SessionBridge {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn filter_prefix(&self) -> String {
        format!("{}_filter_", self.prefix)
    }

    #[must_use]
    pub fn sorting_prefix(&self) -> String {
        format!("{}_sorting_", self.prefix)
    }

    fn filters_from_request(&self, request: &RequestValues) -> Filters {
        let prefix = self.filter_prefix();
        request
            .merged()
            .into_iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(&prefix)
                    .map(|name| (name.to_string(), value))
            })
            .collect()
    }

    fn sorting_from_request(&self, request: &RequestValues) -> Sorting {
        let mut sorting = Sorting::new();

        if let Some(Value::String(field)) = request.query_value("sort")
            && !field.trim().is_empty()
        {
            let order = request
                .query_value("order")
                .map_or(SortOrder::Asc, SortOrder::from_json);
            sorting.insert(field.trim().to_string(), order);
        }

        let prefix = self.sorting_prefix();
        for (key, value) in request.merged() {
            if let Some(field) = key.strip_prefix(&prefix) {
                sorting.insert(field.to_string(), SortOrder::from_json(&value));
            }
        }
        sorting
    }

    /// Session filters, then request filters, then `overrides`.
    ///
    /// Unless `ignore_session` is set, the merged result is written back to `bag`.
    pub fn get_filters(
        &self,
        request: &RequestValues,
        bag: &mut SessionBag,
        overrides: &Filters,
        ignore_session: bool,
    ) -> Filters {
        let mut filters = if ignore_session {
            Filters::new()
        } else {
            bag.extract(&self.filter_prefix())
        };
        filters.extend(self.filters_from_request(request));
        filters.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));

        if !ignore_session {
            let prefix = self.filter_prefix();
            for (field, value) in &filters {
                bag.set(format!("{prefix}{field}"), value.clone());
            }
        }
        filters
    }

    /// Request sorting when the request asks for any, the remembered sorting otherwise.
    ///
    /// A requested sorting replaces the remembered one as a whole, so the listing is ordered
    /// exactly as asked. Unless `ignore_session` is set, the result is written back to `bag`.
    pub fn get_sorting(
        &self,
        request: &RequestValues,
        bag: &mut SessionBag,
        ignore_session: bool,
    ) -> Sorting {
        let requested = self.sorting_from_request(request);
        if ignore_session {
            return requested;
        }

        let prefix = self.sorting_prefix();
        if requested.is_empty() {
            return bag
                .extract(&prefix)
                .into_iter()
                .map(|(field, value)| (field, SortOrder::from_json(&value)))
                .collect();
        }

        bag.remove_prefixed(&prefix);
        for (field, order) in &requested {
            bag.set(format!("{prefix}{field}"), order.as_str());
        }
        requested
    }

    #[must_use]
    pub fn has_filter(&self, bag: &SessionBag, name: &str) -> bool {
        bag.has(&format!("{}{name}", self.filter_prefix()))
    }

    /// Store a single filter; with `overwrite == false` an existing value is kept.
    pub fn add_filter(
        &self,
        bag: &mut SessionBag,
        name: &str,
        value: impl Into<Value>,
        overwrite: bool,
    ) {
        if !overwrite && self.has_filter(bag, name) {
            return;
        }
        bag.set(format!("{}{name}", self.filter_prefix()), value);
    }

    pub fn reset_filters(&self, bag: &mut SessionBag) {
        let removed = bag.remove_prefixed(&self.filter_prefix());
        tracing::debug!(prefix = %self.prefix, removed, "Reset filters");
    }

    pub fn reset_sorting(&self, bag: &mut SessionBag) {
        let removed = bag.remove_prefixed(&self.sorting_prefix());
        tracing::debug!(prefix = %self.prefix, removed, "Reset sorting");
    }

    pub fn remove_filters_and_sorting(&self, bag: &mut SessionBag) {
        self.reset_filters(bag);
        self.reset_sorting(bag);
    }

    /// `page` query value; 1 when absent, not an integer, or below 1.
    #[must_use]
    pub fn page(request: &RequestValues) -> u64 {
        let page = match request.query_value("page") {
            Some(Value::String(text)) => text.trim().parse::<i64>().ok(),
            Some(Value::Number(number)) => number.as_i64(),
            _ => None,
        };
        match page {
            Some(n) if n >= 1 => n.unsigned_abs(),
            _ => 1,
        }
    }
}
