use sea_orm::{EntityTrait, Select};
use serde_json::Value;
use std::{collections::HashMap, fmt, sync::Arc};

use crate::options::SortOrder;

/// Custom filter: receives the query and the raw filter value (blank values included).
pub type FilterHandler<E> = Arc<dyn Fn(Select<E>, &Value) -> Select<E> + Send + Sync>;

/// Custom sort: receives the query and the requested order.
pub type SortHandler<E> = Arc<dyn Fn(Select<E>, SortOrder) -> Select<E> + Send + Sync>;

/// Named custom filters and sorts of one resource.
///
/// A registered handler takes over the field completely: the generic equality / `IN`
/// predicate or `ORDER BY` is not emitted for it.
///
/// ```rust,ignore
/// fn register_handlers(handlers: &mut HandlerRegistry<article::Entity>) {
///     handlers.filter("search", |select, value| match value.as_str() {
///         Some(term) if !term.trim().is_empty() => {
///             select.filter(article::Column::Title.contains(term.trim()))
///         }
///         _ => select,
///     });
/// }
/// ```
pub struct HandlerRegistry<E: EntityTrait> {
    filters: HashMap<String, FilterHandler<E>>,
    sorting: HashMap<String, SortHandler<E>>,
}

impl<E: EntityTrait> HandlerRegistry<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            filters: HashMap::new(),
            sorting: HashMap::new(),
        }
    }

    /// Register a custom filter for `name`, replacing any previous one.
    pub fn filter<F>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(Select<E>, &Value) -> Select<E> + Send + Sync + 'static,
    {
        self.filters.insert(name.into(), Arc::new(handler));
        self
    }

    /// Register a custom sort for `name`, replacing any previous one.
    pub fn sorting<F>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(Select<E>, SortOrder) -> Select<E> + Send + Sync + 'static,
    {
        self.sorting.insert(name.into(), Arc::new(handler));
        self
    }

    #[must_use]
    pub fn filter_handler(&self, name: &str) -> Option<&FilterHandler<E>> {
        self.filters.get(name)
    }

    #[must_use]
    pub fn sort_handler(&self, name: &str) -> Option<&SortHandler<E>> {
        self.sorting.get(name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty() && self.sorting.is_empty()
    }
}

impl<E: EntityTrait> Default for HandlerRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntityTrait> Clone for HandlerRegistry<E> {
    fn clone(&self) -> Self {
        Self {
            filters: self.filters.clone(),
            sorting: self.sorting.clone(),
        }
    }
}

impl<E: EntityTrait> fmt::Debug for HandlerRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut filters: Vec<&str> = self.filters.keys().map(String::as_str).collect();
        let mut sorting: Vec<&str> = self.sorting.keys().map(String::as_str).collect();
        filters.sort_unstable();
        sorting.sort_unstable();
        f.debug_struct("HandlerRegistry")
            .field("filters", &filters)
            .field("sorting", &sorting)
            .finish()
    }
}
