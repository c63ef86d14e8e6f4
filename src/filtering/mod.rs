//! # Query Building
//!
//! Translates resolved [`Options`](crate::options::Options) into a sea-orm `Select`:
//!
//! - **Filters**: one `AND`ed predicate per non-blank value. Scalars compare for equality,
//!   arrays become `IN (...)`. Bare field names are qualified with the resource alias,
//!   dotted names (`author.name`) are used as given.
//! - **Sorting**: `ORDER BY` in insertion order, restricted to sortable fields, with the
//!   resource's default sorting as fallback.
//! - **Pagination**: `OFFSET elements_per_page * (page - 1) LIMIT elements_per_page`.
//! - **Custom handlers**: a [`HandlerRegistry`] lets a resource take over single fields,
//!   e.g. a `search` filter spanning several columns.
//!
//! ```rust,ignore
//! // GET /articles/paginated?article_filter_status=published&article_sorting_title=desc&page=2
//! // SELECT ... FROM "articles"
//! // WHERE "articles"."status" = 'published'
//! // ORDER BY "articles"."title" DESC
//! // LIMIT 20 OFFSET 20
//! ```

pub mod conditions;
pub mod handlers;
pub mod pagination;
pub mod sort;

pub use conditions::{apply_filters, is_blank, is_uuid_column, qualified_column};
pub use handlers::{FilterHandler, HandlerRegistry, SortHandler};
pub use pagination::{apply_pagination, calculate_content_range, page_count, page_window};
pub use sort::apply_sorting;
