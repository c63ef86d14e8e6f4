//! Read side of a resource.
//!
//! Every listing goes through the same pipeline: `R::base_query()`, then the filters,
//! then the sorting, then (for pages) the offset/limit window. Methods are generic over
//! the connection so they work inside a transaction too.

use sea_orm::{
    ConnectionTrait, PaginatorTrait, QueryFilter, Select, Value as DbValue, sea_query::Expr,
};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    errors::CrudError,
    filtering::{
        HandlerRegistry, apply_filters, apply_pagination, apply_sorting, page_count,
        qualified_column,
    },
    options::{Filters, Options, Sorting},
    resource::CrudResource,
};

/// One window of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page: u64,
    pub elements_per_page: u64,
    pub page_count: u64,
}

impl<T> Page<T> {
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.elements_per_page.saturating_mul(self.page.saturating_sub(1))
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page: self.page,
            elements_per_page: self.elements_per_page,
            page_count: self.page_count,
        }
    }
}

pub struct Repository<R: CrudResource> {
    handlers: HandlerRegistry<R::Entity>,
}

impl<R: CrudResource> Repository<R> {
    /// Build the repository and collect the resource's custom handlers.
    #[must_use]
    pub fn new() -> Self {
        let mut handlers = HandlerRegistry::new();
        R::register_handlers(&mut handlers);
        Self { handlers }
    }

    #[must_use]
    pub const fn handlers(&self) -> &HandlerRegistry<R::Entity> {
        &self.handlers
    }

    /// Base query narrowed by `filters`.
    #[must_use]
    pub fn filtered(&self, filters: &Filters) -> Select<R::Entity> {
        apply_filters::<R>(R::base_query(), filters, &self.handlers)
    }

    /// Filtered and sorted query; windowed as well when `elements_per_page` is set.
    ///
    /// # Errors
    ///
    /// `InvalidPagination` for a zero page or page size.
    pub fn query(&self, options: &Options) -> Result<Select<R::Entity>, CrudError> {
        let select = apply_sorting::<R>(
            self.filtered(&options.filters),
            &options.sorting,
            &self.handlers,
        );
        match options.elements_per_page {
            Some(per_page) => apply_pagination(select, options.page, per_page),
            None => Ok(select),
        }
    }

    fn by_id(id: Uuid) -> Select<R::Entity> {
        let id_column = qualified_column(&R::alias(), "id");
        R::base_query().filter(Expr::expr(id_column).eq(DbValue::from(id)))
    }

    fn by_ids(&self, ids: &[Uuid]) -> Select<R::Entity> {
        let values: Vec<DbValue> = ids.iter().copied().map(DbValue::from).collect();
        let id_column = qualified_column(&R::alias(), "id");
        let select = R::base_query().filter(Expr::expr(id_column).is_in(values));
        apply_sorting::<R>(select, &Sorting::new(), &self.handlers)
    }

    /// # Errors
    ///
    /// `Database` when the query fails.
    pub async fn get_by_id<C: ConnectionTrait>(
        &self,
        db: &C,
        id: Uuid,
    ) -> Result<Option<R::Model>, CrudError> {
        Ok(Self::by_id(id).one(db).await?)
    }

    /// First entity matching `filters` in default order; callers own uniqueness.
    ///
    /// Unlike listings, a lookup never drops a criterion: when a key is neither a
    /// filterable field nor a registered filter handler, nothing matches and `Ok(None)`
    /// is returned.
    ///
    /// # Errors
    ///
    /// `Database` when the query fails.
    pub async fn get_by<C: ConnectionTrait>(
        &self,
        db: &C,
        filters: &Filters,
    ) -> Result<Option<R::Model>, CrudError> {
        let filterable = R::filterable_fields();
        if let Some(field) = filters.keys().find(|field| {
            !filterable.contains(&field.as_str()) && self.handlers.filter_handler(field).is_none()
        }) {
            tracing::warn!(
                entity = R::ENTITY_NAME,
                field = %field,
                "Lookup on a field that cannot be filtered matches nothing"
            );
            return Ok(None);
        }

        let select = apply_sorting::<R>(self.filtered(filters), &Sorting::new(), &self.handlers);
        Ok(select.one(db).await?)
    }

    /// # Errors
    ///
    /// `Database` when the query fails.
    pub async fn get_many_by_ids<C: ConnectionTrait>(
        &self,
        db: &C,
        ids: &[Uuid],
    ) -> Result<Vec<R::Model>, CrudError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.by_ids(ids).all(db).await?)
    }

    /// Every entity matching the options; pagination values are ignored.
    ///
    /// # Errors
    ///
    /// `Database` when the query fails.
    pub async fn get_many<C: ConnectionTrait>(
        &self,
        db: &C,
        options: &Options,
    ) -> Result<Vec<R::Model>, CrudError> {
        let unwindowed = Options {
            elements_per_page: None,
            ..options.clone()
        };
        Ok(self.query(&unwindowed)?.all(db).await?)
    }

    /// One page of entities plus the total count of the filtered listing.
    ///
    /// # Errors
    ///
    /// `InvalidOptions` without `elements_per_page`, `InvalidPagination` for zero values,
    /// `Database` when a query fails.
    pub async fn get_page<C: ConnectionTrait>(
        &self,
        db: &C,
        options: &Options,
    ) -> Result<Page<R::Model>, CrudError> {
        let per_page = Self::require_pagination(options)?;
        let total_count = self.filtered(&options.filters).count(db).await?;
        let items = self.query(options)?.all(db).await?;
        Ok(Self::page(items, total_count, options.page, per_page))
    }

    /// # Errors
    ///
    /// `Database` when the query fails.
    pub async fn get_by_id_raw<C: ConnectionTrait>(
        &self,
        db: &C,
        id: Uuid,
    ) -> Result<Option<Value>, CrudError> {
        Ok(Self::by_id(id).into_json().one(db).await?)
    }

    /// # Errors
    ///
    /// `Database` when the query fails.
    pub async fn get_many_raw<C: ConnectionTrait>(
        &self,
        db: &C,
        options: &Options,
    ) -> Result<Vec<Value>, CrudError> {
        let unwindowed = Options {
            elements_per_page: None,
            ..options.clone()
        };
        Ok(self.query(&unwindowed)?.into_json().all(db).await?)
    }

    /// # Errors
    ///
    /// Same as [`Repository::get_page`].
    pub async fn get_page_raw<C: ConnectionTrait>(
        &self,
        db: &C,
        options: &Options,
    ) -> Result<Page<Value>, CrudError> {
        let per_page = Self::require_pagination(options)?;
        let total_count = self.filtered(&options.filters).count(db).await?;
        let items = self.query(options)?.into_json().all(db).await?;
        Ok(Self::page(items, total_count, options.page, per_page))
    }

    fn require_pagination(options: &Options) -> Result<u64, CrudError> {
        options.elements_per_page.ok_or_else(|| {
            CrudError::invalid_options("the required option 'elementsPerPage' is missing")
        })
    }

    fn page<T>(items: Vec<T>, total_count: u64, page: u64, per_page: u64) -> Page<T> {
        tracing::debug!(
            resource = R::ENTITY_NAME,
            total_count,
            page,
            per_page,
            returned = items.len(),
            "Loaded page"
        );
        Page {
            items,
            total_count,
            page,
            elements_per_page: per_page,
            page_count: page_count(total_count, per_page),
        }
    }
}

impl<R: CrudResource> Default for Repository<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: CrudResource> Clone for Repository<R> {
    fn clone(&self) -> Self {
        Self {
            handlers: self.handlers.clone(),
        }
    }
}

impl<R: CrudResource> std::fmt::Debug for Repository<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("resource", &R::ENTITY_NAME)
            .field("handlers", &self.handlers)
            .finish()
    }
}
