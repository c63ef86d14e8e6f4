//! # Entity Service
//!
//! The facade a controller talks to. It resolves listing options from the request and
//! the session, reads through the [`Repository`], and writes through sea-orm active
//! models. Write operations never fail with an error: validation problems come back as
//! [`SaveOutcome::Invalid`], persistence faults are logged and reported as
//! [`SaveOutcome::Failed`] or `false`.
//!
//! ```rust,ignore
//! let service = EntityService::<Article>::new(db, CrudConfig::default());
//!
//! let listing = service.find_entities(&request, &mut bag, &Filters::new(), true).await?;
//! println!("{} articles on {} pages", listing.entities.len(), listing.pages.unwrap_or(1));
//!
//! match service.create_entity(&request, Article::new_entity()).await {
//!     SaveOutcome::Saved(article) => println!("created {}", article.id),
//!     SaveOutcome::Invalid(errors) => println!("{errors}"),
//!     SaveOutcome::Failed => println!("database refused the article"),
//! }
//! ```

use sea_orm::{ActiveModelTrait, DatabaseConnection, IntoActiveModel, TransactionTrait};
use serde::Serialize;
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::{
    bridge::SessionBridge,
    config::CrudConfig,
    errors::CrudError,
    form::{EntityForm, submit_form},
    options::{Filters, Options, OptionsResolver, Sorting},
    repository::{Page, Repository},
    request::RequestValues,
    resource::CrudResource,
    session::SessionBag,
    validation::ValidationErrors,
};

/// Entities of a listing and the options that produced them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing<T> {
    pub entities: Vec<T>,
    pub options: Options,
    /// Total matching entities; paginated listings only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
    /// Number of pages; paginated listings only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<u64>,
}

impl<T> Listing<T> {
    fn from_page(page: Page<T>, options: Options) -> Self {
        Self {
            entities: page.items,
            options,
            total_count: Some(page.total_count),
            pages: Some(page.page_count),
        }
    }

    fn unpaginated(entities: Vec<T>, options: Options) -> Self {
        Self {
            entities,
            options,
            total_count: None,
            pages: None,
        }
    }
}

/// Result of a create or update.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome<M> {
    Saved(M),
    /// The submitted values did not bind or did not validate
    Invalid(ValidationErrors),
    /// The database rejected the write; details were logged
    Failed,
}

impl<M> SaveOutcome<M> {
    #[must_use]
    pub const fn is_saved(&self) -> bool {
        matches!(self, Self::Saved(_))
    }

    #[must_use]
    pub fn saved(self) -> Option<M> {
        match self {
            Self::Saved(model) => Some(model),
            Self::Invalid(_) | Self::Failed => None,
        }
    }

    #[must_use]
    pub fn errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Invalid(errors) => Some(errors),
            Self::Saved(_) | Self::Failed => None,
        }
    }
}

pub struct EntityService<R: CrudResource> {
    db: DatabaseConnection,
    repository: Repository<R>,
    bridge: SessionBridge,
    config: CrudConfig,
}

impl<R: CrudResource> EntityService<R> {
    #[must_use]
    pub fn new(db: DatabaseConnection, config: CrudConfig) -> Self {
        Self {
            db,
            repository: Repository::new(),
            bridge: SessionBridge::new(R::SESSION_PREFIX),
            config,
        }
    }

    #[must_use]
    pub const fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    #[must_use]
    pub const fn repository(&self) -> &Repository<R> {
        &self.repository
    }

    #[must_use]
    pub const fn bridge(&self) -> &SessionBridge {
        &self.bridge
    }

    #[must_use]
    pub const fn config(&self) -> &CrudConfig {
        &self.config
    }

    /// # Errors
    ///
    /// `Database` when the query fails.
    pub async fn find_entity(&self, id: Uuid) -> Result<Option<R::Model>, CrudError> {
        self.repository.get_by_id(&self.db, id).await
    }

    /// # Errors
    ///
    /// `NotFound` when no entity has this id, `Database` when the query fails.
    pub async fn get_entity(&self, id: Uuid) -> Result<R::Model, CrudError> {
        self.find_entity(id)
            .await?
            .ok_or_else(|| CrudError::not_found(R::ENTITY_NAME, Some(id.to_string())))
    }

    /// The entity as a plain JSON row.
    ///
    /// # Errors
    ///
    /// `Database` when the query fails.
    pub async fn find_unhydrated_entity(&self, id: Uuid) -> Result<Option<Value>, CrudError> {
        self.repository.get_by_id_raw(&self.db, id).await
    }

    fn resolve_options(
        &self,
        request: &RequestValues,
        bag: &mut SessionBag,
        overrides: &Filters,
        paginate: bool,
        ignore_session: bool,
    ) -> Result<Options, CrudError> {
        let filters = self.bridge.get_filters(request, bag, overrides, ignore_session);
        let sorting = self.bridge.get_sorting(request, bag, ignore_session);

        let mut raw = Map::new();
        raw.insert("filters".to_string(), filters_to_json(&filters));
        raw.insert("sorting".to_string(), sorting_to_json(&sorting));
        if paginate {
            raw.insert("page".to_string(), json!(SessionBridge::page(request)));
            raw.insert("elementsPerPage".to_string(), json!(self.config.elements_per_page));
            OptionsResolver::paginated().resolve_map(&raw)
        } else {
            OptionsResolver::basic().resolve_map(&raw)
        }
    }

    /// Entities matching the session, request and `overrides` filters.
    ///
    /// The merged filters and sorting are remembered in `bag`. With `paginate` the listing
    /// holds the requested page and the page count.
    ///
    /// # Errors
    ///
    /// `Database` when a query fails.
    pub async fn find_entities(
        &self,
        request: &RequestValues,
        bag: &mut SessionBag,
        overrides: &Filters,
        paginate: bool,
    ) -> Result<Listing<R::Model>, CrudError> {
        let options = self.resolve_options(request, bag, overrides, paginate, false)?;
        if paginate {
            let page = self.repository.get_page(&self.db, &options).await?;
            Ok(Listing::from_page(page, options))
        } else {
            let entities = self.repository.get_many(&self.db, &options).await?;
            Ok(Listing::unpaginated(entities, options))
        }
    }

    /// Like [`EntityService::find_entities`] with plain JSON rows; the session is neither
    /// read nor written.
    ///
    /// # Errors
    ///
    /// `Database` when a query fails.
    pub async fn find_unhydrated_entities(
        &self,
        request: &RequestValues,
        overrides: &Filters,
        paginate: bool,
    ) -> Result<Listing<Value>, CrudError> {
        let mut scratch = SessionBag::new();
        let options = self.resolve_options(request, &mut scratch, overrides, paginate, true)?;
        if paginate {
            let page = self.repository.get_page_raw(&self.db, &options).await?;
            Ok(Listing::from_page(page, options))
        } else {
            let entities = self.repository.get_many_raw(&self.db, &options).await?;
            Ok(Listing::unpaginated(entities, options))
        }
    }

    /// Bind the request body onto `blank`, validate, and insert.
    pub async fn create_entity(
        &self,
        request: &RequestValues,
        blank: R::ActiveModel,
    ) -> SaveOutcome<R::Model> {
        let form = match submit_form::<R::Form>(request.body()) {
            Ok(form) => form,
            Err(errors) => return Self::rejected(errors),
        };

        match form.bind(blank).insert(&self.db).await {
            Ok(model) => {
                tracing::info!(resource = R::ENTITY_NAME, id = %R::id(&model), "Entity created");
                SaveOutcome::Saved(model)
            }
            Err(err) => {
                tracing::error!(resource = R::ENTITY_NAME, error = ?err, "Failed to create entity");
                SaveOutcome::Failed
            }
        }
    }

    /// Bind the request body onto `model`, validate, and update it in place.
    pub async fn update_entity(
        &self,
        request: &RequestValues,
        model: R::Model,
    ) -> SaveOutcome<R::Model> {
        let id = R::id(&model);
        let form = match submit_form::<R::Form>(request.body()) {
            Ok(form) => form,
            Err(errors) => return Self::rejected(errors),
        };

        match form.bind(model.into_active_model()).update(&self.db).await {
            Ok(model) => {
                tracing::info!(resource = R::ENTITY_NAME, id = %id, "Entity updated");
                SaveOutcome::Saved(model)
            }
            Err(err) => {
                tracing::error!(
                    resource = R::ENTITY_NAME,
                    id = %id,
                    error = ?err,
                    "Failed to update entity"
                );
                SaveOutcome::Failed
            }
        }
    }

    fn rejected(errors: ValidationErrors) -> SaveOutcome<R::Model> {
        tracing::debug!(resource = R::ENTITY_NAME, errors = %errors, "Rejected submitted values");
        SaveOutcome::Invalid(errors)
    }

    /// `false` when the entity does not exist or could not be deleted.
    pub async fn remove_entity(&self, id: Uuid) -> bool {
        let model = match self.find_entity(id).await {
            Ok(Some(model)) => model,
            Ok(None) => {
                tracing::warn!(resource = R::ENTITY_NAME, id = %id, "Cannot delete a missing entity");
                return false;
            }
            Err(err) => {
                tracing::error!(
                    resource = R::ENTITY_NAME,
                    id = %id,
                    error = %err,
                    "Failed to load entity for deletion"
                );
                return false;
            }
        };

        match model.into_active_model().delete(&self.db).await {
            Ok(result) if result.rows_affected > 0 => {
                tracing::info!(resource = R::ENTITY_NAME, id = %id, "Entity deleted");
                true
            }
            Ok(_) => false,
            Err(err) => {
                tracing::error!(resource = R::ENTITY_NAME, id = %id, error = ?err, "Failed to delete entity");
                false
            }
        }
    }

    /// Delete every existing entity among `ids` in one transaction; unknown ids are skipped.
    pub async fn remove_entities(&self, ids: &[Uuid]) -> bool {
        match self.remove_all(ids).await {
            Ok(removed) => {
                tracing::info!(
                    resource = R::ENTITY_NAME,
                    requested = ids.len(),
                    removed,
                    "Entities deleted"
                );
                true
            }
            Err(err) => {
                tracing::error!(resource = R::ENTITY_NAME, error = ?err, "Failed to delete entities");
                false
            }
        }
    }

    async fn remove_all(&self, ids: &[Uuid]) -> Result<u64, CrudError> {
        let txn = self.db.begin().await?;
        let mut removed = 0;
        for model in self.repository.get_many_by_ids(&txn, ids).await? {
            removed += model.into_active_model().delete(&txn).await?.rows_affected;
        }
        txn.commit().await?;
        Ok(removed)
    }

    /// See [`SessionBridge::get_filters`].
    pub fn get_filters(
        &self,
        request: &RequestValues,
        bag: &mut SessionBag,
        overrides: &Filters,
        ignore_session: bool,
    ) -> Filters {
        self.bridge.get_filters(request, bag, overrides, ignore_session)
    }

    /// See [`SessionBridge::get_sorting`].
    pub fn get_sorting(
        &self,
        request: &RequestValues,
        bag: &mut SessionBag,
        ignore_session: bool,
    ) -> Sorting {
        self.bridge.get_sorting(request, bag, ignore_session)
    }

    #[must_use]
    pub fn has_filter(&self, bag: &SessionBag, name: &str) -> bool {
        self.bridge.has_filter(bag, name)
    }

    pub fn add_filter(
        &self,
        bag: &mut SessionBag,
        name: &str,
        value: impl Into<Value>,
        overwrite: bool,
    ) {
        self.bridge.add_filter(bag, name, value, overwrite);
    }

    pub fn reset_filters(&self, bag: &mut SessionBag) {
        self.bridge.reset_filters(bag);
    }

    pub fn remove_filters_and_sorting(&self, bag: &mut SessionBag) {
        self.bridge.remove_filters_and_sorting(bag);
    }
}

impl<R: CrudResource> std::fmt::Debug for EntityService<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityService")
            .field("resource", &R::ENTITY_NAME)
            .field("bridge", &self.bridge)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn filters_to_json(filters: &Filters) -> Value {
    Value::Object(filters.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
}

fn sorting_to_json(sorting: &Sorting) -> Value {
    Value::Object(
        sorting
            .iter()
            .map(|(field, order)| (field.clone(), Value::from(order.as_str())))
            .collect(),
    )
}
