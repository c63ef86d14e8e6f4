use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, EntityName, EntityTrait, FromQueryResult,
    IntoActiveModel, ModelTrait, Select,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{filtering::HandlerRegistry, form::EntityForm, options::SortOrder};

/// A sea-orm entity exposed through the CRUD layer.
///
/// Everything except the associated types, [`ENTITY_NAME`](Self::ENTITY_NAME) and
/// [`id`](Self::id) has a default: the whole table is the base query, only `id` is
/// filterable and sortable, and listings sort by `id ASC`.
pub trait CrudResource: Send + Sync + 'static {
    type Entity: EntityTrait<Model = Self::Model> + Send + Sync;
    type Model: ModelTrait<Entity = Self::Entity>
        + IntoActiveModel<Self::ActiveModel>
        + FromQueryResult
        + Serialize
        + Clone
        + Send
        + Sync;
    type ActiveModel: ActiveModelTrait<Entity = Self::Entity> + ActiveModelBehavior + Send + Sync;
    type Form: EntityForm<Self::ActiveModel>;

    /// Human readable name used in messages and logs, e.g. `"article"`.
    const ENTITY_NAME: &'static str;

    /// Namespace of the session keys holding this resource's filters and sorting.
    const SESSION_PREFIX: &'static str = Self::ENTITY_NAME;

    /// Primary key of a loaded model.
    fn id(model: &Self::Model) -> Uuid;

    /// Blank active model used by the "new" form and by creation.
    #[must_use]
    fn new_entity() -> Self::ActiveModel {
        <Self::ActiveModel as ActiveModelBehavior>::new()
    }

    /// Alias used to qualify bare field names.
    #[must_use]
    fn alias() -> String {
        Self::Entity::default().table_name().to_string()
    }

    /// Starting point of every query; may add joins.
    #[must_use]
    fn base_query() -> Select<Self::Entity> {
        Self::Entity::find()
    }

    #[must_use]
    fn filterable_fields() -> Vec<&'static str> {
        vec!["id"]
    }

    #[must_use]
    fn sortable_fields() -> Vec<&'static str> {
        vec!["id"]
    }

    /// Applied in order when no requested sort field survives.
    #[must_use]
    fn default_sorting() -> Vec<(&'static str, SortOrder)> {
        vec![("id", SortOrder::Asc)]
    }

    /// Register custom filters and sorts.
    fn register_handlers(_handlers: &mut HandlerRegistry<Self::Entity>) {}
}
