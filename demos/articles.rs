//! Article back-office on an in-memory SQLite database
//!
//! ```bash
//! cargo run --example articles
//! ```
//!
//! Then try:
//! - `curl -c jar -b jar localhost:3000/articles`
//! - `curl -c jar -b jar -d 'title=Hello World&status=published' localhost:3000/articles`
//! - `curl -c jar -b jar 'localhost:3000/articles/paginated?article_filter_status=published&page=1'`
//! - `curl -c jar -b jar -X POST localhost:3000/articles/filters/reset`

use axum::Router;
use crudkit::{
    CrudConfig, CrudController, CrudResource, EntityForm, EntityService, HandlerRegistry,
    Validatable, ValidationErrors, filtering::is_blank, slugify, validation::validators,
};
use sea_orm::{
    ActiveValue::Set, ConnectionTrait, Database, QueryFilter, Schema, entity::prelude::*,
};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use std::{env, sync::Arc};
use tower_sessions::{MemoryStore, SessionManagerLayer};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "articles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub status: String,
    pub views: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[serde_as]
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleForm {
    pub title: String,
    pub status: String,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub views: i32,
}

impl Validatable for ArticleForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(validators::validate_required("title", &self.title));
        errors.check(validators::validate_range("views", self.views, Some(0), None));
        errors.result()
    }
}

impl EntityForm<ActiveModel> for ArticleForm {
    fn bind(self, mut active: ActiveModel) -> ActiveModel {
        active.slug = Set(slugify(&self.title, "-").unwrap_or_default());
        active.title = Set(self.title);
        active.status = Set(self.status);
        active.views = Set(self.views);
        active
    }
}

pub struct Article;

impl CrudResource for Article {
    type Entity = Entity;
    type Model = Model;
    type ActiveModel = ActiveModel;
    type Form = ArticleForm;

    const ENTITY_NAME: &'static str = "article";

    fn id(model: &Model) -> Uuid {
        model.id
    }

    fn new_entity() -> ActiveModel {
        let mut active = <ActiveModel as ActiveModelBehavior>::new();
        active.id = Set(Uuid::new_v4());
        active
    }

    fn filterable_fields() -> Vec<&'static str> {
        vec!["id", "title", "status"]
    }

    fn sortable_fields() -> Vec<&'static str> {
        vec!["title", "status", "views"]
    }

    fn register_handlers(handlers: &mut HandlerRegistry<Entity>) {
        handlers.filter("search", |select, value| match value.as_str() {
            Some(term) if !is_blank(value) => select.filter(Column::Title.contains(term.trim())),
            _ => select,
        });
    }
}

struct ArticleController;

impl CrudController for ArticleController {
    type Resource = Article;
    const ROUTE_PREFIX: &'static str = "/articles";
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,crudkit=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());
    let db = Database::connect(&database_url).await?;
    let backend = db.get_database_backend();
    let mut create = Schema::new(backend).create_table_from_entity(Entity);
    create.if_not_exists();
    db.execute(backend.build(&create)).await?;

    let config: CrudConfig = match env::var("CRUD_CONFIG") {
        Ok(raw) => serde_json::from_str(&raw)?,
        Err(_) => CrudConfig::new().elements_per_page(10),
    };
    let service = Arc::new(EntityService::<Article>::new(db, config));

    let app = Router::new()
        .nest(
            ArticleController::ROUTE_PREFIX,
            ArticleController::router(service),
        )
        .layer(SessionManagerLayer::new(MemoryStore::default()).with_secure(false));

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    tracing::info!("Articles: http://0.0.0.0:3000/articles");
    axum::serve(listener, app).await?;
    Ok(())
}
