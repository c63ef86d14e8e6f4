use crudkit::{
    CrudController, CrudResource, EntityForm, HandlerRegistry, SortOrder, Validatable,
    ValidationErrors, filtering::is_blank, slugify, validation::validators,
};
use sea_orm::{ActiveValue::Set, QueryFilter, entity::prelude::*};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "articles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub status: String,
    pub views: i32,
    #[sea_orm(column_type = "Text")]
    pub body: String,
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
    pub body: String,
}

impl Validatable for ArticleForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(validators::validate_required("title", &self.title));
        errors.check(validators::validate_length("title", &self.title, None, Some(80)));
        errors.check(validators::validate_range("views", self.views, Some(0), None));
        errors.result()
    }
}

impl EntityForm<ActiveModel> for ArticleForm {
    fn bind(self, mut active: ActiveModel) -> ActiveModel {
        active.slug = Set(slugify(&self.title, "-").unwrap_or_default());
        active.title = Set(self.title);
        active.status = Set(if self.status.is_empty() {
            "draft".to_string()
        } else {
            self.status
        });
        active.views = Set(self.views);
        active.body = Set(self.body);
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
        vec!["id", "title", "slug", "status", "views"]
    }

    fn sortable_fields() -> Vec<&'static str> {
        vec!["title", "status", "views"]
    }

    fn default_sorting() -> Vec<(&'static str, SortOrder)> {
        vec![("views", SortOrder::Asc)]
    }

    fn register_handlers(handlers: &mut HandlerRegistry<Entity>) {
        handlers.filter("search", |select, value| match value.as_str() {
            Some(term) if !is_blank(value) => select.filter(Column::Title.contains(term.trim())),
            _ => select,
        });
    }
}

pub struct ArticleController;

impl CrudController for ArticleController {
    type Resource = Article;
    const ROUTE_PREFIX: &'static str = "/articles";
}
