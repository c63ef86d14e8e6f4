//! Entity shared by the unit tests.

use sea_orm::ActiveValue::Set;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    form::EntityForm,
    resource::CrudResource,
    validation::{Validatable, ValidationErrors, validators},
};

pub mod post {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "posts")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub title: String,
        pub views: i32,
        pub published: bool,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostForm {
    pub title: String,
    pub views: i32,
    pub published: bool,
}

impl Validatable for PostForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(validators::validate_required("title", &self.title));
        errors.check(validators::validate_range("views", self.views, Some(0), None));
        errors.result()
    }
}

impl EntityForm<post::ActiveModel> for PostForm {
    fn bind(self, mut active: post::ActiveModel) -> post::ActiveModel {
        active.title = Set(self.title);
        active.views = Set(self.views);
        active.published = Set(self.published);
        active
    }
}

pub struct Posts;

impl CrudResource for Posts {
    type Entity = post::Entity;
    type Model = post::Model;
    type ActiveModel = post::ActiveModel;
    type Form = PostForm;

    const ENTITY_NAME: &'static str = "post";

    fn id(model: &post::Model) -> Uuid {
        model.id
    }

    fn filterable_fields() -> Vec<&'static str> {
        vec!["id", "title", "views", "published"]
    }

    fn sortable_fields() -> Vec<&'static str> {
        vec!["id", "title", "views"]
    }
}
