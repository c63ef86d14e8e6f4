//! # crudkit
//!
//! Generic building blocks for CRUD back-offices on Axum and Sea-ORM.
//!
//! A resource is described once with [`CrudResource`] (entity, form, filterable and
//! sortable fields, custom filter handlers). From that description the crate derives:
//!
//! - an [`OptionsResolver`] validating listing options,
//! - a [`Repository`] turning options into filtered, sorted and paginated queries,
//! - a [`SessionBridge`] remembering each user's filters and sorting,
//! - an [`EntityService`] for lookups, listings and form-driven writes,
//! - a [`CrudController`] router with index, show, form and delete routes.
//!
//! ```rust,ignore
//! let service = Arc::new(EntityService::<Article>::new(db, CrudConfig::default()));
//! let app = Router::new()
//!     .nest("/articles", ArticleController::router(service))
//!     .layer(SessionManagerLayer::new(MemoryStore::default()));
//! ```

pub mod bridge;
pub mod config;
pub mod controller;
pub mod errors;
pub mod filtering;
pub mod form;
pub mod options;
pub mod repository;
pub mod request;
pub mod resource;
pub mod service;
pub mod session;
pub mod slug;
pub mod validation;

#[cfg(test)]
pub(crate) mod fixtures;

pub use bridge::SessionBridge;
pub use config::CrudConfig;
pub use controller::CrudController;
pub use errors::CrudError;
pub use filtering::{FilterHandler, HandlerRegistry, SortHandler};
pub use form::EntityForm;
pub use options::{Filters, Options, OptionsResolver, SortOrder, Sorting};
pub use repository::{Page, Repository};
pub use request::RequestValues;
pub use resource::CrudResource;
pub use serde_with;
pub use service::{EntityService, Listing, SaveOutcome};
pub use session::{FlashKind, FlashMessage, SessionBag};
pub use slug::slugify;
pub use validation::{Validatable, ValidationError, ValidationErrors};
