//! # CRUD Controller
//!
//! Implement [`CrudController`] for a marker type and nest its router:
//!
//! ```rust,ignore
//! struct ArticleController;
//!
//! impl CrudController for ArticleController {
//!     type Resource = Article;
//!     const ROUTE_PREFIX: &'static str = "/articles";
//! }
//!
//! let service = Arc::new(EntityService::<Article>::new(db, CrudConfig::default()));
//! let app = Router::new()
//!     .nest(ArticleController::ROUTE_PREFIX, ArticleController::router(service))
//!     .layer(SessionManagerLayer::new(MemoryStore::default()));
//! ```
//!
//! | Method + path                        | Action                     |
//! |--------------------------------------|----------------------------|
//! | `GET /`                              | index                      |
//! | `GET /paginated`                     | paginated index            |
//! | `GET /new`                           | blank form                 |
//! | `POST /`                             | create                     |
//! | `GET /{id}`                          | show                       |
//! | `GET /{id}/edit`                     | edit form                  |
//! | `PUT /{id}`, `POST /{id}`            | update                     |
//! | `DELETE /{id}`, `POST /{id}/delete`  | delete                     |
//! | `POST /filters/reset`                | forget filters and sorting |
//!
//! Views are JSON documents; every view carries the pending flash messages. Successful
//! writes answer `303 See Other` (post/redirect/get), rejected forms answer `422` with the
//! submitted values and the errors.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{
    errors::CrudError,
    filtering::calculate_content_range,
    options::Filters,
    request::RequestValues,
    resource::CrudResource,
    service::{EntityService, Listing, SaveOutcome},
    session::{FlashKind, FlashMessage, SessionBag},
    validation::ValidationErrors,
};

type SharedService<C> = Arc<EntityService<<C as CrudController>::Resource>>;
type ModelOf<C> = <<C as CrudController>::Resource as CrudResource>::Model;

#[derive(Debug, Serialize)]
pub struct IndexView<M> {
    #[serde(flatten)]
    pub listing: Listing<M>,
    pub flashes: Vec<FlashMessage>,
}

#[derive(Debug, Serialize)]
pub struct ShowView<M> {
    pub entity: M,
    pub flashes: Vec<FlashMessage>,
}

#[derive(Debug, Serialize)]
pub struct FormView<M> {
    /// `None` for a new entity
    pub entity: Option<M>,
    /// Values shown in the form fields
    pub values: Value,
    pub errors: ValidationErrors,
    /// `POST` to create, `PUT` to update
    pub method: &'static str,
    pub action: String,
    pub flashes: Vec<FlashMessage>,
}

pub trait CrudController: Send + Sync + Sized + 'static {
    type Resource: CrudResource;

    /// Where the router is nested, used to build redirect targets.
    const ROUTE_PREFIX: &'static str;

    #[must_use]
    fn saved_message(id: &str) -> String {
        format!("The entity with ID '{id}' has been saved.")
    }

    #[must_use]
    fn deleted_message(id: &str) -> String {
        format!("The entity with ID '{id}' has been deleted.")
    }

    #[must_use]
    fn form_error_message() -> String {
        "There are one or more errors inside of the entity's form.".to_string()
    }

    #[must_use]
    fn delete_error_message(id: &str) -> String {
        format!("Unable to delete the entity with ID '{id}'.")
    }

    #[must_use]
    fn not_found_message(id: &str) -> String {
        format!("The entity with ID '{id}' does not exist.")
    }

    #[must_use]
    fn index_url() -> String {
        if Self::ROUTE_PREFIX.is_empty() {
            "/".to_string()
        } else {
            Self::ROUTE_PREFIX.to_string()
        }
    }

    #[must_use]
    fn show_url(id: &str) -> String {
        format!("{}/{id}", Self::ROUTE_PREFIX.trim_end_matches('/'))
    }

    /// Extra filters forced on every listing.
    #[must_use]
    fn listing_filters() -> Filters {
        Filters::new()
    }

    fn router(service: Arc<EntityService<Self::Resource>>) -> Router {
        Router::new()
            .route("/", get(index::<Self>).post(create::<Self>))
            .route("/paginated", get(index_paginated::<Self>))
            .route("/new", get(new_form::<Self>))
            .route("/filters/reset", post(reset_filters::<Self>))
            .route(
                "/{id}",
                get(show::<Self>)
                    .put(update::<Self>)
                    .post(update::<Self>)
                    .delete(delete::<Self>),
            )
            .route("/{id}/edit", get(edit::<Self>))
            .route("/{id}/delete", post(delete::<Self>))
            .with_state(service)
    }
}

/// Pending flashes, drained from the bag which is then saved.
async fn drain_flashes(
    session: &Session,
    bag: &mut SessionBag,
) -> Result<Vec<FlashMessage>, CrudError> {
    let flashes = bag.take_flashes();
    bag.save(session).await?;
    Ok(flashes)
}

async fn redirect_with_flash(
    session: &Session,
    mut bag: SessionBag,
    kind: FlashKind,
    message: String,
    to: &str,
) -> Result<Response, CrudError> {
    bag.add_flash(kind, message);
    bag.save(session).await?;
    Ok(Redirect::to(to).into_response())
}

async fn redirect_on_not_found<C: CrudController>(
    session: &Session,
    bag: SessionBag,
    id: &str,
) -> Result<Response, CrudError> {
    tracing::debug!(
        resource = <C::Resource as CrudResource>::ENTITY_NAME,
        id,
        "Entity not found"
    );
    redirect_with_flash(
        session,
        bag,
        FlashKind::Warning,
        C::not_found_message(id),
        &C::index_url(),
    )
    .await
}

/// Load the entity behind a path id; malformed ids count as missing.
async fn load<C: CrudController>(
    service: &SharedService<C>,
    id: &str,
) -> Result<Option<ModelOf<C>>, CrudError> {
    match Uuid::parse_str(id) {
        Ok(uuid) => service.find_entity(uuid).await,
        Err(_) => Ok(None),
    }
}

async fn listing<C: CrudController>(
    service: &SharedService<C>,
    session: &Session,
    request: &RequestValues,
    paginate: bool,
) -> Result<IndexView<ModelOf<C>>, CrudError> {
    let mut bag = SessionBag::load(session).await?;
    let listing = service
        .find_entities(request, &mut bag, &C::listing_filters(), paginate)
        .await?;
    let flashes = drain_flashes(session, &mut bag).await?;
    Ok(IndexView { listing, flashes })
}

async fn index<C: CrudController>(
    State(service): State<SharedService<C>>,
    session: Session,
    request: RequestValues,
) -> Result<Response, CrudError> {
    let view = listing::<C>(&service, &session, &request, false).await?;
    Ok(Json(view).into_response())
}

async fn index_paginated<C: CrudController>(
    State(service): State<SharedService<C>>,
    session: Session,
    request: RequestValues,
) -> Result<Response, CrudError> {
    let view = listing::<C>(&service, &session, &request, true).await?;
    let per_page = view.listing.options.elements_per_page.unwrap_or(1);
    let offset = per_page.saturating_mul(view.listing.options.page.saturating_sub(1));
    let headers = calculate_content_range(
        offset,
        per_page,
        view.listing.total_count.unwrap_or_default(),
        <C::Resource as CrudResource>::ENTITY_NAME,
    );
    Ok((headers, Json(view)).into_response())
}

async fn new_form<C: CrudController>(session: Session) -> Result<Response, CrudError> {
    let mut bag = SessionBag::load(&session).await?;
    let values = serde_json::to_value(<C::Resource as CrudResource>::Form::default())
        .map_err(|err| CrudError::internal("Unable to render the form", Some(err.to_string())))?;
    let view = FormView::<ModelOf<C>> {
        entity: None,
        values,
        errors: ValidationErrors::new(),
        method: "POST",
        action: C::index_url(),
        flashes: drain_flashes(&session, &mut bag).await?,
    };
    Ok(Json(view).into_response())
}

async fn rejected_form<C: CrudController>(
    session: &Session,
    mut bag: SessionBag,
    request: &RequestValues,
    entity: Option<ModelOf<C>>,
    outcome: &SaveOutcome<ModelOf<C>>,
) -> Result<Response, CrudError> {
    bag.add_flash(FlashKind::Error, C::form_error_message());
    let (method, action) = match &entity {
        Some(model) => {
            let id = <C::Resource as CrudResource>::id(model).to_string();
            ("PUT", C::show_url(&id))
        }
        None => ("POST", C::index_url()),
    };
    let view = FormView {
        entity,
        values: Value::Object(
            request
                .body()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ),
        errors: outcome.errors().cloned().unwrap_or_default(),
        method,
        action,
        flashes: drain_flashes(session, &mut bag).await?,
    };
    Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(view)).into_response())
}

async fn create<C: CrudController>(
    State(service): State<SharedService<C>>,
    session: Session,
    request: RequestValues,
) -> Result<Response, CrudError> {
    let bag = SessionBag::load(&session).await?;
    let blank = <C::Resource as CrudResource>::new_entity();

    let outcome = service.create_entity(&request, blank).await;
    match outcome {
        SaveOutcome::Saved(model) => {
            let id = <C::Resource as CrudResource>::id(&model).to_string();
            let message = C::saved_message(&id);
            redirect_with_flash(&session, bag, FlashKind::Notice, message, &C::index_url()).await
        }
        rejected => rejected_form::<C>(&session, bag, &request, None, &rejected).await,
    }
}

async fn show<C: CrudController>(
    State(service): State<SharedService<C>>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, CrudError> {
    let mut bag = SessionBag::load(&session).await?;
    let Some(entity) = load::<C>(&service, &id).await? else {
        return redirect_on_not_found::<C>(&session, bag, &id).await;
    };
    let view = ShowView {
        entity,
        flashes: drain_flashes(&session, &mut bag).await?,
    };
    Ok(Json(view).into_response())
}

async fn edit<C: CrudController>(
    State(service): State<SharedService<C>>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, CrudError> {
    let mut bag = SessionBag::load(&session).await?;
    let Some(entity) = load::<C>(&service, &id).await? else {
        return redirect_on_not_found::<C>(&session, bag, &id).await;
    };
    let values = serde_json::to_value(&entity)
        .map_err(|err| CrudError::internal("Unable to render the form", Some(err.to_string())))?;
    let view = FormView {
        entity: Some(entity),
        values,
        errors: ValidationErrors::new(),
        method: "PUT",
        action: C::show_url(&id),
        flashes: drain_flashes(&session, &mut bag).await?,
    };
    Ok(Json(view).into_response())
}

async fn update<C: CrudController>(
    State(service): State<SharedService<C>>,
    session: Session,
    Path(id): Path<String>,
    request: RequestValues,
) -> Result<Response, CrudError> {
    let bag = SessionBag::load(&session).await?;
    let Some(entity) = load::<C>(&service, &id).await? else {
        return redirect_on_not_found::<C>(&session, bag, &id).await;
    };

    let outcome = service.update_entity(&request, entity.clone()).await;
    match outcome {
        SaveOutcome::Saved(_) => {
            let message = C::saved_message(&id);
            redirect_with_flash(&session, bag, FlashKind::Notice, message, &C::show_url(&id)).await
        }
        rejected => rejected_form::<C>(&session, bag, &request, Some(entity), &rejected).await,
    }
}

async fn delete<C: CrudController>(
    State(service): State<SharedService<C>>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, CrudError> {
    let bag = SessionBag::load(&session).await?;
    let Some(entity) = load::<C>(&service, &id).await? else {
        return redirect_on_not_found::<C>(&session, bag, &id).await;
    };

    if service.remove_entity(<C::Resource as CrudResource>::id(&entity)).await {
        let message = C::deleted_message(&id);
        redirect_with_flash(&session, bag, FlashKind::Notice, message, &C::index_url()).await
    } else {
        let message = C::delete_error_message(&id);
        redirect_with_flash(&session, bag, FlashKind::Error, message, &C::show_url(&id)).await
    }
}

async fn reset_filters<C: CrudController>(
    State(service): State<SharedService<C>>,
    session: Session,
) -> Result<Response, CrudError> {
    let mut bag = SessionBag::load(&session).await?;
    service.remove_filters_and_sorting(&mut bag);
    bag.save(&session).await?;
    Ok(Redirect::to(&C::index_url()).into_response())
}
