//! # Error Handling
//!
//! `CrudError` covers the failure modes of the CRUD pipeline:
//!
//! - **Caller bugs** (`InvalidOptions`, `InvalidPagination`): malformed options handed to a
//!   repository. They fail fast and surface as 500s.
//! - **Expected conditions** (`NotFound`, `ValidationFailed`, `BadRequest`): recovered by the
//!   controller with a redirect or a re-rendered form.
//! - **Infrastructure faults** (`Database`, `Session`, `Internal`): details are logged with
//!   `tracing`, never sent to the client.
//!
//! ```rust,ignore
//! use crudkit::CrudError;
//!
//! async fn handler(service: &EntityService<Article>, id: Uuid) -> Result<Json<Model>, CrudError> {
//!     let article = service.get_entity(id).await?; // NotFound becomes a 404
//!     Ok(Json(article))
//! }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use std::fmt;

use crate::validation::ValidationErrors;

/// Error type shared by resolvers, repositories, services and controllers.
#[derive(Debug)]
pub enum CrudError {
    /// Options with a missing required key or a wrongly typed value
    InvalidOptions {
        /// What was wrong with the options
        message: String,
    },

    /// Page or elements-per-page that are not positive integers
    InvalidPagination {
        /// What was wrong with the pagination values
        message: String,
    },

    /// 404 Not Found - no entity matches the id or filters
    NotFound {
        /// Entity name (e.g., "article")
        resource: String,
        /// Optional id that wasn't found
        id: Option<String>,
    },

    /// 400 Bad Request - the request body could not be read
    BadRequest {
        /// User-facing error message
        message: String,
    },

    /// 422 Unprocessable Entity - form binding rejected the input
    ValidationFailed {
        /// Field-level errors
        errors: ValidationErrors,
    },

    /// 500 Internal Server Error - database error (details logged, not exposed)
    Database {
        /// Internal error (logged, not sent to user)
        internal: DbErr,
    },

    /// 500 Internal Server Error - the session store could not be read or written
    Session {
        /// Internal error details (logged, not sent to user)
        internal: String,
    },

    /// 500 Internal Server Error - generic internal error
    Internal {
        /// User-facing generic message
        message: String,
        /// Internal error details (logged, not sent to user)
        internal: Option<String>,
    },
}

impl CrudError {
    pub fn invalid_options(message: impl Into<String>) -> Self {
        Self::InvalidOptions {
            message: message.into(),
        }
    }

    pub fn invalid_pagination(message: impl Into<String>) -> Self {
        Self::InvalidPagination {
            message: message.into(),
        }
    }

    /// Create a 404 Not Found error
    ///
    /// # Example
    /// ```rust,ignore
    /// return Err(CrudError::not_found("article", Some(id.to_string())));
    /// ```
    pub fn not_found(resource: impl Into<String>, id: Option<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn validation_failed(errors: ValidationErrors) -> Self {
        Self::ValidationFailed { errors }
    }

    /// Wrap a database error; the details are logged but never sent to the user.
    #[must_use]
    pub fn database(err: DbErr) -> Self {
        Self::Database { internal: err }
    }

    pub fn session(internal: impl fmt::Display) -> Self {
        Self::Session {
            internal: internal.to_string(),
        }
    }

    pub fn internal(message: impl Into<String>, internal: Option<String>) -> Self {
        Self::Internal {
            message: message.into(),
            internal,
        }
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::ValidationFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidOptions { .. }
            | Self::InvalidPagination { .. }
            | Self::Database { .. }
            | Self::Session { .. }
            | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the user-facing error message (sanitized)
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidOptions { message } => format!("Invalid options: {message}"),
            Self::InvalidPagination { message } => format!("Invalid pagination: {message}"),
            Self::NotFound { resource, id } => match id {
                Some(id) => format!("{resource} with ID '{id}' not found"),
                None => format!("{resource} not found"),
            },
            Self::BadRequest { message } => message.clone(),
            Self::ValidationFailed { errors } => {
                let messages: Vec<String> = errors.errors().iter().map(ToString::to_string).collect();
                if messages.len() == 1 {
                    messages[0].clone()
                } else {
                    format!("Validation failed: {}", messages.join(", "))
                }
            }
            Self::Database { .. } => "A database error occurred".to_string(),
            Self::Session { .. } => "A session error occurred".to_string(),
            Self::Internal { message, .. } => message.clone(),
        }
    }

    fn log_internal(&self) {
        match self {
            Self::Database { internal } => {
                tracing::error!(error = ?internal, "Database error occurred");
            }
            Self::Session { internal } => {
                tracing::error!(details = %internal, "Session error occurred");
            }
            Self::Internal {
                internal: Some(details),
                ..
            } => {
                tracing::error!(details = %details, "Internal error occurred");
            }
            Self::InvalidOptions { message } | Self::InvalidPagination { message } => {
                tracing::error!(details = %message, "Repository called with invalid options");
            }
            _ => {
                tracing::debug!(
                    error = %self.user_message(),
                    status = %self.status_code(),
                    "CRUD error"
                );
            }
        }
    }
}

/// Error response sent to users (sanitized)
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<String>>,
}

impl IntoResponse for CrudError {
    fn into_response(self) -> Response {
        self.log_internal();

        let status = self.status_code();
        let response = match &self {
            Self::ValidationFailed { errors } => ErrorResponse {
                error: "Validation failed".to_string(),
                details: Some(errors.errors().iter().map(ToString::to_string).collect()),
            },
            _ => ErrorResponse {
                error: self.user_message(),
                details: None,
            },
        };

        (status, Json(response)).into_response()
    }
}

impl fmt::Display for CrudError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for CrudError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Database { internal } => Some(internal),
            _ => None,
        }
    }
}

/// `DbErr::RecordNotFound` maps to `NotFound`, every other database error to `Database`.
impl From<DbErr> for CrudError {
    fn from(err: DbErr) -> Self {
        match &err {
            DbErr::RecordNotFound(msg) => {
                let resource = msg.split_whitespace().next().unwrap_or("Resource");
                Self::NotFound {
                    resource: resource.to_string(),
                    id: None,
                }
            }
            _ => Self::Database { internal: err },
        }
    }
}

impl From<tower_sessions::session::Error> for CrudError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::session(err)
    }
}

impl From<ValidationErrors> for CrudError {
    fn from(errors: ValidationErrors) -> Self {
        Self::ValidationFailed { errors }
    }
}
