use rocket::http::Status;
use rocket::response::{self, Responder, Response};
use rocket::serde::json::Json;
use rocket::Request;
use serde_json::json;

/// Failure talking to SQLite, either checking out a connection or running a statement.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("connection pool: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("query: {0}")]
    Query(#[from] rusqlite::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Everything a handler can fail with. Converted into an HTTP response at the route edge.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found")]
    NotFound(Option<String>),
    #[error("{0}")]
    Validation(String),
    #[error("{message}")]
    Failed {
        message: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ApiError {
    /// Wraps a storage error behind a client-safe message, logging the real cause.
    ///
    /// Meant for `map_err`: `Article::list(pool).map_err(ApiError::failed("..."))`.
    pub fn failed(message: &'static str) -> impl FnOnce(StoreError) -> ApiError {
        move |source| {
            log::error!("{} (cause: {})", message, source);
            ApiError::Failed { message, source }
        }
    }

    pub fn not_found_with(message: impl Into<String>) -> Self {
        ApiError::NotFound(Some(message.into()))
    }
}

/// A JSON body that failed to parse or is missing required fields.
impl From<rocket::serde::json::Error<'_>> for ApiError {
    fn from(err: rocket::serde::json::Error<'_>) -> Self {
        log::info!("Rejected request body: {}", err);
        ApiError::Validation(format!("Invalid request body: {}", err))
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        match self {
            ApiError::NotFound(None) => Response::build().status(Status::NotFound).ok(),
            ApiError::NotFound(Some(msg)) => {
                (Status::NotFound, Json(json!({ "error": msg }))).respond_to(req)
            }
            ApiError::Validation(msg) => {
                (Status::BadRequest, Json(json!({ "error": msg }))).respond_to(req)
            }
            ApiError::Failed { message, .. } => {
                (Status::BadRequest, Json(json!({ "error": message }))).respond_to(req)
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
