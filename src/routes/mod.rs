pub mod analytics;
pub mod articles;
pub mod health;

use rocket::serde::json::{self, Json};

/// JSON body guard that hands parse failures to the handler, which turns them
/// into a 400 through `?`.
pub type JsonBody<'r, T> = Result<Json<T>, json::Error<'r>>;

pub const API_BASE: &str = "/api/v1";
pub const ARTICLES_BASE: &str = "/api/v1/articles";
pub const ANALYTICS_BASE: &str = "/api/v1/analytics";
