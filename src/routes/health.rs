use rocket::serde::json::Json;
use rocket::State;
use serde::Serialize;

use crate::config::AppConfig;
use crate::db::{self, DbPool, TableCounts};
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub timezone: String,
    pub tables: TableCounts,
}

#[get("/health")]
pub fn health(pool: &State<DbPool>, config: &State<AppConfig>) -> ApiResult<Json<HealthReport>> {
    let tables = db::counts(pool)
        .map_err(ApiError::failed("Database is unavailable. Please try again."))?;
    Ok(Json(HealthReport {
        status: "ok",
        timezone: config.timezone.clone(),
        tables,
    }))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![health]
}
