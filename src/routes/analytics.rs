use chrono::NaiveDateTime;
use rocket::response::status::NoContent;
use rocket::serde::json::Json;
use rocket::State;

use crate::config::Zone;
use crate::dates;
use crate::db::DbPool;
use crate::error::{ApiError, ApiResult};
use crate::models::analytics::{Analytics, DailyViews, Summary, TopArticle};
use crate::models::filter::AnalyticsFilter;
use crate::models::pageview::{Pageview, PageviewForm};

use super::JsonBody;

// ── Aggregations ───────────────────────────────────────

#[post("/summary", data = "<filter>")]
pub fn summary(
    pool: &State<DbPool>,
    zone: &State<Zone>,
    filter: JsonBody<'_, AnalyticsFilter>,
) -> ApiResult<Json<Summary>> {
    let summary = Analytics::summary(pool, &*filter?, zone.0)
        .map_err(ApiError::failed("Failed to retrieve analytics summary. Please try again."))?;
    Ok(Json(summary))
}

#[post("/daily-views", data = "<filter>")]
pub fn daily_views(
    pool: &State<DbPool>,
    zone: &State<Zone>,
    filter: JsonBody<'_, AnalyticsFilter>,
) -> ApiResult<Json<Vec<DailyViews>>> {
    let days = Analytics::daily_views(pool, &*filter?, zone.0)
        .map_err(ApiError::failed("Failed to retrieve daily views. Please try again."))?;
    Ok(Json(days))
}

#[post("/top-articles", data = "<filter>")]
pub fn top_articles(
    pool: &State<DbPool>,
    zone: &State<Zone>,
    filter: JsonBody<'_, AnalyticsFilter>,
) -> ApiResult<Json<Vec<TopArticle>>> {
    let top = Analytics::top_articles(pool, &*filter?, zone.0)
        .map_err(ApiError::failed("Failed to retrieve top articles. Please try again."))?;
    Ok(Json(top))
}

#[post("/recent-pageviews", data = "<filter>")]
pub fn recent_pageviews(
    pool: &State<DbPool>,
    zone: &State<Zone>,
    filter: JsonBody<'_, AnalyticsFilter>,
) -> ApiResult<Json<Vec<Pageview>>> {
    let rows = Analytics::recent_pageviews(pool, &*filter?, zone.0)
        .map_err(ApiError::failed("Failed to retrieve recent pageviews. Please try again."))?;
    Ok(Json(rows))
}

#[post("/filtered-pageviews", data = "<filter>")]
pub fn filtered_pageviews(
    pool: &State<DbPool>,
    zone: &State<Zone>,
    filter: JsonBody<'_, AnalyticsFilter>,
) -> ApiResult<Json<Vec<Pageview>>> {
    let rows = Pageview::filtered(pool, &*filter?, zone.0)
        .map_err(ApiError::failed("Failed to retrieve filtered pageviews. Please try again."))?;
    Ok(Json(rows))
}

// ── Pageview events ────────────────────────────────────

#[post("/pageviews", format = "json", data = "<form>")]
pub fn create_pageview(
    pool: &State<DbPool>,
    form: JsonBody<'_, PageviewForm>,
) -> ApiResult<Json<Pageview>> {
    let form = form?;
    form.validate().map_err(ApiError::Validation)?;
    let pageview = Pageview::create(pool, &form)
        .map_err(ApiError::failed("Failed to add pageview. Please try again."))?;
    Ok(Json(pageview))
}

#[get("/pageviews/<id>")]
pub fn get_pageview(pool: &State<DbPool>, id: i64) -> ApiResult<Json<Pageview>> {
    Pageview::find_by_id(pool, id)
        .map_err(ApiError::failed("Failed to retrieve pageview. Please try again."))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found_with(format!("Pageview with ID {} not found", id)))
}

#[delete("/pageviews/<id>")]
pub fn delete_pageview(pool: &State<DbPool>, id: i64) -> ApiResult<NoContent> {
    let removed = Pageview::delete(pool, id)
        .map_err(ApiError::failed("Failed to delete pageview. Please try again."))?;
    if !removed {
        log::info!("Pageview {} not found for deletion", id);
        return Err(ApiError::not_found_with(format!("Pageview with ID {} not found", id)));
    }
    Ok(NoContent)
}

#[get("/pageviews/article/<article_id>")]
pub fn article_pageviews(pool: &State<DbPool>, article_id: i64) -> ApiResult<Json<Vec<Pageview>>> {
    let rows = Pageview::for_article(pool, article_id)
        .map_err(ApiError::failed("Failed to retrieve pageviews. Please try again."))?;
    Ok(Json(rows))
}

/// `from`/`to` take a timestamp or a bare date; a bare `to` date covers its whole day.
#[get("/pageviews/range?<from>&<to>")]
pub fn range_pageviews(pool: &State<DbPool>, from: &str, to: &str) -> ApiResult<Json<Vec<Pageview>>> {
    let from = range_bound(from, false)?;
    let to = range_bound(to, true)?;
    let rows = Pageview::in_range(pool, from, to)
        .map_err(ApiError::failed("Failed to retrieve pageviews. Please try again."))?;
    Ok(Json(rows))
}

fn range_bound(raw: &str, end: bool) -> ApiResult<NaiveDateTime> {
    if let Ok(day) = chrono::NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
        return Ok(if end { dates::end_of_day(day) } else { dates::start_of_day(day) });
    }
    dates::parse_timestamp(raw)
        .ok_or_else(|| ApiError::Validation(format!("Invalid timestamp: '{}'", raw)))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        summary,
        daily_views,
        top_articles,
        recent_pageviews,
        filtered_pageviews,
        create_pageview,
        get_pageview,
        delete_pageview,
        article_pageviews,
        range_pageviews,
    ]
}
