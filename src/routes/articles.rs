use rocket::response::status::{Created, NoContent};
use rocket::serde::json::Json;
use rocket::State;

use crate::db::DbPool;
use crate::error::{ApiError, ApiResult};
use crate::models::article::{Article, ArticleForm};
use crate::models::filter::{AnalyticsFilter, FilterParams};

use super::{JsonBody, ARTICLES_BASE};

#[derive(Debug, FromForm)]
pub struct SearchParams {
    #[field(name = "searchTerm")]
    pub search_term: Option<String>,
    pub category: Option<String>,
}

#[get("/")]
pub fn list(pool: &State<DbPool>) -> ApiResult<Json<Vec<Article>>> {
    let articles = Article::list(pool)
        .map_err(ApiError::failed("Failed to retrieve articles. Please try again."))?;
    Ok(Json(articles))
}

#[get("/<id>")]
pub fn get(pool: &State<DbPool>, id: i64) -> ApiResult<Json<Article>> {
    Article::find_by_id(pool, id)
        .map_err(ApiError::failed("Failed to retrieve article. Please try again."))?
        .map(Json)
        .ok_or(ApiError::NotFound(None))
}

#[get("/search?<params..>")]
pub fn search(pool: &State<DbPool>, params: SearchParams) -> ApiResult<Json<Vec<Article>>> {
    let term = params.search_term.unwrap_or_default();
    let articles = Article::search(pool, &term, params.category.as_deref())
        .map_err(ApiError::failed("Failed to search articles. Please try again."))?;
    Ok(Json(articles))
}

#[get("/filtered?<params..>")]
pub fn filtered(pool: &State<DbPool>, params: FilterParams) -> ApiResult<Json<Vec<Article>>> {
    let filter = AnalyticsFilter::try_from(params)?;
    let articles = Article::filtered(pool, &filter)
        .map_err(ApiError::failed("Failed to retrieve filtered articles. Please try again."))?;
    Ok(Json(articles))
}

#[get("/categories")]
pub fn categories(pool: &State<DbPool>) -> ApiResult<Json<Vec<String>>> {
    let categories = Article::categories(pool)
        .map_err(ApiError::failed("Failed to retrieve categories. Please try again."))?;
    Ok(Json(categories))
}

#[post("/", format = "json", data = "<form>")]
pub fn create(
    pool: &State<DbPool>,
    form: JsonBody<'_, ArticleForm>,
) -> ApiResult<Created<Json<Article>>> {
    let form = form?;
    form.validate().map_err(ApiError::Validation)?;
    let article = Article::create(pool, &form)
        .map_err(ApiError::failed("Failed to create article. Please try again."))?;
    log::info!("Created article {} ('{}')", article.id, article.title);
    let location = format!("{}/{}", ARTICLES_BASE, article.id);
    Ok(Created::new(location).body(Json(article)))
}

#[put("/<id>", format = "json", data = "<form>")]
pub fn update(
    pool: &State<DbPool>,
    id: i64,
    form: JsonBody<'_, ArticleForm>,
) -> ApiResult<Json<Article>> {
    let form = form?;
    form.validate().map_err(ApiError::Validation)?;
    Article::update(pool, id, &form)
        .map_err(ApiError::failed("Failed to update article. Please try again."))?
        .map(Json)
        .ok_or(ApiError::NotFound(None))
}

#[delete("/<id>")]
pub fn delete(pool: &State<DbPool>, id: i64) -> ApiResult<NoContent> {
    let removed = Article::delete(pool, id)
        .map_err(ApiError::failed("Failed to delete article. Please try again."))?;
    if !removed {
        return Err(ApiError::NotFound(None));
    }
    log::info!("Deleted article {}", id);
    Ok(NoContent)
}

pub fn routes() -> Vec<rocket::Route> {
    routes![list, get, search, filtered, categories, create, update, delete]
}
