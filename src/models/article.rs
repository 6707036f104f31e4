use chrono::NaiveDateTime;
use rusqlite::{params, OptionalExtension, Params, Row};
use serde::{Deserialize, Serialize};

use crate::dates;
use crate::db::DbPool;
use crate::error::StoreResult;
use crate::models::filter::{AnalyticsFilter, ALL_CATEGORIES};

pub const TITLE_MAX: usize = 200;
pub const CATEGORY_MAX: usize = 100;
pub const SUMMARY_MAX: usize = 500;
pub const HERO_IMAGE_URL_MAX: usize = 300;

/// Columns shared by every article query; the detail columns are NULL when no detail row exists.
const SELECT_ARTICLE: &str = "SELECT a.id, a.title, a.category, a.published_at,
        d.article_id AS detail_article_id, d.summary, d.hero_image_url, d.reading_time_seconds
     FROM articles a
     LEFT JOIN article_details d ON d.article_id = a.id";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub published_at: NaiveDateTime,
    pub article_detail: Option<ArticleDetail>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDetail {
    pub article_id: i64,
    pub summary: String,
    pub hero_image_url: String,
    pub reading_time_seconds: i64,
}

/// Body of `POST /articles` and `PUT /articles/<id>`.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ArticleForm {
    pub title: String,
    pub category: String,
    #[serde(deserialize_with = "dates::deserialize_timestamp")]
    pub published_at: NaiveDateTime,
    #[serde(default)]
    pub article_detail: Option<ArticleDetailForm>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ArticleDetailForm {
    pub summary: String,
    pub hero_image_url: String,
    pub reading_time_seconds: i64,
}

impl ArticleForm {
    /// Checks required fields and the column limits before anything touches the database.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Title is required".to_string());
        }
        if self.title.chars().count() > TITLE_MAX {
            return Err(format!("Title must be at most {} characters", TITLE_MAX));
        }
        if self.category.trim().is_empty() {
            return Err("Category is required".to_string());
        }
        if self.category.chars().count() > CATEGORY_MAX {
            return Err(format!("Category must be at most {} characters", CATEGORY_MAX));
        }
        if let Some(detail) = &self.article_detail {
            if detail.summary.chars().count() > SUMMARY_MAX {
                return Err(format!("Summary must be at most {} characters", SUMMARY_MAX));
            }
            if detail.hero_image_url.chars().count() > HERO_IMAGE_URL_MAX {
                return Err(format!(
                    "Hero image URL must be at most {} characters",
                    HERO_IMAGE_URL_MAX
                ));
            }
            if detail.reading_time_seconds < 0 {
                return Err("Reading time cannot be negative".to_string());
            }
        }
        Ok(())
    }
}

impl Article {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let detail_id: Option<i64> = row.get("detail_article_id")?;
        let article_detail = match detail_id {
            Some(article_id) => Some(ArticleDetail {
                article_id,
                summary: row.get("summary")?,
                hero_image_url: row.get("hero_image_url")?,
                reading_time_seconds: row.get("reading_time_seconds")?,
            }),
            None => None,
        };
        Ok(Article {
            id: row.get("id")?,
            title: row.get("title")?,
            category: row.get("category")?,
            published_at: row.get("published_at")?,
            article_detail,
        })
    }

    fn query<P: Params>(pool: &DbPool, sql: &str, params: P) -> StoreResult<Vec<Self>> {
        let conn = pool.get()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// All articles, newest first.
    pub fn list(pool: &DbPool) -> StoreResult<Vec<Self>> {
        let sql = format!("{} ORDER BY a.published_at DESC, a.id DESC", SELECT_ARTICLE);
        Self::query(pool, &sql, [])
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> StoreResult<Option<Self>> {
        let conn = pool.get()?;
        let sql = format!("{} WHERE a.id = ?1", SELECT_ARTICLE);
        let article = conn
            .query_row(&sql, params![id], Self::from_row)
            .optional()?;
        Ok(article)
    }

    /// Point lookup used to label aggregated rows.
    pub fn title_by_id(pool: &DbPool, id: i64) -> StoreResult<Option<String>> {
        let conn = pool.get()?;
        let title = conn
            .query_row(
                "SELECT title FROM articles WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(title)
    }

    /// Title substring (case-sensitive) and exact category, both optional and ANDed.
    /// An empty category or "All Categories" leaves the category unrestricted.
    pub fn search(pool: &DbPool, term: &str, category: Option<&str>) -> StoreResult<Vec<Self>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if !term.is_empty() {
            params_vec.push(Box::new(term.to_string()));
            clauses.push("instr(a.title, ?) > 0");
        }
        if let Some(cat) = category.filter(|c| !c.is_empty() && *c != ALL_CATEGORIES) {
            params_vec.push(Box::new(cat.to_string()));
            clauses.push("a.category = ?");
        }

        let sql = with_where(&clauses);
        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();
        Self::query(pool, &sql, params_refs.as_slice())
    }

    /// Category compared case-insensitively after trimming; dates compared on the
    /// calendar day of `published_at`, inclusive, without timezone conversion.
    pub fn filtered(pool: &DbPool, filter: &AnalyticsFilter) -> StoreResult<Vec<Self>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(cat) = filter.article_category() {
            log::debug!("article filter: category = '{}'", cat);
            params_vec.push(Box::new(cat));
            clauses.push("lower(a.category) = ?");
        }
        if let Some(start) = filter.start_date {
            log::debug!("article filter: published on/after {}", start);
            params_vec.push(Box::new(start));
            clauses.push("date(a.published_at) >= ?");
        }
        if let Some(end) = filter.end_date {
            log::debug!("article filter: published on/before {}", end);
            params_vec.push(Box::new(end));
            clauses.push("date(a.published_at) <= ?");
        }

        let sql = with_where(&clauses);
        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();
        let articles = Self::query(pool, &sql, params_refs.as_slice())?;
        log::debug!("article filter matched {} article(s)", articles.len());
        Ok(articles)
    }

    /// Distinct categories in use, for the dashboard picker.
    pub fn categories(pool: &DbPool) -> StoreResult<Vec<String>> {
        let conn = pool.get()?;
        let mut stmt = conn.prepare("SELECT DISTINCT category FROM articles ORDER BY category")?;
        let rows = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
    }

    /// Inserts the article and its optional detail in one transaction.
    pub fn create(pool: &DbPool, form: &ArticleForm) -> StoreResult<Self> {
        let mut conn = pool.get()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO articles (title, category, published_at) VALUES (?1, ?2, ?3)",
            params![form.title, form.category, form.published_at],
        )?;
        let id = tx.last_insert_rowid();

        let article_detail = match &form.article_detail {
            Some(detail) => {
                tx.execute(
                    "INSERT INTO article_details (article_id, summary, hero_image_url, reading_time_seconds)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![id, detail.summary, detail.hero_image_url, detail.reading_time_seconds],
                )?;
                Some(ArticleDetail {
                    article_id: id,
                    summary: detail.summary.clone(),
                    hero_image_url: detail.hero_image_url.clone(),
                    reading_time_seconds: detail.reading_time_seconds,
                })
            }
            None => None,
        };

        tx.commit()?;

        Ok(Article {
            id,
            title: form.title.clone(),
            category: form.category.clone(),
            published_at: form.published_at,
            article_detail,
        })
    }

    /// Overwrites the article fields and upserts the detail row when one is supplied.
    /// Returns `None` when no article has this id.
    pub fn update(pool: &DbPool, id: i64, form: &ArticleForm) -> StoreResult<Option<Self>> {
        {
            let mut conn = pool.get()?;
            let tx = conn.transaction()?;

            let changed = tx.execute(
                "UPDATE articles SET title = ?1, category = ?2, published_at = ?3 WHERE id = ?4",
                params![form.title, form.category, form.published_at, id],
            )?;
            if changed == 0 {
                return Ok(None);
            }

            if let Some(detail) = &form.article_detail {
                tx.execute(
                    "INSERT INTO article_details (article_id, summary, hero_image_url, reading_time_seconds)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(article_id) DO UPDATE SET
                        summary = excluded.summary,
                        hero_image_url = excluded.hero_image_url,
                        reading_time_seconds = excluded.reading_time_seconds",
                    params![id, detail.summary, detail.hero_image_url, detail.reading_time_seconds],
                )?;
            }

            tx.commit()?;
        }

        Self::find_by_id(pool, id)
    }

    /// Removes the article; details and pageviews go with it. `false` when nothing matched.
    pub fn delete(pool: &DbPool, id: i64) -> StoreResult<bool> {
        let conn = pool.get()?;
        let removed = conn.execute("DELETE FROM articles WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }
}

fn with_where(clauses: &[&str]) -> String {
    let mut sql = SELECT_ARTICLE.to_string();
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY a.published_at DESC, a.id DESC");
    sql
}
