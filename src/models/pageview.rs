use chrono::NaiveDateTime;
use chrono_tz::Tz;
use rusqlite::{params, OptionalExtension, Params, Row};
use serde::{Deserialize, Serialize};

use crate::dates;
use crate::db::DbPool;
use crate::error::StoreResult;
use crate::models::article::Article;
use crate::models::filter::AnalyticsFilter;

/// Longest accepted view, in seconds.
pub const DURATION_MAX: i64 = i32::MAX as i64;

/// Pageview columns plus the owning article's title ('' if the article is gone).
const SELECT_PAGEVIEW: &str = "SELECT p.id, p.article_id, p.viewed_at, p.duration_seconds, p.is_bounce,
        COALESCE(a.title, '') AS article_title
     FROM pageviews p
     LEFT JOIN articles a ON a.id = p.article_id";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pageview {
    pub id: i64,
    pub article_id: i64,
    pub viewed_at: NaiveDateTime,
    pub duration_seconds: i64,
    pub is_bounce: bool,
    pub article_title: String,
}

/// Body of `POST /analytics/pageviews`.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PageviewForm {
    pub article_id: i64,
    #[serde(deserialize_with = "dates::deserialize_timestamp")]
    pub viewed_at: NaiveDateTime,
    #[serde(default)]
    pub duration_seconds: i64,
    #[serde(default)]
    pub is_bounce: bool,
}

impl PageviewForm {
    pub fn validate(&self) -> Result<(), String> {
        if self.duration_seconds < 0 {
            return Err("Duration cannot be negative".to_string());
        }
        if self.duration_seconds > DURATION_MAX {
            return Err(format!("Duration must be at most {} seconds", DURATION_MAX));
        }
        Ok(())
    }
}

impl Pageview {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Pageview {
            id: row.get("id")?,
            article_id: row.get("article_id")?,
            viewed_at: row.get("viewed_at")?,
            duration_seconds: row.get("duration_seconds")?,
            is_bounce: row.get("is_bounce")?,
            article_title: row.get("article_title")?,
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

    pub fn find_by_id(pool: &DbPool, id: i64) -> StoreResult<Option<Self>> {
        let conn = pool.get()?;
        let sql = format!("{} WHERE p.id = ?1", SELECT_PAGEVIEW);
        let pageview = conn
            .query_row(&sql, params![id], Self::from_row)
            .optional()?;
        Ok(pageview)
    }

    /// The core analytics query: every pageview inside the filter's window and category.
    ///
    /// Dates are widened to whole days in `tz` and compared as UTC instants.
    /// Category is an exact, case-sensitive match on the owning article;
    /// empty or "All Categories" disables it.
    pub fn filtered(pool: &DbPool, filter: &AnalyticsFilter, tz: Tz) -> StoreResult<Vec<Self>> {
        let (start, end) = filter.viewed_window(tz);
        let mut clauses: Vec<&str> = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(start) = start {
            log::debug!("pageview filter: viewed_at >= {} UTC", start);
            params_vec.push(Box::new(start));
            clauses.push("p.viewed_at >= ?");
        }
        if let Some(end) = end {
            log::debug!("pageview filter: viewed_at <= {} UTC", end);
            params_vec.push(Box::new(end));
            clauses.push("p.viewed_at <= ?");
        }
        if let Some(cat) = filter.pageview_category() {
            log::debug!("pageview filter: category = '{}'", cat);
            params_vec.push(Box::new(cat.to_string()));
            clauses.push("a.category = ?");
        }

        let mut sql = SELECT_PAGEVIEW.to_string();
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY p.id");

        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();
        let rows = Self::query(pool, &sql, params_refs.as_slice())?;
        log::debug!("pageview filter matched {} row(s)", rows.len());
        Ok(rows)
    }

    /// Every view of one article, newest first.
    pub fn for_article(pool: &DbPool, article_id: i64) -> StoreResult<Vec<Self>> {
        let sql = format!(
            "{} WHERE p.article_id = ?1 ORDER BY p.viewed_at DESC, p.id DESC",
            SELECT_PAGEVIEW
        );
        Self::query(pool, &sql, params![article_id])
    }

    /// Views between two UTC instants, both inclusive, newest first.
    pub fn in_range(
        pool: &DbPool,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> StoreResult<Vec<Self>> {
        let sql = format!(
            "{} WHERE p.viewed_at >= ?1 AND p.viewed_at <= ?2 ORDER BY p.viewed_at DESC, p.id DESC",
            SELECT_PAGEVIEW
        );
        Self::query(pool, &sql, params![from, to])
    }

    /// Stores one view event and returns it with its id and article title.
    pub fn create(pool: &DbPool, form: &PageviewForm) -> StoreResult<Self> {
        let id = {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO pageviews (article_id, viewed_at, duration_seconds, is_bounce)
                 VALUES (?1, ?2, ?3, ?4)",
                params![form.article_id, form.viewed_at, form.duration_seconds, form.is_bounce],
            )?;
            conn.last_insert_rowid()
        };

        let title = Article::title_by_id(pool, form.article_id)?;
        Ok(Pageview {
            id,
            article_id: form.article_id,
            viewed_at: form.viewed_at,
            duration_seconds: form.duration_seconds,
            is_bounce: form.is_bounce,
            article_title: title.unwrap_or_default(),
        })
    }

    /// `false` when there was no such pageview.
    pub fn delete(pool: &DbPool, id: i64) -> StoreResult<bool> {
        let conn = pool.get()?;
        let removed = conn.execute("DELETE FROM pageviews WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }
}
