use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use serde::Serialize;

use crate::error::StoreResult;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Connection manager with foreign keys switched on for every pooled connection.
/// The cascades from articles to details and pageviews depend on it.
pub fn manager(path: &str) -> SqliteConnectionManager {
    SqliteConnectionManager::file(path)
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys=ON;"))
}

pub fn init_pool(path: &str, max_size: u32) -> Result<DbPool, Box<dyn std::error::Error>> {
    let pool = Pool::builder().max_size(max_size).build(manager(path))?;

    // Enable WAL mode for better concurrent read performance
    let conn = pool.get()?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;

    Ok(pool)
}

pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get()?;

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS articles (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL CHECK (length(title) <= 200),
            category TEXT NOT NULL CHECK (length(category) <= 100),
            published_at DATETIME NOT NULL
        );

        -- 1:1 with articles, keyed by the article id
        CREATE TABLE IF NOT EXISTS article_details (
            article_id INTEGER PRIMARY KEY,
            summary TEXT NOT NULL DEFAULT '' CHECK (length(summary) <= 500),
            hero_image_url TEXT NOT NULL DEFAULT '' CHECK (length(hero_image_url) <= 300),
            reading_time_seconds INTEGER NOT NULL DEFAULT 0 CHECK (reading_time_seconds >= 0),
            FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE
        );

        -- One row per view event, never updated
        CREATE TABLE IF NOT EXISTS pageviews (
            id INTEGER PRIMARY KEY,
            article_id INTEGER NOT NULL,
            viewed_at DATETIME NOT NULL,
            duration_seconds INTEGER NOT NULL DEFAULT 0 CHECK (duration_seconds BETWEEN 0 AND 2147483647),
            is_bounce INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_articles_published ON articles(published_at);
        CREATE INDEX IF NOT EXISTS idx_articles_category ON articles(category);
        CREATE INDEX IF NOT EXISTS idx_pageviews_viewed ON pageviews(viewed_at);
        CREATE INDEX IF NOT EXISTS idx_pageviews_article ON pageviews(article_id);
        ",
    )?;

    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCounts {
    pub articles: i64,
    pub article_details: i64,
    pub pageviews: i64,
}

pub fn counts(pool: &DbPool) -> StoreResult<TableCounts> {
    let conn = pool.get()?;
    let count = |table: &str| -> rusqlite::Result<i64> {
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
    };
    Ok(TableCounts {
        articles: count("articles")?,
        article_details: count("article_details")?,
        pageviews: count("pageviews")?,
    })
}
