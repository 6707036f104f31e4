//! Demo data for local development. Only `main` calls this, and only when
//! `seed_demo_data` is set; nothing on the request path depends on it.

use std::ops::RangeInclusive;

use chrono::{Duration, NaiveDateTime, Utc};
use rand::Rng;
use rusqlite::params;

use crate::db::DbPool;
use crate::error::StoreResult;
use crate::models::article::{Article, ArticleDetailForm, ArticleForm};

pub const DEMO_CATEGORIES: [&str; 3] = ["Technology", "Business", "Lifestyle"];

const BATCH_SIZE: usize = 1000;

/// How much to generate. Ranges must be non-empty.
#[derive(Debug, Clone)]
pub struct SeedPlan {
    pub articles: RangeInclusive<usize>,
    pub pageviews: RangeInclusive<usize>,
    /// Pageviews fall within this many days before `now`.
    pub days: i64,
    /// Articles are published this many days before `now`.
    pub published_days_ago: RangeInclusive<i64>,
    pub now: NaiveDateTime,
}

impl Default for SeedPlan {
    fn default() -> Self {
        Self {
            articles: 20..=30,
            pageviews: 30_000..=60_000,
            days: 90,
            published_days_ago: 120..=180,
            now: Utc::now().naive_utc(),
        }
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct SeedReport {
    pub articles: usize,
    pub pageviews: usize,
}

/// Fills an empty database with random articles and pageviews.
/// Does nothing when any article already exists.
pub fn seed_demo_data<R: Rng>(pool: &DbPool, rng: &mut R, plan: &SeedPlan) -> StoreResult<SeedReport> {
    let existing: i64 = {
        let conn = pool.get()?;
        conn.query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?
    };
    if existing > 0 {
        log::info!("Skipping demo data: {} article(s) already present", existing);
        return Ok(SeedReport::default());
    }

    let article_count = rng.gen_range(plan.articles.clone());
    let mut article_ids = Vec::with_capacity(article_count);
    for i in 1..=article_count {
        let category = DEMO_CATEGORIES[rng.gen_range(0..DEMO_CATEGORIES.len())];
        let days_ago = rng.gen_range(plan.published_days_ago.clone());
        let form = ArticleForm {
            title: format!("{} Article {}", category, i),
            category: category.to_string(),
            published_at: plan.now - Duration::days(days_ago),
            article_detail: Some(ArticleDetailForm {
                summary: format!(
                    "This is a summary for {} Article {} discussing important topics in this field.",
                    category, i
                ),
                hero_image_url: format!(
                    "https://example.com/images/{}{}.jpg",
                    category.to_lowercase(),
                    i
                ),
                reading_time_seconds: rng.gen_range(180..720),
            }),
        };
        article_ids.push(Article::create(pool, &form)?.id);
    }

    let pageview_count = if article_ids.is_empty() {
        0
    } else {
        rng.gen_range(plan.pageviews.clone())
    };
    let window_start = plan.now - Duration::days(plan.days);
    let window_secs = (plan.days * 86_400).max(1);

    let mut conn = pool.get()?;
    let mut remaining = pageview_count;
    while remaining > 0 {
        let batch = remaining.min(BATCH_SIZE);
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO pageviews (article_id, viewed_at, duration_seconds, is_bounce)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for _ in 0..batch {
                let article_id = article_ids[rng.gen_range(0..article_ids.len())];
                let viewed_at = window_start + Duration::seconds(rng.gen_range(0..window_secs));
                let duration: i64 = rng.gen_range(5..600);
                let bounce = rng.gen_bool(0.4);
                stmt.execute(params![article_id, viewed_at, duration, bounce])?;
            }
        }
        tx.commit()?;
        remaining -= batch;
    }

    log::info!(
        "Seeded {} demo article(s) and {} pageview(s)",
        article_ids.len(),
        pageview_count
    );
    Ok(SeedReport {
        articles: article_ids.len(),
        pageviews: pageview_count,
    })
}
