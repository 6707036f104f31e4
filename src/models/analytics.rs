use std::collections::BTreeMap;

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::Serialize;

use crate::dates;
use crate::db::DbPool;
use crate::error::StoreResult;
use crate::models::article::Article;
use crate::models::filter::AnalyticsFilter;
use crate::models::pageview::Pageview;

pub const TOP_ARTICLES_LIMIT: usize = 10;
pub const RECENT_PAGEVIEWS_LIMIT: usize = 50;
pub const UNKNOWN_ARTICLE: &str = "Unknown Article";

#[derive(Debug, Serialize, Default, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_views: i64,
    pub average_time_on_page: f64,
    /// Percentage, 0..=100.
    pub bounce_rate: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyViews {
    pub date: NaiveDate,
    pub views: i64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TopArticle {
    pub article_id: i64,
    pub title: String,
    pub views: i64,
    pub average_time_on_page: f64,
    pub bounce_rate: f64,
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    views: i64,
    duration_total: i128,
    bounces: i64,
}

impl Tally {
    fn add(&mut self, pv: &Pageview) {
        self.views += 1;
        self.duration_total += i128::from(pv.duration_seconds);
        if pv.is_bounce {
            self.bounces += 1;
        }
    }

    fn average_time(&self) -> f64 {
        if self.views == 0 {
            return 0.0;
        }
        self.duration_total as f64 / self.views as f64
    }

    fn bounce_rate(&self) -> f64 {
        if self.views == 0 {
            return 0.0;
        }
        self.bounces as f64 / self.views as f64 * 100.0
    }
}

/// Totals over the whole set. An empty set yields an all-zero summary.
pub fn summarize(rows: &[Pageview]) -> Summary {
    let mut tally = Tally::default();
    for pv in rows {
        tally.add(pv);
    }
    Summary {
        total_views: tally.views,
        average_time_on_page: tally.average_time(),
        bounce_rate: tally.bounce_rate(),
    }
}

/// View counts per calendar day (as seen in `tz`), oldest first.
/// Days without views are left out.
pub fn daily_views(rows: &[Pageview], tz: Tz) -> Vec<DailyViews> {
    let mut by_day: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for pv in rows {
        *by_day.entry(dates::local_date(tz, pv.viewed_at)).or_insert(0) += 1;
    }
    by_day
        .into_iter()
        .map(|(date, views)| DailyViews { date, views })
        .collect()
}

/// Most viewed articles, at most `limit` of them.
///
/// Equal view counts keep ascending article id order. Titles are looked up
/// only for the groups that survive the cut; a missing article is labelled
/// [`UNKNOWN_ARTICLE`].
pub fn top_articles<F, E>(
    rows: &[Pageview],
    limit: usize,
    mut resolve_title: F,
) -> Result<Vec<TopArticle>, E>
where
    F: FnMut(i64) -> Result<Option<String>, E>,
{
    let mut by_article: BTreeMap<i64, Tally> = BTreeMap::new();
    for pv in rows {
        by_article.entry(pv.article_id).or_default().add(pv);
    }

    let mut ranked: Vec<(i64, Tally)> = by_article.into_iter().collect();
    ranked.sort_by(|a, b| b.1.views.cmp(&a.1.views));
    ranked.truncate(limit);

    ranked
        .into_iter()
        .map(|(article_id, tally)| {
            let title = resolve_title(article_id)?.unwrap_or_else(|| UNKNOWN_ARTICLE.to_string());
            Ok(TopArticle {
                article_id,
                title,
                views: tally.views,
                average_time_on_page: tally.average_time(),
                bounce_rate: tally.bounce_rate(),
            })
        })
        .collect()
}

/// Newest views first, at most `limit`.
pub fn recent(mut rows: Vec<Pageview>, limit: usize) -> Vec<Pageview> {
    rows.sort_by(|a, b| b.viewed_at.cmp(&a.viewed_at).then(b.id.cmp(&a.id)));
    rows.truncate(limit);
    rows
}

/// Pool-level entry points: run the filtered pageview query, then aggregate in memory.
pub struct Analytics;

impl Analytics {
    pub fn summary(pool: &DbPool, filter: &AnalyticsFilter, tz: Tz) -> StoreResult<Summary> {
        let rows = Pageview::filtered(pool, filter, tz)?;
        Ok(summarize(&rows))
    }

    pub fn daily_views(
        pool: &DbPool,
        filter: &AnalyticsFilter,
        tz: Tz,
    ) -> StoreResult<Vec<DailyViews>> {
        let rows = Pageview::filtered(pool, filter, tz)?;
        Ok(daily_views(&rows, tz))
    }

    pub fn top_articles(
        pool: &DbPool,
        filter: &AnalyticsFilter,
        tz: Tz,
    ) -> StoreResult<Vec<TopArticle>> {
        let rows = Pageview::filtered(pool, filter, tz)?;
        top_articles(&rows, TOP_ARTICLES_LIMIT, |id| Article::title_by_id(pool, id))
    }

    pub fn recent_pageviews(
        pool: &DbPool,
        filter: &AnalyticsFilter,
        tz: Tz,
    ) -> StoreResult<Vec<Pageview>> {
        let rows = Pageview::filtered(pool, filter, tz)?;
        Ok(recent(rows, RECENT_PAGEVIEWS_LIMIT))
    }
}
