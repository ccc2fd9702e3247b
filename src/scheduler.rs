use std::sync::Arc;

use chrono::{DateTime, Days, Local, NaiveTime, TimeZone};

use crate::ai::ArticleGenerator;
use crate::db::ArticleStore;
use crate::error::Result;
use crate::models::Article;

/// Keeps the blog topped up: seeds a minimum at startup, then writes one
/// article every day at local midnight.
#[derive(Clone)]
pub struct ArticleJob {
    store: ArticleStore,
    generator: Arc<ArticleGenerator>,
}

impl ArticleJob {
    pub fn new(store: ArticleStore, generator: Arc<ArticleGenerator>) -> Self {
        Self { store, generator }
    }

    /// Generates articles one at a time until at least `minimum` exist.
    /// Returns how many were stored.
    pub async fn seed(&self, minimum: u32) -> Result<usize> {
        let existing = self.store.count().await?;
        let needed = (i64::from(minimum) - existing).max(0);
        if needed == 0 {
            return Ok(0);
        }

        tracing::info!("Generating {} initial articles...", needed);
        let mut stored = 0;
        for _ in 0..needed {
            match self.run_once().await {
                Ok(_) => stored += 1,
                Err(e) => tracing::error!("Failed to store seed article: {}", e),
            }
        }
        Ok(stored)
    }

    /// One generate-and-store cycle.
    pub async fn run_once(&self) -> Result<Article> {
        let generated = self.generator.generate().await;
        self.store.insert(generated).await
    }

    /// Runs forever. Missed ticks (process down at midnight) are not caught up.
    pub async fn run_daily(self) {
        loop {
            let now = Local::now();
            let next = next_midnight(now);
            let wait = (next - now).to_std().unwrap_or_default();
            tracing::debug!("Next scheduled article at {}", next);
            tokio::time::sleep(wait).await;

            tracing::info!("Daily job: generating a new article");
            match self.run_once().await {
                Ok(article) => tracing::info!("Daily job stored article {}", article.id),
                Err(e) => tracing::error!("Daily job failed: {}", e),
            }
        }
    }
}

/// The first local midnight strictly after `now`. On days where midnight is
/// skipped by a DST change, the first valid instant after it is used.
pub fn next_midnight<Tz: TimeZone>(now: DateTime<Tz>) -> DateTime<Tz> {
    let tz = now.timezone();
    let tomorrow = now
        .date_naive()
        .checked_add_days(Days::new(1))
        .unwrap_or_else(|| now.date_naive());

    let midnight = tomorrow.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| {
            let later = midnight + chrono::Duration::hours(1);
            tz.from_local_datetime(&later).earliest()
        })
        .unwrap_or_else(|| now + chrono::Duration::hours(24))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::ArticleProvider;
    use crate::error::AppError;
    use crate::models::GeneratedArticle;
    use async_trait::async_trait;
    use chrono::{FixedOffset, Timelike, Utc};

    #[tokio::test]
    async fn seed_fills_up_to_minimum() {
        let store = ArticleStore::open_in_memory().await.unwrap();
        let job = ArticleJob::new(store.clone(), Arc::new(ArticleGenerator::synthetic_only()));

        assert_eq!(job.seed(3).await.unwrap(), 3);
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn seed_only_adds_the_difference() {
        let store = ArticleStore::open_in_memory().await.unwrap();
        store
            .insert(GeneratedArticle::new("Existing", "Body"))
            .await
            .unwrap();
        let job = ArticleJob::new(store.clone(), Arc::new(ArticleGenerator::synthetic_only()));

        assert_eq!(job.seed(3).await.unwrap(), 2);
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn seed_is_noop_when_full() {
        let store = ArticleStore::open_in_memory().await.unwrap();
        let job = ArticleJob::new(store.clone(), Arc::new(ArticleGenerator::synthetic_only()));
        job.seed(4).await.unwrap();

        assert_eq!(job.seed(3).await.unwrap(), 0);
        assert_eq!(store.count().await.unwrap(), 4);
    }

    struct AlwaysDown;

    #[async_trait]
    impl ArticleProvider for AlwaysDown {
        fn name(&self) -> &'static str {
            "down"
        }

        async fn attempt(&self) -> Result<GeneratedArticle> {
            Err(AppError::Provider("offline".to_string()))
        }
    }

    #[tokio::test]
    async fn seed_survives_provider_outage() {
        let store = ArticleStore::open_in_memory().await.unwrap();
        let generator = ArticleGenerator::with_providers("down", vec![Box::new(AlwaysDown) as Box<dyn ArticleProvider>]);
        let job = ArticleJob::new(store.clone(), Arc::new(generator));

        assert_eq!(job.seed(3).await.unwrap(), 3);
    }

    #[test]
    fn next_midnight_is_start_of_tomorrow() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2026, 10, 18, 15, 30, 0).unwrap();
        let next = next_midnight(now);
        assert_eq!(next, tz.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap());
    }

    #[test]
    fn exactly_midnight_schedules_the_next_day() {
        let now = Utc.with_ymd_and_hms(2026, 12, 31, 0, 0, 0).unwrap();
        let next = next_midnight(now);
        assert_eq!(next, Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn next_midnight_is_always_in_the_future() {
        let now = Local::now();
        let next = next_midnight(now);
        assert!(next > now);
        assert!(next - now <= chrono::Duration::hours(25));
        assert_eq!(next.minute(), 0);
    }
}
