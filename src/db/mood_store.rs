use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::mood::{MoodSample, MoodType, WindowTotals};

/// Read/append access to a user's mood samples.
///
/// Every method is scoped by `user_id`; `since` and `until` are inclusive
/// bounds on `created_at`.
#[async_trait]
pub trait MoodStore: Send + Sync {
    async fn insert(
        &self,
        user_id: Uuid,
        mood_type: MoodType,
        intensity: i32,
        note: Option<String>,
    ) -> AppResult<MoodSample>;

    /// Newest first, at most `limit` rows.
    async fn list_recent(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<MoodSample>>;

    /// Every sample with `since <= created_at <= until`, oldest first.
    async fn samples_between(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> AppResult<Vec<MoodSample>>;

    /// Row count and mean intensity of the same window, computed by the store itself.
    async fn totals_between(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> AppResult<WindowTotals>;

    /// Samples and totals of one window. Stores that can read both from a
    /// single snapshot should override this.
    async fn read_window(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> AppResult<MoodWindow> {
        let samples = self.samples_between(user_id, since, until).await?;
        let totals = self.totals_between(user_id, since, until).await?;
        Ok(MoodWindow { samples, totals })
    }
}

#[derive(Debug, Clone, Default)]
pub struct MoodWindow {
    pub samples: Vec<MoodSample>,
    pub totals: WindowTotals,
}

// id breaks created_at ties so repeated reads group identically
const WINDOW_SAMPLES_SQL: &str = r#"
    SELECT * FROM moods
    WHERE user_id = $1 AND created_at >= $2 AND created_at <= $3
    ORDER BY created_at ASC, id ASC
"#;

const WINDOW_TOTALS_SQL: &str = r#"
    SELECT COUNT(*) AS count, AVG(intensity)::float8 AS average_intensity
    FROM moods
    WHERE user_id = $1 AND created_at >= $2 AND created_at <= $3
"#;

pub struct PgMoodStore {
    db: PgPool,
}

impl PgMoodStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MoodStore for PgMoodStore {
    async fn insert(
        &self,
        user_id: Uuid,
        mood_type: MoodType,
        intensity: i32,
        note: Option<String>,
    ) -> AppResult<MoodSample> {
        let sample = sqlx::query_as::<_, MoodSample>(
            r#"
            INSERT INTO moods (id, user_id, mood_type, intensity, note)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(mood_type)
        .bind(intensity)
        .bind(&note)
        .fetch_one(&self.db)
        .await?;

        Ok(sample)
    }

    async fn list_recent(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<MoodSample>> {
        let samples = sqlx::query_as::<_, MoodSample>(
            r#"
            SELECT * FROM moods
            WHERE user_id = $1 AND created_at >= $2
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(since)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(samples)
    }

    async fn samples_between(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> AppResult<Vec<MoodSample>> {
        Ok(fetch_window_samples(&self.db, user_id, since, until).await?)
    }

    async fn totals_between(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> AppResult<WindowTotals> {
        Ok(fetch_window_totals(&self.db, user_id, since, until).await?)
    }

    async fn read_window(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> AppResult<MoodWindow> {
        // One snapshot for both reads; rows committed in between stay invisible
        let mut tx = self.db.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let samples = fetch_window_samples(&mut *tx, user_id, since, until).await?;
        let totals = fetch_window_totals(&mut *tx, user_id, since, until).await?;

        tx.commit().await?;

        Ok(MoodWindow { samples, totals })
    }
}

async fn fetch_window_samples<'e, E>(
    executor: E,
    user_id: Uuid,
    since: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Result<Vec<MoodSample>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, MoodSample>(WINDOW_SAMPLES_SQL)
        .bind(user_id)
        .bind(since)
        .bind(until)
        .fetch_all(executor)
        .await
}

async fn fetch_window_totals<'e, E>(
    executor: E,
    user_id: Uuid,
    since: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Result<WindowTotals, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, WindowTotals>(WINDOW_TOTALS_SQL)
        .bind(user_id)
        .bind(since)
        .bind(until)
        .fetch_one(executor)
        .await
}


#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::memory::MemoryMoodStore;
    use super::*;

    fn sample(user_id: Uuid, mood_type: MoodType, intensity: i32, age: Duration) -> MoodSample {
        MoodSample {
            id: Uuid::new_v4(),
            user_id,
            mood_type,
            intensity,
            note: None,
            created_at: Utc::now() - age,
        }
    }

    #[tokio::test]
    async fn test_memory_store_scopes_by_user_and_window() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        let store = MemoryMoodStore::with_samples(vec![
            sample(me, MoodType::Happy, 8, Duration::days(1)),
            sample(me, MoodType::Sad, 2, Duration::days(45)),
            sample(other, MoodType::Calm, 5, Duration::days(1)),
        ]);

        let now = Utc::now();
        let since = now - Duration::days(30);
        let rows = store.samples_between(me, since, now).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].mood_type, MoodType::Happy);

        let totals = store.totals_between(me, since, now).await.unwrap();
        assert_eq!(totals.count, 1);
        assert_eq!(totals.average_intensity, Some(8.0));
    }

    #[tokio::test]
    async fn test_memory_store_list_recent_newest_first_with_limit() {
        let me = Uuid::new_v4();
        let store = MemoryMoodStore::with_samples(vec![
            sample(me, MoodType::Tired, 3, Duration::hours(30)),
            sample(me, MoodType::Happy, 8, Duration::hours(1)),
            sample(me, MoodType::Calm, 5, Duration::hours(10)),
        ]);

        let rows = store
            .list_recent(me, Utc::now() - Duration::days(30), 2)
            .await
            .unwrap();
        let kinds: Vec<MoodType> = rows.iter().map(|s| s.mood_type).collect();
        assert_eq!(kinds, vec![MoodType::Happy, MoodType::Calm]);
    }

    #[tokio::test]
    async fn test_memory_store_empty_totals() {
        let store = MemoryMoodStore::default();
        let now = Utc::now();
        let totals = store
            .totals_between(Uuid::new_v4(), now - Duration::days(30), now)
            .await
            .unwrap();
        assert_eq!(totals.count, 0);
        assert!(totals.average_intensity.is_none());
    }

    #[tokio::test]
    async fn test_failing_store_reports_database_error() {
        let store = MemoryMoodStore::failing();
        let now = Utc::now();
        let result = store
            .read_window(Uuid::new_v4(), now - Duration::days(30), now)
            .await;
        assert!(matches!(result, Err(crate::error::AppError::Database(_))));
    }

    #[tokio::test]
    async fn test_memory_store_window_bounds_are_inclusive() {
        let me = Uuid::new_v4();
        let until = Utc.with_ymd_and_hms(2026, 5, 8, 12, 0, 0).unwrap();
        let since = until - Duration::days(7);
        let at_since = MoodSample {
            created_at: since,
            ..sample(me, MoodType::Calm, 4, Duration::zero())
        };
        let before_since = MoodSample {
            created_at: since - Duration::milliseconds(1),
            ..sample(me, MoodType::Sad, 2, Duration::zero())
        };
        let at_until = MoodSample {
            created_at: until,
            ..sample(me, MoodType::Happy, 8, Duration::zero())
        };
        let after_until = MoodSample {
            created_at: until + Duration::seconds(1),
            ..sample(me, MoodType::Stressed, 9, Duration::zero())
        };
        let store =
            MemoryMoodStore::with_samples(vec![before_since, at_since, after_until, at_until]);

        let window = store.read_window(me, since, until).await.unwrap();
        let kinds: Vec<MoodType> = window.samples.iter().map(|s| s.mood_type).collect();
        assert_eq!(kinds, vec![MoodType::Calm, MoodType::Happy]);
        assert_eq!(window.totals.count, 2);
        assert_eq!(window.totals.average_intensity, Some(6.0));
    }
}
