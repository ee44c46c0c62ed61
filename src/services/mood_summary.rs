//! Trailing-window mood summary: totals, per-type distribution and a
//! per-UTC-day trend series for one user.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::db::MoodStore;
use crate::error::AppResult;
use crate::models::mood::{
    DailyTrend, MoodDistribution, MoodSample, MoodSummary, MoodType, WindowTotals,
};

pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Reported when the window holds no samples; clients always render a mood.
pub const FALLBACK_MOOD: MoodType = MoodType::Calm;

pub fn window_start(now: DateTime<Utc>, window_days: i64) -> DateTime<Utc> {
    now - Duration::days(window_days)
}

/// Read the window from the store and build the summary.
///
/// The window is `[now - window_days, now]`; samples and totals come from one
/// `read_window` call over those bounds. A store failure aborts with no
/// partial result.
pub async fn summarize(
    store: &dyn MoodStore,
    user_id: Uuid,
    window_days: i64,
    now: DateTime<Utc>,
) -> AppResult<MoodSummary> {
    let since = window_start(now, window_days);

    let window = store.read_window(user_id, since, now).await?;

    tracing::debug!(
        user_id = %user_id,
        window_days,
        samples = window.samples.len(),
        "Computing mood summary"
    );

    Ok(compute_summary(&window.samples, window.totals, window_days))
}

/// Pure aggregation over an already-filtered window.
///
/// `totals` is the store's own COUNT/AVG and is reported as-is for
/// `total_moods` and `average_intensity`.
pub fn compute_summary(
    samples: &[MoodSample],
    totals: WindowTotals,
    window_days: i64,
) -> MoodSummary {
    let mut ordered: Vec<&MoodSample> = samples.iter().collect();
    // stable: equal timestamps keep the store's order
    ordered.sort_by_key(|s| s.created_at);

    let distribution = distribution(&ordered);
    let most_frequent_mood = most_frequent(&distribution);
    let daily_trends = daily_trends(&ordered);

    let average_intensity = if totals.count == 0 {
        0.0
    } else {
        totals.average_intensity.unwrap_or(0.0)
    };

    MoodSummary {
        total_moods: totals.count,
        average_intensity,
        most_frequent_mood,
        period: format!("{} days", window_days),
        distribution,
        daily_trends,
    }
}

struct GroupAccumulator {
    mood: MoodType,
    count: i64,
    intensity_sum: i64,
}

/// Groups in first-seen order.
fn distribution(samples: &[&MoodSample]) -> Vec<MoodDistribution> {
    let groups = samples
        .iter()
        .fold(Vec::<GroupAccumulator>::new(), |mut groups, sample| {
            match groups.iter_mut().find(|g| g.mood == sample.mood_type) {
                Some(group) => {
                    group.count += 1;
                    group.intensity_sum += sample.intensity as i64;
                }
                None => groups.push(GroupAccumulator {
                    mood: sample.mood_type,
                    count: 1,
                    intensity_sum: sample.intensity as i64,
                }),
            }
            groups
        });

    groups
        .into_iter()
        .map(|g| MoodDistribution {
            mood: g.mood,
            count: g.count,
            average_intensity: g.intensity_sum as f64 / g.count as f64,
        })
        .collect()
}

/// First group holding the maximum count wins.
fn most_frequent(distribution: &[MoodDistribution]) -> MoodType {
    distribution
        .iter()
        .fold(None::<&MoodDistribution>, |best, group| match best {
            Some(b) if b.count >= group.count => Some(b),
            _ => Some(group),
        })
        .map(|g| g.mood)
        .unwrap_or(FALLBACK_MOOD)
}

#[derive(Debug, Clone, Default)]
struct DayAccumulator {
    count: i64,
    running_average: f64,
    moods: Vec<MoodType>,
}

impl DayAccumulator {
    fn absorb(self, mood: MoodType, intensity: i32) -> Self {
        let count = self.count + 1;
        let running_average =
            (self.running_average * (count - 1) as f64 + intensity as f64) / count as f64;
        let mut moods = self.moods;
        moods.push(mood);
        Self {
            count,
            running_average,
            moods,
        }
    }
}

/// Buckets by UTC calendar date, emitted in first-seen order.
fn daily_trends(samples: &[&MoodSample]) -> Vec<DailyTrend> {
    let (order, mut buckets) = samples.iter().fold(
        (Vec::<NaiveDate>::new(), HashMap::<NaiveDate, DayAccumulator>::new()),
        |(mut order, mut buckets), sample| {
            let day = sample.created_at.date_naive();
            let acc = match buckets.remove(&day) {
                Some(acc) => acc,
                None => {
                    order.push(day);
                    DayAccumulator::default()
                }
            };
            buckets.insert(day, acc.absorb(sample.mood_type, sample.intensity));
            (order, buckets)
        },
    );

    order
        .into_iter()
        .filter_map(|day| {
            buckets.remove(&day).map(|acc| DailyTrend {
                date: day.format("%Y-%m-%d").to_string(),
                moods: acc.moods,
                count: acc.count,
                average_intensity: acc.running_average,
            })
        })
        .collect()
}
