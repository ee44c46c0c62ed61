use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::dto::{MoodListResponse, MoodLoggedResponse};
use crate::error::{AppError, AppResult};
use crate::extractors::{AppJson, AppQuery};
use crate::models::mood::{LogMoodRequest, MoodListQuery, MoodSummary, SummaryQuery};
use crate::services::mood_summary::{self, DEFAULT_WINDOW_DAYS};
use crate::AppState;

const MAX_WINDOW_DAYS: i64 = 365;
const DEFAULT_LIST_LIMIT: i64 = 50;
const MAX_LIST_LIMIT: i64 = 500;

fn window_days(days: Option<i64>) -> AppResult<i64> {
    let days = days.unwrap_or(DEFAULT_WINDOW_DAYS);
    if !(1..=MAX_WINDOW_DAYS).contains(&days) {
        return Err(AppError::Validation(format!(
            "days must be between 1 and {}",
            MAX_WINDOW_DAYS
        )));
    }
    Ok(days)
}

pub async fn list_moods(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppQuery(query): AppQuery<MoodListQuery>,
) -> AppResult<Json<MoodListResponse>> {
    let days = window_days(query.days)?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);
    let since = mood_summary::window_start(Utc::now(), days);

    let moods = state.moods.list_recent(auth_user.id, since, limit).await?;

    Ok(Json(MoodListResponse { moods }))
}

pub async fn log_mood(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppJson(body): AppJson<LogMoodRequest>,
) -> AppResult<(StatusCode, Json<MoodLoggedResponse>)> {
    body.validate()?;

    let mood = state
        .moods
        .insert(
            auth_user.id,
            body.mood_type,
            body.intensity,
            body.normalized_note(),
        )
        .await?;

    tracing::info!(
        user_id = %auth_user.id,
        mood = ?mood.mood_type,
        intensity = mood.intensity,
        "Mood logged"
    );

    Ok((
        StatusCode::CREATED,
        Json(MoodLoggedResponse {
            message: "Mood logged successfully".into(),
            mood,
        }),
    ))
}

pub async fn get_summary(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppQuery(query): AppQuery<SummaryQuery>,
) -> AppResult<Json<MoodSummary>> {
    let days = window_days(query.days)?;

    let summary =
        mood_summary::summarize(state.moods.as_ref(), auth_user.id, days, Utc::now()).await?;

    Ok(Json(summary))
}
