use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::dto::{EntryListResponse, EntryResponse, MessageResponse};
use crate::error::{AppError, AppResult};
use crate::extractors::{AppJson, AppQuery};
use crate::models::entry::{Entry, EntryListQuery, EntryRequest, Pagination};
use crate::AppState;

const ENTRY_FILTER: &str = r#"
    user_id = $1
    AND ($2::mood_type IS NULL OR mood = $2)
    AND (
        $3::text IS NULL
        OR title ILIKE $3
        OR content ILIKE $3
        OR array_to_string(tags, ' ') ILIKE $3
    )
"#;

fn not_found() -> AppError {
    AppError::NotFound("Entry not found".into())
}

pub async fn list_entries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppQuery(query): AppQuery<EntryListQuery>,
) -> AppResult<Json<EntryListResponse>> {
    let page = query.page();
    let limit = query.limit();
    let search = query.search_pattern();

    // sort column and direction come from closed enums, never from raw input
    let list_sql = format!(
        "SELECT * FROM entries WHERE {} ORDER BY {} {}, id {} LIMIT $4 OFFSET $5",
        ENTRY_FILTER,
        query.sort_by.column(),
        query.sort_order.keyword(),
        query.sort_order.keyword(),
    );
    let count_sql = format!("SELECT COUNT(*) FROM entries WHERE {}", ENTRY_FILTER);

    let entries_fut = sqlx::query_as::<_, Entry>(&list_sql)
        .bind(auth_user.id)
        .bind(query.mood)
        .bind(&search)
        .bind(limit)
        .bind(query.offset())
        .fetch_all(&state.db);

    let total_fut = sqlx::query_scalar::<_, i64>(&count_sql)
        .bind(auth_user.id)
        .bind(query.mood)
        .bind(&search)
        .fetch_one(&state.db);

    let (entries, total) = tokio::try_join!(entries_fut, total_fut)?;

    Ok(Json(EntryListResponse {
        entries,
        pagination: Pagination::new(page, limit, total),
    }))
}

pub async fn get_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<EntryResponse>> {
    let entry = sqlx::query_as::<_, Entry>("SELECT * FROM entries WHERE id = $1 AND user_id = $2")
        .bind(entry_id)
        .bind(auth_user.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(EntryResponse {
        message: None,
        entry,
    }))
}

pub async fn create_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppJson(body): AppJson<EntryRequest>,
) -> AppResult<(StatusCode, Json<EntryResponse>)> {
    let body = body.normalized();
    body.validate()?;

    let entry = sqlx::query_as::<_, Entry>(
        r#"
        INSERT INTO entries (id, user_id, title, content, mood, tags)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(&body.title)
    .bind(&body.content)
    .bind(body.mood)
    .bind(body.tags_or_empty())
    .fetch_one(&state.db)
    .await?;

    tracing::info!(user_id = %auth_user.id, entry_id = %entry.id, "Journal entry created");

    Ok((
        StatusCode::CREATED,
        Json(EntryResponse {
            message: Some("Entry created successfully".into()),
            entry,
        }),
    ))
}

pub async fn update_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
    AppJson(body): AppJson<EntryRequest>,
) -> AppResult<Json<EntryResponse>> {
    let body = body.normalized();
    body.validate()?;

    // Ownership is part of the WHERE clause; someone else's entry looks missing
    let entry = sqlx::query_as::<_, Entry>(
        r#"
        UPDATE entries SET
            title = $3,
            content = $4,
            mood = $5,
            tags = $6,
            updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(entry_id)
    .bind(auth_user.id)
    .bind(&body.title)
    .bind(&body.content)
    .bind(body.mood)
    .bind(body.tags_or_empty())
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(not_found)?;

    Ok(Json(EntryResponse {
        message: Some("Entry updated successfully".into()),
        entry,
    }))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    let result = sqlx::query("DELETE FROM entries WHERE id = $1 AND user_id = $2")
        .bind(entry_id)
        .bind(auth_user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(not_found());
    }

    tracing::info!(user_id = %auth_user.id, entry_id = %entry_id, "Journal entry deleted");

    Ok(Json(MessageResponse::new("Entry deleted successfully")))
}
