use axum::{extract::State, http::StatusCode, Extension, Json};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{
    cookie::{cleared_session_cookie, session_cookie},
    jwt::create_session_token,
    middleware::AuthUser,
    password::{hash_password, verify_password},
};
use crate::dto::{AuthResponse, MessageResponse, UserResponse};
use crate::error::{AppError, AppResult};
use crate::extractors::AppJson;
use crate::models::user::{normalize_email, LoginRequest, SignupRequest, User, UserRole};
use crate::AppState;

/// Sign a session for `user`, returning the cookie jar and response body.
fn start_session(
    state: &AppState,
    jar: CookieJar,
    user: User,
    message: &str,
) -> AppResult<(CookieJar, AuthResponse)> {
    let token = create_session_token(user.id, &user.email, &state.config)?;
    let jar = jar.add(session_cookie(token.clone(), &state.config));

    Ok((
        jar,
        AuthResponse {
            message: message.to_string(),
            user: user.into(),
            access_token: token,
            expires_in: state.config.jwt_ttl_secs,
        },
    ))
}

pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(body): AppJson<SignupRequest>,
) -> AppResult<(StatusCode, CookieJar, Json<AuthResponse>)> {
    let body = body.normalized();
    body.validate()?;

    let existing = sqlx::query_as::<_, (String, String)>(
        "SELECT email, username FROM users WHERE email = $1 OR username = $2 LIMIT 1",
    )
    .bind(&body.email)
    .bind(&body.username)
    .fetch_optional(&state.db)
    .await?;

    if let Some((email, _)) = existing {
        return Err(AppError::Conflict(if email == body.email {
            "Email already registered".into()
        } else {
            "Username already taken".into()
        }));
    }

    let pwd_hash = hash_password(&body.password)?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email, username, password_hash, first_name, last_name, role)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&body.email)
    .bind(&body.username)
    .bind(&pwd_hash)
    .bind(&body.first_name)
    .bind(&body.last_name)
    .bind(UserRole::User)
    .fetch_one(&state.db)
    .await
    .map_err(|e| match e {
        // lost a race with a concurrent signup
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::Conflict("Email or username already registered".into())
        }
        other => AppError::Database(other),
    })?;

    tracing::info!(user_id = %user.id, "User signed up");

    let (jar, response) = start_session(&state, jar, user, "User created successfully")?;
    Ok((StatusCode::CREATED, jar, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(body): AppJson<LoginRequest>,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    let email = normalize_email(&body.email);
    let body = LoginRequest {
        email,
        password: body.password,
    };
    body.validate()?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(&body.email)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(&body.password, &user.password_hash)? {
        tracing::warn!(user_id = %user.id, "Failed login attempt");
        return Err(AppError::InvalidCredentials);
    }

    let (jar, response) = start_session(&state, jar, user, "Login successful")?;
    Ok((jar, Json(response)))
}

pub async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    (
        jar.remove(cleared_session_cookie()),
        Json(MessageResponse::new("Logout successful")),
    )
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<UserResponse>> {
    // A valid token for a deleted account is treated as no session
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(auth_user.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(UserResponse { user: user.into() }))
}
