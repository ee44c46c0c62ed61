use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

/// `Json` whose rejections use the API error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `Query` whose rejections use the API error envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => {
                AppError::Validation(format!("Invalid request body: {}", err.body_text()))
            }
            JsonRejection::JsonSyntaxError(_) => {
                AppError::Validation("Malformed JSON body".to_string())
            }
            JsonRejection::MissingJsonContentType(_) => AppError::Validation(
                "Missing `Content-Type: application/json` header".to_string(),
            ),
            other => AppError::Validation(other.body_text()),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(format!("Invalid query string: {}", rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        routing::{get, post},
        Router,
    };
    use http_body_util::BodyExt;
    use serde::Deserialize;
    use tower::ServiceExt;

    use super::*;

    #[derive(Deserialize)]
    struct Window {
        days: Option<i64>,
    }

    async fn echo_days(AppQuery(window): AppQuery<Window>) -> String {
        window.days.unwrap_or_default().to_string()
    }

    async fn echo_body(AppJson(window): AppJson<Window>) -> String {
        window.days.unwrap_or_default().to_string()
    }

    fn app() -> Router {
        Router::new()
            .route("/days", get(echo_days))
            .route("/body", post(echo_body))
    }

    async fn error_body(resp: axum::response::Response) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_valid_query_passes_through() {
        let resp = app()
            .oneshot(Request::get("/days?days=7").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_bad_query_uses_error_envelope() {
        let resp = app()
            .oneshot(Request::get("/days?days=abc").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = error_body(resp).await;
        assert_eq!(json["error"]["code"], 400);
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Invalid query string"));
    }

    #[tokio::test]
    async fn test_malformed_json_uses_error_envelope() {
        let resp = app()
            .oneshot(
                Request::post("/body")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{\"days\":"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = error_body(resp).await;
        assert_eq!(json["error"]["message"], "Malformed JSON body");
    }

    #[tokio::test]
    async fn test_missing_content_type_is_a_validation_error() {
        let resp = app()
            .oneshot(Request::post("/body").body(Body::from("{}")).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = error_body(resp).await;
        assert_eq!(json["error"]["code"], 400);
    }
}
