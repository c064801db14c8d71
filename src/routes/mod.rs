use axum::{routing::get, Router};

use crate::state::AppState;

pub mod contracts;
pub mod health;
pub mod identity;
pub mod payments;

pub fn v1_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/me", get(identity::me))
        .merge(payments::router())
        .merge(contracts::router())
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use tower::ServiceExt;

    use super::v1_router;
    use crate::state::AppState;

    fn app() -> Router {
        Router::new()
            .nest("/api", v1_router())
            .with_state(AppState::for_tests())
    }

    async fn status_of(request: Request<Body>) -> StatusCode {
        app().oneshot(request).await.expect("response").status()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).expect("request")
    }

    fn get_as(uri: &str, user_id: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("x-user-id", user_id)
            .body(Body::empty())
            .expect("request")
    }

    #[tokio::test]
    async fn health_reports_ok_without_database() {
        let response = app().oneshot(get("/api/health")).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(body["status"], "ok");
        assert_eq!(body["db"], true);
    }

    #[tokio::test]
    async fn calendar_requires_credentials() {
        assert_eq!(
            status_of(get("/api/payments/calendar/2026/3")).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn invalid_month_is_rejected_before_storage() {
        assert_eq!(
            status_of(get_as("/api/payments/calendar/2026/13", "1")).await,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(get_as("/api/payments/overview/2026/0", "1")).await,
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn missing_database_is_a_dependency_failure() {
        assert_eq!(
            status_of(get_as("/api/payments/calendar/2026/3", "1")).await,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(get_as("/api/contracts", "1")).await,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn unknown_status_is_a_bad_request() {
        let request = Request::builder()
            .method("PATCH")
            .uri("/api/payments/5/status?status=LATE")
            .header("x-user-id", "1")
            .body(Body::empty())
            .expect("request");
        assert_eq!(status_of(request).await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_payment_body_is_a_bad_request() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/payments")
            .header("x-user-id", "1")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name":" ","category":"RENT","amount":-5}"#))
            .expect("request");
        assert_eq!(status_of(request).await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn anonymous_invalid_body_is_unauthorized() {
        for uri in ["/api/payments", "/api/payments/recurring", "/api/contracts"] {
            let request = Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{"name":" ","address":" ","category":"RENT","amount":-5}"#,
                ))
                .expect("request");
            assert_eq!(status_of(request).await, StatusCode::UNAUTHORIZED, "{uri}");
        }
    }
}
