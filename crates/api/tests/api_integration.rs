//! API integration tests.
//!
//! These tests verify the API endpoints work correctly together.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::redundant_clone)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use campusdesk_api::{middleware::AppState, router as api_router, SseBroadcaster};
use campusdesk_common::config::PortalConfig;
use campusdesk_common::LocalStorage;
use campusdesk_core::{
    AccountService, ComplaintService, NotificationService, RolePolicy, StatsService, TeamService,
    UploadService, VoteService,
};
use campusdesk_db::repositories::{
    ComplaintRepository, NotificationRepository, UploadRepository, UserProfileRepository,
    UserRepository, VoteRepository,
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

/// Create a test portal configuration.
fn create_test_portal() -> PortalConfig {
    PortalConfig {
        name: "Campusdesk Test".to_string(),
        branches: vec!["Kochi".to_string(), "Chennai".to_string()],
        admin_emails: vec!["admin.chn@example.com".to_string()],
        super_admin_email: "admin.kochi@example.com".to_string(),
        super_admin_branch: "Kochi".to_string(),
    }
}

/// Create a mock database connection that answers empty result sets.
fn create_mock_db() -> Arc<DatabaseConnection> {
    Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<campusdesk_db::entities::user::Model>::new()])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection(),
    )
}

/// Create test app state with mock databases.
fn create_test_state() -> AppState {
    let portal = create_test_portal();
    let policy = RolePolicy::new(&portal);

    let user_repo = UserRepository::new(create_mock_db());
    let profile_repo = UserProfileRepository::new(create_mock_db());
    let complaint_repo = ComplaintRepository::new(create_mock_db());
    let vote_repo = VoteRepository::new(create_mock_db());
    let notification_repo = NotificationRepository::new(create_mock_db());
    let upload_repo = UploadRepository::new(create_mock_db());

    let account_service =
        AccountService::new(user_repo.clone(), profile_repo.clone(), policy.clone());
    let notification_service = NotificationService::new(notification_repo);
    let complaint_service = ComplaintService::new(
        complaint_repo.clone(),
        user_repo.clone(),
        notification_service.clone(),
    );
    let vote_service = VoteService::new(vote_repo, complaint_repo.clone());
    let team_service = TeamService::new(user_repo, profile_repo, policy);
    let storage = Arc::new(LocalStorage::new(
        PathBuf::from("/tmp/campusdesk-test-files"),
        "/files".to_string(),
    ));
    let upload_service = UploadService::new(upload_repo, storage);
    let stats_service = StatsService::new(complaint_repo);

    AppState {
        account_service,
        complaint_service,
        vote_service,
        notification_service,
        team_service,
        upload_service,
        stats_service,
        portal,
        sse_broadcaster: SseBroadcaster::new(),
    }
}

fn create_test_app() -> Router {
    api_router().with_state(create_test_state())
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_meta_returns_vocabulary() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/meta")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    assert!(body.contains("Campusdesk Test"));
    assert!(body.contains("Kochi"));
    assert!(body.contains("WiFi"));
    assert!(body.contains("In_Progress"));
}

#[tokio::test]
async fn test_me_requires_auth() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/i")
                .header("Content-Type", "application/json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_complaint_list_requires_auth() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/complaints/list")
                .header("Content-Type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_stats_require_admin() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/stats/overview")
                .header("Content-Type", "application/json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // No authenticated user at all -> 401
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signin_unknown_account_is_unauthorized() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/signin")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    r#"{"email":"ghost@example.com","password":"password123"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_string(response).await;
    assert!(body.contains("UNAUTHORIZED"));
}

#[tokio::test]
async fn test_signup_rejects_invalid_email() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/signup")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    r#"{"email":"nope","password":"password123","fullName":"T","branch":"Kochi"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_string(response).await;
    assert!(body.contains("VALIDATION_ERROR"));
}
