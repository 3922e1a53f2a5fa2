mod common;

use axum::{
    Router,
    http::{Method, StatusCode},
    middleware,
    routing::get,
};
use common::{ADMIN_TOKEN, MASTER_TOKEN, MockAuth, MockForum, USER_TOKEN, app, send, state};
use forum_write_api::middleware::{validate_pid, validate_tid};
use serde_json::json;
use std::sync::Arc;

// --- require_admin ---

#[tokio::test]
async fn test_admin_gate_refuses_regular_user_with_401() {
    let forum = Arc::new(MockForum::seeded());
    let (status, body) = send(
        app(forum.clone()),
        Method::DELETE,
        "/api/v2/users/alice",
        Some(USER_TOKEN),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "not-authorised");
    assert!(forum.calls().is_empty());
}

#[tokio::test]
async fn test_admin_gate_lookup_failure_is_401() {
    let forum = Arc::new(MockForum {
        fail_admin_lookup: true,
        ..MockForum::seeded()
    });
    let (status, _) = send(
        app(forum.clone()),
        Method::PUT,
        "/api/v2/users/alice/ban",
        Some(ADMIN_TOKEN),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(forum.calls().is_empty());
}

#[tokio::test]
async fn test_admin_gate_runs_before_slug_resolution() {
    // An unknown slug would be a 404, but the non-admin is stopped first.
    let (status, _) = send(
        app(Arc::new(MockForum::seeded())),
        Method::DELETE,
        "/api/v2/users/nobody",
        Some(USER_TOKEN),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_passes_gate_and_acts_on_resolved_user() {
    let forum = Arc::new(MockForum::seeded());
    let router = app(forum.clone());

    let (status, body) = send(router.clone(), Method::DELETE, "/api/v2/users/alice", Some(ADMIN_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "code": 200, "status": "ok", "payload": {} }));

    send(router.clone(), Method::PUT, "/api/v2/users/alice/ban", Some(ADMIN_TOKEN), None).await;
    send(router, Method::DELETE, "/api/v2/users/alice/ban", Some(ADMIN_TOKEN), None).await;

    assert_eq!(forum.calls(), vec!["delete_user:1:5", "ban:5", "unban:5"]);
}

#[tokio::test]
async fn test_master_token_acting_as_admin_passes_gate() {
    let forum = Arc::new(MockForum::seeded());
    let (status, _) = send(
        app(forum.clone()),
        Method::PUT,
        "/api/v2/users/alice/ban?_uid=1",
        Some(MASTER_TOKEN),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(forum.calls(), vec!["ban:5"]);
}

// --- expose_uid ---

#[tokio::test]
async fn test_known_slug_resolves_to_uid() {
    let (status, body) = send(
        app(Arc::new(MockForum::seeded())),
        Method::GET,
        "/api/v2/users/alice/uid",
        Some(USER_TOKEN),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["payload"], json!({ "uid": 5 }));
}

#[tokio::test]
async fn test_unknown_slug_is_404() {
    let (status, body) = send(
        app(Arc::new(MockForum::seeded())),
        Method::GET,
        "/api/v2/users/nobody/uid",
        Some(USER_TOKEN),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 404);
}

#[tokio::test]
async fn test_slug_lookup_failure_is_500() {
    let forum = Arc::new(MockForum {
        fail_slug_lookup: true,
        ..MockForum::seeded()
    });
    let (status, _) = send(app(forum), Method::GET, "/api/v2/users/alice/uid", Some(USER_TOKEN), None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_slug_routes_still_require_authentication() {
    let (status, _) = send(
        app(Arc::new(MockForum::seeded())),
        Method::GET,
        "/api/v2/users/alice/uid",
        None,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// --- validate_tid / validate_pid ---

#[tokio::test]
async fn test_unknown_topic_is_404_before_handler() {
    let forum = Arc::new(MockForum::seeded());
    let (status, body) = send(
        app(forum.clone()),
        Method::PUT,
        "/api/v2/topics/11/follow",
        Some(USER_TOKEN),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "not-found");
    assert!(forum.calls().is_empty());
}

#[tokio::test]
async fn test_existing_topic_reaches_handler() {
    let forum = Arc::new(MockForum::seeded());
    let (status, _) = send(app(forum.clone()), Method::PUT, "/api/v2/topics/10/follow", Some(USER_TOKEN), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(forum.calls(), vec!["follow:10:7"]);
}

#[tokio::test]
async fn test_existence_check_failure_is_500() {
    let forum = Arc::new(MockForum {
        fail_exists: true,
        ..MockForum::seeded()
    });
    let router = app(forum.clone());

    let (topic_status, _) = send(router.clone(), Method::DELETE, "/api/v2/topics/10/state", Some(USER_TOKEN), None).await;
    let (post_status, _) = send(router, Method::DELETE, "/api/v2/posts/42/state", Some(USER_TOKEN), None).await;

    assert_eq!(topic_status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(post_status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(forum.calls().is_empty());
}

#[tokio::test]
async fn test_unknown_post_is_404_on_guarded_routes() {
    let forum = Arc::new(MockForum::seeded());
    let router = app(forum.clone());

    for (method, uri) in [
        (Method::DELETE, "/api/v2/posts/99"),
        (Method::PUT, "/api/v2/posts/99/state"),
        (Method::DELETE, "/api/v2/posts/99/state"),
        (Method::DELETE, "/api/v2/posts/99/bookmark"),
    ] {
        let (status, _) = send(router.clone(), method.clone(), uri, Some(USER_TOKEN), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
    }
    assert!(forum.calls().is_empty());
}

#[tokio::test]
async fn test_unguarded_post_routes_defer_existence_to_service() {
    let forum = Arc::new(MockForum::seeded());
    let (status, _) = send(
        app(forum.clone()),
        Method::POST,
        "/api/v2/posts/99/bookmark",
        Some(USER_TOKEN),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(forum.calls(), vec!["bookmark:99:7"]);
}

#[tokio::test]
async fn test_authentication_runs_before_existence_check() {
    let forum = Arc::new(MockForum {
        fail_exists: true,
        ..MockForum::seeded()
    });
    let (status, _) = send(app(forum), Method::DELETE, "/api/v2/posts/42", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_guard_without_id_parameter_is_404() {
    let state = state(Arc::new(MockForum::seeded()), Arc::new(MockAuth::default()));
    let router = Router::new()
        .route(
            "/topic",
            get(|| async { "reached" })
                .route_layer(middleware::from_fn_with_state(state.clone(), validate_tid)),
        )
        .route(
            "/post",
            get(|| async { "reached" })
                .route_layer(middleware::from_fn_with_state(state.clone(), validate_pid)),
        )
        .with_state(state);

    let (topic_status, _) = send(router.clone(), Method::GET, "/topic", None, None).await;
    let (post_status, _) = send(router, Method::GET, "/post", None, None).await;

    assert_eq!(topic_status, StatusCode::NOT_FOUND);
    assert_eq!(post_status, StatusCode::NOT_FOUND);
}
