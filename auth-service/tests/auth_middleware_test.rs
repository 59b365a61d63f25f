mod common;

use auth_service::{
    middleware::{admin_middleware, auth_middleware, AuthUser},
    AppState,
};
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use common::TestApp;
use tower::util::ServiceExt;

async fn whoami(AuthUser(user): AuthUser) -> String {
    user.email
}

fn router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/admin", get(|| async { "admin" }))
        .layer(from_fn_with_state(state.clone(), admin_middleware));

    Router::new()
        .route("/me", get(whoami))
        .merge(admin)
        .layer(from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

fn request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_auth_middleware() {
    let app = TestApp::new();
    let session = app.register("alice@example.com", "pw123").await;
    let router = router(app.state.clone());

    // Missing Authorization header
    let response = router.clone().oneshot(request("/me", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Invalid token
    let response = router
        .clone()
        .oneshot(request("/me", Some("invalid_token")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Refresh tokens do not open protected routes
    let response = router
        .clone()
        .oneshot(request("/me", Some(&session.refresh_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Valid token
    let response = router
        .clone()
        .oneshot(request("/me", Some(&session.access_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"alice@example.com");

    // Revoked token
    app.state.sessions.logout(&session.access_token).await.unwrap();
    let response = router
        .clone()
        .oneshot(request("/me", Some(&session.access_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(json["error"].as_str().unwrap().contains("revoked"));
}

#[tokio::test]
async fn test_admin_middleware() {
    let app = TestApp::new();
    app.state.authz.ensure_default_roles().await.unwrap();
    let alice = app.register("alice@example.com", "pw123").await;
    let router = router(app.state.clone());

    let response = router
        .clone()
        .oneshot(request("/admin", Some(&alice.access_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let me = app
        .state
        .sessions
        .current_user(&alice.access_token)
        .await
        .unwrap();
    app.state.authz.assign_role(me.id, "superuser").await.unwrap();

    let response = router
        .clone()
        .oneshot(request("/admin", Some(&alice.access_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router.oneshot(request("/admin", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
