//! Handler tests over the full router, backed by the in-memory database.

use app_core::{AdminLevel, AppConfig, CoreBuilder, DbpSession, Player, Region, User};
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use db_mock::MockDb;
use serde_json::{Value, json};
use server::build_router;
use std::collections::BTreeSet;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

const ADMIN_TOKEN: &str = "test-session-token";

fn test_app() -> (Router, MockDb) {
    let db = MockDb::new();
    db.seed_region(Region::new("norcal", "Norcal"));
    db.seed_region(Region::new("socal", "Socal"));
    let core = CoreBuilder::new()
        .set_db(Arc::new(db.clone()))
        .set_config(AppConfig::for_testing())
        .build();
    (build_router(Arc::new(core)), db)
}

/// Admin user with a pre-seeded session; password hashing skipped on
/// purpose, these tests authenticate by cookie.
async fn seed_admin(db: &MockDb) -> Uuid {
    let user = User {
        id: Uuid::now_v7(),
        username: "admin".into(),
        salt: "c2FsdA==".into(),
        hashed_password: "aGFzaA==".into(),
        admin_regions: BTreeSet::from(["norcal".to_string()]),
        admin_level: Some(AdminLevel::Region),
    };
    let user_id = db.seed_user(user);
    db.replace_session_for_user(user_id, ADMIN_TOKEN)
        .await
        .unwrap();
    user_id
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn authed(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, format!("session_id={ADMIN_TOKEN}"))
        .header(header::CONTENT_TYPE, "application/json");
    match body {
        Some(value) => builder.body(Body::from(value.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn regions_listing_is_public_and_sorted() {
    let (app, _db) = test_app();
    let response = app.oneshot(get("/regions")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let names: Vec<&str> = body["regions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["display_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Norcal", "Socal"]);
}

#[tokio::test]
async fn every_response_carries_security_headers() {
    let (app, _db) = test_app();
    let response = app.oneshot(get("/regions")).await.unwrap();

    let headers = response.headers();
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-xss-protection"], "1; mode=block");
    assert!(headers.contains_key("strict-transport-security"));
    assert!(headers.contains_key("content-security-policy"));
}

#[tokio::test]
async fn cors_headers_only_for_allowed_origins() {
    let (app, _db) = test_app();

    let allowed = Request::builder()
        .uri("/regions")
        .header(header::ORIGIN, "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(allowed).await.unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
        "true"
    );

    let denied = Request::builder()
        .uri("/regions")
        .header(header::ORIGIN, "https://evil.example")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(denied).await.unwrap();
    assert!(
        !response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
    );
}

#[tokio::test]
async fn unknown_region_is_404() {
    let (app, _db) = test_app();
    let response = app.oneshot(get("/narnia/players")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn alias_lookup_is_case_insensitive() {
    let (app, db) = test_app();
    let gar = db.seed_player(Player::new("gaR", "norcal"));

    let response = app
        .oneshot(get("/norcal/players?alias=GAR"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let players = body["players"].as_array().unwrap();
    assert_eq!(players.len(), 1);
    assert_eq!(players[0]["id"], gar.to_string());
}

#[tokio::test]
async fn player_edit_requires_a_session() {
    let (app, db) = test_app();
    let id = db.seed_player(Player::new("gar", "norcal"));

    let request = Request::builder()
        .method("PUT")
        .uri(format!("/norcal/players/{id}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({"name": "gaR"}).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_can_edit_player_aliases() {
    let (app, db) = test_app();
    seed_admin(&db).await;
    let id = db.seed_player(Player::new("gar", "norcal"));

    let request = authed(
        "PUT",
        &format!("/norcal/players/{id}"),
        Some(json!({"aliases": ["GAR", "garr"]})),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["aliases"], json!(["gar", "garr"]));

    // dropping the player's own name from the aliases is rejected
    let request = authed(
        "PUT",
        &format!("/norcal/players/{id}"),
        Some(json!({"aliases": ["someone else"]})),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_ids_are_400() {
    let (app, _db) = test_app();
    let response = app
        .oneshot(get("/norcal/players/not-a-uuid"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn submitted_bracket_becomes_pending_and_finalizes() {
    let (app, db) = test_app();
    seed_admin(&db).await;
    db.seed_player(Player::new("gar", "norcal"));

    let bracket = json!({
        "type": "other",
        "data": json!({
            "name": "Weekly 12",
            "date": "10/16/13",
            "players": ["gar", "Scar"],
            "matches": [{"winner": "gar", "loser": "Scar"}]
        })
        .to_string(),
    });
    let response = app
        .clone()
        .oneshot(authed("POST", "/norcal/tournaments", Some(bracket)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let pending_id = body_json(response).await["id"].as_str().unwrap().to_string();

    // the seeded alias resolved, the unknown one did not
    let response = app
        .clone()
        .oneshot(authed(
            "GET",
            &format!("/norcal/tournaments/{pending_id}"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let detail = body_json(response).await;
    let mappings = detail["tournament"]["alias_mappings"].as_array().unwrap();
    let scar = mappings
        .iter()
        .find(|m| m["player_alias"] == "Scar")
        .unwrap();
    assert!(scar["player_id"].is_null());

    let response = app
        .clone()
        .oneshot(authed(
            "POST",
            &format!("/norcal/tournaments/{pending_id}/finalize"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let finalized = body_json(response).await;
    assert_eq!(finalized["success"], json!(true));

    // a new player was created for the unmapped alias
    let response = app
        .oneshot(get("/norcal/players?alias=scar"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["players"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn provider_without_scraper_is_a_400_with_message() {
    let (app, db) = test_app();
    seed_admin(&db).await;

    let response = app
        .oneshot(authed(
            "POST",
            "/norcal/tournaments",
            Some(json!({"type": "challonge", "data": "https://challonge.com/x"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("no scraper configured")
    );
}

#[tokio::test]
async fn rankings_404_until_generated() {
    let (app, db) = test_app();
    seed_admin(&db).await;

    let response = app
        .clone()
        .oneshot(get("/norcal/rankings"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(authed("POST", "/norcal/rankings", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/norcal/rankings")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["ranking_entries"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn login_sets_cookie_and_second_login_invalidates_first() {
    let (app, db) = test_app();
    // real credentials for the login path
    let user = User::new(
        "gar_admin",
        "correct horse",
        BTreeSet::from(["norcal".to_string()]),
        None,
    );
    db.seed_user(user);

    let login = |app: Router| async move {
        let request = Request::builder()
            .method("PUT")
            .uri("/users/session")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({"username": "gar_admin", "password": "correct horse"}).to_string(),
            ))
            .unwrap();
        app.oneshot(request).await.unwrap()
    };

    let first = login(app.clone()).await;
    assert_eq!(first.status(), StatusCode::OK);
    let first_cookie = first.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .to_string();
    assert!(first_cookie.starts_with("session_id="));

    let second = login(app.clone()).await;
    assert_eq!(second.status(), StatusCode::OK);

    // the first token no longer resolves to a user
    let request = Request::builder()
        .uri("/users/session")
        .header(header::COOKIE, first_cookie.split(';').next().unwrap())
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn wrong_password_and_unknown_user_look_identical() {
    let (app, db) = test_app();
    let user = User::new(
        "gar_admin",
        "correct horse",
        BTreeSet::from(["norcal".to_string()]),
        None,
    );
    db.seed_user(user);

    let attempt = |app: Router, username: &str| {
        let body = json!({"username": username, "password": "wrong"}).to_string();
        async move {
            let request = Request::builder()
                .method("PUT")
                .uri("/users/session")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap();
            app.oneshot(request).await.unwrap()
        }
    };

    let known = attempt(app.clone(), "gar_admin").await;
    let unknown = attempt(app.clone(), "nobody").await;
    assert_eq!(known.status(), StatusCode::FORBIDDEN);
    assert_eq!(unknown.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(known).await, body_json(unknown).await);
}

#[tokio::test]
async fn logout_expires_the_cookie() {
    let (app, db) = test_app();
    seed_admin(&db).await;

    let response = app
        .clone()
        .oneshot(authed("DELETE", "/users/session", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.contains("session_id="));
    assert!(set_cookie.contains("Max-Age=0") || set_cookie.contains("expires"));

    // the session is gone server-side too
    let response = app
        .oneshot(authed("GET", "/users/session", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
