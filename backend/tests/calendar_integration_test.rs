//! Integration tests for calendar event visibility and ownership

mod common;

use axum::http::StatusCode;
use common::id_of;
use fitpro_shared::models::Role;
use serde_json::{json, Value};

fn event(title: &str) -> Value {
    json!({
        "title": title,
        "date": "2030-01-15T09:00:00Z",
        "type": "workout",
        "duration": 60
    })
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_client_creates_own_event_with_defaults() {
    let app = common::TestApp::new().await;
    let client = app.create_user(Role::Client, None).await;

    let (status, body) = app
        .post("/api/v1/calendar", Some(&client.token), event("Piernas"))
        .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["user_id"], client.id.to_string());
    assert_eq!(body["completed"], false);
    assert_eq!(body["reminder"]["enabled"], false);
    assert_eq!(body["reminder"]["minutes"], 15);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_client_cannot_create_event_for_another_user() {
    let app = common::TestApp::new().await;
    let client = app.create_user(Role::Client, None).await;
    let other = app.create_user(Role::Client, None).await;

    let mut body = event("Ajeno");
    body["user_id"] = json!(other.id);
    let (status, _) = app.post("/api/v1/calendar", Some(&client.token), body).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_trainer_event_for_client_defaults_trainer() {
    let app = common::TestApp::new().await;
    let trainer = app.create_user(Role::Trainer, None).await;
    let client = app.create_user(Role::Client, Some(trainer.id)).await;
    let stranger = app.create_user(Role::Client, None).await;

    let mut body = event("Sesión con entrenador");
    body["user_id"] = json!(client.id);
    let (status, created) = app
        .post("/api/v1/calendar", Some(&trainer.token), body)
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["trainer_id"], trainer.id.to_string());
    assert_eq!(created["trainer"]["id"], trainer.id.to_string());
    let path = format!("/api/v1/calendar/{}", id_of(&created));

    // Both participants can read it, nobody else can
    let (status, _) = app.get(&path, &client.token).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get(&path, &stranger.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .patch(&path, &stranger.token, json!({"completed": true}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .patch(&path, &client.token, json!({"completed": true}))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["completed"], true);
    assert_eq!(body["title"], "Sesión con entrenador");
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_event_for_missing_user_is_not_found() {
    let app = common::TestApp::new().await;
    let admin = app.create_user(Role::Admin, None).await;

    let mut body = event("Nadie");
    body["user_id"] = json!(uuid::Uuid::new_v4());
    let (status, _) = app.post("/api/v1/calendar", Some(&admin.token), body).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_event_validation() {
    let app = common::TestApp::new().await;
    let client = app.create_user(Role::Client, None).await;

    let (status, body) = app
        .post(
            "/api/v1/calendar",
            Some(&client.token),
            json!({
                "title": "  ",
                "date": "2030-01-15T09:00:00Z",
                "type": "party",
                "duration": 0
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["field"].as_str())
        .collect();
    assert!(fields.contains(&"title"));
    assert!(fields.contains(&"type"));
    assert!(fields.contains(&"duration"));
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_list_respects_date_range_and_owner() {
    let app = common::TestApp::new().await;
    let client = app.create_user(Role::Client, None).await;
    let other = app.create_user(Role::Client, None).await;

    for (user, date) in [
        (&client, "2030-03-01T08:00:00Z"),
        (&client, "2030-05-01T08:00:00Z"),
        (&other, "2030-03-02T08:00:00Z"),
    ] {
        let mut body = event("Rango");
        body["date"] = json!(date);
        let (status, _) = app.post("/api/v1/calendar", Some(&user.token), body).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app
        .get(
            "/api/v1/calendar?start_date=2030-02-01T00:00:00Z&end_date=2030-04-01T00:00:00Z",
            &client.token,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["user_id"], client.id.to_string());

    let (status, _) = app
        .get(
            "/api/v1/calendar?start_date=2030-04-01T00:00:00Z&end_date=2030-02-01T00:00:00Z",
            &client.token,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_delete_event() {
    let app = common::TestApp::new().await;
    let client = app.create_user(Role::Client, None).await;
    let other = app.create_user(Role::Client, None).await;

    let (_, created) = app
        .post("/api/v1/calendar", Some(&client.token), event("Borrar"))
        .await;
    let path = format!("/api/v1/calendar/{}", id_of(&created));

    let (status, _) = app.delete(&path, &other.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.delete(&path, &client.token).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get(&path, &client.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
