//! Integration tests for routine and meal plan ownership rules

mod common;

use axum::http::StatusCode;
use common::id_of;
use fitpro_shared::models::Role;
use serde_json::json;

#[tokio::test]
#[ignore = "requires database"]
async fn test_trainer_cannot_modify_another_trainers_routine() {
    let app = common::TestApp::new().await;
    let owner = app.create_user(Role::Trainer, None).await;
    let intruder = app.create_user(Role::Trainer, None).await;
    let admin = app.create_user(Role::Admin, None).await;
    let routine = app.create_routine(&owner.token).await;
    let path = format!("/api/v1/routines/{routine}");

    let (status, _) = app
        .put(&path, &intruder.token, json!({"name": "Robada"}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.delete(&path, &intruder.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .put(&path, &admin.token, json!({"name": "Fuerza Total II"}))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["name"], "Fuerza Total II");
    assert_eq!(body["description"], "Rutina completa de fuerza");

    let (status, _) = app.delete(&path, &admin.token).await;
    assert_eq!(status, StatusCode::OK);

    // Soft-deleted routines disappear from by-id access
    let (status, _) = app.get(&path, &owner.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_routine_update_of_missing_id_is_not_found() {
    let app = common::TestApp::new().await;
    let trainer = app.create_user(Role::Trainer, None).await;

    let (status, _) = app
        .put(
            &format!("/api/v1/routines/{}", uuid::Uuid::new_v4()),
            &trainer.token,
            json!({"name": "Nada"}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_client_sees_only_assigned_routines() {
    let app = common::TestApp::new().await;
    let trainer = app.create_user(Role::Trainer, None).await;
    let client = app.create_user(Role::Client, Some(trainer.id)).await;
    let assigned = app.create_routine(&trainer.token).await;
    let other = app.create_routine(&trainer.token).await;

    let (status, body) = app
        .post(
            "/api/v1/assignments",
            Some(&trainer.token),
            json!({"client_id": client.id, "routine_id": assigned}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (status, body) = app.get("/api/v1/routines?limit=100", &client.token).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<String> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| id_of(r).to_string())
        .collect();
    assert_eq!(ids, vec![assigned.to_string()]);

    let (status, _) = app
        .get(&format!("/api/v1/routines/{assigned}"), &client.token)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .get(&format!("/api/v1/routines/{other}"), &client.token)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_routine_rejects_unknown_exercise() {
    let app = common::TestApp::new().await;
    let trainer = app.create_user(Role::Trainer, None).await;

    let (status, body) = app
        .post(
            "/api/v1/routines",
            Some(&trainer.token),
            json!({
                "name": "Fantasma",
                "description": "Referencia un ejercicio inexistente",
                "duration": "30 min",
                "exercises": [
                    {"exercise_id": uuid::Uuid::new_v4(), "sets": 3, "reps": "10", "rest": "60s", "order": 1}
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "exercises");
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_clients_cannot_create_meal_plans() {
    let app = common::TestApp::new().await;
    let client = app.create_user(Role::Client, None).await;

    let (status, _) = app
        .post(
            "/api/v1/meal-plans",
            Some(&client.token),
            json!({
                "name": "Plan Propio",
                "description": "Intento de cliente",
                "calories": 2000,
                "duration": 30,
                "meals": [{"name": "Desayuno", "time": "08:00", "foods": ["Avena"], "calories": 400}]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_meal_plan_partial_update() {
    let app = common::TestApp::new().await;
    let trainer = app.create_user(Role::Trainer, None).await;

    let (status, body) = app
        .post(
            "/api/v1/meal-plans",
            Some(&trainer.token),
            json!({
                "name": "Plan Definición",
                "description": "Plan bajo en calorías",
                "calories": 2000,
                "duration": 30,
                "meals": [{"name": "Desayuno", "time": "08:00", "foods": ["Avena 50g"], "calories": 400}],
                "tags": ["Definicion", "definicion"]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["tags"], json!(["definicion"]));
    let plan = id_of(&body);

    let (status, body) = app
        .put(
            &format!("/api/v1/meal-plans/{plan}"),
            &trainer.token,
            json!({"calories": 1800}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["calories"], 1800);
    assert_eq!(body["meals"][0]["name"], "Desayuno");
}
