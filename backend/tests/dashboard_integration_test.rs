//! Integration tests for the role-specific dashboard statistics

mod common;

use std::collections::BTreeMap;

use axum::http::StatusCode;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use common::{id_of, TestApp, TestUser};
use fitpro_shared::models::Role;
use fitpro_shared::stats::{completion_rate, day_of_week_index, growth_rate};
use serde_json::{json, Value};

async fn add_event(
    app: &TestApp,
    user: &TestUser,
    owner: Option<uuid::Uuid>,
    event_type: &str,
    date: DateTime<Utc>,
    completed: bool,
) -> Value {
    let (status, body) = app
        .post(
            "/api/v1/calendar",
            Some(&user.token),
            json!({
                "title": format!("Sesión {event_type}"),
                "date": date,
                "type": event_type,
                "duration": 45,
                "user_id": owner,
                "completed": completed
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

fn date_of(value: &Value) -> DateTime<Utc> {
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| panic!("not a timestamp: {value}"))
}

async fn stats(app: &TestApp, user: &TestUser) -> Value {
    let (status, body) = app.get("/api/v1/dashboard/stats", &user.token).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_client_dashboard_windows() {
    let app = TestApp::new().await;
    let trainer = app.create_user(Role::Trainer, None).await;
    let client = app.create_user(Role::Client, Some(trainer.id)).await;
    let now = Utc::now();

    // Late evening UTC, so a session time zone other than UTC would shift the weekday
    let late_evening = (now - Duration::days(2))
        .date_naive()
        .and_time(NaiveTime::from_hms_opt(23, 30, 0).unwrap())
        .and_utc();

    let mut dated = vec![
        (late_evening, true),
        (now - Duration::days(3), false),
        (now + Duration::hours(1), true),
    ];
    add_event(&app, &client, None, "workout", late_evening, true).await;
    add_event(&app, &client, None, "meal", now - Duration::days(3), false).await;
    add_event(&app, &client, None, "workout", now + Duration::hours(1), true).await;
    // Outside both trailing windows
    add_event(&app, &client, None, "workout", now - Duration::days(40), true).await;

    for days in 1..=6 {
        let date = now + Duration::days(days);
        add_event(&app, &client, None, "reminder", date, false).await;
        dated.push((date, false));
    }
    let far = now + Duration::days(10);
    add_event(&app, &trainer, Some(client.id), "reminder", far, false).await;
    dated.push((far, false));

    let body = stats(&app, &client).await;
    assert_eq!(body["role"], "client");
    assert_eq!(body["total_events"], 11);
    assert_eq!(body["completed_events"], 2);
    assert_eq!(body["trainer"]["id"], trainer.id.to_string());

    let upcoming = body["upcoming_events"].as_array().unwrap();
    assert_eq!(upcoming.len(), 5);
    let dates: Vec<DateTime<Utc>> = upcoming.iter().map(|e| date_of(&e["date"])).collect();
    assert!(dates.windows(2).all(|w| w[0] <= w[1]));
    assert!(dates[0] > now && dates[0] < now + Duration::days(2));
    assert!(upcoming.iter().all(|e| e["completed"] == false));

    let monthly = &body["monthly_stats"];
    assert_eq!(monthly["workout_events"], 2);
    assert_eq!(monthly["meal_events"], 1);
    assert_eq!(monthly["completion_rate"], completion_rate(2, 10));

    let mut expected: BTreeMap<(i64, bool), i64> = BTreeMap::new();
    for (date, completed) in &dated {
        *expected
            .entry((day_of_week_index(*date) as i64, *completed))
            .or_default() += 1;
    }
    let weekly: BTreeMap<(i64, bool), i64> = body["weekly_progress"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| {
            (
                (w["day"].as_i64().unwrap(), w["completed"].as_bool().unwrap()),
                w["count"].as_i64().unwrap(),
            )
        })
        .collect();
    assert_eq!(weekly, expected);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_client_dashboard_without_activity() {
    let app = TestApp::new().await;
    let client = app.create_user(Role::Client, None).await;

    let body = stats(&app, &client).await;
    assert_eq!(body["role"], "client");
    assert_eq!(body["total_events"], 0);
    assert_eq!(body["completed_events"], 0);
    assert!(body["trainer"].is_null());
    assert_eq!(body["my_assignments"], json!([]));
    assert_eq!(body["upcoming_events"], json!([]));
    assert_eq!(body["weekly_progress"], json!([]));
    assert_eq!(body["monthly_stats"]["completion_rate"], 0);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_trainer_dashboard_progress() {
    let app = TestApp::new().await;
    let trainer = app.create_user(Role::Trainer, None).await;
    let client = app.create_user(Role::Client, Some(trainer.id)).await;
    let routine = app.create_routine(&trainer.token).await;

    let (status, active) = app
        .post(
            "/api/v1/assignments",
            Some(&trainer.token),
            json!({"client_id": client.id, "routine_id": routine, "status": "active"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{active}");
    let active = id_of(&active);

    // Pending assignments stay out of the counts and the progress summary
    let (status, _) = app
        .post(
            "/api/v1/assignments",
            Some(&trainer.token),
            json!({"client_id": client.id, "routine_id": routine}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    for completion in [80, 95] {
        let (status, body) = app
            .post(
                &format!("/api/v1/assignments/{active}/progress"),
                Some(&client.token),
                json!({"completion": completion}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    let now = Utc::now();
    for days in 1..=6 {
        add_event(&app, &trainer, None, "appointment", now - Duration::days(days), false).await;
    }
    let session = add_event(
        &app,
        &trainer,
        Some(client.id),
        "workout",
        now + Duration::days(10),
        false,
    )
    .await;

    let body = stats(&app, &trainer).await;
    assert_eq!(body["role"], "trainer");
    assert_eq!(body["my_clients"], 1);
    assert_eq!(body["my_routines"], 1);
    assert_eq!(body["my_meal_plans"], 0);
    assert_eq!(body["my_assignments"], 1);

    let clients = body["clients_list"].as_array().unwrap();
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0]["id"], client.id.to_string());

    let recent = body["recent_events"].as_array().unwrap();
    assert_eq!(recent.len(), 5);
    assert_eq!(recent[0]["id"], session["id"]);
    assert_eq!(recent[0]["user_id"], client.id.to_string());
    let dates: Vec<DateTime<Utc>> = recent.iter().map(|e| date_of(&e["date"])).collect();
    assert!(dates.windows(2).all(|w| w[0] >= w[1]));

    let progress = body["client_progress"].as_array().unwrap();
    assert_eq!(progress.len(), 1);
    assert_eq!(progress[0]["assignment_id"], active.to_string());
    assert_eq!(progress[0]["client_email"], client.email);
    assert_eq!(progress[0]["progress_count"], 2);
    assert_eq!(progress[0]["last_progress"]["completion"], 95);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_admin_dashboard_totals() {
    let app = TestApp::new().await;
    let admin = app.create_user(Role::Admin, None).await;
    let trainer = app.create_user(Role::Trainer, None).await;
    let client = app.create_user(Role::Client, Some(trainer.id)).await;
    let routine = app.create_routine(&trainer.token).await;

    let (status, _) = app
        .post(
            "/api/v1/assignments",
            Some(&trainer.token),
            json!({"client_id": client.id, "routine_id": routine, "status": "active"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // Other tests share the database, so totals are lower bounds
    let body = stats(&app, &admin).await;
    assert_eq!(body["role"], "admin");
    assert!(body["total_users"].as_i64().unwrap() >= 3);
    assert!(body["total_trainers"].as_i64().unwrap() >= 1);
    assert!(body["total_clients"].as_i64().unwrap() >= 1);
    assert!(body["total_routines"].as_i64().unwrap() >= 1);
    assert!(body["total_assignments"].as_i64().unwrap() >= 1);

    let growth = &body["user_growth"];
    let this_month = growth["this_month"].as_i64().unwrap();
    let last_month = growth["last_month"].as_i64().unwrap();
    assert!(this_month >= 3);
    let reported = growth["growth"].as_f64().unwrap();
    assert!((reported - growth_rate(this_month, last_month)).abs() < 1e-9);

    let recent = body["recent_users"].as_array().unwrap();
    assert!(!recent.is_empty() && recent.len() <= 5);
    let created: Vec<DateTime<Utc>> = recent.iter().map(|u| date_of(&u["created_at"])).collect();
    assert!(created.windows(2).all(|w| w[0] >= w[1]));

    let by_status = body["assignments_by_status"].as_array().unwrap();
    let active = by_status
        .iter()
        .find(|s| s["status"] == "active")
        .expect("active assignments are reported");
    assert!(active["count"].as_i64().unwrap() >= 1);
}
