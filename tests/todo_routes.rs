use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use listkeeper::{
    db::{todo_repo, user_repo},
    state::AppState,
    test_helpers::{bearer_for, test_router, test_state},
};

async fn send(state: &Arc<AppState>, request: Request<Body>) -> axum::response::Response {
    test_router(state.clone())
        .oneshot(request)
        .await
        .expect("request should succeed")
}

async fn json_response(state: &Arc<AppState>, request: Request<Body>) -> (StatusCode, Value) {
    let response = send(state, request).await;
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should read");
    let json: Value = serde_json::from_slice(&bytes).expect("body should be json");
    (status, json)
}

fn get(uri: impl AsRef<str>, auth: &str) -> Request<Body> {
    Request::builder()
        .uri(uri.as_ref())
        .header("authorization", auth)
        .body(Body::empty())
        .unwrap()
}

fn with_json(method: &str, uri: impl AsRef<str>, auth: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri.as_ref())
        .header("authorization", auth)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn delete(uri: impl AsRef<str>, auth: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri.as_ref())
        .header("authorization", auth)
        .body(Body::empty())
        .unwrap()
}

async fn user_with_token(state: &Arc<AppState>) -> (Uuid, String) {
    let email = format!("user-{}@example.com", Uuid::new_v4());
    let user = user_repo::create_user(&state.db, &email, "not-a-real-hash")
        .await
        .expect("create user");
    let token = bearer_for(&user.id);
    (user.id, token)
}

async fn create_list(state: &Arc<AppState>, auth: &str, title: &str) -> Uuid {
    let (status, list) =
        json_response(state, with_json("POST", "/lists", auth, json!({ "title": title }))).await;
    assert_eq!(status, StatusCode::CREATED);
    Uuid::parse_str(list["id"].as_str().unwrap()).unwrap()
}

async fn create_task(state: &Arc<AppState>, auth: &str, list_id: Uuid, title: &str) -> Uuid {
    let (status, task) = json_response(
        state,
        with_json(
            "POST",
            format!("/lists/{list_id}/tasks"),
            auth,
            json!({ "title": title }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    Uuid::parse_str(task["id"].as_str().unwrap()).unwrap()
}

async fn displayed_titles(state: &Arc<AppState>, auth: &str, list_id: Uuid) -> Vec<String> {
    let (status, tasks) = json_response(state, get(format!("/lists/{list_id}/tasks"), auth)).await;
    assert_eq!(status, StatusCode::OK);
    tasks
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn requests_without_token_are_unauthorized() {
    let state = test_state().await;
    let request = Request::builder()
        .method("POST")
        .uri("/lists")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "title": "nope" }).to_string()))
        .unwrap();
    let response = send(&state, request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn list_lifecycle() {
    let state = test_state().await;
    let (_, auth) = user_with_token(&state).await;

    let list_id = create_list(&state, &auth, "groceries").await;
    let task_id = create_task(&state, &auth, list_id, "milk").await;

    let (status, lists) = json_response(&state, get("/lists", &auth)).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = lists
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["groceries"]);

    let (status, renamed) = json_response(
        &state,
        with_json(
            "PATCH",
            format!("/lists/{list_id}"),
            &auth,
            json!({ "title": "weekend groceries" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["title"].as_str().unwrap(), "weekend groceries");

    let response = send(&state, delete(format!("/lists/{list_id}"), &auth)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (status, lists) = json_response(&state, get("/lists", &auth)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(lists.as_array().unwrap().is_empty());

    // The list is gone and so are its task rows, not just the route to them.
    let (status, _) = json_response(&state, get(format!("/lists/{list_id}/tasks"), &auth)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let orphan = todo_repo::find_task_by_id(&state.db, &task_id)
        .await
        .expect("task lookup");
    assert!(orphan.is_none());
}

#[tokio::test]
async fn empty_titles_are_rejected() {
    let state = test_state().await;
    let (_, auth) = user_with_token(&state).await;

    let (status, _) =
        json_response(&state, with_json("POST", "/lists", &auth, json!({ "title": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let list_id = create_list(&state, &auth, "groceries").await;
    let (status, _) = json_response(
        &state,
        with_json(
            "POST",
            format!("/lists/{list_id}/tasks"),
            &auth,
            json!({ "title": "" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn created_tasks_are_appended_and_displayed_newest_first() {
    let state = test_state().await;
    let (_, auth) = user_with_token(&state).await;
    let list_id = create_list(&state, &auth, "groceries").await;

    for title in ["milk", "eggs", "bread"] {
        create_task(&state, &auth, list_id, title).await;
    }

    let (status, tasks) = json_response(&state, get(format!("/lists/{list_id}/tasks"), &auth)).await;
    assert_eq!(status, StatusCode::OK);
    let pairs: Vec<(&str, i64)> = tasks
        .as_array()
        .unwrap()
        .iter()
        .map(|t| (t["title"].as_str().unwrap(), t["order"].as_i64().unwrap()))
        .collect();
    assert_eq!(pairs, vec![("bread", 3), ("eggs", 2), ("milk", 1)]);
}

#[tokio::test]
async fn task_fields_can_be_updated() {
    let state = test_state().await;
    let (_, auth) = user_with_token(&state).await;
    let list_id = create_list(&state, &auth, "groceries").await;
    let task_id = create_task(&state, &auth, list_id, "milk").await;

    let (status, task) = json_response(
        &state,
        with_json(
            "PATCH",
            format!("/tasks/{task_id}"),
            &auth,
            json!({ "is_done": true }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(task["is_done"].as_bool(), Some(true));

    let (status, task) = json_response(
        &state,
        with_json(
            "PATCH",
            format!("/tasks/{task_id}"),
            &auth,
            json!({ "title": "oat milk", "is_done": false }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(task["title"].as_str(), Some("oat milk"));
    assert_eq!(task["is_done"].as_bool(), Some(false));

    let (status, _) = json_response(
        &state,
        with_json("PATCH", format!("/tasks/{task_id}"), &auth, json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = json_response(
        &state,
        with_json(
            "PATCH",
            format!("/tasks/{task_id}"),
            &auth,
            json!({ "title": " " }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn foreign_records_are_forbidden() {
    let state = test_state().await;
    let (_, owner_auth) = user_with_token(&state).await;
    let (_, intruder_auth) = user_with_token(&state).await;
    let list_id = create_list(&state, &owner_auth, "private").await;
    let task_id = create_task(&state, &owner_auth, list_id, "secret task").await;

    let (status, body) = json_response(
        &state,
        with_json(
            "PATCH",
            format!("/lists/{list_id}"),
            &intruder_auth,
            json!({ "title": "mine now" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["error"].as_str(),
        Some("This to-do list is not yours!")
    );

    let (status, body) = json_response(
        &state,
        with_json(
            "PUT",
            format!("/tasks/{task_id}/order"),
            &intruder_auth,
            json!({ "order": 1 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"].as_str(), Some("This task is not yours!"));

    let response = send(&state, delete(format!("/tasks/{task_id}"), &intruder_auth)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn missing_records_are_not_found() {
    let state = test_state().await;
    let (_, auth) = user_with_token(&state).await;

    let (status, _) = json_response(
        &state,
        with_json(
            "PATCH",
            format!("/lists/{}", Uuid::new_v4()),
            &auth,
            json!({ "title": "ghost" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = json_response(
        &state,
        with_json(
            "PUT",
            format!("/tasks/{}/order", Uuid::new_v4()),
            &auth,
            json!({ "order": 1 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reorder_endpoint_moves_a_task() {
    let state = test_state().await;
    let (_, auth) = user_with_token(&state).await;
    let list_id = create_list(&state, &auth, "five tasks").await;

    let mut ids = std::collections::HashMap::new();
    for title in ["first", "second", "third", "fourth", "fifth"] {
        ids.insert(title, create_task(&state, &auth, list_id, title).await);
    }

    let response = send(
        &state,
        with_json(
            "PUT",
            format!("/tasks/{}/order", ids["fourth"]),
            &auth,
            json!({ "order": 2 }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert_eq!(
        displayed_titles(&state, &auth, list_id).await,
        vec!["fifth", "third", "second", "fourth", "first"],
    );
}

#[tokio::test]
async fn reorder_endpoint_clamps_out_of_range_targets() {
    let state = test_state().await;
    let (_, auth) = user_with_token(&state).await;
    let list_id = create_list(&state, &auth, "five tasks").await;

    let mut ids = std::collections::HashMap::new();
    for title in ["first", "second", "third", "fourth", "fifth"] {
        ids.insert(title, create_task(&state, &auth, list_id, title).await);
    }

    let response = send(
        &state,
        with_json(
            "PUT",
            format!("/tasks/{}/order", ids["fifth"]),
            &auth,
            json!({ "order": -123 }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        displayed_titles(&state, &auth, list_id).await,
        vec!["fourth", "third", "second", "first", "fifth"],
    );

    let response = send(
        &state,
        with_json(
            "PUT",
            format!("/tasks/{}/order", ids["fifth"]),
            &auth,
            json!({ "order": 999 }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        displayed_titles(&state, &auth, list_id).await,
        vec!["fifth", "fourth", "third", "second", "first"],
    );
}

#[tokio::test]
async fn deleting_a_task_renumbers_the_rest() {
    let state = test_state().await;
    let (_, auth) = user_with_token(&state).await;
    let list_id = create_list(&state, &auth, "groceries").await;

    let mut ids = std::collections::HashMap::new();
    for title in ["milk", "eggs", "bread"] {
        ids.insert(title, create_task(&state, &auth, list_id, title).await);
    }

    let response = send(&state, delete(format!("/tasks/{}", ids["eggs"]), &auth)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (status, tasks) = json_response(&state, get(format!("/lists/{list_id}/tasks"), &auth)).await;
    assert_eq!(status, StatusCode::OK);
    let pairs: Vec<(&str, i64)> = tasks
        .as_array()
        .unwrap()
        .iter()
        .map(|t| (t["title"].as_str().unwrap(), t["order"].as_i64().unwrap()))
        .collect();
    assert_eq!(pairs, vec![("bread", 2), ("milk", 1)]);
}
