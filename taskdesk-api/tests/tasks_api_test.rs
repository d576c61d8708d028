/// HTTP tests for the task endpoints

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::TestContext;
use serde_json::json;

fn in_days(days: i64) -> String {
    (Utc::now() + Duration::days(days)).to_rfc3339()
}

#[tokio::test]
async fn test_create_task_returns_resolved_view() {
    let ctx = TestContext::new();
    let user = ctx.create_user("John Doe", "john@example.com").await;

    let (status, body) = ctx
        .post(
            "/api/tasks",
            json!({
                "title": "Test Task",
                "description": "Test Description",
                "priority": "high",
                "dueDate": in_days(7),
                "assignedTo": user,
                "tags": ["backend", "api"]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    let task = &body["data"];
    assert_eq!(task["title"], "Test Task");
    assert_eq!(task["status"], "pending");
    assert_eq!(task["priority"], "high");
    assert_eq!(task["assignedTo"]["id"], user.as_str());
    assert_eq!(task["assignedTo"]["name"], "John Doe");
    assert_eq!(task["assignedTo"]["email"], "john@example.com");
    assert_eq!(task["createdBy"]["id"], user.as_str());
    assert_eq!(task["tags"], json!(["backend", "api"]));
    assert_eq!(task["progress"], 0);
    assert_eq!(task["summary"]["isOverdue"], false);
    assert!(task["completedAt"].is_null());
}

#[tokio::test]
async fn test_create_task_unknown_assignee() {
    let ctx = TestContext::new();
    let (status, body) = ctx
        .post(
            "/api/tasks",
            json!({
                "title": "Orphan",
                "description": "Nobody owns this",
                "dueDate": in_days(1),
                "assignedTo": uuid::Uuid::new_v4().to_string()
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Assigned user not found");

    let (_, list) = ctx.get("/api/tasks").await;
    assert_eq!(list["pagination"]["total"], 0);
}

#[tokio::test]
async fn test_create_task_validation() {
    let ctx = TestContext::new();
    let user = ctx.create_user("John Doe", "john@example.com").await;

    let (status, body) = ctx
        .post(
            "/api/tasks",
            json!({
                "title": "a".repeat(101),
                "description": "Too long a title",
                "dueDate": in_days(1),
                "assignedTo": user
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Title cannot be more than 100 characters");
    assert_eq!(body["details"][0]["field"], "title");

    let (status, body) = ctx.post("/api/tasks", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["assignedTo", "description", "dueDate", "title"]);
}

#[tokio::test]
async fn test_get_task() {
    let ctx = TestContext::new();
    let user = ctx.create_user("John Doe", "john@example.com").await;
    let id = ctx.create_task("Read me", &user, &in_days(3)).await;

    let (status, body) = ctx.get(&format!("/api/tasks/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id.as_str());
    assert_eq!(body["data"]["assignedTo"]["name"], "John Doe");

    let (status, body) = ctx
        .get(&format!("/api/tasks/{}", uuid::Uuid::new_v4()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Task not found");

    let (status, _) = ctx.get("/api/tasks/not-an-id").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_tasks_with_filters() {
    let ctx = TestContext::new();
    let john = ctx.create_user("John Doe", "john@example.com").await;
    let jane = ctx.create_user("Jane Doe", "jane@example.com").await;

    for i in 0..3 {
        ctx.create_task(&format!("John {}", i), &john, &in_days(5)).await;
    }
    let janes = ctx.create_task("Jane 0", &jane, &in_days(5)).await;
    let (status, _) = ctx
        .patch(
            &format!("/api/tasks/{}/status", janes),
            json!({ "status": "in-progress" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx.get("/api/tasks?limit=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["pagination"]["total"], 4);
    assert_eq!(body["pagination"]["pages"], 2);

    let (_, body) = ctx.get(&format!("/api/tasks?assignedTo={}", john)).await;
    assert_eq!(body["pagination"]["total"], 3);

    let (_, body) = ctx.get("/api/tasks?status=in-progress").await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["id"], janes.as_str());
    assert_eq!(body["data"][0]["progress"], 50);

    let (status, body) = ctx.get("/api/tasks?status=bogus").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "status");
}

#[tokio::test]
async fn test_update_task() {
    let ctx = TestContext::new();
    let john = ctx.create_user("John Doe", "john@example.com").await;
    let jane = ctx.create_user("Jane Doe", "jane@example.com").await;
    let id = ctx.create_task("Original", &john, &in_days(2)).await;

    let (status, body) = ctx
        .put(
            &format!("/api/tasks/{}", id),
            json!({ "title": "Updated", "assignedTo": jane }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Updated");
    assert_eq!(body["data"]["description"], "Original description");
    assert_eq!(body["data"]["assignedTo"]["name"], "Jane Doe");
    assert_eq!(body["data"]["createdBy"]["name"], "John Doe");

    let (status, body) = ctx
        .put(
            &format!("/api/tasks/{}", id),
            json!({ "assignedTo": uuid::Uuid::new_v4().to_string() }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Assigned user not found");

    let (status, body) = ctx
        .put(&format!("/api/tasks/{}", id), json!({ "priority": "whenever" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "priority");

    let (status, _) = ctx
        .put(
            &format!("/api/tasks/{}", uuid::Uuid::new_v4()),
            json!({ "title": "Ghost" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_task_is_hard() {
    let ctx = TestContext::new();
    let user = ctx.create_user("John Doe", "john@example.com").await;
    let id = ctx.create_task("Doomed", &user, &in_days(1)).await;

    let (status, body) = ctx.delete(&format!("/api/tasks/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "data": {} }));

    let (status, _) = ctx.get(&format!("/api/tasks/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = ctx.delete(&format!("/api/tasks/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Task not found");
}

#[tokio::test]
async fn test_add_comment() {
    let ctx = TestContext::new();
    let john = ctx.create_user("John Doe", "john@example.com").await;
    let jane = ctx.create_user("Jane Doe", "jane@example.com").await;
    let id = ctx.create_task("Discuss", &john, &in_days(1)).await;

    let (status, body) = ctx
        .post(
            &format!("/api/tasks/{}/comments", id),
            json!({ "userId": jane, "text": "Looks good" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let comments = body["data"]["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["text"], "Looks good");
    assert_eq!(comments[0]["user"]["id"], jane.as_str());
    assert_eq!(comments[0]["user"]["name"], "Jane Doe");
    assert!(comments[0]["user"].get("email").is_none());

    let (status, body) = ctx
        .post(
            &format!("/api/tasks/{}/comments", id),
            json!({ "userId": jane, "text": "" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please add a comment");

    let (status, _) = ctx
        .post(
            &format!("/api/tasks/{}/comments", uuid::Uuid::new_v4()),
            json!({ "userId": jane, "text": "Anyone?" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_status() {
    let ctx = TestContext::new();
    let user = ctx.create_user("John Doe", "john@example.com").await;
    let id = ctx.create_task("Finish me", &user, &in_days(1)).await;
    let uri = format!("/api/tasks/{}/status", id);

    let (status, body) = ctx.patch(&uri, json!({ "status": "completed" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "completed");
    assert_eq!(body["data"]["progress"], 100);
    let completed_at = body["data"]["completedAt"].clone();
    assert!(completed_at.is_string());

    // Leaving completed keeps the stamp
    let (_, body) = ctx.patch(&uri, json!({ "status": "pending" })).await;
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["completedAt"], completed_at);

    let (status, body) = ctx.patch(&uri, json!({ "status": "done" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "status");

    let (status, body) = ctx.patch(&uri, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please provide a status");
}

#[tokio::test]
async fn test_overdue_tasks() {
    let ctx = TestContext::new();
    let user = ctx.create_user("John Doe", "john@example.com").await;
    let late = ctx.create_task("Late", &user, &in_days(-1)).await;
    ctx.create_task("On time", &user, &in_days(1)).await;

    let (status, body) = ctx.get("/api/tasks/overdue").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["id"], late.as_str());
    assert_eq!(body["data"][0]["summary"]["isOverdue"], true);
    assert!(body.get("pagination").is_none());

    ctx.patch(
        &format!("/api/tasks/{}/status", late),
        json!({ "status": "completed" }),
    )
    .await;
    let (_, body) = ctx.get("/api/tasks/overdue").await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_tasks_by_user() {
    let ctx = TestContext::new();
    let john = ctx.create_user("John Doe", "john@example.com").await;
    let jane = ctx.create_user("Jane Doe", "jane@example.com").await;
    ctx.create_task("John 1", &john, &in_days(1)).await;
    ctx.create_task("John 2", &john, &in_days(2)).await;
    ctx.create_task("Jane 1", &jane, &in_days(1)).await;

    let (status, body) = ctx.get(&format!("/api/tasks/user/{}", john)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert!(body["data"]
        .as_array()
        .unwrap()
        .iter()
        .all(|t| t["assignedTo"]["id"] == john.as_str()));

    let (status, _) = ctx.get("/api/tasks/user/not-an-id").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
