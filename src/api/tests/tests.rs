use axum::http::{Method, StatusCode};
use tower::ServiceExt;

use crate::test_support::{self, json_request, read_json};

#[tokio::test]
async fn assemble_publish_and_fetch_lr_test() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "admin@example.com", "password123").await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let payload = test_support::lr_manual_payload("Full LR Simulation", 120);
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/tests/manual", Some(&token), Some(payload)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = read_json(response).await;
    assert_eq!(created["question_count"], 200);
    assert_eq!(created["status"], "draft");
    let test_id = created["id"].as_str().expect("test id").to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/tests/{test_id}/publish"),
            Some(&token),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let published = read_json(response).await;
    assert_eq!(published["status"], "published");
    assert!(published["published_at"].is_string());

    let response = ctx
        .app
        .clone()
        .oneshot(json_request(Method::GET, &format!("/api/v1/tests/{test_id}"), Some(&token), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let detail = read_json(response).await;
    let questions = detail["questions"].as_array().expect("questions");
    assert_eq!(questions.len(), 200);

    // Delivered snapshots never expose the answer key.
    let first_option = &questions[0]["snapshot"]["options"][0];
    assert!(first_option.get("is_correct").is_none());
}

#[tokio::test]
async fn assembly_rejects_wrong_question_total() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "admin@example.com", "password123").await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let mut payload = test_support::lr_manual_payload("Short LR", 120);
    payload["parts"][0]["questions"].as_array_mut().expect("questions").pop();

    let response = ctx
        .app
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/tests/manual", Some(&token), Some(payload)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    let detail = body["detail"].as_str().expect("detail");
    assert!(detail.contains("200"), "error should name the expected total: {detail}");
    assert!(detail.contains("199"), "error should name the actual total: {detail}");
}

#[tokio::test]
async fn assembly_rejects_part_2_with_four_options() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "admin@example.com", "password123").await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let mut payload = test_support::lr_manual_payload("Bad Part 2", 120);
    // Move one four-option question into Part 2.
    let moved = payload["parts"][0]["questions"].as_array_mut().expect("questions").pop().unwrap();
    payload["parts"]
        .as_array_mut()
        .expect("parts")
        .push(serde_json::json!({"part_id": 2, "questions": [moved]}));

    let response = ctx
        .app
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/tests/manual", Some(&token), Some(payload)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert!(body["detail"].as_str().expect("detail").contains("exactly 3 options"));
}

async fn create_bank_writing_questions(
    ctx: &test_support::TestContext,
    token: &str,
) -> Vec<String> {
    let mut ids = Vec::new();
    for (part_id, count) in [(8, 5usize), (9, 2), (10, 1)] {
        for index in 0..count {
            let response = ctx
                .app
                .clone()
                .oneshot(json_request(
                    Method::POST,
                    "/api/v1/questions",
                    Some(token),
                    Some(serde_json::json!({
                        "part_id": part_id,
                        "content": format!("original prompt {part_id}-{index}"),
                    })),
                ))
                .await
                .expect("response");
            assert_eq!(response.status(), StatusCode::CREATED);
            let body = read_json(response).await;
            ids.push(body["id"].as_str().expect("question id").to_string());
        }
    }
    ids
}

#[tokio::test]
async fn bank_edits_do_not_change_existing_snapshots() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "admin@example.com", "password123").await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let question_ids = create_bank_writing_questions(&ctx, &token).await;

    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/tests/from-bank",
            Some(&token),
            Some(serde_json::json!({
                "title": "Writing From Bank",
                "skill": "writing",
                "test_type": "practice",
                "duration_minutes": 60,
                "parts": [
                    {"part_id": 8, "question_ids": &question_ids[0..5]},
                    {"part_id": 9, "question_ids": &question_ids[5..7]},
                    {"part_id": 10, "question_ids": &question_ids[7..8]},
                ],
            })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = read_json(response).await;
    let test_id = created["id"].as_str().expect("test id").to_string();

    let fetch_first_content = |detail: serde_json::Value| {
        detail["questions"][0]["snapshot"]["content"].as_str().map(str::to_string)
    };

    let response = ctx
        .app
        .clone()
        .oneshot(json_request(Method::GET, &format!("/api/v1/tests/{test_id}"), Some(&token), None))
        .await
        .expect("response");
    let detail = read_json(response).await;
    let test_question_id = detail["questions"][0]["id"].as_str().expect("tq id").to_string();
    assert_eq!(fetch_first_content(detail).as_deref(), Some("original prompt 8-0"));

    // Edit the bank row the first test question was sourced from.
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            Method::PATCH,
            &format!("/api/v1/questions/{}", question_ids[0]),
            Some(&token),
            Some(serde_json::json!({"content": "edited prompt"})),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    // The delivered snapshot is unchanged.
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(Method::GET, &format!("/api/v1/tests/{test_id}"), Some(&token), None))
        .await
        .expect("response");
    let detail = read_json(response).await;
    assert_eq!(fetch_first_content(detail).as_deref(), Some("original prompt 8-0"));

    // The explicit refresh action is the only propagation path.
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/tests/{test_id}/questions/{test_question_id}/refresh-snapshot"),
            Some(&token),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .clone()
        .oneshot(json_request(Method::GET, &format!("/api/v1/tests/{test_id}"), Some(&token), None))
        .await
        .expect("response");
    let detail = read_json(response).await;
    assert_eq!(fetch_first_content(detail).as_deref(), Some("edited prompt"));
}

#[tokio::test]
async fn version_clone_links_parent_and_copies_snapshots() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_admin(ctx.state.db(), "admin@example.com", "password123").await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let payload = test_support::writing_manual_payload("Writing v1", 60);
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/tests/manual", Some(&token), Some(payload)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = read_json(response).await;
    let test_id = created["id"].as_str().expect("test id").to_string();

    ctx.app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/tests/{test_id}/publish"),
            Some(&token),
            None,
        ))
        .await
        .expect("response");

    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/tests/{test_id}/versions"),
            Some(&token),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let version = read_json(response).await;
    assert_eq!(version["parent_test_id"], test_id.as_str());
    assert_eq!(version["status"], "draft");
    assert_eq!(version["question_count"], 8);
}
