//! End-to-end router tests against an in-memory database and a mock
//! generation backend.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use medexam_api::{app, AppState};
use medexam_core::generation::QuestionGenerator;
use medexam_core::model::{AnswerOption, QuestionStatus, SourceType, ADMIN_ROLE};
use medexam_providers::MockGenerator;
use medexam_store::catalog::NewExam;
use medexam_store::questions::NewQuestion;
use medexam_store::Store;

struct TestApp {
    router: Router,
    store: Store,
}

fn test_app(generator: Arc<dyn QuestionGenerator>) -> TestApp {
    let store = Store::open_in_memory().unwrap();
    let router = app(AppState::new(store.clone(), generator));
    TestApp { router, store }
}

fn default_app() -> TestApp {
    test_app(Arc::new(MockGenerator::with_response("[]")))
}

async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn seed_exam(store: &Store) -> String {
    store
        .insert_exam(NewExam {
            name: "PLAB 1".into(),
            board: Some("GMC".into()),
            curriculum: None,
            format_prompt: Some("Write PLAB-style best-of-five questions.".into()),
        })
        .unwrap()
        .id
}

fn seed_published(store: &Store, exam_id: &str, topic_id: Option<&str>, n: usize) -> Vec<String> {
    (0..n)
        .map(|i| {
            store
                .insert_question(NewQuestion {
                    exam_id: exam_id.into(),
                    topic_id: topic_id.map(String::from),
                    stem: format!("Question {i}?"),
                    options: vec![
                        AnswerOption {
                            key: "A".into(),
                            text: "alpha".into(),
                        },
                        AnswerOption {
                            key: "B".into(),
                            text: "beta".into(),
                        },
                    ],
                    correct_answer: "A".into(),
                    difficulty_level: Some("C1".into()),
                    per_option_explanations: Some(json!({"A": "right", "B": "wrong"})),
                    status: QuestionStatus::Published,
                    source_type: SourceType::Manual,
                    created_by: "seeder".into(),
                })
                .unwrap()
                .id
        })
        .collect()
}

#[tokio::test]
async fn missing_identity_is_unauthorized() {
    let app = default_app();
    let (status, body) = send(&app.router, "GET", "/api/exam/exams", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "authentication required");
}

#[tokio::test]
async fn exam_mode_caps_and_redacts() {
    let app = default_app();
    let exam_id = seed_exam(&app.store);
    seed_published(&app.store, &exam_id, None, 80);

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/exam/attempt/start",
        Some("learner-1"),
        Some(json!({"exam_id": exam_id, "mode": "exam"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 50);
    for q in questions {
        let obj = q.as_object().unwrap();
        assert!(!obj.contains_key("correct_answer"));
        assert!(!obj.contains_key("per_option_explanations"));
        assert!(obj.contains_key("stem"));
    }
}

#[tokio::test]
async fn study_mode_returns_full_pool_with_answers() {
    let app = default_app();
    let exam_id = seed_exam(&app.store);
    seed_published(&app.store, &exam_id, None, 80);

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/exam/attempt/start",
        Some("learner-1"),
        Some(json!({"exam_id": exam_id, "mode": "study"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 80);
    assert_eq!(questions[0]["correct_answer"], "A");
}

#[tokio::test]
async fn invalid_mode_is_bad_request() {
    let app = default_app();
    let exam_id = seed_exam(&app.store);

    let (status, _) = send(
        &app.router,
        "POST",
        "/api/exam/attempt/start",
        Some("learner-1"),
        Some(json!({"exam_id": exam_id, "mode": "practice"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn correct_submit_then_complete_scores_hundred() {
    let app = default_app();
    let exam_id = seed_exam(&app.store);
    let question_ids = seed_published(&app.store, &exam_id, None, 1);

    let (_, started) = send(
        &app.router,
        "POST",
        "/api/exam/attempt/start",
        Some("learner-1"),
        Some(json!({"exam_id": exam_id, "mode": "study"})),
    )
    .await;
    let attempt_id = started["attempt_id"].as_str().unwrap().to_string();

    let (status, feedback) = send(
        &app.router,
        "POST",
        &format!("/api/exam/attempt/{attempt_id}/submit"),
        Some("learner-1"),
        Some(json!({
            "question_id": question_ids[0],
            "user_answer": "A",
            "time_spent_seconds": 42
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(feedback["is_correct"], true);
    // Study mode carries the answer and explanation for immediate feedback.
    assert_eq!(feedback["correct_answer"], "A");
    assert_eq!(feedback["explanation"]["A"], "right");

    let (status, completed) = send(
        &app.router,
        "POST",
        &format!("/api/exam/attempt/{attempt_id}/complete"),
        Some("learner-1"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completed["summary"]["total"], 1);
    assert_eq!(completed["summary"]["correct"], 1);
    assert_eq!(completed["summary"]["percentage"], 100);
    assert_eq!(completed["summary"]["time_spent_seconds"], 42);
}

#[tokio::test]
async fn exam_mode_submit_hides_answer() {
    let app = default_app();
    let exam_id = seed_exam(&app.store);
    let question_ids = seed_published(&app.store, &exam_id, None, 1);

    let (_, started) = send(
        &app.router,
        "POST",
        "/api/exam/attempt/start",
        Some("learner-1"),
        Some(json!({"exam_id": exam_id, "mode": "exam"})),
    )
    .await;
    let attempt_id = started["attempt_id"].as_str().unwrap();

    let (_, feedback) = send(
        &app.router,
        "POST",
        &format!("/api/exam/attempt/{attempt_id}/submit"),
        Some("learner-1"),
        Some(json!({"question_id": question_ids[0], "user_answer": "B"})),
    )
    .await;
    assert_eq!(feedback["is_correct"], false);
    let obj = feedback.as_object().unwrap();
    assert!(!obj.contains_key("correct_answer"));
    assert!(!obj.contains_key("explanation"));
}

#[tokio::test]
async fn duplicate_submissions_inflate_totals() {
    let app = default_app();
    let exam_id = seed_exam(&app.store);
    let question_ids = seed_published(&app.store, &exam_id, None, 1);

    let (_, started) = send(
        &app.router,
        "POST",
        "/api/exam/attempt/start",
        Some("learner-1"),
        Some(json!({"exam_id": exam_id, "mode": "study"})),
    )
    .await;
    let attempt_id = started["attempt_id"].as_str().unwrap().to_string();

    for _ in 0..2 {
        send(
            &app.router,
            "POST",
            &format!("/api/exam/attempt/{attempt_id}/submit"),
            Some("learner-1"),
            Some(json!({"question_id": question_ids[0], "user_answer": "A"})),
        )
        .await;
    }

    let (_, completed) = send(
        &app.router,
        "POST",
        &format!("/api/exam/attempt/{attempt_id}/complete"),
        Some("learner-1"),
        None,
    )
    .await;
    assert_eq!(completed["summary"]["total"], 2);
    assert_eq!(completed["summary"]["correct"], 2);
}

#[tokio::test]
async fn attempt_of_another_user_is_not_found() {
    let app = default_app();
    let exam_id = seed_exam(&app.store);
    let question_ids = seed_published(&app.store, &exam_id, None, 1);

    let (_, started) = send(
        &app.router,
        "POST",
        "/api/exam/attempt/start",
        Some("owner"),
        Some(json!({"exam_id": exam_id, "mode": "study"})),
    )
    .await;
    let attempt_id = started["attempt_id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app.router,
        "POST",
        &format!("/api/exam/attempt/{attempt_id}/submit"),
        Some("intruder"),
        Some(json!({"question_id": question_ids[0], "user_answer": "A"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "attempt not found");

    let (status, _) = send(
        &app.router,
        "POST",
        &format!("/api/exam/attempt/{attempt_id}/complete"),
        Some("intruder"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn seed_draft(store: &Store, exam_id: &str) -> String {
    store
        .insert_question(NewQuestion {
            exam_id: exam_id.into(),
            topic_id: None,
            stem: "Draft question?".into(),
            options: vec![
                AnswerOption {
                    key: "A".into(),
                    text: "alpha".into(),
                },
                AnswerOption {
                    key: "B".into(),
                    text: "beta".into(),
                },
            ],
            correct_answer: "A".into(),
            difficulty_level: None,
            per_option_explanations: None,
            status: QuestionStatus::Draft,
            source_type: SourceType::Ai,
            created_by: "admin-1".into(),
        })
        .unwrap()
        .id
}

#[tokio::test]
async fn review_flow_assign_approve_and_terminal_conflict() {
    let app = default_app();
    app.store.grant_role("admin-1", ADMIN_ROLE).unwrap();
    let exam_id = seed_exam(&app.store);
    let question_id = seed_draft(&app.store, &exam_id);

    // Non-admin cannot assign.
    let (status, _) = send(
        &app.router,
        "POST",
        &format!("/api/exam/review/{question_id}/assign"),
        Some("guru-1"),
        Some(json!({"guru_id": "guru-1"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app.router,
        "POST",
        &format!("/api/exam/review/{question_id}/assign"),
        Some("admin-1"),
        Some(json!({"guru_id": "guru-1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    // A stranger cannot approve.
    let (status, _) = send(
        &app.router,
        "POST",
        &format!("/api/exam/review/{question_id}/approve"),
        Some("guru-2"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The assignee approves with an explanation overwrite.
    let (status, _) = send(
        &app.router,
        "POST",
        &format!("/api/exam/review/{question_id}/approve"),
        Some("guru-1"),
        Some(json!({"per_option_explanations": {"A": "because"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let question = app.store.get_question(&question_id).unwrap().unwrap();
    assert_eq!(question.status, QuestionStatus::Reviewed);
    assert_eq!(question.per_option_explanations.unwrap()["A"], "because");

    // Terminal: re-assignment is a conflict, not a silent success.
    let (status, _) = send(
        &app.router,
        "POST",
        &format!("/api/exam/review/{question_id}/assign"),
        Some("admin-1"),
        Some(json!({"guru_id": "guru-2"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Audit trail has one entry per action.
    let log = app.store.review_log_for_question(&question_id).unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].notes.as_deref(), Some("Assigned to guru guru-1"));
}

#[tokio::test]
async fn reject_records_note_in_log() {
    let app = default_app();
    app.store.grant_role("admin-1", ADMIN_ROLE).unwrap();
    let exam_id = seed_exam(&app.store);
    let question_id = seed_draft(&app.store, &exam_id);

    send(
        &app.router,
        "POST",
        &format!("/api/exam/review/{question_id}/assign"),
        Some("admin-1"),
        Some(json!({"guru_id": "guru-1"})),
    )
    .await;
    let (status, _) = send(
        &app.router,
        "POST",
        &format!("/api/exam/review/{question_id}/reject"),
        Some("guru-1"),
        Some(json!({"notes": "stem is ambiguous"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let question = app.store.get_question(&question_id).unwrap().unwrap();
    assert_eq!(question.status, QuestionStatus::Rejected);
    let log = app.store.review_log_for_question(&question_id).unwrap();
    assert_eq!(log[1].notes.as_deref(), Some("stem is ambiguous"));
}

#[tokio::test]
async fn analytics_zero_state() {
    let app = default_app();
    let (status, body) = send(
        &app.router,
        "GET",
        "/api/exam/analytics",
        Some("learner-1"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["overall"]["total_attempts"], 0);
    assert_eq!(body["overall"]["accuracy"], 0);
    assert!(body["coverage_by_topic"].as_array().unwrap().is_empty());
    assert!(body["weak_areas"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn analytics_flags_weak_topic_after_three_misses() {
    let app = default_app();
    let exam_id = seed_exam(&app.store);
    let topic = app.store.insert_topic(&exam_id, "Pharmacology").unwrap();
    let question_ids = seed_published(&app.store, &exam_id, Some(&topic.id), 3);

    let (_, started) = send(
        &app.router,
        "POST",
        "/api/exam/attempt/start",
        Some("learner-1"),
        Some(json!({"exam_id": exam_id, "mode": "study"})),
    )
    .await;
    let attempt_id = started["attempt_id"].as_str().unwrap().to_string();

    for question_id in &question_ids {
        send(
            &app.router,
            "POST",
            &format!("/api/exam/attempt/{attempt_id}/submit"),
            Some("learner-1"),
            Some(json!({"question_id": question_id, "user_answer": "B"})),
        )
        .await;
    }
    send(
        &app.router,
        "POST",
        &format!("/api/exam/attempt/{attempt_id}/complete"),
        Some("learner-1"),
        None,
    )
    .await;

    let (_, body) = send(
        &app.router,
        "GET",
        &format!("/api/exam/analytics?exam_id={exam_id}"),
        Some("learner-1"),
        None,
    )
    .await;
    let weak = body["weak_areas"].as_array().unwrap();
    assert_eq!(weak.len(), 1);
    assert_eq!(weak[0]["topic_name"], "Pharmacology");
    assert_eq!(weak[0]["accuracy"], 0);
    assert_eq!(body["overall"]["total_attempts"], 1);
    assert_eq!(body["overall"]["total_questions"], 3);
}

#[tokio::test]
async fn analytics_ignores_incomplete_attempts() {
    let app = default_app();
    let exam_id = seed_exam(&app.store);
    let question_ids = seed_published(&app.store, &exam_id, None, 1);

    let (_, started) = send(
        &app.router,
        "POST",
        "/api/exam/attempt/start",
        Some("learner-1"),
        Some(json!({"exam_id": exam_id, "mode": "study"})),
    )
    .await;
    let attempt_id = started["attempt_id"].as_str().unwrap().to_string();
    send(
        &app.router,
        "POST",
        &format!("/api/exam/attempt/{attempt_id}/submit"),
        Some("learner-1"),
        Some(json!({"question_id": question_ids[0], "user_answer": "A"})),
    )
    .await;
    // Never completed: analytics stays at the zero state.
    let (_, body) = send(
        &app.router,
        "GET",
        "/api/exam/analytics",
        Some("learner-1"),
        None,
    )
    .await;
    assert_eq!(body["overall"]["total_attempts"], 0);
}

const MOCK_CANDIDATES: &str = r#"[
    {
        "stem": "Which nerve innervates the diaphragm?",
        "options": [{"key": "A", "text": "Phrenic"}, {"key": "B", "text": "Vagus"}],
        "correct_answer": "A",
        "difficulty_level": "C1",
        "per_option_explanations": {"A": "Correct.", "B": "The vagus does not."}
    }
]"#;

#[tokio::test]
async fn generation_for_learner_is_transient() {
    let app = test_app(Arc::new(MockGenerator::with_response(MOCK_CANDIDATES)));
    let exam_id = seed_exam(&app.store);

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/exam/generate-question",
        Some("learner-1"),
        Some(json!({"exam_id": exam_id, "count": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 1);
    // Transient candidates carry no database id.
    assert!(questions[0].get("id").is_none());

    let (persisted, _) = app.store.list_questions(&Default::default(), 1, 50).unwrap();
    assert!(persisted.is_empty());
}

#[tokio::test]
async fn generation_for_admin_persists_drafts() {
    let generator = Arc::new(MockGenerator::with_response(MOCK_CANDIDATES));
    let app = test_app(generator.clone());
    app.store.grant_role("admin-1", ADMIN_ROLE).unwrap();
    let exam_id = seed_exam(&app.store);

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/exam/generate-question",
        Some("admin-1"),
        Some(json!({"exam_id": exam_id, "count": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions[0]["status"], "draft");
    assert_eq!(questions[0]["source_type"], "ai");
    assert!(questions[0]["id"].is_string());

    // The prompt reached the provider with the exam's format seed.
    let prompt = generator.last_prompt().unwrap();
    assert!(prompt.starts_with("Write PLAB-style best-of-five questions."));
    assert!(prompt.contains("Generate exactly 2 questions."));

    let (persisted, total) = app.store.list_questions(&Default::default(), 1, 50).unwrap();
    assert_eq!(total, 1);
    assert_eq!(persisted[0].status, QuestionStatus::Draft);
}

#[tokio::test]
async fn generation_unknown_exam_is_not_found() {
    let app = default_app();
    let (status, _) = send(
        &app.router,
        "POST",
        "/api/exam/generate-question",
        Some("learner-1"),
        Some(json!({"exam_id": "nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn provider_failure_is_bad_gateway_with_detail() {
    let app = test_app(Arc::new(MockGenerator::failing("connection refused")));
    let exam_id = seed_exam(&app.store);

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/exam/generate-question",
        Some("learner-1"),
        Some(json!({"exam_id": exam_id})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "AI generation failed");
    assert!(body["detail"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn unparsable_output_is_bad_gateway_with_raw() {
    let app = test_app(Arc::new(MockGenerator::with_response(
        "I'm sorry, I can't produce questions right now.",
    )));
    let exam_id = seed_exam(&app.store);

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/exam/generate-question",
        Some("learner-1"),
        Some(json!({"exam_id": exam_id})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "failed to parse AI response");
    assert!(body["raw"].as_str().unwrap().contains("I'm sorry"));
}

#[tokio::test]
async fn flag_returns_created() {
    let app = default_app();
    let exam_id = seed_exam(&app.store);
    let question_ids = seed_published(&app.store, &exam_id, None, 1);

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/exam/flag",
        Some("learner-1"),
        Some(json!({"question_id": question_ids[0], "reason": "outdated guideline"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["flag_id"].is_string());

    let (status, _) = send(
        &app.router,
        "POST",
        "/api/exam/flag",
        Some("learner-1"),
        Some(json!({"question_id": "missing"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn question_listing_paginates_and_clamps() {
    let app = default_app();
    let exam_id = seed_exam(&app.store);
    seed_published(&app.store, &exam_id, None, 60);

    let (status, body) = send(
        &app.router,
        "GET",
        &format!("/api/exam/questions?exam_id={exam_id}&status=published&page_size=500"),
        Some("learner-1"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page_size"], 50);
    assert_eq!(body["questions"].as_array().unwrap().len(), 50);
    assert_eq!(body["total"], 60);

    // Default page size.
    let (_, body) = send(
        &app.router,
        "GET",
        "/api/exam/questions",
        Some("learner-1"),
        None,
    )
    .await;
    assert_eq!(body["page_size"], 20);

    // Unknown status filter is a validation error.
    let (status, _) = send(
        &app.router,
        "GET",
        "/api/exam/questions?status=archived",
        Some("learner-1"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn attempts_listing_is_scoped_to_caller() {
    let app = default_app();
    let exam_id = seed_exam(&app.store);
    seed_published(&app.store, &exam_id, None, 1);

    for user in ["learner-1", "learner-2"] {
        send(
            &app.router,
            "POST",
            "/api/exam/attempt/start",
            Some(user),
            Some(json!({"exam_id": exam_id, "mode": "study"})),
        )
        .await;
    }

    let (_, body) = send(
        &app.router,
        "GET",
        "/api/exam/attempts",
        Some("learner-1"),
        None,
    )
    .await;
    let attempts = body["attempts"].as_array().unwrap();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0]["user_id"], "learner-1");
}

#[tokio::test]
async fn exams_and_topics_listings() {
    let app = default_app();
    let exam_id = seed_exam(&app.store);
    app.store.insert_topic(&exam_id, "Cardiology").unwrap();
    app.store.insert_topic(&exam_id, "Anatomy").unwrap();

    let (_, body) = send(&app.router, "GET", "/api/exam/exams", Some("u1"), None).await;
    assert_eq!(body["exams"].as_array().unwrap().len(), 1);

    let (_, body) = send(
        &app.router,
        "GET",
        &format!("/api/exam/topics?exam_id={exam_id}"),
        Some("u1"),
        None,
    )
    .await;
    let names: Vec<_> = body["topics"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Anatomy", "Cardiology"]);
}
