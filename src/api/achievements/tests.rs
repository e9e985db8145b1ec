use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::db::models::User;
use crate::db::types::{AchievementStatus, UserRole};
use crate::test_support::{self, TestContext};

struct Cast {
    student: User,
    classmate: User,
    teacher: User,
    admin: User,
}

async fn cast(ctx: &TestContext) -> Cast {
    let db = ctx.state.db();
    Cast {
        student: test_support::insert_user(db, "ivanov", "Ivan Ivanov", UserRole::Student, "student-pass")
            .await,
        classmate: test_support::insert_user(db, "sidorova", "Maria Sidorova", UserRole::Student, "student-pass")
            .await,
        teacher: test_support::insert_user(db, "petrova", "Anna Petrova", UserRole::Teacher, "teacher-pass")
            .await,
        admin: test_support::insert_user(db, "root", "Root Admin", UserRole::Admin, "admin-pass").await,
    }
}

fn token(ctx: &TestContext, user: &User) -> String {
    test_support::bearer_token(&user.id, ctx.state.settings())
}

async fn call(
    ctx: &TestContext,
    method: Method,
    uri: &str,
    user: Option<&User>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let token = user.map(|user| token(ctx, user));
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(method, uri, token.as_deref(), body))
        .await
        .expect("response");
    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        return (status, Value::Null);
    }
    (status, test_support::read_json(response).await)
}

#[tokio::test]
async fn submission_is_reviewed_and_audited() {
    let ctx = test_support::setup_test_context().await;
    let people = cast(&ctx).await;

    let (status, created) = call(
        &ctx,
        Method::POST,
        "/api/v1/achievements",
        Some(&people.student),
        Some(json!({
            "title": "Regional olympiad in physics",
            "description": "Second place in the regional round",
            "content": "<p>Team of three, <strong>second place</strong></p>",
            "kind": "competition",
            "award_level": "regional",
            "achieved_on": "2024-03-15",
            "tags": ["physics", "Physics", " olympiad "]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    assert_eq!(created["status"], "draft");
    assert_eq!(created["owner_name"], "Ivan Ivanov");
    assert_eq!(created["tags"], json!(["physics", "olympiad"]));
    let id = created["id"].as_str().expect("id").to_string();

    let (status, submitted) =
        call(&ctx, Method::POST, &format!("/api/v1/achievements/{id}/submit"), Some(&people.student), None)
            .await;
    assert_eq!(status, StatusCode::OK, "response: {submitted}");
    assert_eq!(submitted["status"], "pending");
    assert!(submitted["submitted_at"].is_string());

    let (status, body) = call(
        &ctx,
        Method::POST,
        &format!("/api/v1/achievements/{id}/reject"),
        Some(&people.teacher),
        Some(json!({"comment": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");

    let (status, rejected) = call(
        &ctx,
        Method::POST,
        &format!("/api/v1/achievements/{id}/reject"),
        Some(&people.teacher),
        Some(json!({"comment": "Attach the diploma scan"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {rejected}");
    assert_eq!(rejected["status"], "rejected");
    assert_eq!(rejected["review_comment"], "Attach the diploma scan");
    assert_eq!(rejected["reviewed_by"], people.teacher.id.as_str());

    let (status, reopened) =
        call(&ctx, Method::POST, &format!("/api/v1/achievements/{id}/reopen"), Some(&people.student), None)
            .await;
    assert_eq!(status, StatusCode::OK, "response: {reopened}");
    assert_eq!(reopened["status"], "draft");

    call(&ctx, Method::POST, &format!("/api/v1/achievements/{id}/submit"), Some(&people.student), None)
        .await;
    let (status, approved) = call(
        &ctx,
        Method::POST,
        &format!("/api/v1/achievements/{id}/approve"),
        Some(&people.teacher),
        Some(json!({"comment": "Verified"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {approved}");
    assert_eq!(approved["status"], "approved");
    assert!(approved["published_at"].is_string());

    let (status, history) =
        call(&ctx, Method::GET, &format!("/api/v1/achievements/{id}/history"), Some(&people.student), None)
            .await;
    assert_eq!(status, StatusCode::OK);
    let transitions: Vec<&str> = history
        .as_array()
        .expect("history array")
        .iter()
        .map(|entry| entry["transition"].as_str().expect("transition"))
        .collect();
    assert_eq!(transitions, ["submit", "reject", "reopen", "submit", "approve"]);
    assert_eq!(history[1]["actor_name"], "Anna Petrova");
    assert_eq!(history[1]["from_status"], "pending");
    assert_eq!(history[1]["to_status"], "rejected");
}

#[tokio::test]
async fn wrong_state_conflicts_and_wrong_actor_is_forbidden() {
    let ctx = test_support::setup_test_context().await;
    let people = cast(&ctx).await;
    let draft = test_support::insert_achievement(
        ctx.state.db(),
        &people.student.id,
        "Science fair",
        AchievementStatus::Draft,
    )
    .await;
    let pending = test_support::insert_achievement(
        ctx.state.db(),
        &people.student.id,
        "Hackathon",
        AchievementStatus::Pending,
    )
    .await;
    let own_pending = test_support::insert_achievement(
        ctx.state.db(),
        &people.teacher.id,
        "Methodology paper",
        AchievementStatus::Pending,
    )
    .await;

    let (status, body) = call(
        &ctx,
        Method::POST,
        &format!("/api/v1/achievements/{}/approve", draft.id),
        Some(&people.teacher),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND, "teacher must not see another user's draft: {body}");

    let (status, body) = call(
        &ctx,
        Method::POST,
        &format!("/api/v1/achievements/{}/approve", draft.id),
        Some(&people.admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "response: {body}");

    let (status, body) = call(
        &ctx,
        Method::POST,
        &format!("/api/v1/achievements/{}/approve", pending.id),
        Some(&people.student),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "response: {body}");

    let (status, body) = call(
        &ctx,
        Method::POST,
        &format!("/api/v1/achievements/{}/approve", own_pending.id),
        Some(&people.teacher),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "self-review: {body}");

    let (status, body) = call(
        &ctx,
        Method::POST,
        &format!("/api/v1/achievements/{}/revoke", pending.id),
        Some(&people.admin),
        Some(json!({"comment": "duplicate"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "revoke only applies to approved records: {body}");

    let (status, body) = call(
        &ctx,
        Method::POST,
        &format!("/api/v1/achievements/{}/withdraw", pending.id),
        Some(&people.student),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["status"], "draft");
}

#[tokio::test]
async fn reviewer_submission_publishes_directly_and_admin_can_revoke() {
    let ctx = test_support::setup_test_context().await;
    let people = cast(&ctx).await;
    let draft = test_support::insert_achievement(
        ctx.state.db(),
        &people.teacher.id,
        "Teaching award",
        AchievementStatus::Draft,
    )
    .await;

    let (status, body) = call(
        &ctx,
        Method::POST,
        &format!("/api/v1/achievements/{}/submit", draft.id),
        Some(&people.teacher),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["status"], "approved");

    let (status, body) = call(
        &ctx,
        Method::POST,
        &format!("/api/v1/achievements/{}/revoke", draft.id),
        Some(&people.teacher),
        Some(json!({"comment": "wrong year"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "response: {body}");

    let (status, body) = call(
        &ctx,
        Method::POST,
        &format!("/api/v1/achievements/{}/revoke", draft.id),
        Some(&people.admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "revoke needs a comment: {body}");

    let (status, body) = call(
        &ctx,
        Method::POST,
        &format!("/api/v1/achievements/{}/revoke", draft.id),
        Some(&people.admin),
        Some(json!({"comment": "wrong year"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["status"], "rejected");
    assert_eq!(body["review_comment"], "wrong year");
}

#[tokio::test]
async fn listing_is_scoped_by_role() {
    let ctx = test_support::setup_test_context().await;
    let people = cast(&ctx).await;
    let db = ctx.state.db();
    test_support::insert_achievement(db, &people.student.id, "Own draft", AchievementStatus::Draft).await;
    test_support::insert_achievement(db, &people.classmate.id, "Other draft", AchievementStatus::Draft)
        .await;
    test_support::insert_achievement(db, &people.classmate.id, "Other pending", AchievementStatus::Pending)
        .await;
    test_support::insert_achievement(db, &people.classmate.id, "Other approved", AchievementStatus::Approved)
        .await;

    let titles = |body: &Value| -> Vec<String> {
        let mut titles: Vec<String> = body["items"]
            .as_array()
            .expect("items")
            .iter()
            .map(|item| item["title"].as_str().expect("title").to_string())
            .collect();
        titles.sort();
        titles
    };

    let (status, body) =
        call(&ctx, Method::GET, "/api/v1/achievements", Some(&people.student), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&body), ["Other approved", "Own draft"]);
    assert_eq!(body["total_count"], 2);

    let (_, body) = call(&ctx, Method::GET, "/api/v1/achievements", Some(&people.teacher), None).await;
    assert_eq!(titles(&body), ["Other approved", "Other pending"]);

    let (_, body) = call(&ctx, Method::GET, "/api/v1/achievements", Some(&people.admin), None).await;
    assert_eq!(body["total_count"], 4);

    let (_, body) = call(
        &ctx,
        Method::GET,
        "/api/v1/achievements?status=pending",
        Some(&people.admin),
        None,
    )
    .await;
    assert_eq!(titles(&body), ["Other pending"]);

    let (_, body) = call(
        &ctx,
        Method::GET,
        "/api/v1/achievements?search=APPROVED",
        Some(&people.student),
        None,
    )
    .await;
    assert_eq!(titles(&body), ["Other approved"]);

    let (_, body) =
        call(&ctx, Method::GET, "/api/v1/achievements/mine", Some(&people.classmate), None).await;
    assert_eq!(body["total_count"], 3);

    let (status, body) = call(&ctx, Method::GET, "/api/v1/public/achievements", None, None).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(titles(&body), ["Other approved"]);
}

#[tokio::test]
async fn hidden_records_are_not_found() {
    let ctx = test_support::setup_test_context().await;
    let people = cast(&ctx).await;
    let pending = test_support::insert_achievement(
        ctx.state.db(),
        &people.classmate.id,
        "Pending elsewhere",
        AchievementStatus::Pending,
    )
    .await;

    let (status, _) = call(
        &ctx,
        Method::GET,
        &format!("/api/v1/achievements/{}", pending.id),
        Some(&people.student),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) =
        call(&ctx, Method::GET, &format!("/api/v1/public/achievements/{}", pending.id), None, None)
            .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(
        &ctx,
        Method::GET,
        &format!("/api/v1/achievements/{}", pending.id),
        Some(&people.teacher),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["owner_name"], "Maria Sidorova");
    assert_eq!(body["media"], json!([]));
}

#[tokio::test]
async fn editing_rules_follow_status() {
    let ctx = test_support::setup_test_context().await;
    let people = cast(&ctx).await;
    let db = ctx.state.db();
    let rejected =
        test_support::insert_achievement(db, &people.student.id, "Needs work", AchievementStatus::Rejected)
            .await;
    let pending =
        test_support::insert_achievement(db, &people.student.id, "Waiting", AchievementStatus::Pending)
            .await;

    let (status, body) = call(
        &ctx,
        Method::PATCH,
        &format!("/api/v1/achievements/{}", pending.id),
        Some(&people.student),
        Some(json!({"title": "Changed while pending"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "response: {body}");

    let (status, body) = call(
        &ctx,
        Method::PATCH,
        &format!("/api/v1/achievements/{}", rejected.id),
        Some(&people.student),
        Some(json!({"content": "<p onclick=\"steal()\">hi</p>"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");

    let (status, body) = call(
        &ctx,
        Method::PATCH,
        &format!("/api/v1/achievements/{}", rejected.id),
        Some(&people.student),
        Some(json!({"title": "Needs work, fixed", "achieved_on": "2023-05-01"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["status"], "draft");
    assert_eq!(body["title"], "Needs work, fixed");
    assert_eq!(body["achieved_on"], "2023-05-01");

    let (_, history) = call(
        &ctx,
        Method::GET,
        &format!("/api/v1/achievements/{}/history", rejected.id),
        Some(&people.student),
        None,
    )
    .await;
    assert_eq!(history[0]["transition"], "reopen");

    let (status, body) = call(
        &ctx,
        Method::PATCH,
        &format!("/api/v1/achievements/{}", rejected.id),
        Some(&people.classmate),
        Some(json!({"title": "Not mine"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND, "another student's rejected record is hidden: {body}");

    let (status, body) = call(
        &ctx,
        Method::PATCH,
        &format!("/api/v1/achievements/{}", pending.id),
        Some(&people.admin),
        Some(json!({"award_level": "national"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "admin edits keep status: {body}");
    assert_eq!(body["status"], "pending");
    assert_eq!(body["award_level"], "national");
}

#[tokio::test]
async fn admin_edits_own_approved_record() {
    let ctx = test_support::setup_test_context().await;
    let people = cast(&ctx).await;
    let own =
        test_support::insert_achievement(ctx.state.db(), &people.admin.id, "Staff award", AchievementStatus::Approved)
            .await;

    let (status, body) = call(
        &ctx,
        Method::PATCH,
        &format!("/api/v1/achievements/{}", own.id),
        Some(&people.admin),
        Some(json!({"title": "Staff award, corrected"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["status"], "approved");
    assert_eq!(body["title"], "Staff award, corrected");
}

#[tokio::test]
async fn delete_is_limited_to_owner_drafts_and_admins() {
    let ctx = test_support::setup_test_context().await;
    let people = cast(&ctx).await;
    let db = ctx.state.db();
    let draft =
        test_support::insert_achievement(db, &people.student.id, "Scrap", AchievementStatus::Draft).await;
    let approved =
        test_support::insert_achievement(db, &people.student.id, "Keep", AchievementStatus::Approved)
            .await;

    let (status, _) = call(
        &ctx,
        Method::DELETE,
        &format!("/api/v1/achievements/{}", approved.id),
        Some(&people.student),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(
        &ctx,
        Method::DELETE,
        &format!("/api/v1/achievements/{}", approved.id),
        Some(&people.teacher),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(
        &ctx,
        Method::DELETE,
        &format!("/api/v1/achievements/{}", draft.id),
        Some(&people.student),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(
        &ctx,
        Method::DELETE,
        &format!("/api/v1/achievements/{}", approved.id),
        Some(&people.admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM achievements")
        .fetch_one(db)
        .await
        .expect("count");
    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn review_queue_and_stats_are_reviewer_only() {
    let ctx = test_support::setup_test_context().await;
    let people = cast(&ctx).await;
    let db = ctx.state.db();
    test_support::insert_achievement(db, &people.student.id, "First", AchievementStatus::Pending).await;
    test_support::insert_achievement(db, &people.classmate.id, "Second", AchievementStatus::Pending)
        .await;
    test_support::insert_achievement(db, &people.teacher.id, "Own", AchievementStatus::Pending).await;
    test_support::insert_achievement(db, &people.classmate.id, "Done", AchievementStatus::Approved)
        .await;
    test_support::insert_achievement(db, &people.classmate.id, "Hidden", AchievementStatus::Draft)
        .await;

    let (status, _) =
        call(&ctx, Method::GET, "/api/v1/achievements/review-queue", Some(&people.student), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, queue) =
        call(&ctx, Method::GET, "/api/v1/achievements/review-queue", Some(&people.teacher), None).await;
    assert_eq!(status, StatusCode::OK, "response: {queue}");
    assert_eq!(queue["total_count"], 2);
    assert!(queue["items"]
        .as_array()
        .expect("items")
        .iter()
        .all(|item| item["owner_id"] != people.teacher.id.as_str()));

    let (status, stats) =
        call(&ctx, Method::GET, "/api/v1/achievements/stats", Some(&people.teacher), None).await;
    assert_eq!(status, StatusCode::OK, "response: {stats}");
    assert_eq!(stats["pending"], 3);
    assert_eq!(stats["approved"], 1);
    assert_eq!(stats["draft"], 0);

    let (_, stats) =
        call(&ctx, Method::GET, "/api/v1/achievements/stats", Some(&people.admin), None).await;
    assert_eq!(stats["draft"], 1);
    assert_eq!(stats["total"], 5);
}

#[tokio::test]
async fn invalid_payloads_are_rejected() {
    let ctx = test_support::setup_test_context().await;
    let people = cast(&ctx).await;

    let (status, body) = call(
        &ctx,
        Method::POST,
        "/api/v1/achievements",
        Some(&people.student),
        Some(json!({"title": "", "description": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");

    let (status, body) = call(
        &ctx,
        Method::POST,
        "/api/v1/achievements",
        Some(&people.student),
        Some(json!({"title": "   ", "description": "  "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "whitespace-only title: {body}");
    let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM achievements")
        .fetch_one(ctx.state.db())
        .await
        .expect("count");
    assert_eq!(stored, 0);

    let (status, body) = call(
        &ctx,
        Method::POST,
        "/api/v1/achievements",
        Some(&people.student),
        Some(json!({
            "title": "Embedded",
            "description": "x",
            "content": "<script>alert(1)</script>"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");

    let (status, body) = call(
        &ctx,
        Method::POST,
        "/api/v1/achievements",
        Some(&people.student),
        Some(json!({"title": "Future", "description": "x", "achieved_on": "2999-01-01"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
}
