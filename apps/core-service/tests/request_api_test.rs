//! 申請 API 統合テスト
//!
//! モックリポジトリで組み立てたルーターに HTTP リクエストを送り、
//! ステータスコードとレスポンスボディを検証する。
//!
//! ## テストケース
//!
//! - 作成 → 取得で全フィールドが一致
//! - 2 段階の承認 → 履歴タイムラインに段階順で記録される
//! - 担当外 403、条件未達 422、却下後の承認 409
//! - 削除後の取得は 404
//! - 一覧のステータス絞り込みとページング

use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response, StatusCode},
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::{Value as JsonValue, json};
use shonin_core_service::{
    handler::request::{RequestDto, RequestTimelineDto},
    test_utils::RequestTestBuilder,
};
use shonin_domain::{
    actor::ActorId,
    approval_history::ApprovalAction,
    request::{RequestId, RequestStatus},
};
use shonin_shared::{ApiResponse, ErrorResponse, PaginatedResponse};
use tower::ServiceExt;
use uuid::Uuid;

// --- テストヘルパー ---

/// 操作主体のヘッダー
struct Caller {
    user_id:  Uuid,
    actor_id: Option<Uuid>,
    is_admin: bool,
}

impl Caller {
    fn actor(actor_id: &ActorId) -> Self {
        Self {
            user_id:  Uuid::now_v7(),
            actor_id: Some(*actor_id.as_uuid()),
            is_admin: false,
        }
    }

    /// アクターを持たない管理者
    fn admin() -> Self {
        Self {
            user_id:  Uuid::now_v7(),
            actor_id: None,
            is_admin: true,
        }
    }
}

fn build_request(
    method: Method,
    uri: &str,
    caller: Option<&Caller>,
    body: Option<JsonValue>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(caller) = caller {
        builder = builder
            .header("X-User-Id", caller.user_id.to_string())
            .header("X-Is-Admin", caller.is_admin.to_string());
        if let Some(actor_id) = caller.actor_id {
            builder = builder.header("X-Actor-Id", actor_id.to_string());
        }
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

/// レスポンスボディを指定の型として解析する
async fn response_body<T: DeserializeOwned>(response: Response<Body>) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn approve(app: &Router, id: &RequestId, caller: &Caller) -> Response<Body> {
    let uri = format!("/internal/requests/{id}/approve");
    send(app, build_request(Method::POST, &uri, Some(caller), None)).await
}

// --- テスト ---

#[tokio::test]
async fn test_health_checkは200を返す() {
    let app = RequestTestBuilder::new().build_app();

    let response = send(&app, build_request(Method::GET, "/health", None, None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_作成した申請を取得すると全フィールドが一致する() {
    // Arrange
    let builder = RequestTestBuilder::new();
    let workflow_id = builder.add_workflow();
    let app = builder.build_app();
    let caller = Caller::admin();

    // Act
    let response = send(
        &app,
        build_request(
            Method::POST,
            "/internal/requests",
            Some(&caller),
            Some(json!({
                "workflow_id": workflow_id.as_uuid(),
                "amount": "12345.50",
                "title": "出張旅費",
                "description": "大阪出張 2 泊"
            })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: ApiResponse<RequestDto> = response_body(response).await;

    let uri = format!("/internal/requests/{}", created.data.id);
    let response = send(&app, build_request(Method::GET, &uri, None, None)).await;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let fetched: ApiResponse<RequestDto> = response_body(response).await;
    assert_eq!(fetched, created);
    assert_eq!(fetched.data.status, RequestStatus::Pending);
    assert_eq!(fetched.data.current_step, 1);
    assert_eq!(fetched.data.version, 1);
    assert_eq!(fetched.data.amount, Decimal::new(1_234_550, 2));
    assert_eq!(fetched.data.title, "出張旅費");
    assert_eq!(fetched.data.description, "大阪出張 2 泊");
    assert_eq!(fetched.data.requester_id, caller.user_id);
    assert_eq!(fetched.data.completed_at, None);
}

#[tokio::test]
async fn test_金額とステータスはjsonの数値と大文字で返る() {
    let builder = RequestTestBuilder::new();
    let workflow_id = builder.add_workflow();
    let request = builder.add_pending_request(&workflow_id, 1_000);
    let app = builder.build_app();
    let uri = format!("/internal/requests/{}", request.id());

    let response = send(&app, build_request(Method::GET, &uri, None, None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let raw: JsonValue = response_body(response).await;
    assert_eq!(raw["data"]["amount"].as_f64(), Some(1_000.0));
    assert_eq!(raw["data"]["status"], "PENDING");
}

#[tokio::test]
async fn test_操作ユーザーのヘッダーがなければ作成は400() {
    let builder = RequestTestBuilder::new();
    let workflow_id = builder.add_workflow();
    let app = builder.build_app();

    let response = send(
        &app,
        build_request(
            Method::POST,
            "/internal/requests",
            None,
            Some(json!({
                "workflow_id": workflow_id.as_uuid(),
                "amount": 1000,
                "title": "備品購入"
            })),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = response_body(response).await;
    assert_eq!(body.status, 400);
}

#[tokio::test]
async fn test_2段階を承認すると履歴が段階順に記録される() {
    // Arrange
    let builder = RequestTestBuilder::new();
    let workflow_id = builder.add_workflow();
    let manager = builder.add_step(&workflow_id, 1, 1_000_000);
    let director = builder.add_step(&workflow_id, 2, 0);
    let request = builder.add_pending_request(&workflow_id, 2_000_000);
    let app = builder.build_app();

    // Act
    let first = approve(&app, request.id(), &Caller::actor(&manager)).await;
    assert_eq!(first.status(), StatusCode::OK);
    let first: ApiResponse<RequestDto> = response_body(first).await;

    let second = approve(&app, request.id(), &Caller::actor(&director)).await;
    assert_eq!(second.status(), StatusCode::OK);
    let second: ApiResponse<RequestDto> = response_body(second).await;

    let uri = format!("/internal/requests/{}/history", request.id());
    let response = send(&app, build_request(Method::GET, &uri, None, None)).await;

    // Assert
    assert_eq!((first.data.status, first.data.current_step), (RequestStatus::Pending, 2));
    assert_eq!((second.data.status, second.data.current_step), (RequestStatus::Approved, 3));
    assert_eq!(second.data.version, 3);
    assert!(second.data.completed_at.is_some());

    assert_eq!(response.status(), StatusCode::OK);
    let timeline: ApiResponse<RequestTimelineDto> = response_body(response).await;
    assert_eq!(timeline.data.total_steps, 2);
    assert_eq!(timeline.data.request, second.data);
    let recorded: Vec<(u32, ApprovalAction, Option<Uuid>)> = timeline
        .data
        .histories
        .iter()
        .map(|h| (h.step_level, h.action, h.actor_id))
        .collect();
    assert_eq!(
        recorded,
        vec![
            (1, ApprovalAction::Approve, Some(*manager.as_uuid())),
            (2, ApprovalAction::Approve, Some(*director.as_uuid())),
        ]
    );
}

#[tokio::test]
async fn test_アクターを持たない管理者は承認できる() {
    let builder = RequestTestBuilder::new();
    let workflow_id = builder.add_workflow();
    builder.add_step(&workflow_id, 1, 0);
    let request = builder.add_pending_request(&workflow_id, 1_000);
    let app = builder.build_app();
    let caller = Caller::admin();

    let response = approve(&app, request.id(), &caller).await;

    assert_eq!(response.status(), StatusCode::OK);
    let approved: ApiResponse<RequestDto> = response_body(response).await;
    assert_eq!(approved.data.status, RequestStatus::Approved);
    let histories = builder.history_repo.all();
    assert_eq!(histories.len(), 1);
    assert_eq!(histories[0].actor_id(), None);
    assert_eq!(histories[0].user_id().as_uuid(), &caller.user_id);
}

#[tokio::test]
async fn test_アクターを持たない一般ユーザーの承認は403() {
    let builder = RequestTestBuilder::new();
    let workflow_id = builder.add_workflow();
    builder.add_step(&workflow_id, 1, 0);
    let request = builder.add_pending_request(&workflow_id, 1_000);
    let app = builder.build_app();
    let caller = Caller {
        user_id:  Uuid::now_v7(),
        actor_id: None,
        is_admin: false,
    };

    let response = approve(&app, request.id(), &caller).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(builder.request_repo.get(request.id()), Some(request));
    assert!(builder.history_repo.all().is_empty());
}

#[tokio::test]
async fn test_担当外のアクターの承認は403() {
    let builder = RequestTestBuilder::new();
    let workflow_id = builder.add_workflow();
    builder.add_step(&workflow_id, 1, 0);
    let request = builder.add_pending_request(&workflow_id, 1_000);
    let app = builder.build_app();

    let response = approve(&app, request.id(), &Caller::actor(&ActorId::new())).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(builder.history_repo.all().is_empty());
}

#[tokio::test]
async fn test_金額が下限未満の承認は422() {
    let builder = RequestTestBuilder::new();
    let workflow_id = builder.add_workflow();
    let manager = builder.add_step(&workflow_id, 1, 500_000);
    let request = builder.add_pending_request(&workflow_id, 400_000);
    let app = builder.build_app();

    let response = approve(&app, request.id(), &Caller::actor(&manager)).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: ErrorResponse = response_body(response).await;
    assert!(body.error_type.ends_with("/condition-not-met"));
    assert_eq!(builder.request_repo.get(request.id()), Some(request));
}

#[tokio::test]
async fn test_却下後の承認は409() {
    // Arrange
    let builder = RequestTestBuilder::new();
    let workflow_id = builder.add_workflow();
    let manager = builder.add_step(&workflow_id, 1, 0);
    let request = builder.add_pending_request(&workflow_id, 1_000);
    let app = builder.build_app();
    let caller = Caller::actor(&manager);
    let uri = format!("/internal/requests/{}/reject", request.id());

    // Act
    let blank = send(
        &app,
        build_request(Method::POST, &uri, Some(&caller), Some(json!({ "reason": " " }))),
    )
    .await;
    let rejected = send(
        &app,
        build_request(
            Method::POST,
            &uri,
            Some(&caller),
            Some(json!({ "reason": "見積もりの再取得が必要" })),
        ),
    )
    .await;
    let approve_after = approve(&app, request.id(), &caller).await;

    // Assert
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
    assert_eq!(rejected.status(), StatusCode::OK);
    let rejected: ApiResponse<RequestDto> = response_body(rejected).await;
    assert_eq!(rejected.data.status, RequestStatus::Rejected);
    assert_eq!(approve_after.status(), StatusCode::CONFLICT);
    let body: ErrorResponse = response_body(approve_after).await;
    assert!(body.error_type.ends_with("/not-pending"));
}

#[tokio::test]
async fn test_削除した申請の取得は404() {
    let builder = RequestTestBuilder::new();
    let workflow_id = builder.add_workflow();
    let request = builder.add_pending_request(&workflow_id, 1_000);
    let app = builder.build_app();
    let uri = format!("/internal/requests/{}", request.id());

    let deleted = send(&app, build_request(Method::DELETE, &uri, None, None)).await;
    let fetched = send(&app, build_request(Method::GET, &uri, None, None)).await;
    let deleted_again = send(&app, build_request(Method::DELETE, &uri, None, None)).await;

    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
    assert_eq!(fetched.status(), StatusCode::NOT_FOUND);
    assert_eq!(deleted_again.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_更新すると内容とバージョンが変わる() {
    let builder = RequestTestBuilder::new();
    let workflow_id = builder.add_workflow();
    let request = builder.add_pending_request(&workflow_id, 1_000);
    let app = builder.build_app();
    let uri = format!("/internal/requests/{}", request.id());

    let response = send(
        &app,
        build_request(
            Method::PUT,
            &uri,
            None,
            Some(json!({ "amount": "1500", "title": "交通費精算（修正）" })),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let updated: ApiResponse<RequestDto> = response_body(response).await;
    assert_eq!(updated.data.amount, Decimal::from(1_500));
    assert_eq!(updated.data.title, "交通費精算（修正）");
    assert_eq!(updated.data.description, "");
    assert_eq!(updated.data.version, 2);
}

#[tokio::test]
async fn test_一覧はステータスで絞り込みページングされる() {
    // Arrange: 承認待ち 3 件、却下済み 1 件
    let builder = RequestTestBuilder::new();
    let workflow_id = builder.add_workflow();
    let mut pending = Vec::new();
    for (i, amount) in [1_000, 2_000, 3_000].into_iter().enumerate() {
        let request = builder.build_pending_request(&workflow_id, amount, i as i64);
        builder.request_repo.add_request(request.clone());
        pending.push(request);
    }
    let rejected = builder
        .build_pending_request(&workflow_id, 4_000, 10)
        .complete_with_rejection(builder.now())
        .unwrap();
    builder.request_repo.add_request(rejected);
    let app = builder.build_app();

    // Act
    let response = send(
        &app,
        build_request(
            Method::GET,
            "/internal/requests?status=PENDING&page=1&limit=2",
            None,
            None,
        ),
    )
    .await;

    // Assert: 作成日時の降順
    assert_eq!(response.status(), StatusCode::OK);
    let raw: JsonValue = response_body(response).await;
    assert!(raw["data"].as_array().unwrap().iter().all(|r| r["status"] == "PENDING"));
    let page: PaginatedResponse<RequestDto> = serde_json::from_value(raw).unwrap();
    let ids: Vec<Uuid> = page.data.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![*pending[2].id().as_uuid(), *pending[1].id().as_uuid()]);
    assert_eq!((page.page, page.limit, page.total), (1, 2, 3));
    assert_eq!(page.total_pages(), 2);
}

#[tokio::test]
async fn test_一覧の小文字のステータスは400() {
    let app = RequestTestBuilder::new().build_app();

    let response = send(
        &app,
        build_request(Method::GET, "/internal/requests?status=pending", None, None),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
