//! # 申請ハンドラ
//!
//! 申請の CRUD と承認・却下の内部 API を提供する。
//!
//! ## エンドポイント
//!
//! - `POST /internal/requests` - 申請作成
//! - `GET /internal/requests` - 申請一覧（`page`, `limit`, `status`）
//! - `GET /internal/requests/{id}` - 申請詳細
//! - `PUT /internal/requests/{id}` - 申請内容の更新
//! - `DELETE /internal/requests/{id}` - 申請削除
//! - `POST /internal/requests/{id}/approve` - 現在の段階を承認
//! - `POST /internal/requests/{id}/reject` - 申請を却下
//! - `GET /internal/requests/{id}/history` - 承認履歴のタイムライン
//!
//! ## 操作主体
//!
//! 認証はゲートウェイの責務で、検証済みの操作主体をヘッダーで受け取る。
//! アクターを持たない一般ユーザーの承認・却下は `403 Forbidden` になる。
//!
//! | ヘッダー | 必須 | 内容 |
//! |---------|------|------|
//! | `X-User-Id` | Yes | 操作ユーザーの UUID |
//! | `X-Actor-Id` | No | 承認アクターの UUID（管理者は通常持たない） |
//! | `X-Is-Admin` | No | `true` / `false`（デフォルト: `false`） |

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shonin_domain::{
    actor::ActorId,
    approval_history::{ApprovalAction, ApprovalHistory},
    principal::Principal,
    request::{Request, RequestId, RequestStatus},
    user::UserId,
    workflow::WorkflowId,
};
use shonin_shared::{ApiResponse, PaginatedResponse};
use uuid::Uuid;

use crate::{
    error::CoreError,
    usecase::{
        CreateRequestInput,
        ListRequestsInput,
        RequestTimeline,
        RequestUseCaseImpl,
        UpdateRequestInput,
    },
};

// HeaderName は小文字で保持する（照合は大文字小文字を区別しない）
const USER_ID_HEADER: &str = "x-user-id";
const ACTOR_ID_HEADER: &str = "x-actor-id";
const IS_ADMIN_HEADER: &str = "x-is-admin";

/// 申請 API の共有状態
pub struct RequestHandlerState {
    pub usecase: RequestUseCaseImpl,
}

// --- リクエスト/レスポンス型 ---

/// 申請作成リクエスト
#[derive(Debug, Deserialize)]
pub struct CreateRequestBody {
    pub workflow_id: Uuid,
    pub amount:      Decimal,
    pub title:       String,
    #[serde(default)]
    pub description: String,
}

/// 申請更新リクエスト
#[derive(Debug, Deserialize)]
pub struct UpdateRequestBody {
    pub amount:      Decimal,
    pub title:       String,
    #[serde(default)]
    pub description: String,
}

/// 却下リクエスト
#[derive(Debug, Deserialize)]
pub struct RejectBody {
    pub reason: String,
}

/// 一覧取得のクエリパラメータ
#[derive(Debug, Default, Deserialize)]
pub struct ListRequestsQuery {
    pub page:   Option<i64>,
    pub limit:  Option<i64>,
    pub status: Option<String>,
}

/// 申請 DTO
///
/// 金額は JSON の数値として返す。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDto {
    pub id:           Uuid,
    pub workflow_id:  Uuid,
    pub current_step: u32,
    pub status:       RequestStatus,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount:       Decimal,
    pub title:        String,
    pub description:  String,
    pub requester_id: Uuid,
    pub version:      u32,
    pub completed_at: Option<String>,
    pub created_at:   String,
    pub updated_at:   String,
}

impl From<&Request> for RequestDto {
    fn from(request: &Request) -> Self {
        Self {
            id:           *request.id().as_uuid(),
            workflow_id:  *request.workflow_id().as_uuid(),
            current_step: request.current_step().as_u32(),
            status:       request.status(),
            amount:       request.amount().as_decimal(),
            title:        request.title().as_str().to_string(),
            description:  request.description().to_string(),
            requester_id: *request.requester_id().as_uuid(),
            version:      request.version().as_u32(),
            completed_at: request.completed_at().map(|at| at.to_rfc3339()),
            created_at:   request.created_at().to_rfc3339(),
            updated_at:   request.updated_at().to_rfc3339(),
        }
    }
}

/// 承認履歴 DTO
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalHistoryDto {
    pub id:         Uuid,
    pub step_level: u32,
    pub actor_id:   Option<Uuid>,
    pub user_id:    Uuid,
    pub action:     ApprovalAction,
    pub comment:    String,
    pub created_at: String,
}

impl From<&ApprovalHistory> for ApprovalHistoryDto {
    fn from(history: &ApprovalHistory) -> Self {
        Self {
            id:         *history.id().as_uuid(),
            step_level: history.step_level().as_u32(),
            actor_id:   history.actor_id().map(|id| *id.as_uuid()),
            user_id:    *history.user_id().as_uuid(),
            action:     history.action(),
            comment:    history.comment().to_string(),
            created_at: history.created_at().to_rfc3339(),
        }
    }
}

/// 承認履歴タイムライン DTO
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestTimelineDto {
    pub request:     RequestDto,
    pub total_steps: usize,
    pub histories:   Vec<ApprovalHistoryDto>,
}

impl From<&RequestTimeline> for RequestTimelineDto {
    fn from(timeline: &RequestTimeline) -> Self {
        Self {
            request:     RequestDto::from(&timeline.request),
            total_steps: timeline.total_steps,
            histories:   timeline.histories.iter().map(ApprovalHistoryDto::from).collect(),
        }
    }
}

// --- ハンドラ ---

/// POST /internal/requests
///
/// ## レスポンス
///
/// - `201 Created`: 作成された申請
/// - `400 Bad Request`: 金額が 0 以下、件名が空、`X-User-Id` がない
/// - `404 Not Found`: ワークフローが存在しない
pub async fn create_request(
    State(state): State<Arc<RequestHandlerState>>,
    headers: HeaderMap,
    Json(body): Json<CreateRequestBody>,
) -> Result<impl IntoResponse, CoreError> {
    let requester_id = extract_user_id(&headers)?;
    let input = CreateRequestInput {
        workflow_id: WorkflowId::from_uuid(body.workflow_id),
        amount:      body.amount,
        title:       body.title,
        description: body.description,
    };

    let request = state.usecase.create_request(input, requester_id).await?;

    let response = ApiResponse::new(RequestDto::from(&request));
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /internal/requests
///
/// 作成日時の降順。`status` は `PENDING` / `APPROVED` / `REJECTED`。
pub async fn list_requests(
    State(state): State<Arc<RequestHandlerState>>,
    Query(query): Query<ListRequestsQuery>,
) -> Result<impl IntoResponse, CoreError> {
    let input = to_list_input(query)?;

    let page = state.usecase.list_requests(input).await?;

    let response = PaginatedResponse::new(
        page.requests.iter().map(RequestDto::from).collect(),
        page.page,
        page.limit,
        page.total,
    );
    Ok((StatusCode::OK, Json(response)))
}

/// GET /internal/requests/{id}
pub async fn get_request(
    State(state): State<Arc<RequestHandlerState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, CoreError> {
    let request = state.usecase.get_request(&RequestId::from_uuid(id)).await?;

    let response = ApiResponse::new(RequestDto::from(&request));
    Ok((StatusCode::OK, Json(response)))
}

/// PUT /internal/requests/{id}
///
/// ## レスポンス
///
/// - `200 OK`: 更新後の申請
/// - `400 Bad Request`: 入力値が不正
/// - `404 Not Found`: 申請が存在しない
/// - `409 Conflict`: 承認待ちではない、または同時更新
pub async fn update_request(
    State(state): State<Arc<RequestHandlerState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateRequestBody>,
) -> Result<impl IntoResponse, CoreError> {
    let input = UpdateRequestInput {
        amount:      body.amount,
        title:       body.title,
        description: body.description,
    };

    let request = state
        .usecase
        .update_request(&RequestId::from_uuid(id), input)
        .await?;

    let response = ApiResponse::new(RequestDto::from(&request));
    Ok((StatusCode::OK, Json(response)))
}

/// DELETE /internal/requests/{id}
///
/// 成功時は `204 No Content`。
pub async fn delete_request(
    State(state): State<Arc<RequestHandlerState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, CoreError> {
    state
        .usecase
        .delete_request(&RequestId::from_uuid(id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /internal/requests/{id}/approve
///
/// ## レスポンス
///
/// - `200 OK`: 承認後の申請（次の段階へ進んだ、または承認完了）
/// - `403 Forbidden`: 担当外のアクター、またはアクターを持たない一般ユーザー
/// - `404 Not Found`: 申請が存在しない
/// - `409 Conflict`: 承認待ちではない、または同時更新
/// - `422 Unprocessable Entity`: 承認条件を満たさない、ステップが存在しない
pub async fn approve_request(
    State(state): State<Arc<RequestHandlerState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, CoreError> {
    let principal = extract_principal(&headers)?;

    let request = state
        .usecase
        .approve(&RequestId::from_uuid(id), &principal)
        .await?;

    let response = ApiResponse::new(RequestDto::from(&request));
    Ok((StatusCode::OK, Json(response)))
}

/// POST /internal/requests/{id}/reject
///
/// 却下理由は必須。
pub async fn reject_request(
    State(state): State<Arc<RequestHandlerState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<RejectBody>,
) -> Result<impl IntoResponse, CoreError> {
    let principal = extract_principal(&headers)?;

    let request = state
        .usecase
        .reject(&RequestId::from_uuid(id), &principal, &body.reason)
        .await?;

    let response = ApiResponse::new(RequestDto::from(&request));
    Ok((StatusCode::OK, Json(response)))
}

/// GET /internal/requests/{id}/history
///
/// 申請・ステップ総数・承認履歴（作成日時の昇順）を返す。
pub async fn list_request_history(
    State(state): State<Arc<RequestHandlerState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, CoreError> {
    let timeline = state
        .usecase
        .list_history(&RequestId::from_uuid(id))
        .await?;

    let response = ApiResponse::new(RequestTimelineDto::from(&timeline));
    Ok((StatusCode::OK, Json(response)))
}

// --- ヘルパー ---

fn to_list_input(query: ListRequestsQuery) -> Result<ListRequestsInput, CoreError> {
    let defaults = ListRequestsInput::default();
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(s) => Some(s.parse::<RequestStatus>()?),
    };

    Ok(ListRequestsInput {
        page: query.page.unwrap_or(defaults.page),
        limit: query.limit.unwrap_or(defaults.limit),
        status,
    })
}

/// UUID 形式のヘッダーを読み取る
fn uuid_header(headers: &HeaderMap, name: &str) -> Result<Uuid, CoreError> {
    let value = headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| CoreError::Validation(format!("{name} ヘッダーが必要です")))?;

    Uuid::parse_str(value.trim())
        .map_err(|_| CoreError::Validation(format!("{name} ヘッダーの形式が不正です")))
}

fn extract_user_id(headers: &HeaderMap) -> Result<UserId, CoreError> {
    uuid_header(headers, USER_ID_HEADER).map(UserId::from_uuid)
}

/// ヘッダーから承認・却下の操作主体を組み立てる
///
/// `X-Actor-Id` は省略できる。指定した場合は UUID 形式でなければならない。
fn extract_principal(headers: &HeaderMap) -> Result<Principal, CoreError> {
    let user_id = extract_user_id(headers)?;
    let actor_id = if headers.contains_key(ACTOR_ID_HEADER) {
        Some(ActorId::from_uuid(uuid_header(headers, ACTOR_ID_HEADER)?))
    } else {
        None
    };

    let is_admin = match headers.get(IS_ADMIN_HEADER) {
        None => false,
        Some(value) => match value.to_str().map(str::trim) {
            Ok("true") => true,
            Ok("false") => false,
            _ => {
                return Err(CoreError::Validation(format!(
                    "{IS_ADMIN_HEADER} ヘッダーは true または false を指定してください"
                )));
            }
        },
    };

    Ok(Principal::new(user_id, actor_id, is_admin))
}
