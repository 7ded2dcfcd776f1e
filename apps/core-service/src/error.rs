//! # Core Service エラー定義
//!
//! Core Service 固有のエラーと、HTTP レスポンスへの変換を定義する。
//!
//! | バリアント | HTTP |
//! |-----------|------|
//! | `Validation` | 400 |
//! | `Unauthorized` | 403 |
//! | `NotFound` | 404 |
//! | `NotPending` / `Conflict` | 409 |
//! | `NoNextStep` / `ConditionNotMet` | 422 |
//! | `Database` / `Internal` | 500 |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use shonin_domain::DomainError;
use shonin_shared::{ErrorResponse, event_log::error as log_error};
use thiserror::Error;

/// Core Service で発生するエラー
///
/// いずれも分類済みで呼び出し元に返し、自動リトライはしない。
#[derive(Debug, Error)]
pub enum CoreError {
    /// 入力値の不正
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// リソースが見つからない
    #[error("リソースが見つかりません: {0}")]
    NotFound(String),

    /// 申請が承認待ちではない（承認済み・却下済み）
    #[error("申請は承認待ちではありません: {0}")]
    NotPending(String),

    /// 現在の段階に対応する承認ステップが存在しない
    #[error("承認ステップが存在しません: {0}")]
    NoNextStep(String),

    /// 承認者がステップの担当者ではない
    #[error("権限がありません: {0}")]
    Unauthorized(String),

    /// 申請がステップの承認条件を満たしていない
    #[error("承認条件を満たしていません: {0}")]
    ConditionNotMet(String),

    /// 競合（楽観的ロック失敗）
    #[error("競合が発生しました: {0}")]
    Conflict(String),

    /// データベースエラー
    #[error("データベースエラー: {0}")]
    Database(#[from] shonin_infra::InfraError),

    /// 内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => Self::Validation(msg),
            DomainError::InvalidState(msg) => Self::NotPending(msg),
        }
    }
}

impl CoreError {
    /// HTTP レスポンスボディに変換する
    ///
    /// 5xx の詳細はログにのみ出力し、レスポンスには固定文言を返す。
    fn to_error_response(&self) -> ErrorResponse {
        match self {
            Self::Validation(msg) => ErrorResponse::validation_error(msg),
            Self::NotFound(msg) => ErrorResponse::not_found(msg),
            Self::NotPending(msg) => ErrorResponse::not_pending(msg),
            Self::NoNextStep(msg) => ErrorResponse::no_next_step(msg),
            Self::Unauthorized(msg) => ErrorResponse::forbidden(msg),
            Self::ConditionNotMet(msg) => ErrorResponse::condition_not_met(msg),
            Self::Conflict(msg) => ErrorResponse::conflict(msg),
            Self::Database(e) => {
                tracing::error!(
                    error.category = log_error::category::INFRASTRUCTURE,
                    error.kind = log_error::kind::DATABASE,
                    span_trace = %e.span_trace(),
                    "データベースエラー: {}",
                    e
                );
                ErrorResponse::internal_error()
            }
            Self::Internal(msg) => {
                tracing::error!(
                    error.category = log_error::category::INFRASTRUCTURE,
                    error.kind = log_error::kind::INTERNAL,
                    "内部エラー: {}",
                    msg
                );
                ErrorResponse::internal_error()
            }
        }
    }
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let body = self.to_error_response();
        let status =
            StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status, Json(body)).into_response()
    }
}
