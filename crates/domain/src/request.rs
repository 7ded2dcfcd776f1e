//! # 申請（Request）
//!
//! 承認フローを流れる申請案件と、その状態遷移を定義する。
//!
//! ## 状態遷移
//!
//! ```text
//! Pending --承認（次ステップあり）--> Pending（current_step = 次の段階）
//! Pending --承認（次ステップなし）--> Approved（current_step = 最終段階 + 1）
//! Pending --却下--> Rejected
//! ```
//!
//! Approved / Rejected は終端状態で、以降の遷移はすべて `DomainError::InvalidState` になる。
//! 状態は ADT で表現し、終端状態は必ず完了日時を持つ。
//!
//! ## 楽観的ロック
//!
//! 遷移に成功するたびに `version` はちょうど 1 増える。永続化時は遷移前の
//! バージョンを期待値として比較し、一致しなければ競合とする。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{
    DomainError,
    user::UserId,
    value_objects::{Amount, RequestTitle, StepLevel, Version},
    workflow::WorkflowId,
};

define_uuid_id! {
    /// 申請 ID
    pub struct RequestId;
}

/// 申請ステータス
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    /// 承認待ち
    Pending,
    /// 承認完了
    Approved,
    /// 却下
    Rejected,
}

impl std::str::FromStr for RequestStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            _ => Err(DomainError::Validation(format!(
                "不正な申請ステータス: {}",
                s
            ))),
        }
    }
}

/// 申請の状態（ADT ベースステートマシン）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestState {
    /// 承認待ち
    Pending,
    /// 承認完了
    Approved(CompletedState),
    /// 却下
    Rejected(CompletedState),
}

/// Approved/Rejected 共通の完了状態フィールド
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedState {
    /// 完了日時
    pub completed_at: DateTime<Utc>,
}

/// 申請内容（更新可能なフィールド）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContent {
    pub amount:      Amount,
    pub title:       RequestTitle,
    pub description: String,
}

/// 申請エンティティ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    id: RequestId,
    workflow_id: WorkflowId,
    current_step: StepLevel,
    content: RequestContent,
    requester_id: UserId,
    version: Version,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    state: RequestState,
}

/// 申請の新規作成パラメータ
pub struct NewRequest {
    pub id: RequestId,
    pub workflow_id: WorkflowId,
    pub content: RequestContent,
    pub requester_id: UserId,
    pub now: DateTime<Utc>,
}

/// 申請の DB 復元パラメータ
///
/// DB スキーマのフラット構造を表現する。`from_db()` で不変条件を検証して ADT に変換する。
pub struct RequestRecord {
    pub id: RequestId,
    pub workflow_id: WorkflowId,
    pub current_step: StepLevel,
    pub status: RequestStatus,
    pub amount: Amount,
    pub title: RequestTitle,
    pub description: String,
    pub requester_id: UserId,
    pub version: Version,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Request {
    /// 新しい申請を作成する
    ///
    /// 承認待ち・第 1 段階・バージョン 1 で開始する。
    pub fn new(params: NewRequest) -> Self {
        Self {
            id: params.id,
            workflow_id: params.workflow_id,
            current_step: StepLevel::initial(),
            content: params.content,
            requester_id: params.requester_id,
            version: Version::initial(),
            created_at: params.now,
            updated_at: params.now,
            state: RequestState::Pending,
        }
    }

    /// 既存のデータから復元する
    ///
    /// # Errors
    ///
    /// - `DomainError::Validation`: 承認待ちなのに完了日時がある、
    ///   または終端状態なのに完了日時がない
    pub fn from_db(record: RequestRecord) -> Result<Self, DomainError> {
        let state = match (record.status, record.completed_at) {
            (RequestStatus::Pending, None) => RequestState::Pending,
            (RequestStatus::Pending, Some(_)) => {
                return Err(DomainError::Validation(
                    "承認待ちの申請に completed_at は設定できません".to_string(),
                ));
            }
            (RequestStatus::Approved, Some(completed_at)) => {
                RequestState::Approved(CompletedState { completed_at })
            }
            (RequestStatus::Rejected, Some(completed_at)) => {
                RequestState::Rejected(CompletedState { completed_at })
            }
            (status, None) => {
                return Err(DomainError::Validation(format!(
                    "{status} の申請には completed_at が必要です"
                )));
            }
        };

        Ok(Self {
            id: record.id,
            workflow_id: record.workflow_id,
            current_step: record.current_step,
            content: RequestContent {
                amount:      record.amount,
                title:       record.title,
                description: record.description,
            },
            requester_id: record.requester_id,
            version: record.version,
            created_at: record.created_at,
            updated_at: record.updated_at,
            state,
        })
    }

    // Getter メソッド

    pub fn id(&self) -> &RequestId {
        &self.id
    }

    pub fn workflow_id(&self) -> &WorkflowId {
        &self.workflow_id
    }

    pub fn current_step(&self) -> StepLevel {
        self.current_step
    }

    pub fn amount(&self) -> Amount {
        self.content.amount
    }

    pub fn title(&self) -> &RequestTitle {
        &self.content.title
    }

    pub fn description(&self) -> &str {
        &self.content.description
    }

    pub fn requester_id(&self) -> &UserId {
        &self.requester_id
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn status(&self) -> RequestStatus {
        match &self.state {
            RequestState::Pending => RequestStatus::Pending,
            RequestState::Approved(_) => RequestStatus::Approved,
            RequestState::Rejected(_) => RequestStatus::Rejected,
        }
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            RequestState::Approved(s) | RequestState::Rejected(s) => Some(s.completed_at),
            RequestState::Pending => None,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// 状態への直接アクセス（パターンマッチ用）
    pub fn state(&self) -> &RequestState {
        &self.state
    }

    // ビジネスロジックメソッド

    pub fn is_pending(&self) -> bool {
        matches!(self.state, RequestState::Pending)
    }

    /// 承認待ちであることを確認する
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidState`: 承認済み・却下済みの場合
    pub fn ensure_pending(&self) -> Result<(), DomainError> {
        match &self.state {
            RequestState::Pending => Ok(()),
            _ => Err(DomainError::InvalidState(format!(
                "申請は承認待ちではありません（現在: {}）",
                self.status()
            ))),
        }
    }

    /// 次の承認段階に進める
    ///
    /// 承認待ちのまま `current_step` を次の段階に更新する。
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidState`: 承認待ち以外で呼び出した場合
    /// - `DomainError::Validation`: 次の段階が現在の段階以下の場合
    pub fn advanced_to(self, next_level: StepLevel, now: DateTime<Utc>) -> Result<Self, DomainError> {
        self.ensure_pending()?;
        if next_level <= self.current_step {
            return Err(DomainError::Validation(format!(
                "次の段階は現在の段階より後である必要があります（現在: {}, 次: {}）",
                self.current_step, next_level
            )));
        }
        Ok(Self {
            current_step: next_level,
            version: self.version.next(),
            updated_at: now,
            ..self
        })
    }

    /// 最終段階の承認による完了処理
    ///
    /// Approved に遷移し、`current_step` は最終段階 + 1 になる。
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidState`: 承認待ち以外で呼び出した場合
    pub fn complete_with_approval(self, now: DateTime<Utc>) -> Result<Self, DomainError> {
        match self.state {
            RequestState::Pending => Ok(Self {
                state: RequestState::Approved(CompletedState { completed_at: now }),
                current_step: self.current_step.next(),
                version: self.version.next(),
                updated_at: now,
                ..self
            }),
            _ => Err(DomainError::InvalidState(format!(
                "承認完了は承認待ちでのみ可能です（現在: {}）",
                self.status()
            ))),
        }
    }

    /// 却下による完了処理
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidState`: 承認待ち以外で呼び出した場合
    pub fn complete_with_rejection(self, now: DateTime<Utc>) -> Result<Self, DomainError> {
        match self.state {
            RequestState::Pending => Ok(Self {
                state: RequestState::Rejected(CompletedState { completed_at: now }),
                version: self.version.next(),
                updated_at: now,
                ..self
            }),
            _ => Err(DomainError::InvalidState(format!(
                "却下は承認待ちでのみ可能です（現在: {}）",
                self.status()
            ))),
        }
    }

    /// 申請内容を更新する
    ///
    /// 金額・件名・説明を置き換える。段階と状態は変化しない。
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidState`: 承認待ち以外で呼び出した場合
    pub fn with_content(self, content: RequestContent, now: DateTime<Utc>) -> Result<Self, DomainError> {
        match self.state {
            RequestState::Pending => Ok(Self {
                content,
                version: self.version.next(),
                updated_at: now,
                ..self
            }),
            _ => Err(DomainError::InvalidState(format!(
                "申請内容の更新は承認待ちでのみ可能です（現在: {}）",
                self.status()
            ))),
        }
    }
}
