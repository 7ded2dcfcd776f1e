//! # 承認履歴
//!
//! 承認・却下の操作ごとに 1 件追記される監査ログ。更新・削除は行わない。
//! 申請の状態更新と同じトランザクションで書き込まれ、片方だけが残ることはない。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{
    DomainError,
    actor::ActorId,
    request::RequestId,
    user::UserId,
    value_objects::StepLevel,
    workflow::WorkflowId,
};

define_uuid_id! {
    /// 承認履歴 ID
    pub struct ApprovalHistoryId;
}

/// 承認操作の種別
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalAction {
    /// 承認
    Approve,
    /// 却下
    Reject,
}

impl std::str::FromStr for ApprovalAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "APPROVE" => Ok(Self::Approve),
            "REJECT" => Ok(Self::Reject),
            _ => Err(DomainError::Validation(format!("不正な承認操作: {}", s))),
        }
    }
}

/// 承認履歴エンティティ
///
/// `actor_id` は操作者のアクター。アクターを持たない管理者の操作では `None`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalHistory {
    id:          ApprovalHistoryId,
    request_id:  RequestId,
    workflow_id: WorkflowId,
    step_level:  StepLevel,
    actor_id:    Option<ActorId>,
    user_id:     UserId,
    action:      ApprovalAction,
    comment:     String,
    created_at:  DateTime<Utc>,
}

/// 承認履歴の新規作成パラメータ
pub struct NewApprovalHistory {
    pub id:          ApprovalHistoryId,
    pub request_id:  RequestId,
    pub workflow_id: WorkflowId,
    pub step_level:  StepLevel,
    pub actor_id:    Option<ActorId>,
    pub user_id:     UserId,
    pub action:      ApprovalAction,
    pub comment:     String,
    pub now:         DateTime<Utc>,
}

/// 承認履歴の DB 復元パラメータ
pub struct ApprovalHistoryRecord {
    pub id:          ApprovalHistoryId,
    pub request_id:  RequestId,
    pub workflow_id: WorkflowId,
    pub step_level:  StepLevel,
    pub actor_id:    Option<ActorId>,
    pub user_id:     UserId,
    pub action:      ApprovalAction,
    pub comment:     String,
    pub created_at:  DateTime<Utc>,
}

impl ApprovalHistory {
    pub fn new(params: NewApprovalHistory) -> Self {
        Self {
            id:          params.id,
            request_id:  params.request_id,
            workflow_id: params.workflow_id,
            step_level:  params.step_level,
            actor_id:    params.actor_id,
            user_id:     params.user_id,
            action:      params.action,
            comment:     params.comment,
            created_at:  params.now,
        }
    }

    pub fn from_db(record: ApprovalHistoryRecord) -> Self {
        Self {
            id:          record.id,
            request_id:  record.request_id,
            workflow_id: record.workflow_id,
            step_level:  record.step_level,
            actor_id:    record.actor_id,
            user_id:     record.user_id,
            action:      record.action,
            comment:     record.comment,
            created_at:  record.created_at,
        }
    }

    pub fn id(&self) -> &ApprovalHistoryId {
        &self.id
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    pub fn workflow_id(&self) -> &WorkflowId {
        &self.workflow_id
    }

    pub fn step_level(&self) -> StepLevel {
        self.step_level
    }

    pub fn actor_id(&self) -> Option<&ActorId> {
        self.actor_id.as_ref()
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn action(&self) -> ApprovalAction {
        self.action
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("APPROVE", ApprovalAction::Approve)]
    #[case("REJECT", ApprovalAction::Reject)]
    fn test_承認操作と文字列の相互変換(#[case] s: &str, #[case] action: ApprovalAction) {
        assert_eq!(ApprovalAction::from_str(s).unwrap(), action);
        assert_eq!(action.to_string(), s);
    }

    #[test]
    fn test_不正な承認操作はエラー() {
        assert!(ApprovalAction::from_str("REQUEST_CHANGES").is_err());
        assert!(ApprovalAction::from_str("approve").is_err());
    }

    #[test]
    fn test_承認操作は大文字でシリアライズされる() {
        let json = serde_json::to_string(&ApprovalAction::Reject).unwrap();

        assert_eq!(json, "\"REJECT\"");
    }
}
