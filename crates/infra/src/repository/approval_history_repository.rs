//! # ApprovalHistoryRepository
//!
//! 承認履歴（監査ログ）の追記専用リポジトリ。
//! 追記は申請の状態更新と同じ [`TxContext`] 上で行う。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shonin_domain::{
    actor::ActorId,
    approval_history::{ApprovalAction, ApprovalHistory, ApprovalHistoryId, ApprovalHistoryRecord},
    request::RequestId,
    user::UserId,
    value_objects::StepLevel,
    workflow::WorkflowId,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{db::TxContext, error::InfraError};

/// 承認履歴リポジトリトレイト
#[async_trait]
pub trait ApprovalHistoryRepository: Send + Sync {
    /// 承認履歴を追記する
    async fn insert(&self, tx: &mut TxContext, history: &ApprovalHistory)
    -> Result<(), InfraError>;

    /// 申請の承認履歴を時系列順（作成日時の昇順）で取得する
    async fn find_by_request_ordered(
        &self,
        request_id: &RequestId,
    ) -> Result<Vec<ApprovalHistory>, InfraError>;
}

#[derive(sqlx::FromRow)]
struct ApprovalHistoryRow {
    id:          Uuid,
    request_id:  Uuid,
    workflow_id: Uuid,
    step_level:  i32,
    actor_id:    Option<Uuid>,
    user_id:     Uuid,
    action:      String,
    comment:     String,
    created_at:  DateTime<Utc>,
}

impl TryFrom<ApprovalHistoryRow> for ApprovalHistory {
    type Error = InfraError;

    fn try_from(row: ApprovalHistoryRow) -> Result<Self, Self::Error> {
        Ok(ApprovalHistory::from_db(ApprovalHistoryRecord {
            id:          ApprovalHistoryId::from_uuid(row.id),
            request_id:  RequestId::from_uuid(row.request_id),
            workflow_id: WorkflowId::from_uuid(row.workflow_id),
            step_level:  StepLevel::try_from(row.step_level)
                .map_err(|e| InfraError::unexpected(e.to_string()))?,
            actor_id:    row.actor_id.map(ActorId::from_uuid),
            user_id:     UserId::from_uuid(row.user_id),
            action:      row
                .action
                .parse::<ApprovalAction>()
                .map_err(|e| InfraError::unexpected(e.to_string()))?,
            comment:     row.comment,
            created_at:  row.created_at,
        }))
    }
}

/// PostgreSQL 実装
pub struct PostgresApprovalHistoryRepository {
    pool: PgPool,
}

impl PostgresApprovalHistoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApprovalHistoryRepository for PostgresApprovalHistoryRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(request_id = %history.request_id()))]
    async fn insert(
        &self,
        tx: &mut TxContext,
        history: &ApprovalHistory,
    ) -> Result<(), InfraError> {
        let action: &str = history.action().into();
        sqlx::query(
            r#"
            INSERT INTO approval_histories (
                id, request_id, workflow_id, step_level, actor_id, user_id,
                action, comment, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(history.id().as_uuid())
        .bind(history.request_id().as_uuid())
        .bind(history.workflow_id().as_uuid())
        .bind(history.step_level().as_i32())
        .bind(history.actor_id().map(|id| *id.as_uuid()))
        .bind(history.user_id().as_uuid())
        .bind(action)
        .bind(history.comment())
        .bind(history.created_at())
        .execute(tx.conn())
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%request_id))]
    async fn find_by_request_ordered(
        &self,
        request_id: &RequestId,
    ) -> Result<Vec<ApprovalHistory>, InfraError> {
        let rows = sqlx::query_as::<_, ApprovalHistoryRow>(
            r#"
            SELECT
                id, request_id, workflow_id, step_level, actor_id, user_id,
                action, comment, created_at
            FROM approval_histories
            WHERE request_id = $1
            ORDER BY created_at ASC, step_level ASC, id ASC
            "#,
        )
        .bind(request_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ApprovalHistory::try_from).collect()
    }
}
