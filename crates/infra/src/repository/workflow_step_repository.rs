//! # WorkflowStepRepository
//!
//! 承認ステップの読み取り専用リポジトリ。
//!
//! 承認条件は JSONB カラムに保存され、読み取り時に [`StepConditions`] へ変換する。
//! 変換に失敗した場合は `InfraErrorKind::Serialization` を返す。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shonin_domain::{
    actor::ActorId,
    value_objects::StepLevel,
    workflow::WorkflowId,
    workflow_step::{StepConditions, WorkflowStep, WorkflowStepId, WorkflowStepRecord},
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// WorkflowStepRepository トレイト
#[async_trait]
pub trait WorkflowStepRepository: Send + Sync {
    /// ワークフローと段階でステップを検索する
    ///
    /// 該当する段階が存在しない場合は `None` を返す。承認フローでは
    /// 「次の段階が存在しない」ことが最終承認の判定になる。
    async fn find_by_workflow_and_level(
        &self,
        workflow_id: &WorkflowId,
        level: StepLevel,
    ) -> Result<Option<WorkflowStep>, InfraError>;

    /// ワークフローのステップ一覧を段階の昇順で取得する
    async fn find_by_workflow(
        &self,
        workflow_id: &WorkflowId,
    ) -> Result<Vec<WorkflowStep>, InfraError>;
}

/// DB の workflow_steps テーブルの行を表す中間構造体
#[derive(sqlx::FromRow)]
struct WorkflowStepRow {
    id:          Uuid,
    workflow_id: Uuid,
    level:       i32,
    actor_id:    Uuid,
    conditions:  serde_json::Value,
    description: String,
    created_at:  DateTime<Utc>,
    updated_at:  DateTime<Utc>,
}

impl TryFrom<WorkflowStepRow> for WorkflowStep {
    type Error = InfraError;

    fn try_from(row: WorkflowStepRow) -> Result<Self, Self::Error> {
        Ok(WorkflowStep::from_db(WorkflowStepRecord {
            id:          WorkflowStepId::from_uuid(row.id),
            workflow_id: WorkflowId::from_uuid(row.workflow_id),
            level:       StepLevel::try_from(row.level)
                .map_err(|e| InfraError::unexpected(e.to_string()))?,
            actor_id:    ActorId::from_uuid(row.actor_id),
            conditions:  serde_json::from_value::<StepConditions>(row.conditions)?,
            description: row.description,
            created_at:  row.created_at,
            updated_at:  row.updated_at,
        }))
    }
}

/// PostgreSQL 実装
pub struct PostgresWorkflowStepRepository {
    pool: PgPool,
}

impl PostgresWorkflowStepRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkflowStepRepository for PostgresWorkflowStepRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(%workflow_id, %level))]
    async fn find_by_workflow_and_level(
        &self,
        workflow_id: &WorkflowId,
        level: StepLevel,
    ) -> Result<Option<WorkflowStep>, InfraError> {
        let row = sqlx::query_as::<_, WorkflowStepRow>(
            r#"
            SELECT
                id, workflow_id, level, actor_id, conditions, description,
                created_at, updated_at
            FROM workflow_steps
            WHERE workflow_id = $1 AND level = $2
            "#,
        )
        .bind(workflow_id.as_uuid())
        .bind(level.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        row.map(WorkflowStep::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%workflow_id))]
    async fn find_by_workflow(
        &self,
        workflow_id: &WorkflowId,
    ) -> Result<Vec<WorkflowStep>, InfraError> {
        let rows = sqlx::query_as::<_, WorkflowStepRow>(
            r#"
            SELECT
                id, workflow_id, level, actor_id, conditions, description,
                created_at, updated_at
            FROM workflow_steps
            WHERE workflow_id = $1
            ORDER BY level ASC
            "#,
        )
        .bind(workflow_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(WorkflowStep::try_from).collect()
    }
}
