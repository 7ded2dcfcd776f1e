//! # WorkflowRepository
//!
//! ワークフロー（承認経路）の読み取り専用リポジトリ。
//! 申請作成時のワークフロー存在確認に使用する。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shonin_domain::workflow::{Workflow, WorkflowId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// ワークフローリポジトリトレイト
#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    /// ID でワークフローを取得する
    async fn find_by_id(&self, id: &WorkflowId) -> Result<Option<Workflow>, InfraError>;
}

#[derive(sqlx::FromRow)]
struct WorkflowRow {
    id:          Uuid,
    name:        String,
    description: String,
    created_at:  DateTime<Utc>,
    updated_at:  DateTime<Utc>,
}

impl From<WorkflowRow> for Workflow {
    fn from(row: WorkflowRow) -> Self {
        Workflow::from_db(
            WorkflowId::from_uuid(row.id),
            row.name,
            row.description,
            row.created_at,
            row.updated_at,
        )
    }
}

/// PostgreSQL 実装の WorkflowRepository
#[derive(Debug, Clone)]
pub struct PostgresWorkflowRepository {
    pool: PgPool,
}

impl PostgresWorkflowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkflowRepository for PostgresWorkflowRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(workflow_id = %id))]
    async fn find_by_id(&self, id: &WorkflowId) -> Result<Option<Workflow>, InfraError> {
        let row = sqlx::query_as::<_, WorkflowRow>(
            r#"
            SELECT id, name, description, created_at, updated_at
            FROM workflows
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Workflow::from))
    }
}
