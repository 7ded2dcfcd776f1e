//! # RequestRepository
//!
//! 申請の永続化を担当するリポジトリ。
//!
//! ## 並行制御
//!
//! - **悲観的ロック**: [`find_by_id_for_update`](RequestRepository::find_by_id_for_update)
//!   は `SELECT ... FOR UPDATE` で行ロックを取得し、別インスタンスからの同時遷移を直列化する
//! - **楽観的ロック**: [`update_with_version_check`](RequestRepository::update_with_version_check)
//!   は `WHERE version = $expected` で更新し、0 行なら競合とする

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shonin_domain::{
    request::{Request, RequestId, RequestRecord, RequestStatus},
    user::UserId,
    value_objects::{Amount, RequestTitle, StepLevel, Version},
    workflow::WorkflowId,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{db::TxContext, error::InfraError};

/// 申請リポジトリトレイト
#[async_trait]
pub trait RequestRepository: Send + Sync {
    /// 新規申請を作成する
    async fn insert(&self, tx: &mut TxContext, request: &Request) -> Result<(), InfraError>;

    /// 楽観的ロック付きで申請を更新する
    ///
    /// `expected_version` と DB 上のバージョンが一致する場合のみ更新する。
    /// 不一致（または行が存在しない）の場合は `InfraErrorKind::Conflict` を返す。
    async fn update_with_version_check(
        &self,
        tx: &mut TxContext,
        request: &Request,
        expected_version: Version,
    ) -> Result<(), InfraError>;

    /// ID で申請を取得する
    async fn find_by_id(&self, id: &RequestId) -> Result<Option<Request>, InfraError>;

    /// ID で申請を行ロック付きで取得する
    ///
    /// トランザクションが終わるまで、他のトランザクションからの
    /// 同じ行への `FOR UPDATE` はブロックされる。
    async fn find_by_id_for_update(
        &self,
        tx: &mut TxContext,
        id: &RequestId,
    ) -> Result<Option<Request>, InfraError>;

    /// 申請一覧を作成日時の降順で取得する
    ///
    /// `status` を指定した場合はそのステータスのみに絞り込む。
    async fn find_page(
        &self,
        status: Option<RequestStatus>,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Request>, InfraError>;

    /// 申請の件数を取得する（`find_page` と同じ絞り込み条件）
    async fn count(&self, status: Option<RequestStatus>) -> Result<u64, InfraError>;

    /// 申請を削除する
    ///
    /// 削除した場合は `true`、対象が存在しなかった場合は `false` を返す。
    /// 承認履歴は外部キーの `ON DELETE CASCADE` で同時に削除される。
    async fn delete(&self, tx: &mut TxContext, id: &RequestId) -> Result<bool, InfraError>;
}

/// DB の requests テーブルの行を表す中間構造体
///
/// `TryFrom` で `Request` への変換ロジックを一箇所に集約する。
#[derive(sqlx::FromRow)]
struct RequestRow {
    id: Uuid,
    workflow_id: Uuid,
    current_step: i32,
    status: String,
    amount: Decimal,
    title: String,
    description: String,
    requester_id: Uuid,
    version: i32,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RequestRow> for Request {
    type Error = InfraError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        Request::from_db(RequestRecord {
            id: RequestId::from_uuid(row.id),
            workflow_id: WorkflowId::from_uuid(row.workflow_id),
            current_step: StepLevel::try_from(row.current_step)
                .map_err(|e| InfraError::unexpected(e.to_string()))?,
            status: row
                .status
                .parse::<RequestStatus>()
                .map_err(|e| InfraError::unexpected(format!("不正なステータス: {}", e)))?,
            amount: Amount::new(row.amount).map_err(|e| InfraError::unexpected(e.to_string()))?,
            title: RequestTitle::new(row.title)
                .map_err(|e| InfraError::unexpected(e.to_string()))?,
            description: row.description,
            requester_id: UserId::from_uuid(row.requester_id),
            version: Version::try_from(row.version)
                .map_err(|e| InfraError::unexpected(e.to_string()))?,
            completed_at: row.completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
        .map_err(|e| InfraError::unexpected(e.to_string()))
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT
        id, workflow_id, current_step, status, amount, title, description,
        requester_id, version, completed_at, created_at, updated_at
    FROM requests
"#;

/// PostgreSQL 実装の RequestRepository
#[derive(Debug, Clone)]
pub struct PostgresRequestRepository {
    pool: PgPool,
}

impl PostgresRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RequestRepository for PostgresRequestRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(request_id = %request.id()))]
    async fn insert(&self, tx: &mut TxContext, request: &Request) -> Result<(), InfraError> {
        let status: &str = request.status().into();
        sqlx::query(
            r#"
            INSERT INTO requests (
                id, workflow_id, current_step, status, amount, title, description,
                requester_id, version, completed_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(request.id().as_uuid())
        .bind(request.workflow_id().as_uuid())
        .bind(request.current_step().as_i32())
        .bind(status)
        .bind(request.amount().as_decimal())
        .bind(request.title().as_str())
        .bind(request.description())
        .bind(request.requester_id().as_uuid())
        .bind(request.version().as_i32())
        .bind(request.completed_at())
        .bind(request.created_at())
        .bind(request.updated_at())
        .execute(tx.conn())
        .await?;

        Ok(())
    }

    #[tracing::instrument(
        skip_all,
        level = "debug",
        fields(request_id = %request.id(), %expected_version)
    )]
    async fn update_with_version_check(
        &self,
        tx: &mut TxContext,
        request: &Request,
        expected_version: Version,
    ) -> Result<(), InfraError> {
        let status: &str = request.status().into();
        let result = sqlx::query(
            r#"
            UPDATE requests SET
                current_step = $1,
                status = $2,
                amount = $3,
                title = $4,
                description = $5,
                version = $6,
                completed_at = $7,
                updated_at = $8
            WHERE id = $9 AND version = $10
            "#,
        )
        .bind(request.current_step().as_i32())
        .bind(status)
        .bind(request.amount().as_decimal())
        .bind(request.title().as_str())
        .bind(request.description())
        .bind(request.version().as_i32())
        .bind(request.completed_at())
        .bind(request.updated_at())
        .bind(request.id().as_uuid())
        .bind(expected_version.as_i32())
        .execute(tx.conn())
        .await?;

        if result.rows_affected() == 0 {
            return Err(InfraError::conflict("Request", request.id().to_string()));
        }

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(request_id = %id))]
    async fn find_by_id(&self, id: &RequestId) -> Result<Option<Request>, InfraError> {
        let row = sqlx::query_as::<_, RequestRow>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Request::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(request_id = %id))]
    async fn find_by_id_for_update(
        &self,
        tx: &mut TxContext,
        id: &RequestId,
    ) -> Result<Option<Request>, InfraError> {
        let row = sqlx::query_as::<_, RequestRow>(&format!(
            "{SELECT_COLUMNS} WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(tx.conn())
        .await?;

        row.map(Request::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(?status, limit, offset))]
    async fn find_page(
        &self,
        status: Option<RequestStatus>,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Request>, InfraError> {
        let status: Option<&'static str> = status.map(Into::into);
        let offset = i64::try_from(offset)
            .map_err(|_| InfraError::unexpected(format!("offset が大きすぎます: {offset}")))?;
        let rows = sqlx::query_as::<_, RequestRow>(&format!(
            r#"
            {SELECT_COLUMNS}
            WHERE ($1::text IS NULL OR status = $1::text)
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(status)
        .bind(i64::from(limit))
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Request::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(?status))]
    async fn count(&self, status: Option<RequestStatus>) -> Result<u64, InfraError> {
        let status: Option<&'static str> = status.map(Into::into);
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM requests
            WHERE ($1::text IS NULL OR status = $1::text)
            "#,
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        u64::try_from(count).map_err(|e| InfraError::unexpected(e.to_string()))
    }

    #[tracing::instrument(skip_all, level = "debug", fields(request_id = %id))]
    async fn delete(&self, tx: &mut TxContext, id: &RequestId) -> Result<bool, InfraError> {
        let result = sqlx::query("DELETE FROM requests WHERE id = $1")
            .bind(id.as_uuid())
            .execute(tx.conn())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
