//! テスト共通フィクスチャ
//!
//! DB を使用する統合テストで共通利用するシードデータ投入・エンティティ生成ヘルパー。

// 各テストファイルが独立したクレートとしてコンパイルされるため、
// 使用しない関数に dead_code 警告が出る。モジュール全体で抑制する。
#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use shonin_domain::{
    actor::ActorId,
    request::{NewRequest, Request, RequestContent, RequestId},
    user::UserId,
    value_objects::{Amount, RequestTitle},
    workflow::WorkflowId,
};
use sqlx::PgPool;

/// テスト用の固定日時
pub fn test_now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

/// ワークフローを直接 INSERT する
pub async fn seed_workflow(pool: &PgPool, name: &str) -> WorkflowId {
    let id = WorkflowId::new();
    sqlx::query("INSERT INTO workflows (id, name) VALUES ($1, $2)")
        .bind(id.as_uuid())
        .bind(name)
        .execute(pool)
        .await
        .unwrap();
    id
}

/// 承認ステップを直接 INSERT する
pub async fn seed_step(
    pool: &PgPool,
    workflow_id: &WorkflowId,
    level: i32,
    actor_id: &ActorId,
    conditions: Value,
) {
    sqlx::query(
        r#"
        INSERT INTO workflow_steps (id, workflow_id, level, actor_id, conditions, description)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(uuid::Uuid::now_v7())
    .bind(workflow_id.as_uuid())
    .bind(level)
    .bind(actor_id.as_uuid())
    .bind(conditions)
    .bind(format!("第{level}段階"))
    .execute(pool)
    .await
    .unwrap();
}

/// 金額と作成日時のオフセット（秒）を指定して申請を生成する
pub fn build_request(workflow_id: &WorkflowId, amount: i64, offset_secs: i64) -> Request {
    Request::new(NewRequest {
        id: RequestId::new(),
        workflow_id: workflow_id.clone(),
        content: RequestContent {
            amount:      Amount::new(Decimal::from(amount)).unwrap(),
            title:       RequestTitle::new(format!("申請 {amount}")).unwrap(),
            description: "統合テスト".to_string(),
        },
        requester_id: UserId::new(),
        now: test_now() + Duration::seconds(offset_secs),
    })
}
