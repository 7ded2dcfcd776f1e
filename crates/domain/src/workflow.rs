//! # ワークフロー（承認経路）
//!
//! 申請が辿る承認経路の定義。ステップ構成は [`crate::workflow_step`] が持つ。
//! このサービスではワークフローの作成・編集は行わず、存在確認にのみ使用する。

use chrono::{DateTime, Utc};

define_uuid_id! {
    /// ワークフロー ID
    pub struct WorkflowId;
}

/// ワークフローエンティティ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workflow {
    id:          WorkflowId,
    name:        String,
    description: String,
    created_at:  DateTime<Utc>,
    updated_at:  DateTime<Utc>,
}

impl Workflow {
    /// 既存のデータから復元する
    pub fn from_db(
        id: WorkflowId,
        name: String,
        description: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            description,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &WorkflowId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
