//! # 承認ステップ
//!
//! ワークフローを構成する承認段階と、その段階に進むための承認条件を定義する。
//!
//! ## 承認条件の評価
//!
//! [`StepConditions`] は `min_amount`, `max_amount`, `roles` を保持するが、
//! 評価されるのは `min_amount` のみ。`max_amount` と `roles` は
//! データとして保持・返却するだけで、承認可否には影響しない。

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    actor::ActorId,
    value_objects::{Amount, StepLevel},
    workflow::WorkflowId,
};

define_uuid_id! {
    /// ワークフローステップ ID
    pub struct WorkflowStepId;
}

/// 承認条件
///
/// DB には JSONB で保存される。キーが欠けている場合はゼロ値・空配列として扱う。
/// 数値は JSON の数値・文字列のどちらでも受け付ける。
///
/// ```rust
/// use shonin_domain::workflow_step::StepConditions;
///
/// let conditions: StepConditions = serde_json::from_str(r#"{"min_amount": 500000}"#).unwrap();
/// assert!(conditions.roles.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StepConditions {
    /// 下限金額（0 は制約なし）
    pub min_amount: Decimal,
    /// 上限金額（評価しない）
    pub max_amount: Decimal,
    /// 承認可能なロール（評価しない）
    pub roles:      Vec<String>,
}

impl StepConditions {
    /// 申請金額が承認条件を満たすか判定する
    ///
    /// `min_amount` が 0 なら常に満たす。それ以外は金額が下限以上の場合に満たす。
    pub fn satisfies(&self, amount: Amount) -> bool {
        self.min_amount.is_zero() || amount.as_decimal() >= self.min_amount
    }
}

/// ワークフローステップエンティティ
///
/// 承認フローからは読み取り専用。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowStep {
    id:          WorkflowStepId,
    workflow_id: WorkflowId,
    level:       StepLevel,
    actor_id:    ActorId,
    conditions:  StepConditions,
    description: String,
    created_at:  DateTime<Utc>,
    updated_at:  DateTime<Utc>,
}

/// ワークフローステップの新規作成パラメータ
pub struct NewWorkflowStep {
    pub id:          WorkflowStepId,
    pub workflow_id: WorkflowId,
    pub level:       StepLevel,
    pub actor_id:    ActorId,
    pub conditions:  StepConditions,
    pub description: String,
    pub now:         DateTime<Utc>,
}

/// ワークフローステップの DB 復元パラメータ
pub struct WorkflowStepRecord {
    pub id:          WorkflowStepId,
    pub workflow_id: WorkflowId,
    pub level:       StepLevel,
    pub actor_id:    ActorId,
    pub conditions:  StepConditions,
    pub description: String,
    pub created_at:  DateTime<Utc>,
    pub updated_at:  DateTime<Utc>,
}

impl WorkflowStep {
    pub fn new(params: NewWorkflowStep) -> Self {
        Self {
            id:          params.id,
            workflow_id: params.workflow_id,
            level:       params.level,
            actor_id:    params.actor_id,
            conditions:  params.conditions,
            description: params.description,
            created_at:  params.now,
            updated_at:  params.now,
        }
    }

    /// 既存のデータから復元する
    pub fn from_db(record: WorkflowStepRecord) -> Self {
        Self {
            id:          record.id,
            workflow_id: record.workflow_id,
            level:       record.level,
            actor_id:    record.actor_id,
            conditions:  record.conditions,
            description: record.description,
            created_at:  record.created_at,
            updated_at:  record.updated_at,
        }
    }

    pub fn id(&self) -> &WorkflowStepId {
        &self.id
    }

    pub fn workflow_id(&self) -> &WorkflowId {
        &self.workflow_id
    }

    pub fn level(&self) -> StepLevel {
        self.level
    }

    pub fn actor_id(&self) -> &ActorId {
        &self.actor_id
    }

    pub fn conditions(&self) -> &StepConditions {
        &self.conditions
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

    /// 申請金額がこのステップの承認条件を満たすか判定する
    pub fn accepts(&self, amount: Amount) -> bool {
        self.conditions.satisfies(amount)
    }
}
