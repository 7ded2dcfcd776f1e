//! # 申請ユースケース
//!
//! 申請の作成・参照・更新・削除と、承認フローの進行（承認・却下）を実装する。
//!
//! ## 排他制御
//!
//! 状態を変更する操作は次の順で実行する。
//!
//! 1. 申請単位のプロセス内ロックを取得（[`RequestLockRegistry`]）
//! 2. トランザクションを開始し `SELECT ... FOR UPDATE` で申請を取得
//! 3. 承認履歴の追記と申請の更新を同一トランザクションで実行
//! 4. 申請の更新はバージョン比較付き（不一致は `CoreError::Conflict`）
//! 5. コミット後にロックを解放
//!
//! コミット前に失敗・キャンセルされた場合は `TxContext` のドロップでロールバックされる。

mod decision;
mod helpers;
mod lifecycle;
mod query;

use std::sync::Arc;

use rust_decimal::Decimal;
use shonin_domain::{
    approval_history::ApprovalHistory,
    clock::Clock,
    request::{Request, RequestContent, RequestStatus},
    value_objects::{Amount, RequestTitle},
    workflow::WorkflowId,
};
use shonin_infra::{
    db::TransactionManager,
    repository::{
        ApprovalHistoryRepository,
        RequestRepository,
        WorkflowRepository,
        WorkflowStepRepository,
    },
};

use crate::{error::CoreError, usecase::lock::RequestLockRegistry};

/// 一覧取得のデフォルト件数
pub(crate) const DEFAULT_LIMIT: i64 = 10;
/// 一覧取得の最大件数
pub(crate) const MAX_LIMIT: i64 = 100;

/// 申請作成入力
#[derive(Debug, Clone)]
pub struct CreateRequestInput {
    pub workflow_id: WorkflowId,
    pub amount:      Decimal,
    pub title:       String,
    pub description: String,
}

/// 申請内容の更新入力
#[derive(Debug, Clone)]
pub struct UpdateRequestInput {
    pub amount:      Decimal,
    pub title:       String,
    pub description: String,
}

/// 申請一覧の取得条件
///
/// 範囲外の値はユースケース内で補正する（page < 1 → 1、limit < 1 → 10、limit > 100 → 100）。
#[derive(Debug, Clone)]
pub struct ListRequestsInput {
    pub page:   i64,
    pub limit:  i64,
    pub status: Option<RequestStatus>,
}

impl Default for ListRequestsInput {
    fn default() -> Self {
        Self {
            page:   1,
            limit:  DEFAULT_LIMIT,
            status: None,
        }
    }
}

/// 申請一覧の1ページ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPage {
    pub requests: Vec<Request>,
    pub total:    u64,
    pub page:     u32,
    pub limit:    u32,
}

/// 申請と承認履歴のタイムライン
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTimeline {
    pub request:     Request,
    /// ワークフローに定義された承認ステップ数
    pub total_steps: usize,
    /// 作成日時の昇順
    pub histories:   Vec<ApprovalHistory>,
}

/// 申請ユースケースの依存コンポーネント
pub struct RequestUseCaseDeps {
    pub request_repo:  Arc<dyn RequestRepository>,
    pub workflow_repo: Arc<dyn WorkflowRepository>,
    pub step_repo:     Arc<dyn WorkflowStepRepository>,
    pub history_repo:  Arc<dyn ApprovalHistoryRepository>,
    pub tx_manager:    Arc<dyn TransactionManager>,
    pub clock:         Arc<dyn Clock>,
}

/// 申請ユースケース実装
pub struct RequestUseCaseImpl {
    deps:  RequestUseCaseDeps,
    locks: RequestLockRegistry,
}

impl RequestUseCaseImpl {
    pub fn new(deps: RequestUseCaseDeps) -> Self {
        Self {
            deps,
            locks: RequestLockRegistry::new(),
        }
    }

    /// プロセス内ロックのレジストリ（テスト・監視用）
    pub fn locks(&self) -> &RequestLockRegistry {
        &self.locks
    }
}

/// 入力値から申請内容を組み立てる
///
/// I/O の前に検証し、不正な値は `CoreError::Validation` にする。
pub(crate) fn build_content(
    amount: Decimal,
    title: String,
    description: String,
) -> Result<RequestContent, CoreError> {
    Ok(RequestContent {
        amount: Amount::new(amount)?,
        title: RequestTitle::new(title)?,
        description,
    })
}
