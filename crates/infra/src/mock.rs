//! # テスト用モックリポジトリ
//!
//! ユースケーステストで使用するインメモリモックリポジトリ。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! shonin-infra = { workspace = true, features = ["test-utils"] }
//! ```
//!
//! モックの書き込みは即座に反映され、ロールバックされない。
//! トランザクションの原子性は PostgreSQL 統合テストで検証する。

use std::sync::{
    Arc,
    Mutex,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use shonin_domain::{
    approval_history::ApprovalHistory,
    request::{Request, RequestId, RequestStatus},
    value_objects::{StepLevel, Version},
    workflow::{Workflow, WorkflowId},
    workflow_step::WorkflowStep,
};

use crate::{
    db::{TransactionManager, TxContext},
    error::InfraError,
    repository::{
        ApprovalHistoryRepository,
        RequestRepository,
        WorkflowRepository,
        WorkflowStepRepository,
    },
};

// ===== MockTransactionManager =====

#[derive(Clone, Default)]
pub struct MockTransactionManager;

#[async_trait]
impl TransactionManager for MockTransactionManager {
    async fn begin(&self) -> Result<TxContext, InfraError> {
        Ok(TxContext::mock())
    }
}

// ===== MockRequestRepository =====

#[derive(Clone, Default)]
pub struct MockRequestRepository {
    requests: Arc<Mutex<Vec<Request>>>,
}

impl MockRequestRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// テストの前提データとして申請を追加する
    pub fn add_request(&self, request: Request) {
        self.requests.lock().unwrap().push(request);
    }

    /// 保存済みの申請を取得する（アサーション用）
    pub fn get(&self, id: &RequestId) -> Option<Request> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id() == id)
            .cloned()
    }

    fn filtered(&self, status: Option<RequestStatus>) -> Vec<Request> {
        let mut requests: Vec<Request> = self
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| status.is_none_or(|s| r.status() == s))
            .cloned()
            .collect();
        requests.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().as_uuid().cmp(a.id().as_uuid()))
        });
        requests
    }
}

#[async_trait]
impl RequestRepository for MockRequestRepository {
    async fn insert(&self, _tx: &mut TxContext, request: &Request) -> Result<(), InfraError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn update_with_version_check(
        &self,
        _tx: &mut TxContext,
        request: &Request,
        expected_version: Version,
    ) -> Result<(), InfraError> {
        let mut requests = self.requests.lock().unwrap();
        match requests.iter().position(|r| r.id() == request.id()) {
            Some(pos) if requests[pos].version() == expected_version => {
                requests[pos] = request.clone();
                Ok(())
            }
            _ => Err(InfraError::conflict("Request", request.id().to_string())),
        }
    }

    async fn find_by_id(&self, id: &RequestId) -> Result<Option<Request>, InfraError> {
        Ok(self.get(id))
    }

    async fn find_by_id_for_update(
        &self,
        _tx: &mut TxContext,
        id: &RequestId,
    ) -> Result<Option<Request>, InfraError> {
        Ok(self.get(id))
    }

    async fn find_page(
        &self,
        status: Option<RequestStatus>,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Request>, InfraError> {
        Ok(self
            .filtered(status)
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count(&self, status: Option<RequestStatus>) -> Result<u64, InfraError> {
        Ok(self.filtered(status).len() as u64)
    }

    async fn delete(&self, _tx: &mut TxContext, id: &RequestId) -> Result<bool, InfraError> {
        let mut requests = self.requests.lock().unwrap();
        let before = requests.len();
        requests.retain(|r| r.id() != id);
        Ok(requests.len() < before)
    }
}

// ===== MockWorkflowRepository =====

#[derive(Clone, Default)]
pub struct MockWorkflowRepository {
    workflows: Arc<Mutex<Vec<Workflow>>>,
}

impl MockWorkflowRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_workflow(&self, workflow: Workflow) {
        self.workflows.lock().unwrap().push(workflow);
    }
}

#[async_trait]
impl WorkflowRepository for MockWorkflowRepository {
    async fn find_by_id(&self, id: &WorkflowId) -> Result<Option<Workflow>, InfraError> {
        Ok(self
            .workflows
            .lock()
            .unwrap()
            .iter()
            .find(|w| w.id() == id)
            .cloned())
    }
}

// ===== MockWorkflowStepRepository =====

#[derive(Clone, Default)]
pub struct MockWorkflowStepRepository {
    steps: Arc<Mutex<Vec<WorkflowStep>>>,
}

impl MockWorkflowStepRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_step(&self, step: WorkflowStep) {
        self.steps.lock().unwrap().push(step);
    }
}

#[async_trait]
impl WorkflowStepRepository for MockWorkflowStepRepository {
    async fn find_by_workflow_and_level(
        &self,
        workflow_id: &WorkflowId,
        level: StepLevel,
    ) -> Result<Option<WorkflowStep>, InfraError> {
        Ok(self
            .steps
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.workflow_id() == workflow_id && s.level() == level)
            .cloned())
    }

    async fn find_by_workflow(
        &self,
        workflow_id: &WorkflowId,
    ) -> Result<Vec<WorkflowStep>, InfraError> {
        let mut steps: Vec<WorkflowStep> = self
            .steps
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.workflow_id() == workflow_id)
            .cloned()
            .collect();
        steps.sort_by_key(WorkflowStep::level);
        Ok(steps)
    }
}

// ===== MockApprovalHistoryRepository =====

#[derive(Clone, Default)]
pub struct MockApprovalHistoryRepository {
    histories:    Arc<Mutex<Vec<ApprovalHistory>>>,
    fail_inserts: Arc<AtomicBool>,
}

impl MockApprovalHistoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以降の `insert` をすべて失敗させる（障害注入用）
    pub fn fail_inserts(&self) {
        self.fail_inserts.store(true, Ordering::SeqCst);
    }

    /// 保存済みの全履歴を取得する（アサーション用）
    pub fn all(&self) -> Vec<ApprovalHistory> {
        self.histories.lock().unwrap().clone()
    }
}

#[async_trait]
impl ApprovalHistoryRepository for MockApprovalHistoryRepository {
    async fn insert(
        &self,
        _tx: &mut TxContext,
        history: &ApprovalHistory,
    ) -> Result<(), InfraError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(InfraError::unexpected("承認履歴の書き込みに失敗しました"));
        }
        self.histories.lock().unwrap().push(history.clone());
        Ok(())
    }

    async fn find_by_request_ordered(
        &self,
        request_id: &RequestId,
    ) -> Result<Vec<ApprovalHistory>, InfraError> {
        let mut histories: Vec<ApprovalHistory> = self
            .histories
            .lock()
            .unwrap()
            .iter()
            .filter(|h| h.request_id() == request_id)
            .cloned()
            .collect();
        // 安定ソートのため、同時刻の履歴は追記順を保つ
        histories.sort_by_key(|h| (h.created_at(), h.step_level()));
        Ok(histories)
    }
}
