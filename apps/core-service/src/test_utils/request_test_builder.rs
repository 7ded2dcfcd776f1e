//! 申請テストビルダー
//!
//! モックリポジトリの準備と SUT の構築をまとめる。
//! モックは内部で状態を共有しているため、SUT 構築後に追加したデータも参照される。

use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use shonin_domain::{
    actor::ActorId,
    clock::FixedClock,
    request::{NewRequest, Request, RequestContent, RequestId},
    user::UserId,
    value_objects::{Amount, RequestTitle, StepLevel},
    workflow::{Workflow, WorkflowId},
    workflow_step::{NewWorkflowStep, StepConditions, WorkflowStep, WorkflowStepId},
};
use shonin_infra::mock::{
    MockApprovalHistoryRepository,
    MockRequestRepository,
    MockTransactionManager,
    MockWorkflowRepository,
    MockWorkflowStepRepository,
};

use crate::{
    app_builder::build_app,
    handler::RequestHandlerState,
    usecase::{RequestUseCaseDeps, RequestUseCaseImpl},
};

/// 申請テストビルダー
///
/// # 使用例
///
/// ```ignore
/// use shonin_core_service::test_utils::RequestTestBuilder;
///
/// #[tokio::test]
/// async fn test_example() {
///     let builder = RequestTestBuilder::new();
///     let workflow_id = builder.add_workflow();
///     let manager = builder.add_step(&workflow_id, 1, 0);
///     let request = builder.add_pending_request(&workflow_id, 10_000);
///
///     let sut = builder.build_usecase();
///     // ...
/// }
/// ```
pub struct RequestTestBuilder {
    now:               DateTime<Utc>,
    pub request_repo:  MockRequestRepository,
    pub workflow_repo: MockWorkflowRepository,
    pub step_repo:     MockWorkflowStepRepository,
    pub history_repo:  MockApprovalHistoryRepository,
}

impl RequestTestBuilder {
    /// デフォルト値で新しいビルダーを作成
    pub fn new() -> Self {
        Self {
            now:           Utc::now(),
            request_repo:  MockRequestRepository::new(),
            workflow_repo: MockWorkflowRepository::new(),
            step_repo:     MockWorkflowStepRepository::new(),
            history_repo:  MockApprovalHistoryRepository::new(),
        }
    }

    /// 現在時刻を指定
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// ビルダーの now を取得
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// ワークフローを登録する
    pub fn add_workflow(&self) -> WorkflowId {
        let id = WorkflowId::new();
        self.workflow_repo.add_workflow(Workflow::from_db(
            id.clone(),
            "経費精算".to_string(),
            String::new(),
            self.now,
            self.now,
        ));
        id
    }

    /// 承認ステップを登録し、担当アクターを返す
    ///
    /// `min_amount` が 0 なら金額による制約なし。
    pub fn add_step(&self, workflow_id: &WorkflowId, level: u32, min_amount: i64) -> ActorId {
        let actor_id = ActorId::new();
        self.step_repo.add_step(WorkflowStep::new(NewWorkflowStep {
            id: WorkflowStepId::new(),
            workflow_id: workflow_id.clone(),
            level: StepLevel::new(level).unwrap(),
            actor_id: actor_id.clone(),
            conditions: StepConditions {
                min_amount: Decimal::from(min_amount),
                ..StepConditions::default()
            },
            description: format!("第{level}段階"),
            now: self.now,
        }));
        actor_id
    }

    /// 承認待ちの申請を生成する（作成日時は now からのオフセット秒）
    pub fn build_pending_request(
        &self,
        workflow_id: &WorkflowId,
        amount: i64,
        offset_secs: i64,
    ) -> Request {
        Request::new(NewRequest {
            id: RequestId::new(),
            workflow_id: workflow_id.clone(),
            content: RequestContent {
                amount:      Amount::new(Decimal::from(amount)).unwrap(),
                title:       RequestTitle::new("交通費精算").unwrap(),
                description: "顧客訪問".to_string(),
            },
            requester_id: UserId::new(),
            now: self.now + Duration::seconds(offset_secs),
        })
    }

    /// 承認待ちの申請を登録する
    pub fn add_pending_request(&self, workflow_id: &WorkflowId, amount: i64) -> Request {
        let request = self.build_pending_request(workflow_id, amount, 0);
        self.request_repo.add_request(request.clone());
        request
    }

    /// モックリポジトリを使った SUT を構築する
    pub fn build_usecase(&self) -> RequestUseCaseImpl {
        RequestUseCaseImpl::new(RequestUseCaseDeps {
            request_repo:  Arc::new(self.request_repo.clone()),
            workflow_repo: Arc::new(self.workflow_repo.clone()),
            step_repo:     Arc::new(self.step_repo.clone()),
            history_repo:  Arc::new(self.history_repo.clone()),
            tx_manager:    Arc::new(MockTransactionManager),
            clock:         Arc::new(FixedClock::new(self.now)),
        })
    }

    /// モックリポジトリを使ったルーターを構築する
    pub fn build_app(&self) -> Router {
        build_app(Arc::new(RequestHandlerState {
            usecase: self.build_usecase(),
        }))
    }
}

impl Default for RequestTestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
