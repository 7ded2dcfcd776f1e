//! 申請ユースケースの内部ヘルパー

use shonin_domain::{
    request::Request,
    value_objects::Version,
    workflow_step::WorkflowStep,
};
use shonin_infra::{InfraErrorKind, db::TxContext};

use super::RequestUseCaseImpl;
use crate::error::CoreError;

impl RequestUseCaseImpl {
    /// トランザクションを開始する
    pub(super) async fn begin_tx(&self) -> Result<TxContext, CoreError> {
        self.deps
            .tx_manager
            .begin()
            .await
            .map_err(|e| CoreError::Internal(format!("トランザクション開始に失敗: {}", e)))
    }

    /// トランザクションをコミットする
    pub(super) async fn commit_tx(&self, tx: TxContext) -> Result<(), CoreError> {
        tx.commit()
            .await
            .map_err(|e| CoreError::Internal(format!("トランザクションコミットに失敗: {}", e)))
    }

    /// 申請を version check 付きで更新する
    pub(super) async fn save_request(
        &self,
        tx: &mut TxContext,
        request: &Request,
        expected_version: Version,
    ) -> Result<(), CoreError> {
        self.deps
            .request_repo
            .update_with_version_check(tx, request, expected_version)
            .await
            .map_err(|e| match e.kind() {
                InfraErrorKind::Conflict { .. } => CoreError::Conflict(
                    "申請は既に更新されています。最新の情報を取得してください。".to_string(),
                ),
                _ => CoreError::Database(e),
            })
    }

    /// 申請の現在の段階に対応する承認ステップを取得する
    ///
    /// 見つからない場合は `CoreError::NoNextStep`。
    pub(super) async fn current_step_of(&self, request: &Request) -> Result<WorkflowStep, CoreError> {
        self.deps
            .step_repo
            .find_by_workflow_and_level(request.workflow_id(), request.current_step())
            .await?
            .ok_or_else(|| {
                CoreError::NoNextStep(format!(
                    "段階 {} の承認ステップが定義されていません",
                    request.current_step()
                ))
            })
    }
}
