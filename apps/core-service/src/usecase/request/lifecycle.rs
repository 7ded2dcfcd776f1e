//! 申請の作成・更新・削除

use shonin_domain::{
    request::{NewRequest, Request, RequestId},
    user::UserId,
};
use shonin_shared::{event_log::event, log_business_event};

use super::{CreateRequestInput, RequestUseCaseImpl, UpdateRequestInput, build_content};
use crate::{error::CoreError, usecase::helpers::FindResultExt};

impl RequestUseCaseImpl {
    /// 申請を作成する
    ///
    /// ## 処理フロー
    ///
    /// 1. 金額・件名を検証
    /// 2. ワークフローの存在を確認
    /// 3. 承認待ち・第 1 段階・バージョン 1 で作成して保存
    ///
    /// ## エラー
    ///
    /// - 金額が 0 以下、件名が空: 400
    /// - ワークフローが存在しない: 404
    #[tracing::instrument(skip_all, fields(workflow_id = %input.workflow_id, requester_id = %requester_id))]
    pub async fn create_request(
        &self,
        input: CreateRequestInput,
        requester_id: UserId,
    ) -> Result<Request, CoreError> {
        // 1. 入力値を検証
        let content = build_content(input.amount, input.title, input.description)?;

        // 2. ワークフローの存在を確認
        self.deps
            .workflow_repo
            .find_by_id(&input.workflow_id)
            .await
            .or_not_found("ワークフロー")?;

        // 3. 申請を作成して保存
        let request = Request::new(NewRequest {
            id: RequestId::new(),
            workflow_id: input.workflow_id,
            content,
            requester_id,
            now: self.deps.clock.now(),
        });

        let mut tx = self.begin_tx().await?;
        self.deps.request_repo.insert(&mut tx, &request).await?;
        self.commit_tx(tx).await?;

        log_business_event!(
            event.category = event::category::REQUEST,
            event.action = event::action::REQUEST_CREATED,
            event.entity_type = event::entity_type::REQUEST,
            event.entity_id = %request.id(),
            event.actor_id = %request.requester_id(),
            event.result = event::result::SUCCESS,
            "申請を作成"
        );

        Ok(request)
    }

    /// 承認待ちの申請の内容（金額・件名・説明）を更新する
    ///
    /// 承認・却下と同じくプロセス内ロック、行ロック、バージョン比較の下で実行する。
    ///
    /// ## エラー
    ///
    /// - 入力値が不正: 400
    /// - 申請が存在しない: 404
    /// - 承認済み・却下済み: 409
    /// - 同時更新による競合: 409
    #[tracing::instrument(skip_all, fields(request_id = %id))]
    pub async fn update_request(
        &self,
        id: &RequestId,
        input: UpdateRequestInput,
    ) -> Result<Request, CoreError> {
        let content = build_content(input.amount, input.title, input.description)?;

        let _lock = self.locks.acquire(id).await;
        let mut tx = self.begin_tx().await?;

        let request = self
            .deps
            .request_repo
            .find_by_id_for_update(&mut tx, id)
            .await
            .or_not_found("申請")?;

        let expected_version = request.version();
        let updated = request.with_content(content, self.deps.clock.now())?;

        self.save_request(&mut tx, &updated, expected_version).await?;
        self.commit_tx(tx).await?;

        log_business_event!(
            event.category = event::category::REQUEST,
            event.action = event::action::REQUEST_UPDATED,
            event.entity_type = event::entity_type::REQUEST,
            event.entity_id = %updated.id(),
            event.result = event::result::SUCCESS,
            "申請を更新"
        );

        Ok(updated)
    }

    /// 申請を削除する
    ///
    /// 承認履歴は外部キーの `ON DELETE CASCADE` で同時に削除される。
    #[tracing::instrument(skip_all, fields(request_id = %id))]
    pub async fn delete_request(&self, id: &RequestId) -> Result<(), CoreError> {
        let _lock = self.locks.acquire(id).await;
        let mut tx = self.begin_tx().await?;

        let deleted = self.deps.request_repo.delete(&mut tx, id).await?;
        if !deleted {
            return Err(CoreError::NotFound("申請が見つかりません".to_string()));
        }
        self.commit_tx(tx).await?;

        log_business_event!(
            event.category = event::category::REQUEST,
            event.action = event::action::REQUEST_DELETED,
            event.entity_type = event::entity_type::REQUEST,
            event.entity_id = %id,
            event.result = event::result::SUCCESS,
            "申請を削除"
        );

        Ok(())
    }
}
