//! 申請の承認・却下

use shonin_domain::{
    approval_history::{ApprovalAction, ApprovalHistory, ApprovalHistoryId, NewApprovalHistory},
    principal::Principal,
    request::{Request, RequestId},
};
use shonin_shared::{event_log::event, log_business_event};

use super::RequestUseCaseImpl;
use crate::{
    error::CoreError,
    usecase::helpers::{FindResultExt, check_can_act_on},
};

impl RequestUseCaseImpl {
    /// 申請の現在の段階を承認する
    ///
    /// ## 処理フロー
    ///
    /// 1. 申請単位のロックを取得
    /// 2. トランザクションを開始し、行ロック付きで申請を取得
    /// 3. 承認待ちであることを確認
    /// 4. 現在の段階の承認ステップを取得
    /// 5. 権限チェック（担当アクターまたは管理者）
    ///    アクターを持たない管理者の操作は `actor_id` なしで履歴に残る
    /// 6. ステップの承認条件（金額下限）を評価
    /// 7. 承認履歴を追記
    /// 8. 次の段階があれば進め、なければ承認完了
    /// 9. バージョン比較付きで申請を更新
    /// 10. コミット
    ///
    /// ## エラー
    ///
    /// - 申請が存在しない: 404
    /// - 承認済み・却下済み: 409
    /// - 現在の段階のステップが存在しない: 422
    /// - 担当外: 403
    /// - 承認条件を満たさない: 422（申請・履歴とも変化しない）
    /// - 同時更新による競合: 409
    #[tracing::instrument(
        skip_all,
        fields(
            request_id = %id,
            user_id = %principal.user_id,
            actor_id = ?principal.actor_id,
            is_admin = principal.is_admin
        )
    )]
    pub async fn approve(&self, id: &RequestId, principal: &Principal) -> Result<Request, CoreError> {
        // 1. 申請単位のロックを取得（ドロップで解放）
        let _lock = self.locks.acquire(id).await;

        // 2. 行ロック付きで申請を取得
        let mut tx = self.begin_tx().await?;
        let request = self
            .deps
            .request_repo
            .find_by_id_for_update(&mut tx, id)
            .await
            .or_not_found("申請")?;

        // 3. 承認待ちであることを確認
        request.ensure_pending()?;

        // 4. 現在の段階の承認ステップを取得
        let step = self.current_step_of(&request).await?;

        // 5. 権限チェック
        check_can_act_on(principal, &step, "承認")?;

        // 6. 承認条件を評価
        if !step.accepts(request.amount()) {
            return Err(CoreError::ConditionNotMet(format!(
                "金額 {} は段階 {} の下限 {} に達していません",
                request.amount(),
                step.level(),
                step.conditions().min_amount
            )));
        }

        // 7. 承認履歴を追記
        let now = self.deps.clock.now();
        let history = ApprovalHistory::new(NewApprovalHistory {
            id: ApprovalHistoryId::new(),
            request_id: request.id().clone(),
            workflow_id: request.workflow_id().clone(),
            step_level: request.current_step(),
            actor_id: principal.actor_id.clone(),
            user_id: principal.user_id.clone(),
            action: ApprovalAction::Approve,
            comment: String::new(),
            now,
        });
        self.deps.history_repo.insert(&mut tx, &history).await?;

        // 8. 次の段階の有無で遷移を分岐
        let expected_version = request.version();
        let approved_level = request.current_step();
        let next_step = self
            .deps
            .step_repo
            .find_by_workflow_and_level(request.workflow_id(), approved_level.next())
            .await?;
        let updated = match next_step {
            Some(next) => request.advanced_to(next.level(), now)?,
            None => request.complete_with_approval(now)?,
        };

        // 9. バージョン比較付きで更新
        self.save_request(&mut tx, &updated, expected_version).await?;

        // 10. コミット
        self.commit_tx(tx).await?;

        if updated.is_pending() {
            log_business_event!(
                event.category = event::category::APPROVAL,
                event.action = event::action::STEP_APPROVED,
                event.entity_type = event::entity_type::REQUEST,
                event.entity_id = %updated.id(),
                event.actor_id = %principal.user_id,
                event.step_level = approved_level.as_u32(),
                event.next_step_level = updated.current_step().as_u32(),
                event.result = event::result::SUCCESS,
                "承認ステップ完了、次の段階へ"
            );
        } else {
            log_business_event!(
                event.category = event::category::APPROVAL,
                event.action = event::action::REQUEST_APPROVED,
                event.entity_type = event::entity_type::REQUEST,
                event.entity_id = %updated.id(),
                event.actor_id = %principal.user_id,
                event.step_level = approved_level.as_u32(),
                event.result = event::result::SUCCESS,
                "申請が承認されました"
            );
        }

        Ok(updated)
    }

    /// 申請を却下する
    ///
    /// 承認と同じ排他制御の下で実行する。承認条件は評価しない。
    /// 却下理由は承認履歴のコメントとして記録する。
    ///
    /// ## エラー
    ///
    /// - 却下理由が空: 400（ロック・I/O の前に判定）
    /// - それ以外は [`approve`](Self::approve) と同じ（承認条件のエラーを除く）
    #[tracing::instrument(
        skip_all,
        fields(
            request_id = %id,
            user_id = %principal.user_id,
            actor_id = ?principal.actor_id,
            is_admin = principal.is_admin
        )
    )]
    pub async fn reject(
        &self,
        id: &RequestId,
        principal: &Principal,
        reason: &str,
    ) -> Result<Request, CoreError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(CoreError::Validation("却下理由は必須です".to_string()));
        }

        let _lock = self.locks.acquire(id).await;

        let mut tx = self.begin_tx().await?;
        let request = self
            .deps
            .request_repo
            .find_by_id_for_update(&mut tx, id)
            .await
            .or_not_found("申請")?;

        request.ensure_pending()?;

        let step = self.current_step_of(&request).await?;
        check_can_act_on(principal, &step, "却下")?;

        let now = self.deps.clock.now();
        let history = ApprovalHistory::new(NewApprovalHistory {
            id: ApprovalHistoryId::new(),
            request_id: request.id().clone(),
            workflow_id: request.workflow_id().clone(),
            step_level: request.current_step(),
            actor_id: principal.actor_id.clone(),
            user_id: principal.user_id.clone(),
            action: ApprovalAction::Reject,
            comment: reason.to_string(),
            now,
        });
        self.deps.history_repo.insert(&mut tx, &history).await?;

        let expected_version = request.version();
        let rejected = request.complete_with_rejection(now)?;

        self.save_request(&mut tx, &rejected, expected_version).await?;
        self.commit_tx(tx).await?;

        log_business_event!(
            event.category = event::category::APPROVAL,
            event.action = event::action::REQUEST_REJECTED,
            event.entity_type = event::entity_type::REQUEST,
            event.entity_id = %rejected.id(),
            event.actor_id = %principal.user_id,
            event.step_level = rejected.current_step().as_u32(),
            event.result = event::result::SUCCESS,
            "申請が却下されました"
        );

        Ok(rejected)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use shonin_domain::{
        actor::ActorId,
        approval_history::ApprovalAction,
        principal::Principal,
        request::{RequestId, RequestStatus},
        user::UserId,
        value_objects::{StepLevel, Version},
    };

    use super::{super::test_helpers::*, *};

    fn principal_for(actor_id: &ActorId) -> Principal {
        Principal::new(UserId::new(), Some(actor_id.clone()), false)
    }

    /// アクターを持たない管理者
    fn admin() -> Principal {
        Principal::new(UserId::new(), None, true)
    }

    // ===== approve =====

    #[tokio::test]
    async fn test_approve_次の段階があれば承認待ちのまま進む() {
        // Arrange: 2 段階（下限 100 万 / 500 万）、金額 200 万
        let mocks = Mocks::default();
        let workflow_id = add_workflow(&mocks);
        let manager = add_step(&mocks, &workflow_id, 1, 1_000_000);
        add_step(&mocks, &workflow_id, 2, 5_000_000);
        let request = add_pending_request(&mocks, &workflow_id, 2_000_000);
        let sut = build_sut(&mocks);
        let principal = principal_for(&manager);

        // Act
        let updated = sut.approve(request.id(), &principal).await.unwrap();

        // Assert
        assert_eq!(updated.status(), RequestStatus::Pending);
        assert_eq!(updated.current_step(), StepLevel::new(2).unwrap());
        assert_eq!(updated.version(), Version::new(2).unwrap());
        assert_eq!(updated.updated_at(), fixed_now());
        assert_eq!(mocks.request_repo.get(request.id()), Some(updated));

        let histories = mocks.history_repo.all();
        assert_eq!(histories.len(), 1);
        assert_eq!(histories[0].action(), ApprovalAction::Approve);
        assert_eq!(histories[0].step_level(), StepLevel::initial());
        assert_eq!(histories[0].actor_id(), Some(&manager));
        assert_eq!(histories[0].user_id(), &principal.user_id);
        assert!(sut.locks().is_empty());
    }

    #[tokio::test]
    async fn test_approve_最終段階なら承認完了になる() {
        // Arrange: 1 段階のみ、申請は第 1 段階
        let mocks = Mocks::default();
        let workflow_id = add_workflow(&mocks);
        let director = add_step(&mocks, &workflow_id, 1, 0);
        let request = add_pending_request(&mocks, &workflow_id, 300_000);
        let sut = build_sut(&mocks);

        // Act
        let updated = sut
            .approve(request.id(), &principal_for(&director))
            .await
            .unwrap();

        // Assert
        assert_eq!(updated.status(), RequestStatus::Approved);
        assert_eq!(updated.current_step(), StepLevel::new(2).unwrap());
        assert_eq!(updated.completed_at(), Some(fixed_now()));
        assert_eq!(updated.version(), Version::new(2).unwrap());
    }

    #[tokio::test]
    async fn test_approve_2段階を順に承認すると承認完了になる() {
        let mocks = Mocks::default();
        let workflow_id = add_workflow(&mocks);
        let manager = add_step(&mocks, &workflow_id, 1, 0);
        let director = add_step(&mocks, &workflow_id, 2, 0);
        let request = add_pending_request(&mocks, &workflow_id, 50_000);
        let sut = build_sut(&mocks);

        let first = sut.approve(request.id(), &principal_for(&manager)).await.unwrap();
        let second = sut.approve(request.id(), &principal_for(&director)).await.unwrap();

        assert_eq!(first.current_step(), StepLevel::new(2).unwrap());
        assert_eq!(second.status(), RequestStatus::Approved);
        assert_eq!(second.current_step(), StepLevel::new(3).unwrap());
        assert_eq!(second.version(), Version::new(3).unwrap());

        let timeline = sut.list_history(request.id()).await.unwrap();
        let levels: Vec<u32> = timeline
            .histories
            .iter()
            .map(|h| h.step_level().as_u32())
            .collect();
        assert_eq!(levels, vec![1, 2]);
        assert_eq!(timeline.total_steps, 2);
        assert_eq!(timeline.request, second);
    }

    #[tokio::test]
    async fn test_approve_金額が下限未満なら条件未達で何も変化しない() {
        // Arrange: 下限 50 万、金額 40 万
        let mocks = Mocks::default();
        let workflow_id = add_workflow(&mocks);
        let manager = add_step(&mocks, &workflow_id, 1, 500_000);
        let request = add_pending_request(&mocks, &workflow_id, 400_000);
        let sut = build_sut(&mocks);

        // Act
        let result = sut.approve(request.id(), &principal_for(&manager)).await;

        // Assert
        assert!(matches!(result, Err(CoreError::ConditionNotMet(_))));
        assert_eq!(mocks.request_repo.get(request.id()), Some(request));
        assert!(mocks.history_repo.all().is_empty());
        assert!(sut.locks().is_empty());
    }

    #[tokio::test]
    async fn test_approve_担当外のアクターはunauthorizedで何も変化しない() {
        let mocks = Mocks::default();
        let workflow_id = add_workflow(&mocks);
        add_step(&mocks, &workflow_id, 1, 0);
        let request = add_pending_request(&mocks, &workflow_id, 1_000);
        let sut = build_sut(&mocks);

        let result = sut
            .approve(request.id(), &principal_for(&ActorId::new()))
            .await;

        assert!(matches!(result, Err(CoreError::Unauthorized(_))));
        assert_eq!(mocks.request_repo.get(request.id()), Some(request));
        assert!(mocks.history_repo.all().is_empty());
    }

    #[tokio::test]
    async fn test_approve_管理者は担当外でも承認できる() {
        let mocks = Mocks::default();
        let workflow_id = add_workflow(&mocks);
        add_step(&mocks, &workflow_id, 1, 0);
        let request = add_pending_request(&mocks, &workflow_id, 1_000);
        let sut = build_sut(&mocks);
        let admin = Principal::new(UserId::new(), Some(ActorId::new()), true);

        let updated = sut.approve(request.id(), &admin).await.unwrap();

        assert_eq!(updated.status(), RequestStatus::Approved);
        assert_eq!(mocks.history_repo.all()[0].actor_id(), admin.actor_id.as_ref());
    }

    #[tokio::test]
    async fn test_approve_アクターを持たない管理者も承認できる() {
        let mocks = Mocks::default();
        let workflow_id = add_workflow(&mocks);
        add_step(&mocks, &workflow_id, 1, 0);
        let request = add_pending_request(&mocks, &workflow_id, 1_000);
        let sut = build_sut(&mocks);
        let admin = admin();

        let updated = sut.approve(request.id(), &admin).await.unwrap();

        assert_eq!(updated.status(), RequestStatus::Approved);
        let histories = mocks.history_repo.all();
        assert_eq!(histories[0].actor_id(), None);
        assert_eq!(histories[0].user_id(), &admin.user_id);
    }

    #[tokio::test]
    async fn test_approve_アクターを持たない一般ユーザーはunauthorized() {
        let mocks = Mocks::default();
        let workflow_id = add_workflow(&mocks);
        add_step(&mocks, &workflow_id, 1, 0);
        let request = add_pending_request(&mocks, &workflow_id, 1_000);
        let sut = build_sut(&mocks);
        let principal = Principal::new(UserId::new(), None, false);

        let result = sut.approve(request.id(), &principal).await;

        assert!(matches!(result, Err(CoreError::Unauthorized(_))));
        assert_eq!(mocks.request_repo.get(request.id()), Some(request));
        assert!(mocks.history_repo.all().is_empty());
    }

    #[tokio::test]
    async fn test_approve_現在の段階のステップがなければno_next_step() {
        let mocks = Mocks::default();
        let workflow_id = add_workflow(&mocks);
        let request = add_pending_request(&mocks, &workflow_id, 1_000);
        let sut = build_sut(&mocks);

        let result = sut.approve(request.id(), &admin()).await;

        assert!(matches!(result, Err(CoreError::NoNextStep(_))));
        assert!(mocks.history_repo.all().is_empty());
    }

    #[tokio::test]
    async fn test_approve_存在しない申請はnotfound() {
        let mocks = Mocks::default();
        let sut = build_sut(&mocks);

        let result = sut.approve(&RequestId::new(), &admin()).await;

        assert!(matches!(result, Err(CoreError::NotFound(_))));
        assert!(sut.locks().is_empty());
    }

    #[tokio::test]
    async fn test_approve_履歴の書き込みに失敗すると申請は変化しない() {
        let mocks = Mocks::default();
        let workflow_id = add_workflow(&mocks);
        add_step(&mocks, &workflow_id, 1, 0);
        let request = add_pending_request(&mocks, &workflow_id, 1_000);
        mocks.history_repo.fail_inserts();
        let sut = build_sut(&mocks);

        let result = sut.approve(request.id(), &admin()).await;

        assert!(matches!(result, Err(CoreError::Database(_))));
        assert_eq!(mocks.request_repo.get(request.id()), Some(request));
        assert!(sut.locks().is_empty());
    }

    // ===== reject =====

    #[tokio::test]
    async fn test_reject_却下後は承認も却下もできない() {
        // Arrange
        let mocks = Mocks::default();
        let workflow_id = add_workflow(&mocks);
        let manager = add_step(&mocks, &workflow_id, 1, 0);
        add_step(&mocks, &workflow_id, 2, 0);
        let request = add_pending_request(&mocks, &workflow_id, 1_000);
        let sut = build_sut(&mocks);
        let principal = principal_for(&manager);

        // Act
        let rejected = sut
            .reject(request.id(), &principal, "  予算超過のため  ")
            .await
            .unwrap();
        let approve_again = sut.approve(request.id(), &principal).await;
        let reject_again = sut.reject(request.id(), &principal, "再却下").await;

        // Assert
        assert_eq!(rejected.status(), RequestStatus::Rejected);
        assert_eq!(rejected.current_step(), StepLevel::initial());
        assert_eq!(rejected.version(), Version::new(2).unwrap());
        assert!(matches!(approve_again, Err(CoreError::NotPending(_))));
        assert!(matches!(reject_again, Err(CoreError::NotPending(_))));
        assert_eq!(mocks.request_repo.get(request.id()), Some(rejected));

        let histories = mocks.history_repo.all();
        assert_eq!(histories.len(), 1);
        assert_eq!(histories[0].action(), ApprovalAction::Reject);
        assert_eq!(histories[0].comment(), "予算超過のため");
    }

    #[tokio::test]
    async fn test_reject_承認条件は評価しない() {
        let mocks = Mocks::default();
        let workflow_id = add_workflow(&mocks);
        let manager = add_step(&mocks, &workflow_id, 1, 500_000);
        let request = add_pending_request(&mocks, &workflow_id, 400_000);
        let sut = build_sut(&mocks);

        let rejected = sut
            .reject(request.id(), &principal_for(&manager), "金額不足")
            .await
            .unwrap();

        assert_eq!(rejected.status(), RequestStatus::Rejected);
    }

    #[tokio::test]
    async fn test_reject_空の却下理由はvalidation() {
        let mocks = Mocks::default();
        let workflow_id = add_workflow(&mocks);
        add_step(&mocks, &workflow_id, 1, 0);
        let request = add_pending_request(&mocks, &workflow_id, 1_000);
        let sut = build_sut(&mocks);

        let result = sut.reject(request.id(), &admin(), "   ").await;

        assert!(matches!(result, Err(CoreError::Validation(_))));
        assert_eq!(mocks.request_repo.get(request.id()), Some(request));
        assert!(mocks.history_repo.all().is_empty());
    }

    #[tokio::test]
    async fn test_reject_担当外のアクターはunauthorized() {
        let mocks = Mocks::default();
        let workflow_id = add_workflow(&mocks);
        add_step(&mocks, &workflow_id, 1, 0);
        let request = add_pending_request(&mocks, &workflow_id, 1_000);
        let sut = build_sut(&mocks);

        let result = sut
            .reject(request.id(), &principal_for(&ActorId::new()), "不要")
            .await;

        assert!(matches!(result, Err(CoreError::Unauthorized(_))));
        assert!(mocks.history_repo.all().is_empty());
    }
}
