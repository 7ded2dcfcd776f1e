//! ユースケース層の共通ヘルパー
//!
//! リポジトリ呼び出し結果の変換や権限チェックなど、
//! 複数のユースケースで繰り返されるパターンを共通化する。

use shonin_domain::{principal::Principal, workflow_step::WorkflowStep};
use shonin_infra::InfraError;

use crate::error::CoreError;

/// リポジトリの `Result<Option<T>, InfraError>` を `Result<T, CoreError>` に変換する
///
/// ```ignore
/// let request = self.deps.request_repo.find_by_id(&id).await.or_not_found("申請")?;
/// ```
pub(crate) trait FindResultExt<T> {
    /// `None` の場合は `CoreError::NotFound`、`InfraError` の場合は `CoreError::Database` を返す
    fn or_not_found(self, entity_name: &str) -> Result<T, CoreError>;
}

impl<T> FindResultExt<T> for Result<Option<T>, InfraError> {
    fn or_not_found(self, entity_name: &str) -> Result<T, CoreError> {
        self?.ok_or_else(|| CoreError::NotFound(format!("{}が見つかりません", entity_name)))
    }
}

/// 操作主体がステップを操作できるかチェックする
///
/// 管理者でなく、ステップの担当アクターとも一致しない場合は `CoreError::Unauthorized`。
pub(crate) fn check_can_act_on(
    principal: &Principal,
    step: &WorkflowStep,
    action: &str,
) -> Result<(), CoreError> {
    if !principal.can_act_on(step) {
        return Err(CoreError::Unauthorized(format!(
            "段階 {} を{}する権限がありません",
            step.level(),
            action,
        )));
    }
    Ok(())
}
