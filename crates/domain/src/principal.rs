//! # 操作主体（Principal）
//!
//! 認証済みの呼び出し元を表す。認証そのものは外部（ゲートウェイ）の責務で、
//! ユースケースは検証済みの値を引数として受け取る。

use serde::{Deserialize, Serialize};

use crate::{actor::ActorId, user::UserId, workflow_step::WorkflowStep};

/// 認証済みの操作主体
///
/// 承認・却下の操作者を表す。アンビエントなコンテキストではなく、
/// 明示的な引数としてユースケースに渡す。
///
/// アクターを持つのは一般ユーザーのみで、管理者は通常 `actor_id` を持たない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id:  UserId,
    pub actor_id: Option<ActorId>,
    pub is_admin: bool,
}

impl Principal {
    pub fn new(user_id: UserId, actor_id: Option<ActorId>, is_admin: bool) -> Self {
        Self {
            user_id,
            actor_id,
            is_admin,
        }
    }

    /// 指定ステップを操作できるか判定する
    ///
    /// 管理者は全ステップを操作できる。それ以外はステップの担当アクターと
    /// 一致する場合のみ操作できる。アクターを持たない一般ユーザーは操作できない。
    pub fn can_act_on(&self, step: &WorkflowStep) -> bool {
        self.is_admin || self.actor_id.as_ref() == Some(step.actor_id())
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use rstest::{fixture, rstest};

    use super::*;
    use crate::{
        value_objects::StepLevel,
        workflow::WorkflowId,
        workflow_step::{StepConditions, WorkflowStepId, WorkflowStepRecord},
    };

    fn step_assigned_to(actor_id: ActorId) -> WorkflowStep {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        WorkflowStep::from_db(WorkflowStepRecord {
            id: WorkflowStepId::new(),
            workflow_id: WorkflowId::new(),
            level: StepLevel::initial(),
            actor_id,
            conditions: StepConditions::default(),
            description: "課長承認".to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    #[fixture]
    fn step() -> WorkflowStep {
        step_assigned_to(ActorId::new())
    }

    #[test]
    fn test_担当アクター本人は操作できる() {
        let actor_id = ActorId::new();
        let step = step_assigned_to(actor_id.clone());
        let principal = Principal::new(UserId::new(), Some(actor_id), false);

        assert!(principal.can_act_on(&step));
    }

    #[rstest]
    fn test_担当外のアクターは操作できない(step: WorkflowStep) {
        let principal = Principal::new(UserId::new(), Some(ActorId::new()), false);

        assert!(!principal.can_act_on(&step));
    }

    #[rstest]
    fn test_アクターを持たない一般ユーザーは操作できない(step: WorkflowStep) {
        let principal = Principal::new(UserId::new(), None, false);

        assert!(!principal.can_act_on(&step));
    }

    #[rstest]
    #[case::with_actor(Some(ActorId::new()))]
    #[case::without_actor(None)]
    fn test_管理者はアクターの有無に関わらず操作できる(
        step: WorkflowStep,
        #[case] actor_id: Option<ActorId>,
    ) {
        let principal = Principal::new(UserId::new(), actor_id, true);

        assert!(principal.can_act_on(&step));
    }
}
