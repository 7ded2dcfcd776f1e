//! # リポジトリ
//!
//! 永続化操作のトレイトと PostgreSQL 実装を提供する。
//!
//! - **依存性逆転**: ユースケース層はトレイトにのみ依存する
//! - **書き込みは TxContext 経由**: 承認履歴の追記と申請の更新を同一トランザクションに載せる
//! - **テスタビリティ**: トレイト経由でインメモリモックに差し替え可能

pub mod approval_history_repository;
pub mod request_repository;
pub mod workflow_repository;
pub mod workflow_step_repository;

pub use approval_history_repository::{
    ApprovalHistoryRepository,
    PostgresApprovalHistoryRepository,
};
pub use request_repository::{PostgresRequestRepository, RequestRepository};
pub use workflow_repository::{PostgresWorkflowRepository, WorkflowRepository};
pub use workflow_step_repository::{PostgresWorkflowStepRepository, WorkflowStepRepository};
