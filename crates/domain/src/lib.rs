//! # Shonin ドメイン層
//!
//! 申請承認フローの中核を担うドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **エンティティ**: 一意の識別子を持つオブジェクト（例: Request, WorkflowStep）
//! - **値オブジェクト**: 識別子を持たない不変オブジェクト（例: Amount, Version）
//! - **ステートマシン**: 申請の状態遷移を ADT で表現し、終端状態からの遷移を型で防ぐ
//! - **ドメインエラー**: ビジネスルール違反を表現するエラー型
//!
//! ## 依存関係の方向
//!
//! ```text
//! core-service → infra → domain
//! ```
//!
//! ドメイン層はインフラ層（DB、外部サービス）に一切依存しない。
//!
//! ## モジュール構成
//!
//! - [`request`] - 申請エンティティと状態遷移
//! - [`workflow_step`] - 承認ステップと承認条件の評価
//! - [`approval_history`] - 承認・却下の監査履歴
//! - [`principal`] - 認証済みの操作主体
//!
//! ## 使用例
//!
//! ```rust
//! use shonin_domain::{DomainError, request::RequestStatus};
//!
//! let status: RequestStatus = "APPROVED".parse()?;
//! assert_eq!(status, RequestStatus::Approved);
//!
//! let error = "draft".parse::<RequestStatus>().unwrap_err();
//! assert!(matches!(error, DomainError::Validation(_)));
//! # Ok::<(), DomainError>(())
//! ```

#[macro_use]
mod macros;

pub mod actor;
pub mod approval_history;
pub mod clock;
pub mod error;
pub mod principal;
pub mod request;
pub mod user;
pub mod value_objects;
pub mod workflow;
pub mod workflow_step;

pub use error::DomainError;
