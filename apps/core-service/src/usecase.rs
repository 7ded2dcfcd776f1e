//! # ユースケース層
//!
//! Core Service のビジネスロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: リポジトリを `Arc<dyn Trait>` で外部から注入
//! - **薄いハンドラ**: ハンドラは薄く保ち、ロジックはユースケースに集約
//! - **三層の排他制御**: プロセス内ロック、行ロック、バージョン比較
//!
//! ## モジュール構成
//!
//! - `request`: 申請の作成・参照・更新・削除と承認・却下
//! - `lock`: 申請単位のプロセス内ロック

pub(crate) mod helpers;

pub mod lock;
pub mod request;

pub use lock::{RequestLockGuard, RequestLockRegistry};
pub use request::{
    CreateRequestInput,
    ListRequestsInput,
    RequestPage,
    RequestTimeline,
    RequestUseCaseDeps,
    RequestUseCaseImpl,
    UpdateRequestInput,
};
