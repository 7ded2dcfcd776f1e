//! # Shonin インフラ層
//!
//! PostgreSQL との接続・永続化を担当するインフラストラクチャ層。
//!
//! ## 責務
//!
//! - **データベース接続**: PostgreSQL への接続プール管理とマイグレーション
//! - **トランザクション**: 書き込みを [`db::TxContext`] 経由に限定する
//! - **リポジトリ実装**: 申請・ワークフロー・ステップ・承認履歴の永続化
//!
//! ## 依存関係
//!
//! ```text
//! core-service → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`db`] - 接続プール、マイグレーション、トランザクション管理
//! - [`error`] - インフラ層エラー定義
//! - [`repository`] - リポジトリトレイトと PostgreSQL 実装
//! - `mock` - インメモリのモックリポジトリ（`test-utils` feature）

pub mod db;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod repository;

pub use error::{InfraError, InfraErrorKind};
