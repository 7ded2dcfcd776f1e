//! # テストユーティリティ
//!
//! 統合テスト・API テスト向けのセットアップを提供する。

mod request_test_builder;

pub use request_test_builder::RequestTestBuilder;
