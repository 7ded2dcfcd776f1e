//! # ドメイン層エラー定義
//!
//! ビジネスルール違反やドメイン固有の例外状態を表現するエラー型。
//!
//! ## エラーの種類と HTTP ステータスの対応
//!
//! | エラー種別 | HTTP ステータス | 用途 |
//! |-----------|----------------|------|
//! | `Validation` | 400 Bad Request | 入力値の検証失敗 |
//! | `InvalidState` | 409 Conflict | 終端状態の申請への遷移要求 |
//!
//! 存在チェック・権限・楽観的ロックの失敗はユースケース層で直接判定する。
//!
//! ## 使用例
//!
//! ```rust
//! use shonin_domain::DomainError;
//!
//! fn validate_title(title: &str) -> Result<(), DomainError> {
//!     if title.is_empty() {
//!         return Err(DomainError::Validation("件名は必須です".to_string()));
//!     }
//!     Ok(())
//! }
//!
//! assert!(validate_title("").is_err());
//! ```

use thiserror::Error;

/// ドメイン層で発生するエラー
///
/// ビジネスロジックの実行中に発生する例外状態を表現する。
/// ユースケース層でこのエラーを受け取り、サービス固有のエラーに変換する。
#[derive(Debug, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// 入力値がビジネスルールに違反している場合に使用する。
    ///
    /// # 例
    ///
    /// - 金額が 0 以下
    /// - 件名が未入力
    /// - DB から復元したレコードが不変条件を満たさない
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// 状態エラー
    ///
    /// 承認済み・却下済みなど、終端状態の申請に対して遷移を要求した場合に使用する。
    /// 終端状態は二度と変化しないため、リトライしても成功しない。
    #[error("不正な状態遷移です: {0}")]
    InvalidState(String),
}
