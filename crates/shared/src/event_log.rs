//! # ビジネスイベントログとエラーコンテキストの構造化ヘルパー
//!
//! ログフィールドの命名規約とヘルパーマクロを提供する。
//!
//! ## ビジネスイベント
//!
//! [`log_business_event!`] マクロで出力する。`event.kind = "business_event"` マーカーが
//! 自動付与され、`jq 'select(.["event.kind"] == "business_event")'` でフィルタできる。
//!
//! ## エラーコンテキスト
//!
//! `tracing::error!` に `error.category` + `error.kind` フィールドを直接追加する。
//! 定数は [`error`] モジュールで提供。
//!
//! ## フィールド命名規約
//!
//! ドット記法（`event.category`、`error.kind`）を使用。JSON 出力でフラットなキーになる。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` マーカーを自動付与し、
/// `tracing::info!` レベルで出力する。呼び出し側クレートは `tracing` に依存すること。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: イベントカテゴリ（[`event::category`] の定数を使用）
/// - `event.action`: アクション名（[`event::action`] の定数を使用）
/// - `event.result`: 結果（[`event::result`] の定数を使用）
///
/// ## 推奨フィールド
///
/// - `event.entity_type`: エンティティ種別（[`event::entity_type`] の定数を使用）
/// - `event.entity_id`: エンティティ ID
/// - `event.actor_id`: 操作ユーザー ID
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const REQUEST: &str = "request";
        pub const APPROVAL: &str = "approval";
    }

    /// イベントアクション
    pub mod action {
        // 申請
        pub const REQUEST_CREATED: &str = "request.created";
        pub const REQUEST_UPDATED: &str = "request.updated";
        pub const REQUEST_DELETED: &str = "request.deleted";

        // 承認フロー
        pub const STEP_APPROVED: &str = "step.approved";
        pub const REQUEST_APPROVED: &str = "request.approved";
        pub const REQUEST_REJECTED: &str = "request.rejected";
    }

    /// エンティティ種別
    pub mod entity_type {
        pub const REQUEST: &str = "request";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
    }
}

/// エラーコンテキストフィールドの定数
pub mod error {
    /// エラーカテゴリ
    pub mod category {
        /// インフラストラクチャ（DB）
        pub const INFRASTRUCTURE: &str = "infrastructure";
    }

    /// エラー種別
    pub mod kind {
        pub const DATABASE: &str = "database";
        pub const INTERNAL: &str = "internal";
    }
}

#[cfg(test)]
mod tests {
    use super::event;

    #[test]
    fn test_log_business_eventはイベントマーカー付きで展開される() {
        // subscriber 未設定でもパニックしないこと
        crate::log_business_event!(
            event.category = event::category::APPROVAL,
            event.action = event::action::STEP_APPROVED,
            event.entity_type = event::entity_type::REQUEST,
            event.entity_id = "r-1",
            event.result = event::result::SUCCESS,
            "ステップを承認"
        );
    }
}
