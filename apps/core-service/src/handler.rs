//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! - 各ハンドラはサブモジュールに配置し、ここで re-export する
//! - ハンドラは薄く保ち、ビジネスロジックはユースケース層に委譲する

pub mod health;
pub mod request;

pub use health::health_check;
pub use request::{
    RequestHandlerState,
    approve_request,
    create_request,
    delete_request,
    get_request,
    list_request_history,
    list_requests,
    reject_request,
    update_request,
};
