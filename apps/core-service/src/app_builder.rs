//! # ルーター構築
//!
//! ハンドラの状態を受け取り、ルーティングとミドルウェアを組み立てる。
//! バイナリと API テストで同じルーターを使う。

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::handler::{
    RequestHandlerState,
    approve_request,
    create_request,
    delete_request,
    get_request,
    health_check,
    list_request_history,
    list_requests,
    reject_request,
    update_request,
};

/// Core Service のルーターを構築する
pub fn build_app(request_state: Arc<RequestHandlerState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/internal/requests", get(list_requests).post(create_request))
        .route(
            "/internal/requests/{id}",
            get(get_request).put(update_request).delete(delete_request),
        )
        .route("/internal/requests/{id}/approve", post(approve_request))
        .route("/internal/requests/{id}/reject", post(reject_request))
        .route("/internal/requests/{id}/history", get(list_request_history))
        .with_state(request_state)
        // レイヤーは下から順に適用される
        // 1. SetRequestIdLayer（最外）: X-Request-Id がなければ UUID を採番
        // 2. TraceLayer: リクエスト単位のスパンを作成
        // 3. PropagateRequestIdLayer: レスポンスヘッダーに X-Request-Id をコピー
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
