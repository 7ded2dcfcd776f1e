//! # API レスポンスエンベロープ
//!
//! 統一レスポンス形式 `{ "data": T }` を提供する。

use serde::{Deserialize, Serialize};

/// 統一レスポンス型
///
/// Core Service のすべてのエンドポイントは `{ "data": T }` 形式でレスポンスを返す。
///
/// ## 使用例
///
/// ```
/// use shonin_shared::ApiResponse;
///
/// let response = ApiResponse::new("hello");
/// assert_eq!(response.data, "hello");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// 新しい `ApiResponse` を作成する
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_serializeでdataキーに包まれる() {
        let response = ApiResponse::new(serde_json::json!({ "id": "r-1", "version": 2 }));
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "data": { "id": "r-1", "version": 2 } })
        );
    }

    #[test]
    fn test_deserializeで申請一覧を受け取れる() {
        let json = r#"{"data": ["r-1", "r-2"]}"#;
        let response: ApiResponse<Vec<String>> = serde_json::from_str(json).unwrap();

        assert_eq!(response.data, vec!["r-1".to_string(), "r-2".to_string()]);
    }
}
