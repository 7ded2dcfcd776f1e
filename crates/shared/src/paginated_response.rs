//! # ページネーション付きレスポンス
//!
//! ページ番号ベースのページネーションに対応した API レスポンス型。

use serde::{Deserialize, Serialize};

/// ページネーション付きレスポンス
///
/// ## JSON 形式
///
/// ```json
/// {
///   "data": [...],
///   "page": 1,
///   "limit": 10,
///   "total": 42
/// }
/// ```
///
/// `total` はフィルタ適用後の全件数で、ページサイズとは無関係。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data:  Vec<T>,
    pub page:  u32,
    pub limit: u32,
    pub total: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, page: u32, limit: u32, total: u64) -> Self {
        Self {
            data,
            page,
            limit,
            total,
        }
    }

    /// ページ数を返す（0 件なら 0）
    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.limit))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_total_pagesは端数を切り上げる() {
        let response = PaginatedResponse::new(vec![1, 2, 3], 1, 10, 21);
        assert_eq!(response.total_pages(), 3);
    }

    #[test]
    fn test_total_pagesは0件で0を返す() {
        let response = PaginatedResponse::<i32>::new(vec![], 1, 10, 0);
        assert_eq!(response.total_pages(), 0);
    }

    #[test]
    fn test_serializeでページ情報がトップレベルに出る() {
        let response = PaginatedResponse::new(vec!["a"], 2, 5, 6);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "data": ["a"], "page": 2, "limit": 5, "total": 6 })
        );
    }
}
