//! 申請の参照系操作

use shonin_domain::request::{Request, RequestId};

use super::{
    DEFAULT_LIMIT,
    ListRequestsInput,
    MAX_LIMIT,
    RequestPage,
    RequestTimeline,
    RequestUseCaseImpl,
};
use crate::{error::CoreError, usecase::helpers::FindResultExt};

impl RequestUseCaseImpl {
    /// 申請を取得する
    #[tracing::instrument(skip_all, level = "debug", fields(request_id = %id))]
    pub async fn get_request(&self, id: &RequestId) -> Result<Request, CoreError> {
        self.deps.request_repo.find_by_id(id).await.or_not_found("申請")
    }

    /// 申請一覧を作成日時の降順で取得する
    ///
    /// ページ番号と件数は範囲外なら補正する。
    #[tracing::instrument(skip_all, level = "debug", fields(page = input.page, limit = input.limit))]
    pub async fn list_requests(&self, input: ListRequestsInput) -> Result<RequestPage, CoreError> {
        let (page, limit) = normalize_paging(input.page, input.limit);
        let offset = u64::from(page - 1) * u64::from(limit);

        let requests = self
            .deps
            .request_repo
            .find_page(input.status, limit, offset)
            .await?;
        let total = self.deps.request_repo.count(input.status).await?;

        Ok(RequestPage {
            requests,
            total,
            page,
            limit,
        })
    }

    /// 申請と承認履歴のタイムラインを取得する
    ///
    /// 履歴は作成日時の昇順（同時刻は段階の昇順）。
    #[tracing::instrument(skip_all, level = "debug", fields(request_id = %id))]
    pub async fn list_history(&self, id: &RequestId) -> Result<RequestTimeline, CoreError> {
        let request = self.deps.request_repo.find_by_id(id).await.or_not_found("申請")?;

        let histories = self.deps.history_repo.find_by_request_ordered(id).await?;
        let total_steps = self
            .deps
            .step_repo
            .find_by_workflow(request.workflow_id())
            .await?
            .len();

        Ok(RequestTimeline {
            request,
            total_steps,
            histories,
        })
    }
}

/// ページ番号と件数を補正する
fn normalize_paging(page: i64, limit: i64) -> (u32, u32) {
    let page = u32::try_from(page.max(1)).unwrap_or(u32::MAX);
    let limit = match limit {
        l if l < 1 => DEFAULT_LIMIT,
        l if l > MAX_LIMIT => MAX_LIMIT,
        l => l,
    };
    // 1..=MAX_LIMIT に収まっている
    let limit = u32::try_from(limit).unwrap_or(u32::MAX);
    (page, limit)
}
