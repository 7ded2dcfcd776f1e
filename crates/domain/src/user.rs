//! # ユーザー
//!
//! 申請者・承認操作者を識別するユーザー ID。
//! ユーザー自体の管理（登録・認証）は外部の責務で、このサービスは ID のみを扱う。

define_uuid_id! {
    /// ユーザー ID
    pub struct UserId;
}
