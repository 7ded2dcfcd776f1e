//! # 申請単位のプロセス内ロック
//!
//! 同一申請への承認・却下・更新をプロセス内で直列化する。
//! 異なる申請は互いにブロックしない。
//!
//! エントリは `Arc` の参照カウントで管理し、ロックの保持者も待機者も
//! いなくなった時点でレジストリから取り除く。申請の件数に比例して
//! マップが膨らみ続けることはない。
//!
//! 複数インスタンス間の排他は `SELECT ... FOR UPDATE` とバージョン比較が担う。

use std::sync::Arc;

use dashmap::DashMap;
use shonin_domain::request::RequestId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// 申請 ID ごとの非同期ミューテックスを払い出すレジストリ
#[derive(Debug, Default)]
pub struct RequestLockRegistry {
    locks: DashMap<RequestId, Arc<Mutex<()>>>,
}

impl RequestLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 申請のロックを取得する
    ///
    /// 他のタスクが保持している間は待機する。タイムアウトはない。
    /// 返したガードをドロップするとロックを解放する。
    pub async fn acquire(&self, id: &RequestId) -> RequestLockGuard<'_> {
        let lock = Arc::clone(&self.locks.entry(id.clone()).or_default());

        let mut handle = RequestLockGuard {
            registry: self,
            id:       id.clone(),
            guard:    None,
        };
        handle.guard = Some(lock.lock_owned().await);

        tracing::trace!(request_id = %id, "申請ロックを取得");
        handle
    }

    /// 管理中のエントリ数
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    fn release(&self, id: &RequestId) {
        // マップ自身の参照だけが残っていれば誰も保持・待機していない
        self.locks
            .remove_if(id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// 申請ロックのガード
///
/// 待機中にキャンセルされた場合もドロップ時にエントリを回収する。
pub struct RequestLockGuard<'a> {
    registry: &'a RequestLockRegistry,
    id:       RequestId,
    guard:    Option<OwnedMutexGuard<()>>,
}

impl Drop for RequestLockGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.registry.release(&self.id);
    }
}
