use crate::domain::Isbn;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// 掃除を始めるエントリ数
const PRUNE_THRESHOLD: usize = 256;

/// ISBNごとの排他ロック表
///
/// 同じISBNに対する貸出・返却は1件ずつ実行され、
/// 異なるISBNどうしは並行して進む。
/// 誰も保持していないロックはWeak参照のみが残り、表が大きくなったときに取り除かれる。
#[derive(Default)]
pub struct IsbnLocks {
    locks: Mutex<HashMap<Isbn, Weak<AsyncMutex<()>>>>,
}

/// ロック保持中の証。破棄するとロックが解放される。
pub struct IsbnGuard {
    _guard: OwnedMutexGuard<()>,
}

impl IsbnLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// ISBNのロックを取得する（他の保持者が解放するまで待つ）
    pub async fn acquire(&self, isbn: &Isbn) -> IsbnGuard {
        let lock = self.lock_for(isbn);
        IsbnGuard {
            _guard: lock.lock_owned().await,
        }
    }

    fn lock_for(&self, isbn: &Isbn) -> Arc<AsyncMutex<()>> {
        // 表のロック中に毒化しても中身は弱参照のみなので、そのまま使い続ける
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(lock) = locks.get(isbn).and_then(Weak::upgrade) {
            return lock;
        }

        if locks.len() >= PRUNE_THRESHOLD {
            locks.retain(|_, lock| lock.strong_count() > 0);
        }

        let lock = Arc::new(AsyncMutex::new(()));
        locks.insert(isbn.clone(), Arc::downgrade(&lock));
        lock
    }

    /// 表に残っているエントリ数（解放済みを含む）
    #[cfg(test)]
    fn entry_count(&self) -> usize {
        self.locks.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn isbn(value: &str) -> Isbn {
        Isbn::new(value).unwrap()
    }

    #[tokio::test]
    async fn test_same_isbn_is_exclusive() {
        let locks = Arc::new(IsbnLocks::new());
        let guard = locks.acquire(&isbn("111")).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(&isbn("111")).await;
            })
        };

        // 保持中は2つ目の取得が完了しない
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .expect("second acquire should proceed after release")
            .unwrap();
    }

    #[tokio::test]
    async fn test_different_isbns_do_not_block() {
        let locks = IsbnLocks::new();
        let _first = locks.acquire(&isbn("111")).await;

        let second = tokio::time::timeout(Duration::from_secs(1), locks.acquire(&isbn("222"))).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_released_entries_are_pruned() {
        let locks = IsbnLocks::new();
        for i in 0..PRUNE_THRESHOLD {
            let _guard = locks.acquire(&isbn(&format!("isbn-{i}"))).await;
        }
        assert_eq!(locks.entry_count(), PRUNE_THRESHOLD);

        // 閾値に達した状態で新しいISBNを取ると、解放済みのエントリが掃除される
        let _guard = locks.acquire(&isbn("fresh")).await;
        assert_eq!(locks.entry_count(), 1);
    }
}
