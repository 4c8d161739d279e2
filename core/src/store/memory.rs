use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{sort_newest_first, AuditId, AuditPatch, AuditRecord, AuditStore, NewAuditRecord};
use crate::error::StoreError;

#[derive(Default)]
struct Inner {
    next_id: u64,
    records: BTreeMap<AuditId, AuditRecord>,
}

/// Process-local store, lost on exit.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn create(&self, record: NewAuditRecord) -> Result<AuditId, StoreError> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let id = AuditId(inner.next_id);
        inner.records.insert(id, record.with_id(id));
        Ok(id)
    }

    async fn get_by_user(&self, user_id: &str) -> Result<Vec<AuditRecord>, StoreError> {
        let inner = self.inner.read().await;
        let mut records: Vec<AuditRecord> = inner
            .records
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn get_by_id(&self, id: AuditId) -> Result<AuditRecord, StoreError> {
        let inner = self.inner.read().await;
        inner.records.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    async fn update(&self, id: AuditId, patch: AuditPatch) -> Result<AuditRecord, StoreError> {
        let mut inner = self.inner.write().await;
        let record = inner.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        patch.apply(record);
        Ok(record.clone())
    }

    async fn delete(&self, id: AuditId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .records
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collector::{FixedMetrics, SignalCollector, SimulatedCollector};
    use crate::core::report::AuditReport;
    use crate::core::scoring::Grade;
    use crate::core::Locale;
    use crate::store::AuditStatus;
    use chrono::{Duration, Utc};

    fn record(user: &str, url: &str) -> NewAuditRecord {
        let snapshot = SimulatedCollector::with_metrics(FixedMetrics::with_load_time(2.0))
            .collect(url)
            .unwrap();
        let report = AuditReport::from_snapshot(url.to_string(), &snapshot, Locale::En);
        NewAuditRecord::completed(user, &report)
    }

    #[tokio::test]
    async fn test_create_and_get_by_id() {
        let store = MemoryStore::new();
        let id = store.create(record("alice", "https://a.com")).await.unwrap();
        let fetched = store.get_by_id(id).await.unwrap();
        assert_eq!(fetched.id, id);
        assert_eq!(fetched.url, "https://a.com");
        assert_eq!(fetched.status, AuditStatus::Completed);
        assert!(fetched.completed_at.is_some());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_by_user_newest_first() {
        let store = MemoryStore::new();
        let now = Utc::now();

        let mut older = record("alice", "https://old.com");
        older.created_at = now - Duration::minutes(10);
        let mut newer = record("alice", "https://new.com");
        newer.created_at = now;

        store.create(newer).await.unwrap();
        store.create(older).await.unwrap();
        store.create(record("bob", "https://bob.com")).await.unwrap();

        let alice = store.get_by_user("alice").await.unwrap();
        let urls: Vec<&str> = alice.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://new.com", "https://old.com"]);
        assert!(store.get_by_user("carol").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_applies_patch() {
        let store = MemoryStore::new();
        let id = store.create(record("alice", "https://a.com")).await.unwrap();

        let updated = store
            .update(id, AuditPatch { score: Some(95), ..AuditPatch::status(AuditStatus::Failed) })
            .await
            .unwrap();
        assert_eq!(updated.status, AuditStatus::Failed);
        assert_eq!(updated.score, 95);
        assert_eq!(updated.grade, Grade::A);
        assert_eq!(store.get_by_id(id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_unknown_ids() {
        let store = MemoryStore::new();
        assert!(matches!(store.get_by_id(AuditId(7)).await, Err(StoreError::NotFound(AuditId(7)))));
        assert!(matches!(
            store.update(AuditId(7), AuditPatch::default()).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(store.delete(AuditId(7)).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_removes_record() {
        let store = MemoryStore::new();
        let id = store.create(record("alice", "https://a.com")).await.unwrap();
        store.delete(id).await.unwrap();
        assert!(store.is_empty().await);
        assert!(store.get_by_id(id).await.is_err());
    }
}
