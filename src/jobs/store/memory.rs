use std::{
    collections::BTreeMap,
    sync::{PoisonError, RwLock},
};

use async_trait::async_trait;

use super::{JobStore, StoreError};
use crate::jobs::JobDefinition;

/// In-memory store. State is lost on restart; used by tests and tooling.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    definitions: RwLock<BTreeMap<String, JobDefinition>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryStore {
    async fn get(&self, job_id: &str) -> Result<Option<JobDefinition>, StoreError> {
        let definitions = self.definitions.read().unwrap_or_else(PoisonError::into_inner);
        Ok(definitions.get(job_id).cloned())
    }

    async fn list(&self) -> Result<Vec<JobDefinition>, StoreError> {
        let definitions = self.definitions.read().unwrap_or_else(PoisonError::into_inner);
        Ok(definitions.values().cloned().collect())
    }

    async fn save(&self, definition: &JobDefinition) -> Result<(), StoreError> {
        let mut definitions = self.definitions.write().unwrap_or_else(PoisonError::into_inner);
        definitions.insert(definition.job_id.clone(), definition.clone());
        Ok(())
    }

    async fn delete(&self, job_id: &str) -> Result<bool, StoreError> {
        let mut definitions = self.definitions.write().unwrap_or_else(PoisonError::into_inner);
        Ok(definitions.remove(job_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::schedule::{Occurrence, RecurrenceRule};

    fn definition(job_id: &str, hour: u32) -> JobDefinition {
        JobDefinition::new(
            job_id,
            Occurrence {
                rule: RecurrenceRule::daily(hour, 0).unwrap(),
                at: Utc.with_ymd_and_hms(2026, 1, 15, hour, 0, 0).unwrap(),
            },
        )
    }

    #[tokio::test]
    async fn test_save_replaces_existing_record() {
        let store = InMemoryStore::new();

        store.save(&definition("cleanup", 1)).await.unwrap();
        store.save(&definition("cleanup", 2)).await.unwrap();

        let all = store.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].rule.hour(), 2);
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_job_id() {
        let store = InMemoryStore::new();

        store.save(&definition("b", 1)).await.unwrap();
        store.save(&definition("a", 1)).await.unwrap();

        let ids: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.job_id)
            .collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[tokio::test]
    async fn test_delete_reports_presence() {
        let store = InMemoryStore::new();
        store.save(&definition("cleanup", 1)).await.unwrap();

        assert!(store.delete("cleanup").await.unwrap());
        assert!(!store.delete("cleanup").await.unwrap());
        assert!(store.get("cleanup").await.unwrap().is_none());
    }
}
