//! JSON-file audit store.
//!
//! The whole store lives in one JSON document. Every mutation rewrites it
//! through a `.tmp` sibling followed by a rename, so a crash mid-write leaves
//! the previous document intact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::{sort_newest_first, AuditId, AuditPatch, AuditRecord, AuditStore, NewAuditRecord};
use crate::error::StoreError;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreDocument {
    next_id: u64,
    records: Vec<AuditRecord>,
}

pub struct JsonFileStore {
    path: PathBuf,
    document: Mutex<StoreDocument>,
}

impl JsonFileStore {
    /// Opens the store at `path`, starting empty if the file does not exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let document = match tokio::fs::read_to_string(&path).await {
            Ok(data) => serde_json::from_str(&data)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreDocument::default(),
            Err(e) => return Err(e.into()),
        };
        debug!("Opened audit store {:?} ({} records)", path, document.records.len());
        Ok(Self {
            path,
            document: Mutex::new(document),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn save(&self, document: &StoreDocument) -> Result<(), StoreError> {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let json = serde_json::to_string_pretty(document)?;
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl AuditStore for JsonFileStore {
    async fn create(&self, record: NewAuditRecord) -> Result<AuditId, StoreError> {
        let mut document = self.document.lock().await;
        let id = AuditId(document.next_id + 1);
        document.next_id = id.0;
        document.records.push(record.with_id(id));
        if let Err(e) = self.save(&document).await {
            document.records.pop();
            document.next_id -= 1;
            return Err(e);
        }
        Ok(id)
    }

    async fn get_by_user(&self, user_id: &str) -> Result<Vec<AuditRecord>, StoreError> {
        let document = self.document.lock().await;
        let mut records: Vec<AuditRecord> = document
            .records
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn get_by_id(&self, id: AuditId) -> Result<AuditRecord, StoreError> {
        let document = self.document.lock().await;
        document
            .records
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn update(&self, id: AuditId, patch: AuditPatch) -> Result<AuditRecord, StoreError> {
        let mut document = self.document.lock().await;
        let index = document
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))?;

        let previous = document.records[index].clone();
        patch.apply(&mut document.records[index]);
        if let Err(e) = self.save(&document).await {
            document.records[index] = previous;
            return Err(e);
        }
        Ok(document.records[index].clone())
    }

    async fn delete(&self, id: AuditId) -> Result<(), StoreError> {
        let mut document = self.document.lock().await;
        let index = document
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))?;

        let removed = document.records.remove(index);
        if let Err(e) = self.save(&document).await {
            document.records.insert(index, removed);
            return Err(e);
        }
        Ok(())
    }
}
