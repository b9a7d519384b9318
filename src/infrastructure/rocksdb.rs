use crate::domain::application::{
    ApplicationChanges, ApplicationId, ApplicationRecord, ApplicationStatus,
};
use crate::domain::identity::OwnerId;
use crate::domain::ports::ApplicationStore;
use crate::error::{Result, ServiceError};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing application records.
pub const CF_APPLICATIONS: &str = "applications";

fn storage_error(context: &str, e: impl std::fmt::Display) -> ServiceError {
    ServiceError::BackendPersistence(format!("{}: {}", context, e))
}

/// A local persistent application store using RocksDB.
///
/// Records are keyed by their id in a dedicated column family; owner
/// filtering happens on every read, like the remote backend does it.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the "applications" column family exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_applications = ColumnFamilyDescriptor::new(CF_APPLICATIONS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_applications])
            .map_err(|e| storage_error("failed to open database", e))?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn read(&self, id: ApplicationId) -> Result<Option<ApplicationRecord>> {
        let cf = self
            .db
            .cf_handle(CF_APPLICATIONS)
            .ok_or_else(|| storage_error("column family", "applications not found"))?;

        match self
            .db
            .get_cf(&cf, id.as_uuid().as_bytes())
            .map_err(|e| storage_error("read failed", e))?
        {
            Some(bytes) => Ok(Some(
                serde_json::from_slice(&bytes).map_err(|e| storage_error("corrupt record", e))?,
            )),
            None => Ok(None),
        }
    }

    fn write(&self, record: &ApplicationRecord) -> Result<()> {
        let cf = self
            .db
            .cf_handle(CF_APPLICATIONS)
            .ok_or_else(|| storage_error("column family", "applications not found"))?;
        let value = serde_json::to_vec(record)?;
        self.db
            .put_cf(&cf, record.id.as_uuid().as_bytes(), value)
            .map_err(|e| storage_error("write failed", e))
    }
}

#[async_trait]
impl ApplicationStore for RocksDBStore {
    async fn insert(&self, record: ApplicationRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if self.read(record.id)?.is_some() {
            return Err(ServiceError::BackendPersistence(format!(
                "duplicate key value: application {} already exists",
                record.id
            )));
        }
        self.write(&record)
    }

    async fn update(
        &self,
        id: ApplicationId,
        owner: &OwnerId,
        expected_status: ApplicationStatus,
        changes: ApplicationChanges,
    ) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        match self.read(id)? {
            Some(mut record) if record.owner_id == *owner && record.status == expected_status => {
                record.sections = changes.sections;
                record.status = changes.status;
                record.updated_at = changes.updated_at;
                self.write(&record)?;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn get(&self, id: ApplicationId, owner: &OwnerId) -> Result<Option<ApplicationRecord>> {
        Ok(self.read(id)?.filter(|r| r.owner_id == *owner))
    }

    async fn list(&self, owner: &OwnerId) -> Result<Vec<ApplicationRecord>> {
        let handle = self
            .db
            .cf_handle(CF_APPLICATIONS)
            .ok_or_else(|| storage_error("column family", "applications not found"))?;

        let mut records = Vec::new();
        let iter = self.db.iterator_cf(&handle, rocksdb::IteratorMode::Start);

        for item in iter {
            let (_key, value) = item.map_err(|e| storage_error("iteration failed", e))?;
            let record: ApplicationRecord =
                serde_json::from_slice(&value).map_err(|e| storage_error("corrupt record", e))?;
            if record.owner_id == *owner {
                records.push(record);
            }
        }

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}
