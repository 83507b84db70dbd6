use crate::core::cache::RateStore;
use anyhow::Result;
use async_trait::async_trait;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tracing::debug;

const PARTITION_NAME: &str = "rates";

/// Persisted tier backed by a `fjall` partition.
pub struct DiskStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        std::fs::create_dir_all(db_path)?;

        let keyspace = fjall::Config::new(db_path.join("fjall_db")).open()?;
        let partition =
            keyspace.open_partition(PARTITION_NAME, PartitionCreateOptions::default())?;
        Ok(Self {
            keyspace,
            partition,
        })
    }
}

#[async_trait]
impl RateStore for DiskStore {
    async fn get(&self, key: &str) -> Option<String> {
        let res: Result<Option<String>> = (|| {
            if let Some(value) = self.partition.get(key)? {
                debug!("Store HIT for key: {}", key);
                return Ok(Some(String::from_utf8(value.to_vec())?));
            }
            debug!("Store MISS for key: {}", key);
            Ok(None)
        })();

        match res {
            Ok(val) => val,
            Err(e) => {
                debug!("DiskStore get error: {}", e);
                None
            }
        }
    }

    async fn put(&self, key: &str, value: &str) {
        let res: Result<()> = (|| {
            self.partition.insert(key.as_bytes(), value.as_bytes())?;
            self.keyspace.persist(PersistMode::Buffer)?;
            debug!("Store PUT for key: {}", key);
            Ok(())
        })();
        if let Err(e) = res {
            debug!("DiskStore put error: {}", e);
        }
    }

    async fn remove_prefix(&self, prefix: &str) -> usize {
        let res: Result<usize> = (|| {
            let keys = self
                .partition
                .prefix(prefix)
                .map(|kv| kv.map(|(key, _)| key))
                .collect::<Result<Vec<_>, _>>()?;
            let removed = keys.len();
            for key in keys {
                self.partition.remove(key)?;
            }
            self.keyspace.persist(PersistMode::Buffer)?;
            Ok(removed)
        })();

        match res {
            Ok(removed) => {
                debug!("Store REMOVE {} keys with prefix: {}", removed, prefix);
                removed
            }
            Err(e) => {
                debug!("DiskStore remove_prefix error: {}", e);
                0
            }
        }
    }
}
