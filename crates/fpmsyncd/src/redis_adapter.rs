//! Redis adapter for SRV6_MY_SID_TABLE in APPL_DB
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - SC-8: Transmission Confidentiality - Database communication
//! - AU-3: Content of Audit Records - Database operations logged
//! - SI-7: Software, Firmware, and Information Integrity - Atomic entry replacement

use crate::error::Result;
use crate::store::LocalSidTable;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tracing::{debug, instrument};

/// SONiC database index for application state
/// NIST: CM-6 - Configuration settings for database selection
pub const APPL_DB: i64 = 0;

/// SONiC APPL_DB table holding Local SIDs
pub const APP_SRV6_MY_SID_TABLE_NAME: &str = "SRV6_MY_SID_TABLE";

/// Redis adapter for Local SID programming
///
/// # NIST Controls
/// - AC-17: Remote Access - Database access management
pub struct RedisAdapter {
    appl_db: ConnectionManager,
}

impl RedisAdapter {
    /// Connect to APPL_DB on `host:port`
    ///
    /// # NIST Controls
    /// - SC-23: Session Authenticity - Establish authenticated sessions
    #[instrument(skip_all)]
    pub async fn new(host: &str, port: u16) -> Result<Self> {
        Self::with_db(host, port, APPL_DB).await
    }

    /// Connect to an explicit database number
    #[instrument(skip_all)]
    pub async fn with_db(host: &str, port: u16, db: i64) -> Result<Self> {
        debug!(host, port, db, "Connecting to Redis");

        let url = format!("redis://{}:{}/{}", host, port, db);
        let client = Client::open(url)?;
        let appl_db = ConnectionManager::new(client).await?;

        debug!("Connected to APPL_DB");
        Ok(Self { appl_db })
    }

    /// Full Redis key for a Local SID table key
    pub fn redis_key(key: &str) -> String {
        format!("{}:{}", APP_SRV6_MY_SID_TABLE_NAME, key)
    }
}

#[async_trait]
impl LocalSidTable for RedisAdapter {
    /// DEL then HSET in one MULTI/EXEC so readers never see a merged entry
    ///
    /// # NIST Controls
    /// - AU-12: Audit Record Generation - Log Local SID programming
    #[instrument(skip(self, fields))]
    async fn upsert(&mut self, key: &str, fields: &[(&'static str, String)]) -> Result<()> {
        let key = Self::redis_key(key);
        debug!(key, field_count = fields.len(), "Setting Local SID");

        let mut pipe = redis::pipe();
        pipe.atomic();
        pipe.del(&key).ignore();
        pipe.hset_multiple(&key, fields).ignore();

        let _: () = pipe.query_async(&mut self.appl_db).await?;
        Ok(())
    }

    /// # NIST Controls
    /// - AU-12: Audit Record Generation - Log Local SID removal
    #[instrument(skip(self))]
    async fn delete(&mut self, key: &str) -> Result<()> {
        let key = Self::redis_key(key);
        debug!(key, "Deleting Local SID");

        let _: () = self.appl_db.del(&key).await?;
        Ok(())
    }
}
