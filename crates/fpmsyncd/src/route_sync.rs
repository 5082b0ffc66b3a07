//! RouteSync - SRv6 Local SID synchronization engine
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - SI-4: System Monitoring - Routing stack event monitoring
//! - SI-10: Information Input Validation - Rejected input never reaches APPL_DB
//! - AU-12: Audit Record Generation - Log all Local SID changes
//! - CM-8: System Component Inventory - Track programmed Local SIDs
//!
//! Messages are handled one at a time, in delivery order. The engine keeps
//! no per-SID state: the table is authoritative, every add is an
//! unconditional upsert and every delete an unconditional removal.

use crate::demux::{MessageClass, classify};
use crate::error::{LocalSidError, Result};
use crate::local_sid::{local_sid_key, resolve_structure, validate, validate_address};
use crate::metrics::SyncMetrics;
use crate::netlink::{decode_local_sid, message_type};
use crate::store::LocalSidTable;
use crate::types::LocalSidRecord;
use tracing::{debug, error, info, instrument, warn};

/// What one message did to the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Entry written at `key`
    Set { key: String },
    /// Entry at `key` removed (or was already absent)
    Removed { key: String },
    /// Local SID message dropped, table untouched
    Rejected(LocalSidError),
    /// Handed to the generic route pipeline
    Forwarded,
    /// Unrecognized message type
    Ignored,
}

/// Receiver for messages the SRv6 path does not handle
pub trait RouteHandler: Send {
    fn on_route_msg(&mut self, msg_type: u16, msg: &[u8]);
}

/// Logs and drops route and nexthop messages
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardRouteHandler;

impl RouteHandler for DiscardRouteHandler {
    fn on_route_msg(&mut self, msg_type: u16, msg: &[u8]) {
        debug!(msg_type, len = msg.len(), "Route message not handled, dropping");
    }
}

/// Decode, resolve, validate and project an add message
pub fn local_sid_record(msg: &[u8]) -> std::result::Result<LocalSidRecord, LocalSidError> {
    let candidate = decode_local_sid(msg)?;
    let structure = resolve_structure(&candidate.structure)?;
    Ok(validate(&candidate, structure)?.to_record())
}

/// Derive the table key a delete message refers to
///
/// Only the key-bearing fields are checked; the action and its companion
/// data play no part in removing an entry.
pub fn local_sid_delete_key(msg: &[u8]) -> std::result::Result<String, LocalSidError> {
    let candidate = decode_local_sid(msg)?;
    let structure = resolve_structure(&candidate.structure)?;
    let sid = validate_address(&candidate)?;
    Ok(local_sid_key(&structure, &sid))
}

/// RouteSync - mirrors SRv6 Local SID programming into a [`LocalSidTable`]
///
/// # NIST Controls
/// - SI-4(4): System Monitoring - Automated analysis of routing events
pub struct RouteSync<T, R = DiscardRouteHandler> {
    table: T,
    routes: R,
    metrics: SyncMetrics,
}

impl<T: LocalSidTable> RouteSync<T> {
    /// Create an engine that drops generic route messages
    pub fn new(table: T) -> Result<Self> {
        Self::with_route_handler(table, DiscardRouteHandler)
    }
}

impl<T: LocalSidTable, R: RouteHandler> RouteSync<T, R> {
    pub fn with_route_handler(table: T, routes: R) -> Result<Self> {
        Ok(Self {
            table,
            routes,
            metrics: SyncMetrics::new()?,
        })
    }

    pub fn table(&self) -> &T {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut T {
        &mut self.table
    }

    pub fn route_handler(&self) -> &R {
        &self.routes
    }

    pub fn metrics(&self) -> &SyncMetrics {
        &self.metrics
    }

    /// Process one complete netlink message
    ///
    /// Decode and validation failures come back as
    /// [`SyncOutcome::Rejected`]; only table errors are returned as `Err`.
    /// A failed table write is not retried: it is logged at error level
    /// with its key and counted, and APPL_DB stays behind until the routing
    /// stack sends that Local SID again.
    ///
    /// # NIST Controls
    /// - SI-10: Information Input Validation - Validate before programming
    /// - AU-12: Audit Record Generation - Log every table change
    #[instrument(skip_all, fields(len = msg.len()))]
    pub async fn on_msg(&mut self, msg: &[u8]) -> Result<SyncOutcome> {
        let msg_type = match message_type(msg) {
            Ok(msg_type) => msg_type,
            Err(e) => return Ok(self.reject(e.into())),
        };

        let class = classify(msg_type);
        self.metrics.record_received(class);

        match class {
            MessageClass::Srv6LocalSidAdd => match local_sid_record(msg) {
                Ok(record) => self.set_local_sid(record).await,
                Err(e) => Ok(self.reject(e)),
            },
            MessageClass::Srv6LocalSidDelete => match local_sid_delete_key(msg) {
                Ok(key) => self.delete_local_sid(key).await,
                Err(e) => Ok(self.reject(e)),
            },
            MessageClass::GenericRoute => {
                self.routes.on_route_msg(msg_type, msg);
                Ok(SyncOutcome::Forwarded)
            }
            MessageClass::Unrecognized => {
                debug!(msg_type, "Ignoring unrecognized message type");
                Ok(SyncOutcome::Ignored)
            }
        }
    }

    async fn set_local_sid(&mut self, record: LocalSidRecord) -> Result<SyncOutcome> {
        if let Err(e) = self.table.upsert(&record.key, &record.fields).await {
            self.metrics.record_store_error("set");
            error!(key = %record.key, error = %e, "Failed to set Local SID, APPL_DB out of sync");
            return Err(e);
        }
        self.metrics.record_set();

        info!(
            key = %record.key,
            action = record.field("action").unwrap_or_default(),
            "Set Local SID"
        );
        Ok(SyncOutcome::Set { key: record.key })
    }

    async fn delete_local_sid(&mut self, key: String) -> Result<SyncOutcome> {
        if let Err(e) = self.table.delete(&key).await {
            self.metrics.record_store_error("delete");
            error!(key = %key, error = %e, "Failed to delete Local SID, APPL_DB out of sync");
            return Err(e);
        }
        self.metrics.record_deleted();

        info!(key = %key, "Deleted Local SID");
        Ok(SyncOutcome::Removed { key })
    }

    fn reject(&self, error: LocalSidError) -> SyncOutcome {
        let reason = error.reason();
        self.metrics.record_rejected(reason);
        warn!(reason, error = %error, "Dropping Local SID message");
        SyncOutcome::Rejected(error)
    }
}
