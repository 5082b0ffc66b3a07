//! Prometheus metrics collection for fpmsyncd
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - AU-6: Audit Record Review - Metrics available for analysis
//! - SI-4: System Monitoring - Programming and rejection counters

use crate::demux::MessageClass;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Counters owned by one synchronization engine
///
/// # NIST Controls
/// - SI-4: System Monitoring - Per-engine metrics collection
#[derive(Clone)]
pub struct SyncMetrics {
    pub messages_received_total: IntCounter,
    pub local_sids_set_total: IntCounter,
    pub local_sids_deleted_total: IntCounter,
    pub messages_rejected_total: IntCounterVec,
    pub messages_forwarded_total: IntCounter,
    pub messages_unrecognized_total: IntCounter,
    /// Table writes that failed, by operation (`set`, `delete`)
    pub store_errors_total: IntCounterVec,

    registry: Registry,
}

impl SyncMetrics {
    /// Create a metrics collector with its own registry
    ///
    /// # NIST Controls
    /// - AU-12: Audit Record Generation - Initialize audit metrics
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let messages_received_total = IntCounter::with_opts(Opts::new(
            "fpmsyncd_messages_received_total",
            "Total number of netlink messages received",
        ))?;
        registry.register(Box::new(messages_received_total.clone()))?;

        let local_sids_set_total = IntCounter::with_opts(Opts::new(
            "fpmsyncd_local_sids_set_total",
            "Total number of SRv6 Local SIDs written",
        ))?;
        registry.register(Box::new(local_sids_set_total.clone()))?;

        let local_sids_deleted_total = IntCounter::with_opts(Opts::new(
            "fpmsyncd_local_sids_deleted_total",
            "Total number of SRv6 Local SIDs removed",
        ))?;
        registry.register(Box::new(local_sids_deleted_total.clone()))?;

        let messages_rejected_total = IntCounterVec::new(
            Opts::new(
                "fpmsyncd_messages_rejected_total",
                "Total number of Local SID messages dropped, by reason",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(messages_rejected_total.clone()))?;

        let messages_forwarded_total = IntCounter::with_opts(Opts::new(
            "fpmsyncd_messages_forwarded_total",
            "Total number of messages handed to the route pipeline",
        ))?;
        registry.register(Box::new(messages_forwarded_total.clone()))?;

        let messages_unrecognized_total = IntCounter::with_opts(Opts::new(
            "fpmsyncd_messages_unrecognized_total",
            "Total number of messages with an unrecognized type",
        ))?;
        registry.register(Box::new(messages_unrecognized_total.clone()))?;

        let store_errors_total = IntCounterVec::new(
            Opts::new(
                "fpmsyncd_store_errors_total",
                "Total number of Local SID table writes that failed, by operation",
            ),
            &["op"],
        )?;
        registry.register(Box::new(store_errors_total.clone()))?;

        Ok(Self {
            messages_received_total,
            local_sids_set_total,
            local_sids_deleted_total,
            messages_rejected_total,
            messages_forwarded_total,
            messages_unrecognized_total,
            store_errors_total,
            registry,
        })
    }

    pub fn record_received(&self, class: MessageClass) {
        self.messages_received_total.inc();
        match class {
            MessageClass::GenericRoute => self.messages_forwarded_total.inc(),
            MessageClass::Unrecognized => self.messages_unrecognized_total.inc(),
            MessageClass::Srv6LocalSidAdd | MessageClass::Srv6LocalSidDelete => {}
        }
    }

    pub fn record_set(&self) {
        self.local_sids_set_total.inc();
    }

    pub fn record_deleted(&self) {
        self.local_sids_deleted_total.inc();
    }

    pub fn record_rejected(&self, reason: &str) {
        self.messages_rejected_total.with_label_values(&[reason]).inc();
    }

    pub fn record_store_error(&self, op: &str) {
        self.store_errors_total.with_label_values(&[op]).inc();
    }

    /// Prometheus text exposition of every counter
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
