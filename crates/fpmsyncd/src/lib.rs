//! FPM Synchronization Daemon for SONiC
//!
//! This crate provides the Rust implementation of the SRv6 Local SID path of
//! fpmsyncd: it receives netlink messages from the routing stack over an FPM
//! session and mirrors SRv6 Local SID programming into SONiC's APPL_DB
//! (`SRV6_MY_SID_TABLE`).
//!
//! # NIST 800-53 Rev 5 Control Mappings
//!
//! This module implements the following security controls:
//!
//! | Control | Description | Implementation |
//! |---------|-------------|----------------|
//! | AU-3 | Content of Audit Records | Structured logging with SID key and action |
//! | AU-12 | Audit Record Generation | All Local SID changes logged |
//! | CM-6 | Configuration Settings | TOML config with CLI overrides |
//! | CM-8 | System Component Inventory | Keyed Local SID table |
//! | SC-5 | DoS Protection | Bounded FPM frames, malformed input dropped |
//! | SC-7 | Boundary Protection | FPM listener on a local address |
//! | SI-4 | System Monitoring | Prometheus counters per outcome |
//! | SI-10 | Input Validation | Every Local SID validated before programming |
//! | SI-11 | Error Handling | Structured error types |
//!
//! # Architecture
//!
//! ```text
//! +-----------------+     +--------------------------------+     +-------------------+
//! | Routing stack   |     |           fpmsyncd             |     |  Redis (SONiC)    |
//! |                 | FPM |                                |     |                   |
//! | RTM_NEWSRV6...  |---->| FpmServer -> RouteSync         |     |     APPL_DB       |
//! | RTM_DELSRV6...  |     |               |   demux        |     | SRV6_MY_SID_TABLE |
//! | RTM_NEWROUTE    |     |               |-- decode       |---->|                   |
//! |                 |     |               |-- resolve      |     |                   |
//! +-----------------+     |               |-- validate     |     +-------------------+
//!                         |               `-- project      |
//!                         |      RouteHandler (routes)     |
//!                         +--------------------------------+
//! ```

pub mod config;
pub mod demux;
pub mod error;
pub mod fpm_link;
pub mod local_sid;
pub mod metrics;
pub mod metrics_server;
pub mod netlink;
pub mod redis_adapter;
pub mod route_sync;
pub mod store;
pub mod types;

pub use config::FpmsyncConfig;
pub use demux::{MessageClass, classify, is_raw_processing};
pub use error::{DecodeError, FpmsyncError, LocalSidError, Result, ValidationError};
pub use fpm_link::{FpmCodec, FpmFrame, FpmServer, SessionStats, run_session};
pub use local_sid::{local_sid_key, resolve_structure, validate};
pub use metrics::SyncMetrics;
pub use metrics_server::start_metrics_server;
pub use netlink::{LocalSidMessage, decode_local_sid};
pub use redis_adapter::RedisAdapter;
pub use route_sync::{DiscardRouteHandler, RouteHandler, RouteSync, SyncOutcome};
pub use store::{LocalSidTable, MemoryTable};
pub use types::{
    Action, LocalSidBehavior, LocalSidCandidate, LocalSidRecord, RawSidStructure, SidStructure,
    ValidLocalSid,
};
