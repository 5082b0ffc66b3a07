//! Error types for fpmsyncd
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - SI-10: Information Input Validation - Decode and validation rejections
//! - SI-11: Error Handling - Structured error types with contextual information

use crate::types::Action;
use std::net::IpAddr;
use thiserror::Error;

/// Malformed or incomplete netlink bytes for a Local SID message
///
/// # NIST Controls
/// - SI-10: Information Input Validation - Reject malformed kernel input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Buffer shorter than a fixed-size header
    #[error("truncated message: expected at least {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// TLV framing could not be walked
    #[error("malformed netlink message: {0}")]
    Malformed(String),

    /// Attribute present but its payload is unusable
    #[error("invalid attribute {kind}: {reason}")]
    InvalidAttribute { kind: u16, reason: String },

    /// No SID value attribute
    #[error("missing SID address")]
    MissingAddress,

    /// No action attribute
    #[error("missing SRv6 action")]
    MissingAction,
}

/// Semantic rejection of a decoded Local SID
///
/// # NIST Controls
/// - SI-10: Information Input Validation - Policy checks on SID programming
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Some but not all of block/node/function lengths were sent
    #[error("incomplete SID structure")]
    IncompleteSidStructure,

    /// Structure lengths do not fit in an IPv6 address
    #[error("SID structure of {total} bits exceeds 128")]
    OversizedSidStructure { total: u32 },

    #[error("SID address {0} is not IPv6")]
    WrongAddressFamily(IpAddr),

    #[error("SID prefix length {0} is not 128")]
    BadPrefixLength(u8),

    #[error("unknown SRv6 action {0}")]
    UnknownAction(u32),

    #[error("action {0} requires an adjacency")]
    MissingAdjacency(Action),

    #[error("action {0} requires a VRF")]
    MissingVrf(Action),

    #[error("adjacency {adj} has the wrong address family for action {action}")]
    WrongAdjacencyFamily { action: Action, adj: IpAddr },
}

/// Any reason a Local SID message is dropped without touching the store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocalSidError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl LocalSidError {
    /// Short label used for metrics and log fields
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Decode(DecodeError::Truncated { .. }) => "truncated",
            Self::Decode(DecodeError::Malformed(_)) => "malformed",
            Self::Decode(DecodeError::InvalidAttribute { .. }) => "invalid_attribute",
            Self::Decode(DecodeError::MissingAddress) => "missing_address",
            Self::Decode(DecodeError::MissingAction) => "missing_action",
            Self::Validation(ValidationError::IncompleteSidStructure) => "incomplete_structure",
            Self::Validation(ValidationError::OversizedSidStructure { .. }) => {
                "oversized_structure"
            }
            Self::Validation(ValidationError::WrongAddressFamily(_)) => "wrong_address_family",
            Self::Validation(ValidationError::BadPrefixLength(_)) => "bad_prefix_length",
            Self::Validation(ValidationError::UnknownAction(_)) => "unknown_action",
            Self::Validation(ValidationError::MissingAdjacency(_)) => "missing_adjacency",
            Self::Validation(ValidationError::MissingVrf(_)) => "missing_vrf",
            Self::Validation(ValidationError::WrongAdjacencyFamily { .. }) => {
                "wrong_adjacency_family"
            }
        }
    }
}

/// Errors that can occur in fpmsyncd
///
/// # NIST Controls
/// - SI-11(a): Generate error messages providing information necessary for corrective actions
#[derive(Debug, Error)]
pub enum FpmsyncError {
    /// Redis connection or operation failed
    /// NIST: SC-8 (Transmission Confidentiality) - Database communication errors
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// FPM session framing error
    /// NIST: SC-7 (Boundary Protection) - Routing stack interface errors
    #[error("FPM error: {0}")]
    Fpm(String),

    /// Configuration error
    /// NIST: CM-6 (Configuration Settings) - Configuration validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metrics registry error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for fpmsyncd operations
pub type Result<T> = std::result::Result<T, FpmsyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FpmsyncError::Fpm("bad version 2".to_string());
        assert_eq!(err.to_string(), "FPM error: bad version 2");
    }

    #[test]
    fn test_validation_display() {
        let err = ValidationError::MissingVrf(Action::EndDt6);
        assert_eq!(err.to_string(), "action end.dt6 requires a VRF");
    }

    #[test]
    fn test_reason_labels() {
        let err: LocalSidError = DecodeError::MissingAddress.into();
        assert_eq!(err.reason(), "missing_address");

        let err: LocalSidError = ValidationError::UnknownAction(329).into();
        assert_eq!(err.reason(), "unknown_action");
    }
}
