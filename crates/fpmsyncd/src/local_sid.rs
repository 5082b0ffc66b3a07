//! SRv6 Local SID resolution, validation and projection
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - SI-10: Information Input Validation - Every Local SID is checked before it reaches APPL_DB
//! - CM-8: System Component Inventory - Stable keys for SRV6_MY_SID_TABLE
//!
//! Pipeline for one message:
//!
//! ```text
//! LocalSidCandidate ──resolve_structure──▶ SidStructure
//!        │                                    │
//!        └──────────────validate──────────────┴──▶ ValidLocalSid ──to_record──▶ LocalSidRecord
//! ```

use crate::error::ValidationError;
use crate::netlink::AF_INET6;
use crate::types::{
    Action, Companion, LocalSidBehavior, LocalSidCandidate, LocalSidRecord, RawSidStructure,
    SidStructure, ValidLocalSid,
};
use std::net::{IpAddr, Ipv6Addr};

/// Width of an IPv6 address in bits
pub const SID_BITS: u8 = 128;

/// Turn the optional wire lengths into a concrete structure
///
/// Block, node and function lengths are all-or-nothing: none of them
/// means the default 32/16/16/0 structure whatever the argument length
/// says, some of them is an error. With all three present a missing
/// argument length is 0.
pub fn resolve_structure(raw: &RawSidStructure) -> Result<SidStructure, ValidationError> {
    let structure = match (raw.block_len, raw.node_len, raw.func_len) {
        (None, None, None) => SidStructure::DEFAULT,
        (Some(block_len), Some(node_len), Some(func_len)) => SidStructure {
            block_len,
            node_len,
            func_len,
            arg_len: raw.arg_len.unwrap_or(0),
        },
        _ => return Err(ValidationError::IncompleteSidStructure),
    };

    let total = structure.total_len();
    if total > u32::from(SID_BITS) {
        return Err(ValidationError::OversizedSidStructure { total });
    }

    Ok(structure)
}

/// Check the fields that make up the table key
///
/// Deletes stop here: only the key has to be trustworthy to remove an entry.
pub fn validate_address(candidate: &LocalSidCandidate) -> Result<Ipv6Addr, ValidationError> {
    let sid = match candidate.sid {
        IpAddr::V6(sid) if candidate.family == AF_INET6 => sid,
        other => return Err(ValidationError::WrongAddressFamily(other)),
    };

    if candidate.prefix_len != SID_BITS {
        return Err(ValidationError::BadPrefixLength(candidate.prefix_len));
    }

    Ok(sid)
}

/// Map the action code and bind its companion field
///
/// A companion the action does not use is ignored. Adjacency actions take
/// NH4 (End.DX4, uDX4) or NH6 (the rest); the other nexthop is only looked
/// at to tell a wrong family from a missing one.
pub fn validate_behavior(candidate: &LocalSidCandidate) -> Result<LocalSidBehavior, ValidationError> {
    let action = Action::from_code(candidate.action)
        .ok_or(ValidationError::UnknownAction(candidate.action))?;

    match action.companion() {
        Companion::None => Ok(LocalSidBehavior::Endpoint(action)),
        Companion::Adjacency { ipv4 } => {
            let nh4 = candidate.nh4.map(IpAddr::V4);
            let nh6 = candidate.nh6.map(IpAddr::V6);
            let (wanted, other) = if ipv4 { (nh4, nh6) } else { (nh6, nh4) };

            match (wanted, other) {
                (Some(adj), _) => Ok(LocalSidBehavior::Adjacency { action, adj }),
                (None, Some(adj)) => Err(ValidationError::WrongAdjacencyFamily { action, adj }),
                (None, None) => Err(ValidationError::MissingAdjacency(action)),
            }
        }
        Companion::Vrf => match candidate.vrf.as_deref() {
            Some(vrf) if !vrf.is_empty() => Ok(LocalSidBehavior::Vrf {
                action,
                vrf: vrf.to_string(),
            }),
            _ => Err(ValidationError::MissingVrf(action)),
        },
    }
}

/// Run every check an add must pass
pub fn validate(
    candidate: &LocalSidCandidate,
    structure: SidStructure,
) -> Result<ValidLocalSid, ValidationError> {
    let sid = validate_address(candidate)?;
    let behavior = validate_behavior(candidate)?;

    Ok(ValidLocalSid {
        sid,
        structure,
        behavior,
    })
}

/// `block:node:func:arg:address`, the SRV6_MY_SID_TABLE key
pub fn local_sid_key(structure: &SidStructure, sid: &Ipv6Addr) -> String {
    format!(
        "{}:{}:{}:{}:{}",
        structure.block_len, structure.node_len, structure.func_len, structure.arg_len, sid
    )
}

impl ValidLocalSid {
    pub fn key(&self) -> String {
        local_sid_key(&self.structure, &self.sid)
    }

    /// Project into the key and hash fields written to APPL_DB
    pub fn to_record(&self) -> LocalSidRecord {
        let mut fields = vec![("action", self.behavior.action().to_string())];

        match &self.behavior {
            LocalSidBehavior::Endpoint(_) => {}
            LocalSidBehavior::Adjacency { adj, .. } => fields.push(("adj", adj.to_string())),
            LocalSidBehavior::Vrf { vrf, .. } => fields.push(("vrf", vrf.clone())),
        }

        LocalSidRecord {
            key: self.key(),
            fields,
        }
    }
}
