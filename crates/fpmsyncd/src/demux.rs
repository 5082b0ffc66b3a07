//! Message demultiplexer
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - SC-7: Boundary Protection - Only known message types reach a pipeline
//! - SI-10: Information Input Validation - Unknown types dropped, not parsed

use crate::netlink::{
    RTM_DELNEXTHOP, RTM_DELROUTE, RTM_DELSRV6LOCALSID, RTM_NEWNEXTHOP, RTM_NEWROUTE,
    RTM_NEWSRV6LOCALSID,
};

/// Where a netlink message goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageClass {
    Srv6LocalSidAdd,
    Srv6LocalSidDelete,
    /// Routes and nexthop groups for the generic route pipeline
    GenericRoute,
    Unrecognized,
}

impl MessageClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Srv6LocalSidAdd => "srv6_localsid_add",
            Self::Srv6LocalSidDelete => "srv6_localsid_delete",
            Self::GenericRoute => "generic_route",
            Self::Unrecognized => "unrecognized",
        }
    }
}

pub fn classify(msg_type: u16) -> MessageClass {
    match msg_type {
        RTM_NEWSRV6LOCALSID => MessageClass::Srv6LocalSidAdd,
        RTM_DELSRV6LOCALSID => MessageClass::Srv6LocalSidDelete,
        RTM_NEWROUTE | RTM_DELROUTE | RTM_NEWNEXTHOP | RTM_DELNEXTHOP => MessageClass::GenericRoute,
        _ => MessageClass::Unrecognized,
    }
}

/// Whether `msg_type` bypasses the generic route pipeline
///
/// True exactly for the SRv6 Local SID add/delete types, which are
/// decoded from raw bytes instead of the route object cache.
pub fn is_raw_processing(msg_type: u16) -> bool {
    matches!(
        classify(msg_type),
        MessageClass::Srv6LocalSidAdd | MessageClass::Srv6LocalSidDelete
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify(RTM_NEWSRV6LOCALSID), MessageClass::Srv6LocalSidAdd);
        assert_eq!(classify(RTM_DELSRV6LOCALSID), MessageClass::Srv6LocalSidDelete);
        assert_eq!(classify(RTM_NEWROUTE), MessageClass::GenericRoute);
        assert_eq!(classify(RTM_DELNEXTHOP), MessageClass::GenericRoute);
        assert_eq!(classify(16), MessageClass::Unrecognized);
        assert_eq!(classify(1002), MessageClass::Unrecognized);
    }

    #[test]
    fn test_raw_processing() {
        assert!(is_raw_processing(RTM_NEWSRV6LOCALSID));
        assert!(is_raw_processing(RTM_DELSRV6LOCALSID));
        assert!(!is_raw_processing(RTM_NEWROUTE));
        assert!(!is_raw_processing(RTM_NEWNEXTHOP));
        assert!(!is_raw_processing(0));
    }
}
