//! Attribute decoder for SRv6 Local SID messages

use super::{NLMSG_HDRLEN, RTMSG_LEN, format_attr, localsid_attr};
use crate::error::DecodeError;
use crate::types::{LocalSidCandidate, RawSidStructure};
use netlink_packet_core::NetlinkBuffer;
use netlink_packet_utils::nla::NlasIterator;
use netlink_packet_utils::parsers::{parse_ip, parse_string, parse_u8, parse_u32};
use std::net::{Ipv4Addr, Ipv6Addr};
use tracing::trace;

/// Decode one `RTM_NEWSRV6LOCALSID`/`RTM_DELSRV6LOCALSID` message
///
/// `msg` holds the whole netlink message, header included. No semantic
/// checks happen here: an IPv4 SID or an out-of-range action still decodes.
pub fn decode_local_sid(msg: &[u8]) -> Result<LocalSidCandidate, DecodeError> {
    let nl = NetlinkBuffer::new_checked(msg).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    let payload = nl.payload();

    if payload.len() < RTMSG_LEN {
        return Err(DecodeError::Truncated {
            expected: NLMSG_HDRLEN + RTMSG_LEN,
            actual: msg.len(),
        });
    }

    let family = payload[0];
    let prefix_len = payload[1];

    let mut sid = None;
    let mut structure = RawSidStructure::default();
    let mut action = None;
    let mut nh4 = None;
    let mut nh6 = None;
    let mut vrf = None;

    for nla in NlasIterator::new(&payload[RTMSG_LEN..]) {
        let nla = nla.map_err(|e| DecodeError::Malformed(e.to_string()))?;
        let kind = nla.kind();
        let value = nla.value();

        match kind {
            localsid_attr::SID_VALUE => {
                sid = Some(parse_ip(value).map_err(|e| invalid(kind, e))?);
            }
            localsid_attr::FORMAT => {
                structure = decode_format(value)?;
            }
            localsid_attr::ACTION => {
                action = Some(parse_u32(value).map_err(|e| invalid(kind, e))?);
            }
            localsid_attr::VRFNAME => {
                vrf = Some(parse_string(value).map_err(|e| invalid(kind, e))?);
            }
            localsid_attr::NH6 => {
                let octets = <[u8; 16]>::try_from(value)
                    .map_err(|_| invalid(kind, format!("expected 16 bytes, got {}", value.len())))?;
                nh6 = Some(Ipv6Addr::from(octets));
            }
            localsid_attr::NH4 => {
                let octets = <[u8; 4]>::try_from(value)
                    .map_err(|_| invalid(kind, format!("expected 4 bytes, got {}", value.len())))?;
                nh4 = Some(Ipv4Addr::from(octets));
            }
            _ => trace!(kind, "Skipping unknown Local SID attribute"),
        }
    }

    Ok(LocalSidCandidate {
        family,
        prefix_len,
        sid: sid.ok_or(DecodeError::MissingAddress)?,
        structure,
        action: action.ok_or(DecodeError::MissingAction)?,
        nh4,
        nh6,
        vrf,
    })
}

/// Decode the nested `SRV6_LOCALSID_FORMAT` attribute
///
/// Lengths missing from the nest stay `None`; the resolver decides what
/// that means.
fn decode_format(buf: &[u8]) -> Result<RawSidStructure, DecodeError> {
    let mut structure = RawSidStructure::default();

    for nla in NlasIterator::new(buf) {
        let nla = nla.map_err(|e| DecodeError::Malformed(e.to_string()))?;
        let kind = nla.kind();
        let len = Some(parse_u8(nla.value()).map_err(|e| invalid(kind, e))?);

        match kind {
            format_attr::BLOCK_LEN => structure.block_len = len,
            format_attr::NODE_LEN => structure.node_len = len,
            format_attr::FUNC_LEN => structure.func_len = len,
            format_attr::ARG_LEN => structure.arg_len = len,
            _ => trace!(kind, "Skipping unknown SID format attribute"),
        }
    }

    Ok(structure)
}

fn invalid(kind: u16, reason: impl ToString) -> DecodeError {
    DecodeError::InvalidAttribute {
        kind,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::{AF_INET, AF_INET6, LocalSidMessage, RTM_NEWSRV6LOCALSID, netlink_message};
    use crate::types::Action;

    use std::net::IpAddr;

    fn sid() -> IpAddr {
        "fc00:0:1:1::".parse().unwrap()
    }

    #[test]
    fn test_decode_full_message() {
        let msg = LocalSidMessage::add(sid())
            .structure(RawSidStructure::new(32, 16, 16, 0))
            .action(Action::EndX)
            .adjacency("2001:db8:1::1".parse().unwrap())
            .to_bytes();

        let candidate = decode_local_sid(&msg).unwrap();
        assert_eq!(candidate.family, AF_INET6);
        assert_eq!(candidate.prefix_len, 128);
        assert_eq!(candidate.sid, sid());
        assert_eq!(candidate.structure, RawSidStructure::new(32, 16, 16, 0));
        assert_eq!(candidate.action, Action::EndX.code());
        assert_eq!(candidate.nh6, Some("2001:db8:1::1".parse().unwrap()));
        assert_eq!(candidate.nh4, None);
        assert_eq!(candidate.vrf, None);
    }

    #[test]
    fn test_decode_vrf_and_ipv4_adjacency() {
        let msg = LocalSidMessage::add(sid())
            .action(Action::EndDx4)
            .adjacency("10.0.0.1".parse().unwrap())
            .vrf("Vrf10")
            .to_bytes();

        let candidate = decode_local_sid(&msg).unwrap();
        assert_eq!(candidate.nh4, Some("10.0.0.1".parse().unwrap()));
        assert_eq!(candidate.vrf.as_deref(), Some("Vrf10"));
        assert!(candidate.structure.is_empty());
    }

    #[test]
    fn test_decode_both_nexthops() {
        let msg = LocalSidMessage::add(sid())
            .action(Action::EndX)
            .adjacency("2001:db8:1::1".parse().unwrap())
            .adjacency("10.0.0.1".parse().unwrap())
            .to_bytes();

        let candidate = decode_local_sid(&msg).unwrap();
        assert_eq!(candidate.nh6, Some("2001:db8:1::1".parse().unwrap()));
        assert_eq!(candidate.nh4, Some("10.0.0.1".parse().unwrap()));
    }

    #[test]
    fn test_decode_partial_structure() {
        let structure = RawSidStructure {
            block_len: Some(32),
            node_len: None,
            func_len: Some(16),
            arg_len: None,
        };
        let msg = LocalSidMessage::add(sid())
            .structure(structure)
            .action(Action::End)
            .to_bytes();

        assert_eq!(decode_local_sid(&msg).unwrap().structure, structure);
    }

    #[test]
    fn test_decode_ipv4_sid() {
        let msg = LocalSidMessage::add("10.0.0.1".parse().unwrap())
            .action(Action::End)
            .to_bytes();

        let candidate = decode_local_sid(&msg).unwrap();
        assert_eq!(candidate.family, AF_INET);
        assert_eq!(candidate.sid, "10.0.0.1".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_decode_missing_address() {
        let msg = LocalSidMessage::add(sid())
            .without_sid()
            .action(Action::End)
            .to_bytes();
        assert_eq!(decode_local_sid(&msg), Err(DecodeError::MissingAddress));
    }

    #[test]
    fn test_decode_missing_action() {
        let msg = LocalSidMessage::add(sid()).to_bytes();
        assert_eq!(decode_local_sid(&msg), Err(DecodeError::MissingAction));
    }

    #[test]
    fn test_decode_truncated_rtmsg() {
        let msg = netlink_message(RTM_NEWSRV6LOCALSID, &[AF_INET6, 128, 0, 0]);
        assert!(matches!(
            decode_local_sid(&msg),
            Err(DecodeError::Truncated { .. })
        ));
    }

    #[test]
    fn test_decode_bad_tlv_framing() {
        let mut payload = vec![0u8; RTMSG_LEN];
        // rtattr claiming 64 bytes with only 4 present
        payload.extend_from_slice(&64u16.to_ne_bytes());
        payload.extend_from_slice(&localsid_attr::ACTION.to_ne_bytes());
        let msg = netlink_message(RTM_NEWSRV6LOCALSID, &payload);

        assert!(matches!(
            decode_local_sid(&msg),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_short_action() {
        let mut payload = vec![AF_INET6, 128, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        payload.extend_from_slice(&6u16.to_ne_bytes());
        payload.extend_from_slice(&localsid_attr::ACTION.to_ne_bytes());
        payload.extend_from_slice(&[1, 0, 0, 0]);
        let msg = netlink_message(RTM_NEWSRV6LOCALSID, &payload);

        assert!(matches!(
            decode_local_sid(&msg),
            Err(DecodeError::InvalidAttribute {
                kind: localsid_attr::ACTION,
                ..
            })
        ));
    }
}
