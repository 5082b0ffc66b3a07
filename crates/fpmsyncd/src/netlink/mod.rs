//! Netlink wire format for FPM route and SRv6 Local SID messages
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - SC-7: Boundary Protection - Parse routing stack messages at the boundary
//! - SI-10: Information Input Validation - Bounds-checked TLV parsing
//!
//! A message is a 16-byte `nlmsghdr`, a 12-byte `rtmsg`, then 4-byte
//! aligned `rtattr` TLVs. Header fields are native endian.

mod decode;
mod encode;

pub use decode::decode_local_sid;
pub use encode::{LocalSidMessage, netlink_message};

use crate::error::DecodeError;
use netlink_packet_core::NetlinkBuffer;

/// Size of `struct nlmsghdr`
pub const NLMSG_HDRLEN: usize = 16;
/// Size of `struct rtmsg`
pub const RTMSG_LEN: usize = 12;

pub const AF_INET: u8 = 2;
pub const AF_INET6: u8 = 10;

pub const RTM_NEWROUTE: u16 = 24;
pub const RTM_DELROUTE: u16 = 25;
pub const RTM_NEWNEXTHOP: u16 = 104;
pub const RTM_DELNEXTHOP: u16 = 105;
pub const RTM_NEWSRV6LOCALSID: u16 = 1000;
pub const RTM_DELSRV6LOCALSID: u16 = 1001;

/// Top-level Local SID attributes (`SRV6_LOCALSID_*`)
pub mod localsid_attr {
    pub const SID_VALUE: u16 = 1;
    pub const FORMAT: u16 = 2;
    pub const ACTION: u16 = 3;
    pub const VRFNAME: u16 = 4;
    pub const NH6: u16 = 5;
    pub const NH4: u16 = 6;
}

/// Attributes nested in `SRV6_LOCALSID_FORMAT`
pub mod format_attr {
    pub const BLOCK_LEN: u16 = 1;
    pub const NODE_LEN: u16 = 2;
    pub const FUNC_LEN: u16 = 3;
    pub const ARG_LEN: u16 = 4;
}

/// Round up to the 4-byte netlink alignment
#[inline]
pub const fn nlmsg_align(len: usize) -> usize {
    (len + 3) & !3
}

/// Iterator over the netlink messages packed in one buffer
///
/// Yields `(message type, full message bytes)`. Stops after the first
/// framing error.
pub struct NetlinkMessages<'a> {
    buf: &'a [u8],
    failed: bool,
}

impl<'a> NetlinkMessages<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, failed: false }
    }
}

impl<'a> Iterator for NetlinkMessages<'a> {
    type Item = Result<(u16, &'a [u8]), DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.buf.is_empty() {
            return None;
        }

        let nl = match NetlinkBuffer::new_checked(self.buf) {
            Ok(nl) => nl,
            Err(e) => {
                self.failed = true;
                return Some(Err(DecodeError::Malformed(e.to_string())));
            }
        };

        let len = nl.length() as usize;
        let msg_type = nl.message_type();
        let msg = &self.buf[..len];

        let next = nlmsg_align(len);
        self.buf = if next >= self.buf.len() {
            &[]
        } else {
            &self.buf[next..]
        };

        Some(Ok((msg_type, msg)))
    }
}

/// Read the message type of a single netlink message
pub fn message_type(msg: &[u8]) -> Result<u16, DecodeError> {
    NetlinkBuffer::new_checked(msg)
        .map(|nl| nl.message_type())
        .map_err(|e| DecodeError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nlmsg_align() {
        assert_eq!(nlmsg_align(0), 0);
        assert_eq!(nlmsg_align(1), 4);
        assert_eq!(nlmsg_align(28), 28);
        assert_eq!(nlmsg_align(29), 32);
    }

    #[test]
    fn test_split_multiple_messages() {
        let mut buf = netlink_message(RTM_NEWROUTE, &[0u8; 13]);
        buf.resize(nlmsg_align(buf.len()), 0);
        buf.extend(netlink_message(RTM_DELROUTE, &[0u8; 12]));

        let types: Vec<u16> = NetlinkMessages::new(&buf)
            .map(|m| m.map(|(t, _)| t))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(types, vec![RTM_NEWROUTE, RTM_DELROUTE]);
    }

    #[test]
    fn test_split_stops_on_truncated_message() {
        let mut buf = netlink_message(RTM_NEWROUTE, &[0u8; 12]);
        buf.extend_from_slice(&[0xff, 0x00]);

        let mut msgs = NetlinkMessages::new(&buf);
        assert!(matches!(msgs.next(), Some(Ok((RTM_NEWROUTE, _)))));
        assert!(matches!(msgs.next(), Some(Err(DecodeError::Malformed(_)))));
        assert!(msgs.next().is_none());
    }

    #[test]
    fn test_message_type() {
        let msg = netlink_message(RTM_NEWSRV6LOCALSID, &[0u8; RTMSG_LEN]);
        assert_eq!(message_type(&msg).unwrap(), RTM_NEWSRV6LOCALSID);
        assert!(message_type(&msg[..8]).is_err());
    }
}
