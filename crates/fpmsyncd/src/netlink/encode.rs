//! Encoder for SRv6 Local SID messages
//!
//! Produces the same bytes the routing stack sends over FPM. Used to
//! synthesize events in tests and tooling.

use super::{
    AF_INET, AF_INET6, NLMSG_HDRLEN, RTM_DELSRV6LOCALSID, RTM_NEWSRV6LOCALSID, RTMSG_LEN,
    format_attr, localsid_attr,
};
use crate::types::{Action, RawSidStructure};
use netlink_packet_core::NetlinkBuffer;
use netlink_packet_utils::nla::Nla;
use netlink_packet_utils::traits::Emitable;
use std::net::IpAddr;

/// Wrap `payload` in a netlink header of type `msg_type`
pub fn netlink_message(msg_type: u16, payload: &[u8]) -> Vec<u8> {
    let len = NLMSG_HDRLEN + payload.len();
    let mut buf = vec![0u8; len];

    let mut nl = NetlinkBuffer::new(&mut buf[..]);
    nl.set_length(len as u32);
    nl.set_message_type(msg_type);
    nl.set_flags(0);
    nl.set_sequence_number(0);
    nl.set_port_number(0);

    buf[NLMSG_HDRLEN..].copy_from_slice(payload);
    buf
}

enum FormatAttr {
    BlockLen(u8),
    NodeLen(u8),
    FuncLen(u8),
    ArgLen(u8),
}

impl Nla for FormatAttr {
    fn value_len(&self) -> usize {
        1
    }

    fn kind(&self) -> u16 {
        match self {
            Self::BlockLen(_) => format_attr::BLOCK_LEN,
            Self::NodeLen(_) => format_attr::NODE_LEN,
            Self::FuncLen(_) => format_attr::FUNC_LEN,
            Self::ArgLen(_) => format_attr::ARG_LEN,
        }
    }

    fn emit_value(&self, buffer: &mut [u8]) {
        let (Self::BlockLen(v) | Self::NodeLen(v) | Self::FuncLen(v) | Self::ArgLen(v)) = self;
        buffer[0] = *v;
    }
}

enum LocalSidAttr {
    SidValue(IpAddr),
    Format(Vec<FormatAttr>),
    Action(u32),
    VrfName(String),
    Nexthop(IpAddr),
}

fn ip_octets(addr: &IpAddr) -> Vec<u8> {
    match addr {
        IpAddr::V4(v4) => v4.octets().to_vec(),
        IpAddr::V6(v6) => v6.octets().to_vec(),
    }
}

impl Nla for LocalSidAttr {
    fn value_len(&self) -> usize {
        match self {
            Self::SidValue(addr) | Self::Nexthop(addr) => ip_octets(addr).len(),
            Self::Format(nested) => nested.as_slice().buffer_len(),
            Self::Action(_) => 4,
            Self::VrfName(name) => name.len() + 1,
        }
    }

    fn kind(&self) -> u16 {
        match self {
            Self::SidValue(_) => localsid_attr::SID_VALUE,
            Self::Format(_) => localsid_attr::FORMAT,
            Self::Action(_) => localsid_attr::ACTION,
            Self::VrfName(_) => localsid_attr::VRFNAME,
            Self::Nexthop(IpAddr::V4(_)) => localsid_attr::NH4,
            Self::Nexthop(IpAddr::V6(_)) => localsid_attr::NH6,
        }
    }

    fn emit_value(&self, buffer: &mut [u8]) {
        match self {
            Self::SidValue(addr) | Self::Nexthop(addr) => {
                let octets = ip_octets(addr);
                buffer[..octets.len()].copy_from_slice(&octets);
            }
            Self::Format(nested) => nested.as_slice().emit(buffer),
            Self::Action(code) => buffer[..4].copy_from_slice(&code.to_ne_bytes()),
            Self::VrfName(name) => {
                buffer[..name.len()].copy_from_slice(name.as_bytes());
                buffer[name.len()] = 0;
            }
        }
    }

    fn is_nested(&self) -> bool {
        matches!(self, Self::Format(_))
    }
}

/// Builder for one Local SID add/delete message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSidMessage {
    pub msg_type: u16,
    pub family: u8,
    pub prefix_len: u8,
    pub sid: Option<IpAddr>,
    pub structure: RawSidStructure,
    pub action: Option<u32>,
    pub vrf: Option<String>,
    pub nexthops: Vec<IpAddr>,
}

impl LocalSidMessage {
    /// Message carrying `sid` as a host prefix of its own family
    pub fn new(msg_type: u16, sid: IpAddr) -> Self {
        let (family, prefix_len) = match sid {
            IpAddr::V4(_) => (AF_INET, 32),
            IpAddr::V6(_) => (AF_INET6, 128),
        };

        Self {
            msg_type,
            family,
            prefix_len,
            sid: Some(sid),
            structure: RawSidStructure::default(),
            action: None,
            vrf: None,
            nexthops: Vec::new(),
        }
    }

    pub fn add(sid: IpAddr) -> Self {
        Self::new(RTM_NEWSRV6LOCALSID, sid)
    }

    pub fn delete(sid: IpAddr) -> Self {
        Self::new(RTM_DELSRV6LOCALSID, sid)
    }

    pub fn structure(mut self, structure: RawSidStructure) -> Self {
        self.structure = structure;
        self
    }

    pub fn action(self, action: Action) -> Self {
        self.action_code(action.code())
    }

    pub fn action_code(mut self, code: u32) -> Self {
        self.action = Some(code);
        self
    }

    pub fn vrf(mut self, vrf: impl Into<String>) -> Self {
        self.vrf = Some(vrf.into());
        self
    }

    /// Add an NH4 or NH6 attribute; repeat to carry both
    pub fn adjacency(mut self, adj: IpAddr) -> Self {
        self.nexthops.push(adj);
        self
    }

    pub fn family(mut self, family: u8) -> Self {
        self.family = family;
        self
    }

    pub fn prefix_len(mut self, prefix_len: u8) -> Self {
        self.prefix_len = prefix_len;
        self
    }

    pub fn without_sid(mut self) -> Self {
        self.sid = None;
        self
    }

    fn attributes(&self) -> Vec<LocalSidAttr> {
        let mut attrs = Vec::new();

        if let Some(sid) = self.sid {
            attrs.push(LocalSidAttr::SidValue(sid));
        }

        let s = &self.structure;
        let format: Vec<FormatAttr> = [
            s.block_len.map(FormatAttr::BlockLen),
            s.node_len.map(FormatAttr::NodeLen),
            s.func_len.map(FormatAttr::FuncLen),
            s.arg_len.map(FormatAttr::ArgLen),
        ]
        .into_iter()
        .flatten()
        .collect();
        if !format.is_empty() {
            attrs.push(LocalSidAttr::Format(format));
        }

        if let Some(code) = self.action {
            attrs.push(LocalSidAttr::Action(code));
        }
        if let Some(vrf) = &self.vrf {
            attrs.push(LocalSidAttr::VrfName(vrf.clone()));
        }
        attrs.extend(self.nexthops.iter().copied().map(LocalSidAttr::Nexthop));

        attrs
    }

    /// Serialize to a complete netlink message
    pub fn to_bytes(&self) -> Vec<u8> {
        let attrs = self.attributes();
        let mut payload = vec![0u8; RTMSG_LEN + attrs.as_slice().buffer_len()];

        payload[0] = self.family;
        payload[1] = self.prefix_len;
        attrs.as_slice().emit(&mut payload[RTMSG_LEN..]);

        netlink_message(self.msg_type, &payload)
    }
}
