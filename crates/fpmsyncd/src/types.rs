//! Core types for SRv6 Local SID synchronization
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - CM-8: System Component Inventory - Local SIDs as forwarding-plane state
//! - SI-10: Information Input Validation - Typed records instead of raw codes

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Wire code of the unspecified action
pub const ACTION_UNSPEC: u32 = 0;

/// SRv6 endpoint behaviors programmed through APPL_DB
///
/// Codes not listed here (including `ACTION_UNSPEC`) have no `Action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    End,
    EndX,
    EndT,
    EndDx6,
    EndDx4,
    EndDt4,
    EndDt6,
    EndDt46,
    Un,
    Ua,
    Udx6,
    Udx4,
    Udt4,
    Udt6,
    Udt46,
}

/// Companion data an action needs besides the SID itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Companion {
    None,
    /// Nexthop address; `true` when it must be IPv4
    Adjacency { ipv4: bool },
    Vrf,
}

impl Action {
    pub const ALL: [Action; 15] = [
        Action::End,
        Action::EndX,
        Action::EndT,
        Action::EndDx6,
        Action::EndDx4,
        Action::EndDt4,
        Action::EndDt6,
        Action::EndDt46,
        Action::Un,
        Action::Ua,
        Action::Udx6,
        Action::Udx4,
        Action::Udt4,
        Action::Udt6,
        Action::Udt46,
    ];

    /// Map a `SRV6_LOCALSID_ACTION` value
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::End),
            2 => Some(Self::EndX),
            3 => Some(Self::EndT),
            5 => Some(Self::EndDx6),
            6 => Some(Self::EndDx4),
            7 => Some(Self::EndDt6),
            8 => Some(Self::EndDt4),
            9 => Some(Self::EndDt46),
            14 => Some(Self::Un),
            15 => Some(Self::Ua),
            17 => Some(Self::Udx6),
            18 => Some(Self::Udx4),
            19 => Some(Self::Udt6),
            20 => Some(Self::Udt4),
            21 => Some(Self::Udt46),
            _ => None,
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            Self::End => 1,
            Self::EndX => 2,
            Self::EndT => 3,
            Self::EndDx6 => 5,
            Self::EndDx4 => 6,
            Self::EndDt6 => 7,
            Self::EndDt4 => 8,
            Self::EndDt46 => 9,
            Self::Un => 14,
            Self::Ua => 15,
            Self::Udx6 => 17,
            Self::Udx4 => 18,
            Self::Udt6 => 19,
            Self::Udt4 => 20,
            Self::Udt46 => 21,
        }
    }

    /// Value stored in the `action` field of SRV6_MY_SID_TABLE
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::End => "end",
            Self::EndX => "end.x",
            Self::EndT => "end.t",
            Self::EndDx6 => "end.dx6",
            Self::EndDx4 => "end.dx4",
            Self::EndDt4 => "end.dt4",
            Self::EndDt6 => "end.dt6",
            Self::EndDt46 => "end.dt46",
            Self::Un => "un",
            Self::Ua => "ua",
            Self::Udx6 => "udx6",
            Self::Udx4 => "udx4",
            Self::Udt4 => "udt4",
            Self::Udt6 => "udt6",
            Self::Udt46 => "udt46",
        }
    }

    pub fn companion(&self) -> Companion {
        match self {
            Self::End | Self::Un => Companion::None,
            Self::EndDx4 | Self::Udx4 => Companion::Adjacency { ipv4: true },
            Self::EndX | Self::EndDx6 | Self::Ua | Self::Udx6 => {
                Companion::Adjacency { ipv4: false }
            }
            Self::EndT
            | Self::EndDt4
            | Self::EndDt6
            | Self::EndDt46
            | Self::Udt4
            | Self::Udt6
            | Self::Udt46 => Companion::Vrf,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SID structure lengths as they arrived on the wire
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawSidStructure {
    pub block_len: Option<u8>,
    pub node_len: Option<u8>,
    pub func_len: Option<u8>,
    pub arg_len: Option<u8>,
}

impl RawSidStructure {
    /// All four lengths present
    pub fn new(block_len: u8, node_len: u8, func_len: u8, arg_len: u8) -> Self {
        Self {
            block_len: Some(block_len),
            node_len: Some(node_len),
            func_len: Some(func_len),
            arg_len: Some(arg_len),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.block_len.is_none()
            && self.node_len.is_none()
            && self.func_len.is_none()
            && self.arg_len.is_none()
    }
}

/// Bit partition of a Local SID (locator block, node, function, argument)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SidStructure {
    pub block_len: u8,
    pub node_len: u8,
    pub func_len: u8,
    pub arg_len: u8,
}

impl SidStructure {
    /// Structure assumed when the sender omits it
    pub const DEFAULT: Self = Self {
        block_len: 32,
        node_len: 16,
        func_len: 16,
        arg_len: 0,
    };

    pub fn total_len(&self) -> u32 {
        u32::from(self.block_len)
            + u32::from(self.node_len)
            + u32::from(self.func_len)
            + u32::from(self.arg_len)
    }
}

impl Default for SidStructure {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Decoded, unvalidated Local SID message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSidCandidate {
    /// `rtmsg.family`
    pub family: u8,
    /// `rtmsg.dst_len`
    pub prefix_len: u8,
    pub sid: IpAddr,
    pub structure: RawSidStructure,
    /// Raw action code, mapped by the validator
    pub action: u32,
    /// `SRV6_LOCALSID_NH4`
    pub nh4: Option<Ipv4Addr>,
    /// `SRV6_LOCALSID_NH6`
    pub nh6: Option<Ipv6Addr>,
    pub vrf: Option<String>,
}

/// Action together with exactly the companion data it needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalSidBehavior {
    /// END, uN
    Endpoint(Action),
    /// End.X, End.DX4/6, uA, uDX4/6
    Adjacency { action: Action, adj: IpAddr },
    /// End.T, End.DT4/6/46, uDT4/6/46
    Vrf { action: Action, vrf: String },
}

impl LocalSidBehavior {
    pub fn action(&self) -> Action {
        match self {
            Self::Endpoint(action)
            | Self::Adjacency { action, .. }
            | Self::Vrf { action, .. } => *action,
        }
    }
}

/// Local SID that passed every check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidLocalSid {
    pub sid: Ipv6Addr,
    pub structure: SidStructure,
    pub behavior: LocalSidBehavior,
}

/// Store-ready projection: SRV6_MY_SID_TABLE key and hash fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSidRecord {
    pub key: String,
    pub fields: Vec<(&'static str, String)>,
}

impl LocalSidRecord {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value.as_str())
    }
}
