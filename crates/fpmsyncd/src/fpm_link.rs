//! FPM link layer
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - SC-7: Boundary Protection - Single routing stack session on a local port
//! - SC-5: Denial of Service Protection - Bounded frames, bad framing ends the session
//! - AU-12: Audit Record Generation - Session lifecycle logged
//!
//! Every FPM frame starts with a 4-byte header:
//!
//! ```text
//! 0        1        2                 4
//! +--------+--------+-----------------+------------------
//! | version| type   | length (BE u16) | payload ...
//! +--------+--------+-----------------+------------------
//! ```
//!
//! `length` counts the header. A netlink frame may pack several netlink
//! messages, each handed to [`RouteSync`] in order.

use crate::error::{FpmsyncError, Result};
use crate::netlink::NetlinkMessages;
use crate::route_sync::{RouteHandler, RouteSync};
use crate::store::LocalSidTable;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use futures::StreamExt;
use std::net::SocketAddr;
use tokio::io::AsyncRead;
use tokio::net::TcpListener;
use tokio_util::codec::{Decoder, Encoder, FramedRead};
use tracing::{debug, info, instrument, warn};

pub const FPM_PROTO_VERSION: u8 = 1;
pub const FPM_MSG_TYPE_NETLINK: u8 = 1;
pub const FPM_MSG_TYPE_PROTOBUF: u8 = 2;
pub const FPM_MSG_HDR_LEN: usize = 4;
pub const FPM_MAX_MSG_LEN: usize = u16::MAX as usize;

/// Port zebra's FPM module connects to
pub const FPM_DEFAULT_PORT: u16 = 2620;

/// One FPM frame, header stripped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FpmFrame {
    pub msg_type: u8,
    pub payload: Bytes,
}

impl FpmFrame {
    pub fn netlink(payload: impl Into<Bytes>) -> Self {
        Self {
            msg_type: FPM_MSG_TYPE_NETLINK,
            payload: payload.into(),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FpmCodec;

impl Decoder for FpmCodec {
    type Item = FpmFrame;
    type Error = FpmsyncError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<FpmFrame>> {
        if src.len() < FPM_MSG_HDR_LEN {
            return Ok(None);
        }

        let version = src[0];
        if version != FPM_PROTO_VERSION {
            return Err(FpmsyncError::Fpm(format!(
                "unsupported protocol version {}",
                version
            )));
        }

        let msg_type = src[1];
        let len = usize::from(u16::from_be_bytes([src[2], src[3]]));
        if len < FPM_MSG_HDR_LEN {
            return Err(FpmsyncError::Fpm(format!("frame length {} below header", len)));
        }

        if src.len() < len {
            src.reserve(len - src.len());
            return Ok(None);
        }

        let mut frame = src.split_to(len);
        frame.advance(FPM_MSG_HDR_LEN);
        Ok(Some(FpmFrame {
            msg_type,
            payload: frame.freeze(),
        }))
    }
}

impl Encoder<FpmFrame> for FpmCodec {
    type Error = FpmsyncError;

    fn encode(&mut self, frame: FpmFrame, dst: &mut BytesMut) -> Result<()> {
        let len = FPM_MSG_HDR_LEN + frame.payload.len();
        let len = u16::try_from(len)
            .map_err(|_| FpmsyncError::Fpm(format!("frame of {} bytes too large", len)))?;

        dst.reserve(usize::from(len));
        dst.put_u8(FPM_PROTO_VERSION);
        dst.put_u8(frame.msg_type);
        dst.put_u16(len);
        dst.extend_from_slice(&frame.payload);
        Ok(())
    }
}

/// Counters for one FPM session
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub frames: u64,
    pub messages: u64,
    pub store_errors: u64,
}

/// Feed every netlink message read from `stream` to `sync`
///
/// Returns when the peer closes the stream, or with an error on a framing
/// violation. A table error drops that one message (the engine logs its
/// key) and the session moves on to the next.
///
/// # NIST Controls
/// - SI-10: Information Input Validation - Reject malformed frames
pub async fn run_session<S, T, R>(stream: S, sync: &mut RouteSync<T, R>) -> Result<SessionStats>
where
    S: AsyncRead + Unpin,
    T: LocalSidTable,
    R: RouteHandler,
{
    let mut frames = FramedRead::new(stream, FpmCodec);
    let mut stats = SessionStats::default();

    while let Some(frame) = frames.next().await {
        let frame = frame?;
        stats.frames += 1;

        if frame.msg_type != FPM_MSG_TYPE_NETLINK {
            debug!(msg_type = frame.msg_type, "Skipping non-netlink FPM frame");
            continue;
        }

        for msg in NetlinkMessages::new(&frame.payload) {
            let (msg_type, msg) = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    warn!(error = %e, "Dropping rest of malformed netlink frame");
                    break;
                }
            };

            stats.messages += 1;
            if let Err(e) = sync.on_msg(msg).await {
                stats.store_errors += 1;
                debug!(msg_type, error = %e, "Netlink message not applied");
            }
        }
    }

    Ok(stats)
}

/// TCP listener accepting one FPM client at a time
pub struct FpmServer {
    listener: TcpListener,
}

impl FpmServer {
    #[instrument]
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "Listening for FPM connections");
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept one client and run its session to completion
    ///
    /// Only accept failures are returned. A session ended by a framing
    /// error is logged and yields `None`.
    ///
    /// # NIST Controls
    /// - AC-17: Remote Access - Session establishment logged
    pub async fn serve_one<T, R>(&self, sync: &mut RouteSync<T, R>) -> Result<Option<SessionStats>>
    where
        T: LocalSidTable,
        R: RouteHandler,
    {
        let (stream, peer) = self.listener.accept().await?;
        info!(peer = %peer, "FPM client connected");

        match run_session(stream, sync).await {
            Ok(stats) => {
                info!(
                    peer = %peer,
                    frames = stats.frames,
                    messages = stats.messages,
                    store_errors = stats.store_errors,
                    "FPM client disconnected"
                );
                Ok(Some(stats))
            }
            Err(e) => {
                warn!(peer = %peer, error = %e, "FPM session terminated");
                Ok(None)
            }
        }
    }

    /// Serve clients one after another until accepting fails
    pub async fn serve<T, R>(&self, sync: &mut RouteSync<T, R>) -> Result<()>
    where
        T: LocalSidTable,
        R: RouteHandler,
    {
        loop {
            self.serve_one(sync).await?;
        }
    }
}
