//! Integration tests for the FPM link layer
//!
//! Frames are produced with FpmCodec and read back through run_session,
//! over mock IO, an in-process duplex pipe and a loopback TCP connection.

#[cfg(test)]
mod tests {
    use bytes::{Bytes, BytesMut};
    use futures::SinkExt;
    use sonic_fpmsyncd::fpm_link::FPM_MSG_TYPE_PROTOBUF;
    use sonic_fpmsyncd::netlink::{RTM_NEWROUTE, netlink_message, nlmsg_align};
    use sonic_fpmsyncd::{
        Action, FpmCodec, FpmFrame, FpmServer, FpmsyncError, LocalSidMessage, LocalSidTable,
        MemoryTable, RawSidStructure, Result, RouteSync, SessionStats, run_session,
    };
    use std::net::IpAddr;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpStream;
    use tokio_util::codec::{Encoder, FramedWrite};

    fn ip(s: &str) -> IpAddr {
        s.parse().expect("valid IP")
    }

    fn add(sid: &str, action: Action) -> Vec<u8> {
        LocalSidMessage::add(ip(sid))
            .structure(RawSidStructure::new(32, 16, 16, 0))
            .action(action)
            .to_bytes()
    }

    fn del(sid: &str, action: Action) -> Vec<u8> {
        LocalSidMessage::delete(ip(sid))
            .structure(RawSidStructure::new(32, 16, 16, 0))
            .action(action)
            .to_bytes()
    }

    /// Several netlink messages packed into one frame payload
    fn pack(msgs: &[Vec<u8>]) -> Vec<u8> {
        let mut buf = Vec::new();
        for msg in msgs {
            buf.extend_from_slice(msg);
            buf.resize(nlmsg_align(buf.len()), 0);
        }
        buf
    }

    fn encode(frames: Vec<FpmFrame>) -> BytesMut {
        let mut buf = BytesMut::new();
        for frame in frames {
            FpmCodec.encode(frame, &mut buf).expect("frame fits");
        }
        buf
    }

    #[tokio::test]
    async fn test_session_applies_messages_in_order() {
        let wire = encode(vec![
            FpmFrame::netlink(add("fc00:0:1:1::", Action::End)),
            FpmFrame::netlink(pack(&[
                add("fc00:0:1:2::", Action::Un),
                del("fc00:0:1:1::", Action::End),
            ])),
        ]);
        let stream = tokio_test::io::Builder::new().read(&wire).build();

        let mut sync = RouteSync::new(MemoryTable::new()).unwrap();
        let stats = run_session(stream, &mut sync).await.unwrap();

        assert_eq!(
            stats,
            SessionStats {
                frames: 2,
                messages: 3,
                store_errors: 0
            }
        );
        assert!(!sync.table().contains("32:16:16:0:fc00:0:1:1::"));
        assert_eq!(sync.table().hget("32:16:16:0:fc00:0:1:2::", "action"), Some("un"));
    }

    #[tokio::test]
    async fn test_session_skips_protobuf_frames() {
        let wire = encode(vec![
            FpmFrame {
                msg_type: FPM_MSG_TYPE_PROTOBUF,
                payload: Bytes::from_static(&[0x0a, 0x00]),
            },
            FpmFrame::netlink(add("fc00:0:1:1::", Action::End)),
        ]);
        let stream = tokio_test::io::Builder::new().read(&wire).build();

        let mut sync = RouteSync::new(MemoryTable::new()).unwrap();
        let stats = run_session(stream, &mut sync).await.unwrap();

        assert_eq!(stats.frames, 2);
        assert_eq!(stats.messages, 1);
        assert_eq!(sync.table().len(), 1);
    }

    #[tokio::test]
    async fn test_session_survives_rejected_and_route_messages() {
        let invalid = LocalSidMessage::add(ip("fc00:0:1:1::"))
            .action(Action::EndX)
            .to_bytes();
        let route = netlink_message(RTM_NEWROUTE, &[0u8; 12]);
        let wire = encode(vec![FpmFrame::netlink(pack(&[
            invalid,
            route,
            add("fc00:0:1:e000::", Action::End),
        ]))]);
        let stream = tokio_test::io::Builder::new().read(&wire).build();

        let mut sync = RouteSync::new(MemoryTable::new()).unwrap();
        let stats = run_session(stream, &mut sync).await.unwrap();

        assert_eq!(stats.messages, 3);
        assert_eq!(sync.metrics().messages_forwarded_total.get(), 1);
        assert_eq!(sync.table().keys().collect::<Vec<_>>(), vec!["32:16:16:0:fc00:0:1:e000::"]);
    }

    /// Table that fails writes for one key
    struct FlakyTable {
        inner: MemoryTable,
        failing_key: &'static str,
    }

    #[async_trait::async_trait]
    impl LocalSidTable for FlakyTable {
        async fn upsert(&mut self, key: &str, fields: &[(&'static str, String)]) -> Result<()> {
            if key == self.failing_key {
                return Err(FpmsyncError::Io(std::io::Error::other("connection reset")));
            }
            self.inner.upsert(key, fields).await
        }

        async fn delete(&mut self, key: &str) -> Result<()> {
            self.inner.delete(key).await
        }
    }

    #[tokio::test]
    async fn test_session_continues_after_store_error() {
        let wire = encode(vec![FpmFrame::netlink(pack(&[
            add("fc00:0:1:1::", Action::End),
            add("fc00:0:1:2::", Action::End),
        ]))]);
        let stream = tokio_test::io::Builder::new().read(&wire).build();

        let table = FlakyTable {
            inner: MemoryTable::new(),
            failing_key: "32:16:16:0:fc00:0:1:1::",
        };
        let mut sync = RouteSync::new(table).unwrap();
        let stats = run_session(stream, &mut sync).await.unwrap();

        assert_eq!(stats.messages, 2);
        assert_eq!(stats.store_errors, 1);
        assert_eq!(
            sync.table().inner.keys().collect::<Vec<_>>(),
            vec!["32:16:16:0:fc00:0:1:2::"]
        );
        assert_eq!(
            sync.metrics().store_errors_total.with_label_values(&["set"]).get(),
            1
        );
    }

    #[tokio::test]
    async fn test_session_ends_on_bad_version() {
        let mut wire = encode(vec![FpmFrame::netlink(add("fc00:0:1:1::", Action::End))]);
        wire.extend_from_slice(&[9, 1, 0, 4]);
        let stream = tokio_test::io::Builder::new().read(&wire).build();

        let mut sync = RouteSync::new(MemoryTable::new()).unwrap();
        let result = run_session(stream, &mut sync).await;

        assert!(matches!(result, Err(FpmsyncError::Fpm(_))));
        // frames before the bad header were applied
        assert_eq!(sync.table().len(), 1);
    }

    #[tokio::test]
    async fn test_session_over_duplex() {
        let (client, server) = tokio::io::duplex(4096);

        let writer = tokio::spawn(async move {
            let mut frames = FramedWrite::new(client, FpmCodec);
            frames
                .send(FpmFrame::netlink(add("fc00:0:1:1::", Action::End)))
                .await
                .unwrap();
            frames
                .send(FpmFrame::netlink(add("fc00:0:1:2::", Action::End)))
                .await
                .unwrap();
        });

        let mut sync = RouteSync::new(MemoryTable::new()).unwrap();
        let stats = run_session(server, &mut sync).await.unwrap();
        writer.await.unwrap();

        assert_eq!(stats.frames, 2);
        assert_eq!(sync.table().len(), 2);
    }

    #[tokio::test]
    async fn test_server_accepts_tcp_client() {
        let server = FpmServer::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let addr = server.local_addr().unwrap();

        let client = tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            let wire = encode(vec![FpmFrame::netlink(add("fc00:0:1:1::", Action::End))]);
            stream.write_all(&wire).await.unwrap();
            stream.shutdown().await.unwrap();
        });

        let mut sync = RouteSync::new(MemoryTable::new()).unwrap();
        let stats = server.serve_one(&mut sync).await.unwrap();
        client.await.unwrap();

        assert_eq!(stats.map(|s| s.messages), Some(1));
        assert_eq!(sync.table().hget("32:16:16:0:fc00:0:1:1::", "action"), Some("end"));
    }
}
