//! Namenode client against an in-process mock namenode.

use std::{sync::Arc, time::Duration};

use libhdfsproto::{
    common::rpc_response_header_proto::RpcErrorCodeProto,
    hdfs::{
        ExtendedBlockProto, GetBlockLocationsRequestProto, GetBlockLocationsResponseProto,
        LocatedBlockProto, LocatedBlocksProto, RenewLeaseRequestProto, RenewLeaseResponseProto,
    },
};
use libhdfsrpc::{
    ErrorKind, NamenodeClient, NamenodeConfig,
    protocol::{AuthProtocol, CLIENT_PROTOCOL, GetBlockLocations, NamenodeMethod, RenewLease},
};

use crate::common::{
    eventually, init_logger,
    mock_namenode::{Call, Event, MockNamenode, Reply},
    next_event,
};

fn config() -> NamenodeConfig {
    NamenodeConfig {
        client_name: "DFSClient_NONMAPREDUCE_test".to_owned(),
        effective_user: Some("alice".to_owned()),
        ..Default::default()
    }
}

fn locations_request(src: &str) -> GetBlockLocationsRequestProto {
    GetBlockLocationsRequestProto {
        src: src.to_owned(),
        offset: 0,
        length: 1024,
    }
}

fn located_blocks() -> GetBlockLocationsResponseProto {
    GetBlockLocationsResponseProto {
        locations: Some(LocatedBlocksProto {
            file_length: 1024,
            blocks: vec![LocatedBlockProto {
                b: Some(ExtendedBlockProto {
                    pool_id: "BP-1".to_owned(),
                    block_id: 1_073_741_825,
                    generation_stamp: 1001,
                    num_bytes: Some(1024),
                }),
                offset: 0,
                locs: vec![],
                corrupt: false,
                block_token: None,
            }],
            under_construction: false,
            last_block: None,
            is_last_block_complete: true,
        }),
    }
}

/// Located blocks whose pool id echoes `src`, so a response can be matched
/// to its request.
fn blocks_for(src: &str) -> GetBlockLocationsResponseProto {
    let mut response = located_blocks();
    if let Some(block) = response
        .locations
        .as_mut()
        .and_then(|l| l.blocks.first_mut())
        .and_then(|b| b.b.as_mut())
    {
        block.pool_id = src.to_owned();
    }
    response
}

fn pool_id(response: &GetBlockLocationsResponseProto) -> &str {
    &response.locations.as_ref().unwrap().blocks[0]
        .b
        .as_ref()
        .unwrap()
        .pool_id
}

fn answer_locations(call: &Call) -> Reply {
    match call.request.method_name.as_str() {
        "getBlockLocations" => Reply::success(&located_blocks()),
        "renewLease" => Reply::success(&RenewLeaseResponseProto {}),
        _ => Reply::error(Some(RpcErrorCodeProto::ErrorNoSuchMethod), "no such method"),
    }
}

async fn expect_call(mock: &mut MockNamenode) -> Call {
    match next_event(&mut mock.events).await {
        Event::Call(call) => call,
        other => panic!("expected a call, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_handshake_and_call_ids() {
    init_logger();

    let mut mock = MockNamenode::spawn(answer_locations).await;
    let client = NamenodeClient::connect_with_config("127.0.0.1", mock.port, config())
        .await
        .unwrap();
    assert!(client.is_connected());
    assert_eq!(client.peer(), format!("127.0.0.1:{}", mock.port));

    let client_id = match next_event(&mut mock.events).await {
        Event::Context {
            header,
            rpc,
            context,
        } => {
            assert_eq!(header.auth, AuthProtocol::None);
            assert_eq!(header.service_class, 0);
            assert_eq!(rpc.call_id, -3);
            assert_eq!(rpc.retry_count, Some(-1));
            assert_eq!(rpc.client_id.len(), 16);
            assert_eq!(context.protocol.as_deref(), Some(CLIENT_PROTOCOL.name));
            let user = context.user_info.unwrap();
            assert_eq!(user.effective_user.as_deref(), Some("alice"));
            rpc.client_id
        }
        other => panic!("expected the connection context, got {other:?}"),
    };

    for expected in 0..5 {
        let response = client
            .invoke::<GetBlockLocations>(&locations_request("/a"))
            .await
            .unwrap();
        assert_eq!(response, located_blocks());

        let call = expect_call(&mut mock).await;
        assert_eq!(call.rpc.call_id, expected);
        assert_eq!(call.rpc.retry_count, Some(0));
        assert_eq!(call.rpc.client_id, client_id);
        assert_eq!(call.request.method_name, "getBlockLocations");
        assert_eq!(
            call.request.declaring_class_protocol_name,
            "org.apache.hadoop.hdfs.protocol.ClientProtocol"
        );
        assert_eq!(call.request.client_protocol_version, 1);
        let sent: GetBlockLocationsRequestProto = call.decode_body();
        assert_eq!(sent, locations_request("/a"));
    }

    client.disconnect().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_error_keeps_connection() {
    init_logger();

    let mut mock = MockNamenode::spawn(|call: &Call| {
        if call.decode_body::<GetBlockLocationsRequestProto>().src == "/missing" {
            Reply::error(
                Some(RpcErrorCodeProto::ErrorApplication),
                "File does not exist: /missing",
            )
        } else {
            Reply::success(&located_blocks())
        }
    })
    .await;
    let client = NamenodeClient::connect_with_config("127.0.0.1", mock.port, config())
        .await
        .unwrap();
    let _context = next_event(&mut mock.events).await;

    let err = client
        .invoke::<GetBlockLocations>(&locations_request("/missing"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(err.to_string().contains("File does not exist: /missing"));
    assert!(client.is_connected());
    assert_eq!(expect_call(&mut mock).await.rpc.call_id, 0);

    client
        .invoke::<GetBlockLocations>(&locations_request("/present"))
        .await
        .unwrap();
    assert_eq!(expect_call(&mut mock).await.rpc.call_id, 1);

    client.disconnect().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_error_detail_mapping_over_the_wire() {
    init_logger();

    let mut mock = MockNamenode::spawn(|call: &Call| match call.rpc.call_id {
        0 => Reply::error(None, "no detail"),
        1 => Reply::error(Some(RpcErrorCodeProto::ErrorRpcServer), "server trouble"),
        _ => Reply::error(Some(RpcErrorCodeProto::ErrorRpcVersionMismatch), "old client"),
    })
    .await;
    let client = NamenodeClient::connect_with_config("127.0.0.1", mock.port, config())
        .await
        .unwrap();
    let _context = next_event(&mut mock.events).await;

    let mut kinds = Vec::new();
    for _ in 0..3 {
        let err = client
            .invoke::<GetBlockLocations>(&locations_request("/x"))
            .await
            .unwrap_err();
        kinds.push(err.kind());
    }
    assert_eq!(
        kinds,
        [
            ErrorKind::InvalidArgument,
            ErrorKind::BadRpcExchange,
            ErrorKind::RpcVersionMismatch
        ]
    );
    assert!(client.is_connected());

    client.disconnect().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fatal_closes_connection() {
    init_logger();

    let mut mock = MockNamenode::spawn(|_: &Call| {
        Reply::fatal(RpcErrorCodeProto::FatalUnauthorized, "user alice is not allowed")
    })
    .await;
    let client = NamenodeClient::connect_with_config("127.0.0.1", mock.port, config())
        .await
        .unwrap();
    let _context = next_event(&mut mock.events).await;

    let err = client
        .invoke::<GetBlockLocations>(&locations_request("/x"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    // Closed before the error was returned.
    assert!(!client.is_connected());

    let _call = expect_call(&mut mock).await;
    assert!(matches!(next_event(&mut mock.events).await, Event::Closed));

    let err = client
        .invoke::<GetBlockLocations>(&locations_request("/x"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotConnected);

    client.disconnect().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_double_disconnect() {
    init_logger();

    let mut mock = MockNamenode::spawn(answer_locations).await;
    let client = NamenodeClient::connect_with_config("127.0.0.1", mock.port, config())
        .await
        .unwrap();
    let _context = next_event(&mut mock.events).await;

    // The renewer is asleep and must leave through its cancel branch, well
    // inside the 100 ms grace period after which it would be aborted.
    let started = tokio::time::Instant::now();
    client.disconnect().await;
    let elapsed = started.elapsed();
    assert!(
        elapsed < Duration::from_millis(50),
        "disconnect took {elapsed:?}"
    );
    assert!(!client.is_connected());
    client.disconnect().await;
    assert!(!client.is_connected());
    assert!(matches!(next_event(&mut mock.events).await, Event::Closed));

    let err = client
        .call::<_, RenewLeaseResponseProto>(
            &CLIENT_PROTOCOL,
            "renewLease",
            &RenewLeaseRequestProto {
                client_name: "x".to_owned(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotConnected);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_lease_renewal() {
    init_logger();

    let mut mock = MockNamenode::spawn(answer_locations).await;
    let client = NamenodeClient::connect_with_config(
        "127.0.0.1",
        mock.port,
        NamenodeConfig {
            lease_renewal_interval: Duration::from_millis(50),
            ..config()
        },
    )
    .await
    .unwrap();
    let _context = next_event(&mut mock.events).await;

    for expected in 0..2 {
        let call = expect_call(&mut mock).await;
        assert_eq!(call.rpc.call_id, expected);
        assert_eq!(call.request.method_name, RenewLease::NAME);
        let sent: RenewLeaseRequestProto = call.decode_body();
        assert_eq!(sent.client_name, "DFSClient_NONMAPREDUCE_test");
    }
    eventually(|| client.lease_stats().renewals >= 2).await;
    assert_eq!(client.lease_stats().failures, 0);

    client.disconnect().await;
    let stopped_at = client.lease_stats().renewals;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(client.lease_stats().renewals, stopped_at);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_lease_renewal_failures_are_counted() {
    init_logger();

    let mut mock = MockNamenode::spawn(|_: &Call| {
        Reply::error(Some(RpcErrorCodeProto::ErrorApplication), "lease expired")
    })
    .await;
    let client = NamenodeClient::connect_with_config(
        "127.0.0.1",
        mock.port,
        NamenodeConfig {
            lease_renewal_interval: Duration::from_millis(20),
            ..config()
        },
    )
    .await
    .unwrap();
    let _context = next_event(&mut mock.events).await;

    eventually(|| client.lease_stats().failures >= 2).await;
    assert_eq!(client.lease_stats().renewals, 0);
    assert!(client.is_connected());

    client.disconnect().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connect_refused() {
    init_logger();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let err = NamenodeClient::connect("127.0.0.1", port).await.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::HostUnreachable);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_abandoned_call_closes_connection() {
    init_logger();

    let mut mock = MockNamenode::spawn(|call: &Call| {
        if call.rpc.call_id == 0 {
            Reply::delayed(Duration::from_millis(300), Reply::success(&located_blocks()))
        } else {
            Reply::success(&located_blocks())
        }
    })
    .await;
    let client = NamenodeClient::connect_with_config("127.0.0.1", mock.port, config())
        .await
        .unwrap();
    let _context = next_event(&mut mock.events).await;

    let timed_out = tokio::time::timeout(
        Duration::from_millis(50),
        client.invoke::<GetBlockLocations>(&locations_request("/slow")),
    )
    .await;
    assert!(timed_out.is_err());

    // The late response to call 0 must never be read as the answer to a
    // later call.
    for _ in 0..2 {
        let err = client
            .invoke::<GetBlockLocations>(&locations_request("/next"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotConnected);
        assert!(!client.is_connected());
    }

    assert_eq!(expect_call(&mut mock).await.rpc.call_id, 0);
    assert!(matches!(next_event(&mut mock.events).await, Event::Closed));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_oversized_response_closes_connection() {
    init_logger();

    let mut mock = MockNamenode::spawn(|call: &Call| match call.rpc.call_id {
        0 => Reply::success(&blocks_for(&"/big".repeat(25))),
        _ => Reply::success(&RenewLeaseResponseProto {}),
    })
    .await;
    let client = NamenodeClient::connect_with_config(
        "127.0.0.1",
        mock.port,
        NamenodeConfig {
            max_response_len: 40,
            ..config()
        },
    )
    .await
    .unwrap();
    let _context = next_event(&mut mock.events).await;

    let err = client
        .invoke::<GetBlockLocations>(&locations_request("/big"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Malformed);
    assert!(err.to_string().contains("exceeds limit 40"));
    assert!(!client.is_connected());

    // The unread body of the first frame is not parsed as a new response.
    let err = client
        .invoke::<RenewLease>(&RenewLeaseRequestProto {
            client_name: "DFSClient_NONMAPREDUCE_test".to_owned(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotConnected);

    assert_eq!(expect_call(&mut mock).await.rpc.call_id, 0);
    assert!(matches!(next_event(&mut mock.events).await, Event::Closed));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_disconnect_interrupts_stalled_call() {
    init_logger();

    let mut mock = MockNamenode::spawn(|_: &Call| {
        Reply::delayed(Duration::from_secs(3), Reply::success(&located_blocks()))
    })
    .await;
    let client = Arc::new(
        NamenodeClient::connect_with_config("127.0.0.1", mock.port, config())
            .await
            .unwrap(),
    );
    let _context = next_event(&mut mock.events).await;

    let stalled = {
        let client = Arc::clone(&client);
        tokio::spawn(async move {
            client
                .invoke::<GetBlockLocations>(&locations_request("/stalled"))
                .await
        })
    };
    // The request is on the wire and its caller holds the connection lock.
    let _call = expect_call(&mut mock).await;

    tokio::time::timeout(Duration::from_secs(1), client.disconnect())
        .await
        .expect("disconnect waited for the stalled call");
    assert!(!client.is_connected());

    let err = stalled.await.unwrap().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotConnected);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_renewals_interleave_with_foreground_calls() {
    init_logger();

    const TASKS: usize = 4;
    const CALLS_PER_TASK: usize = 25;

    let mut mock = MockNamenode::spawn(|call: &Call| match call.request.method_name.as_str() {
        "getBlockLocations" => {
            let request: GetBlockLocationsRequestProto = call.decode_body();
            Reply::success(&blocks_for(&request.src))
        }
        "renewLease" => {
            let request: RenewLeaseRequestProto = call.decode_body();
            assert_eq!(request.client_name, "DFSClient_NONMAPREDUCE_test");
            Reply::success(&RenewLeaseResponseProto {})
        }
        _ => Reply::error(Some(RpcErrorCodeProto::ErrorNoSuchMethod), "no such method"),
    })
    .await;
    let client = Arc::new(
        NamenodeClient::connect_with_config(
            "127.0.0.1",
            mock.port,
            NamenodeConfig {
                lease_renewal_interval: Duration::from_millis(5),
                ..config()
            },
        )
        .await
        .unwrap(),
    );
    let _context = next_event(&mut mock.events).await;

    let workers: Vec<_> = (0..TASKS)
        .map(|task| {
            let client = Arc::clone(&client);
            tokio::spawn(async move {
                for i in 0..CALLS_PER_TASK {
                    let src = format!("/t{task}/{i}");
                    let response = client
                        .invoke::<GetBlockLocations>(&locations_request(&src))
                        .await
                        .unwrap();
                    assert_eq!(pool_id(&response), src);
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
            })
        })
        .collect();
    for worker in workers {
        worker.await.unwrap();
    }
    eventually(|| client.lease_stats().renewals >= 2).await;
    assert_eq!(client.lease_stats().failures, 0);
    client.disconnect().await;

    let mut call_ids = Vec::new();
    let mut lookups = 0;
    let mut renewals = 0;
    loop {
        match next_event(&mut mock.events).await {
            Event::Call(call) => {
                call_ids.push(call.rpc.call_id);
                match call.request.method_name.as_str() {
                    "getBlockLocations" => {
                        let sent: GetBlockLocationsRequestProto = call.decode_body();
                        assert!(sent.src.starts_with("/t"));
                        lookups += 1;
                    }
                    "renewLease" => {
                        let _: RenewLeaseRequestProto = call.decode_body();
                        renewals += 1;
                    }
                    other => panic!("unexpected method {other}"),
                }
            }
            Event::Closed => break,
            other => panic!("unexpected event {other:?}"),
        }
    }
    let expected: Vec<i32> = (0..call_ids.len() as i32).collect();
    assert_eq!(call_ids, expected);
    assert_eq!(lookups, TASKS * CALLS_PER_TASK);
    assert!(renewals >= 2);
}
