use crate::common::{client_with_sessions, network_error, ScriptedTransport};
use serde_json::json;
use smdbg::client::registry::GlobalId;
use smdbg::client::{DebugClient, Error};

#[tokio::test]
async fn test_open_assigns_ordinals() {
    let client = DebugClient::new(ScriptedTransport::default());
    client.transport().respond(json!({"debugSessionId": "g-a"}));
    client.transport().respond(json!({"debugSessionId": 17}));
    client.transport().respond(json!({"debugSessionId": "g-c"}));

    let ids = [
        client.open().await.unwrap(),
        client.open().await.unwrap(),
        client.open().await.unwrap(),
    ];
    assert_eq!(ids, [0, 1, 2]);

    let registry = client.registry();
    assert_eq!(registry.get(0).unwrap().global_id().as_str(), "g-a");
    assert_eq!(registry.get(1).unwrap().global_id().as_str(), "17");
    assert_eq!(registry.get(2).unwrap().global_id().as_str(), "g-c");
    // opening a session does not switch to it
    assert_eq!(registry.current_id(), None);

    for (command, args) in client.transport().calls() {
        assert_eq!(command, "openSession");
        assert_eq!(args, json!({}));
    }
}

#[tokio::test]
async fn test_numeric_global_id_is_sent_back_as_number() {
    let client = DebugClient::new(ScriptedTransport::default());
    client.transport().respond(json!({"debugSessionId": 17}));
    let id = client.open().await.unwrap();
    client.switch_to(id).unwrap();

    client.go().await.unwrap();
    let (_, args) = client.transport().last_call();
    assert_eq!(args["debugSessionId"], json!(17));

    // listing compares ids by json value, so the numeric id is recognized as connected
    client.transport().respond(json!([17, "17"]));
    let listing = client.list_sessions().await.unwrap();
    assert_eq!(listing, vec![GlobalId::new("17")]);
}

#[tokio::test]
async fn test_open_failure_keeps_registry() {
    let client = DebugClient::new(ScriptedTransport::default());
    client.transport().fail(network_error());
    client.transport().respond(json!({"exception": {"detailMessage": "no slots"}}));
    client.transport().respond(json!({"sessionId": "wrong field"}));
    client.transport().respond(json!({"debugSessionId": "g-a"}));

    assert!(matches!(client.open().await, Err(Error::Network(_))));
    assert!(matches!(
        client.open().await,
        Err(Error::RemoteLogic(msg)) if msg == "no slots"
    ));
    assert!(matches!(
        client.open().await,
        Err(Error::UnexpectedResponse(_))
    ));
    assert!(client.registry().is_empty());

    assert_eq!(client.open().await.unwrap(), 0);
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let client = client_with_sessions(&["g-0", "g-1"]).await;

    client.close(1).await.unwrap();
    let (command, args) = client.transport().last_call();
    assert_eq!(command, "closeSession");
    assert_eq!(args, json!({"debugSessionId": "g-1"}));
    assert!(matches!(client.registry().get(1), Err(Error::ClosedSession(1))));

    let calls = client.transport().calls_count();
    client.close(1).await.unwrap();
    assert_eq!(client.transport().calls_count(), calls);
    assert!(matches!(client.registry().get(1), Err(Error::ClosedSession(1))));
}

#[tokio::test]
async fn test_close_current_session_rejected() {
    let client = client_with_sessions(&["g-0", "g-1"]).await;
    let calls = client.transport().calls_count();

    assert!(matches!(
        client.close(0).await,
        Err(Error::CloseCurrentSession(0))
    ));
    assert!(matches!(client.close(9).await, Err(Error::OutOfRange(9))));
    assert_eq!(client.transport().calls_count(), calls);
    assert!(client.registry().get(0).is_ok());
}

#[tokio::test]
async fn test_close_with_remote_error_tombstones_session() {
    let client = client_with_sessions(&["g-0", "g-1"]).await;
    client.transport().respond(json!({
        "exception": {"detailMessage": "wrapper", "cause": {"detailMessage": "already closed"}}
    }));

    assert!(matches!(
        client.close(1).await,
        Err(Error::RemoteLogic(msg)) if msg == "already closed"
    ));
    assert!(matches!(client.switch_to(1), Err(Error::ClosedSession(1))));
}

#[tokio::test]
async fn test_close_with_network_error_keeps_session() {
    let client = client_with_sessions(&["g-0", "g-1"]).await;
    client.transport().fail(network_error());

    assert!(client.close(1).await.unwrap_err().is_network());
    assert_eq!(client.switch_to(1).unwrap(), GlobalId::new("g-1"));
}

#[tokio::test]
async fn test_ordinals_are_not_reused() {
    let client = client_with_sessions(&["g-0", "g-1"]).await;
    client.close(1).await.unwrap();

    client.transport().respond(json!({"debugSessionId": "g-2"}));
    assert_eq!(client.open().await.unwrap(), 2);
    assert_eq!(client.registry().len(), 3);
}

#[tokio::test]
async fn test_switch_to() {
    let client = client_with_sessions(&["g-0", "g-1", "g-2"]).await;
    client.close(2).await.unwrap();

    assert_eq!(client.switch_to(1).unwrap(), GlobalId::new("g-1"));
    assert_eq!(client.registry().current_id(), Some(1));
    assert!(matches!(client.switch_to(2), Err(Error::ClosedSession(2))));
    assert!(matches!(client.switch_to(3), Err(Error::OutOfRange(3))));
    assert_eq!(client.registry().current_id(), Some(1));
}

#[tokio::test]
async fn test_list_and_connect_remote_sessions() {
    let client = client_with_sessions(&["g-0"]).await;

    assert!(matches!(
        client.connect_remote(0),
        Err(Error::NoSuchRemoteIndex(0))
    ));

    client.transport().respond(json!(["g-0", "r-1", "r-2"]));
    let listing = client.list_sessions().await.unwrap();
    assert_eq!(listing, vec![GlobalId::new("r-1"), GlobalId::new("r-2")]);
    let (command, args) = client.transport().last_call();
    assert_eq!(command, "listSessions");
    assert_eq!(args, json!({"debugSessionId": "g-0"}));

    let calls = client.transport().calls_count();
    assert_eq!(client.connect_remote(1).unwrap(), 1);
    assert_eq!(
        client.registry().get(1).unwrap().global_id(),
        &GlobalId::new("r-2")
    );
    assert!(matches!(
        client.connect_remote(1),
        Err(Error::NoSuchRemoteIndex(1))
    ));
    assert_eq!(client.connect_remote(0).unwrap(), 2);
    // connecting never opens a new session on the server
    assert_eq!(client.transport().calls_count(), calls);

    // a new listing replaces the previous one
    client
        .transport()
        .respond(json!({"debugSessionIds": ["g-0", "r-1", "r-2", "r-3"]}));
    let listing = client.list_sessions().await.unwrap();
    assert_eq!(listing, vec![GlobalId::new("r-3")]);
    assert!(matches!(
        client.connect_remote(1),
        Err(Error::NoSuchRemoteIndex(1))
    ));
}

#[tokio::test]
async fn test_close_completes_after_switch() {
    let client = client_with_sessions(&["g-0", "g-1"]).await;
    let reply = client.transport().respond_later();

    let (closed, _) = tokio::join!(client.close(1), async {
        // close request is in flight, session is still open
        client.switch_to(1).unwrap();
        reply.send(json!({})).unwrap();
    });

    closed.unwrap();
    assert_eq!(client.registry().current_id(), None);
    assert!(matches!(client.go().await, Err(Error::NoCurrentSession)));
    assert_eq!(client.switch_to(0).unwrap(), GlobalId::new("g-0"));
}
