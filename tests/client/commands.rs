use crate::common::{client_with_sessions, network_error, ScriptedTransport};
use serde_json::{json, Value};
use smdbg::client::registry::GlobalId;
use smdbg::client::{DebugClient, Error, NewBreakpoint};
use smdbg::ui::command::show::{Aspect, ExecutionResult};
use smdbg::ui::command::{map, message, r#break, show, Command, CommandError};
use smdbg::ui::console::view;

#[tokio::test]
async fn test_new_breakpoint_from_command_line() {
    let client = client_with_sessions(&["g-0"]).await;

    let Command::Breakpoint(cmd) = Command::parse("break 3 b1").unwrap() else {
        panic!("breakpoint command expected");
    };
    let result = r#break::Handler::new(&client).handle(cmd).await.unwrap();
    assert!(matches!(result, r#break::ExecutionResult::New(name) if name == "b1"));

    let (command, args) = client.transport().last_call();
    assert_eq!(command, "newBreakpoint");
    assert_eq!(
        args,
        json!({
            "breakAfter": false,
            "breakBefore": true,
            "active": true,
            "breakpointMode": "point",
            "targetId": 2,
            "breakpointId": "b1",
            "debugSessionId": "g-0",
        })
    );
}

#[tokio::test]
async fn test_breakpoint_names_are_per_session() {
    let client = client_with_sessions(&["g-0", "g-1"]).await;

    assert_eq!(client.new_breakpoint(NewBreakpoint::point(0)).await.unwrap(), "bp1");
    assert_eq!(client.new_breakpoint(NewBreakpoint::point(1)).await.unwrap(), "bp2");
    assert_eq!(client.new_breakpoint(NewBreakpoint::trace()).await.unwrap(), "tr1");
    assert_eq!(
        client.new_breakpoint(NewBreakpoint::point(1).with_name("custom"))
            .await
            .unwrap(),
        "custom"
    );

    let (_, args) = client.transport().last_call();
    assert_eq!(args["breakpointId"], json!("custom"));

    client.switch_to(1).unwrap();
    assert_eq!(client.new_breakpoint(NewBreakpoint::point(0)).await.unwrap(), "bp1");
    assert_eq!(client.new_breakpoint(NewBreakpoint::trace()).await.unwrap(), "tr1");

    let (_, args) = client.transport().last_call();
    assert_eq!(args["breakpointMode"], json!("trace"));
    assert_eq!(args["debugSessionId"], json!("g-1"));
    assert!(args.get("targetId").is_none());
}

#[tokio::test]
async fn test_breakpoint_name_is_reserved_before_call() {
    let client = client_with_sessions(&["g-0"]).await;

    client.transport().fail(network_error());
    assert!(client.new_breakpoint(NewBreakpoint::point(0)).await.is_err());
    assert_eq!(
        client.new_breakpoint(NewBreakpoint::point(0)).await.unwrap(),
        "bp2"
    );

    let reply = client.transport().respond_later();
    let (first, second) = tokio::join!(
        client.new_breakpoint(NewBreakpoint::point(1)),
        async {
            let name = client.new_breakpoint(NewBreakpoint::point(2)).await;
            reply.send(json!({})).unwrap();
            name
        }
    );
    assert_eq!(first.unwrap(), "bp3");
    assert_eq!(second.unwrap(), "bp4");
}

#[tokio::test]
async fn test_session_scoped_commands() {
    let client = client_with_sessions(&["g-0"]).await;

    client.go().await.unwrap();
    client.go_to(4).await.unwrap();
    client.set_trace(true).await.unwrap();
    client.modify_breakpoint("bp1", false).await.unwrap();
    client.add_map_target(None, json!("t")).await.unwrap();
    client.add_map_target(Some(1), json!("u")).await.unwrap();
    client.remove_map_target().await.unwrap();
    client.make_dump().await.unwrap();
    client.get_state().await.unwrap();

    let calls: Vec<(String, Value)> = client.transport().calls().into_iter().skip(1).collect();
    let expected = vec![
        ("go", json!({"debugSessionId": "g-0"})),
        ("goTo", json!({"targetId": 4, "debugSessionId": "g-0"})),
        ("setTrace", json!({"trace": true, "debugSessionId": "g-0"})),
        (
            "modifyBreakpoint",
            json!({"breakpointId": "bp1", "active": false, "debugSessionId": "g-0"}),
        ),
        (
            "addMapTarget",
            json!({"messageTarget": "t", "debugSessionId": "g-0"}),
        ),
        (
            "addMapTarget",
            json!({"targetId": 1, "messageTarget": "u", "debugSessionId": "g-0"}),
        ),
        ("removeMapTarget", json!({"debugSessionId": "g-0"})),
        ("makeDump", json!({"debugSessionId": "g-0"})),
        ("getState", json!({"debugSessionId": "g-0"})),
    ];

    assert_eq!(calls.len(), expected.len());
    for ((command, args), (expected_command, expected_args)) in calls.into_iter().zip(expected) {
        assert_eq!(command, expected_command);
        assert_eq!(args, expected_args);
    }
}

#[tokio::test]
async fn test_commands_without_current_session() {
    let client = DebugClient::new(ScriptedTransport::default());

    assert!(matches!(client.go().await, Err(Error::NoCurrentSession)));
    assert!(matches!(
        client.new_breakpoint(NewBreakpoint::point(0)).await,
        Err(Error::NoCurrentSession)
    ));
    assert!(matches!(
        client.add_watch("$.a"),
        Err(Error::NoCurrentSession)
    ));
    assert_eq!(client.transport().calls_count(), 0);
}

#[tokio::test]
async fn test_remote_exception_is_unwrapped() {
    let client = client_with_sessions(&["g-0"]).await;

    client.transport().respond(json!({
        "exception": {
            "detailMessage": "map failed",
            "cause": {"message": "handler failed", "cause": {"detailMessage": "division by zero"}}
        }
    }));
    assert!(matches!(
        client.go().await,
        Err(Error::RemoteLogic(msg)) if msg == "division by zero"
    ));

    client.transport().respond(json!({"exception": {"cause": {}}}));
    assert!(matches!(
        client.go().await,
        Err(Error::RemoteLogic(msg)) if msg == "unknown error"
    ));

    let mut exception = json!({"detailMessage": "bottom"});
    for level in 0..500 {
        exception = json!({"detailMessage": format!("level {level}"), "cause": exception});
    }
    client.transport().respond(json!({ "exception": exception }));
    assert!(matches!(client.go().await, Err(Error::RemoteLogic(_))));
}

#[tokio::test]
async fn test_watches() {
    let client = client_with_sessions(&["g-0", "g-1"]).await;

    assert_eq!(client.add_watch("$.a").unwrap(), 1);
    assert_eq!(client.add_watch("$.b.c").unwrap(), 2);
    assert_eq!(client.add_watch("$.a * 2").unwrap(), 3);
    assert!(matches!(client.add_watch("$.("), Err(Error::Compile(_))));
    assert_eq!(client.watches(0).unwrap().len(), 3);
    assert!(client.watches(1).unwrap().is_empty());

    client.transport().respond(json!({"messageContent": {"a": 21}}));
    let result = show::Handler::new(&client)
        .handle(Aspect::Watch)
        .await
        .unwrap();
    let ExecutionResult::Watch {
        message_content,
        watches,
    } = result
    else {
        panic!("watch result expected");
    };
    let lines = view::render_watches(message_content.as_ref(), &watches);
    assert_eq!(lines[0], "1) $.a = 21");
    assert!(lines[1].starts_with("2) $.b.c = Error evaluating expression:"));
    assert_eq!(lines[2], "3) $.a * 2 = 42");

    client.transport().respond(json!({"messageContent": null}));
    let Ok(ExecutionResult::Watch {
        message_content,
        watches,
    }) = show::Handler::new(&client).handle(Aspect::Watch).await
    else {
        panic!("watch result expected");
    };
    assert_eq!(
        view::render_watches(message_content.as_ref(), &watches),
        vec!["No message available.", "1) $.a", "2) $.b.c", "3) $.a * 2"]
    );

    client.remove_watch(1).unwrap();
    assert_eq!(client.watches(0).unwrap()[0].source(), "$.b.c");
    assert!(matches!(client.remove_watch(5), Err(Error::WatchNotFound(5))));
}

#[tokio::test]
async fn test_show_map() {
    let client = client_with_sessions(&["g-0"]).await;
    client.transport().respond(json!({
        "mapTargets": [{"target": "X", "handler": "Y", "breakpoints": ["bp1"]}],
        "mapIndex": 0,
        "breakpoints": {"bp1": {"active": false, "breakBefore": true}},
    }));

    let Ok(ExecutionResult::Map(snapshot)) =
        show::Handler::new(&client).handle(Aspect::Map).await
    else {
        panic!("map result expected");
    };
    assert_eq!(
        view::render_map(&snapshot),
        vec!["Message map has 1 target(s).", "-> [*<bp1] 1) actor://X/#Y"]
    );

    // help is rendered locally
    let calls = client.transport().calls_count();
    assert!(matches!(
        show::Handler::new(&client).handle(Aspect::Help).await,
        Ok(ExecutionResult::Help)
    ));
    assert_eq!(client.transport().calls_count(), calls);
}

#[tokio::test]
async fn test_message_and_target_expressions() {
    let client = client_with_sessions(&["g-0"]).await;

    let injected = message::Handler::new(&client)
        .handle("{user: {name: \"bob\", age: 20 + 1}} to {target: \"users\", handler: \"create\"}")
        .await
        .unwrap();
    assert_eq!(injected.content, json!({"user": {"name": "bob", "age": 21}}));
    let (command, args) = client.transport().last_call();
    assert_eq!(command, "setMessageContent");
    assert_eq!(
        args,
        json!({
            "messageContent": {"user": {"name": "bob", "age": 21}},
            "messageTarget": {"target": "users", "handler": "create"},
            "debugSessionId": "g-0",
        })
    );

    let Command::Map(cmd) = Command::parse("target add 2 {messageMapId: {id: \"7\"}}").unwrap()
    else {
        panic!("map command expected");
    };
    map::Handler::new(&client).handle(cmd).await.unwrap();
    let (command, args) = client.transport().last_call();
    assert_eq!(command, "addMapTarget");
    assert_eq!(
        args,
        json!({
            "targetId": 1,
            "messageTarget": {"messageMapId": {"id": "7"}},
            "debugSessionId": "g-0",
        })
    );

    // compile errors never reach the server
    let calls = client.transport().calls_count();
    let err = message::Handler::new(&client)
        .handle("{user: } to \"x\"")
        .await
        .unwrap_err();
    assert!(matches!(err, CommandError::Handle(Error::Compile(_))));
    let err = message::Handler::new(&client)
        .handle("$.user to \"x\"")
        .await
        .unwrap_err();
    assert!(matches!(err, CommandError::Evaluation(_)));
    assert_eq!(client.transport().calls_count(), calls);
}

#[tokio::test]
async fn test_connected_session_is_usable() {
    let client = client_with_sessions(&["g-0"]).await;
    client.transport().respond(json!(["g-0", "remote"]));
    client.list_sessions().await.unwrap();

    let id = client.connect_remote(0).unwrap();
    assert_eq!(client.switch_to(id).unwrap(), GlobalId::new("remote"));
    client.go().await.unwrap();
    let (_, args) = client.transport().last_call();
    assert_eq!(args, json!({"debugSessionId": "remote"}));
}
