use async_trait::async_trait;
use serde_json::{json, Map, Value};
use smdbg::client::transport::Transport;
use smdbg::client::{DebugClient, Error};
use std::cell::RefCell;
use std::collections::VecDeque;
use tokio::sync::oneshot;

enum Reply {
    Ready(Result<Value, Error>),
    Later(oneshot::Receiver<Value>),
}

/// In-memory transport that answers with scripted responses and records every call.
/// Unscripted calls are answered with an empty object.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: RefCell<VecDeque<Reply>>,
    calls: RefCell<Vec<(String, Value)>>,
}

impl ScriptedTransport {
    pub fn respond(&self, value: Value) {
        self.replies.borrow_mut().push_back(Reply::Ready(Ok(value)));
    }

    pub fn fail(&self, err: Error) {
        self.replies.borrow_mut().push_back(Reply::Ready(Err(err)));
    }

    /// Answer the next call when a value is sent into returned channel.
    pub fn respond_later(&self) -> oneshot::Sender<Value> {
        let (tx, rx) = oneshot::channel();
        self.replies.borrow_mut().push_back(Reply::Later(rx));
        tx
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.borrow().clone()
    }

    pub fn last_call(&self) -> (String, Value) {
        self.calls.borrow().last().cloned().expect("no calls")
    }

    pub fn calls_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

#[async_trait(?Send)]
impl Transport for ScriptedTransport {
    async fn call(&self, command: &str, args: Map<String, Value>) -> Result<Value, Error> {
        self.calls
            .borrow_mut()
            .push((command.to_string(), Value::Object(args)));

        let reply = self.replies.borrow_mut().pop_front();
        match reply {
            None => Ok(json!({})),
            Some(Reply::Ready(result)) => result,
            Some(Reply::Later(rx)) => Ok(rx.await.expect("reply sender dropped")),
        }
    }
}

pub fn network_error() -> Error {
    Error::Network(anyhow::anyhow!("connection refused"))
}

/// Client with sessions opened for every global id, first one is current.
pub async fn client_with_sessions(global_ids: &[&str]) -> DebugClient<ScriptedTransport> {
    let client = DebugClient::new(ScriptedTransport::default());
    for global_id in global_ids {
        client
            .transport()
            .respond(json!({ "debugSessionId": global_id }));
        client.open().await.unwrap();
    }
    if !global_ids.is_empty() {
        client.switch_to(0).unwrap();
    }
    client
}
