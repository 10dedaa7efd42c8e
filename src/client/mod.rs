//! Debug session client.
//!
//! [`DebugClient`] is the most preferred way to talk to a debugger server: it resolves the
//! session a command belongs to, scopes remote calls with the server session id, classifies
//! responses and keeps the local session registry up to date.
//!
//! Client is designed for a single control thread. Remote calls are futures, any number of them
//! may be in flight at once and complete in any order. Registry is never borrowed across an
//! `.await`.

pub mod error;
pub mod exception;
pub mod expression;
pub mod registry;
pub mod state;
pub mod transport;
pub mod watch;

pub use error::Error;

use crate::client::expression::is_truthy;
use crate::client::registry::{GlobalId, LocalId, Registry};
use crate::client::state::{BreakpointMode, MapSnapshot};
use crate::client::transport::Transport;
use crate::client::watch::WatchExpression;
use log::debug;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::cell::{Ref, RefCell};

pub const OPEN_SESSION: &str = "openSession";
pub const CLOSE_SESSION: &str = "closeSession";
pub const LIST_SESSIONS: &str = "listSessions";
pub const SET_MESSAGE_CONTENT: &str = "setMessageContent";
pub const SET_TRACE: &str = "setTrace";
pub const GO: &str = "go";
pub const GO_TO: &str = "goTo";
pub const NEW_BREAKPOINT: &str = "newBreakpoint";
pub const MODIFY_BREAKPOINT: &str = "modifyBreakpoint";
pub const ADD_MAP_TARGET: &str = "addMapTarget";
pub const REMOVE_MAP_TARGET: &str = "removeMapTarget";
pub const MAKE_DUMP: &str = "makeDump";
pub const GET_STATE: &str = "getState";

/// Request for a new breakpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBreakpoint {
    /// Breakpoint name, generated if `None`.
    pub name: Option<String>,
    pub mode: BreakpointMode,
    /// Zero-based map target index, always `None` for trace breakpoints.
    pub target_id: Option<u32>,
    pub break_before: bool,
    pub break_after: bool,
}

impl NewBreakpoint {
    /// Point breakpoint that breaks before the target.
    pub fn point(target_id: u32) -> Self {
        Self {
            name: None,
            mode: BreakpointMode::Point,
            target_id: Some(target_id),
            break_before: true,
            break_after: false,
        }
    }

    /// Trace breakpoint that breaks before every step.
    pub fn trace() -> Self {
        Self {
            name: None,
            mode: BreakpointMode::Trace,
            target_id: None,
            break_before: true,
            break_after: false,
        }
    }

    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..self
        }
    }

    pub fn with_flags(self, break_before: bool, break_after: bool) -> Self {
        Self {
            break_before,
            break_after,
            ..self
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewBreakpointArgs<'a> {
    break_after: bool,
    break_before: bool,
    active: bool,
    breakpoint_mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_id: Option<u32>,
    breakpoint_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddMapTargetArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    target_id: Option<u32>,
    message_target: Value,
}

fn into_args(args: impl Serialize) -> Result<Map<String, Value>, Error> {
    match serde_json::to_value(args)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

fn args(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Turn a decoded response into a result: a response with a truthy `exception` is a remote
/// failure.
pub fn classify_response(response: Value) -> Result<Value, Error> {
    match response.get("exception") {
        Some(exception) if is_truthy(exception) => Err(Error::RemoteLogic(
            exception::root_message(exception),
        )),
        _ => Ok(response),
    }
}

fn listed_session_ids(response: &Value) -> Result<Vec<GlobalId>, Error> {
    let ids = match response {
        Value::Array(ids) => ids,
        other => other
            .get("debugSessionIds")
            .and_then(Value::as_array)
            .ok_or(Error::UnexpectedResponse(
                "no `debugSessionIds` in listSessions response",
            ))?,
    };
    Ok(ids.iter().filter_map(GlobalId::from_value).collect())
}

/// Debug session client.
pub struct DebugClient<T: Transport> {
    transport: T,
    registry: RefCell<Registry>,
}

impl<T: Transport> DebugClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            registry: RefCell::new(Registry::default()),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Read-only access to the session registry.
    pub fn registry(&self) -> Ref<'_, Registry> {
        self.registry.borrow()
    }

    async fn call(&self, command: &str, args: Map<String, Value>) -> Result<Value, Error> {
        classify_response(self.transport.call(command, args).await?)
    }

    async fn call_for(
        &self,
        global_id: &GlobalId,
        command: &str,
        mut args: Map<String, Value>,
    ) -> Result<Value, Error> {
        args.insert("debugSessionId".to_string(), global_id.clone().into());
        self.call(command, args).await
    }

    fn current_global_id(&self) -> Result<GlobalId, Error> {
        Ok(self.registry.borrow().current()?.global_id().clone())
    }

    /// Call a command in a scope of the current session.
    pub async fn call_session(
        &self,
        command: &str,
        args: Map<String, Value>,
    ) -> Result<Value, Error> {
        let global_id = self.current_global_id()?;
        self.call_for(&global_id, command, args).await
    }

    /// Open a new debug session, return its local id. Current session is not changed.
    pub async fn open(&self) -> Result<LocalId, Error> {
        let response = self.call(OPEN_SESSION, Map::new()).await?;
        let global_id = response
            .get("debugSessionId")
            .and_then(GlobalId::from_value)
            .ok_or(Error::UnexpectedResponse(
                "no `debugSessionId` in openSession response",
            ))?;
        Ok(self.registry.borrow_mut().insert(global_id))
    }

    /// Close a session. Closing an already closed session is a no-op, closing the current
    /// session is rejected.
    ///
    /// Unless the server is unreachable, the session is considered closed even if the server
    /// reports an error, that error is returned after the slot is tombstoned.
    pub async fn close(&self, id: LocalId) -> Result<(), Error> {
        let global_id = {
            let registry = self.registry.borrow();
            if registry.current_id() == Some(id) {
                return Err(Error::CloseCurrentSession(id));
            }
            match registry.close_target(id)? {
                Some(global_id) => global_id,
                None => return Ok(()),
            }
        };

        match self.call_for(&global_id, CLOSE_SESSION, Map::new()).await {
            Err(e) if e.is_network() => Err(e),
            result => {
                self.registry.borrow_mut().tombstone(id);
                result.map(|_| ())
            }
        }
    }

    /// Make a session current, return its global id.
    pub fn switch_to(&self, id: LocalId) -> Result<GlobalId, Error> {
        let mut registry = self.registry.borrow_mut();
        Ok(registry.switch_to(id)?.global_id().clone())
    }

    /// Query all sessions known by the server. Sessions absent locally become the new
    /// unconnected listing, which is returned.
    pub async fn list_sessions(&self) -> Result<Vec<GlobalId>, Error> {
        let response = self.call_session(LIST_SESSIONS, Map::new()).await?;
        let known = listed_session_ids(&response)?;
        Ok(self.registry.borrow_mut().replace_listing(known))
    }

    /// Connect a session from the last listing, no remote call is made.
    pub fn connect_remote(&self, index: usize) -> Result<LocalId, Error> {
        self.registry.borrow_mut().connect_remote(index)
    }

    pub async fn set_message_content(&self, content: Value, target: Value) -> Result<Value, Error> {
        self.call_session(
            SET_MESSAGE_CONTENT,
            args(json!({
                "messageContent": content,
                "messageTarget": target,
            })),
        )
        .await
    }

    pub async fn set_trace(&self, enabled: bool) -> Result<Value, Error> {
        self.call_session(SET_TRACE, args(json!({ "trace": enabled })))
            .await
    }

    pub async fn go(&self) -> Result<Value, Error> {
        self.call_session(GO, Map::new()).await
    }

    pub async fn go_to(&self, target_id: u32) -> Result<Value, Error> {
        self.call_session(GO_TO, args(json!({ "targetId": target_id })))
            .await
    }

    /// Create a breakpoint in the current session, return its name.
    ///
    /// Generated name is reserved before the remote call, so concurrent requests never share a
    /// name. A failed request leaves a gap in the numbering (`bp1`, `bp3`).
    pub async fn new_breakpoint(&self, request: NewBreakpoint) -> Result<String, Error> {
        let (global_id, name) = {
            let mut registry = self.registry.borrow_mut();
            let session = registry.current_mut()?;
            let name = match request.name {
                Some(name) => name,
                None => session.next_breakpoint_name(request.mode),
            };
            (session.global_id().clone(), name)
        };

        let target_id = match request.mode {
            BreakpointMode::Point => request.target_id,
            BreakpointMode::Trace => None,
        };
        let args = into_args(NewBreakpointArgs {
            break_after: request.break_after,
            break_before: request.break_before,
            active: true,
            breakpoint_mode: request.mode.to_string(),
            target_id,
            breakpoint_id: &name,
        })?;

        debug!(target: "session", "new {} breakpoint `{name}`", request.mode);
        self.call_for(&global_id, NEW_BREAKPOINT, args).await?;
        Ok(name)
    }

    pub async fn modify_breakpoint(&self, name: &str, active: bool) -> Result<Value, Error> {
        self.call_session(
            MODIFY_BREAKPOINT,
            args(json!({
                "breakpointId": name,
                "active": active,
            })),
        )
        .await
    }

    pub async fn add_map_target(
        &self,
        target_id: Option<u32>,
        message_target: Value,
    ) -> Result<Value, Error> {
        let args = into_args(AddMapTargetArgs {
            target_id,
            message_target,
        })?;
        self.call_session(ADD_MAP_TARGET, args).await
    }

    pub async fn remove_map_target(&self) -> Result<Value, Error> {
        self.call_session(REMOVE_MAP_TARGET, Map::new()).await
    }

    pub async fn make_dump(&self) -> Result<Value, Error> {
        self.call_session(MAKE_DUMP, Map::new()).await
    }

    /// Query raw state of the current session.
    pub async fn get_state(&self) -> Result<Value, Error> {
        self.call_session(GET_STATE, Map::new()).await
    }

    /// Query state of the current session.
    pub async fn snapshot(&self) -> Result<MapSnapshot, Error> {
        Ok(MapSnapshot::from_value(&self.get_state().await?))
    }

    /// Compile and add a watch expression to the current session, return watch number.
    pub fn add_watch(&self, source: &str) -> Result<usize, Error> {
        let mut registry = self.registry.borrow_mut();
        let session = registry.current_mut()?;
        let watch = WatchExpression::compile(source)?;
        Ok(session.add_watch(watch))
    }

    /// Remove a watch expression of the current session by its number.
    pub fn remove_watch(&self, number: usize) -> Result<WatchExpression, Error> {
        self.registry.borrow_mut().current_mut()?.remove_watch(number)
    }

    /// Return a copy of session watch expressions.
    pub fn watches(&self, id: LocalId) -> Result<Vec<WatchExpression>, Error> {
        Ok(self.registry.borrow().get(id)?.watches().to_vec())
    }
}
