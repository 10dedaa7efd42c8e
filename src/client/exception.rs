//! Remote exception unwinding.
//!
//! Server reports logical failures as a serialized exception object with an optional `cause`
//! link. Chain walking is bounded, malformed or very deep chains never hang the client.

use serde_json::Value;

/// Maximum number of `cause` links followed.
pub const MAX_CAUSE_DEPTH: usize = 64;

const UNKNOWN_ERROR: &str = "unknown error";

/// Return the exception followed by its causes, at most [`MAX_CAUSE_DEPTH`] + 1 nodes.
pub fn cause_chain(exception: &Value) -> Vec<&Value> {
    let mut chain = vec![exception];
    let mut node = exception;
    for _ in 0..MAX_CAUSE_DEPTH {
        match node.get("cause") {
            Some(cause) if !cause.is_null() => {
                chain.push(cause);
                node = cause;
            }
            _ => break,
        }
    }
    chain
}

/// Message of a single exception node: `detailMessage` or, if absent, `message`.
pub fn node_message(node: &Value) -> Option<&str> {
    ["detailMessage", "message"]
        .into_iter()
        .filter_map(|field| node.get(field).and_then(Value::as_str))
        .find(|msg| !msg.is_empty())
}

/// Return the message of the deepest reachable cause that has one.
pub fn root_message(exception: &Value) -> String {
    cause_chain(exception)
        .into_iter()
        .rev()
        .find_map(node_message)
        .unwrap_or(UNKNOWN_ERROR)
        .to_string()
}
