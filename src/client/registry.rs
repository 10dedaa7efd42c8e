//! Local registry of debug sessions.
//!
//! Every session known to the client has two identities: a local ordinal, assigned in order of
//! appearance and never reused, and a global id, issued by the server. A closed session leaves a
//! tombstone in its slot so ordinals of other sessions stay stable.

use crate::client::error::Error;
use crate::client::state::BreakpointMode;
use crate::client::watch::WatchExpression;
use log::{debug, info};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

/// Client-assigned session ordinal.
pub type LocalId = usize;

/// Server-assigned session identifier, opaque for the client.
///
/// Keeps the json value exactly as the server issued it (a string or a number), so it is sent
/// back unchanged. Two ids are equal only if their json values are equal.
#[derive(Debug, Clone)]
pub struct GlobalId {
    raw: Value,
    text: String,
}

impl GlobalId {
    pub fn new(id: impl Into<String>) -> Self {
        let text = id.into();
        Self {
            raw: Value::String(text.clone()),
            text,
        }
    }

    /// Read identifier from json, both strings and numbers are accepted.
    pub fn from_value(value: &Value) -> Option<Self> {
        let text = match value {
            Value::String(id) if !id.is_empty() => id.clone(),
            Value::Number(id) => id.to_string(),
            _ => return None,
        };
        Some(Self {
            raw: value.clone(),
            text,
        })
    }

    /// Identifier as it was received from the server.
    pub fn as_value(&self) -> &Value {
        &self.raw
    }

    /// Printable form of identifier.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// First 8 characters of identifier.
    pub fn short(&self) -> &str {
        match self.text.char_indices().nth(8) {
            Some((idx, _)) => &self.text[..idx],
            None => &self.text,
        }
    }
}

impl PartialEq for GlobalId {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for GlobalId {}

impl Hash for GlobalId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // serialized form separates `"17"` from `17` the same way equality does
        self.raw.to_string().hash(state)
    }
}

impl Display for GlobalId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<GlobalId> for Value {
    fn from(id: GlobalId) -> Self {
        id.raw
    }
}

#[derive(Debug)]
pub struct Session {
    local_id: LocalId,
    global_id: GlobalId,
    watches: Vec<WatchExpression>,
    breakpoint_counter: u32,
    trace_counter: u32,
}

impl Session {
    fn new(local_id: LocalId, global_id: GlobalId) -> Self {
        Self {
            local_id,
            global_id,
            watches: vec![],
            breakpoint_counter: 1,
            trace_counter: 1,
        }
    }

    pub fn local_id(&self) -> LocalId {
        self.local_id
    }

    pub fn global_id(&self) -> &GlobalId {
        &self.global_id
    }

    pub fn watches(&self) -> &[WatchExpression] {
        &self.watches
    }

    /// Append a watch, return its number (starts from 1).
    pub fn add_watch(&mut self, watch: WatchExpression) -> usize {
        self.watches.push(watch);
        self.watches.len()
    }

    /// Remove a watch by its number (starts from 1).
    pub fn remove_watch(&mut self, number: usize) -> Result<WatchExpression, Error> {
        if number == 0 || number > self.watches.len() {
            return Err(Error::WatchNotFound(number));
        }
        Ok(self.watches.remove(number - 1))
    }

    /// Generate name for a new unnamed breakpoint: `bp<N>` for point and `tr<N>` for trace mode.
    pub fn next_breakpoint_name(&mut self, mode: BreakpointMode) -> String {
        let (prefix, counter) = match mode {
            BreakpointMode::Point => ("bp", &mut self.breakpoint_counter),
            BreakpointMode::Trace => ("tr", &mut self.trace_counter),
        };
        let name = format!("{prefix}{counter}");
        *counter += 1;
        name
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    sessions: Vec<Option<Session>>,
    local_ids: HashMap<GlobalId, LocalId>,
    current: Option<LocalId>,
    /// Result of the last remote sessions listing, `None` marks an already connected entry.
    unconnected: Vec<Option<GlobalId>>,
}

impl Registry {
    /// Add a new session, return its local id.
    pub fn insert(&mut self, global_id: GlobalId) -> LocalId {
        let local_id = self.sessions.len();
        info!(target: "session", "new session {global_id}, local id = {local_id}");
        self.local_ids.insert(global_id.clone(), local_id);
        self.sessions.push(Some(Session::new(local_id, global_id)));
        local_id
    }

    /// Number of slots (including closed sessions).
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn get(&self, id: LocalId) -> Result<&Session, Error> {
        self.sessions
            .get(id)
            .ok_or(Error::OutOfRange(id))?
            .as_ref()
            .ok_or(Error::ClosedSession(id))
    }

    pub fn get_mut(&mut self, id: LocalId) -> Result<&mut Session, Error> {
        self.sessions
            .get_mut(id)
            .ok_or(Error::OutOfRange(id))?
            .as_mut()
            .ok_or(Error::ClosedSession(id))
    }

    pub fn current_id(&self) -> Option<LocalId> {
        self.current
    }

    pub fn current(&self) -> Result<&Session, Error> {
        let id = self.current.ok_or(Error::NoCurrentSession)?;
        self.get(id)
    }

    pub fn current_mut(&mut self) -> Result<&mut Session, Error> {
        let id = self.current.ok_or(Error::NoCurrentSession)?;
        self.get_mut(id)
    }

    pub fn switch_to(&mut self, id: LocalId) -> Result<&Session, Error> {
        self.get(id)?;
        debug!(target: "session", "switch to session {id}");
        self.current = Some(id);
        self.get(id)
    }

    /// Validate a close request.
    /// Return global id of the session to close or `None` if the session is already closed.
    pub fn close_target(&self, id: LocalId) -> Result<Option<GlobalId>, Error> {
        let slot = self.sessions.get(id).ok_or(Error::OutOfRange(id))?;
        Ok(slot.as_ref().map(|session| session.global_id.clone()))
    }

    /// Mark session slot as closed. Closing the current session clears the current pointer.
    pub fn tombstone(&mut self, id: LocalId) {
        let Some(slot) = self.sessions.get_mut(id) else {
            return;
        };
        if let Some(session) = slot.take() {
            info!(target: "session", "session {} (local id = {id}) closed", session.global_id);
            self.local_ids.remove(&session.global_id);
        }
        if self.current == Some(id) {
            log::warn!(target: "session", "current session {id} was closed");
            self.current = None;
        }
    }

    /// Iterate over all slots, closed sessions are `None`.
    pub fn slots(&self) -> impl Iterator<Item = (LocalId, Option<&Session>)> {
        self.sessions
            .iter()
            .enumerate()
            .map(|(id, slot)| (id, slot.as_ref()))
    }

    pub fn local_id_of(&self, global_id: &GlobalId) -> Option<LocalId> {
        self.local_ids.get(global_id).copied()
    }

    /// Replace remote sessions listing by ids that are not present locally.
    /// Return the new listing.
    pub fn replace_listing(&mut self, known: impl IntoIterator<Item = GlobalId>) -> Vec<GlobalId> {
        let listing: Vec<GlobalId> = known
            .into_iter()
            .filter(|id| !self.local_ids.contains_key(id))
            .collect();
        debug!(target: "session", "{} unconnected remote session(s)", listing.len());
        self.unconnected = listing.iter().cloned().map(Some).collect();
        listing
    }

    /// Materialize a listed remote session as a local one.
    pub fn connect_remote(&mut self, index: usize) -> Result<LocalId, Error> {
        let global_id = self
            .unconnected
            .get_mut(index)
            .and_then(Option::take)
            .ok_or(Error::NoSuchRemoteIndex(index))?;

        if let Some(local_id) = self.local_id_of(&global_id) {
            return Ok(local_id);
        }
        Ok(self.insert(global_id))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn gid(id: &str) -> GlobalId {
        GlobalId::new(id)
    }

    #[test]
    fn test_local_ids_are_sequential() {
        let mut registry = Registry::default();
        for (expected, global) in ["a", "b", "c"].into_iter().enumerate() {
            let id = registry.insert(gid(global));
            assert_eq!(id, expected);
            assert_eq!(registry.get(id).unwrap().global_id(), &gid(global));
            assert_eq!(registry.local_id_of(&gid(global)), Some(id));
        }

        registry.tombstone(1);
        assert_eq!(registry.insert(gid("d")), 3);
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_switch() {
        let mut registry = Registry::default();
        registry.insert(gid("a"));
        registry.insert(gid("b"));

        assert!(matches!(registry.current(), Err(Error::NoCurrentSession)));
        registry.switch_to(1).unwrap();
        assert_eq!(registry.current_id(), Some(1));

        assert!(matches!(registry.switch_to(5), Err(Error::OutOfRange(5))));
        registry.tombstone(0);
        assert!(matches!(registry.switch_to(0), Err(Error::ClosedSession(0))));
        assert_eq!(registry.current_id(), Some(1));
    }

    #[test]
    fn test_close_target() {
        let mut registry = Registry::default();
        registry.insert(gid("a"));

        assert!(matches!(registry.close_target(1), Err(Error::OutOfRange(1))));
        assert_eq!(registry.close_target(0).unwrap(), Some(gid("a")));
        registry.tombstone(0);
        assert_eq!(registry.close_target(0).unwrap(), None);
        registry.tombstone(0);
        assert!(matches!(registry.get(0), Err(Error::ClosedSession(0))));
    }

    #[test]
    fn test_tombstone_current() {
        let mut registry = Registry::default();
        registry.insert(gid("a"));
        registry.switch_to(0).unwrap();
        registry.tombstone(0);
        assert_eq!(registry.current_id(), None);
    }

    #[test]
    fn test_remote_listing() {
        let mut registry = Registry::default();
        registry.insert(gid("a"));

        let listing = registry.replace_listing([gid("a"), gid("b"), gid("c")]);
        assert_eq!(listing, vec![gid("b"), gid("c")]);

        let id = registry.connect_remote(1).unwrap();
        assert_eq!(id, 1);
        assert_eq!(registry.get(id).unwrap().global_id(), &gid("c"));
        assert!(matches!(
            registry.connect_remote(1),
            Err(Error::NoSuchRemoteIndex(1))
        ));
        assert!(matches!(
            registry.connect_remote(2),
            Err(Error::NoSuchRemoteIndex(2))
        ));

        // new listing invalidates the old one
        registry.replace_listing([gid("d")]);
        assert!(matches!(
            registry.connect_remote(1),
            Err(Error::NoSuchRemoteIndex(1))
        ));
        assert_eq!(registry.connect_remote(0).unwrap(), 2);
    }

    #[test]
    fn test_breakpoint_names() {
        let mut registry = Registry::default();
        registry.insert(gid("a"));
        let session = registry.get_mut(0).unwrap();

        assert_eq!(session.next_breakpoint_name(BreakpointMode::Point), "bp1");
        assert_eq!(session.next_breakpoint_name(BreakpointMode::Point), "bp2");
        assert_eq!(session.next_breakpoint_name(BreakpointMode::Trace), "tr1");
        assert_eq!(session.next_breakpoint_name(BreakpointMode::Point), "bp3");
    }

    #[test]
    fn test_global_id() {
        assert_eq!(
            GlobalId::from_value(&serde_json::json!("0123456789abcdef"))
                .unwrap()
                .short(),
            "01234567"
        );
        assert_eq!(GlobalId::from_value(&serde_json::json!(42)).unwrap().short(), "42");
        assert!(GlobalId::from_value(&serde_json::json!(null)).is_none());

        let numeric = GlobalId::from_value(&serde_json::json!(17)).unwrap();
        assert_eq!(numeric.as_str(), "17");
        assert_eq!(Value::from(numeric.clone()), serde_json::json!(17));
        assert_ne!(numeric, GlobalId::new("17"));
    }
}
