use crate::client::registry::{GlobalId, LocalId};
use crate::client::transport::Transport;
use crate::client::DebugClient;
use crate::ui::command::CommandResult;
use log::info;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Open a new session and make it current.
    New,
    Info,
    Switch(LocalId),
    Close(LocalId),
}

/// Local session slot as seen by a user.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionInfo {
    pub local_id: LocalId,
    /// `None` for closed sessions.
    pub global_id: Option<GlobalId>,
    pub current: bool,
}

pub enum ExecutionResult {
    Opened(LocalId, GlobalId),
    Switched(LocalId, GlobalId),
    Closed(LocalId),
    Info(Vec<SessionInfo>),
}

pub struct Handler<'a, T: Transport> {
    client: &'a DebugClient<T>,
}

impl<'a, T: Transport> Handler<'a, T> {
    pub fn new(client: &'a DebugClient<T>) -> Self {
        Self { client }
    }

    pub async fn handle(&self, cmd: Command) -> CommandResult<ExecutionResult> {
        match cmd {
            Command::New => {
                let id = self.client.open().await?;
                let global_id = self.client.switch_to(id)?;
                info!(target: "session", "session {id} opened as {global_id}");
                Ok(ExecutionResult::Opened(id, global_id))
            }
            Command::Info => {
                let registry = self.client.registry();
                let current = registry.current_id();
                let sessions = registry
                    .slots()
                    .map(|(local_id, session)| SessionInfo {
                        local_id,
                        global_id: session.map(|s| s.global_id().clone()),
                        current: current == Some(local_id),
                    })
                    .collect();
                Ok(ExecutionResult::Info(sessions))
            }
            Command::Switch(id) => {
                let global_id = self.client.switch_to(id)?;
                Ok(ExecutionResult::Switched(id, global_id))
            }
            Command::Close(id) => {
                self.client.close(id).await?;
                Ok(ExecutionResult::Closed(id))
            }
        }
    }
}
