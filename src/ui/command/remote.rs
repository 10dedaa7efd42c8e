use crate::client::registry::{GlobalId, LocalId};
use crate::client::transport::Transport;
use crate::client::DebugClient;
use crate::ui::command::CommandResult;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Query sessions known by the server.
    List,
    /// Connect a session from the last listing by its index.
    Connect(usize),
}

pub enum ExecutionResult {
    Listing(Vec<GlobalId>),
    Connected(LocalId, GlobalId),
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
            Command::List => Ok(ExecutionResult::Listing(
                self.client.list_sessions().await?,
            )),
            Command::Connect(index) => {
                let id = self.client.connect_remote(index)?;
                let global_id = self.client.switch_to(id)?;
                Ok(ExecutionResult::Connected(id, global_id))
            }
        }
    }
}
