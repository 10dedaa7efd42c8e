use crate::client::transport::Transport;
use crate::client::watch::WatchExpression;
use crate::client::DebugClient;
use crate::ui::command::CommandResult;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Add(String),
    /// Remove watch by its 1-based number.
    Remove(usize),
}

pub enum ExecutionResult {
    Added(usize, String),
    Removed(usize, WatchExpression),
}

pub struct Handler<'a, T: Transport> {
    client: &'a DebugClient<T>,
}

impl<'a, T: Transport> Handler<'a, T> {
    pub fn new(client: &'a DebugClient<T>) -> Self {
        Self { client }
    }

    pub fn handle(&self, cmd: Command) -> CommandResult<ExecutionResult> {
        match cmd {
            Command::Add(source) => {
                let number = self.client.add_watch(&source)?;
                Ok(ExecutionResult::Added(number, source.trim().to_string()))
            }
            Command::Remove(number) => {
                let watch = self.client.remove_watch(number)?;
                Ok(ExecutionResult::Removed(number, watch))
            }
        }
    }
}
