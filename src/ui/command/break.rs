use crate::client::transport::Transport;
use crate::client::{DebugClient, NewBreakpoint};
use crate::ui::command::CommandResult;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Add(NewBreakpoint),
    Enable(String),
    Disable(String),
}

pub enum ExecutionResult {
    New(String),
    Modified { name: String, active: bool },
}

pub struct Handler<'a, T: Transport> {
    client: &'a DebugClient<T>,
}

impl<'a, T: Transport> Handler<'a, T> {
    pub fn new(client: &'a DebugClient<T>) -> Self {
        Self { client }
    }

    pub async fn handle(&self, cmd: Command) -> CommandResult<ExecutionResult> {
        let result = match cmd {
            Command::Add(request) => {
                ExecutionResult::New(self.client.new_breakpoint(request).await?)
            }
            Command::Enable(name) => {
                self.client.modify_breakpoint(&name, true).await?;
                ExecutionResult::Modified { name, active: true }
            }
            Command::Disable(name) => {
                self.client.modify_breakpoint(&name, false).await?;
                ExecutionResult::Modified {
                    name,
                    active: false,
                }
            }
        };
        Ok(result)
    }
}
