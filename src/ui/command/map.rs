use crate::client::expression;
use crate::client::transport::Transport;
use crate::client::{DebugClient, Error};
use crate::ui::command::CommandResult;
use serde_json::Value;

/// Message map navigation and editing.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Go,
    /// Move map cursor to a zero-based target index.
    GoTo(u32),
    AddTarget {
        /// Zero-based insert position, server chooses it if `None`.
        target_id: Option<u32>,
        expression: String,
    },
    RemoveTarget,
    Dump,
}

pub enum ExecutionResult {
    Continued,
    MovedTo(u32),
    TargetAdded(Value),
    TargetRemoved,
    Dumped,
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
            Command::Go => {
                self.client.go().await?;
                Ok(ExecutionResult::Continued)
            }
            Command::GoTo(target_id) => {
                self.client.go_to(target_id).await?;
                Ok(ExecutionResult::MovedTo(target_id))
            }
            Command::AddTarget {
                target_id,
                expression,
            } => {
                let target = expression::compile(&expression)
                    .map_err(Error::from)?
                    .evaluate(&Value::Null)?;
                self.client.add_map_target(target_id, target.clone()).await?;
                Ok(ExecutionResult::TargetAdded(target))
            }
            Command::RemoveTarget => {
                self.client.remove_map_target().await?;
                Ok(ExecutionResult::TargetRemoved)
            }
            Command::Dump => {
                self.client.make_dump().await?;
                Ok(ExecutionResult::Dumped)
            }
        }
    }
}
