use crate::client::state::{Dump, MapSnapshot};
use crate::client::transport::Transport;
use crate::client::watch::WatchExpression;
use crate::client::{DebugClient, Error};
use crate::ui::command::CommandResult;
use serde_json::Value;
use strum_macros::{Display, EnumIter, EnumMessage, EnumString};

/// Named aspect of a session state.
#[derive(Debug, Clone, Copy, PartialEq, Display, EnumString, EnumIter, EnumMessage)]
pub enum Aspect {
    #[strum(serialize = "watch", message = "watch expressions over the current message")]
    Watch,
    #[strum(serialize = "map", message = "message map with cursor and breakpoints")]
    Map,
    #[strum(serialize = "exception", message = "last exception raised while debugging")]
    Exception,
    #[strum(serialize = "dumps", message = "dumps made by the `dump` command")]
    Dumps,
    #[strum(serialize = "help", message = "this list")]
    Help,
}

pub enum ExecutionResult {
    Watch {
        message_content: Option<Value>,
        watches: Vec<WatchExpression>,
    },
    Map(MapSnapshot),
    Exception(Option<Value>),
    Dumps(Vec<Dump>),
    Help,
}

pub struct Handler<'a, T: Transport> {
    client: &'a DebugClient<T>,
}

impl<'a, T: Transport> Handler<'a, T> {
    pub fn new(client: &'a DebugClient<T>) -> Self {
        Self { client }
    }

    pub async fn handle(&self, aspect: Aspect) -> CommandResult<ExecutionResult> {
        if aspect == Aspect::Help {
            return Ok(ExecutionResult::Help);
        }

        // watches belong to the session current at the moment the command issued
        let watches = {
            let registry = self.client.registry();
            let id = registry.current_id().ok_or(Error::NoCurrentSession)?;
            registry.get(id)?.watches().to_vec()
        };
        let mut snapshot = self.client.snapshot().await?;

        let result = match aspect {
            Aspect::Watch => ExecutionResult::Watch {
                message_content: snapshot.message_content,
                watches,
            },
            Aspect::Map => ExecutionResult::Map(snapshot),
            Aspect::Exception => ExecutionResult::Exception(snapshot.last_exception.take()),
            Aspect::Dumps => ExecutionResult::Dumps(snapshot.dumps),
            Aspect::Help => ExecutionResult::Help,
        };
        Ok(result)
    }

    /// Raw session state.
    pub async fn stat(&self) -> CommandResult<Value> {
        Ok(self.client.get_state().await?)
    }
}
