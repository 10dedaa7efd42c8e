use crate::client::expression;
use crate::client::transport::Transport;
use crate::client::{DebugClient, Error};
use crate::ui::command::CommandResult;
use serde_json::Value;

/// Message content injected at the current map target.
#[derive(Debug)]
pub struct Injected {
    pub content: Value,
    pub target: Value,
}

pub struct Handler<'a, T: Transport> {
    client: &'a DebugClient<T>,
}

impl<'a, T: Transport> Handler<'a, T> {
    pub fn new(client: &'a DebugClient<T>) -> Self {
        Self { client }
    }

    /// Compile `<content> to <target>` text, evaluate both sides and send them to the server.
    pub async fn handle(&self, text: &str) -> CommandResult<Injected> {
        let (content, target) = expression::compile_message(text).map_err(Error::from)?;
        let content = content.evaluate(&Value::Null)?;
        let target = target.evaluate(&Value::Null)?;

        self.client
            .set_message_content(content.clone(), target.clone())
            .await?;
        Ok(Injected { content, target })
    }
}
