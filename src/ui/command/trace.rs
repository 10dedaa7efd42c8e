use crate::client::transport::Transport;
use crate::client::DebugClient;
use crate::ui::command::CommandResult;

/// Switch server-wide message tracing.
pub struct Handler<'a, T: Transport> {
    client: &'a DebugClient<T>,
}

impl<'a, T: Transport> Handler<'a, T> {
    pub fn new(client: &'a DebugClient<T>) -> Self {
        Self { client }
    }

    pub async fn handle(&self, enabled: bool) -> CommandResult<bool> {
        self.client.set_trace(enabled).await?;
        Ok(enabled)
    }
}
