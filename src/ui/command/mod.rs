//! An interface to a debug client.
//! This is the most preferred way to use a client functional from UI layer.
//!
//! Contains commands and corresponding command handlers. Command is a some sort of request to
//! the debugger server that define an action and a list of input arguments. Command handler
//! validate command, define what exactly client must to do and return result of it.

pub mod r#break;
pub mod map;
pub mod message;
pub mod parser;
pub mod remote;
pub mod session;
pub mod show;
pub mod trace;
pub mod watch;

use crate::client::expression::EvalError;
use crate::client::Error;

#[derive(thiserror::Error, Debug)]
pub enum CommandError {
    #[error("malformed command: {0}")]
    Parsing(String),
    #[error("expression evaluation error: {0}")]
    Evaluation(#[from] EvalError),
    #[error(transparent)]
    Handle(#[from] Error),
}

pub type CommandResult<T> = Result<T, CommandError>;

/// External commands that can be processed by the client.
#[derive(Debug, Clone)]
pub enum Command {
    Session(session::Command),
    Remote(remote::Command),
    Breakpoint(r#break::Command),
    Trace(bool),
    Map(map::Command),
    Watch(watch::Command),
    /// Raw `<content> to <target>` text, compiled by handler.
    Message(String),
    Show(show::Aspect),
    Stat,
    SkipInput,
    /// Help for a command or the command list.
    Help(Option<String>),
}
