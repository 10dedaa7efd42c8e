use crate::client::expression::CompileError;
use crate::client::registry::LocalId;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // --------------------------------- transport errors ------------------------------------------
    #[error("network error: {0:#}")]
    Network(anyhow::Error),
    #[error("server responded with code {code} ({message})")]
    ServerStatus { code: u16, message: String },
    #[error("malformed server response: {0}")]
    Decode(#[from] serde_json::Error),

    // --------------------------------- remote errors ---------------------------------------------
    #[error("unexpected server response: {0}")]
    UnexpectedResponse(&'static str),
    #[error("server error: {0}")]
    RemoteLogic(String),

    // --------------------------------- session policy errors -------------------------------------
    #[error("session id {0} is out of range")]
    OutOfRange(LocalId),
    #[error("session {0} is closed")]
    ClosedSession(LocalId),
    #[error("no remote session with index {0}, use `remote list` first")]
    NoSuchRemoteIndex(usize),
    #[error("can not close current session {0}, switch to another session first")]
    CloseCurrentSession(LocalId),
    #[error("no current session, switch to an open session first")]
    NoCurrentSession,

    // --------------------------------- watch and expression errors -------------------------------
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error("watch #{0} not found")]
    WatchNotFound(usize),
}

impl Error {
    /// Return true if request never reached the server (or the answer never reached us).
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_))
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! _error {
    ($log_fn: path, $res: expr) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                $log_fn!(target: "console", "{:#}", e);
                None
            }
        }
    };
    ($log_fn: path, $res: expr, $msg: tt) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                $log_fn!(target: "console", concat!($msg, " {:#}"), e);
                None
            }
        }
    };
}

/// Transforms `Result` into `Option` and logs an error if it occurs.
#[macro_export]
macro_rules! weak_error {
    ($res: expr) => {
        $crate::_error!(log::warn, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!(log::warn, $res, $msg)
    };
}

/// Transforms `Result` into `Option` and put error into debug logs if it occurs.
#[macro_export]
macro_rules! muted_error {
    ($res: expr) => {
        $crate::_error!(log::debug, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!(log::debug, $res, $msg)
    };
}
