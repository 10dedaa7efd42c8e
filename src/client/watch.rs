use crate::client::expression::{self, CompileError, EvalError, Expression};
use serde_json::Value;

/// User watch expression, lives in a local session and never leaves the client.
#[derive(Debug, Clone)]
pub struct WatchExpression {
    source: String,
    expression: Expression,
}

impl WatchExpression {
    /// Compile watch expression, `$` refers to the current message content.
    pub fn compile(source: &str) -> Result<Self, CompileError> {
        Ok(Self {
            expression: expression::compile(source)?,
            source: source.trim().to_string(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn evaluate(&self, message_content: &Value) -> Result<Value, EvalError> {
        self.expression.evaluate(message_content)
    }
}
