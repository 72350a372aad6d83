//! Command envelope sent from the client to the terminal.
//!
//! A `Command` pairs an operation id from the catalogue with an ordered list of
//! parameters. The dispatcher is agnostic to what the parameters mean; the
//! typed shims are responsible for arity and order.
use serde::{Deserialize, Serialize};

use crate::command_type::MtCommandType;
use crate::value::Value;

/// Command payload sent to the terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Operation identifier (serialized as its integer id).
    pub operation: MtCommandType,
    /// Ordered parameter list (may be empty).
    pub parameters: Vec<Value>,
}

impl Command {
    /// Creates a command with the given parameters.
    pub fn new(operation: MtCommandType, parameters: Vec<Value>) -> Self {
        Command {
            operation,
            parameters,
        }
    }

    /// Creates a command without parameters.
    pub fn bare(operation: MtCommandType) -> Self {
        Command::new(operation, Vec::new())
    }

    /// Starts building a parameter list for `operation`.
    pub fn builder(operation: MtCommandType) -> CommandBuilder {
        CommandBuilder {
            operation,
            parameters: Vec::new(),
        }
    }

    /// Parameter at `index`, if present.
    pub fn param(&self, index: usize) -> Option<&Value> {
        self.parameters.get(index)
    }
}

/// Incremental builder for parameter lists.
#[derive(Debug)]
pub struct CommandBuilder {
    operation: MtCommandType,
    parameters: Vec<Value>,
}

impl CommandBuilder {
    /// Appends one parameter.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.parameters.push(value.into());
        self
    }

    /// Appends the array length followed by each element, the layout the
    /// terminal expects for `*OnArray` and custom-indicator inputs.
    pub fn counted<T: Into<Value> + Copy>(mut self, values: &[T]) -> Self {
        self.parameters.push(Value::Int(values.len() as i32));
        self.parameters.extend(values.iter().map(|v| (*v).into()));
        self
    }

    /// Finishes the command.
    pub fn build(self) -> Command {
        Command {
            operation: self.operation,
            parameters: self.parameters,
        }
    }
}
