//! Parameter introspection.
//!
//! Compiled Rust functions carry no parameter names, so the names a target
//! declares are recorded at registration (by hand, or by the `#[command]`
//! macro reading the signature). Introspection reads that record back.

use serde::Serialize;

use crate::error::DispatchError;
use crate::handler::{Command, Export};

/// How a target signals that it is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStyle {
    /// Returns its value.
    Direct,
    /// Returns a future.
    Deferred,
    /// Calls a completion handed to it as the trailing argument.
    CallbackBased,
}

/// Ordered parameter names and whether a completion slot follows them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterInfo {
    /// Declared names, in declaration order. Excludes the completion slot.
    pub param_list: Vec<String>,
    /// True when the target completes through a trailing callback.
    pub has_callback: bool,
}

impl ParameterInfo {
    /// Number of positional slots a call will receive.
    pub fn arity(&self) -> usize {
        self.param_list.len() + usize::from(self.has_callback)
    }
}

/// Returns the parameter record of a registered command.
pub fn inspect(command: &Command) -> &ParameterInfo {
    command.info()
}

/// Inspects a module export, failing when it is not callable.
pub fn inspect_export<'a>(
    name: &str,
    export: &'a Export,
) -> Result<&'a ParameterInfo, DispatchError> {
    match export {
        Export::Command(cmd) => Ok(inspect(cmd)),
        Export::Value(_) => Err(DispatchError::InvalidTarget {
            name: name.to_string(),
        }),
    }
}
