//! Error kinds for resolution and invocation.
//!
//! Resolution errors ([`DispatchError::MissingArgument`],
//! [`DispatchError::CommandNotFound`], [`DispatchError::InvalidTarget`],
//! [`DispatchError::ProgramNotFound`]) are raised before any target runs.
//! Everything a target does wrong, whatever its completion style, ends up as
//! an [`InvocationError`].

use thiserror::Error;

use crate::serialize::SerializeError;

/// Errors produced while resolving, invoking, or printing a command.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A required positional selector (`program`, or `command` for a module
    /// program) was not supplied.
    #[error("\"{argument}\" is a required argument.")]
    MissingArgument { argument: String },

    /// The named sub-command is not a callable export of the program.
    #[error("The command \"{command}\" could not be found in the program's exports.")]
    CommandNotFound { command: String },

    /// The selected export is not callable.
    #[error("\"{name}\" is not a callable target")]
    InvalidTarget { name: String },

    /// The program loader does not know the identifier.
    #[error("The program \"{program}\" could not be loaded.")]
    ProgramNotFound { program: String },

    /// The target failed: threw, rejected, or reported an error to its callback.
    #[error(transparent)]
    Invocation(#[from] InvocationError),

    /// The normalized result could not be serialized.
    #[error(transparent)]
    Serialize(#[from] SerializeError),

    /// Writing the result failed.
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatchError {
    pub fn missing_argument(argument: impl Into<String>) -> Self {
        DispatchError::MissingArgument {
            argument: argument.into(),
        }
    }

    pub fn command_not_found(command: impl Into<String>) -> Self {
        DispatchError::CommandNotFound {
            command: command.into(),
        }
    }

    /// Returns true for errors raised before any target was invoked.
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            DispatchError::MissingArgument { .. }
                | DispatchError::CommandNotFound { .. }
                | DispatchError::InvalidTarget { .. }
                | DispatchError::ProgramNotFound { .. }
        )
    }
}

/// Failure of a single invocation.
///
/// Wraps whatever the target produced as an error. Converting an
/// `anyhow::Error` that already carries an `InvocationError` unwraps it
/// rather than nesting a second layer.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct InvocationError(anyhow::Error);

impl InvocationError {
    pub fn new(source: impl Into<anyhow::Error>) -> Self {
        let source = source.into();
        match source.downcast::<InvocationError>() {
            Ok(inner) => inner,
            Err(source) => InvocationError(source),
        }
    }

    pub fn msg(message: impl std::fmt::Display + std::fmt::Debug + Send + Sync + 'static) -> Self {
        InvocationError(anyhow::Error::msg(message))
    }

    /// The underlying error reported by the target.
    pub fn inner(&self) -> &anyhow::Error {
        &self.0
    }

    pub fn into_inner(self) -> anyhow::Error {
        self.0
    }
}

impl From<anyhow::Error> for InvocationError {
    fn from(source: anyhow::Error) -> Self {
        InvocationError::new(source)
    }
}
