//! Standard exit codes (BSD sysexits.h compatible)

use runline_dispatch::DispatchError;

/// Successful termination
pub const OK: i32 = 0;

/// Command line usage error: missing program or command, unknown program
/// or command, non-callable target
pub const USAGE: i32 = 64;

/// The invoked function failed
pub const SOFTWARE: i32 = 70;

/// The result could not be serialized or written
pub const IOERR: i32 = 74;

/// Exit code for a failed run.
pub fn for_error(err: &DispatchError) -> i32 {
    match err {
        DispatchError::MissingArgument { .. }
        | DispatchError::CommandNotFound { .. }
        | DispatchError::InvalidTarget { .. }
        | DispatchError::ProgramNotFound { .. } => USAGE,
        DispatchError::Invocation(_) => SOFTWARE,
        DispatchError::Serialize(_) | DispatchError::Io(_) => IOERR,
    }
}
