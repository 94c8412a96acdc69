//! Error reporting.
//!
//! Errors are written as plain text, never as JSON, so a failed run leaves
//! stdout empty and stderr readable.

use std::error::Error;
use std::io::{self, Write};

/// Writes `Error: <message>` and one `caused by` line per source.
pub fn report<W: Write>(err: &dyn Error, out: &mut W) -> io::Result<()> {
    writeln!(out, "Error: {}", err)?;
    let mut source = err.source();
    while let Some(cause) = source {
        writeln!(out, "  caused by: {}", cause)?;
        source = cause.source();
    }
    Ok(())
}
