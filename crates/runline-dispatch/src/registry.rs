//! Program loading.
//!
//! Programs are registered up front under an identifier. The CLI names a
//! program by that identifier, or by a path whose file stem matches it, so
//! `runline ./programs/greet.js` and `runline greet` load the same program.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::error::DispatchError;
use crate::resolve::Program;

/// Turns a program identifier into a loaded [`Program`].
pub trait ProgramLoader {
    fn load(&self, id: &str) -> Result<&Program, DispatchError>;
}

/// An in-memory table of programs.
///
/// ```rust
/// use runline_dispatch::{Command, ProgramLoader, Registry};
///
/// let registry = Registry::new()
///     .program("greet", Command::direct(&["name"], |_ctx, args| {
///         Ok::<_, anyhow::Error>(format!("Hello, {}!", args.get(0).unwrap_or("stranger")))
///     }));
///
/// assert!(registry.load("greet").is_ok());
/// assert!(registry.load("./bin/greet.js").is_ok());
/// assert!(registry.load("missing").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Registry {
    programs: BTreeMap<String, Program>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a program, replacing any previous one with the same id.
    pub fn program(mut self, id: impl Into<String>, program: impl Into<Program>) -> Self {
        self.programs.insert(id.into(), program.into());
        self
    }

    pub fn contains(&self, id: &str) -> bool {
        self.programs.contains_key(id)
    }

    /// Registered identifiers in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.programs.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Program)> {
        self.programs.iter().map(|(id, program)| (id.as_str(), program))
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

impl ProgramLoader for Registry {
    fn load(&self, id: &str) -> Result<&Program, DispatchError> {
        if let Some(program) = self.programs.get(id) {
            return Ok(program);
        }

        let stem = Path::new(id).file_stem().and_then(|stem| stem.to_str());
        if let Some(program) = stem.and_then(|stem| self.programs.get(stem)) {
            debug!(id, stem, "loaded program by file stem");
            return Ok(program);
        }

        Err(DispatchError::ProgramNotFound {
            program: id.to_string(),
        })
    }
}
