//! Command resolution.
//!
//! A loaded [`Program`] is either a single callable or a module of named
//! exports. Resolution picks the target to invoke and decides which CLI
//! tokens are arguments.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::args::NamedArguments;
use crate::error::DispatchError;
use crate::handler::{Command, Export};

/// A string-keyed set of exports.
///
/// ```rust
/// use runline_dispatch::{Command, Module};
///
/// let module = Module::new()
///     .command("bar", Command::direct(&[], |_ctx, _args| Ok::<_, anyhow::Error>("bar")))
///     .value("version", "1.0.0");
/// assert_eq!(module.names().collect::<Vec<_>>(), vec!["bar", "version"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Module {
    exports: BTreeMap<String, Export>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a callable export.
    pub fn command(mut self, name: impl Into<String>, command: Command) -> Self {
        self.exports.insert(name.into(), Export::Command(command));
        self
    }

    /// Adds a non-callable export.
    pub fn value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.exports.insert(name.into(), Export::Value(value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Export> {
        self.exports.get(name)
    }

    /// Export names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.exports.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Export)> {
        self.exports.iter().map(|(name, export)| (name.as_str(), export))
    }
}

/// What a program identifier loads to.
#[derive(Debug, Clone)]
pub enum Program {
    /// The program itself is the target.
    Callable(Command),
    /// The target is selected by name.
    Module(Module),
}

impl Program {
    pub fn is_callable(&self) -> bool {
        matches!(self, Program::Callable(_))
    }
}

impl From<Command> for Program {
    fn from(command: Command) -> Self {
        Program::Callable(command)
    }
}

impl From<Module> for Program {
    fn from(module: Module) -> Self {
        Program::Module(module)
    }
}

/// Selects the target of a program.
///
/// A callable program is the target whatever `command_name` says. A module
/// needs a name, and the name must refer to a callable export.
pub fn resolve<'a>(
    program: &'a Program,
    command_name: Option<&str>,
) -> Result<&'a Command, DispatchError> {
    match program {
        Program::Callable(command) => Ok(command),
        Program::Module(module) => {
            let name = command_name.ok_or_else(|| DispatchError::missing_argument("command"))?;
            module
                .get(name)
                .and_then(Export::as_command)
                .ok_or_else(|| DispatchError::command_not_found(name))
        }
    }
}

/// Resolves the target from the CLI tail and builds its named arguments.
///
/// For a callable program every token is an argument, so a leading
/// `greet` becomes the key `greet` with an absent value. For a module the
/// first token is the command name and the rest are arguments.
///
/// ```rust
/// use runline_dispatch::{select, Command, Program};
///
/// let program = Program::from(Command::direct(&["name"], |_ctx, _args| Ok::<_, anyhow::Error>(())));
/// let (_, args) = select(&program, &["greet", "name=Ada"]).unwrap();
/// assert!(args.contains("greet"));
/// assert_eq!(args.get("greet"), None);
/// assert_eq!(args.get("name"), Some("Ada"));
/// ```
pub fn select<'a, S: AsRef<str>>(
    program: &'a Program,
    tokens: &[S],
) -> Result<(&'a Command, NamedArguments), DispatchError> {
    match program {
        Program::Callable(command) => Ok((command, NamedArguments::from_tokens(tokens))),
        Program::Module(_) => {
            let (name, rest) = match tokens.split_first() {
                Some((name, rest)) => (Some(name.as_ref()), rest),
                None => (None, tokens),
            };
            let command = resolve(program, name)?;
            Ok((command, NamedArguments::from_tokens(rest)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn noop(params: &[&str]) -> Command {
        Command::direct(params, |_ctx, _args| Ok::<_, anyhow::Error>(()))
    }

    fn module() -> Program {
        Module::new()
            .command("hello", noop(&["name"]))
            .command("bar", noop(&[]))
            .value("version", "1.0.0")
            .into()
    }

    #[test]
    fn test_callable_program_ignores_command_name() {
        let program = Program::from(noop(&["x"]));
        let cmd = resolve(&program, Some("anything")).unwrap();
        assert_eq!(cmd.info().param_list, vec!["x"]);

        assert!(resolve(&program, None).is_ok());
    }

    #[test]
    fn test_module_resolves_named_export() {
        let program = module();
        let cmd = resolve(&program, Some("hello")).unwrap();
        assert_eq!(cmd.info().param_list, vec!["name"]);
    }

    #[test]
    fn test_module_without_name_is_missing_argument() {
        let err = resolve(&module(), None).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::MissingArgument { ref argument } if argument == "command"
        ));
        assert_eq!(err.to_string(), "\"command\" is a required argument.");
    }

    #[test]
    fn test_unknown_command_is_not_found() {
        let err = resolve(&module(), Some("foo")).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::CommandNotFound { ref command } if command == "foo"
        ));
    }

    #[test]
    fn test_non_callable_export_is_not_found() {
        let err = resolve(&module(), Some("version")).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::CommandNotFound { ref command } if command == "version"
        ));
    }

    #[test]
    fn test_select_callable_keeps_every_token() {
        let program = Program::from(noop(&["name"]));
        let (_, args) = select(&program, &["greet", "name=Ada"]).unwrap();
        assert_eq!(args.len(), 2);
        assert!(args.contains("greet"));
        assert_eq!(args.get("greet"), None);
        assert_eq!(args.get("name"), Some("Ada"));
    }

    #[test]
    fn test_select_module_consumes_command_name() {
        let program = module();
        let (cmd, args) = select(&program, &["hello", "name=World"]).unwrap();
        assert_eq!(cmd.info().param_list, vec!["name"]);
        assert_eq!(args.len(), 1);
        assert_eq!(args.get("name"), Some("World"));
    }

    #[test]
    fn test_select_module_without_tokens() {
        let tokens: [&str; 0] = [];
        let err = select(&module(), &tokens).unwrap_err();
        assert!(matches!(err, DispatchError::MissingArgument { .. }));
    }

    #[test]
    fn test_resolution_error_never_calls_target() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let program: Program = Module::new()
            .command(
                "bar",
                Command::direct(&[], move |_ctx, _args| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, anyhow::Error>(())
                }),
            )
            .into();

        let err = select(&program, &["foo"]).unwrap_err();
        assert!(err.is_resolution_error());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
