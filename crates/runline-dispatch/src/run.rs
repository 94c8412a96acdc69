//! One pass from CLI tokens to printed output.
//!
//! ```text
//! tokens ─► load program ─► select target ─► invoke ─► normalize ─► render ─► write
//! ```
//!
//! Every stage before `invoke` can fail with a resolution error, in which
//! case no target runs and nothing is printed.

use std::io::Write;
use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::error::DispatchError;
use crate::invoke::invoke;
use crate::normalize::normalize;
use crate::options::Options;
use crate::output::OutputDestination;
use crate::registry::ProgramLoader;
use crate::resolve::select;
use crate::serialize::render;

/// What a successful run did with its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The result was written; holds the text without the trailing newline.
    Printed(String),
    /// The printing policy suppressed the result.
    Silent,
}

/// Runs programs from a loader with one fixed set of options.
#[derive(Debug)]
pub struct Runner<L> {
    loader: L,
    options: Arc<Options>,
    destination: OutputDestination,
}

impl<L: ProgramLoader> Runner<L> {
    pub fn new(loader: L, options: Options) -> Self {
        Self {
            loader,
            options: Arc::new(options),
            destination: OutputDestination::Stdout,
        }
    }

    pub fn with_destination(mut self, destination: OutputDestination) -> Self {
        self.destination = destination;
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Resolves, invokes, and normalizes, returning the value to print.
    ///
    /// The first token names the program. For a module program the second
    /// names the command. The remaining tokens are `name=value` arguments.
    pub async fn evaluate<S: AsRef<str>>(
        &self,
        tokens: &[S],
    ) -> Result<Option<Value>, DispatchError> {
        let (program_id, rest) = tokens
            .split_first()
            .ok_or_else(|| DispatchError::missing_argument("program"))?;
        let program_id = program_id.as_ref();

        let program = self.loader.load(program_id)?;
        let (command, args) = select(program, rest)?;
        info!(
            program = program_id,
            style = ?command.style(),
            args = args.len(),
            "running command"
        );

        let output = invoke(command, args.into(), self.options.clone()).await?;
        Ok(normalize(output).await?)
    }

    /// Runs the tokens and prints the result.
    ///
    /// `stdout` receives the text unless the destination is a file.
    pub async fn execute<S, W>(&self, tokens: &[S], stdout: &mut W) -> Result<RunOutcome, DispatchError>
    where
        S: AsRef<str>,
        W: Write,
    {
        let value = self.evaluate(tokens).await?;
        match render(value.as_ref(), &self.options)? {
            Some(text) => {
                self.destination.write_text(stdout, &text)?;
                Ok(RunOutcome::Printed(text))
            }
            None => Ok(RunOutcome::Silent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{Command, Output};
    use crate::registry::Registry;
    use crate::resolve::Module;
    use anyhow::anyhow;
    use futures::stream;
    use serde_json::json;

    fn registry() -> Registry {
        Registry::new()
            .program(
                "hello",
                Module::new()
                    .command(
                        "hello",
                        Command::direct(&["name"], |_ctx, args| {
                            Ok::<_, anyhow::Error>(args.get(0).map(str::to_string))
                        }),
                    )
                    .command(
                        "bar",
                        Command::direct(&[], |_ctx, _args| Ok::<_, anyhow::Error>("bar")),
                    ),
            )
            .program(
                "count",
                Command::direct(&["to"], |_ctx, args| {
                    let to: i64 = args.get(0).unwrap_or("3").parse()?;
                    Ok::<_, anyhow::Error>(Output::stream(stream::iter(1..=to)))
                }),
            )
            .program(
                "quiet",
                Command::direct(&[], |_ctx, _args| {
                    Ok::<_, anyhow::Error>(Output::Undefined)
                }),
            )
            .program(
                "broken",
                Command::direct(&[], |_ctx, _args| {
                    Err::<Value, _>(anyhow!("something broke"))
                }),
            )
    }

    #[tokio::test]
    async fn test_hello_world_prints_pretty_json() {
        let runner = Runner::new(registry(), Options::default());
        let mut out = Vec::new();

        let outcome = runner
            .execute(&["hello", "hello", "name=World"], &mut out)
            .await
            .unwrap();

        assert_eq!(outcome, RunOutcome::Printed("\"World\"".to_string()));
        assert_eq!(String::from_utf8(out).unwrap(), "\"World\"\n");
    }

    #[tokio::test]
    async fn test_unknown_command_prints_nothing() {
        let runner = Runner::new(registry(), Options::default());
        let mut out = Vec::new();

        let err = runner.execute(&["hello", "foo"], &mut out).await.unwrap_err();

        assert!(matches!(
            err,
            DispatchError::CommandNotFound { ref command } if command == "foo"
        ));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_missing_program() {
        let runner = Runner::new(registry(), Options::default());
        let tokens: [&str; 0] = [];
        let err = runner.evaluate(&tokens).await.unwrap_err();
        assert_eq!(err.to_string(), "\"program\" is a required argument.");
    }

    #[tokio::test]
    async fn test_missing_command() {
        let runner = Runner::new(registry(), Options::default());
        let err = runner.evaluate(&["hello"]).await.unwrap_err();
        assert_eq!(err.to_string(), "\"command\" is a required argument.");
    }

    #[tokio::test]
    async fn test_stream_is_printed_as_array() {
        let options = Options {
            newline: false,
            ..Options::default()
        };
        let runner = Runner::new(registry(), options);
        let mut out = Vec::new();

        runner.execute(&["count", "to=3"], &mut out).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "[1,2,3]\n");
    }

    #[tokio::test]
    async fn test_program_loaded_by_path() {
        let runner = Runner::new(registry(), Options::default());
        let value = runner.evaluate(&["./bin/count.js", "to=2"]).await.unwrap();
        assert_eq!(value, Some(json!([1, 2])));
    }

    #[tokio::test]
    async fn test_undefined_is_silent_by_default() {
        let runner = Runner::new(registry(), Options::default());
        let mut out = Vec::new();
        let outcome = runner.execute(&["quiet"], &mut out).await.unwrap();
        assert_eq!(outcome, RunOutcome::Silent);
        assert!(out.is_empty());

        let options = Options {
            print_undefined: true,
            ..Options::default()
        };
        let runner = Runner::new(registry(), options);
        let mut out = Vec::new();
        runner.execute(&["quiet"], &mut out).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "undefined\n");
    }

    #[tokio::test]
    async fn test_invocation_failure_is_reported_not_printed() {
        let runner = Runner::new(registry(), Options::default());
        let mut out = Vec::new();
        let err = runner.execute(&["broken"], &mut out).await.unwrap_err();
        assert!(matches!(err, DispatchError::Invocation(_)));
        assert!(!err.is_resolution_error());
        assert_eq!(err.to_string(), "something broke");
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_file_destination() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("out.json");
        let runner = Runner::new(registry(), Options::default())
            .with_destination(OutputDestination::File(path.clone()));

        let mut out = Vec::new();
        runner.execute(&["hello", "bar"], &mut out).await.unwrap();

        assert!(out.is_empty());
        assert_eq!(std::fs::read_to_string(path).unwrap(), "\"bar\"\n");
    }
}
