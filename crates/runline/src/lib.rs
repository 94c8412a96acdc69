//! runline - call a registered function from the command line.
//!
//! The binary is a thin shell around [`run`]: it parses flags with clap,
//! installs logging, and hands the tokens to a
//! [`Runner`](runline_dispatch::Runner) over the built-in
//! [`programs::registry`].
//!
//! ```text
//! $ runline math add a=2 b=3
//! 5
//! $ runline greet name=Ada
//! "Hello, Ada!"
//! $ runline math range end=3
//! [
//!   0,
//!   1,
//!   2
//! ]
//! ```

pub mod cli;
pub mod exitcode;
pub mod logging;
pub mod programs;
pub mod report;

use std::io::Write;

use runline_dispatch::{inspect, Command, Export, Program, Registry, Runner};
use serde_json::{json, Map, Value};
use tracing::debug;

pub use cli::Cli;

fn describe(command: &Command) -> Value {
    json!({
        "params": inspect(command).param_list,
        "style": command.style(),
    })
}

/// Describes every registered program: parameter lists and completion
/// styles for callables, exports for modules.
pub fn catalog(registry: &Registry) -> Value {
    let mut programs = Map::new();
    for (id, program) in registry.iter() {
        let entry = match program {
            Program::Callable(command) => describe(command),
            Program::Module(module) => {
                let mut commands = Map::new();
                let mut values = Map::new();
                for (name, export) in module.iter() {
                    match export {
                        Export::Command(command) => {
                            commands.insert(name.to_string(), describe(command));
                        }
                        Export::Value(value) => {
                            values.insert(name.to_string(), value.clone());
                        }
                    }
                }
                json!({ "commands": commands, "values": values })
            }
        };
        programs.insert(id.to_string(), entry);
    }
    Value::Object(programs)
}

/// Runs one command line against `registry`, returning the exit code.
///
/// The result goes to `stdout` (or the `--output-file`); errors are
/// reported to `stderr` and never printed as a result.
pub async fn run<W, E>(cli: &Cli, registry: Registry, stdout: &mut W, stderr: &mut E) -> i32
where
    W: Write,
    E: Write,
{
    let options = cli.options();

    if cli.list {
        let printed = runline_dispatch::to_json(&catalog(&registry), options.newline)
            .map_err(runline_dispatch::DispatchError::from)
            .and_then(|text| Ok(cli.destination().write_text(stdout, &text)?));
        return match printed {
            Ok(()) => exitcode::OK,
            Err(err) => fail(&err, stderr),
        };
    }

    let runner = Runner::new(registry, options).with_destination(cli.destination());
    match runner.execute(cli.tokens.as_slice(), stdout).await {
        Ok(outcome) => {
            debug!(?outcome, "run finished");
            exitcode::OK
        }
        Err(err) => fail(&err, stderr),
    }
}

fn fail<E: Write>(err: &runline_dispatch::DispatchError, stderr: &mut E) -> i32 {
    // Nothing left to report to if stderr itself is gone.
    let _ = report::report(err, stderr);
    exitcode::for_error(err)
}
