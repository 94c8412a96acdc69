//! Command-line surface.
//!
//! Flags build the [`Options`] for the run. Everything after the flags is
//! the program, the command (for module programs) and `name=value` tokens.

use std::path::PathBuf;

use clap::Parser;
use runline_dispatch::{LogLevel, Options, OutputDestination, OutputFormat};

/// runline - call a registered function with name=value arguments
#[derive(Debug, Parser)]
#[command(name = "runline")]
#[command(version)]
#[command(about = "Call a registered function with name=value arguments")]
#[command(long_about = "Call a registered function with name=value arguments.\n\n\
    The first token names a program. When the program is a single function\n\
    every remaining token is an argument. When it is a module the next token\n\
    names the command. Arguments are matched to parameters by name, and the\n\
    result is printed as JSON.")]
#[command(after_help = "EXAMPLES:\n\
    runline greet name=Ada\n\
    runline ./programs/greet.js greeting=Hi name=Ada\n\
    runline math add a=2 b=3\n\
    runline --no-newline math range end=5\n\
    runline --format yaml echo color=red\n\
    runline --list")]
pub struct Cli {
    /// Verbosity of diagnostics written to stderr
    #[arg(long, value_enum, env = "RUNLINE_LOGLEVEL", default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Indent JSON output (default)
    #[arg(long, overrides_with = "no_newline")]
    newline: bool,

    /// Print JSON output on a single line
    #[arg(long, overrides_with = "newline")]
    no_newline: bool,

    /// Print `undefined` when the function produces no value
    #[arg(long)]
    print_undefined: bool,

    /// Print `null` results (default)
    #[arg(long, overrides_with = "no_print_null")]
    print_null: bool,

    /// Print nothing when the result is `null`
    #[arg(long, overrides_with = "print_null")]
    no_print_null: bool,

    /// Serialization of the result
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Write the result to a file instead of stdout
    #[arg(long, value_name = "PATH")]
    pub output_file: Option<PathBuf>,

    /// Extra option visible to functions through their context
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// List registered programs and their parameters, then exit
    #[arg(long)]
    pub list: bool,

    /// Program, command, and name=value arguments
    #[arg(value_name = "TOKENS", trailing_var_arg = true, allow_hyphen_values = true)]
    pub tokens: Vec<String>,
}

impl Cli {
    /// Builds the run's options from defaults and flags.
    pub fn options(&self) -> Options {
        let mut options = Options {
            loglevel: self.loglevel,
            newline: !self.no_newline,
            print_undefined: self.print_undefined,
            print_null: !self.no_print_null,
            format: self.format,
            ..Options::default()
        };
        for pair in &self.set {
            options.set_extra(pair);
        }
        options
    }

    pub fn destination(&self) -> OutputDestination {
        match &self.output_file {
            Some(path) => OutputDestination::File(path.clone()),
            None => OutputDestination::Stdout,
        }
    }
}
