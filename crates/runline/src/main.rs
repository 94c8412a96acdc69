use clap::Parser;

use runline::{cli::Cli, exitcode, logging, programs};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            let code = if err.use_stderr() {
                exitcode::USAGE
            } else {
                exitcode::OK
            };
            std::process::exit(code);
        }
    };

    logging::init(cli.loglevel);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Error: failed to start runtime: {}", err);
            std::process::exit(exitcode::SOFTWARE);
        }
    };

    let code = runtime.block_on(async {
        let mut stdout = std::io::stdout().lock();
        let mut stderr = std::io::stderr().lock();
        runline::run(&cli, programs::registry(), &mut stdout, &mut stderr).await
    });
    std::process::exit(code);
}
