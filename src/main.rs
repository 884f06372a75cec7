//! Entry point for the `import_feed` command-line tool.

use std::process::ExitCode;

use clap::Parser;
use feedmerge::{ImportArgs, ImportError, load_config, run_import};

fn run(args: &ImportArgs) -> Result<(), ImportError> {
    let config = load_config(args)?;
    run_import(&config, &args.sources, std::io::stdout().lock())?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    match run(&ImportArgs::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
