//! Purpose: Hold top-level CLI command dispatch for `bookshelf`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Output envelopes and exit code semantics are defined in `main.rs`.

use std::io;

use clap::CommandFactory;

use super::{
    Cli, Command, RunOutcome, ServeSubcommand, emit_serve_check_report, emit_version_output,
    serve, serve_config_from_run_args,
};
use bookshelf::api::{Error, ErrorKind};

pub(super) fn dispatch_command(command: Command) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "bookshelf", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Version => {
            emit_version_output();
            Ok(RunOutcome::ok())
        }
        Command::Serve { subcommand, run } => {
            let config = serve_config_from_run_args(run)?;
            match subcommand {
                Some(ServeSubcommand::Check { json }) => {
                    serve::validate_config(&config)?;
                    emit_serve_check_report(&config, json);
                    Ok(RunOutcome::ok())
                }
                None => {
                    let runtime = tokio::runtime::Builder::new_multi_thread()
                        .enable_all()
                        .build()
                        .map_err(|err| {
                            Error::new(ErrorKind::Internal)
                                .with_message("failed to start runtime")
                                .with_source(err)
                        })?;
                    runtime.block_on(serve::serve(config))?;
                    Ok(RunOutcome::ok())
                }
            }
        }
    }
}
