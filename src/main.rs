// SPDX-License-Identifier: MIT
//
// n-edlin: a line-oriented text editor in the classic edlin tradition.
//
// This binary wires the two crates together:
//
//   n-term   → raw-mode console, key decoding, line reader, yes/no prompt
//   n-editor → line buffer, address parsing, commands, backup storage
//
// One file per run. Commands are typed at a `*` prompt and each one goes
// through the session:
//
//   stdin → read_line → parse → dispatch → buffer / backup file
//
// Exit status is 0 after `E` or `Q`, and 1 for a usage error, any file or
// terminal failure, or Ctrl-C at the prompt.

mod logging;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use n_editor::options::Options;
use n_editor::session::{Session, SessionError};
use n_term::terminal::Console;
use tracing::info;

/// Edit FILE one line at a time.
#[derive(Debug, Parser)]
#[command(name = "n-edlin", version, about)]
struct Cli {
    /// File to edit. Created if it does not exist.
    file: PathBuf,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            eprint!("{err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = logging::init_logging() {
        eprintln!("n-edlin: {:#}", anyhow::Error::new(err));
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Ctrl-C already echoed `^C`; nothing more to say.
            if !matches!(err.downcast_ref::<SessionError>(), Some(SessionError::Interrupted)) {
                eprintln!("n-edlin: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    info!(file = %cli.file.display(), version = env!("CARGO_PKG_VERSION"), "starting");
    let mut session = Session::open(&cli.file, Options::default(), Console::stdin(), io::stdout())
        .with_context(|| format!("open {} failed", cli.file.display()))?;
    session.run().context("edit session failed")
}
