//! Margin - review and apply AI annotations on source files
//!
//! Loads diagnostics and suggestions produced by an assistant, lists them
//! per file, and applies suggestions one by one or in bulk while keeping
//! every other annotation anchored to the right line.

mod commands;
mod shell;

use anyhow::{Context, Result};
use clap::Parser;
use margin_adapters::Config;
use shell::{Flow, Session};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "margin",
    about = "Review and apply AI annotations on source files",
    version
)]
struct Args {
    /// Directory that relative file paths resolve against
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Annotation file to load at startup
    #[arg(short, long)]
    annotations: Option<PathBuf>,

    /// Document for annotations that name no file
    #[arg(long)]
    active_file: Option<String>,

    /// Do not keep .orig copies of files before writing them
    #[arg(long)]
    no_backup: bool,
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();
    let config = Config::load();

    let root = args
        .root
        .canonicalize()
        .with_context(|| format!("Cannot open root directory {}", args.root.display()))?;
    let mut session = Session::new(root, &config, args.active_file, args.no_backup);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Some(path) = args.annotations {
        session.execute(commands::Command::Load(path), &mut out)?;
    }

    writeln!(out, "\nMargin [type 'help' for commands]\n")?;

    let stdin = io::stdin();
    let mut input = String::new();
    let mut warned_unsaved = false;
    loop {
        write!(out, ">>> ")?;
        out.flush()?;

        input.clear();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let command = match commands::parse(&input) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                writeln!(out, "  {}", message)?;
                continue;
            }
        };
        if session.execute(command, &mut out)? == Flow::Exit {
            let unsaved = session.unsaved_files();
            if unsaved > 0 && !warned_unsaved {
                writeln!(
                    out,
                    "  ! {} file(s) have unwritten edits. Run 'write' to save them, or 'exit' again to discard.",
                    unsaved
                )?;
                warned_unsaved = true;
                continue;
            }
            break;
        }
    }

    tracing::debug!(
        annotations = session.store().len(),
        "session closed"
    );
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("MARGIN_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
