use std::{
    fs,
    io::{self, Write as _},
    path::{Path, PathBuf},
};

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use rarhash::error::RarResult;

#[derive(Parser)]
#[command(about = "Print password-recovery hash records for encrypted RAR archives")]
struct Args {
    /// Log per-entry details while scanning.
    #[arg(short, long)]
    verbose: bool,

    /// Archives to inspect.
    #[arg(required = true)]
    archives: Vec<PathBuf>,
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .init();

    // Archives are independent: one failing to parse never stops the rest,
    // and the exit code only reflects argument parsing.
    for path in &args.archives {
        if let Err(e) = inspect(path) {
            error!(path = %path.display(), "{e}");
        }
    }
}

fn inspect(path: &Path) -> RarResult<()> {
    let file = fs::File::open(path)?;
    let file_size = file.metadata()?.len();
    let mut reader = io::BufReader::new(file);

    let records = rarhash::scan(&mut reader, file_size)?;

    let base = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let path = path.to_string_lossy();

    let mut stdout = io::stdout().lock();
    for record in records {
        let line = record.format(&base, &path);
        writeln!(stdout, "{line}")?;
    }

    Ok(())
}
